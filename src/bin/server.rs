use {
    anyhow::{bail, Context},
    flapcp::{
        config::{Algorithm, Plan},
        kawasaki,
        serialization::*,
        skeleton::Skeleton,
        stats::EnumerationStats,
        Overwriter,
    },
    nanoserde::{DeBin, SerBin},
    std::{
        collections::HashMap,
        io::{BufRead, Read, Write},
        net::IpAddr,
        sync::{Arc, Condvar, Mutex, PoisonError},
        time::{Duration, Instant, SystemTime},
    },
    tiny_http::{Method, Request, Response, Server},
    tracing::{info, warn},
    tracing_subscriber::fmt::SubscriberBuilder,
};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(600);

fn main() -> anyhow::Result<()> {
    SubscriberBuilder::default().with_target(false).init();

    println!("opening database...");

    let db = sled::open("serverdb").context("opening serverdb")?;
    let meta = db.open_tree("meta")?;

    if !meta.contains_key(DB_FINISH_KEY)? {
        let mut args = pico_args::Arguments::from_env();
        let listen_addr: String = args.free_from_str().context("parsing listen address")?;

        print!("loading configuration from ");
        let start_data = match StartData::from_db(&meta)? {
            Some(start_data) => {
                print!("db: ");
                start_data
            }
            None => {
                print!("cli: ");
                let start_data = StartData::from_cli(&mut args)?;
                start_data.set_db(&meta)?;
                start_data
            }
        };
        let algorithm: Algorithm = start_data.algorithm.parse()?;

        println!(
            "place count = {}, algorithm = {algorithm}",
            start_data.place_count
        );

        if !meta.contains_key(DB_INIT_KEY)? {
            println!("generating skeletons...");

            let mut inserted: anyhow::Result<()> = Ok(());
            let stats = kawasaki::enumerate(start_data.place_count, &mut |skeleton| {
                if inserted.is_ok() {
                    inserted = insert_job(&db, skeleton);
                }
            });
            inserted?;
            db.flush()?;

            meta.insert(DB_KAWASAKI_KEY, SerStats::from(stats).serialize_bin())?;
            meta.insert(DB_INIT_KEY, &[])?;
            info!("{} skeletons", stats.answer_count);
        }

        let http = Server::http(&listen_addr)
            .map_err(|err| anyhow::anyhow!("binding {listen_addr}: {err}"))?;

        println!("listening on http://{listen_addr}/ for job requests...");

        let start_time = start_data.start_time();
        let format_status =
            move |job_tracker: &JobTracker, client_tracker: &ClientTracker| -> String {
                format!(
                    "time elapsed: {:?}, {job_tracker}, {client_tracker}",
                    start_time.elapsed().unwrap_or_default()
                )
            };

        let job_finder = JobFinder::new(&db);
        let job_tracker = JobTracker::new(&db)?;
        let client_tracker = ClientTracker::new();
        let mut overwriter = Overwriter::default();
        overwriter.print(&format_status(&job_tracker, &client_tracker))?;

        let finish = spawn_job_server(
            http,
            JobServer {
                db: (*db).clone(),
                place_count: start_data.place_count,
                algorithm,
                format_status,
                job_finder,
                job_tracker,
                client_tracker,
                overwriter,
            },
        );

        let (lock, condvar) = &*finish;
        let _guard = condvar
            .wait_while(
                lock.lock().unwrap_or_else(PoisonError::into_inner),
                |finished| !*finished,
            )
            .unwrap_or_else(PoisonError::into_inner);

        let mut results = Results::default();
        for entry in db.iter() {
            let (_, value) = entry?;
            results += &SerResults::from_slice(&value).de()?;
        }

        meta.insert(
            DB_FINISH_KEY,
            FinishData::from_results(results).serialize_bin(),
        )?;
        meta.flush()?;

        println!();
    }

    let start_data = StartData::from_db(&meta)?.context("missing start data")?;
    let kawasaki_stats = meta
        .get(DB_KAWASAKI_KEY)?
        .map(|stats| deserialize::<SerStats>(&stats))
        .transpose()?
        .map(EnumerationStats::from);
    let finish_data: FinishData =
        deserialize(&meta.get(DB_FINISH_KEY)?.context("missing finish data")?)?;

    println!(
        "total time elapsed: {:?}",
        finish_data
            .stop_time()
            .duration_since(start_data.start_time())
            .unwrap_or_default()
    );

    println!("#place = {}", start_data.place_count);
    println!(
        "{}",
        finish_data
            .results
            .into_report(start_data.place_count, kawasaki_stats)
    );

    print!("press enter to exit...");
    std::io::stdout().lock().flush()?;
    std::io::stdin().lock().read_line(&mut String::new())?;

    Ok(())
}

fn insert_job(db: &sled::Tree, skeleton: &Skeleton) -> anyhow::Result<()> {
    db.insert(SerSkeleton::ser(skeleton)?.as_slice(), &[])?;
    Ok(())
}

const DB_START_KEY: &str = "db_start";
const DB_INIT_KEY: &str = "db_init";
const DB_KAWASAKI_KEY: &str = "db_kawasaki";
const DB_FINISH_KEY: &str = "db_finish";

/// Hands out skeletons that have no result yet. After one pass it starts
/// over, so jobs given to clients that vanished are handed out again.
struct JobFinder {
    db: sled::Tree,
    iter: Option<sled::Iter>,
}

impl JobFinder {
    fn new(db: &sled::Tree) -> Self {
        Self {
            db: db.clone(),
            iter: Some(db.iter()),
        }
    }

    fn finished(&self) -> bool {
        self.iter.is_none()
    }

    fn unfinished(iter: &mut sled::Iter, max: usize) -> sled::Result<Vec<sled::IVec>> {
        let mut jobs = Vec::new();
        for entry in iter {
            let (k, v) = entry?;
            if v.is_empty() {
                jobs.push(k);
                if jobs.len() == max {
                    break;
                }
            }
        }
        Ok(jobs)
    }

    fn assign(&mut self, max: usize) -> sled::Result<Vec<sled::IVec>> {
        let max = max.max(1);

        let Some(iter) = &mut self.iter else {
            return Ok(vec![]);
        };

        let jobs = Self::unfinished(iter, max)?;
        if !jobs.is_empty() {
            return Ok(jobs);
        }

        *iter = self.db.iter();
        let jobs = Self::unfinished(iter, max)?;
        if jobs.is_empty() {
            self.iter = None;
        }
        Ok(jobs)
    }
}

struct JobTracker {
    total: usize,
    completed: usize,
    recent: Vec<(u64, Instant)>,
}

impl JobTracker {
    fn new(db: &sled::Tree) -> sled::Result<Self> {
        let mut completed = 0;
        for entry in db.iter() {
            let (_, v) = entry?;
            if !v.is_empty() {
                completed += 1;
            }
        }

        Ok(Self {
            total: db.len(),
            completed,
            recent: Vec::new(),
        })
    }

    fn process(&mut self, jobs: usize, answers: u64) {
        self.completed += jobs;
        self.recent.push((answers, Instant::now()));
        self.recent.retain(|(_, i)| i.elapsed() < CLIENT_TIMEOUT);
    }

    fn finished(&self) -> bool {
        self.total == self.completed
    }
}

impl std::fmt::Display for JobTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = self
            .recent
            .first()
            .map(|(_, i)| i.elapsed())
            .unwrap_or(CLIENT_TIMEOUT);
        let answers: u64 = self.recent.iter().map(|(a, _)| a).sum();
        write!(
            f,
            "jobs done: {}/{}, patterns/s: {:.1}",
            self.completed,
            self.total,
            answers as f64 / duration.as_secs_f64().max(1.0)
        )
    }
}

fn now_millis() -> u128 {
    SystemTime::UNIX_EPOCH
        .elapsed()
        .unwrap_or_default()
        .as_millis()
}

fn from_millis(millis: u128) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

#[derive(SerBin, DeBin, Clone)]
struct StartData {
    place_count: usize,
    algorithm: String,
    start_time: u128,
}

impl StartData {
    fn from_db(meta: &sled::Tree) -> anyhow::Result<Option<Self>> {
        Ok(meta
            .get(DB_START_KEY)?
            .map(|start_data| deserialize(&start_data))
            .transpose()?)
    }

    fn from_cli(args: &mut pico_args::Arguments) -> anyhow::Result<Self> {
        let place_count: usize = args.free_from_str().context("parsing place count")?;
        let algorithm: Algorithm = args.free_from_str().context("parsing algorithm")?;

        if place_count < 2 {
            bail!(flapcp::Error::InvalidPlaceCount(place_count));
        }
        if !matches!(algorithm.plan(), Plan::Assignments { .. }) {
            bail!(flapcp::Error::NotPerSkeleton(algorithm.name()));
        }

        Ok(Self {
            place_count,
            algorithm: algorithm.name().to_owned(),
            start_time: now_millis(),
        })
    }

    fn set_db(&self, meta: &sled::Tree) -> sled::Result<()> {
        meta.insert(DB_START_KEY, self.serialize_bin())?;
        Ok(())
    }

    fn start_time(&self) -> SystemTime {
        from_millis(self.start_time)
    }
}

#[derive(SerBin, DeBin)]
struct SerStats {
    call_count: u64,
    valid_call_count: u64,
    answer_count: u64,
}

impl From<EnumerationStats> for SerStats {
    fn from(stats: EnumerationStats) -> Self {
        Self {
            call_count: stats.call_count,
            valid_call_count: stats.valid_call_count,
            answer_count: stats.answer_count,
        }
    }
}

impl From<SerStats> for EnumerationStats {
    fn from(stats: SerStats) -> Self {
        Self {
            call_count: stats.call_count,
            valid_call_count: stats.valid_call_count,
            answer_count: stats.answer_count,
        }
    }
}

#[derive(SerBin, DeBin)]
struct FinishData {
    results: Results,
    stop_time: u128,
}

impl FinishData {
    fn from_results(results: Results) -> Self {
        Self {
            results,
            stop_time: now_millis(),
        }
    }

    fn stop_time(&self) -> SystemTime {
        from_millis(self.stop_time)
    }
}

struct ClientTracker {
    clients: HashMap<IpAddr, Instant>,
}

impl ClientTracker {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    fn seen(&mut self, addr: IpAddr) {
        self.clients.insert(addr, Instant::now());
        self.clients.retain(|_, i| i.elapsed() < CLIENT_TIMEOUT);
    }
}

impl std::fmt::Display for ClientTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "active clients: {}", self.clients.len())
    }
}

struct JobServer<F> {
    db: sled::Tree,
    place_count: usize,
    algorithm: Algorithm,
    format_status: F,
    job_finder: JobFinder,
    job_tracker: JobTracker,
    client_tracker: ClientTracker,
    overwriter: Overwriter,
}

enum Outcome {
    Jobs(JobResponse),
    Rejected(String),
}

impl<F: Fn(&JobTracker, &ClientTracker) -> String> JobServer<F> {
    fn finished(&self) -> bool {
        self.job_finder.finished() || self.job_tracker.finished()
    }

    /// Stores the results a client sent and picks its next jobs.
    fn handle(&mut self, request: &mut Request) -> anyhow::Result<Outcome> {
        if let Some(addr) = request.remote_addr() {
            self.client_tracker.seen(addr.ip());
        }

        let mut body = Vec::new();
        request.as_reader().read_to_end(&mut body)?;
        let job_request: JobRequest = deserialize(&body)?;

        let mut jobs_done = 0;
        let mut answers = 0;
        for (skeleton, result) in &job_request.results {
            let swapped = self.db.compare_and_swap(
                skeleton.as_slice(),
                Some(&[] as &[u8]),
                Some(result.as_slice()),
            )?;

            match swapped {
                Ok(()) => {
                    jobs_done += 1;
                    answers += result.de()?.answer_count;
                }
                Err(sled::CompareAndSwapError { current: None, .. }) => {
                    return Ok(Outcome::Rejected(format!(
                        "unknown skeleton {:?}",
                        skeleton.as_slice()
                    )));
                }
                Err(sled::CompareAndSwapError {
                    current: Some(old), ..
                }) => {
                    if old != result.as_slice() {
                        return Ok(Outcome::Rejected(format!(
                            "conflicting result for {:?}, {:?} vs {:?}",
                            skeleton.as_slice(),
                            old,
                            result.as_slice()
                        )));
                    }
                }
            }
        }

        if jobs_done > 0 {
            self.job_tracker.process(jobs_done, answers);
        }
        self.overwriter
            .print(&(self.format_status)(&self.job_tracker, &self.client_tracker))?;

        Ok(Outcome::Jobs(JobResponse {
            place_count: self.place_count,
            algorithm: self.algorithm.name().to_owned(),
            jobs: self
                .job_finder
                .assign(job_request.jobs_wanted)?
                .into_iter()
                .map(|iv| SerSkeleton::from_slice(&iv))
                .collect(),
        }))
    }
}

fn spawn_job_server<F>(http: Server, mut server: JobServer<F>) -> Arc<(Mutex<bool>, Condvar)>
where
    F: Fn(&JobTracker, &ClientTracker) -> String + Send + 'static,
{
    let finish = Arc::new((Mutex::new(false), Condvar::new()));

    {
        let finish = finish.clone();
        std::thread::spawn(move || {
            while let Ok(mut request) = http.recv() {
                if !matches!((request.url(), request.method()), ("/work", Method::Post)) {
                    let _ = request.respond(Response::empty(404));
                    continue;
                }

                let responded = match server.handle(&mut request) {
                    Ok(Outcome::Jobs(job_response)) => request.respond(Response::from_data(
                        job_response.serialize_bin(),
                    )),
                    Ok(Outcome::Rejected(reason)) => {
                        warn!("rejected request from {:?}: {reason}", request.remote_addr());
                        request.respond(Response::empty(400))
                    }
                    Err(err) => {
                        warn!("failed request from {:?}: {err:#}", request.remote_addr());
                        request.respond(Response::empty(500))
                    }
                };
                if let Err(err) = responded {
                    warn!("could not respond: {err}");
                }

                if server.finished() {
                    let (lock, condvar) = &*finish;
                    *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
                    condvar.notify_all();
                }
            }
        });
    }

    finish
}
