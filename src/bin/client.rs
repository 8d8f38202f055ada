use {
    anyhow::Context,
    flapcp::{
        config::Algorithm,
        pipeline,
        serialization::{deserialize, JobRequest, JobResponse, Results, SerResults, SerSkeleton},
    },
    nanoserde::SerBin,
    rayon::prelude::*,
    std::{collections::HashMap, io::Read, time::Instant},
    tracing::{debug, info},
    tracing_subscriber::fmt::SubscriberBuilder,
};

fn main() -> anyhow::Result<()> {
    SubscriberBuilder::default().with_target(false).init();

    let mut args = pico_args::Arguments::from_env();
    let url: String = args.free_from_str().context("parsing server url")?;
    let jobs_wanted: usize = args
        .opt_free_from_str()
        .context("parsing jobs per request")?
        .unwrap_or_else(rayon::current_num_threads);

    let url = url.strip_suffix('/').unwrap_or(&url);
    let work_url = url.to_owned() + "/work";

    let mut now = Instant::now();
    let mut jobs_done = 0;
    let mut results = HashMap::new();

    loop {
        let request = JobRequest {
            jobs_wanted,
            results: std::mem::take(&mut results),
        };

        let response = ureq::post(&work_url)
            .send_bytes(&request.serialize_bin())
            .context("requesting work")?;
        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        let response: JobResponse = deserialize(&body)?;

        if response.jobs.is_empty() {
            println!("\nwork finished");
            break;
        }

        flapcp::print_overwrite(&format!(
            "jobs completed: {jobs_done}, server latency: {:?}",
            now.elapsed()
        ))?;

        let algorithm: Algorithm = response.algorithm.parse()?;
        debug!(
            jobs = response.jobs.len(),
            place_count = response.place_count,
            "received"
        );

        results = response
            .jobs
            .into_par_iter()
            .map(|job| run_job(algorithm, job))
            .collect::<anyhow::Result<_>>()?;

        jobs_done += results.len();
        now = Instant::now();
    }

    info!(jobs_done, "done");
    Ok(())
}

fn run_job(algorithm: Algorithm, job: SerSkeleton) -> anyhow::Result<(SerSkeleton, SerResults)> {
    let skeleton = job.de()?;
    let report = pipeline::run_skeleton(algorithm, &skeleton)?;
    let results = SerResults::ser(&Results::from(&report));
    Ok((job, results))
}
