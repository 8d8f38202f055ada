//! Runs the stages an algorithm asks for and funnels every result into one
//! counting stream.

use {
    crate::{
        answer::FlapAnswerDetector,
        bitset::BitSet,
        config::{Algorithm, Plan},
        direct, kawasaki, mv,
        skeleton::Skeleton,
        stats::{AtomicStats, EnumerationStats},
        Error, Result,
    },
    std::{
        fmt,
        io::{self, Write},
        sync::{
            atomic::{AtomicU64, Ordering},
            Mutex, PoisonError,
        },
    },
    tracing::{debug, info},
};

/// One result, counted under `counter_key` and written out when it carries a
/// value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countable {
    pub counter_key: usize,
    pub value: Option<String>,
}

pub struct ItemCountingStream<W> {
    counts: Vec<u64>,
    writer: Option<W>,
    error: Option<io::Error>,
}

impl<W: Write> ItemCountingStream<W> {
    pub fn new(key_count: usize, writer: Option<W>) -> Self {
        Self {
            counts: vec![0; key_count],
            writer,
            error: None,
        }
    }

    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    pub fn push(&mut self, countable: Countable) {
        let key = countable.counter_key;
        if key >= self.counts.len() {
            self.counts.resize(key + 1, 0);
        }
        self.counts[key] += 1;

        if self.error.is_some() {
            return;
        }
        if let (Some(writer), Some(value)) = (&mut self.writer, countable.value) {
            if let Err(err) = writeln!(writer, "{value}") {
                self.error = Some(err);
            }
        }
    }

    pub fn count(&self, key: usize) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn finish(mut self) -> Result<Vec<u64>> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(self.counts)
    }
}

impl<W> fmt::Display for ItemCountingStream<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_counts(f, &self.counts)
    }
}

fn fmt_counts(f: &mut fmt::Formatter<'_>, counts: &[u64]) -> fmt::Result {
    write!(f, "{} (", counts.iter().sum::<u64>())?;
    for (i, count) in counts.iter().enumerate() {
        if i > 0 {
            f.write_str("\t")?;
        }
        write!(f, "{count}")?;
    }
    f.write_str(")")
}

/// Counter key of a pattern with `line_count` lines: a flap pattern has at
/// least two lines and always an even number of them.
pub fn counter_key(line_count: usize) -> usize {
    (line_count / 2).saturating_sub(1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoder {
    // compressed crease pattern string
    CpString,
    CountOnly,
}

impl Encoder {
    fn countable(self, line_count: usize, value: impl FnOnce() -> String) -> Countable {
        Countable {
            counter_key: counter_key(line_count),
            value: match self {
                Encoder::CpString => Some(value()),
                Encoder::CountOnly => None,
            },
        }
    }

    pub fn encode_assignment(self, skeleton: &Skeleton, minors: &BitSet) -> Countable {
        self.countable(skeleton.count(), || skeleton.encode(minors))
    }

    pub fn encode_skeleton(self, skeleton: &Skeleton) -> Countable {
        self.countable(skeleton.count(), || skeleton.encode_flap())
    }

    pub fn encode_pattern(self, pattern: &[u8]) -> Countable {
        self.countable(direct::line_count(pattern), || direct::encode(pattern))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub place_count: usize,
    pub kawasaki: Option<EnumerationStats>,
    pub mv: Option<EnumerationStats>,
    pub maekawa_valid_count: u64,
    pub counts: Vec<u64>,
}

impl Report {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn sufficient_rate(&self) -> Option<f64> {
        let answers = self.mv?.answer_count;
        (self.maekawa_valid_count > 0).then(|| answers as f64 / self.maekawa_valid_count as f64)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(stats) = &self.kawasaki {
            writeln!(f, "kawasaki efficiency {}", stats.efficiency())?;
        }
        if let Some(stats) = &self.mv {
            writeln!(f, "mv efficiency       {}", stats.efficiency())?;
        }
        if let Some(rate) = self.sufficient_rate() {
            writeln!(f, "#pattern/#(k&m)     {rate}")?;
        }
        f.write_str(" #pattern = ")?;
        fmt_counts(f, &self.counts)
    }
}

/// Enumerates the patterns of `place_count` places with `algorithm`. Every
/// pattern goes to `writer`, one per line, when one is given.
pub fn run<W: Write + Send>(
    place_count: usize,
    algorithm: Algorithm,
    writer: Option<W>,
) -> Result<Report> {
    let mut stream = ItemCountingStream::new(place_count / 2, writer);
    let mut report = Report {
        place_count,
        ..Report::default()
    };

    info!(place_count, %algorithm, "enumerating");

    match algorithm.plan() {
        Plan::Skeletons => {
            let encoder = encoder_for(&stream);
            report.kawasaki = Some(kawasaki::enumerate(place_count, &mut |skeleton| {
                stream.push(encoder.encode_skeleton(skeleton))
            }));
        }
        Plan::Direct => {
            let encoder = encoder_for(&stream);
            report.mv = Some(direct::enumerate(place_count, &mut |pattern| {
                stream.push(encoder.encode_pattern(pattern))
            }));
        }
        Plan::Assignments {
            search,
            criterion,
            parallel: false,
        } => {
            let stage = Stage {
                place_count,
                search,
                criterion,
            };
            stage.run(&mut stream, &mut report);
        }
        Plan::Assignments {
            search,
            criterion,
            parallel: true,
        } => {
            let stage = Stage {
                place_count,
                search,
                criterion,
            };
            stage.run_parallel(&mut stream, &mut report);
        }
    }

    if let Some(stats) = &report.kawasaki {
        info!("kawasaki stage: {stats}");
    }
    if let Some(stats) = &report.mv {
        info!("mv stage: {stats}");
    }

    report.counts = stream.finish()?;
    Ok(report)
}

pub fn run_skeleton(algorithm: Algorithm, skeleton: &Skeleton) -> Result<Report> {
    let Plan::Assignments {
        search, criterion, ..
    } = algorithm.plan()
    else {
        return Err(Error::NotPerSkeleton(algorithm.name()));
    };

    let place_count = skeleton.place_count();
    let stage = Stage {
        place_count,
        search,
        criterion,
    };
    let mut stream = ItemCountingStream::new(place_count / 2, None::<io::Sink>);
    let (stats, maekawa_valid_count) = stage.search_skeleton(skeleton, &mut |minors| {
        stream.push(Encoder::CountOnly.encode_assignment(skeleton, minors))
    });

    Ok(Report {
        place_count,
        kawasaki: None,
        mv: Some(stats),
        maekawa_valid_count,
        counts: stream.finish()?,
    })
}

fn encoder_for<W: Write>(stream: &ItemCountingStream<W>) -> Encoder {
    if stream.has_writer() {
        Encoder::CpString
    } else {
        Encoder::CountOnly
    }
}

/// Skeletons from stage 1, each searched for its MV assignments.
struct Stage {
    place_count: usize,
    search: mv::MvAlgorithm,
    criterion: crate::answer::Criterion,
}

impl Stage {
    fn search_skeleton(
        &self,
        skeleton: &Skeleton,
        output: &mut impl FnMut(&BitSet),
    ) -> (EnumerationStats, u64) {
        let mut detector = FlapAnswerDetector::new(self.criterion, skeleton);
        let stats = mv::enumerate(self.search, skeleton, &mut detector, output);
        debug!(
            skeleton = %skeleton.encode_flap(),
            answers = stats.answer_count,
            maekawa_valid = detector.maekawa_valid_count(),
            "searched"
        );
        (stats, detector.maekawa_valid_count())
    }

    fn run<W: Write>(&self, stream: &mut ItemCountingStream<W>, report: &mut Report) {
        let encoder = encoder_for(stream);
        let mut mv_stats = EnumerationStats::default();
        let mut maekawa_valid_count = 0;

        let kawasaki_stats = kawasaki::enumerate(self.place_count, &mut |skeleton| {
            let (stats, maekawa_valid) = self.search_skeleton(skeleton, &mut |minors| {
                stream.push(encoder.encode_assignment(skeleton, minors))
            });
            mv_stats += stats;
            maekawa_valid_count += maekawa_valid;
        });

        report.kawasaki = Some(kawasaki_stats);
        report.mv = Some(mv_stats);
        report.maekawa_valid_count = maekawa_valid_count;
    }

    // each task hands its results to the stream in one batch
    fn run_parallel<W: Write + Send>(
        &self,
        stream: &mut ItemCountingStream<W>,
        report: &mut Report,
    ) {
        let encoder = encoder_for(stream);

        let mut skeletons = Vec::new();
        let kawasaki_stats = kawasaki::enumerate(self.place_count, &mut |skeleton| {
            skeletons.push(skeleton.clone())
        });
        info!(skeletons = skeletons.len(), "stage 1 done");

        let mv_stats = AtomicStats::default();
        let maekawa_valid_count = AtomicU64::new(0);
        let stream = Mutex::new(stream);

        rayon::scope(|s| {
            for skeleton in &skeletons {
                let (mv_stats, maekawa_valid_count, stream) =
                    (&mv_stats, &maekawa_valid_count, &stream);

                s.spawn(move |_| {
                    let mut batch = Vec::new();
                    let (stats, maekawa_valid) = self.search_skeleton(skeleton, &mut |minors| {
                        batch.push(encoder.encode_assignment(skeleton, minors))
                    });
                    mv_stats.add(stats);
                    maekawa_valid_count.fetch_add(maekawa_valid, Ordering::Relaxed);

                    let mut stream = stream.lock().unwrap_or_else(PoisonError::into_inner);
                    for countable in batch {
                        stream.push(countable);
                    }
                });
            }
        });

        report.kawasaki = Some(kawasaki_stats);
        report.mv = Some(mv_stats.into_inner());
        report.maekawa_valid_count = maekawa_valid_count.into_inner();
    }
}

#[cfg(test)]
use std::collections::HashSet;

#[cfg(test)]
fn counts(place_count: usize, algorithm: Algorithm) -> Report {
    run(place_count, algorithm, None::<io::Sink>).unwrap()
}

#[test]
fn test_foldable_counts() {
    for (n, expected) in [(6, 6), (8, 20), (10, 87), (12, 420), (14, 2254), (16, 12676)] {
        assert_eq!(counts(n, Algorithm::CpLinear).total(), expected, "n = {n}");
    }
}

#[test]
fn test_counts_per_key() {
    assert_eq!(counts(8, Algorithm::Cp).counts, vec![1, 4, 10, 5]);
    assert_eq!(counts(10, Algorithm::CpMvLsl).counts, vec![1, 6, 29, 35, 16]);
    assert_eq!(counts(10, Algorithm::CpDirect).counts, vec![1, 6, 29, 35, 16]);
}

#[test]
fn test_algorithms_agree() {
    let expected = counts(12, Algorithm::Cp).counts;
    for algorithm in [
        Algorithm::CpLinear,
        Algorithm::CpMvLsl,
        Algorithm::CpExMvLsl,
        Algorithm::CpLinearMv,
        Algorithm::CpDirect,
        Algorithm::CpCrimp,
        Algorithm::CpParallel,
        Algorithm::CpExLslParallel,
    ] {
        assert_eq!(counts(12, algorithm).counts, expected, "{algorithm}");
    }
}

#[test]
fn test_maekawa_counts() {
    for (n, expected) in [(6, 7), (8, 27), (10, 143), (12, 837)] {
        let report = counts(n, Algorithm::Maekawa);
        assert_eq!(report.total(), expected, "n = {n}");
        assert_eq!(report.maekawa_valid_count, expected);
        assert_eq!(counts(n, Algorithm::MaekawaParallel), report);
    }
}

#[test]
fn test_report() {
    let report = counts(8, Algorithm::Cp);
    assert_eq!(report.kawasaki.unwrap().answer_count, 7);
    assert_eq!(report.mv.unwrap().answer_count, 20);
    assert_eq!(report.maekawa_valid_count, 27);
    assert_eq!(report.sufficient_rate(), Some(20.0 / 27.0));
    assert!(report.to_string().ends_with(" #pattern = 20 (1\t4\t10\t5)"));

    let skeletons = counts(8, Algorithm::Kawasaki);
    assert_eq!(skeletons.total(), 7);
    assert_eq!(skeletons.sufficient_rate(), None);
    assert!(!skeletons.to_string().contains("mv efficiency"));
}

#[test]
fn test_per_skeleton_runs_add_up() {
    let mut total = Report::default();
    kawasaki::enumerate(10, &mut |skeleton| {
        let report = run_skeleton(Algorithm::CpExMvLsl, skeleton).unwrap();
        let stats = report.mv.unwrap();
        assert_eq!(report.total(), stats.answer_count);

        total.counts.resize(report.counts.len(), 0);
        for (sum, count) in total.counts.iter_mut().zip(&report.counts) {
            *sum += count;
        }
    });
    assert_eq!(total.counts, vec![1, 6, 29, 35, 16]);

    let skeleton = Skeleton::from_items(8, [0, 2, 4, 6]);
    assert!(matches!(
        run_skeleton(Algorithm::CpDirect, &skeleton),
        Err(Error::NotPerSkeleton("cp_direct"))
    ));
}

#[test]
fn test_parallel_writes_same_patterns() {
    let lines = |algorithm| {
        let mut out = Vec::new();
        run(12, algorithm, Some(&mut out)).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>()
    };

    let sequential = lines(Algorithm::CpMvLsl);
    let parallel = lines(Algorithm::CpParallel);
    assert_eq!(sequential.len(), 420);
    assert_eq!(
        sequential.iter().collect::<HashSet<_>>(),
        parallel.iter().collect::<HashSet<_>>()
    );
}

#[test]
fn test_stream() {
    let mut stream = ItemCountingStream::new(2, Some(Vec::new()));
    stream.push(Countable {
        counter_key: 0,
        value: Some("+2+2".to_owned()),
    });
    stream.push(Countable {
        counter_key: 1,
        value: None,
    });
    stream.push(Countable {
        counter_key: 1,
        value: Some("+1+1+1-1".to_owned()),
    });

    assert_eq!(stream.count(1), 2);
    assert_eq!(stream.count(5), 0);
    assert_eq!(stream.total(), 3);
    assert_eq!(stream.to_string(), "3 (1\t2)");

    let mut out = Vec::new();
    let mut stream = ItemCountingStream::new(1, Some(&mut out));
    stream.push(Countable {
        counter_key: 0,
        value: Some("+2+2".to_owned()),
    });
    assert_eq!(stream.finish().unwrap(), vec![1]);
    assert_eq!(out, b"+2+2\n");
}

#[test]
fn test_encoders() {
    let skeleton = Skeleton::from_items(8, [0, 1, 3, 6]);
    let minors = BitSet::from_indices(4, [2]);

    assert_eq!(
        Encoder::CpString.encode_assignment(&skeleton, &minors),
        Countable {
            counter_key: 1,
            value: Some("++1-2+1".to_owned()),
        }
    );
    assert_eq!(
        Encoder::CountOnly.encode_skeleton(&skeleton),
        Countable {
            counter_key: 1,
            value: None,
        }
    );
    assert_eq!(counter_key(2), 0);
    assert_eq!(counter_key(0), 0);
}

#[test]
fn test_failed_write_is_reported() {
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut stream = ItemCountingStream::new(1, Some(Broken));
    stream.push(Countable {
        counter_key: 0,
        value: Some("+2+2".to_owned()),
    });
    assert_eq!(stream.count(0), 1);
    assert!(matches!(stream.finish(), Err(crate::Error::Io(_))));
}
