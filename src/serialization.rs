use {
    crate::{pipeline::Report, skeleton::Skeleton, stats::EnumerationStats, Error, Result},
    nanoserde::{DeBin, SerBin},
    std::{
        collections::HashMap,
        fmt,
        iter::Sum,
        ops::{Add, AddAssign},
    },
};

/// A skeleton as `[place_count, ..items in the order they were added]`.
#[derive(Clone, Debug, SerBin, DeBin, PartialEq, Eq, Hash)]
pub struct SerSkeleton(pub Vec<u8>);

impl SerSkeleton {
    pub fn ser(skeleton: &Skeleton) -> Result<Self> {
        let byte = |what, value: usize| {
            u8::try_from(value).map_err(|_| Error::OutOfRange { what, value })
        };

        let mut out = Vec::with_capacity(skeleton.count() + 1);
        out.push(byte("place count", skeleton.place_count())?);
        for &item in skeleton.items() {
            out.push(byte("line", item)?);
        }
        Ok(Self(out))
    }

    pub fn de(&self) -> Result<Skeleton> {
        let (&place_count, items) = self
            .0
            .split_first()
            .ok_or_else(|| Error::Wire("empty skeleton".to_owned()))?;
        let place_count = usize::from(place_count);

        let mut skeleton = Skeleton::new(place_count);
        for &item in items {
            let item = usize::from(item);
            if item >= place_count || skeleton.contains(item) {
                return Err(Error::Wire(format!(
                    "line {item} in a skeleton of {place_count} places"
                )));
            }
            skeleton.add(item);
        }
        Ok(skeleton)
    }

    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Stage 2 outcome of one skeleton, or the sum over many.
#[derive(Clone, Debug, Default, SerBin, DeBin, PartialEq, Eq)]
pub struct Results {
    pub counts: Vec<u64>,
    pub call_count: u64,
    pub valid_call_count: u64,
    pub answer_count: u64,
    pub maekawa_valid_count: u64,
}

impl Results {
    pub fn stats(&self) -> EnumerationStats {
        EnumerationStats {
            call_count: self.call_count,
            valid_call_count: self.valid_call_count,
            answer_count: self.answer_count,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn into_report(self, place_count: usize, kawasaki: Option<EnumerationStats>) -> Report {
        Report {
            place_count,
            kawasaki,
            mv: Some(self.stats()),
            maekawa_valid_count: self.maekawa_valid_count,
            counts: self.counts,
        }
    }
}

impl From<&Report> for Results {
    fn from(report: &Report) -> Self {
        let stats = report.mv.unwrap_or_default();
        Self {
            counts: report.counts.clone(),
            call_count: stats.call_count,
            valid_call_count: stats.valid_call_count,
            answer_count: stats.answer_count,
            maekawa_valid_count: report.maekawa_valid_count,
        }
    }
}

impl AddAssign<&Results> for Results {
    fn add_assign(&mut self, rhs: &Results) {
        if self.counts.len() < rhs.counts.len() {
            self.counts.resize(rhs.counts.len(), 0);
        }
        for (count, &other) in self.counts.iter_mut().zip(&rhs.counts) {
            *count += other;
        }
        self.call_count += rhs.call_count;
        self.valid_call_count += rhs.valid_call_count;
        self.answer_count += rhs.answer_count;
        self.maekawa_valid_count += rhs.maekawa_valid_count;
    }
}

impl Add for Results {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += &rhs;
        self
    }
}

impl Sum for Results {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.total())?;
        for (i, count) in self.counts.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{count}")?;
        }
        write!(f, "), {}", self.stats())
    }
}

#[derive(Clone, Debug, SerBin, DeBin, PartialEq, Eq)]
pub struct SerResults(pub Vec<u8>);

impl SerResults {
    pub fn ser(results: &Results) -> Self {
        Self(results.serialize_bin())
    }

    pub fn de(&self) -> Result<Results> {
        Results::deserialize_bin(&self.0).map_err(|err| Error::Wire(format!("{err:?}")))
    }

    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Sent by a worker: finished jobs, and how many new ones it wants.
#[derive(Debug, Default, SerBin, DeBin)]
pub struct JobRequest {
    pub jobs_wanted: usize,
    pub results: HashMap<SerSkeleton, SerResults>,
}

/// Sent back by the server. No jobs means the run is over.
#[derive(Debug, SerBin, DeBin, PartialEq, Eq)]
pub struct JobResponse {
    pub place_count: usize,
    pub algorithm: String,
    pub jobs: Vec<SerSkeleton>,
}

pub fn deserialize<T: DeBin>(bytes: &[u8]) -> Result<T> {
    T::deserialize_bin(bytes).map_err(|err| Error::Wire(format!("{err:?}")))
}

#[cfg(test)]
use {crate::kawasaki, rand::Rng};

#[test]
fn test_skeleton_serialization() {
    kawasaki::enumerate(12, &mut |skeleton| {
        let ser = SerSkeleton::ser(skeleton).unwrap();
        assert_eq!(ser.as_slice()[0], 12);
        assert_eq!(&ser.de().unwrap(), skeleton);
    });

    let mut rng = rand::thread_rng();
    for _ in 0..100 {
        let place_count = rng.gen_range(2..=255);
        let base = rng.gen_range(0..place_count);
        let items = (0..place_count)
            .map(|i| (base + i) % place_count)
            .filter(|_| rng.gen_bool(0.3))
            .collect::<Vec<_>>();
        let skeleton = Skeleton::from_items(place_count, items);

        let ser = SerSkeleton::ser(&skeleton).unwrap();
        let from_db = SerSkeleton::from_slice(ser.as_slice());
        assert_eq!(from_db.de().unwrap(), skeleton);
    }
}

#[test]
fn test_malformed_skeletons() {
    assert!(matches!(SerSkeleton(vec![]).de(), Err(Error::Wire(_))));
    assert!(matches!(SerSkeleton(vec![8, 1, 8]).de(), Err(Error::Wire(_))));
    assert!(matches!(SerSkeleton(vec![8, 1, 1]).de(), Err(Error::Wire(_))));
    assert!(matches!(
        SerSkeleton::ser(&Skeleton::from_items(300, [0, 150])),
        Err(Error::OutOfRange { value: 300, .. })
    ));
}

#[test]
fn test_results() {
    let a = Results {
        counts: vec![1, 4],
        call_count: 10,
        valid_call_count: 8,
        answer_count: 5,
        maekawa_valid_count: 6,
    };
    let b = Results {
        counts: vec![0, 2, 3],
        call_count: 1,
        valid_call_count: 1,
        answer_count: 5,
        maekawa_valid_count: 5,
    };

    let sum: Results = [a.clone(), b.clone()].into_iter().sum();
    assert_eq!(sum.counts, vec![1, 6, 3]);
    assert_eq!(sum.answer_count, 10);
    assert_eq!(sum.maekawa_valid_count, 11);
    assert!(sum.to_string().starts_with("10 (1\t6\t3)"));

    let ser = SerResults::ser(&a);
    assert_eq!(SerResults::from_slice(ser.as_slice()).de().unwrap(), a);
    assert!(SerResults(vec![1, 2]).de().is_err());

    let report = sum.clone().into_report(8, None);
    assert_eq!(Results::from(&report), sum);
}

#[test]
fn test_job_messages() {
    let skeleton = Skeleton::from_items(8, [0, 2, 4, 6]);
    let key = SerSkeleton::ser(&skeleton).unwrap();

    let mut request = JobRequest {
        jobs_wanted: 4,
        ..JobRequest::default()
    };
    request
        .results
        .insert(key.clone(), SerResults::ser(&Results::default()));

    let request: JobRequest = deserialize(&request.serialize_bin()).unwrap();
    assert_eq!(request.jobs_wanted, 4);
    assert_eq!(request.results[&key].de().unwrap(), Results::default());

    let response = JobResponse {
        place_count: 8,
        algorithm: "cp_linear".to_owned(),
        jobs: vec![key],
    };
    assert_eq!(
        deserialize::<JobResponse>(&response.serialize_bin()).unwrap(),
        response
    );
    assert!(deserialize::<JobResponse>(&[0xff]).is_err());
}
