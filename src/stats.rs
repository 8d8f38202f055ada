use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    sync::atomic::{AtomicU64, Ordering},
};

/// Diagnostic counters of one search run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnumerationStats {
    pub call_count: u64,
    pub valid_call_count: u64,
    pub answer_count: u64,
}

impl EnumerationStats {
    /// answers per node that survived pruning
    pub fn efficiency(&self) -> f64 {
        if self.valid_call_count == 0 {
            return 0.0;
        }
        self.answer_count as f64 / self.valid_call_count as f64
    }

    /// nodes that survived pruning per visited node
    pub fn pruning_rate(&self) -> f64 {
        if self.call_count == 0 {
            return 0.0;
        }
        self.valid_call_count as f64 / self.call_count as f64
    }
}

impl Add for EnumerationStats {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for EnumerationStats {
    fn add_assign(&mut self, rhs: Self) {
        self.call_count += rhs.call_count;
        self.valid_call_count += rhs.valid_call_count;
        self.answer_count += rhs.answer_count;
    }
}

impl Sum for EnumerationStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for EnumerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "call: {}, valid call: {}, answer: {}, efficiency: {:.5}",
            self.call_count,
            self.valid_call_count,
            self.answer_count,
            self.efficiency()
        )
    }
}

/// `EnumerationStats` that many rayon tasks add into.
#[derive(Default)]
pub struct AtomicStats {
    call_count: AtomicU64,
    valid_call_count: AtomicU64,
    answer_count: AtomicU64,
}

impl AtomicStats {
    pub fn add(&self, stats: EnumerationStats) {
        self.call_count
            .fetch_add(stats.call_count, Ordering::Relaxed);
        self.valid_call_count
            .fetch_add(stats.valid_call_count, Ordering::Relaxed);
        self.answer_count
            .fetch_add(stats.answer_count, Ordering::Relaxed);
    }

    pub fn into_inner(self) -> EnumerationStats {
        EnumerationStats {
            call_count: self.call_count.into_inner(),
            valid_call_count: self.valid_call_count.into_inner(),
            answer_count: self.answer_count.into_inner(),
        }
    }
}

#[test]
fn test_accumulate() {
    let a = EnumerationStats {
        call_count: 10,
        valid_call_count: 4,
        answer_count: 2,
    };
    let b = EnumerationStats {
        call_count: 1,
        valid_call_count: 1,
        answer_count: 0,
    };

    let mut c = a;
    c += b;
    assert_eq!(c, a + b);
    assert_eq!(c.call_count, 11);
    assert_eq!([a, b].into_iter().sum::<EnumerationStats>(), c);
    assert_eq!(a.efficiency(), 0.5);
    assert_eq!(EnumerationStats::default().efficiency(), 0.0);

    let atomic = AtomicStats::default();
    rayon::scope(|s| {
        for _ in 0..8 {
            s.spawn(|_| atomic.add(a));
        }
    });
    assert_eq!(atomic.into_inner().answer_count, 16);
}
