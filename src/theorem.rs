//! Necessary conditions of flat foldability at a single vertex.

use crate::{
    bitset::{BitSet, IndexSet},
    search::{AnswerDetector, Pruning},
    skeleton::Skeleton,
};

/// Kawasaki: the alternating angle sum closes to zero on an even, nonempty
/// set of lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct KawasakiFlap;

impl AnswerDetector<Skeleton> for KawasakiFlap {
    #[inline]
    fn is_answer(&mut self, skeleton: &Skeleton) -> bool {
        let count = skeleton.count();
        count > 0 && count % 2 == 0 && skeleton.kawasaki_count_is_zero()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KawasakiPruning;

impl Pruning<Skeleton> for KawasakiPruning {
    #[inline]
    fn need_pruning(&mut self, skeleton: &Skeleton, _: usize) -> bool {
        !skeleton.kawasaki_count_can_be_zero()
    }
}

/// Maekawa over a set of minor lines: exactly `line_count / 2 - 1` of the
/// lines are minor.
#[derive(Clone, Copy, Debug)]
pub struct MaekawaTheorem {
    pub line_count: usize,
}

impl MaekawaTheorem {
    pub fn minor_count(&self) -> usize {
        (self.line_count / 2).saturating_sub(1)
    }

    pub fn holds(&self, minors: &impl IndexSet) -> bool {
        minors.count() == self.minor_count()
    }
}

impl AnswerDetector<BitSet> for MaekawaTheorem {
    #[inline]
    fn is_answer(&mut self, minors: &BitSet) -> bool {
        self.holds(minors)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MaekawaPruning {
    pub line_count: usize,
}

impl<S: ?Sized> Pruning<S> for MaekawaPruning {
    #[inline]
    fn need_pruning(&mut self, _: &S, depth: usize) -> bool {
        depth > (self.line_count / 2).saturating_sub(1)
    }
}

/// Running Kawasaki sum over a 1-based ternary string where 0 means no line.
#[derive(Clone, Copy, Debug)]
pub struct KawasakiValues {
    sum: i64,
    sign: i64,
    prev: usize,
    head: usize,
}

impl Default for KawasakiValues {
    fn default() -> Self {
        Self {
            sum: 0,
            sign: 1,
            prev: 0,
            head: 0,
        }
    }
}

impl KawasakiValues {
    fn norm(&self, t: usize, n: usize) -> i64 {
        ((n + t - self.head) % n) as i64
    }

    /// Angle still left from `t` until the circle closes at the head.
    pub fn remain(&self, t: usize, n: usize) -> i64 {
        n as i64 - self.norm(t, n)
    }

    pub fn next(&self, a: &[u8], t: usize, n: usize) -> Self {
        if a[t] == FLAT {
            return *self;
        }

        let mut next = *self;
        let angle = if self.head == 0 {
            next.head = t;
            0
        } else {
            self.norm(t, n) - self.norm(self.prev, n)
        };
        next.sum += next.sign * angle;
        next.sign = -next.sign;
        next.prev = t;
        next
    }

    /// Whether a line at or after `t` can still close the sum.
    pub fn can_hold(&self, t: usize, n: usize) -> bool {
        let angle = self.norm(t, n) - self.norm(self.prev, n);
        (self.sum + self.sign * angle).abs() <= self.remain(t, n)
    }

    pub fn holds(&self, n: usize) -> bool {
        self.sum + self.sign * self.remain(self.prev, n) == 0
    }
}

pub const FLAT: u8 = 0;
pub const MAJOR: u8 = 1;
pub const MINOR: u8 = 2;

/// Major/minor tallies of a partial ternary string.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaekawaValues {
    major: i64,
    minor: i64,
}

impl MaekawaValues {
    pub fn next(&self, a: &[u8], t: usize) -> Self {
        let mut next = *self;
        match a[t] {
            MAJOR => next.major += 1,
            MINOR => next.minor += 1,
            _ => (),
        }
        next
    }

    /// Whether `remain` more lines can still reach `major - minor == 2`.
    pub fn can_hold(&self, remain: i64) -> bool {
        if self.major < self.minor {
            self.major + remain - self.minor >= 2
        } else {
            self.major - 2 <= self.minor + remain
        }
    }

    pub fn holds(&self) -> bool {
        self.major - self.minor == 2
    }
}

#[test]
fn test_kawasaki_flap() {
    let mut flap = KawasakiFlap;
    assert!(flap.is_answer(&Skeleton::from_items(8, [0, 2, 5, 7])));
    assert!(flap.is_answer(&Skeleton::from_items(8, [0, 4])));
    assert!(!flap.is_answer(&Skeleton::new(8)));
    assert!(!flap.is_answer(&Skeleton::from_items(6, [0, 2, 4])));
}

#[test]
fn test_maekawa() {
    let mut theorem = MaekawaTheorem { line_count: 8 };
    assert!(theorem.is_answer(&BitSet::from_indices(8, [0, 1, 2])));
    assert!(!theorem.is_answer(&BitSet::from_indices(8, [0, 1])));

    let mut pruning = MaekawaPruning { line_count: 8 };
    assert!(!pruning.need_pruning(&(), 3));
    assert!(pruning.need_pruning(&(), 4));
}

#[test]
fn test_kawasaki_values() {
    // square cross on 8 places: lines at 1, 3, 5, 7 (1-based)
    let n = 8;
    let mut a = vec![FLAT; n + 1];
    let mut values = KawasakiValues::default();
    for t in 1..=n {
        if t % 2 == 1 {
            a[t] = MAJOR;
        }
        values = values.next(&a, t, n);
        assert!(values.can_hold(t + 1, n) || t == n);
    }
    assert!(values.holds(n));

    let mut skewed = KawasakiValues::default();
    let mut a = vec![FLAT; n + 1];
    for t in [1, 2, 3, 5] {
        a[t] = MINOR;
        skewed = skewed.next(&a, t, n);
    }
    assert!(!skewed.holds(n));
}

#[test]
fn test_maekawa_values() {
    let a = [FLAT, MAJOR, MAJOR, MINOR, MAJOR];
    let mut values = MaekawaValues::default();
    for t in 1..a.len() {
        values = values.next(&a, t);
    }
    assert!(values.holds());
    assert!(values.can_hold(0));

    let behind = MaekawaValues { major: 0, minor: 3 };
    assert!(!behind.can_hold(4));
    assert!(behind.can_hold(5));
}
