//! Bracelets (necklaces up to reflection) in constant amortized time, after
//! Sawada, "Generating bracelets in constant amortized time", SIAM J. Comput.
//! 31(1), 2001.
//!
//! Positions are 1-based inside the recursion; `a[0]` is a fixed 0.

use crate::{
    bitset::IndexSet,
    search::{AnswerDetector, Pruning},
    stats::EnumerationStats,
};

/// Binary bracelets stored in a set: position `t` is 1 iff the set contains
/// `t - 1`. Members are added and removed in stack order, so incremental
/// sets like `Skeleton` can be driven directly.
pub struct BinaryBracelets<P, A> {
    pub pruning: P,
    pub answer: A,
    n: isize,
    stats: EnumerationStats,
}

#[inline]
fn at<S: IndexSet>(set: &S, i: isize) -> u8 {
    if i == 0 {
        0
    } else {
        set.contains(i as usize - 1) as u8
    }
}

impl<P, A> BinaryBracelets<P, A> {
    pub fn new(pruning: P, answer: A) -> Self {
        Self {
            pruning,
            answer,
            n: 0,
            stats: EnumerationStats::default(),
        }
    }

    pub fn into_parts(self) -> (P, A) {
        (self.pruning, self.answer)
    }

    /// Every bracelet over `set.capacity()` places that passes the pruning
    /// and answer rules, starting from an empty `set`.
    pub fn enumerate<S>(&mut self, set: &mut S, output: &mut impl FnMut(&S)) -> EnumerationStats
    where
        S: IndexSet,
        P: Pruning<S>,
        A: AnswerDetector<S>,
    {
        debug_assert_eq!(set.count(), 0);
        self.n = set.capacity() as isize;
        self.stats = EnumerationStats::default();
        self.generate(set, 1, 1, 1, -1, 0, false, output);
        self.stats
    }

    fn check_rev<S: IndexSet>(set: &S, t: isize, i: isize) -> i8 {
        for j in i + 1..=(t + 1) / 2 {
            match at(set, j).cmp(&at(set, t - j + 1)) {
                std::cmp::Ordering::Less => return 0,
                std::cmp::Ordering::Greater => return -1,
                std::cmp::Ordering::Equal => (),
            }
        }
        1
    }

    #[allow(clippy::too_many_arguments)]
    fn generate<S>(
        &mut self,
        set: &mut S,
        t: isize,
        p: isize,
        mut r: isize,
        mut u: isize,
        mut v: isize,
        mut rs: bool,
        output: &mut impl FnMut(&S),
    ) where
        S: IndexSet,
        P: Pruning<S>,
        A: AnswerDetector<S>,
    {
        let n = self.n;
        self.stats.call_count += 1;

        if self.pruning.need_pruning(set, (t - 1) as usize) {
            return;
        }
        self.stats.valid_call_count += 1;

        if t - 1 > (n - r) / 2 + r {
            let (x, y) = (at(set, t - 1), at(set, n - t + 2 + r));
            if x > y {
                rs = false;
            } else if x < y {
                rs = true;
            }
        }

        if t > n {
            if !rs && n % p == 0 && self.answer.is_answer(set) {
                self.stats.answer_count += 1;
                output(set);
            }
            return;
        }

        // a[t] = a[t - p]
        let copied = at(set, t - p) == 1;
        if copied {
            set.add(t as usize - 1);
        }

        if at(set, t) == at(set, 1) {
            v += 1;
        } else {
            v = 0;
        }
        if u == -1 && at(set, t - 1) != at(set, 1) {
            u = t - 2;
            r = t - 2;
        }

        let closes_periodic = u != -1 && t == n && at(set, n) == at(set, 1);
        if !closes_periodic {
            if u == v {
                match Self::check_rev(set, t, u) {
                    0 => self.generate(set, t + 1, p, r, u, v, rs, output),
                    1 => self.generate(set, t + 1, p, t, u, v, false, output),
                    _ => (),
                }
            } else {
                self.generate(set, t + 1, p, r, u, v, rs, output);
            }
        }

        if copied {
            set.remove(t as usize - 1);
        }

        if at(set, t - p) == 0 {
            set.add(t as usize - 1);
            self.generate(set, t + 1, t, r, u, 0, rs, output);
            set.remove(t as usize - 1);
        }
    }
}

/// Bracelets of length `n` over the alphabet `0..k`.
pub struct KaryBracelets {
    n: isize,
    k: u8,
    a: Vec<u8>,
}

impl KaryBracelets {
    pub fn new(n: usize, k: u8) -> Self {
        Self {
            n: n as isize,
            k,
            a: vec![0; n + 1],
        }
    }

    /// Calls `output` with each bracelet (without the fixed position 0).
    pub fn enumerate(&mut self, output: &mut impl FnMut(&[u8])) -> EnumerationStats {
        let mut stats = EnumerationStats::default();
        self.a.iter_mut().for_each(|c| *c = 0);
        self.generate(1, 1, 1, -1, 0, false, &mut stats, output);
        stats
    }

    fn check_rev(&self, t: isize, i: isize) -> i8 {
        let a = &self.a;
        for j in i + 1..=(t + 1) / 2 {
            match a[j as usize].cmp(&a[(t - j + 1) as usize]) {
                std::cmp::Ordering::Less => return 0,
                std::cmp::Ordering::Greater => return -1,
                std::cmp::Ordering::Equal => (),
            }
        }
        1
    }

    #[allow(clippy::too_many_arguments)]
    fn generate(
        &mut self,
        t: isize,
        p: isize,
        mut r: isize,
        mut u: isize,
        mut v: isize,
        mut rs: bool,
        stats: &mut EnumerationStats,
        output: &mut impl FnMut(&[u8]),
    ) {
        let n = self.n;
        stats.call_count += 1;
        stats.valid_call_count += 1;

        if t - 1 > (n - r) / 2 + r {
            let (x, y) = (self.a[(t - 1) as usize], self.a[(n - t + 2 + r) as usize]);
            if x > y {
                rs = false;
            } else if x < y {
                rs = true;
            }
        }

        if t > n {
            if !rs && n % p == 0 {
                stats.answer_count += 1;
                output(&self.a[1..]);
            }
            return;
        }

        let ti = t as usize;
        self.a[ti] = self.a[(t - p) as usize];

        if self.a[ti] == self.a[1] {
            v += 1;
        } else {
            v = 0;
        }
        if u == -1 && self.a[ti - 1] != self.a[1] {
            u = t - 2;
            r = t - 2;
        }

        let closes_periodic = u != -1 && t == n && self.a[n as usize] == self.a[1];
        if !closes_periodic {
            if u == v {
                match self.check_rev(t, u) {
                    0 => self.generate(t + 1, p, r, u, v, rs, stats, output),
                    1 => self.generate(t + 1, p, t, u, v, false, stats, output),
                    _ => (),
                }
            } else {
                self.generate(t + 1, p, r, u, v, rs, stats, output);
            }
        }

        for j in self.a[(t - p) as usize] + 1..self.k {
            self.a[ti] = j;
            self.generate(t + 1, t, r, u, 0, rs, stats, output);
        }
    }
}

#[cfg(test)]
use crate::{
    bitset::BitSet,
    canonical::canonical_on_symmetry,
    search::{EverythingIsAnswer, NoPruning},
};

#[cfg(test)]
fn binary_count(n: usize) -> u64 {
    let mut bracelets = BinaryBracelets::new(NoPruning, EverythingIsAnswer);
    bracelets
        .enumerate(&mut BitSet::new(n), &mut |_| ())
        .answer_count
}

#[test]
fn test_binary_counts() {
    assert_eq!(binary_count(4), 6);
    assert_eq!(binary_count(8), 30);
    assert_eq!(binary_count(10), 78);
    assert_eq!(binary_count(12), 224);
    assert_eq!(binary_count(16), 2250);
}

#[test]
fn test_binary_bracelets_are_distinct() {
    let n = 12;
    let mut forms = rustc_hash::FxHashSet::default();
    let mut bracelets = BinaryBracelets::new(NoPruning, EverythingIsAnswer);
    bracelets.enumerate(&mut BitSet::new(n), &mut |set: &BitSet| {
        let bits: Vec<u8> = (0..n).map(|i| set.contains(i) as u8).collect();
        assert!(forms.insert(canonical_on_symmetry(&bits)));
    });
    assert_eq!(forms.len(), 224);
}

#[test]
fn test_kary_counts() {
    let count = |n, k| KaryBracelets::new(n, k).enumerate(&mut |_| ()).answer_count;

    assert_eq!(count(4, 3), 21);
    assert_eq!(count(8, 3), 498);
    assert_eq!(count(12, 2), 224);
}

#[test]
fn test_pruning_hook() {
    // at most two members
    let mut bracelets =
        BinaryBracelets::new(|set: &BitSet, _: usize| set.count() > 2, EverythingIsAnswer);
    let stats = bracelets.enumerate(&mut BitSet::new(8), &mut |set| assert!(set.count() <= 2));

    // empty, one line, and the four distances of a pair
    assert_eq!(stats.answer_count, 1 + 1 + 4);
    assert!(stats.valid_call_count < stats.call_count);
}
