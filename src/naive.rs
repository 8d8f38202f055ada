//! Exhaustive subset search that removes symmetric answers afterwards, as a
//! baseline for the canonical-form searches.

use {
    crate::{
        bitset::BitSet,
        inverter::Inverter,
        search::{AnswerDetector, Pruning},
        stats::EnumerationStats,
        symmetry::{invert_set, DenseSymmetryDetector},
    },
    rustc_hash::FxHashSet,
};

pub struct NaiveSearch<I, P, A> {
    inverters: Vec<I>,
    pub pruning: P,
    pub answer: A,
    found: FxHashSet<Vec<usize>>,
    stats: EnumerationStats,
}

impl<I: Inverter, P, A> NaiveSearch<I, P, A> {
    /// `inverters` are the non-identity symmetries of the search space.
    pub fn new(inverters: Vec<I>, pruning: P, answer: A) -> Self {
        Self {
            inverters,
            pruning,
            answer,
            found: FxHashSet::default(),
            stats: EnumerationStats::default(),
        }
    }

    /// Smallest member list among `set` and its images.
    pub fn canonical(&self, set: &BitSet) -> Vec<usize> {
        self.inverters
            .iter()
            .map(|inverter| invert_set(set, inverter).iter().collect::<Vec<_>>())
            .fold(set.iter().collect::<Vec<_>>(), |min, image| min.min(image))
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    pub fn enumerate(
        &mut self,
        seed: &mut BitSet,
        cand_end: usize,
        output: &mut impl FnMut(&BitSet),
    ) -> EnumerationStats
    where
        P: Pruning<BitSet>,
        A: AnswerDetector<BitSet>,
    {
        self.stats = EnumerationStats::default();
        self.recurse(seed, 0, cand_end, 0, output);
        self.stats
    }

    fn recurse(
        &mut self,
        cur: &mut BitSet,
        cand_begin: usize,
        cand_end: usize,
        depth: usize,
        output: &mut impl FnMut(&BitSet),
    ) where
        P: Pruning<BitSet>,
        A: AnswerDetector<BitSet>,
    {
        self.stats.call_count += 1;

        if self.pruning.need_pruning(&*cur, depth) {
            return;
        }
        self.stats.valid_call_count += 1;

        if self.answer.is_answer(cur) {
            let key = self.canonical(cur);
            if self.found.insert(key) {
                self.stats.answer_count += 1;
                output(cur);
            }
        }

        for cand in cand_begin..cand_end {
            cur.add(cand);
            self.recurse(cur, cand + 1, cand_end, depth + 1, output);
            cur.remove(cand);
        }
    }
}

/// Naive counterpart of `symmetry::enumerate_circular`.
pub fn enumerate_circular(
    n: usize,
    pruning: impl Pruning<BitSet>,
    answer: impl AnswerDetector<BitSet>,
    output: &mut impl FnMut(&BitSet),
) -> EnumerationStats {
    let inverters = DenseSymmetryDetector::new(n).inverters().to_vec();
    let mut search = NaiveSearch::new(inverters, pruning, answer);
    search.enumerate(&mut BitSet::new(n), n, output)
}

#[cfg(test)]
use crate::{
    answer::{Criterion, FlapAnswerDetector},
    kawasaki,
    mv::{self, MvAlgorithm},
    search::{NoPruning, NotEmptyIsAnswer},
    symmetry::{self, MvSymmetryDetector},
    theorem::MaekawaPruning,
};

#[test]
fn test_circular_counts_match_canonical_search() {
    for n in 3..=12 {
        let naive = enumerate_circular(n, NoPruning, NotEmptyIsAnswer, &mut |_| ());
        let ppc = symmetry::enumerate_circular(n, NoPruning, NotEmptyIsAnswer, &mut |_| ());
        assert_eq!(naive.answer_count, ppc.answer_count, "n = {n}");
    }
}

#[test]
fn test_canonical() {
    let search = NaiveSearch::new(
        DenseSymmetryDetector::new(8).inverters().to_vec(),
        NoPruning,
        NotEmptyIsAnswer,
    );
    let a = BitSet::from_indices(8, [3, 5]);
    let b = BitSet::from_indices(8, [6, 0]);
    assert_eq!(search.canonical(&a), vec![0, 2]);
    assert_eq!(search.canonical(&a), search.canonical(&b));
}

#[test]
fn test_mv_counts_match_canonical_search() {
    for n in [6, 8, 10] {
        kawasaki::enumerate(n, &mut |skeleton| {
            let line_count = skeleton.count();
            let inverters = MvSymmetryDetector::new(n, skeleton.lines().iter())
                .inverters()
                .to_vec();

            let mut naive = NaiveSearch::new(
                inverters,
                MaekawaPruning { line_count },
                FlapAnswerDetector::new(Criterion::FoldableLinear, skeleton),
            );
            let mut seed = BitSet::new(line_count);
            let naive_stats = naive.enumerate(&mut seed, line_count, &mut |_| ());

            let mut detector = FlapAnswerDetector::new(Criterion::FoldableLinear, skeleton);
            let ppc_stats =
                mv::enumerate(MvAlgorithm::Plain, skeleton, &mut detector, &mut |_| ());

            assert_eq!(naive_stats.answer_count, ppc_stats.answer_count, "{skeleton:?}");
            assert!(naive_stats.valid_call_count >= ppc_stats.valid_call_count);
        });
    }
}
