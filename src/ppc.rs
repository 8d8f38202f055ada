//! Prefix-preserving closure search: every orbit under the symmetry group is
//! visited exactly once, at its representative whose members come earliest.

use crate::{
    bitset::IndexSet,
    inverter::Inverter,
    search::{AnswerDetector, CandidateFilter, DuplicateDetector, NoFilter, Pruning},
    stats::EnumerationStats,
};

/// Whether the image of `set` under `inverter` is known to come before `set`
/// in the search order.
///
/// Indices below `prefix_end` are decided, so the first difference there
/// settles the question both ways. Past the prefix only a member of the
/// image missing from `set` counts, as later additions can still fill the
/// other kind of gap.
pub fn known_modification_exists<S, I>(
    set: &S,
    elem_end: usize,
    prefix_end: usize,
    inverter: &I,
) -> bool
where
    S: IndexSet + ?Sized,
    I: Inverter + ?Sized,
{
    for m in 0..prefix_end {
        let i = inverter.invert(m);
        match (set.contains(m), set.contains(i)) {
            (false, true) => return true,
            (true, false) => return false,
            _ => (),
        }
    }

    (prefix_end..elem_end).any(|m| !set.contains(m) && set.contains(inverter.invert(m)))
}

pub fn any_known_modification<'a, S, I>(
    set: &S,
    elem_end: usize,
    prefix_end: usize,
    inverters: impl IntoIterator<Item = &'a I>,
) -> bool
where
    S: IndexSet + ?Sized,
    I: Inverter + 'a,
{
    inverters
        .into_iter()
        .any(|inverter| known_modification_exists(set, elem_end, prefix_end, inverter))
}

pub struct PpcSearch<D, P, A, F = NoFilter> {
    pub detector: D,
    pub pruning: P,
    pub answer: A,
    pub filter: F,
    stop_at_answers: bool,
    stats: EnumerationStats,
}

impl<D, P, A> PpcSearch<D, P, A> {
    pub fn new(detector: D, pruning: P, answer: A) -> Self {
        Self {
            detector,
            pruning,
            answer,
            filter: NoFilter,
            stop_at_answers: false,
            stats: EnumerationStats::default(),
        }
    }
}

impl<D, P, A, F> PpcSearch<D, P, A, F> {
    /// Candidates rejected by `filter` are never added.
    pub fn with_filter<G>(self, filter: G) -> PpcSearch<D, P, A, G> {
        PpcSearch {
            detector: self.detector,
            pruning: self.pruning,
            answer: self.answer,
            filter,
            stop_at_answers: self.stop_at_answers,
            stats: self.stats,
        }
    }

    /// Answers become leaves: no superset of an answer is visited.
    pub fn stop_at_answers(mut self) -> Self {
        self.stop_at_answers = true;
        self
    }

    pub fn stats(&self) -> EnumerationStats {
        self.stats
    }

    pub fn into_parts(self) -> (D, P, A) {
        (self.detector, self.pruning, self.answer)
    }

    /// Hands every answer among the canonical supersets of `seed` built from
    /// `0..cand_end` to `output`.
    pub fn enumerate<S>(
        &mut self,
        seed: &mut S,
        cand_end: usize,
        output: &mut impl FnMut(&S),
    ) -> EnumerationStats
    where
        S: IndexSet,
        D: DuplicateDetector<S>,
        P: Pruning<S>,
        A: AnswerDetector<S>,
        F: CandidateFilter<S>,
    {
        let before = self.stats;
        self.recurse(seed, 0, cand_end, 0, 0, output);
        let mut run = self.stats;
        run.call_count -= before.call_count;
        run.valid_call_count -= before.valid_call_count;
        run.answer_count -= before.answer_count;
        run
    }

    fn recurse<S>(
        &mut self,
        cur: &mut S,
        cand_begin: usize,
        cand_end: usize,
        prefix_end: usize,
        depth: usize,
        output: &mut impl FnMut(&S),
    ) where
        S: IndexSet,
        D: DuplicateDetector<S>,
        P: Pruning<S>,
        A: AnswerDetector<S>,
        F: CandidateFilter<S>,
    {
        self.stats.call_count += 1;

        if self.detector.has_generated(cur, cand_begin, prefix_end) {
            return;
        }
        if self.pruning.need_pruning(cur, depth) {
            return;
        }

        self.stats.valid_call_count += 1;

        if self.answer.is_answer(cur) {
            self.stats.answer_count += 1;
            output(cur);
            if self.stop_at_answers {
                return;
            }
        }

        for cand in cand_begin..cand_end {
            if self.filter.skips(cur, cand) {
                continue;
            }
            cur.add(cand);
            self.recurse(cur, cand + 1, cand_end, cand_begin, depth + 1, output);
            cur.remove(cand);
        }
    }
}

#[cfg(test)]
use crate::{
    bitset::BitSet,
    inverter::CircleInverter,
    search::{EverythingIsAnswer, NoDuplicates, NoPruning},
};

#[test]
fn test_known_modification() {
    let set = BitSet::from_indices(6, [0, 2, 3, 4]);
    let rotate3 = CircleInverter::Rotation { n: 6, amount: 3 };
    let rotate2 = CircleInverter::Rotation { n: 6, amount: 2 };

    assert!(known_modification_exists(&set, 5, 3, &rotate3));
    assert!(!known_modification_exists(&set, 5, 3, &rotate2));
}

#[test]
fn test_without_duplicates_is_power_set() {
    let mut search = PpcSearch::new(NoDuplicates, NoPruning, EverythingIsAnswer);
    let mut seen = 0;
    let stats = search.enumerate(&mut BitSet::new(10), 10, &mut |_: &BitSet| seen += 1);

    assert_eq!(seen, 1 << 10);
    assert_eq!(stats.answer_count, 1 << 10);
    assert_eq!(stats.call_count, stats.valid_call_count);
}

#[test]
fn test_filter_and_leaves() {
    // odd candidates never join; answers are the first even member
    let mut search = PpcSearch::new(
        NoDuplicates,
        NoPruning,
        |set: &BitSet| set.count() == 1,
    )
    .with_filter(|_: &BitSet, cand: usize| cand % 2 == 1)
    .stop_at_answers();

    let mut found = Vec::new();
    let stats = search.enumerate(&mut BitSet::new(8), 8, &mut |set: &BitSet| {
        found.push(set.iter().collect::<Vec<_>>())
    });

    assert_eq!(found, vec![vec![0], vec![2], vec![4], vec![6]]);
    assert_eq!(stats.call_count, 1 + 4);
}

#[test]
fn test_stats_are_per_run() {
    let mut search = PpcSearch::new(NoDuplicates, NoPruning, EverythingIsAnswer);
    let a = search.enumerate(&mut BitSet::new(4), 4, &mut |_: &BitSet| ());
    let b = search.enumerate(&mut BitSet::new(4), 4, &mut |_: &BitSet| ());

    assert_eq!(a, b);
    assert_eq!(search.stats(), a + b);
}
