//! Strategy seams of the backtracking searches.
//!
//! Every search driver in this crate is parameterized over a pruning rule, an
//! answer rule and, for the canonical-form searches, a duplicate test and a
//! candidate filter. Plain closures work for all but the duplicate test.

use crate::bitset::IndexSet;

pub trait Pruning<S: ?Sized> {
    /// `position` is the depth (PPC searches) or the last decided index
    /// (bracelet searches).
    fn need_pruning(&mut self, set: &S, position: usize) -> bool;
}

pub trait AnswerDetector<S: ?Sized> {
    fn is_answer(&mut self, set: &S) -> bool;
}

pub trait DuplicateDetector<S: ?Sized> {
    /// Whether some symmetry maps `set` to a smaller representative that is
    /// reached elsewhere in the search. Indices below `prefix_end` are fixed,
    /// indices in `prefix_end..elem_end` are still open.
    fn has_generated(&mut self, set: &S, elem_end: usize, prefix_end: usize) -> bool;
}

pub trait CandidateFilter<S: ?Sized> {
    /// Whether adding `cand` to `set` cannot lead to a new answer.
    fn skips(&self, set: &S, cand: usize) -> bool;
}

impl<S: ?Sized, F: FnMut(&S, usize) -> bool> Pruning<S> for F {
    #[inline]
    fn need_pruning(&mut self, set: &S, position: usize) -> bool {
        self(set, position)
    }
}

impl<S: ?Sized, F: FnMut(&S) -> bool> AnswerDetector<S> for F {
    #[inline]
    fn is_answer(&mut self, set: &S) -> bool {
        self(set)
    }
}

impl<S: ?Sized, F: Fn(&S, usize) -> bool> CandidateFilter<S> for F {
    #[inline]
    fn skips(&self, set: &S, cand: usize) -> bool {
        self(set, cand)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoPruning;

impl<S: ?Sized> Pruning<S> for NoPruning {
    #[inline]
    fn need_pruning(&mut self, _: &S, _: usize) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EverythingIsAnswer;

impl<S: ?Sized> AnswerDetector<S> for EverythingIsAnswer {
    #[inline]
    fn is_answer(&mut self, _: &S) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NotEmptyIsAnswer;

impl<S: IndexSet + ?Sized> AnswerDetector<S> for NotEmptyIsAnswer {
    #[inline]
    fn is_answer(&mut self, set: &S) -> bool {
        set.count() > 0
    }
}

/// Never reports a duplicate; turns a PPC search into a plain subset walk.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicates;

impl<S: ?Sized> DuplicateDetector<S> for NoDuplicates {
    fn has_generated(&mut self, _: &S, _: usize, _: usize) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoFilter;

impl<S: ?Sized> CandidateFilter<S> for NoFilter {
    #[inline]
    fn skips(&self, _: &S, _: usize) -> bool {
        false
    }
}
