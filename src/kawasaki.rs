//! Stage one: skeletons whose angles satisfy Kawasaki's theorem, one per
//! class under rotation and reflection.

use crate::{
    bracelet::BinaryBracelets,
    ppc::PpcSearch,
    search::NoPruning,
    skeleton::Skeleton,
    stats::EnumerationStats,
    symmetry::DenseSymmetryDetector,
    theorem::{KawasakiFlap, KawasakiPruning},
};

/// Bracelet walk with Kawasaki pruning.
pub fn enumerate(place_count: usize, output: &mut impl FnMut(&Skeleton)) -> EnumerationStats {
    let mut bracelets = BinaryBracelets::new(KawasakiPruning, KawasakiFlap);
    bracelets.enumerate(&mut Skeleton::new(place_count), output)
}

/// Canonical-form search over the circle with Kawasaki pruning.
pub fn enumerate_slowly(
    place_count: usize,
    output: &mut impl FnMut(&Skeleton),
) -> EnumerationStats {
    let mut search = PpcSearch::new(
        DenseSymmetryDetector::new(place_count),
        KawasakiPruning,
        KawasakiFlap,
    );
    search.enumerate(&mut Skeleton::new(place_count), place_count, output)
}

/// Canonical-form search filtering only at the answers.
pub fn enumerate_no_pruning(
    place_count: usize,
    output: &mut impl FnMut(&Skeleton),
) -> EnumerationStats {
    let mut search = PpcSearch::new(
        DenseSymmetryDetector::new(place_count),
        NoPruning,
        KawasakiFlap,
    );
    search.enumerate(&mut Skeleton::new(place_count), place_count, output)
}

#[cfg(test)]
const COUNTS: [(usize, u64); 7] = [
    (4, 2),
    (6, 3),
    (8, 7),
    (10, 13),
    (12, 35),
    (14, 85),
    (16, 257),
];

#[test]
fn test_bracelet_counts() {
    for (n, expected) in COUNTS {
        let stats = enumerate(n, &mut |skeleton| {
            assert!(skeleton.kawasaki_count_is_zero());
            assert_eq!(skeleton.count() % 2, 0);
        });
        assert_eq!(stats.answer_count, expected, "n = {n}");
    }
}

#[test]
fn test_large() {
    assert_eq!(enumerate(24, &mut |_| ()).answer_count, 28968);
}

#[test]
fn test_variants_agree() {
    for (n, expected) in COUNTS {
        assert_eq!(enumerate_slowly(n, &mut |_| ()).answer_count, expected);
    }
    for (n, expected) in &COUNTS[..5] {
        let stats = enumerate_no_pruning(*n, &mut |_| ());
        assert_eq!(stats.answer_count, *expected);
    }
}

#[test]
fn test_pruning_pays_off() {
    let pruned = enumerate_slowly(12, &mut |_| ());
    let unpruned = enumerate_no_pruning(12, &mut |_| ());
    assert!(pruned.call_count < unpruned.call_count);
}
