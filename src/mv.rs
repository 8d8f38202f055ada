//! Stage two: mountain/valley assignments of one skeleton.
//!
//! An assignment is the set of minor lines, by dense line index. All
//! variants stop at `line_count / 2 - 1` minor lines and differ in how they
//! avoid visiting symmetric assignments and in the local angle rules they
//! use to skip hopeless candidates.

use {
    crate::{
        bitset::BitSet,
        canonical::canonical_on_symmetry,
        crimp,
        flap_string::FlapPatternString,
        ppc::PpcSearch,
        search::{AnswerDetector, CandidateFilter, DuplicateDetector},
        skeleton::Skeleton,
        stats::EnumerationStats,
        symmetry::MvSymmetryDetector,
        theorem::MaekawaPruning,
    },
    rustc_hash::FxHashSet,
    std::ops::Range,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MvAlgorithm {
    Plain,
    Lsl,
    ExtendedLsl,
    // hash set of canonical strings instead of the canonical-form test
    Memoized,
    CrimpSequence,
}

pub fn enumerate<A>(
    algorithm: MvAlgorithm,
    skeleton: &Skeleton,
    answer: &mut A,
    output: &mut impl FnMut(&BitSet),
) -> EnumerationStats
where
    A: AnswerDetector<BitSet>,
{
    let line_count = skeleton.count();
    let mut seed = BitSet::new(line_count);
    let pruning = MaekawaPruning { line_count };
    let is_answer = |minors: &BitSet| answer.is_answer(minors);

    match algorithm {
        MvAlgorithm::Plain => PpcSearch::new(symmetry_detector(skeleton), pruning, is_answer)
            .enumerate(&mut seed, line_count, output),
        MvAlgorithm::Lsl => {
            let rule = LocalRule::LargeSmallLarge(FlapPatternString::from_skeleton(skeleton));
            PpcSearch::new(symmetry_detector(skeleton), pruning, is_answer)
                .with_filter(rule)
                .stop_at_answers()
                .enumerate(&mut seed, line_count, output)
        }
        MvAlgorithm::ExtendedLsl => {
            let string = FlapPatternString::from_skeleton(skeleton);
            let rule = LocalRule::EqualAngles(equal_angle_intervals(&string));
            PpcSearch::new(symmetry_detector(skeleton), pruning, is_answer)
                .with_filter(rule)
                .stop_at_answers()
                .enumerate(&mut seed, line_count, output)
        }
        MvAlgorithm::Memoized => {
            let string = FlapPatternString::from_skeleton(skeleton);
            let seen = CanonicalStrings {
                string: string.clone(),
                seen: FxHashSet::default(),
            };
            PpcSearch::new(seen, pruning, is_answer)
                .with_filter(LocalRule::LargeSmallLarge(string))
                .stop_at_answers()
                .enumerate(&mut seed, line_count, output)
        }
        MvAlgorithm::CrimpSequence => crimp::enumerate(skeleton, is_answer, output),
    }
}

fn symmetry_detector(skeleton: &Skeleton) -> MvSymmetryDetector {
    MvSymmetryDetector::new(skeleton.place_count(), skeleton.lines().iter())
}

// a line between two larger angles separates lines of different type
fn large_small_large_fixes(string: &FlapPatternString, minors: &BitSet, cand: usize) -> bool {
    let line_count = minors.capacity();
    let prev = (cand + line_count - 1) % line_count;
    let cand = cand as isize;

    string.angle(cand - 2) > string.angle(cand - 1)
        && string.angle(cand) > string.angle(cand - 1)
        && minors.contains(prev)
}

/// For each line, the lines bounding the run of equal angles it belongs to,
/// when the run is flanked by larger angles on both sides.
/// The range end may pass the last line.
pub fn equal_angle_intervals(string: &FlapPatternString) -> Vec<Option<Range<usize>>> {
    let line_count = string.line_count();
    let angle = |i: usize| string.angle(i as isize);
    let mut intervals = vec![None; line_count];

    for i in 0..line_count {
        if string.angle(i as isize - 1) <= angle(i) {
            continue;
        }
        let mut j = i + 1;
        while j < line_count && angle(j - 1) == angle(j) {
            j += 1;
        }
        if angle(j) > angle(j - 1) {
            let interval = i..j + 1;
            for cand in i..interval.end.min(line_count) {
                intervals[cand] = Some(interval.clone());
            }
        }
    }

    intervals
}

// Inside such a run the lines split evenly between the two types, or off by
// one for an odd number of lines. Undecided lines count as major.
fn equal_angles_fix(minors: &BitSet, interval: &Range<usize>) -> bool {
    let line_count = minors.capacity();
    let balance: i32 = interval
        .clone()
        .map(|i| if minors.contains(i % line_count) { 1 } else { -1 })
        .sum();

    if interval.len() % 2 == 0 {
        balance == 0
    } else {
        balance == 1
    }
}

enum LocalRule {
    LargeSmallLarge(FlapPatternString),
    EqualAngles(Vec<Option<Range<usize>>>),
}

impl CandidateFilter<BitSet> for LocalRule {
    fn skips(&self, minors: &BitSet, cand: usize) -> bool {
        match self {
            LocalRule::LargeSmallLarge(string) => large_small_large_fixes(string, minors, cand),
            LocalRule::EqualAngles(intervals) => intervals[cand]
                .as_ref()
                .map_or(false, |interval| equal_angles_fix(minors, interval)),
        }
    }
}

struct CanonicalStrings {
    string: FlapPatternString,
    seen: FxHashSet<Vec<i8>>,
}

impl DuplicateDetector<BitSet> for CanonicalStrings {
    fn has_generated(&mut self, minors: &BitSet, _: usize, _: usize) -> bool {
        for line in 0..self.string.line_count() {
            let line_type = if minors.contains(line) {
                FlapPatternString::MINOR
            } else {
                FlapPatternString::MAJOR
            };
            self.string.set_line_type(line as isize, line_type);
        }
        !self.seen.insert(canonical_on_symmetry(self.string.as_slice()))
    }
}

#[cfg(test)]
use crate::{
    answer::{Criterion, FlapAnswerDetector},
    inverter::Inverter,
    kawasaki,
    symmetry::invert_set,
    theorem::MaekawaTheorem,
};

#[cfg(test)]
const ALGORITHMS: [MvAlgorithm; 5] = [
    MvAlgorithm::Plain,
    MvAlgorithm::Lsl,
    MvAlgorithm::ExtendedLsl,
    MvAlgorithm::Memoized,
    MvAlgorithm::CrimpSequence,
];

#[cfg(test)]
fn answers(algorithm: MvAlgorithm, skeleton: &Skeleton, criterion: Criterion) -> Vec<BitSet> {
    let mut detector = FlapAnswerDetector::new(criterion, skeleton);
    let mut found = Vec::new();
    enumerate(algorithm, skeleton, &mut detector, &mut |minors| {
        found.push(minors.clone())
    });
    found
}

#[test]
fn test_square() {
    let skeleton = Skeleton::from_items(8, [0, 2, 4, 6]);
    let mut maekawa = MaekawaTheorem { line_count: 4 };
    let stats = enumerate(MvAlgorithm::Plain, &skeleton, &mut maekawa, &mut |_| ());
    assert_eq!(stats.answer_count, 1);
}

#[test]
fn test_mirror_symmetric() {
    let skeleton = Skeleton::from_items(8, [0, 1, 2, 3, 4, 6]);

    for algorithm in [MvAlgorithm::Plain, MvAlgorithm::Lsl, MvAlgorithm::Memoized] {
        let found = answers(algorithm, &skeleton, Criterion::Maekawa);
        assert_eq!(found.len(), 9, "{algorithm:?}");
    }
    for algorithm in ALGORITHMS {
        let found = answers(algorithm, &skeleton, Criterion::FoldableLinear);
        assert_eq!(found.len(), 6, "{algorithm:?}");
    }
}

#[test]
fn test_no_symmetric_answers() {
    let skeleton = Skeleton::from_items(8, [0, 1, 2, 3, 4, 6]);
    let detector = symmetry_detector(&skeleton);
    let found = answers(MvAlgorithm::Plain, &skeleton, Criterion::Maekawa);

    for (i, a) in found.iter().enumerate() {
        for inverter in detector.inverters() {
            let image = invert_set(a, inverter);
            if &image == a {
                continue;
            }
            assert!(
                found.iter().skip(i + 1).all(|b| *b != image),
                "{a:?} and its image {image:?} both emitted"
            );
        }
    }
}

#[test]
fn test_prefix_decides_duplicates() {
    let place_count = 16;
    let mut detector = MvSymmetryDetector::new(place_count, 0..place_count);

    fn constrain<F: FnMut(&[usize]) -> Option<&usize>>(f: F) -> F {
        f
    }
    let mut first_hit = constrain(|indices: &[usize]| {
        let mut minors = BitSet::new(place_count);
        indices.iter().find(|&&index| {
            minors.add(index);
            detector.has_generated(&minors, place_count, index + 1)
        })
    });

    // a rotation of 0, 1, 3, 7, 8, 10, 14
    assert_eq!(first_hit(&[0, 1, 3, 7, 9, 10, 12]), Some(&12));
    assert_eq!(first_hit(&[0, 1, 3, 7, 8, 10, 14]), None);

    let rotation = detector
        .inverters()
        .iter()
        .find(|inverter| inverter.invert(9) == 0 && inverter.invert(12) == 3);
    assert!(rotation.is_some());
}

#[test]
fn test_variants_agree() {
    for (n, expected) in [(6, 6), (8, 20), (10, 87)] {
        let mut skeletons = Vec::new();
        kawasaki::enumerate(n, &mut |skeleton| skeletons.push(skeleton.clone()));

        for algorithm in ALGORITHMS {
            let mut total = 0;
            for skeleton in &skeletons {
                let found = answers(algorithm, skeleton, Criterion::FoldableLinear);
                let plain = answers(MvAlgorithm::Plain, skeleton, Criterion::Foldable);
                assert_eq!(found.len(), plain.len(), "{algorithm:?} on {skeleton:?}");
                total += found.len();
            }
            assert_eq!(total, expected, "{algorithm:?}, n = {n}");
        }
    }
}

#[test]
fn test_maekawa_totals() {
    for (n, expected) in [(6, 7), (8, 27), (10, 143), (12, 837)] {
        let mut total = 0;
        kawasaki::enumerate(n, &mut |skeleton| {
            total += answers(MvAlgorithm::Plain, skeleton, Criterion::Maekawa).len();
        });
        assert_eq!(total, expected, "n = {n}");
    }
}

#[test]
fn test_equal_angle_intervals() {
    // angles 2 1 1 2 2: the two unit angles sit between lines 1..=3
    let string = FlapPatternString::new(8, &[0, 2, 3, 4, 6]);
    let intervals = equal_angle_intervals(&string);

    assert_eq!(intervals[0], None);
    assert_eq!(intervals[1], Some(1..4));
    assert_eq!(intervals[2], Some(1..4));
    assert_eq!(intervals[3], Some(1..4));
    assert_eq!(intervals[4], None);
}

#[test]
fn test_local_rules() {
    // angles 3 1 4 2 around lines 0..4
    let string = FlapPatternString::new(10, &[0, 3, 4, 8]);
    let mut minors = BitSet::new(4);
    assert!(!large_small_large_fixes(&string, &minors, 2));
    minors.add(1);
    assert!(large_small_large_fixes(&string, &minors, 2));

    assert!(!equal_angles_fix(&BitSet::new(4), &(1..3)));
    assert!(equal_angles_fix(&minors, &(1..3)));

    assert!(!equal_angles_fix(&minors, &(1..4)));
    minors.add(2);
    assert!(equal_angles_fix(&minors, &(1..4)));

    // a run past the last line counts line 0 again
    let wrapped = BitSet::from_indices(4, [0]);
    assert!(equal_angles_fix(&wrapped, &(3..5)));
    assert!(!equal_angles_fix(&BitSet::new(4), &(3..5)));
}
