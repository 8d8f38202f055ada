use crate::{
    bitset::{BitSet, IndexSet},
    inverter::{line_index_map, CircleInverter, Inverter, MappedInverter},
    ppc::{any_known_modification, PpcSearch},
    search::{AnswerDetector, DuplicateDetector, Pruning},
    stats::EnumerationStats,
};

/// Duplicate test over a circle where every place may be chosen.
#[derive(Clone, Debug)]
pub struct DenseSymmetryDetector {
    inverters: Vec<CircleInverter>,
}

impl DenseSymmetryDetector {
    pub fn new(place_count: usize) -> Self {
        Self {
            inverters: CircleInverter::family(place_count),
        }
    }

    pub fn inverters(&self) -> &[CircleInverter] {
        &self.inverters
    }
}

impl<S: IndexSet + ?Sized> DuplicateDetector<S> for DenseSymmetryDetector {
    fn has_generated(&mut self, set: &S, elem_end: usize, prefix_end: usize) -> bool {
        any_known_modification(set, elem_end, prefix_end, &self.inverters)
    }
}

/// Duplicate test over the lines of one skeleton: circle symmetries that map
/// the skeleton onto itself, acting on dense line indices.
#[derive(Clone, Debug)]
pub struct MvSymmetryDetector {
    inverters: Vec<MappedInverter<CircleInverter>>,
}

impl MvSymmetryDetector {
    /// `occupied` lists the positions of the lines in increasing order.
    pub fn new(place_count: usize, occupied: impl IntoIterator<Item = usize>) -> Self {
        let map = line_index_map(occupied);

        let inverters = CircleInverter::family(place_count)
            .into_iter()
            .map(|inverter| MappedInverter::new(inverter, place_count, map.clone()))
            .filter(MappedInverter::can_invert)
            .collect();

        Self { inverters }
    }

    pub fn inverters(&self) -> &[MappedInverter<CircleInverter>] {
        &self.inverters
    }

    /// No symmetry of the skeleton besides the identity.
    pub fn is_asymmetric(&self) -> bool {
        self.inverters.is_empty()
    }
}

impl<S: IndexSet + ?Sized> DuplicateDetector<S> for MvSymmetryDetector {
    fn has_generated(&mut self, set: &S, elem_end: usize, prefix_end: usize) -> bool {
        any_known_modification(set, elem_end, prefix_end, &self.inverters)
    }
}

/// All subsets of a circle of `n` places up to rotation and reflection.
pub fn enumerate_circular(
    n: usize,
    pruning: impl Pruning<BitSet>,
    answer: impl AnswerDetector<BitSet>,
    output: &mut impl FnMut(&BitSet),
) -> EnumerationStats {
    let mut search = PpcSearch::new(DenseSymmetryDetector::new(n), pruning, answer);
    search.enumerate(&mut BitSet::new(n), n, output)
}

/// Applies `inverter` to every member.
pub fn invert_set(set: &BitSet, inverter: &impl Inverter) -> BitSet {
    BitSet::from_indices(set.capacity(), set.iter().map(|i| inverter.invert(i)))
}

#[cfg(test)]
use crate::search::{NoPruning, NotEmptyIsAnswer};

#[test]
fn test_has_generated() {
    let mut detector = DenseSymmetryDetector::new(6);
    let pattern = BitSet::from_indices(6, [0, 2, 3, 4]);

    assert!(detector.has_generated(&pattern, 5, 3));
}

#[test]
fn test_nonempty_bracelets() {
    for (n, expected) in [
        (3, 3),
        (4, 5),
        (5, 7),
        (6, 12),
        (7, 17),
        (8, 29),
        (9, 45),
        (11, 125),
        (12, 223),
        (14, 686),
        (16, 2249),
    ] {
        let stats = enumerate_circular(n, NoPruning, NotEmptyIsAnswer, &mut |_| ());
        assert_eq!(stats.answer_count, expected, "n = {n}");
    }
}

#[test]
fn test_no_orbit_twice() {
    for n in [7, 9, 10] {
        let detector = DenseSymmetryDetector::new(n);
        let mut answers = Vec::new();
        enumerate_circular(n, NoPruning, NotEmptyIsAnswer, &mut |set| {
            answers.push(set.clone())
        });

        let unique: rustc_hash::FxHashSet<_> = answers.iter().cloned().collect();
        assert_eq!(unique.len(), answers.len());

        for answer in &answers {
            for inverter in detector.inverters() {
                let image = invert_set(answer, inverter);
                if &image != answer {
                    assert!(!unique.contains(&image), "{answer:?} and {image:?}");
                }
            }
        }
    }
}

#[test]
fn test_mv_detector_keeps_skeleton_symmetries() {
    // square: four rotations and four mirrors map lines onto lines
    let detector = MvSymmetryDetector::new(8, [0, 2, 4, 6]);
    assert_eq!(detector.inverters().len(), 3 + 4);

    let asymmetric = MvSymmetryDetector::new(8, [0, 1, 3]);
    assert!(asymmetric.is_asymmetric());
}
