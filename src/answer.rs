//! Answer detectors for the MV search over one skeleton.

use crate::{
    bitset::BitSet,
    fold::{create_ring, is_foldable_linear, is_foldable_quadratic},
    search::AnswerDetector,
    skeleton::Skeleton,
    theorem::MaekawaTheorem,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    /// the line counts alone
    Maekawa,
    /// full collapse, rescanning after every fold
    Foldable,
    /// full collapse with a worklist
    FoldableLinear,
}

/// Decides whether a set of minor lines of one skeleton is an answer.
/// Counts the sets that got past Maekawa's theorem on the way.
#[derive(Clone, Debug)]
pub struct FlapAnswerDetector {
    criterion: Criterion,
    maekawa: MaekawaTheorem,
    place_count: usize,
    map: Vec<usize>,
    maekawa_valid_count: u64,
}

impl FlapAnswerDetector {
    pub fn new(criterion: Criterion, skeleton: &Skeleton) -> Self {
        let map = skeleton.line_index_map();
        Self {
            criterion,
            maekawa: MaekawaTheorem {
                line_count: map.len(),
            },
            place_count: skeleton.place_count(),
            map,
            maekawa_valid_count: 0,
        }
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn maekawa_valid_count(&self) -> u64 {
        self.maekawa_valid_count
    }

    fn maekawa_holds(&mut self, minors: &BitSet) -> bool {
        let holds = self.maekawa.holds(minors);
        if holds {
            self.maekawa_valid_count += 1;
        }
        holds
    }
}

impl AnswerDetector<BitSet> for FlapAnswerDetector {
    fn is_answer(&mut self, minors: &BitSet) -> bool {
        if !self.maekawa_holds(minors) {
            return false;
        }

        match self.criterion {
            Criterion::Maekawa => true,
            Criterion::Foldable => {
                let mut ring = create_ring(self.place_count, &self.map, minors);
                is_foldable_quadratic(&mut ring)
            }
            Criterion::FoldableLinear => {
                let mut ring = create_ring(self.place_count, &self.map, minors);
                is_foldable_linear(&mut ring)
            }
        }
    }
}

#[test]
fn test_criteria() {
    // lines at 0, 1, 2, 3, 4, 6 of 8
    let skeleton = Skeleton::from_items(8, [0, 1, 2, 3, 4, 6]);
    let mut maekawa = FlapAnswerDetector::new(Criterion::Maekawa, &skeleton);
    let mut foldable = FlapAnswerDetector::new(Criterion::Foldable, &skeleton);
    let mut linear = FlapAnswerDetector::new(Criterion::FoldableLinear, &skeleton);

    let too_few = BitSet::from_indices(6, [0]);
    assert!(!maekawa.is_answer(&too_few));

    let crimps = BitSet::from_indices(6, [1, 3]);
    assert!(maekawa.is_answer(&crimps));
    assert!(foldable.is_answer(&crimps));
    assert!(linear.is_answer(&crimps));

    let stuck = BitSet::from_indices(6, [0, 5]);
    assert!(maekawa.is_answer(&stuck));
    assert!(!foldable.is_answer(&stuck));
    assert!(!linear.is_answer(&stuck));

    assert_eq!(maekawa.maekawa_valid_count(), 2);
    assert_eq!(foldable.maekawa_valid_count(), 2);
}
