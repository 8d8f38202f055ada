//! Canonical fold sequences.
//!
//! Folding always the smallest available crimp gives every ring one fold
//! sequence. Comparing that sequence with the ones of the symmetric images
//! of the ring tells whether the ring is its own smallest representative,
//! which lets the assignments of a skeleton be built fold by fold.

use {
    crate::{
        bitset::BitSet,
        fold::{
            create_ring, create_undef_ring, fold_partially, is_collapsed, is_minimal_at,
            is_minimal_to_be_folded, GapRing, LineType,
        },
        inverter::{Identity, Inverter},
        ring::Ring,
        search::AnswerDetector,
        skeleton::Skeleton,
        stats::EnumerationStats,
        symmetry::MvSymmetryDetector,
    },
    std::collections::BTreeSet,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Crimp {
    pub angle: usize,
    pub center: usize,
    pub next: usize,
    // 0 for major then minor, 1 for minor then major, -1 when not a pair
    pub mv_index: i8,
}

pub fn mv_pair_index(center: LineType, next: LineType) -> i8 {
    match (center, next) {
        (c, n) if c == n => -1,
        (LineType::Undef, _) | (_, LineType::Undef) => -1,
        (LineType::Major, LineType::Minor) => 0,
        _ => 1,
    }
}

pub fn create_crimp(ring: &GapRing, index: usize) -> Crimp {
    let next = ring.next_index(index);
    Crimp {
        angle: ring.get(index).angle_to_next,
        center: index,
        next,
        mv_index: mv_pair_index(ring.get(index).line_type, ring.get(next).line_type),
    }
}

// `ring` must be indexed by the inverted names
pub fn create_inverted_crimp(ring: &GapRing, index: usize, inverter: &impl Inverter) -> Crimp {
    let mut center = inverter.invert(index);
    let mut next = inverter.invert(ring.next_index(index));
    if inverter.reverses_order() {
        std::mem::swap(&mut center, &mut next);
    }

    Crimp {
        angle: ring.get(index).angle_to_next,
        center,
        next,
        mv_index: mv_pair_index(ring.get(center).line_type, ring.get(next).line_type),
    }
}

pub fn insert_if_minimal(
    ring: &GapRing,
    crimp: Crimp,
    check_line_type: bool,
    crimps: &mut BTreeSet<Crimp>,
) -> bool {
    let minimal = if check_line_type {
        is_minimal_to_be_folded(ring, crimp.center)
    } else {
        is_minimal_at(ring, crimp.center)
    };
    if minimal {
        crimps.insert(crimp);
    }
    minimal
}

fn insert_index_if_minimal(ring: &GapRing, index: usize, crimps: &mut BTreeSet<Crimp>) {
    insert_if_minimal(ring, create_crimp(ring, index), true, crimps);
}

fn ring_contains_crimp(ring: &GapRing, crimp: &Crimp) -> bool {
    ring.exists(crimp.center)
        && ring.exists(crimp.next)
        && ring.get(crimp.center).angle_to_next == crimp.angle
}

/// Walks the smallest-first fold sequence of `ring`, handing each crimp to
/// `visit` before it is folded. Stops when `visit` returns false.
fn walk_minimal_sequence(mut ring: GapRing, mut visit: impl FnMut(&Crimp) -> bool) {
    let mut possible = BTreeSet::new();
    for index in ring.indices().collect::<Vec<_>>() {
        insert_index_if_minimal(&ring, index, &mut possible);
    }

    while ring.count() > 2 {
        let Some(crimp) = possible.pop_first() else {
            break;
        };

        if !ring_contains_crimp(&ring, &crimp) || !is_minimal_to_be_folded(&ring, crimp.center) {
            continue;
        }
        if !visit(&crimp) {
            return;
        }

        let merged = fold_partially(&mut ring, crimp.center);
        for index in [merged, ring.next_index(merged), ring.prev_index(merged)] {
            insert_index_if_minimal(&ring, index, &mut possible);
        }
    }
}

pub fn create_minimal_sequence(ring: &GapRing) -> Vec<Crimp> {
    let mut sequence = Vec::new();
    walk_minimal_sequence(ring.clone(), |crimp| {
        sequence.push(*crimp);
        true
    });
    sequence
}

// merges every run of unassigned lines into the assigned line before it
pub fn reduce_unassigned_lines(ring: &mut GapRing) -> bool {
    let Some(mut index) = ring
        .indices()
        .find(|&i| ring.get(i).line_type != LineType::Undef)
    else {
        return false;
    };

    let line_count = ring.count();
    let mut i = 0;
    while i < line_count {
        let target = index;
        index = ring.next_index(index);
        i += 1;

        let mut angle = 0;
        while i < line_count && ring.get(index).line_type == LineType::Undef {
            angle += ring.get(index).angle_to_next;
            let next = ring.next_index(index);
            ring.remove(index);
            index = next;
            i += 1;
        }
        ring.get_mut(target).angle_to_next += angle;
    }

    true
}

pub fn invert_ring(source: &GapRing, inverter: &impl Inverter) -> GapRing {
    let mut ring = Ring::new(source.size());

    for index in source.indices() {
        let mut gap = *source.get(index);
        if inverter.reverses_order() {
            gap.angle_to_next = source.prev_of(index).angle_to_next;
        }
        ring.set(inverter.invert(index), gap);
    }
    ring.make_links();
    ring
}

/// Whether `crimps` is not larger than the smallest-first fold sequence of
/// the image of `ring` under `inverter`.
pub fn is_less_than_equal(crimps: &[Crimp], ring: &GapRing, inverter: &impl Inverter) -> bool {
    let mut reduced = ring.clone();
    if !reduce_unassigned_lines(&mut reduced) {
        return true;
    }
    let inverted = invert_ring(&reduced, inverter);

    let mut less_than_equal = true;
    let mut i = 0;
    walk_minimal_sequence(inverted, |min_crimp| {
        let Some(crimp) = crimps.get(i) else {
            return false;
        };
        if crimp > min_crimp {
            less_than_equal = false;
            return false;
        }
        if crimp < min_crimp {
            return false;
        }
        i += 1;
        true
    });

    less_than_equal
}

pub fn is_minimal_crimp_sequence<I: Inverter>(
    crimps: &[Crimp],
    ring: &GapRing,
    inverters: &[I],
) -> bool {
    is_less_than_equal(crimps, ring, &Identity)
        && inverters
            .iter()
            .all(|inverter| is_less_than_equal(crimps, ring, inverter))
}

struct CrimpSearch<A> {
    place_count: usize,
    map: Vec<usize>,
    symmetry: MvSymmetryDetector,
    answer: A,
    // lines typed major; the other line of each crimp is minor
    assignment: BitSet,
    crimps: Vec<Crimp>,
    stats: EnumerationStats,
}

impl<A: AnswerDetector<BitSet>> CrimpSearch<A> {
    fn recurse(&mut self, ring: &GapRing, refolded: &[usize], output: &mut impl FnMut(&BitSet)) {
        self.stats.call_count += 1;

        if ring.count() <= 2 {
            if is_collapsed(ring) {
                self.check_leaf(output);
            }
            return;
        }

        for center in ring.indices() {
            if !is_minimal_at(ring, center) {
                continue;
            }
            let next = ring.next_index(center);

            for (center_type, next_type) in [
                (LineType::Minor, LineType::Major),
                (LineType::Major, LineType::Minor),
            ] {
                let crimp = Crimp {
                    angle: ring.get(center).angle_to_next,
                    center,
                    next,
                    mv_index: mv_pair_index(center_type, next_type),
                };
                // crimps the last fold did not touch were available one step
                // earlier, when the smaller one was chosen
                if let Some(last) = self.crimps.last() {
                    if !refolded.contains(&center) && crimp < *last {
                        continue;
                    }
                }

                let major = if center_type == LineType::Major {
                    center
                } else {
                    next
                };
                self.assignment.add(major);
                self.crimps.push(crimp);

                let mut folded = ring.clone();
                let merged = fold_partially(&mut folded, center);
                let refolded = [merged, folded.next_index(merged), folded.prev_index(merged)];
                self.recurse(&folded, &refolded, output);

                self.crimps.pop();
                self.assignment.remove(major);
            }
        }
    }

    fn check_leaf(&mut self, output: &mut impl FnMut(&BitSet)) {
        let ring = create_ring(self.place_count, &self.map, &self.assignment);
        if !is_minimal_crimp_sequence(&self.crimps, &ring, self.symmetry.inverters()) {
            return;
        }
        self.stats.valid_call_count += 1;

        if self.answer.is_answer(&self.assignment) {
            self.stats.answer_count += 1;
            output(&self.assignment);
        }
    }
}

/// Flat-foldable assignments of `skeleton`, one per symmetry class, built
/// fold by fold.
pub fn enumerate(
    skeleton: &Skeleton,
    answer: impl AnswerDetector<BitSet>,
    output: &mut impl FnMut(&BitSet),
) -> EnumerationStats {
    let place_count = skeleton.place_count();
    let map = skeleton.line_index_map();
    let ring = create_undef_ring(place_count, &map);

    let mut search = CrimpSearch {
        place_count,
        symmetry: MvSymmetryDetector::new(place_count, skeleton.lines().iter()),
        answer,
        assignment: BitSet::new(map.len()),
        crimps: Vec::new(),
        stats: EnumerationStats::default(),
        map,
    };
    search.recurse(&ring, &[], output);
    search.stats
}

#[cfg(test)]
use crate::{
    answer::{Criterion, FlapAnswerDetector},
    fold::LineGap,
    inverter::CircleInverter,
    kawasaki,
    symmetry::invert_set,
};

#[cfg(test)]
fn sample() -> GapRing {
    let map: Vec<usize> = (0..8).collect();
    let majors = BitSet::from_indices(8, "+-+--+++".match_indices('+').map(|(i, _)| i));
    create_ring(8, &map, &majors)
}

#[test]
fn test_minimal_sequence() {
    let ring = sample();
    let mv = |i: usize| mv_pair_index(ring.get(i).line_type, ring.get(i + 1).line_type);

    assert_eq!(
        create_minimal_sequence(&ring),
        vec![
            Crimp {
                angle: 1,
                center: 0,
                next: 1,
                mv_index: mv(0)
            },
            Crimp {
                angle: 1,
                center: 2,
                next: 3,
                mv_index: mv(2)
            },
            Crimp {
                angle: 1,
                center: 4,
                next: 5,
                mv_index: mv(4)
            },
        ]
    );
}

#[test]
fn test_crimp_order() {
    let a = Crimp {
        angle: 1,
        center: 5,
        next: 6,
        mv_index: 1,
    };
    let b = Crimp {
        angle: 2,
        center: 0,
        next: 1,
        mv_index: 0,
    };
    assert!(a < b);
    assert!(Crimp { mv_index: 0, ..a } < a);
    assert_eq!(mv_pair_index(LineType::Major, LineType::Minor), 0);
    assert_eq!(mv_pair_index(LineType::Minor, LineType::Major), 1);
    assert_eq!(mv_pair_index(LineType::Major, LineType::Undef), -1);
    assert_eq!(mv_pair_index(LineType::Minor, LineType::Minor), -1);
}

#[test]
fn test_reduce_unassigned_lines() {
    let mut ring = Ring::new(4);
    ring.set(0, LineGap::new(1, LineType::Undef));
    ring.set(1, LineGap::new(2, LineType::Major));
    ring.set(2, LineGap::new(3, LineType::Undef));
    ring.set(3, LineGap::new(4, LineType::Minor));
    ring.make_links();

    assert!(reduce_unassigned_lines(&mut ring));
    assert_eq!(ring.count(), 2);
    assert_eq!(*ring.get(1), LineGap::new(5, LineType::Major));
    assert_eq!(*ring.get(3), LineGap::new(5, LineType::Minor));

    let mut undef = Ring::new(2);
    undef.set(0, LineGap::new(1, LineType::Undef));
    undef.set(1, LineGap::new(1, LineType::Undef));
    undef.make_links();
    assert!(!reduce_unassigned_lines(&mut undef));
}

#[test]
fn test_invert_ring() {
    let ring = sample();
    let mirror = CircleInverter::Mirror { n: 8, axis: 0 };
    let mirrored = invert_ring(&ring, &mirror);

    assert_eq!(mirrored.count(), 8);
    for i in 0..8 {
        assert_eq!(mirrored.get(mirror.invert(i)).line_type, ring.get(i).line_type);
    }

    let rotation = CircleInverter::Rotation { n: 8, amount: 3 };
    let crimp = create_inverted_crimp(&invert_ring(&ring, &rotation), 0, &rotation);
    assert_eq!((crimp.center, crimp.next), (5, 6));
}

#[test]
fn test_minimal_sequence_is_less_than_equal_to_itself() {
    let ring = sample();
    let crimps = create_minimal_sequence(&ring);

    assert!(is_less_than_equal(&crimps, &ring, &Identity));

    let rotations: Vec<_> = CircleInverter::rotations(8).collect();
    let minimal = is_minimal_crimp_sequence(&crimps, &ring, &rotations);
    let images_not_smaller = rotations.iter().all(|r| {
        let image = invert_ring(&ring, r);
        create_minimal_sequence(&image) >= crimps
    });
    assert_eq!(minimal, images_not_smaller);
}

#[test]
fn test_crimp_search_counts() {
    for (n, expected) in [(6, 6), (8, 20), (10, 87), (12, 420)] {
        let mut total = 0;
        kawasaki::enumerate(n, &mut |skeleton| {
            let detector = FlapAnswerDetector::new(Criterion::FoldableLinear, skeleton);
            let mut found = Vec::new();
            let stats = enumerate(skeleton, detector, &mut |assignment| {
                found.push(assignment.clone())
            });
            assert_eq!(stats.answer_count, found.len() as u64);

            let symmetry = MvSymmetryDetector::new(n, skeleton.lines().iter());
            for (i, a) in found.iter().enumerate() {
                for inverter in symmetry.inverters() {
                    let image = invert_set(a, inverter);
                    assert!(
                        found.iter().skip(i + 1).all(|b| *b != image),
                        "{a:?} and its image {image:?} both emitted for {skeleton:?}"
                    );
                }
            }
            total += found.len();
        });
        assert_eq!(total, expected, "n = {n}");
    }
}

#[test]
fn test_crimp_search_square() {
    // with four equal angles every single-major assignment folds, and all
    // four are rotations of one another
    let skeleton = Skeleton::from_items(8, [0, 2, 4, 6]);
    let mut found = Vec::new();
    let stats = enumerate(&skeleton, |_: &BitSet| true, &mut |assignment| {
        found.push(assignment.clone())
    });

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].count(), 1);
    assert!(stats.call_count > stats.valid_call_count);
}
