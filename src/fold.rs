//! Crimp-fold collapse of a single vertex.
//!
//! A vertex is a ring of line gaps: each entry is one line and the angle up
//! to the next line. Folding a minimal angle between two lines of different
//! type removes both lines and merges the three angles into one. The vertex
//! folds flat exactly when repeated folding collapses the ring.

use {
    crate::{
        bitset::BitSet,
        ring::Ring,
        theorem::{FLAT, MAJOR as MAJOR_CHAR},
    },
    std::{collections::VecDeque, fmt},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LineType {
    Major,
    Minor,
    Undef,
}

impl LineType {
    pub fn as_char(self) -> char {
        match self {
            LineType::Major => 'M',
            LineType::Minor => 'V',
            LineType::Undef => '@',
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            LineType::Major => LineType::Minor,
            _ => LineType::Major,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineGap {
    pub angle_to_next: usize,
    pub line_type: LineType,
}

impl LineGap {
    pub fn new(angle_to_next: usize, line_type: LineType) -> Self {
        Self {
            angle_to_next,
            line_type,
        }
    }
}

impl fmt::Display for LineGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.line_type.as_char(), self.angle_to_next)
    }
}

pub type GapRing = Ring<LineGap>;

/// Ring of the lines at `map` (increasing circle positions). Lines whose
/// dense index is in `assignments` are major, the others minor.
pub fn create_ring(place_count: usize, map: &[usize], assignments: &BitSet) -> GapRing {
    create_ring_with(place_count, map, |i| {
        if assignments.contains(i) {
            LineType::Major
        } else {
            LineType::Minor
        }
    })
}

pub fn create_undef_ring(place_count: usize, map: &[usize]) -> GapRing {
    create_ring_with(place_count, map, |_| LineType::Undef)
}

fn create_ring_with(
    place_count: usize,
    map: &[usize],
    line_type: impl Fn(usize) -> LineType,
) -> GapRing {
    let line_count = map.len();
    let mut ring = Ring::new(place_count);

    for i in 0..line_count {
        let angle = (place_count + map[(i + 1) % line_count] - map[i]) % place_count;
        ring.set(i, LineGap::new(angle, line_type(i)));
    }
    ring.make_links();
    ring
}

pub fn create_string_ring(a: &[u8]) -> GapRing {
    let place_count = a.len();
    let mut ring = Ring::new(place_count);

    let Some(first) = a.iter().position(|&c| c != FLAT) else {
        ring.make_links();
        return ring;
    };
    let at = |i: usize| a[(first + i) % place_count];

    let mut ring_index = 0;
    let mut i = 0;
    while i < place_count {
        let mut angle = 1;
        while at(i + angle) == FLAT {
            angle += 1;
        }

        let line_type = if at(i) == MAJOR_CHAR {
            LineType::Major
        } else {
            LineType::Minor
        };
        ring.set(ring_index, LineGap::new(angle, line_type));

        ring_index += 1;
        i += angle;
    }
    ring.make_links();
    ring
}

pub fn is_minimal_angle(prev: &LineGap, center: &LineGap, next: &LineGap) -> bool {
    prev.angle_to_next >= center.angle_to_next && next.angle_to_next >= center.angle_to_next
}

pub fn is_minimal_at(ring: &GapRing, index: usize) -> bool {
    is_minimal_angle(ring.prev_of(index), ring.get(index), ring.next_of(index))
}

pub fn is_minimal_to_be_folded(ring: &GapRing, index: usize) -> bool {
    let (center, next) = (ring.get(index), ring.next_of(index));
    is_minimal_angle(ring.prev_of(index), center, next) && center.line_type != next.line_type
}

pub fn find_minimal_indices(ring: &GapRing) -> Vec<usize> {
    ring.indices()
        .filter(|&i| is_minimal_to_be_folded(ring, i))
        .collect()
}

/// Removes the line at `index` and the one after it. Returns the line that
/// absorbed their angles.
pub fn fold_partially(ring: &mut GapRing, index: usize) -> usize {
    let center = ring.get(index).angle_to_next;
    let next_index = ring.next_index(index);
    let next = ring.get(next_index).angle_to_next;
    let prev_index = ring.prev_index(index);

    ring.remove(next_index);
    ring.remove(index);

    let merged = ring.get_mut(prev_index);
    merged.angle_to_next = merged.angle_to_next + next - center;

    prev_index
}

pub fn is_collapsed(ring: &GapRing) -> bool {
    match ring.count() {
        0 => true,
        2 => ring.head() == ring.tail(),
        _ => false,
    }
}

pub fn is_foldable_quadratic(ring: &mut GapRing) -> bool {
    let Some(mut index) = ring.head_index() else {
        return true;
    };

    while ring.count() > 2 {
        let found = {
            let mut j = index;
            let mut found = None;
            for _ in 0..ring.count() {
                if is_minimal_to_be_folded(ring, j) {
                    found = Some(j);
                    break;
                }
                j = ring.next_index(j);
            }
            found
        };

        match found {
            None => return false,
            Some(j) => index = fold_partially(ring, j),
        }
    }

    is_collapsed(ring)
}

// a fold can only make the merged line and its two neighbours foldable
struct MinimalIndices {
    stack: VecDeque<usize>,
    in_stack: BitSet,
}

impl MinimalIndices {
    fn new(ring: &GapRing) -> Self {
        let stack: VecDeque<usize> = find_minimal_indices(ring).into();
        let in_stack = BitSet::from_indices(ring.size(), stack.iter().copied());
        Self { stack, in_stack }
    }

    fn push_if_foldable(&mut self, ring: &GapRing, index: usize) {
        if !self.in_stack.contains(index) && is_minimal_to_be_folded(ring, index) {
            self.stack.push_back(index);
            self.in_stack.add(index);
        }
    }

    fn pop(&mut self) -> Option<usize> {
        let index = self.stack.pop_back()?;
        self.in_stack.remove(index);
        Some(index)
    }
}

pub fn is_foldable_linear(ring: &mut GapRing) -> bool {
    let mut minimals = MinimalIndices::new(ring);

    while ring.count() > 2 {
        // entries go stale when their lines are folded away or their
        // neighbours change
        let index = loop {
            match minimals.pop() {
                None => return false,
                Some(i) if ring.exists(i) && is_minimal_to_be_folded(ring, i) => break i,
                Some(_) => continue,
            }
        };

        let merged = fold_partially(ring, index);

        for i in [merged, ring.next_index(merged), ring.prev_index(merged)] {
            minimals.push_if_foldable(ring, i);
        }
    }

    is_collapsed(ring)
}

pub fn is_string_foldable(a: &[u8]) -> bool {
    let mut ring = create_string_ring(a);
    is_foldable_linear(&mut ring)
}

#[cfg(test)]
use crate::{kawasaki, skeleton::Skeleton, theorem::MINOR as MINOR_CHAR};

#[cfg(test)]
fn ring_of(angles: &[usize], types: &str) -> GapRing {
    let mut ring = Ring::new(angles.len());
    for (i, (&angle, c)) in angles.iter().zip(types.chars()).enumerate() {
        let line_type = if c == '+' {
            LineType::Major
        } else {
            LineType::Minor
        };
        ring.set(i, LineGap::new(angle, line_type));
    }
    ring.make_links();
    ring
}

#[test]
fn test_fold_partially() {
    let mut ring = ring_of(&[3, 1, 1, 3], "+-++");

    assert!(is_minimal_to_be_folded(&ring, 1));
    assert!(is_minimal_at(&ring, 2));
    assert!(!is_minimal_to_be_folded(&ring, 2));

    let merged = fold_partially(&mut ring, 1);
    assert_eq!(merged, 0);
    assert_eq!(ring.count(), 2);
    assert_eq!(ring.get(0).angle_to_next, 3 + 1 - 1);
    assert!(is_collapsed(&ring));
}

#[test]
fn test_foldable_skeleton() {
    let skeleton = Skeleton::from_items(16, [0, 1, 2, 3, 4, 5, 6, 8, 10, 13]);
    let map = skeleton.line_index_map();
    let assignments = BitSet::from_indices(map.len(), [3, 4, 5, 6]);

    let mut linear = create_ring(16, &map, &assignments);
    assert!(is_foldable_linear(&mut linear));

    let mut quadratic = create_ring(16, &map, &assignments);
    assert!(is_foldable_quadratic(&mut quadratic));
}

#[test]
fn test_unfoldable() {
    // all lines of one type never fold
    let mut ring = ring_of(&[2, 2, 2, 2], "++++");
    assert!(!is_foldable_linear(&mut ring.clone()));
    assert!(!is_foldable_quadratic(&mut ring));
}

#[test]
fn test_string_ring() {
    // lines at 1, 2, 5 and 6 of 8 places
    let a = [FLAT, MAJOR_CHAR, MINOR_CHAR, FLAT, FLAT, MAJOR_CHAR, MAJOR_CHAR, FLAT];
    let ring = create_string_ring(&a);

    assert_eq!(ring.count(), 4);
    let gaps: Vec<_> = ring.indices().map(|i| *ring.get(i)).collect();
    assert_eq!(
        gaps,
        vec![
            LineGap::new(1, LineType::Major),
            LineGap::new(3, LineType::Minor),
            LineGap::new(1, LineType::Major),
            LineGap::new(3, LineType::Major),
        ]
    );
}

#[test]
fn test_linear_equals_quadratic() {
    let mut checked = 0;
    for place_count in (4..=14).step_by(2) {
        kawasaki::enumerate(place_count, &mut |skeleton| {
            let lines = skeleton.line_index_map();
            let line_count = lines.len();

            for mask in 0..1u32 << line_count {
                let assignments = BitSet::from_indices(
                    line_count,
                    (0..line_count).filter(|i| mask >> i & 1 == 1),
                );
                let mut linear = create_ring(place_count, &lines, &assignments);
                let mut quadratic = linear.clone();

                assert_eq!(
                    is_foldable_linear(&mut linear),
                    is_foldable_quadratic(&mut quadratic),
                    "lines: {lines:?}, assignments: {assignments:?}"
                );
                checked += 1;
            }
        });
    }
    assert_eq!(checked, 69976);
}
