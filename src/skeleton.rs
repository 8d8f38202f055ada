//! Circular skeleton: which of the `place_count` places carry a line.
//!
//! Lines are added in increasing order, starting at the base point, and the
//! skeleton keeps the alternating angle sum of Kawasaki's theorem on a stack
//! so that removing the last line restores the previous sums exactly.

use {
    crate::bitset::{BitSet, IndexSet},
    std::fmt::Write,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skeleton {
    lines: BitSet,
    left_kawasaki_count: i64,
    left_gap: i64,
    right_gap: i64,
    item_history: Vec<usize>,
    left_gap_history: Vec<i64>,
}

#[inline]
fn sign(v: i64) -> i64 {
    if v >= 0 {
        1
    } else {
        -1
    }
}

impl Skeleton {
    pub fn new(place_count: usize) -> Self {
        Self {
            lines: BitSet::new(place_count),
            left_kawasaki_count: 0,
            left_gap: 0,
            right_gap: 0,
            item_history: Vec::with_capacity(place_count),
            left_gap_history: Vec::with_capacity(place_count),
        }
    }

    /// Adds `items` in order.
    pub fn from_items(place_count: usize, items: impl IntoIterator<Item = usize>) -> Self {
        let mut skeleton = Self::new(place_count);
        for item in items {
            skeleton.add(item);
        }
        skeleton
    }

    pub fn place_count(&self) -> usize {
        self.lines.capacity()
    }

    pub fn count(&self) -> usize {
        self.lines.count()
    }

    pub fn contains(&self, item: usize) -> bool {
        self.lines.contains(item)
    }

    pub fn lines(&self) -> &BitSet {
        &self.lines
    }

    /// Items in the order they were added.
    pub fn items(&self) -> &[usize] {
        &self.item_history
    }

    /// First added line, or 0 when empty.
    pub fn base_point(&self) -> usize {
        self.item_history.first().copied().unwrap_or(0)
    }

    pub fn left_gap(&self) -> i64 {
        self.left_gap
    }

    pub fn right_gap(&self) -> i64 {
        self.right_gap
    }

    pub fn left_kawasaki_count(&self) -> i64 {
        self.left_kawasaki_count
    }

    // angle distance from the base point
    fn norm(&self, item: usize) -> i64 {
        let cap = self.place_count();
        ((cap + item - self.base_point()) % cap) as i64
    }

    pub fn add(&mut self, item: usize) {
        let cap = self.place_count() as i64;

        self.left_gap = match self.item_history.last() {
            None => 0,
            Some(&back) => sign(self.right_gap) * (self.norm(item) - self.norm(back)),
        };
        self.lines.add(item);
        self.item_history.push(item);

        self.right_gap = -sign(self.right_gap) * (cap - self.norm(item));
        self.left_kawasaki_count += self.left_gap;
        self.left_gap_history.push(self.left_gap);
    }

    /// Removes the most recently added line.
    pub fn remove(&mut self, item: usize) {
        assert_eq!(
            self.item_history.last(),
            Some(&item),
            "lines must be removed in reverse order of addition"
        );
        self.item_history.pop();
        self.lines.remove(item);

        if self.item_history.is_empty() {
            self.left_kawasaki_count = 0;
            self.left_gap = 0;
            self.right_gap = 0;
            self.left_gap_history.clear();
            return;
        }

        self.right_gap = self.left_gap - self.right_gap;
        self.left_kawasaki_count -= self.left_gap;
        self.left_gap_history.pop();
        self.left_gap = self.left_gap_history.last().copied().unwrap_or(0);
    }

    /// Whether the remaining angle can still bring the alternating sum to zero.
    pub fn kawasaki_count_can_be_zero(&self) -> bool {
        self.left_kawasaki_count.abs() <= self.right_gap.abs()
    }

    /// Whether the alternating sum is zero if the last line closes the circle.
    pub fn kawasaki_count_is_zero(&self) -> bool {
        self.left_kawasaki_count + self.right_gap == 0
    }

    /// Line positions in increasing order, i.e. dense index to position.
    pub fn line_index_map(&self) -> Vec<usize> {
        self.lines.iter().collect()
    }

    /// Compressed circle read from the base point: `+` major, `-` minor, a
    /// number for a run of empty places. `minors` holds dense line indices.
    pub fn encode(&self, minors: &BitSet) -> String {
        self.encode_with(|dense| minors.contains(dense))
    }

    /// Same with every line major.
    pub fn encode_flap(&self) -> String {
        self.encode_with(|_| false)
    }

    fn encode_with(&self, is_minor: impl Fn(usize) -> bool) -> String {
        let cap = self.place_count();
        let base = self.base_point();

        let dense: Vec<usize> = {
            let mut dense = vec![0; cap];
            for (i, p) in self.lines.iter().enumerate() {
                dense[p] = i;
            }
            dense
        };

        let mut out = String::with_capacity(cap);
        let mut empty_run = 0;

        for i in 0..cap {
            let position = (i + base) % cap;
            if !self.contains(position) {
                empty_run += 1;
                continue;
            }
            if empty_run > 0 {
                let _ = write!(out, "{empty_run}");
                empty_run = 0;
            }
            out.push(if is_minor(dense[position]) { '-' } else { '+' });
        }
        if empty_run > 0 {
            let _ = write!(out, "{empty_run}");
        }

        out
    }

    pub fn verify(&self) {
        debug_assert_eq!(self.item_history.len(), self.lines.count());
        debug_assert_eq!(self.left_gap_history.len(), self.lines.count());
        debug_assert_eq!(
            self.left_gap_history.iter().sum::<i64>(),
            self.left_kawasaki_count
        );
    }
}

impl IndexSet for Skeleton {
    #[inline]
    fn contains(&self, item: usize) -> bool {
        self.lines.contains(item)
    }

    #[inline]
    fn add(&mut self, item: usize) {
        Skeleton::add(self, item)
    }

    #[inline]
    fn remove(&mut self, item: usize) {
        Skeleton::remove(self, item)
    }

    #[inline]
    fn count(&self) -> usize {
        self.lines.count()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.lines.capacity()
    }
}

#[cfg(test)]
fn gaps(skeleton: &Skeleton) -> (i64, i64, i64) {
    (
        skeleton.left_gap(),
        skeleton.right_gap(),
        skeleton.left_kawasaki_count(),
    )
}

#[test]
fn test_kawasaki_stack() {
    let mut skeleton = Skeleton::new(8);

    skeleton.add(2);
    assert_eq!(gaps(&skeleton), (0, -8, 0));
    skeleton.add(3);
    assert_eq!(gaps(&skeleton), (-1, 7, -1));
    skeleton.add(4);
    assert_eq!(gaps(&skeleton), (1, -6, 0));
    skeleton.add(7);
    assert_eq!(gaps(&skeleton), (-3, 3, -3));
    assert!(skeleton.kawasaki_count_is_zero());

    skeleton.remove(7);
    assert_eq!(gaps(&skeleton), (1, -6, 0));
    skeleton.verify();
}

#[test]
fn test_kawasaki_conditions() {
    let square = Skeleton::from_items(8, [0, 2, 5, 7]);
    assert!(square.kawasaki_count_is_zero());

    let skewed = Skeleton::from_items(8, [1, 5, 6, 7]);
    assert!(!skewed.kawasaki_count_can_be_zero());
    assert!(!skewed.kawasaki_count_is_zero());
}

#[test]
fn test_add_remove_round_trip() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for _ in 0..100 {
        let cap = rng.gen_range(2..40);
        let mut skeleton = Skeleton::new(cap);
        let mut snapshots = vec![skeleton.clone()];

        let start = rng.gen_range(0..cap);
        for offset in 0..cap {
            if rng.gen_bool(0.5) {
                skeleton.add((start + offset) % cap);
                skeleton.verify();
                snapshots.push(skeleton.clone());
            }
        }

        while let Some(&last) = skeleton.items().last() {
            snapshots.pop();
            skeleton.remove(last);
            assert_eq!(Some(&skeleton), snapshots.last());
        }
    }
}

#[test]
fn test_encode() {
    let skeleton = Skeleton::from_items(8, [0, 1, 3, 6]);

    assert_eq!(skeleton.encode(&BitSet::from_indices(4, [2])), "++1-2+1");
    assert_eq!(skeleton.encode_flap(), "++1+2+1");
    assert_eq!(skeleton.line_index_map(), vec![0, 1, 3, 6]);
}

#[test]
fn test_encode_from_base_point() {
    let skeleton = Skeleton::from_items(8, [3, 6]);
    assert_eq!(skeleton.base_point(), 3);
    assert_eq!(skeleton.encode(&BitSet::from_indices(2, [0])), "-2+4");
}

#[test]
#[should_panic]
fn test_remove_out_of_order() {
    let mut skeleton = Skeleton::from_items(8, [0, 2]);
    skeleton.remove(0);
}
