use std::{
    fmt,
    ops::{BitAnd, BitXor},
};

const BLOCK_BITS: usize = u64::BITS as usize;

/// Fixed-capacity set of indices in `0..capacity`, backed by 64 bit blocks.
///
/// Callers validate indices; adding a member twice or removing a non-member
/// breaks the count.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    blocks: Vec<u64>,
    capacity: usize,
    count: usize,
}

/// Minimal set interface shared by the search drivers.
pub trait IndexSet {
    fn contains(&self, item: usize) -> bool;
    fn add(&mut self, item: usize);
    fn remove(&mut self, item: usize);
    fn count(&self) -> usize;
    fn capacity(&self) -> usize;
}

#[inline]
fn block_of(bit: usize) -> usize {
    bit / BLOCK_BITS
}

#[inline]
fn local_of(bit: usize) -> usize {
    bit % BLOCK_BITS
}

// bits [from, to] of one block, both inclusive
#[inline]
fn span_mask(from: usize, to: usize) -> u64 {
    let low = u64::MAX << from;
    let high = u64::MAX >> (BLOCK_BITS - 1 - to);
    low & high
}

impl BitSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            blocks: vec![0; (capacity + BLOCK_BITS - 1) / BLOCK_BITS],
            capacity,
            count: 0,
        }
    }

    pub fn from_indices(capacity: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::new(capacity);
        for i in indices {
            if !set.contains(i) {
                set.add(i);
            }
        }
        set
    }

    #[inline]
    pub fn contains(&self, item: usize) -> bool {
        debug_assert!(item < self.capacity);
        self.blocks[block_of(item)] & (1 << local_of(item)) != 0
    }

    #[inline]
    pub fn add(&mut self, item: usize) {
        debug_assert!(!self.contains(item), "{item} is already a member");
        self.blocks[block_of(item)] |= 1 << local_of(item);
        self.count += 1;
    }

    #[inline]
    pub fn remove(&mut self, item: usize) {
        debug_assert!(self.contains(item), "{item} is not a member");
        self.blocks[block_of(item)] &= !(1 << local_of(item));
        self.count -= 1;
    }

    /// Removes every index in `begin..end`; all of them must be members.
    pub fn remove_range(&mut self, begin: usize, end: usize) {
        debug_assert!(self.contains_all(begin, end));
        self.count -= end - begin;
        self.fill_zero(begin, end);
    }

    pub fn clear(&mut self) {
        self.blocks.iter_mut().for_each(|b| *b = 0);
        self.count = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains_all(&self, begin: usize, end: usize) -> bool {
        self.all_masked(begin, end, |block, mask| block & mask == mask)
    }

    pub fn contains_nothing(&self, begin: usize, end: usize) -> bool {
        self.all_masked(begin, end, |block, mask| block & mask == 0)
    }

    fn all_masked(&self, begin: usize, end: usize, test: impl Fn(u64, u64) -> bool) -> bool {
        if begin >= end {
            return true;
        }
        let tail = end - 1;
        let (first, last) = (block_of(begin), block_of(tail));

        if first == last {
            return test(self.blocks[first], span_mask(local_of(begin), local_of(tail)));
        }

        test(self.blocks[first], span_mask(local_of(begin), BLOCK_BITS - 1))
            && self.blocks[first + 1..last]
                .iter()
                .all(|&b| test(b, u64::MAX))
            && test(self.blocks[last], span_mask(0, local_of(tail)))
    }

    fn fill_zero(&mut self, begin: usize, end: usize) {
        if begin >= end {
            return;
        }
        let tail = end - 1;
        let (first, last) = (block_of(begin), block_of(tail));

        if first == last {
            self.blocks[first] &= !span_mask(local_of(begin), local_of(tail));
            return;
        }

        self.blocks[first] &= !span_mask(local_of(begin), BLOCK_BITS - 1);
        self.blocks[first + 1..last].iter_mut().for_each(|b| *b = 0);
        self.blocks[last] &= !span_mask(0, local_of(tail));
    }

    /// Circular rotation towards index 0: afterwards `contains(i)` equals the
    /// old `contains((i + amount) % capacity)`.
    pub fn rotate_to_lower(&mut self, amount: usize) {
        if self.capacity == 0 {
            return;
        }
        let amount = amount % self.capacity;
        if amount == 0 {
            return;
        }

        if self.blocks.len() == 1 {
            let b = self.blocks[0];
            let rotated = (b >> amount) | (b << (self.capacity - amount));
            self.blocks[0] = rotated & span_mask(0, self.capacity - 1);
            return;
        }

        let old = self.clone();
        self.blocks.iter_mut().for_each(|b| *b = 0);
        for i in old.iter() {
            let j = (i + self.capacity - amount) % self.capacity;
            self.blocks[block_of(j)] |= 1 << local_of(j);
        }
    }

    /// Copy holding only the members lower than `value`.
    pub fn extract_lower_than(&self, value: usize) -> Self {
        let mut lower = self.clone();
        lower.fill_zero(value.min(self.capacity), self.capacity);
        lower.count = lower.blocks.iter().map(|b| b.count_ones() as usize).sum();
        lower
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity).filter(move |&i| self.contains(i))
    }

    /// `1`/`0` per index, lowest index first.
    pub fn to_bstring(&self) -> String {
        (0..self.capacity)
            .map(|i| if self.contains(i) { '1' } else { '0' })
            .collect()
    }

    fn with_blocks(&self, blocks: Vec<u64>) -> Self {
        let count = blocks.iter().map(|b| b.count_ones() as usize).sum();
        Self {
            blocks,
            capacity: self.capacity,
            count,
        }
    }
}

impl IndexSet for BitSet {
    #[inline]
    fn contains(&self, item: usize) -> bool {
        BitSet::contains(self, item)
    }

    #[inline]
    fn add(&mut self, item: usize) {
        BitSet::add(self, item)
    }

    #[inline]
    fn remove(&mut self, item: usize) {
        BitSet::remove(self, item)
    }

    #[inline]
    fn count(&self) -> usize {
        self.count
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl BitAnd for &BitSet {
    type Output = BitSet;

    fn bitand(self, rhs: Self) -> BitSet {
        assert_eq!(self.capacity, rhs.capacity, "capacities differ");
        self.with_blocks(
            self.blocks
                .iter()
                .zip(&rhs.blocks)
                .map(|(a, b)| a & b)
                .collect(),
        )
    }
}

impl BitXor for &BitSet {
    type Output = BitSet;

    fn bitxor(self, rhs: Self) -> BitSet {
        assert_eq!(self.capacity, rhs.capacity, "capacities differ");
        self.with_blocks(
            self.blocks
                .iter()
                .zip(&rhs.blocks)
                .map(|(a, b)| a ^ b)
                .collect(),
        )
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in self.iter() {
            write!(f, "{i} ")?;
        }
        Ok(())
    }
}

#[test]
fn test_add_and_contains() {
    let length = 16;
    let mut set = BitSet::new(length);

    set.add(0);
    set.add(length / 2);

    assert!(set.contains(0));
    assert!(set.contains(length / 2));
    assert!(set.contains_nothing(1, length / 2));
    assert!(set.contains_nothing(length / 2 + 1, length));

    for i in 1..length / 2 {
        set.add(i);
    }

    assert!(set.contains_all(0, length / 2 + 1));
    assert!(set.contains_nothing(length / 2 + 1, length));
    assert_eq!(set.count(), length / 2 + 1);
}

#[test]
fn test_remove_range() {
    let length = 16;
    let mut set = BitSet::from_indices(length, 0..length);

    set.remove(1);
    assert!(set.contains(0));
    assert!(!set.contains(1));
    assert!(set.contains_all(2, length));

    set.remove_range(length / 2, length - 1);
    assert!(set.contains_all(2, length / 2));
    assert!(set.contains_nothing(length / 2, length - 1));
    assert!(set.contains(length - 1));
    assert_eq!(set.count(), length / 2 - 1 + 1);
}

#[test]
fn test_ranges_across_blocks() {
    let mut set = BitSet::new(200);
    for i in 60..140 {
        set.add(i);
    }

    assert!(set.contains_all(60, 140));
    assert!(!set.contains_all(59, 140));
    assert!(set.contains_nothing(0, 60));
    assert!(set.contains_nothing(140, 200));
    assert!(!set.contains_nothing(130, 200));

    set.remove_range(64, 128);
    assert_eq!(set.count(), 16);
    assert!(set.contains_nothing(64, 128));
    assert!(set.contains_all(128, 140));
}

#[test]
fn test_rotate_to_lower() {
    for capacity in [10, 64, 100, 130] {
        let mut set = BitSet::new(capacity);
        (0..4).for_each(|i| set.add(i));

        set.rotate_to_lower(2);

        assert!(set.contains(0));
        assert!(set.contains(1));
        assert!(set.contains_nothing(2, capacity - 2));
        assert!(set.contains(capacity - 1));
        assert!(set.contains(capacity - 2));
        assert_eq!(set.count(), 4);
    }
}

#[test]
fn test_rotate_random() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for _ in 0..100 {
        let capacity = rng.gen_range(1..300);
        let original = BitSet::from_indices(capacity, (0..capacity).filter(|_| rng.gen()));
        let amount = rng.gen_range(0..capacity * 2);

        let mut rotated = original.clone();
        rotated.rotate_to_lower(amount);

        for i in 0..capacity {
            assert_eq!(rotated.contains(i), original.contains((i + amount) % capacity));
        }
        assert_eq!(rotated.count(), original.count());
    }
}

#[test]
fn test_operators() {
    let a = BitSet::from_indices(70, [0, 3, 65, 69]);
    let b = BitSet::from_indices(70, [3, 4, 69]);

    assert_eq!(&a & &b, BitSet::from_indices(70, [3, 69]));
    assert_eq!(&a ^ &b, BitSet::from_indices(70, [0, 4, 65]));
    assert_eq!(a.extract_lower_than(65), BitSet::from_indices(70, [0, 3]));
    assert_eq!(a.to_bstring().len(), 70);
    assert_eq!(&a.to_bstring()[..5], "10010");
}
