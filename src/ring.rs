//! Circular doubly linked list over a fixed slot array.
//!
//! Slot indices are stable: removing an entry splices its neighbours and
//! leaves the slot empty, so other indices keep their meaning during a fold
//! sequence.

#[derive(Clone, Debug)]
struct Slot<T> {
    prev: usize,
    next: usize,
    value: Option<T>,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            prev: usize::MAX,
            next: usize::MAX,
            value: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ring<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    count: usize,
}

impl<T> Ring<T> {
    pub fn new(size: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(Slot::empty).take(size).collect(),
            head: None,
            count: 0,
        }
    }

    /// Stores a value without linking it; call `make_links` afterwards.
    pub fn set(&mut self, index: usize, value: T) {
        self.slots[index].value = Some(value);
    }

    /// Links the occupied slots in increasing order and makes the lowest one
    /// the head.
    pub fn make_links(&mut self) {
        let occupied: Vec<usize> = (0..self.size()).filter(|&i| self.exists(i)).collect();

        self.count = occupied.len();
        self.head = occupied.first().copied();

        for (i, &index) in occupied.iter().enumerate() {
            let next = occupied[(i + 1) % occupied.len()];
            self.connect(index, next);
        }
    }

    fn connect(&mut self, prev: usize, next: usize) {
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    pub fn exists(&self, index: usize) -> bool {
        index < self.size() && self.slots[index].value.is_some()
    }

    #[track_caller]
    pub fn get(&self, index: usize) -> &T {
        match self.slots.get(index).and_then(|s| s.value.as_ref()) {
            Some(value) => value,
            None => panic!("slot {index} is out of ring: #elements = {}", self.count),
        }
    }

    #[track_caller]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        let count = self.count;
        match self.slots.get_mut(index).and_then(|s| s.value.as_mut()) {
            Some(value) => value,
            None => panic!("slot {index} is out of ring: #elements = {count}"),
        }
    }

    pub fn next_index(&self, index: usize) -> usize {
        debug_assert!(self.exists(index));
        self.slots[index].next
    }

    pub fn prev_index(&self, index: usize) -> usize {
        debug_assert!(self.exists(index));
        self.slots[index].prev
    }

    pub fn next_of(&self, index: usize) -> &T {
        self.get(self.next_index(index))
    }

    pub fn prev_of(&self, index: usize) -> &T {
        self.get(self.prev_index(index))
    }

    pub fn head_index(&self) -> Option<usize> {
        self.head
    }

    pub fn head(&self) -> Option<&T> {
        self.head.map(|h| self.get(h))
    }

    pub fn tail(&self) -> Option<&T> {
        self.head.map(|h| self.prev_of(h))
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Unlinks and empties a slot; the head moves on if it was removed.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        assert!(self.count > 0, "remove from an empty ring");
        let Some(value) = self.slots.get_mut(index).and_then(|s| s.value.take()) else {
            panic!("slot {index} is not in the ring");
        };

        if self.count == 1 {
            self.head = None;
        } else {
            let (prev, next) = (self.slots[index].prev, self.slots[index].next);
            if self.head == Some(index) {
                self.head = Some(next);
            }
            self.connect(prev, next);
        }

        self.count -= 1;
        self.slots[index] = Slot::empty();
        value
    }

    /// Links a value into an empty slot between its nearest occupied
    /// neighbours.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(!self.exists(index), "slot {index} is already in the ring");

        self.slots[index].value = Some(value);
        self.count += 1;

        if self.head.is_none() {
            self.head = Some(index);
            self.connect(index, index);
            return;
        }

        let size = self.size();
        let prev = (1..size)
            .map(|back| (index + size - back) % size)
            .find(|&i| i != index && self.exists(i))
            .unwrap_or(index);
        let next = self.slots[prev].next;

        self.connect(prev, index);
        self.connect(index, next);
    }

    /// Occupied slot indices, starting at the head.
    pub fn indices(&self) -> RingIndices<'_, T> {
        RingIndices {
            ring: self,
            current: self.head,
            remaining: self.count,
        }
    }
}

pub struct RingIndices<'a, T> {
    ring: &'a Ring<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<T> Iterator for RingIndices<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.current?;
        self.remaining -= 1;
        self.current = Some(self.ring.next_index(current));
        Some(current)
    }
}

#[cfg(test)]
fn sample() -> Ring<u32> {
    let mut ring = Ring::new(4);
    ring.set(0, 10);
    ring.set(1, 12);
    ring.set(3, 14);
    ring.make_links();
    ring
}

#[test]
fn test_links() {
    let ring = sample();

    assert_eq!(ring.count(), 3);
    assert_eq!(ring.prev_index(0), 3);
    assert_eq!(ring.next_index(0), 1);
    assert_eq!(ring.prev_index(3), 1);
    assert_eq!(ring.next_index(3), 0);
    assert_eq!(ring.head(), Some(&10));
    assert_eq!(ring.tail(), Some(&14));
    assert_eq!(ring.indices().collect::<Vec<_>>(), vec![0, 1, 3]);
}

#[test]
fn test_remove_and_insert() {
    let mut ring = sample();

    assert_eq!(ring.remove(1), 12);
    assert_eq!(ring.prev_index(0), 3);
    assert_eq!(ring.next_index(0), 3);
    assert_eq!(ring.prev_index(3), 0);
    assert_eq!(ring.next_index(3), 0);

    ring.insert(2, 22);
    assert_eq!(ring.prev_index(2), 0);
    assert_eq!(ring.next_index(2), 3);
    assert_eq!(ring.count(), 3);
    assert_eq!(*ring.get(2), 22);
}

#[test]
fn test_remove_head() {
    let mut ring = sample();
    ring.remove(0);
    assert_eq!(ring.head_index(), Some(1));
    ring.remove(1);
    ring.remove(3);
    assert!(ring.is_empty());
    assert_eq!(ring.head(), None);

    ring.insert(2, 5);
    assert_eq!(ring.head_index(), Some(2));
    assert_eq!(ring.next_index(2), 2);
}

#[test]
fn test_insert_wraps() {
    let mut ring = sample();
    ring.remove(0);
    ring.insert(0, 1);
    assert_eq!(ring.prev_index(0), 3);
    assert_eq!(ring.next_index(0), 1);
    assert_eq!(ring.prev_index(1), 0);
}

#[test]
#[should_panic]
fn test_get_missing() {
    let mut ring = sample();
    ring.remove(1);
    ring.get(1);
}

#[test]
fn test_remove_insert_round_trip() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for _ in 0..100 {
        let size = rng.gen_range(1..30);
        let mut ring = Ring::new(size);
        (0..size).for_each(|i| ring.set(i, i));
        ring.make_links();

        let index = rng.gen_range(0..size);
        let before: Vec<_> = (0..size)
            .map(|i| (ring.prev_index(i), ring.next_index(i)))
            .collect();

        let value = ring.remove(index);
        ring.insert(index, value);

        let after: Vec<_> = (0..size)
            .map(|i| (ring.prev_index(i), ring.next_index(i)))
            .collect();
        assert_eq!(before, after);
        assert_eq!(ring.count(), size);
    }
}
