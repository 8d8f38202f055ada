//! Index permutations for the symmetries of a circle of `n` places.

/// An index permutation of a circular arrangement.
pub trait Inverter {
    fn invert(&self, index: usize) -> usize;

    /// Mirror-type permutations walk the circle backwards.
    fn reverses_order(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Inverter for Identity {
    #[inline]
    fn invert(&self, index: usize) -> usize {
        index
    }

    fn reverses_order(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircleInverter {
    Rotation { n: usize, amount: usize },
    Mirror { n: usize, axis: usize },
    /// axis between `prior` and `prior + 1`
    MidMirror { n: usize, prior: usize },
}

impl CircleInverter {
    pub fn n(&self) -> usize {
        match *self {
            Self::Rotation { n, .. } | Self::Mirror { n, .. } | Self::MidMirror { n, .. } => n,
        }
    }

    pub fn rotations(n: usize) -> impl Iterator<Item = Self> {
        (1..n).map(move |amount| Self::Rotation { n, amount })
    }

    /// Axes through a place. With the mid-mirrors every reflection of the
    /// circle appears once, for odd `n` too.
    pub fn mirrors(n: usize) -> impl Iterator<Item = Self> {
        (0..(n + 1) / 2).map(move |axis| Self::Mirror { n, axis })
    }

    pub fn mid_mirrors(n: usize) -> impl Iterator<Item = Self> {
        (1..=n / 2).map(move |i| Self::MidMirror { n, prior: i - 1 })
    }

    pub fn family(n: usize) -> Vec<Self> {
        Self::rotations(n)
            .chain(Self::mirrors(n))
            .chain(Self::mid_mirrors(n))
            .collect()
    }
}

impl Inverter for CircleInverter {
    #[inline]
    fn invert(&self, index: usize) -> usize {
        match *self {
            Self::Rotation { n, amount } => (index + n - amount) % n,
            Self::Mirror { n, axis } => (2 * axis + n - index) % n,
            Self::MidMirror { n, prior } => (2 * prior + n - index + 1) % n,
        }
    }

    fn reverses_order(&self) -> bool {
        !matches!(self, Self::Rotation { .. })
    }
}

/// Increasing list of the occupied positions of a circle: dense index to
/// circle position.
pub fn line_index_map(occupied: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let map: Vec<usize> = occupied.into_iter().collect();
    debug_assert!(map.windows(2).all(|w| w[0] < w[1]));
    map
}

const FAILED: usize = usize::MAX;

/// A circle symmetry seen through a dense index map, so it permutes
/// occupied lines instead of circle places.
#[derive(Clone, Debug)]
pub struct MappedInverter<I> {
    inverter: I,
    map: Vec<usize>,
    reverse_map: Vec<usize>,
}

impl<I: Inverter> MappedInverter<I> {
    pub fn new(inverter: I, place_count: usize, map: Vec<usize>) -> Self {
        let mut reverse_map = vec![FAILED; place_count];
        for (i, &position) in map.iter().enumerate() {
            reverse_map[position] = i;
        }
        Self {
            inverter,
            map,
            reverse_map,
        }
    }

    /// Whether every line lands on a line.
    pub fn can_invert(&self) -> bool {
        self.map
            .iter()
            .all(|&p| self.reverse_map[self.inverter.invert(p)] != FAILED)
    }

    pub fn key_count(&self) -> usize {
        self.map.len()
    }
}

impl<I: Inverter> Inverter for MappedInverter<I> {
    #[inline]
    fn invert(&self, index: usize) -> usize {
        self.reverse_map[self.inverter.invert(self.map[index])]
    }

    fn reverses_order(&self) -> bool {
        self.inverter.reverses_order()
    }
}

impl<T: Inverter + ?Sized> Inverter for &T {
    #[inline]
    fn invert(&self, index: usize) -> usize {
        (**self).invert(index)
    }

    fn reverses_order(&self) -> bool {
        (**self).reverses_order()
    }
}

#[test]
fn test_bijections() {
    for n in 2..20 {
        for inverter in CircleInverter::family(n) {
            let mut image: Vec<usize> = (0..n).map(|i| inverter.invert(i)).collect();
            image.sort_unstable();
            assert_eq!(image, (0..n).collect::<Vec<_>>(), "{inverter:?}");
        }
    }
}

#[test]
fn test_formulas() {
    let rotation = CircleInverter::Rotation { n: 8, amount: 3 };
    assert_eq!(rotation.invert(0), 5);
    assert_eq!(rotation.invert(3), 0);
    assert!(!rotation.reverses_order());

    let mirror = CircleInverter::Mirror { n: 8, axis: 1 };
    assert_eq!(mirror.invert(1), 1);
    assert_eq!(mirror.invert(0), 2);
    assert_eq!(mirror.invert(5), 5);
    assert!(mirror.reverses_order());

    let mid = CircleInverter::MidMirror { n: 8, prior: 0 };
    assert_eq!(mid.invert(0), 1);
    assert_eq!(mid.invert(1), 0);
    assert_eq!(mid.invert(4), 5);
}

#[test]
fn test_family_size() {
    assert_eq!(CircleInverter::family(8).len(), 7 + 4 + 4);
    assert_eq!(CircleInverter::family(7).len(), 6 + 4 + 3);
}

#[test]
fn test_every_reflection_once() {
    for n in 2..20 {
        // a reflection is i -> c - i, named by the image of 0
        let mut images: Vec<usize> = CircleInverter::family(n)
            .into_iter()
            .filter(|inverter| inverter.reverses_order())
            .map(|inverter| inverter.invert(0))
            .collect();
        images.sort_unstable();
        assert_eq!(images, (0..n).collect::<Vec<_>>(), "n = {n}");
    }
}

#[test]
fn test_mapped() {
    let map = line_index_map([0, 2, 4, 6]);

    let rot1 = MappedInverter::new(CircleInverter::Rotation { n: 8, amount: 1 }, 8, map.clone());
    assert!(!rot1.can_invert());

    let rot2 = MappedInverter::new(CircleInverter::Rotation { n: 8, amount: 2 }, 8, map);
    assert!(rot2.can_invert());
    assert_eq!(rot2.key_count(), 4);
    assert_eq!(rot2.invert(1), 0);
    assert_eq!(rot2.invert(2), 1);
    assert_eq!(rot2.invert(3), 2);
    assert_eq!(rot2.invert(0), 3);
}
