//! Least circular rotation (Booth) and the canonical form of a circular
//! sequence under rotation and reflection.

use std::cmp::Ordering;

const NIL: isize = -1;

/// Start of the lexicographically least rotation of `v`.
pub fn least_rotation<T: Ord>(v: &[T]) -> usize {
    let n = v.len();
    if n == 0 {
        return 0;
    }

    let at = |i: isize| &v[i as usize % n];

    let mut f = vec![NIL; 2 * n];
    let mut k: isize = 0;

    for j in 1..2 * n as isize {
        let sj = at(j);
        let mut i = f[(j - k - 1) as usize];

        while i != NIL && sj != at(k + i + 1) {
            if sj < at(k + i + 1) {
                k = j - i - 1;
            }
            i = f[i as usize];
        }

        if sj != at(k + i + 1) {
            // i is NIL here
            if sj < at(k) {
                k = j;
            }
            f[(j - k) as usize] = NIL;
        } else {
            f[(j - k) as usize] = i + 1;
        }
    }

    k as usize % n
}

pub fn reversed<T: Clone>(v: &[T]) -> Vec<T> {
    v.iter().rev().cloned().collect()
}

/// `base` rotated so that it starts at `first`.
pub fn shifted<T: Clone>(base: &[T], first: usize) -> Vec<T> {
    let n = base.len();
    (0..n).map(|i| base[(i + first) % n].clone()).collect()
}

/// Compares the rotation of `left` starting at `ls` with the rotation of
/// `right` starting at `rs`.
pub fn compare_rotations<T: Ord>(left: &[T], right: &[T], ls: usize, rs: usize) -> Ordering {
    let n = left.len();
    debug_assert_eq!(n, right.len());
    (0..n)
        .map(|i| left[(i + ls) % n].cmp(&right[(i + rs) % n]))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

pub fn less_than<T: Ord>(left: &[T], right: &[T], ls: usize, rs: usize) -> bool {
    compare_rotations(left, right, ls, rs) == Ordering::Less
}

/// Whether `v` itself is the least of its rotations and reflections.
pub fn is_canonical_on_symmetry<T: Ord + Clone>(v: &[T]) -> bool {
    let rev = reversed(v);
    least_rotation(v) == 0 && !less_than(&rev, v, least_rotation(&rev), 0)
}

/// The least of the rotations and reflections of `v`.
pub fn canonical_on_symmetry<T: Ord + Clone>(v: &[T]) -> Vec<T> {
    let rev = reversed(v);
    let (first, rev_first) = (least_rotation(v), least_rotation(&rev));

    if less_than(&rev, v, rev_first, first) {
        shifted(&rev, rev_first)
    } else {
        shifted(v, first)
    }
}

#[cfg(test)]
fn bytes(s: &str) -> Vec<u8> {
    s.bytes().collect()
}

#[cfg(test)]
fn brute_force_least<T: Ord>(v: &[T]) -> usize {
    (0..v.len())
        .min_by(|&a, &b| compare_rotations(v, v, a, b).then(a.cmp(&b)))
        .unwrap_or(0)
}

#[test]
fn test_least_rotation() {
    assert_eq!(least_rotation(&bytes("bbbabbbbbb")), 3);
    assert_eq!(least_rotation(&bytes("bbabbababb")), 5);
    assert_eq!(least_rotation(&bytes("bbbabbabab")), 6);
    assert_eq!(least_rotation(&bytes("0001011010001011")), 9);
}

#[test]
fn test_least_rotation_random() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for _ in 0..1000 {
        let len = rng.gen_range(1..30);
        let v: Vec<u8> = (0..len).map(|_| rng.gen_range(0..3)).collect();
        let first = least_rotation(&v);
        assert_eq!(
            compare_rotations(&v, &v, first, brute_force_least(&v)),
            Ordering::Equal,
            "{v:?}"
        );
    }
}

#[test]
fn test_canonical_form() {
    let v = bytes("0001011010001011");
    assert_eq!(canonical_on_symmetry(&v), bytes("0001011000101101"));

    let a = canonical_on_symmetry(&bytes("1101000101100010"));
    let b = canonical_on_symmetry(&bytes("1101000101101000"));
    let c = canonical_on_symmetry(&bytes("1101000110100010"));
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn test_reverse_and_shift() {
    let v = bytes("01234");
    let rev = reversed(&v);
    assert_eq!(rev, bytes("43210"));
    assert_eq!(shifted(&rev, 1), bytes("32104"));
}

#[test]
fn test_is_canonical() {
    assert!(is_canonical_on_symmetry(&bytes("010101010202")));

    // type/angle layout: even slots hold line types
    let with_types = |types: [i8; 6]| {
        let mut v: Vec<i8> = bytes("010101010202").iter().map(|&b| (b - b'0') as i8).collect();
        for (k, t) in types.into_iter().enumerate() {
            v[2 * k] = t;
        }
        v
    };

    let v = with_types([-2, -1, -1, -2, -2, -2]);
    let rev = reversed(&v);
    assert_eq!(least_rotation(&v), 6);
    assert_eq!(least_rotation(&rev), 3);
    assert_eq!(canonical_on_symmetry(&v), shifted(&rev, 3));
    assert!(!is_canonical_on_symmetry(&v));

    assert!(is_canonical_on_symmetry(&with_types([-2, -2, -1, -1, -2, -2])));
    assert!(!is_canonical_on_symmetry(&with_types([-1, -2, -2, -2, -1, -2])));
}

#[test]
fn test_canonical_is_orbit_minimum() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let len = rng.gen_range(1..20);
        let v: Vec<u8> = (0..len).map(|_| rng.gen_range(0..2)).collect();
        let rev = reversed(&v);

        let orbit_min = (0..len)
            .flat_map(|s| [shifted(&v, s), shifted(&rev, s)])
            .min();
        assert_eq!(Some(canonical_on_symmetry(&v)), orbit_min);
    }
}
