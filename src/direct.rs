//! Complete patterns in one pass: ternary bracelets over flat, major and
//! minor places, pruned with running Kawasaki and Maekawa values and checked
//! with the linear collapse at the leaves.

use {
    crate::{
        bracelet::KaryBracelets,
        fold::is_string_foldable,
        stats::EnumerationStats,
        theorem::{KawasakiValues, MaekawaValues, FLAT, MAJOR, MINOR},
    },
    std::fmt::Write,
};

const SYMBOL_COUNT: u8 = 3;

pub struct DirectEnumeration {
    n: isize,
    a: Vec<u8>,
    stats: EnumerationStats,
}

impl DirectEnumeration {
    pub fn new(place_count: usize) -> Self {
        Self {
            n: place_count as isize,
            a: vec![FLAT; place_count + 1],
            stats: EnumerationStats::default(),
        }
    }

    /// Calls `output` with every flat-foldable pattern, one per class under
    /// rotation and reflection. Patterns are 0-based over
    /// `FLAT`/`MAJOR`/`MINOR`.
    pub fn enumerate(&mut self, output: &mut impl FnMut(&[u8])) -> EnumerationStats {
        self.a.iter_mut().for_each(|c| *c = FLAT);
        self.stats = EnumerationStats::default();
        self.generate(
            1,
            1,
            1,
            -1,
            0,
            false,
            KawasakiValues::default(),
            MaekawaValues::default(),
            output,
        );
        self.stats
    }

    fn check_rev(&self, t: isize, i: isize) -> i8 {
        let a = &self.a;
        for j in i + 1..=(t + 1) / 2 {
            match a[j as usize].cmp(&a[(t - j + 1) as usize]) {
                std::cmp::Ordering::Less => return 0,
                std::cmp::Ordering::Greater => return -1,
                std::cmp::Ordering::Equal => (),
            }
        }
        1
    }

    #[allow(clippy::too_many_arguments)]
    fn generate(
        &mut self,
        t: isize,
        p: isize,
        mut r: isize,
        mut u: isize,
        mut v: isize,
        mut rs: bool,
        kawasaki: KawasakiValues,
        maekawa: MaekawaValues,
        output: &mut impl FnMut(&[u8]),
    ) {
        let n = self.n;
        let place_count = n as usize;
        self.stats.call_count += 1;
        self.stats.valid_call_count += 1;

        if t - 1 > (n - r) / 2 + r {
            let (x, y) = (self.a[(t - 1) as usize], self.a[(n - t + 2 + r) as usize]);
            if x > y {
                rs = false;
            } else if x < y {
                rs = true;
            }
        }

        if t > n {
            if !rs
                && n % p == 0
                && kawasaki.holds(place_count)
                && maekawa.holds()
                && is_string_foldable(&self.a[1..])
            {
                self.stats.answer_count += 1;
                output(&self.a[1..]);
            }
            return;
        }

        let ti = t as usize;
        let next_t = ti + 1;
        self.a[ti] = self.a[(t - p) as usize];
        let mut next_kawasaki = kawasaki.next(&self.a, ti, place_count);
        let next_maekawa = maekawa.next(&self.a, ti);

        if self.a[ti] == self.a[1] {
            v += 1;
        } else {
            v = 0;
        }
        if u == -1 && self.a[ti - 1] != self.a[1] {
            u = t - 2;
            r = t - 2;
        }

        let closes_periodic = u != -1 && t == n && self.a[place_count] == self.a[1];
        let feasible = next_kawasaki.can_hold(next_t, place_count)
            && next_maekawa.can_hold(next_kawasaki.remain(next_t, place_count));

        if !closes_periodic && feasible {
            let (k, m) = (next_kawasaki, next_maekawa);
            if u == v {
                match self.check_rev(t, u) {
                    0 => self.generate(t + 1, p, r, u, v, rs, k, m, output),
                    1 => self.generate(t + 1, p, t, u, v, false, k, m, output),
                    _ => (),
                }
            } else {
                self.generate(t + 1, p, r, u, v, rs, k, m, output);
            }
        }

        // a line where the period had none
        if self.a[ti] == FLAT {
            self.a[ti] = self.a[(t - p) as usize] + 1;
            next_kawasaki = kawasaki.next(&self.a, ti, place_count);
        }
        if !next_kawasaki.can_hold(next_t, place_count) {
            return;
        }

        for j in self.a[(t - p) as usize] + 1..SYMBOL_COUNT {
            self.a[ti] = j;
            let next_maekawa = maekawa.next(&self.a, ti);
            if !next_maekawa.can_hold(next_kawasaki.remain(next_t, place_count)) {
                continue;
            }
            self.generate(t + 1, t, r, u, 0, rs, next_kawasaki, next_maekawa, output);
        }
    }
}

pub fn enumerate(place_count: usize, output: &mut impl FnMut(&[u8])) -> EnumerationStats {
    DirectEnumeration::new(place_count).enumerate(output)
}

/// Every ternary bracelet, filtered only at the leaves.
pub fn enumerate_unpruned(place_count: usize, output: &mut impl FnMut(&[u8])) -> EnumerationStats {
    let mut stats = EnumerationStats::default();
    let bracelets = KaryBracelets::new(place_count, SYMBOL_COUNT).enumerate(&mut |pattern| {
        let majors = pattern.iter().filter(|&&c| c == MAJOR).count();
        let minors = pattern.iter().filter(|&&c| c == MINOR).count();
        if majors != minors + 2 {
            return;
        }
        stats.valid_call_count += 1;

        if is_string_foldable(pattern) {
            stats.answer_count += 1;
            output(pattern);
        }
    });
    stats.call_count = bracelets.call_count;
    stats
}

pub fn line_count(pattern: &[u8]) -> usize {
    pattern.iter().filter(|&&c| c != FLAT).count()
}

/// Same notation as `Skeleton::encode`, read from the first line.
pub fn encode(pattern: &[u8]) -> String {
    let place_count = pattern.len();
    let first = pattern.iter().position(|&c| c != FLAT).unwrap_or(0);

    let mut out = String::with_capacity(place_count);
    let mut empty_run = 0;
    for i in 0..place_count {
        let c = pattern[(first + i) % place_count];
        if c == FLAT {
            empty_run += 1;
            continue;
        }
        if empty_run > 0 {
            let _ = write!(out, "{empty_run}");
            empty_run = 0;
        }
        out.push(if c == MINOR { '-' } else { '+' });
    }
    if empty_run > 0 {
        let _ = write!(out, "{empty_run}");
    }
    out
}

#[cfg(test)]
use crate::canonical::canonical_on_symmetry;

#[test]
fn test_counts() {
    for (n, expected) in [(6, 6), (8, 20), (10, 87), (12, 420), (14, 2254), (16, 12676)] {
        let stats = enumerate(n, &mut |pattern| {
            assert_eq!(pattern.len(), n);
            assert_eq!(line_count(pattern) % 2, 0);
        });
        assert_eq!(stats.answer_count, expected, "n = {n}");
    }
}

#[test]
fn test_pruning_keeps_every_pattern() {
    for n in (6..=12).step_by(2) {
        let mut pruned = Vec::new();
        let stats = enumerate(n, &mut |pattern| pruned.push(canonical_on_symmetry(pattern)));
        let mut unpruned = Vec::new();
        let reference =
            enumerate_unpruned(n, &mut |pattern| unpruned.push(canonical_on_symmetry(pattern)));

        assert_eq!(stats.answer_count, reference.answer_count, "n = {n}");
        assert!(stats.call_count < reference.call_count, "n = {n}");
        pruned.sort();
        unpruned.sort();
        assert_eq!(pruned, unpruned, "n = {n}");
    }
}

#[test]
fn test_maekawa_in_every_answer() {
    enumerate(12, &mut |pattern| {
        let majors = pattern.iter().filter(|&&c| c == MAJOR).count();
        let minors = pattern.iter().filter(|&&c| c == MINOR).count();
        assert_eq!(majors, minors + 2, "{}", encode(pattern));
    });
}

#[test]
fn test_encode() {
    assert_eq!(encode(&[FLAT, MAJOR, MINOR, FLAT, FLAT, MAJOR]), "+-2+1");
    assert_eq!(encode(&[MAJOR, FLAT, MAJOR, FLAT]), "+1+1");
}
