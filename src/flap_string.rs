//! Circular pattern string of a skeleton: for every line its type and the
//! angle to the next line, stored interleaved so the whole string can be
//! canonicalized as one sequence.

use {crate::skeleton::Skeleton, std::fmt};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlapPatternString {
    values: Vec<i8>,
}

impl FlapPatternString {
    pub const MINOR: i8 = -1;
    pub const MAJOR: i8 = -2;

    /// Every line major. `map` lists the line positions in increasing order.
    pub fn new(place_count: usize, map: &[usize]) -> Self {
        debug_assert!(place_count <= i8::MAX as usize);

        let line_count = map.len();
        let mut values = Vec::with_capacity(2 * line_count);
        for i in 0..line_count {
            let angle = (place_count + map[(i + 1) % line_count] - map[i]) % place_count;
            values.push(Self::MAJOR);
            values.push(angle as i8);
        }

        Self { values }
    }

    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        Self::new(skeleton.place_count(), &skeleton.line_index_map())
    }

    pub fn line_count(&self) -> usize {
        self.values.len() / 2
    }

    #[inline]
    fn position(&self, line: isize) -> usize {
        let count = self.line_count() as isize;
        (line.rem_euclid(count) as usize) * 2
    }

    /// Type of `line`; indices wrap around in both directions.
    #[inline]
    pub fn line_type(&self, line: isize) -> i8 {
        self.values[self.position(line)]
    }

    #[inline]
    pub fn set_line_type(&mut self, line: isize, line_type: i8) {
        debug_assert!(line_type == Self::MINOR || line_type == Self::MAJOR);
        let position = self.position(line);
        self.values[position] = line_type;
    }

    /// Angle from `line` to the next line.
    #[inline]
    pub fn angle(&self, line: isize) -> i8 {
        self.values[self.position(line) + 1]
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.values
    }

    /// Makes line `k` the first one.
    pub fn shift_head(&mut self, k: usize) {
        if self.values.is_empty() {
            return;
        }
        let position = self.position(k as isize);
        self.values.rotate_left(position);
    }

    /// The largest symbol, for sizing alphabets.
    pub fn max_symbol(&self) -> i8 {
        self.values.iter().copied().max().unwrap_or(Self::MAJOR)
    }
}

impl fmt::Display for FlapPatternString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in self.values.chunks(2) {
            let c = if pair[0] == Self::MINOR { '-' } else { '+' };
            write!(f, "{c}{}", pair[1])?;
        }
        Ok(())
    }
}

#[test]
fn test_from_skeleton() {
    let skeleton = Skeleton::from_items(8, [0, 1, 3, 7]);
    let string = FlapPatternString::from_skeleton(&skeleton);

    assert_eq!(string.line_count(), 4);
    assert_eq!(string.to_string(), "+1+2+4+1");
    assert_eq!(string.angle(2), 4);
    assert_eq!(string.angle(-1), 1);
    assert_eq!(string.angle(-2), 4);
    assert_eq!(string.max_symbol(), 4);

    let square = FlapPatternString::from_skeleton(&Skeleton::from_items(8, [0, 2, 4, 6]));
    assert_eq!(square.to_string(), "+2+2+2+2");
}

#[test]
fn test_line_types() {
    let mut string = FlapPatternString::new(8, &[0, 1, 3, 7]);
    string.set_line_type(1, FlapPatternString::MINOR);
    string.set_line_type(-1, FlapPatternString::MINOR);

    assert_eq!(string.to_string(), "+1-2+4-1");
    assert_eq!(string.line_type(3), FlapPatternString::MINOR);
    assert_eq!(string.line_type(5), FlapPatternString::MINOR);
    assert_eq!(string.as_slice(), &[-2, 1, -1, 2, -2, 4, -1, 1]);

    string.set_line_type(1, FlapPatternString::MAJOR);
    assert_eq!(string.to_string(), "+1+2+4-1");
}

#[test]
fn test_shift_head() {
    let mut string = FlapPatternString::new(8, &[0, 1, 3, 7]);
    string.shift_head(2);
    assert_eq!(string.to_string(), "+4+1+1+2");
    string.shift_head(2);
    assert_eq!(string.to_string(), "+1+2+4+1");
}
