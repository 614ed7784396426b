//! Half-open address intervals and aligned power-of-two ranges.

use std::fmt;

/// A half-open interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    /// First address.
    pub start: u64,
    /// One past the last address.
    pub end: u64,
}

impl Interval {
    /// Creates `[start, end)`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of addresses covered.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` for a zero-length interval.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn covers(&self, other: Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two intervals share at least one address.
    pub fn intersects(&self, other: Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

/// A `2^width`-address range starting at `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddressRange {
    /// First address.
    pub base: u64,
    /// Address width; the size is `2^width`.
    pub width: u32,
}

impl AddressRange {
    /// Creates a range of `2^width` addresses at `base`.
    pub fn new(base: u64, width: u32) -> Self {
        Self { base, width }
    }

    /// Number of addresses covered.
    pub fn size(&self) -> u64 {
        1u64 << self.width
    }

    /// One past the last address.
    pub fn end(&self) -> u64 {
        self.base + self.size()
    }

    /// The range as an [`Interval`].
    pub fn interval(&self) -> Interval {
        Interval::new(self.base, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_relations() {
        let outer = Interval::new(0x10, 0x20);
        assert!(outer.covers(Interval::new(0x10, 0x18)));
        assert!(!outer.covers(Interval::new(0x18, 0x28)));
        assert!(outer.intersects(Interval::new(0x18, 0x28)));
        assert!(!outer.intersects(Interval::new(0x20, 0x28)));
        assert_eq!(outer.len(), 0x10);
    }

    #[test]
    fn range_end() {
        let r = AddressRange::new(0x40, 4);
        assert_eq!(r.size(), 0x10);
        assert_eq!(r.end(), 0x50);
        assert_eq!(r.interval().to_string(), "[0x40, 0x50)");
    }
}
