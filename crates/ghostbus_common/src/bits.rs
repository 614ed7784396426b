//! Power-of-two width arithmetic.
//!
//! Every allocated range is `2^width` addresses starting at a multiple of its
//! own size, so widths rather than sizes are passed around almost everywhere.

/// Widest address space a region can hold; sizes are `u64`.
pub const MAX_ADDRESS_WIDTH: u32 = 63;

/// Number of bits needed to represent `value`; `bits(0) == 0`.
///
/// A region whose highest used address is `n - 1` needs `bits(n - 1)` address
/// bits.
pub fn bits(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// Smallest power of two `>= value`; `ceil_po2(0) == 1`.
pub fn ceil_po2(value: u64) -> u64 {
    value.max(1).next_power_of_two()
}

/// Address width of the smallest power-of-two block holding `size` addresses.
pub fn width_of(size: u64) -> u32 {
    bits(ceil_po2(size) - 1)
}

/// Returns `true` if `addr` is a multiple of `2^width`.
pub fn is_aligned(addr: u64, width: u32) -> bool {
    addr & low_mask(width) == 0
}

/// Rounds `addr` up to the next multiple of `2^width`, or `None` on overflow.
pub fn align_up(addr: u64, width: u32) -> Option<u64> {
    let mask = low_mask(width);
    addr.checked_add(mask).map(|a| a & !mask)
}

fn low_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_small_values() {
        assert_eq!(bits(0), 0);
        assert_eq!(bits(1), 1);
        assert_eq!(bits(3), 2);
        assert_eq!(bits(4), 3);
        assert_eq!(bits(0xff), 8);
    }

    #[test]
    fn ceil_po2_rounds_up() {
        assert_eq!(ceil_po2(0), 1);
        assert_eq!(ceil_po2(5), 8);
        assert_eq!(ceil_po2(16), 16);
    }

    #[test]
    fn width_of_sizes() {
        assert_eq!(width_of(1), 0);
        assert_eq!(width_of(2), 1);
        assert_eq!(width_of(12), 4);
        assert_eq!(width_of(16), 4);
    }

    #[test]
    fn alignment() {
        assert!(is_aligned(0x40, 4));
        assert!(!is_aligned(0x44, 4));
        assert!(is_aligned(0x7, 0));
        assert_eq!(align_up(0x41, 4), Some(0x50));
        assert_eq!(align_up(0x40, 4), Some(0x40));
        assert_eq!(align_up(u64::MAX, 4), None);
    }
}
