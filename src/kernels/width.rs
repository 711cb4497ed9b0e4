//! The width selector: the minimal bit width for a min-FOR packed range.

use num_traits::WrappingSub;

use crate::traits::{Code, PackedInt};

/// Number of significant bits in `v` (0 for 0).
#[inline]
pub fn log2_of(v: u64) -> usize {
    (u64::BITS - v.leading_zeros()) as usize
}

/// Minimal `b` such that `maxv - minv` fits in `b` unsigned bits.
///
/// The distance is computed with wrapping arithmetic on the unsigned lanes, so
/// signed ranges spanning zero (e.g. `i8::MIN..=i8::MAX`) resolve to the full
/// lane width. Returns 0 iff `minv == maxv`. Requires `minv <= maxv`.
#[inline]
pub fn log2_range<T: PackedInt>(minv: T, maxv: T) -> usize {
    debug_assert!(minv <= maxv, "log2_range: min {:?} > max {:?}", minv, maxv);
    let dist = maxv.to_unsigned().wrapping_sub(&minv.to_unsigned());
    log2_of(dist.widen())
}

/// Bit mask with the low `log2` bits set, for `log2` in `0..=64`.
#[inline(always)]
pub const fn low_mask(log2: usize) -> u64 {
    if log2 >= 64 {
        u64::MAX
    } else {
        (1u64 << log2) - 1
    }
}
