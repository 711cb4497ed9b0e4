//! The generic bitstream codec.
//!
//! This is the bit-width-agnostic path used for inputs shorter than one block and
//! for the tail after the last full block. It produces exactly the layout of the
//! kernel family, so a stream may freely mix the two: a generic segment that starts
//! on a word boundary continues the kernel stream bit for bit.

use super::width::low_mask;
use crate::traits::Code;

/// Packs `src` into `dst` at `log2` bits per value and returns the number of code
/// words written (`ceil(src.len() * log2 / 64)`).
///
/// Codes are accumulated into a 64-bit word at a running bit offset. When a code
/// crosses the word boundary the full word is flushed and the bits that did not
/// fit seed the next accumulator.
pub fn encode<T: Code>(dst: &mut [u64], src: &[T], minv: T, log2: usize) -> usize {
    if log2 == 0 || src.is_empty() {
        return 0;
    }
    let mask = low_mask(log2);
    let minv = minv.widen();

    let mut acc = 0u64;
    let mut offset = 0usize;
    let mut out = 0usize;
    for &v in src {
        let code = v.widen().wrapping_sub(minv) & mask;
        acc |= code << offset;
        offset += log2;
        if offset >= 64 {
            dst[out] = acc;
            out += 1;
            offset -= 64;
            // `offset` high bits of `code` spill into the next word.
            acc = if offset > 0 { code >> (log2 - offset) } else { 0 };
        }
    }
    if offset > 0 {
        dst[out] = acc;
        out += 1;
    }
    out
}

/// Unpacks `dst.len()` values from `src` and returns the number decoded.
pub fn decode<T: Code>(dst: &mut [T], src: &[u64], minv: T, log2: usize) -> usize {
    if log2 == 0 {
        dst.fill(minv);
        return dst.len();
    }
    let mask = low_mask(log2);
    let minw = minv.widen();

    let mut pos = 0usize;
    let mut offset = 0usize;
    for out in dst.iter_mut() {
        let mut v = src[pos] >> offset;
        let avail = 64 - offset;
        if avail < log2 {
            v |= src[pos + 1] << avail;
        }
        *out = T::narrow((v & mask).wrapping_add(minw));
        offset += log2;
        if offset >= 64 {
            pos += 1;
            offset -= 64;
        }
    }
    dst.len()
}

/// Reads the raw code of element `index` without applying the min offset.
#[inline]
pub fn read_code(src: &[u64], index: usize, log2: usize) -> u64 {
    read_masked(src, index, log2, low_mask(log2))
}

/// `read_code` with a precomputed `mask == low_mask(log2)`.
#[inline]
pub fn read_masked(src: &[u64], index: usize, log2: usize, mask: u64) -> u64 {
    if log2 == 0 {
        return 0;
    }
    let bit = index * log2;
    let (pos, s) = (bit >> 6, bit & 63);
    let mut v = src[pos] >> s;
    if s + log2 > 64 {
        v |= src[pos + 1] << (64 - s);
    }
    v & mask
}
