//! This module provides the shared, low-level conversions between packed byte
//! buffers and the 64-bit code words the kernels operate on.
//!
//! The wire format is a sequence of little-endian `u64` words. Reading it never
//! relies on the native memory layout: on little-endian targets an 8-byte aligned
//! buffer is viewed in place through `bytemuck`, everything else (misaligned
//! buffers, big-endian targets, a trailing partial word) goes through an explicit
//! little-endian copy.

use std::borrow::Cow;

//==================================================================================
// 1. Sizing
//==================================================================================

/// Number of code words needed to hold `n` values at `log2` bits each.
#[inline]
pub fn words_needed(n: usize, log2: usize) -> usize {
    (n * log2).div_ceil(64)
}

/// Number of bytes needed to hold `n` values at `log2` bits each (word-aligned).
#[inline]
pub fn bytes_needed(n: usize, log2: usize) -> usize {
    words_needed(n, log2) * 8
}

//==================================================================================
// 2. Byte <-> Word Conversion
//==================================================================================

/// Returns an in-place word view of `buf` if the target layout allows it.
pub fn try_borrow_words(buf: &[u8]) -> Option<&[u64]> {
    if cfg!(target_endian = "little") {
        bytemuck::try_cast_slice(buf).ok()
    } else {
        None
    }
}

/// Decodes `buf` into `out` as little-endian words. A trailing partial word is
/// zero-padded.
pub fn load_words(buf: &[u8], out: &mut Vec<u64>) {
    out.clear();
    out.reserve(buf.len().div_ceil(8));
    let mut chunks = buf.chunks_exact(8);
    for chunk in &mut chunks {
        let mut le = [0u8; 8];
        le.copy_from_slice(chunk);
        out.push(u64::from_le_bytes(le));
    }
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut le = [0u8; 8];
        le[..rem.len()].copy_from_slice(rem);
        out.push(u64::from_le_bytes(le));
    }
}

/// Word view of `buf`: borrowed when possible, otherwise an owned copy.
pub fn words_from_bytes(buf: &[u8]) -> Cow<'_, [u64]> {
    match try_borrow_words(buf) {
        Some(words) => Cow::Borrowed(words),
        None => {
            let mut owned = Vec::new();
            load_words(buf, &mut owned);
            Cow::Owned(owned)
        }
    }
}

/// Appends `words` to `out` in little-endian byte order.
pub fn store_words(words: &[u64], out: &mut Vec<u8>) {
    out.reserve(words.len() * 8);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing() {
        assert_eq!(words_needed(0, 13), 0);
        assert_eq!(words_needed(64, 1), 1);
        assert_eq!(words_needed(65, 1), 2);
        assert_eq!(words_needed(200, 10), 32);
        assert_eq!(bytes_needed(200, 10), 256);
        assert_eq!(words_needed(1000, 0), 0);
    }

    #[test]
    fn test_words_roundtrip_little_endian() {
        let words = vec![0x0102_0304_0506_0708u64, u64::MAX, 0];
        let mut bytes = Vec::new();
        store_words(&words, &mut bytes);
        assert_eq!(&bytes[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);

        let mut back = Vec::new();
        load_words(&bytes, &mut back);
        assert_eq!(back, words);
        assert_eq!(words_from_bytes(&bytes).as_ref(), words.as_slice());
    }

    #[test]
    fn test_unaligned_slice_reads_same_words() {
        let mut bytes = vec![0u8; 17];
        bytes[1] = 0xAA;
        bytes[9] = 0x55;
        let view = words_from_bytes(&bytes[1..]);
        assert_eq!(view.as_ref(), &[0xAA, 0x55]);
    }

    #[test]
    fn test_partial_trailing_word_is_zero_padded() {
        let mut out = Vec::new();
        load_words(&[1, 2, 3], &mut out);
        assert_eq!(out, vec![0x0003_0201]);
    }
}
