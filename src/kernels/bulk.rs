//! Bulk encode/decode entry points.
//!
//! These walk a whole column: full 256-element blocks go through four kernel calls
//! each (one per 64-element group), and whatever is left over goes through the
//! generic codec. A block of 256 codes at `b` bits is exactly `4 * b` words, so the
//! tail always starts on a word boundary and the stream stays contiguous.
//!
//! Inputs shorter than one block skip the kernels entirely.

use super::block::{pack_kernel, unpack_kernel, GROUP_LEN};
use super::generic;
use super::width::log2_range;
use crate::error::ForpackError;
use crate::traits::{Code, PackedInt};
use crate::utils::{bytes_needed, store_words, words_from_bytes, words_needed};

/// Elements per unrolled block.
pub const BLOCK_LEN: usize = 4 * GROUP_LEN;

//==================================================================================
// 1. Word-Level Codec
//==================================================================================

/// Packs `src` at `log2` bits per value into `dst` and returns the words written.
///
/// `dst` must hold at least `ceil(src.len() * log2 / 64)` words.
pub fn bitpack<T: Code>(dst: &mut [u64], src: &[T], minv: T, log2: usize) -> usize {
    debug_assert!(log2 <= T::BITS, "bit width {} exceeds lane width {}", log2, T::BITS);
    if src.len() < BLOCK_LEN {
        return generic::encode(dst, src, minv, log2);
    }

    let kernel = pack_kernel::<T>(log2);
    let blocks = src.len() / BLOCK_LEN;
    let block_words = 4 * log2;
    for (blk, chunk) in src.chunks_exact(BLOCK_LEN).enumerate() {
        let out = &mut dst[blk * block_words..];
        kernel(&chunk[..GROUP_LEN], out, minv);
        kernel(&chunk[GROUP_LEN..], &mut out[log2..], minv);
        kernel(&chunk[2 * GROUP_LEN..], &mut out[2 * log2..], minv);
        kernel(&chunk[3 * GROUP_LEN..], &mut out[3 * log2..], minv);
    }

    let head = blocks * block_words;
    let tail = generic::encode(&mut dst[head..], &src[blocks * BLOCK_LEN..], minv, log2);
    head + tail
}

/// Unpacks `dst.len()` values from `src` and returns the number decoded.
pub fn bitunpack<T: Code>(dst: &mut [T], src: &[u64], minv: T, log2: usize) -> usize {
    debug_assert!(log2 <= T::BITS, "bit width {} exceeds lane width {}", log2, T::BITS);
    if dst.len() < BLOCK_LEN {
        return generic::decode(dst, src, minv, log2);
    }

    let kernel = unpack_kernel::<T>(log2);
    let blocks = dst.len() / BLOCK_LEN;
    let block_words = 4 * log2;
    for (blk, chunk) in dst.chunks_exact_mut(BLOCK_LEN).enumerate() {
        let words = &src[blk * block_words..];
        let (lo, hi) = chunk.split_at_mut(2 * GROUP_LEN);
        kernel(words, &mut lo[..GROUP_LEN], minv);
        kernel(&words[log2..], &mut lo[GROUP_LEN..], minv);
        kernel(&words[2 * log2..], &mut hi[..GROUP_LEN], minv);
        kernel(&words[3 * log2..], &mut hi[GROUP_LEN..], minv);
    }

    let head = blocks * BLOCK_LEN;
    head + generic::decode(&mut dst[head..], &src[blocks * block_words..], minv, log2)
}

//==================================================================================
// 2. Typed Entry Points
//==================================================================================

/// Encodes `src` against the range `[minv, maxv]` and returns
/// `(words_written, log2)`. Signed types share the unsigned kernels.
pub fn encode<T: PackedInt>(dst: &mut [u64], src: &[T], minv: T, maxv: T) -> (usize, usize) {
    let log2 = log2_range(minv, maxv);
    let n = bitpack(dst, T::as_unsigned_slice(src), minv.to_unsigned(), log2);
    (n, log2)
}

/// Decodes `dst.len()` values packed at `log2` bits with offset `minv`.
pub fn decode<T: PackedInt>(dst: &mut [T], src: &[u64], log2: usize, minv: T) -> usize {
    bitunpack(T::as_unsigned_slice_mut(dst), src, minv.to_unsigned(), log2)
}

//==================================================================================
// 3. Byte-Level Entry Points (validating)
//==================================================================================

/// Encodes `src` and appends the packed little-endian words to `dst`.
///
/// Every value must lie in `[minv, maxv]`. Returns the chosen bit width.
pub fn encode_bytes<T: PackedInt>(
    dst: &mut Vec<u8>,
    src: &[T],
    minv: T,
    maxv: T,
) -> Result<usize, ForpackError> {
    if minv > maxv {
        return Err(ForpackError::ValueOutOfRange(format!(
            "min {:?} is greater than max {:?}",
            minv, maxv
        )));
    }
    if let Some(v) = src.iter().find(|&&v| v < minv || v > maxv) {
        return Err(ForpackError::ValueOutOfRange(format!(
            "{:?} is outside [{:?}, {:?}]",
            v, minv, maxv
        )));
    }

    let log2 = log2_range(minv, maxv);
    let mut words = vec![0u64; words_needed(src.len(), log2)];
    let (written, _) = encode(&mut words, src, minv, maxv);
    if written != words.len() {
        return Err(ForpackError::InternalError(format!(
            "bitpack wrote {} words, expected {}",
            written,
            words.len()
        )));
    }
    store_words(&words, dst);

    log::debug!(
        "encode_bytes: kind={} n={} log2={} bytes={}",
        T::KIND,
        src.len(),
        log2,
        words.len() * 8
    );
    log_metric!(
        "event" = "encode",
        "kind" = T::KIND,
        "path" = if src.len() < BLOCK_LEN { "generic" } else { "block" },
        "log2" = log2
    );
    Ok(log2)
}

/// Decodes `dst.len()` values from a packed byte buffer.
pub fn decode_bytes<T: PackedInt>(
    dst: &mut [T],
    src: &[u8],
    log2: usize,
    minv: T,
) -> Result<usize, ForpackError> {
    let max = <T::Unsigned as Code>::BITS;
    if log2 > max {
        return Err(ForpackError::InvalidBitWidth { log2, max });
    }
    let needed = bytes_needed(dst.len(), log2);
    if src.len() < needed {
        return Err(ForpackError::BufferTooSmall {
            needed,
            actual: src.len(),
        });
    }

    let words = words_from_bytes(&src[..needed]);
    log::debug!(
        "decode_bytes: kind={} n={} log2={} path={}",
        T::KIND,
        dst.len(),
        log2,
        if dst.len() < BLOCK_LEN { "generic" } else { "block" }
    );
    log_metric!(
        "event" = "decode",
        "kind" = T::KIND,
        "zero_copy" = matches!(words, std::borrow::Cow::Borrowed(_)),
        "log2" = log2
    );
    Ok(decode(dst, &words, log2, minv))
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_short_input_uses_generic_layout() {
        let src: Vec<u32> = (0..200).map(|i| 5 + (i * 7) % 1019).collect();
        let mut words = vec![0u64; 32];
        let (n, log2) = encode(&mut words, &src, 5, 1023 + 5);
        assert_eq!((n, log2), (32, 10));

        let mut reference = vec![0u64; 32];
        generic::encode(&mut reference, &src, 5, 10);
        assert_eq!(words, reference);

        let mut out = vec![0u32; 200];
        assert_eq!(decode(&mut out, &words, 10, 5), 200);
        assert_eq!(out, src);
    }

    #[test]
    fn test_block_path_with_tail_is_one_contiguous_stream() {
        let mut rng = StdRng::seed_from_u64(17);
        for &len in &[256usize, 300, 511, 512, 1000] {
            for &log2 in &[1usize, 7, 13, 31, 32] {
                let mask = if log2 == 32 { u32::MAX } else { (1u32 << log2) - 1 };
                let src: Vec<u32> = (0..len).map(|_| rng.random::<u32>() & mask).collect();

                let mut words = vec![0u64; words_needed(len, log2)];
                assert_eq!(bitpack(&mut words, &src, 0, log2), words.len());

                let mut reference = vec![0u64; words.len()];
                generic::encode(&mut reference, &src, 0, log2);
                assert_eq!(words, reference, "len={} b={}", len, log2);

                let mut out = vec![0u32; len];
                assert_eq!(bitunpack(&mut out, &words, 0, log2), len);
                assert_eq!(out, src, "len={} b={}", len, log2);
            }
        }
    }

    #[test]
    fn test_signed_column_spanning_zero() {
        let src: Vec<i16> = (0..600).map(|i| (i as i16) - 300).collect();
        let mut words = vec![0u64; words_needed(src.len(), 10)];
        let (_, log2) = encode(&mut words, &src, -300, 299);
        assert_eq!(log2, 10);

        let mut out = vec![0i16; src.len()];
        decode(&mut out, &words, log2, -300);
        assert_eq!(out, src);
    }

    #[test]
    fn test_constant_column_packs_to_nothing() {
        let src = vec![42u64; 1000];
        let mut bytes = Vec::new();
        assert_eq!(encode_bytes(&mut bytes, &src, 42, 42).unwrap(), 0);
        assert!(bytes.is_empty());

        let mut out = vec![0u64; 1000];
        assert_eq!(decode_bytes(&mut out, &bytes, 0, 42).unwrap(), 1000);
        assert!(out.iter().all(|&v| v == 42));
    }

    #[test]
    fn test_encode_bytes_rejects_values_outside_range() {
        let mut bytes = Vec::new();
        let err = encode_bytes(&mut bytes, &[1i32, 50, 3], 0, 10).unwrap_err();
        assert!(matches!(err, ForpackError::ValueOutOfRange(_)));
        let err = encode_bytes(&mut bytes, &[1i32], 5, 0).unwrap_err();
        assert!(matches!(err, ForpackError::ValueOutOfRange(_)));
    }

    #[test]
    fn test_decode_bytes_validates_width_and_length() {
        let mut out = [0u8; 10];
        let err = decode_bytes(&mut out, &[0u8; 64], 9, 0u8).unwrap_err();
        assert!(matches!(err, ForpackError::InvalidBitWidth { log2: 9, max: 8 }));

        let err = decode_bytes(&mut out, &[0u8; 7], 8, 0u8).unwrap_err();
        assert!(matches!(err, ForpackError::BufferTooSmall { needed: 16, actual: 7 }));
    }

    #[test]
    fn test_bytes_roundtrip_unaligned_buffer() {
        let src: Vec<u64> = (0..700u64).map(|i| 1_000_000 + i * i).collect();
        let mut bytes = vec![0xFFu8];
        let log2 = encode_bytes(&mut bytes, &src, 1_000_000, 1_000_000 + 699 * 699).unwrap();

        let mut out = vec![0u64; src.len()];
        decode_bytes(&mut out, &bytes[1..], log2, 1_000_000).unwrap();
        assert_eq!(out, src);
    }
}
