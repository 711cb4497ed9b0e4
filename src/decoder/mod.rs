//! The bound, pooled decoder.
//!
//! A `Decoder` is bound to one packed column (buffer, bit width, length, min) and
//! serves three access patterns over it:
//!
//!   - `decode`       the whole column at once (bulk path)
//!   - `decode_value` one element by index
//!   - `decode_chunk` 128 elements at a 128-aligned offset, for vectorized scans
//!
//! On little-endian targets an 8-byte aligned buffer is read in place. Anything
//! else is copied once, at bind time, into the pooled scratch buffer.

pub mod pool;

use std::marker::PhantomData;

use crate::kernels::block::{unpack_kernel, UnpackFn, GROUP_LEN};
use crate::kernels::bulk::bitunpack;
use crate::kernels::generic::{self, read_masked};
use crate::kernels::width::low_mask;
use crate::traits::{Code, PackedInt};
use crate::utils::{bytes_needed, load_words, try_borrow_words};

pub use pool::DecoderPool;
use pool::DecoderState;

/// Elements per `decode_chunk` call.
pub const CHUNK_LEN: usize = 2 * GROUP_LEN;

pub struct Decoder<'a, T: PackedInt> {
    pool: &'a DecoderPool,
    state: DecoderState,
    /// In-place view of the packed words; `None` means they live in `state.scratch`.
    words: Option<&'a [u64]>,
    unpack: UnpackFn<T::Unsigned>,
    _marker: PhantomData<T>,
}

impl<'a, T: PackedInt> Decoder<'a, T> {
    /// Binds a decoder from the global pool.
    ///
    /// `buf` must hold at least `ceil(n * log2 / 64)` little-endian words and `log2`
    /// must not exceed the bit width of `T`. Neither is checked in release builds;
    /// use `DecoderPool::bind` for a validating bind.
    pub fn new(buf: &'a [u8], log2: usize, n: usize, minv: T) -> Self {
        Self::with_pool(DecoderPool::global(), buf, log2, n, minv)
    }

    pub(crate) fn with_pool(
        pool: &'a DecoderPool,
        buf: &'a [u8],
        log2: usize,
        n: usize,
        minv: T,
    ) -> Self {
        let width = <T::Unsigned as Code>::WIDTH;
        debug_assert!(log2 <= width.bits(), "bit width {} exceeds {:?}", log2, width);
        debug_assert!(
            buf.len() >= bytes_needed(n, log2),
            "packed buffer holds {} bytes, {} needed",
            buf.len(),
            bytes_needed(n, log2)
        );

        let mut state = pool.acquire(width);
        let used = &buf[..bytes_needed(n, log2).min(buf.len())];
        let words = match try_borrow_words(used) {
            Some(words) => Some(words),
            None => {
                load_words(used, &mut state.scratch);
                None
            }
        };
        state.log2 = log2;
        state.len = n;
        state.mask = low_mask(log2);
        state.min_bits = minv.to_unsigned().widen();

        log_metric!(
            "event" = "bind",
            "kind" = T::KIND,
            "log2" = log2,
            "len" = n,
            "zero_copy" = words.is_some()
        );
        Self {
            pool,
            state,
            words,
            unpack: unpack_kernel::<T::Unsigned>(log2),
            _marker: PhantomData,
        }
    }

    /// Number of values in the bound column.
    pub fn len(&self) -> usize {
        self.state.len
    }

    pub fn is_empty(&self) -> bool {
        self.state.len == 0
    }

    pub fn log2(&self) -> usize {
        self.state.log2
    }

    pub fn min(&self) -> T {
        T::from_unsigned(self.min_lane())
    }

    #[inline]
    fn min_lane(&self) -> T::Unsigned {
        <T::Unsigned as Code>::narrow(self.state.min_bits)
    }

    #[inline]
    fn words(&self) -> &[u64] {
        match self.words {
            Some(words) => words,
            None => &self.state.scratch,
        }
    }

    /// Decodes the first `min(dst.len(), len())` values and returns how many.
    pub fn decode(&self, dst: &mut [T]) -> usize {
        let n = dst.len().min(self.len());
        let dst = &mut T::as_unsigned_slice_mut(dst)[..n];
        bitunpack(dst, self.words(), self.min_lane(), self.state.log2)
    }

    /// Decodes the value at `index`. Requires `index < len()`.
    #[inline]
    pub fn decode_value(&self, index: usize) -> T {
        debug_assert!(index < self.len(), "index {} out of {}", index, self.len());
        let log2 = self.state.log2;
        if log2 == 0 {
            return self.min();
        }
        let code = read_masked(self.words(), index, log2, self.state.mask);
        T::from_unsigned(<T::Unsigned as Code>::narrow(
            code.wrapping_add(self.state.min_bits),
        ))
    }

    /// Decodes up to 128 values starting at `ofs` and returns how many.
    ///
    /// `ofs` must be a multiple of 128. Returns 0 once `ofs` reaches `len()`.
    pub fn decode_chunk(&self, dst: &mut [T; CHUNK_LEN], ofs: usize) -> usize {
        debug_assert_eq!(ofs % CHUNK_LEN, 0, "chunk offset {} is not aligned", ofs);
        let n = self.len();
        if ofs >= n {
            return 0;
        }
        let log2 = self.state.log2;
        // a 64-aligned offset starts on a word boundary
        let start = ofs / GROUP_LEN * log2;
        let words = &self.words()[start..];
        let minv = self.min_lane();
        let dst = T::as_unsigned_slice_mut(dst.as_mut_slice());

        if n - ofs >= CHUNK_LEN {
            let (lo, hi) = dst.split_at_mut(GROUP_LEN);
            (self.unpack)(words, lo, minv);
            (self.unpack)(&words[log2..], hi, minv);
            CHUNK_LEN
        } else {
            generic::decode(&mut dst[..n - ofs], words, minv, log2)
        }
    }

    /// Returns the decoder state to its pool.
    pub fn close(self) {
        drop(self)
    }
}

impl<T: PackedInt> Drop for Decoder<'_, T> {
    fn drop(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.pool.release(<T::Unsigned as Code>::WIDTH, state);
    }
}
