//! Reusable decoder state, pooled per element width.
//!
//! A `Decoder` borrows a `DecoderState` from a `DecoderPool` when it is bound and
//! hands it back when it is closed (or dropped). The state carries the scratch word
//! buffer used when a packed buffer cannot be viewed in place, so steady-state
//! decoding of misaligned buffers stops allocating once the pool is warm.
//!
//! A released state is always reset to its zero value first: a pooled state never
//! carries the previous column's buffer, width, length or min into the next bind.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::Decoder;
use crate::config::ForpackConfig;
use crate::error::ForpackError;
use crate::traits::{Code, PackedInt};
use crate::types::ElementWidth;
use crate::utils::bytes_needed;

static GLOBAL_POOL: Lazy<DecoderPool> = Lazy::new(DecoderPool::new);

/// The width-independent part of a bound decoder.
#[derive(Debug, Default)]
pub(crate) struct DecoderState {
    /// Owned little-endian copy of the packed words (empty when borrowing).
    pub(crate) scratch: Vec<u64>,
    pub(crate) log2: usize,
    pub(crate) len: usize,
    pub(crate) mask: u64,
    /// The column min, zero-extended from its unsigned lane.
    pub(crate) min_bits: u64,
}

impl DecoderState {
    fn reset(&mut self) {
        self.scratch.clear();
        self.log2 = 0;
        self.len = 0;
        self.mask = 0;
        self.min_bits = 0;
    }

    pub(crate) fn is_reset(&self) -> bool {
        self.scratch.is_empty()
            && self.log2 == 0
            && self.len == 0
            && self.mask == 0
            && self.min_bits == 0
    }
}

/// A bounded free list of decoder states for each element width.
#[derive(Debug)]
pub struct DecoderPool {
    config: ForpackConfig,
    free: [Mutex<Vec<DecoderState>>; 4],
}

impl Default for DecoderPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderPool {
    pub fn new() -> Self {
        Self::with_config(ForpackConfig::default())
    }

    pub fn with_config(config: ForpackConfig) -> Self {
        Self {
            config,
            free: Default::default(),
        }
    }

    /// The process-wide pool used by `Decoder::new`. Always default-configured.
    pub fn global() -> &'static DecoderPool {
        &GLOBAL_POOL
    }

    pub fn config(&self) -> &ForpackConfig {
        &self.config
    }

    /// Number of idle states currently held for `width`.
    pub fn idle(&self, width: ElementWidth) -> usize {
        self.free[width.index()].lock().len()
    }

    pub(crate) fn acquire(&self, width: ElementWidth) -> DecoderState {
        let reused = self.free[width.index()].lock().pop();
        log_metric!(
            "event" = "pool_acquire",
            "width" = width.bits(),
            "hit" = reused.is_some()
        );
        match reused {
            Some(state) => {
                debug_assert!(state.is_reset(), "pooled decoder state was not reset");
                state
            }
            None => DecoderState::default(),
        }
    }

    pub(crate) fn release(&self, width: ElementWidth, mut state: DecoderState) {
        state.reset();
        let mut free = self.free[width.index()].lock();
        let kept = free.len() < self.config.pool_capacity;
        if kept {
            free.push(state);
        }
        log_metric!("event" = "pool_release", "width" = width.bits(), "kept" = kept);
    }

    /// Binds a decoder to `n` values packed at `log2` bits in `buf`.
    ///
    /// The bit width is always validated against the element width. The buffer
    /// length is validated according to `config().bind_check`.
    pub fn bind<'a, T: PackedInt>(
        &'a self,
        buf: &'a [u8],
        log2: usize,
        n: usize,
        minv: T,
    ) -> Result<Decoder<'a, T>, ForpackError> {
        let max = <T::Unsigned as Code>::BITS;
        if log2 > max {
            return Err(ForpackError::InvalidBitWidth { log2, max });
        }
        if self.config.bind_check.is_enabled() {
            let needed = bytes_needed(n, log2);
            if buf.len() < needed {
                return Err(ForpackError::BufferTooSmall {
                    needed,
                    actual: buf.len(),
                });
            }
        }
        Ok(Decoder::with_pool(self, buf, log2, n, minv))
    }

    /// Binds a decoder without any validation.
    pub fn bind_unchecked<'a, T: PackedInt>(
        &'a self,
        buf: &'a [u8],
        log2: usize,
        n: usize,
        minv: T,
    ) -> Decoder<'a, T> {
        Decoder::with_pool(self, buf, log2, n, minv)
    }
}
