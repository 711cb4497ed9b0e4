//! The match bitset written by the predicate kernels.
//!
//! A thin wrapper over `bitvec`'s `BitVec<u64, Lsb0>`: bit `i` lives in word
//! `i / 64` at position `i % 64`, which is exactly the shape of the 64-bit match
//! mask a predicate kernel produces per group. Kernels OR whole group masks in with
//! `or_word`; everything else goes through the ordinary bit API.

use bitvec::prelude::*;

use crate::kernels::width::low_mask;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitset {
    bits: BitVec<u64, Lsb0>,
}

impl Bitset {
    /// Creates an all-zero bitset of `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, len),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Panics if `i >= len`.
    #[inline]
    pub fn set(&mut self, i: usize) {
        self.bits.set(i, true);
    }

    #[inline]
    pub fn clear(&mut self, i: usize) {
        self.bits.set(i, false);
    }

    #[inline]
    pub fn is_set(&self, i: usize) -> bool {
        self.bits.get(i).map(|b| *b).unwrap_or(false)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Clears every bit.
    pub fn zero(&mut self) {
        self.bits.fill(false);
    }

    /// Sets every bit.
    pub fn one(&mut self) {
        self.bits.fill(true);
    }

    /// ORs a 64-bit group mask into word `group`. Bits beyond `len` are dropped.
    #[inline]
    pub fn or_word(&mut self, group: usize, mask: u64) {
        let live = self.len().saturating_sub(group * 64).min(64);
        self.bits.as_raw_mut_slice()[group] |= mask & low_mask(live);
    }

    /// Indices of the set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Little-endian byte image, `ceil(len / 8)` bytes, trailing bits zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len().div_ceil(8));
        for i in (0..self.len()).step_by(8) {
            let mut byte = 0u8;
            for (j, bit) in self.bits[i..(i + 8).min(self.len())].iter().enumerate() {
                byte |= (*bit as u8) << j;
            }
            out.push(byte);
        }
        out
    }

    /// Rebuilds a bitset of `len` bits from a `to_bytes` image.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let mut bits = BitVec::<u64, Lsb0>::repeat(false, len);
        for (i, mut bit) in bits.iter_mut().enumerate() {
            let byte = bytes.get(i / 8).copied().unwrap_or(0);
            *bit = (byte >> (i % 8)) & 1 == 1;
        }
        Self { bits }
    }
}
