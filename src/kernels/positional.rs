//! Byte-oriented positional access.
//!
//! This is a second, independent layout used for random writes and reads of single
//! elements in a byte buffer: element `i` occupies bits `[i*b, (i+1)*b)` of the
//! buffer read **MSB-first**, i.e. bit 0 of the stream is the top bit of byte 0.
//! It is not interchangeable with the word layout of the kernel family.
//!
//! Each value is placed with a per-index left shift so that its last bit lands on a
//! byte boundary:
//!
//! ```text
//! shift = ((i + 1) * ((64 - b) & 7)) & 7
//! first = (i * b) >> 3
//! span  = (b + shift + 7) >> 3          // bytes touched, at most 9
//! ```
//!
//! The shifted value is written big-endian over `span` bytes starting at `first`.
//! Writes OR into the buffer, so it must start zeroed and each index may be
//! written at most once.

use super::width::low_mask;

#[inline(always)]
fn geometry(index: usize, log2: usize) -> (usize, usize, usize) {
    let shift = (((64 - log2) & 7) * ((index + 1) & 7)) & 7;
    let first = (index * log2) >> 3;
    let span = (log2 + shift + 7) >> 3;
    (shift, first, span)
}

/// Writes `value & mask(log2)` as element `index`. A zero `log2` writes nothing.
pub fn pack(buf: &mut [u8], index: usize, log2: usize, value: u64) {
    if log2 == 0 {
        return;
    }
    let (shift, first, span) = geometry(index, log2);
    let v = ((value & low_mask(log2)) as u128) << shift;
    for (k, byte) in buf[first..first + span].iter_mut().enumerate() {
        *byte |= (v >> (8 * (span - 1 - k))) as u8;
    }
}

/// Reads element `index`. A zero `log2` reads 0.
pub fn unpack(buf: &[u8], index: usize, log2: usize) -> u64 {
    if log2 == 0 {
        return 0;
    }
    let (shift, first, span) = geometry(index, log2);
    let v = buf[first..first + span]
        .iter()
        .fold(0u128, |acc, &byte| (acc << 8) | byte as u128);
    (v >> shift) as u64 & low_mask(log2)
}

/// Bytes needed to hold `n` elements at `log2` bits in the positional layout.
#[inline]
pub fn bytes_needed(n: usize, log2: usize) -> usize {
    (n * log2).div_ceil(8)
}

/// A positional writer bound to one buffer and bit width.
pub struct Packer<'a> {
    buf: &'a mut [u8],
    log2: usize,
}

impl<'a> Packer<'a> {
    pub fn new(buf: &'a mut [u8], log2: usize) -> Self {
        Self { buf, log2 }
    }

    #[inline]
    pub fn pack(&mut self, index: usize, value: u64) {
        pack(self.buf, index, self.log2, value)
    }
}

/// A positional reader bound to one buffer and bit width.
#[derive(Clone, Copy)]
pub struct Unpacker<'a> {
    buf: &'a [u8],
    log2: usize,
}

impl<'a> Unpacker<'a> {
    pub fn new(buf: &'a [u8], log2: usize) -> Self {
        Self { buf, log2 }
    }

    #[inline]
    pub fn unpack(&self, index: usize) -> u64 {
        unpack(self.buf, index, self.log2)
    }

    /// Number of whole elements the buffer can hold.
    pub fn capacity(&self) -> usize {
        if self.log2 == 0 {
            usize::MAX
        } else {
            self.buf.len() * 8 / self.log2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_three_bit_stream_is_msb_first() {
        let mut buf = [0u8; 2];
        let mut packer = Packer::new(&mut buf, 3);
        packer.pack(0, 0b101);
        packer.pack(1, 0b011);
        packer.pack(2, 0b110);
        // 101 011 11|0
        assert_eq!(buf, [0b1010_1111, 0b0000_0000]);
        let unpacker = Unpacker::new(&buf, 3);
        assert_eq!(
            (unpacker.unpack(0), unpacker.unpack(1), unpacker.unpack(2)),
            (0b101, 0b011, 0b110)
        );
    }

    #[test]
    fn test_byte_width_is_identity() {
        let mut buf = [0u8; 4];
        for (i, v) in [0x12u64, 0x34, 0x56, 0x78].into_iter().enumerate() {
            pack(&mut buf, i, 8, v);
        }
        assert_eq!(buf, [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_random_writes_in_any_order() {
        let mut rng = StdRng::seed_from_u64(3);
        for log2 in 1..=64usize {
            let n = 67;
            let vals: Vec<u64> = (0..n).map(|_| rng.random::<u64>() & low_mask(log2)).collect();
            let mut buf = vec![0u8; bytes_needed(n, log2)];
            // write back-to-front to show writes are position independent
            for i in (0..n).rev() {
                pack(&mut buf, i, log2, vals[i]);
            }
            let unpacker = Unpacker::new(&buf, log2);
            for (i, &v) in vals.iter().enumerate() {
                assert_eq!(unpacker.unpack(i), v, "b={} i={}", log2, i);
            }
        }
    }

    #[test]
    fn test_value_is_masked_and_zero_width_is_noop() {
        let mut buf = [0u8; 1];
        pack(&mut buf, 0, 4, 0xFF);
        assert_eq!(buf, [0xF0]);
        pack(&mut buf, 5, 0, 0xFF);
        assert_eq!(buf, [0xF0]);
        assert_eq!(unpack(&buf, 9, 0), 0);
    }
}
