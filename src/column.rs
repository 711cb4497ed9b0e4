//! An owned, packed integer column.
//!
//! `PackedColumn` ties together what the lower layers keep separate: the packed
//! byte buffer, its bit width, length and min. It encodes from a plain slice,
//! hands out bound decoders, and runs predicates given in *value* space by
//! translating them into code space before calling the fused kernels.

use num_traits::WrappingSub;
use serde::{Deserialize, Serialize};

use crate::bitset::Bitset;
use crate::decoder::{Decoder, DecoderPool};
use crate::error::ForpackError;
use crate::kernels::bulk::encode_bytes;
use crate::kernels::cmp::{self, FilterMode};
use crate::kernels::width::low_mask;
use crate::traits::{Code, PackedInt};
use crate::types::ElementKind;
use crate::utils::bytes_needed;

/// The self-describing header of a packed column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMeta {
    pub kind: ElementKind,
    pub log2: u8,
    pub len: u64,
    /// The column min as the raw bits of its unsigned lane.
    pub min_bits: u64,
}

impl ColumnMeta {
    pub fn to_json(&self) -> Result<String, ForpackError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ForpackError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedColumn<T: PackedInt> {
    buf: Vec<u8>,
    log2: usize,
    len: usize,
    minv: T,
}

// Where a value-space operand falls relative to the column's code range.
enum Operand {
    Below,
    InRange(u64),
    Above,
}

impl<T: PackedInt> PackedColumn<T> {
    /// Packs `src` at the minimal bit width for its value range.
    pub fn encode(src: &[T]) -> Result<Self, ForpackError> {
        let (minv, maxv) = match src.iter().copied().min().zip(src.iter().copied().max()) {
            Some(range) => range,
            None => (T::zero(), T::zero()),
        };
        let mut buf = Vec::new();
        let log2 = encode_bytes(&mut buf, src, minv, maxv)?;
        Ok(Self {
            buf,
            log2,
            len: src.len(),
            minv,
        })
    }

    /// Rebuilds a column from its buffer and header.
    pub fn from_parts(buf: Vec<u8>, meta: &ColumnMeta) -> Result<Self, ForpackError> {
        if meta.kind != T::KIND {
            return Err(ForpackError::UnsupportedType(format!(
                "column holds {} values, expected {}",
                meta.kind,
                T::KIND
            )));
        }
        let log2 = meta.log2 as usize;
        let max = <T::Unsigned as Code>::BITS;
        if log2 > max {
            return Err(ForpackError::InvalidBitWidth { log2, max });
        }
        let len = usize::try_from(meta.len)
            .map_err(|_| ForpackError::ValueOutOfRange(format!("length {}", meta.len)))?;
        let needed = bytes_needed(len, log2);
        if buf.len() < needed {
            return Err(ForpackError::BufferTooSmall {
                needed,
                actual: buf.len(),
            });
        }
        Ok(Self {
            buf,
            log2,
            len,
            minv: T::from_unsigned(<T::Unsigned as Code>::narrow(meta.min_bits)),
        })
    }

    pub fn meta(&self) -> ColumnMeta {
        ColumnMeta {
            kind: T::KIND,
            log2: self.log2 as u8,
            len: self.len as u64,
            min_bits: self.minv.to_unsigned().widen(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn log2(&self) -> usize {
        self.log2
    }

    pub fn min(&self) -> T {
        self.minv
    }

    /// Binds a decoder from the global pool.
    pub fn decoder(&self) -> Decoder<'_, T> {
        Decoder::new(&self.buf, self.log2, self.len, self.minv)
    }

    /// Binds a decoder from `pool`.
    pub fn decoder_in<'a>(&'a self, pool: &'a DecoderPool) -> Decoder<'a, T> {
        pool.bind_unchecked(&self.buf, self.log2, self.len, self.minv)
    }

    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.len).then(|| self.decoder().decode_value(index))
    }

    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::zero(); self.len];
        self.decoder().decode(&mut out);
        out
    }

    fn operand(&self, v: T) -> Operand {
        if v < self.minv {
            return Operand::Below;
        }
        let code = v.to_unsigned().wrapping_sub(&self.minv.to_unsigned()).widen();
        if code > low_mask(self.log2) {
            Operand::Above
        } else {
            Operand::InRange(code)
        }
    }

    /// Returns the rows whose value satisfies `mode` against `val`.
    ///
    /// `val2` is the inclusive upper bound for `FilterMode::Range` and ignored
    /// otherwise. Operands outside the column's range are resolved without
    /// touching the packed data.
    pub fn filter(&self, mode: FilterMode, val: T, val2: T) -> Bitset {
        use Operand::*;

        let mut bits = Bitset::new(self.len);
        let log2 = self.log2;
        let buf = self.buf.as_slice();
        let n = self.len;
        let max_code = low_mask(log2);

        match (mode, self.operand(val)) {
            (FilterMode::Equal, InRange(c)) => cmp::EQUAL[log2](buf, c, n, &mut bits),
            (FilterMode::Equal, _) => {}

            (FilterMode::NotEqual, InRange(c)) => cmp::NOT_EQUAL[log2](buf, c, n, &mut bits),
            (FilterMode::NotEqual, _) => bits.one(),

            (FilterMode::Less, InRange(c)) => cmp::LESS[log2](buf, c, n, &mut bits),
            (FilterMode::Less, Below) => {}
            (FilterMode::Less, Above) => bits.one(),

            (FilterMode::LessEqual, InRange(c)) => cmp::LESS_EQUAL[log2](buf, c, n, &mut bits),
            (FilterMode::LessEqual, Below) => {}
            (FilterMode::LessEqual, Above) => bits.one(),

            (FilterMode::Greater, InRange(c)) => cmp::GREATER[log2](buf, c, n, &mut bits),
            (FilterMode::Greater, Below) => bits.one(),
            (FilterMode::Greater, Above) => {}

            (FilterMode::GreaterEqual, InRange(c)) => cmp::GREATER_EQUAL[log2](buf, c, n, &mut bits),
            (FilterMode::GreaterEqual, Below) => bits.one(),
            (FilterMode::GreaterEqual, Above) => {}

            (FilterMode::Range, lo) => {
                if val > val2 {
                    return bits;
                }
                let from = match lo {
                    Below => 0,
                    InRange(c) => c,
                    Above => return bits,
                };
                let to = match self.operand(val2) {
                    Below => return bits,
                    InRange(c) => c,
                    Above => max_code,
                };
                if from == 0 && to == max_code {
                    bits.one();
                } else {
                    cmp::BETWEEN[log2](buf, from, to, n, &mut bits);
                }
            }
        }
        log::debug!(
            "filter: kind={} mode={:?} n={} matches={}",
            T::KIND,
            mode,
            n,
            bits.count()
        );
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn naive<T: PackedInt>(src: &[T], pred: impl Fn(T) -> bool) -> Vec<usize> {
        src.iter()
            .enumerate()
            .filter(|(_, &v)| pred(v))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_encode_picks_range_and_roundtrips() {
        let src: Vec<i32> = vec![-50, 10, 77, -3, 0, 12];
        let col = PackedColumn::encode(&src).unwrap();
        assert_eq!(col.min(), -50);
        assert_eq!(col.log2(), 7);
        assert_eq!(col.to_vec(), src);
        assert_eq!(col.get(2), Some(77));
        assert_eq!(col.get(6), None);
    }

    #[test]
    fn test_empty_column() {
        let col = PackedColumn::<u16>::encode(&[]).unwrap();
        assert!(col.is_empty());
        assert_eq!(col.log2(), 0);
        assert!(col.to_vec().is_empty());
        assert_eq!(col.filter(FilterMode::NotEqual, 1, 0).len(), 0);
    }

    #[test]
    fn test_filter_matches_naive_in_value_space() {
        let mut rng = StdRng::seed_from_u64(9);
        let src: Vec<i16> = (0..777).map(|_| rng.random_range(-40..60)).collect();
        let col = PackedColumn::encode(&src).unwrap();

        for probe in [-100i16, -40, -1, 0, 17, 59, 200] {
            let cases: [(FilterMode, fn(i16, i16) -> bool); 6] = [
                (FilterMode::Equal, |v, p| v == p),
                (FilterMode::NotEqual, |v, p| v != p),
                (FilterMode::Less, |v, p| v < p),
                (FilterMode::LessEqual, |v, p| v <= p),
                (FilterMode::Greater, |v, p| v > p),
                (FilterMode::GreaterEqual, |v, p| v >= p),
            ];
            for (mode, pred) in cases {
                let got: Vec<usize> = col.filter(mode, probe, 0).iter_ones().collect();
                assert_eq!(got, naive(&src, |v| pred(v, probe)), "{:?} {}", mode, probe);
            }
        }
    }

    fn random_column<T: PackedInt>(rng: &mut StdRng, n: usize, shift: u32) -> Vec<T> {
        (0..n)
            .map(|_| T::from_unsigned(<T::Unsigned as Code>::narrow(rng.random::<u64>() >> shift)))
            .collect()
    }

    fn check_column<T: PackedInt>(src: &[T], operands: &[T]) {
        let col = PackedColumn::encode(src).unwrap();
        assert_eq!(col.to_vec(), src, "{}", T::KIND);
        for (i, &v) in src.iter().enumerate() {
            assert_eq!(col.get(i), Some(v));
        }
        for &p in operands {
            let cases: [(FilterMode, fn(T, T) -> bool); 6] = [
                (FilterMode::Equal, |v, p| v == p),
                (FilterMode::NotEqual, |v, p| v != p),
                (FilterMode::Less, |v, p| v < p),
                (FilterMode::LessEqual, |v, p| v <= p),
                (FilterMode::Greater, |v, p| v > p),
                (FilterMode::GreaterEqual, |v, p| v >= p),
            ];
            for (mode, pred) in cases {
                let got: Vec<usize> = col.filter(mode, p, p).iter_ones().collect();
                assert_eq!(got, naive(src, |v| pred(v, p)), "{} {:?} {:?}", T::KIND, mode, p);
            }
            let got: Vec<usize> = col.filter(FilterMode::Range, col.min(), p).iter_ones().collect();
            assert_eq!(got, naive(src, |v| v <= p), "{} range {:?}", T::KIND, p);
        }
    }

    fn check_kind<T: PackedInt>(rng: &mut StdRng) {
        let bits = <T::Unsigned as Code>::BITS as u32;
        for &n in &[0usize, 1, 63, 257, 1000] {
            // narrow ranges, then the full lane
            for shift in [64 - 3, 64 - bits / 2, 64 - bits] {
                let src: Vec<T> = random_column(rng, n, shift);
                let mut operands: Vec<T> = src.iter().take(3).copied().collect();
                operands.extend([T::min_value(), T::max_value(), T::zero()]);
                check_column(&src, &operands);
            }
        }
        let constant = vec![T::max_value(); 300];
        check_column(&constant, &[T::max_value(), T::min_value()]);
        let extremes: Vec<T> = (0..300)
            .map(|i| if i % 3 == 0 { T::min_value() } else { T::max_value() })
            .collect();
        check_column(&extremes, &[T::min_value(), T::max_value(), T::zero()]);
    }

    #[test]
    fn test_every_integer_kind_roundtrips_and_filters() {
        let mut rng = StdRng::seed_from_u64(2024);
        check_kind::<u8>(&mut rng);
        check_kind::<i8>(&mut rng);
        check_kind::<u16>(&mut rng);
        check_kind::<i16>(&mut rng);
        check_kind::<u32>(&mut rng);
        check_kind::<i32>(&mut rng);
        check_kind::<u64>(&mut rng);
        check_kind::<i64>(&mut rng);
    }

    #[test]
    fn test_range_filter_clamps_bounds() {
        let src: Vec<u64> = (100..400).collect();
        let col = PackedColumn::encode(&src).unwrap();

        let hits = |lo, hi| col.filter(FilterMode::Range, lo, hi).count();
        assert_eq!(hits(0, 1000), 300);
        assert_eq!(hits(0, 149), 50);
        assert_eq!(hits(350, u64::MAX), 50);
        assert_eq!(hits(200, 209), 10);
        assert_eq!(hits(0, 99), 0);
        assert_eq!(hits(500, 600), 0);
        assert_eq!(hits(300, 200), 0);
    }

    #[test]
    fn test_meta_roundtrip_through_json() {
        let src: Vec<i8> = vec![-128, 0, 127, -1];
        let col = PackedColumn::encode(&src).unwrap();
        let meta = col.meta();
        assert_eq!(meta.kind, ElementKind::Int8);
        assert_eq!(meta.log2, 8);
        assert_eq!(meta.min_bits, 0x80);

        let json = meta.to_json().unwrap();
        let back = ColumnMeta::from_json(&json).unwrap();
        let rebuilt = PackedColumn::<i8>::from_parts(col.clone().into_bytes(), &back).unwrap();
        assert_eq!(rebuilt, col);
        assert_eq!(rebuilt.to_vec(), src);
    }

    #[test]
    fn test_from_parts_rejects_mismatches() {
        let col = PackedColumn::encode(&[1u32, 2, 3, 1000]).unwrap();
        let meta = col.meta();

        let err = PackedColumn::<i32>::from_parts(col.as_bytes().to_vec(), &meta).unwrap_err();
        assert!(matches!(err, ForpackError::UnsupportedType(_)));

        let err = PackedColumn::<u32>::from_parts(vec![0u8; 1], &meta).unwrap_err();
        assert!(matches!(err, ForpackError::BufferTooSmall { .. }));

        let wide = ColumnMeta { log2: 40, ..meta };
        let err = PackedColumn::<u32>::from_parts(col.as_bytes().to_vec(), &wide).unwrap_err();
        assert!(matches!(err, ForpackError::InvalidBitWidth { log2: 40, max: 32 }));
    }

    #[test]
    fn test_decoder_in_private_pool() {
        let pool = DecoderPool::new();
        let col = PackedColumn::encode(&[3u8, 9, 4]).unwrap();
        let dec = col.decoder_in(&pool);
        assert_eq!(dec.decode_value(1), 9);
        dec.close();
        assert_eq!(pool.idle(crate::types::ElementWidth::W8), 1);
    }
}
