//! Fused compare-on-packed kernels.
//!
//! Each kernel scans a packed column in place, without materializing the decoded
//! values, and ORs a match bit per element into a `Bitset`. Matching happens in
//! code space: the operand is compared against the raw `b`-bit code, i.e. the
//! value minus the column min. Translating a logical value into code space (and
//! clamping it) is the caller's job; see `PackedColumn::filter`.
//!
//! The per-width tables (`EQUAL`, `LESS`, ...) are indexed by bit width `0..=64`.
//! Full groups of 64 elements go through a `seq-macro` unrolled group kernel that
//! builds the 64-bit match mask directly; the last partial group is matched one
//! element at a time. Bits are only ever set, never cleared.
//!
//! An 8-byte aligned buffer is scanned in place on little-endian targets. Any other
//! buffer is copied into a temporary word vector on every kernel call, so callers
//! filtering the same misaligned column repeatedly should realign it once.

use seq_macro::seq;
use serde::{Deserialize, Serialize};

use super::block::GROUP_LEN;
use super::generic::read_code;
use super::width::low_mask;
use crate::bitset::Bitset;
use crate::error::ForpackError;
use crate::utils::{bytes_needed, words_from_bytes};

/// A single-operand predicate kernel: `(buf, val, n, bits)`.
pub type CmpFunc = fn(buf: &[u8], val: u64, n: usize, bits: &mut Bitset);

/// A two-operand predicate kernel: `(buf, from, to, n, bits)`.
pub type CmpFunc2 = fn(buf: &[u8], from: u64, to: u64, n: usize, bits: &mut Bitset);

//==================================================================================
// 1. Predicates
//==================================================================================

pub trait Predicate {
    fn test(code: u64, a: u64, b: u64) -> bool;
}

pub struct Equal;
pub struct NotEqual;
pub struct Less;
pub struct LessEqual;
pub struct Greater;
pub struct GreaterEqual;
/// Inclusive `[a, b]`.
pub struct Between;

impl Predicate for Equal {
    #[inline(always)]
    fn test(code: u64, a: u64, _: u64) -> bool {
        code == a
    }
}

impl Predicate for NotEqual {
    #[inline(always)]
    fn test(code: u64, a: u64, _: u64) -> bool {
        code != a
    }
}

impl Predicate for Less {
    #[inline(always)]
    fn test(code: u64, a: u64, _: u64) -> bool {
        code < a
    }
}

impl Predicate for LessEqual {
    #[inline(always)]
    fn test(code: u64, a: u64, _: u64) -> bool {
        code <= a
    }
}

impl Predicate for Greater {
    #[inline(always)]
    fn test(code: u64, a: u64, _: u64) -> bool {
        code > a
    }
}

impl Predicate for GreaterEqual {
    #[inline(always)]
    fn test(code: u64, a: u64, _: u64) -> bool {
        code >= a
    }
}

impl Predicate for Between {
    #[inline(always)]
    fn test(code: u64, a: u64, b: u64) -> bool {
        a <= code && code <= b
    }
}

//==================================================================================
// 2. Kernels
//==================================================================================

/// Match mask of one 64-element group stored in `src[..B]`.
fn match_group<P: Predicate, const B: usize>(src: &[u64], a: u64, b: u64) -> u64 {
    if B == 0 {
        return if P::test(0, a, b) { u64::MAX } else { 0 };
    }
    let src = &src[..B];
    let mask = low_mask(B);
    let mut out = 0u64;
    seq!(I in 0..64 {{
        let bit = I * B;
        let (w, s) = (bit >> 6, bit & 63);
        let mut v = src[w] >> s;
        if s + B > 64 {
            v |= src[w + 1] << (64 - s);
        }
        out |= (P::test(v & mask, a, b) as u64) << I;
    }});
    out
}

fn scan<P: Predicate, const B: usize>(buf: &[u8], a: u64, b: u64, n: usize, bits: &mut Bitset) {
    let words = words_from_bytes(buf);
    let words = words.as_ref();

    let groups = n / GROUP_LEN;
    for g in 0..groups {
        let m = match_group::<P, B>(&words[g * B..], a, b);
        if m != 0 {
            bits.or_word(g, m);
        }
    }
    for i in groups * GROUP_LEN..n {
        if P::test(read_code(words, i, B), a, b) {
            bits.set(i);
        }
    }
}

fn scan1<P: Predicate, const B: usize>(buf: &[u8], val: u64, n: usize, bits: &mut Bitset) {
    scan::<P, B>(buf, val, 0, n, bits)
}

macro_rules! cmp_table {
    ($(#[$attr:meta])* $name:ident, $pred:ident) => {
        $(#[$attr])*
        pub static $name: [CmpFunc; 65] = seq!(B in 0..=64 { [ #( scan1::<$pred, B>, )* ] });
    };
}

cmp_table!(
    /// Sets bit `i` iff `code(i) == val`. `val` must already be masked to `b` bits.
    EQUAL,
    Equal
);
cmp_table!(
    /// Sets bit `i` iff `code(i) != val`.
    NOT_EQUAL,
    NotEqual
);
cmp_table!(LESS, Less);
cmp_table!(LESS_EQUAL, LessEqual);
cmp_table!(GREATER, Greater);
cmp_table!(GREATER_EQUAL, GreaterEqual);

/// Sets bit `i` iff `from <= code(i) <= to`.
pub static BETWEEN: [CmpFunc2; 65] = seq!(B in 0..=64 { [ #( scan::<Between, B>, )* ] });

//==================================================================================
// 3. Dispatch
//==================================================================================

/// The comparison a filter applies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// Inclusive range `[val, val2]`.
    Range,
}

/// Runs the `mode` kernel for bit width `log2` over the first `n` codes of `buf`.
///
/// `val2` is only read by `FilterMode::Range`.
pub fn compare(
    mode: FilterMode,
    buf: &[u8],
    log2: usize,
    val: u64,
    val2: u64,
    n: usize,
    bits: &mut Bitset,
) -> Result<(), ForpackError> {
    if log2 > 64 {
        return Err(ForpackError::InvalidBitWidth { log2, max: 64 });
    }
    if bits.len() < n {
        return Err(ForpackError::BitsetTooSmall {
            needed: n,
            actual: bits.len(),
        });
    }
    let needed = bytes_needed(n, log2);
    if buf.len() < needed {
        return Err(ForpackError::BufferTooSmall {
            needed,
            actual: buf.len(),
        });
    }

    let table = match mode {
        FilterMode::Equal => &EQUAL,
        FilterMode::NotEqual => &NOT_EQUAL,
        FilterMode::Less => &LESS,
        FilterMode::LessEqual => &LESS_EQUAL,
        FilterMode::Greater => &GREATER,
        FilterMode::GreaterEqual => &GREATER_EQUAL,
        FilterMode::Range => {
            BETWEEN[log2](buf, val, val2, n, bits);
            return Ok(());
        }
    };
    table[log2](buf, val, n, bits);
    Ok(())
}
