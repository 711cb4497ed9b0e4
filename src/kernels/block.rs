//! The per-bit-width kernel family.
//!
//! Each kernel packs or unpacks one group of 64 elements at a compile-time bit
//! width `B`, reading or writing exactly `B` code words. Element `i` occupies bits
//! `[i*B, (i+1)*B)` of the word stream, LSB-first within a word; a code that
//! straddles a word boundary keeps its low bits in the earlier word.
//!
//! The bodies are unrolled 64 times with `seq-macro`. Because `B` is a const
//! parameter, every word index, shift amount and straddle test is a constant in
//! each instantiation and the branches fold away: what remains is a straight
//! sequence of shifts, masks and ORs. The dispatchers below instantiate one kernel
//! per `(lane type, B)` for `B` in `0..=64`.

use seq_macro::seq;

use super::width::low_mask;
use crate::traits::Code;

/// Elements per kernel call.
pub const GROUP_LEN: usize = 64;

/// A pack kernel: 64 lanes in, `b` code words out.
pub type PackFn<T> = fn(src: &[T], dst: &mut [u64], minv: T);

/// An unpack kernel: `b` code words in, 64 lanes out.
pub type UnpackFn<T> = fn(src: &[u64], dst: &mut [T], minv: T);

//==================================================================================
// 1. Kernels
//==================================================================================

/// Packs `src[..64]` into `dst[..B]`, storing `(v - minv) & mask` per lane.
///
/// Every word of `dst[..B]` is overwritten; its previous content is irrelevant.
pub fn pack<T: Code, const B: usize>(src: &[T], dst: &mut [u64], minv: T) {
    if B == 0 {
        return;
    }
    let src = &src[..GROUP_LEN];
    let dst = &mut dst[..B];
    if B == T::BITS {
        pack_lane_aligned::<T, B>(src, dst, minv);
        return;
    }

    let minv = minv.widen();
    let mask = low_mask(B);
    seq!(I in 0..64 {{
        let v = src[I].widen().wrapping_sub(minv) & mask;
        let bit = I * B;
        let (w, s) = (bit >> 6, bit & 63);
        if s == 0 {
            dst[w] = v;
        } else {
            dst[w] |= v << s;
        }
        if s + B > 64 {
            dst[w + 1] = v >> (64 - s);
        }
    }});
}

/// Unpacks `src[..B]` into `dst[..64]`, adding `minv` back to each code.
pub fn unpack<T: Code, const B: usize>(src: &[u64], dst: &mut [T], minv: T) {
    let dst = &mut dst[..GROUP_LEN];
    if B == 0 {
        dst.fill(minv);
        return;
    }
    let src = &src[..B];
    if B == T::BITS {
        unpack_lane_aligned::<T, B>(src, dst, minv);
        return;
    }

    let minv = minv.widen();
    let mask = low_mask(B);
    seq!(I in 0..64 {{
        let bit = I * B;
        let (w, s) = (bit >> 6, bit & 63);
        let mut v = src[w] >> s;
        if s + B > 64 {
            v |= src[w + 1] << (64 - s);
        }
        dst[I] = T::narrow((v & mask).wrapping_add(minv));
    }});
}

// With B equal to the lane width no code straddles a word, so a group is a plain
// copy of `64 / B` lanes per word with the min-FOR offset applied.
fn pack_lane_aligned<T: Code, const B: usize>(src: &[T], dst: &mut [u64], minv: T) {
    let lanes = 64 / B;
    for (word, lane) in dst.iter_mut().zip(src.chunks_exact(lanes)) {
        let mut acc = 0u64;
        for (j, &v) in lane.iter().enumerate() {
            acc |= v.wrapping_sub(&minv).widen() << (j * B);
        }
        *word = acc;
    }
}

fn unpack_lane_aligned<T: Code, const B: usize>(src: &[u64], dst: &mut [T], minv: T) {
    let lanes = 64 / B;
    for (&word, lane) in src.iter().zip(dst.chunks_exact_mut(lanes)) {
        for (j, out) in lane.iter_mut().enumerate() {
            *out = T::narrow(word >> (j * B)).wrapping_add(&minv);
        }
    }
}

//==================================================================================
// 2. Dispatch
//==================================================================================

/// Returns the pack kernel for `log2`. Panics if `log2 > 64`.
pub fn pack_kernel<T: Code>(log2: usize) -> PackFn<T> {
    seq!(B in 0..=64 {
        match log2 {
            #( B => pack::<T, B>, )*
            _ => panic!("bit width {} out of range 0..=64", log2),
        }
    })
}

/// Returns the unpack kernel for `log2`. Panics if `log2 > 64`.
pub fn unpack_kernel<T: Code>(log2: usize) -> UnpackFn<T> {
    seq!(B in 0..=64 {
        match log2 {
            #( B => unpack::<T, B>, )*
            _ => panic!("bit width {} out of range 0..=64", log2),
        }
    })
}

/// Packs one 64-element group at a runtime bit width.
#[inline]
pub fn pack_group<T: Code>(src: &[T], dst: &mut [u64], minv: T, log2: usize) {
    pack_kernel::<T>(log2)(src, dst, minv)
}

/// Unpacks one 64-element group at a runtime bit width.
#[inline]
pub fn unpack_group<T: Code>(src: &[u64], dst: &mut [T], minv: T, log2: usize) {
    unpack_kernel::<T>(log2)(src, dst, minv)
}
