//! This module defines the element traits shared by every kernel.
//!
//! `Code` is implemented by the four unsigned lane types and is what the kernel
//! family is generic over. `PackedInt` is implemented by all eight integer types and
//! maps each onto the `Code` type of the same width. Signed columns therefore run
//! through the unsigned kernels: `value - min` computed with wrapping arithmetic on
//! the unsigned reinterpretation equals the signed distance modulo 2^W.

use num_traits::{PrimInt, Unsigned, WrappingAdd, WrappingSub};
use std::fmt::Debug;

use crate::types::{ElementKind, ElementWidth};

/// An unsigned lane type that the per-width kernels operate on.
pub trait Code:
    bytemuck::Pod + PrimInt + Unsigned + WrappingAdd + WrappingSub + Default + Debug + Send + Sync + 'static
{
    /// Bits per lane (8, 16, 32 or 64).
    const BITS: usize;
    /// The kernel family this lane type belongs to.
    const WIDTH: ElementWidth;

    /// Zero-extends the lane to a code word.
    fn widen(self) -> u64;
    /// Truncates a code word to the lane.
    fn narrow(word: u64) -> Self;
}

/// An integer element type that can be stored in a packed column.
pub trait PackedInt: bytemuck::Pod + PrimInt + Default + Debug + Send + Sync + 'static {
    /// The unsigned lane type of the same width.
    type Unsigned: Code;
    /// The logical kind recorded in column metadata.
    const KIND: ElementKind;

    /// Reinterprets the bit pattern as the unsigned lane type.
    fn to_unsigned(self) -> Self::Unsigned;
    /// Reinterprets an unsigned lane as this type.
    fn from_unsigned(u: Self::Unsigned) -> Self;

    /// Zero-copy view of a slice as its unsigned lanes.
    fn as_unsigned_slice(src: &[Self]) -> &[Self::Unsigned] {
        bytemuck::cast_slice(src)
    }

    /// Zero-copy mutable view of a slice as its unsigned lanes.
    fn as_unsigned_slice_mut(dst: &mut [Self]) -> &mut [Self::Unsigned] {
        bytemuck::cast_slice_mut(dst)
    }
}

macro_rules! impl_code {
    ($U:ty, $W:ident) => {
        impl Code for $U {
            const BITS: usize = <$U>::BITS as usize;
            const WIDTH: ElementWidth = ElementWidth::$W;

            #[inline(always)]
            fn widen(self) -> u64 {
                self as u64
            }

            #[inline(always)]
            fn narrow(word: u64) -> Self {
                word as $U
            }
        }
    };
}

// Implement `PackedInt` for a signed/unsigned pair sharing one lane type.
macro_rules! impl_packed_pair {
    ($S:ty, $U:ty, $SK:ident, $UK:ident) => {
        impl PackedInt for $U {
            type Unsigned = $U;
            const KIND: ElementKind = ElementKind::$UK;

            #[inline(always)]
            fn to_unsigned(self) -> $U {
                self
            }

            #[inline(always)]
            fn from_unsigned(u: $U) -> Self {
                u
            }
        }

        impl PackedInt for $S {
            type Unsigned = $U;
            const KIND: ElementKind = ElementKind::$SK;

            #[inline(always)]
            fn to_unsigned(self) -> $U {
                self as $U
            }

            #[inline(always)]
            fn from_unsigned(u: $U) -> Self {
                u as $S
            }
        }
    };
}

impl_code!(u8, W8);
impl_code!(u16, W16);
impl_code!(u32, W32);
impl_code!(u64, W64);

impl_packed_pair!(i8, u8, Int8, UInt8);
impl_packed_pair!(i16, u16, Int16, UInt16);
impl_packed_pair!(i32, u32, Int32, UInt32);
impl_packed_pair!(i64, u64, Int64, UInt64);
