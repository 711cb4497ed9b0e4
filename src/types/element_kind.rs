//! This module defines the canonical, type-safe representation of element kinds
//! and the element widths that select a kernel family.

use crate::error::ForpackError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The logical type of the values stored in a packed column.
///
/// Every kind maps onto exactly one `ElementWidth`. Integer kinds map one-to-one
/// onto a `PackedInt` implementation; float kinds are only routed by width
/// (their bit patterns are packed as the same-width unsigned integer).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

/// The lane width of a kernel family. The pooled decoders are keyed by this.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementWidth {
    W8,
    W16,
    W32,
    W64,
}

impl ElementWidth {
    /// All widths, in ascending order. Index `i` equals `self.index()`.
    pub const ALL: [ElementWidth; 4] = [Self::W8, Self::W16, Self::W32, Self::W64];

    /// Number of bits per lane. This is also the largest legal bit width.
    pub fn bits(&self) -> usize {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Dense index (0..4), used to address per-width tables.
    pub fn index(&self) -> usize {
        match self {
            Self::W8 => 0,
            Self::W16 => 1,
            Self::W32 => 2,
            Self::W64 => 3,
        }
    }

    /// Resolves a lane width from a bit count.
    pub fn from_bits(bits: usize) -> Result<Self, ForpackError> {
        match bits {
            8 => Ok(Self::W8),
            16 => Ok(Self::W16),
            32 => Ok(Self::W32),
            64 => Ok(Self::W64),
            b => Err(ForpackError::UnsupportedType(format!(
                "No kernel family for {}-bit elements",
                b
            ))),
        }
    }
}

impl ElementKind {
    /// The kernel family serving this kind.
    pub fn width(&self) -> ElementWidth {
        match self {
            Self::Int8 | Self::UInt8 => ElementWidth::W8,
            Self::Int16 | Self::UInt16 => ElementWidth::W16,
            Self::Int32 | Self::UInt32 | Self::Float32 => ElementWidth::W32,
            Self::Int64 | Self::UInt64 | Self::Float64 => ElementWidth::W64,
        }
    }

    /// The unsigned integer kind whose kernels pack this kind's bit patterns.
    pub fn storage_kind(&self) -> ElementKind {
        match self.width() {
            ElementWidth::W8 => Self::UInt8,
            ElementWidth::W16 => Self::UInt16,
            ElementWidth::W32 => Self::UInt32,
            ElementWidth::W64 => Self::UInt64,
        }
    }
}

/// Provides the canonical string representation for an `ElementKind`.
impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_to_width_mapping() {
        assert_eq!(ElementKind::Int8.width(), ElementWidth::W8);
        assert_eq!(ElementKind::UInt16.width(), ElementWidth::W16);
        assert_eq!(ElementKind::Float32.width(), ElementWidth::W32);
        assert_eq!(ElementKind::Float64.width(), ElementWidth::W64);
        assert_eq!(ElementKind::Float64.storage_kind(), ElementKind::UInt64);
        assert_eq!(ElementKind::Int32.storage_kind(), ElementKind::UInt32);
    }

    #[test]
    fn test_width_roundtrip_through_bits() {
        for w in ElementWidth::ALL {
            assert_eq!(ElementWidth::from_bits(w.bits()).unwrap(), w);
            assert_eq!(ElementWidth::ALL[w.index()], w);
        }
        assert!(ElementWidth::from_bits(24).is_err());
    }

    #[test]
    fn test_kind_serde_is_stable() {
        let json = serde_json::to_string(&ElementKind::UInt32).unwrap();
        assert_eq!(json, "\"UInt32\"");
        assert_eq!(ElementKind::Int64.to_string(), "Int64");
    }
}
