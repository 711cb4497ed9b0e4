//! This file is the root of the `forpack` Rust crate: a fixed bit-width, min-FOR
//! integer bit-packing codec.
//!
//! A column of integers is stored as `value - min` codes of `b` bits each, where `b`
//! is the smallest width that covers `max - min`. The codes are laid out
//! back-to-back in little-endian 64-bit words. On top of that layout the crate
//! provides:
//!
//! 1.  `kernels`: the per-bit-width pack/unpack kernel family, the generic
//!     bitstream codec, whole-column encode/decode, fused predicate kernels and a
//!     byte-oriented positional accessor.
//! 2.  `decoder`: a pooled decoder bound to one packed column, with bulk,
//!     random-access and 128-element chunk access.
//! 3.  `column`: an owned packed column that filters in value space.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[doc(hidden)]
pub use log as __log;

#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bitset;
pub mod column;
pub mod config;
pub mod decoder;
pub mod error;
pub mod kernels;
pub mod traits;
pub mod types;

mod utils;

//==================================================================================
// 2. Public API
//==================================================================================
pub use bitset::Bitset;
pub use column::{ColumnMeta, PackedColumn};
pub use config::{BindCheck, ForpackConfig};
pub use decoder::{Decoder, DecoderPool, CHUNK_LEN};
pub use error::ForpackError;
pub use kernels::cmp::FilterMode;
pub use traits::{Code, PackedInt};
pub use types::{ElementKind, ElementWidth};
