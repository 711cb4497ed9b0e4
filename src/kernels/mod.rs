//! This module contains the pure, stateless codec kernels.
//!
//! Everything here operates on plain slices: code words (`&[u64]`), lanes of one
//! of the four unsigned element widths, and byte buffers. Nothing allocates on the
//! hot path except where a byte buffer cannot be viewed as words in place.
//!
//! Layering, bottom-up:
//!
//!   - `width`      bit-width selection and masks
//!   - `generic`    the bit-width-agnostic bitstream codec (reference layout)
//!   - `block`      the per-bit-width 64-lane kernel family
//!   - `bulk`       whole-column encode/decode over 256-element blocks
//!   - `cmp`        fused predicate kernels writing a match bitset
//!   - `positional` MSB-first random access to single elements in a byte buffer

pub mod block;
pub mod bulk;
pub mod cmp;
pub mod generic;
pub mod positional;
pub mod width;

pub use block::{pack_group, unpack_group, GROUP_LEN};
pub use bulk::{bitpack, bitunpack, decode, decode_bytes, encode, encode_bytes, BLOCK_LEN};
pub use cmp::{compare, FilterMode};
pub use width::{log2_of, log2_range, low_mask};
