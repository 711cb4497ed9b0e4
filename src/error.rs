// In: src/error.rs

//! This module defines the single, unified error type for the entire forpack library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Only the validating, byte-level entry points return it. The word-level kernels and
//! the bound `Decoder` treat a violated precondition as a panic, never as an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForpackError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Unsupported element type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Bit width {log2} is out of range for this element width (max {max})")]
    InvalidBitWidth { log2: usize, max: usize },

    #[error("Packed buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("Bitset too small: need {needed} bits, got {actual}")]
    BitsetTooSmall { needed: usize, actual: usize },

    #[error("Value out of range for this column: {0}")]
    ValueOutOfRange(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading a config or
    /// a column descriptor.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
