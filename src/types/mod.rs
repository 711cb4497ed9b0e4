//! This module defines the core, strongly-typed element descriptors used
//! throughout the codec.
//!
//! `ElementKind` names the logical type of a packed column and `ElementWidth`
//! names the kernel family (8/16/32/64-bit lanes) that serves it.

pub mod element_kind;

// Re-export the main type(s) for easier access.
pub use element_kind::{ElementKind, ElementWidth};
