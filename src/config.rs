// In: src/config.rs

//! The single source of truth for all forpack runtime configuration.
//!
//! The codec kernels themselves are configuration-free: bit widths, block sizes and
//! the chunk length are part of the wire format. What *is* configurable is the
//! decoder pooling behaviour, which a host engine usually wants to tune once at
//! startup (e.g. from its own JSON settings) and then share read-only.

use serde::{Deserialize, Serialize};

use crate::error::ForpackError;

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// Controls whether binding a decoder validates the packed buffer length.
///
/// The hot-path contract is that `buf` holds at least `ceil(n * b / 64)` code words.
/// Validation turns a violation into a `ForpackError::BufferTooSmall` at bind time
/// instead of a slice-index panic somewhere inside a later decode call.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindCheck {
    /// Never validate. Overruns surface as index panics during decoding.
    Never,

    /// **Default:** Validate only in builds with `debug_assertions` enabled.
    #[default]
    Debug,

    /// Always validate, including release builds.
    Always,
}

impl BindCheck {
    /// Returns `true` if a bind under this mode must check the buffer length.
    pub fn is_enabled(&self) -> bool {
        match self {
            BindCheck::Never => false,
            BindCheck::Debug => cfg!(debug_assertions),
            BindCheck::Always => true,
        }
    }
}

//==================================================================================
// II. The Unified ForpackConfig
//==================================================================================

/// The unified configuration for decoder pooling.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ForpackConfig {
    /// Maximum number of idle decoder states retained per element width.
    /// Released states beyond this bound are dropped.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Buffer length validation performed by `DecoderPool::bind`.
    #[serde(default)]
    pub bind_check: BindCheck,
}

impl Default for ForpackConfig {
    fn default() -> Self {
        Self {
            pool_capacity: default_pool_capacity(),
            bind_check: BindCheck::default(),
        }
    }
}

impl ForpackConfig {
    /// Parses a configuration from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ForpackError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to provide a default for `pool_capacity`.
fn default_pool_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let cfg = ForpackConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ForpackConfig::default());
        assert_eq!(cfg.pool_capacity, 64);
        assert_eq!(cfg.bind_check, BindCheck::Debug);
    }

    #[test]
    fn test_snake_case_fields() {
        let cfg =
            ForpackConfig::from_json(r#"{"pool_capacity": 2, "bind_check": "always"}"#).unwrap();
        assert_eq!(cfg.pool_capacity, 2);
        assert!(cfg.bind_check.is_enabled());
        assert!(!BindCheck::Never.is_enabled());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = ForpackConfig::from_json(r#"{"bind_check": "sometimes"}"#);
        assert!(matches!(result, Err(ForpackError::SerdeJson(_))));
    }
}
