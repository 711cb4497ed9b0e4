//! Structured diagnostics for the codec's dispatch decisions.
//!
//! The bulk encoder/decoder and the decoder pool make a handful of choices per call
//! (kernel block path or generic fallback, chosen bit width, pool hit or miss).
//! The `log_metric!` macro records those as a single `key="value"` line through the
//! `log` facade under the `forpack::metric` target.
//!
//! The `#[cfg(debug_assertions)]` attribute compiles the macro body out of release
//! builds, so hot paths pay nothing for it in production.

/// Logs a structured key-value metric line at `trace` level, only in debug builds.
///
/// # Example
/// ```
/// use forpack::log_metric;
/// let log2 = 10;
/// log_metric!("event" = "encode", "path" = "block", "log2" = log2);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::trace!(target: "forpack::metric", "{{ {} }}", parts.join(", "));
        }
    };
}
