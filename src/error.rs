//! Error taxonomy for the environment adapter.
//!
//! Configuration errors are fatal at construction; contract errors are fatal
//! to the offending call and leave the adapter state unchanged; I/O errors are
//! surfaced at the point of occurrence, never swallowed.

use thiserror::Error;

/// Errors produced by environment construction and the `reset`/`step` surface.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Malformed or inconsistent road-network description (missing traffic
    /// light data, dangling road endpoints, zero-lane topology).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller violated the environment contract (action arity mismatch,
    /// out-of-range phase under the strict phase policy).
    #[error("contract violation: {0}")]
    Contract(String),

    /// Replay/chart directory or file not writable.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Road-network description failed to parse.
    #[error("roadnet parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EnvError>;
