//! Error types for the land-core crate.

use thiserror::Error;

/// Rejected parameter write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    UnknownParam(String),
    #[error("parameter {name} expects a {expected} value")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("parameter {name} value {value} outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}
