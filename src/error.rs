//! Level loading errors
//!
//! Only malformed level data is reported through `Result`. Broken invariants inside a
//! running tick are logged and skipped, and exhausting the kind or object pools panics.

use thiserror::Error;

/// Errors raised while building entities from a level description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("object '{object}' is missing key '{key}'")]
    MissingKey { object: String, key: &'static str },
    #[error("object '{object}' key '{key}' = {value} must be between {min} and {max}")]
    OutOfRange {
        object: String,
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("object '{object}' has class '{class}' which is not defined")]
    UnknownClass { object: String, class: String },
    #[error("splitter '{object}' references part '{part}' which is not defined")]
    UnknownPart { object: String, part: String },
    #[error("object '{object}' point list has {len} values, expected an even count")]
    OddPointList { object: String, len: usize },
    #[error("polygon '{object}' needs at least 3 points, got {count}")]
    TooFewPoints { object: String, count: usize },
    #[error("polygon '{object}' points must form a convex polygon")]
    NonConvexPolygon { object: String },
    #[error("racket region is invalid: {reason}")]
    InvalidRegion { reason: String },
    #[error("failed to parse level: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read level: {0}")]
    Io(#[from] std::io::Error),
}
