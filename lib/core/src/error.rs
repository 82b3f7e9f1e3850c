use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these —
// never on the human-readable message string.

/// Stable error code constants.
///
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const OUT_OF_RANGE: &str = "OUT_OF_RANGE";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all modules.
///
/// Each variant maps to a stable error code (see [`error_code`]).
/// Validation, range, conflict and not-found conditions are expected
/// business outcomes: the service recovers locally without partial
/// writes and hands the caller a structured failure. Storage errors
/// propagate unchanged; the caller decides whether to retry the
/// whole request. No variant terminates the process.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key / resource already exists.
    #[error("{0}")]
    Conflict(String),

    /// Input data is invalid.
    #[error("{0}")]
    Validation(String),

    /// A stock mutation would leave the bounded register outside 0..=100.
    #[error(
        "delta {delta} would move batch '{batch_id}' from {current} to {result}, outside 0..=100"
    )]
    OutOfRange {
        batch_id: String,
        current: i64,
        delta: i64,
        result: i64,
    },

    /// Storage backend failure.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::OutOfRange { .. } => error_code::OUT_OF_RANGE,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }
}
