use thiserror::Error;

use crate::types::UserId;

/// Failure taxonomy for the core. Everything the engines can recover locally
/// (no matching rating factor, empty cohort, zero-valued target) never becomes
/// an error; the variants here are the conditions a caller must act on.
#[derive(Debug, Error)]
pub enum Error {
    /// The user has never configured a nutritional profile. Callers redirect
    /// to profile setup rather than analysing against a zero-valued default.
    #[error("no nutritional profile configured for user {}", .user.0)]
    MissingProfile { user: UserId },

    /// Input rejected at the validation boundary, before reaching any engine.
    #[error("invalid {field}: {detail}")]
    Invalid { field: &'static str, detail: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
