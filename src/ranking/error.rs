//! Error taxonomy for the ranking core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankError>;

#[derive(Error, Debug)]
pub enum RankError {
    /// The embedding backend could not be loaded or failed during inference.
    /// Fatal for the current request: there is no ranking without vectors.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// A catalog record is missing a required field (or carries an invalid one).
    /// The ranking pass skips the record and continues.
    #[error("malformed opportunity at index {index}: {reason}")]
    MalformedOpportunity { index: usize, reason: String },

    /// Profile has neither interests nor goals. Scoring still runs best-effort.
    #[error("profile has empty interests and goals")]
    EmptyInput,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl RankError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedOpportunity {
            index,
            reason: reason.into(),
        }
    }
}
