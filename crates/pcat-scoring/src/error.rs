use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    /// The configuration cannot support the requested computation.
    #[error("scoring configuration error: {0}")]
    Config(String),

    /// A product attribute required by the method is missing or invalid.
    #[error("invalid {field} for scoring: {reason}")]
    Validation { field: &'static str, reason: String },
}
