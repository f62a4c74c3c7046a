//! Error taxonomy for feature expansion, scoring and artifact handling.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, Error)]
pub enum RiskError {
    /// A required observed field is absent from the applicant record.
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("field {field} must be {expected}")]
    InvalidFieldType { field: String, expected: &'static str },

    /// Input outside the configured bounds for its field.
    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    DomainViolation {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} does not accept value {value:?}")]
    UnknownCategory { field: String, value: String },

    #[error("unknown feature profile: {0}")]
    UnknownProfile(String),

    #[error("invalid risk policy: {0}")]
    InvalidPolicy(String),

    /// Model bundle could not be loaded or is internally inconsistent.
    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("prediction failed: {0}")]
    Predict(String),

    #[error("dataset generation failed: {0}")]
    Dataset(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RiskError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn not_numeric(field: impl Into<String>) -> Self {
        Self::InvalidFieldType {
            field: field.into(),
            expected: "numeric",
        }
    }
}
