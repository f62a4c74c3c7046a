pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

pub use analysis::features::{credit_band, expand, expand_with};
pub use analysis::pipeline::{ArtifactProvider, ModelBundle};
pub use analysis::risk::{classify, classify_with_decision};
pub use commands::predict::PredictionContext;
pub use error::RiskError;
pub use models::applicant::{ApplicantRecord, FeatureValue};
pub use models::assessment::RiskAssessment;
pub use models::policy::{RiskCategory, RiskPolicy};
pub use models::profile::FeatureProfile;
