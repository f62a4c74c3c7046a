use serde::{Deserialize, Serialize};

use crate::models::policy::RiskCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: String,
    pub profile: String,
    pub probability: f64,
    pub decision: Option<bool>,
    pub category: RiskCategory,
    pub created_at: i64,
}

/// Persisted history entry for a served assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRow {
    pub id: String,
    pub created_at: i64,
    pub profile: String,
    pub probability: f64,
    pub decision: Option<bool>,
    pub category: String,
    pub record_json: String,
}
