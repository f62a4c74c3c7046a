use crate::analysis::features::expand_with;
use crate::analysis::pipeline::{ArtifactProvider, ModelBundle};
use crate::analysis::risk::classify_with_decision;
use crate::analysis::validation::validate_observed;
use crate::error::{Result as RiskResult, RiskError};
use crate::models::applicant::ApplicantRecord;
use crate::models::assessment::RiskAssessment;
use crate::models::policy::RiskPolicy;
use crate::models::profile::FeatureProfile;
use crate::commands::settings::{load_effective_prediction_settings, EffectivePredictionSettings};

/// Everything a prediction needs, built once and passed by reference.
pub struct PredictionContext {
    pub profile: FeatureProfile,
    artifacts: Box<dyn ArtifactProvider>,
}

impl PredictionContext {
    pub fn new(profile: FeatureProfile, artifacts: Box<dyn ArtifactProvider>) -> RiskResult<Self> {
        profile.policy.validate()?;
        Ok(Self { profile, artifacts })
    }

    /// Load the bundle named in the workspace settings, or the built-in one.
    pub fn initialize(settings: &EffectivePredictionSettings) -> RiskResult<Self> {
        let bundle = match &settings.artifact_path {
            Some(path) => ModelBundle::load(path)?,
            None => {
                log::debug!("no artifactPath configured, using the built-in model bundle");
                ModelBundle::baseline()?
            }
        };
        Self::new(settings.profile.clone(), Box::new(bundle))
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.profile.policy
    }

    /// Validate, expand and score one applicant. Returns the expanded record
    /// alongside the assessment.
    pub fn assess(&self, observed: &ApplicantRecord) -> RiskResult<(RiskAssessment, ApplicantRecord)> {
        validate_observed(observed, &self.profile)?;
        let expanded = expand_with(observed, &self.profile)?;

        let features = self.artifacts.transform(&expanded)?;
        let [_, probability] = self.artifacts.predict_proba(&features)?;
        if !probability.is_finite() {
            return Err(RiskError::Predict(format!(
                "model returned a non-finite probability ({probability})"
            )));
        }
        let decision = match self.profile.policy {
            RiskPolicy::Binary { .. } => Some(self.artifacts.predict(&features)? == 1),
            RiskPolicy::Banded { .. } => None,
        };

        let category = classify_with_decision(probability, decision, &self.profile.policy)?;
        log::info!(
            "assessed applicant under {}: p={probability:.4} -> {}",
            self.profile.name,
            category.label
        );

        let assessment = RiskAssessment {
            id: uuid::Uuid::new_v4().to_string(),
            profile: self.profile.name.clone(),
            probability,
            decision,
            category,
            created_at: chrono::Utc::now().timestamp(),
        };

        Ok((assessment, expanded))
    }
}

pub async fn predict_default(workspace_path: String, observed: ApplicantRecord) -> Result<RiskAssessment, String> {
    predict_default_internal(&workspace_path, &observed)
}

pub fn predict_default_internal(workspace_path: &str, observed: &ApplicantRecord) -> Result<RiskAssessment, String> {
    let settings = load_effective_prediction_settings(workspace_path)?;
    let context = PredictionContext::initialize(&settings)
        .map_err(|e| format!("Model not loaded: {e}"))?;

    let (assessment, expanded) = context
        .assess(observed)
        .map_err(|e| format!("Prediction failed: {e}"))?;

    if settings.history_enabled {
        record_history(workspace_path, &assessment, &expanded, settings.history_retention)?;
    }

    Ok(assessment)
}

pub async fn expand_applicant(workspace_path: String, observed: ApplicantRecord) -> Result<ApplicantRecord, String> {
    let settings = load_effective_prediction_settings(&workspace_path)?;
    expand_with(&observed, &settings.profile).map_err(|e| e.to_string())
}

fn record_history(
    workspace_path: &str,
    assessment: &RiskAssessment,
    expanded: &ApplicantRecord,
    retention: u32,
) -> Result<(), String> {
    let conn = crate::commands::db::get_db_connection(workspace_path)
        .map_err(|e| format!("DB error: {e}"))?;
    crate::commands::db::insert_assessment(&conn, assessment, expanded)
        .map_err(|e| format!("DB insert error: {e}"))?;

    let pruned = crate::commands::db::prune_assessments(&conn, retention)
        .map_err(|e| format!("DB prune error: {e}"))?;
    if pruned > 0 {
        log::debug!("pruned {pruned} old assessments");
    }
    Ok(())
}
