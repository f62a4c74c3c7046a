use std::path::Path;

use crate::error::{Result, RiskError};
use crate::models::applicant::{normalize_category, ApplicantRecord};
use crate::models::artifact::ArtifactFile;

const BASELINE_BUNDLE: &str = include_str!("../../assets/loan_default_model.json");

/// Preprocessing plus classifier, as seen from the prediction flow.
pub trait ArtifactProvider: Send + Sync {
    /// Column names the transform reads, in order.
    fn feature_names(&self) -> &[String];

    fn transform(&self, record: &ApplicantRecord) -> Result<Vec<f64>>;

    /// `[p_class0, p_class1]`; class 1 is default.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]>;

    fn predict(&self, features: &[f64]) -> Result<u8>;
}

/// Standard scaler + one-hot encoder feeding a logistic regression.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    artifact: ArtifactFile,
    feature_names: Vec<String>,
}

impl ModelBundle {
    pub fn from_artifact(artifact: ArtifactFile) -> Result<Self> {
        let feature_names = artifact
            .preprocessor
            .numeric
            .iter()
            .map(|c| c.name.clone())
            .chain(artifact.preprocessor.categorical.iter().map(|c| c.name.clone()))
            .collect();
        let bundle = Self {
            artifact,
            feature_names,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: ArtifactFile = serde_json::from_str(raw)
            .map_err(|e| RiskError::Artifact(format!("malformed model bundle: {e}")))?;
        Self::from_artifact(artifact)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RiskError::Artifact(format!("could not read model bundle {}: {e}", path.display()))
        })?;
        let bundle = Self::from_json(&raw)?;
        log::info!(
            "loaded model bundle {} v{} from {}",
            bundle.artifact.name,
            bundle.artifact.version,
            path.display()
        );
        Ok(bundle)
    }

    /// The bundle shipped with the binary.
    pub fn baseline() -> Result<Self> {
        Self::from_json(BASELINE_BUNDLE)
    }

    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    pub fn version(&self) -> &str {
        &self.artifact.version
    }

    /// Width of the encoded feature vector.
    pub fn encoded_width(&self) -> usize {
        self.artifact.preprocessor.numeric.len()
            + self
                .artifact
                .preprocessor
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    pub fn validate(&self) -> Result<()> {
        let width = self.encoded_width();
        let coefficients = self.artifact.model.coefficients.len();
        if width != coefficients {
            return Err(RiskError::Artifact(format!(
                "preprocessor emits {width} columns but model has {coefficients} coefficients"
            )));
        }

        let threshold = self.artifact.model.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RiskError::Artifact(format!(
                "decision threshold {threshold} outside [0, 1]"
            )));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(duplicate) = self.feature_names.iter().find(|name| !seen.insert(*name)) {
            return Err(RiskError::Artifact(format!("column {duplicate} listed twice")));
        }

        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ArtifactProvider for ModelBundle {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, record: &ApplicantRecord) -> Result<Vec<f64>> {
        let mut encoded = Vec::with_capacity(self.encoded_width());

        for column in &self.artifact.preprocessor.numeric {
            let value = record
                .get(&column.name)
                .ok_or_else(|| RiskError::Transform(format!("column {} not in record", column.name)))?
                .as_f64()
                .ok_or_else(|| RiskError::Transform(format!("column {} is not numeric", column.name)))?;
            let scale = if column.scale > 0.0 { column.scale } else { 1.0 };
            encoded.push((value - column.mean) / scale);
        }

        for column in &self.artifact.preprocessor.categorical {
            let value = record
                .get(&column.name)
                .ok_or_else(|| RiskError::Transform(format!("column {} not in record", column.name)))?
                .to_string();
            let value = normalize_category(&value);
            // Unseen categories encode as all zeros.
            encoded.extend(
                column
                    .categories
                    .iter()
                    .map(|category| if normalize_category(category) == value { 1.0 } else { 0.0 }),
            );
        }

        Ok(encoded)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        let model = &self.artifact.model;
        if features.len() != model.coefficients.len() {
            return Err(RiskError::Predict(format!(
                "expected {} features, got {}",
                model.coefficients.len(),
                features.len()
            )));
        }

        let z = model
            .coefficients
            .iter()
            .zip(features)
            .fold(model.intercept, |acc, (w, x)| acc + w * x);
        let p1 = sigmoid(z);
        Ok([1.0 - p1, p1])
    }

    fn predict(&self, features: &[f64]) -> Result<u8> {
        let [_, p1] = self.predict_proba(features)?;
        Ok(u8::from(p1 >= self.artifact.model.threshold))
    }
}
