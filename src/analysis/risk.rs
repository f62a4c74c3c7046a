use crate::error::{Result, RiskError};
use crate::models::policy::{RiskCategory, RiskPolicy};

/// Map a default probability to a category under `policy`.
pub fn classify(probability: f64, policy: &RiskPolicy) -> Result<RiskCategory> {
    classify_with_decision(probability, None, policy)
}

/// Like [`classify`], for models that also emit a class label. Banded
/// policies ignore the decision.
///
/// Probabilities below 0 or NaN land in the lowest category, above 1 in the
/// highest. An empty band table is an [`RiskError::InvalidPolicy`].
pub fn classify_with_decision(probability: f64, decision: Option<bool>, policy: &RiskPolicy) -> Result<RiskCategory> {
    match policy {
        RiskPolicy::Binary { high, low, threshold } => {
            let is_high = decision.unwrap_or(probability >= *threshold);
            let (outcome, level) = if is_high { (high, 1) } else { (low, 0) };
            Ok(RiskCategory {
                label: outcome.label.clone(),
                level,
                message: outcome.message.clone(),
            })
        }
        RiskPolicy::Banded { bands } => {
            let lowest = bands
                .len()
                .checked_sub(1)
                .ok_or_else(|| RiskError::InvalidPolicy("band table is empty".to_string()))?;
            let index = bands
                .iter()
                .position(|band| probability >= band.min_probability)
                .unwrap_or(lowest);
            let band = &bands[index];

            Ok(RiskCategory {
                label: band.label.clone(),
                level: lowest - index,
                message: band.message.clone(),
            })
        }
    }
}
