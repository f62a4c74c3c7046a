use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub label: String,
    /// Ordinal position, 0 = lowest risk.
    pub level: usize,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub min_probability: f64,
    pub label: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOutcome {
    pub label: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Threshold table mapping a default probability to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskPolicy {
    /// Category chosen by the model's class decision.
    Binary {
        high: BinaryOutcome,
        low: BinaryOutcome,
        /// Stands in for the decision when the model does not emit one.
        #[serde(default = "default_binary_threshold")]
        threshold: f64,
    },
    /// Ordered by descending `min_probability`; the last band starts at 0.
    Banded { bands: Vec<RiskBand> },
}

fn default_binary_threshold() -> f64 {
    0.5
}

fn band(min_probability: f64, label: &str) -> RiskBand {
    RiskBand {
        min_probability,
        label: label.to_string(),
        message: None,
    }
}

impl RiskPolicy {
    pub fn binary() -> Self {
        RiskPolicy::Binary {
            high: BinaryOutcome {
                label: "High Risk".to_string(),
                message: Some("Likely to default".to_string()),
            },
            low: BinaryOutcome {
                label: "Low Risk".to_string(),
                message: Some("Unlikely to default".to_string()),
            },
            threshold: default_binary_threshold(),
        }
    }

    pub fn three_band() -> Self {
        RiskPolicy::Banded {
            bands: vec![
                band(0.40, "High Risk"),
                band(0.20, "Medium Risk"),
                band(0.0, "Low Risk"),
            ],
        }
    }

    pub fn five_band() -> Self {
        RiskPolicy::Banded {
            bands: vec![
                band(0.70, "Very High Risk"),
                band(0.50, "High Risk"),
                band(0.30, "Medium Risk"),
                band(0.15, "Low Risk"),
                band(0.0, "Very Low Risk"),
            ],
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "binary" => Some(Self::binary()),
            "three_band" => Some(Self::three_band()),
            "five_band" => Some(Self::five_band()),
            _ => None,
        }
    }

    /// Number of distinct categories this policy can produce.
    pub fn levels(&self) -> usize {
        match self {
            RiskPolicy::Binary { .. } => 2,
            RiskPolicy::Banded { bands } => bands.len(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RiskPolicy::Binary { threshold, .. } => {
                if !(0.0..=1.0).contains(threshold) {
                    return Err(RiskError::InvalidPolicy(format!(
                        "binary threshold {threshold} outside [0, 1]"
                    )));
                }
                Ok(())
            }
            RiskPolicy::Banded { bands } => {
                let Some(last) = bands.last() else {
                    return Err(RiskError::InvalidPolicy("no bands defined".to_string()));
                };

                for pair in bands.windows(2) {
                    if pair[0].min_probability <= pair[1].min_probability {
                        return Err(RiskError::InvalidPolicy(format!(
                            "band {:?} must start above band {:?}",
                            pair[0].label, pair[1].label
                        )));
                    }
                }

                if let Some(out_of_range) = bands
                    .iter()
                    .find(|b| !(0.0..=1.0).contains(&b.min_probability))
                {
                    return Err(RiskError::InvalidPolicy(format!(
                        "band {:?} threshold {} outside [0, 1]",
                        out_of_range.label, out_of_range.min_probability
                    )));
                }

                if last.min_probability != 0.0 {
                    return Err(RiskError::InvalidPolicy(format!(
                        "lowest band {:?} must start at 0, starts at {}",
                        last.label, last.min_probability
                    )));
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_tables_are_valid() {
        for policy in [
            RiskPolicy::binary(),
            RiskPolicy::three_band(),
            RiskPolicy::five_band(),
        ] {
            policy.validate().unwrap();
        }
    }

    #[test]
    fn rejects_gap_at_bottom_and_unsorted_bands() {
        let gap = RiskPolicy::Banded {
            bands: vec![band(0.5, "High"), band(0.1, "Low")],
        };
        assert!(matches!(gap.validate(), Err(RiskError::InvalidPolicy(_))));

        let unsorted = RiskPolicy::Banded {
            bands: vec![band(0.2, "Medium"), band(0.4, "High"), band(0.0, "Low")],
        };
        assert!(unsorted.validate().is_err());

        let empty = RiskPolicy::Banded { bands: vec![] };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn policy_json_uses_kind_tag() {
        let json = serde_json::to_value(RiskPolicy::three_band()).unwrap();
        assert_eq!(json["kind"], "banded");
        assert_eq!(json["bands"][0]["label"], "High Risk");

        let parsed: RiskPolicy = serde_json::from_value(serde_json::json!({
            "kind": "binary",
            "high": { "label": "Decline" },
            "low": { "label": "Approve" }
        }))
        .unwrap();
        match parsed {
            RiskPolicy::Binary { threshold, .. } => assert_eq!(threshold, 0.5),
            other => panic!("unexpected policy {other:?}"),
        }
    }
}
