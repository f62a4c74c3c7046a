use crate::error::{Result, RiskError};
use crate::models::applicant::{normalize_category, ApplicantRecord};
use crate::models::profile::FeatureProfile;

/// Reject caller input that is missing, non-finite, out of bounds or not in a
/// field's allow-list. Non-finite numbers are rejected on every key; other
/// checks only apply to keys the profile names.
pub fn validate_observed(record: &ApplicantRecord, profile: &FeatureProfile) -> Result<()> {
    for key in &profile.required {
        if !record.contains(key) {
            return Err(RiskError::missing(key.as_str()));
        }
    }

    for (key, value) in record.iter() {
        let Some(number) = value.as_f64() else {
            continue;
        };
        if !number.is_finite() {
            let bound = profile.bounds.get(key);
            return Err(RiskError::DomainViolation {
                field: key.to_string(),
                value: number,
                min: bound.map_or(f64::NEG_INFINITY, |b| b.min),
                max: bound.map_or(f64::INFINITY, |b| b.max),
            });
        }
    }

    for (key, bound) in &profile.bounds {
        let Some(value) = record.get(key) else {
            continue;
        };
        let number = value
            .as_f64()
            .ok_or_else(|| RiskError::not_numeric(key.as_str()))?;
        if !number.is_finite() || !bound.contains(number) {
            return Err(RiskError::DomainViolation {
                field: key.clone(),
                value: number,
                min: bound.min,
                max: bound.max,
            });
        }
    }

    for (key, allowed) in &profile.allowed_values {
        let Some(value) = record.get(key) else {
            continue;
        };
        let text = value.to_string();
        let canonical = normalize_category(&text);
        if !allowed.iter().any(|candidate| normalize_category(candidate) == canonical) {
            return Err(RiskError::UnknownCategory {
                field: key.clone(),
                value: text,
            });
        }
    }

    Ok(())
}
