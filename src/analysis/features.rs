use crate::error::{Result, RiskError};
use crate::models::applicant::*;
use crate::models::profile::{DerivationDefaults, DerivedFeature, FeatureProfile};

/// Expand the seven short-form fields into the full model feature set.
pub fn expand(observed: &ApplicantRecord) -> Result<ApplicantRecord> {
    expand_with(observed, &FeatureProfile::seven_input())
}

/// Check the profile's required fields, then compute each derived field in
/// order. Ranges are not checked here.
pub fn expand_with(observed: &ApplicantRecord, profile: &FeatureProfile) -> Result<ApplicantRecord> {
    if let Some(missing) = profile.required.iter().find(|key| !observed.contains(key)) {
        return Err(RiskError::missing(missing.as_str()));
    }

    let mut record = observed.clone();
    for feature in &profile.derived {
        let value = derive(*feature, &record, &profile.defaults)?;
        record.insert(feature.key(), value);
    }

    log::debug!(
        "expanded {} observed fields to {} for profile {}",
        observed.len(),
        record.len(),
        profile.name
    );

    Ok(record)
}

fn derive(feature: DerivedFeature, record: &ApplicantRecord, defaults: &DerivationDefaults) -> Result<FeatureValue> {
    let value: FeatureValue = match feature {
        DerivedFeature::LoanPurpose => defaults.loan_purpose.as_str().into(),
        DerivedFeature::Gender => defaults.gender.as_str().into(),
        DerivedFeature::MaritalStatus => defaults.marital_status.as_str().into(),
        DerivedFeature::EducationLevel => defaults.education_level.as_str().into(),
        DerivedFeature::EmploymentStatus => defaults.employment_status.as_str().into(),
        DerivedFeature::AnnualIncome => (number(record, MONTHLY_INCOME)? * 12.0).into(),
        DerivedFeature::OtherIncome => defaults.other_income.into(),
        DerivedFeature::NumOfOpenAccounts => defaults.num_of_open_accounts.into(),
        DerivedFeature::NumOfPastDefaults => defaults.num_of_past_defaults.into(),
        DerivedFeature::MonthsWithBank => defaults.months_with_bank.into(),
        DerivedFeature::NumDirectDebits => defaults.num_direct_debits.into(),
        DerivedFeature::CardTxnsPerMonth => defaults.card_txns_per_month.into(),
        DerivedFeature::LoanToIncome => {
            let annual_income = match record.get(ANNUAL_INCOME) {
                Some(_) => number(record, ANNUAL_INCOME)?,
                None => number(record, MONTHLY_INCOME)? * 12.0,
            };
            loan_to_income(number(record, LOAN_AMOUNT)?, annual_income).into()
        }
        DerivedFeature::InstallmentRatio => installment_ratio(
            number(record, LOAN_AMOUNT)?,
            number(record, LOAN_TERM_MONTHS)?,
            number(record, MONTHLY_INCOME)?,
        )
        .into(),
        DerivedFeature::CreditBand => credit_band(number(record, CREDIT_SCORE)?).into(),
    };
    Ok(value)
}

fn number(record: &ApplicantRecord, key: &str) -> Result<f64> {
    match record.get(key) {
        Some(value) => value.as_f64().ok_or_else(|| RiskError::not_numeric(key)),
        None => Err(RiskError::missing(key)),
    }
}

pub fn loan_to_income(loan_amount: f64, annual_income: f64) -> f64 {
    loan_amount / annual_income.max(1.0)
}

pub fn installment_ratio(loan_amount: f64, loan_term_months: f64, monthly_income: f64) -> f64 {
    (loan_amount / loan_term_months.max(1.0)) / monthly_income.max(1.0)
}

/// Five ordered bands covering the whole score range.
pub fn credit_band(score: f64) -> &'static str {
    if score < 580.0 {
        "poor"
    } else if score < 670.0 {
        "fair"
    } else if score < 740.0 {
        "good"
    } else if score < 800.0 {
        "very_good"
    } else {
        "excellent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_form() -> ApplicantRecord {
        ApplicantRecord::new()
            .with(LOAN_AMOUNT, 5000.0)
            .with(LOAN_TERM_MONTHS, 24.0)
            .with(INTEREST_RATE, 12.0)
            .with(AGE, 30.0)
            .with(MONTHLY_INCOME, 3000.0)
            .with(CREDIT_SCORE, 650.0)
            .with(AVG_MONTHLY_BALANCE, 20000.0)
    }

    #[test]
    fn expands_short_form_with_reference_values() {
        let expanded = expand(&short_form()).unwrap();

        assert_eq!(expanded.len(), 22);
        assert_eq!(expanded.text(CREDIT_BAND), Some("fair"));
        assert_eq!(expanded.number(ANNUAL_INCOME), Some(36000.0));
        assert!((expanded.number(LOAN_TO_INCOME).unwrap() - 5000.0 / 36000.0).abs() < 1e-12);
        assert!((expanded.number(INSTALLMENT_RATIO).unwrap() - (5000.0 / 24.0) / 3000.0).abs() < 1e-12);
        assert_eq!(expanded.text(LOAN_PURPOSE), Some("personal"));
        assert_eq!(expanded.text(EMPLOYMENT_STATUS), Some("employed"));
        assert_eq!(expanded.number(OTHER_INCOME), Some(0.0));
        assert_eq!(expanded.number(NUM_OF_OPEN_ACCOUNTS), Some(4.0));
        assert_eq!(expanded.number(MONTHS_WITH_BANK), Some(24.0));
        assert_eq!(expanded.number(NUM_DIRECT_DEBITS), Some(3.0));
        assert_eq!(expanded.number(CARD_TXNS_PER_MONTH), Some(20.0));
    }

    #[test]
    fn expand_leaves_input_untouched_and_is_repeatable() {
        let observed = short_form();
        let first = expand(&observed).unwrap();
        let second = expand(&observed).unwrap();
        assert_eq!(first, second);
        assert_eq!(observed.len(), 7);
    }

    #[test]
    fn credit_band_boundaries() {
        let cases = [
            (300.0, "poor"),
            (579.0, "poor"),
            (580.0, "fair"),
            (669.0, "fair"),
            (670.0, "good"),
            (739.0, "good"),
            (740.0, "very_good"),
            (799.0, "very_good"),
            (800.0, "excellent"),
            (850.0, "excellent"),
        ];
        for (score, band) in cases {
            assert_eq!(credit_band(score), band, "score {score}");
        }
    }

    #[test]
    fn zero_denominators_are_floored() {
        let observed = short_form()
            .with(MONTHLY_INCOME, 0.0)
            .with(LOAN_TERM_MONTHS, 0.0);
        let expanded = expand(&observed).unwrap();

        assert_eq!(expanded.number(ANNUAL_INCOME), Some(0.0));
        assert_eq!(expanded.number(LOAN_TO_INCOME), Some(5000.0));
        assert_eq!(expanded.number(INSTALLMENT_RATIO), Some(5000.0));
    }

    #[test]
    fn missing_observed_field_is_an_error() {
        let mut fields: Vec<(String, FeatureValue)> = short_form()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        fields.retain(|(k, _)| k != CREDIT_SCORE);
        let observed: ApplicantRecord = fields.into_iter().collect();

        match expand(&observed) {
            Err(RiskError::MissingField { field }) => assert_eq!(field, CREDIT_SCORE),
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn text_in_numeric_field_is_rejected() {
        let observed = short_form().with(MONTHLY_INCOME, "lots");
        assert!(matches!(
            expand(&observed),
            Err(RiskError::InvalidFieldType { .. })
        ));
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let observed = short_form().with(CREDIT_SCORE, 120.0).with(AGE, 7.0);
        let expanded = expand(&observed).unwrap();
        assert_eq!(expanded.text(CREDIT_BAND), Some("poor"));
        assert_eq!(expanded.number(AGE), Some(7.0));
    }

    #[test]
    fn full_entry_uses_supplied_annual_income() {
        let observed = short_form()
            .with(ANNUAL_INCOME, 50000.0)
            .with(OTHER_INCOME, 1200.0)
            .with(NUM_OF_OPEN_ACCOUNTS, 2.0)
            .with(NUM_OF_PAST_DEFAULTS, 1.0)
            .with(MONTHS_WITH_BANK, 40.0)
            .with(NUM_DIRECT_DEBITS, 5.0)
            .with(LOAN_PURPOSE, "business")
            .with(GENDER, "female")
            .with(MARITAL_STATUS, "married")
            .with(EDUCATION_LEVEL, "masters")
            .with(EMPLOYMENT_STATUS, "self_employed");

        let expanded = expand_with(&observed, &FeatureProfile::full_entry()).unwrap();

        assert_eq!(expanded.number(LOAN_TO_INCOME), Some(0.1));
        assert_eq!(expanded.text(GENDER), Some("female"));
        assert_eq!(expanded.number(NUM_OF_PAST_DEFAULTS), Some(1.0));
        assert_eq!(expanded.number(CARD_TXNS_PER_MONTH), Some(20.0));
    }

    #[test]
    fn full_entry_requires_categorical_fields() {
        let err = expand_with(&short_form(), &FeatureProfile::full_entry()).unwrap_err();
        assert!(matches!(err, RiskError::MissingField { .. }));
    }

    #[test]
    fn derived_values_overwrite_caller_copies() {
        let observed = short_form().with(CREDIT_BAND, "excellent").with(ANNUAL_INCOME, 1.0);
        let expanded = expand(&observed).unwrap();
        assert_eq!(expanded.text(CREDIT_BAND), Some("fair"));
        assert_eq!(expanded.number(ANNUAL_INCOME), Some(36000.0));
    }
}
