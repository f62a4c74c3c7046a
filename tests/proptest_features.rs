//! Property-based tests for feature expansion and risk banding.

use loanrisk_lib::analysis::features::{credit_band, expand};
use loanrisk_lib::analysis::risk::classify;
use loanrisk_lib::models::applicant::*;
use loanrisk_lib::{ApplicantRecord, RiskPolicy};
use proptest::prelude::*;

const BANDS: [&str; 5] = ["poor", "fair", "good", "very_good", "excellent"];

fn short_form() -> impl Strategy<Value = ApplicantRecord> {
    (
        1.0..5_000_000.0f64,
        0.0..120.0f64,
        1.0..40.0f64,
        18.0..100.0f64,
        0.0..2_000_000.0f64,
        300.0..=850.0f64,
        0.0..500_000.0f64,
    )
        .prop_map(|(amount, term, rate, age, income, score, balance)| {
            ApplicantRecord::new()
                .with(LOAN_AMOUNT, amount)
                .with(LOAN_TERM_MONTHS, term)
                .with(INTEREST_RATE, rate)
                .with(AGE, age)
                .with(MONTHLY_INCOME, income)
                .with(CREDIT_SCORE, score)
                .with(AVG_MONTHLY_BALANCE, balance)
        })
}

proptest! {
    /// Property: expansion is deterministic
    #[test]
    fn expand_is_deterministic(record in short_form()) {
        prop_assert_eq!(expand(&record).unwrap(), expand(&record).unwrap());
    }

    /// Property: annual income is twelve months of income
    #[test]
    fn annual_income_is_twelve_months(record in short_form()) {
        let expanded = expand(&record).unwrap();
        let monthly = record.number(MONTHLY_INCOME).unwrap();
        prop_assert_eq!(expanded.number(ANNUAL_INCOME).unwrap(), monthly * 12.0);
    }

    /// Property: ratios stay finite even with zero income or term
    #[test]
    fn ratios_are_finite(record in short_form(), zero_income in any::<bool>(), zero_term in any::<bool>()) {
        let mut record = record;
        if zero_income {
            record.insert(MONTHLY_INCOME, 0.0);
        }
        if zero_term {
            record.insert(LOAN_TERM_MONTHS, 0.0);
        }
        let expanded = expand(&record).unwrap();
        prop_assert!(expanded.number(LOAN_TO_INCOME).unwrap().is_finite());
        prop_assert!(expanded.number(INSTALLMENT_RATIO).unwrap().is_finite());
    }

    /// Property: credit bands are ordered along the score axis
    #[test]
    fn credit_band_is_monotonic(a in 300.0..=850.0f64, b in 300.0..=850.0f64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let rank = |s: f64| BANDS.iter().position(|band| *band == credit_band(s)).unwrap();
        prop_assert!(rank(low) <= rank(high));
    }

    /// Property: every probability maps to exactly one band, and higher
    /// probabilities never map to a lower band
    #[test]
    fn five_band_is_total_and_monotonic(a in 0.0..=1.0f64, b in 0.0..=1.0f64) {
        let policy = RiskPolicy::five_band();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(low, &policy).unwrap().level <= classify(high, &policy).unwrap().level);
        prop_assert!(classify(high, &policy).unwrap().level < policy.levels());
    }
}
