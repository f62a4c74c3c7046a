use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, RiskError};
use crate::models::applicant::*;
use crate::models::policy::RiskPolicy;

/// A feature the expander fills in rather than asking the caller for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedFeature {
    LoanPurpose,
    Gender,
    MaritalStatus,
    EducationLevel,
    EmploymentStatus,
    AnnualIncome,
    OtherIncome,
    NumOfOpenAccounts,
    NumOfPastDefaults,
    MonthsWithBank,
    NumDirectDebits,
    CardTxnsPerMonth,
    LoanToIncome,
    InstallmentRatio,
    CreditBand,
}

impl DerivedFeature {
    /// Evaluation order: income before the ratios that read it.
    pub const ALL: [DerivedFeature; 15] = [
        DerivedFeature::LoanPurpose,
        DerivedFeature::Gender,
        DerivedFeature::MaritalStatus,
        DerivedFeature::EducationLevel,
        DerivedFeature::EmploymentStatus,
        DerivedFeature::AnnualIncome,
        DerivedFeature::OtherIncome,
        DerivedFeature::NumOfOpenAccounts,
        DerivedFeature::NumOfPastDefaults,
        DerivedFeature::MonthsWithBank,
        DerivedFeature::NumDirectDebits,
        DerivedFeature::CardTxnsPerMonth,
        DerivedFeature::LoanToIncome,
        DerivedFeature::InstallmentRatio,
        DerivedFeature::CreditBand,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DerivedFeature::LoanPurpose => LOAN_PURPOSE,
            DerivedFeature::Gender => GENDER,
            DerivedFeature::MaritalStatus => MARITAL_STATUS,
            DerivedFeature::EducationLevel => EDUCATION_LEVEL,
            DerivedFeature::EmploymentStatus => EMPLOYMENT_STATUS,
            DerivedFeature::AnnualIncome => ANNUAL_INCOME,
            DerivedFeature::OtherIncome => OTHER_INCOME,
            DerivedFeature::NumOfOpenAccounts => NUM_OF_OPEN_ACCOUNTS,
            DerivedFeature::NumOfPastDefaults => NUM_OF_PAST_DEFAULTS,
            DerivedFeature::MonthsWithBank => MONTHS_WITH_BANK,
            DerivedFeature::NumDirectDebits => NUM_DIRECT_DEBITS,
            DerivedFeature::CardTxnsPerMonth => CARD_TXNS_PER_MONTH,
            DerivedFeature::LoanToIncome => LOAN_TO_INCOME,
            DerivedFeature::InstallmentRatio => INSTALLMENT_RATIO,
            DerivedFeature::CreditBand => CREDIT_BAND,
        }
    }
}

/// Constants used for derived fields that have no formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationDefaults {
    pub loan_purpose: String,
    pub gender: String,
    pub marital_status: String,
    pub education_level: String,
    pub employment_status: String,
    pub other_income: f64,
    pub num_of_open_accounts: f64,
    pub num_of_past_defaults: f64,
    pub months_with_bank: f64,
    pub num_direct_debits: f64,
    pub card_txns_per_month: f64,
}

impl Default for DerivationDefaults {
    fn default() -> Self {
        Self {
            loan_purpose: "personal".to_string(),
            gender: "male".to_string(),
            marital_status: "single".to_string(),
            education_level: "bachelor".to_string(),
            employment_status: "employed".to_string(),
            other_income: 0.0,
            num_of_open_accounts: 4.0,
            num_of_past_defaults: 0.0,
            months_with_bank: 24.0,
            num_direct_debits: 3.0,
            card_txns_per_month: 20.0,
        }
    }
}

/// Inclusive numeric range accepted for an observed field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputBound {
    pub min: f64,
    pub max: f64,
}

impl InputBound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// One input surface: which fields the caller supplies, which are derived,
/// the accepted ranges and the threshold table used to report the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProfile {
    pub name: String,
    pub required: Vec<String>,
    pub derived: Vec<DerivedFeature>,
    #[serde(default)]
    pub bounds: BTreeMap<String, InputBound>,
    #[serde(default)]
    pub allowed_values: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub defaults: DerivationDefaults,
    pub policy: RiskPolicy,
}

pub const PROFILE_NAMES: [&str; 3] = ["seven_input", "guided", "full_entry"];

fn bounds(entries: &[(&str, f64, f64)]) -> BTreeMap<String, InputBound> {
    entries
        .iter()
        .map(|(key, min, max)| (key.to_string(), InputBound::new(*min, *max)))
        .collect()
}

fn allowed(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl FeatureProfile {
    /// Short form: seven fields in, class decision out.
    pub fn seven_input() -> Self {
        Self {
            name: "seven_input".to_string(),
            required: OBSERVED_FIELDS.iter().map(|k| k.to_string()).collect(),
            derived: DerivedFeature::ALL.to_vec(),
            bounds: bounds(&[
                (LOAN_AMOUNT, 1000.0, 200_000.0),
                (LOAN_TERM_MONTHS, 6.0, 72.0),
                (INTEREST_RATE, 1.0, 40.0),
                (AGE, 18.0, 75.0),
                (MONTHLY_INCOME, 500.0, 50_000.0),
                (CREDIT_SCORE, 300.0, 850.0),
                (AVG_MONTHLY_BALANCE, 0.0, 200_000.0),
            ]),
            allowed_values: BTreeMap::new(),
            defaults: DerivationDefaults::default(),
            policy: RiskPolicy::binary(),
        }
    }

    /// Short form with wider ranges and a three-band readout.
    pub fn guided() -> Self {
        Self {
            name: "guided".to_string(),
            required: OBSERVED_FIELDS.iter().map(|k| k.to_string()).collect(),
            derived: DerivedFeature::ALL.to_vec(),
            bounds: bounds(&[
                (LOAN_AMOUNT, 500.0, 5_000_000.0),
                (LOAN_TERM_MONTHS, 1.0, 84.0),
                (INTEREST_RATE, 1.0, 25.0),
                (AGE, 18.0, 100.0),
                (MONTHLY_INCOME, 0.0, 2_000_000.0),
                (CREDIT_SCORE, 300.0, 900.0),
            ]),
            allowed_values: BTreeMap::new(),
            defaults: DerivationDefaults::default(),
            policy: RiskPolicy::three_band(),
        }
    }

    /// Every applicant fact entered by hand; only ratios and banding derived.
    pub fn full_entry() -> Self {
        let mut required: Vec<String> = OBSERVED_FIELDS.iter().map(|k| k.to_string()).collect();
        required.extend(
            [
                ANNUAL_INCOME,
                OTHER_INCOME,
                NUM_OF_OPEN_ACCOUNTS,
                NUM_OF_PAST_DEFAULTS,
                MONTHS_WITH_BANK,
                NUM_DIRECT_DEBITS,
                LOAN_PURPOSE,
                GENDER,
                MARITAL_STATUS,
                EDUCATION_LEVEL,
                EMPLOYMENT_STATUS,
            ]
            .iter()
            .map(|k| k.to_string()),
        );

        let mut allowed_values = BTreeMap::new();
        allowed_values.insert(
            LOAN_PURPOSE.to_string(),
            allowed(&["personal", "business", "education", "home_improvement", "medical"]),
        );
        allowed_values.insert(GENDER.to_string(), allowed(&["male", "female"]));
        allowed_values.insert(
            MARITAL_STATUS.to_string(),
            allowed(&["single", "married", "divorced"]),
        );
        allowed_values.insert(
            EDUCATION_LEVEL.to_string(),
            allowed(&["high_school", "diploma", "bachelor", "masters"]),
        );
        allowed_values.insert(
            EMPLOYMENT_STATUS.to_string(),
            allowed(&["employed", "self_employed", "unemployed"]),
        );

        Self {
            name: "full_entry".to_string(),
            required,
            derived: vec![
                DerivedFeature::CardTxnsPerMonth,
                DerivedFeature::LoanToIncome,
                DerivedFeature::InstallmentRatio,
                DerivedFeature::CreditBand,
            ],
            bounds: bounds(&[
                (LOAN_AMOUNT, 1.0, 5_000_000.0),
                (LOAN_TERM_MONTHS, 1.0, 84.0),
                (CREDIT_SCORE, 300.0, 850.0),
                (MONTHLY_INCOME, 0.0, 2_000_000.0),
                (ANNUAL_INCOME, 0.0, 24_000_000.0),
                (NUM_OF_PAST_DEFAULTS, 0.0, 50.0),
            ]),
            allowed_values,
            defaults: DerivationDefaults::default(),
            policy: RiskPolicy::five_band(),
        }
    }

    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "seven_input" => Ok(Self::seven_input()),
            "guided" => Ok(Self::guided()),
            "full_entry" => Ok(Self::full_entry()),
            other => Err(RiskError::UnknownProfile(other.to_string())),
        }
    }

    pub fn with_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for FeatureProfile {
    fn default() -> Self {
        Self::seven_input()
    }
}
