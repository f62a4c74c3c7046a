use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const LOAN_AMOUNT: &str = "loan_amount";
pub const LOAN_TERM_MONTHS: &str = "loan_term_months";
pub const INTEREST_RATE: &str = "interest_rate";
pub const AGE: &str = "age";
pub const MONTHLY_INCOME: &str = "monthly_income";
pub const CREDIT_SCORE: &str = "credit_score";
pub const AVG_MONTHLY_BALANCE: &str = "avg_monthly_balance";

pub const LOAN_PURPOSE: &str = "loan_purpose";
pub const GENDER: &str = "gender";
pub const MARITAL_STATUS: &str = "marital_status";
pub const EDUCATION_LEVEL: &str = "education_level";
pub const EMPLOYMENT_STATUS: &str = "employment_status";
pub const ANNUAL_INCOME: &str = "annual_income";
pub const OTHER_INCOME: &str = "other_income";
pub const NUM_OF_OPEN_ACCOUNTS: &str = "num_of_open_accounts";
pub const NUM_OF_PAST_DEFAULTS: &str = "num_of_past_defaults";
pub const MONTHS_WITH_BANK: &str = "months_with_bank";
pub const NUM_DIRECT_DEBITS: &str = "num_direct_debits";
pub const CARD_TXNS_PER_MONTH: &str = "card_txns_per_month";
pub const LOAN_TO_INCOME: &str = "loan_to_income";
pub const INSTALLMENT_RATIO: &str = "installment_ratio";
pub const CREDIT_BAND: &str = "credit_band";

/// The seven fields a caller fills in on the short form.
pub const OBSERVED_FIELDS: [&str; 7] = [
    LOAN_AMOUNT,
    LOAN_TERM_MONTHS,
    INTEREST_RATE,
    AGE,
    MONTHLY_INCOME,
    CREDIT_SCORE,
    AVG_MONTHLY_BALANCE,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "{v}"),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical spelling of a categorical value: lowercase, words joined by `_`.
/// "Self-Employed", "self employed" and "self_employed" all compare equal.
pub fn normalize_category(raw: &str) -> String {
    let joined = raw
        .trim()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");

    match joined.as_str() {
        "bachelors" => "bachelor".to_string(),
        "master" => "masters".to_string(),
        _ => joined,
    }
}

/// Feature name -> value for a single applicant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantRecord {
    fields: BTreeMap<String, FeatureValue>,
}

impl ApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<FeatureValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FeatureValue>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FeatureValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FeatureValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, FeatureValue)> for ApplicantRecord {
    fn from_iter<I: IntoIterator<Item = (K, FeatureValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
