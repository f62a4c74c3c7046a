//! Synthetic loan book used to train and sanity-check default models.
//!
//! Default likelihood is driven by credit score, loan size relative to
//! income, past defaults and balance, pushed through a logistic link, so a
//! model trained on the output should recover those directions.

use chrono::{Duration, NaiveDate};
use rand::distributions::{Bernoulli, Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Normal, Poisson};
use serde::Serialize;
use std::path::Path;

use crate::error::{Result, RiskError};

pub const DEFAULT_ROWS: usize = 30_000;
pub const DEFAULT_SEED: u64 = 42;

const FIRST_CUSTOMER_ID: u64 = 100_000;
const FIRST_LOAN_ID: u64 = 500_000;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub rows: usize,
    pub seed: u64,
    /// Earliest loan start date; starts spread over the following 2000 days.
    pub start_date: NaiveDate,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            seed: DEFAULT_SEED,
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticLoan {
    pub customer_id: u64,
    pub loan_id: u64,
    pub loan_amount: i64,
    pub loan_start_date: String,
    pub loan_term_months: u32,
    pub loan_purpose: String,
    pub loan_status: String,
    pub outstanding_balance: i64,
    pub monthly_installment: i64,
    pub interest_rate: f64,
    pub application_date: String,
    pub approval_date: String,
    pub age: i64,
    pub gender: String,
    pub marital_status: String,
    pub education_level: String,
    pub employment_status: String,
    pub annual_income: i64,
    pub monthly_income: i64,
    pub other_income: i64,
    pub credit_score: i64,
    pub num_of_open_accounts: u64,
    pub num_of_past_defaults: u64,
    pub avg_monthly_balance: i64,
    pub months_with_bank: i64,
    pub num_direct_debits: u64,
    pub num_card_txns_6m: u64,
    pub payment_delay_days: i64,
    pub last_payment_date: String,
}

impl SyntheticLoan {
    pub fn defaulted(&self) -> bool {
        self.loan_status == "Defaulted"
    }
}

/// Weighted categorical column.
struct Choice {
    values: &'static [&'static str],
    index: WeightedIndex<f64>,
}

impl Choice {
    fn new(values: &'static [&'static str], weights: &[f64]) -> Result<Self> {
        let index = WeightedIndex::new(weights).map_err(|e| RiskError::Dataset(e.to_string()))?;
        Ok(Self { values, index })
    }

    fn sample(&self, rng: &mut StdRng) -> &'static str {
        self.values[self.index.sample(rng)]
    }
}

struct Distributions {
    age: Normal<f64>,
    monthly_income: Normal<f64>,
    other_income: Normal<f64>,
    credit_score: Normal<f64>,
    open_accounts: Poisson<f64>,
    past_defaults: Binomial,
    balance: Normal<f64>,
    months_with_bank: Normal<f64>,
    direct_debits: Poisson<f64>,
    card_txns: Poisson<f64>,
    loan_amount: Normal<f64>,
    gender: Choice,
    marital_status: Choice,
    education_level: Choice,
    employment_status: Choice,
    loan_purpose: Choice,
    term: WeightedIndex<f64>,
}

const TERMS: [u32; 5] = [12, 24, 36, 48, 60];

fn dist_err(e: impl std::fmt::Display) -> RiskError {
    RiskError::Dataset(e.to_string())
}

impl Distributions {
    fn new() -> Result<Self> {
        Ok(Self {
            age: Normal::new(38.0, 10.0).map_err(dist_err)?,
            monthly_income: Normal::new(60_000.0, 25_000.0).map_err(dist_err)?,
            other_income: Normal::new(5_000.0, 3_000.0).map_err(dist_err)?,
            credit_score: Normal::new(620.0, 80.0).map_err(dist_err)?,
            open_accounts: Poisson::new(3.0).map_err(dist_err)?,
            past_defaults: Binomial::new(2, 0.15).map_err(dist_err)?,
            balance: Normal::new(80_000.0, 40_000.0).map_err(dist_err)?,
            months_with_bank: Normal::new(60.0, 25.0).map_err(dist_err)?,
            direct_debits: Poisson::new(4.0).map_err(dist_err)?,
            card_txns: Poisson::new(25.0).map_err(dist_err)?,
            loan_amount: Normal::new(300_000.0, 200_000.0).map_err(dist_err)?,
            gender: Choice::new(&["Male", "Female"], &[0.55, 0.45])?,
            marital_status: Choice::new(&["Single", "Married", "Divorced"], &[0.45, 0.45, 0.10])?,
            education_level: Choice::new(
                &["High School", "Diploma", "Bachelors", "Masters"],
                &[0.35, 0.25, 0.30, 0.10],
            )?,
            employment_status: Choice::new(
                &["Employed", "Self-employed", "Unemployed"],
                &[0.70, 0.20, 0.10],
            )?,
            loan_purpose: Choice::new(
                &["Personal", "Business", "Education", "Home Improvement", "Medical"],
                &[0.40, 0.25, 0.15, 0.10, 0.10],
            )?,
            term: WeightedIndex::new([0.20, 0.25, 0.30, 0.15, 0.10]).map_err(dist_err)?,
        })
    }
}

/// Default-risk score before the logistic link.
pub fn risk_score(credit_score: f64, loan_amount: f64, monthly_income: f64, past_defaults: f64, avg_balance: f64) -> f64 {
    (700.0 - credit_score) * 0.015
        + (loan_amount / (monthly_income + 1.0)) * 0.02
        + past_defaults * 0.3
        + (50_000.0 / (avg_balance + 1.0)) * 0.02
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn generate(config: &SynthConfig) -> Result<Vec<SyntheticLoan>> {
    let dists = Distributions::new()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut rows = Vec::with_capacity(config.rows);

    for i in 0..config.rows as u64 {
        let age = (dists.age.sample(&mut rng) as i64).clamp(21, 65);
        let gender = dists.gender.sample(&mut rng);
        let marital_status = dists.marital_status.sample(&mut rng);
        let education_level = dists.education_level.sample(&mut rng);
        let employment_status = dists.employment_status.sample(&mut rng);

        let monthly_income = (dists.monthly_income.sample(&mut rng) as i64).clamp(10_000, 300_000);
        let annual_income = monthly_income * 12;
        let other_income = dists.other_income.sample(&mut rng).max(0.0);

        let credit_score = (dists.credit_score.sample(&mut rng) as i64).clamp(300, 850);
        let num_of_open_accounts = dists.open_accounts.sample(&mut rng) as u64;
        let num_of_past_defaults = dists.past_defaults.sample(&mut rng);

        let avg_monthly_balance = dists.balance.sample(&mut rng).max(5_000.0);
        let months_with_bank = dists.months_with_bank.sample(&mut rng).max(6.0);
        let num_direct_debits = dists.direct_debits.sample(&mut rng) as u64;
        let num_card_txns_6m = dists.card_txns.sample(&mut rng) as u64;

        let loan_amount = dists.loan_amount.sample(&mut rng).clamp(50_000.0, 2_000_000.0);
        let interest_rate = (rng.gen_range(10.0..22.0_f64) * 100.0).round() / 100.0;
        let loan_term_months = TERMS[dists.term.sample(&mut rng)];
        let loan_purpose = dists.loan_purpose.sample(&mut rng);

        let start = config.start_date + Duration::days(rng.gen_range(0..2000));
        let application = start - Duration::days(rng.gen_range(5..30));
        let approval = start - Duration::days(rng.gen_range(1..5));
        let last_payment = start + Duration::days(rng.gen_range(60..900));

        let term = f64::from(loan_term_months);
        let monthly_installment = loan_amount / term + (loan_amount * (interest_rate / 100.0)) / term;
        let outstanding_balance =
            (loan_amount - monthly_installment * rng.gen_range(0.1..0.9)).max(0.0);

        let default_prob = sigmoid(risk_score(
            credit_score as f64,
            loan_amount,
            monthly_income as f64,
            num_of_past_defaults as f64,
            avg_monthly_balance,
        ));
        let defaulted = Bernoulli::new(default_prob).map_err(dist_err)?.sample(&mut rng);
        let payment_delay_days = if defaulted {
            rng.gen_range(90..180)
        } else {
            rng.gen_range(0..30)
        };

        rows.push(SyntheticLoan {
            customer_id: FIRST_CUSTOMER_ID + i,
            loan_id: FIRST_LOAN_ID + i,
            loan_amount: loan_amount as i64,
            loan_start_date: date(start),
            loan_term_months,
            loan_purpose: loan_purpose.to_string(),
            loan_status: if defaulted { "Defaulted" } else { "Paid" }.to_string(),
            outstanding_balance: outstanding_balance as i64,
            monthly_installment: monthly_installment as i64,
            interest_rate,
            application_date: date(application),
            approval_date: date(approval),
            age,
            gender: gender.to_string(),
            marital_status: marital_status.to_string(),
            education_level: education_level.to_string(),
            employment_status: employment_status.to_string(),
            annual_income,
            monthly_income,
            other_income: other_income as i64,
            credit_score,
            num_of_open_accounts,
            num_of_past_defaults,
            avg_monthly_balance: avg_monthly_balance as i64,
            months_with_bank: months_with_bank as i64,
            num_direct_debits,
            num_card_txns_6m,
            payment_delay_days,
            last_payment_date: date(last_payment),
        });
    }

    Ok(rows)
}

pub fn write_csv(path: &Path, rows: &[SyntheticLoan]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
