use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use loanrisk_lib::analysis::synth::{DEFAULT_ROWS, DEFAULT_SEED};
use loanrisk_lib::commands::{dataset, db, predict, settings};
use loanrisk_lib::models::applicant::*;
use loanrisk_lib::{ApplicantRecord, FeatureValue, RiskAssessment};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "loanrisk",
    version,
    about = "Estimate loan default probability and risk band from applicant details",
    long_about = "loanrisk fills in the features a default model expects from a short\n\
        applicant form, scores the applicant, and reports the probability of\n\
        default with a risk band.\n\n\
        EXAMPLES:\n\
        \n  loanrisk predict --loan-amount 5000 --loan-term 24 --interest-rate 12 \\\n\
        \n      --age 30 --monthly-income 3000 --credit-score 650 --avg-balance 20000\n\
        \n  loanrisk settings set '{\"activeProfile\": \"guided\"}'\n\
        \n  loanrisk generate-data --output synthetic_loan_data.csv"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one applicant and print the probability of default
    Predict(ApplicantArgs),

    /// Print the full feature record the model would receive
    Expand(ApplicantArgs),

    /// Write a synthetic loan book as CSV
    GenerateData {
        #[arg(short, long, default_value = "synthetic_loan_data.csv")]
        output: String,

        #[arg(long, default_value_t = DEFAULT_ROWS)]
        rows: usize,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// List recent assessments stored in the workspace
    History {
        #[arg(short, long, default_value = ".")]
        workspace: String,

        #[arg(short, long, default_value_t = 20)]
        limit: u32,

        #[arg(long)]
        json: bool,
    },

    /// Show or update workspace settings
    Settings {
        #[arg(short, long, default_value = ".")]
        workspace: String,

        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    Show,
    /// Merge a JSON object into the saved settings
    Set { patch: String },
}

#[derive(Debug, Args)]
struct ApplicantArgs {
    #[arg(short, long, default_value = ".")]
    workspace: String,

    #[arg(long)]
    loan_amount: Option<f64>,

    /// Loan term in months
    #[arg(long)]
    loan_term: Option<f64>,

    /// Annual interest rate in percent
    #[arg(long)]
    interest_rate: Option<f64>,

    #[arg(long)]
    age: Option<f64>,

    #[arg(long)]
    monthly_income: Option<f64>,

    #[arg(long)]
    credit_score: Option<f64>,

    /// Average monthly bank balance
    #[arg(long)]
    avg_balance: Option<f64>,

    /// Extra fields as key=value, e.g. --field gender=female
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, FeatureValue)>,

    /// Read the applicant record from a JSON file; flags override its values
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

fn parse_field(raw: &str) -> Result<(String, FeatureValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    let value = match value.trim().parse::<f64>() {
        Ok(number) => FeatureValue::Number(number),
        Err(_) => FeatureValue::Text(value.trim().to_string()),
    };
    Ok((key.to_string(), value))
}

impl ApplicantArgs {
    fn record(&self) -> Result<ApplicantRecord, String> {
        let mut record = match &self.input {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
                serde_json::from_str::<ApplicantRecord>(&raw)
                    .map_err(|e| format!("Invalid applicant JSON in {}: {e}", path.display()))?
            }
            None => ApplicantRecord::new(),
        };

        let flags = [
            (LOAN_AMOUNT, self.loan_amount),
            (LOAN_TERM_MONTHS, self.loan_term),
            (INTEREST_RATE, self.interest_rate),
            (AGE, self.age),
            (MONTHLY_INCOME, self.monthly_income),
            (CREDIT_SCORE, self.credit_score),
            (AVG_MONTHLY_BALANCE, self.avg_balance),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                record.insert(key, value);
            }
        }
        for (key, value) in &self.fields {
            record.insert(key, value.clone());
        }

        Ok(record)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_assessment(assessment: &RiskAssessment) {
    println!();
    println!("-----------------------------------");
    println!(" Probability of Default (PD): {:.4} ({:.2}%)", assessment.probability, assessment.probability * 100.0);
    println!(" Risk Category: {}", assessment.category.label);
    if let Some(message) = &assessment.category.message {
        println!(" {message}");
    }
    println!("-----------------------------------");
    println!();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{raw}");
    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Predict(args) => {
            let record = args.record()?;
            let assessment = predict::predict_default(args.workspace.clone(), record).await?;
            if args.json {
                print_json(&assessment)?;
            } else {
                print_assessment(&assessment);
            }
        }
        Command::Expand(args) => {
            let record = args.record()?;
            let expanded = predict::expand_applicant(args.workspace.clone(), record).await?;
            print_json(&expanded)?;
        }
        Command::GenerateData { output, rows, seed } => {
            let summary = dataset::generate_dataset(output, rows, seed).await?;
            println!(
                "Wrote {} rows to {} ({} defaulted, {:.1}%)",
                summary.rows,
                summary.path,
                summary.defaulted,
                summary.default_rate * 100.0
            );
        }
        Command::History {
            workspace,
            limit,
            json,
        } => {
            let rows = db::get_assessment_history(workspace, Some(limit)).await?;
            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No assessments recorded yet.");
            } else {
                for row in rows {
                    let when = chrono::DateTime::from_timestamp(row.created_at, 0)
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| row.created_at.to_string());
                    println!(
                        "{when}  {:<12} {:.4}  {}  {}",
                        row.profile, row.probability, row.category, row.id
                    );
                }
            }
        }
        Command::Settings { workspace, action } => {
            let value = match action {
                SettingsAction::Show => settings::get_settings(workspace).await?,
                SettingsAction::Set { patch } => {
                    let patch: Value = serde_json::from_str(&patch)
                        .map_err(|e| format!("Settings patch is not valid JSON: {e}"))?;
                    settings::save_settings(workspace, patch).await?
                }
            };
            print_json(&value)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
