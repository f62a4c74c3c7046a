use serde_json::json;
use std::fs;
use tempfile::TempDir;
use loanrisk_lib::commands::dataset::generate_dataset;
use loanrisk_lib::commands::db::{get_assessment, get_assessment_history};
use loanrisk_lib::commands::predict::{expand_applicant, predict_default, predict_default_internal};
use loanrisk_lib::commands::settings::{get_settings, save_settings};
use loanrisk_lib::models::applicant::*;
use loanrisk_lib::ApplicantRecord;

fn create_workspace() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let workspace_path = temp_dir.path().to_string_lossy().to_string();
    (temp_dir, workspace_path)
}

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

#[tokio::test]
async fn predict_returns_binary_assessment_and_records_history() {
    let (_tmp, workspace_path) = create_workspace();

    let assessment = predict_default(workspace_path.clone(), short_form())
        .await
        .expect("predict");

    assert_eq!(assessment.profile, "seven_input");
    assert!((0.0..=1.0).contains(&assessment.probability));
    let decision = assessment.decision.expect("binary profile emits a decision");
    let expected = if decision { "High Risk" } else { "Low Risk" };
    assert_eq!(assessment.category.label, expected);

    let history = get_assessment_history(workspace_path.clone(), None)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, assessment.id);

    let stored = get_assessment(workspace_path.clone(), assessment.id.clone())
        .await
        .expect("read assessment")
        .expect("stored row");
    let record: serde_json::Value = serde_json::from_str(&stored.record_json).expect("record json");
    assert_eq!(record["credit_band"], json!("fair"));
    assert_eq!(record["annual_income"], json!(36000.0));
}

#[tokio::test]
async fn settings_switch_profile_and_policy() {
    let (_tmp, workspace_path) = create_workspace();

    let initial = get_settings(workspace_path.clone()).await.expect("load settings");
    assert_eq!(initial["activeProfile"], json!("seven_input"));

    let saved = save_settings(
        workspace_path.clone(),
        json!({ "activeProfile": "guided", "riskPolicy": "five_band", "historyEnabled": false }),
    )
    .await
    .expect("save settings");
    assert_eq!(saved["activeProfile"], json!("guided"));
    assert_eq!(saved["historyRetention"], initial["historyRetention"]);

    let assessment = predict_default(workspace_path.clone(), short_form())
        .await
        .expect("predict");
    assert_eq!(assessment.profile, "guided");
    assert_eq!(assessment.decision, None);
    assert!([
        "Very Low Risk",
        "Low Risk",
        "Medium Risk",
        "High Risk",
        "Very High Risk"
    ]
    .contains(&assessment.category.label.as_str()));

    let history = get_assessment_history(workspace_path.clone(), None)
        .await
        .expect("history");
    assert!(history.is_empty());
}

#[tokio::test]
async fn missing_field_aborts_without_history() {
    let (_tmp, workspace_path) = create_workspace();

    let incomplete = ApplicantRecord::new()
        .with(LOAN_AMOUNT, 5000.0)
        .with(CREDIT_SCORE, 650.0);
    let err = predict_default(workspace_path.clone(), incomplete)
        .await
        .expect_err("missing fields must fail");
    assert!(err.contains("missing required field"));

    let history = get_assessment_history(workspace_path.clone(), None)
        .await
        .expect("history");
    assert!(history.is_empty());
}

#[tokio::test]
async fn out_of_bounds_input_is_rejected() {
    let (_tmp, workspace_path) = create_workspace();

    let err = predict_default(workspace_path.clone(), short_form().with(AGE, 12.0))
        .await
        .expect_err("age below bound");
    assert!(err.contains("age"));
}

#[tokio::test]
async fn custom_artifact_path_is_loaded_and_bad_bundle_reported() {
    let (tmp, workspace_path) = create_workspace();

    let bundle = json!({
        "name": "score_only",
        "version": "0.1.0",
        "preprocessor": {
            "numeric": [{ "name": "credit_score", "mean": 650.0, "scale": 100.0 }],
            "categorical": []
        },
        "model": { "coefficients": [-1.0], "intercept": 0.0 }
    });
    fs::write(tmp.path().join("bundle.json"), bundle.to_string()).expect("write bundle");
    save_settings(
        workspace_path.clone(),
        json!({ "artifactPath": "bundle.json", "riskPolicy": "three_band" }),
    )
    .await
    .expect("save settings");

    // credit_score at the mean -> z = 0 -> p = 0.5
    let assessment = predict_default_internal(&workspace_path, &short_form()).expect("predict");
    assert!((assessment.probability - 0.5).abs() < 1e-12);
    assert_eq!(assessment.category.label, "High Risk");

    fs::write(tmp.path().join("bundle.json"), "{ not json").expect("corrupt bundle");
    let err = predict_default_internal(&workspace_path, &short_form()).expect_err("bad bundle");
    assert!(err.starts_with("Model not loaded"));
}

#[tokio::test]
async fn expand_command_uses_active_profile() {
    let (_tmp, workspace_path) = create_workspace();

    let expanded = expand_applicant(workspace_path.clone(), short_form())
        .await
        .expect("expand");
    assert_eq!(expanded.len(), 22);
    assert_eq!(expanded.text(CREDIT_BAND), Some("fair"));

    save_settings(workspace_path.clone(), json!({ "activeProfile": "full_entry" }))
        .await
        .expect("save settings");
    let err = expand_applicant(workspace_path.clone(), short_form())
        .await
        .expect_err("full entry needs more fields");
    assert!(err.contains("missing required field"));
}

#[tokio::test]
async fn generate_dataset_writes_csv() {
    let (tmp, _workspace_path) = create_workspace();
    let output = tmp.path().join("synthetic_loan_data.csv");

    let summary = generate_dataset(output.to_string_lossy().to_string(), 50, 42)
        .await
        .expect("generate");
    assert_eq!(summary.rows, 50);

    let raw = fs::read_to_string(&output).expect("read csv");
    assert_eq!(raw.lines().count(), 51);
    assert!(raw.lines().next().unwrap().contains("payment_delay_days"));
}

#[tokio::test]
async fn non_finite_input_is_rejected_even_without_history() {
    let (_tmp, workspace_path) = create_workspace();
    save_settings(
        workspace_path.clone(),
        json!({ "activeProfile": "guided", "historyEnabled": false }),
    )
    .await
    .expect("save settings");

    for balance in [f64::NAN, f64::INFINITY] {
        let err = predict_default_internal(&workspace_path, &short_form().with(AVG_MONTHLY_BALANCE, balance))
            .expect_err("non-finite balance must not be scored");
        assert!(err.contains(AVG_MONTHLY_BALANCE), "{err}");
    }
}

#[tokio::test]
async fn full_entry_accepts_generated_category_spellings() {
    let (_tmp, workspace_path) = create_workspace();
    save_settings(workspace_path.clone(), json!({ "activeProfile": "full_entry" }))
        .await
        .expect("save settings");

    let record = short_form()
        .with(ANNUAL_INCOME, 36000.0)
        .with(OTHER_INCOME, 0.0)
        .with(NUM_OF_OPEN_ACCOUNTS, 3.0)
        .with(NUM_OF_PAST_DEFAULTS, 0.0)
        .with(MONTHS_WITH_BANK, 48.0)
        .with(NUM_DIRECT_DEBITS, 4.0)
        .with(LOAN_PURPOSE, "Home Improvement")
        .with(GENDER, "Female")
        .with(MARITAL_STATUS, "Married")
        .with(EDUCATION_LEVEL, "Bachelors")
        .with(EMPLOYMENT_STATUS, "Self-employed");

    let assessment = predict_default(workspace_path, record).await.expect("predict");
    assert_eq!(assessment.profile, "full_entry");
}
