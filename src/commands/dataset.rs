use crate::analysis::synth::{generate, write_csv, SynthConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub path: String,
    pub rows: usize,
    pub defaulted: usize,
    pub default_rate: f64,
    pub seed: u64,
    pub duration_ms: u64,
}

pub async fn generate_dataset(output_path: String, rows: usize, seed: u64) -> Result<DatasetSummary, String> {
    generate_dataset_internal(&output_path, rows, seed)
}

pub fn generate_dataset_internal(output_path: &str, rows: usize, seed: u64) -> Result<DatasetSummary, String> {
    let start = std::time::Instant::now();
    let config = SynthConfig {
        rows,
        seed,
        ..SynthConfig::default()
    };

    let loans = generate(&config).map_err(|e| format!("Generation error: {e}"))?;

    let path = Path::new(output_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
    }
    write_csv(path, &loans).map_err(|e| format!("Failed to write {output_path}: {e}"))?;

    let defaulted = loans.iter().filter(|loan| loan.defaulted()).count();
    let summary = DatasetSummary {
        path: output_path.to_string(),
        rows: loans.len(),
        defaulted,
        default_rate: if loans.is_empty() {
            0.0
        } else {
            defaulted as f64 / loans.len() as f64
        },
        seed,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    log::info!(
        "wrote {} synthetic loans to {} ({:.1}% defaulted)",
        summary.rows,
        summary.path,
        summary.default_rate * 100.0
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("data/loans.csv");
        let summary =
            generate_dataset_internal(&output.to_string_lossy(), 200, 11).unwrap();

        assert_eq!(summary.rows, 200);
        assert!(summary.defaulted <= 200);
        assert!((0.0..=1.0).contains(&summary.default_rate));
        assert!(output.exists());
    }

    #[test]
    fn zero_rows_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.csv");
        let summary = generate_dataset_internal(&output.to_string_lossy(), 0, 1).unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.default_rate, 0.0);
    }
}
