//! Synthetic training data export

use anyhow::{Context, Result};
use hiring_lib::{training, FeatureSchema};
use serde_json::json;
use std::path::Path;

use crate::output::{print_json, print_success, OutputFormat};

/// Write `count` seeded smart hiring rows to `output`
pub fn write_sample_data(output: &Path, count: usize, seed: u64, format: OutputFormat) -> Result<()> {
    let rows = training::generate_sample_rows(count, seed);
    training::write_csv(output, &rows, &FeatureSchema::smart_hiring())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let positives = rows.iter().filter(|r| r.successful).count();
    match format {
        OutputFormat::Json => print_json(&json!({
            "path": output,
            "rows": rows.len(),
            "positive_rows": positives,
            "seed": seed,
        }))?,
        OutputFormat::Table => print_success(&format!(
            "Wrote {} rows ({} successful matches) to {}",
            rows.len(),
            positives,
            output.display()
        )),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_written_file_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.csv");
        write_sample_data(&path, 25, 42, OutputFormat::Table).unwrap();

        let rows = training::load_csv(&path, &FeatureSchema::smart_hiring()).unwrap();
        assert_eq!(rows.len(), 25);
    }
}
