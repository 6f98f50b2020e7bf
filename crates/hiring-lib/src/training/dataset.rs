//! Training data CSV import/export
//!
//! The header row names the columns. Columns outside the schema (such as a
//! candidate `name`) are ignored, schema features without a column default
//! to 0, and empty cells default to 0.

use crate::error::{HiringError, Result};
use crate::models::{FeatureMap, TrainingRow};
use crate::schema::FeatureSchema;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Load rows from a CSV file, using the schema's label column
pub fn load_csv(path: impl AsRef<Path>, schema: &FeatureSchema) -> Result<Vec<TrainingRow>> {
    load_csv_with_label(path, schema, schema.label_column())
}

pub fn load_csv_with_label(
    path: impl AsRef<Path>,
    schema: &FeatureSchema,
    label_column: &str,
) -> Result<Vec<TrainingRow>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let rows = read_rows(BufReader::new(file), schema, label_column)?;
    debug!(path = %path.display(), rows = rows.len(), "Training data loaded");
    Ok(rows)
}

/// Parse CSV rows from any reader
pub fn read_rows<R: BufRead>(
    reader: R,
    schema: &FeatureSchema,
    label_column: &str,
) -> Result<Vec<TrainingRow>> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break split_fields(&line)
                        .map_err(|message| HiringError::Dataset { line: 1, message })?;
                }
            }
            None => return Ok(Vec::new()),
        }
    };

    let label_idx = header
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| HiringError::Dataset {
            line: 1,
            message: format!("missing label column '{}'", label_column),
        })?;

    let feature_columns: Vec<(String, usize)> = schema
        .features()
        .iter()
        .filter_map(|name| header.iter().position(|h| h == name).map(|i| (name.clone(), i)))
        .collect();
    if feature_columns.len() < schema.len() {
        warn!(
            present = feature_columns.len(),
            expected = schema.len(),
            "Training data lacks some schema columns; they default to 0"
        );
    }

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(&line).map_err(|message| HiringError::Dataset {
            line: line_no,
            message,
        })?;
        if fields.len() != header.len() {
            return Err(HiringError::Dataset {
                line: line_no,
                message: format!("expected {} fields, found {}", header.len(), fields.len()),
            });
        }

        let mut features = FeatureMap::with_capacity(feature_columns.len());
        for (name, col) in &feature_columns {
            let value = parse_value(&fields[*col]).ok_or_else(|| HiringError::Dataset {
                line: line_no,
                message: format!("column '{}' is not a finite number: {:?}", name, fields[*col]),
            })?;
            features.insert(name.clone(), value);
        }

        let successful = parse_label(&fields[label_idx]).ok_or_else(|| HiringError::Dataset {
            line: line_no,
            message: format!("label '{}' must be 0 or 1, got {:?}", label_column, fields[label_idx]),
        })?;

        rows.push(TrainingRow::new(features, successful));
    }

    Ok(rows)
}

/// Write rows as CSV: schema features followed by the label column
pub fn write_csv(path: impl AsRef<Path>, rows: &[TrainingRow], schema: &FeatureSchema) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_rows(&mut writer, rows, schema)?;
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "Training data exported");
    Ok(())
}

pub fn write_rows<W: Write>(writer: &mut W, rows: &[TrainingRow], schema: &FeatureSchema) -> Result<()> {
    let mut header: Vec<&str> = schema.features().iter().map(String::as_str).collect();
    header.push(schema.label_column());
    writeln!(writer, "{}", header.join(","))?;

    for row in rows {
        let mut fields: Vec<String> = schema
            .features()
            .iter()
            .map(|name| row.features.get(name).copied().unwrap_or(0.0).to_string())
            .collect();
        fields.push(row.label().to_string());
        writeln!(writer, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Split one record on commas. Double-quoted fields may contain commas and
/// `""` escapes; records spanning several lines are not supported.
fn split_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}

fn parse_value(field: &str) -> Option<f64> {
    if field.is_empty() {
        return Some(0.0);
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_label(field: &str) -> Option<bool> {
    match field.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_read_legacy_candidates() {
        let csv = "name,skills,budget,experience,hire\n\
                   alice,5,1000,2,1\n\
                   bob,1,200,0,0\n";
        let rows = read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].features["skills"], 5.0);
        assert_eq!(rows[0].features["budget"], 1000.0);
        assert!(rows[0].successful);
        assert!(!rows[1].successful);
        assert!(!rows[0].features.contains_key("name"));
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let csv = "name,skills,budget,experience,hire\n\
                   \"Smith, John\",5,1000,2,1\n\
                   \"O\"\"Brien, Pat\", \"3\" ,400,1,0\n";
        let rows = read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].features["skills"], 5.0);
        assert_eq!(rows[0].features["experience"], 2.0);
        assert!(rows[0].successful);
        assert_eq!(rows[1].features["skills"], 3.0);
        assert!(!rows[1].successful);
    }

    #[test]
    fn test_split_fields() {
        assert_eq!(
            split_fields(r#"a,"b, c","say ""hi""",,"#).unwrap(),
            ["a", "b, c", r#"say "hi""#, "", ""]
        );
        assert!(split_fields(r#"a,"open"#).is_err());
    }

    #[test]
    fn test_unterminated_quote_reports_line() {
        let csv = "name,skills,budget,experience,hire\nbob,1,200,0,0\n\"Smith, John,5,1000,2,1\n";
        let err = read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").unwrap_err();
        assert!(matches!(err, HiringError::Dataset { line: 3, .. }));
    }

    #[test]
    fn test_missing_label_column() {
        let csv = "skills,budget,experience\n5,1000,2\n";
        let err = read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").unwrap_err();
        assert!(matches!(err, HiringError::Dataset { line: 1, .. }));
    }

    #[test]
    fn test_malformed_value_reports_line() {
        let csv = "skills,budget,experience,hire\n5,1000,2,1\n5,lots,2,0\n";
        let err = read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").unwrap_err();
        match err {
            HiringError::Dataset { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("budget"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_label_rejected() {
        let csv = "skills,budget,experience,hire\n5,1000,2,maybe\n";
        assert!(read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").is_err());
    }

    #[test]
    fn test_empty_cells_and_missing_columns_default_to_zero() {
        let csv = "skills,hire\n,1\n\n3,false\n";
        let rows = read_rows(Cursor::new(csv), &FeatureSchema::legacy(), "hire").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].features["skills"], 0.0);
        assert!(!rows[1].successful);
        assert!(!rows[1].features.contains_key("budget"));
    }

    #[test]
    fn test_write_then_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("training.csv");
        let schema = FeatureSchema::legacy();
        let rows = vec![
            TrainingRow::from_pairs([("skills", 5.0), ("budget", 1000.5), ("experience", 2.0)], true),
            TrainingRow::from_pairs([("skills", 1.0)], false),
        ];

        write_csv(&path, &rows, &schema).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("skills,budget,experience,hire\n"));

        let loaded = load_csv(&path, &schema).unwrap();
        assert_eq!(loaded[0], rows[0]);
        assert_eq!(loaded[1].features["budget"], 0.0);
    }
}
