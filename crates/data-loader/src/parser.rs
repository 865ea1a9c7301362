//! Parser for the reference crop dataset.
//!
//! The dataset is a comma-separated file with a header row:
//! `N,P,K,temperature,humidity,ph,rainfall,label`
//!
//! Columns are located by header name, so their order in the file does not
//! matter. The `label` column is optional.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs;
use std::path::Path;

/// Header name of the optional crop label column
const LABEL_COLUMN: &str = "label";

/// Where each feature (and the label) lives in a data row
#[derive(Debug)]
struct ColumnLayout {
    feature_columns: [usize; FEATURE_COUNT],
    label_column: Option<usize>,
    width: usize,
}

/// Parse the reference dataset at `path`
pub fn parse_reference_dataset(path: &Path) -> Result<Vec<ReferenceRecord>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_reference_str(&content, &file_name)
}

/// Parse reference data already held in memory.
///
/// `file_name` is only used to give errors some context.
pub fn parse_reference_str(content: &str, file_name: &str) -> Result<Vec<ReferenceRecord>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines.next().ok_or_else(|| DataLoadError::EmptyDataset {
        file: file_name.to_string(),
    })?;
    let layout = parse_header(header, file_name)?;

    let mut records = Vec::new();
    for (line_no, line) in lines {
        records.push(parse_record(line, line_no, &layout, file_name)?);
    }

    if records.is_empty() {
        return Err(DataLoadError::EmptyDataset {
            file: file_name.to_string(),
        });
    }

    Ok(records)
}

/// Locate every feature column (and the optional label) in the header
fn parse_header(header: &str, file_name: &str) -> Result<ColumnLayout> {
    let names: Vec<&str> = header.split(',').map(str::trim).collect();

    let mut feature_columns = [0usize; FEATURE_COUNT];
    for feature in Feature::ALL {
        feature_columns[feature.index()] = names
            .iter()
            .position(|name| *name == feature.column_name())
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: file_name.to_string(),
                column: feature.column_name().to_string(),
            })?;
    }

    let label_column = names.iter().position(|name| *name == LABEL_COLUMN);

    Ok(ColumnLayout {
        feature_columns,
        label_column,
        width: names.len(),
    })
}

/// Parse one data row according to the header layout
fn parse_record(
    line: &str,
    line_no: usize,
    layout: &ColumnLayout,
    file_name: &str,
) -> Result<ReferenceRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != layout.width {
        return Err(DataLoadError::FieldCountMismatch {
            expected: layout.width,
            found: fields.len(),
            line: line_no,
        });
    }

    let mut values = [0.0f64; FEATURE_COUNT];
    for feature in Feature::ALL {
        let raw = fields[layout.feature_columns[feature.index()]];
        let value: f64 = raw.parse().map_err(|e| DataLoadError::ParseError {
            file: file_name.to_string(),
            line: line_no,
            reason: format!("Invalid {}: {}", feature.column_name(), e),
        })?;
        if !value.is_finite() {
            return Err(DataLoadError::ParseError {
                file: file_name.to_string(),
                line: line_no,
                reason: format!("Non-finite {}: {}", feature.column_name(), raw),
            });
        }
        values[feature.index()] = value;
    }

    let [nitrogen, phosphorus, potassium, temperature, humidity, ph, rainfall] = values;
    let label = layout
        .label_column
        .map(|column| fields[column].to_string())
        .filter(|label| !label.is_empty());

    Ok(ReferenceRecord {
        features: FeatureVector::new(
            nitrogen, phosphorus, potassium, temperature, humidity, ph, rainfall,
        ),
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_layout() {
        let content = "N,P,K,temperature,humidity,ph,rainfall,label\n\
                       90,42,43,20.8,82.0,6.5,202.9,rice\n\
                       \n\
                       85,58,41,21.7,80.3,7.0,226.6,rice\n";
        let records = parse_reference_str(content, "crop_data.csv").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].features.get(Feature::Nitrogen), 90.0);
        assert_eq!(records[1].features.get(Feature::Rainfall), 226.6);
        assert_eq!(records[0].label.as_deref(), Some("rice"));
    }

    #[test]
    fn test_parse_reordered_columns_without_label() {
        let content = "rainfall,ph,humidity,temperature,K,P,N\n\
                       200,6.5,80,25,40,41,90\n";
        let records = parse_reference_str(content, "shuffled.csv").unwrap();

        let features = records[0].features;
        assert_eq!(features.as_array(), &[90.0, 41.0, 40.0, 25.0, 80.0, 6.5, 200.0]);
        assert_eq!(records[0].label, None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let content = "N,P,K,temperature,humidity,rainfall\n1,2,3,4,5,6\n";
        let err = parse_reference_str(content, "broken.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "ph"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let content = "N,P,K,temperature,humidity,ph,rainfall\n\
                       1,2,3,4,5,6,7\n\
                       1,2,x,4,5,6,7\n";
        let err = parse_reference_str(content, "broken.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_field_count_mismatch() {
        let content = "N,P,K,temperature,humidity,ph,rainfall\n1,2,3\n";
        let err = parse_reference_str(content, "short.csv").unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::FieldCountMismatch { expected: 7, found: 3, line: 2 }
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let content = "N,P,K,temperature,humidity,ph,rainfall\n";
        let err = parse_reference_str(content, "empty.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::EmptyDataset { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_reference_dataset(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
