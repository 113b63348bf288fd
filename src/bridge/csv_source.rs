// src/bridge/csv_source.rs
//! CSV export reader and writer

use crate::error::EmotiBitResult;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::info;

/// One CSV row; empty or missing cells are `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "EDA", default)]
    pub eda: Option<f64>,
    #[serde(rename = "HR", default)]
    pub heart_rate: Option<f64>,
    #[serde(rename = "HRV", default)]
    pub hrv: Option<f64>,
    #[serde(rename = "TEMP", default)]
    pub temperature: Option<f64>,
}

const SAMPLE_ROWS: [(f64, f64, f64, f64); 5] = [
    (0.25, 72.0, 48.0, 34.2),
    (0.30, 75.0, 45.0, 34.5),
    (0.35, 78.0, 42.0, 34.8),
    (0.28, 74.0, 46.0, 34.4),
    (0.32, 76.0, 44.0, 34.6),
];

/// CSV file with `EDA,HR,HRV,TEMP` columns
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write a five-row sample file if none exists. Returns whether it did.
    pub fn ensure_exists(&self) -> EmotiBitResult<bool> {
        if self.exists() {
            return Ok(false);
        }

        let mut writer = WriterBuilder::new().from_path(&self.path)?;
        for (eda, hr, hrv, temp) in SAMPLE_ROWS {
            writer.serialize(CsvRow {
                eda: Some(eda),
                heart_rate: Some(hr),
                hrv: Some(hrv),
                temperature: Some(temp),
            })?;
        }
        writer.flush()?;

        info!(path = %self.path.display(), "Created sample CSV file");
        Ok(true)
    }

    /// Last data row, `None` for a file with only a header
    pub fn read_latest(&self) -> EmotiBitResult<Option<CsvRow>> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_path(&self.path)?;

        let mut latest = None;
        for row in reader.deserialize::<CsvRow>() {
            latest = Some(row?);
        }
        Ok(latest)
    }

    /// Append one row, writing the header first when the file is new
    pub fn append(&self, row: &CsvRow) -> EmotiBitResult<()> {
        let is_new = !self.exists();
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmotiBitError;
    use tempfile::TempDir;

    fn source_in(dir: &TempDir) -> CsvSource {
        CsvSource::new(dir.path().join("emotibit_live.csv"))
    }

    #[test]
    fn test_sample_file_created_once() {
        let dir = TempDir::new().unwrap();
        let source = source_in(&dir);

        assert!(source.ensure_exists().unwrap());
        assert!(!source.ensure_exists().unwrap());

        let latest = source.read_latest().unwrap().unwrap();
        assert_eq!(latest.heart_rate, Some(76.0));
        assert_eq!(latest.eda, Some(0.32));

        let content = std::fs::read_to_string(source.path()).unwrap();
        assert!(content.starts_with("EDA,HR,HRV,TEMP"));
        assert_eq!(content.lines().count(), 6);
    }

    #[test]
    fn test_append_becomes_latest() {
        let dir = TempDir::new().unwrap();
        let source = source_in(&dir);
        source.ensure_exists().unwrap();

        let row = CsvRow {
            eda: Some(0.9),
            heart_rate: Some(110.0),
            hrv: Some(22.0),
            temperature: Some(35.5),
        };
        source.append(&row).unwrap();
        assert_eq!(source.read_latest().unwrap(), Some(row));
    }

    #[test]
    fn test_append_to_missing_file_writes_header() {
        let dir = TempDir::new().unwrap();
        let source = source_in(&dir);
        source.append(&CsvRow::default()).unwrap();

        let content = std::fs::read_to_string(source.path()).unwrap();
        assert!(content.starts_with("EDA,HR,HRV,TEMP"));
        assert_eq!(source.read_latest().unwrap(), Some(CsvRow::default()));
    }

    #[test]
    fn test_partial_columns_and_blank_cells() {
        let dir = TempDir::new().unwrap();
        let source = source_in(&dir);
        std::fs::write(source.path(), "HR,EDA,Extra\n70, 0.4,x\n81,,y\n").unwrap();

        let latest = source.read_latest().unwrap().unwrap();
        assert_eq!(latest.heart_rate, Some(81.0));
        assert_eq!(latest.eda, None);
        assert_eq!(latest.hrv, None);
    }

    #[test]
    fn test_header_only_and_bad_rows() {
        let dir = TempDir::new().unwrap();
        let source = source_in(&dir);

        std::fs::write(source.path(), "EDA,HR,HRV,TEMP\n").unwrap();
        assert_eq!(source.read_latest().unwrap(), None);

        std::fs::write(source.path(), "EDA,HR,HRV,TEMP\nlots,of,bad,data\n").unwrap();
        assert!(matches!(source.read_latest(), Err(EmotiBitError::Csv(_))));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(source_in(&dir).read_latest().is_err());
    }
}
