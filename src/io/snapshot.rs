//! Read/write summary snapshot JSON files.
//!
//! The snapshot is the "portable" representation of one analyzed window:
//! - run metadata (currency, window, threshold, spark policy)
//! - the global price summary
//! - monthly rollups (prices, spark spread, regulation revenue)
//!
//! It can be archived or diffed between runs without re-loading the CSVs.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::regulation::MonthlyRegulationRow;
use crate::analytics::rollup::MonthlyPriceRow;
use crate::analytics::spark::MonthlySparkRow;
use crate::analytics::threshold::PriceSummary;
use crate::domain::{Currency, SparkPolicy};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotFile {
    pub tool: String,
    pub currency: Currency,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub threshold: f64,
    pub policy: SparkPolicy,
    pub summary: Option<PriceSummary>,
    pub monthly_prices: Vec<MonthlyPriceRow>,
    pub monthly_spark: Vec<MonthlySparkRow>,
    pub monthly_regulation: Vec<MonthlyRegulationRow>,
}

/// Write a snapshot JSON file.
pub fn write_snapshot_json(path: &Path, snapshot: &SnapshotFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::runtime(format!("Failed to create snapshot JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, snapshot)
        .map_err(|e| AppError::runtime(format!("Failed to write snapshot JSON: {e}")))
}

/// Minimal deserialized view of a snapshot, for downstream comparisons.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotHeader {
    pub tool: String,
    pub currency: Currency,
    pub threshold: f64,
}

/// Read back the header fields of a snapshot JSON file.
pub fn read_snapshot_header(path: &Path) -> Result<SnapshotHeader, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::runtime(format!("Failed to open snapshot JSON '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::runtime(format!("Failed to parse snapshot JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_reads_back_from_written_snapshot() {
        let snapshot = SnapshotFile {
            tool: "ote".to_string(),
            currency: Currency::Czk,
            from: None,
            to: None,
            threshold: 1500.0,
            policy: SparkPolicy::for_currency(Currency::Czk),
            summary: None,
            monthly_prices: Vec::new(),
            monthly_spark: Vec::new(),
            monthly_regulation: Vec::new(),
        };

        let dir = std::env::temp_dir().join("ote-snapshot-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("snapshot.json");
        write_snapshot_json(&path, &snapshot).unwrap();

        let header = read_snapshot_header(&path).unwrap();
        assert_eq!(header.tool, "ote");
        assert_eq!(header.currency, Currency::Czk);
        assert!((header.threshold - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn filesystem_failures_are_runtime_errors() {
        let path = std::path::Path::new("/nonexistent-ote-snapshot/snap.json");
        let err = read_snapshot_header(path).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
