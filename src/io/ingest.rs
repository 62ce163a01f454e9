//! CSV ingest and normalization.
//!
//! Turns the scraped market CSVs into clean observation records that are safe
//! to aggregate.
//!
//! Design goals:
//! - **Strict schema** for required key fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden coercions)
//! - **Separation of concerns**: no aggregation logic here
//!
//! Rows missing `date` (or `hour` where applicable) are dropped; numeric
//! cells that are empty or unparseable become `None`, never NaN. The
//! aggregation layer never sees invalid shapes and does not re-validate.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{
    GasObservation, IndexObservation, PriceObservation, SettlementObservation, VolumeObservation,
};
use crate::error::AppError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized records + read/used counters + row errors.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Column aliases left over from older dataset versions.
///
/// Earlier extracts carried currency-suffixed headers (`price_eur`,
/// `settlement_price_czk`, ...). The loader unifies on the canonical names
/// here instead of keeping parallel code paths per schema version.
fn canonical_column(name: &str) -> &str {
    match name {
        "price_eur" | "price_czk" => "price",
        "cost_eur" | "cost_czk" => "cost",
        "settlement_price_eur" | "settlement_price_czk" => "settlement_price",
        "counter_price_eur" | "counter_price_czk" => "counter_price",
        "base_load_eur" | "base_load_czk" => "base_load",
        "peak_load_eur" | "peak_load_czk" => "peak_load",
        "offpeak_load_eur" | "offpeak_load_czk" => "offpeak_load",
        "index_ote_eur" | "index_ote_czk" => "index_ote",
        other => other,
    }
}

/// Hourly market prices: `date, hour, price, ...`.
pub fn parse_price_csv(input: impl Read, label: &str) -> Result<Ingested<PriceObservation>, AppError> {
    parse_csv(input, label, &["date", "hour"], |record, header_map| {
        Ok(PriceObservation {
            date: parse_date(get_required(record, header_map, "date")?)?,
            hour: parse_hour(get_required(record, header_map, "hour")?)?,
            price: parse_opt_f64(get_optional(record, header_map, "price")),
        })
    })
}

/// Regulation energy: `date, hour, volume_mwh, cost`.
pub fn parse_volume_csv(input: impl Read, label: &str) -> Result<Ingested<VolumeObservation>, AppError> {
    parse_csv(input, label, &["date", "hour"], |record, header_map| {
        Ok(VolumeObservation {
            date: parse_date(get_required(record, header_map, "date")?)?,
            hour: parse_hour(get_required(record, header_map, "hour")?)?,
            volume: parse_opt_f64(get_optional(record, header_map, "volume_mwh")),
            cost: parse_opt_f64(get_optional(record, header_map, "cost")),
        })
    })
}

/// Imbalance settlement: `date, hour, ..., settlement_price, counter_price`.
pub fn parse_settlement_csv(
    input: impl Read,
    label: &str,
) -> Result<Ingested<SettlementObservation>, AppError> {
    parse_csv(input, label, &["date", "hour"], |record, header_map| {
        Ok(SettlementObservation {
            date: parse_date(get_required(record, header_map, "date")?)?,
            hour: parse_hour(get_required(record, header_map, "hour")?)?,
            settlement_price: parse_opt_f64(get_optional(record, header_map, "settlement_price")),
        })
    })
}

/// Daily gas spot prices: `date, price, ...`.
pub fn parse_gas_csv(input: impl Read, label: &str) -> Result<Ingested<GasObservation>, AppError> {
    parse_csv(input, label, &["date"], |record, header_map| {
        Ok(GasObservation {
            date: parse_date(get_required(record, header_map, "date")?)?,
            price: parse_opt_f64(get_optional(record, header_map, "price")),
        })
    })
}

/// Daily DAM indexes: `date, base_load, peak_load, offpeak_load`.
pub fn parse_index_csv(input: impl Read, label: &str) -> Result<Ingested<IndexObservation>, AppError> {
    parse_csv(
        input,
        label,
        &["date", "peak_load", "offpeak_load"],
        |record, header_map| {
            let peak_load = parse_opt_f64(get_optional(record, header_map, "peak_load"))
                .ok_or_else(|| "Missing/invalid `peak_load` value.".to_string())?;
            let offpeak_load = parse_opt_f64(get_optional(record, header_map, "offpeak_load"))
                .ok_or_else(|| "Missing/invalid `offpeak_load` value.".to_string())?;
            Ok(IndexObservation {
                date: parse_date(get_required(record, header_map, "date")?)?,
                base_load: parse_opt_f64(get_optional(record, header_map, "base_load")),
                peak_load,
                offpeak_load,
            })
        },
    )
}

fn parse_csv<T>(
    input: impl Read,
    label: &str,
    required_columns: &[&str],
    parse_row: impl Fn(&StringRecord, &HashMap<String, usize>) -> Result<T, String>,
) -> Result<Ingested<T>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read {label} CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in required_columns {
        if !header_map.contains_key(*column) {
            return Err(AppError::usage(format!(
                "{label}: missing required column `{column}`."
            )));
        }
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(obs) => records.push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = records.len();
    Ok(Ingested {
        records,
        rows_read,
        rows_used,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿date"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    canonical_column(&name.to_ascii_lowercase()).to_string()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{s}'. Expected YYYY-MM-DD."))
}

fn parse_hour(s: &str) -> Result<u8, String> {
    let hour: u8 = s
        .parse()
        .map_err(|_| format!("Invalid hour '{s}'. Expected an integer."))?;
    // Hour 25 occurs on DST fall-back days.
    if (1..=25).contains(&hour) {
        Ok(hour)
    } else {
        Err(format!("Hour {hour} out of range [1, 25]."))
    }
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_csv_parses_and_drops_bad_rows() {
        let csv = "date,hour,price,volume_mwh\n\
                   2025-01-01,1,50.5,100\n\
                   2025-01-01,2,,100\n\
                   not-a-date,3,10,100\n\
                   2025-01-01,26,10,100\n";
        let out = parse_price_csv(csv.as_bytes(), "dam_prices").unwrap();
        assert_eq!(out.rows_read, 4);
        assert_eq!(out.rows_used, 2);
        assert_eq!(out.row_errors.len(), 2);
        assert_eq!(out.row_errors[0].line, 4);
        assert!((out.records[0].price.unwrap() - 50.5).abs() < 1e-12);
        // Empty price cell becomes None, not an error.
        assert_eq!(out.records[1].price, None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let err = parse_price_csv("date,price\n2025-01-01,5\n".as_bytes(), "dam_prices")
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn legacy_currency_suffixed_headers_are_unified() {
        let csv = "date,hour,price_eur\n2025-01-01,1,42.0\n";
        let out = parse_price_csv(csv.as_bytes(), "dam_prices").unwrap();
        assert!((out.records[0].price.unwrap() - 42.0).abs() < 1e-12);

        let csv = "date,hour,settlement_price_czk\n2025-01-01,1,-120.5\n";
        let out = parse_settlement_csv(csv.as_bytes(), "imbalances").unwrap();
        assert!((out.records[0].settlement_price.unwrap() - -120.5).abs() < 1e-12);
    }

    #[test]
    fn bom_prefixed_header_is_stripped() {
        let csv = "\u{feff}date,hour,price\n2025-01-01,1,10\n";
        let out = parse_price_csv(csv.as_bytes(), "dam_prices").unwrap();
        assert_eq!(out.rows_used, 1);
    }

    #[test]
    fn dst_hour_25_is_accepted() {
        let csv = "date,hour,price\n2025-10-26,25,30\n";
        let out = parse_price_csv(csv.as_bytes(), "dam_prices").unwrap();
        assert_eq!(out.records[0].hour, 25);
    }

    #[test]
    fn gas_csv_is_daily_keyed() {
        let csv = "date,price,volume_mwh,index_ote\n2025-01-01,35.2,1000,34.9\n2025-01-02,,900,\n";
        let out = parse_gas_csv(csv.as_bytes(), "gas_prices").unwrap();
        assert_eq!(out.rows_used, 2);
        assert_eq!(out.records[1].price, None);
    }

    #[test]
    fn volume_csv_keeps_cost_sign() {
        let csv = "date,hour,volume_mwh,cost\n2025-01-01,1,-12.5,-480.0\n";
        let out = parse_volume_csv(csv.as_bytes(), "re_negative").unwrap();
        assert!((out.records[0].volume.unwrap() - -12.5).abs() < 1e-12);
        assert!((out.records[0].cost.unwrap() - -480.0).abs() < 1e-12);
    }

    #[test]
    fn index_csv_requires_peak_and_offpeak() {
        let csv = "date,base_load,peak_load,offpeak_load\n2025-01-01,80,95.5,60.25\n2025-01-02,80,,60\n";
        let out = parse_index_csv(csv.as_bytes(), "dam_indexes").unwrap();
        assert_eq!(out.rows_used, 1);
        assert_eq!(out.row_errors.len(), 1);
        assert!((out.records[0].peak_load - 95.5).abs() < 1e-12);
    }
}
