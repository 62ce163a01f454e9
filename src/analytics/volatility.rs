//! Percentile clipping for imbalance settlement prices.
//!
//! Settlement prices carry extreme single-hour spikes that would dominate any
//! per-day min/max chart. Daily summaries are therefore computed over values
//! clipped into the global `[p2, p98]` band:
//!
//! 1. first pass: percentile bounds over the ENTIRE filtered window
//! 2. second pass: clip each raw value, then group per day
//!
//! The bounds are global, never per-day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::analytics::{mean, round2};
use crate::domain::SettlementObservation;

/// Per-day clipped settlement aggregate.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DailyImbalanceRow {
    pub date: NaiveDate,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// `max - min` after clipping.
    pub spread: f64,
    pub hours: usize,
}

/// Values at the 2nd and 98th percentile by index `floor(n * p)` on the
/// ascending-sorted array.
///
/// An empty input yields `(-inf, +inf)` so that clipping becomes a no-op.
pub fn percentile_bounds(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let lo = (n as f64 * 0.02).floor() as usize;
    let hi = ((n as f64 * 0.98).floor() as usize).min(n - 1);
    (sorted[lo], sorted[hi])
}

/// Per-day min/avg/max/spread of settlement prices clipped into the global
/// `[p2, p98]` band.
pub fn daily_imbalance_stats(obs: &[SettlementObservation]) -> Vec<DailyImbalanceRow> {
    let all: Vec<f64> = obs.iter().filter_map(|o| o.settlement_price).collect();
    let (p2, p98) = percentile_bounds(&all);

    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for o in obs {
        if let Some(p) = o.settlement_price {
            by_date
                .entry(o.date)
                .or_default()
                .push(p.clamp(p2, p98));
        }
    }

    by_date
        .into_iter()
        .map(|(date, clipped)| {
            let min = clipped.iter().copied().fold(f64::INFINITY, f64::min);
            let max = clipped.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = mean(&clipped).unwrap_or(0.0);
            DailyImbalanceRow {
                date,
                min: round2(min),
                avg: round2(avg),
                max: round2(max),
                spread: round2(max - min),
                hours: clipped.len(),
            }
        })
        .collect()
}
