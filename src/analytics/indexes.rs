//! Peak/off-peak index rollups and year-over-year pivots.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;

use crate::analytics::{mean, round2};
use crate::domain::{month_key, IndexObservation, PriceObservation};

/// Monthly peak/off-peak averages and their spread.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PeakOffpeakRow {
    pub month: String,
    pub peak_avg: f64,
    pub offpeak_avg: f64,
    /// Mean of per-record `peak_load - offpeak_load`.
    pub spread_avg: f64,
}

/// Year-over-year pivot of monthly average prices.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct YearOverYearTable {
    /// Ascending list of years covered by the input.
    pub years: Vec<i32>,
    /// Twelve rows, month-of-year 1..=12.
    pub rows: Vec<YearOverYearRow>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct YearOverYearRow {
    pub month_of_year: u32,
    /// One slot per entry of `years`; `None` marks "no data" so rendering can
    /// distinguish it from a genuine zero price.
    pub by_year: Vec<Option<f64>>,
}

/// Per-month peak/off-peak averages; spread is averaged per record.
pub fn monthly_peak_offpeak(obs: &[IndexObservation]) -> Vec<PeakOffpeakRow> {
    let mut by_month: BTreeMap<String, (Vec<f64>, Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for o in obs {
        let entry = by_month.entry(month_key(o.date)).or_default();
        entry.0.push(o.peak_load);
        entry.1.push(o.offpeak_load);
        entry.2.push(o.peak_load - o.offpeak_load);
    }

    by_month
        .into_iter()
        .map(|(month, (peaks, offpeaks, spreads))| PeakOffpeakRow {
            month,
            peak_avg: round2(mean(&peaks).unwrap_or(0.0)),
            offpeak_avg: round2(mean(&offpeaks).unwrap_or(0.0)),
            spread_avg: round2(mean(&spreads).unwrap_or(0.0)),
        })
        .collect()
}

/// Pivot monthly average prices into a (month-of-year, year) table.
///
/// Missing (year, month) combinations keep a `None` marker rather than zero.
pub fn year_over_year(obs: &[PriceObservation]) -> YearOverYearTable {
    let mut sums: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();
    for o in obs {
        let Some(p) = o.price else { continue };
        years.insert(o.date.year());
        let entry = sums.entry((o.date.year(), o.date.month())).or_insert((0.0, 0));
        entry.0 += p;
        entry.1 += 1;
    }

    let years: Vec<i32> = years.into_iter().collect();
    let rows = (1..=12)
        .map(|month_of_year| YearOverYearRow {
            month_of_year,
            by_year: years
                .iter()
                .map(|year| {
                    sums.get(&(*year, month_of_year))
                        .map(|(sum, count)| round2(sum / *count as f64))
                })
                .collect(),
        })
        .collect();

    YearOverYearTable { years, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn peak_offpeak_spread_is_per_record() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let rows = monthly_peak_offpeak(&[
            IndexObservation { date: d(1), base_load: None, peak_load: 100.0, offpeak_load: 60.0 },
            IndexObservation { date: d(2), base_load: None, peak_load: 80.0, offpeak_load: 70.0 },
        ]);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].peak_avg - 90.0).abs() < 1e-9);
        assert!((rows[0].offpeak_avg - 65.0).abs() < 1e-9);
        // Mean of {40, 10}.
        assert!((rows[0].spread_avg - 25.0).abs() < 1e-9);
    }

    #[test]
    fn year_over_year_fills_missing_with_none() {
        let obs = vec![
            PriceObservation {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                hour: 1,
                price: Some(50.0),
            },
            PriceObservation {
                date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                hour: 1,
                price: Some(70.0),
            },
        ];
        let table = year_over_year(&obs);
        assert_eq!(table.years, vec![2024, 2025]);
        assert_eq!(table.rows.len(), 12);
        // January: 2024 has data, 2025 does not.
        assert_eq!(table.rows[0].by_year, vec![Some(50.0), None]);
        // February: only 2025.
        assert_eq!(table.rows[1].by_year, vec![None, Some(70.0)]);
        // March: neither.
        assert_eq!(table.rows[2].by_year, vec![None, None]);
    }

    #[test]
    fn year_over_year_averages_within_month() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let obs = vec![
            PriceObservation { date: d(1), hour: 1, price: Some(10.0) },
            PriceObservation { date: d(2), hour: 1, price: Some(30.0) },
        ];
        let table = year_over_year(&obs);
        assert_eq!(table.rows[0].by_year, vec![Some(20.0)]);
    }
}
