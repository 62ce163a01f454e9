//! Threshold & occupancy metrics.
//!
//! "Cheap hour" counting against a user-adjustable price threshold, plus the
//! global distribution summary shown on the stats cards.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::analytics::{round1, round2};
use crate::domain::{month_key, PriceObservation};

/// Per-day count of hours below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ThresholdDayRow {
    pub date: NaiveDate,
    /// Priced hours with `price < threshold`.
    pub count: usize,
    /// All observed hours for the date, priced or not. Legitimately differs
    /// from 24 on DST-transition days.
    pub total_hours: usize,
}

/// Global distribution summary over the filtered window.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PriceSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub hours_below: usize,
    /// Percentage of priced hours below the threshold, 1 decimal.
    pub pct_below: f64,
    pub negative_hours: usize,
    pub distinct_dates: usize,
    /// Priced hours that entered the distribution.
    pub hours: usize,
}

/// Per-month count of strictly-negative-price hours.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NegativeMonthRow {
    pub month: String,
    pub count: usize,
    pub total_hours: usize,
}

/// Per-day counts of hours with `price < threshold`.
pub fn hours_below_threshold(obs: &[PriceObservation], threshold: f64) -> Vec<ThresholdDayRow> {
    let mut by_date: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for o in obs {
        let entry = by_date.entry(o.date).or_insert((0, 0));
        entry.1 += 1;
        if o.price.is_some_and(|p| p < threshold) {
            entry.0 += 1;
        }
    }

    by_date
        .into_iter()
        .map(|(date, (count, total_hours))| ThresholdDayRow {
            date,
            count,
            total_hours,
        })
        .collect()
}

/// Global price distribution summary.
///
/// The median requires a full sort, O(n log n); per-dataset sizes are bounded
/// by one calendar year of hourly data (~8800 rows), so this is fine to run
/// on every filter change.
pub fn price_summary(obs: &[PriceObservation], threshold: f64) -> Option<PriceSummary> {
    let mut prices: Vec<f64> = obs.iter().filter_map(|o| o.price).collect();
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = prices.len();
    let median = if n % 2 == 0 {
        (prices[n / 2 - 1] + prices[n / 2]) / 2.0
    } else {
        prices[n / 2]
    };
    let mean = prices.iter().sum::<f64>() / n as f64;
    let hours_below = prices.iter().filter(|p| **p < threshold).count();
    let negative_hours = prices.iter().filter(|p| **p < 0.0).count();
    let distinct_dates: BTreeSet<NaiveDate> =
        obs.iter().filter(|o| o.price.is_some()).map(|o| o.date).collect();

    Some(PriceSummary {
        mean: round2(mean),
        median: round2(median),
        min: round2(prices[0]),
        max: round2(prices[n - 1]),
        hours_below,
        pct_below: round1(hours_below as f64 / n as f64 * 100.0),
        negative_hours,
        distinct_dates: distinct_dates.len(),
        hours: n,
    })
}

/// Per-month counts of strictly-negative-price hours.
pub fn negative_hours_by_month(obs: &[PriceObservation]) -> Vec<NegativeMonthRow> {
    let mut by_month: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for o in obs {
        let entry = by_month.entry(month_key(o.date)).or_insert((0, 0));
        entry.1 += 1;
        if o.price.is_some_and(|p| p < 0.0) {
            entry.0 += 1;
        }
    }

    by_month
        .into_iter()
        .map(|(month, (count, total_hours))| NegativeMonthRow {
            month,
            count,
            total_hours,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, hour: u8, price: Option<f64>) -> PriceObservation {
        PriceObservation {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            hour,
            price,
        }
    }

    #[test]
    fn threshold_day_counts_one_cheap_of_two_hours() {
        // Concrete scenario from the dashboard contract: two hours on one day,
        // one below a threshold of 20.
        let rows = hours_below_threshold(
            &[obs(1, 1, Some(10.0)), obs(1, 2, Some(30.0))],
            20.0,
        );
        assert_eq!(
            rows,
            vec![ThresholdDayRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                count: 1,
                total_hours: 2,
            }]
        );
    }

    #[test]
    fn null_prices_count_toward_total_hours_only() {
        let rows = hours_below_threshold(&[obs(1, 1, Some(5.0)), obs(1, 2, None)], 20.0);
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].total_hours, 2);
    }

    #[test]
    fn summary_median_even_and_odd() {
        let even = price_summary(
            &[
                obs(1, 1, Some(10.0)),
                obs(1, 2, Some(20.0)),
                obs(1, 3, Some(30.0)),
                obs(1, 4, Some(40.0)),
            ],
            25.0,
        )
        .unwrap();
        assert!((even.median - 25.0).abs() < 1e-9);
        assert_eq!(even.hours_below, 2);
        assert!((even.pct_below - 50.0).abs() < 1e-9);

        let odd = price_summary(
            &[obs(1, 1, Some(10.0)), obs(1, 2, Some(20.0)), obs(1, 3, Some(90.0))],
            25.0,
        )
        .unwrap();
        assert!((odd.median - 20.0).abs() < 1e-9);
    }

    #[test]
    fn summary_counts_negative_hours_and_dates() {
        let s = price_summary(
            &[
                obs(1, 1, Some(-5.0)),
                obs(1, 2, Some(15.0)),
                obs(2, 1, Some(25.0)),
                obs(3, 1, None),
            ],
            100.0,
        )
        .unwrap();
        assert_eq!(s.negative_hours, 1);
        assert_eq!(s.distinct_dates, 2);
        assert_eq!(s.hours, 3);
    }

    #[test]
    fn summary_of_all_null_input_is_none() {
        assert!(price_summary(&[obs(1, 1, None)], 10.0).is_none());
    }

    #[test]
    fn negative_hours_grouped_by_month() {
        let feb = PriceObservation {
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            hour: 1,
            price: Some(-1.0),
        };
        let rows = negative_hours_by_month(&[obs(1, 1, Some(-3.0)), obs(1, 2, Some(3.0)), feb]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2025-01");
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].total_hours, 2);
        assert_eq!(rows[1].count, 1);
    }
}
