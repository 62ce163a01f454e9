//! Time-series utilities: trailing moving averages and cumulative series.

use chrono::NaiveDate;

use crate::analytics::round2;
use crate::analytics::threshold::hours_below_threshold;
use crate::domain::PriceObservation;

/// A dated point of a cumulative series.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CumulativeRow {
    pub date: NaiveDate,
    /// The day's own contribution.
    pub daily: f64,
    /// Running total up to and including this date.
    pub cumulative: f64,
}

/// Trailing moving average over `window` periods.
///
/// Each element is the arithmetic mean of itself and up to `window - 1`
/// predecessors. The window clamps to the available prefix: it never looks
/// ahead and never wraps, so `out[0] == values[0]` and `out[window - 1]` is
/// the mean of the first `window` elements.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(values.len());
    let mut running = 0.0f64;
    for i in 0..values.len() {
        running += values[i];
        if i >= window {
            running -= values[i - window];
        }
        let len = (i + 1).min(window);
        out.push(round2(running / len as f64));
    }
    out
}

/// Chronological running sum of per-day below-threshold hour counts.
///
/// Inputs are keyed by `(date, hour)` internally so the running total
/// accumulates in chronological order regardless of input order. The output
/// is non-decreasing by construction.
pub fn cumulative_cheap_hours(obs: &[PriceObservation], threshold: f64) -> Vec<CumulativeRow> {
    // `hours_below_threshold` already emits one sorted row per date.
    let daily = hours_below_threshold(obs, threshold);
    let mut total = 0.0f64;
    daily
        .into_iter()
        .map(|row| {
            total += row.count as f64;
            CumulativeRow {
                date: row.date,
                daily: row.count as f64,
                cumulative: total,
            }
        })
        .collect()
}

/// Chronological running sum over pre-computed `(date, contribution)` pairs.
///
/// Used for the spark-spread savings accumulation; input order does not
/// matter, output is sorted by date.
pub fn cumulative_sum(mut contributions: Vec<(NaiveDate, f64)>) -> Vec<CumulativeRow> {
    contributions.sort_by_key(|(date, _)| *date);
    let mut total = 0.0f64;
    contributions
        .into_iter()
        .map(|(date, daily)| {
            total += daily;
            CumulativeRow {
                date,
                daily: round2(daily),
                cumulative: round2(total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_clamps_to_prefix() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let ma = moving_average(&values, 7);
        // First element's window is just itself.
        assert!((ma[0] - 1.0).abs() < 1e-9);
        // Seventh element covers elements 1..=7 exactly.
        assert!((ma[6] - 4.0).abs() < 1e-9);
        // Eighth element covers elements 2..=8.
        assert!((ma[7] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn moving_average_never_looks_ahead() {
        let ma = moving_average(&[10.0, 0.0], 7);
        assert!((ma[0] - 10.0).abs() < 1e-9);
        assert!((ma[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn cumulative_cheap_hours_is_non_decreasing() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        // Deliberately shuffled input order.
        let obs = vec![
            PriceObservation { date: d(3), hour: 1, price: Some(5.0) },
            PriceObservation { date: d(1), hour: 1, price: Some(5.0) },
            PriceObservation { date: d(2), hour: 1, price: Some(50.0) },
            PriceObservation { date: d(1), hour: 2, price: Some(6.0) },
        ];
        let rows = cumulative_cheap_hours(&obs, 10.0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, d(1));
        assert!((rows[0].cumulative - 2.0).abs() < 1e-9);
        assert!((rows[1].cumulative - 2.0).abs() < 1e-9);
        assert!((rows[2].cumulative - 3.0).abs() < 1e-9);
        for pair in rows.windows(2) {
            assert!(pair[1].cumulative >= pair[0].cumulative);
        }
    }

    #[test]
    fn cumulative_sum_sorts_chronologically() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let rows = cumulative_sum(vec![(d(2), -1.5), (d(1), 2.0)]);
        assert_eq!(rows[0].date, d(1));
        assert!((rows[0].cumulative - 2.0).abs() < 1e-9);
        assert!((rows[1].cumulative - 0.5).abs() < 1e-9);
    }
}
