//! Regulation-energy revenue model.
//!
//! For negative regulation energy the record direction is encoded in the
//! sign of `cost`: negative cost is revenue to the consuming party, positive
//! cost is an expense. Volumes are accumulated as absolute values.

use std::collections::BTreeMap;

use crate::analytics::round2;
use crate::domain::{month_key, VolumeObservation};

/// Monthly revenue/expense rollup for regulation energy.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MonthlyRegulationRow {
    pub month: String,
    /// Total absorbed volume, MWh (sum of |volume|).
    pub volume: f64,
    /// Absolute value of negative costs.
    pub revenue: f64,
    /// Sum of positive costs.
    pub expense: f64,
    /// `revenue - expense`.
    pub net_revenue: f64,
    /// Realized price `revenue / volume`, 0 when volume is zero.
    pub avg_price: f64,
}

/// Fixed-slot hourly volume rollup (always 24 rows).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HourlyVolumeRow {
    pub hour: u8,
    /// Sum of |volume| for this hour-of-day across the whole window.
    pub volume: f64,
}

/// Monthly regulation-energy revenue rollup.
pub fn monthly_regulation_revenue(obs: &[VolumeObservation]) -> Vec<MonthlyRegulationRow> {
    let mut by_month: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
    for o in obs {
        let entry = by_month.entry(month_key(o.date)).or_insert((0.0, 0.0, 0.0));
        if let Some(v) = o.volume {
            entry.0 += v.abs();
        }
        if let Some(c) = o.cost {
            if c < 0.0 {
                entry.1 += -c;
            } else {
                entry.2 += c;
            }
        }
    }

    by_month
        .into_iter()
        .map(|(month, (volume, revenue, expense))| {
            let avg_price = if volume > 0.0 { revenue / volume } else { 0.0 };
            MonthlyRegulationRow {
                month,
                volume: round2(volume),
                revenue: round2(revenue),
                expense: round2(expense),
                net_revenue: round2(revenue - expense),
                avg_price: round2(avg_price),
            }
        })
        .collect()
}

/// Absorbed volume per hour-of-day over the whole filtered window.
///
/// Shows when excess-energy events cluster. Always emits 24 slots; hour-25
/// rows (DST fall-back) are folded out of the fixed profile like everywhere
/// else.
pub fn hourly_regulation_volume(obs: &[VolumeObservation]) -> Vec<HourlyVolumeRow> {
    let mut sums = [0.0f64; 24];
    for o in obs {
        if !(1..=24).contains(&o.hour) {
            continue;
        }
        if let Some(v) = o.volume {
            sums[(o.hour - 1) as usize] += v.abs();
        }
    }

    (0..24)
        .map(|slot| HourlyVolumeRow {
            hour: slot as u8 + 1,
            volume: round2(sums[slot]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(day: u32, hour: u8, volume: Option<f64>, cost: Option<f64>) -> VolumeObservation {
        VolumeObservation {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            hour,
            volume,
            cost,
        }
    }

    #[test]
    fn cost_sign_splits_revenue_and_expense() {
        let rows = monthly_regulation_revenue(&[
            obs(1, 1, Some(-10.0), Some(-500.0)),
            obs(1, 2, Some(5.0), Some(200.0)),
        ]);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].volume - 15.0).abs() < 1e-9);
        assert!((rows[0].revenue - 500.0).abs() < 1e-9);
        assert!((rows[0].expense - 200.0).abs() < 1e-9);
        assert!((rows[0].net_revenue - 300.0).abs() < 1e-9);
        // 500 revenue over 15 MWh.
        assert!((rows[0].avg_price - round2(500.0 / 15.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_volume_guards_avg_price() {
        let rows = monthly_regulation_revenue(&[obs(1, 1, None, Some(-100.0))]);
        assert!((rows[0].avg_price - 0.0).abs() < 1e-12);
        assert!((rows[0].revenue - 100.0).abs() < 1e-9);
    }

    #[test]
    fn hourly_volume_has_fixed_slots() {
        let rows = hourly_regulation_volume(&[
            obs(1, 5, Some(-2.0), None),
            obs(2, 5, Some(3.0), None),
        ]);
        assert_eq!(rows.len(), 24);
        assert!((rows[4].volume - 5.0).abs() < 1e-9);
        assert!((rows[0].volume - 0.0).abs() < 1e-12);
    }
}
