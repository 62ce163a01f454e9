//! Grouping & rollup utilities.
//!
//! Given observations and a grouping key (date, month, or hour-of-day),
//! produce one aggregate row per distinct key. Rows with a null price are
//! excluded from sums and counts but still counted in the "observed hours"
//! totals where callers need occupancy metrics.
//!
//! Output ordering is lexical ascending on the grouping key; ISO date and
//! `YYYY-MM` month strings compare correctly lexically.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::analytics::{mean, round2};
use crate::domain::{month_key, PriceObservation};

/// Per-day price aggregate.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DailyPriceRow {
    pub date: NaiveDate,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// Priced hours that entered the aggregate (nulls excluded).
    pub hours: usize,
}

/// Per-month price aggregate with population volatility.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MonthlyPriceRow {
    pub month: String,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// Population standard deviation of hourly prices within the month.
    pub volatility: f64,
    pub hours: usize,
}

/// Fixed-slot hour-of-day aggregate (always 24 rows, hours 1..=24).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HourlyProfileRow {
    pub hour: u8,
    pub avg: f64,
    pub hours: usize,
}

/// Hour-of-day profile split into weekday vs weekend averages.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WeekdaySplitRow {
    pub hour: u8,
    pub weekday_avg: f64,
    pub weekend_avg: f64,
}

/// One month row of the month × hour heatmap.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HeatmapRow {
    pub month: String,
    /// Mean price per delivery hour 1..=24; `None` where the slot is empty.
    pub by_hour: Vec<Option<f64>>,
}

/// Per-date min/avg/max over non-null prices.
pub fn daily_price_stats(obs: &[PriceObservation]) -> Vec<DailyPriceRow> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for o in obs {
        if let Some(p) = o.price {
            by_date.entry(o.date).or_default().push(p);
        }
    }

    by_date
        .into_iter()
        .map(|(date, prices)| {
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = mean(&prices).unwrap_or(0.0);
            DailyPriceRow {
                date,
                min: round2(min),
                avg: round2(avg),
                max: round2(max),
                hours: prices.len(),
            }
        })
        .collect()
}

/// Per-month min/avg/max plus population std dev of hourly prices.
pub fn monthly_price_stats(obs: &[PriceObservation]) -> Vec<MonthlyPriceRow> {
    let mut by_month: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for o in obs {
        if let Some(p) = o.price {
            by_month.entry(month_key(o.date)).or_default().push(p);
        }
    }

    by_month
        .into_iter()
        .map(|(month, prices)| {
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = mean(&prices).unwrap_or(0.0);
            let var =
                prices.iter().map(|p| (p - avg).powi(2)).sum::<f64>() / prices.len() as f64;
            MonthlyPriceRow {
                month,
                min: round2(min),
                avg: round2(avg),
                max: round2(max),
                volatility: round2(var.sqrt()),
                hours: prices.len(),
            }
        })
        .collect()
}

/// Mean price per delivery hour, as a complete 24-slot profile.
///
/// Hours with zero observations get a zero row rather than being omitted, so
/// charts always have 24 categories. Hour-25 rows (DST fall-back) do not fit
/// the fixed profile and are skipped here; they still count in daily rollups.
pub fn avg_price_by_hour(obs: &[PriceObservation]) -> Vec<HourlyProfileRow> {
    let mut sums = [0.0f64; 24];
    let mut counts = [0usize; 24];
    for o in obs {
        if !(1..=24).contains(&o.hour) {
            continue;
        }
        if let Some(p) = o.price {
            let slot = (o.hour - 1) as usize;
            sums[slot] += p;
            counts[slot] += 1;
        }
    }

    (0..24)
        .map(|slot| HourlyProfileRow {
            hour: slot as u8 + 1,
            avg: if counts[slot] == 0 {
                0.0
            } else {
                round2(sums[slot] / counts[slot] as f64)
            },
            hours: counts[slot],
        })
        .collect()
}

/// 24-slot profile split by weekday vs weekend.
pub fn weekday_weekend_profile(obs: &[PriceObservation]) -> Vec<WeekdaySplitRow> {
    let mut wd_sums = [0.0f64; 24];
    let mut wd_counts = [0usize; 24];
    let mut we_sums = [0.0f64; 24];
    let mut we_counts = [0usize; 24];

    for o in obs {
        if !(1..=24).contains(&o.hour) {
            continue;
        }
        let Some(p) = o.price else { continue };
        let slot = (o.hour - 1) as usize;
        if matches!(o.date.weekday(), Weekday::Sat | Weekday::Sun) {
            we_sums[slot] += p;
            we_counts[slot] += 1;
        } else {
            wd_sums[slot] += p;
            wd_counts[slot] += 1;
        }
    }

    (0..24)
        .map(|slot| WeekdaySplitRow {
            hour: slot as u8 + 1,
            weekday_avg: if wd_counts[slot] == 0 {
                0.0
            } else {
                round2(wd_sums[slot] / wd_counts[slot] as f64)
            },
            weekend_avg: if we_counts[slot] == 0 {
                0.0
            } else {
                round2(we_sums[slot] / we_counts[slot] as f64)
            },
        })
        .collect()
}

/// Month × hour mean-price matrix for the heatmap view.
pub fn hourly_heatmap(obs: &[PriceObservation]) -> Vec<HeatmapRow> {
    let mut by_month: BTreeMap<String, ([f64; 24], [usize; 24])> = BTreeMap::new();
    for o in obs {
        if !(1..=24).contains(&o.hour) {
            continue;
        }
        let Some(p) = o.price else { continue };
        let slot = (o.hour - 1) as usize;
        let entry = by_month
            .entry(month_key(o.date))
            .or_insert(([0.0; 24], [0; 24]));
        entry.0[slot] += p;
        entry.1[slot] += 1;
    }

    by_month
        .into_iter()
        .map(|(month, (sums, counts))| HeatmapRow {
            month,
            by_hour: (0..24)
                .map(|slot| {
                    if counts[slot] == 0 {
                        None
                    } else {
                        Some(round2(sums[slot] / counts[slot] as f64))
                    }
                })
                .collect(),
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
    fn daily_stats_skip_null_prices() {
        let rows = daily_price_stats(&[
            obs(1, 1, Some(10.0)),
            obs(1, 2, None),
            obs(1, 3, Some(30.0)),
            obs(2, 1, Some(5.0)),
        ]);
        assert_eq!(rows.len(), 2);
        assert!((rows[0].min - 10.0).abs() < 1e-9);
        assert!((rows[0].avg - 20.0).abs() < 1e-9);
        assert!((rows[0].max - 30.0).abs() < 1e-9);
        assert_eq!(rows[0].hours, 2);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn hourly_profile_always_has_24_rows() {
        // Grouping completeness: even with zero input there are 24 categories.
        let empty = avg_price_by_hour(&[]);
        assert_eq!(empty.len(), 24);
        assert!(empty.iter().all(|r| r.avg == 0.0 && r.hours == 0));

        let partial = avg_price_by_hour(&[obs(1, 3, Some(50.0)), obs(2, 3, Some(70.0))]);
        assert_eq!(partial.len(), 24);
        assert_eq!(partial[2].hour, 3);
        assert!((partial[2].avg - 60.0).abs() < 1e-9);
        assert_eq!(partial[0].avg, 0.0);
    }

    #[test]
    fn hourly_profile_skips_dst_hour_25() {
        let rows = avg_price_by_hour(&[obs(1, 25, Some(99.0)), obs(1, 24, Some(10.0))]);
        assert_eq!(rows.len(), 24);
        assert!((rows[23].avg - 10.0).abs() < 1e-9);
        assert_eq!(rows[23].hours, 1);
    }

    #[test]
    fn monthly_volatility_is_population_std_dev() {
        let rows = monthly_price_stats(&[obs(1, 1, Some(10.0)), obs(1, 2, Some(30.0))]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].month, "2025-01");
        // Population std dev of {10, 30} is 10.
        assert!((rows[0].volatility - 10.0).abs() < 1e-9);
    }

    #[test]
    fn weekday_weekend_split() {
        // 2025-01-04 is a Saturday, 2025-01-06 a Monday.
        let rows = weekday_weekend_profile(&[
            obs(4, 1, Some(20.0)),
            obs(6, 1, Some(40.0)),
        ]);
        assert!((rows[0].weekend_avg - 20.0).abs() < 1e-9);
        assert!((rows[0].weekday_avg - 40.0).abs() < 1e-9);
    }

    #[test]
    fn heatmap_marks_empty_slots_as_none() {
        let rows = hourly_heatmap(&[obs(1, 1, Some(10.0))]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].by_hour.len(), 24);
        assert_eq!(rows[0].by_hour[0], Some(10.0));
        assert_eq!(rows[0].by_hour[1], None);
    }
}
