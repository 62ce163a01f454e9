//! Cross-dataset join: day-ahead vs intraday daily spread.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::analytics::{mean, round2};
use crate::domain::{HourKey, PriceObservation};

/// Daily DAM/IM means and their spread, for dates covered by both datasets.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DamImSpreadRow {
    pub date: NaiveDate,
    pub dam_avg: f64,
    pub im_avg: f64,
    /// `im_avg - dam_avg`.
    pub spread: f64,
}

/// Per-day DAM vs IM mean prices and spread.
///
/// A lookup from `HourKey` to price is built for each side (last-write-wins
/// on duplicate `(date, hour)` rows), then only dates present in BOTH
/// datasets with at least one priced hour produce a row. Partial-coverage
/// days are silently excluded rather than yielding a misleading average —
/// no interpolation, no error.
pub fn dam_vs_im_spread(dam: &[PriceObservation], im: &[PriceObservation]) -> Vec<DamImSpreadRow> {
    let dam_lookup = price_lookup(dam);
    let im_lookup = price_lookup(im);

    let mut by_date: BTreeMap<NaiveDate, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (key, dam_price) in &dam_lookup {
        if let Some(im_price) = im_lookup.get(key) {
            let entry = by_date.entry(key.date).or_default();
            entry.0.push(*dam_price);
            entry.1.push(*im_price);
        }
    }

    by_date
        .into_iter()
        .filter_map(|(date, (dam_prices, im_prices))| {
            let dam_avg = mean(&dam_prices)?;
            let im_avg = mean(&im_prices)?;
            Some(DamImSpreadRow {
                date,
                dam_avg: round2(dam_avg),
                im_avg: round2(im_avg),
                spread: round2(im_avg - dam_avg),
            })
        })
        .collect()
}

fn price_lookup(obs: &[PriceObservation]) -> HashMap<HourKey, f64> {
    let mut lookup = HashMap::with_capacity(obs.len());
    for o in obs {
        if let Some(p) = o.price {
            lookup.insert(HourKey::new(o.date, o.hour), p);
        }
    }
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, hour: u8, price: f64) -> PriceObservation {
        PriceObservation {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            hour,
            price: Some(price),
        }
    }

    #[test]
    fn dates_on_one_side_only_are_excluded() {
        let dam = vec![obs(1, 1, 10.0), obs(2, 1, 20.0)];
        let im = vec![obs(1, 1, 15.0), obs(3, 1, 30.0)];
        let rows = dam_vs_im_spread(&dam, &im);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!((rows[0].spread - 5.0).abs() < 1e-9);
    }

    #[test]
    fn spread_uses_matching_hours_only() {
        // Hour 2 exists only in DAM; it must not skew either mean.
        let dam = vec![obs(1, 1, 10.0), obs(1, 2, 1000.0)];
        let im = vec![obs(1, 1, 14.0)];
        let rows = dam_vs_im_spread(&dam, &im);
        assert!((rows[0].dam_avg - 10.0).abs() < 1e-9);
        assert!((rows[0].im_avg - 14.0).abs() < 1e-9);
        assert!((rows[0].spread - 4.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_hour_rows_last_write_wins() {
        let dam = vec![obs(1, 1, 10.0), obs(1, 1, 50.0)];
        let im = vec![obs(1, 1, 60.0)];
        let rows = dam_vs_im_spread(&dam, &im);
        assert!((rows[0].dam_avg - 50.0).abs() < 1e-9);
    }
}
