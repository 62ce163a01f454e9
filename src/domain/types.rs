//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation
//! - exported to JSON/CSV
//! - reloaded later for comparisons
//!
//! All observation records are immutable values: the loader creates them, the
//! aggregation engine reads them, and every derived series is a fresh allocation.

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which currency file set to load.
///
/// The selector changes which source directory is read and which fixed
/// `retail_adder` default applies in the spark-spread model; it does not
/// change any aggregation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Eur,
    Czk,
}

impl Currency {
    /// Directory name under the data root (`eur/` or `czk/`).
    pub fn dir_name(self) -> &'static str {
        match self {
            Currency::Eur => "eur",
            Currency::Czk => "czk",
        }
    }

    /// Uppercase label for table headers and axis labels.
    pub fn label(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Czk => "CZK",
        }
    }

    /// Default retail adder for gas heating cost, per MWh.
    ///
    /// Captures fixed distribution/capacity charges not present in the
    /// wholesale gas price. The CZK value is the EUR value at the long-run
    /// 25 CZK/EUR rate used by the extraction pipeline.
    pub fn default_retail_adder(self) -> f64 {
        match self {
            Currency::Eur => 40.0,
            Currency::Czk => 1000.0,
        }
    }
}

// clap needs Display to render the default value in --help.
impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Composite join key for hourly datasets.
///
/// All hourly datasets share `(date, hour)` as their identity; daily datasets
/// (gas, indexes) join on `date` alone. A typed key avoids the string-format
/// edge cases of `"date-hour"` concatenation (leading zeros, separators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourKey {
    pub date: NaiveDate,
    pub hour: u8,
}

impl HourKey {
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Self { date, hour }
    }
}

/// One hour's market price (DAM or IM).
///
/// `hour` is a 1-based delivery hour. DST-transition days legitimately hold
/// 23 or 25 distinct hour values for a single date; nothing downstream may
/// assume exactly 24 rows per date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub hour: u8,
    pub price: Option<f64>,
}

/// One hour of regulation energy.
///
/// Sign of `cost` encodes direction: negative cost is revenue to the
/// consuming party, positive cost is an expense.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeObservation {
    pub date: NaiveDate,
    pub hour: u8,
    pub volume: Option<f64>,
    pub cost: Option<f64>,
}

/// One hour of grid-imbalance settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementObservation {
    pub date: NaiveDate,
    pub hour: u8,
    pub settlement_price: Option<f64>,
}

/// One day's DAM base/peak/offpeak indexes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexObservation {
    pub date: NaiveDate,
    pub base_load: Option<f64>,
    pub peak_load: f64,
    pub offpeak_load: f64,
}

/// One day's gas spot price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasObservation {
    pub date: NaiveDate,
    pub price: Option<f64>,
}

/// The full set of loaded datasets for one currency.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub dam: Vec<PriceObservation>,
    pub im: Vec<PriceObservation>,
    pub re_positive: Vec<VolumeObservation>,
    pub re_negative: Vec<VolumeObservation>,
    pub imbalances: Vec<SettlementObservation>,
    pub gas: Vec<GasObservation>,
    pub indexes: Vec<IndexObservation>,
}

impl MarketData {
    /// Restrict every dataset to `[from, to]` (inclusive, either side open).
    ///
    /// Records live for the duration of one filtered view; a new window
    /// produces a fresh `MarketData` and all derived series are recomputed.
    pub fn filter_range(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> MarketData {
        let keep = |d: NaiveDate| from.is_none_or(|f| d >= f) && to.is_none_or(|t| d <= t);
        MarketData {
            dam: self.dam.iter().copied().filter(|o| keep(o.date)).collect(),
            im: self.im.iter().copied().filter(|o| keep(o.date)).collect(),
            re_positive: self
                .re_positive
                .iter()
                .copied()
                .filter(|o| keep(o.date))
                .collect(),
            re_negative: self
                .re_negative
                .iter()
                .copied()
                .filter(|o| keep(o.date))
                .collect(),
            imbalances: self
                .imbalances
                .iter()
                .copied()
                .filter(|o| keep(o.date))
                .collect(),
            gas: self.gas.iter().copied().filter(|o| keep(o.date)).collect(),
            indexes: self
                .indexes
                .iter()
                .copied()
                .filter(|o| keep(o.date))
                .collect(),
        }
    }

    /// Overall date span across the hourly price datasets.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut min = None;
        let mut max = None;
        for d in self
            .dam
            .iter()
            .map(|o| o.date)
            .chain(self.im.iter().map(|o| o.date))
        {
            min = Some(min.map_or(d, |m: NaiveDate| m.min(d)));
            max = Some(max.map_or(d, |m: NaiveDate| m.max(d)));
        }
        min.zip(max)
    }
}

/// Policy parameters for the spark-spread economic model.
///
/// These are passed into the model functions explicitly (never read from
/// module-level constants) so alternate policies are testable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparkPolicy {
    /// Hours per day the flexible load is assumed to run.
    pub charging_hours: usize,
    /// Combustion efficiency of the reference gas boiler (< 1).
    pub boiler_efficiency: f64,
    /// Fixed per-MWh adder on the wholesale gas price (currency-dependent).
    pub retail_adder: f64,
}

impl SparkPolicy {
    pub fn for_currency(currency: Currency) -> Self {
        Self {
            charging_hours: 8,
            boiler_efficiency: 0.90,
            retail_adder: currency.default_retail_adder(),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub currency: Currency,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Price threshold for "cheap hour" occupancy metrics.
    pub threshold: f64,
    /// Trailing window for moving averages (periods).
    pub ma_window: usize,
    pub policy: SparkPolicy,
}

/// Format a date as the `YYYY-MM` month key used by monthly rollups.
///
/// ISO month strings compare correctly lexically, so rollup outputs sorted
/// on this key are already in chronological order.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_pads_single_digit_months() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(month_key(d), "2025-03");
    }

    #[test]
    fn filter_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let data = MarketData {
            dam: vec![
                PriceObservation { date: d(1), hour: 1, price: Some(1.0) },
                PriceObservation { date: d(2), hour: 1, price: Some(2.0) },
                PriceObservation { date: d(3), hour: 1, price: Some(3.0) },
            ],
            ..MarketData::default()
        };
        let filtered = data.filter_range(Some(d(2)), Some(d(2)));
        assert_eq!(filtered.dam.len(), 1);
        assert_eq!(filtered.dam[0].date, d(2));
    }

    #[test]
    fn default_policy_matches_currency() {
        let eur = SparkPolicy::for_currency(Currency::Eur);
        assert_eq!(eur.charging_hours, 8);
        assert!((eur.boiler_efficiency - 0.90).abs() < 1e-12);
        assert!((eur.retail_adder - 40.0).abs() < 1e-12);

        let czk = SparkPolicy::for_currency(Currency::Czk);
        assert!((czk.retail_adder - 1000.0).abs() < 1e-12);
    }
}
