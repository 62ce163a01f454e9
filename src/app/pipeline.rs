//! Shared aggregation pipeline used by the report, export, and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> date-range filter -> aggregation -> derived series
//!
//! The front-ends then focus on presentation (printing vs widgets vs files).
//! Every derived series is recomputed from scratch whenever the window,
//! currency, or threshold changes; the computations are cheap enough to
//! finish in one synchronous pass.

use crate::analytics::indexes::{monthly_peak_offpeak, year_over_year, PeakOffpeakRow, YearOverYearTable};
use crate::analytics::joins::{dam_vs_im_spread, DamImSpreadRow};
use crate::analytics::regulation::{
    hourly_regulation_volume, monthly_regulation_revenue, HourlyVolumeRow, MonthlyRegulationRow,
};
use crate::analytics::rollup::{
    avg_price_by_hour, daily_price_stats, hourly_heatmap, monthly_price_stats,
    weekday_weekend_profile, DailyPriceRow, HeatmapRow, HourlyProfileRow, MonthlyPriceRow,
    WeekdaySplitRow,
};
use crate::analytics::series::{cumulative_cheap_hours, moving_average, CumulativeRow};
use crate::analytics::spark::{
    cumulative_savings, daily_spark_spread, monthly_spark_spread, DailySparkRow, MonthlySparkRow,
};
use crate::analytics::threshold::{
    hours_below_threshold, negative_hours_by_month, price_summary, NegativeMonthRow, PriceSummary,
    ThresholdDayRow,
};
use crate::analytics::volatility::{daily_imbalance_stats, DailyImbalanceRow};
use crate::data::{load_market_data, DataSource, LoadReport};
use crate::domain::{MarketData, RunConfig};
use crate::error::AppError;

/// Every derived series the presentation layer consumes.
///
/// No identity beyond (grouping key, source dataset, filter window); the
/// whole struct is discarded and rebuilt on any input change.
#[derive(Debug, Clone)]
pub struct DerivedSeries {
    pub summary: Option<PriceSummary>,
    pub daily: Vec<DailyPriceRow>,
    /// Moving average over `daily[i].avg`, same length/order as `daily`.
    pub daily_ma: Vec<f64>,
    pub monthly: Vec<MonthlyPriceRow>,
    pub hourly: Vec<HourlyProfileRow>,
    pub weekday_split: Vec<WeekdaySplitRow>,
    pub heatmap: Vec<HeatmapRow>,
    pub threshold_days: Vec<ThresholdDayRow>,
    pub negative_months: Vec<NegativeMonthRow>,
    pub cumulative_cheap: Vec<CumulativeRow>,
    pub imbalance_daily: Vec<DailyImbalanceRow>,
    pub dam_vs_im: Vec<DamImSpreadRow>,
    pub spark_daily: Vec<DailySparkRow>,
    pub spark_monthly: Vec<MonthlySparkRow>,
    pub savings: Vec<CumulativeRow>,
    pub regulation_monthly: Vec<MonthlyRegulationRow>,
    pub regulation_hourly: Vec<HourlyVolumeRow>,
    pub peak_offpeak: Vec<PeakOffpeakRow>,
    pub year_over_year: YearOverYearTable,
}

/// All computed outputs of one run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The window-filtered datasets the series were derived from.
    pub data: MarketData,
    pub load_report: LoadReport,
    pub derived: DerivedSeries,
}

/// Load, filter, and aggregate in one pass.
pub fn run(source: &DataSource, config: &RunConfig) -> Result<RunOutput, AppError> {
    let (raw, load_report) = load_market_data(source, config.currency)?;
    let output = run_with_data(&raw, config)?;
    Ok(RunOutput {
        load_report,
        ..output
    })
}

/// Re-aggregate pre-loaded data under a (possibly changed) configuration.
///
/// This is the TUI's recompute path: the raw datasets are loaded once and the
/// derived series rebuilt on every window/threshold/policy change.
pub fn run_with_data(raw: &MarketData, config: &RunConfig) -> Result<RunOutput, AppError> {
    let data = raw.filter_range(config.from, config.to);
    if data.dam.is_empty() {
        return Err(AppError::empty(
            "No day-ahead rows remain in the selected date window.",
        ));
    }

    let derived = compute_derived(&data, config);
    Ok(RunOutput {
        data,
        load_report: LoadReport::default(),
        derived,
    })
}

/// Pure aggregation over an already-filtered dataset.
pub fn compute_derived(data: &MarketData, config: &RunConfig) -> DerivedSeries {
    let daily = daily_price_stats(&data.dam);
    let daily_avgs: Vec<f64> = daily.iter().map(|r| r.avg).collect();
    let daily_ma = moving_average(&daily_avgs, config.ma_window);

    let spark_daily = daily_spark_spread(&data.dam, &data.gas, &config.policy);

    DerivedSeries {
        summary: price_summary(&data.dam, config.threshold),
        daily_ma,
        monthly: monthly_price_stats(&data.dam),
        hourly: avg_price_by_hour(&data.dam),
        weekday_split: weekday_weekend_profile(&data.dam),
        heatmap: hourly_heatmap(&data.dam),
        threshold_days: hours_below_threshold(&data.dam, config.threshold),
        negative_months: negative_hours_by_month(&data.dam),
        cumulative_cheap: cumulative_cheap_hours(&data.dam, config.threshold),
        imbalance_daily: daily_imbalance_stats(&data.imbalances),
        dam_vs_im: dam_vs_im_spread(&data.dam, &data.im),
        spark_monthly: monthly_spark_spread(&spark_daily),
        savings: cumulative_savings(&spark_daily),
        spark_daily,
        regulation_monthly: monthly_regulation_revenue(&data.re_negative),
        regulation_hourly: hourly_regulation_volume(&data.re_negative),
        peak_offpeak: monthly_peak_offpeak(&data.indexes),
        year_over_year: year_over_year(&data.dam),
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, SparkPolicy};

    fn sample_config() -> RunConfig {
        RunConfig {
            currency: Currency::Eur,
            from: None,
            to: None,
            threshold: 50.0,
            ma_window: 7,
            policy: SparkPolicy::for_currency(Currency::Eur),
        }
    }

    #[test]
    fn pipeline_produces_every_series_from_sample_data() {
        let source = DataSource::Sample { seed: 42 };
        let output = run(&source, &sample_config()).unwrap();
        let d = &output.derived;

        assert!(d.summary.is_some());
        assert_eq!(d.daily.len(), 365);
        assert_eq!(d.daily_ma.len(), d.daily.len());
        assert_eq!(d.monthly.len(), 12);
        assert_eq!(d.hourly.len(), 24);
        assert_eq!(d.weekday_split.len(), 24);
        assert_eq!(d.regulation_hourly.len(), 24);
        assert_eq!(d.year_over_year.rows.len(), 12);
        assert!(!d.spark_daily.is_empty());
        assert!(!d.imbalance_daily.is_empty());
        assert!(!d.dam_vs_im.is_empty());
    }

    #[test]
    fn recompute_is_deterministic() {
        // Same input by value always yields identical output rows.
        let (raw, _) = load_market_data(&DataSource::Sample { seed: 9 }, Currency::Eur).unwrap();
        let config = sample_config();
        let a = run_with_data(&raw, &config).unwrap();
        let b = run_with_data(&raw, &config).unwrap();
        assert_eq!(a.derived.daily, b.derived.daily);
        assert_eq!(a.derived.spark_daily, b.derived.spark_daily);
        assert_eq!(a.derived.summary, b.derived.summary);
    }

    #[test]
    fn empty_window_is_an_error() {
        let (raw, _) = load_market_data(&DataSource::Sample { seed: 1 }, Currency::Eur).unwrap();
        let config = RunConfig {
            from: chrono::NaiveDate::from_ymd_opt(2030, 1, 1),
            to: chrono::NaiveDate::from_ymd_opt(2030, 12, 31),
            ..sample_config()
        };
        let err = run_with_data(&raw, &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
