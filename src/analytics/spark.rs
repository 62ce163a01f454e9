//! Spark-spread economic model.
//!
//! Estimates, per day, whether electricity-based smart charging beats gas
//! heating: the flexible load runs in the day's `charging_hours` cheapest
//! hours, the gas alternative pays `(gas_price + retail_adder) / efficiency`.
//! A positive spread means electricity is the cheaper heating source.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::analytics::series::{cumulative_sum, CumulativeRow};
use crate::analytics::{mean, round2};
use crate::domain::{month_key, GasObservation, PriceObservation, SparkPolicy};

/// One day of the spark-spread comparison.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DailySparkRow {
    pub date: NaiveDate,
    /// Gas heating cost: `(gas_price + retail_adder) / boiler_efficiency`.
    pub gas_heat_cost: f64,
    /// Mean of the day's `charging_hours` cheapest electricity prices.
    pub smart_charge_cost: f64,
    /// Mean over all of the day's priced hours (the naive alternative).
    pub all_day_cost: f64,
    /// `gas_heat_cost - smart_charge_cost`; positive favors electricity.
    pub spark_spread: f64,
}

/// Monthly means of the daily spark quantities.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MonthlySparkRow {
    pub month: String,
    pub gas_heat_cost: f64,
    pub smart_charge_cost: f64,
    pub all_day_cost: f64,
    pub spark_spread: f64,
    pub days: usize,
}

/// Daily spark spread for every date carrying both hourly electricity prices
/// and a gas price. Dates missing either input produce no row.
pub fn daily_spark_spread(
    dam: &[PriceObservation],
    gas: &[GasObservation],
    policy: &SparkPolicy,
) -> Vec<DailySparkRow> {
    if policy.charging_hours == 0 || policy.boiler_efficiency <= 0.0 {
        return Vec::new();
    }

    let gas_by_date: HashMap<NaiveDate, f64> = gas
        .iter()
        .filter_map(|g| g.price.map(|p| (g.date, p)))
        .collect();

    let mut prices_by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for o in dam {
        if let Some(p) = o.price {
            prices_by_date.entry(o.date).or_default().push(p);
        }
    }

    prices_by_date
        .into_iter()
        .filter_map(|(date, mut prices)| {
            let gas_price = *gas_by_date.get(&date)?;
            prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let k = policy.charging_hours.min(prices.len());
            let cheapest_avg = mean(&prices[..k])?;
            let all_day = mean(&prices)?;
            let gas_heat_cost = (gas_price + policy.retail_adder) / policy.boiler_efficiency;

            Some(DailySparkRow {
                date,
                gas_heat_cost: round2(gas_heat_cost),
                smart_charge_cost: round2(cheapest_avg),
                all_day_cost: round2(all_day),
                spark_spread: round2(gas_heat_cost - cheapest_avg),
            })
        })
        .collect()
}

/// Monthly means of the daily spark quantities.
pub fn monthly_spark_spread(daily: &[DailySparkRow]) -> Vec<MonthlySparkRow> {
    let mut by_month: BTreeMap<String, Vec<&DailySparkRow>> = BTreeMap::new();
    for row in daily {
        by_month.entry(month_key(row.date)).or_default().push(row);
    }

    by_month
        .into_iter()
        .map(|(month, rows)| {
            let n = rows.len() as f64;
            let avg = |f: fn(&DailySparkRow) -> f64| {
                round2(rows.iter().map(|r| f(r)).sum::<f64>() / n)
            };
            MonthlySparkRow {
                month,
                gas_heat_cost: avg(|r| r.gas_heat_cost),
                smart_charge_cost: avg(|r| r.smart_charge_cost),
                all_day_cost: avg(|r| r.all_day_cost),
                spark_spread: avg(|r| r.spark_spread),
                days: rows.len(),
            }
        })
        .collect()
}

/// Running sum of the daily spread in chronological order.
///
/// This is a savings-accumulation series, not an average.
pub fn cumulative_savings(daily: &[DailySparkRow]) -> Vec<CumulativeRow> {
    cumulative_sum(daily.iter().map(|r| (r.date, r.spark_spread)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn price(day: u32, hour: u8, p: f64) -> PriceObservation {
        PriceObservation {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            hour,
            price: Some(p),
        }
    }

    fn gas(day: u32, p: f64) -> GasObservation {
        GasObservation {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            price: Some(p),
        }
    }

    #[test]
    fn reference_scenario_gas_50_adder_40() {
        // gas 50, adder 40, efficiency 0.9, cheapest-8 average 30:
        // heat cost = 90 / 0.9 = 100.00, spread = 70.00.
        let policy = SparkPolicy {
            charging_hours: 8,
            boiler_efficiency: 0.9,
            retail_adder: 40.0,
        };
        // 8 cheap hours at 30, the rest expensive.
        let mut dam: Vec<PriceObservation> =
            (1..=8).map(|h| price(1, h, 30.0)).collect();
        dam.extend((9..=24).map(|h| price(1, h, 90.0)));

        let rows = daily_spark_spread(&dam, &[gas(1, 50.0)], &policy);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].gas_heat_cost - 100.0).abs() < 1e-9);
        assert!((rows[0].smart_charge_cost - 30.0).abs() < 1e-9);
        assert!((rows[0].spark_spread - 70.0).abs() < 1e-9);
        // All-day mean: (8*30 + 16*90) / 24 = 70.
        assert!((rows[0].all_day_cost - 70.0).abs() < 1e-9);
    }

    #[test]
    fn days_without_gas_price_produce_no_row() {
        let policy = SparkPolicy::for_currency(Currency::Eur);
        let dam = vec![price(1, 1, 10.0), price(2, 1, 10.0)];
        let rows = daily_spark_spread(&dam, &[gas(2, 30.0)], &policy);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn short_days_clamp_k_to_available_hours() {
        // A 2-hour day with K = 8 uses both hours rather than panicking.
        let policy = SparkPolicy::for_currency(Currency::Eur);
        let rows = daily_spark_spread(
            &[price(1, 1, 10.0), price(1, 2, 20.0)],
            &[gas(1, 30.0)],
            &policy,
        );
        assert!((rows[0].smart_charge_cost - 15.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_rollup_averages_daily_rows() {
        let daily = vec![
            DailySparkRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                gas_heat_cost: 100.0,
                smart_charge_cost: 30.0,
                all_day_cost: 60.0,
                spark_spread: 70.0,
            },
            DailySparkRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                gas_heat_cost: 80.0,
                smart_charge_cost: 50.0,
                all_day_cost: 70.0,
                spark_spread: 30.0,
            },
        ];
        let monthly = monthly_spark_spread(&daily);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].days, 2);
        assert!((monthly[0].gas_heat_cost - 90.0).abs() < 1e-9);
        assert!((monthly[0].spark_spread - 50.0).abs() < 1e-9);
    }

    #[test]
    fn cumulative_savings_accumulates_spread() {
        let daily = vec![
            DailySparkRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                gas_heat_cost: 0.0,
                smart_charge_cost: 0.0,
                all_day_cost: 0.0,
                spark_spread: -10.0,
            },
            DailySparkRow {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                gas_heat_cost: 0.0,
                smart_charge_cost: 0.0,
                all_day_cost: 0.0,
                spark_spread: 25.0,
            },
        ];
        let cum = cumulative_savings(&daily);
        assert_eq!(cum[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!((cum[0].cumulative - 25.0).abs() < 1e-9);
        assert!((cum[1].cumulative - 15.0).abs() < 1e-9);
    }
}
