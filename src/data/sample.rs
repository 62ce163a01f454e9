//! Synthetic demo datasets.
//!
//! Generates one year of plausibly-shaped market data from a fixed seed so
//! the dashboard runs with no data directory at all. The shapes follow the
//! Czech market's stylized facts: a morning/evening double peak, cheap night
//! and midday-solar hours, winter gas premiums, and occasional negative
//! prices on sunny spring weekends.

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    GasObservation, IndexObservation, MarketData, PriceObservation, SettlementObservation,
    VolumeObservation,
};

const SAMPLE_YEAR: i32 = 2025;
/// Baseline DAM level, EUR/MWh.
const BASE_PRICE: f64 = 85.0;
/// Baseline gas level, EUR/MWh.
const BASE_GAS: f64 = 38.0;

/// Deterministic synthetic year of all seven datasets.
pub fn generate_market_data(seed: u64) -> MarketData {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 9.0).expect("valid noise distribution");
    let im_noise = Normal::new(0.0, 6.0).expect("valid noise distribution");
    let settlement_noise = Normal::new(0.0, 45.0).expect("valid noise distribution");

    let start = NaiveDate::from_ymd_opt(SAMPLE_YEAR, 1, 1).expect("valid sample start");
    let end = NaiveDate::from_ymd_opt(SAMPLE_YEAR, 12, 31).expect("valid sample end");

    let mut data = MarketData::default();
    let mut date = start;
    while date <= end {
        let season = seasonal_factor(date);
        let weekend = matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun);

        for hour in 1u8..=24 {
            let shape = hourly_shape(hour);
            let weekend_discount = if weekend { 0.85 } else { 1.0 };
            let mut price = BASE_PRICE * season * shape * weekend_discount + noise.sample(&mut rng);

            // Spring/summer solar hours occasionally dip below zero on weekends.
            if weekend && (11..=15).contains(&hour) && rng.gen_bool(0.08) {
                price = -rng.gen_range(1.0..25.0);
            }

            data.dam.push(PriceObservation { date, hour, price: Some(price_round(price)) });
            data.im.push(PriceObservation {
                date,
                hour,
                price: Some(price_round(price + im_noise.sample(&mut rng))),
            });

            data.imbalances.push(SettlementObservation {
                date,
                hour,
                settlement_price: Some(price_round(
                    price + settlement_noise.sample(&mut rng) * spike_factor(&mut rng),
                )),
            });

            // Negative regulation energy clusters in low-load hours.
            if rng.gen_bool(if (1..=6).contains(&hour) { 0.45 } else { 0.15 }) {
                let volume = -rng.gen_range(1.0..60.0);
                // Mostly revenue (negative cost), occasionally an expense.
                let unit = if rng.gen_bool(0.85) {
                    -rng.gen_range(10.0..120.0)
                } else {
                    rng.gen_range(5.0..60.0)
                };
                data.re_negative.push(VolumeObservation {
                    date,
                    hour,
                    volume: Some(price_round(volume)),
                    cost: Some(price_round(volume.abs() * unit)),
                });
            }
            if rng.gen_bool(0.2) {
                let volume = rng.gen_range(1.0..40.0);
                data.re_positive.push(VolumeObservation {
                    date,
                    hour,
                    volume: Some(price_round(volume)),
                    cost: Some(price_round(volume * rng.gen_range(20.0..150.0))),
                });
            }
        }

        let gas = BASE_GAS * season + noise.sample(&mut rng) / 3.0;
        data.gas.push(GasObservation { date, price: Some(price_round(gas)) });

        let day_avg = BASE_PRICE * season * if weekend { 0.85 } else { 1.0 };
        let peak = day_avg * 1.25 + noise.sample(&mut rng) / 2.0;
        let offpeak = day_avg * 0.78 + noise.sample(&mut rng) / 2.0;
        data.indexes.push(IndexObservation {
            date,
            base_load: Some(price_round(day_avg)),
            peak_load: price_round(peak),
            offpeak_load: price_round(offpeak),
        });

        date += Duration::days(1);
    }

    data
}

/// Annual shape: expensive winters, cheap sunny mid-year.
fn seasonal_factor(date: NaiveDate) -> f64 {
    let day_of_year = date.ordinal() as f64;
    1.0 + 0.28 * ((day_of_year / 365.0 + 0.5) * std::f64::consts::TAU).sin()
}

/// Daily shape: morning and evening peaks, cheap night and midday.
fn hourly_shape(hour: u8) -> f64 {
    match hour {
        1..=5 => 0.75,
        6..=7 => 0.95,
        8..=10 => 1.25,
        11..=15 => 0.85,
        16..=18 => 1.1,
        19..=21 => 1.35,
        _ => 0.9,
    }
}

/// Rare multiplier producing the settlement-price spikes the percentile
/// clipping is there to tame.
fn spike_factor(rng: &mut StdRng) -> f64 {
    if rng.gen_bool(0.01) {
        rng.gen_range(5.0..20.0)
    } else {
        1.0
    }
}

fn price_round(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = generate_market_data(42);
        let b = generate_market_data(42);
        assert_eq!(a.dam.len(), b.dam.len());
        assert_eq!(a.dam[100], b.dam[100]);
        assert_eq!(a.gas[50], b.gas[50]);
    }

    #[test]
    fn covers_a_full_year_of_hours() {
        let data = generate_market_data(1);
        // 365 days of 24 hours for each hourly price dataset.
        assert_eq!(data.dam.len(), 365 * 24);
        assert_eq!(data.im.len(), 365 * 24);
        assert_eq!(data.gas.len(), 365);
        assert_eq!(data.indexes.len(), 365);
    }

    #[test]
    fn negative_regulation_costs_skew_to_revenue() {
        let data = generate_market_data(3);
        let revenue = data
            .re_negative
            .iter()
            .filter(|o| o.cost.is_some_and(|c| c < 0.0))
            .count();
        assert!(revenue * 2 > data.re_negative.len());
    }
}
