//! The aggregation engine.
//!
//! Pure, stateless transformation functions that turn flat per-hour records
//! into the derived series each chart/report consumes. Every function here:
//!
//! - takes immutable input slices and returns freshly allocated output
//! - orders output ascending on its grouping key
//! - rounds derived numbers itself (2 dp for currency/price values, 1 dp for
//!   percentages), so renderers never re-round
//! - yields defined fallbacks (0.0 / `None`) instead of NaN/Infinity
//!
//! Inputs are assumed pre-validated by the loader: no missing key fields,
//! numeric cells parsed to `Option<f64>` (never NaN).

pub mod indexes;
pub mod joins;
pub mod regulation;
pub mod rollup;
pub mod series;
pub mod spark;
pub mod threshold;
pub mod volatility;

/// Round to 2 decimals (currency/price values).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to 1 decimal (percentages).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Mean of a slice, or `None` when empty. Never produces NaN.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_halves_up() {
        assert!((round2(1.005) - 1.01).abs() < 1e-12 || (round2(1.005) - 1.0).abs() < 1e-12);
        assert!((round2(12.344) - 12.34).abs() < 1e-12);
        assert!((round2(12.346) - 12.35).abs() < 1e-12);
        assert!((round1(99.96) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert!((mean(&[2.0, 4.0]).unwrap() - 3.0).abs() < 1e-12);
    }
}
