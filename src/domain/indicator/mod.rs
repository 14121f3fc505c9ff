//! Technical indicators used by the crossover signal.
//!
//! - `IndicatorPoint`: one point of an indicator time series, flagged invalid
//!   during warm-up
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: a time series of indicator values aligned with prices

pub mod sma;

use crate::domain::price::PricePoint;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `index`, `None` while the indicator is warming up.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
        }
    }
}

pub fn calculate(prices: &[PricePoint], indicator: IndicatorType) -> IndicatorSeries {
    match indicator {
        IndicatorType::Sma(period) => sma::calculate_sma(prices, period),
    }
}

/// Compute each distinct indicator once.
pub fn compute_indicators(
    prices: &[PricePoint],
    indicators: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let mut out = HashMap::with_capacity(indicators.len());
    for &indicator in indicators {
        out.entry(indicator)
            .or_insert_with(|| calculate(prices, indicator));
    }
    out
}
