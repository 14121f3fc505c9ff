//! Log-return series derived from closing prices.
//!
//! return[t] = ln(close[t]) - ln(close[t-1]) for t >= 1. The first price has
//! no predecessor, so the series starts on the second date.

use crate::domain::error::MacrossError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub const MIN_PRICE_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return realised on the price at `price_index`, `None` for the first price.
    pub fn at_price_index(&self, price_index: usize) -> Option<f64> {
        price_index
            .checked_sub(1)
            .and_then(|i| self.points.get(i))
            .map(|p| p.value)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

pub fn build_returns(prices: &[PricePoint]) -> Result<ReturnSeries, MacrossError> {
    if prices.len() < MIN_PRICE_POINTS {
        return Err(MacrossError::InsufficientData {
            points: prices.len(),
            minimum: MIN_PRICE_POINTS,
        });
    }

    if let Some(bad) = prices.iter().find(|p| !(p.close > 0.0 && p.close.is_finite())) {
        return Err(MacrossError::InvalidPrice {
            date: bad.date,
            price: bad.close,
        });
    }

    let points = prices
        .windows(2)
        .map(|w| ReturnPoint {
            date: w[1].date,
            value: w[1].close.ln() - w[0].close.ln(),
        })
        .collect();

    Ok(ReturnSeries { points })
}
