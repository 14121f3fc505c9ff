//! Daily closing price representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// First date whose successor does not come strictly later, if any.
pub fn find_unordered(prices: &[PricePoint]) -> Option<NaiveDate> {
    prices
        .windows(2)
        .find(|w| w[1].date <= w[0].date)
        .map(|w| w[1].date)
}
