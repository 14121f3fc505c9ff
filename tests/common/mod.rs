#![allow(dead_code)]

use chrono::NaiveDate;
use macross::domain::backtest::BacktestConfig;
use macross::domain::error::MacrossError;
use macross::domain::optimizer::WindowRange;
pub use macross::domain::price::PricePoint;
use macross::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), prices);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, MacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MacrossError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MacrossError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(prices) if !prices.is_empty() => {
                let min = prices.iter().map(|p| p.date).min().unwrap();
                let max = prices.iter().map(|p| p.date).max().unwrap();
                Ok(Some((min, max, prices.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One close per calendar day starting at `start_date`.
pub fn make_prices(start_date: &str, closes: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// A smooth oscillating series long enough for small grids.
pub fn generate_prices(start_date: &str, count: usize, start_price: f64) -> Vec<PricePoint> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64;
            start_price + t * 0.1 + (t / 7.0).sin() * 5.0
        })
        .collect();
    make_prices(start_date, &closes)
}

pub fn sample_config(slow: WindowRange, fast: WindowRange) -> BacktestConfig {
    BacktestConfig {
        symbol: "TEST".into(),
        start_date: date(2020, 1, 1),
        end_date: date(2022, 1, 1),
        initial_balance: 1000.0,
        transaction_cost: 0.001,
        slow_windows: slow,
        fast_windows: fast,
        parallel: true,
    }
}

pub fn range(start: usize, end: usize, step: usize) -> WindowRange {
    WindowRange { start, end, step }
}
