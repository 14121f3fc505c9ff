//! Dual moving-average crossover signal.
//!
//! Both rolling means are aligned with the price series by index, rows where
//! either mean is still warming up are dropped, and the remaining rows carry
//! `is_long = fast_ma >= slow_ma` together with that day's log return.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price::PricePoint;
use crate::domain::returns::ReturnSeries;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowPair {
    pub slow: usize,
    pub fast: usize,
}

impl WindowPair {
    pub fn new(slow: usize, fast: usize) -> Self {
        Self { slow, fast }
    }

    /// Both windows positive and the fast window strictly shorter.
    pub fn is_admissible(&self) -> bool {
        self.fast > 0 && self.slow > 0 && self.fast < self.slow
    }

    pub fn indicators(&self) -> [IndicatorType; 2] {
        [IndicatorType::Sma(self.slow), IndicatorType::Sma(self.fast)]
    }
}

impl fmt::Display for WindowPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA={}, FMA={}", self.slow, self.fast)
    }
}

/// Signal rows after the warm-up trim. All vectors share one length.
///
/// `returns[0]` is the return into the first kept date; it is only 0.0 when
/// the frame starts on the very first price, which has no prior close.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    pub pair: WindowPair,
    pub dates: Vec<NaiveDate>,
    pub returns: Vec<f64>,
    pub slow_ma: Vec<f64>,
    pub fast_ma: Vec<f64>,
    pub is_long: Vec<bool>,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Ready(SignalFrame),
    /// No row has both means defined, e.g. the slow window exceeds the history.
    Empty,
}

impl SignalOutcome {
    pub fn into_frame(self) -> Option<SignalFrame> {
        match self {
            SignalOutcome::Ready(frame) => Some(frame),
            SignalOutcome::Empty => None,
        }
    }
}

/// `returns` must be built from `prices`.
pub fn generate_signals(
    prices: &[PricePoint],
    returns: &ReturnSeries,
    pair: WindowPair,
) -> SignalOutcome {
    let slow = calculate_sma(prices, pair.slow);
    let fast = calculate_sma(prices, pair.fast);
    signals_from_indicators(prices, returns, pair, &slow, &fast)
}

/// Same as [`generate_signals`] with precomputed rolling means.
pub fn signals_from_indicators(
    prices: &[PricePoint],
    returns: &ReturnSeries,
    pair: WindowPair,
    slow: &IndicatorSeries,
    fast: &IndicatorSeries,
) -> SignalOutcome {
    let capacity = prices.len().saturating_sub(pair.slow.saturating_sub(1));
    let mut frame = SignalFrame {
        pair,
        dates: Vec::with_capacity(capacity),
        returns: Vec::with_capacity(capacity),
        slow_ma: Vec::with_capacity(capacity),
        fast_ma: Vec::with_capacity(capacity),
        is_long: Vec::with_capacity(capacity),
    };

    for (i, point) in prices.iter().enumerate() {
        let (Some(slow_value), Some(fast_value)) = (slow.get(i), fast.get(i)) else {
            continue;
        };
        frame.dates.push(point.date);
        frame.returns.push(returns.at_price_index(i).unwrap_or(0.0));
        frame.slow_ma.push(slow_value);
        frame.fast_ma.push(fast_value);
        frame.is_long.push(fast_value >= slow_value);
    }

    if frame.is_empty() {
        SignalOutcome::Empty
    } else {
        SignalOutcome::Ready(frame)
    }
}
