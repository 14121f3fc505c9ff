//! Strategy and benchmark simulation over a trimmed signal frame.
//!
//! Day t is gated by the previous day's signal: the decision is taken at the
//! close and executed on the next bar. Row 0 has no prior position and is
//! treated as flat, so it carries neither a return nor a cost and every
//! balance series starts at exactly the initial balance.

use crate::domain::error::MacrossError;
use crate::domain::signal::SignalFrame;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSeries {
    pub points: Vec<BalancePoint>,
}

impl BalanceSeries {
    /// `balance[t] = initial * exp(sum(returns[..=t]))`.
    pub fn compound(dates: &[NaiveDate], returns: &[f64], initial_balance: f64) -> Self {
        let mut cumulative = 0.0;
        let points = dates
            .iter()
            .zip(returns)
            .map(|(&date, &r)| {
                cumulative += r;
                BalancePoint {
                    date,
                    balance: initial_balance * cumulative.exp(),
                }
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.points.first().map(|p| p.balance)
    }

    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|p| p.balance)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.balance).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Per-day realized return after lag gating and cost deduction.
    pub realized: Vec<f64>,
    pub balance: BalanceSeries,
    /// Number of position flips, each charged one transaction cost. Row 0
    /// has no prior position, so a long first row is entered free.
    pub trades: usize,
}

pub fn simulate(
    frame: &SignalFrame,
    initial_balance: f64,
    transaction_cost: f64,
) -> SimulationResult {
    let mut realized = Vec::with_capacity(frame.len());
    let mut trades = 0usize;

    for t in 0..frame.len() {
        if t == 0 {
            realized.push(0.0);
            continue;
        }

        let held = frame.is_long[t - 1];
        let mut r = if held { frame.returns[t] } else { 0.0 };

        if frame.is_long[t] != frame.is_long[t - 1] {
            r -= transaction_cost;
            trades += 1;
        }
        realized.push(r);
    }

    let balance = BalanceSeries::compound(&frame.dates, &realized, initial_balance);
    SimulationResult {
        realized,
        balance,
        trades,
    }
}

/// Buy-and-hold over the same rows: unlagged, no costs.
pub fn simulate_benchmark(frame: &SignalFrame, initial_balance: f64) -> BalanceSeries {
    let returns: Vec<f64> = frame
        .returns
        .iter()
        .enumerate()
        .map(|(t, &r)| if t == 0 { 0.0 } else { r })
        .collect();
    BalanceSeries::compound(&frame.dates, &returns, initial_balance)
}

/// `(last / first)^(1 / years) - 1`.
pub fn cagr(balance: &BalanceSeries, years: f64) -> Result<f64, MacrossError> {
    if !(years > 0.0 && years.is_finite()) {
        return Err(MacrossError::InvalidYears { years });
    }
    let (Some(first), Some(last)) = (balance.first(), balance.last()) else {
        return Err(MacrossError::DegenerateSeries { points: 0 });
    };
    if balance.len() < 2 || first <= 0.0 {
        return Err(MacrossError::DegenerateSeries {
            points: balance.len(),
        });
    }
    Ok((last / first).powf(1.0 / years) - 1.0)
}

pub fn count_flips(is_long: &[bool]) -> usize {
    is_long.windows(2).filter(|w| w[0] != w[1]).count()
}
