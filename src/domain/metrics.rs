//! Benchmark vs. strategy performance summary.

use crate::domain::error::MacrossError;
use crate::domain::simulation::{BalanceSeries, cagr, count_flips};

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub final_balance: f64,
    pub absolute_return: f64,
    pub cagr: f64,
    pub time_in_market_pct: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    /// Position flips after the first row. A position already open on the
    /// first row is not counted and pays no entry cost.
    pub trades: usize,
}

impl SeriesSummary {
    fn compute(
        balance: &BalanceSeries,
        years: f64,
        time_in_market_pct: f64,
        trades: usize,
    ) -> Result<Self, MacrossError> {
        let cagr = cagr(balance, years)?;
        let values = balance.values();
        // cagr() already rejected series shorter than two points
        let first = values[0];
        let final_balance = values[values.len() - 1];
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&values);

        Ok(SeriesSummary {
            final_balance,
            absolute_return: final_balance / first - 1.0,
            cagr,
            time_in_market_pct,
            max_drawdown,
            max_drawdown_duration,
            trades,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub benchmark: SeriesSummary,
    pub strategy: SeriesSummary,
}

impl PerformanceSummary {
    /// `positions` is the strategy's unlagged long/flat series.
    pub fn compute(
        benchmark: &BalanceSeries,
        strategy: &BalanceSeries,
        positions: &[bool],
        years: f64,
    ) -> Result<Self, MacrossError> {
        let in_market = if positions.is_empty() {
            0.0
        } else {
            positions.iter().filter(|&&l| l).count() as f64 / positions.len() as f64 * 100.0
        };

        Ok(PerformanceSummary {
            benchmark: SeriesSummary::compute(benchmark, years, 100.0, 0)?,
            strategy: SeriesSummary::compute(strategy, years, in_market, count_flips(positions))?,
        })
    }
}

/// Largest peak-to-trough fall as a fraction of the peak, and the longest
/// run of points spent below a prior peak.
fn compute_drawdown(values: &[f64]) -> (f64, usize) {
    let Some(&first) = values.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for &value in values {
        if value >= peak {
            peak = value;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}
