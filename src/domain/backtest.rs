//! Backtest configuration and the end-to-end pipelines.
//!
//! `run_optimization`: prices -> returns -> grid sweep -> re-simulation at the
//! optimum -> benchmark comparison. `run_backtest` runs the last two stages
//! for a caller-chosen pair.

use crate::domain::error::MacrossError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::optimizer::{
    CagrSurface, OptimalResult, SweepParams, WindowGrid, WindowRange, optimize,
};
use crate::domain::price::PricePoint;
use crate::domain::returns::{ReturnSeries, build_returns};
use crate::domain::signal::{SignalFrame, SignalOutcome, WindowPair, generate_signals};
use crate::domain::simulation::{BalanceSeries, SimulationResult, simulate, simulate_benchmark};
use chrono::NaiveDate;
use log::{info, warn};

pub const DAYS_PER_YEAR: f64 = 365.25;
pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;
pub const DEFAULT_TRANSACTION_COST: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_balance: f64,
    pub transaction_cost: f64,
    pub slow_windows: WindowRange,
    pub fast_windows: WindowRange,
    pub parallel: bool,
}

impl BacktestConfig {
    /// Calendar length of the requested range in years of 365.25 days.
    pub fn elapsed_years(&self) -> f64 {
        (self.end_date - self.start_date).num_days() as f64 / DAYS_PER_YEAR
    }

    pub fn grid(&self) -> WindowGrid {
        WindowGrid::from_ranges(self.slow_windows, self.fast_windows)
    }

    fn sweep_params(&self) -> Result<SweepParams, MacrossError> {
        let years = self.elapsed_years();
        if years <= 0.0 {
            return Err(MacrossError::InvalidYears { years });
        }
        Ok(SweepParams {
            initial_balance: self.initial_balance,
            transaction_cost: self.transaction_cost,
            years,
            parallel: self.parallel,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub pair: WindowPair,
    pub years: f64,
    pub frame: SignalFrame,
    pub benchmark: BalanceSeries,
    pub strategy: SimulationResult,
    pub summary: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationReport {
    pub optimal: OptimalResult,
    pub surface: CagrSurface,
    pub backtest: BacktestReport,
}

pub fn run_optimization(
    prices: &[PricePoint],
    config: &BacktestConfig,
) -> Result<OptimizationReport, MacrossError> {
    let params = config.sweep_params()?;
    let returns = build_returns(prices)?;
    info!(
        "{}: {} prices from {} to {}, {:.2} years",
        config.symbol,
        prices.len(),
        prices[0].date,
        prices[prices.len() - 1].date,
        params.years
    );

    let grid = config.grid();
    let outcome = optimize(prices, &returns, &grid, &params)?;
    let backtest = backtest_pair(prices, &returns, outcome.optimal.pair, &params)?;

    Ok(OptimizationReport {
        optimal: outcome.optimal,
        surface: outcome.surface,
        backtest,
    })
}

pub fn run_backtest(
    prices: &[PricePoint],
    config: &BacktestConfig,
    pair: WindowPair,
) -> Result<BacktestReport, MacrossError> {
    if !pair.is_admissible() {
        return Err(MacrossError::InvalidWindowPair {
            slow: pair.slow,
            fast: pair.fast,
        });
    }
    let params = config.sweep_params()?;
    let returns = build_returns(prices)?;
    backtest_pair(prices, &returns, pair, &params)
}

fn backtest_pair(
    prices: &[PricePoint],
    returns: &ReturnSeries,
    pair: WindowPair,
    params: &SweepParams,
) -> Result<BacktestReport, MacrossError> {
    let frame = match generate_signals(prices, returns, pair) {
        SignalOutcome::Ready(frame) => frame,
        SignalOutcome::Empty => {
            warn!("{} leaves no rows after warm-up", pair);
            return Err(MacrossError::InsufficientData {
                points: prices.len(),
                minimum: pair.slow,
            });
        }
    };

    let strategy = simulate(&frame, params.initial_balance, params.transaction_cost);
    let benchmark = simulate_benchmark(&frame, params.initial_balance);
    let summary = PerformanceSummary::compute(
        &benchmark,
        &strategy.balance,
        &frame.is_long,
        params.years,
    )?;
    info!(
        "{}: strategy CAGR {:.4} vs benchmark {:.4}, {} trades",
        pair, summary.strategy.cagr, summary.benchmark.cagr, summary.strategy.trades
    );

    Ok(BacktestReport {
        pair,
        years: params.years,
        frame,
        benchmark,
        strategy,
        summary,
    })
}
