//! CSV report adapter implementing ReportPort.
//!
//! Writes raw numeric artifacts for downstream plotting and presentation:
//! - `surface.csv`: CAGR heatmap, one row per fast window, one column per slow
//!   window; cells that were not evaluated hold `skipped`, `insufficient` or
//!   `degenerate`
//! - `balances.csv`: benchmark and strategy balance per date
//! - `summary.csv`: benchmark and strategy performance rows
//! - `details.csv`: run parameters and the selected windows

use crate::domain::backtest::{BacktestConfig, BacktestReport, OptimizationReport};
use crate::domain::error::MacrossError;
use crate::domain::metrics::SeriesSummary;
use crate::domain::optimizer::{CagrSurface, CellOutcome};
use crate::ports::report_port::ReportPort;
use log::info;
use std::fs;
use std::path::Path;

pub const SURFACE_FILE: &str = "surface.csv";
pub const BALANCES_FILE: &str = "balances.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const DETAILS_FILE: &str = "details.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn report_err(context: &str, e: impl std::fmt::Display) -> MacrossError {
    MacrossError::Report {
        reason: format!("{}: {}", context, e),
    }
}

fn create_writer(output_dir: &Path, name: &str) -> Result<csv::Writer<fs::File>, MacrossError> {
    let path = output_dir.join(name);
    csv::Writer::from_path(&path).map_err(|e| report_err(&path.display().to_string(), e))
}

pub fn write_surface(surface: &CagrSurface, output_dir: &Path) -> Result<(), MacrossError> {
    let mut wtr = create_writer(output_dir, SURFACE_FILE)?;

    let mut header = vec!["fast\\slow".to_string()];
    header.extend(surface.grid.slow.iter().map(|w| w.to_string()));
    wtr.write_record(&header)
        .map_err(|e| report_err(SURFACE_FILE, e))?;

    for (fast_idx, fast) in surface.grid.fast.iter().enumerate() {
        let mut record = vec![fast.to_string()];
        record.extend(
            (0..surface.grid.slow.len())
                .map(|slow_idx| cell_label(surface.get(slow_idx, fast_idx))),
        );
        wtr.write_record(&record)
            .map_err(|e| report_err(SURFACE_FILE, e))?;
    }
    wtr.flush().map_err(|e| report_err(SURFACE_FILE, e))
}

fn cell_label(cell: Option<CellOutcome>) -> String {
    match cell {
        Some(CellOutcome::Evaluated(cagr)) => cagr.to_string(),
        Some(CellOutcome::Skipped) => "skipped".to_string(),
        Some(CellOutcome::Insufficient) => "insufficient".to_string(),
        Some(CellOutcome::Degenerate) => "degenerate".to_string(),
        None => String::new(),
    }
}

pub fn write_balances(report: &BacktestReport, output_dir: &Path) -> Result<(), MacrossError> {
    let mut wtr = create_writer(output_dir, BALANCES_FILE)?;
    wtr.write_record(["date", "benchmark", "strategy", "long"])
        .map_err(|e| report_err(BALANCES_FILE, e))?;

    let rows = report
        .benchmark
        .points
        .iter()
        .zip(&report.strategy.balance.points)
        .zip(&report.frame.is_long);
    for ((bench, strat), long) in rows {
        wtr.write_record([
            bench.date.to_string(),
            bench.balance.to_string(),
            strat.balance.to_string(),
            long.to_string(),
        ])
        .map_err(|e| report_err(BALANCES_FILE, e))?;
    }
    wtr.flush().map_err(|e| report_err(BALANCES_FILE, e))
}

pub fn write_summary(report: &BacktestReport, output_dir: &Path) -> Result<(), MacrossError> {
    let mut wtr = create_writer(output_dir, SUMMARY_FILE)?;
    wtr.write_record([
        "series",
        "final_balance",
        "absolute_return",
        "cagr",
        "time_in_market_pct",
        "max_drawdown",
        "max_drawdown_duration",
        "trades",
    ])
    .map_err(|e| report_err(SUMMARY_FILE, e))?;

    let rows: [(&str, &SeriesSummary); 2] = [
        ("benchmark", &report.summary.benchmark),
        ("strategy", &report.summary.strategy),
    ];
    for (name, s) in rows {
        wtr.write_record([
            name.to_string(),
            s.final_balance.to_string(),
            s.absolute_return.to_string(),
            s.cagr.to_string(),
            s.time_in_market_pct.to_string(),
            s.max_drawdown.to_string(),
            s.max_drawdown_duration.to_string(),
            s.trades.to_string(),
        ])
        .map_err(|e| report_err(SUMMARY_FILE, e))?;
    }
    wtr.flush().map_err(|e| report_err(SUMMARY_FILE, e))
}

fn write_details(
    report: &BacktestReport,
    config: &BacktestConfig,
    optimal_cagr: Option<f64>,
    output_dir: &Path,
) -> Result<(), MacrossError> {
    let mut wtr = create_writer(output_dir, DETAILS_FILE)?;
    let mut rows = vec![
        ("symbol", config.symbol.clone()),
        ("start_date", config.start_date.to_string()),
        ("end_date", config.end_date.to_string()),
        ("years", report.years.to_string()),
        ("initial_balance", config.initial_balance.to_string()),
        ("transaction_cost", config.transaction_cost.to_string()),
        ("slow_window", report.pair.slow.to_string()),
        ("fast_window", report.pair.fast.to_string()),
    ];
    if let Some(cagr) = optimal_cagr {
        rows.push(("optimal_cagr", cagr.to_string()));
    }

    wtr.write_record(["key", "value"])
        .map_err(|e| report_err(DETAILS_FILE, e))?;
    for (key, value) in rows {
        wtr.write_record([key, value.as_str()])
            .map_err(|e| report_err(DETAILS_FILE, e))?;
    }
    wtr.flush().map_err(|e| report_err(DETAILS_FILE, e))
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        report: &BacktestReport,
        config: &BacktestConfig,
        output_dir: &Path,
    ) -> Result<(), MacrossError> {
        fs::create_dir_all(output_dir)?;
        write_balances(report, output_dir)?;
        write_summary(report, output_dir)?;
        write_details(report, config, None, output_dir)?;
        info!("backtest report written to {}", output_dir.display());
        Ok(())
    }

    fn write_optimization(
        &self,
        report: &OptimizationReport,
        config: &BacktestConfig,
        output_dir: &Path,
    ) -> Result<(), MacrossError> {
        fs::create_dir_all(output_dir)?;
        write_surface(&report.surface, output_dir)?;
        write_balances(&report.backtest, output_dir)?;
        write_summary(&report.backtest, output_dir)?;
        write_details(&report.backtest, config, Some(report.optimal.cagr), output_dir)?;
        info!("optimization report written to {}", output_dir.display());
        Ok(())
    }
}
