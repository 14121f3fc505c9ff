//! Report generation port trait.

use crate::domain::backtest::{BacktestConfig, BacktestReport, OptimizationReport};
use crate::domain::error::MacrossError;
use std::path::Path;

/// Port for writing backtest artifacts.
pub trait ReportPort {
    fn write_backtest(
        &self,
        report: &BacktestReport,
        config: &BacktestConfig,
        output_dir: &Path,
    ) -> Result<(), MacrossError>;

    /// Default implementation: writes only the backtest at the optimum.
    fn write_optimization(
        &self,
        report: &OptimizationReport,
        config: &BacktestConfig,
        output_dir: &Path,
    ) -> Result<(), MacrossError> {
        self.write_backtest(&report.backtest, config, output_dir)
    }
}
