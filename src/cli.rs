//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as engine, BacktestConfig, BacktestReport};
use crate::domain::config_validation::build_backtest_config;
use crate::domain::error::MacrossError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::price::PricePoint;
use crate::domain::signal::WindowPair;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "out";

#[derive(Parser, Debug)]
#[command(
    name = "macross",
    about = "Moving-average crossover backtester and window optimizer"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the (slow, fast) window grid and backtest the best pair
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Evaluate grid cells on one thread
        #[arg(long)]
        sequential: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Backtest a single window pair
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        slow: usize,
        #[arg(long)]
        fast: usize,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range available for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Optimize {
            config,
            symbol,
            data_dir,
            output,
            sequential,
            dry_run,
        } => {
            let opts = RunOptions {
                config_path: config,
                symbol,
                data_dir,
                output,
            };
            if dry_run {
                run_dry_run(&opts.config_path)
            } else {
                run_optimize(&opts, sequential)
            }
        }
        Command::Backtest {
            config,
            slow,
            fast,
            symbol,
            data_dir,
            output,
        } => {
            let opts = RunOptions {
                config_path: config,
                symbol,
                data_dir,
                output,
            };
            run_single(&opts, WindowPair::new(slow, fast))
        }
        Command::Validate { config } => run_dry_run(&config),
        Command::Info {
            config,
            symbol,
            data_dir,
        } => run_info(&config, symbol.as_deref(), data_dir.as_deref()),
    }
}

struct RunOptions {
    config_path: PathBuf,
    symbol: Option<String>,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn fail(stage: &str, err: &MacrossError) -> ExitCode {
    error!("{stage} failed: {err}");
    eprintln!("error: [{stage}] {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail("config", &e))
}

/// Typed config with the command line's `--symbol` applied.
pub fn resolve_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestConfig, MacrossError> {
    let mut config = build_backtest_config(adapter)?;
    if let Some(symbol) = symbol_override.map(str::trim).filter(|s| !s.is_empty()) {
        config.symbol = symbol.to_uppercase();
    }
    Ok(config)
}

pub fn resolve_data_dir(adapter: &dyn ConfigPort, data_dir: Option<&Path>) -> PathBuf {
    data_dir
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("data", "directory").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn resolve_output_dir(adapter: &dyn ConfigPort, output: Option<&Path>) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

pub fn load_prices(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
) -> Result<Vec<PricePoint>, MacrossError> {
    let prices = data_port.fetch_closes(&config.symbol, config.start_date, config.end_date)?;
    if prices.is_empty() {
        return Err(MacrossError::Data {
            reason: format!(
                "no prices for {} between {} and {}",
                config.symbol, config.start_date, config.end_date
            ),
        });
    }
    Ok(prices)
}

struct Prepared {
    config: BacktestConfig,
    prices: Vec<PricePoint>,
    output_dir: PathBuf,
}

fn prepare(opts: &RunOptions) -> Result<Prepared, ExitCode> {
    eprintln!("Loading config from {}", opts.config_path.display());
    let adapter = load_config(&opts.config_path)?;
    let config = resolve_config(&adapter, opts.symbol.as_deref()).map_err(|e| fail("config", &e))?;

    let data_dir = resolve_data_dir(&adapter, opts.data_dir.as_deref());
    eprintln!("Loading {} from {}", config.symbol, data_dir.display());
    let prices = load_prices(&CsvAdapter::new(data_dir), &config).map_err(|e| fail("load-prices", &e))?;

    Ok(Prepared {
        output_dir: resolve_output_dir(&adapter, opts.output.as_deref()),
        config,
        prices,
    })
}

fn run_optimize(opts: &RunOptions, sequential: bool) -> ExitCode {
    let mut prepared = match prepare(opts) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if sequential {
        prepared.config.parallel = false;
    }
    let Prepared {
        config,
        prices,
        output_dir,
    } = prepared;

    let grid = config.grid();
    eprintln!(
        "Optimizing over {} window pairs ({} slow x {} fast)...",
        grid.cell_count(),
        grid.slow.len(),
        grid.fast.len()
    );

    let report = match engine::run_optimization(&prices, &config) {
        Ok(r) => r,
        Err(e) => return fail("optimize", &e),
    };

    eprintln!("\n=== Optimal Parameters ===");
    eprintln!("Slow MA:          {}", report.optimal.pair.slow);
    eprintln!("Fast MA:          {}", report.optimal.pair.fast);
    eprintln!("CAGR:             {:.2}%", report.optimal.cagr * 100.0);
    eprintln!(
        "Evaluated cells:  {} of {}",
        report.surface.evaluated_count(),
        report.surface.len()
    );
    print_summary(&report.backtest, &config);

    match CsvReportAdapter::new().write_optimization(&report, &config, &output_dir) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail("report", &e),
    }
}

fn run_single(opts: &RunOptions, pair: WindowPair) -> ExitCode {
    let Prepared {
        config,
        prices,
        output_dir,
    } = match prepare(opts) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let report = match engine::run_backtest(&prices, &config, pair) {
        Ok(r) => r,
        Err(e) => return fail("backtest", &e),
    };
    print_summary(&report, &config);

    match CsvReportAdapter::new().write_backtest(&report, &config, &output_dir) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail("report", &e),
    }
}

fn print_summary(report: &BacktestReport, config: &BacktestConfig) {
    let PerformanceSummary {
        benchmark,
        strategy,
    } = &report.summary;

    eprintln!("\n=== Performance Summary ===");
    eprintln!("{:<22}{:>14}{:>14}", "", "Benchmark", "System");
    eprintln!(
        "{:<22}{:>14.2}{:>14.2}",
        "Final Balance", benchmark.final_balance, strategy.final_balance
    );
    eprintln!(
        "{:<22}{:>13.2}%{:>13.2}%",
        "Absolute Return",
        benchmark.absolute_return * 100.0,
        strategy.absolute_return * 100.0
    );
    eprintln!(
        "{:<22}{:>13.2}%{:>13.2}%",
        "CAGR",
        benchmark.cagr * 100.0,
        strategy.cagr * 100.0
    );
    eprintln!(
        "{:<22}{:>13.2}%{:>13.2}%",
        "Time in Market", benchmark.time_in_market_pct, strategy.time_in_market_pct
    );
    eprintln!(
        "{:<22}{:>13.2}%{:>13.2}%",
        "Max Drawdown",
        benchmark.max_drawdown * 100.0,
        strategy.max_drawdown * 100.0
    );
    eprintln!("{:<22}{:>14}{:>14}", "Trades", benchmark.trades, strategy.trades);

    eprintln!("\nStrategy Details:");
    eprintln!("  Windows:          {}", report.pair);
    eprintln!(
        "  Transaction Cost: {:.2}% per trade",
        config.transaction_cost * 100.0
    );
    eprintln!(
        "  Analysis Period:  {} to {} ({:.1} years)",
        config.start_date, config.end_date, report.years
    );
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match resolve_config(&adapter, None) {
        Ok(c) => c,
        Err(e) => return fail("config", &e),
    };

    let grid = config.grid();
    eprintln!("  symbol:           {}", config.symbol);
    eprintln!(
        "  period:           {} to {} ({:.2} years)",
        config.start_date,
        config.end_date,
        config.elapsed_years()
    );
    eprintln!("  initial balance:  {}", config.initial_balance);
    eprintln!("  transaction cost: {}", config.transaction_cost);
    eprintln!("  slow windows:     {:?}", grid.slow);
    eprintln!("  fast windows:     {:?}", grid.fast);
    eprintln!(
        "  grid cells:       {} ({} admissible)",
        grid.cell_count(),
        grid.slow
            .iter()
            .map(|&s| grid.fast.iter().filter(|&&f| f < s).count())
            .sum::<usize>()
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>, data_dir: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let symbol = match symbol
        .map(str::to_string)
        .or_else(|| adapter.get_string("backtest", "symbol"))
    {
        Some(s) => s.trim().to_uppercase(),
        None => {
            eprintln!("error: symbol is required (use --symbol or set in config)");
            return ExitCode::from(2);
        }
    };

    let data_port = CsvAdapter::new(resolve_data_dir(&adapter, data_dir));
    match data_port.get_data_range(&symbol) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} closes, {} to {}", symbol, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol);
            ExitCode::SUCCESS
        }
        Err(e) => fail("info", &e),
    }
}
