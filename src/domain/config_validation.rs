//! Configuration validation.
//!
//! Validates all config fields before a run and builds the typed
//! [`BacktestConfig`] from them.

use crate::domain::backtest::{
    BacktestConfig, DEFAULT_INITIAL_BALANCE, DEFAULT_TRANSACTION_COST,
};
use crate::domain::error::MacrossError;
use crate::domain::optimizer::WindowRange;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    validate_symbol(config)?;
    validate_dates(config)?;
    validate_initial_balance(config)?;
    validate_transaction_cost(config)?;
    read_range(config, "slow", WindowRange::DEFAULT_SLOW)?;
    read_range(config, "fast", WindowRange::DEFAULT_FAST)?;
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, MacrossError> {
    validate_config(config)?;

    let symbol = config
        .get_string("backtest", "symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_default();
    let (start_date, end_date) = validate_dates(config)?;

    Ok(BacktestConfig {
        symbol,
        start_date,
        end_date,
        initial_balance: validate_initial_balance(config)?,
        transaction_cost: validate_transaction_cost(config)?,
        slow_windows: read_range(config, "slow", WindowRange::DEFAULT_SLOW)?,
        fast_windows: read_range(config, "fast", WindowRange::DEFAULT_FAST)?,
        parallel: config.get_bool("optimizer", "parallel", true),
    })
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if config.has_key("backtest", "symbol") {
        Ok(())
    } else {
        Err(MacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        })
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<f64, MacrossError> {
    let value = read_number(config, "initial_balance", DEFAULT_INITIAL_BALANCE)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(MacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_balance".to_string(),
            reason: "initial_balance must be positive".to_string(),
        });
    }
    Ok(value)
}

fn validate_transaction_cost(config: &dyn ConfigPort) -> Result<f64, MacrossError> {
    let value = read_number(config, "transaction_cost", DEFAULT_TRANSACTION_COST)?;
    if !(value >= 0.0 && value.is_finite()) {
        return Err(MacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "transaction_cost".to_string(),
            reason: "transaction_cost must be non-negative".to_string(),
        });
    }
    Ok(value)
}

/// `[backtest] key` as a number; missing falls back to `default`, unparsable is an error.
fn read_number(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, MacrossError> {
    let Some(raw) = config.get_string("backtest", key) else {
        return Ok(default);
    };
    raw.trim()
        .parse()
        .map_err(|_| MacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: format!("expected a number, got {:?}", raw.trim()),
        })
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), MacrossError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(MacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok((start_date, end_date))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MacrossError> {
    match value {
        None => Err(MacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            MacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

/// Reads `[optimizer] {prefix}_start/_end/_step`, each falling back to `default`.
fn read_range(
    config: &dyn ConfigPort,
    prefix: &str,
    default: WindowRange,
) -> Result<WindowRange, MacrossError> {
    let start = read_window(config, &format!("{prefix}_start"), default.start)?;
    let end = read_window(config, &format!("{prefix}_end"), default.end)?;
    let step = read_window(config, &format!("{prefix}_step"), default.step)?;

    if start > end {
        return Err(MacrossError::ConfigInvalid {
            section: "optimizer".to_string(),
            key: format!("{prefix}_start"),
            reason: format!("{prefix}_start must not exceed {prefix}_end"),
        });
    }
    Ok(WindowRange { start, end, step })
}

fn read_window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MacrossError> {
    let invalid = |reason: &str| MacrossError::ConfigInvalid {
        section: "optimizer".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let Some(raw) = config.get_string("optimizer", key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of days"))?;
    if value < 1 {
        return Err(invalid("window lengths and steps must be at least 1"));
    }
    usize::try_from(value).map_err(|_| invalid("value out of range"))
}
