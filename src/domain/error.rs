//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for macross.
#[derive(Debug, thiserror::Error)]
pub enum MacrossError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data: have {points} price points, need {minimum}")]
    InsufficientData { points: usize, minimum: usize },

    #[error("invalid close price {price} on {date}: log return undefined")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("degenerate series: {points} points, CAGR needs at least 2")]
    DegenerateSeries { points: usize },

    #[error("elapsed years must be positive, got {years}")]
    InvalidYears { years: f64 },

    #[error("invalid window pair: fast window {fast} must be positive and shorter than slow window {slow}")]
    InvalidWindowPair { slow: usize, fast: usize },

    #[error("no evaluable window pair: {evaluated} of {cells} grid cells evaluated")]
    EmptyGrid { evaluated: usize, cells: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MacrossError> for std::process::ExitCode {
    fn from(err: &MacrossError) -> Self {
        let code: u8 = match err {
            MacrossError::Io(_) | MacrossError::Report { .. } => 1,
            MacrossError::ConfigParse { .. }
            | MacrossError::ConfigMissing { .. }
            | MacrossError::ConfigInvalid { .. }
            | MacrossError::InvalidYears { .. }
            | MacrossError::InvalidWindowPair { .. } => 2,
            MacrossError::Data { .. } => 3,
            MacrossError::InsufficientData { .. } | MacrossError::InvalidPrice { .. } => 5,
            MacrossError::DegenerateSeries { .. } | MacrossError::EmptyGrid { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
