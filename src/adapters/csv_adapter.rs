//! CSV file price data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv`. The header must name a close column
//! (`adj close`/`adj_close` preferred over `close`); the date column is `date`
//! or, failing that, the first column.

use crate::domain::error::MacrossError;
use crate::domain::price::{PricePoint, find_unordered};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PricePoint>, MacrossError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| MacrossError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| MacrossError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let (date_col, close_col) = locate_columns(&headers).ok_or_else(|| MacrossError::Data {
            reason: format!("{} has no close column", path.display()),
        })?;

        let mut points = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| MacrossError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let row = line + 2;

            let date_str = record.get(date_col).ok_or_else(|| MacrossError::Data {
                reason: format!("row {}: missing date column", row),
            })?;
            let date = parse_date(date_str).ok_or_else(|| MacrossError::Data {
                reason: format!("row {}: invalid date {:?}", row, date_str),
            })?;

            let close_str = record.get(close_col).unwrap_or("").trim();
            if close_str.is_empty() || close_str.eq_ignore_ascii_case("null") {
                debug!("{}: skipping {} with no close", symbol, date);
                continue;
            }
            let close: f64 = close_str.parse().map_err(|e| MacrossError::Data {
                reason: format!("row {}: invalid close value {:?}: {}", row, close_str, e),
            })?;

            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        if let Some(date) = find_unordered(&points) {
            return Err(MacrossError::Data {
                reason: format!("{}: duplicate date {}", path.display(), date),
            });
        }
        Ok(points)
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Option<(usize, usize)> {
    let names: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let find = |wanted: &[&str]| {
        wanted
            .iter()
            .find_map(|w| names.iter().position(|n| n == w))
    };

    let close = find(&["adj close", "adj_close", "adjclose", "close"])?;
    let date = find(&["date", "timestamp"]).unwrap_or(0);
    Some((date, close))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok().or_else(|| {
        chrono::NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
            .ok()
            .map(|dt| dt.date())
    })
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, MacrossError> {
        let points: Vec<PricePoint> = self
            .read_all(symbol)?
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect();
        debug!(
            "{}: {} closes between {} and {}",
            symbol,
            points.len(),
            start_date,
            end_date
        );
        Ok(points)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        let points = self.read_all(symbol)?;
        Ok(match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, points.len())),
            _ => None,
        })
    }
}
