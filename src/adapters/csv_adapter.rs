//! CSV file price store.
//!
//! One file per symbol, `<SYMBOL>.csv`, with a header row. The `date` and
//! `close` columns are found by header name, so plain `date,close` files and
//! full OHLCV exports both load.

use crate::domain::error::RotatorError;
use crate::domain::params::DateWindow;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

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
}

fn column_index(
    headers: &csv::StringRecord,
    name: &str,
    file: &str,
) -> Result<usize, RotatorError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| RotatorError::Data {
            reason: format!("{}: missing {} column", file, name),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        window: DateWindow,
    ) -> Result<Option<PriceSeries>, RotatorError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }
        let file = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| RotatorError::Data {
            reason: format!("failed to read {}: {}", file, e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| RotatorError::Data {
            reason: format!("{}: CSV header error: {}", file, e),
        })?;
        let date_col = column_index(headers, "date", &file)?;
        let close_col = column_index(headers, "close", &file)?;

        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| RotatorError::Data {
                reason: format!("{}: CSV parse error: {}", file, e),
            })?;

            let date_str = record.get(date_col).ok_or_else(|| RotatorError::Data {
                reason: format!("{}: missing date value", file),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                RotatorError::Data {
                    reason: format!("{}: invalid date {:?}: {}", file, date_str, e),
                }
            })?;

            if !window.contains(date) {
                continue;
            }

            let close: f64 = record
                .get(close_col)
                .ok_or_else(|| RotatorError::Data {
                    reason: format!("{}: missing close value on {}", file, date),
                })?
                .trim()
                .parse()
                .map_err(|e| RotatorError::Data {
                    reason: format!("{}: invalid close value on {}: {}", file, date, e),
                })?;

            points.push(PricePoint::new(date, close));
        }

        points.sort_by_key(|p| p.date);
        PriceSeries::new(symbol, points).map(Some)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RotatorError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RotatorError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| RotatorError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
