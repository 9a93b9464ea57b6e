#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rotator::domain::error::RotatorError;
use rotator::domain::params::DateWindow;
pub use rotator::domain::price::{PricePoint, PriceSeries, PriceTable};
use rotator::domain::universe::REQUIRED_SYMBOLS;
use rotator::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.symbol().to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn from_table(table: &PriceTable) -> Self {
        let mut port = Self::new();
        for symbol in table.symbols() {
            port = port.with_series(table.get(symbol).unwrap().clone());
        }
        port
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        symbol: &str,
        window: DateWindow,
    ) -> Result<Option<PriceSeries>, RotatorError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RotatorError::Data {
                reason: reason.clone(),
            });
        }
        let Some(series) = self.data.get(symbol) else {
            return Ok(None);
        };
        let points = series
            .points()
            .iter()
            .copied()
            .filter(|p| window.contains(p.date))
            .collect();
        PriceSeries::new(symbol, points).map(Some)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RotatorError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

pub fn make_series(symbol: &str, closes: &[f64]) -> PriceSeries {
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start_date() + Duration::days(i as i64), close))
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

/// 100, 101, 102, ... : SMA below price, RSI 100.
pub fn rising(symbol: &str, len: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
    make_series(symbol, &closes)
}

/// 400, 399, 398, ... : SMA above price, RSI 0.
pub fn falling(symbol: &str, len: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..len).map(|i| 400.0 - i as f64).collect();
    make_series(symbol, &closes)
}

/// 100, 101, 100, 101, ... : RSI 50, SMA(20) 100.5.
pub fn alternating(symbol: &str, len: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..len)
        .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
        .collect();
    make_series(symbol, &closes)
}

pub fn flat(symbol: &str, len: usize) -> PriceSeries {
    make_series(symbol, &vec![50.0; len])
}

/// Every required symbol rising over `len` days.
pub fn rising_table(len: usize) -> PriceTable {
    let mut table = PriceTable::new();
    for symbol in REQUIRED_SYMBOLS {
        table.insert(rising(symbol, len));
    }
    table
}
