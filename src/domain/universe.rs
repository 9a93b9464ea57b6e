//! The fixed instrument universe of the rotation strategy.
//!
//! Loads every required symbol through a [`DataPort`] into a [`PriceTable`]
//! and checks that none is absent before a decision runs.

use crate::domain::error::RotatorError;
use crate::domain::params::DateWindow;
use crate::domain::price::PriceTable;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

pub const SPY: &str = "SPY";
pub const TQQQ: &str = "TQQQ";
pub const SPXL: &str = "SPXL";
pub const UVXY: &str = "UVXY";
pub const TECL: &str = "TECL";
pub const UPRO: &str = "UPRO";
pub const SQQQ: &str = "SQQQ";
pub const TLT: &str = "TLT";

pub const REQUIRED_SYMBOLS: [&str; 8] = [SPY, TQQQ, SPXL, UVXY, TECL, UPRO, SQQQ, TLT];

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parses a comma-separated symbol list, upper-casing each entry.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Fails with `MissingSymbol` for the first required symbol the table lacks.
pub fn check_universe(table: &PriceTable) -> Result<(), RotatorError> {
    match REQUIRED_SYMBOLS.iter().find(|s| !table.contains(s)) {
        Some(symbol) => Err(RotatorError::MissingSymbol {
            symbol: symbol.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn load_price_table(
    data_port: &dyn DataPort,
    symbols: &[&str],
    window: DateWindow,
) -> Result<PriceTable, RotatorError> {
    let mut table = PriceTable::new();

    for &symbol in symbols {
        let series = data_port
            .fetch_closes(symbol, window)?
            .ok_or_else(|| RotatorError::MissingSymbol {
                symbol: symbol.to_string(),
            })?;
        tracing::debug!(symbol, points = series.len(), "loaded price series");
        table.insert(series);
    }

    if !table.has_uniform_length() {
        tracing::warn!("price series lengths differ; series are assumed aligned by trading day");
    }

    Ok(table)
}
