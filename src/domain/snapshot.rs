//! Latest indicator values consumed by the allocation tree.
//!
//! The tree asks an [`IndicatorSource`] for each value at the moment a step
//! needs it. A [`PriceTable`] computes values from history on demand; an
//! [`IndicatorSnapshot`] holds values computed ahead of time.

use crate::domain::error::RotatorError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorType, IndicatorValue, UndefinedReason};
use crate::domain::params::StrategyParams;
use crate::domain::price::{PriceSeries, PriceTable};
use crate::domain::universe::{SPXL, SPY, SQQQ, TLT, TQQQ};
use std::collections::HashMap;

pub trait IndicatorSource {
    /// Latest value of `indicator` for `symbol`, or the error explaining why
    /// it is unavailable.
    fn indicator(&self, symbol: &str, indicator: IndicatorType) -> Result<f64, RotatorError>;
}

/// Latest value of `indicator` over a single series.
pub fn latest_value(series: &PriceSeries, indicator: IndicatorType) -> IndicatorValue {
    match indicator {
        IndicatorType::Price => match series.latest() {
            Some(p) => IndicatorValue::Defined(p.close),
            None => IndicatorValue::Undefined(UndefinedReason::InsufficientHistory {
                required: 1,
                available: 0,
            }),
        },
        IndicatorType::Sma(period) => calculate_sma(series, period),
        IndicatorType::Rsi(period) => calculate_rsi(series, period),
    }
}

impl IndicatorSource for PriceTable {
    fn indicator(&self, symbol: &str, indicator: IndicatorType) -> Result<f64, RotatorError> {
        let series = self.require(symbol)?;
        latest_value(series, indicator).require(symbol, indicator)
    }
}

/// Precomputed indicator values keyed by symbol and indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    values: HashMap<String, HashMap<IndicatorType, IndicatorValue>>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, indicator: IndicatorType, value: IndicatorValue) {
        self.values
            .entry(symbol.to_string())
            .or_default()
            .insert(indicator, value);
    }

    /// Builder-style insert of a defined value.
    pub fn with(mut self, symbol: &str, indicator: IndicatorType, value: f64) -> Self {
        self.insert(symbol, indicator, IndicatorValue::Defined(value));
        self
    }

    pub fn get(&self, symbol: &str, indicator: IndicatorType) -> Option<IndicatorValue> {
        self.values.get(symbol)?.get(&indicator).copied()
    }

    /// Computes every indicator the rotation tree may need. Undefined values
    /// are stored as such; only an absent symbol is an error.
    pub fn from_table(table: &PriceTable, params: &StrategyParams) -> Result<Self, RotatorError> {
        let mut snapshot = Self::new();
        let rsi = IndicatorType::Rsi(params.rsi_window);

        let wanted: [(&str, &[IndicatorType]); 5] = [
            (
                SPY,
                &[IndicatorType::Price, IndicatorType::Sma(params.trend_window), rsi],
            ),
            (
                TQQQ,
                &[IndicatorType::Price, IndicatorType::Sma(params.momentum_window), rsi],
            ),
            (SPXL, &[rsi]),
            (SQQQ, &[rsi]),
            (TLT, &[rsi]),
        ];

        for (symbol, indicators) in wanted {
            let series = table.require(symbol)?;
            for &indicator in indicators {
                let value = latest_value(series, indicator);
                snapshot.insert(symbol, indicator, value);
            }
        }

        Ok(snapshot)
    }
}

impl IndicatorSource for IndicatorSnapshot {
    fn indicator(&self, symbol: &str, indicator: IndicatorType) -> Result<f64, RotatorError> {
        let Some(by_indicator) = self.values.get(symbol) else {
            return Err(RotatorError::MissingSymbol {
                symbol: symbol.to_string(),
            });
        };
        match by_indicator.get(&indicator) {
            Some(value) => value.require(symbol, indicator),
            None => Err(RotatorError::IndicatorUndefined {
                symbol: symbol.to_string(),
                indicator,
                reason: "not present in snapshot".to_string(),
            }),
        }
    }
}
