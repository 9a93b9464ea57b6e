//! Technical indicator implementations.
//!
//! Indicators here return only the most recent value of a series:
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorValue`: a defined scalar or an explicit undefined marker
//! - `UndefinedReason`: why a value could not be computed

pub mod rsi;
pub mod sma;

use crate::domain::error::RotatorError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    /// Latest closing price.
    Price,
    Sma(usize),
    Rsi(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Defined(f64),
    Undefined(UndefinedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    InsufficientHistory { required: usize, available: usize },
    /// No gains and no losses over the window; RSI would be 0/0.
    FlatPrices,
    ZeroWindow,
}

impl IndicatorValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            IndicatorValue::Defined(v) => Some(*v),
            IndicatorValue::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, IndicatorValue::Defined(_))
    }

    /// Converts to a plain scalar, turning an undefined marker into the
    /// matching error for `symbol`.
    pub fn require(self, symbol: &str, indicator: IndicatorType) -> Result<f64, RotatorError> {
        match self {
            IndicatorValue::Defined(v) => Ok(v),
            IndicatorValue::Undefined(UndefinedReason::InsufficientHistory {
                required,
                available,
            }) => Err(RotatorError::InsufficientHistory {
                symbol: symbol.to_string(),
                indicator,
                required,
                available,
            }),
            IndicatorValue::Undefined(reason) => Err(RotatorError::IndicatorUndefined {
                symbol: symbol.to_string(),
                indicator,
                reason: reason.to_string(),
            }),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Price => write!(f, "PRICE"),
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::InsufficientHistory {
                required,
                available,
            } => write!(f, "need {} points, have {}", required, available),
            UndefinedReason::FlatPrices => write!(f, "flat prices over the window"),
            UndefinedReason::ZeroWindow => write!(f, "window must be positive"),
        }
    }
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Defined(v) => write!(f, "{:.2}", v),
            IndicatorValue::Undefined(reason) => write!(f, "undefined ({})", reason),
        }
    }
}
