//! Simple Moving Average.
//!
//! SMA(n) = mean of the last n closing prices.
//! Undefined when fewer than n prices are available.

use crate::domain::indicator::{IndicatorValue, UndefinedReason};
use crate::domain::price::PriceSeries;

pub fn calculate_sma(series: &PriceSeries, period: usize) -> IndicatorValue {
    let points = series.points();
    if period == 0 {
        return IndicatorValue::Undefined(UndefinedReason::ZeroWindow);
    }
    if points.len() < period {
        return IndicatorValue::Undefined(UndefinedReason::InsufficientHistory {
            required: period,
            available: points.len(),
        });
    }

    let window = &points[points.len() - period..];
    let sum: f64 = window.iter().map(|p| p.close).sum();
    IndicatorValue::Defined(sum / period as f64)
}
