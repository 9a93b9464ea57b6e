//! RSI (Relative Strength Index), latest value only.
//!
//! Average gain/loss are simple means over the trailing n price changes
//! (no Wilder smoothing):
//! - gain = max(change, 0), loss = max(-change, 0)
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! avg_loss == 0 with avg_gain > 0 gives 100, the limit of the formula.
//! avg_loss == avg_gain == 0 (flat prices) is undefined rather than a number.
//!
//! Needs n + 1 prices to produce n changes.

use crate::domain::indicator::{IndicatorValue, UndefinedReason};
use crate::domain::price::PriceSeries;

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> IndicatorValue {
    let points = series.points();
    if period == 0 {
        return IndicatorValue::Undefined(UndefinedReason::ZeroWindow);
    }
    if points.len() <= period {
        return IndicatorValue::Undefined(UndefinedReason::InsufficientHistory {
            required: period.saturating_add(1),
            available: points.len(),
        });
    }

    let window = &points[points.len() - period - 1..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let change = pair[1].close - pair[0].close;
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum -= change;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain > 0.0 {
            IndicatorValue::Defined(100.0)
        } else {
            IndicatorValue::Undefined(UndefinedReason::FlatPrices)
        };
    }

    IndicatorValue::Defined(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
}
