//! Strategy parameters and configuration validation.
//!
//! Windows and thresholds default to the constants of the rotation strategy;
//! any of them can be overridden in the `[strategy]` config section.

use crate::domain::error::RotatorError;
use crate::domain::indicator::rsi::DEFAULT_RSI_PERIOD;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use serde::Serialize;

pub const STRATEGY_SECTION: &str = "strategy";
pub const DATA_SECTION: &str = "data";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyParams {
    /// SPY trend gate moving average window.
    pub trend_window: usize,
    /// TQQQ short-term moving average window.
    pub momentum_window: usize,
    pub rsi_window: usize,
    pub tqqq_overbought: f64,
    pub spxl_overbought: f64,
    pub tqqq_oversold: f64,
    pub spy_oversold: f64,
    pub sqqq_oversold: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            trend_window: 200,
            momentum_window: 20,
            rsi_window: DEFAULT_RSI_PERIOD,
            tqqq_overbought: 79.0,
            spxl_overbought: 80.0,
            tqqq_oversold: 31.0,
            spy_oversold: 30.0,
            sqqq_oversold: 31.0,
        }
    }
}

impl StrategyParams {
    /// Longest history any indicator of the strategy needs.
    pub fn required_history(&self) -> usize {
        self.trend_window
            .max(self.momentum_window)
            .max(self.rsi_window.saturating_add(1))
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RotatorError> {
        validate_strategy_config(config)?;
        let defaults = Self::default();
        Ok(Self {
            trend_window: get_window(config, "trend_window", defaults.trend_window),
            momentum_window: get_window(config, "momentum_window", defaults.momentum_window),
            rsi_window: get_window(config, "rsi_window", defaults.rsi_window),
            tqqq_overbought: config.get_double(
                STRATEGY_SECTION,
                "tqqq_overbought",
                defaults.tqqq_overbought,
            ),
            spxl_overbought: config.get_double(
                STRATEGY_SECTION,
                "spxl_overbought",
                defaults.spxl_overbought,
            ),
            tqqq_oversold: config.get_double(
                STRATEGY_SECTION,
                "tqqq_oversold",
                defaults.tqqq_oversold,
            ),
            spy_oversold: config.get_double(
                STRATEGY_SECTION,
                "spy_oversold",
                defaults.spy_oversold,
            ),
            sqqq_oversold: config.get_double(
                STRATEGY_SECTION,
                "sqqq_oversold",
                defaults.sqqq_oversold,
            ),
        })
    }
}

fn get_window(config: &dyn ConfigPort, key: &str, default: usize) -> usize {
    config.get_int(STRATEGY_SECTION, key, default as i64) as usize
}

/// Inclusive date window applied when loading prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RotatorError> {
        let start = parse_optional_date(config, DATA_SECTION, "start_date")?;
        let end = parse_optional_date(config, DATA_SECTION, "end_date")?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(RotatorError::ConfigInvalid {
                    section: DATA_SECTION.to_string(),
                    key: "start_date".to_string(),
                    reason: format!("start_date ({}) must be on or before end_date ({})", s, e),
                });
            }
        }
        Ok(Self { start, end })
    }
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, RotatorError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RotatorError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: "invalid date format (expected YYYY-MM-DD)".to_string(),
            }),
        _ => Ok(None),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    for key in ["trend_window", "momentum_window", "rsi_window"] {
        validate_window(config, key)?;
    }
    for key in [
        "tqqq_overbought",
        "spxl_overbought",
        "tqqq_oversold",
        "spy_oversold",
        "sqqq_oversold",
    ] {
        validate_threshold(config, key)?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), RotatorError> {
    let Some(raw) = config.get_string(STRATEGY_SECTION, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => Ok(()),
        _ => Err(RotatorError::ConfigInvalid {
            section: STRATEGY_SECTION.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a positive integer", key),
        }),
    }
}

fn validate_threshold(config: &dyn ConfigPort, key: &str) -> Result<(), RotatorError> {
    let Some(raw) = config.get_string(STRATEGY_SECTION, key) else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if (0.0..=100.0).contains(&v) => Ok(()),
        _ => Err(RotatorError::ConfigInvalid {
            section: STRATEGY_SECTION.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a number between 0 and 100", key),
        }),
    }
}

/// Validates every section the allocate command reads and returns the
/// parsed settings.
pub fn validate_config(
    config: &dyn ConfigPort,
) -> Result<(StrategyParams, DateWindow), RotatorError> {
    let params = StrategyParams::from_config(config)?;
    let window = DateWindow::from_config(config)?;
    Ok((params, window))
}
