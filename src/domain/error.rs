//! Domain error types.

use crate::domain::indicator::IndicatorType;

/// Top-level error type for rotator.
///
/// An indicator needed by the decision can fail in two ways.
/// `InsufficientHistory` means the series is shorter than the window.
/// `IndicatorUndefined` covers every other undefined value: an RSI over flat
/// prices, a zero window, or an indicator missing from a snapshot. Callers
/// handling short history alone should match both.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    #[error(
        "insufficient history for {indicator} of {symbol}: need {required} points, have {available}"
    )]
    InsufficientHistory {
        symbol: String,
        indicator: IndicatorType,
        required: usize,
        available: usize,
    },

    /// Defined history that still yields no value, such as flat-price RSI.
    #[error("{indicator} of {symbol} is undefined: {reason}")]
    IndicatorUndefined {
        symbol: String,
        indicator: IndicatorType,
        reason: String,
    },

    #[error("missing symbol {symbol} in price table")]
    MissingSymbol { symbol: String },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("price data error: {reason}")]
    Data { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RotatorError {
    /// Process exit status reported by the CLI for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            RotatorError::Io(_) | RotatorError::Json(_) => 1,
            RotatorError::ConfigParse { .. }
            | RotatorError::ConfigMissing { .. }
            | RotatorError::ConfigInvalid { .. } => 2,
            RotatorError::Data { .. } | RotatorError::InvalidSeries { .. } => 3,
            RotatorError::MissingSymbol { .. }
            | RotatorError::InsufficientHistory { .. }
            | RotatorError::IndicatorUndefined { .. } => 5,
        }
    }
}

impl From<&RotatorError> for std::process::ExitCode {
    fn from(err: &RotatorError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
