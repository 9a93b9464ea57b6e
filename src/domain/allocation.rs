//! Rotation allocation decision tree.
//!
//! Steps run in a fixed order over a [`WeightMap`] accumulator:
//!
//! 1. Trend gate: SPY price <= SMA(trend) -> `{TLT: 1}`, stop.
//! 2. TQQQ RSI > overbought -> `{UVXY: 1}`, stop.
//! 3. SPXL RSI > overbought -> UVXY, else TQQQ.
//! 4. TQQQ RSI < oversold -> TECL.
//! 5. SPY RSI < oversold -> UPRO.
//! 6. TQQQ price < SMA(momentum) -> SQQQ or TLT by lower RSI, else TQQQ.
//! 7. SQQQ RSI < oversold -> SQQQ (only after step 6 saw TQQQ below its SMA).
//!
//! Non-terminal steps only ever set entries; nothing set earlier is removed.
//! The result can therefore hold several symbols at 1.0 and sum to more than
//! 1.0. That matches the strategy as it has always run and is left for the
//! caller to normalize.

use crate::domain::error::RotatorError;
use crate::domain::indicator::IndicatorType;
use crate::domain::params::StrategyParams;
use crate::domain::price::PriceTable;
use crate::domain::snapshot::IndicatorSource;
use crate::domain::universe::{SPXL, SPY, SQQQ, TECL, TLT, TQQQ, UPRO, UVXY, check_universe};
use crate::domain::weights::WeightMap;
use serde::Serialize;
use std::fmt;

pub const FULL_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    TrendGate,
    TqqqOverbought,
    SpxlOverbought,
    TqqqOversold,
    SpyOversold,
    TqqqMomentum,
    SqqqOversold,
}

pub const STEPS: [Step; 7] = [
    Step::TrendGate,
    Step::TqqqOverbought,
    Step::SpxlOverbought,
    Step::TqqqOversold,
    Step::SpyOversold,
    Step::TqqqMomentum,
    Step::SqqqOversold,
];

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::TrendGate => "trend gate",
            Step::TqqqOverbought => "TQQQ overbought",
            Step::SpxlOverbought => "SPXL overbought",
            Step::TqqqOversold => "TQQQ oversold",
            Step::SpyOversold => "SPY oversold",
            Step::TqqqMomentum => "TQQQ momentum",
            Step::SqqqOversold => "SQQQ oversold",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "symbol", rename_all = "snake_case")]
pub enum StepAction {
    /// Set the symbol and stopped the tree.
    Terminated(String),
    Set(String),
    NoChange,
    /// Not evaluated because a value it depends on was never computed.
    Skipped,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Terminated(symbol) => write!(f, "{} = 1.0, stop", symbol),
            StepAction::Set(symbol) => write!(f, "{} = 1.0", symbol),
            StepAction::NoChange => write!(f, "no change"),
            StepAction::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    #[serde(flatten)]
    pub action: StepAction,
}

/// Indicator values read while deciding. A field stays `None` when no step
/// that was evaluated needed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapturedIndicators {
    pub spy_price: Option<f64>,
    pub spy_trend_sma: Option<f64>,
    pub tqqq_rsi: Option<f64>,
    pub spxl_rsi: Option<f64>,
    pub spy_rsi: Option<f64>,
    pub tqqq_price: Option<f64>,
    pub tqqq_momentum_sma: Option<f64>,
    /// Populated only when TQQQ closed below its momentum SMA.
    pub sqqq_rsi: Option<f64>,
    /// Populated only when TQQQ closed below its momentum SMA.
    pub tlt_rsi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub weights: WeightMap,
    pub trace: Vec<StepRecord>,
    pub indicators: CapturedIndicators,
}

enum Flow {
    Continue,
    Stop,
}

struct Evaluation<'a> {
    source: &'a dyn IndicatorSource,
    params: &'a StrategyParams,
    weights: WeightMap,
    trace: Vec<StepRecord>,
    captured: CapturedIndicators,
}

impl<'a> Evaluation<'a> {
    fn new(source: &'a dyn IndicatorSource, params: &'a StrategyParams) -> Self {
        Self {
            source,
            params,
            weights: WeightMap::new(),
            trace: Vec::with_capacity(STEPS.len()),
            captured: CapturedIndicators::default(),
        }
    }

    fn run(mut self) -> Result<Decision, RotatorError> {
        for step in STEPS {
            let (action, flow) = match step {
                Step::TrendGate => self.trend_gate()?,
                Step::TqqqOverbought => self.tqqq_overbought()?,
                Step::SpxlOverbought => self.spxl_overbought()?,
                Step::TqqqOversold => self.tqqq_oversold()?,
                Step::SpyOversold => self.spy_oversold()?,
                Step::TqqqMomentum => self.tqqq_momentum()?,
                Step::SqqqOversold => self.sqqq_oversold(),
            };
            tracing::debug!(step = %step, action = %action, "decision step");
            self.trace.push(StepRecord { step, action });
            if let Flow::Stop = flow {
                break;
            }
        }

        Ok(Decision {
            weights: self.weights,
            trace: self.trace,
            indicators: self.captured,
        })
    }

    fn read(&self, symbol: &str, indicator: IndicatorType) -> Result<f64, RotatorError> {
        self.source.indicator(symbol, indicator)
    }

    fn rsi(&self, symbol: &str) -> Result<f64, RotatorError> {
        self.read(symbol, IndicatorType::Rsi(self.params.rsi_window))
    }

    fn set(&mut self, symbol: &str) -> StepAction {
        self.weights.set(symbol, FULL_WEIGHT);
        StepAction::Set(symbol.to_string())
    }

    fn terminate(&mut self, symbol: &str) -> (StepAction, Flow) {
        self.weights.set(symbol, FULL_WEIGHT);
        (StepAction::Terminated(symbol.to_string()), Flow::Stop)
    }

    fn trend_gate(&mut self) -> Result<(StepAction, Flow), RotatorError> {
        let price = self.read(SPY, IndicatorType::Price)?;
        let sma = self.read(SPY, IndicatorType::Sma(self.params.trend_window))?;
        self.captured.spy_price = Some(price);
        self.captured.spy_trend_sma = Some(sma);

        if price <= sma {
            return Ok(self.terminate(TLT));
        }
        Ok((StepAction::NoChange, Flow::Continue))
    }

    fn tqqq_overbought(&mut self) -> Result<(StepAction, Flow), RotatorError> {
        let rsi = self.rsi(TQQQ)?;
        self.captured.tqqq_rsi = Some(rsi);

        if rsi > self.params.tqqq_overbought {
            return Ok(self.terminate(UVXY));
        }
        Ok((StepAction::NoChange, Flow::Continue))
    }

    fn spxl_overbought(&mut self) -> Result<(StepAction, Flow), RotatorError> {
        let rsi = self.rsi(SPXL)?;
        self.captured.spxl_rsi = Some(rsi);

        let action = if rsi > self.params.spxl_overbought {
            self.set(UVXY)
        } else {
            self.set(TQQQ)
        };
        Ok((action, Flow::Continue))
    }

    fn tqqq_oversold(&mut self) -> Result<(StepAction, Flow), RotatorError> {
        let rsi = match self.captured.tqqq_rsi {
            Some(v) => v,
            None => self.rsi(TQQQ)?,
        };

        let action = if rsi < self.params.tqqq_oversold {
            self.set(TECL)
        } else {
            StepAction::NoChange
        };
        Ok((action, Flow::Continue))
    }

    fn spy_oversold(&mut self) -> Result<(StepAction, Flow), RotatorError> {
        let rsi = self.rsi(SPY)?;
        self.captured.spy_rsi = Some(rsi);

        let action = if rsi < self.params.spy_oversold {
            self.set(UPRO)
        } else {
            StepAction::NoChange
        };
        Ok((action, Flow::Continue))
    }

    fn tqqq_momentum(&mut self) -> Result<(StepAction, Flow), RotatorError> {
        let price = self.read(TQQQ, IndicatorType::Price)?;
        let sma = self.read(TQQQ, IndicatorType::Sma(self.params.momentum_window))?;
        self.captured.tqqq_price = Some(price);
        self.captured.tqqq_momentum_sma = Some(sma);

        if price >= sma {
            return Ok((self.set(TQQQ), Flow::Continue));
        }

        let sqqq_rsi = self.rsi(SQQQ)?;
        let tlt_rsi = self.rsi(TLT)?;
        self.captured.sqqq_rsi = Some(sqqq_rsi);
        self.captured.tlt_rsi = Some(tlt_rsi);

        let action = if sqqq_rsi < tlt_rsi {
            self.set(SQQQ)
        } else {
            self.set(TLT)
        };
        Ok((action, Flow::Continue))
    }

    fn sqqq_oversold(&mut self) -> (StepAction, Flow) {
        let action = match self.captured.sqqq_rsi {
            None => StepAction::Skipped,
            Some(rsi) if rsi < self.params.sqqq_oversold => self.set(SQQQ),
            Some(_) => StepAction::NoChange,
        };
        (action, Flow::Stop)
    }
}

/// Runs the rotation tree against `source`.
///
/// Indicators are requested only by the steps that actually run, so a value
/// that a terminal step makes unnecessary can never fail the decision. Any
/// value a running step needs that is unavailable fails the whole decision
/// and no partial weights are returned.
pub fn decide(
    source: &dyn IndicatorSource,
    params: &StrategyParams,
) -> Result<Decision, RotatorError> {
    Evaluation::new(source, params).run()
}

/// Checks that `table` covers the full universe, then decides.
pub fn allocate(table: &PriceTable, params: &StrategyParams) -> Result<Decision, RotatorError> {
    check_universe(table)?;
    decide(table, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::IndicatorSnapshot;

    const RSI: IndicatorType = IndicatorType::Rsi(14);

    struct Inputs {
        spy_price: f64,
        spy_sma: f64,
        spy_rsi: f64,
        tqqq_price: f64,
        tqqq_sma: f64,
        tqqq_rsi: f64,
        spxl_rsi: f64,
        sqqq_rsi: f64,
        tlt_rsi: f64,
    }

    impl Default for Inputs {
        fn default() -> Self {
            Self {
                spy_price: 110.0,
                spy_sma: 100.0,
                spy_rsi: 50.0,
                tqqq_price: 60.0,
                tqqq_sma: 50.0,
                tqqq_rsi: 50.0,
                spxl_rsi: 50.0,
                sqqq_rsi: 50.0,
                tlt_rsi: 50.0,
            }
        }
    }

    impl Inputs {
        fn snapshot(&self) -> IndicatorSnapshot {
            IndicatorSnapshot::new()
                .with(SPY, IndicatorType::Price, self.spy_price)
                .with(SPY, IndicatorType::Sma(200), self.spy_sma)
                .with(SPY, RSI, self.spy_rsi)
                .with(TQQQ, IndicatorType::Price, self.tqqq_price)
                .with(TQQQ, IndicatorType::Sma(20), self.tqqq_sma)
                .with(TQQQ, RSI, self.tqqq_rsi)
                .with(SPXL, RSI, self.spxl_rsi)
                .with(SQQQ, RSI, self.sqqq_rsi)
                .with(TLT, RSI, self.tlt_rsi)
        }

        fn decide(&self) -> Decision {
            decide(&self.snapshot(), &StrategyParams::default()).unwrap()
        }
    }

    fn weights(pairs: &[(&str, f64)]) -> WeightMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn spy_below_trend_goes_to_bonds() {
        let d = Inputs {
            spy_price: 90.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TLT", 1.0)]));
        assert_eq!(d.trace.len(), 1);
        assert_eq!(d.trace[0].action, StepAction::Terminated("TLT".into()));
    }

    #[test]
    fn spy_equal_to_trend_goes_to_bonds() {
        let d = Inputs {
            spy_price: 100.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TLT", 1.0)]));
    }

    #[test]
    fn trend_gate_needs_only_spy() {
        let snap = IndicatorSnapshot::new()
            .with(SPY, IndicatorType::Price, 90.0)
            .with(SPY, IndicatorType::Sma(200), 100.0);
        let d = decide(&snap, &StrategyParams::default()).unwrap();
        assert_eq!(d.weights, weights(&[("TLT", 1.0)]));
        assert_eq!(d.indicators.tqqq_rsi, None);
    }

    #[test]
    fn tqqq_overbought_goes_to_volatility() {
        let d = Inputs {
            tqqq_rsi: 85.0,
            spxl_rsi: 10.0,
            spy_rsi: 10.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("UVXY", 1.0)]));
        assert_eq!(d.trace.len(), 2);
    }

    #[test]
    fn tqqq_rsi_at_threshold_is_not_overbought() {
        let d = Inputs {
            tqqq_rsi: 79.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TQQQ", 1.0)]));
    }

    #[test]
    fn spxl_overbought_accumulates_with_tqqq() {
        let d = Inputs {
            spxl_rsi: 90.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TQQQ", 1.0), ("UVXY", 1.0)]));
        assert_eq!(d.weights.total(), 2.0);
        assert_eq!(d.trace[2].action, StepAction::Set("UVXY".into()));
        assert_eq!(d.trace[5].action, StepAction::Set("TQQQ".into()));
    }

    #[test]
    fn tqqq_oversold_adds_tecl() {
        let d = Inputs {
            tqqq_rsi: 20.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TECL", 1.0), ("TQQQ", 1.0)]));
    }

    #[test]
    fn spy_oversold_adds_upro() {
        let d = Inputs {
            spy_rsi: 25.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TQQQ", 1.0), ("UPRO", 1.0)]));
    }

    #[test]
    fn tqqq_below_momentum_picks_lower_rsi_hedge() {
        let d = Inputs {
            tqqq_price: 40.0,
            sqqq_rsi: 40.0,
            tlt_rsi: 60.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("SQQQ", 1.0), ("TQQQ", 1.0)]));
        assert_eq!(d.indicators.sqqq_rsi, Some(40.0));
        assert_eq!(d.trace[6].action, StepAction::NoChange);
    }

    #[test]
    fn tqqq_below_momentum_equal_rsi_picks_bonds() {
        let d = Inputs {
            tqqq_price: 40.0,
            sqqq_rsi: 55.0,
            tlt_rsi: 55.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TLT", 1.0), ("TQQQ", 1.0)]));
    }

    #[test]
    fn sqqq_oversold_after_bonds_branch() {
        let d = Inputs {
            tqqq_price: 40.0,
            sqqq_rsi: 20.0,
            tlt_rsi: 10.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(
            d.weights,
            weights(&[("SQQQ", 1.0), ("TLT", 1.0), ("TQQQ", 1.0)])
        );
        assert_eq!(d.trace[6].action, StepAction::Set("SQQQ".into()));
    }

    #[test]
    fn sqqq_step_skipped_when_tqqq_above_momentum() {
        // SQQQ RSI would be oversold but is never read on this branch.
        let d = Inputs {
            sqqq_rsi: 5.0,
            ..Inputs::default()
        }
        .decide();
        assert_eq!(d.weights, weights(&[("TQQQ", 1.0)]));
        assert_eq!(d.indicators.sqqq_rsi, None);
        assert_eq!(d.trace.last().unwrap().action, StepAction::Skipped);
    }

    #[test]
    fn hedge_indicators_not_required_above_momentum() {
        let snap = IndicatorSnapshot::new()
            .with(SPY, IndicatorType::Price, 110.0)
            .with(SPY, IndicatorType::Sma(200), 100.0)
            .with(SPY, RSI, 50.0)
            .with(TQQQ, IndicatorType::Price, 60.0)
            .with(TQQQ, IndicatorType::Sma(20), 50.0)
            .with(TQQQ, RSI, 50.0)
            .with(SPXL, RSI, 50.0);
        let d = decide(&snap, &StrategyParams::default()).unwrap();
        assert_eq!(d.weights, weights(&[("TQQQ", 1.0)]));
    }

    #[test]
    fn undefined_indicator_fails_whole_decision() {
        let mut snap = Inputs::default().snapshot();
        snap.insert(
            SPXL,
            RSI,
            crate::domain::indicator::IndicatorValue::Undefined(
                crate::domain::indicator::UndefinedReason::InsufficientHistory {
                    required: 15,
                    available: 3,
                },
            ),
        );
        let err = decide(&snap, &StrategyParams::default()).unwrap_err();
        assert!(matches!(
            err,
            RotatorError::InsufficientHistory { ref symbol, indicator: IndicatorType::Rsi(14), .. }
                if symbol == "SPXL"
        ));
    }

    #[test]
    fn decide_is_repeatable() {
        let inputs = Inputs {
            spxl_rsi: 90.0,
            tqqq_price: 40.0,
            ..Inputs::default()
        };
        assert_eq!(inputs.decide(), inputs.decide());
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let params = StrategyParams {
            tqqq_overbought: 60.0,
            ..StrategyParams::default()
        };
        let snap = Inputs {
            tqqq_rsi: 65.0,
            ..Inputs::default()
        }
        .snapshot();
        let d = decide(&snap, &params).unwrap();
        assert_eq!(d.weights, weights(&[("UVXY", 1.0)]));
    }

    #[test]
    fn step_order_is_fixed() {
        let d = Inputs::default().decide();
        let steps: Vec<Step> = d.trace.iter().map(|r| r.step).collect();
        assert_eq!(steps, STEPS.to_vec());
    }
}
