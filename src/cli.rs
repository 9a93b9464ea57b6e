//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::allocation::{self, CapturedIndicators, Decision, StepRecord};
use crate::domain::error::RotatorError;
use crate::domain::params::{DATA_SECTION, DateWindow, StrategyParams, validate_config};
use crate::domain::universe::{REQUIRED_SYMBOLS, SPY, load_price_table, parse_symbols};
use crate::domain::weights::WeightMap;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "rotator", about = "Indicator-driven ETF rotation allocator")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the allocation for the latest (or --as-of) trading day
    Allocate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Ignore prices dated after this day (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Scale weights to sum to 1.0
        #[arg(long)]
        normalize: bool,
        #[arg(long)]
        json: bool,
        /// Print the decision steps and the indicator values they used
        #[arg(long)]
        explain: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated symbols; defaults to every symbol in the store
        #[arg(long)]
        symbol: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocateOptions {
    pub as_of: Option<NaiveDate>,
    pub normalize: bool,
    pub json: bool,
    pub explain: bool,
}

/// Everything the allocate command reports for one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    /// Date of the latest SPY close the decision used.
    pub as_of: Option<NaiveDate>,
    pub weights: WeightMap,
    pub total_weight: f64,
    pub normalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<StepRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<CapturedIndicators>,
}

impl AllocationReport {
    pub fn from_decision(
        decision: Decision,
        as_of: Option<NaiveDate>,
        opts: &AllocateOptions,
    ) -> Self {
        let Decision {
            weights,
            trace,
            indicators,
        } = decision;
        let total_weight = weights.total();
        let weights = if opts.normalize {
            weights.normalized()
        } else {
            weights
        };
        Self {
            as_of,
            weights,
            total_weight,
            normalized: opts.normalize,
            trace: opts.explain.then_some(trace),
            indicators: opts.explain.then_some(indicators),
        }
    }

    pub fn render(&self, json: bool) -> Result<String, RotatorError> {
        if json {
            return Ok(serde_json::to_string_pretty(self)?);
        }

        let mut out = String::new();
        if let Some(date) = self.as_of {
            let _ = writeln!(out, "Allocation as of {}", date);
        }
        for (symbol, weight) in self.weights.iter() {
            let _ = writeln!(out, "  {:<6} {:.4}", symbol, weight);
        }
        if !self.normalized && self.total_weight > 1.0 {
            let _ = writeln!(
                out,
                "  (weights sum to {:.2}; use --normalize to scale to 1.0)",
                self.total_weight
            );
        }

        if let Some(trace) = &self.trace {
            let _ = writeln!(out, "\nDecision steps:");
            for (i, record) in trace.iter().enumerate() {
                let _ = writeln!(out, "  {}. {:<16} {}", i + 1, record.step, record.action);
            }
        }
        if let Some(ind) = &self.indicators {
            let _ = writeln!(out, "\nIndicators used:");
            let rows = [
                ("SPY price", ind.spy_price),
                ("SPY trend SMA", ind.spy_trend_sma),
                ("SPY RSI", ind.spy_rsi),
                ("TQQQ price", ind.tqqq_price),
                ("TQQQ momentum SMA", ind.tqqq_momentum_sma),
                ("TQQQ RSI", ind.tqqq_rsi),
                ("SPXL RSI", ind.spxl_rsi),
                ("SQQQ RSI", ind.sqqq_rsi),
                ("TLT RSI", ind.tlt_rsi),
            ];
            for (label, value) in rows {
                if let Some(v) = value {
                    let _ = writeln!(out, "  {:<18} {:.2}", label, v);
                }
            }
        }
        Ok(out)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Allocate {
            config,
            data_dir,
            as_of,
            normalize,
            json,
            explain,
        } => {
            let opts = AllocateOptions {
                as_of,
                normalize,
                json,
                explain,
            };
            run_allocate(&config, data_dir.as_deref(), &opts)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            data_dir,
            symbol,
        } => run_info(&config, data_dir.as_deref(), symbol.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RotatorError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// `--data-dir` wins over `[data] dir`.
pub fn resolve_data_dir(
    override_dir: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, RotatorError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    config
        .get_string(DATA_SECTION, "dir")
        .filter(|d| !d.trim().is_empty())
        .map(|d| PathBuf::from(d.trim()))
        .ok_or_else(|| RotatorError::ConfigMissing {
            section: DATA_SECTION.to_string(),
            key: "dir".to_string(),
        })
}

fn run_allocate(
    config_path: &Path,
    data_dir: Option<&Path>,
    opts: &AllocateOptions,
) -> Result<(), RotatorError> {
    let config = load_config(config_path)?;
    let (params, window) = validate_config(&config)?;
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir, &config)?);

    let report = run_allocate_pipeline(&data_port, &params, window, opts)?;
    print!("{}", report.render(opts.json)?);
    if opts.json {
        println!();
    }
    Ok(())
}

/// Load the universe, apply `--as-of`, decide, and build the report.
pub fn run_allocate_pipeline(
    data_port: &dyn DataPort,
    params: &StrategyParams,
    window: DateWindow,
    opts: &AllocateOptions,
) -> Result<AllocationReport, RotatorError> {
    let mut table = load_price_table(data_port, &REQUIRED_SYMBOLS, window)?;
    if let Some(as_of) = opts.as_of {
        table = table.truncated_to(as_of);
    }

    let as_of = table.get(SPY).and_then(|s| s.last_date());
    tracing::info!(
        symbols = table.len(),
        as_of = ?as_of,
        "running allocation"
    );

    let decision = allocation::allocate(&table, params)?;
    tracing::info!(weights = %decision.weights, "allocation decided");
    if decision.weights.total() > 1.0 {
        tracing::warn!(
            total = decision.weights.total(),
            "allocation weights sum to more than 1.0"
        );
    }

    Ok(AllocationReport::from_decision(decision, as_of, opts))
}

fn run_validate(config_path: &Path) -> Result<(), RotatorError> {
    let config = load_config(config_path)?;
    let (params, window) = validate_config(&config)?;

    println!("Strategy parameters:");
    println!("  trend_window     = {}", params.trend_window);
    println!("  momentum_window  = {}", params.momentum_window);
    println!("  rsi_window       = {}", params.rsi_window);
    println!("  tqqq_overbought  = {}", params.tqqq_overbought);
    println!("  spxl_overbought  = {}", params.spxl_overbought);
    println!("  tqqq_oversold    = {}", params.tqqq_oversold);
    println!("  spy_oversold     = {}", params.spy_oversold);
    println!("  sqqq_oversold    = {}", params.sqqq_oversold);
    println!("Required history: {} points", params.required_history());
    match (window.start, window.end) {
        (None, None) => println!("Date window: all available data"),
        (start, end) => println!(
            "Date window: {} to {}",
            start.map_or("start".to_string(), |d| d.to_string()),
            end.map_or("end".to_string(), |d| d.to_string()),
        ),
    }
    match config.get_string(DATA_SECTION, "dir") {
        Some(dir) => println!("Data directory: {}", dir),
        None => println!("Data directory: not set (pass --data-dir)"),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(
    config_path: &Path,
    data_dir: Option<&Path>,
    symbols: Option<&str>,
) -> Result<(), RotatorError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir, &config)?);
    let params = StrategyParams::from_config(&config)?;

    for line in collect_info(&data_port, symbols, params.required_history())? {
        println!("{}", line);
    }
    Ok(())
}

/// One summary line per symbol: date range, point count, and whether the
/// history is long enough for the strategy.
pub fn collect_info(
    data_port: &dyn DataPort,
    symbols: Option<&str>,
    required_history: usize,
) -> Result<Vec<String>, RotatorError> {
    let listed_store = symbols.is_none();
    let symbols = match symbols {
        Some(list) => parse_symbols(list).map_err(|e| RotatorError::ConfigInvalid {
            section: "cli".to_string(),
            key: "symbol".to_string(),
            reason: e.to_string(),
        })?,
        None => data_port.list_symbols()?,
    };

    let mut lines = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        let line = match data_port.get_data_range(symbol)? {
            Some((first, last, count)) => {
                let status = if count >= required_history { "OK" } else { "SHORT" };
                format!(
                    "{}: {} to {} ({} points) [{}]",
                    symbol, first, last, count, status
                )
            }
            None => format!("{}: no data", symbol),
        };
        lines.push(line);
    }

    if listed_store {
        for required in REQUIRED_SYMBOLS {
            if !symbols.iter().any(|s| s == required) {
                tracing::warn!(symbol = required, "required symbol not present in store");
            }
        }
    }

    Ok(lines)
}
