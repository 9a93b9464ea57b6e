//! Daily closing-price series and the per-invocation price table.

use crate::domain::error::RotatorError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Closing prices for one symbol, strictly ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting out-of-order or duplicate dates and
    /// non-finite or non-positive closes.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, RotatorError> {
        let symbol = symbol.into();

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(RotatorError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "close {} on {} is not a positive price",
                        point.close, point.date
                    ),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(RotatorError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "dates not strictly ascending at {} (after {})",
                        point.date,
                        points[i - 1].date
                    ),
                });
            }
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// A copy holding only the points dated on or before `date`.
    pub fn truncated_to(&self, date: NaiveDate) -> PriceSeries {
        let end = self.points.partition_point(|p| p.date <= date);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[..end].to_vec(),
        }
    }
}

/// Price series keyed by symbol.
///
/// Series are expected to be aligned by trading-day index. That alignment is
/// the caller's responsibility and is not re-validated here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: BTreeMap<String, PriceSeries>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a series under its own symbol, replacing any previous one.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn require(&self, symbol: &str) -> Result<&PriceSeries, RotatorError> {
        self.get(symbol).ok_or_else(|| RotatorError::MissingSymbol {
            symbol: symbol.to_string(),
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// True when every series has the same number of points.
    pub fn has_uniform_length(&self) -> bool {
        let mut lengths = self.series.values().map(PriceSeries::len);
        match lengths.next() {
            Some(first) => lengths.all(|len| len == first),
            None => true,
        }
    }

    pub fn truncated_to(&self, date: NaiveDate) -> PriceTable {
        PriceTable {
            series: self
                .series
                .iter()
                .map(|(symbol, series)| (symbol.clone(), series.truncated_to(date)))
                .collect(),
        }
    }
}
