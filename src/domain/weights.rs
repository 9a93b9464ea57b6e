//! Allocation weights for one rebalancing decision.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Symbol -> weight mapping with sorted iteration order.
///
/// Weights are not required to sum to 1.0. The rotation tree can leave
/// several symbols at 1.0 each, and that total is kept as is; callers that
/// want a proper portfolio use [`WeightMap::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightMap {
    weights: BTreeMap<String, f64>,
}

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `symbol` to `weight`, overwriting any earlier weight.
    pub fn set(&mut self, symbol: &str, weight: f64) {
        self.weights.insert(symbol.to_string(), weight);
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.weights.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.weights.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(s, w)| (s.as_str(), *w))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Copy scaled so the weights sum to 1.0. Empty or zero-total maps are
    /// returned unchanged.
    pub fn normalized(&self) -> WeightMap {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        WeightMap {
            weights: self
                .weights
                .iter()
                .map(|(s, w)| (s.clone(), w / total))
                .collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, f64)> for WeightMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut map = WeightMap::new();
        for (symbol, weight) in iter {
            map.set(symbol, weight);
        }
        map
    }
}

impl fmt::Display for WeightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (symbol, weight)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.2}", symbol, weight)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_overwrites() {
        let mut w = WeightMap::new();
        w.set("TQQQ", 0.5);
        w.set("TQQQ", 1.0);
        assert_eq!(w.len(), 1);
        assert_eq!(w.get("TQQQ"), Some(1.0));
    }

    #[test]
    fn total_can_exceed_one() {
        let w: WeightMap = [("UVXY", 1.0), ("TQQQ", 1.0)].into_iter().collect();
        assert_relative_eq!(w.total(), 2.0);
    }

    #[test]
    fn normalized_sums_to_one() {
        let w: WeightMap = [("UVXY", 1.0), ("TQQQ", 1.0)].into_iter().collect();
        let n = w.normalized();
        assert_relative_eq!(n.get("UVXY").unwrap(), 0.5);
        assert_relative_eq!(n.get("TQQQ").unwrap(), 0.5);
        assert_relative_eq!(n.total(), 1.0);
        // input map unchanged
        assert_relative_eq!(w.total(), 2.0);
    }

    #[test]
    fn normalized_empty_is_empty() {
        assert!(WeightMap::new().normalized().is_empty());
    }

    #[test]
    fn display_is_sorted() {
        let w: WeightMap = [("TQQQ", 1.0), ("SQQQ", 1.0)].into_iter().collect();
        assert_eq!(w.to_string(), "{SQQQ: 1.00, TQQQ: 1.00}");
    }

    #[test]
    fn serializes_as_plain_object() {
        let w: WeightMap = [("TLT", 1.0)].into_iter().collect();
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"TLT":1.0}"#);
    }
}
