//! Custom range post-filter: drop values outside explicit per-curve bounds.

use crate::error::{EngineError, Result};
use crate::types::Sample;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Inclusive bounds for one curve; a missing side does not constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueBounds {
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
}

impl ValueBounds {
    pub fn new(min_value: Option<f64>, max_value: Option<f64>) -> Result<Self> {
        if let (Some(min), Some(max)) = (min_value, max_value) {
            if min > max {
                return Err(EngineError::InvalidParameter(format!(
                    "minimum {} is greater than maximum {}",
                    min, max
                )));
            }
        }
        Ok(Self {
            min_value,
            max_value,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min_value.map_or(true, |min| value >= min)
            && self.max_value.map_or(true, |max| value <= max)
    }
}

/// Parses `MIN:MAX`, either side may be empty (`:50`, `10:`).
impl FromStr for ValueBounds {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let (min, max) = s.split_once(':').ok_or_else(|| {
            EngineError::InvalidParameter(format!("bounds '{}' must look like MIN:MAX", s))
        })?;

        let parse_side = |side: &str| -> Result<Option<f64>> {
            let side = side.trim();
            if side.is_empty() {
                return Ok(None);
            }
            side.parse::<f64>().map(Some).map_err(|_| {
                EngineError::InvalidParameter(format!("'{}' is not a number", side))
            })
        };

        ValueBounds::new(parse_side(min)?, parse_side(max)?)
    }
}

/// Positions of numeric values outside their curve's bounds, keyed by curve id.
pub(crate) fn out_of_bounds_positions(
    samples: &[Sample],
    index_curve: &str,
    bounds: &HashMap<String, ValueBounds>,
) -> BTreeMap<String, Vec<usize>> {
    bounds
        .iter()
        .filter(|(curve_id, _)| curve_id.as_str() != index_curve)
        .filter_map(|(curve_id, limits)| {
            let positions: Vec<usize> = samples
                .iter()
                .enumerate()
                .filter_map(|(pos, s)| match s.numeric(curve_id) {
                    Some(v) if !limits.contains(v) => Some(pos),
                    _ => None,
                })
                .collect();
            (!positions.is_empty()).then(|| (curve_id.clone(), positions))
        })
        .collect()
}

/// Set every numeric value outside its curve's `[min, max]` to absent.
pub fn filter_by_bounds(
    samples: &[Sample],
    index_curve: &str,
    bounds: &HashMap<String, ValueBounds>,
) -> Vec<Sample> {
    let removals = out_of_bounds_positions(samples, index_curve, bounds);
    let mut filtered = samples.to_vec();
    super::outlier::clear_positions(&mut filtered, &removals);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        [5.0, 10.0, 15.0, 20.0]
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                Sample::new(i as f64)
                    .with_value("DEPTH", i as f64)
                    .with_value("ROP", v)
                    .with_value("LITH", "shale")
            })
            .collect()
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = HashMap::from([("ROP".to_string(), ValueBounds::new(Some(10.0), Some(15.0)).unwrap())]);
        let filtered = filter_by_bounds(&samples(), "DEPTH", &bounds);

        let rop: Vec<Option<f64>> = filtered.iter().map(|s| s.numeric("ROP")).collect();
        assert_eq!(rop, vec![None, Some(10.0), Some(15.0), None]);
        assert!(filtered.iter().all(|s| s.is_present("LITH")));
    }

    #[test]
    fn test_open_sided_bounds() {
        let bounds = HashMap::from([("ROP".to_string(), ":12".parse::<ValueBounds>().unwrap())]);
        let filtered = filter_by_bounds(&samples(), "DEPTH", &bounds);
        assert_eq!(filtered.iter().filter(|s| s.is_present("ROP")).count(), 2);
    }

    #[test]
    fn test_index_curve_bounds_ignored() {
        let bounds = HashMap::from([("DEPTH".to_string(), ValueBounds::new(None, Some(0.0)).unwrap())]);
        assert_eq!(filter_by_bounds(&samples(), "DEPTH", &bounds), samples());
    }

    #[test]
    fn test_parse_bounds() {
        assert_eq!(
            "1.5:2".parse::<ValueBounds>().unwrap(),
            ValueBounds {
                min_value: Some(1.5),
                max_value: Some(2.0)
            }
        );
        assert!("2:1".parse::<ValueBounds>().is_err());
        assert!("abc".parse::<ValueBounds>().is_err());
        assert!("x:1".parse::<ValueBounds>().is_err());
    }
}
