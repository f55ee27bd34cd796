//! Two-pass Z-score outlier removal
//!
//! Sensor glitches show up as isolated values far from the rest of a curve.
//! A value is removed only when it is an outlier twice:
//! 1. Globally, against the mean and population standard deviation of every
//!    present value of the curve.
//! 2. Locally, against a window of neighbouring present values centred on it
//!    (clipped at the ends of the column, never padded).
//!
//! Columns without spread (all values equal) never produce outliers.

use crate::error::{EngineError, Result};
use crate::types::{collect_curve_ids, CurveColumn, Sample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Thresholds of the two passes and the local window width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPreset {
    /// |z| above which a value is a candidate in the global pass
    pub global_z: f64,
    /// |z| above which a candidate is removed in the local pass
    pub local_z: f64,
    /// Number of present values in the local window
    pub window_size: usize,
}

impl SensitivityPreset {
    pub const LOW: Self = Self {
        global_z: 2.0,
        local_z: 2.5,
        window_size: 12,
    };

    pub const MEDIUM: Self = Self {
        global_z: 1.5,
        local_z: 1.5,
        window_size: 20,
    };

    pub const HIGH: Self = Self {
        global_z: 0.7,
        local_z: 0.5,
        window_size: 28,
    };

    pub fn new(global_z: f64, local_z: f64, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(EngineError::InvalidParameter(
                "window_size must be a positive integer".to_string(),
            ));
        }
        if !(global_z.is_finite() && global_z >= 0.0) || !(local_z.is_finite() && local_z >= 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "z thresholds must be finite and non-negative (global {}, local {})",
                global_z, local_z
            )));
        }
        Ok(Self {
            global_z,
            local_z,
            window_size,
        })
    }
}

impl Default for SensitivityPreset {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// Built-in sensitivity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

impl Sensitivity {
    pub fn all() -> [Sensitivity; 3] {
        [Sensitivity::Low, Sensitivity::Medium, Sensitivity::High]
    }

    pub fn preset(&self) -> SensitivityPreset {
        match self {
            Sensitivity::Low => SensitivityPreset::LOW,
            Sensitivity::Medium => SensitivityPreset::MEDIUM,
            Sensitivity::High => SensitivityPreset::HIGH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sensitivity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => Err(EngineError::InvalidParameter(format!(
                "unknown sensitivity '{}', expected low, medium or high",
                other
            ))),
        }
    }
}

struct Spread {
    mean: f64,
    std_dev: f64,
}

/// Mean and population standard deviation, `None` when there is nothing to
/// measure or every value is identical.
fn spread(values: &[f64]) -> Option<Spread> {
    let (first, rest) = values.split_first()?;
    if rest.iter().all(|v| v == first) {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        None
    } else {
        Some(Spread { mean, std_dev })
    }
}

/// Sample positions of the outliers in `column`.
pub fn find_outliers(column: &CurveColumn, preset: &SensitivityPreset) -> Vec<usize> {
    // Non-finite readings carry no statistical meaning; leave them alone.
    let present: Vec<(usize, f64)> = column
        .present()
        .into_iter()
        .filter(|(_, v)| v.is_finite())
        .collect();
    let values: Vec<f64> = present.iter().map(|(_, v)| *v).collect();

    let Some(global) = spread(&values) else {
        return Vec::new();
    };

    let half_before = preset.window_size / 2;
    let half_after = preset.window_size.div_ceil(2);
    let len = values.len();

    let mut outliers = Vec::new();
    for (i, &(position, value)) in present.iter().enumerate() {
        let z = (value - global.mean) / global.std_dev;
        if z.abs() <= preset.global_z {
            continue;
        }

        let lo = i.saturating_sub(half_before);
        let hi = (i + half_after).min(len);
        let Some(local) = spread(&values[lo..hi]) else {
            continue;
        };

        let local_z = (value - local.mean) / local.std_dev;
        if local_z.abs() > preset.local_z {
            outliers.push(position);
        }
    }

    outliers
}

/// Outlier positions for every curve except the index curve, keyed by curve id.
///
/// Curves without outliers are left out.
pub fn outlier_positions(
    samples: &[Sample],
    index_curve: &str,
    preset: &SensitivityPreset,
) -> BTreeMap<String, Vec<usize>> {
    let curve_ids: Vec<String> = collect_curve_ids(samples, index_curve).into_iter().collect();

    curve_ids
        .into_par_iter()
        .filter_map(|curve_id| {
            let column = CurveColumn::extract(samples, &curve_id);
            let positions = find_outliers(&column, preset);
            if positions.is_empty() {
                None
            } else {
                Some((curve_id, positions))
            }
        })
        .collect()
}

/// Remove outliers from every non-index curve, returning new samples.
///
/// The output has the same length and index values as `samples`; the input
/// is left untouched.
pub fn filter_outliers(
    samples: &[Sample],
    index_curve: &str,
    preset: &SensitivityPreset,
) -> Vec<Sample> {
    let removals = outlier_positions(samples, index_curve, preset);
    let mut filtered = samples.to_vec();
    clear_positions(&mut filtered, &removals);
    filtered
}

pub(crate) fn clear_positions(samples: &mut [Sample], removals: &BTreeMap<String, Vec<usize>>) {
    for (curve_id, positions) in removals {
        log::debug!("Removing {} values from curve {}", positions.len(), curve_id);
        for &position in positions {
            if let Some(sample) = samples.get_mut(position) {
                sample.clear(curve_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "DEPTH";

    fn log_with(curve: &str, values: &[Option<f64>]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let depth = 1000.0 + i as f64;
                let sample = Sample::new(depth).with_value(INDEX, depth);
                match v {
                    Some(v) => sample.with_value(curve, *v),
                    None => sample.with_absent(curve),
                }
            })
            .collect()
    }

    #[test]
    fn test_medium_preset_removes_single_spike() {
        let mut values = vec![Some(10.0); 9];
        values.push(Some(100.0));
        let samples = log_with("GR", &values);

        let filtered = filter_outliers(&samples, INDEX, &SensitivityPreset::MEDIUM);

        assert!(!filtered[9].is_present("GR"));
        for sample in &filtered[..9] {
            assert_eq!(sample.numeric("GR"), Some(10.0));
        }
        // input untouched
        assert_eq!(samples[9].numeric("GR"), Some(100.0));
    }

    #[test]
    fn test_zero_variance_column_unchanged() {
        for preset in Sensitivity::all().map(|s| s.preset()) {
            let samples = log_with("GR", &[Some(0.1); 25]);
            assert_eq!(filter_outliers(&samples, INDEX, &preset), samples);
        }
    }

    #[test]
    fn test_index_curve_never_filtered() {
        // The index column itself has a huge spread
        let samples: Vec<Sample> = [1.0, 2.0, 3.0, 4.0, 5000.0]
            .into_iter()
            .map(|d| Sample::new(d).with_value(INDEX, d))
            .collect();

        let filtered = filter_outliers(&samples, INDEX, &SensitivityPreset::HIGH);
        assert_eq!(filtered, samples);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_outliers(&[], INDEX, &SensitivityPreset::LOW).is_empty());
    }

    #[test]
    fn test_absent_values_are_skipped_not_zero() {
        // If absent counted as zero the 10s would look like outliers
        let mut values: Vec<Option<f64>> = vec![None; 20];
        values.extend(vec![Some(10.0); 5]);
        let samples = log_with("GR", &values);

        let filtered = filter_outliers(&samples, INDEX, &SensitivityPreset::HIGH);
        assert_eq!(filtered, samples);
    }

    #[test]
    fn test_local_pass_must_agree() {
        // Both 30s are global outliers, but their local windows hold only 30s
        let mut values = vec![Some(30.0), Some(30.0)];
        values.extend(vec![Some(1.0); 20]);
        let samples = log_with("GR", &values);
        let preset = SensitivityPreset::new(1.0, 0.5, 2).unwrap();

        let filtered = filter_outliers(&samples, INDEX, &preset);
        assert_eq!(filtered[0].numeric("GR"), Some(30.0));
        assert_eq!(filtered[1].numeric("GR"), Some(30.0));
    }

    #[test]
    fn test_window_is_clipped_at_end() {
        let mut values = vec![Some(5.0), Some(6.0), Some(5.0), Some(6.0), Some(5.0)];
        values.push(Some(60.0));
        let positions = find_outliers(
            &CurveColumn::extract(&log_with("GR", &values), "GR"),
            &SensitivityPreset::new(1.5, 1.2, 4).unwrap(),
        );
        assert_eq!(positions, vec![5]);
    }

    #[test]
    fn test_odd_window_size_accepted() {
        let mut values = vec![Some(10.0); 9];
        values.insert(4, Some(500.0));
        let preset = SensitivityPreset::new(1.5, 1.5, 7).unwrap();
        let positions = find_outliers(&CurveColumn::extract(&log_with("GR", &values), "GR"), &preset);
        assert_eq!(positions, vec![4]);
    }

    #[test]
    fn test_text_values_untouched() {
        let mut samples = log_with("GR", &[Some(10.0); 9]);
        samples.push(Sample::new(2000.0).with_value(INDEX, 2000.0).with_value("GR", "bad"));

        let filtered = filter_outliers(&samples, INDEX, &SensitivityPreset::HIGH);
        assert_eq!(filtered, samples);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(SensitivityPreset::new(1.0, 1.0, 0).is_err());
        assert!(SensitivityPreset::new(f64::NAN, 1.0, 4).is_err());
    }

    #[test]
    fn test_sensitivity_parse() {
        assert_eq!("High".parse::<Sensitivity>().unwrap(), Sensitivity::High);
        assert!("extreme".parse::<Sensitivity>().is_err());
        assert_eq!(Sensitivity::Low.preset().window_size, 12);
    }
}
