//! Curve Value Filters
//!
//! Removes bad readings from fetched samples without touching the index curve:
//! - Two-pass Z-score outlier removal with low/medium/high presets
//! - Custom per-curve value bounds, applied after the statistical pass
//!
//! Filters never mutate their input; removed values become absent in a copy.

mod bounds;
mod outlier;

pub use bounds::{filter_by_bounds, ValueBounds};
pub use outlier::{
    filter_outliers, find_outliers, outlier_positions, Sensitivity, SensitivityPreset,
};

use crate::types::Sample;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Which filters to run over a batch of samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Statistical outlier removal; `None` skips it
    #[serde(default)]
    pub sensitivity: Option<SensitivityPreset>,

    /// Per-curve bounds applied after outlier removal
    #[serde(default)]
    pub bounds: HashMap<String, ValueBounds>,
}

impl FilterOptions {
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity: Some(sensitivity.preset()),
            bounds: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sensitivity.is_none() && self.bounds.is_empty()
    }
}

/// Result of filtering a batch of samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterReport {
    pub samples: Vec<Sample>,
    /// Values removed per curve, both passes combined
    pub removed: BTreeMap<String, usize>,
    pub processing_time_ms: f64,
}

impl FilterReport {
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }
}

/// Run the configured filters in order: outliers first, then bounds.
pub fn apply_filters(samples: &[Sample], index_curve: &str, options: &FilterOptions) -> FilterReport {
    let start = std::time::Instant::now();
    let mut removed: BTreeMap<String, usize> = BTreeMap::new();

    let mut filtered = match &options.sensitivity {
        Some(preset) => {
            let positions = outlier_positions(samples, index_curve, preset);
            for (curve_id, p) in &positions {
                *removed.entry(curve_id.clone()).or_default() += p.len();
            }
            let mut out = samples.to_vec();
            outlier::clear_positions(&mut out, &positions);
            out
        }
        None => samples.to_vec(),
    };

    if !options.bounds.is_empty() {
        // Values already removed are absent and no longer counted here
        let positions = bounds::out_of_bounds_positions(&filtered, index_curve, &options.bounds);
        for (curve_id, p) in &positions {
            *removed.entry(curve_id.clone()).or_default() += p.len();
        }
        outlier::clear_positions(&mut filtered, &positions);
    }

    let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    log::debug!(
        "Filtered {} samples in {:.2} ms, {} values removed",
        samples.len(),
        processing_time_ms,
        removed.values().sum::<usize>()
    );

    FilterReport {
        samples: filtered,
        removed,
        processing_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiky_log() -> Vec<Sample> {
        (0..10)
            .map(|i| {
                let depth = 500.0 + i as f64;
                let gr = if i == 9 { 100.0 } else { 10.0 };
                Sample::new(depth)
                    .with_value("DEPTH", depth)
                    .with_value("GR", gr)
                    .with_value("ROP", 20.0 + (i % 2) as f64 * 2.0)
            })
            .collect()
    }

    #[test]
    fn test_outliers_then_bounds() {
        let mut options = FilterOptions::with_sensitivity(Sensitivity::Medium);
        options.bounds.insert("ROP".to_string(), ValueBounds::new(None, Some(21.0)).unwrap());
        // GR spike is already gone, so this bound adds nothing
        options.bounds.insert("GR".to_string(), ValueBounds::new(None, Some(50.0)).unwrap());

        let report = apply_filters(&spiky_log(), "DEPTH", &options);

        assert_eq!(report.samples.len(), 10);
        assert_eq!(report.removed.get("GR"), Some(&1));
        assert_eq!(report.removed.get("ROP"), Some(&5));
        assert_eq!(report.total_removed(), 6);
    }

    #[test]
    fn test_empty_options_is_identity() {
        let options = FilterOptions::default();
        assert!(options.is_empty());

        let report = apply_filters(&spiky_log(), "DEPTH", &options);
        assert_eq!(report.samples, spiky_log());
        assert_eq!(report.total_removed(), 0);
    }

    #[test]
    fn test_length_and_index_preserved() {
        let input = spiky_log();
        let report = apply_filters(&input, "DEPTH", &FilterOptions::with_sensitivity(Sensitivity::High));

        assert_eq!(report.samples.len(), input.len());
        for (a, b) in input.iter().zip(&report.samples) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.numeric("DEPTH"), b.numeric("DEPTH"));
        }
    }
}
