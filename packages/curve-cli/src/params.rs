use crate::cli::{DirectionArg, FilterArgs, IndexArgs, KindArg, SensitivityArg};
use curve_engine::{
    FilterOptions, IndexDirection, IndexKind, IndexModel, IndexValue, Sample, Sensitivity,
    SensitivityPreset, ValueBounds,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

/// Read and parse a JSON input file.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, String> {
    if !Path::new(path).is_file() {
        return Err(format!("File not found: {}", path));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON in '{}': {}", path, e))
}

pub fn read_samples(path: &str) -> Result<Vec<Sample>, String> {
    if !Path::new(path).is_file() {
        return Err(format!("File not found: {}", path));
    }
    curve_engine::read_samples(path).map_err(|e| format!("Failed to load '{}': {}", path, e))
}

pub fn read_index_values(path: &str, model: &IndexModel) -> Result<Vec<IndexValue>, String> {
    let values: Vec<IndexValue> = read_json(path)?;
    if let Some(v) = values.iter().find(|v| v.kind() != model.kind) {
        return Err(format!(
            "Index value {} in '{}' is not a {} value",
            v,
            path,
            model.kind.name()
        ));
    }
    Ok(values)
}

pub fn index_model(args: &IndexArgs) -> IndexModel {
    let kind = match args.kind {
        KindArg::Depth => IndexKind::Depth,
        KindArg::Time => IndexKind::Time,
    };
    let direction = match args.direction {
        DirectionArg::Increasing => IndexDirection::Increasing,
        DirectionArg::Decreasing => IndexDirection::Decreasing,
    };
    IndexModel::new(kind, direction)
}

/// Parse `CURVE=MIN:MAX` arguments.
pub fn parse_bounds(raw: &[String]) -> Result<HashMap<String, ValueBounds>, String> {
    let mut bounds = HashMap::new();
    for entry in raw {
        let (curve, range) = entry
            .split_once('=')
            .ok_or_else(|| format!("Invalid bound '{}', expected CURVE=MIN:MAX", entry))?;
        let curve = curve.trim();
        if curve.is_empty() {
            return Err(format!("Invalid bound '{}': missing curve name", entry));
        }
        let parsed: ValueBounds = range
            .parse()
            .map_err(|e| format!("Invalid bound '{}': {}", entry, e))?;
        bounds.insert(curve.to_string(), parsed);
    }
    Ok(bounds)
}

pub fn build_filter_options(args: &FilterArgs) -> Result<FilterOptions, String> {
    let sensitivity = if args.skip_outliers {
        None
    } else {
        match (args.global_z, args.local_z, args.window) {
            (Some(global_z), Some(local_z), Some(window)) => Some(
                SensitivityPreset::new(global_z, local_z, window).map_err(|e| e.to_string())?,
            ),
            _ => {
                let level = match args.sensitivity.unwrap_or(SensitivityArg::Medium) {
                    SensitivityArg::Low => Sensitivity::Low,
                    SensitivityArg::Medium => Sensitivity::Medium,
                    SensitivityArg::High => Sensitivity::High,
                };
                Some(level.preset())
            }
        }
    };

    Ok(FilterOptions {
        sensitivity,
        bounds: parse_bounds(&args.bounds)?,
    })
}
