use crate::index::IndexKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Position of a sample along the index curve of its log.
///
/// Serialized untagged: a JSON number is a depth, an RFC 3339 string is a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexValue {
    Depth(f64),
    Time(DateTime<Utc>),
}

/// Hashable identity of an index value, used for exact-match lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum IndexKey {
    Depth(u64),
    Time(i64, u32),
}

impl IndexValue {
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexValue::Depth(_) => IndexKind::Depth,
            IndexValue::Time(_) => IndexKind::Time,
        }
    }

    pub fn as_depth(&self) -> Option<f64> {
        match self {
            IndexValue::Depth(d) => Some(*d),
            IndexValue::Time(_) => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            IndexValue::Time(t) => Some(*t),
            IndexValue::Depth(_) => None,
        }
    }

    pub(crate) fn key(&self) -> IndexKey {
        match self {
            // -0.0 and 0.0 are the same depth
            IndexValue::Depth(d) if *d == 0.0 => IndexKey::Depth(0.0f64.to_bits()),
            IndexValue::Depth(d) => IndexKey::Depth(d.to_bits()),
            IndexValue::Time(t) => IndexKey::Time(t.timestamp(), t.timestamp_subsec_nanos()),
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Depth(d) => write!(f, "{}", d),
            IndexValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<f64> for IndexValue {
    fn from(depth: f64) -> Self {
        IndexValue::Depth(depth)
    }
}

impl From<DateTime<Utc>> for IndexValue {
    fn from(time: DateTime<Utc>) -> Self {
        IndexValue::Time(time)
    }
}

/// A single cell value of a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurveValue {
    Number(f64),
    Text(String),
}

impl CurveValue {
    /// Numeric view of the value; text cells have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CurveValue::Number(v) => Some(*v),
            CurveValue::Text(_) => None,
        }
    }
}

impl From<f64> for CurveValue {
    fn from(value: f64) -> Self {
        CurveValue::Number(value)
    }
}

impl From<&str> for CurveValue {
    fn from(value: &str) -> Self {
        CurveValue::Text(value.to_string())
    }
}

impl From<String> for CurveValue {
    fn from(value: String) -> Self {
        CurveValue::Text(value)
    }
}

/// One row of a log: an index value plus the values of each curve at that index.
///
/// A missing key and an explicit `None` both mean the value is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub index: IndexValue,
    #[serde(default)]
    pub values: BTreeMap<String, Option<CurveValue>>,
}

impl Sample {
    pub fn new(index: impl Into<IndexValue>) -> Self {
        Self {
            index: index.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, curve_id: impl Into<String>, value: impl Into<CurveValue>) -> Self {
        self.values.insert(curve_id.into(), Some(value.into()));
        self
    }

    pub fn with_absent(mut self, curve_id: impl Into<String>) -> Self {
        self.values.insert(curve_id.into(), None);
        self
    }

    pub fn value(&self, curve_id: &str) -> Option<&CurveValue> {
        self.values.get(curve_id).and_then(|v| v.as_ref())
    }

    pub fn numeric(&self, curve_id: &str) -> Option<f64> {
        self.value(curve_id).and_then(CurveValue::as_f64)
    }

    pub fn is_present(&self, curve_id: &str) -> bool {
        self.value(curve_id).is_some()
    }

    /// Mark a curve's value as absent, keeping the key.
    pub(crate) fn clear(&mut self, curve_id: &str) {
        if let Some(slot) = self.values.get_mut(curve_id) {
            *slot = None;
        }
    }

    pub fn curve_ids(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Union of curve ids across `samples`, excluding `exclude` (normally the index curve).
pub fn collect_curve_ids(samples: &[Sample], exclude: &str) -> BTreeSet<String> {
    samples
        .iter()
        .flat_map(|s| s.curve_ids())
        .filter(|id| *id != exclude)
        .map(str::to_string)
        .collect()
}

/// Positional projection of one curve over a sample slice.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveColumn {
    pub curve_id: String,
    pub values: Vec<Option<f64>>,
}

impl CurveColumn {
    pub fn extract(samples: &[Sample], curve_id: &str) -> Self {
        Self {
            curve_id: curve_id.to_string(),
            values: samples.iter().map(|s| s.numeric(curve_id)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(position, value)` for every present value, in sample order
    pub fn present(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(pos, v)| v.map(|v| (pos, v)))
            .collect()
    }
}

/// Read a JSON array of samples from `path`.
pub fn read_samples(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// Inclusive range of index values, `start` first in sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: IndexValue,
    pub end: IndexValue,
}

impl IndexRange {
    pub fn new(start: IndexValue, end: IndexValue) -> Self {
        Self { start, end }
    }

    pub fn single(value: IndexValue) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}
