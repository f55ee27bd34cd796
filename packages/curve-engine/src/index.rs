//! Index families, ordering and offset arithmetic.
//!
//! A log is indexed either by depth (plain `f64` in the log's unit) or by
//! time. Either family may run in increasing or decreasing order, and every
//! comparison or offset here is expressed in *sequence order*: "forward"
//! means towards newer data, whatever the numeric sign.

use crate::error::{EngineError, Result};
use crate::types::{IndexValue, Sample};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How far before the current end of data streaming starts, in minutes for time logs.
pub const TIME_LOOKBACK_MINUTES: i64 = 20;

/// How far before the current end of data streaming starts, in native depth units.
pub const DEPTH_LOOKBACK: f64 = 20.0;

/// Upper bound added to the end of a poll window for time logs (one year).
pub const TIME_SAFETY_FORWARD_SECS: i64 = 365 * 24 * 60 * 60;

/// Upper bound added to the end of a poll window for depth logs.
pub const DEPTH_SAFETY_FORWARD: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Depth,
    Time,
}

impl IndexKind {
    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::Depth => "depth",
            IndexKind::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexDirection {
    #[default]
    Increasing,
    Decreasing,
}

impl IndexDirection {
    pub fn name(&self) -> &'static str {
        match self {
            IndexDirection::Increasing => "increasing",
            IndexDirection::Decreasing => "decreasing",
        }
    }
}

/// Ordering and arithmetic rules of one log's index curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexModel {
    pub kind: IndexKind,
    #[serde(default)]
    pub direction: IndexDirection,
}

impl IndexModel {
    pub fn new(kind: IndexKind, direction: IndexDirection) -> Self {
        Self { kind, direction }
    }

    pub fn depth() -> Self {
        Self::new(IndexKind::Depth, IndexDirection::Increasing)
    }

    pub fn time() -> Self {
        Self::new(IndexKind::Time, IndexDirection::Increasing)
    }

    pub fn descending(self) -> Self {
        Self {
            direction: IndexDirection::Decreasing,
            ..self
        }
    }

    /// Compare two index values in sequence order.
    ///
    /// Values of different families are a caller bug; release builds order
    /// depth before time so sorting stays total.
    pub fn compare(&self, a: &IndexValue, b: &IndexValue) -> Ordering {
        let natural = match (a, b) {
            (IndexValue::Depth(x), IndexValue::Depth(y)) => x.total_cmp(y),
            (IndexValue::Time(x), IndexValue::Time(y)) => x.cmp(y),
            (IndexValue::Depth(_), IndexValue::Time(_)) => {
                debug_assert!(false, "compared depth index with time index");
                Ordering::Less
            }
            (IndexValue::Time(_), IndexValue::Depth(_)) => {
                debug_assert!(false, "compared time index with depth index");
                Ordering::Greater
            }
        };

        match self.direction {
            IndexDirection::Increasing => natural,
            IndexDirection::Decreasing => natural.reverse(),
        }
    }

    /// Move `value` by `amount` native units (seconds for time) in sequence order.
    ///
    /// Negative amounts move backwards. On a decreasing log moving forward
    /// is a numeric subtraction.
    pub fn offset(&self, value: &IndexValue, amount: f64) -> Result<IndexValue> {
        if value.kind() != self.kind {
            return Err(EngineError::IndexKindMismatch {
                expected: self.kind.name(),
                actual: value.kind().name(),
            });
        }
        if !amount.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "offset amount must be finite, got {}",
                amount
            )));
        }

        let signed = match self.direction {
            IndexDirection::Increasing => amount,
            IndexDirection::Decreasing => -amount,
        };

        match value {
            IndexValue::Depth(d) => Ok(IndexValue::Depth(d + signed)),
            IndexValue::Time(t) => {
                let millis = (signed * 1000.0).round();
                if millis.abs() >= i64::MAX as f64 {
                    return Err(EngineError::IndexOutOfRange(format!(
                        "{} seconds from {}",
                        signed, value
                    )));
                }
                chrono::Duration::try_milliseconds(millis as i64)
                    .and_then(|delta| t.checked_add_signed(delta))
                    .map(IndexValue::Time)
                    .ok_or_else(|| {
                        EngineError::IndexOutOfRange(format!("{} seconds from {}", signed, value))
                    })
            }
        }
    }

    /// Distance before the current end of data where streaming starts
    pub fn lookback_offset(&self) -> f64 {
        match self.kind {
            IndexKind::Depth => DEPTH_LOOKBACK,
            IndexKind::Time => (TIME_LOOKBACK_MINUTES * 60) as f64,
        }
    }

    /// Generous distance past the current end requested by every poll
    pub fn safety_forward_offset(&self) -> f64 {
        match self.kind {
            IndexKind::Depth => DEPTH_SAFETY_FORWARD,
            IndexKind::Time => TIME_SAFETY_FORWARD_SECS as f64,
        }
    }

    /// Index of the sample furthest along in sequence order.
    pub fn last_in_order(&self, samples: &[Sample]) -> Option<IndexValue> {
        samples
            .iter()
            .map(|s| s.index)
            .max_by(|a, b| self.compare(a, b))
    }

    /// True when `samples` never step backwards in sequence order.
    pub fn is_ordered(&self, samples: &[Sample]) -> bool {
        samples
            .windows(2)
            .all(|w| self.compare(&w[0].index, &w[1].index) != Ordering::Greater)
    }
}
