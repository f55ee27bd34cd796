// Fetch collaborator for the streaming controller
//
// The controller never talks to a data store itself. The host application
// implements `CurveFetcher` on top of its remote protocol client and hands it
// to the controller. Implementations should watch the cancellation token and
// may return `FetchError::Cancelled` early; the controller also drops the
// fetch future as soon as the token fires.

use super::types::AcquisitionTarget;
use crate::index::IndexModel;
use crate::types::{IndexValue, Sample};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Superseded by a newer fetch or stopped; never reported as a failure
    #[error("Fetch cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// One window of curve data to retrieve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub log_id: String,
    pub index_curve: String,
    pub curve_ids: Vec<String>,
    pub start_index: IndexValue,
    /// `false` excludes a sample sitting exactly on `start_index`
    pub start_inclusive: bool,
    pub end_index: IndexValue,
}

impl FetchRequest {
    pub fn for_target(
        target: &AcquisitionTarget,
        start_index: IndexValue,
        start_inclusive: bool,
        end_index: IndexValue,
    ) -> Self {
        Self {
            log_id: target.log_id.clone(),
            index_curve: target.index_curve.clone(),
            curve_ids: target.curve_ids.clone(),
            start_index,
            start_inclusive,
            end_index,
        }
    }

    /// Whether `index` falls inside the requested window
    pub fn contains(&self, index: &IndexValue, model: &IndexModel) -> bool {
        let after_start = match model.compare(index, &self.start_index) {
            Ordering::Greater => true,
            Ordering::Equal => self.start_inclusive,
            Ordering::Less => false,
        };
        after_start && model.compare(index, &self.end_index) != Ordering::Greater
    }
}

/// Source of curve samples, implemented by the host application
#[async_trait]
pub trait CurveFetcher: Send + Sync {
    /// Retrieve the samples of `request`'s window, in sequence order
    async fn fetch(&self, request: FetchRequest, cancel: CancellationToken) -> FetchResult<Vec<Sample>>;

    /// Present known end of data for `target`
    async fn current_end(&self, target: &AcquisitionTarget) -> FetchResult<IndexValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(inclusive: bool) -> FetchRequest {
        FetchRequest {
            log_id: "log".to_string(),
            index_curve: "DEPTH".to_string(),
            curve_ids: vec![],
            start_index: IndexValue::Depth(10.0),
            start_inclusive: inclusive,
            end_index: IndexValue::Depth(20.0),
        }
    }

    #[test]
    fn test_contains_respects_inclusivity() {
        let model = IndexModel::depth();
        let start = IndexValue::Depth(10.0);

        assert!(request(true).contains(&start, &model));
        assert!(!request(false).contains(&start, &model));
        assert!(request(false).contains(&IndexValue::Depth(20.0), &model));
        assert!(!request(false).contains(&IndexValue::Depth(20.5), &model));
    }

    #[test]
    fn test_contains_descending() {
        let model = IndexModel::depth().descending();
        let req = FetchRequest {
            start_index: IndexValue::Depth(20.0),
            end_index: IndexValue::Depth(10.0),
            ..request(false)
        };

        assert!(req.contains(&IndexValue::Depth(15.0), &model));
        assert!(!req.contains(&IndexValue::Depth(20.0), &model));
        assert!(!req.contains(&IndexValue::Depth(25.0), &model));
    }
}
