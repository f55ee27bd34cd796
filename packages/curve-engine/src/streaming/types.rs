// Common types for the streaming module

use crate::error::EngineError;
use crate::index::IndexModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for streaming operations
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors surfaced by the streaming controller
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("No acquisition target set")]
    NoTarget,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Current state of a streaming controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type")]
pub enum StreamState {
    /// Nothing in flight, nothing scheduled
    #[default]
    Idle,

    /// First fetch of a session (or a one-shot load) is in flight
    FetchingInitial,

    /// Initial data held; follow-up polls are scheduled
    Polling,

    /// Session superseded by a target change, about to return to idle
    Cancelled,
}

impl StreamState {
    /// True while a fetch is in flight or scheduled
    pub fn is_active(&self) -> bool {
        matches!(self, StreamState::FetchingInitial | StreamState::Polling)
    }
}

/// What is being acquired: one log and a set of its curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionTarget {
    pub log_id: String,
    pub index_curve: String,
    pub curve_ids: Vec<String>,
    pub index: IndexModel,
}

impl AcquisitionTarget {
    pub fn new(
        log_id: impl Into<String>,
        index_curve: impl Into<String>,
        curve_ids: Vec<String>,
        index: IndexModel,
    ) -> Self {
        Self {
            log_id: log_id.into(),
            index_curve: index_curve.into(),
            curve_ids,
            index,
        }
    }
}

/// Outcome of a fetch that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// Result stored in the buffer, with the number of samples received
    Applied(usize),
    /// Fetch was superseded or cancelled; its result was dropped
    Discarded,
}

/// Statistics about a controller's fetches
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StreamStats {
    pub fetches_applied: u64,
    pub fetches_discarded: u64,
    pub fetches_failed: u64,
    pub samples_received: u64,
    pub buffer_len: usize,
}

/// Events emitted by the streaming controller
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    StateChanged {
        stream_id: String,
        state: StreamState,
    },
    SamplesAppended {
        stream_id: String,
        count: usize,
        total: usize,
    },
    FetchFailed {
        stream_id: String,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&StreamState::Polling).unwrap();
        assert_eq!(json, r#"{"type":"Polling"}"#);
        assert_eq!(StreamState::default(), StreamState::Idle);
        assert!(StreamState::FetchingInitial.is_active());
        assert!(!StreamState::Cancelled.is_active());
    }
}
