// Acquisition of growing curve logs
//
// Architecture:
// - `fetcher`: Trait the host implements on top of its data store client
// - `memory`: In-memory log that can grow while being polled
// - `controller`: Session lifecycle, polling and single-flight fetching
// - `types`: States, events, errors and statistics

pub mod controller;
pub mod fetcher;
pub mod memory;
pub mod types;

pub use controller::StreamingController;
pub use fetcher::{CurveFetcher, FetchError, FetchRequest, FetchResult};
pub use memory::InMemoryLog;
pub use types::{
    AcquisitionTarget, FetchOutcome, StreamError, StreamEvent, StreamResult, StreamState, StreamStats,
};
