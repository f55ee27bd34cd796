pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod ranges;
pub mod streaming;
pub mod types;

pub use config::{ConfigError, StreamConfig};
pub use error::{EngineError, Result};
pub use filter::{
    apply_filters, filter_by_bounds, filter_outliers, find_outliers, outlier_positions, FilterOptions,
    FilterReport, Sensitivity, SensitivityPreset, ValueBounds,
};
pub use index::{IndexDirection, IndexKind, IndexModel};
pub use ranges::compact_ranges;
pub use streaming::{
    AcquisitionTarget, CurveFetcher, FetchError, FetchOutcome, FetchRequest, InMemoryLog, StreamError,
    StreamEvent, StreamState, StreamStats, StreamingController,
};
pub use types::*;
