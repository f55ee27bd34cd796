// In-memory growing log
//
// Serves fetch requests from a sample vector that can keep growing while a
// controller polls it. Useful for:
// - Replaying recorded logs as if they were still being drilled
// - Testing streaming behaviour without a remote store

use super::fetcher::{CurveFetcher, FetchError, FetchRequest, FetchResult};
use super::types::AcquisitionTarget;
use crate::index::IndexModel;
use crate::types::{IndexValue, Sample};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

pub struct InMemoryLog {
    index: IndexModel,
    samples: RwLock<Vec<Sample>>,
}

impl InMemoryLog {
    pub fn new(index: IndexModel, samples: Vec<Sample>) -> Self {
        if !index.is_ordered(&samples) {
            log::warn!("In-memory log created from samples that are not in sequence order");
        }
        Self {
            index,
            samples: RwLock::new(samples),
        }
    }

    /// Grow the log; new samples must continue the sequence
    pub fn append(&self, samples: impl IntoIterator<Item = Sample>) {
        self.samples.write().extend(samples);
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    /// Keep only the index curve and the requested curves
    fn project(sample: &Sample, request: &FetchRequest) -> Sample {
        if request.curve_ids.is_empty() {
            return sample.clone();
        }
        let values = sample
            .values
            .iter()
            .filter(|(id, _)| **id == request.index_curve || request.curve_ids.contains(*id))
            .map(|(id, v)| (id.clone(), v.clone()))
            .collect();
        Sample {
            index: sample.index,
            values,
        }
    }
}

#[async_trait]
impl CurveFetcher for InMemoryLog {
    async fn fetch(&self, request: FetchRequest, cancel: CancellationToken) -> FetchResult<Vec<Sample>> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let samples = self.samples.read();
        let window: Vec<Sample> = samples
            .iter()
            .filter(|s| request.contains(&s.index, &self.index))
            .map(|s| Self::project(s, &request))
            .collect();

        log::debug!(
            "In-memory fetch {}..{} returned {} samples",
            request.start_index,
            request.end_index,
            window.len()
        );
        Ok(window)
    }

    async fn current_end(&self, target: &AcquisitionTarget) -> FetchResult<IndexValue> {
        self.index
            .last_in_order(&self.samples.read())
            .ok_or_else(|| FetchError::Transport(format!("log {} has no data", target.log_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> InMemoryLog {
        let samples = (0..10)
            .map(|i| {
                let d = i as f64;
                Sample::new(d)
                    .with_value("DEPTH", d)
                    .with_value("GR", d * 2.0)
                    .with_value("ROP", 1.0)
            })
            .collect();
        InMemoryLog::new(IndexModel::depth(), samples)
    }

    fn target() -> AcquisitionTarget {
        AcquisitionTarget::new("well-1", "DEPTH", vec!["GR".to_string()], IndexModel::depth())
    }

    #[tokio::test]
    async fn test_fetch_window_and_projection() {
        let log = log();
        let request = FetchRequest::for_target(&target(), IndexValue::Depth(3.0), false, IndexValue::Depth(6.0));

        let samples = log.fetch(request, CancellationToken::new()).await.unwrap();

        let indexes: Vec<f64> = samples.iter().filter_map(|s| s.index.as_depth()).collect();
        assert_eq!(indexes, vec![4.0, 5.0, 6.0]);
        assert!(samples.iter().all(|s| s.is_present("GR") && s.is_present("DEPTH")));
        assert!(samples.iter().all(|s| !s.is_present("ROP")));
    }

    #[tokio::test]
    async fn test_current_end_grows() {
        let log = log();
        assert_eq!(log.current_end(&target()).await.unwrap(), IndexValue::Depth(9.0));

        log.append([Sample::new(10.0)]);
        assert_eq!(log.current_end(&target()).await.unwrap(), IndexValue::Depth(10.0));
        assert_eq!(log.len(), 11);
    }

    #[tokio::test]
    async fn test_empty_log_has_no_end() {
        let log = InMemoryLog::new(IndexModel::depth(), vec![]);
        assert!(matches!(
            log.current_end(&target()).await,
            Err(FetchError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let request = FetchRequest::for_target(&target(), IndexValue::Depth(0.0), true, IndexValue::Depth(1.0));
        assert_eq!(log().fetch(request, token).await, Err(FetchError::Cancelled));
    }
}
