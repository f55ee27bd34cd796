// Streaming controller - incremental acquisition of a growing log
//
// The controller manages:
// - The acquisition target (log, index curve, curve set)
// - One session at a time: an initial lookback fetch followed by scheduled polls
// - The accumulated sample buffer, appended strictly in poll order
// - Single-flight fetching: a new session waits for the previous one to wind down
// - Task cancellation via CancellationToken; late results are dropped, not reported
// - State management and event emission

use super::fetcher::{CurveFetcher, FetchError, FetchRequest};
use super::types::{
    AcquisitionTarget, FetchOutcome, StreamError, StreamEvent, StreamResult, StreamState,
    StreamStats,
};
use crate::config::StreamConfig;
use crate::types::{IndexValue, Sample};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type EventCallback = Box<dyn Fn(StreamEvent) + Send + Sync>;

/// A running session: its cancellation handle and task
struct Session {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Cancel the session and hand back its task so a successor can await it
    fn cancel(self) -> Option<JoinHandle<()>> {
        self.cancel.cancel();
        self.task
    }
}

#[derive(Default)]
struct Inner {
    state: StreamState,
    target: Option<AcquisitionTarget>,
    buffer: Vec<Sample>,
    session: Option<Session>,
    /// Task of a stopped session that may still be winding down
    retired: Option<JoinHandle<()>>,
    generation: u64,
    last_error: Option<String>,
    stats: StreamStats,
}

impl Inner {
    /// Cancel the current session (if any) and open a new generation
    fn supersede(&mut self) -> (u64, CancellationToken, Option<JoinHandle<()>>) {
        let previous = match self.session.take() {
            Some(session) => session.cancel(),
            None => self.retired.take(),
        };
        self.generation += 1;
        (self.generation, CancellationToken::new(), previous)
    }

    fn is_current(&self, generation: u64, cancel: &CancellationToken) -> bool {
        self.generation == generation && !cancel.is_cancelled()
    }

    fn set_state(&mut self, state: StreamState, stream_id: &str, events: &mut Vec<StreamEvent>) {
        if self.state != state {
            self.state = state;
            events.push(StreamEvent::StateChanged {
                stream_id: stream_id.to_string(),
                state,
            });
        }
    }
}

struct Core {
    id: String,
    fetcher: Arc<dyn CurveFetcher>,
    config: StreamConfig,
    inner: Mutex<Inner>,
    event_callback: RwLock<Option<EventCallback>>,
}

impl Core {
    fn emit(&self, events: Vec<StreamEvent>) {
        if events.is_empty() {
            return;
        }
        if let Some(callback) = self.event_callback.read().as_ref() {
            for event in events {
                callback(event);
            }
        }
    }

    /// Append a fetch result if its session is still current.
    fn append(&self, generation: u64, cancel: &CancellationToken, samples: Vec<Sample>) -> FetchOutcome {
        let mut events = Vec::new();
        let outcome = {
            let mut inner = self.inner.lock();
            if !inner.is_current(generation, cancel) {
                inner.stats.fetches_discarded += 1;
                log::warn!("Discarding {} samples from superseded fetch", samples.len());
                FetchOutcome::Discarded
            } else {
                let count = samples.len();
                inner.buffer.extend(samples);
                inner.stats.fetches_applied += 1;
                inner.stats.samples_received += count as u64;
                inner.stats.buffer_len = inner.buffer.len();

                events.push(StreamEvent::SamplesAppended {
                    stream_id: self.id.clone(),
                    count,
                    total: inner.buffer.len(),
                });
                inner.set_state(StreamState::Polling, &self.id, &mut events);
                log::debug!("Appended {} samples ({} held)", count, inner.buffer.len());
                FetchOutcome::Applied(count)
            }
        };
        self.emit(events);
        outcome
    }

    /// Record a transport failure and halt the session.
    fn fail(&self, generation: u64, cancel: &CancellationToken, message: String) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.is_current(generation, cancel) {
                log::debug!("Ignoring failure of superseded fetch: {}", message);
                return;
            }
            log::error!("Curve fetch failed, polling halted: {}", message);
            inner.stats.fetches_failed += 1;
            inner.last_error = Some(message.clone());
            inner.session = None;
            events.push(StreamEvent::FetchFailed {
                stream_id: self.id.clone(),
                error: message,
            });
            inner.set_state(StreamState::Idle, &self.id, &mut events);
        }
        self.emit(events);
    }

    /// End the session after the fetcher gave up on its own.
    ///
    /// Not a failure: no error is recorded, the result counts as discarded.
    fn abandon(&self, generation: u64, cancel: &CancellationToken) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.is_current(generation, cancel) {
                return;
            }
            log::warn!("Fetcher cancelled stream {} on its own, session ended", self.id);
            inner.stats.fetches_discarded += 1;
            inner.session = None;
            inner.set_state(StreamState::Idle, &self.id, &mut events);
        }
        self.emit(events);
    }

    /// Index of the furthest sample held; appends keep the buffer in sequence order
    fn held_end(&self) -> Option<IndexValue> {
        self.inner.lock().buffer.last().map(|s| s.index)
    }

    /// Window of the next poll, starting at the furthest sample held
    fn next_request(
        &self,
        target: &AcquisitionTarget,
        previous: &FetchRequest,
    ) -> StreamResult<FetchRequest> {
        // Nothing held yet: keep polling from where the last window started
        let start = self.held_end().unwrap_or(previous.start_index);
        let end = target
            .index
            .offset(&start, self.config.safety_forward(&target.index))?;
        Ok(FetchRequest::for_target(target, start, false, end))
    }
}

/// Acquires curve data for one target, one session at a time
pub struct StreamingController {
    pub id: String,
    core: Arc<Core>,
}

impl StreamingController {
    /// Create an idle controller; fails if `config` does not validate
    pub fn new(fetcher: Arc<dyn CurveFetcher>, config: StreamConfig) -> StreamResult<Self> {
        config
            .validate()
            .map_err(|e| StreamError::Config(e.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        Ok(Self {
            id: id.clone(),
            core: Arc::new(Core {
                id,
                fetcher,
                config,
                inner: Mutex::new(Inner::default()),
                event_callback: RwLock::new(None),
            }),
        })
    }

    /// Set event callback function
    pub fn set_event_callback<F>(&self, callback: F)
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        *self.core.event_callback.write() = Some(Box::new(callback));
    }

    pub fn config(&self) -> &StreamConfig {
        &self.core.config
    }

    /// Change what is being acquired.
    ///
    /// A different target cancels any session, clears the timer and discards
    /// the buffer; the caller must `start()` again.
    pub fn set_target(&self, target: AcquisitionTarget) {
        let mut events = Vec::new();
        {
            let mut inner = self.core.inner.lock();
            if inner.target.as_ref() == Some(&target) {
                return;
            }

            log::info!(
                "Stream {} target set to log {} ({} curves)",
                self.id,
                target.log_id,
                target.curve_ids.len()
            );

            let was_active = inner.state.is_active();
            let (_, _, previous) = inner.supersede();
            inner.retired = previous;
            inner.buffer.clear();
            inner.stats.buffer_len = 0;
            inner.last_error = None;
            inner.target = Some(target);

            if was_active {
                inner.set_state(StreamState::Cancelled, &self.id, &mut events);
            }
            inner.set_state(StreamState::Idle, &self.id, &mut events);
        }
        self.core.emit(events);
    }

    /// Start streaming the current target.
    ///
    /// No-op while already polling. Any earlier session still fetching its
    /// initial window is cancelled, and the new session waits for it to end
    /// before issuing its own fetch. Samples kept by `stop()` or a failed poll
    /// are extended from the last one held (exclusive) instead of refetching
    /// the lookback window. Must be called within a tokio runtime.
    pub fn start(&self) -> StreamResult<()> {
        let mut events = Vec::new();
        {
            let mut inner = self.core.inner.lock();
            if inner.state == StreamState::Polling {
                log::debug!("Stream {} already polling", self.id);
                return Ok(());
            }
            let target = inner.target.clone().ok_or(StreamError::NoTarget)?;

            log::info!("Starting stream {} on log {}", self.id, target.log_id);

            let (generation, cancel, previous) = inner.supersede();
            inner.last_error = None;
            inner.set_state(StreamState::FetchingInitial, &self.id, &mut events);

            let task = tokio::spawn(run_session(
                Arc::clone(&self.core),
                target,
                generation,
                cancel.clone(),
                previous,
            ));
            inner.session = Some(Session {
                cancel,
                task: Some(task),
            });
        }
        self.core.emit(events);
        Ok(())
    }

    /// Stop streaming, keeping the accumulated samples.
    pub fn stop(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.core.inner.lock();
            if inner.session.is_none() && !inner.state.is_active() {
                return;
            }
            log::info!("Stopping stream {}", self.id);
            let (_, _, previous) = inner.supersede();
            inner.retired = previous;
            inner.set_state(StreamState::Idle, &self.id, &mut events);
        }
        self.core.emit(events);
    }

    /// One-shot fetch of `[start, end]` that replaces the buffer.
    ///
    /// Always inclusive of `start`, never schedules polls. Cancels any
    /// running session first.
    pub async fn load(&self, start: IndexValue, end: IndexValue) -> StreamResult<FetchOutcome> {
        let mut events = Vec::new();
        let (target, generation, cancel, previous) = {
            let mut inner = self.core.inner.lock();
            let target = inner.target.clone().ok_or(StreamError::NoTarget)?;
            let (generation, cancel, previous) = inner.supersede();
            inner.session = Some(Session {
                cancel: cancel.clone(),
                task: None,
            });
            inner.last_error = None;
            inner.set_state(StreamState::FetchingInitial, &self.id, &mut events);
            (target, generation, cancel, previous)
        };
        self.core.emit(events);

        if let Some(previous) = previous {
            let _ = previous.await;
        }

        let request = FetchRequest::for_target(&target, start, true, end);
        log::debug!("One-shot fetch {}..{}", request.start_index, request.end_index);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(FetchOutcome::Discarded),
            result = self.core.fetcher.fetch(request, cancel.clone()) => result,
        };

        match result {
            Ok(samples) => {
                let mut events = Vec::new();
                let outcome = {
                    let mut inner = self.core.inner.lock();
                    if !inner.is_current(generation, &cancel) {
                        inner.stats.fetches_discarded += 1;
                        FetchOutcome::Discarded
                    } else {
                        let count = samples.len();
                        inner.buffer = samples;
                        inner.session = None;
                        inner.stats.fetches_applied += 1;
                        inner.stats.samples_received += count as u64;
                        inner.stats.buffer_len = count;
                        inner.set_state(StreamState::Idle, &self.id, &mut events);
                        FetchOutcome::Applied(count)
                    }
                };
                self.core.emit(events);
                Ok(outcome)
            }
            Err(FetchError::Cancelled) => {
                self.core.abandon(generation, &cancel);
                Ok(FetchOutcome::Discarded)
            }
            Err(FetchError::Transport(message)) => {
                self.core.fail(generation, &cancel, message.clone());
                Err(StreamError::Transport(message))
            }
        }
    }

    /// Copy of the accumulated samples
    pub fn snapshot(&self) -> Vec<Sample> {
        self.core.inner.lock().buffer.clone()
    }

    pub fn state(&self) -> StreamState {
        self.core.inner.lock().state
    }

    pub fn target(&self) -> Option<AcquisitionTarget> {
        self.core.inner.lock().target.clone()
    }

    /// Message of the last transport failure, cleared on the next start
    pub fn last_error(&self) -> Option<String> {
        self.core.inner.lock().last_error.clone()
    }

    pub fn stats(&self) -> StreamStats {
        self.core.inner.lock().stats.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.state() == StreamState::Polling
    }
}

impl Drop for StreamingController {
    fn drop(&mut self) {
        if let Some(session) = self.core.inner.lock().session.take() {
            session.cancel();
        }
        log::debug!("StreamingController {} dropped", self.id);
    }
}

/// Body of one streaming session: initial lookback fetch (or a resume after
/// held samples), then polls until cancelled or failed
async fn run_session(
    core: Arc<Core>,
    target: AcquisitionTarget,
    generation: u64,
    cancel: CancellationToken,
    previous: Option<JoinHandle<()>>,
) {
    // Single flight: the superseded session must be gone before we fetch
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let forward = core.config.safety_forward(&target.index);
    let first = match core.held_end() {
        // Samples kept from a stopped or failed session: resume after them
        Some(held) => target
            .index
            .offset(&held, forward)
            .map(|stop| FetchRequest::for_target(&target, held, false, stop)),
        None => {
            let end = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                end = core.fetcher.current_end(&target) => end,
            };
            let end = match end {
                Ok(end) => end,
                Err(FetchError::Cancelled) => {
                    core.abandon(generation, &cancel);
                    return;
                }
                Err(FetchError::Transport(message)) => {
                    core.fail(generation, &cancel, message);
                    return;
                }
            };

            let lookback = core.config.lookback(&target.index);
            target
                .index
                .offset(&end, -lookback)
                .and_then(|start| Ok((start, target.index.offset(&end, forward)?)))
                .map(|(start, stop)| FetchRequest::for_target(&target, start, true, stop))
        }
    };
    let mut request = match first {
        Ok(request) => request,
        Err(e) => {
            core.fail(generation, &cancel, e.to_string());
            return;
        }
    };

    loop {
        log::debug!(
            "Fetching {}..{} (start inclusive: {})",
            request.start_index,
            request.end_index,
            request.start_inclusive
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("Stream session {} cancelled during fetch", generation);
                return;
            }
            result = core.fetcher.fetch(request.clone(), cancel.clone()) => result,
        };

        match result {
            Ok(samples) => {
                if core.append(generation, &cancel, samples) == FetchOutcome::Discarded {
                    return;
                }
            }
            Err(FetchError::Cancelled) => {
                core.abandon(generation, &cancel);
                return;
            }
            Err(FetchError::Transport(message)) => {
                core.fail(generation, &cancel, message);
                return;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(core.config.poll_interval()) => {}
        }

        request = match core.next_request(&target, &request) {
            Ok(next) => next,
            Err(e) => {
                core.fail(generation, &cancel, e.to_string());
                return;
            }
        };
    }
}
