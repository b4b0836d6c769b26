use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::OptionFuture;
use mirror_core::{update, Effect, Msg, RenderedContent, SyncState};
use mirror_logging::{mirror_debug, mirror_error, mirror_info, mirror_warn, SYNC_TARGET};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ContentCache, Converter, DocumentFetcher, SubscriberRegistry};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

type CycleResult = Result<RenderedContent, String>;
type CycleFuture = Pin<Box<dyn Future<Output = CycleResult> + Send>>;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub document_id: String,
    pub interval: Duration,
    /// How long `SyncHandle::stop` waits for an in-flight cycle.
    pub shutdown_grace: Duration,
}

impl SyncSettings {
    pub fn new(document_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            document_id: document_id.into(),
            interval,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated(RenderedContent),
    Failed(String),
}

#[derive(Debug)]
pub enum StopOutcome {
    /// The driver exited on its own, after any in-flight cycle completed.
    Finished(SyncState),
    /// The grace period ran out and the driver task was aborted.
    Abandoned,
    /// The driver task panicked.
    Crashed(String),
}

/// Fetch → convert → cache → broadcast, on a fixed interval.
///
/// Cycles run one at a time on a single task. The state machine in
/// `mirror_core` decides what happens next; this type only executes its
/// effects.
#[derive(Clone)]
pub struct SyncEngine {
    settings: Arc<SyncSettings>,
    fetcher: Arc<dyn DocumentFetcher>,
    converter: Arc<dyn Converter>,
    cache: ContentCache,
    registry: SubscriberRegistry,
    clock: Clock,
}

impl SyncEngine {
    pub fn new(
        settings: SyncSettings,
        fetcher: Arc<dyn DocumentFetcher>,
        converter: Arc<dyn Converter>,
        cache: ContentCache,
        registry: SubscriberRegistry,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fetcher,
            converter,
            cache,
            registry,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Runs one complete cycle right now, outside the timer.
    pub async fn sync_once(&self) -> SyncOutcome {
        let mut in_flight = None;
        let state = self.apply(SyncState::new(), Msg::Started, &mut in_flight);
        let Some(cycle) = in_flight.take() else {
            return SyncOutcome::Failed("sync cycle did not start".to_string());
        };
        let result = cycle.await;
        self.apply(state, cycle_msg(result.clone()), &mut in_flight);
        match result {
            Ok(content) => SyncOutcome::Updated(content),
            Err(message) => SyncOutcome::Failed(message),
        }
    }

    /// Starts the driver task: one eager cycle, then one per interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> SyncHandle {
        let token = CancellationToken::new();
        let grace = self.settings.shutdown_grace;
        let task = tokio::spawn(self.drive(token.clone()));
        SyncHandle { token, task, grace }
    }

    async fn drive(self, token: CancellationToken) -> SyncState {
        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: Option<CycleFuture> = None;
        let mut stop_seen = false;
        let mut state = self.apply(SyncState::new(), Msg::Started, &mut in_flight);

        while !state.is_stopped() {
            let msg = tokio::select! {
                biased;
                Some(result) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    cycle_msg(result)
                }
                _ = token.cancelled(), if !stop_seen => {
                    stop_seen = true;
                    Msg::StopRequested
                }
                _ = ticker.tick() => Msg::Tick,
            };
            state = self.apply(state, msg, &mut in_flight);
        }

        mirror_info!(
            target: SYNC_TARGET,
            "Sync driver stopped after {} cycles ({} failed, {} ticks absorbed)",
            state.completed_cycles() + state.failed_cycles(),
            state.failed_cycles(),
            state.absorbed_ticks()
        );
        state
    }

    fn apply(&self, state: SyncState, msg: Msg, in_flight: &mut Option<CycleFuture>) -> SyncState {
        let (state, effects) = update(state, msg);
        for effect in effects {
            match effect {
                Effect::BeginCycle => {
                    mirror_debug!(target: SYNC_TARGET, "Sync cycle {} started", state.cycle_number());
                    *in_flight = Some(self.cycle_future());
                }
                Effect::ReplaceContent(content) => {
                    mirror_info!(
                        target: SYNC_TARGET,
                        "Sync cycle {} rendered {} bytes",
                        state.cycle_number(),
                        content.markup.len()
                    );
                    self.cache.replace(content);
                }
                Effect::Broadcast(event) => {
                    self.registry.broadcast(&event);
                }
                Effect::Halt => {}
            }
        }
        state
    }

    fn cycle_future(&self) -> CycleFuture {
        let engine = self.clone();
        Box::pin(async move { engine.run_cycle().await })
    }

    async fn run_cycle(&self) -> CycleResult {
        let document_id = &self.settings.document_id;
        let document = self.fetcher.fetch_document(document_id).await.map_err(|err| {
            mirror_warn!(target: SYNC_TARGET, "Fetching document {} failed: {}", document_id, err);
            err.to_string()
        })?;

        // Materializing images writes files, so keep it off the async workers.
        let converter = Arc::clone(&self.converter);
        let markup = tokio::task::spawn_blocking(move || converter.to_markup(&document))
            .await
            .map_err(|err| {
                mirror_error!(target: SYNC_TARGET, "Conversion task failed: {}", err);
                format!("converting document: {err}")
            })?;

        let rendered_at = self.cache.get().successor_timestamp((self.clock)());
        Ok(RenderedContent::new(markup, rendered_at))
    }
}

fn cycle_msg(result: CycleResult) -> Msg {
    match result {
        Ok(content) => Msg::Rendered(content),
        Err(message) => Msg::FetchFailed(message),
    }
}

/// Handle to a spawned sync driver.
#[derive(Debug)]
pub struct SyncHandle {
    token: CancellationToken,
    task: JoinHandle<SyncState>,
    grace: Duration,
}

impl SyncHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Requests a graceful stop and waits up to the grace period for the
    /// in-flight cycle to finish before aborting the driver.
    pub async fn stop(self) -> StopOutcome {
        self.token.cancel();
        let mut task = self.task;
        match tokio::time::timeout(self.grace, &mut task).await {
            Ok(Ok(state)) => StopOutcome::Finished(state),
            Ok(Err(err)) => {
                mirror_error!(target: SYNC_TARGET, "Sync driver crashed: {}", err);
                StopOutcome::Crashed(err.to_string())
            }
            Err(_) => {
                mirror_warn!(
                    target: SYNC_TARGET,
                    "Sync cycle still running after {:?}; abandoning it",
                    self.grace
                );
                task.abort();
                StopOutcome::Abandoned
            }
        }
    }
}
