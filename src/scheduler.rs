//! Polling scheduler that keeps the latest quotes visible to observers
//!
//! `start` consults the [`QuoteCache`] to decide when the first fetch happens, then a
//! single timer task fetches every TTL. Each `start` takes a new generation number;
//! state is only published while holding the control lock and only by the task whose
//! generation is still current, so a cancelled cycle can never publish afterwards.

use crate::core::{Quote, QuoteCache, QuoteSource, map_quotes};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// User-facing message published when a fetch fails.
pub const FETCH_ERROR_MESSAGE: &str = "Algo deu errado.";

// tokio intervals cannot have a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Stopped,
    /// Timer armed, no fetch outstanding.
    Scheduled,
    Fetching,
    /// Halted by a failed fetch until the next `start` or `force_refresh`.
    Errored,
}

/// When the first fetch of a freshly armed cycle fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    /// Cached quotes were published; the first fetch waits for them to expire.
    Deferred(Duration),
    Immediate,
}

struct Control {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    source: Arc<dyn QuoteSource>,
    cache: QuoteCache,
    period: Duration,
    quotes: watch::Sender<Vec<Quote>>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    phase: watch::Sender<SchedulerPhase>,
    control: Mutex<Control>,
}

pub struct QuoteScheduler {
    shared: Arc<Shared>,
}

impl QuoteScheduler {
    /// Creates a stopped scheduler showing `initial_quotes` (usually title-only
    /// placeholders). The polling period is the cache TTL.
    pub fn new(
        source: Arc<dyn QuoteSource>,
        cache: QuoteCache,
        initial_quotes: Vec<Quote>,
    ) -> Self {
        let period = cache.ttl().max(MIN_PERIOD);
        Self {
            shared: Arc::new(Shared {
                source,
                cache,
                period,
                quotes: watch::Sender::new(initial_quotes),
                loading: watch::Sender::new(false),
                error: watch::Sender::new(None),
                phase: watch::Sender::new(SchedulerPhase::Stopped),
                control: Mutex::new(Control {
                    generation: 0,
                    task: None,
                }),
            }),
        }
    }

    /// Cancels any running cycle and arms a new one.
    ///
    /// Cached quotes are published before this returns. Must be called from within a
    /// tokio runtime.
    pub fn start(&self) -> FirstTick {
        let mut control = self.shared.lock_control();
        self.shared.cancel(&mut control);

        let first_tick = match self.shared.cache.get() {
            Some(cached) => {
                self.shared.quotes.send_replace(cached);
                FirstTick::Deferred(self.shared.cache.remaining_time())
            }
            None => FirstTick::Immediate,
        };
        let delay = match first_tick {
            FirstTick::Deferred(remaining) => remaining,
            FirstTick::Immediate => Duration::ZERO,
        };

        let generation = control.generation;
        info!(generation, ?delay, "Quote polling started");
        self.shared.phase.send_replace(SchedulerPhase::Scheduled);

        let shared = Arc::clone(&self.shared);
        control.task = Some(tokio::spawn(shared.run(generation, delay)));
        first_tick
    }

    /// Cancels the running cycle, if any. Quotes and error are left as they are.
    pub fn stop(&self) {
        let mut control = self.shared.lock_control();
        if self.shared.cancel(&mut control) {
            info!("Quote polling stopped");
        }
    }

    /// Drops the cached entry and starts over, which always fetches immediately.
    pub fn force_refresh(&self) -> FirstTick {
        self.shared.cache.clear();
        self.start()
    }

    pub fn quotes(&self) -> Vec<Quote> {
        self.shared.quotes.borrow().clone()
    }

    pub fn loading(&self) -> bool {
        *self.shared.loading.borrow()
    }

    pub fn error(&self) -> Option<String> {
        self.shared.error.borrow().clone()
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.shared.phase.borrow()
    }

    pub fn subscribe_quotes(&self) -> watch::Receiver<Vec<Quote>> {
        self.shared.quotes.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.shared.loading.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.shared.error.subscribe()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SchedulerPhase> {
        self.shared.phase.subscribe()
    }
}

impl Drop for QuoteScheduler {
    fn drop(&mut self) {
        let mut control = self.shared.lock_control();
        self.shared.cancel(&mut control);
    }
}

impl Shared {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidates the current generation and aborts its task.
    /// Returns whether a cycle was actually running.
    fn cancel(&self, control: &mut Control) -> bool {
        control.generation += 1;
        let Some(task) = control.task.take() else {
            return false;
        };
        task.abort();

        // An aborted fetch never completes, so it must not leave the flag raised
        self.loading.send_replace(false);
        self.phase.send_if_modified(|phase| {
            if matches!(phase, SchedulerPhase::Scheduled | SchedulerPhase::Fetching) {
                *phase = SchedulerPhase::Stopped;
                true
            } else {
                false
            }
        });
        true
    }

    async fn run(self: Arc<Self>, generation: u64, delay: Duration) {
        let mut ticks = time::interval_at(Instant::now() + delay, self.period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            if !self.tick(generation).await {
                break;
            }
        }
        debug!(generation, "Polling task finished");
    }

    /// One polling cycle. Returns `false` once this generation should stop ticking.
    async fn tick(&self, generation: u64) -> bool {
        {
            let control = self.lock_control();
            if control.generation != generation {
                return false;
            }
            self.loading.send_replace(true);
            self.error.send_if_modified(|error| error.take().is_some());
            self.phase.send_replace(SchedulerPhase::Fetching);
        }

        debug!(generation, "Fetching quotes");
        let result = self.source.fetch_quotes().await;

        let mut control = self.lock_control();
        if control.generation != generation {
            debug!(generation, "Discarding result of a cancelled fetch");
            return false;
        }

        match result {
            Ok(raw) => {
                let quotes = map_quotes(&raw);
                debug!(count = quotes.len(), "Publishing fresh quotes");
                self.quotes.send_replace(quotes.clone());
                self.cache.set(&quotes);
                self.loading.send_replace(false);
                self.phase.send_replace(SchedulerPhase::Scheduled);
                true
            }
            Err(e) => {
                warn!(error = ?e, "Quote fetch failed, polling halted");
                self.error.send_replace(Some(FETCH_ERROR_MESSAGE.to_string()));
                self.loading.send_replace(false);
                self.phase.send_replace(SchedulerPhase::Errored);
                // This task is the one being halted; returning ends it.
                control.generation += 1;
                control.task = None;
                false
            }
        }
    }
}
