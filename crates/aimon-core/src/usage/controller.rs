//! Periodic refresh with a single in-flight fetch session.
//!
//! The controller is one task. Timer ticks, explicit refresh requests,
//! settings changes and session results are all handled in its select loop,
//! so [`ControllerState`] has exactly one writer. Starting a session always
//! cancels the previous one first, and results are tagged with a generation
//! number so a superseded session can never write state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fetcher::{FetchError, FetchErrorKind, UsageSource};
use super::parser::{parse_snapshot, ParseOutcome};
use super::session::{FetchSession, SessionOutcome};
use super::types::Snapshot;
use crate::config::{SettingKey, SharedSettings};

/// Receiver for controller state updates
pub type StateReceiver = watch::Receiver<ControllerState>;

/// Refresh state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// No session in flight
    Idle,
    /// Exactly one session in flight
    Fetching,
    /// Torn down; terminal
    Disabled,
}

/// Most recent transport-level failure
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(e: &FetchError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// State published to presentation consumers
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// Last known-good per-tool data
    pub snapshot: Snapshot,
    /// True from refresh start until the active session resolves
    pub is_loading: bool,
    /// Current phase
    pub phase: ControllerPhase,
    /// Period of the refresh timer
    pub refresh_interval_secs: u64,
    /// Last transport failure; cleared by the next successful fetch
    pub last_error: Option<FetchFailure>,
    /// When the current snapshot was applied
    pub fetched_at: Option<DateTime<Utc>>,
    /// Number of snapshot replacements so far
    pub revision: u64,
}

impl ControllerState {
    /// Initial state: empty snapshot, loading
    pub fn new(refresh_interval_secs: u64) -> Self {
        Self {
            snapshot: Snapshot::default(),
            is_loading: true,
            phase: ControllerPhase::Idle,
            refresh_interval_secs,
            last_error: None,
            fetched_at: None,
            revision: 0,
        }
    }
}

/// Error type for controller handle operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller has been torn down
    #[error("refresh controller is no longer running")]
    Closed,
}

#[derive(Debug)]
enum Command {
    Refresh,
    SetInterval(u64),
    Teardown,
}

struct ActiveSession {
    generation: u64,
    cancel: CancellationToken,
}

struct SessionResult {
    generation: u64,
    outcome: SessionOutcome,
}

/// Owns the refresh timer and the active fetch session.
pub struct RefreshController {
    source: Arc<dyn UsageSource>,
    settings: SharedSettings,
    settings_rx: broadcast::Receiver<SettingKey>,
    state_tx: watch::Sender<ControllerState>,
    results_tx: mpsc::UnboundedSender<SessionResult>,
    results_rx: mpsc::UnboundedReceiver<SessionResult>,
    active: Option<ActiveSession>,
    generation: u64,
    period: Duration,
}

impl RefreshController {
    /// Create a controller. It subscribes to settings changes immediately.
    pub fn new(source: Arc<dyn UsageSource>, settings: SharedSettings) -> Self {
        let secs = settings.snapshot().refresh_interval_secs.max(1);
        let settings_rx = settings.subscribe();
        let (state_tx, _) = watch::channel(ControllerState::new(secs));
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Self {
            source,
            settings,
            settings_rx,
            state_tx,
            results_tx,
            results_rx,
            active: None,
            generation: 0,
            period: Duration::from_secs(secs),
        }
    }

    /// Start the controller loop. An initial refresh is issued right away.
    pub fn spawn(self) -> ControllerHandle {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let state = self.state_tx.subscribe();
        let task = tokio::spawn(self.run(commands_rx));

        ControllerHandle {
            commands,
            state,
            task: Some(task),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut ticker = ticker(self.period);
        self.request_refresh();

        loop {
            tokio::select! {
                _ = ticker.tick() => self.request_refresh(),
                cmd = commands.recv() => match cmd {
                    Some(Command::Refresh) => self.request_refresh(),
                    Some(Command::SetInterval(secs)) => {
                        if let Some(next) = self.set_refresh_interval(secs) {
                            ticker = next;
                        }
                    }
                    // All handles dropped counts as teardown
                    Some(Command::Teardown) | None => break,
                },
                Some(result) = self.results_rx.recv() => self.complete(result),
                change = self.settings_rx.recv() => {
                    if let Some(next) = self.on_settings_changed(change) {
                        ticker = next;
                    }
                }
            }
        }

        self.teardown();
    }

    /// Cancel any active session and start a new one.
    fn request_refresh(&mut self) {
        if let Some(previous) = self.active.take() {
            debug!(generation = previous.generation, "Superseding active fetch session");
            previous.cancel.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let timeout = self
            .settings
            .snapshot()
            .data_source
            .timeout_secs
            .map(Duration::from_secs);
        let session = FetchSession::new(generation, Arc::clone(&self.source), timeout);
        let results = self.results_tx.clone();
        let token = cancel.clone();

        tokio::spawn(async move {
            let outcome = session.run(token).await;
            // Receiver is gone only after teardown
            let _ = results.send(SessionResult {
                generation,
                outcome,
            });
        });

        self.active = Some(ActiveSession { generation, cancel });
        self.state_tx.send_modify(|state| {
            state.is_loading = true;
            state.phase = ControllerPhase::Fetching;
        });
        debug!(generation, "Refresh started");
    }

    /// Apply the result of a session if it is still the active one.
    fn complete(&mut self, result: SessionResult) {
        let is_current = self
            .active
            .as_ref()
            .is_some_and(|a| a.generation == result.generation);
        if !is_current {
            debug!(generation = result.generation, "Discarding result of superseded session");
            return;
        }

        let settled = match result.outcome {
            SessionOutcome::Cancelled => return,
            SessionOutcome::Completed(payload) => {
                parse_snapshot(&payload).map_err(FetchError::from)
            }
            SessionOutcome::Failed(e) => Err(e),
        };
        self.active = None;

        match settled {
            Ok(ParseOutcome::Snapshot(snapshot)) => {
                info!(generation = result.generation, "Usage snapshot updated");
                self.state_tx.send_modify(|state| {
                    state.snapshot = snapshot;
                    state.fetched_at = Some(Utc::now());
                    state.revision += 1;
                    state.last_error = None;
                    settle(state);
                });
            }
            Ok(ParseOutcome::NoUpdate) => {
                debug!(generation = result.generation, "Empty payload, keeping previous snapshot");
                self.state_tx.send_modify(|state| {
                    state.last_error = None;
                    settle(state);
                });
            }
            Err(e) => {
                warn!(generation = result.generation, kind = ?e.kind(), "Usage fetch failed: {}", e);
                let failure = FetchFailure::from(&e);
                self.state_tx.send_modify(|state| {
                    state.last_error = Some(failure);
                    settle(state);
                });
            }
        }
    }

    /// Change the timer period. Takes effect from the next tick; no refresh
    /// is issued. Returns the replacement timer.
    fn set_refresh_interval(&mut self, secs: u64) -> Option<Interval> {
        if secs == 0 {
            warn!("Ignoring refresh interval of 0 seconds");
            return None;
        }
        let period = Duration::from_secs(secs);
        info!("Refresh interval set to {}s", secs);
        self.period = period;
        self.state_tx
            .send_modify(|state| state.refresh_interval_secs = secs);
        Some(ticker(period))
    }

    fn on_settings_changed(
        &mut self,
        change: Result<SettingKey, broadcast::error::RecvError>,
    ) -> Option<Interval> {
        match change {
            Ok(SettingKey::RefreshInterval) => {}
            Ok(_) => return None,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!("Missed {} settings notifications, re-reading interval", n);
            }
            // The controller holds the store, so the sender outlives us
            Err(broadcast::error::RecvError::Closed) => return None,
        }

        let secs = self.settings.snapshot().refresh_interval_secs;
        if Duration::from_secs(secs) == self.period {
            return None;
        }
        self.set_refresh_interval(secs)
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(generation = active.generation, "Cancelling fetch session on teardown");
            active.cancel.cancel();
        }
        let secs = self.period.as_secs();
        self.state_tx.send_modify(|state| {
            *state = ControllerState::new(secs);
            state.is_loading = false;
            state.phase = ControllerPhase::Disabled;
        });
        info!("Refresh controller stopped");
    }
}

fn settle(state: &mut ControllerState) {
    state.is_loading = false;
    state.phase = ControllerPhase::Idle;
}

/// Periodic timer whose first tick is one full period away
fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Handle to a running [`RefreshController`].
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: StateReceiver,
    task: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Start a new fetch, superseding any in flight
    pub fn request_refresh(&self) -> Result<(), ControllerError> {
        self.send(Command::Refresh)
    }

    /// Reschedule the refresh timer
    pub fn set_refresh_interval(&self, secs: u64) -> Result<(), ControllerError> {
        self.send(Command::SetInterval(secs))
    }

    /// Subscribe to state updates
    pub fn subscribe(&self) -> StateReceiver {
        self.state.clone()
    }

    /// Copy of the current state
    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Stop the timer, cancel any active session and wait for the loop to
    /// exit. Later operations return [`ControllerError::Closed`].
    pub async fn teardown(&mut self) {
        let _ = self.commands.send(Command::Teardown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Refresh controller task failed: {}", e);
            }
        }
    }

    fn send(&self, cmd: Command) -> Result<(), ControllerError> {
        self.commands.send(cmd).map_err(|_| ControllerError::Closed)
    }
}
