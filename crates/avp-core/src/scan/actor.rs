//! Scan session task.
//!
//! Frames from the capture pipeline are queued to a single task that owns
//! the session, so merges happen strictly in arrival order. Completeness
//! arms a quiet-period timer when a stability delay is configured; a
//! manual trigger disarms it before finalizing.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error};

use super::session::{SessionCore, SessionEvent};
use super::store::RecordStore;
use crate::error::{Result, SessionError};
use crate::models::config::ScanConfig;
use crate::models::scan::ScannedObservation;

const COMMAND_QUEUE_SIZE: usize = 64;

#[derive(Debug)]
enum Command {
    Frame(ScannedObservation),
    Manual(Option<ScannedObservation>),
    Close,
}

/// Sending side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Queue a frame observation.
    pub async fn submit(&self, observation: ScannedObservation) -> std::result::Result<(), SessionError> {
        self.send(Command::Frame(observation)).await
    }

    /// Force a finalize, optionally with one last frame.
    pub async fn trigger_manual(
        &self,
        observation: Option<ScannedObservation>,
    ) -> std::result::Result<(), SessionError> {
        self.send(Command::Manual(observation)).await
    }

    /// Ask the session to stop. Pending data is discarded.
    pub async fn close(&self) -> std::result::Result<(), SessionError> {
        self.send(Command::Close).await
    }

    /// Whether the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: Command) -> std::result::Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }
}

/// A running scan session.
pub struct ScanSession<S> {
    core: SessionCore<S>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    stability_delay: Duration,
}

impl<S: RecordStore + Send + 'static> ScanSession<S> {
    /// Start a session task.
    ///
    /// Returns the handle for feeding it, the event stream, and the task,
    /// which yields the store back when the session ends.
    pub fn spawn(
        config: ScanConfig,
        store: S,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>, JoinHandle<S>) {
        let (tx, commands) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let (events, event_rx) = mpsc::unbounded_channel();

        let session = Self {
            stability_delay: Duration::from_millis(config.stability_delay_ms),
            core: SessionCore::new(config, store),
            commands,
            events,
        };

        let task = tokio::spawn(session.run());
        (SessionHandle { tx }, event_rx, task)
    }

    async fn run(mut self) -> S {
        let timer = sleep(Duration::ZERO);
        tokio::pin!(timer);
        let mut armed = false;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Frame(observation)) => {
                        match self.core.offer(observation) {
                            Ok((offer, progress)) => {
                                self.emit(progress);
                                if offer.complete {
                                    if self.stability_delay.is_zero() {
                                        let result = self.core.complete_pending();
                                        self.emit_all(result);
                                    } else if !armed || offer.address_grew {
                                        debug!("Complete, waiting {:?} for a better frame", self.stability_delay);
                                        timer.as_mut().reset(Instant::now() + self.stability_delay);
                                        armed = true;
                                    }
                                }
                            }
                            Err(e) => error!("Dropping frame: {}", e),
                        }
                    }
                    Some(Command::Manual(observation)) => {
                        if armed {
                            debug!("Manual trigger cancels the stability timer");
                            armed = false;
                        }
                        let result = self.core.trigger_manual(observation);
                        self.emit_all(result);
                    }
                    Some(Command::Close) | None => break,
                },
                () = &mut timer, if armed => {
                    armed = false;
                    let result = self.core.complete_pending();
                    self.emit_all(result);
                }
            }

            if self.core.is_finished() {
                break;
            }
        }

        if let Some(finished) = self.core.close() {
            self.emit(finished);
        }
        self.core.into_store()
    }

    fn emit(&self, event: SessionEvent) {
        // The caller may have stopped listening.
        let _ = self.events.send(event);
    }

    fn emit_all(&self, result: Result<Vec<SessionEvent>>) {
        match result {
            Ok(events) => events.into_iter().for_each(|e| self.emit(e)),
            Err(e) => error!("Finalize failed: {}", e),
        }
    }
}
