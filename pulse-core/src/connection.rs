//! Supervised event-stream connection
//!
//! Owns one push-stream connection at a time and keeps it alive across
//! failures. The supervisor runs as an independent tokio task:
//! 1. Opens the transport and forwards every named event to the
//!    [`InvalidationRouter`].
//! 2. Treats the reserved `init` event as proof of a live connection: only
//!    then does the retry counter reset and a baseline resync run, so a
//!    flapping link that connects and immediately errors still backs off.
//! 3. On any transport failure, sleeps per [`ReconnectPolicy`] and tries
//!    again; `stop()` cancels the task and any pending sleep.
//!
//! A stopped connection is terminal: build a new one to reconnect.

use crate::invalidation::InvalidationRouter;
use crate::retry::ReconnectPolicy;
use crate::transport::{EventStream, EventTransport, INIT_EVENT, TransportError};

use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Observable lifecycle of the stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state, and terminal state after `stop()`.
    Disconnected,
    /// A transport connection is open (or opening) but `init` has not
    /// arrived yet.
    Connecting,
    /// `init` received; events are flowing.
    Connected,
    /// Waiting out a backoff delay before the next attempt.
    Reconnecting,
}

enum Lifecycle {
    Idle,
    Running { cancel: CancellationToken },
    Stopped,
}

/// Supervised connection to the server push stream.
///
/// `start()` is idempotent while running; `stop()` is safe to call from any
/// state, any number of times. Dropping the connection cancels the task.
pub struct EventStreamConnection {
    transport: Arc<dyn EventTransport>,
    router: InvalidationRouter,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    lifecycle: Mutex<Lifecycle>,
}

impl EventStreamConnection {
    pub fn new(
        transport: Arc<dyn EventTransport>,
        router: InvalidationRouter,
        policy: ReconnectPolicy,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            router,
            policy,
            state_tx,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Spawn the supervisor task. A no-op while already running, and a no-op
    /// after `stop()`: stopped connections are terminal.
    pub fn start(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match &*lifecycle {
            Lifecycle::Running { .. } => {
                tracing::debug!("event stream already running");
            }
            Lifecycle::Stopped => {
                tracing::warn!("event stream was stopped; build a new connection to restart");
            }
            Lifecycle::Idle => {
                let cancel = CancellationToken::new();
                tokio::spawn(run_supervisor(
                    Arc::clone(&self.transport),
                    self.router.clone(),
                    self.policy.clone(),
                    self.state_tx.clone(),
                    cancel.clone(),
                ));
                *lifecycle = Lifecycle::Running { cancel };
            }
        }
    }

    /// Cancel the supervisor task and any pending reconnect sleep.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if let Lifecycle::Running { cancel } = &*lifecycle {
            tracing::info!("stopping event stream");
            cancel.cancel();
        }
        *lifecycle = Lifecycle::Stopped;
        self.state_tx.send_replace(ConnectionState::Disconnected);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

impl Drop for EventStreamConnection {
    fn drop(&mut self) {
        if let Lifecycle::Running { cancel } = &*self.lifecycle.lock() {
            cancel.cancel();
        }
    }
}

enum StreamOutcome {
    Cancelled,
    Failed(TransportError),
}

async fn run_supervisor(
    transport: Arc<dyn EventTransport>,
    router: InvalidationRouter,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut retries: u32 = 0;
    loop {
        state_tx.send_replace(ConnectionState::Connecting);
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            attempt = transport.open() => attempt,
        };
        match attempt {
            Ok(stream) => {
                match drive_stream(stream, &router, &mut retries, &state_tx, &cancel).await {
                    StreamOutcome::Cancelled => break,
                    StreamOutcome::Failed(error) => {
                        tracing::warn!(%error, "event stream failed");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "event stream connect failed");
            }
        }

        state_tx.send_replace(ConnectionState::Reconnecting);
        let delay = policy.delay_for_attempt(retries);
        retries = retries.saturating_add(1);
        tracing::info!(delay_ms = delay.as_millis() as u64, "reconnecting after delay");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    state_tx.send_replace(ConnectionState::Disconnected);
}

async fn drive_stream(
    mut stream: EventStream,
    router: &InvalidationRouter,
    retries: &mut u32,
    state_tx: &watch::Sender<ConnectionState>,
    cancel: &CancellationToken,
) -> StreamOutcome {
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamOutcome::Cancelled,
            item = stream.next() => item,
        };
        match item {
            Some(Ok(event)) if event.name == INIT_EVENT => {
                *retries = 0;
                state_tx.send_replace(ConnectionState::Connected);
                tracing::info!("event stream connected");
                router.resync().await;
            }
            Some(Ok(event)) => {
                router.route(&event.name).await;
            }
            Some(Err(error)) => return StreamOutcome::Failed(error),
            None => return StreamOutcome::Failed(TransportError::UnexpectedEnd),
        }
    }
}
