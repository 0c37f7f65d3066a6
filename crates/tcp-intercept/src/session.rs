// Copyright 2024-2026 Farlight Networks, LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Mutex::lock().unwrap() is the standard pattern in Rust. The lock only fails
// if the mutex is poisoned (a thread panicked while holding it), which
// indicates a bug elsewhere that should propagate. We also suppress the
// "missing # Panics" warning since these are not user-actionable panics.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

//! Session management for tcp-intercept.
//!
//! A `Session` owns the client and backend streams of one accepted
//! connection and coordinates the four activities that share them: the two
//! relay directions, the idle watchdog, and the heartbeat injector.

use crate::cancel::CancelToken;
use crate::deadline::Deadline;
use crate::error::CloseReason;
use crate::relay::RelayDirection;
use crate::{heartbeat, watchdog};
use crate::{Config, Direction, DuplexStream, Error, State, StreamHandle};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Global session ID counter.
static SESSION_ID: AtomicU64 = AtomicU64::new(0);

/// Inner session state shared by every activity of one session.
pub(crate) struct SessionShared<CH: StreamHandle, BH: StreamHandle> {
    /// Session ID for tracing.
    pub(crate) id: u64,
    /// Session configuration.
    pub(crate) config: Config,
    /// Current lifecycle state.
    state: AtomicU8,
    /// Why the session stopped; recorded once by the first `stop` caller.
    close_reason: Mutex<Option<CloseReason>>,
    /// Idle deadline, advanced only by real traffic.
    pub(crate) deadline: Deadline,
    /// Cancel token bound to the currently pending backend read.
    pub(crate) cancel: CancelToken,
    /// 1-based heartbeat sequence, strictly increasing for the session
    /// lifetime.
    heartbeat_seq: AtomicU64,
    /// Close handle for the client stream.
    client: CH,
    /// Close handle for the backend stream.
    backend: BH,
    /// Wakes sleeping timers so they observe closure promptly.
    timer_cancel: Notify,
    /// Bytes relayed client to backend.
    client_to_backend_bytes: AtomicU64,
    /// Bytes relayed backend to client.
    backend_to_client_bytes: AtomicU64,
}

impl<CH: StreamHandle, BH: StreamHandle> SessionShared<CH, BH> {
    pub(crate) fn new(config: Config, client: CH, backend: BH) -> Self {
        let deadline = Deadline::new(config.idle_timeout);

        Self {
            id: SESSION_ID.fetch_add(1, Ordering::Relaxed),
            config,
            state: AtomicU8::new(State::Idle as u8),
            close_reason: Mutex::new(None),
            deadline,
            cancel: CancelToken::new(),
            heartbeat_seq: AtomicU64::new(0),
            client,
            backend,
            timer_cancel: Notify::new(),
            client_to_backend_bytes: AtomicU64::new(0),
            backend_to_client_bytes: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    fn mark_running(&self) {
        debug_assert!(self.state().can_transition_to(State::Running));
        self.state.store(State::Running as u8, Ordering::SeqCst);
    }

    /// Stops the session: closes both streams exactly once and cancels the
    /// timers. Idempotent and safe to call concurrently from any activity.
    pub(crate) fn stop(&self, reason: CloseReason) {
        let previous = self.state.swap(State::Closed as u8, Ordering::SeqCst);
        if State::from_u8(previous).is_closed() {
            return;
        }
        debug_assert!(State::from_u8(previous).can_transition_to(State::Closed));

        *self.close_reason.lock().unwrap() = Some(reason);
        debug!(session_id = self.id, %reason, "session stopping");

        // Closing the streams is the shutdown broadcast: every pending
        // read and write fails, unwinding both relay loops.
        self.client.close();
        self.backend.close();
        self.timer_cancel.notify_waiters();
    }

    /// Returns the next 1-based heartbeat sequence number.
    pub(crate) fn next_heartbeat(&self) -> u64 {
        self.heartbeat_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn heartbeats_sent(&self) -> u64 {
        self.heartbeat_seq.load(Ordering::Relaxed)
    }

    pub(crate) fn add_bytes(&self, direction: Direction, n: u64) {
        match direction {
            Direction::ClientToBackend => {
                self.client_to_backend_bytes.fetch_add(n, Ordering::Relaxed);
            }
            Direction::BackendToClient => {
                self.backend_to_client_bytes.fetch_add(n, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn bytes_relayed(&self, direction: Direction) -> u64 {
        match direction {
            Direction::ClientToBackend => self.client_to_backend_bytes.load(Ordering::Relaxed),
            Direction::BackendToClient => self.backend_to_client_bytes.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn close_reason(&self) -> Option<CloseReason> {
        *self.close_reason.lock().unwrap()
    }

    /// Resolves once `stop` has cancelled the timers.
    pub(crate) async fn timers_cancelled(&self) {
        self.timer_cancel.notified().await;
    }
}

/// A relay session between one accepted client and the fixed backend.
///
/// The backend stream must already be dialed; the listener shim discards
/// clients whose backend dial fails without ever creating a session.
///
/// # Example
///
/// ```ignore
/// use tcp_intercept::{Config, Session, TcpDuplex};
///
/// let session = Session::new(
///     TcpDuplex::new(client_stream),
///     TcpDuplex::new(backend_stream),
///     Config::default(),
/// );
/// let mut handle = session.start()?;
/// handle.join().await;
/// ```
pub struct Session<C: DuplexStream, B: DuplexStream> {
    client: C,
    backend: B,
    config: Config,
}

impl<C: DuplexStream, B: DuplexStream> Session<C, B> {
    /// Creates a new session over a client stream and a dialed backend
    /// stream.
    #[must_use]
    pub fn new(client: C, backend: B, config: Config) -> Self {
        Self {
            client,
            backend,
            config,
        }
    }

    /// Starts the session activities.
    ///
    /// Splits both streams and spawns the two relay loops, the watchdog,
    /// and the heartbeat injector. The returned handle can stop the
    /// session and await its termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn start(self) -> Result<SessionHandle<C::Handle, B::Handle>, Error> {
        self.config.validate()?;

        let buffer_size = self.config.buffer_size;
        let (client_read, client_write, client_handle) = self.client.into_parts();
        let (backend_read, backend_write, backend_handle) = self.backend.into_parts();

        let shared = Arc::new(SessionShared::new(
            self.config,
            client_handle,
            backend_handle,
        ));
        shared.mark_running();
        debug!(session_id = shared.id, "session started");

        let client_to_backend = RelayDirection::new(
            client_read,
            backend_write,
            Direction::ClientToBackend,
            buffer_size,
        );
        let backend_to_client = RelayDirection::new(
            backend_read,
            client_write,
            Direction::BackendToClient,
            buffer_size,
        );

        let tasks = vec![
            tokio::spawn(client_to_backend.run(Arc::clone(&shared))),
            tokio::spawn(backend_to_client.run(Arc::clone(&shared))),
            tokio::spawn(watchdog::run(Arc::clone(&shared))),
            tokio::spawn(heartbeat::run_injector(Arc::clone(&shared))),
        ];

        Ok(SessionHandle { shared, tasks })
    }
}

/// Handle to a running session.
///
/// Dropping the handle does not stop the session; the activities keep
/// relaying until a terminal event or an explicit [`stop`](Self::stop).
pub struct SessionHandle<CH: StreamHandle, BH: StreamHandle> {
    shared: Arc<SessionShared<CH, BH>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<CH: StreamHandle, BH: StreamHandle> SessionHandle<CH, BH> {
    /// Returns the session ID used in log output.
    #[must_use]
    pub fn session_id(&self) -> u64 {
        self.shared.id
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// Returns true if the session has terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Returns why the session stopped, once it has.
    #[must_use]
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.shared.close_reason()
    }

    /// Returns the number of heartbeat frames sent to the client.
    #[must_use]
    pub fn heartbeats_sent(&self) -> u64 {
        self.shared.heartbeats_sent()
    }

    /// Returns the number of payload bytes relayed in the given direction.
    #[must_use]
    pub fn bytes_relayed(&self, direction: Direction) -> u64 {
        self.shared.bytes_relayed(direction)
    }

    /// Stops the session, closing both streams.
    ///
    /// Safe to call any number of times; only the first call takes effect.
    pub fn stop(&self) {
        self.shared.stop(CloseReason::Stopped);
    }

    /// Waits for every session activity to finish.
    pub async fn join(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(session_id = self.shared.id, error = %e, "session task failed");
            }
        }
    }
}
