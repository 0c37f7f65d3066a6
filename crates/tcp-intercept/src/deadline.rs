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
// indicates a bug elsewhere that should propagate.
#![allow(clippy::unwrap_used)]

//! Idle deadline tracking.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// The absolute time after which the watchdog closes an idle session.
///
/// The deadline never decreases. It is advanced by [`bump`](Self::bump) on
/// every successful real read in either direction; heartbeat activity never
/// touches it.
#[derive(Debug)]
pub(crate) struct Deadline {
    idle_timeout: Duration,
    expires_at: Mutex<Instant>,
}

impl Deadline {
    /// Creates a deadline expiring one idle timeout from now.
    pub(crate) fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            expires_at: Mutex::new(Instant::now() + idle_timeout),
        }
    }

    /// Advances the deadline to `max(current, now + idle_timeout)`.
    pub(crate) fn bump(&self) {
        let candidate = Instant::now() + self.idle_timeout;
        let mut expires_at = self.expires_at.lock().unwrap();
        if candidate > *expires_at {
            *expires_at = candidate;
        }
    }

    /// Returns the current expiry instant.
    pub(crate) fn expires_at(&self) -> Instant {
        *self.expires_at.lock().unwrap()
    }

    /// Returns true if the deadline has passed.
    pub(crate) fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at()
    }
}
