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

//! Idle-deadline watchdog.
//!
//! A self-rescheduling periodic task: sleep until the current deadline,
//! then re-check it. Real traffic moves the deadline forward while the
//! watchdog sleeps, in which case it simply re-arms. An explicit loop is
//! used rather than recursion so long-lived sessions cannot grow the call
//! stack.

use crate::error::CloseReason;
use crate::session::SessionShared;
use crate::StreamHandle;
use std::sync::Arc;
use tracing::debug;

/// Runs the watchdog until the deadline expires or the session closes.
pub(crate) async fn run<CH, BH>(shared: Arc<SessionShared<CH, BH>>)
where
    CH: StreamHandle,
    BH: StreamHandle,
{
    loop {
        if shared.is_closed() {
            break;
        }

        let expires_at = shared.deadline.expires_at();
        tokio::select! {
            () = tokio::time::sleep_until(expires_at) => {}
            () = shared.timers_cancelled() => break,
        }

        if shared.is_closed() {
            break;
        }

        if shared.deadline.is_expired() {
            debug!(session_id = shared.id, "idle deadline expired");
            shared.stop(CloseReason::IdleTimeout);
            break;
        }

        // Traffic moved the deadline while we slept; re-arm.
    }
}
