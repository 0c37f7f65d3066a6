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

//! Heartbeat frame encoding and the periodic injector.
//!
//! The injector is a blind trigger: every interval it emits the session's
//! cancel token and nothing more. Whether a backend read was actually
//! pending, and whether a heartbeat frame gets written, is decided entirely
//! by the backend-to-client relay loop.

use crate::session::SessionShared;
use crate::StreamHandle;
use std::sync::Arc;
use tracing::trace;

/// Encodes the heartbeat frame for the given 1-based sequence number.
///
/// Wire format: ASCII `<heartbeat N>\r\n`. The sequence is strictly
/// increasing within a session and resets only on session creation.
pub(crate) fn heartbeat_frame(seq: u64) -> Vec<u8> {
    format!("<heartbeat {seq}>\r\n").into_bytes()
}

/// Runs the heartbeat injector until the session closes.
pub(crate) async fn run_injector<CH, BH>(shared: Arc<SessionShared<CH, BH>>)
where
    CH: StreamHandle,
    BH: StreamHandle,
{
    loop {
        tokio::select! {
            () = tokio::time::sleep(shared.config.heartbeat_interval) => {}
            () = shared.timers_cancelled() => break,
        }

        if shared.is_closed() {
            break;
        }

        trace!(session_id = shared.id, "heartbeat tick");
        shared.cancel.emit();
    }
}
