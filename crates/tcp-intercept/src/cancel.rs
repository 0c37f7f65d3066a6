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

//! Cooperative single-operation cancellation.
//!
//! A [`CancelToken`] is scoped to exactly one pending operation at a time:
//! the currently armed backend read. Emitting it requests abort of that
//! operation only; an emit with nothing armed is a no-op, and an emit never
//! affects an operation armed afterwards. This is deliberately narrower
//! than a broadcast cancellation primitive.

use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct ArmState {
    /// Operation id of the currently armed read, if any.
    armed: Option<u64>,
    /// Operation id for which an abort has been requested, if any.
    abort_requested: Option<u64>,
    /// Monotonic generator for operation ids.
    next_op: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<ArmState>,
    notify: Notify,
}

/// Cooperative abort signal bound to at most one in-flight read.
///
/// Per-read state machine:
/// `Idle -> Armed -> {Completed | Aborted | Errored} -> Idle`.
#[derive(Debug, Default)]
pub(crate) struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Associates the token with a new pending operation.
    ///
    /// The returned guard disarms on drop, so the association lasts exactly
    /// as long as the read it protects.
    pub(crate) fn arm(&self) -> ArmedOp {
        let mut state = self.shared.state.lock().unwrap();
        state.next_op += 1;
        let op = state.next_op;
        state.armed = Some(op);

        ArmedOp {
            shared: Arc::clone(&self.shared),
            op,
        }
    }

    /// Requests abort of the currently armed operation, if any.
    pub(crate) fn emit(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if let Some(op) = state.armed {
            state.abort_requested = Some(op);
            drop(state);
            self.shared.notify.notify_waiters();
        }
    }
}

/// Guard representing one armed operation on a [`CancelToken`].
#[derive(Debug)]
pub(crate) struct ArmedOp {
    shared: Arc<Shared>,
    op: u64,
}

impl ArmedOp {
    /// Returns true if an abort was requested for this operation.
    pub(crate) fn is_aborted(&self) -> bool {
        self.shared.state.lock().unwrap().abort_requested == Some(self.op)
    }

    /// Resolves once an abort is requested for this operation.
    pub(crate) async fn aborted(&self) {
        loop {
            let notified = self.shared.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for ArmedOp {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.armed == Some(self.op) {
            state.armed = None;
        }
        if state.abort_requested == Some(self.op) {
            state.abort_requested = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn emit_aborts_the_armed_operation() {
        let token = CancelToken::new();
        let armed = token.arm();

        assert!(!armed.is_aborted());
        token.emit();
        assert!(armed.is_aborted());

        // aborted() resolves immediately once the request is in.
        armed.aborted().await;
    }

    #[tokio::test]
    async fn emit_with_nothing_armed_is_a_no_op() {
        let token = CancelToken::new();
        token.emit();

        // An operation armed after the emit must not observe it.
        let armed = token.arm();
        assert!(!armed.is_aborted());
    }

    #[tokio::test]
    async fn abort_does_not_leak_across_operations() {
        let token = CancelToken::new();

        let first = token.arm();
        token.emit();
        assert!(first.is_aborted());
        drop(first);

        let second = token.arm();
        assert!(!second.is_aborted());
    }

    #[tokio::test]
    async fn aborted_wakes_a_pending_waiter() {
        let token = Arc::new(CancelToken::new());
        let armed = token.arm();

        let emitter = {
            let token = Arc::clone(&token);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                token.emit();
            })
        };

        tokio::time::timeout(Duration::from_secs(1), armed.aborted())
            .await
            .expect("waiter should be woken by emit");
        emitter.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_the_guard_disarms() {
        let token = CancelToken::new();

        {
            let _armed = token.arm();
        }

        // Nothing armed anymore, so emit must be a no-op.
        token.emit();
        let fresh = token.arm();
        assert!(!fresh.is_aborted());
    }
}
