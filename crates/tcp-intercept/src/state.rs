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

//! Session state machine.
//!
//! Defines the lifecycle states of a relay session and valid transitions.

/// Session lifecycle state.
///
/// The session progresses through these states:
/// ```text
/// Idle ──► Running ──► Closed
///   │                    ▲
///   └────────────────────┘ (start failure)
/// ```
///
/// `Closed` is one-shot: once entered, no activity writes to either
/// stream again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// Initial state before the session activities are spawned.
    #[default]
    Idle,
    /// Both relay directions, the watchdog, and the heartbeat injector
    /// are running.
    Running,
    /// Session has terminated; both streams are closed.
    Closed,
}

impl State {
    /// Converts from the u8 representation used in atomic storage.
    #[must_use]
    pub(crate) const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Closed,
        }
    }

    /// Returns true if the session activities are running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if the session has terminated.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        use State::{Closed, Idle, Running};

        match (*self, target) {
            // Normal progression
            (Idle, Running) => true,
            (Running, Closed) => true,

            // Startup failure skips Running
            (Idle, Closed) => true,

            // Everything else is invalid
            _ => false,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        assert!(State::Idle.can_transition_to(State::Running));
        assert!(State::Running.can_transition_to(State::Closed));
        assert!(State::Idle.can_transition_to(State::Closed));
    }

    #[test]
    fn invalid_transitions() {
        // Closed is terminal
        assert!(!State::Closed.can_transition_to(State::Running));
        assert!(!State::Closed.can_transition_to(State::Idle));

        // Can't go backwards
        assert!(!State::Running.can_transition_to(State::Idle));
    }

    #[test]
    fn state_round_trips_through_u8() {
        for state in [State::Idle, State::Running, State::Closed] {
            assert_eq!(State::from_u8(state as u8), state);
        }
    }

    #[test]
    fn state_display() {
        assert_eq!(State::Idle.to_string(), "idle");
        assert_eq!(State::Running.to_string(), "running");
        assert_eq!(State::Closed.to_string(), "closed");
    }

    #[test]
    fn predicates() {
        assert!(State::Running.is_running());
        assert!(!State::Idle.is_running());
        assert!(State::Closed.is_closed());
        assert!(!State::Running.is_closed());
    }
}
