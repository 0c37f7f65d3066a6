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

//! Error types for relay sessions.

use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level read or write failure. Always terminal for the
    /// session; never retried.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Session has been closed.
    #[error("session closed")]
    SessionClosed,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Why a session stopped.
///
/// Idle-timeout termination is deliberate, policy-driven shutdown; it is
/// distinguished from transport failure only by this cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A peer closed its end of the connection (zero-length read).
    PeerClosed,
    /// The watchdog expired the idle deadline.
    IdleTimeout,
    /// A read or write on either stream failed.
    Transport,
    /// `stop` was called explicitly.
    Stopped,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed"),
            Self::IdleTimeout => write!(f, "idle timeout"),
            Self::Transport => write!(f, "transport error"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::Transport(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone",
        ));
        assert!(err.to_string().contains("transport error"));

        assert_eq!(Error::SessionClosed.to_string(), "session closed");
    }

    #[test]
    fn close_reason_display() {
        assert_eq!(CloseReason::PeerClosed.to_string(), "peer closed");
        assert_eq!(CloseReason::IdleTimeout.to_string(), "idle timeout");
        assert_eq!(CloseReason::Transport.to_string(), "transport error");
        assert_eq!(CloseReason::Stopped.to_string(), "stopped");
    }
}
