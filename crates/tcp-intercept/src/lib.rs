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

//! Intercepting TCP relay with idle timeout and heartbeat injection.
//!
//! `tcp-intercept` sits between a client and a fixed backend, relaying
//! bytes unmodified in both directions while adding two behaviors the
//! backend never sees:
//!
//! - An idle watchdog that closes the session after a configurable period
//!   with no real traffic in either direction
//! - A heartbeat injector that sends synthetic `<heartbeat N>\r\n` frames
//!   to the client whenever the backend is quiet for an interval, without
//!   ever corrupting or reordering real backend data
//!
//! Heartbeats are injected by cooperatively cancelling the pending backend
//! read from inside the backend-to-client relay loop, so real data and
//! heartbeat frames are serialized on the client stream by construction.
//!
//! # Example
//!
//! ```ignore
//! use tcp_intercept::{serve, Config};
//! use tokio::net::TcpListener;
//!
//! let listener = TcpListener::bind("127.0.0.1:9000").await?;
//! serve(listener, "127.0.0.1:7000".parse()?, Config::default()).await?;
//! ```

pub use tcp_intercept_transport::{
    DuplexStream, StreamHandle, TcpDuplex, TcpHandle, TransportError,
};

mod cancel;
mod config;
mod deadline;
mod error;
mod heartbeat;
mod relay;
mod server;
mod session;
mod state;
mod watchdog;

pub use config::{Config, ConfigError};
pub use error::{CloseReason, Error};
pub use server::serve;
pub use session::{Session, SessionHandle};
pub use state::State;

/// Traffic direction within a session.
///
/// Real bytes flow both ways; heartbeat frames exist only in the
/// backend-to-client direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bytes read from the client and written to the backend.
    ClientToBackend,
    /// Bytes read from the backend and written to the client.
    BackendToClient,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientToBackend => write!(f, "client->backend"),
            Self::BackendToClient => write!(f, "backend->client"),
        }
    }
}
