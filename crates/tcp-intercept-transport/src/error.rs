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

//! Transport error types.

use std::io;
use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Stream was closed via its handle.
    #[error("stream closed")]
    Closed,

    /// Peer end of the stream is gone.
    #[error("broken pipe: peer closed")]
    BrokenPipe,

    /// I/O error from the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Converts this error into an `std::io::Error` suitable for returning
    /// from `AsyncRead`/`AsyncWrite` implementations.
    #[must_use]
    pub fn into_io(self) -> io::Error {
        match self {
            Self::Closed => io::Error::new(io::ErrorKind::ConnectionAborted, Self::Closed),
            Self::BrokenPipe => io::Error::new(io::ErrorKind::BrokenPipe, Self::BrokenPipe),
            Self::Io(e) => e,
        }
    }
}
