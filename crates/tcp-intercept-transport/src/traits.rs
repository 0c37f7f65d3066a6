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

//! Transport trait definitions.
//!
//! These traits abstract over bidirectional byte streams, enabling
//! tcp-intercept to relay over real TCP sockets in production and
//! over in-memory stream pairs in tests.

use tokio::io::{AsyncRead, AsyncWrite};

/// Abstraction over a bidirectional byte stream.
///
/// A duplex stream splits into independently owned read and write halves
/// plus a cloneable [`StreamHandle`]. The handle is the shutdown mechanism:
/// closing it makes every pending and future operation on the halves fail,
/// which is how the relay unwinds all activities sharing a session.
pub trait DuplexStream: Send + 'static {
    /// The read half type produced by splitting.
    type ReadHalf: AsyncRead + Send + Unpin + 'static;
    /// The write half type produced by splitting.
    type WriteHalf: AsyncWrite + Send + Unpin + 'static;
    /// The handle type used to close the stream from any task.
    type Handle: StreamHandle;

    /// Splits the stream into its read half, write half, and close handle.
    fn into_parts(self) -> (Self::ReadHalf, Self::WriteHalf, Self::Handle);
}

/// A cloneable handle that can close its stream from any task.
///
/// `close` must be idempotent and safe to call concurrently. After the
/// first call, reads and writes on the associated halves fail with a
/// "stream closed" I/O error rather than blocking.
pub trait StreamHandle: Clone + Send + Sync + 'static {
    /// Closes the stream, failing all pending and future operations.
    fn close(&self);

    /// Returns true if the stream has been closed via this handle.
    fn is_closed(&self) -> bool;
}
