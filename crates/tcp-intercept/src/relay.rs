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

//! One-way relay loops.
//!
//! A `RelayDirection` reads from its source and writes the exact bytes to
//! its destination in strict alternation: a new read is never issued while
//! the paired write is outstanding. The backend-to-client direction
//! additionally arms the session's cancel token around each read, turning
//! a cooperative abort into a heartbeat frame instead of real data.
//!
//! Because the heartbeat write and the real-data write both happen inside
//! this single loop, they can never race on the client stream.

use crate::cancel::CancelToken;
use crate::error::CloseReason;
use crate::heartbeat::heartbeat_frame;
use crate::session::SessionShared;
use crate::{Direction, StreamHandle};
use bytes::BytesMut;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Outcome of a single relay read.
#[derive(Debug)]
enum ReadOutcome {
    /// Real data arrived.
    Data(usize),
    /// Zero-length read: graceful peer close.
    Eof,
    /// The armed read was cooperatively aborted by the heartbeat injector.
    Aborted,
    /// Hard transport error.
    Failed(io::Error),
}

/// One traffic direction of a session.
pub(crate) struct RelayDirection<R, W> {
    source: R,
    destination: W,
    direction: Direction,
    buffer: BytesMut,
}

impl<R, W> RelayDirection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub(crate) fn new(source: R, destination: W, direction: Direction, buffer_size: usize) -> Self {
        Self {
            source,
            destination,
            direction,
            buffer: BytesMut::zeroed(buffer_size),
        }
    }

    /// Runs the relay loop until a terminal event stops the session.
    pub(crate) async fn run<CH, BH>(mut self, shared: Arc<SessionShared<CH, BH>>)
    where
        CH: StreamHandle,
        BH: StreamHandle,
    {
        loop {
            let outcome = match self.direction {
                Direction::ClientToBackend => self.read_plain().await,
                Direction::BackendToClient => self.read_cancellable(&shared.cancel).await,
            };

            match outcome {
                ReadOutcome::Data(n) => {
                    shared.deadline.bump();
                    shared.add_bytes(self.direction, n as u64);

                    if shared.is_closed() {
                        break;
                    }

                    if let Err(e) = self.destination.write_all(&self.buffer[..n]).await {
                        debug!(
                            session_id = shared.id,
                            direction = %self.direction,
                            error = %e,
                            "relay write failed"
                        );
                        shared.stop(CloseReason::Transport);
                        break;
                    }

                    trace!(
                        session_id = shared.id,
                        direction = %self.direction,
                        bytes = n,
                        "relayed"
                    );
                }

                ReadOutcome::Eof => {
                    debug!(
                        session_id = shared.id,
                        direction = %self.direction,
                        "peer closed"
                    );
                    shared.stop(CloseReason::PeerClosed);
                    break;
                }

                ReadOutcome::Aborted => {
                    // Not an error: the injector interrupted a pending
                    // backend read. Emit a heartbeat frame to the client
                    // and go back to waiting. The deadline is untouched.
                    let seq = shared.next_heartbeat();
                    let frame = heartbeat_frame(seq);

                    if shared.is_closed() {
                        break;
                    }

                    if let Err(e) = self.destination.write_all(&frame).await {
                        debug!(
                            session_id = shared.id,
                            error = %e,
                            "heartbeat write failed"
                        );
                        shared.stop(CloseReason::Transport);
                        break;
                    }

                    debug!(session_id = shared.id, seq, "heartbeat sent");
                }

                ReadOutcome::Failed(e) => {
                    debug!(
                        session_id = shared.id,
                        direction = %self.direction,
                        error = %e,
                        "relay read failed"
                    );
                    shared.stop(CloseReason::Transport);
                    break;
                }
            }
        }
    }

    async fn read_plain(&mut self) -> ReadOutcome {
        match self.source.read(&mut self.buffer[..]).await {
            Ok(0) => ReadOutcome::Eof,
            Ok(n) => ReadOutcome::Data(n),
            Err(e) => ReadOutcome::Failed(e),
        }
    }

    /// Reads with the session's cancel token armed.
    ///
    /// The select is biased toward the read so that data arriving together
    /// with an abort request is never discarded; the late abort is simply
    /// ignored, and the guard clears it on drop.
    async fn read_cancellable(&mut self, cancel: &CancelToken) -> ReadOutcome {
        let armed = cancel.arm();

        tokio::select! {
            biased;
            result = self.source.read(&mut self.buffer[..]) => match result {
                Ok(0) => ReadOutcome::Eof,
                Ok(n) => ReadOutcome::Data(n),
                Err(e) => ReadOutcome::Failed(e),
            },
            () = armed.aborted() => ReadOutcome::Aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use tcp_intercept_transport::{mock_duplex_pair, DuplexStream};
    use tokio::io::AsyncWriteExt;

    fn test_shared<CH, BH>(client: CH, backend: BH) -> Arc<SessionShared<CH, BH>>
    where
        CH: StreamHandle,
        BH: StreamHandle,
    {
        Arc::new(SessionShared::new(Config::default(), client, backend))
    }

    #[tokio::test]
    async fn copies_bytes_source_to_destination() {
        let (client_side, client_peer) = mock_duplex_pair();
        let (backend_side, backend_peer) = mock_duplex_pair();

        let (client_read, _cw, client_handle) = client_side.into_parts();
        let (_br, backend_write, backend_handle) = backend_side.into_parts();
        let shared = test_shared(client_handle, backend_handle);

        let relay = RelayDirection::new(
            client_read,
            backend_write,
            Direction::ClientToBackend,
            1024,
        );
        let task = tokio::spawn(relay.run(Arc::clone(&shared)));

        let (_pr, mut peer_write, _ph) = client_peer.into_parts();
        peer_write.write_all(b"forward me").await.unwrap();
        peer_write.shutdown().await.unwrap();

        let (mut backend_read, _bw, _bh) = backend_peer.into_parts();
        let mut buf = [0u8; 10];
        backend_read.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"forward me");

        // EOF after the payload stops the session gracefully.
        task.await.unwrap();
        assert_eq!(shared.close_reason(), Some(CloseReason::PeerClosed));
        assert_eq!(shared.bytes_relayed(Direction::ClientToBackend), 10);
    }

    #[tokio::test]
    async fn write_failure_stops_with_transport_reason() {
        let (client_side, client_peer) = mock_duplex_pair();
        let (backend_side, _backend_peer) = mock_duplex_pair();

        let (client_read, _cw, client_handle) = client_side.into_parts();
        let (_br, mut backend_write, backend_handle) = backend_side.into_parts();

        // Shut the destination down first so the relay's write fails.
        backend_write.shutdown().await.unwrap();

        let shared = test_shared(client_handle, backend_handle);
        let relay = RelayDirection::new(
            client_read,
            backend_write,
            Direction::ClientToBackend,
            1024,
        );
        let task = tokio::spawn(relay.run(Arc::clone(&shared)));

        let (_pr, mut peer_write, _ph) = client_peer.into_parts();
        peer_write.write_all(b"doomed").await.unwrap();

        task.await.unwrap();
        assert_eq!(shared.close_reason(), Some(CloseReason::Transport));
    }

    #[tokio::test]
    async fn abort_emits_heartbeat_and_keeps_reading() {
        let (client_side, client_peer) = mock_duplex_pair();
        let (backend_side, backend_peer) = mock_duplex_pair();

        let (_cr, client_write, client_handle) = client_side.into_parts();
        let (backend_read, _bw, backend_handle) = backend_side.into_parts();
        let shared = test_shared(client_handle, backend_handle);

        let relay = RelayDirection::new(
            backend_read,
            client_write,
            Direction::BackendToClient,
            1024,
        );
        let task = tokio::spawn(relay.run(Arc::clone(&shared)));

        // Let the relay park in its armed read, then trigger an abort.
        tokio::task::yield_now().await;
        shared.cancel.emit();

        let (mut client_read, _pw, _ph) = client_peer.into_parts();
        let mut buf = [0u8; 15];
        client_read.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf[..], b"<heartbeat 1>\r\n");

        // Real data still flows after the heartbeat.
        let (_br, mut backend_write, _bh) = backend_peer.into_parts();
        backend_write.write_all(b"real").await.unwrap();

        let mut buf = [0u8; 4];
        client_read.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"real");

        assert_eq!(shared.heartbeats_sent(), 1);
        shared.stop(CloseReason::Stopped);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn client_direction_ignores_the_cancel_token() {
        let (client_side, client_peer) = mock_duplex_pair();
        let (backend_side, backend_peer) = mock_duplex_pair();

        let (client_read, _cw, client_handle) = client_side.into_parts();
        let (_br, backend_write, backend_handle) = backend_side.into_parts();
        let shared = test_shared(client_handle, backend_handle);

        let relay = RelayDirection::new(
            client_read,
            backend_write,
            Direction::ClientToBackend,
            1024,
        );
        let task = tokio::spawn(relay.run(Arc::clone(&shared)));

        // Emitting the token must not disturb the client-to-backend read.
        tokio::task::yield_now().await;
        shared.cancel.emit();

        let (_pr, mut peer_write, _ph) = client_peer.into_parts();
        peer_write.write_all(b"payload").await.unwrap();

        let (mut backend_read, _bw, _bh) = backend_peer.into_parts();
        let mut buf = [0u8; 7];
        backend_read.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"payload");

        assert_eq!(shared.heartbeats_sent(), 0);
        shared.stop(CloseReason::Stopped);
        task.await.unwrap();
    }
}
