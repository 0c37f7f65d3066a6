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

//! Mock transport implementation for testing.
//!
//! Provides in-memory implementations of the transport traits for use in
//! unit and integration tests without requiring actual TCP sockets. The
//! mock additionally records write attempts made after close, so tests can
//! assert the no-write-after-close property of the relay.

use crate::error::TransportError;
use crate::traits::{DuplexStream, StreamHandle};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// One direction of byte flow between the two mock endpoints.
#[derive(Debug, Default)]
struct Pipe {
    data: VecDeque<u8>,
    /// Set when either endpoint of this pipe is gone; the reader drains
    /// remaining data and then sees EOF, the writer sees a broken pipe.
    closed: bool,
    /// Bounded capacity for exercising partial writes and backpressure.
    /// `None` means unbounded, matching a socket with a large send buffer.
    capacity: Option<usize>,
    read_waker: Option<Waker>,
    write_waker: Option<Waker>,
}

impl Pipe {
    fn wake_reader(&mut self) {
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
    }

    fn wake_writer(&mut self) {
        if let Some(waker) = self.write_waker.take() {
            waker.wake();
        }
    }
}

/// Per-endpoint close state.
#[derive(Debug, Default)]
struct Side {
    closed: AtomicBool,
    writes_after_close: AtomicUsize,
}

/// Creates a connected pair of mock duplex streams.
///
/// Bytes written on one side can be read from the other, simulating a
/// TCP connection.
#[must_use]
pub fn mock_duplex_pair() -> (MockDuplex, MockDuplex) {
    mock_duplex_pair_with_capacity(None)
}

/// Creates a connected pair of mock duplex streams whose internal pipes
/// accept at most `capacity` buffered bytes per direction.
///
/// A small capacity forces partial writes: `poll_write` accepts only as
/// many bytes as fit and parks the writer until the reader drains the pipe.
#[must_use]
pub fn mock_duplex_pair_with_capacity(capacity: Option<usize>) -> (MockDuplex, MockDuplex) {
    let a_to_b = Arc::new(Mutex::new(Pipe {
        capacity,
        ..Pipe::default()
    }));
    let b_to_a = Arc::new(Mutex::new(Pipe {
        capacity,
        ..Pipe::default()
    }));

    let side_a = Arc::new(Side::default());
    let side_b = Arc::new(Side::default());

    let a = MockDuplex {
        incoming: Arc::clone(&b_to_a),
        outgoing: Arc::clone(&a_to_b),
        side: side_a,
    };

    let b = MockDuplex {
        incoming: a_to_b,
        outgoing: b_to_a,
        side: side_b,
    };

    (a, b)
}

/// One endpoint of an in-memory duplex connection.
#[derive(Debug)]
pub struct MockDuplex {
    incoming: Arc<Mutex<Pipe>>,
    outgoing: Arc<Mutex<Pipe>>,
    side: Arc<Side>,
}

impl MockDuplex {
    /// Returns a close handle without consuming the stream.
    ///
    /// Lets a test keep a spy on an endpoint it is about to hand over to
    /// the code under test.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            incoming: Arc::clone(&self.incoming),
            outgoing: Arc::clone(&self.outgoing),
            side: Arc::clone(&self.side),
        }
    }
}

impl DuplexStream for MockDuplex {
    type ReadHalf = MockReadHalf;
    type WriteHalf = MockWriteHalf;
    type Handle = MockHandle;

    fn into_parts(self) -> (Self::ReadHalf, Self::WriteHalf, Self::Handle) {
        (
            MockReadHalf {
                pipe: Arc::clone(&self.incoming),
                side: Arc::clone(&self.side),
            },
            MockWriteHalf {
                pipe: Arc::clone(&self.outgoing),
                side: Arc::clone(&self.side),
            },
            MockHandle {
                incoming: self.incoming,
                outgoing: self.outgoing,
                side: self.side,
            },
        )
    }
}

/// Read half of a mock duplex stream.
#[derive(Debug)]
pub struct MockReadHalf {
    pipe: Arc<Mutex<Pipe>>,
    side: Arc<Side>,
}

impl AsyncRead for MockReadHalf {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut pipe = self.pipe.lock().unwrap();

        if self.side.closed.load(Ordering::SeqCst) {
            return Poll::Ready(Err(TransportError::Closed.into_io()));
        }

        if !pipe.data.is_empty() {
            let to_read = buf.remaining().min(pipe.data.len());
            for _ in 0..to_read {
                if let Some(byte) = pipe.data.pop_front() {
                    buf.put_slice(&[byte]);
                }
            }
            pipe.wake_writer();
            return Poll::Ready(Ok(()));
        }

        if pipe.closed {
            // EOF: writer side is gone and the pipe is drained.
            return Poll::Ready(Ok(()));
        }

        pipe.read_waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

/// Write half of a mock duplex stream.
#[derive(Debug)]
pub struct MockWriteHalf {
    pipe: Arc<Mutex<Pipe>>,
    side: Arc<Side>,
}

impl AsyncWrite for MockWriteHalf {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.side.closed.load(Ordering::SeqCst) {
            self.side.writes_after_close.fetch_add(1, Ordering::SeqCst);
            return Poll::Ready(Err(TransportError::Closed.into_io()));
        }

        let mut pipe = self.pipe.lock().unwrap();

        if pipe.closed {
            return Poll::Ready(Err(TransportError::BrokenPipe.into_io()));
        }

        let writable = match pipe.capacity {
            Some(cap) => cap.saturating_sub(pipe.data.len()).min(buf.len()),
            None => buf.len(),
        };

        if writable == 0 && !buf.is_empty() {
            pipe.write_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        pipe.data.extend(&buf[..writable]);
        pipe.wake_reader();
        Poll::Ready(Ok(writable))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut pipe = self.pipe.lock().unwrap();
        pipe.closed = true;
        pipe.wake_reader();
        Poll::Ready(Ok(()))
    }
}

/// Close handle for a mock duplex stream.
#[derive(Debug, Clone)]
pub struct MockHandle {
    incoming: Arc<Mutex<Pipe>>,
    outgoing: Arc<Mutex<Pipe>>,
    side: Arc<Side>,
}

impl MockHandle {
    /// Returns the number of write attempts made on this side after close.
    ///
    /// Tests use this to assert that the relay never writes to a stream
    /// once the session has stopped.
    #[must_use]
    pub fn writes_after_close(&self) -> usize {
        self.side.writes_after_close.load(Ordering::SeqCst)
    }
}

impl StreamHandle for MockHandle {
    fn close(&self) {
        if self.side.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Fail our own pending operations and give the peer a clean EOF.
        for pipe in [&self.incoming, &self.outgoing] {
            let mut pipe = pipe.lock().unwrap();
            pipe.closed = true;
            pipe.wake_reader();
            pipe.wake_writer();
        }
    }

    fn is_closed(&self) -> bool {
        self.side.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn bytes_cross_the_pair() {
        let (a, b) = mock_duplex_pair();
        let (mut a_read, mut a_write, _ah) = a.into_parts();
        let (mut b_read, mut b_write, _bh) = b.into_parts();

        a_write.write_all(b"hello from A").await.unwrap();

        let mut buf = vec![0u8; 32];
        let n = b_read.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello from A");

        b_write.write_all(b"hello from B").await.unwrap();

        let n = a_read.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello from B");
    }

    #[tokio::test]
    async fn shutdown_yields_eof_on_peer() {
        let (a, b) = mock_duplex_pair();
        let (_ar, mut a_write, _ah) = a.into_parts();
        let (mut b_read, _bw, _bh) = b.into_parts();

        a_write.write_all(b"tail").await.unwrap();
        a_write.shutdown().await.unwrap();

        let mut buf = vec![0u8; 8];
        let n = b_read.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"tail");

        let n = b_read.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn close_fails_pending_read() {
        let (a, _b) = mock_duplex_pair();
        let (mut a_read, _aw, handle) = a.into_parts();

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 8];
            a_read.read(&mut buf).await
        });

        tokio::task::yield_now().await;
        handle.close();

        let result = reader.await.unwrap();
        assert_eq!(
            result.unwrap_err().kind(),
            io::ErrorKind::ConnectionAborted
        );
    }

    #[tokio::test]
    async fn close_gives_peer_eof() {
        let (a, b) = mock_duplex_pair();
        let (_ar, _aw, handle) = a.into_parts();
        let (mut b_read, _bw, _bh) = b.into_parts();

        handle.close();

        let mut buf = [0u8; 8];
        let n = b_read.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn writes_after_close_are_counted_and_fail() {
        let (a, _b) = mock_duplex_pair();
        let (_ar, mut a_write, handle) = a.into_parts();

        assert_eq!(handle.writes_after_close(), 0);
        handle.close();

        let result = a_write.write_all(b"late").await;
        assert_eq!(
            result.unwrap_err().kind(),
            io::ErrorKind::ConnectionAborted
        );
        assert_eq!(handle.writes_after_close(), 1);
    }

    #[tokio::test]
    async fn bounded_pipe_forces_partial_writes() {
        let (a, b) = mock_duplex_pair_with_capacity(Some(4));
        let (_ar, mut a_write, _ah) = a.into_parts();
        let (mut b_read, _bw, _bh) = b.into_parts();

        // write_all must complete across multiple partial accepts while
        // the reader drains the pipe concurrently.
        let writer = tokio::spawn(async move {
            a_write.write_all(b"twelve bytes").await.unwrap();
        });

        let mut received = Vec::new();
        let mut buf = [0u8; 3];
        while received.len() < 12 {
            let n = b_read.read(&mut buf).await.unwrap();
            assert!(n > 0);
            received.extend_from_slice(&buf[..n]);
        }

        writer.await.unwrap();
        assert_eq!(&received, b"twelve bytes");
    }

    #[tokio::test]
    async fn spy_handle_observes_close() {
        let (a, _b) = mock_duplex_pair();
        let spy = a.handle();
        let (_ar, _aw, handle) = a.into_parts();

        assert!(!spy.is_closed());
        handle.close();
        assert!(spy.is_closed());
    }

    #[test]
    fn mock_parts_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<MockReadHalf>();
        assert_send::<MockWriteHalf>();
        assert_send::<MockHandle>();
    }
}
