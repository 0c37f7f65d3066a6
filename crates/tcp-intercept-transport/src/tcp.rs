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

//! TCP adapter implementation.
//!
//! This module implements the transport traits for `tokio::net::TcpStream`.
//! The close handle works by flagging a shared close state that both halves
//! check before touching the socket; the file descriptor itself is released
//! when the owning tasks observe the closure and drop their halves.

use crate::error::TransportError;
use crate::traits::{DuplexStream, StreamHandle};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Shared close state between the two halves and the handle.
#[derive(Debug, Default)]
struct CloseState {
    closed: AtomicBool,
    read_waker: Mutex<Option<Waker>>,
    write_waker: Mutex<Option<Waker>>,
}

impl CloseState {
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(waker) = self.read_waker.lock().unwrap().take() {
            waker.wake();
        }
        if let Some(waker) = self.write_waker.lock().unwrap().take() {
            waker.wake();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Wrapper around a `TcpStream` implementing [`DuplexStream`].
#[derive(Debug)]
pub struct TcpDuplex {
    inner: TcpStream,
}

impl TcpDuplex {
    /// Creates a new `TcpDuplex` from a connected TCP stream.
    #[must_use]
    pub const fn new(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Connects to the given address and wraps the resulting stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection cannot be established.
    pub async fn connect(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self::new(TcpStream::connect(addr).await?))
    }

    /// Returns a reference to the underlying TCP stream.
    #[must_use]
    pub const fn inner(&self) -> &TcpStream {
        &self.inner
    }

    /// Consumes this wrapper and returns the underlying TCP stream.
    #[must_use]
    pub fn into_inner(self) -> TcpStream {
        self.inner
    }
}

impl From<TcpStream> for TcpDuplex {
    fn from(stream: TcpStream) -> Self {
        Self::new(stream)
    }
}

impl DuplexStream for TcpDuplex {
    type ReadHalf = TcpReadHalf;
    type WriteHalf = TcpWriteHalf;
    type Handle = TcpHandle;

    fn into_parts(self) -> (Self::ReadHalf, Self::WriteHalf, Self::Handle) {
        let (read, write) = self.inner.into_split();
        let state = Arc::new(CloseState::default());

        (
            TcpReadHalf {
                inner: read,
                state: Arc::clone(&state),
            },
            TcpWriteHalf {
                inner: write,
                state: Arc::clone(&state),
            },
            TcpHandle { state },
        )
    }
}

/// Read half of a split TCP duplex stream.
#[derive(Debug)]
pub struct TcpReadHalf {
    inner: OwnedReadHalf,
    state: Arc<CloseState>,
}

impl AsyncRead for TcpReadHalf {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        // Register the waker before checking the flag so a concurrent close
        // cannot slip between the check and the registration.
        *this.state.read_waker.lock().unwrap() = Some(cx.waker().clone());

        if this.state.is_closed() {
            return Poll::Ready(Err(TransportError::Closed.into_io()));
        }

        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

/// Write half of a split TCP duplex stream.
#[derive(Debug)]
pub struct TcpWriteHalf {
    inner: OwnedWriteHalf,
    state: Arc<CloseState>,
}

impl AsyncWrite for TcpWriteHalf {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        *this.state.write_waker.lock().unwrap() = Some(cx.waker().clone());

        if this.state.is_closed() {
            return Poll::Ready(Err(TransportError::Closed.into_io()));
        }

        Pin::new(&mut this.inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.state.is_closed() {
            return Poll::Ready(Err(TransportError::Closed.into_io()));
        }

        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Close handle for a split TCP duplex stream.
#[derive(Debug, Clone)]
pub struct TcpHandle {
    state: Arc<CloseState>,
}

impl StreamHandle for TcpHandle {
    fn close(&self) {
        self.state.close();
    }

    fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}
