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

//! Duplex stream abstraction for tcp-intercept.
//!
//! This crate defines the [`DuplexStream`] and [`StreamHandle`] traits the
//! relay operates on, a TCP adapter for production use, and an in-memory
//! mock pair for tests.

mod error;
mod mock;
mod tcp;
mod traits;

pub use error::TransportError;
pub use mock::{
    mock_duplex_pair, mock_duplex_pair_with_capacity, MockDuplex, MockHandle, MockReadHalf,
    MockWriteHalf,
};
pub use tcp::{TcpDuplex, TcpHandle, TcpReadHalf, TcpWriteHalf};
pub use traits::{DuplexStream, StreamHandle};
