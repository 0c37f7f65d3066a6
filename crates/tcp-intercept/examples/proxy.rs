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

//! Standalone intercepting proxy.
//!
//! Relays every connection accepted on the listen address to the target
//! address, closing idle sessions after 10 seconds and heartbeating quiet
//! backends once per second:
//!
//! ```text
//! cargo run --example proxy -- 127.0.0.1:9000 127.0.0.1:7000
//! ```
//!
//! Try it against a deliberately slow backend (for example `nc -l 7000`
//! and type replies by hand) to watch `<heartbeat N>` frames arrive on
//! the client side.

use std::net::SocketAddr;
use tcp_intercept::{serve, Config};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tcp_intercept=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (listen_addr, target_addr) = match (args.next(), args.next()) {
        (Some(listen), Some(target)) => (listen, target),
        _ => {
            eprintln!("usage: proxy <listen-addr> <target-addr>");
            std::process::exit(2);
        }
    };

    let listen_addr: SocketAddr = listen_addr.parse()?;
    let target_addr: SocketAddr = target_addr.parse()?;

    let listener = TcpListener::bind(listen_addr).await?;
    println!("listening on {listen_addr}, relaying to {target_addr}");

    serve(listener, target_addr, Config::default()).await?;
    Ok(())
}
