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

//! Listener shim: accepts clients and runs one session per connection.

use crate::{Config, Error, Session, TcpDuplex};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Accepts clients on `listener` and relays each one to `backend_addr`.
///
/// Each accepted connection gets its own backend dial and its own session
/// with independent timers. A client whose backend dial fails is dropped
/// without affecting the accept loop. Runs until accepting itself fails.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listener
/// breaks.
pub async fn serve(
    listener: TcpListener,
    backend_addr: SocketAddr,
    config: Config,
) -> Result<(), Error> {
    config.validate()?;

    info!(backend = %backend_addr, "relay listening");

    loop {
        let (client, client_addr) = listener.accept().await.map_err(Error::Transport)?;

        let backend = match TcpStream::connect(backend_addr).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(client = %client_addr, error = %e, "backend dial failed; dropping client");
                continue;
            }
        };

        let session = Session::new(
            TcpDuplex::new(client),
            TcpDuplex::new(backend),
            config.clone(),
        );

        match session.start() {
            Ok(mut handle) => {
                debug!(
                    session_id = handle.session_id(),
                    client = %client_addr,
                    "session accepted"
                );
                tokio::spawn(async move {
                    handle.join().await;
                    if let Some(reason) = handle.close_reason() {
                        info!(
                            session_id = handle.session_id(),
                            %reason,
                            "session finished"
                        );
                    }
                });
            }
            Err(e) => {
                // Config was validated up front, so this is unreachable in
                // practice, but the accept loop must not die for one client.
                warn!(client = %client_addr, error = %e, "session start failed");
            }
        }
    }
}
