//! TCP accept loop and the player-name handshake.
//!
//! Runs for as long as the join window is open. Every accepted connection is
//! handed to its own task, so a slow or malicious peer can stall neither the
//! accept loop nor the other handshakes; a failed handshake is logged and
//! dropped without registering anyone.

use crate::error::ServerError;
use crate::registry::PlayerRegistry;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

/// Upper bound on the handshake line; anything longer is cut off.
const MAX_NAME_BYTES: u64 = 256;

pub struct ConnectionAcceptor {
    listener: Arc<TcpListener>,
    registry: Arc<PlayerRegistry>,
    window: watch::Receiver<bool>,
    handshake_timeout: Duration,
}

impl ConnectionAcceptor {
    pub fn new(
        listener: Arc<TcpListener>,
        registry: Arc<PlayerRegistry>,
        window: watch::Receiver<bool>,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            listener,
            registry,
            window,
            handshake_timeout,
        }
    }

    /// Accepts connections until the join window closes.
    pub async fn run(self) {
        let Self {
            listener,
            registry,
            mut window,
            handshake_timeout,
        } = self;

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let registry = Arc::clone(&registry);
                        tokio::spawn(async move {
                            if let Err(e) = handshake(stream, addr, registry, handshake_timeout).await {
                                warn!("handshake with {} failed: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => warn!("accept failed: {}", e),
                },
                changed = window.changed() => {
                    if changed.is_err() || *window.borrow() {
                        info!("join window closed, no longer accepting connections");
                        return;
                    }
                }
            }
        }
    }
}

/// Reads the one-line name handshake, registers the player, and sends the
/// rename notice if the name had to be disambiguated.
async fn handshake(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<PlayerRegistry>,
    handshake_timeout: Duration,
) -> Result<(), ServerError> {
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let requested = match timeout(
        handshake_timeout,
        shared::wire::read_line(&mut reader, MAX_NAME_BYTES),
    )
    .await
    {
        Err(_) => {
            return Err(ServerError::HandshakeTimeout {
                addr,
                timeout: handshake_timeout,
            })
        }
        Ok(Err(e)) => return Err(ServerError::Io(e)),
        Ok(Ok(None)) => return Err(ServerError::HandshakeDisconnected { addr }),
        Ok(Ok(Some(line))) => line,
    };

    if requested.trim().is_empty() {
        return Err(ServerError::Protocol {
            addr,
            reason: "empty player name".to_string(),
        });
    }

    let (player, renamed) = registry.register(&requested, reader, write_half).await;
    info!("player {} connected from {}", player.name(), addr);

    if renamed {
        let notice = format!(
            "The name {} was already taken, you will be playing as {}",
            requested.trim(),
            player.name()
        );
        player.send_text(&notice).await?;
    }
    Ok(())
}
