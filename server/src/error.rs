//! Server-side error taxonomy.
//!
//! Per-player failures (disconnects, timeouts, malformed payloads) are
//! converted into data (a `None` answer or a kick) close to where they
//! happen and never abort a round or a session. The variants here cover the
//! cases that do surface as `Err`: handshake failures reported by the
//! acceptor's per-connection tasks, and resource acquisition at startup,
//! which is the only fatal class.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol violation from {addr}: {reason}")]
    Protocol { addr: SocketAddr, reason: String },

    #[error("peer {addr} disconnected before completing the handshake")]
    HandshakeDisconnected { addr: SocketAddr },

    #[error("peer {addr} sent no handshake within {timeout:?}")]
    HandshakeTimeout { addr: SocketAddr, timeout: Duration },

    #[error("no bindable TCP port in {base}..{end}")]
    BindUnavailable { base: u16, end: u16 },

    #[error(transparent)]
    Wire(#[from] shared::WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
