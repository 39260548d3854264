//! Wire codec for the discovery offer datagram and framed text messages.
//!
//! The discovery offer is a fixed 39-byte datagram broadcast over UDP while
//! the server is accepting players:
//!
//! ```text
//! [4-byte magic cookie][1-byte message type][32-byte padded server name][2-byte BE TCP port]
//! ```
//!
//! Everything after discovery runs over TCP as newline-terminated UTF-8 text,
//! read through [`read_line`] / written through [`write_line`].

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Identifies an offer datagram as belonging to this game.
pub const MAGIC_COOKIE: u32 = 0xabcd_dcba;
/// The only message type carried over the discovery channel.
pub const OFFER_MESSAGE_TYPE: u8 = 0x02;
/// Fixed width of the server-name field; shorter names are right-padded.
pub const SERVER_NAME_LEN: usize = 32;
/// Total size of a well-formed offer datagram.
pub const OFFER_LEN: usize = 4 + 1 + SERVER_NAME_LEN + 2;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("server name is {0} bytes, limit is {SERVER_NAME_LEN}")]
    NameTooLong(usize),

    #[error("malformed offer: {0}")]
    MalformedOffer(&'static str),
}

/// A validated discovery offer: who is hosting, and where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub server_name: String,
    pub tcp_port: u16,
}

/// Builds the offer datagram advertising `server_name` on `tcp_port`.
///
/// Names shorter than [`SERVER_NAME_LEN`] are right-padded with spaces;
/// longer names are rejected rather than truncated.
pub fn encode_offer(server_name: &str, tcp_port: u16) -> Result<Vec<u8>, WireError> {
    let name = server_name.as_bytes();
    if name.len() > SERVER_NAME_LEN {
        return Err(WireError::NameTooLong(name.len()));
    }

    let mut datagram = Vec::with_capacity(OFFER_LEN);
    datagram.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
    datagram.push(OFFER_MESSAGE_TYPE);
    datagram.extend_from_slice(name);
    datagram.resize(4 + 1 + SERVER_NAME_LEN, b' ');
    datagram.extend_from_slice(&tcp_port.to_be_bytes());
    Ok(datagram)
}

/// Validates and decodes an offer datagram.
///
/// Any datagram of the wrong length, or with a mismatched cookie or message
/// type, is rejected with a typed error; truncated or garbage input never
/// panics. Name padding (spaces and NULs) is stripped from the result.
pub fn decode_offer(datagram: &[u8]) -> Result<Offer, WireError> {
    if datagram.len() != OFFER_LEN {
        return Err(WireError::MalformedOffer("unexpected length"));
    }

    let mut cookie = [0u8; 4];
    cookie.copy_from_slice(&datagram[0..4]);
    if u32::from_be_bytes(cookie) != MAGIC_COOKIE {
        return Err(WireError::MalformedOffer("bad magic cookie"));
    }
    if datagram[4] != OFFER_MESSAGE_TYPE {
        return Err(WireError::MalformedOffer("bad message type"));
    }

    let name_field = &datagram[5..5 + SERVER_NAME_LEN];
    let server_name = match std::str::from_utf8(name_field) {
        Ok(name) => name.trim_end_matches([' ', '\0']).to_string(),
        Err(_) => return Err(WireError::MalformedOffer("server name is not UTF-8")),
    };

    let mut port = [0u8; 2];
    port.copy_from_slice(&datagram[OFFER_LEN - 2..]);
    Ok(Offer {
        server_name,
        tcp_port: u16::from_be_bytes(port),
    })
}

/// Reads one newline- or EOF-terminated frame, reading at most `max_bytes`.
///
/// Returns `Ok(None)` when the peer closed the connection before sending
/// anything: a clean close, distinct from an I/O error. The returned line is
/// stripped of the terminator and surrounding whitespace; an empty frame
/// comes back as `Some("")`.
pub async fn read_line<R>(reader: &mut R, max_bytes: u64) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = (&mut *reader).take(max_bytes);
    let n = limited.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
}

/// Writes `line` followed by a newline and flushes.
pub async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
