//! Listens for the server's discovery offers.

use log::{debug, info};
use shared::wire;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

/// Blocks until a valid offer from `expected_name` arrives on `udp_port`.
///
/// Datagrams that fail validation (wrong length, cookie, message type, or
/// an unexpected server name) are skipped, never fatal: a LAN can carry
/// unrelated broadcast traffic on any port.
pub async fn wait_for_offer(
    udp_port: u16,
    expected_name: &str,
) -> std::io::Result<(IpAddr, u16)> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], udp_port))).await?;
    info!("listening for offers on UDP port {}", udp_port);

    let mut buf = [0u8; 256];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        match wire::decode_offer(&buf[..len]) {
            Ok(offer) if offer.server_name == expected_name => {
                info!(
                    "received offer from '{}' at {}, connecting to port {}",
                    offer.server_name,
                    from.ip(),
                    offer.tcp_port
                );
                return Ok((from.ip(), offer.tcp_port));
            }
            Ok(offer) => {
                debug!("ignoring offer from unexpected server '{}'", offer.server_name);
            }
            Err(e) => {
                debug!("ignoring malformed datagram from {}: {}", from, e);
            }
        }
    }
}
