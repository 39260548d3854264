//! UDP discovery broadcast loop and the join-window state machine.
//!
//! While the session is gathering players the announcer sends one offer
//! datagram per cadence tick. Each tick it compares the registry's player
//! count against the last one it saw; growth resets the grace timer. Once at
//! least one player has joined and no growth has been observed for the whole
//! grace period, the announcer closes the join window and stops. With zero
//! players it broadcasts forever.

use crate::registry::PlayerRegistry;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};

pub struct Announcer {
    socket: UdpSocket,
    target: SocketAddr,
    offer: Vec<u8>,
    cadence: Duration,
    join_grace: Duration,
    registry: Arc<PlayerRegistry>,
    window: watch::Sender<bool>,
}

impl Announcer {
    /// `window` flips to `true` exactly once, when the join window closes.
    pub fn new(
        socket: UdpSocket,
        target: SocketAddr,
        offer: Vec<u8>,
        cadence: Duration,
        join_grace: Duration,
        registry: Arc<PlayerRegistry>,
        window: watch::Sender<bool>,
    ) -> Self {
        Self {
            socket,
            target,
            offer,
            cadence,
            join_grace,
            registry,
            window,
        }
    }

    /// Runs the broadcast loop to completion.
    ///
    /// Send failures are transient: logged, then retried on the next tick.
    /// They never close the join window.
    pub async fn run(self) {
        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_count = 0usize;
        let mut last_growth = Instant::now();

        loop {
            ticker.tick().await;

            match self.socket.send_to(&self.offer, self.target).await {
                Ok(_) => debug!("offer sent to {}", self.target),
                Err(e) => warn!("offer broadcast to {} failed: {}", self.target, e),
            }

            let count = self.registry.player_count().await;
            if count > last_count {
                debug!("roster grew from {} to {}", last_count, count);
                last_count = count;
                last_growth = Instant::now();
            }

            if count > 0 && last_growth.elapsed() > self.join_grace {
                info!("join window closed with {} player(s)", count);
                let _ = self.window.send(true);
                return;
            }
        }
    }
}
