//! Player connection management for the trivia server.
//!
//! This module handles the server-side roster of connected players:
//! - Player identity and name de-duplication at registration
//! - The active set (players still eligible to answer) alongside the full set
//! - Exclusive ownership of each player's connection halves
//!
//! All registry mutations are serialized by a single lock, and every snapshot
//! handed to a caller is a copy, so concurrent tasks iterating a roster are
//! never affected by a registration or kick happening elsewhere.

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

/// A connected player.
///
/// Identity is the post-de-duplication `name`: two `Player` values are the
/// same entity iff their names match, and equality/hashing follow that.
/// Clones share the underlying connection and active flag, so a snapshot
/// taken from the registry observes later deactivation.
///
/// The connection is split so that the read half (answer collection, one
/// worker at a time) and the write half (broadcasts) can be owned
/// exclusively by whoever holds the respective lock.
#[derive(Debug, Clone)]
pub struct Player {
    name: Arc<str>,
    active: Arc<AtomicBool>,
    reader: Arc<Mutex<BufReader<OwnedReadHalf>>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl Player {
    fn new(name: String, reader: BufReader<OwnedReadHalf>, writer: OwnedWriteHalf) -> Self {
        Self {
            name: name.into(),
            active: Arc::new(AtomicBool::new(true)),
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Sends a text block to this player, appending the missing newline.
    pub async fn send_text(&self, text: &str) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            writer.write_all(b"\n").await?;
        }
        writer.flush().await
    }

    /// One bounded line read from this player's connection.
    ///
    /// `Ok(None)` is the no-answer signal: the peer closed cleanly. The lock
    /// guarantees no two workers ever interleave reads on one socket.
    pub async fn read_answer(&self, max_bytes: u64) -> std::io::Result<Option<String>> {
        let mut reader = self.reader.lock().await;
        shared::wire::read_line(&mut *reader, max_bytes).await
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Player {}

impl std::hash::Hash for Player {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[derive(Default)]
struct Roster {
    players: Vec<Player>,
    active: Vec<Player>,
}

/// Concurrency-safe collection of connected players.
///
/// Holds the full player list and the active subset (active ⊆ all). The
/// active set is only ever grown by registration; afterwards it shrinks
/// through kicks or is replaced wholesale with the survivors of a round.
#[derive(Default)]
pub struct PlayerRegistry {
    roster: Mutex<Roster>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new player, de-duplicating the requested name.
    ///
    /// On collision the name gets a `(k)` suffix with the smallest `k >= 1`
    /// that is still unique. Runs entirely under the registry lock, so two
    /// simultaneous registrations can never produce the same name. Returns
    /// the player and whether a rename occurred, so the caller can notify
    /// the client.
    pub async fn register(
        &self,
        requested: &str,
        reader: BufReader<OwnedReadHalf>,
        writer: OwnedWriteHalf,
    ) -> (Player, bool) {
        let mut roster = self.roster.lock().await;

        let base = requested.trim();
        let mut name = base.to_string();
        let mut suffix = 1;
        while roster.players.iter().any(|p| p.name() == name) {
            name = format!("{base}({suffix})");
            suffix += 1;
        }
        let renamed = name != base;

        let player = Player::new(name, reader, writer);
        info!("player {} registered", player.name());
        roster.players.push(player.clone());
        roster.active.push(player.clone());
        (player, renamed)
    }

    /// Removes `player` from both the full and active sets. Idempotent.
    pub async fn kick(&self, player: &Player) {
        let mut roster = self.roster.lock().await;
        let before = roster.players.len();
        roster.players.retain(|p| p != player);
        roster.active.retain(|p| p != player);
        if roster.players.len() < before {
            player.set_active(false);
            info!("player {} kicked", player.name());
        }
    }

    /// Wholesale replacement of the active set with a round's survivors.
    ///
    /// Anything not currently registered is ignored, preserving active ⊆ all.
    pub async fn set_active(&self, survivors: &[Player]) {
        let mut roster = self.roster.lock().await;
        for player in &roster.players {
            player.set_active(survivors.contains(player));
        }
        roster.active = roster
            .players
            .iter()
            .filter(|p| survivors.contains(p))
            .cloned()
            .collect();
    }

    /// Point-in-time copy of the active set.
    pub async fn active_players(&self) -> Vec<Player> {
        self.roster.lock().await.active.clone()
    }

    /// Point-in-time copy of every registered player.
    pub async fn all_players(&self) -> Vec<Player> {
        self.roster.lock().await.players.clone()
    }

    pub async fn player_count(&self) -> usize {
        self.roster.lock().await.players.len()
    }
}
