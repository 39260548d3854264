//! Fan-out/fan-in answer collection with an absolute deadline.
//!
//! One worker per active player, each attempting exactly one line read of the
//! player's connection; results fan back in over a channel. The collector
//! races that fan-in barrier against a single wall-clock deadline measured
//! from the start of collection; there are no per-worker timers. Workers
//! still running when the deadline elapses are abandoned: their player is
//! scored as no-answer, and a late completion dies on a closed channel
//! instead of mutating the already-returned map.

use crate::registry::Player;
use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

/// Upper bound on one answer line; anything longer is cut off.
const MAX_ANSWER_BYTES: u64 = 256;

pub struct AnswerCollector;

impl AnswerCollector {
    /// Collects one answer per player within `budget`.
    ///
    /// The returned map has exactly one entry per player passed in. `None`
    /// is the no-answer signal (disconnect, socket error, or deadline),
    /// distinct from a player sending an empty line.
    pub async fn collect(
        &self,
        players: Vec<Player>,
        budget: Duration,
    ) -> HashMap<Player, Option<String>> {
        let deadline = Instant::now() + budget;

        let mut answers: HashMap<Player, Option<String>> =
            players.iter().map(|p| (p.clone(), None)).collect();
        if players.is_empty() {
            return answers;
        }

        let (tx, mut rx) = mpsc::channel::<(Player, Option<String>)>(players.len());
        let mut outstanding = players.len();

        for player in players {
            let tx = tx.clone();
            tokio::spawn(async move {
                let answer = match player.read_answer(MAX_ANSWER_BYTES).await {
                    Ok(Some(line)) => Some(line),
                    Ok(None) => {
                        debug!("player {} disconnected while answering", player.name());
                        None
                    }
                    Err(e) => {
                        debug!("read from player {} failed: {}", player.name(), e);
                        None
                    }
                };
                // After the deadline the receiver is gone and this send
                // fails, discarding the tardy result.
                let _ = tx.send((player, answer)).await;
            });
        }
        drop(tx);

        while outstanding > 0 {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((player, answer))) => {
                    answers.insert(player, answer);
                    outstanding -= 1;
                }
                Ok(None) => break,
                Err(_) => {
                    debug!("deadline elapsed with {} worker(s) outstanding", outstanding);
                    break;
                }
            }
        }
        answers
    }
}
