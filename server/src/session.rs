//! Top-level session lifecycle: discovery, join window, rounds, reset.
//!
//! One orchestrator owns the listening socket for the lifetime of the
//! process; everything else (registry, announcer, acceptor, round engine,
//! the UDP socket) is built fresh for every session, so no state bleeds
//! from one game into the next except the statistics sink's records.

use crate::announcer::Announcer;
use crate::error::ServerError;
use crate::registry::PlayerRegistry;
use crate::round::{RoundEngine, RoundOutcome};
use crate::stats::{Statistics, StatsSink};
use log::{debug, error, info, warn};
use rand::seq::SliceRandom;
use shared::{style, GameConfig};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::watch;

/// Where in its lifecycle the current session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Announcing,
    Accepting,
    Playing,
    Finished,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A round produced a sole correct player.
    Winner(String),
    /// The question bank ran dry with multiple players still standing.
    OutOfQuestions,
    /// Every active player was kicked before anyone could win.
    OutOfPlayers,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub outcome: SessionOutcome,
    pub rounds: u32,
}

pub struct SessionOrchestrator {
    config: GameConfig,
    sink: Box<dyn StatsSink>,
    listener: Arc<TcpListener>,
    tcp_port: u16,
    announce_target: SocketAddr,
    state: SessionState,
}

impl SessionOrchestrator {
    /// Acquires the listening socket, scanning forward from the configured
    /// port. Failing to find any bindable port is the one fatal startup
    /// error; everything later degrades per player instead.
    pub async fn bind(
        host: &str,
        config: GameConfig,
        sink: Box<dyn StatsSink>,
    ) -> Result<Self, ServerError> {
        let (listener, tcp_port) =
            bind_listener(host, config.tcp_port, config.port_scan_attempts).await?;
        info!("server started, listening on {}:{}", host, tcp_port);

        let announce_target = SocketAddr::from((Ipv4Addr::BROADCAST, config.udp_port));
        Ok(Self {
            config,
            sink,
            listener: Arc::new(listener),
            tcp_port,
            announce_target,
            state: SessionState::Announcing,
        })
    }

    /// The port actually bound, after the scan.
    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Redirects offer datagrams away from the LAN broadcast address.
    /// Used by tests; harmless in production.
    pub fn set_announce_target(&mut self, target: SocketAddr) {
        self.announce_target = target;
    }

    fn set_state(&mut self, next: SessionState) {
        debug!("session state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs sessions back to back, re-entering discovery after each one.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        loop {
            let summary = self.run_one_session().await?;
            info!(
                "session finished after {} round(s): {:?}; restarting discovery",
                summary.rounds, summary.outcome
            );
        }
    }

    /// One complete session: announce, gather players, play until a winner
    /// emerges or the game drains, persist statistics, tear down.
    pub async fn run_one_session(&mut self) -> Result<SessionSummary, ServerError> {
        self.set_state(SessionState::Announcing);

        let registry = Arc::new(PlayerRegistry::new());
        let (window_tx, window_rx) = watch::channel(false);

        let udp = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        udp.set_broadcast(true)?;
        let offer = shared::wire::encode_offer(&self.config.server_name, self.tcp_port)?;

        let announcer = Announcer::new(
            udp,
            self.announce_target,
            offer,
            self.config.broadcast_interval(),
            self.config.join_grace(),
            Arc::clone(&registry),
            window_tx,
        );
        let announcer_task = tokio::spawn(announcer.run());

        // A peer that cannot produce its name within the join grace period
        // would miss the game anyway.
        let acceptor = crate::acceptor::ConnectionAcceptor::new(
            Arc::clone(&self.listener),
            Arc::clone(&registry),
            window_rx.clone(),
            self.config.join_grace(),
        );
        let acceptor_task = tokio::spawn(acceptor.run());

        self.wait_for_join_window(&registry, window_rx).await;
        let _ = tokio::join!(announcer_task, acceptor_task);

        self.set_state(SessionState::Playing);
        let joined = registry.all_players().await;
        info!(
            "starting game with {} player(s): {}",
            joined.len(),
            joined
                .iter()
                .map(|p| p.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut stats = self.sink.load().unwrap_or_else(|e| {
            warn!("failed to load statistics, starting empty: {}", e);
            Statistics::default()
        });
        stats.record_participation(joined.iter().map(|p| p.name()));

        let mut questions = self.config.questions.clone();
        questions.shuffle(&mut rand::thread_rng());

        let mut engine = RoundEngine::new(Arc::clone(&registry), &self.config);
        let welcome = format!(
            "Welcome to the {} server, where we are answering trivia questions!",
            self.config.server_name
        );
        engine.broadcast(&welcome).await;

        let mut outcome = SessionOutcome::OutOfQuestions;
        for question in &questions {
            if registry.active_players().await.is_empty() {
                outcome = SessionOutcome::OutOfPlayers;
                break;
            }

            let (round_outcome, result) = engine.play_round(question).await;
            stats.record_round(
                &question.text,
                result.correct.iter().map(|p| p.name()),
                result.incorrect.iter().map(|p| p.name()),
            );

            if let RoundOutcome::Winner(winner) = round_outcome {
                stats.record_win(winner.name());
                let message = format!(
                    "{}\nCongratulations to the winner: {} {}",
                    self.config.game_over_marker,
                    style::paint(style::PINK, winner.name()),
                    style::CROWN
                );
                engine.broadcast(&message).await;
                outcome = SessionOutcome::Winner(winner.name().to_string());
                break;
            }
        }

        if !matches!(outcome, SessionOutcome::Winner(_)) {
            if registry.active_players().await.is_empty() {
                outcome = SessionOutcome::OutOfPlayers;
            }
            let message = format!("{}\nNo winner this time.", self.config.game_over_marker);
            engine.broadcast(&message).await;
        }

        self.set_state(SessionState::Finished);
        stats.record_session();
        if let Err(e) = self.sink.save(&stats) {
            error!("failed to persist statistics: {}", e);
        }

        // Dropping the registry (and with it the last Player handles) closes
        // every game connection; the next session starts from a clean slate.
        Ok(SessionSummary {
            outcome,
            rounds: engine.round(),
        })
    }

    /// Waits out the join window, flipping to `Accepting` once the first
    /// player is in.
    async fn wait_for_join_window(
        &mut self,
        registry: &PlayerRegistry,
        mut window_rx: watch::Receiver<bool>,
    ) {
        let mut probe = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                _ = probe.tick() => {
                    if self.state == SessionState::Announcing
                        && registry.player_count().await > 0
                    {
                        self.set_state(SessionState::Accepting);
                    }
                }
                changed = window_rx.changed() => {
                    if changed.is_err() || *window_rx.borrow() {
                        return;
                    }
                }
            }
        }
    }
}

/// Tries `attempts` consecutive ports starting at `base`.
async fn bind_listener(
    host: &str,
    base: u16,
    attempts: u16,
) -> Result<(TcpListener, u16), ServerError> {
    let attempts = attempts.max(1);
    for offset in 0..attempts {
        let Some(port) = base.checked_add(offset) else {
            break;
        };
        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                let bound = listener.local_addr()?.port();
                if offset > 0 {
                    info!("port {} was taken, bound {} instead", base, bound);
                }
                return Ok((listener, bound));
            }
            Err(e) => debug!("port {} unavailable: {}", port, e),
        }
    }
    Err(ServerError::BindUnavailable {
        base,
        end: base.saturating_add(attempts),
    })
}
