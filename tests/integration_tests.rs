//! Integration tests for the trivia game components
//!
//! These tests validate cross-component interactions and real network
//! behavior: the discovery protocol over real UDP sockets, and complete
//! sessions played end to end over real TCP connections.

use server::session::{SessionOrchestrator, SessionOutcome};
use server::stats::MemorySink;
use shared::wire;
use shared::{GameConfig, Question};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};

/// DISCOVERY PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// Tests offer encode/decode over a real UDP socket
    #[tokio::test]
    async fn offer_survives_a_real_udp_hop() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let offer = wire::encode_offer("Mystic", 12345).unwrap();
        sender.send_to(&offer, target).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .expect("datagram should arrive")
            .unwrap();

        let decoded = wire::decode_offer(&buf[..len]).unwrap();
        assert_eq!(decoded.server_name, "Mystic");
        assert_eq!(decoded.tcp_port, 12345);
    }

    /// A corrupted cookie must never decode into a trusted port
    #[tokio::test]
    async fn corrupted_offer_is_rejected_after_the_hop() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let mut offer = wire::encode_offer("Mystic", 12345).unwrap();
        offer[2] ^= 0xff;
        sender.send_to(&offer, target).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert!(wire::decode_offer(&buf[..len]).is_err());
    }
}

/// FULL SESSION TESTS
mod session_tests {
    use super::*;

    fn quick_config(questions: Vec<Question>) -> GameConfig {
        GameConfig {
            tcp_port: 0,
            join_grace_secs: 1,
            broadcast_interval_millis: 50,
            answer_secs: 2,
            questions,
            ..GameConfig::default()
        }
    }

    fn true_question(text: &str) -> Question {
        Question {
            text: text.to_string(),
            is_true: true,
        }
    }

    /// Joins as `name` and answers each question it sees with the next
    /// token in `answers`; once the script runs dry it just spectates.
    /// Returns the full transcript the player saw.
    fn scripted_player(
        port: u16,
        name: &str,
        answers: Vec<&str>,
        prefix: String,
    ) -> tokio::task::JoinHandle<String> {
        let name = name.to_string();
        let mut answers: std::collections::VecDeque<String> =
            answers.into_iter().map(str::to_string).collect();
        tokio::spawn(async move {
            let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            write_half
                .write_all(format!("{name}\n").as_bytes())
                .await
                .unwrap();

            let mut lines = BufReader::new(read_half).lines();
            let mut seen = String::new();
            while let Ok(Ok(Some(line))) =
                tokio::time::timeout(Duration::from_secs(5), lines.next_line()).await
            {
                seen.push_str(&line);
                seen.push('\n');
                if line.contains(&prefix) {
                    if let Some(token) = answers.pop_front() {
                        write_half
                            .write_all(format!("{token}\n").as_bytes())
                            .await
                            .unwrap();
                    }
                }
            }
            seen
        })
    }

    async fn orchestrator_on_loopback(
        config: GameConfig,
        sink: Arc<MemorySink>,
    ) -> SessionOrchestrator {
        let mut orchestrator =
            SessionOrchestrator::bind("127.0.0.1", config, Box::new(sink))
                .await
                .expect("loopback bind should succeed");
        // Keep offer datagrams off the LAN broadcast address.
        let discard: SocketAddr = "127.0.0.1:9".parse().unwrap();
        orchestrator.set_announce_target(discard);
        orchestrator
    }

    /// Three players join; round 1 is answered correctly by exactly one of
    /// them, who is declared winner immediately, with no round 2.
    #[tokio::test]
    async fn sole_correct_answer_ends_the_session_in_round_one() {
        let config = quick_config(vec![
            true_question("Water is wet"),
            true_question("The sky is blue"),
        ]);
        let prefix = config.question_prefix.clone();
        let game_over = config.game_over_marker.clone();
        let sink = Arc::new(MemorySink::default());
        let mut orchestrator = orchestrator_on_loopback(config, Arc::clone(&sink)).await;
        let port = orchestrator.tcp_port();

        let alice = scripted_player(port, "alice", vec!["Y", "Y"], prefix.clone());
        let bob = scripted_player(port, "bob", vec!["N", "N"], prefix.clone());
        let carol = scripted_player(port, "carol", vec!["N", "N"], prefix);

        let summary = orchestrator.run_one_session().await.unwrap();

        assert_eq!(summary.outcome, SessionOutcome::Winner("alice".to_string()));
        assert_eq!(summary.rounds, 1, "a sole winner must end the session");

        for player in [alice, bob, carol] {
            let transcript = player.await.unwrap();
            assert!(transcript.contains(&game_over), "got: {transcript}");
            assert_eq!(
                transcript.matches("Round ").count(),
                1,
                "no second round may be announced"
            );
        }

        let stats = sink.snapshot();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.players_data["alice"].games_won, 1);
    }

    /// Three players; two answer correctly and one does not. The survivors
    /// carry into round 2 and only they are asked to answer it.
    #[tokio::test]
    async fn survivors_advance_and_only_they_are_collected() {
        let config = quick_config(vec![
            true_question("Water is wet"),
            true_question("The sky is blue"),
        ]);
        let prefix = config.question_prefix.clone();
        let elimination = config.elimination_marker.clone();
        let sink = Arc::new(MemorySink::default());
        let mut orchestrator = orchestrator_on_loopback(config, Arc::clone(&sink)).await;
        let port = orchestrator.tcp_port();

        // Round 1: alice and bob are right, carol is wrong and drops out.
        // Round 2: alice is right, bob is wrong, alice wins.
        let alice = scripted_player(port, "alice", vec!["Y", "Y"], prefix.clone());
        let bob = scripted_player(port, "bob", vec!["Y", "N"], prefix.clone());
        let carol = scripted_player(port, "carol", vec!["N"], prefix);

        let summary = orchestrator.run_one_session().await.unwrap();

        assert_eq!(summary.outcome, SessionOutcome::Winner("alice".to_string()));
        assert_eq!(summary.rounds, 2);

        let transcript_carol = carol.await.unwrap();
        assert_eq!(
            transcript_carol.matches(&elimination).count(),
            1,
            "eliminated player gets exactly one elimination notice"
        );
        // Spectators still see the second round being played.
        assert_eq!(transcript_carol.matches("Round ").count(), 2);

        let transcript_alice = alice.await.unwrap();
        assert!(!transcript_alice.contains(&elimination));
        let transcript_bob = bob.await.unwrap();
        assert!(transcript_bob.contains("is correct!"));

        // Only the two survivors were graded in round 2: across both
        // questions that is 3 + 2 graded answers.
        let stats = sink.snapshot();
        let graded: u64 = stats
            .question_data
            .values()
            .map(|q| q.correct_answers + q.incorrect_answers)
            .sum();
        assert_eq!(graded, 5);
        assert_eq!(stats.players_data["carol"].correct_answers, 0);
        assert_eq!(stats.players_data["carol"].incorrect_answers, 1);
        assert_eq!(stats.players_data["alice"].correct_answers, 2);
    }

    /// A player that never answers is kicked rather than carried along.
    #[tokio::test]
    async fn silent_player_is_kicked_and_the_game_goes_on() {
        let config = quick_config(vec![true_question("Water is wet")]);
        let prefix = config.question_prefix.clone();
        let sink = Arc::new(MemorySink::default());
        let mut orchestrator = orchestrator_on_loopback(config, Arc::clone(&sink)).await;
        let port = orchestrator.tcp_port();

        let alice = scripted_player(port, "alice", vec!["Y"], prefix.clone());
        // Bob joins but never answers anything.
        let bob = scripted_player(port, "bob", vec![], prefix);

        let summary = orchestrator.run_one_session().await.unwrap();

        assert_eq!(summary.outcome, SessionOutcome::Winner("alice".to_string()));
        let stats = sink.snapshot();
        // The silent player is neither correct nor incorrect anywhere.
        assert_eq!(stats.players_data["bob"].correct_answers, 0);
        assert_eq!(stats.players_data["bob"].incorrect_answers, 0);

        drop(alice);
        drop(bob);
    }

    /// Sessions reset cleanly: a second game on the same orchestrator
    /// starts from an empty roster and still works.
    #[tokio::test]
    async fn consecutive_sessions_share_nothing_but_statistics() {
        let config = quick_config(vec![true_question("Water is wet")]);
        let prefix = config.question_prefix.clone();
        let sink = Arc::new(MemorySink::default());
        let mut orchestrator = orchestrator_on_loopback(config, Arc::clone(&sink)).await;
        let port = orchestrator.tcp_port();

        let _first = scripted_player(port, "alice", vec!["Y"], prefix.clone());
        let _second = scripted_player(port, "bob", vec!["N"], prefix.clone());
        let summary = orchestrator.run_one_session().await.unwrap();
        assert_eq!(summary.outcome, SessionOutcome::Winner("alice".to_string()));

        let _third = scripted_player(port, "alice", vec!["Y"], prefix.clone());
        let _fourth = scripted_player(port, "dave", vec!["N"], prefix);
        let summary = orchestrator.run_one_session().await.unwrap();
        assert_eq!(summary.outcome, SessionOutcome::Winner("alice".to_string()));

        let stats = sink.snapshot();
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.players_data["alice"].games_won, 2);
        assert_eq!(stats.players_data["alice"].games_played, 2);
        assert_eq!(
            stats.trivia_king.as_ref().map(|k| (k.name.as_str(), k.wins)),
            Some(("alice", 2))
        );
    }
}
