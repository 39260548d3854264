//! The connect/handshake/play loop.

use crate::discovery;
use crate::provider::AnswerProvider;
use log::info;
use shared::{wire, GameConfig};
use std::io::Write as _;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::net::TcpStream;

pub struct GameClient {
    name: String,
    config: GameConfig,
    provider: Box<dyn AnswerProvider>,
}

impl GameClient {
    pub fn new(name: String, config: GameConfig, provider: Box<dyn AnswerProvider>) -> Self {
        Self {
            name,
            config,
            provider,
        }
    }

    /// Discovers the server, joins, and plays until the game ends or the
    /// server goes away.
    pub async fn run(&mut self) -> std::io::Result<()> {
        println!("Starting client for {}, listening for offers...", self.name);
        let (ip, port) =
            discovery::wait_for_offer(self.config.udp_port, &self.config.server_name).await?;

        let stream = TcpStream::connect((ip, port)).await?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = write_half;

        wire::write_line(&mut writer, &self.name).await?;
        info!("connected to {}:{}, waiting for the game to start", ip, port);

        // Eliminated players keep spectating but stop being prompted.
        let mut answering = true;
        let mut buf = vec![0u8; 4096];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                println!("Server disconnected, finishing game...");
                break;
            }

            let text = String::from_utf8_lossy(&buf[..n]).to_string();
            print!("{text}");
            let _ = std::io::stdout().flush();

            if text.contains(&self.config.game_over_marker) {
                println!("The game is over, it was a lovely game!");
                break;
            }
            if text.contains(&self.config.elimination_marker) {
                answering = false;
            }
            if answering && text.contains(&self.config.question_prefix) {
                let answer = self
                    .provider
                    .provide_answer(&text, self.config.answer_budget())
                    .await;
                // An empty line stands in for "no answer" so the server's
                // deadline accounting stays in charge of scoring it.
                let token = answer.unwrap_or_default();
                wire::write_line(&mut writer, &token).await?;
            }
        }
        Ok(())
    }
}
