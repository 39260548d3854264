//! Answer providers: where a player's answer actually comes from.
//!
//! The game loop only knows the [`AnswerProvider`] capability: ask it for
//! an answer under a deadline, get back a token or nothing. A human at the
//! keyboard and a uniform-random bot ship here; fancier policies (a
//! model-backed guesser, say) just implement the trait.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use shared::{style, GameConfig};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::timeout;

#[async_trait]
pub trait AnswerProvider: Send {
    /// Produces a raw answer token for `prompt`, or `None` if no answer
    /// could be produced within `budget`.
    async fn provide_answer(&mut self, prompt: &str, budget: Duration) -> Option<String>;
}

/// Reads the answer from stdin, giving up when the budget runs out.
pub struct HumanInput;

#[async_trait]
impl AnswerProvider for HumanInput {
    async fn provide_answer(&mut self, _prompt: &str, budget: Duration) -> Option<String> {
        println!(
            "{} (you have {} seconds!)",
            style::paint(style::GREEN, "Enter your answer"),
            budget.as_secs()
        );

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match timeout(budget, stdin.read_line(&mut line)).await {
            Ok(Ok(0)) => None,
            Ok(Ok(_)) => Some(line.trim().to_string()),
            Ok(Err(_)) => None,
            Err(_) => {
                println!("No input received in time, sending a default answer.");
                None
            }
        }
    }
}

/// Answers instantly with a uniform pick from the configured token sets.
pub struct RandomBot {
    choices: Vec<String>,
}

impl RandomBot {
    pub fn new(config: &GameConfig) -> Self {
        let choices = config
            .true_tokens
            .iter()
            .chain(config.false_tokens.iter())
            .cloned()
            .collect();
        Self { choices }
    }
}

#[async_trait]
impl AnswerProvider for RandomBot {
    async fn provide_answer(&mut self, _prompt: &str, _budget: Duration) -> Option<String> {
        let token = self.choices.choose(&mut rand::thread_rng())?.clone();
        println!("Bot answers: {token}");
        Some(token)
    }
}
