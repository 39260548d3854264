//! Game configuration loaded from a JSON file.
//!
//! Both binaries read the same file so that the discovery constants, answer
//! token sets and message markers stay in agreement. Every field has a
//! default, so a partial file only needs to spell out what it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON in config {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// One true/false trivia question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub is_true: bool,
}

/// Everything the server and client need to agree on for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Name advertised in the discovery offer; at most 32 bytes.
    pub server_name: String,
    /// UDP port the offer datagrams are sent to.
    pub udp_port: u16,
    /// First TCP port the server tries to bind; see `port_scan_attempts`.
    pub tcp_port: u16,
    /// How many consecutive ports to try before giving up.
    pub port_scan_attempts: u16,
    /// Literal marker the client looks for to detect a question broadcast.
    pub question_prefix: String,
    /// Literal marker ending the game for everyone.
    pub game_over_marker: String,
    /// Literal marker telling an eliminated player to stop answering.
    pub elimination_marker: String,
    /// Raw answer tokens graded as "true".
    pub true_tokens: Vec<String>,
    /// Raw answer tokens graded as "false".
    pub false_tokens: Vec<String>,
    /// Wall-clock budget for collecting answers each round, in seconds.
    pub answer_secs: u64,
    /// Join window: how long after the last join the server keeps waiting.
    pub join_grace_secs: u64,
    /// Cadence of the discovery broadcast, in milliseconds.
    pub broadcast_interval_millis: u64,
    /// The question bank, shuffled once per session.
    pub questions: Vec<Question>,
    /// Display names automated players pick from.
    pub bot_names: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            server_name: "Mystic".to_string(),
            udp_port: 13117,
            tcp_port: 12345,
            port_scan_attempts: 16,
            question_prefix: "True or False:".to_string(),
            game_over_marker: "Game over!".to_string(),
            elimination_marker: "you are out of the game".to_string(),
            true_tokens: ["Y", "T", "1", "true"].map(String::from).to_vec(),
            false_tokens: ["N", "F", "0", "false"].map(String::from).to_vec(),
            answer_secs: 10,
            join_grace_secs: 10,
            broadcast_interval_millis: 1000,
            questions: default_questions(),
            bot_names: ["Ziggy", "Pudding", "Waffles", "Biscuit", "Noodle", "Pickle"]
                .map(String::from)
                .to_vec(),
        }
    }
}

fn default_questions() -> Vec<Question> {
    [
        ("Aston Villa's current manager is Pep Guardiola", false),
        ("Aston Villa's mascot is a lion named Hercules", true),
        ("Aston Villa play their home games at Villa Park", true),
        ("Aston Villa have never won the European Cup", false),
        ("Aston Villa were founded before 1900", true),
        ("Aston Villa's traditional colors are claret and blue", true),
    ]
    .into_iter()
    .map(|(text, is_true)| Question {
        text: text.to_string(),
        is_true,
    })
    .collect()
}

impl GameConfig {
    /// Loads a config file, failing loudly on unreadable or invalid JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json { path: shown, source })
    }

    pub fn answer_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.answer_secs)
    }

    pub fn join_grace(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.join_grace_secs)
    }

    pub fn broadcast_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.broadcast_interval_millis)
    }
}
