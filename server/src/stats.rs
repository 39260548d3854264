//! Cumulative game statistics and the sink they persist through.
//!
//! The core only ever talks to [`StatsSink`]: load the whole record, mutate
//! it in memory over a session, save it back once the session finishes. The
//! JSON file sink is the shipped collaborator; tests use the in-memory one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_played: u64,
    pub games_won: u64,
    pub correct_answers: u64,
    pub incorrect_answers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub correct_answers: u64,
    pub incorrect_answers: u64,
    pub times_appeared: u64,
}

/// Reigning leader by games won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub name: String,
    pub wins: u64,
}

/// Everything the server remembers across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub players_data: HashMap<String, PlayerStats>,
    pub games_played: u64,
    pub question_data: HashMap<String, QuestionStats>,
    pub trivia_king: Option<Leader>,
}

impl Statistics {
    /// Marks the start of a session for `names`: each gets an entry and a
    /// games-played bump.
    pub fn record_participation<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.players_data
                .entry(name.to_string())
                .or_default()
                .games_played += 1;
        }
    }

    /// Folds one round's partition into the per-player and per-question
    /// tallies. Non-responders count toward neither side.
    pub fn record_round<'a>(
        &mut self,
        question_text: &str,
        correct: impl IntoIterator<Item = &'a str>,
        incorrect: impl IntoIterator<Item = &'a str>,
    ) {
        let mut correct_count = 0;
        for name in correct {
            self.players_data
                .entry(name.to_string())
                .or_default()
                .correct_answers += 1;
            correct_count += 1;
        }
        let mut incorrect_count = 0;
        for name in incorrect {
            self.players_data
                .entry(name.to_string())
                .or_default()
                .incorrect_answers += 1;
            incorrect_count += 1;
        }

        let entry = self.question_data.entry(question_text.to_string()).or_default();
        entry.correct_answers += correct_count;
        entry.incorrect_answers += incorrect_count;
        entry.times_appeared += 1;
    }

    /// Credits a win and re-crowns the leader if this one now has the most.
    pub fn record_win(&mut self, name: &str) {
        let wins = {
            let entry = self.players_data.entry(name.to_string()).or_default();
            entry.games_won += 1;
            entry.games_won
        };
        let dethroned = self
            .trivia_king
            .as_ref()
            .map(|king| wins > king.wins)
            .unwrap_or(true);
        if dethroned {
            self.trivia_king = Some(Leader {
                name: name.to_string(),
                wins,
            });
        }
    }

    /// One more session in the books.
    pub fn record_session(&mut self) {
        self.games_played += 1;
    }
}

/// Narrow persistence interface the orchestrator writes through.
pub trait StatsSink: Send {
    fn load(&self) -> std::io::Result<Statistics>;
    fn save(&self, stats: &Statistics) -> std::io::Result<()>;
}

impl<S: StatsSink + Sync> StatsSink for std::sync::Arc<S> {
    fn load(&self) -> std::io::Result<Statistics> {
        (**self).load()
    }

    fn save(&self, stats: &Statistics) -> std::io::Result<()> {
        (**self).save(stats)
    }
}

/// JSON-file-backed sink. A missing file loads as empty statistics; a
/// corrupt one is an error so the operator notices instead of silently
/// losing history.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatsSink for JsonFileSink {
    fn load(&self) -> std::io::Result<Statistics> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Statistics::default())
            }
            Err(e) => return Err(e),
        };
        serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    fn save(&self, stats: &Statistics) -> std::io::Result<()> {
        let raw = serde_json::to_string_pretty(stats)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, raw)
    }
}

/// In-memory sink for tests and throwaway runs.
#[derive(Default)]
pub struct MemorySink {
    stats: Mutex<Statistics>,
}

impl MemorySink {
    pub fn snapshot(&self) -> Statistics {
        self.stats.lock().expect("stats lock poisoned").clone()
    }
}

impl StatsSink for MemorySink {
    fn load(&self) -> std::io::Result<Statistics> {
        Ok(self.snapshot())
    }

    fn save(&self, stats: &Statistics) -> std::io::Result<()> {
        *self.stats.lock().expect("stats lock poisoned") = stats.clone();
        Ok(())
    }
}
