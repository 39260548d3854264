//! One full round: broadcast the question, collect answers, grade, evolve
//! the active set.
//!
//! Round broadcasts go to every registered player, so spectators eliminated
//! in earlier rounds keep watching, but only active players are asked to
//! answer. A player who gives no answer (disconnect, error, or deadline) is
//! kicked outright; wrong answers merely cost the round.

use crate::collector::AnswerCollector;
use crate::registry::{Player, PlayerRegistry};
use log::{info, warn};
use shared::style;
use shared::{GameConfig, Question};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// How one round ended.
#[derive(Debug, Clone)]
pub enum RoundOutcome {
    /// Exactly one correct answer: the session is over and this player won.
    Winner(Player),
    /// Nobody was right; the active set is unchanged and play continues.
    NoOneCorrect,
    /// Two or more were right; they are the new active set.
    Survivors(Vec<Player>),
}

/// Partition of one round's answers. Derived per round, consumed by the
/// engine and the statistics recorder, never stored.
#[derive(Debug, Clone, Default)]
pub struct RoundResult {
    pub correct: Vec<Player>,
    pub incorrect: Vec<Player>,
    pub non_responders: Vec<Player>,
}

/// Pure grading policy: token-set membership per answer.
pub struct Grader {
    true_tokens: HashSet<String>,
    false_tokens: HashSet<String>,
}

impl Grader {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            true_tokens: config.true_tokens.iter().cloned().collect(),
            false_tokens: config.false_tokens.iter().cloned().collect(),
        }
    }

    /// Partitions answers into correct / incorrect / non-responders.
    ///
    /// An answer is correct iff it is in the token set matching the
    /// question's truth value. Any other token, the empty string included,
    /// is incorrect; only `None` counts as no response. Pure function of its
    /// inputs: grading the same pair twice yields the same partition.
    pub fn grade(
        &self,
        question: &Question,
        answers: &HashMap<Player, Option<String>>,
    ) -> RoundResult {
        let mut result = RoundResult::default();
        for (player, answer) in answers {
            match answer {
                None => result.non_responders.push(player.clone()),
                Some(token) => {
                    let accepted = if question.is_true {
                        &self.true_tokens
                    } else {
                        &self.false_tokens
                    };
                    if accepted.contains(token) {
                        result.correct.push(player.clone());
                    } else {
                        result.incorrect.push(player.clone());
                    }
                }
            }
        }
        result
    }
}

pub struct RoundEngine {
    registry: Arc<PlayerRegistry>,
    collector: AnswerCollector,
    grader: Grader,
    answer_budget: Duration,
    question_prefix: String,
    elimination_marker: String,
    round: u32,
}

impl RoundEngine {
    pub fn new(registry: Arc<PlayerRegistry>, config: &GameConfig) -> Self {
        Self {
            registry,
            collector: AnswerCollector,
            grader: Grader::new(config),
            answer_budget: config.answer_budget(),
            question_prefix: config.question_prefix.clone(),
            elimination_marker: config.elimination_marker.clone(),
            round: 0,
        }
    }

    /// Rounds played so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Plays one round of `question` and reports how it went.
    pub async fn play_round(&mut self, question: &Question) -> (RoundOutcome, RoundResult) {
        self.round += 1;

        let announcement = self.build_announcement(question).await;
        self.broadcast(&announcement).await;

        // Broadcast failures above may have kicked players; collect over
        // whoever is still active now.
        let active = self.registry.active_players().await;
        let answers = self.collector.collect(active, self.answer_budget).await;
        let result = self.grader.grade(question, &answers);

        for player in &result.non_responders {
            info!("player {} gave no answer and is kicked", player.name());
            self.registry.kick(player).await;
        }

        let outcome = match result.correct.len() {
            0 => {
                let notice = style::paint(
                    style::RED,
                    &format!(
                        "No one answered correctly {} playing another round",
                        style::SAD_FACE
                    ),
                );
                self.broadcast(&notice).await;
                RoundOutcome::NoOneCorrect
            }
            1 => RoundOutcome::Winner(result.correct[0].clone()),
            _ => {
                let summary = build_summary(&result);
                self.registry.set_active(&result.correct).await;
                self.broadcast(&summary).await;
                for loser in &result.incorrect {
                    let notice = style::paint(
                        style::RED,
                        &format!("Sorry {}, {}", loser.name(), self.elimination_marker),
                    );
                    if let Err(e) = loser.send_text(&notice).await {
                        warn!("dropping player {}: {}", loser.name(), e);
                        self.registry.kick(loser).await;
                    }
                }
                RoundOutcome::Survivors(result.correct.clone())
            }
        };
        (outcome, result)
    }

    async fn build_announcement(&self, question: &Question) -> String {
        let roster = self
            .registry
            .active_players()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}{}{}\n{} {}",
            style::paint(style::CYAN, &format!("Round {}", self.round)),
            style::paint(style::BLUE, &format!(", played by {roster}")),
            style::paint(style::MAGENTA, "\nThe next question is..."),
            self.question_prefix,
            question.text
        )
    }

    /// Sends `message` to every registered player, spectators included.
    /// A failed write means the connection is gone: the player is kicked
    /// and the broadcast carries on.
    pub async fn broadcast(&self, message: &str) {
        info!("{}", message);
        for player in self.registry.all_players().await {
            if let Err(e) = player.send_text(message).await {
                warn!("dropping player {}: {}", player.name(), e);
                self.registry.kick(&player).await;
            }
        }
    }
}

fn build_summary(result: &RoundResult) -> String {
    let mut lines = Vec::with_capacity(result.correct.len() + result.incorrect.len());
    for player in &result.correct {
        lines.push(style::paint(
            style::GREEN,
            &format!("{} is correct! {}", player.name(), style::THUMBS_UP),
        ));
    }
    for player in &result.incorrect {
        lines.push(style::paint(
            style::RED,
            &format!("{} is incorrect!", player.name()),
        ));
    }
    lines.join("\n")
}
