//! Match State Definitions
//!
//! The authoritative record of one head-to-head match: target word, the two
//! player slots with their guess history, the replay log, and the terminal
//! outcome. Serialized as camelCase at the storage boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bot::Difficulty;
use crate::words::Pattern;
use crate::{MAX_GUESSES, WORD_LENGTH};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque player identifier, as supplied by the authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create from any string-like id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque unique match identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(String);

impl MatchId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Lifecycle status. Matches are published only once active; the terminal
/// state is reached by win, draw or forfeit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Guesses are being accepted.
    Active,
    /// Terminal. `winner_id` distinguishes a win from a draw.
    Finished,
}

/// Why a match ended. Carried in the terminal event's `reason` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A player guessed the target.
    Solved,
    /// Both players exhausted their guesses.
    OutOfGuesses,
    /// A player forfeited explicitly.
    Forfeit,
    /// A player stayed disconnected past the grace window.
    OpponentLeft,
}

/// One evaluated guess in a player's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    /// The guessed word, uppercase.
    pub word: String,
    /// 1-based position in this player's history.
    pub ordinal: u8,
    /// Submission time, epoch milliseconds.
    pub timestamp: u64,
    /// Per-letter color feedback.
    pub evaluation: Pattern,
}

/// One side of the match.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    /// Player identifier.
    pub id: PlayerId,
    /// Name shown to the opponent.
    pub display_name: String,
    /// Rating snapshot taken at match creation; rating updates at completion
    /// are derived exclusively from this value.
    pub rating_at_start: i32,
    /// Ordered guess history, at most [`MAX_GUESSES`] entries.
    pub guesses: Vec<GuessRecord>,
    /// Set iff this slot is driven by the bot engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_difficulty: Option<Difficulty>,
}

impl PlayerSlot {
    /// Human slot.
    pub fn human(id: PlayerId, display_name: impl Into<String>, rating: i32) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            rating_at_start: rating,
            guesses: Vec::new(),
            synthetic_difficulty: None,
        }
    }

    /// Synthetic slot. The id is generated, the rating comes from the
    /// difficulty table.
    pub fn synthetic(difficulty: Difficulty) -> Self {
        Self {
            id: PlayerId::new(format!("bot:{}", uuid::Uuid::new_v4())),
            display_name: difficulty.display_name().to_string(),
            rating_at_start: difficulty.rating(),
            guesses: Vec::new(),
            synthetic_difficulty: Some(difficulty),
        }
    }

    /// Whether this slot is bot-driven.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic_difficulty.is_some()
    }

    /// Whether this slot has used its full guess quota.
    pub fn out_of_guesses(&self) -> bool {
        self.guesses.len() >= MAX_GUESSES
    }
}

/// Replay log entry. The ordered log reconstructs the match for history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// A guess was accepted.
    #[serde(rename_all = "camelCase")]
    Guess {
        /// Who guessed.
        player_id: PlayerId,
        /// Submission time, epoch milliseconds.
        timestamp: u64,
        /// The guessed word.
        word: String,
        /// Compact G/Y/X code of the evaluation.
        pattern: String,
    },
    /// A player forfeited.
    #[serde(rename_all = "camelCase")]
    Forfeit {
        /// Who forfeited.
        player_id: PlayerId,
        /// Event time, epoch milliseconds.
        timestamp: u64,
    },
}

/// A live or finished match. Owned by the match engine; persisted through
/// the state store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Opaque unique identifier.
    pub id: MatchId,
    /// The secret five-letter target, uppercase.
    pub target: String,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Creation time, epoch milliseconds.
    pub started_at: u64,
    /// Terminal time, epoch milliseconds. Always `>= started_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<u64>,
    /// Exactly two slots with distinct player ids.
    pub players: [PlayerSlot; 2],
    /// Set iff finished and not a draw; always one of the two player ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<PlayerId>,
    /// Why the match ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    /// Ordered event log.
    pub replay_log: Vec<ReplayEvent>,
}

impl Match {
    /// Create an active match between two slots.
    ///
    /// The target must be an uppercase word of the fixed length and the two
    /// slot ids must differ.
    pub fn new(target: impl Into<String>, a: PlayerSlot, b: PlayerSlot) -> Self {
        let target = target.into();
        debug_assert_eq!(target.len(), WORD_LENGTH);
        debug_assert_ne!(a.id, b.id, "match slots must hold distinct players");
        Self {
            id: MatchId::generate(),
            target,
            status: MatchStatus::Active,
            started_at: now_ms(),
            ended_at: None,
            players: [a, b],
            winner_id: None,
            end_reason: None,
            replay_log: Vec::new(),
        }
    }

    /// Whether the match still accepts guesses.
    pub fn is_active(&self) -> bool {
        self.status == MatchStatus::Active
    }

    /// Slot for a player, if they belong to this match.
    pub fn slot(&self, player: &PlayerId) -> Option<&PlayerSlot> {
        self.players.iter().find(|s| &s.id == player)
    }

    /// Mutable slot for a player.
    pub fn slot_mut(&mut self, player: &PlayerId) -> Option<&mut PlayerSlot> {
        self.players.iter_mut().find(|s| &s.id == player)
    }

    /// The other side's slot.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerSlot> {
        if !self.players.iter().any(|s| &s.id == player) {
            return None;
        }
        self.players.iter().find(|s| &s.id != player)
    }

    /// Append an accepted guess to the player's slot and the replay log.
    /// Returns `None` when the player is not part of this match.
    ///
    /// Timestamps within one slot are kept strictly increasing even when two
    /// guesses land inside the same millisecond.
    pub fn record_guess(
        &mut self,
        player: &PlayerId,
        word: String,
        evaluation: Pattern,
    ) -> Option<GuessRecord> {
        let now = now_ms();
        let slot = self.slot_mut(player)?;
        let timestamp = match slot.guesses.last() {
            Some(prev) => now.max(prev.timestamp + 1),
            None => now,
        };
        let record = GuessRecord {
            word: word.clone(),
            ordinal: (slot.guesses.len() + 1) as u8,
            timestamp,
            evaluation,
        };
        slot.guesses.push(record.clone());
        self.replay_log.push(ReplayEvent::Guess {
            player_id: player.clone(),
            timestamp,
            word,
            pattern: evaluation.code(),
        });
        Some(record)
    }

    /// Append a forfeit event to the replay log.
    pub fn record_forfeit(&mut self, player: &PlayerId) {
        self.replay_log.push(ReplayEvent::Forfeit {
            player_id: player.clone(),
            timestamp: now_ms(),
        });
    }

    /// Transition to finished. A `winner` of `None` records a draw.
    pub fn finish(&mut self, winner: Option<PlayerId>, reason: EndReason) {
        debug_assert!(self.is_active(), "finish on a terminal match");
        self.status = MatchStatus::Finished;
        self.ended_at = Some(now_ms().max(self.started_at));
        self.winner_id = winner;
        self.end_reason = Some(reason);
    }

    /// Whether both players have exhausted their quotas.
    pub fn all_guesses_used(&self) -> bool {
        self.players.iter().all(|s| s.out_of_guesses())
    }

    /// Wall-clock duration, zero until finished.
    pub fn duration_ms(&self) -> u64 {
        self.ended_at
            .map(|end| end.saturating_sub(self.started_at))
            .unwrap_or(0)
    }
}
