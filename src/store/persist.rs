//! Persistent Store
//!
//! Player records and completed match history. Only finished matches reach
//! this store; live state stays in the match store. The single write entry
//! point is `commit_match_result`, which applies the rating mutations and
//! the history row atomically: either every mutation lands or none do.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::bot::Difficulty;
use crate::game::state::{MatchId, PlayerId, ReplayEvent};
use crate::store::StoreError;

/// One user row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub username: String,
    /// Current rating.
    pub elo: i32,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Matches completed, including draws.
    pub games_played: u32,
}

impl PlayerRecord {
    /// Fresh record at the default rating.
    pub fn new(id: PlayerId, username: impl Into<String>, elo: i32) -> Self {
        Self {
            id,
            username: username.into(),
            elo,
            wins: 0,
            losses: 0,
            games_played: 0,
        }
    }
}

/// How one human side finished, for counter bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotOutcome {
    /// Counted into `wins`.
    Win,
    /// Counted into `losses`.
    Loss,
    /// Only `games_played` moves.
    Draw,
}

/// Rating mutation for one human player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    /// Which row.
    pub id: PlayerId,
    /// Rating after the match.
    pub new_elo: i32,
    /// Counter to bump alongside `games_played`.
    pub outcome: SlotOutcome,
}

/// One completed-match history row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    /// Match identifier.
    pub match_id: MatchId,
    /// Winning player; `None` for a draw or a bot win.
    pub winner_id: Option<PlayerId>,
    /// Losing player; `None` for a draw or a bot loss.
    pub loser_id: Option<PlayerId>,
    /// Winner-side rating before the match.
    pub winner_elo_before: i32,
    /// Winner-side rating after the match.
    pub winner_elo_after: i32,
    /// Loser-side rating before the match.
    pub loser_elo_before: i32,
    /// Loser-side rating after the match.
    pub loser_elo_after: i32,
    /// The secret word, revealed.
    pub target_word: String,
    /// Structured replay of the whole match.
    pub replay_log: Vec<ReplayEvent>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Whether one side was synthetic.
    pub is_bot_match: bool,
    /// Bot tier when `is_bot_match`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_difficulty: Option<Difficulty>,
    /// Completion time, epoch milliseconds.
    pub played_at: u64,
}

/// The full transactional payload for one finished match.
#[derive(Clone, Debug)]
pub struct MatchResultWrite {
    /// The history row.
    pub row: HistoryRow,
    /// Human rating mutations: zero (never happens), one (bot match) or two.
    pub updates: Vec<PlayerUpdate>,
}

/// Persistent player/history storage.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Fetch a player row.
    async fn get_player(&self, id: &PlayerId) -> Result<Option<PlayerRecord>, StoreError>;

    /// Create the row if absent; returns the stored record either way.
    async fn ensure_player(&self, record: PlayerRecord) -> Result<PlayerRecord, StoreError>;

    /// Apply a finished match atomically: the history row, every rating,
    /// and every counter — or nothing.
    async fn commit_match_result(&self, write: &MatchResultWrite) -> Result<(), StoreError>;
}

/// The `memory://` backend: a single-process map behind one lock, which is
/// also what makes the commit atomic.
#[derive(Default)]
pub struct MemoryPlayerStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    players: HashMap<PlayerId, PlayerRecord>,
    history: Vec<HistoryRow>,
}

impl MemoryPlayerStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history rows (test helper).
    pub async fn history_len(&self) -> usize {
        self.inner.read().await.history.len()
    }

    /// Clone of the last committed row (test helper).
    pub async fn last_row(&self) -> Option<HistoryRow> {
        self.inner.read().await.history.last().cloned()
    }
}

#[async_trait]
impl PlayerStore for MemoryPlayerStore {
    async fn get_player(&self, id: &PlayerId) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self.inner.read().await.players.get(id).cloned())
    }

    async fn ensure_player(&self, record: PlayerRecord) -> Result<PlayerRecord, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .players
            .entry(record.id.clone())
            .or_insert(record)
            .clone())
    }

    async fn commit_match_result(&self, write: &MatchResultWrite) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        // Validate every row exists before mutating anything, so a missing
        // player leaves the store untouched.
        for update in &write.updates {
            if !inner.players.contains_key(&update.id) {
                return Err(StoreError::Unavailable(format!(
                    "unknown player {}",
                    update.id
                )));
            }
        }

        for update in &write.updates {
            if let Some(player) = inner.players.get_mut(&update.id) {
                player.elo = update.new_elo;
                player.games_played += 1;
                match update.outcome {
                    SlotOutcome::Win => player.wins += 1,
                    SlotOutcome::Loss => player.losses += 1,
                    SlotOutcome::Draw => {}
                }
            }
        }
        inner.history.push(write.row.clone());
        Ok(())
    }
}
