//! State Stores
//!
//! Two distinct stores: the live match store holding in-flight matches with
//! a TTL and the atomic win-claim primitive, and the persistent store
//! holding player records and completed match history. Both are trait
//! seams; the bundled backends are in-process (`memory://`), a deployment
//! can substitute networked implementations without touching the engine.
//!
//! The live store is the sole coordination point between concurrent match
//! processing: every mutation goes read-modify-write through it, and
//! simultaneous correct guesses are serialized by the win claim.

pub mod memory;
pub mod persist;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::state::{Match, MatchId, PlayerId};

pub use memory::MemoryMatchStore;
pub use persist::{
    HistoryRow, MatchResultWrite, MemoryPlayerStore, PlayerRecord, PlayerStore, PlayerUpdate,
    SlotOutcome,
};

/// Store failures. Operations are retried at most once by callers; repeated
/// failure surfaces to clients as `INTERNAL`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("store codec error: {0}")]
    Codec(String),
}

/// A recorded win claim: who won the race, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinClaim {
    /// The player that claimed first.
    pub player_id: PlayerId,
    /// Claim time, epoch milliseconds.
    pub claimed_at: u64,
}

/// Keyed storage for live matches.
///
/// Values carry a time-to-live; a lapsed entry behaves as absent, which the
/// engine reports as no-longer-active. `try_claim_winner` is first-writer-
/// wins: across any number of concurrent callers for one match it returns
/// `true` exactly once.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Fetch a live match, `None` if unknown or expired.
    async fn load(&self, id: &MatchId) -> Result<Option<Match>, StoreError>;

    /// Insert or overwrite a match, refreshing its TTL.
    async fn save(&self, game: &Match) -> Result<(), StoreError>;

    /// Drop a match (the win claim stays until its own expiry).
    async fn remove(&self, id: &MatchId) -> Result<(), StoreError>;

    /// Atomically claim the win for `player`. True exactly once per match.
    async fn try_claim_winner(&self, id: &MatchId, player: &PlayerId)
        -> Result<bool, StoreError>;

    /// Read the winning claim, if any.
    async fn read_winner(&self, id: &MatchId) -> Result<Option<WinClaim>, StoreError>;

    /// Drop expired entries; returns how many were removed. Driven by the
    /// server's cleanup loop.
    async fn sweep_expired(&self) -> Result<usize, StoreError>;
}
