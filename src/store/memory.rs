//! In-Memory Live Match Store
//!
//! The `memory://` backend: a single-process map with per-entry deadlines.
//! One mutex serializes all access, which is what makes the win claim a
//! true first-writer-wins primitive.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::game::state::{now_ms, Match, MatchId, PlayerId};
use crate::store::{MatchStore, StoreError, WinClaim};

/// Default TTL for live match state.
pub const DEFAULT_MATCH_TTL: Duration = Duration::from_secs(60 * 60);

/// Win claims only need to outlive the terminal fan-out.
const CLAIM_TTL: Duration = Duration::from_secs(120);

struct Entry<T> {
    value: T,
    deadline: Instant,
}

impl<T> Entry<T> {
    fn live(&self) -> bool {
        Instant::now() < self.deadline
    }
}

#[derive(Default)]
struct Inner {
    matches: HashMap<MatchId, Entry<Match>>,
    claims: HashMap<MatchId, Entry<WinClaim>>,
}

/// Single-process match store with TTL semantics.
pub struct MemoryMatchStore {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl MemoryMatchStore {
    /// Store with the default one-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_MATCH_TTL)
    }

    /// Store with a custom TTL (tests use short ones).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
        }
    }
}

impl Default for MemoryMatchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn load(&self, id: &MatchId) -> Result<Option<Match>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .matches
            .get(id)
            .filter(|e| e.live())
            .map(|e| e.value.clone()))
    }

    async fn save(&self, game: &Match) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.matches.insert(
            game.id.clone(),
            Entry {
                value: game.clone(),
                deadline: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &MatchId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.matches.remove(id);
        Ok(())
    }

    async fn try_claim_winner(
        &self,
        id: &MatchId,
        player: &PlayerId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.claims.get(id) {
            Some(existing) if existing.live() => Ok(false),
            _ => {
                inner.claims.insert(
                    id.clone(),
                    Entry {
                        value: WinClaim {
                            player_id: player.clone(),
                            claimed_at: now_ms(),
                        },
                        deadline: Instant::now() + CLAIM_TTL,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn read_winner(&self, id: &MatchId) -> Result<Option<WinClaim>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .claims
            .get(id)
            .filter(|e| e.live())
            .map(|e| e.value.clone()))
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.matches.len() + inner.claims.len();
        inner.matches.retain(|_, e| e.live());
        inner.claims.retain(|_, e| e.live());
        Ok(before - (inner.matches.len() + inner.claims.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerSlot;
    use std::sync::Arc;

    fn test_match() -> Match {
        Match::new(
            "CRANE",
            PlayerSlot::human(PlayerId::from("p1"), "Alice", 1200),
            PlayerSlot::human(PlayerId::from("p2"), "Bob", 1200),
        )
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = MemoryMatchStore::new();
        let game = test_match();
        store.save(&game).await.unwrap();

        let loaded = store.load(&game.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, game.id);
        assert_eq!(loaded.target, "CRANE");

        store.remove(&game.id).await.unwrap();
        assert!(store.load(&game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_unknown_is_none() {
        let store = MemoryMatchStore::new();
        assert!(store.load(&MatchId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_match_behaves_as_absent() {
        let store = MemoryMatchStore::with_ttl(Duration::from_millis(0));
        let game = test_match();
        store.save(&game).await.unwrap();
        assert!(store.load(&game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_is_first_writer_wins() {
        let store = MemoryMatchStore::new();
        let id = MatchId::generate();
        let p1 = PlayerId::from("p1");
        let p2 = PlayerId::from("p2");

        assert!(store.try_claim_winner(&id, &p1).await.unwrap());
        assert!(!store.try_claim_winner(&id, &p2).await.unwrap());
        assert!(!store.try_claim_winner(&id, &p1).await.unwrap());

        let claim = store.read_winner(&id).await.unwrap().unwrap();
        assert_eq!(claim.player_id, p1);
    }

    #[tokio::test]
    async fn test_claim_exactly_once_under_concurrency() {
        let store = Arc::new(MemoryMatchStore::new());
        let id = MatchId::generate();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let player = PlayerId::new(format!("p{i}"));
                store.try_claim_winner(&id, &player).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(store.read_winner(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let store = MemoryMatchStore::with_ttl(Duration::from_millis(0));
        let game = test_match();
        store.save(&game).await.unwrap();
        let removed = store.sweep_expired().await.unwrap();
        assert_eq!(removed, 1);
    }
}
