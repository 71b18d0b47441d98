//! Connection Registry
//!
//! Process-local map between player identities and live connection
//! handles. A player may transiently hold several handles during
//! reconnection; delivery broadcasts to every handle currently bound.
//! Multi-process deployments coordinate through the match store only —
//! this registry never leaves the process.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::game::state::PlayerId;
use crate::network::protocol::ServerMessage;

/// Process-unique connection handle.
pub type HandleId = u64;

struct Handle {
    player: Option<PlayerId>,
    outbox: mpsc::Sender<ServerMessage>,
}

#[derive(Default)]
struct Inner {
    handles: HashMap<HandleId, Handle>,
    players: HashMap<PlayerId, HashSet<HandleId>>,
}

/// The player ↔ handle registry.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
    next_handle: AtomicU64,
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a fresh connection; identity is bound later by `register`.
    pub async fn insert(&self, outbox: mpsc::Sender<ServerMessage>) -> HandleId {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.inner.write().await.handles.insert(
            id,
            Handle {
                player: None,
                outbox,
            },
        );
        id
    }

    /// Bind a handle to a player identity. Re-binding to the same player is
    /// a no-op; binding to a different player moves the handle.
    pub async fn bind(&self, handle: HandleId, player: PlayerId) -> bool {
        let mut inner = self.inner.write().await;
        let previous = match inner.handles.get_mut(&handle) {
            Some(h) => h.player.replace(player.clone()),
            None => return false,
        };
        if let Some(prev) = previous {
            if prev != player {
                if let Some(set) = inner.players.get_mut(&prev) {
                    set.remove(&handle);
                    if set.is_empty() {
                        inner.players.remove(&prev);
                    }
                }
            }
        }
        inner.players.entry(player).or_default().insert(handle);
        true
    }

    /// Drop a handle. Returns the bound player and whether that player now
    /// has no remaining handles (which starts the disconnect grace timer).
    pub async fn remove(&self, handle: HandleId) -> Option<(PlayerId, bool)> {
        let mut inner = self.inner.write().await;
        let entry = inner.handles.remove(&handle)?;
        let player = entry.player?;
        let last = match inner.players.get_mut(&player) {
            Some(set) => {
                set.remove(&handle);
                if set.is_empty() {
                    inner.players.remove(&player);
                    true
                } else {
                    false
                }
            }
            None => true,
        };
        Some((player, last))
    }

    /// The player bound to a handle.
    pub async fn player_of(&self, handle: HandleId) -> Option<PlayerId> {
        self.inner
            .read()
            .await
            .handles
            .get(&handle)
            .and_then(|h| h.player.clone())
    }

    /// Whether the player has at least one live handle.
    pub async fn is_connected(&self, player: &PlayerId) -> bool {
        self.inner
            .read()
            .await
            .players
            .get(player)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// Broadcast to every handle bound to a player. Dead handles are
    /// pruned as they are discovered.
    pub async fn send_to_player(&self, player: &PlayerId, message: ServerMessage) {
        let outboxes: Vec<(HandleId, mpsc::Sender<ServerMessage>)> = {
            let inner = self.inner.read().await;
            match inner.players.get(player) {
                Some(set) => set
                    .iter()
                    .filter_map(|h| inner.handles.get(h).map(|e| (*h, e.outbox.clone())))
                    .collect(),
                None => return,
            }
        };

        let mut dead = Vec::new();
        for (handle, outbox) in outboxes {
            if outbox.send(message.clone()).await.is_err() {
                dead.push(handle);
            }
        }
        for handle in dead {
            debug!(handle, player = %player, "pruning dead handle");
            self.remove(handle).await;
        }
    }

    /// Send to one specific handle.
    pub async fn send_to_handle(&self, handle: HandleId, message: ServerMessage) {
        let outbox = {
            let inner = self.inner.read().await;
            inner.handles.get(&handle).map(|h| h.outbox.clone())
        };
        if let Some(outbox) = outbox {
            let _ = outbox.send(message).await;
        }
    }

    /// Number of tracked connections.
    pub async fn handle_count(&self) -> usize {
        self.inner.read().await.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<ServerMessage>, mpsc::Receiver<ServerMessage>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn test_bind_and_send() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        let handle = registry.insert(tx).await;
        let player = PlayerId::from("p1");

        assert!(registry.bind(handle, player.clone()).await);
        assert!(registry.is_connected(&player).await);

        registry
            .send_to_player(&player, ServerMessage::MatchmakingSearching)
            .await;
        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::MatchmakingSearching)
        ));
    }

    #[tokio::test]
    async fn test_multi_handle_broadcast() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        let player = PlayerId::from("p1");

        let h1 = registry.insert(tx1).await;
        let h2 = registry.insert(tx2).await;
        registry.bind(h1, player.clone()).await;
        registry.bind(h2, player.clone()).await;

        registry
            .send_to_player(&player, ServerMessage::MatchmakingCancelled)
            .await;
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_remove_reports_last_handle() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        let player = PlayerId::from("p1");

        let h1 = registry.insert(tx1).await;
        let h2 = registry.insert(tx2).await;
        registry.bind(h1, player.clone()).await;
        registry.bind(h2, player.clone()).await;

        assert_eq!(registry.remove(h1).await, Some((player.clone(), false)));
        assert!(registry.is_connected(&player).await);
        assert_eq!(registry.remove(h2).await, Some((player.clone(), true)));
        assert!(!registry.is_connected(&player).await);
    }

    #[tokio::test]
    async fn test_remove_unbound_handle_yields_none() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let handle = registry.insert(tx).await;
        assert_eq!(registry.remove(handle).await, None);
        assert_eq!(registry.remove(9999).await, None);
    }

    #[tokio::test]
    async fn test_send_to_unknown_player_is_noop() {
        let registry = ConnectionRegistry::new();
        registry
            .send_to_player(&PlayerId::from("ghost"), ServerMessage::NotFound)
            .await;
    }

    #[tokio::test]
    async fn test_dead_handles_are_pruned_on_send() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = channel();
        let player = PlayerId::from("p1");
        let handle = registry.insert(tx).await;
        registry.bind(handle, player.clone()).await;
        drop(rx);

        registry
            .send_to_player(&player, ServerMessage::NotFound)
            .await;
        assert!(!registry.is_connected(&player).await);
        assert_eq!(registry.handle_count().await, 0);
    }
}
