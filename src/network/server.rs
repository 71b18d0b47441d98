//! WebSocket Gateway
//!
//! Accept loop and per-connection workers. Each connection is
//! authenticated at handshake from its bearer token, binds an identity
//! with `register`, and is then routed to matchmaking or its match actor.
//! Outbound traffic flows through the connection registry so every handle
//! a player holds receives the event.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::game::engine::{
    start_bot_match, start_human_match, EngineContext, MatchCommand, MatchManager, Participant,
};
use crate::game::state::{MatchId, PlayerId};
use crate::matchmaking::{
    EnqueueOutcome, Matchmaker, MatchmakerConfig, MatchmakingEvent, QueueEntry,
};
use crate::network::auth::{validate_token, TokenClaims};
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::registry::{ConnectionRegistry, HandleId};
use crate::rating::{RatingService, DEFAULT_RATING};
use crate::store::{
    MatchStore, MemoryMatchStore, MemoryPlayerStore, PlayerRecord, PlayerStore,
};
use crate::words::Dictionary;

/// Idle connections are dropped after this long without traffic.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// How often expired store entries are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Failed to bind the listener.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket protocol error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A store URL names a scheme with no built-in backend.
    #[error("unsupported store url: {0}")]
    UnsupportedStore(String),
}

/// Per-connection state, owned by the connection worker.
struct ConnState {
    handle: HandleId,
    claims: Option<TokenClaims>,
    player: Option<PlayerId>,
}

/// The realtime gateway.
pub struct Gateway {
    config: Config,
    ctx: Arc<EngineContext>,
    players: Arc<dyn PlayerStore>,
    matchmaker: Arc<Matchmaker>,
    events: Mutex<Option<mpsc::Receiver<MatchmakingEvent>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Gateway {
    /// Build the gateway and its stores from configuration.
    pub fn new(config: Config, dict: Arc<Dictionary>) -> Result<Self, GatewayError> {
        let store: Arc<dyn MatchStore> = if config.state_store_url.starts_with("memory://") {
            Arc::new(MemoryMatchStore::with_ttl(config.match_ttl))
        } else {
            return Err(GatewayError::UnsupportedStore(
                config.state_store_url.clone(),
            ));
        };
        let players: Arc<dyn PlayerStore> =
            if config.persistent_store_url.starts_with("memory://") {
                Arc::new(MemoryPlayerStore::new())
            } else {
                return Err(GatewayError::UnsupportedStore(
                    config.persistent_store_url.clone(),
                ));
            };

        let (matchmaker, events) = Matchmaker::new(MatchmakerConfig {
            initial_band: config.initial_band,
            max_band: config.max_band,
            wait_budget: config.matchmaking_wait_budget,
            retry_interval: Duration::from_secs(2),
        });

        let ctx = Arc::new(EngineContext {
            dict,
            store,
            rating: Arc::new(RatingService::new(players.clone())),
            registry: Arc::new(ConnectionRegistry::new()),
            manager: Arc::new(MatchManager::new()),
            grace: config.disconnect_grace,
        });

        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            config,
            ctx,
            players,
            matchmaker,
            events: Mutex::new(Some(events)),
            shutdown_tx,
        })
    }

    /// Run the gateway until shutdown.
    #[instrument(skip(self))]
    pub async fn run(self: Arc<Self>) -> Result<(), GatewayError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;
        info!("gateway listening on {addr}");

        // Matchmaking rescan loop.
        tokio::spawn(self.matchmaker.clone().run());

        // Matchmaking event consumer.
        if let Some(mut events) = self.events.lock().await.take() {
            let gateway = self.clone();
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    gateway.handle_matchmaking_event(event).await;
                }
            });
        }

        // Expired-state sweep loop.
        {
            let store = self.ctx.store.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(SWEEP_INTERVAL);
                loop {
                    interval.tick().await;
                    match store.sweep_expired().await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, "swept expired match state"),
                        Err(err) => warn!(error = %err, "sweep failed"),
                    }
                }
            });
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            if self.ctx.registry.handle_count().await >= self.config.max_connections {
                                warn!(%peer, "connection limit reached, rejecting");
                                continue;
                            }
                            debug!(%peer, "new connection");
                            let gateway = self.clone();
                            tokio::spawn(async move {
                                gateway.handle_connection(stream, peer).await;
                            });
                        }
                        Err(err) => error!(error = %err, "accept error"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Signal every loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Engine context (tests and embedders).
    pub fn context(&self) -> Arc<EngineContext> {
        self.ctx.clone()
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let mut token: Option<String> = None;
        let ws_stream = match accept_hdr_async(stream, |req: &Request, resp: Response| {
            token = bearer_token(req);
            Ok(resp)
        })
        .await
        {
            Ok(ws) => ws,
            Err(err) => {
                debug!(%peer, error = %err, "handshake failed");
                return;
            }
        };

        // Handshake authentication. Failure leaves the connection usable
        // but unauthenticated; privileged messages are refused later.
        let claims = token.as_deref().and_then(|t| {
            validate_token(t, &self.config.auth)
                .map_err(|err| debug!(%peer, error = %err, "token rejected"))
                .ok()
        });

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);
        let handle = self.ctx.registry.insert(msg_tx.clone()).await;

        // Outbox pump.
        let sender_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        error!(error = %err, "failed to serialize message");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let mut state = ConnState {
            handle,
            claims,
            player: None,
        };
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut idle_deadline = Instant::now() + IDLE_TIMEOUT;

        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            idle_deadline = Instant::now() + IDLE_TIMEOUT;
                            match ClientMessage::from_json(&text) {
                                Ok(client_msg) => {
                                    self.dispatch(&mut state, &msg_tx, client_msg).await;
                                }
                                Err(err) => {
                                    debug!(%peer, error = %err, "invalid message");
                                    let _ = msg_tx
                                        .send(ServerMessage::Error {
                                            message: "invalid message format".to_string(),
                                        })
                                        .await;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                            idle_deadline = Instant::now() + IDLE_TIMEOUT;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!(%peer, "client disconnected");
                            break;
                        }
                        Some(Err(err)) => {
                            debug!(%peer, error = %err, "websocket error");
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }
                _ = tokio::time::sleep_until(idle_deadline) => {
                    debug!(%peer, "idle connection dropped");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        sender_task.abort();
        self.connection_closed(state).await;
        debug!(%peer, "connection cleaned up");
    }

    /// Tear-down after the socket goes away: unbind the handle, drop any
    /// queue entry, and start the match engine's grace handling when this
    /// was the player's last handle.
    async fn connection_closed(&self, state: ConnState) {
        if let Some((player, last)) = self.ctx.registry.remove(state.handle).await {
            if last {
                self.matchmaker.cancel(&player).await;
                if let Some(game) = self.ctx.manager.match_for(&player).await {
                    game.send(MatchCommand::Disconnect {
                        player_id: player.clone(),
                    })
                    .await;
                }
            }
        }
    }

    /// Route one inbound message.
    async fn dispatch(
        &self,
        state: &mut ConnState,
        outbox: &mpsc::Sender<ServerMessage>,
        msg: ClientMessage,
    ) {
        match msg {
            ClientMessage::Register { id, username, elo } => {
                self.handle_register(state, outbox, id, username, elo).await;
            }
            ClientMessage::MatchmakingStart => {
                self.handle_matchmaking_start(state, outbox).await;
            }
            ClientMessage::MatchmakingCancel => {
                if let Some(player) = &state.player {
                    self.matchmaker.cancel(player).await;
                }
                let _ = outbox.send(ServerMessage::MatchmakingCancelled).await;
            }
            ClientMessage::Guess { game_id, guess } => {
                self.forward_to_match(
                    state,
                    outbox,
                    &game_id,
                    |player| MatchCommand::Guess {
                        player_id: player,
                        word: guess,
                    },
                )
                .await;
            }
            ClientMessage::Forfeit { game_id } => {
                self.forward_to_match(state, outbox, &game_id, |player| MatchCommand::Forfeit {
                    player_id: player,
                })
                .await;
            }
            ClientMessage::Rejoin { game_id } => {
                self.forward_to_match(state, outbox, &game_id, |player| MatchCommand::Rejoin {
                    player_id: player,
                })
                .await;
            }
        }
    }

    async fn handle_register(
        &self,
        state: &mut ConnState,
        outbox: &mpsc::Sender<ServerMessage>,
        id: String,
        username: String,
        elo: Option<i32>,
    ) {
        let Some(claims) = &state.claims else {
            let _ = outbox
                .send(ServerMessage::Error {
                    message: "NOT_AUTHENTICATED".to_string(),
                })
                .await;
            return;
        };
        if claims.sub != id {
            warn!(claimed = %id, subject = %claims.sub, "register id does not match token subject");
            let _ = outbox
                .send(ServerMessage::Error {
                    message: "NOT_AUTHENTICATED".to_string(),
                })
                .await;
            return;
        }

        let player = PlayerId::new(id);
        // The stored rating is authoritative; the client's value only seeds
        // a brand-new record.
        let seed = PlayerRecord::new(
            player.clone(),
            username,
            elo.unwrap_or(DEFAULT_RATING).max(crate::rating::RATING_FLOOR),
        );
        if let Err(err) = self.players.ensure_player(seed).await {
            error!(error = %err, player = %player, "failed to ensure player record");
            let _ = outbox
                .send(ServerMessage::Error {
                    message: "internal error".to_string(),
                })
                .await;
            return;
        }
        self.ctx.registry.bind(state.handle, player.clone()).await;
        state.player = Some(player);
    }

    async fn handle_matchmaking_start(
        &self,
        state: &ConnState,
        outbox: &mpsc::Sender<ServerMessage>,
    ) {
        let Some(player) = &state.player else {
            let _ = outbox
                .send(ServerMessage::Error {
                    message: "NOT_AUTHENTICATED".to_string(),
                })
                .await;
            return;
        };
        if self.ctx.manager.match_for(player).await.is_some() {
            let _ = outbox
                .send(ServerMessage::Error {
                    message: "already in a match".to_string(),
                })
                .await;
            return;
        }

        let record = match self.players.get_player(player).await {
            Ok(Some(record)) => record,
            Ok(None) => PlayerRecord::new(player.clone(), player.to_string(), DEFAULT_RATING),
            Err(err) => {
                error!(error = %err, player = %player, "rating lookup failed");
                let _ = outbox
                    .send(ServerMessage::Error {
                        message: "internal error".to_string(),
                    })
                    .await;
                return;
            }
        };

        let outcome = self
            .matchmaker
            .enqueue(QueueEntry {
                player_id: player.clone(),
                display_name: record.username,
                rating: record.elo,
                conn: outbox.clone(),
                enqueued_at: Instant::now(),
            })
            .await;
        match outcome {
            EnqueueOutcome::Searching | EnqueueOutcome::AlreadyQueued => {
                let _ = outbox.send(ServerMessage::MatchmakingSearching).await;
            }
        }
    }

    async fn forward_to_match(
        &self,
        state: &ConnState,
        outbox: &mpsc::Sender<ServerMessage>,
        game_id: &str,
        command: impl FnOnce(PlayerId) -> MatchCommand,
    ) {
        let Some(player) = &state.player else {
            let _ = outbox
                .send(ServerMessage::Error {
                    message: "NOT_AUTHENTICATED".to_string(),
                })
                .await;
            return;
        };
        let id = MatchId::new(game_id);
        let delivered = match self.ctx.manager.get(&id).await {
            Some(handle) => handle.send(command(player.clone())).await,
            None => false,
        };
        if !delivered {
            let _ = outbox.send(ServerMessage::NotFound).await;
        }
    }

    /// Turn queue output into matches.
    async fn handle_matchmaking_event(&self, event: MatchmakingEvent) {
        match event {
            MatchmakingEvent::Paired { first, second } => {
                let a = participant(&first);
                let b = participant(&second);
                if let Err(err) = start_human_match(self.ctx.clone(), a, b).await {
                    error!(error = %err, "failed to start match");
                    for entry in [&first, &second] {
                        let _ = entry
                            .conn
                            .send(ServerMessage::Error {
                                message: "internal error".to_string(),
                            })
                            .await;
                    }
                }
            }
            MatchmakingEvent::BotMatch { entry, difficulty } => {
                let human = participant(&entry);
                if let Err(err) = start_bot_match(self.ctx.clone(), human, difficulty).await {
                    error!(error = %err, "failed to start bot match");
                    let _ = entry
                        .conn
                        .send(ServerMessage::Error {
                            message: "internal error".to_string(),
                        })
                        .await;
                }
            }
        }
    }
}

fn participant(entry: &QueueEntry) -> Participant {
    Participant {
        id: entry.player_id.clone(),
        display_name: entry.display_name.clone(),
        rating: entry.rating,
    }
}

/// Pull the bearer token from the handshake: `Authorization: Bearer` header
/// first, then a `token` query parameter.
fn bearer_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get("authorization") {
        if let Ok(text) = value.to_str() {
            if let Some(token) = text.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    req.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            pair.strip_prefix("token=").map(|t| t.to_string())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::auth::AuthConfig;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret-key-256-bits-long!!";

    fn test_dict() -> Arc<Dictionary> {
        Arc::new(
            Dictionary::from_lists(
                ["crane", "slate", "grape", "stone"]
                    .iter()
                    .map(|w| w.to_string())
                    .collect(),
                ["salet", "trace", "crate"]
                    .iter()
                    .map(|w| w.to_string())
                    .collect(),
                ["crane"].iter().map(|w| w.to_string()).collect(),
            )
            .unwrap(),
        )
    }

    fn test_gateway() -> Arc<Gateway> {
        let config = Config {
            auth: AuthConfig {
                secret: Some(SECRET.to_string()),
                skip_expiry: false,
            },
            ..Config::default()
        };
        Arc::new(Gateway::new(config, test_dict()).unwrap())
    }

    fn token_for(sub: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = TokenClaims {
            sub: sub.to_string(),
            exp: now + 3600,
            iat: now,
            name: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    /// Simulate an authenticated connection without a socket.
    async fn fake_conn(
        gateway: &Gateway,
        sub: Option<&str>,
    ) -> (ConnState, mpsc::Sender<ServerMessage>, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(64);
        let handle = gateway.ctx.registry.insert(tx.clone()).await;
        let claims = sub.map(|s| {
            validate_token(&token_for(s), &gateway.config.auth).unwrap()
        });
        (
            ConnState {
                handle,
                claims,
                player: None,
            },
            tx,
            rx,
        )
    }

    async fn register(
        gateway: &Gateway,
        state: &mut ConnState,
        tx: &mpsc::Sender<ServerMessage>,
        id: &str,
    ) {
        gateway
            .dispatch(
                state,
                tx,
                ClientMessage::Register {
                    id: id.to_string(),
                    username: id.to_string(),
                    elo: None,
                },
            )
            .await;
    }

    #[test]
    fn test_unknown_store_scheme_rejected() {
        let config = Config {
            state_store_url: "redis://localhost:6379".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            Gateway::new(config, test_dict()),
            Err(GatewayError::UnsupportedStore(_))
        ));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let req = Request::builder()
            .uri("ws://localhost/play?foo=1&token=abc123")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&req), Some("abc123".to_string()));

        let req = Request::builder()
            .uri("ws://localhost/play")
            .header("authorization", "Bearer xyz789")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&req), Some("xyz789".to_string()));

        let req = Request::builder()
            .uri("ws://localhost/play")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&req), None);
    }

    #[tokio::test]
    async fn test_register_requires_authentication() {
        let gateway = test_gateway();
        let (mut state, tx, mut rx) = fake_conn(&gateway, None).await;
        register(&gateway, &mut state, &tx, "p1").await;

        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::Error { message }) if message == "NOT_AUTHENTICATED"
        ));
        assert!(state.player.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_subject_mismatch() {
        let gateway = test_gateway();
        let (mut state, tx, mut rx) = fake_conn(&gateway, Some("p1")).await;
        register(&gateway, &mut state, &tx, "someone-else").await;

        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::Error { message }) if message == "NOT_AUTHENTICATED"
        ));
    }

    #[tokio::test]
    async fn test_register_binds_identity_and_seeds_record() {
        let gateway = test_gateway();
        let (mut state, tx, _rx) = fake_conn(&gateway, Some("p1")).await;
        register(&gateway, &mut state, &tx, "p1").await;

        assert_eq!(state.player, Some(PlayerId::from("p1")));
        assert!(gateway
            .ctx
            .registry
            .is_connected(&PlayerId::from("p1"))
            .await);
        let record = gateway
            .players
            .get_player(&PlayerId::from("p1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.elo, DEFAULT_RATING);
    }

    #[tokio::test]
    async fn test_matchmaking_requires_registration() {
        let gateway = test_gateway();
        let (mut state, tx, mut rx) = fake_conn(&gateway, Some("p1")).await;
        gateway
            .dispatch(&mut state, &tx, ClientMessage::MatchmakingStart)
            .await;

        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::Error { message }) if message == "NOT_AUTHENTICATED"
        ));
    }

    #[tokio::test]
    async fn test_guess_for_unknown_match_yields_notfound() {
        let gateway = test_gateway();
        let (mut state, tx, mut rx) = fake_conn(&gateway, Some("p1")).await;
        register(&gateway, &mut state, &tx, "p1").await;

        gateway
            .dispatch(
                &mut state,
                &tx,
                ClientMessage::Guess {
                    game_id: "no-such-match".to_string(),
                    guess: "crane".to_string(),
                },
            )
            .await;
        assert!(matches!(rx.recv().await, Some(ServerMessage::NotFound)));
    }

    #[tokio::test]
    async fn test_two_registered_players_pair_into_a_match() {
        let gateway = test_gateway();
        let (mut s1, tx1, mut rx1) = fake_conn(&gateway, Some("p1")).await;
        let (mut s2, tx2, mut rx2) = fake_conn(&gateway, Some("p2")).await;
        register(&gateway, &mut s1, &tx1, "p1").await;
        register(&gateway, &mut s2, &tx2, "p2").await;

        gateway
            .dispatch(&mut s1, &tx1, ClientMessage::MatchmakingStart)
            .await;
        assert!(matches!(
            rx1.recv().await,
            Some(ServerMessage::MatchmakingSearching)
        ));

        gateway
            .dispatch(&mut s2, &tx2, ClientMessage::MatchmakingStart)
            .await;

        // Drive the queue's pairing event by hand (run() normally does it).
        let mut events = gateway.events.lock().await.take().unwrap();
        let event = events.recv().await.unwrap();
        gateway.handle_matchmaking_event(event).await;

        // Skip the searching ack on p2, then both sides get game:start.
        assert!(matches!(
            rx2.recv().await,
            Some(ServerMessage::MatchmakingSearching)
        ));
        assert!(matches!(
            rx1.recv().await,
            Some(ServerMessage::GameStart { .. })
        ));
        assert!(matches!(
            rx2.recv().await,
            Some(ServerMessage::GameStart { .. })
        ));
        assert_eq!(gateway.ctx.manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_clears_queue_entry() {
        let gateway = test_gateway();
        let (mut state, tx, mut rx) = fake_conn(&gateway, Some("p1")).await;
        register(&gateway, &mut state, &tx, "p1").await;

        gateway
            .dispatch(&mut state, &tx, ClientMessage::MatchmakingStart)
            .await;
        let _ = rx.recv().await;
        assert_eq!(gateway.matchmaker.len().await, 1);

        gateway
            .dispatch(&mut state, &tx, ClientMessage::MatchmakingCancel)
            .await;
        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::MatchmakingCancelled)
        ));
        assert!(gateway.matchmaker.is_empty().await);
    }

    #[tokio::test]
    async fn test_connection_closed_cancels_queue_and_notifies_match() {
        let gateway = test_gateway();
        let (mut state, tx, _rx) = fake_conn(&gateway, Some("p1")).await;
        register(&gateway, &mut state, &tx, "p1").await;

        gateway
            .dispatch(&mut state, &tx, ClientMessage::MatchmakingStart)
            .await;
        assert_eq!(gateway.matchmaker.len().await, 1);

        gateway.connection_closed(state).await;
        assert!(gateway.matchmaker.is_empty().await);
        assert!(!gateway
            .ctx
            .registry
            .is_connected(&PlayerId::from("p1"))
            .await);
    }
}
