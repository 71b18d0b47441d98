//! Match Engine
//!
//! One actor task per match. Every mutation flows through the actor's
//! command channel and the match store's read-modify-write, so guesses,
//! forfeits, bot ticks and grace expirations are processed strictly in
//! sequence per match. Simultaneous correct guesses are arbitrated by the
//! store's first-writer-wins claim regardless of which network path is
//! faster.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::thread_rng;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bot::{Difficulty, SolverState};
use crate::game::state::{EndReason, Match, MatchId, MatchStatus, PlayerId, PlayerSlot};
use crate::network::protocol::{
    GuessView, MaskedGuess, MatchResultKind, OpponentInfo, OpponentSummary, ServerMessage,
};
use crate::network::registry::ConnectionRegistry;
use crate::rating::{RatingDelta, RatingService};
use crate::store::{MatchStore, StoreError};
use crate::words::{evaluate, Dictionary};
use crate::MAX_GUESSES;

/// Why a guess was rejected. Delivered to the originating client only;
/// match state is untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Wrong length or not in the valid-guess set.
    InvalidGuess,
    /// The sender is not a participant of this match.
    NotYourMatch,
    /// The match is finished or its state has expired.
    MatchNotActive,
    /// The sender's guess quota is exhausted.
    NoGuessesRemaining,
}

impl RejectReason {
    /// Machine-readable error code for the wire.
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::InvalidGuess => "INVALID_GUESS",
            RejectReason::NotYourMatch => "NOT_YOUR_MATCH",
            RejectReason::MatchNotActive => "MATCH_NOT_ACTIVE",
            RejectReason::NoGuessesRemaining => "NO_GUESSES_REMAINING",
        }
    }
}

/// Commands accepted by a match actor.
#[derive(Debug)]
pub enum MatchCommand {
    /// A participant submitted a guess.
    Guess {
        /// Who guessed.
        player_id: PlayerId,
        /// The raw word as received.
        word: String,
    },
    /// A participant conceded.
    Forfeit {
        /// Who conceded.
        player_id: PlayerId,
    },
    /// The synthetic opponent's pacing timer fired.
    BotTick,
    /// A participant's last connection handle vanished.
    Disconnect {
        /// Who disconnected.
        player_id: PlayerId,
    },
    /// A participant re-attached within the grace window.
    Rejoin {
        /// Who rejoined.
        player_id: PlayerId,
    },
    /// The disconnect grace window lapsed without a rejoin.
    GraceExpired {
        /// Who never came back.
        player_id: PlayerId,
    },
}

/// Address of a live match actor.
#[derive(Clone)]
pub struct MatchHandle {
    /// The match this actor drives.
    pub id: MatchId,
    tx: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    /// Enqueue a command; false if the actor is gone.
    pub async fn send(&self, command: MatchCommand) -> bool {
        self.tx.send(command).await.is_ok()
    }
}

/// Registry of live match actors, plus the player → match index.
#[derive(Default)]
pub struct MatchManager {
    matches: RwLock<HashMap<MatchId, MatchHandle>>,
    by_player: RwLock<HashMap<PlayerId, MatchId>>,
}

impl MatchManager {
    /// Empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for a match id.
    pub async fn get(&self, id: &MatchId) -> Option<MatchHandle> {
        self.matches.read().await.get(id).cloned()
    }

    /// The match a player is currently in, if any.
    pub async fn match_for(&self, player: &PlayerId) -> Option<MatchHandle> {
        let id = self.by_player.read().await.get(player).cloned()?;
        self.get(&id).await
    }

    /// Number of live actors.
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    /// Whether no matches are live.
    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }

    async fn insert(&self, handle: MatchHandle, humans: &[PlayerId]) {
        self.matches
            .write()
            .await
            .insert(handle.id.clone(), handle.clone());
        let mut by_player = self.by_player.write().await;
        for player in humans {
            by_player.insert(player.clone(), handle.id.clone());
        }
    }

    async fn forget(&self, id: &MatchId, humans: &[PlayerId]) {
        self.matches.write().await.remove(id);
        let mut by_player = self.by_player.write().await;
        for player in humans {
            if by_player.get(player) == Some(id) {
                by_player.remove(player);
            }
        }
    }
}

/// Shared dependencies every match actor runs against.
pub struct EngineContext {
    /// The immutable word lists.
    pub dict: Arc<Dictionary>,
    /// Live match state store — the coordination point.
    pub store: Arc<dyn MatchStore>,
    /// Rating commit service.
    pub rating: Arc<RatingService>,
    /// Connection fan-out.
    pub registry: Arc<ConnectionRegistry>,
    /// Live actor registry.
    pub manager: Arc<MatchManager>,
    /// Disconnect grace window.
    pub grace: Duration,
}

/// A human entering a match.
#[derive(Clone, Debug)]
pub struct Participant {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub display_name: String,
    /// Rating snapshot at match creation.
    pub rating: i32,
}

impl Participant {
    fn into_slot(self) -> PlayerSlot {
        PlayerSlot::human(self.id, self.display_name, self.rating)
    }
}

/// Create and publish a human-vs-human match.
pub async fn start_human_match(
    ctx: Arc<EngineContext>,
    a: Participant,
    b: Participant,
) -> Result<MatchId, StoreError> {
    let target = ctx.dict.random_answer(&mut thread_rng()).to_string();
    let game = Match::new(target, a.into_slot(), b.into_slot());
    spawn_match(ctx, game, None).await
}

/// Create and publish a human-vs-bot match.
pub async fn start_bot_match(
    ctx: Arc<EngineContext>,
    human: Participant,
    difficulty: Difficulty,
) -> Result<MatchId, StoreError> {
    let target = ctx.dict.random_answer(&mut thread_rng()).to_string();
    let game = Match::new(
        target.clone(),
        human.into_slot(),
        PlayerSlot::synthetic(difficulty),
    );
    let solver = SolverState::new(difficulty, target, &ctx.dict);
    spawn_match(ctx, game, Some(solver)).await
}

async fn spawn_match(
    ctx: Arc<EngineContext>,
    game: Match,
    solver: Option<SolverState>,
) -> Result<MatchId, StoreError> {
    ctx.store.save(&game).await?;

    let id = game.id.clone();
    let (tx, rx) = mpsc::channel(32);
    let handle = MatchHandle {
        id: id.clone(),
        tx: tx.clone(),
    };

    let humans: Vec<PlayerId> = game
        .players
        .iter()
        .filter(|s| !s.is_synthetic())
        .map(|s| s.id.clone())
        .collect();
    ctx.manager.insert(handle, &humans).await;

    // Publish game:start to both human sides.
    for slot in &game.players {
        if slot.is_synthetic() {
            continue;
        }
        if let Some(opponent) = game.opponent_of(&slot.id) {
            ctx.registry
                .send_to_player(
                    &slot.id,
                    ServerMessage::GameStart {
                        game_id: id.to_string(),
                        opponent: opponent_info(opponent),
                    },
                )
                .await;
        }
    }

    let bot = solver.map(|solver| {
        let player_id = game
            .players
            .iter()
            .find(|s| s.is_synthetic())
            .map(|s| s.id.clone())
            .unwrap_or_else(|| PlayerId::from("bot:unreachable"));
        BotState {
            player_id,
            solver,
            timer: None,
        }
    });

    info!(match_id = %id, "match started");
    let actor = MatchActor {
        ctx,
        id: id.clone(),
        tx,
        rx,
        humans,
        bot,
        grace_timers: HashMap::new(),
    };
    tokio::spawn(actor.run());

    Ok(id)
}

fn opponent_info(slot: &PlayerSlot) -> OpponentInfo {
    OpponentInfo {
        username: slot.display_name.clone(),
        elo: slot.rating_at_start,
        is_bot: slot.is_synthetic(),
    }
}

struct BotState {
    player_id: PlayerId,
    solver: SolverState,
    timer: Option<JoinHandle<()>>,
}

struct MatchActor {
    ctx: Arc<EngineContext>,
    id: MatchId,
    tx: mpsc::Sender<MatchCommand>,
    rx: mpsc::Receiver<MatchCommand>,
    humans: Vec<PlayerId>,
    bot: Option<BotState>,
    grace_timers: HashMap<PlayerId, JoinHandle<()>>,
}

impl MatchActor {
    async fn run(mut self) {
        self.schedule_bot();

        while let Some(command) = self.rx.recv().await {
            if self.handle_command(command).await {
                // Terminal. Refuse new commands but drain whatever was
                // already queued — a race-losing guess still gets its
                // rejection off the finished state.
                self.rx.close();
                while let Some(left) = self.rx.recv().await {
                    self.handle_command(left).await;
                }
                break;
            }
        }

        self.cleanup().await;
    }

    /// Process one command; true when the match reached a terminal state.
    async fn handle_command(&mut self, command: MatchCommand) -> bool {
        match command {
            MatchCommand::Guess { player_id, word } => {
                self.process_guess(&player_id, &word).await
            }
            MatchCommand::Forfeit { player_id } => {
                self.process_forfeit(&player_id, EndReason::Forfeit).await
            }
            MatchCommand::BotTick => self.process_bot_tick().await,
            MatchCommand::Disconnect { player_id } => {
                self.process_disconnect(&player_id).await;
                false
            }
            MatchCommand::Rejoin { player_id } => {
                self.process_rejoin(&player_id).await;
                false
            }
            MatchCommand::GraceExpired { player_id } => {
                self.process_forfeit(&player_id, EndReason::OpponentLeft)
                    .await
            }
        }
    }

    async fn cleanup(&mut self) {
        if let Some(bot) = &mut self.bot {
            if let Some(timer) = bot.timer.take() {
                timer.abort();
            }
        }
        for (_, timer) in self.grace_timers.drain() {
            timer.abort();
        }
        self.ctx.manager.forget(&self.id, &self.humans).await;
        debug!(match_id = %self.id, "actor stopped");
    }

    /// Load through the store, retrying a transient failure once.
    async fn load(&self) -> Result<Option<Match>, StoreError> {
        match self.ctx.store.load(&self.id).await {
            Ok(game) => Ok(game),
            Err(first) => {
                warn!(match_id = %self.id, error = %first, "store load failed, retrying");
                self.ctx.store.load(&self.id).await
            }
        }
    }

    /// Save through the store, retrying a transient failure once.
    async fn save(&self, game: &Match) -> Result<(), StoreError> {
        match self.ctx.store.save(game).await {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(match_id = %self.id, error = %first, "store save failed, retrying");
                self.ctx.store.save(game).await
            }
        }
    }

    async fn reject(&self, player: &PlayerId, reason: RejectReason) {
        self.ctx
            .registry
            .send_to_player(
                player,
                ServerMessage::GuessInvalid {
                    error: reason.code().to_string(),
                },
            )
            .await;
    }

    async fn internal_error(&self, player: &PlayerId) {
        self.ctx
            .registry
            .send_to_player(
                player,
                ServerMessage::Error {
                    message: "internal error".to_string(),
                },
            )
            .await;
    }

    /// The guess pipeline. Returns true when the match reached a terminal
    /// state.
    async fn process_guess(&mut self, player: &PlayerId, raw_word: &str) -> bool {
        let mut game = match self.load().await {
            Ok(Some(game)) => game,
            Ok(None) => {
                // State hit its TTL out from under a live actor; the match
                // cannot continue, so the actor winds down with it.
                warn!(match_id = %self.id, "match state expired");
                self.ctx
                    .registry
                    .send_to_player(player, ServerMessage::NotFound)
                    .await;
                return true;
            }
            Err(err) => {
                error!(match_id = %self.id, error = %err, "guess aborted on store failure");
                self.internal_error(player).await;
                return false;
            }
        };

        // Validation: originating client only, state untouched.
        if !game.is_active() {
            self.reject(player, RejectReason::MatchNotActive).await;
            return false;
        }
        let Some(slot) = game.slot(player) else {
            self.reject(player, RejectReason::NotYourMatch).await;
            return false;
        };
        if slot.out_of_guesses() {
            self.reject(player, RejectReason::NoGuessesRemaining).await;
            return false;
        }
        let word = raw_word.trim().to_ascii_uppercase();
        if !self.ctx.dict.is_valid_guess(&word) {
            self.reject(player, RejectReason::InvalidGuess).await;
            return false;
        }

        let pattern = evaluate(&word, &game.target);
        let Some(record) = game.record_guess(player, word.clone(), pattern) else {
            self.reject(player, RejectReason::NotYourMatch).await;
            return false;
        };

        let mut terminal = false;
        if pattern.is_win() {
            let winner = self.arbitrate_win(player).await;
            game.finish(Some(winner), EndReason::Solved);
            terminal = true;
        } else if game.all_guesses_used() {
            game.finish(None, EndReason::OutOfGuesses);
            terminal = true;
        }

        if let Err(err) = self.save(&game).await {
            error!(match_id = %self.id, error = %err, "guess aborted: state not persisted");
            self.internal_error(player).await;
            return false;
        }

        // Fan-out: full result to the guesser, masked copy to the opponent.
        // Both emissions complete before the next command is processed.
        self.ctx
            .registry
            .send_to_player(
                player,
                ServerMessage::GuessResult {
                    word: word.clone(),
                    colors: pattern,
                    guess_number: record.ordinal,
                    is_correct: pattern.is_win(),
                    remaining_guesses: (MAX_GUESSES as u8).saturating_sub(record.ordinal),
                },
            )
            .await;
        if let Some(opponent) = game.opponent_of(player) {
            if !opponent.is_synthetic() {
                self.ctx
                    .registry
                    .send_to_player(
                        &opponent.id,
                        ServerMessage::OpponentGuess {
                            colors: pattern,
                            guess_number: record.ordinal,
                        },
                    )
                    .await;
            }
        }

        // Keep the solver in step with whatever the bot side submitted.
        let guessed_by_bot = self
            .bot
            .as_ref()
            .map(|b| &b.player_id == player)
            .unwrap_or(false);
        if guessed_by_bot {
            if let Some(bot) = &mut self.bot {
                bot.solver = bot.solver.advance(&word, pattern);
            }
        }

        if terminal {
            self.finalize(game).await;
            return true;
        }
        self.schedule_bot();
        false
    }

    /// Resolve the winner through the store's first-writer-wins claim. If
    /// another process already claimed, adopt its winner.
    async fn arbitrate_win(&self, player: &PlayerId) -> PlayerId {
        let claimed = match self.ctx.store.try_claim_winner(&self.id, player).await {
            Ok(claimed) => claimed,
            Err(first) => {
                warn!(match_id = %self.id, error = %first, "win claim failed, retrying");
                self.ctx
                    .store
                    .try_claim_winner(&self.id, player)
                    .await
                    .unwrap_or(true)
            }
        };
        if claimed {
            return player.clone();
        }
        match self.ctx.store.read_winner(&self.id).await {
            Ok(Some(claim)) => {
                info!(match_id = %self.id, lost_to = %claim.player_id, "win race lost");
                claim.player_id
            }
            _ => player.clone(),
        }
    }

    async fn process_forfeit(&mut self, player: &PlayerId, reason: EndReason) -> bool {
        let mut game = match self.load().await {
            Ok(Some(game)) if game.is_active() => game,
            Ok(_) => return false,
            Err(err) => {
                error!(match_id = %self.id, error = %err, "forfeit aborted on store failure");
                return false;
            }
        };
        let Some(opponent) = game.opponent_of(player).map(|s| s.id.clone()) else {
            return false;
        };

        game.record_forfeit(player);
        game.finish(Some(opponent), reason);
        if let Err(err) = self.save(&game).await {
            error!(match_id = %self.id, error = %err, "forfeit not persisted");
            return false;
        }
        info!(match_id = %self.id, player = %player, ?reason, "match forfeited");
        self.finalize(game).await;
        true
    }

    async fn process_disconnect(&mut self, player: &PlayerId) {
        // A bot opponent never wins by disconnect: the match stays active
        // for the grace-window rejoin protocol (and ultimately the TTL).
        if self.bot.is_some() {
            debug!(match_id = %self.id, player = %player, "disconnect in bot match ignored");
            return;
        }
        if !self.humans.contains(player) {
            return;
        }
        if let Some(previous) = self.grace_timers.remove(player) {
            previous.abort();
        }
        let tx = self.tx.clone();
        let grace = self.ctx.grace;
        let expired_player = player.clone();
        debug!(match_id = %self.id, player = %player, "grace timer started");
        self.grace_timers.insert(
            player.clone(),
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                let _ = tx
                    .send(MatchCommand::GraceExpired {
                        player_id: expired_player,
                    })
                    .await;
            }),
        );
    }

    async fn process_rejoin(&mut self, player: &PlayerId) {
        if let Some(timer) = self.grace_timers.remove(player) {
            timer.abort();
        }

        let game = match self.load().await {
            Ok(Some(game)) => game,
            Ok(None) => {
                self.ctx
                    .registry
                    .send_to_player(player, ServerMessage::NotFound)
                    .await;
                return;
            }
            Err(err) => {
                error!(match_id = %self.id, error = %err, "rejoin aborted on store failure");
                self.internal_error(player).await;
                return;
            }
        };

        let own = game.slot(player).filter(|_| game.is_active());
        let Some(own) = own else {
            self.ctx
                .registry
                .send_to_player(player, ServerMessage::NotFound)
                .await;
            return;
        };
        let Some(opponent) = game.opponent_of(player) else {
            return;
        };

        let message = ServerMessage::Rejoined {
            game_id: self.id.to_string(),
            guesses: own.guesses.iter().map(GuessView::from).collect(),
            opponent_progress: opponent.guesses.iter().map(MaskedGuess::from).collect(),
            opponent: opponent_info(opponent),
        };
        self.ctx.registry.send_to_player(player, message).await;
        info!(match_id = %self.id, player = %player, "player rejoined");

        // A bot with outstanding guesses picks its schedule back up.
        self.schedule_bot();
    }

    async fn process_bot_tick(&mut self) -> bool {
        let Some(bot) = &mut self.bot else {
            return false;
        };
        bot.timer = None;
        if bot.solver.guess_count >= MAX_GUESSES as u8 {
            return false;
        }
        let word = bot.solver.next_guess(&self.ctx.dict, &mut thread_rng());
        let bot_player = bot.player_id.clone();
        debug!(match_id = %self.id, "bot tick");
        self.process_guess(&bot_player, &word).await
    }

    /// Idempotent: schedules the bot's next pacing timer when a synthetic
    /// opponent still has guesses and no timer is pending.
    fn schedule_bot(&mut self) {
        let Some(bot) = &mut self.bot else {
            return;
        };
        if bot.timer.is_some() || bot.solver.guess_count >= MAX_GUESSES as u8 {
            return;
        }
        let delay = bot.solver.pacing_delay(&mut thread_rng());
        let tx = self.tx.clone();
        bot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(MatchCommand::BotTick).await;
        }));
    }

    /// Terminal path: commit ratings, then emit `game:end` to each human.
    /// A failed rating commit still reports the match as finished with a
    /// zero delta so players are never left suspended.
    async fn finalize(&mut self, game: Match) {
        debug_assert_eq!(game.status, MatchStatus::Finished);

        if let Some(bot) = &mut self.bot {
            if let Some(timer) = bot.timer.take() {
                timer.abort();
            }
        }
        for (_, timer) in self.grace_timers.drain() {
            timer.abort();
        }

        let deltas: Vec<RatingDelta> = match self.ctx.rating.apply(&game).await {
            Ok(deltas) => deltas,
            Err(err) => {
                error!(match_id = %self.id, error = %err, "rating commit failed; reporting zero deltas");
                game.players
                    .iter()
                    .filter(|s| !s.is_synthetic())
                    .map(|s| RatingDelta {
                        player_id: s.id.clone(),
                        delta: 0,
                        new_rating: s.rating_at_start,
                    })
                    .collect()
            }
        };

        let reason = match game.end_reason {
            Some(EndReason::Solved) => "solved",
            Some(EndReason::OutOfGuesses) => "out_of_guesses",
            Some(EndReason::Forfeit) => "forfeit",
            Some(EndReason::OpponentLeft) => "opponent_left",
            None => "solved",
        };

        for slot in &game.players {
            if slot.is_synthetic() {
                continue;
            }
            let result = match &game.winner_id {
                Some(winner) if winner == &slot.id => MatchResultKind::Win,
                Some(_) => MatchResultKind::Loss,
                None => MatchResultKind::Draw,
            };
            let delta = deltas.iter().find(|d| d.player_id == slot.id);
            let opponent = match game.opponent_of(&slot.id) {
                Some(opponent) => opponent,
                None => continue,
            };
            self.ctx
                .registry
                .send_to_player(
                    &slot.id,
                    ServerMessage::GameEnd {
                        game_id: self.id.to_string(),
                        result,
                        reason: reason.to_string(),
                        target_word: game.target.clone(),
                        opponent: OpponentSummary {
                            username: opponent.display_name.clone(),
                            guesses: opponent.guesses.iter().map(GuessView::from).collect(),
                        },
                        my_guesses: slot.guesses.iter().map(GuessView::from).collect(),
                        elo_change: delta.map(|d| d.delta).unwrap_or(0),
                        new_elo: delta
                            .map(|d| d.new_rating)
                            .unwrap_or(slot.rating_at_start),
                    },
                )
                .await;
        }
        info!(match_id = %self.id, winner = ?game.winner_id, reason, "match finished");
    }
}
