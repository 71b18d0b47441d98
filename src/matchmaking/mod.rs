//! Matchmaking Queue
//!
//! Rating-indexed queue with a time-expanding tolerance band and a bot
//! fallback. Pairings and bot spawns are emitted as events on a channel
//! consumed by the gateway; the queue itself never touches match state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::bot::Difficulty;
use crate::game::state::PlayerId;
use crate::network::protocol::ServerMessage;

/// A waiting player.
#[derive(Debug)]
pub struct QueueEntry {
    /// Who is waiting.
    pub player_id: PlayerId,
    /// Name carried into the match slot.
    pub display_name: String,
    /// Rating used for banding.
    pub rating: i32,
    /// Connection outbox; used only as a liveness probe here.
    pub conn: mpsc::Sender<ServerMessage>,
    /// When the entry was enqueued.
    pub enqueued_at: Instant,
}

impl QueueEntry {
    fn alive(&self) -> bool {
        !self.conn.is_closed()
    }
}

/// What the queue produced.
#[derive(Debug)]
pub enum MatchmakingEvent {
    /// Two queued players fell inside each other's band.
    Paired {
        /// The longer-waiting side.
        first: QueueEntry,
        /// The matched opponent.
        second: QueueEntry,
    },
    /// The wait budget lapsed; spawn a synthetic opponent.
    BotMatch {
        /// The player that timed out.
        entry: QueueEntry,
        /// Difficulty selected from the player's rating.
        difficulty: Difficulty,
    },
}

/// Outcome of an enqueue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Entry accepted and searching (a pairing may already have been
    /// emitted on the event channel).
    Searching,
    /// The player was already in the queue; nothing changed.
    AlreadyQueued,
}

/// Queue tuning knobs, defaults per the matchmaking protocol.
#[derive(Debug, Clone)]
pub struct MatchmakerConfig {
    /// Tolerance band applied immediately on enqueue.
    pub initial_band: i32,
    /// Band ceiling reached when the wait budget is exhausted.
    pub max_band: i32,
    /// Time over which the band expands, and the bot-spawn deadline.
    pub wait_budget: Duration,
    /// How often the queue rescans.
    pub retry_interval: Duration,
}

impl Default for MatchmakerConfig {
    fn default() -> Self {
        Self {
            initial_band: 100,
            max_band: 400,
            wait_budget: Duration::from_secs(15),
            retry_interval: Duration::from_secs(2),
        }
    }
}

/// The matchmaking queue.
pub struct Matchmaker {
    config: MatchmakerConfig,
    queue: Mutex<Vec<QueueEntry>>,
    events: mpsc::Sender<MatchmakingEvent>,
}

impl Matchmaker {
    /// Build the queue and the event stream its pairings arrive on.
    pub fn new(config: MatchmakerConfig) -> (Arc<Self>, mpsc::Receiver<MatchmakingEvent>) {
        let (events, rx) = mpsc::channel(64);
        (
            Arc::new(Self {
                config,
                queue: Mutex::new(Vec::new()),
                events,
            }),
            rx,
        )
    }

    /// Add a player and immediately attempt a pairing at the initial band.
    pub async fn enqueue(&self, entry: QueueEntry) -> EnqueueOutcome {
        let paired = {
            let mut queue = self.queue.lock().await;
            if queue.iter().any(|e| e.player_id == entry.player_id) {
                return EnqueueOutcome::AlreadyQueued;
            }

            let band = self.config.initial_band;
            match queue
                .iter()
                .position(|e| e.alive() && (e.rating - entry.rating).abs() <= band)
            {
                Some(idx) => {
                    let opponent = queue.remove(idx);
                    Some(MatchmakingEvent::Paired {
                        first: opponent,
                        second: entry,
                    })
                }
                None => {
                    debug!(player = %entry.player_id, rating = entry.rating, "queued for matchmaking");
                    queue.push(entry);
                    None
                }
            }
        };

        if let Some(event) = paired {
            let _ = self.events.send(event).await;
        }
        EnqueueOutcome::Searching
    }

    /// Remove a player's entry and halt its retry schedule.
    pub async fn cancel(&self, player_id: &PlayerId) -> bool {
        let mut queue = self.queue.lock().await;
        let before = queue.len();
        queue.retain(|e| &e.player_id != player_id);
        queue.len() < before
    }

    /// Whether a player is currently queued.
    pub async fn contains(&self, player_id: &PlayerId) -> bool {
        self.queue.lock().await.iter().any(|e| &e.player_id == player_id)
    }

    /// Current queue depth.
    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Run the periodic rescan until the process exits.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.retry_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.scan_once().await;
        }
    }

    /// One rescan pass: drop dead entries, pair whoever's expanded bands
    /// allow, and fall back to bots for entries past the wait budget.
    pub async fn scan_once(&self) {
        let now = Instant::now();
        let mut emitted = Vec::new();

        {
            let mut queue = self.queue.lock().await;
            queue.retain(|e| e.alive());

            // Oldest first: the longest-waiting entry owns the widest band.
            queue.sort_by_key(|e| e.enqueued_at);

            let mut idx = 0;
            while idx < queue.len() {
                let band = self.band_for(now.duration_since(queue[idx].enqueued_at));
                let rating = queue[idx].rating;
                let partner = (idx + 1..queue.len())
                    .find(|&j| (queue[j].rating - rating).abs() <= band);

                if let Some(j) = partner {
                    // Remove the later index first so `idx` stays valid.
                    let second = queue.remove(j);
                    let first = queue.remove(idx);
                    info!(
                        first = %first.player_id,
                        second = %second.player_id,
                        band,
                        "matchmaking pair"
                    );
                    emitted.push(MatchmakingEvent::Paired { first, second });
                } else if now.duration_since(queue[idx].enqueued_at) >= self.config.wait_budget {
                    let entry = queue.remove(idx);
                    let difficulty = Difficulty::for_rating(entry.rating);
                    info!(player = %entry.player_id, ?difficulty, "bot fallback");
                    emitted.push(MatchmakingEvent::BotMatch { entry, difficulty });
                } else {
                    idx += 1;
                }
            }
        }

        for event in emitted {
            let _ = self.events.send(event).await;
        }
    }

    /// Band after `elapsed` in the queue: linear from the initial band to
    /// the ceiling over the wait budget.
    fn band_for(&self, elapsed: Duration) -> i32 {
        let budget = self.config.wait_budget.as_millis().max(1) as f64;
        let frac = (elapsed.as_millis() as f64 / budget).min(1.0);
        let span = f64::from(self.config.max_band - self.config.initial_band);
        self.config.initial_band + (span * frac).round() as i32
    }
}
