//! Skill Ratings
//!
//! ELO math and the transactional coupling to match history. Ratings for a
//! match are derived exclusively from the `rating_at_start` snapshots taken
//! at match creation; intervening rating changes are never observed.

use std::sync::Arc;

use tracing::warn;

use crate::game::state::{now_ms, Match, PlayerId};
use crate::store::{
    HistoryRow, MatchResultWrite, PlayerStore, PlayerUpdate, SlotOutcome, StoreError,
};

/// Base K-factor for human-vs-human matches.
pub const K_BASE: f64 = 32.0;

/// Halved K-factor when the opponent is synthetic.
pub const K_VS_BOT: f64 = 16.0;

/// Logistic scale of the expected-score curve.
const SCALE: f64 = 400.0;

/// Ratings never drop below this.
pub const RATING_FLOOR: i32 = 100;

/// Starting rating for new players.
pub const DEFAULT_RATING: i32 = 1200;

/// Expected score for `rating` against `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / SCALE))
}

/// New rating after a result. `score` is 1.0 for a win, 0.0 for a loss,
/// 0.5 for a draw.
pub fn updated_rating(rating: i32, opponent: i32, score: f64, k: f64) -> i32 {
    let adjusted = f64::from(rating) + k * (score - expected_score(rating, opponent));
    (adjusted.round() as i32).max(RATING_FLOOR)
}

/// Rating movement for one human player, included in the terminal event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingDelta {
    /// Whose rating moved.
    pub player_id: PlayerId,
    /// Signed change.
    pub delta: i32,
    /// Rating after the match.
    pub new_rating: i32,
}

/// Applies finished matches to the persistent store.
pub struct RatingService {
    players: Arc<dyn PlayerStore>,
}

impl RatingService {
    /// Service over a persistent store.
    pub fn new(players: Arc<dyn PlayerStore>) -> Self {
        Self { players }
    }

    /// Commit the rating movements and history row for a finished match.
    ///
    /// The write is atomic in the store; a transient failure is retried
    /// once before propagating.
    pub async fn apply(&self, game: &Match) -> Result<Vec<RatingDelta>, StoreError> {
        let (write, deltas) = build_result(game);
        if let Err(first) = self.players.commit_match_result(&write).await {
            warn!(match_id = %game.id, error = %first, "rating commit failed, retrying once");
            self.players.commit_match_result(&write).await?;
        }
        Ok(deltas)
    }
}

/// Derive the transactional write and the per-player deltas from the
/// match's creation-time rating snapshots.
fn build_result(game: &Match) -> (MatchResultWrite, Vec<RatingDelta>) {
    let [a, b] = &game.players;
    let is_bot_match = a.is_synthetic() || b.is_synthetic();
    let bot_difficulty = a.synthetic_difficulty.or(b.synthetic_difficulty);
    let k = if is_bot_match { K_VS_BOT } else { K_BASE };

    // Order the two sides as (winner, loser); a draw keeps slot order.
    let (win_side, lose_side) = match &game.winner_id {
        Some(winner) if winner == &b.id => (b, a),
        _ => (a, b),
    };
    let is_draw = game.winner_id.is_none();
    let (win_score, lose_score) = if is_draw { (0.5, 0.5) } else { (1.0, 0.0) };

    let win_after = if win_side.is_synthetic() {
        win_side.rating_at_start
    } else {
        updated_rating(
            win_side.rating_at_start,
            lose_side.rating_at_start,
            win_score,
            k,
        )
    };
    let lose_after = if lose_side.is_synthetic() {
        lose_side.rating_at_start
    } else {
        updated_rating(
            lose_side.rating_at_start,
            win_side.rating_at_start,
            lose_score,
            k,
        )
    };

    let mut updates = Vec::new();
    let mut deltas = Vec::new();
    let mut push = |slot: &crate::game::state::PlayerSlot, after: i32, outcome: SlotOutcome| {
        if slot.is_synthetic() {
            return;
        }
        updates.push(PlayerUpdate {
            id: slot.id.clone(),
            new_elo: after,
            outcome,
        });
        deltas.push(RatingDelta {
            player_id: slot.id.clone(),
            delta: after - slot.rating_at_start,
            new_rating: after,
        });
    };
    if is_draw {
        push(win_side, win_after, SlotOutcome::Draw);
        push(lose_side, lose_after, SlotOutcome::Draw);
    } else {
        push(win_side, win_after, SlotOutcome::Win);
        push(lose_side, lose_after, SlotOutcome::Loss);
    }

    let row = HistoryRow {
        match_id: game.id.clone(),
        winner_id: (!is_draw && !win_side.is_synthetic()).then(|| win_side.id.clone()),
        loser_id: (!is_draw && !lose_side.is_synthetic()).then(|| lose_side.id.clone()),
        winner_elo_before: win_side.rating_at_start,
        winner_elo_after: win_after,
        loser_elo_before: lose_side.rating_at_start,
        loser_elo_after: lose_after,
        target_word: game.target.clone(),
        replay_log: game.replay_log.clone(),
        duration_ms: game.duration_ms(),
        is_bot_match,
        bot_difficulty,
        played_at: game.ended_at.unwrap_or_else(now_ms),
    };

    (MatchResultWrite { row, updates }, deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Difficulty;
    use crate::game::state::{EndReason, PlayerSlot};
    use crate::store::MemoryPlayerStore;
    use crate::store::PlayerRecord;

    fn human_match(r1: i32, r2: i32) -> Match {
        Match::new(
            "CRANE",
            PlayerSlot::human(PlayerId::from("p1"), "Alice", r1),
            PlayerSlot::human(PlayerId::from("p2"), "Bob", r2),
        )
    }

    #[test]
    fn test_expected_score_symmetry() {
        assert!((expected_score(1200, 1200) - 0.5).abs() < 1e-9);
        let e = expected_score(1400, 1000);
        assert!((e + expected_score(1000, 1400) - 1.0).abs() < 1e-9);
        assert!(e > 0.9);
    }

    #[test]
    fn test_equal_ratings_win_moves_sixteen() {
        assert_eq!(updated_rating(1200, 1200, 1.0, K_BASE), 1216);
        assert_eq!(updated_rating(1200, 1200, 0.0, K_BASE), 1184);
        assert_eq!(updated_rating(1200, 1200, 0.5, K_BASE), 1200);
    }

    #[test]
    fn test_rating_floor_clamps() {
        assert_eq!(updated_rating(100, 2000, 0.0, K_BASE), RATING_FLOOR);
        assert_eq!(updated_rating(105, 105, 0.0, K_BASE), RATING_FLOOR);
    }

    #[test]
    fn test_rating_sum_is_conserved_within_rounding() {
        for (r1, r2) in [(1200, 1200), (1450, 980), (700, 1650), (1000, 1003)] {
            let w = updated_rating(r1, r2, 1.0, K_BASE);
            let l = updated_rating(r2, r1, 0.0, K_BASE);
            let drift = (w + l) - (r1 + r2);
            assert!(drift.abs() <= 2, "({r1},{r2}) drifted by {drift}");
        }
    }

    #[tokio::test]
    async fn test_apply_human_win() {
        let store = Arc::new(MemoryPlayerStore::new());
        store
            .ensure_player(PlayerRecord::new(PlayerId::from("p1"), "Alice", 1200))
            .await
            .unwrap();
        store
            .ensure_player(PlayerRecord::new(PlayerId::from("p2"), "Bob", 1200))
            .await
            .unwrap();

        let mut game = human_match(1200, 1200);
        game.finish(Some(PlayerId::from("p2")), EndReason::Solved);

        let service = RatingService::new(store.clone());
        let deltas = service.apply(&game).await.unwrap();

        let winner = deltas.iter().find(|d| d.player_id.as_str() == "p2").unwrap();
        let loser = deltas.iter().find(|d| d.player_id.as_str() == "p1").unwrap();
        assert_eq!(winner.new_rating, 1216);
        assert_eq!(winner.delta, 16);
        assert_eq!(loser.new_rating, 1184);
        assert_eq!(loser.delta, -16);

        let row = store.last_row().await.unwrap();
        assert_eq!(row.winner_id, Some(PlayerId::from("p2")));
        assert_eq!(row.loser_id, Some(PlayerId::from("p1")));
        assert_eq!(row.winner_elo_after, 1216);
        assert!(!row.is_bot_match);

        let rec = store.get_player(&PlayerId::from("p2")).await.unwrap().unwrap();
        assert_eq!(rec.elo, 1216);
        assert_eq!(rec.wins, 1);
    }

    #[tokio::test]
    async fn test_apply_draw_keeps_equal_ratings() {
        let store = Arc::new(MemoryPlayerStore::new());
        for (id, name) in [("p1", "Alice"), ("p2", "Bob")] {
            store
                .ensure_player(PlayerRecord::new(PlayerId::from(id), name, 1200))
                .await
                .unwrap();
        }
        let mut game = human_match(1200, 1200);
        game.finish(None, EndReason::OutOfGuesses);

        let service = RatingService::new(store.clone());
        let deltas = service.apply(&game).await.unwrap();
        assert!(deltas.iter().all(|d| d.delta == 0 && d.new_rating == 1200));

        let row = store.last_row().await.unwrap();
        assert_eq!(row.winner_id, None);
        assert_eq!(row.loser_id, None);
    }

    #[tokio::test]
    async fn test_apply_bot_match_moves_only_human_with_half_k() {
        let store = Arc::new(MemoryPlayerStore::new());
        store
            .ensure_player(PlayerRecord::new(PlayerId::from("p1"), "Alice", 1350))
            .await
            .unwrap();

        let mut game = Match::new(
            "CRANE",
            PlayerSlot::human(PlayerId::from("p1"), "Alice", 1350),
            PlayerSlot::synthetic(Difficulty::Hard),
        );
        game.finish(Some(PlayerId::from("p1")), EndReason::Solved);

        let service = RatingService::new(store.clone());
        let deltas = service.apply(&game).await.unwrap();
        assert_eq!(deltas.len(), 1);
        let expected = updated_rating(1350, 1400, 1.0, K_VS_BOT);
        assert_eq!(deltas[0].new_rating, expected);

        let row = store.last_row().await.unwrap();
        assert!(row.is_bot_match);
        assert_eq!(row.bot_difficulty, Some(Difficulty::Hard));
        assert_eq!(row.winner_id, Some(PlayerId::from("p1")));
        // The bot is recorded by a null id with its fixed rating pair.
        assert_eq!(row.loser_id, None);
        assert_eq!(row.loser_elo_before, 1400);
        assert_eq!(row.loser_elo_after, 1400);
    }

    #[tokio::test]
    async fn test_apply_bot_win_records_human_as_loser() {
        let store = Arc::new(MemoryPlayerStore::new());
        store
            .ensure_player(PlayerRecord::new(PlayerId::from("p1"), "Alice", 1350))
            .await
            .unwrap();

        let bot = PlayerSlot::synthetic(Difficulty::Hard);
        let bot_id = bot.id.clone();
        let mut game = Match::new(
            "CRANE",
            PlayerSlot::human(PlayerId::from("p1"), "Alice", 1350),
            bot,
        );
        game.finish(Some(bot_id), EndReason::Solved);

        let service = RatingService::new(store.clone());
        let deltas = service.apply(&game).await.unwrap();
        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].delta < 0);

        let row = store.last_row().await.unwrap();
        assert_eq!(row.winner_id, None);
        assert_eq!(row.loser_id, Some(PlayerId::from("p1")));
        assert_eq!(row.winner_elo_before, 1400);

        let rec = store.get_player(&PlayerId::from("p1")).await.unwrap().unwrap();
        assert_eq!(rec.losses, 1);
    }
}
