//! Difficulty Tiers
//!
//! Each tier tunes the solver toward a human-like skill level: how many
//! top-entropy candidates it samples from, whether it sticks to common
//! words, how early it allows itself to solve, how long it pretends to
//! think, and how often it burns a turn on a waste word.

use serde::{Deserialize, Serialize};

/// Bot skill tier. Selected from the queueing player's rating when
/// matchmaking falls back to a synthetic opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Random common-word play, slow pacing.
    Easy,
    /// Entropy play over the top 20, common words preferred.
    Medium,
    /// Entropy play over the top 5, unrestricted vocabulary.
    Hard,
    /// Always the single best-entropy guess, solves at the first chance.
    Impossible,
}

/// How a tier picks among scored candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Ignore the scores; pick uniformly from the candidate answers.
    GreedyRandom,
    /// Keep the N best noisy-entropy scores and pick among them.
    TopN(usize),
}

/// Behavior table for one tier.
#[derive(Clone, Copy, Debug)]
pub struct BotParams {
    /// Candidate selection strategy.
    pub selection: Selection,
    /// Restrict candidate answers to the curated common subset.
    pub common_filter: bool,
    /// Earliest guess ordinal at which the tier allows itself to solve.
    pub earliest_solve: u8,
    /// Inclusive think-time window in milliseconds.
    pub pacing_ms: (u64, u64),
    /// Amplitude of the uniform noise added to entropy scores.
    pub noise: f64,
    /// Probability of burning the turn on a waste word.
    pub waste_chance: f64,
}

const EASY: BotParams = BotParams {
    selection: Selection::GreedyRandom,
    common_filter: true,
    earliest_solve: 4,
    pacing_ms: (30_000, 35_000),
    noise: 0.20,
    waste_chance: 0.20,
};

const MEDIUM: BotParams = BotParams {
    selection: Selection::TopN(20),
    common_filter: true,
    earliest_solve: 3,
    pacing_ms: (22_000, 30_000),
    noise: 0.10,
    waste_chance: 0.10,
};

const HARD: BotParams = BotParams {
    selection: Selection::TopN(5),
    common_filter: false,
    earliest_solve: 2,
    pacing_ms: (18_000, 22_000),
    noise: 0.05,
    waste_chance: 0.0,
};

const IMPOSSIBLE: BotParams = BotParams {
    selection: Selection::TopN(1),
    common_filter: false,
    earliest_solve: 1,
    pacing_ms: (10_000, 20_000),
    noise: 0.0,
    waste_chance: 0.0,
};

impl Difficulty {
    /// Tier for a queueing player's rating.
    pub fn for_rating(rating: i32) -> Self {
        match rating {
            r if r < 900 => Difficulty::Easy,
            r if r < 1200 => Difficulty::Medium,
            r if r < 1500 => Difficulty::Hard,
            _ => Difficulty::Impossible,
        }
    }

    /// Fixed rating the tier plays at (and is rated against).
    pub fn rating(self) -> i32 {
        match self {
            Difficulty::Easy => 800,
            Difficulty::Medium => 1100,
            Difficulty::Hard => 1400,
            Difficulty::Impossible => 1800,
        }
    }

    /// Behavior table for this tier.
    pub fn params(self) -> &'static BotParams {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
            Difficulty::Impossible => &IMPOSSIBLE,
        }
    }

    /// Opponent-facing display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Bot (Easy)",
            Difficulty::Medium => "Bot (Medium)",
            Difficulty::Hard => "Bot (Hard)",
            Difficulty::Impossible => "Bot (Impossible)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bands_select_tier() {
        assert_eq!(Difficulty::for_rating(450), Difficulty::Easy);
        assert_eq!(Difficulty::for_rating(899), Difficulty::Easy);
        assert_eq!(Difficulty::for_rating(900), Difficulty::Medium);
        assert_eq!(Difficulty::for_rating(1199), Difficulty::Medium);
        assert_eq!(Difficulty::for_rating(1200), Difficulty::Hard);
        assert_eq!(Difficulty::for_rating(1350), Difficulty::Hard);
        assert_eq!(Difficulty::for_rating(1499), Difficulty::Hard);
        assert_eq!(Difficulty::for_rating(1500), Difficulty::Impossible);
        assert_eq!(Difficulty::for_rating(2100), Difficulty::Impossible);
    }

    #[test]
    fn test_tier_ratings_match_table() {
        assert_eq!(Difficulty::Easy.rating(), 800);
        assert_eq!(Difficulty::Medium.rating(), 1100);
        assert_eq!(Difficulty::Hard.rating(), 1400);
        assert_eq!(Difficulty::Impossible.rating(), 1800);
    }

    #[test]
    fn test_params_table() {
        let easy = Difficulty::Easy.params();
        assert_eq!(easy.selection, Selection::GreedyRandom);
        assert!(easy.common_filter);
        assert_eq!(easy.earliest_solve, 4);

        let medium = Difficulty::Medium.params();
        assert_eq!(medium.selection, Selection::TopN(20));
        assert!(medium.common_filter);

        let hard = Difficulty::Hard.params();
        assert_eq!(hard.selection, Selection::TopN(5));
        assert!(!hard.common_filter);
        assert_eq!(hard.waste_chance, 0.0);

        let imp = Difficulty::Impossible.params();
        assert_eq!(imp.selection, Selection::TopN(1));
        assert_eq!(imp.earliest_solve, 1);
        assert_eq!(imp.noise, 0.0);
    }

    #[test]
    fn test_serializes_to_lowercase() {
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), "\"easy\"");
        assert_eq!(
            serde_json::to_string(&Difficulty::Impossible).unwrap(),
            "\"impossible\""
        );
    }
}
