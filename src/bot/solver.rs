//! Guess Selection
//!
//! Constraint filtering and entropy maximization. A candidate guess
//! partitions the remaining answers by the color pattern each would
//! produce; the Shannon entropy of that partition measures the expected
//! information gain. Difficulty parameters then blur the optimum into
//! something human-shaped.

use std::collections::HashSet;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::bot::difficulty::{Difficulty, Selection};
use crate::words::{evaluate, Dictionary, Pattern};
use crate::WORD_LENGTH;

/// Pre-computed high-entropy opener words for the non-easy tiers.
pub const OPENERS: [&str; 5] = ["SALET", "CRANE", "SLATE", "TRACE", "CRATE"];

/// Cap on the extra valid-guess words sampled into the scoring pool.
const SAMPLE_POOL: usize = 500;

/// Waste words are sampled from this many top distinct-letter candidates.
const WASTE_POOL: usize = 50;

const PATTERN_SPACE: usize = 243; // 3^5

/// Per-match solver state for one synthetic opponent.
///
/// A value type: [`SolverState::advance`] returns the successor state, the
/// match actor owns the current one.
#[derive(Clone, Debug)]
pub struct SolverState {
    /// Skill tier.
    pub difficulty: Difficulty,
    /// The match's target word, uppercase.
    pub target: String,
    /// Answers still consistent with every constraint.
    pub remaining: Vec<String>,
    /// Ordered (guess, pattern) history.
    pub constraints: Vec<(String, Pattern)>,
    /// Guesses produced so far.
    pub guess_count: u8,
}

impl SolverState {
    /// Fresh state over the full answer list.
    pub fn new(difficulty: Difficulty, target: impl Into<String>, dict: &Dictionary) -> Self {
        Self {
            difficulty,
            target: target.into(),
            remaining: dict.answers().to_vec(),
            constraints: Vec::new(),
            guess_count: 0,
        }
    }

    /// Whether `answer` reproduces every observed pattern.
    pub fn is_consistent(answer: &str, constraints: &[(String, Pattern)]) -> bool {
        constraints
            .iter()
            .all(|(guess, pattern)| evaluate(guess, answer) == *pattern)
    }

    /// Successor state after observing `pattern` for `guess`.
    pub fn advance(&self, guess: &str, pattern: Pattern) -> SolverState {
        let mut constraints = self.constraints.clone();
        constraints.push((guess.to_string(), pattern));
        let remaining = self
            .remaining
            .iter()
            .filter(|answer| evaluate(guess, answer) == pattern)
            .cloned()
            .collect();
        SolverState {
            difficulty: self.difficulty,
            target: self.target.clone(),
            remaining,
            constraints,
            guess_count: self.guess_count + 1,
        }
    }

    /// Select the next guess. Always a member of the valid-guess set.
    pub fn next_guess<R: Rng + ?Sized>(&self, dict: &Dictionary, rng: &mut R) -> String {
        let params = self.difficulty.params();
        let ordinal = self.guess_count + 1;

        // Opening book: easy plays a random common word, everyone else a
        // pre-computed high-entropy opener.
        if ordinal == 1 && self.constraints.is_empty() {
            if self.difficulty == Difficulty::Easy {
                if let Some(word) = dict.common_words().choose(rng) {
                    return word.clone();
                }
            }
            let openers: Vec<&str> = OPENERS
                .iter()
                .copied()
                .filter(|w| dict.is_valid_guess(w))
                .collect();
            if let Some(word) = openers.choose(rng) {
                return word.to_string();
            }
            // Tiny dictionaries may lack every opener.
            return dict.random_answer(rng).to_string();
        }

        let candidates = self.filtered_candidates(dict);
        if candidates.is_empty() {
            // Unreachable when patterns come from the real target; degrade
            // to an arbitrary legal guess rather than stalling the match.
            return dict.random_answer(rng).to_string();
        }

        // Endgame: allowed to solve once the tier's earliest ordinal passes.
        if ordinal >= params.earliest_solve {
            if candidates.len() == 1 {
                return candidates[0].clone();
            }
            if candidates.len() == 2 {
                return candidates
                    .choose(rng)
                    .cloned()
                    .unwrap_or_else(|| candidates[0].clone());
            }
        }

        let chosen = match params.selection {
            Selection::GreedyRandom => candidates
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| candidates[0].clone()),
            Selection::TopN(n) => self.pick_by_entropy(&candidates, n, dict, rng),
        };

        // Hold back an early solve, or occasionally burn a turn anyway.
        let holds_solution = self.remaining.iter().any(|w| *w == chosen);
        let early = ordinal < params.earliest_solve && holds_solution;
        if early || rng.gen::<f64>() < params.waste_chance {
            if let Some(waste) = self.waste_word(dict, rng) {
                return waste;
            }
        }
        chosen
    }

    /// Think-time before submitting, uniform in the tier's window.
    pub fn pacing_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let (lo, hi) = self.difficulty.params().pacing_ms;
        Duration::from_millis(rng.gen_range(lo..=hi))
    }

    /// Remaining answers, narrowed to common words when the tier demands it
    /// (falling back to the full set when the narrowing empties it).
    fn filtered_candidates(&self, dict: &Dictionary) -> Vec<String> {
        if self.difficulty.params().common_filter {
            let filtered: Vec<String> = self
                .remaining
                .iter()
                .filter(|w| dict.is_common(w))
                .cloned()
                .collect();
            if !filtered.is_empty() {
                return filtered;
            }
        }
        self.remaining.clone()
    }

    /// Score a pool of candidates plus sampled valid guesses by noisy
    /// entropy and pick from the top N.
    fn pick_by_entropy<R: Rng + ?Sized>(
        &self,
        candidates: &[String],
        top_n: usize,
        dict: &Dictionary,
        rng: &mut R,
    ) -> String {
        let params = self.difficulty.params();

        let mut pool: Vec<String> = candidates.to_vec();
        let mut seen: HashSet<&str> = candidates.iter().map(String::as_str).collect();
        let sampled: Vec<String> = dict
            .valid_guesses()
            .choose_multiple(rng, SAMPLE_POOL)
            .cloned()
            .collect();
        for word in sampled {
            if !seen.contains(word.as_str()) {
                pool.push(word);
            }
        }
        drop(seen);

        let mut scored: Vec<(f64, String)> = pool
            .into_iter()
            .map(|word| {
                let score =
                    entropy(&word, &self.remaining) + params.noise * (rng.gen::<f64>() - 0.5);
                (score, word)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n.max(1));

        // Post-hoc common-word preference for the tiers that use the filter.
        if params.common_filter {
            let common: Vec<&(f64, String)> =
                scored.iter().filter(|(_, w)| dict.is_common(w)).collect();
            if let Some((_, word)) = common.choose(rng) {
                return word.clone();
            }
        }

        match scored.len() {
            0 => self.remaining[0].clone(),
            1 => scored[0].1.clone(),
            _ => {
                let idx = rng.gen_range(0..scored.len());
                scored[idx].1.clone()
            }
        }
    }

    /// A legal guess that satisfies every constraint, preferring words with
    /// many distinct letters, sampled from the top of that ranking.
    fn waste_word<R: Rng + ?Sized>(&self, dict: &Dictionary, rng: &mut R) -> Option<String> {
        let mut ranked: Vec<(usize, &String)> = dict
            .valid_guesses()
            .iter()
            .filter(|word| Self::is_consistent(word, &self.constraints))
            .map(|word| (distinct_letters(word), word))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.truncate(WASTE_POOL);
        ranked.choose(rng).map(|(_, word)| (*word).clone())
    }
}

/// Shannon entropy (bits) of the pattern partition `guess` induces over
/// `remaining`. Higher means better expected information gain.
pub fn entropy(guess: &str, remaining: &[String]) -> f64 {
    if remaining.is_empty() {
        return 0.0;
    }
    let mut buckets = [0usize; PATTERN_SPACE];
    for answer in remaining {
        buckets[evaluate(guess, answer).index()] += 1;
    }
    let total = remaining.len() as f64;
    buckets.iter().fold(0.0, |acc, count| {
        if *count == 0 {
            acc
        } else {
            let p = *count as f64 / total;
            acc - p * p.log2()
        }
    })
}

fn distinct_letters(word: &str) -> usize {
    debug_assert_eq!(word.len(), WORD_LENGTH);
    let mut seen = [false; 26];
    let mut count = 0;
    for b in word.bytes() {
        let idx = (b - b'A') as usize;
        if !seen[idx] {
            seen[idx] = true;
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn full_dict() -> Dictionary {
        Dictionary::from_lists(
            words(&[
                "crane", "slate", "trace", "crate", "alloy", "apple", "bread", "dream", "stone",
                "shine", "grape", "pride", "salty", "fried",
            ]),
            words(&["salet", "llama", "allot", "dumpy", "eerie"]),
            words(&["crane", "slate", "apple", "bread", "stone"]),
        )
        .unwrap()
    }

    #[test]
    fn test_entropy_zero_for_single_answer() {
        assert_eq!(entropy("CRANE", &words(&["CRANE"])), 0.0);
    }

    #[test]
    fn test_entropy_prefers_discriminating_guess() {
        // SLATE splits {CRANE, STONE, APPLE} into three distinct patterns;
        // a guess sharing no letters cannot split them at all.
        let remaining = words(&["CRANE", "STONE", "APPLE"]);
        assert!(entropy("SLATE", &remaining) > entropy("DUMPY", &remaining));
    }

    #[test]
    fn test_advance_filters_and_keeps_target() {
        let dict = full_dict();
        let state = SolverState::new(Difficulty::Hard, "CRANE", &dict);
        let pattern = evaluate("SLATE", "CRANE");
        let next = state.advance("SLATE", pattern);

        assert_eq!(next.guess_count, 1);
        assert_eq!(next.constraints.len(), 1);
        assert!(next.remaining.iter().any(|w| w == "CRANE"));
        assert!(next.remaining.len() < state.remaining.len());
        for answer in &next.remaining {
            assert_eq!(evaluate("SLATE", answer), pattern);
        }
    }

    #[test]
    fn test_target_survives_full_game_at_every_difficulty() {
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        for difficulty in [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Impossible,
        ] {
            let mut state = SolverState::new(difficulty, "GRAPE", &dict);
            for _ in 0..6 {
                let guess = state.next_guess(&dict, &mut rng);
                assert!(
                    dict.is_valid_guess(&guess),
                    "{difficulty:?} produced illegal guess {guess}"
                );
                state = state.advance(&guess, evaluate(&guess, "GRAPE"));
                assert!(
                    state.remaining.iter().any(|w| w == "GRAPE"),
                    "{difficulty:?} filtered out the target"
                );
                if guess == "GRAPE" {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_first_guess_is_an_opener_for_non_easy() {
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        for difficulty in [Difficulty::Medium, Difficulty::Hard, Difficulty::Impossible] {
            let state = SolverState::new(difficulty, "GRAPE", &dict);
            for _ in 0..20 {
                let guess = state.next_guess(&dict, &mut rng);
                assert!(
                    OPENERS.contains(&guess.as_str()),
                    "{difficulty:?} opened with {guess}"
                );
            }
        }
    }

    #[test]
    fn test_easy_first_guess_is_common() {
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        let state = SolverState::new(Difficulty::Easy, "GRAPE", &dict);
        for _ in 0..20 {
            let guess = state.next_guess(&dict, &mut rng);
            assert!(dict.is_common(&guess), "easy opened with {guess}");
        }
    }

    #[test]
    fn test_impossible_solves_single_candidate_immediately() {
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        let mut state = SolverState::new(Difficulty::Impossible, "GRAPE", &dict);
        // Feed constraints until only GRAPE remains.
        state = state.advance("CRATE", evaluate("CRATE", "GRAPE"));
        state = state.advance("PRIDE", evaluate("PRIDE", "GRAPE"));
        state.remaining.retain(|w| w == "GRAPE");
        assert_eq!(state.next_guess(&dict, &mut rng), "GRAPE");
    }

    #[test]
    fn test_easy_substitutes_waste_before_fourth_guess() {
        // earliest_solve = 4: with the answer already pinned down at guess 2,
        // easy diverts through the waste-word path. The waste pool here is
        // {APPLE, SLATE, STONE}, so repeated trials must surface a word that
        // is not the solution.
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        let mut state = SolverState::new(Difficulty::Easy, "APPLE", &dict);
        state = state.advance("EERIE", evaluate("EERIE", "APPLE"));
        state.remaining.retain(|w| w == "APPLE");

        let mut saw_waste = false;
        for _ in 0..30 {
            let guess = state.next_guess(&dict, &mut rng);
            assert!(dict.is_valid_guess(&guess));
            assert!(SolverState::is_consistent(&guess, &state.constraints));
            if guess != "APPLE" {
                saw_waste = true;
            }
        }
        assert!(saw_waste, "easy never played a waste word");
    }

    #[test]
    fn test_waste_word_satisfies_constraints() {
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        let state = SolverState::new(Difficulty::Easy, "APPLE", &dict)
            .advance("CRANE", evaluate("CRANE", "APPLE"));
        for _ in 0..10 {
            if let Some(waste) = state.waste_word(&dict, &mut rng) {
                assert!(SolverState::is_consistent(&waste, &state.constraints));
            }
        }
    }

    #[test]
    fn test_pacing_within_window() {
        let dict = full_dict();
        let mut rng = rand::thread_rng();
        let state = SolverState::new(Difficulty::Hard, "GRAPE", &dict);
        for _ in 0..50 {
            let delay = state.pacing_delay(&mut rng);
            assert!(delay >= Duration::from_millis(18_000));
            assert!(delay <= Duration::from_millis(22_000));
        }
    }
}
