//! Color Feedback
//!
//! Per-letter evaluation of a guess against a target word.
//! Internally a three-valued enum; the literal strings `"green"`,
//! `"yellow"`, `"grey"` appear only at the wire boundary.

use serde::{Deserialize, Serialize};

use crate::WORD_LENGTH;

const ALPHABET_SIZE: usize = 26;

/// Outcome for a single letter position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Letter is in the target at this exact position.
    Green,
    /// Letter occurs in the target at some other, unconsumed position.
    Yellow,
    /// Letter has no remaining occurrence in the target.
    Grey,
}

impl Color {
    /// Compact single-character code used for constraint matching.
    pub fn code(self) -> char {
        match self {
            Color::Green => 'G',
            Color::Yellow => 'Y',
            Color::Grey => 'X',
        }
    }

    /// Parse a single-character code.
    pub fn from_code(c: char) -> Option<Color> {
        match c {
            'G' => Some(Color::Green),
            'Y' => Some(Color::Yellow),
            'X' => Some(Color::Grey),
            _ => None,
        }
    }
}

/// Ordered length-5 color feedback for one guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern(pub [Color; WORD_LENGTH]);

impl Pattern {
    /// Whether every position is green (a winning guess).
    pub fn is_win(&self) -> bool {
        self.0.iter().all(|c| *c == Color::Green)
    }

    /// Five-character code string over {G, Y, X}.
    pub fn code(&self) -> String {
        self.0.iter().map(|c| c.code()).collect()
    }

    /// Parse a five-character code string.
    pub fn from_code(code: &str) -> Option<Pattern> {
        if code.chars().count() != WORD_LENGTH {
            return None;
        }
        let mut colors = [Color::Grey; WORD_LENGTH];
        for (slot, c) in colors.iter_mut().zip(code.chars()) {
            *slot = Color::from_code(c)?;
        }
        Some(Pattern(colors))
    }

    /// Colors as a slice.
    pub fn colors(&self) -> &[Color; WORD_LENGTH] {
        &self.0
    }

    /// Base-3 index of this pattern (0..243), used for entropy bucketing.
    pub fn index(&self) -> usize {
        self.0.iter().fold(0usize, |acc, c| {
            acc * 3
                + match c {
                    Color::Grey => 0,
                    Color::Yellow => 1,
                    Color::Green => 2,
                }
        })
    }
}

/// Evaluate `guess` against `target`.
///
/// First pass: exact position matches are marked green and consume the
/// target letter. Second pass: each remaining guess position is yellow iff
/// some unconsumed target position holds the same letter (consuming the
/// leftmost such occurrence), otherwise grey. Both words must be uppercase
/// ASCII of the fixed length.
pub fn evaluate(guess: &str, target: &str) -> Pattern {
    let guess = guess.as_bytes();
    let target = target.as_bytes();
    debug_assert_eq!(guess.len(), WORD_LENGTH);
    debug_assert_eq!(target.len(), WORD_LENGTH);

    let mut colors = [Color::Grey; WORD_LENGTH];
    let mut leftovers = [0u8; ALPHABET_SIZE];

    for idx in 0..WORD_LENGTH {
        if guess[idx] == target[idx] {
            colors[idx] = Color::Green;
        } else {
            leftovers[letter_index(target[idx])] += 1;
        }
    }

    for idx in 0..WORD_LENGTH {
        if colors[idx] == Color::Green {
            continue;
        }
        let lookup = letter_index(guess[idx]);
        if leftovers[lookup] > 0 {
            colors[idx] = Color::Yellow;
            leftovers[lookup] -= 1;
        }
    }

    Pattern(colors)
}

fn letter_index(letter: u8) -> usize {
    debug_assert!(
        letter.is_ascii_uppercase(),
        "words must be uppercase ASCII"
    );
    (letter - b'A') as usize
}
