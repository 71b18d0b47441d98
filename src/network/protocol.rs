//! Protocol Messages
//!
//! JSON wire format for client-server communication over WebSocket.
//! Event names are the literal `"scope:action"` strings carried in a
//! `type` tag; payload fields are camelCase. Colors cross the wire as
//! `"green"` / `"yellow"` / `"grey"`.

use serde::{Deserialize, Serialize};

use crate::game::state::GuessRecord;
use crate::words::Pattern;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Bind this connection to an identity (authenticated at handshake).
    #[serde(rename = "register", rename_all = "camelCase")]
    Register {
        /// Player id; must match the authenticated subject.
        id: String,
        /// Display name.
        username: String,
        /// Client's view of its rating; used only to seed a brand-new
        /// record, the server's stored rating is authoritative.
        #[serde(default)]
        elo: Option<i32>,
    },

    /// Enter the matchmaking queue.
    #[serde(rename = "matchmaking:start")]
    MatchmakingStart,

    /// Leave the matchmaking queue.
    #[serde(rename = "matchmaking:cancel")]
    MatchmakingCancel,

    /// Submit a guess. Case-insensitive five-letter string.
    #[serde(rename = "game:guess", rename_all = "camelCase")]
    Guess {
        /// Which match.
        game_id: String,
        /// The guessed word.
        guess: String,
    },

    /// Concede the match.
    #[serde(rename = "game:forfeit", rename_all = "camelCase")]
    Forfeit {
        /// Which match.
        game_id: String,
    },

    /// Re-attach to an active match after reconnecting.
    #[serde(rename = "game:rejoin", rename_all = "camelCase")]
    Rejoin {
        /// Which match.
        game_id: String,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Opponent identity shown at match start and on rejoin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentInfo {
    /// Display name.
    pub username: String,
    /// Rating at match start.
    pub elo: i32,
    /// Whether the opponent is synthetic.
    pub is_bot: bool,
}

/// One fully visible guess (the player's own, or anyone's after the end).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessView {
    /// The word.
    pub word: String,
    /// Per-letter feedback.
    pub colors: Pattern,
    /// 1-based ordinal.
    pub guess_number: u8,
}

impl From<&GuessRecord> for GuessView {
    fn from(record: &GuessRecord) -> Self {
        Self {
            word: record.word.clone(),
            colors: record.evaluation,
            guess_number: record.ordinal,
        }
    }
}

/// The opponent-facing projection of a guess: colors and ordinal only.
/// The word must never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedGuess {
    /// Per-letter feedback.
    pub colors: Pattern,
    /// 1-based ordinal.
    pub guess_number: u8,
}

impl From<&GuessRecord> for MaskedGuess {
    fn from(record: &GuessRecord) -> Self {
        Self {
            colors: record.evaluation,
            guess_number: record.ordinal,
        }
    }
}

/// Per-player outcome in the terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResultKind {
    /// This player won.
    Win,
    /// This player lost.
    Loss,
    /// Neither side solved it.
    Draw,
}

/// Opponent summary revealed with the terminal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentSummary {
    /// Display name.
    pub username: String,
    /// Their guesses, revealed now that the match is over.
    pub guesses: Vec<GuessView>,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Queued and searching for an opponent.
    #[serde(rename = "matchmaking:searching")]
    MatchmakingSearching,

    /// Queue entry removed on request.
    #[serde(rename = "matchmaking:cancelled")]
    MatchmakingCancelled,

    /// The match is live.
    #[serde(rename = "game:start", rename_all = "camelCase")]
    GameStart {
        /// Match id for subsequent guesses.
        game_id: String,
        /// Who you are playing.
        opponent: OpponentInfo,
    },

    /// Full feedback for the submitting player's own guess.
    #[serde(rename = "game:guess:result", rename_all = "camelCase")]
    GuessResult {
        /// The guessed word, normalized uppercase.
        word: String,
        /// Per-letter feedback.
        colors: Pattern,
        /// 1-based ordinal.
        guess_number: u8,
        /// Whether the guess solved the target.
        is_correct: bool,
        /// Guesses left in the quota.
        remaining_guesses: u8,
    },

    /// A guess was rejected; match state is untouched.
    #[serde(rename = "game:guess:invalid")]
    GuessInvalid {
        /// Machine-readable error code.
        error: String,
    },

    /// The opponent guessed; masked view.
    #[serde(rename = "game:opponent:guess", rename_all = "camelCase")]
    OpponentGuess {
        /// Per-letter feedback, without the word.
        colors: Pattern,
        /// 1-based ordinal.
        guess_number: u8,
    },

    /// Re-attachment accepted; full own history plus masked opponent view.
    #[serde(rename = "game:rejoined", rename_all = "camelCase")]
    Rejoined {
        /// Match id.
        game_id: String,
        /// The player's own guesses, in full.
        guesses: Vec<GuessView>,
        /// Opponent progress, colors only.
        opponent_progress: Vec<MaskedGuess>,
        /// Who you are playing.
        opponent: OpponentInfo,
    },

    /// The referenced match does not exist (or has expired).
    #[serde(rename = "game:notfound")]
    NotFound,

    /// Terminal event.
    #[serde(rename = "game:end", rename_all = "camelCase")]
    GameEnd {
        /// Match id.
        game_id: String,
        /// This player's outcome.
        result: MatchResultKind,
        /// Why the match ended.
        reason: String,
        /// The secret word, revealed.
        target_word: String,
        /// The opponent, with guesses revealed.
        opponent: OpponentSummary,
        /// This player's own guesses.
        my_guesses: Vec<GuessView>,
        /// Signed rating change (zero when the commit failed or the match
        /// was a draw between equals).
        elo_change: i32,
        /// Rating after the match.
        new_elo: i32,
    },

    /// Generic error.
    #[serde(rename = "error")]
    Error {
        /// Human-readable message.
        message: String,
    },
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
