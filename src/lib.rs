//! # Word Duel Game Server
//!
//! Authoritative real-time server for head-to-head speed word duels.
//! Two players (or one player plus a synthetic opponent) race to guess the
//! same five-letter target word; the server owns the truth.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WORD DUEL SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  words/        - Answer list, valid-guess set, evaluation    │
//! │  ├── mod.rs    - Dictionary loaded once at startup           │
//! │  └── pattern.rs- Color feedback and the two-pass rule        │
//! │                                                              │
//! │  store/        - Shared state (the coordination point)       │
//! │  ├── memory.rs - TTL'd live-match store + win-claim lock     │
//! │  └── persist.rs- Player records and match history            │
//! │                                                              │
//! │  matchmaking/  - Rating-banded queue with bot fallback       │
//! │  bot/          - Entropy-maximizing synthetic opponent       │
//! │  rating/       - ELO math + transactional result commit      │
//! │                                                              │
//! │  game/         - Match lifecycle                             │
//! │  ├── state.rs  - Match, player slots, replay log             │
//! │  └── engine.rs - Per-match actor: guess pipeline, win race   │
//! │                                                              │
//! │  network/      - WebSocket gateway                           │
//! │  ├── server.rs - Accept loop and message routing             │
//! │  ├── protocol.rs - JSON wire messages                        │
//! │  ├── registry.rs - Player ↔ connection-handle registry       │
//! │  └── auth.rs   - Bearer-token validation                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Guarantee
//!
//! The server generates the target word, validates every guess, computes the
//! per-letter color feedback, and arbitrates the winner under concurrent
//! submissions through an atomic first-writer-wins claim. Information flowing
//! to the opponent is masked: colors and ordinal only, never the word.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod bot;
pub mod config;
pub mod game;
pub mod matchmaking;
pub mod network;
pub mod rating;
pub mod store;
pub mod words;

// Re-export commonly used types
pub use game::state::{Match, MatchId, MatchStatus, PlayerId, PlayerSlot};
pub use words::{Color, Dictionary, Pattern};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed word length for the whole game.
pub const WORD_LENGTH: usize = 5;

/// Maximum guesses per player per match.
pub const MAX_GUESSES: usize = 6;
