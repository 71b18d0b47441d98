//! Match Lifecycle
//!
//! The authoritative match record and the actor that drives it.
//!
//! ## Module Structure
//!
//! - `state`: match record, player slots, guess history, replay log
//! - `engine`: per-match actor, guess pipeline, win arbitration, forfeit,
//!   bot tick scheduling, grace-window handling

pub mod engine;
pub mod state;

// Re-export key types
pub use engine::{
    start_bot_match, start_human_match, EngineContext, MatchCommand, MatchHandle, MatchManager,
    Participant, RejectReason,
};
pub use state::{EndReason, GuessRecord, Match, MatchId, MatchStatus, PlayerId, PlayerSlot};
