//! Network Layer
//!
//! WebSocket gateway for real-time play. All game truth lives behind the
//! match engine; this layer authenticates connections, binds identities,
//! and routes events both ways.

pub mod auth;
pub mod protocol;
pub mod registry;
pub mod server;

pub use auth::{validate_token, AuthConfig, AuthError, TokenClaims};
pub use protocol::{ClientMessage, MaskedGuess, OpponentInfo, ServerMessage};
pub use registry::{ConnectionRegistry, HandleId};
pub use server::{Gateway, GatewayError};
