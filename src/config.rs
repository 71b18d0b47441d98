//! Server Configuration
//!
//! Everything is environment-driven with defaults suitable for local
//! development. The two store URLs select backends; `memory://` is the
//! built-in scheme.

use std::path::PathBuf;
use std::time::Duration;

use crate::network::auth::AuthConfig;

/// Full server configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// TCP port the WebSocket listener binds.
    pub port: u16,
    /// Bearer-token validation settings.
    pub auth: AuthConfig,
    /// Backend for live match state.
    pub state_store_url: String,
    /// Backend for player records and history.
    pub persistent_store_url: String,
    /// Matchmaking wait budget before the bot fallback.
    pub matchmaking_wait_budget: Duration,
    /// Tolerance band applied immediately on enqueue.
    pub initial_band: i32,
    /// Band ceiling reached at the end of the wait budget.
    pub max_band: i32,
    /// Disconnect grace window before a human-vs-human forfeit.
    pub disconnect_grace: Duration,
    /// Directory holding the word-list JSON files.
    pub data_dir: PathBuf,
    /// Time-to-live for live match state; guesses after expiry are
    /// rejected.
    pub match_ttl: Duration,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            auth: AuthConfig::default(),
            state_store_url: "memory://".to_string(),
            persistent_store_url: "memory://".to_string(),
            matchmaking_wait_budget: Duration::from_millis(15_000),
            initial_band: 100,
            max_band: 400,
            disconnect_grace: Duration::from_millis(10_000),
            data_dir: PathBuf::from("data"),
            match_ttl: Duration::from_secs(60 * 60),
            max_connections: 1000,
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("SERVER_PORT", defaults.port),
            auth: AuthConfig::from_env(),
            state_store_url: std::env::var("STATE_STORE_URL")
                .unwrap_or(defaults.state_store_url),
            persistent_store_url: std::env::var("PERSISTENT_STORE_URL")
                .unwrap_or(defaults.persistent_store_url),
            matchmaking_wait_budget: env_ms(
                "MATCHMAKING_WAIT_BUDGET_MS",
                defaults.matchmaking_wait_budget,
            ),
            initial_band: env_parse("INITIAL_BAND", defaults.initial_band),
            max_band: env_parse("MAX_BAND", defaults.max_band),
            disconnect_grace: env_ms("DISCONNECT_GRACE_MS", defaults.disconnect_grace),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            match_ttl: env_ms("MATCH_TTL_MS", defaults.match_ttl),
            max_connections: env_parse("MAX_CONNECTIONS", defaults.max_connections),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_ms(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
