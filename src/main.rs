//! Word Duel Game Server
//!
//! Authoritative server for head-to-head speed word duels.

use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use word_duel::config::Config;
use word_duel::network::Gateway;
use word_duel::words::Dictionary;
use word_duel::VERSION;

#[tokio::main]
async fn main() {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Word Duel Server v{}", VERSION);

    let config = Config::from_env();
    if !config.auth.is_configured() {
        info!("AUTH_TOKEN_SECRET unset: connections will stay unauthenticated");
    }

    let dict = match Dictionary::load(&config.data_dir) {
        Ok(dict) => {
            info!(
                answers = dict.answers().len(),
                valid = dict.valid_guesses().len(),
                common = dict.common_words().len(),
                "dictionary loaded"
            );
            Arc::new(dict)
        }
        Err(err) => {
            tracing::error!("Failed to load word lists: {err}");
            std::process::exit(1);
        }
    };

    info!("Starting WebSocket server on port {}", config.port);
    let gateway = match Gateway::new(config, dict) {
        Ok(gateway) => Arc::new(gateway),
        Err(err) => {
            tracing::error!("Failed to build gateway: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = gateway.run().await {
        tracing::error!("Server error: {err}");
    }
}
