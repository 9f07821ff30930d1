//! Server configuration loaded from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GAMES_FILE: &str = "data/games.txt";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_BROADCAST_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub addr: SocketAddr,
    /// Text file holding the selectable games
    pub games_file: PathBuf,
    /// Directory served for any unmatched path
    pub static_dir: PathBuf,
    /// Buffered room updates per WebSocket before it starts skipping
    pub broadcast_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            games_file: PathBuf::from(DEFAULT_GAMES_FILE),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

/// Read and parse an env var, warning and falling back when it is malformed
fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
            None
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            addr: parse_env("GAMEVOTE_ADDR").unwrap_or(defaults.addr),
            games_file: parse_env("GAMEVOTE_GAMES_FILE").unwrap_or(defaults.games_file),
            static_dir: parse_env("GAMEVOTE_STATIC_DIR").unwrap_or(defaults.static_dir),
            broadcast_capacity: parse_env::<usize>("GAMEVOTE_BROADCAST_CAPACITY")
                .filter(|c| *c > 0)
                .unwrap_or(defaults.broadcast_capacity),
        };

        tracing::info!(
            addr = %config.addr,
            games_file = %config.games_file.display(),
            static_dir = %config.static_dir.display(),
            broadcast_capacity = config.broadcast_capacity,
            "Server config loaded"
        );

        config
    }
}
