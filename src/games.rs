//! Persisted list of selectable games.
//!
//! The list is a plain text file with one game per line. It seeds new rooms
//! when their creator does not bring a list of their own.

use crate::types::{sanitize_games, DEFAULT_GAMES};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Errors that can occur while loading or saving the game list
#[derive(Debug, thiserror::Error)]
pub enum GameListError {
    #[error("failed to write game list {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of candidate games
#[async_trait]
pub trait GameListProvider: Send + Sync {
    /// Ordered, deduplicated (case-insensitive), non-empty list of games
    async fn games(&self) -> Vec<String>;

    /// Replace the list. Returns what was actually stored after sanitizing.
    async fn save_games(&self, games: Vec<String>) -> Result<Vec<String>, GameListError>;
}

fn default_games() -> Vec<String> {
    DEFAULT_GAMES.iter().map(|g| g.to_string()).collect()
}

/// Game list stored in a text file, cached after the first read
pub struct FileGameList {
    path: PathBuf,
    cache: RwLock<Option<Vec<String>>>,
}

impl FileGameList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    async fn write_file(&self, games: &[String]) -> Result<(), GameListError> {
        let to_err = |source: std::io::Error| GameListError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(to_err)?;
        }

        let mut contents = games.join("\n");
        contents.push('\n');
        tokio::fs::write(&self.path, contents).await.map_err(to_err)
    }

    async fn load(&self) -> Vec<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => sanitize_games(contents.lines()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "Game list {} not found, seeding defaults",
                    self.path.display()
                );
                let games = default_games();
                if let Err(e) = self.write_file(&games).await {
                    tracing::warn!("Failed to seed game list: {}", e);
                }
                games
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read game list {}: {}. Using defaults.",
                    self.path.display(),
                    e
                );
                default_games()
            }
        }
    }
}

#[async_trait]
impl GameListProvider for FileGameList {
    async fn games(&self) -> Vec<String> {
        if let Some(games) = self.cache.read().await.as_ref() {
            return games.clone();
        }

        let mut cache = self.cache.write().await;
        // Another caller may have loaded it while we waited for the write lock
        if let Some(games) = cache.as_ref() {
            return games.clone();
        }

        let games = self.load().await;
        *cache = Some(games.clone());
        games
    }

    async fn save_games(&self, games: Vec<String>) -> Result<Vec<String>, GameListError> {
        let cleaned = sanitize_games(games);

        let mut cache = self.cache.write().await;
        self.write_file(&cleaned).await?;
        *cache = Some(cleaned.clone());

        tracing::info!("Saved {} games to {}", cleaned.len(), self.path.display());
        Ok(cleaned)
    }
}
