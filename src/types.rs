use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomCode = String;
pub type ParticipantId = String;

/// Vote option that defers the pick to a uniformly random game
pub const RANDOM_OPTION: &str = "Random";

/// Games offered when neither the room creator nor the game list supplies any
pub const DEFAULT_GAMES: &[&str] = &[
    "Rocket League",
    "Mario Kart",
    "Overwatch",
    "Minecraft",
    "Stardew Valley",
    "Apex Legends",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    Collecting,
    Finalized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Waiting,
    Voted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub has_voted: bool,
    pub vote: Option<String>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            name,
            has_voted: false,
            vote: None,
        }
    }
}

/// Number of votes recorded for one option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteCount {
    pub option: String,
    pub count: u32,
}

/// Trim, drop blanks and remove case-insensitive duplicates, keeping the first spelling.
/// Falls back to [`DEFAULT_GAMES`] when nothing survives.
pub fn sanitize_games<I, S>(games: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for game in games {
        let game = game.as_ref().trim();
        if game.is_empty() {
            continue;
        }
        if cleaned.iter().any(|g| eq_ignore_case(g, game)) {
            continue;
        }
        cleaned.push(game.to_string());
    }

    if cleaned.is_empty() {
        DEFAULT_GAMES.iter().map(|g| g.to_string()).collect()
    } else {
        cleaned
    }
}

/// Case-insensitive string equality (Unicode-aware)
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
