//! A single voting session.
//!
//! `Room` holds participants, their votes and the final pick. Everything here
//! is synchronous and free of I/O; locking and notification live in the
//! registry.

use super::error::RoomError;
use crate::types::*;
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    games: Vec<String>,
    participants: HashMap<ParticipantId, Participant>,
    result: Option<String>,
    created_at: DateTime<Utc>,
    /// Bumped by every successful mutation
    version: u64,
}

impl Room {
    /// Create an empty room. `games` is expected to be sanitized and non-empty.
    pub fn new(code: RoomCode, games: Vec<String>) -> Self {
        Self {
            code,
            games,
            participants: HashMap::new(),
            result: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn games(&self) -> &[String] {
        &self.games
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn phase(&self) -> RoomPhase {
        if self.result.is_some() {
            RoomPhase::Finalized
        } else {
            RoomPhase::Collecting
        }
    }

    /// All games followed by the random sentinel
    pub fn vote_options(&self) -> Vec<String> {
        self.games
            .iter()
            .cloned()
            .chain(std::iter::once(RANDOM_OPTION.to_string()))
            .collect()
    }

    /// The room's own spelling of `option`, if it is a valid choice
    fn canonical_option(&self, option: &str) -> Option<&str> {
        if eq_ignore_case(option, RANDOM_OPTION) {
            return Some(RANDOM_OPTION);
        }
        self.games
            .iter()
            .find(|g| eq_ignore_case(g, option))
            .map(String::as_str)
    }

    pub fn is_valid_option(&self, option: &str) -> bool {
        self.canonical_option(option.trim()).is_some()
    }

    pub fn all_voted(&self) -> bool {
        !self.participants.is_empty() && self.participants.values().all(|p| p.has_voted)
    }

    /// Add a participant, or rename an existing one when `id` is already known.
    pub fn join(
        &mut self,
        id: Option<ParticipantId>,
        name: &str,
    ) -> Result<Participant, RoomError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::EmptyName);
        }

        let id = id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ulid::Ulid::new().to_string());

        let participant = self
            .participants
            .entry(id.clone())
            .and_modify(|p| p.name = name.to_string())
            .or_insert_with(|| Participant::new(id, name.to_string()))
            .clone();

        self.version += 1;
        Ok(participant)
    }

    /// Record a participant's single vote. A missing or blank choice counts as random.
    pub fn cast_vote(
        &mut self,
        participant_id: &str,
        choice: Option<&str>,
    ) -> Result<(), RoomError> {
        let choice = choice
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(RANDOM_OPTION);

        let canonical = self
            .canonical_option(choice)
            .ok_or_else(|| RoomError::InvalidOption(choice.to_string()))?
            .to_string();

        let participant = self
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| RoomError::ParticipantNotFound(participant_id.to_string()))?;

        if participant.has_voted {
            return Err(RoomError::AlreadyVoted(participant_id.to_string()));
        }

        participant.vote = Some(canonical);
        participant.has_voted = true;
        self.version += 1;
        Ok(())
    }

    /// Votes per option in vote-option order. Options nobody picked are left out.
    pub fn tally(&self) -> Vec<VoteCount> {
        self.vote_options()
            .into_iter()
            .filter_map(|option| {
                let count = self
                    .participants
                    .values()
                    .filter_map(|p| p.vote.as_deref())
                    .filter(|vote| eq_ignore_case(vote, &option))
                    .count() as u32;
                (count > 0).then_some(VoteCount { option, count })
            })
            .collect()
    }

    /// Pick uniformly among the options with the most votes. A winning random
    /// bucket is replaced by a uniformly chosen game. `None` for an empty tally.
    pub fn resolve<R: Rng + ?Sized>(&self, tally: &[VoteCount], rng: &mut R) -> Option<String> {
        let max = tally.iter().map(|c| c.count).max()?;
        let winners: Vec<&str> = tally
            .iter()
            .filter(|c| c.count == max)
            .map(|c| c.option.as_str())
            .collect();

        let pick = *winners.choose(rng)?;
        if eq_ignore_case(pick, RANDOM_OPTION) {
            self.games.choose(rng).cloned()
        } else {
            Some(pick.to_string())
        }
    }

    /// Fix the room's result once everybody has voted.
    ///
    /// Returns the stored result without touching `rng` when already
    /// finalized, and `None` while votes are outstanding.
    pub fn finalize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&str> {
        if self.result.is_none() {
            if !self.all_voted() {
                return None;
            }
            let tally = self.tally();
            self.result = self.resolve(&tally, rng);
            if self.result.is_some() {
                self.version += 1;
            }
        }
        self.result.as_deref()
    }
}
