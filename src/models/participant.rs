//! Participant model - a player on the roster.

use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// A rostered player with cumulative results and rating points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier
    pub id: ParticipantId,

    /// Display name
    pub name: String,

    /// Matches won across all sessions
    #[serde(default)]
    pub wins: u32,

    /// Matches lost across all sessions
    #[serde(default)]
    pub losses: u32,

    /// Rating points, never negative
    #[serde(default)]
    pub rating: u32,
}

impl Participant {
    /// Create a new Participant with a generated id and zeroed counters.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ParticipantId::generate(), name)
    }

    /// Create a Participant for an id owned by the roster store.
    pub fn with_id(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            wins: 0,
            losses: 0,
            rating: 0,
        }
    }

    /// Builder method to set rating points.
    pub fn with_rating(mut self, rating: u32) -> Self {
        self.rating = rating;
        self
    }

    /// Builder method to set the win/loss record.
    pub fn with_record(mut self, wins: u32, losses: u32) -> Self {
        self.wins = wins;
        self.losses = losses;
        self
    }

    /// Total matches played.
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }
}
