//! Finished match records kept in a session's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, MatchRules, Pairing, Side};

/// How a match left the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Played to completion with a winner
    Completed { winner: Side },
    /// Abandoned before completion; counters were not touched
    Quit,
}

/// A match that is no longer live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub rules: MatchRules,
    pub side_a: Pairing,
    pub side_b: Pairing,
    pub score_a: u32,
    pub score_b: u32,
    /// Point-by-point sequence of scoring sides
    pub points: Vec<Side>,
    pub outcome: MatchOutcome,
    /// When the record was created
    pub finished_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn winner(&self) -> Option<Side> {
        match self.outcome {
            MatchOutcome::Completed { winner } => Some(winner),
            MatchOutcome::Quit => None,
        }
    }

    pub fn pairing(&self, side: Side) -> &Pairing {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}
