//! Settlement of a finished match into session counters, ratings and
//! pairing records.
//!
//! [`settle`] is pure: it reads the final match state and the current records
//! and returns a [`Settlement`] holding every updated value. Nothing is
//! written until the caller commits the settlement, so a rejected match
//! leaves all state untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::calculate::rating::{apply_delta, match_deltas};
use crate::models::{
    MatchId, PairingKey, PairingRecord, Participant, ParticipantId, SessionCounters, Side,
};
use crate::scoring::MatchState;

/// Reasons a match cannot be settled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettleError {
    #[error("Match {match_id} is not complete ({score_a}-{score_b})")]
    NotComplete {
        match_id: MatchId,
        score_a: u32,
        score_b: u32,
    },

    #[error("Match {match_id} ended level at {score}")]
    Tied { match_id: MatchId, score: u32 },

    #[error("Participant not on the roster: {0}")]
    UnknownParticipant(ParticipantId),
}

/// Everything a completed match changes, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub match_id: MatchId,
    pub winner: Side,

    /// Session counters after the match
    pub counters: SessionCounters,

    /// Updated copies of every participant who played
    pub participants: Vec<Participant>,

    /// Updated (or newly created) records for both pairings
    pub pairings: Vec<PairingRecord>,

    /// Rating change applied to each member of side A and side B
    pub rating_deltas: (i32, i32),
}

impl Settlement {
    /// Write the updated participant and pairing records back into the
    /// caller's collections, adding pairing records that are new.
    pub fn merge_into(&self, roster: &mut [Participant], pairings: &mut Vec<PairingRecord>) {
        for updated in &self.participants {
            if let Some(existing) = roster.iter_mut().find(|p| p.id == updated.id) {
                *existing = updated.clone();
            }
        }
        for updated in &self.pairings {
            match pairings.iter_mut().find(|p| p.key == updated.key) {
                Some(existing) => *existing = updated.clone(),
                None => pairings.push(updated.clone()),
            }
        }
    }
}

fn find_participant<'a>(
    roster: &'a [Participant],
    id: &ParticipantId,
) -> Result<&'a Participant, SettleError> {
    roster
        .iter()
        .find(|p| &p.id == id)
        .ok_or_else(|| SettleError::UnknownParticipant(id.clone()))
}

/// Fold a completed match into new counters and records.
pub fn settle(
    state: &MatchState,
    counters: &SessionCounters,
    roster: &[Participant],
    pairings: &[PairingRecord],
) -> Result<Settlement, SettleError> {
    let score_a = state.score(Side::A);
    let score_b = state.score(Side::B);

    if !state.is_complete() {
        return Err(SettleError::NotComplete {
            match_id: state.id(),
            score_a,
            score_b,
        });
    }
    let winner = state.winner().ok_or(SettleError::Tied {
        match_id: state.id(),
        score: score_a,
    })?;

    let winning = &state.side(winner).pairing;
    let losing = &state.side(winner.other()).pairing;

    let ratings_of = |side: Side| -> Result<Vec<u32>, SettleError> {
        state
            .side(side)
            .pairing
            .members()
            .into_iter()
            .map(|id| find_participant(roster, id).map(|p| p.rating))
            .collect()
    };
    let ratings_a = ratings_of(Side::A)?;
    let ratings_b = ratings_of(Side::B)?;
    let (delta_a, delta_b) = match_deltas(&ratings_a, &ratings_b, winner);

    let mut next = counters.clone();
    let mut participants = Vec::with_capacity(4);
    for side in [Side::A, Side::B] {
        let won = side == winner;
        let delta = match side {
            Side::A => delta_a,
            Side::B => delta_b,
        };
        for id in state.side(side).pairing.members() {
            let mut player = find_participant(roster, id)?.clone();
            next.add_played(id);
            if won {
                next.add_won(id);
                player.wins += 1;
            } else {
                player.losses += 1;
            }
            player.rating = apply_delta(player.rating, delta);
            participants.push(player);
        }
    }

    let existing = |key: &PairingKey| pairings.iter().find(|p| &p.key == key).cloned();
    let mut winner_record =
        existing(&winning.key()).unwrap_or_else(|| PairingRecord::new(winning.clone()));
    let mut loser_record =
        existing(&losing.key()).unwrap_or_else(|| PairingRecord::new(losing.clone()));
    winner_record.wins += 1;
    loser_record.losses += 1;

    next.add_pairing_played(&winner_record.key);
    next.add_pairing_played(&loser_record.key);
    next.add_pairing_won(&winner_record.key);
    next.priority_pick
        .replace(winning.members().into_iter().cloned());

    info!(
        match_id = %state.id(),
        winner = %winner,
        score_a,
        score_b,
        delta_a,
        delta_b,
        "Match settled"
    );

    Ok(Settlement {
        match_id: state.id(),
        winner,
        counters: next,
        participants,
        pairings: vec![winner_record, loser_record],
        rating_deltas: (delta_a, delta_b),
    })
}
