//! Per-session play counters and the priority pick set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{PairingKey, ParticipantId};

/// Largest number of participants kept as priority picks.
pub const PRIORITY_PICK_CAPACITY: usize = 2;

/// The most recent winners, separated by the scheduler next round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityPick(Vec<ParticipantId>);

impl PriorityPick {
    /// Replace the picks. Duplicates are dropped and the set is capped.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        self.0.clear();
        for id in ids {
            if self.0.len() == PRIORITY_PICK_CAPACITY {
                break;
            }
            if !self.0.contains(&id) {
                self.0.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.0
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Games played/won in a session, by participant and by pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    #[serde(default)]
    pub games_played_per_participant: BTreeMap<ParticipantId, u32>,

    #[serde(default)]
    pub games_won_per_participant: BTreeMap<ParticipantId, u32>,

    #[serde(default)]
    pub games_played_per_pairing: BTreeMap<PairingKey, u32>,

    #[serde(default)]
    pub games_won_per_pairing: BTreeMap<PairingKey, u32>,

    #[serde(default)]
    pub priority_pick: PriorityPick,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a participant at zero if not already tracked.
    pub fn register(&mut self, id: &ParticipantId) {
        self.games_played_per_participant
            .entry(id.clone())
            .or_insert(0);
        self.games_won_per_participant.entry(id.clone()).or_insert(0);
    }

    /// Games played by a participant; unknown ids count as 0.
    pub fn played(&self, id: &ParticipantId) -> u32 {
        self.games_played_per_participant
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn won(&self, id: &ParticipantId) -> u32 {
        self.games_won_per_participant.get(id).copied().unwrap_or(0)
    }

    /// Games played by a pairing; pairings that never played count as 0.
    pub fn pairing_played(&self, key: &PairingKey) -> u32 {
        self.games_played_per_pairing.get(key).copied().unwrap_or(0)
    }

    pub fn pairing_won(&self, key: &PairingKey) -> u32 {
        self.games_won_per_pairing.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn add_played(&mut self, id: &ParticipantId) {
        *self
            .games_played_per_participant
            .entry(id.clone())
            .or_insert(0) += 1;
    }

    pub(crate) fn add_won(&mut self, id: &ParticipantId) {
        *self
            .games_won_per_participant
            .entry(id.clone())
            .or_insert(0) += 1;
    }

    pub(crate) fn add_pairing_played(&mut self, key: &PairingKey) {
        *self
            .games_played_per_pairing
            .entry(key.clone())
            .or_insert(0) += 1;
    }

    pub(crate) fn add_pairing_won(&mut self, key: &PairingKey) {
        *self.games_won_per_pairing.entry(key.clone()).or_insert(0) += 1;
    }

    /// Spread between the most and least played of the given participants.
    pub fn play_spread<'a, I>(&self, ids: I) -> u32
    where
        I: IntoIterator<Item = &'a ParticipantId>,
    {
        let counts: Vec<u32> = ids.into_iter().map(|id| self.played(id)).collect();
        match (counts.iter().max(), counts.iter().min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        }
    }
}
