//! Pairing model - the one or two participants that make up a match side.

use serde::{Deserialize, Serialize};

use super::{PairingKey, ParticipantId};

/// A match side's membership: a solo entrant or a duo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "members", rename_all = "lowercase")]
pub enum Pairing {
    Solo(ParticipantId),
    Duo(ParticipantId, ParticipantId),
}

impl Pairing {
    /// Build a pairing from a slice of one or two ids.
    pub fn from_ids(ids: &[ParticipantId]) -> Option<Self> {
        match ids {
            [a] => Some(Pairing::Solo(a.clone())),
            [a, b] if a != b => Some(Pairing::Duo(a.clone(), b.clone())),
            _ => None,
        }
    }

    /// Canonical key; the same members always produce the same key.
    pub fn key(&self) -> PairingKey {
        PairingKey::from_members(&self.members())
    }

    /// Members in the order they were placed.
    pub fn members(&self) -> Vec<&ParticipantId> {
        match self {
            Pairing::Solo(a) => vec![a],
            Pairing::Duo(a, b) => vec![a, b],
        }
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        match self {
            Pairing::Solo(a) => a == id,
            Pairing::Duo(a, b) => a == id || b == id,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Pairing::Solo(_) => 1,
            Pairing::Duo(..) => 2,
        }
    }

    pub fn is_duo(&self) -> bool {
        matches!(self, Pairing::Duo(..))
    }

    /// True if the two pairings share any participant.
    pub fn overlaps(&self, other: &Pairing) -> bool {
        self.members().into_iter().any(|m| other.contains(m))
    }
}

/// Aggregate record for a pairing, created the first time it plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    /// Canonical key
    pub key: PairingKey,

    /// Membership, immutable once created
    pub pairing: Pairing,

    /// Matches won together
    #[serde(default)]
    pub wins: u32,

    /// Matches lost together
    #[serde(default)]
    pub losses: u32,
}

impl PairingRecord {
    pub fn new(pairing: Pairing) -> Self {
        Self {
            key: pairing.key(),
            pairing,
            wins: 0,
            losses: 0,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    #[test]
    fn test_duo_key_is_canonical() {
        let ab = Pairing::Duo(id("b"), id("a"));
        let ba = Pairing::Duo(id("a"), id("b"));
        assert_eq!(ab.key(), ba.key());
        assert_eq!(ab.key().as_str(), "a-b");
    }

    #[test]
    fn test_from_ids() {
        assert_eq!(Pairing::from_ids(&[id("a")]), Some(Pairing::Solo(id("a"))));
        assert!(Pairing::from_ids(&[id("a"), id("b")]).unwrap().is_duo());
        assert_eq!(Pairing::from_ids(&[]), None);
        assert_eq!(Pairing::from_ids(&[id("a"), id("a")]), None);
        assert_eq!(Pairing::from_ids(&[id("a"), id("b"), id("c")]), None);
    }

    #[test]
    fn test_overlaps() {
        let ab = Pairing::Duo(id("a"), id("b"));
        let bc = Pairing::Duo(id("b"), id("c"));
        let cd = Pairing::Duo(id("c"), id("d"));
        assert!(ab.overlaps(&bc));
        assert!(!ab.overlaps(&cd));
    }

    #[test]
    fn test_pairing_serialization() {
        let duo = Pairing::Duo(id("a"), id("b"));
        let json = serde_json::to_string(&duo).unwrap();
        assert_eq!(json, r#"{"kind":"duo","members":["a","b"]}"#);
        let back: Pairing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, duo);
    }

    #[test]
    fn test_record_starts_empty() {
        let record = PairingRecord::new(Pairing::Duo(id("x"), id("y")));
        assert_eq!(record.key.as_str(), "x-y");
        assert_eq!(record.games_played(), 0);
    }
}
