//! Session lifecycle: roster, bench, one live match at a time, and the
//! history of finished matches.

pub mod aggregate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::calculate::{session_standings, Standing};
use crate::models::{
    MatchFormat, MatchId, MatchRecord, MatchRules, Pairing, PairingRecord, Participant,
    ParticipantId, RecordId, SessionCounters, SessionId,
};
use crate::scheduler::{FairnessScheduler, Matchup, RandomSource};
use crate::scoring::{MatchError, MatchState};

pub use aggregate::{settle, SettleError, Settlement};

/// Session operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session {0} has ended")]
    Ended(SessionId),

    #[error("Match {0} is still in progress")]
    MatchInProgress(MatchId),

    #[error("No match in progress")]
    NoLiveMatch,

    #[error("Participant {0} is not in this session")]
    NotInSession(ParticipantId),

    #[error("Participant {0} is benched")]
    Benched(ParticipantId),

    #[error("Invalid match: {0}")]
    Match(#[from] MatchError),

    #[error("Settlement failed: {0}")]
    Settle(#[from] SettleError),
}

/// A participant's place in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub participant_id: ParticipantId,

    /// Sitting out; not offered to the scheduler
    #[serde(default)]
    pub benched: bool,
}

/// One meetup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    roster: Vec<RosterEntry>,
    counters: SessionCounters,
    current: Option<MatchState>,
    past_matches: Vec<MatchRecord>,
}

impl Session {
    /// Open a session with an initial roster.
    pub fn new<I>(participants: I) -> Self
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        let mut session = Self {
            id: RecordId::generate(),
            started_at: Utc::now(),
            ended_at: None,
            roster: Vec::new(),
            counters: SessionCounters::new(),
            current: None,
            past_matches: Vec::new(),
        };
        session.enroll(participants);
        info!(session_id = %session.id, players = session.roster.len(), "Session started");
        session
    }

    fn enroll<I>(&mut self, participants: I) -> usize
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        let mut added = 0;
        for id in participants {
            if self.entry(&id).is_some() {
                continue;
            }
            self.counters.register(&id);
            self.roster.push(RosterEntry {
                participant_id: id,
                benched: false,
            });
            added += 1;
        }
        added
    }

    fn entry(&self, id: &ParticipantId) -> Option<&RosterEntry> {
        self.roster.iter().find(|e| &e.participant_id == id)
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            warn!(session_id = %self.id, "Session has ended");
            Err(SessionError::Ended(self.id))
        }
    }

    /// Add participants mid-session. Returns how many were new.
    pub fn add_participants<I>(&mut self, participants: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        self.ensure_active()?;
        let added = self.enroll(participants);
        info!(session_id = %self.id, added, "Participants added");
        Ok(added)
    }

    /// Bench or unbench a participant.
    pub fn set_benched(&mut self, id: &ParticipantId, benched: bool) -> Result<(), SessionError> {
        let entry = self
            .roster
            .iter_mut()
            .find(|e| &e.participant_id == id)
            .ok_or_else(|| SessionError::NotInSession(id.clone()))?;
        entry.benched = benched;
        info!(participant = %id, benched, "Bench status changed");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }

    pub fn past_matches(&self) -> &[MatchRecord] {
        &self.past_matches
    }

    /// Participants available to play, sorted by id.
    pub fn eligible_pool(&self) -> Vec<ParticipantId> {
        let mut pool: Vec<ParticipantId> = self
            .roster
            .iter()
            .filter(|e| !e.benched)
            .map(|e| e.participant_id.clone())
            .collect();
        pool.sort();
        pool
    }

    /// Format the pool allows by default.
    pub fn suggested_format(&self) -> MatchFormat {
        crate::scheduler::suggest_format(self.eligible_pool().len())
    }

    /// Ask the scheduler for the next pairing from the eligible pool.
    pub fn schedule_next<R: RandomSource>(
        &self,
        scheduler: &FairnessScheduler,
        format: MatchFormat,
        rng: &mut R,
    ) -> Option<Matchup> {
        scheduler.schedule(format, &self.eligible_pool(), &self.counters, rng)
    }

    /// Put a match on court. Only one match can be live at a time.
    pub fn start_match(
        &mut self,
        side_a: Pairing,
        side_b: Pairing,
        rules: MatchRules,
    ) -> Result<&mut MatchState, SessionError> {
        self.ensure_active()?;
        if let Some(live) = &self.current {
            warn!(session_id = %self.id, match_id = %live.id(), "Match already in progress");
            return Err(SessionError::MatchInProgress(live.id()));
        }

        for id in side_a.members().into_iter().chain(side_b.members()) {
            match self.entry(id) {
                None => return Err(SessionError::NotInSession(id.clone())),
                Some(entry) if entry.benched => return Err(SessionError::Benched(id.clone())),
                Some(_) => {}
            }
        }

        let state = MatchState::new(side_a, side_b, rules)?;
        Ok(self.current.insert(state))
    }

    /// Start the scheduler's matchup.
    pub fn start_matchup(
        &mut self,
        matchup: Matchup,
        rules: MatchRules,
    ) -> Result<&mut MatchState, SessionError> {
        self.start_match(matchup.side_a, matchup.side_b, rules)
    }

    pub fn current_match(&self) -> Option<&MatchState> {
        self.current.as_ref()
    }

    /// The live match, for scoring commands.
    pub fn current_match_mut(&mut self) -> Option<&mut MatchState> {
        self.current.as_mut()
    }

    /// Settle the live match and archive it.
    ///
    /// The returned settlement carries the updated participant and pairing
    /// records for the caller to persist; the session keeps the counters.
    /// On error the match stays live and nothing changes.
    pub fn finish_match(
        &mut self,
        roster: &[Participant],
        pairings: &[PairingRecord],
    ) -> Result<Settlement, SessionError> {
        let state = self.current.as_ref().ok_or(SessionError::NoLiveMatch)?;
        let settlement = settle(state, &self.counters, roster, pairings)?;
        let record = state.to_record();

        self.counters = settlement.counters.clone();
        self.past_matches.push(record);
        self.current = None;
        Ok(settlement)
    }

    /// Abandon the live match without touching counters.
    pub fn quit_match(&mut self) -> Result<MatchRecord, SessionError> {
        let state = self.current.take().ok_or(SessionError::NoLiveMatch)?;
        let record = state.quit();
        self.past_matches.push(record.clone());
        Ok(record)
    }

    /// Close the session. A match still on court is archived as quit.
    pub fn end_session(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Some(state) = self.current.take() {
            self.past_matches.push(state.quit());
        }
        self.ended_at = Some(Utc::now());
        info!(
            session_id = %self.id,
            matches = self.past_matches.len(),
            "Session ended"
        );
    }

    /// Standings from this session's counters.
    pub fn standings(&self) -> Vec<Standing> {
        session_standings(&self.counters)
    }
}
