//! Live match state machine.
//!
//! A [`MatchState`] owns one in-progress match: both scores, the serving side,
//! per-side court positions and the point history with undo/redo. Commands that
//! cannot apply (scoring a finished match, undoing an empty history) are no-ops
//! that return `false`, so a UI can issue them freely.
//!
//! Completion is a function of the scores and is re-evaluated after every
//! mutation, undo included: undoing the winning point puts the match back in
//! play.

pub mod stack;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    MatchFormat, MatchId, MatchOutcome, MatchRecord, MatchRules, Pairing, RecordId, RulesError,
    Side,
};

pub use stack::ActionStack;

/// Errors raised when setting up a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("Invalid rules: {0}")]
    Rules(#[from] RulesError),

    #[error("A participant cannot play on both sides")]
    OverlappingSides,

    #[error("{format} needs {expected} player(s) per side, side {side} has {actual}")]
    WrongSideSize {
        format: MatchFormat,
        side: Side,
        expected: usize,
        actual: usize,
    },
}

/// Whether the match is still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    InProgress,
    Complete,
}

/// Half of the court the server stands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCourt {
    /// Even score
    Right,
    /// Odd score
    Left,
}

impl ServiceCourt {
    pub fn for_score(score: u32) -> Self {
        if score % 2 == 0 {
            ServiceCourt::Right
        } else {
            ServiceCourt::Left
        }
    }
}

/// A recorded point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
    pub side: Side,
    /// Service changed hands on this point
    pub side_out: bool,
}

/// One side of a live match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSide {
    pub pairing: Pairing,
    pub score: u32,
    /// The two occupants have swapped ends relative to where they started
    pub court_swapped: bool,
}

impl MatchSide {
    fn new(pairing: Pairing) -> Self {
        Self {
            pairing,
            score: 0,
            court_swapped: false,
        }
    }
}

/// Completion predicate: the ceiling ends the match outright, the goal needs
/// a two point lead.
pub fn is_match_complete(score_a: u32, score_b: u32, rules: &MatchRules) -> bool {
    let high = score_a.max(score_b);
    high >= rules.point_ceiling || (high >= rules.point_goal && score_a.abs_diff(score_b) >= 2)
}

/// The state of one match in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    id: MatchId,
    rules: MatchRules,
    side_a: MatchSide,
    side_b: MatchSide,
    server: Side,
    initial_server: Side,
    teams_swapped: bool,
    history: ActionStack<PointEvent>,
    redo: ActionStack<PointEvent>,
    status: MatchStatus,
}

impl MatchState {
    /// Start a match with side A serving.
    pub fn new(side_a: Pairing, side_b: Pairing, rules: MatchRules) -> Result<Self, MatchError> {
        rules.validate()?;
        if side_a.overlaps(&side_b) {
            return Err(MatchError::OverlappingSides);
        }
        let expected = rules.format.seats_per_side();
        for (side, pairing) in [(Side::A, &side_a), (Side::B, &side_b)] {
            if pairing.len() != expected {
                return Err(MatchError::WrongSideSize {
                    format: rules.format,
                    side,
                    expected,
                    actual: pairing.len(),
                });
            }
        }

        // No legal sequence reaches this: play stops at the ceiling.
        let capacity = rules.point_ceiling as usize * 2;
        let state = Self {
            id: RecordId::generate(),
            rules,
            side_a: MatchSide::new(side_a),
            side_b: MatchSide::new(side_b),
            server: Side::A,
            initial_server: Side::A,
            teams_swapped: false,
            history: ActionStack::with_capacity(capacity),
            redo: ActionStack::with_capacity(capacity),
            status: MatchStatus::InProgress,
        };

        info!(
            match_id = %state.id,
            side_a = %state.side_a.pairing.key(),
            side_b = %state.side_b.pairing.key(),
            point_goal = rules.point_goal,
            point_ceiling = rules.point_ceiling,
            "Match started"
        );
        Ok(state)
    }

    /// Builder method to pick the opening server.
    pub fn with_server(mut self, server: Side) -> Self {
        self.server = server;
        self.initial_server = server;
        self
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn side(&self, side: Side) -> &MatchSide {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut MatchSide {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    pub fn score(&self, side: Side) -> u32 {
        self.side(side).score
    }

    pub fn server(&self) -> Side {
        self.server
    }

    pub fn initial_server(&self) -> Side {
        self.initial_server
    }

    pub fn teams_swapped(&self) -> bool {
        self.teams_swapped
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == MatchStatus::Complete
    }

    pub fn history(&self) -> &ActionStack<PointEvent> {
        &self.history
    }

    pub fn redo_buffer(&self) -> &ActionStack<PointEvent> {
        &self.redo
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty() && !self.is_complete()
    }

    /// Leading side once complete.
    pub fn winner(&self) -> Option<Side> {
        if !self.is_complete() {
            return None;
        }
        match self.side_a.score.cmp(&self.side_b.score) {
            std::cmp::Ordering::Greater => Some(Side::A),
            std::cmp::Ordering::Less => Some(Side::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Where the server stands, from the serving side's own score.
    pub fn service_court(&self) -> ServiceCourt {
        ServiceCourt::for_score(self.score(self.server))
    }

    /// Side shown on the left of the court.
    pub fn left_side(&self) -> Side {
        if self.teams_swapped {
            Side::B
        } else {
            Side::A
        }
    }

    /// Record a point for `side`.
    pub fn score_point(&mut self, side: Side) -> bool {
        if self.is_complete() {
            debug!(match_id = %self.id, side = %side, "Point ignored, match complete");
            return false;
        }
        if !self.apply_point(side) {
            return false;
        }
        self.redo.clear();
        true
    }

    /// Take back the most recent point.
    pub fn undo(&mut self) -> bool {
        let Some(last) = self.history.pop() else {
            return false;
        };

        let side = self.side_mut(last.side);
        debug_assert!(side.score > 0, "undo would make a score negative");
        side.score = side.score.saturating_sub(1);
        if last.side_out {
            side.court_swapped = !side.court_swapped;
        }

        self.server = self
            .history
            .last()
            .map(|event| event.side)
            .unwrap_or(self.initial_server);
        self.redo.push(last);

        debug!(match_id = %self.id, side = %last.side, "Point undone");
        self.refresh_status();
        true
    }

    /// Replay the most recently undone point.
    pub fn redo(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        let Some(event) = self.redo.pop() else {
            return false;
        };
        debug!(match_id = %self.id, side = %event.side, "Point redone");
        self.apply_point(event.side)
    }

    /// Mirror the teams left/right. The server label flips with them so the
    /// shuttle stays on the same half of the court.
    pub fn swap_sides(&mut self) {
        self.teams_swapped = !self.teams_swapped;
        self.server = self.server.other();
        debug!(match_id = %self.id, teams_swapped = self.teams_swapped, "Sides swapped");
    }

    /// Hand the serve to the other side without scoring, e.g. to fix the
    /// opening server.
    pub fn swap_server(&mut self) {
        self.server = self.server.other();
        debug!(match_id = %self.id, server = %self.server, "Server swapped");
    }

    fn apply_point(&mut self, side: Side) -> bool {
        if self.history.is_empty() {
            self.initial_server = self.server;
        }

        let side_out = side != self.server;
        if !self.history.push(PointEvent { side, side_out }) {
            debug_assert!(false, "point history exceeded its capacity");
            return false;
        }

        let scoring = self.side_mut(side);
        scoring.score += 1;
        if side_out {
            scoring.court_swapped = !scoring.court_swapped;
            self.server = side;
        }

        debug!(
            match_id = %self.id,
            side = %side,
            score_a = self.side_a.score,
            score_b = self.side_b.score,
            "Point scored"
        );
        self.refresh_status();
        true
    }

    fn refresh_status(&mut self) {
        debug_assert!(self.is_consistent(), "scores diverged from point history");

        let complete = is_match_complete(self.side_a.score, self.side_b.score, &self.rules);
        let status = if complete {
            MatchStatus::Complete
        } else {
            MatchStatus::InProgress
        };

        if status != self.status {
            info!(
                match_id = %self.id,
                score_a = self.side_a.score,
                score_b = self.side_b.score,
                status = ?status,
                "Match status changed"
            );
        }
        self.status = status;
    }

    /// Each side's score equals its number of points in the history.
    pub fn is_consistent(&self) -> bool {
        let count = |side: Side| self.history.iter().filter(|e| e.side == side).count();
        count(Side::A) == self.side_a.score as usize && count(Side::B) == self.side_b.score as usize
    }

    /// Plain view for rendering.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            id: self.id,
            side_a: self.side_a.clone(),
            side_b: self.side_b.clone(),
            server: self.server,
            service_court: self.service_court(),
            left_side: self.left_side(),
            teams_swapped: self.teams_swapped,
            status: self.status,
            winner: self.winner(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Archive the match. Complete matches carry their winner; anything else
    /// is recorded as quit.
    pub fn to_record(&self) -> MatchRecord {
        let outcome = match self.winner() {
            Some(winner) => MatchOutcome::Completed { winner },
            None => MatchOutcome::Quit,
        };
        self.record(outcome)
    }

    /// Archive the match as abandoned, whatever the score.
    pub fn quit(&self) -> MatchRecord {
        info!(
            match_id = %self.id,
            score_a = self.side_a.score,
            score_b = self.side_b.score,
            "Match quit"
        );
        self.record(MatchOutcome::Quit)
    }

    fn record(&self, outcome: MatchOutcome) -> MatchRecord {
        MatchRecord {
            id: self.id,
            rules: self.rules,
            side_a: self.side_a.pairing.clone(),
            side_b: self.side_b.pairing.clone(),
            score_a: self.side_a.score,
            score_b: self.side_b.score,
            points: self.history.iter().map(|e| e.side).collect(),
            outcome,
            finished_at: Utc::now(),
        }
    }
}

/// Read-only view of a live match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub id: MatchId,
    pub side_a: MatchSide,
    pub side_b: MatchSide,
    pub server: Side,
    pub service_court: ServiceCourt,
    pub left_side: Side,
    pub teams_swapped: bool,
    pub status: MatchStatus,
    pub winner: Option<Side>,
    pub can_undo: bool,
    pub can_redo: bool,
}
