//! Statistics and rating calculations.
//!
//! Computes derived metrics from participant and session counters:
//! - Tier-based rating deltas (see [`rating`])
//! - Win rates
//! - Leaderboard ordering, overall and per session

pub mod rating;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Participant, ParticipantId, SessionCounters};

/// Minimum games before a participant appears on the ranked leaderboard.
pub const DEFAULT_MIN_RANKED_GAMES: u32 = 30;

/// Calculate win rate from wins and games played.
pub fn calculate_win_rate(wins: u32, played: u32) -> f64 {
    if played == 0 {
        0.0
    } else {
        wins as f64 / played as f64
    }
}

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    /// Rating points, when known
    pub rating: Option<u32>,
}

impl Standing {
    pub fn played(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Win rate desc, then games played desc, then rating desc.
fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    b.win_rate
        .partial_cmp(&a.win_rate)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.played().cmp(&a.played()))
        .then_with(|| b.rating.cmp(&a.rating))
}

fn assign_ranks(mut rows: Vec<Standing>) -> Vec<Standing> {
    rows.sort_by(compare_standings);
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

/// All-time leaderboard over the roster.
///
/// Participants with fewer than `min_games` played are left out; pass 0 for
/// the unranked list that shows everybody.
pub fn leaderboard(participants: &[Participant], min_games: u32) -> Vec<Standing> {
    let rows = participants
        .iter()
        .filter(|p| p.games_played() >= min_games)
        .map(|p| Standing {
            rank: 0,
            participant_id: p.id.clone(),
            wins: p.wins,
            losses: p.losses,
            win_rate: calculate_win_rate(p.wins, p.games_played()),
            rating: Some(p.rating),
        })
        .collect();
    assign_ranks(rows)
}

/// Standings within one session, from its counters.
pub fn session_standings(counters: &SessionCounters) -> Vec<Standing> {
    let rows = counters
        .games_played_per_participant
        .iter()
        .map(|(id, &played)| {
            let wins = counters.won(id).min(played);
            Standing {
                rank: 0,
                participant_id: id.clone(),
                wins,
                losses: played - wins,
                win_rate: calculate_win_rate(wins, played),
                rating: None,
            }
        })
        .collect();
    assign_ranks(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn player(id: &str, wins: u32, losses: u32, rating: u32) -> Participant {
        Participant::with_id(ParticipantId::from(id), id)
            .with_record(wins, losses)
            .with_rating(rating)
    }

    #[test]
    fn test_calculate_win_rate() {
        assert!((calculate_win_rate(5, 6) - 0.833).abs() < 0.01);
        assert_eq!(calculate_win_rate(0, 0), 0.0);
        assert_eq!(calculate_win_rate(3, 6), 0.5);
    }

    #[test]
    fn test_leaderboard_ordering() {
        let roster = vec![
            player("low", 1, 3, 90),
            player("tie-fewer", 2, 2, 10),
            player("tie-more", 4, 4, 10),
            player("top", 3, 1, 0),
        ];

        let ids: Vec<String> = leaderboard(&roster, 0)
            .into_iter()
            .map(|s| s.participant_id.to_string())
            .collect();

        assert_eq!(ids, vec!["top", "tie-more", "tie-fewer", "low"]);
    }

    #[test]
    fn test_leaderboard_rating_breaks_full_tie() {
        let roster = vec![player("a", 2, 2, 10), player("b", 2, 2, 40)];
        let board = leaderboard(&roster, 0);
        assert_eq!(board[0].participant_id.as_str(), "b");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_ranked_leaderboard_requires_min_games() {
        let roster = vec![player("veteran", 20, 10, 50), player("rookie", 5, 0, 20)];
        let board = leaderboard(&roster, DEFAULT_MIN_RANKED_GAMES);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].participant_id.as_str(), "veteran");
    }

    #[test]
    fn test_session_standings() {
        let a = ParticipantId::from("a");
        let b = ParticipantId::from("b");
        let mut counters = SessionCounters::new();
        counters.register(&a);
        counters.register(&b);
        counters.add_played(&a);
        counters.add_played(&b);
        counters.add_won(&b);

        let standings = session_standings(&counters);
        assert_eq!(standings[0].participant_id, b);
        assert_eq!(standings[0].wins, 1);
        assert_eq!(standings[1].losses, 1);
        assert_eq!(standings[1].rating, None);
    }
}
