//! Tier-based rating adjustment.
//!
//! Ratings map onto five tiers over a 0..=100 scale. After each match every
//! participant's rating moves by a delta looked up from the tier gap between
//! their side and the opposing side:
//!
//! | tier gap | win | loss |
//! |---------:|----:|-----:|
//! |    <= -4 |  +1 |   -8 |
//! |       -3 |  +1 |   -6 |
//! |       -2 |  +2 |   -4 |
//! |       -1 |  +3 |   -2 |
//! |        0 |  +3 |   -2 |
//! |       +1 |  +4 |   -1 |
//! |       +2 |  +5 |    0 |
//! |       +3 |  +6 |   +1 |
//! |    >= +4 |  +7 |   +2 |
//!
//! Each side reads its own row: the gap is the opposing tier minus the own
//! tier, so beating a stronger side pays more and losing to a weaker one
//! costs more.

use serde::{Deserialize, Serialize};

use crate::models::Side;

/// Ratings above this are treated as this for tier purposes.
pub const RATING_TIER_CAP: u32 = 100;

/// Width of one tier on the rating scale.
const TIER_WIDTH: u32 = 20;

/// Coarse skill bucket, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(u8);

impl Tier {
    pub const MIN: Tier = Tier(1);
    pub const MAX: Tier = Tier(5);

    pub fn value(self) -> u8 {
        self.0
    }

    /// Opposing tier minus own tier.
    pub fn diff_against(self, opponent: Tier) -> i32 {
        i32::from(opponent.0) - i32::from(self.0)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tier for a single rating. A rating of 100 would land on tier 6 and is
/// clamped to 5.
pub fn compute_tier(rating: u32) -> Tier {
    let capped = rating.min(RATING_TIER_CAP);
    let tier = (capped / TIER_WIDTH + 1).max(1);
    // capped <= 100 keeps this within 1..=6; 100 itself lands on 6 and clamps
    Tier(tier.min(u32::from(Tier::MAX.0)) as u8)
}

/// Tier for a side: a solo rating, or the floored average of a duo's
/// individually capped ratings.
pub fn side_tier(ratings: &[u32]) -> Tier {
    match ratings {
        [] => Tier::MIN,
        [single] => compute_tier(*single),
        many => {
            let sum: u32 = many.iter().map(|r| (*r).min(RATING_TIER_CAP)).sum();
            compute_tier(sum / many.len() as u32)
        }
    }
}

/// Rating change for one participant given the tier gap and the outcome.
pub fn compute_delta(tier_diff: i32, won: bool) -> i32 {
    match (tier_diff, won) {
        (d, true) if d <= -4 => 1,
        (d, false) if d <= -4 => -8,
        (-3, true) => 1,
        (-3, false) => -6,
        (-2, true) => 2,
        (-2, false) => -4,
        (-1 | 0, true) => 3,
        (-1 | 0, false) => -2,
        (1, true) => 4,
        (1, false) => -1,
        (2, true) => 5,
        (2, false) => 0,
        (3, true) => 6,
        (3, false) => 1,
        (_, true) => 7,
        (_, false) => 2,
    }
}

/// Apply a delta to a rating, never going below zero.
pub fn apply_delta(rating: u32, delta: i32) -> u32 {
    if delta >= 0 {
        rating.saturating_add(delta.unsigned_abs())
    } else {
        rating.saturating_sub(delta.unsigned_abs())
    }
}

/// Per-side rating deltas for a finished match, as `(side_a, side_b)`.
pub fn match_deltas(side_a_ratings: &[u32], side_b_ratings: &[u32], winner: Side) -> (i32, i32) {
    let tier_a = side_tier(side_a_ratings);
    let tier_b = side_tier(side_b_ratings);

    let delta_a = compute_delta(tier_a.diff_against(tier_b), winner == Side::A);
    let delta_b = compute_delta(tier_b.diff_against(tier_a), winner == Side::B);
    (delta_a, delta_b)
}
