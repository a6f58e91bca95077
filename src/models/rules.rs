//! Match rules: format, game point and point cap.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selectable game points.
pub const POINT_GOAL_PRESETS: [u32; 4] = [7, 11, 15, 21];

/// Invalid rule combinations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("Point goal must be greater than 0")]
    ZeroGoal,

    #[error("Point ceiling {ceiling} is below point goal {goal}")]
    CeilingBelowGoal { goal: u32, ceiling: u32 },

    #[error("Point ceiling {ceiling} exceeds the maximum {max} for point goal {goal}")]
    CeilingAboveMax { goal: u32, ceiling: u32, max: u32 },
}

/// Singles or doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchFormat {
    Singles,
    #[default]
    Doubles,
}

impl MatchFormat {
    /// Seats per side.
    pub fn seats_per_side(&self) -> usize {
        match self {
            MatchFormat::Singles => 1,
            MatchFormat::Doubles => 2,
        }
    }

    /// Seats for the whole match.
    pub fn seats(&self) -> usize {
        self.seats_per_side() * 2
    }
}

impl std::fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchFormat::Singles => write!(f, "singles"),
            MatchFormat::Doubles => write!(f, "doubles"),
        }
    }
}

/// Default (and maximum) point cap for a preset game point.
pub fn default_ceiling(point_goal: u32) -> Option<u32> {
    match point_goal {
        7 => Some(11),
        11 => Some(15),
        15 => Some(21),
        21 => Some(30),
        _ => None,
    }
}

/// Scoring rules for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    pub format: MatchFormat,

    /// Target score; a side must lead by 2 once it gets here
    pub point_goal: u32,

    /// Hard cap; reaching it ends the match regardless of margin
    pub point_ceiling: u32,
}

impl MatchRules {
    /// Build rules for a format and game point, using the preset point cap.
    /// Non-preset goals cap at the goal itself.
    pub fn new(format: MatchFormat, point_goal: u32) -> Self {
        Self {
            format,
            point_goal,
            point_ceiling: default_ceiling(point_goal).unwrap_or(point_goal),
        }
    }

    /// Singles default: 11 points, capped at 15.
    pub fn singles() -> Self {
        Self::new(MatchFormat::Singles, 11)
    }

    /// Doubles default: 15 points, capped at 21.
    pub fn doubles() -> Self {
        Self::new(MatchFormat::Doubles, 15)
    }

    /// Default rules for a format.
    pub fn for_format(format: MatchFormat) -> Self {
        match format {
            MatchFormat::Singles => Self::singles(),
            MatchFormat::Doubles => Self::doubles(),
        }
    }

    /// Builder method to override the point cap.
    pub fn with_ceiling(mut self, point_ceiling: u32) -> Self {
        self.point_ceiling = point_ceiling;
        self
    }

    /// Point caps selectable for this game point.
    pub fn ceiling_options(&self) -> std::ops::RangeInclusive<u32> {
        let max = default_ceiling(self.point_goal).unwrap_or(self.point_goal);
        self.point_goal..=max
    }

    /// Validate the rule combination.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.point_goal == 0 {
            return Err(RulesError::ZeroGoal);
        }
        if self.point_ceiling < self.point_goal {
            return Err(RulesError::CeilingBelowGoal {
                goal: self.point_goal,
                ceiling: self.point_ceiling,
            });
        }
        if let Some(max) = default_ceiling(self.point_goal) {
            if self.point_ceiling > max {
                return Err(RulesError::CeilingAboveMax {
                    goal: self.point_goal,
                    ceiling: self.point_ceiling,
                    max,
                });
            }
        }
        Ok(())
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::doubles()
    }
}
