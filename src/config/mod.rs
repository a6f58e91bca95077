//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::calculate::DEFAULT_MIN_RANKED_GAMES;
use crate::models::{MatchFormat, MatchRules};
use crate::scheduler::{FairnessScheduler, DEFAULT_PRIORITY_PICK_MAX_POOL};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Default scoring rules per format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_singles_point_goal")]
    pub singles_point_goal: u32,

    /// Point cap for singles; the preset cap for the goal when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singles_point_ceiling: Option<u32>,

    #[serde(default = "default_doubles_point_goal")]
    pub doubles_point_goal: u32,

    /// Point cap for doubles; the preset cap for the goal when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doubles_point_ceiling: Option<u32>,
}

fn default_singles_point_goal() -> u32 {
    MatchRules::for_format(MatchFormat::Singles).point_goal
}

fn default_doubles_point_goal() -> u32 {
    MatchRules::for_format(MatchFormat::Doubles).point_goal
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            singles_point_goal: default_singles_point_goal(),
            singles_point_ceiling: None,
            doubles_point_goal: default_doubles_point_goal(),
            doubles_point_ceiling: None,
        }
    }
}

impl RulesConfig {
    /// Rules a new match of this format starts with.
    pub fn rules_for(&self, format: MatchFormat) -> MatchRules {
        let (goal, ceiling) = match format {
            MatchFormat::Singles => (self.singles_point_goal, self.singles_point_ceiling),
            MatchFormat::Doubles => (self.doubles_point_goal, self.doubles_point_ceiling),
        };
        let rules = MatchRules::new(format, goal);
        match ceiling {
            Some(ceiling) => rules.with_ceiling(ceiling),
            None => rules,
        }
    }
}

/// Fair rotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pools larger than this ignore the priority pick; 0 turns it off
    #[serde(default = "default_priority_pick_max_pool")]
    pub priority_pick_max_pool: usize,

    /// Seed for reproducible tie-breaks; entropy when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_priority_pick_max_pool() -> usize {
    DEFAULT_PRIORITY_PICK_MAX_POOL
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            priority_pick_max_pool: default_priority_pick_max_pool(),
            seed: None,
        }
    }
}

impl SchedulerConfig {
    pub fn scheduler(&self) -> FairnessScheduler {
        FairnessScheduler::new(self.priority_pick_max_pool)
    }
}

/// Leaderboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Games needed to appear on the ranked leaderboard
    #[serde(default = "default_min_ranked_games")]
    pub min_ranked_games: u32,
}

fn default_min_ranked_games() -> u32 {
    DEFAULT_MIN_RANKED_GAMES
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_ranked_games: default_min_ranked_games(),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub ranking: RankingConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            rules: RulesConfig::default(),
            scheduler: SchedulerConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for format in [MatchFormat::Singles, MatchFormat::Doubles] {
            self.rules.rules_for(format).validate().map_err(|e| {
                ConfigError::ValidationError(format!("{} rules: {}", format, e))
            })?;
        }

        Ok(())
    }
}
