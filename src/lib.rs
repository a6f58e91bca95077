//! # Courtside
//!
//! Match scoring, fair rotation and rating engine for casual badminton
//! meetups.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (participants, pairings, rules, counters)
//! - **scoring**: Live match state machine with undo/redo
//! - **scheduler**: Fair rotation picking the next two sides
//! - **calculate**: Rating deltas, win rates and leaderboards
//! - **session**: Session lifecycle and settlement of finished matches
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod models;
pub mod scheduler;
pub mod scoring;
pub mod session;

pub use models::*;
