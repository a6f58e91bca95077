//! Core data models for the scoring and rotation engine.

mod counters;
mod ids;
mod pairing;
mod participant;
mod record;
mod rules;
mod side;

pub use counters::*;
pub use ids::*;
pub use pairing::*;
pub use participant::*;
pub use record::*;
pub use rules::*;
pub use side::*;
