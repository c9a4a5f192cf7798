//! Hidden-cult round rule: faction selection, membership tracking and win evaluation
//! for a multiplayer station round, plus an in-memory host for simulating rounds.

pub mod cli;
pub mod data;
pub mod error;
pub mod logging;
pub mod parallel;
pub mod rule;
pub mod sim;

pub use error::RuleError;
