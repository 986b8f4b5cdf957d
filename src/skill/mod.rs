//! Skill estimation.
//!
//! Deterministic heuristic scoring: the rank codec and the aggregator
//! that reduces raw provider records to a [`PlayerFeatures`] record.

pub mod features;
pub mod rank;

pub use features::{aggregate, skill_score, PlayerFeatures, PlayerRecords};
pub use rank::{rank_score, score_to_rank, Rank};
