//! Team balancing.
//!
//! Three interchangeable strategies over `(id, skill score, role
//! preferences)` tuples:
//! - [`greedy::greedy_partition`]: any roster of 2+, O(n log n)
//! - [`exact::exact_partition`]: exhaustive equal-size split, even rosters of at most 10
//! - [`roles::role_unique_partition`]: exactly 10 players, no repeated role per team
//!
//! The balancer has no dependency on networking and never returns a
//! partial result: either a complete, disjoint, roster-covering split or
//! a typed [`BalanceError`].

pub mod combinations;
pub mod exact;
pub mod greedy;
pub mod roles;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::skill::PlayerFeatures;
use crate::types::Role;

pub use exact::exact_partition;
pub use greedy::greedy_partition;
pub use roles::role_unique_partition;

/// Largest roster the exhaustive strategies accept. Bounds the search to
/// `C(10, 5) = 252` candidates.
pub const MAX_EXACT_ROSTER: usize = 10;

/// Team size the role-unique strategy produces (one per canonical role).
pub const ROLE_TEAM_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("need at least 2 players to balance, got {found}")]
    InsufficientRoster { found: usize },

    #[error("exact partition needs an even roster, got {found} players")]
    UnevenRoster { found: usize },

    #[error("exact partition supports at most {max} players, got {found}")]
    RosterTooLarge { found: usize, max: usize },

    #[error("role-unique split needs exactly {expected} players, got {found}")]
    RoleRosterSize { found: usize, expected: usize },

    #[error("no split gives every player a distinct preferred role within their team")]
    NoFeasibleRoleSplit,
}

// ---------------------------------------------------------------------------
// Roster and partitions
// ---------------------------------------------------------------------------

/// One player as the balancer sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub skill_score: u64,
    /// Preferred roles, most preferred first.
    pub main_roles: Vec<Role>,
}

impl RosterEntry {
    pub fn new(id: impl Into<String>, skill_score: u64, main_roles: Vec<Role>) -> Self {
        Self {
            id: id.into(),
            skill_score,
            main_roles,
        }
    }
}

impl From<&PlayerFeatures> for RosterEntry {
    fn from(f: &PlayerFeatures) -> Self {
        RosterEntry::new(f.player.to_string(), f.skill_score, f.main_roles.clone())
    }
}

/// One side of a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub members: Vec<RosterEntry>,
    pub score_sum: u64,
}

impl Team {
    pub fn from_members(members: Vec<RosterEntry>) -> Self {
        let score_sum = members.iter().map(|m| m.skill_score).sum();
        Self { members, score_sum }
    }

    fn from_indices(roster: &[RosterEntry], indices: &[usize]) -> Self {
        Self::from_members(indices.iter().map(|&i| roster[i].clone()).collect())
    }
}

/// Two disjoint teams covering the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub team_a: Team,
    pub team_b: Team,
}

impl Partition {
    pub fn difference(&self) -> u64 {
        self.team_a.score_sum.abs_diff(self.team_b.score_sum)
    }
}

/// A member together with the role assigned to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedMember {
    #[serde(flatten)]
    pub member: RosterEntry,
    pub role: Role,
}

/// One side of a role-unique split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTeam {
    pub members: Vec<AssignedMember>,
    pub score_sum: u64,
}

/// Two teams where each member holds a distinct preferred role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSplit {
    pub team_a: RoleTeam,
    pub team_b: RoleTeam,
}

impl RoleSplit {
    pub fn difference(&self) -> u64 {
        self.team_a.score_sum.abs_diff(self.team_b.score_sum)
    }
}

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// Which partitioning strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStrategy {
    Greedy,
    Exact,
    /// Exact when the roster is even and small enough, greedy otherwise.
    #[default]
    Auto,
}

impl fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceStrategy::Greedy => write!(f, "greedy"),
            BalanceStrategy::Exact => write!(f, "exact"),
            BalanceStrategy::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for BalanceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(BalanceStrategy::Greedy),
            "exact" => Ok(BalanceStrategy::Exact),
            "auto" => Ok(BalanceStrategy::Auto),
            other => Err(format!("unknown balance strategy `{other}`")),
        }
    }
}

/// Concrete strategy `Auto` resolves to for a roster of `n`.
pub fn resolve_strategy(strategy: BalanceStrategy, n: usize) -> BalanceStrategy {
    match strategy {
        BalanceStrategy::Auto if n % 2 == 0 && n <= MAX_EXACT_ROSTER => BalanceStrategy::Exact,
        BalanceStrategy::Auto => BalanceStrategy::Greedy,
        other => other,
    }
}

/// Partition `roster` with the chosen strategy.
///
/// Returns the partition and the concrete strategy that produced it.
pub fn balance(
    roster: &[RosterEntry],
    strategy: BalanceStrategy,
) -> Result<(Partition, BalanceStrategy), BalanceError> {
    ensure_roster(roster)?;
    let resolved = resolve_strategy(strategy, roster.len());
    debug!(players = roster.len(), requested = %strategy, resolved = %resolved, "Balancing roster");

    let partition = match resolved {
        BalanceStrategy::Exact => exact_partition(roster)?,
        _ => greedy_partition(roster)?,
    };
    Ok((partition, resolved))
}

fn ensure_roster(roster: &[RosterEntry]) -> Result<(), BalanceError> {
    if roster.len() < 2 {
        return Err(BalanceError::InsufficientRoster {
            found: roster.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
