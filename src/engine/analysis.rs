//! Analysis run orchestration.
//!
//! collect (per player, sequential) → aggregate → balance → report.
//! Player failures follow an explicit [`FailurePolicy`]; a missing
//! account is never a failure and is listed separately.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use super::collector::Collector;
use super::executor::{RequestError, RequestExecutor};
use super::progress::{ProgressSnapshot, ProgressTracker};
use crate::balance::{
    balance, role_unique_partition, BalanceError, BalanceStrategy, Partition, RoleSplit,
    RosterEntry, ROLE_TEAM_SIZE,
};
use crate::provider::GameDataProvider;
use crate::skill::{aggregate, PlayerFeatures};
use crate::types::RiotId;

pub const DEFAULT_MATCH_LIMIT: u32 = 10;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do when one player's collection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and surface the failing player.
    #[default]
    Abort,
    /// Record the player as failed and continue with the rest.
    Skip,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!("unknown failure policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub match_limit: u32,
    pub strategy: BalanceStrategy,
    pub failure_policy: FailurePolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            match_limit: DEFAULT_MATCH_LIMIT,
            strategy: BalanceStrategy::Auto,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and report
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("collecting data for {player} failed: {source}")]
    Player { player: RiotId, source: RequestError },

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error("analysis cancelled")]
    Cancelled,
}

/// A player dropped under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPlayer {
    pub player: RiotId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// Concrete strategy that produced `teams`.
    pub strategy: BalanceStrategy,
    pub player_count: usize,
    pub match_limit: u32,
    pub duration_ms: u64,
    pub generated_at: DateTime<Utc>,
    pub progress: ProgressSnapshot,
}

/// Result document of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub teams: Partition,
    /// Present only for ten-player rosters with a feasible role split.
    pub role_unique_teams: Option<RoleSplit>,
    pub players: Vec<PlayerFeatures>,
    pub not_found: Vec<RiotId>,
    pub failed: Vec<FailedPlayer>,
    pub meta: ReportMeta,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

pub struct Analyzer {
    collector: Collector,
    options: AnalysisOptions,
}

impl Analyzer {
    pub fn new(
        provider: Arc<dyn GameDataProvider>,
        executor: RequestExecutor,
        options: AnalysisOptions,
    ) -> Self {
        let collector = Collector::new(provider, executor, options.match_limit);
        Self { collector, options }
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        self.collector.executor().tracker()
    }

    /// Run a full analysis over `players`.
    ///
    /// Duplicate identities (tag compared case-insensitively) are analysed once.
    pub async fn run(&self, players: &[RiotId]) -> Result<AnalysisReport, AnalysisError> {
        let started = Instant::now();
        let generated_at = Utc::now();

        let mut seen = HashSet::new();
        let players: Vec<&RiotId> = players.iter().filter(|p| seen.insert(*p)).collect();
        if players.len() < 2 {
            return Err(BalanceError::InsufficientRoster {
                found: players.len(),
            }
            .into());
        }

        let tracker = self.tracker();
        tracker.set_total_players(players.len());
        info!(
            players = players.len(),
            match_limit = self.collector.match_limit(),
            strategy = %self.options.strategy,
            "Starting analysis"
        );

        let catalog = self.collector.champion_catalog().await;

        let mut features = Vec::with_capacity(players.len());
        let mut not_found = Vec::new();
        let mut failed = Vec::new();

        for player in players {
            if self.collector.executor().is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            match self.collector.collect(player).await {
                Ok(Some(records)) => {
                    let f = aggregate(&records, &catalog);
                    info!(
                        player = %player,
                        rank_score = f.current_rank_score,
                        avg_match_rank = f.avg_match_rank_score,
                        skill_score = f.skill_score,
                        "Player aggregated"
                    );
                    features.push(f);
                }
                Ok(None) => not_found.push(player.clone()),
                Err(RequestError::Cancelled) => return Err(AnalysisError::Cancelled),
                Err(e) => match self.options.failure_policy {
                    FailurePolicy::Abort => {
                        return Err(AnalysisError::Player {
                            player: player.clone(),
                            source: e,
                        })
                    }
                    FailurePolicy::Skip => {
                        warn!(player = %player, error = %e, "Player failed, skipping");
                        failed.push(FailedPlayer {
                            player: player.clone(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
            tracker.player_done();
        }

        let roster: Vec<RosterEntry> = features.iter().map(RosterEntry::from).collect();
        let (teams, strategy) = balance(&roster, self.options.strategy)?;

        let role_unique_teams = if roster.len() == 2 * ROLE_TEAM_SIZE {
            match role_unique_partition(&roster) {
                Ok(split) => Some(split),
                Err(e) => {
                    info!(reason = %e, "No role-unique split");
                    None
                }
            }
        } else {
            None
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            strategy = %strategy,
            difference = teams.difference(),
            role_unique = role_unique_teams.is_some(),
            duration_ms,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            teams,
            role_unique_teams,
            meta: ReportMeta {
                strategy,
                player_count: features.len(),
                match_limit: self.collector.match_limit(),
                duration_ms,
                generated_at,
                progress: tracker.snapshot(),
            },
            players: features,
            not_found,
            failed,
        })
    }
}
