//! Game-data provider boundary.
//!
//! Defines the `GameDataProvider` trait every upstream implementation
//! satisfies, and the classified `ProviderError` the request executor
//! uses to pick a retry policy. Implementations:
//! - `riot`: the ranked-game HTTP API plus a static champion catalog
//!
//! Callers never invoke a provider directly; every call is routed
//! through [`crate::engine::executor::RequestExecutor`].

pub mod riot;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::types::{Account, ChampionCatalog, MasteryEntry, MatchRecord, RankEntry};

/// Classified outcome of one failed upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Absent data. Terminal but not an error for the caller.
    #[error("not found")]
    NotFound,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error {status}")]
    Server { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    /// Any other status. Not retried.
    #[error("unexpected status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Classify an HTTP status that was not a success.
pub fn classify_status(status: u16, retry_after: Option<Duration>) -> ProviderError {
    match status {
        404 => ProviderError::NotFound,
        429 => ProviderError::RateLimited { retry_after },
        500..=599 => ProviderError::Server { status },
        _ => ProviderError::Status { status },
    }
}

/// Abstraction over the upstream ranked-game data source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameDataProvider: Send + Sync {
    /// Resolve a display identity to a stable account.
    async fn resolve_account(&self, game_name: &str, tag_line: &str)
        -> Result<Account, ProviderError>;

    /// Most recent match ids first.
    async fn list_recent_match_ids(&self, puuid: &str, count: u32)
        -> Result<Vec<String>, ProviderError>;

    async fn fetch_match_detail(&self, match_id: &str) -> Result<MatchRecord, ProviderError>;

    /// League entries for an account; empty when unranked.
    async fn fetch_rank_entries(&self, puuid: &str) -> Result<Vec<RankEntry>, ProviderError>;

    /// Mastery entries for an account; empty when none.
    async fn fetch_mastery_entries(&self, puuid: &str)
        -> Result<Vec<MasteryEntry>, ProviderError>;

    /// Champion id → display name table, fetched once per run.
    async fn fetch_champion_catalog(&self) -> Result<ChampionCatalog, ProviderError>;
}
