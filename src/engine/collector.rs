//! Per-player data collection.
//!
//! Runs one player's calls strictly in order (account → match ids →
//! match details → rank → mastery → participant ranks), each through the
//! shared [`RequestExecutor`]. Planned-call counts are reported to the
//! tracker as soon as each stage discovers its work.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::executor::{RequestError, RequestExecutor};
use crate::provider::GameDataProvider;
use crate::skill::features::counted_participants;
use crate::skill::PlayerRecords;
use crate::types::{ChampionCatalog, RiotId};

/// Upper bound the match-list endpoint accepts.
pub const MAX_MATCH_LIMIT: u32 = 100;

pub struct Collector {
    provider: Arc<dyn GameDataProvider>,
    executor: RequestExecutor,
    match_limit: u32,
}

impl Collector {
    /// `match_limit` is clamped to `1..=100`.
    pub fn new(provider: Arc<dyn GameDataProvider>, executor: RequestExecutor, match_limit: u32) -> Self {
        Self {
            provider,
            executor,
            match_limit: match_limit.clamp(1, MAX_MATCH_LIMIT),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn match_limit(&self) -> u32 {
        self.match_limit
    }

    /// Fetch the champion name table once. Failures degrade to an empty
    /// catalog: names are cosmetic and never worth aborting a run over.
    pub async fn champion_catalog(&self) -> ChampionCatalog {
        let provider = &*self.provider;
        self.executor.tracker().plan_calls(1);
        match self
            .executor
            .execute("champion_catalog", move || provider.fetch_champion_catalog())
            .await
        {
            Ok(outcome) => {
                let catalog = outcome.unwrap_or_empty();
                debug!(champions = catalog.len(), "Champion catalog loaded");
                catalog
            }
            Err(e) => {
                warn!(error = %e, "Champion catalog unavailable, names will be omitted");
                ChampionCatalog::default()
            }
        }
    }

    /// Collect everything needed to aggregate `player`.
    ///
    /// `Ok(None)` when the account does not exist.
    pub async fn collect(&self, player: &RiotId) -> Result<Option<PlayerRecords>, RequestError> {
        let provider = &*self.provider;
        let tracker = self.executor.tracker();
        let (name, tag) = (player.game_name.as_str(), player.tag_line.as_str());

        tracker.plan_calls(1);
        let account = match self
            .executor
            .execute("account", move || provider.resolve_account(name, tag))
            .await?
            .found()
        {
            Some(a) => a,
            None => {
                warn!(player = %player, "Account not found");
                return Ok(None);
            }
        };
        let puuid = account.puuid.as_str();

        tracker.plan_calls(1);
        let count = self.match_limit;
        let mut match_ids = self
            .executor
            .execute("match_ids", move || provider.list_recent_match_ids(puuid, count))
            .await?
            .unwrap_or_empty();
        match_ids.truncate(count as usize);

        tracker.plan_calls(match_ids.len() as u64);
        let mut matches = Vec::with_capacity(match_ids.len());
        for id in &match_ids {
            let id = id.as_str();
            match self
                .executor
                .execute("match_detail", move || provider.fetch_match_detail(id))
                .await?
                .found()
            {
                Some(m) => matches.push(m),
                None => debug!(match_id = id, "Match detail unavailable, skipping"),
            }
        }

        tracker.plan_calls(2);
        let rank_entries = self
            .executor
            .execute("rank", move || provider.fetch_rank_entries(puuid))
            .await?
            .unwrap_or_empty();
        let mastery = self
            .executor
            .execute("mastery", move || provider.fetch_mastery_entries(puuid))
            .await?
            .unwrap_or_empty();

        let participants = counted_participants(&matches);
        let others: Vec<&str> = participants
            .iter()
            .map(String::as_str)
            .filter(|p| *p != puuid)
            .collect();
        tracker.plan_calls(others.len() as u64);

        let mut participant_ranks = HashMap::with_capacity(participants.len());
        if participants.contains(puuid) {
            participant_ranks.insert(puuid.to_string(), rank_entries.clone());
        }
        for other in others {
            if let Some(entries) = self
                .executor
                .execute("participant_rank", move || provider.fetch_rank_entries(other))
                .await?
                .found()
            {
                participant_ranks.insert(other.to_string(), entries);
            }
        }

        info!(
            player = %player,
            matches = matches.len(),
            participants = participant_ranks.len(),
            "Collected player records"
        );

        Ok(Some(PlayerRecords {
            player: player.clone(),
            account,
            matches,
            rank_entries,
            mastery,
            participant_ranks,
        }))
    }
}
