//! Fake game-data provider for integration testing.
//!
//! Provides a deterministic `GameDataProvider` implementation backed by
//! in-memory accounts, matches, league entries and mastery, with
//! scriptable failures per account. No network involved.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use teambalance::provider::{GameDataProvider, ProviderError};
use teambalance::types::*;

/// An in-memory provider. Build it with the `with_*` methods, then
/// script failures with [`FakeProvider::script_rank_errors`].
#[derive(Default)]
pub struct FakeProvider {
    accounts: HashMap<RiotId, Account>,
    match_ids: HashMap<String, Vec<String>>,
    matches: HashMap<String, MatchRecord>,
    ranks: HashMap<String, Vec<RankEntry>>,
    mastery: HashMap<String, Vec<MasteryEntry>>,
    catalog: HashMap<i64, String>,
    /// Errors returned by rank lookups before the real answer, by puuid.
    rank_errors: Mutex<HashMap<String, VecDeque<ProviderError>>>,
    /// Rank lookups that fail forever, by puuid.
    broken_ranks: HashMap<String, ProviderError>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account whose puuid is its game name, ranked in solo queue.
    pub fn with_player(mut self, name: &str, tier: Tier, division: Division, lp: u32) -> Self {
        self = self.with_unranked_player(name);
        self.ranks.insert(name.to_string(), vec![solo_entry(tier, division, lp)]);
        self
    }

    pub fn with_unranked_player(mut self, name: &str) -> Self {
        self.accounts.insert(
            RiotId::new(name, "JP1"),
            Account {
                puuid: name.to_string(),
                game_name: name.to_string(),
                tag_line: "JP1".to_string(),
            },
        );
        self
    }

    /// League entries for a puuid that has no account of its own.
    pub fn with_rank(mut self, puuid: &str, entries: Vec<RankEntry>) -> Self {
        self.ranks.insert(puuid.to_string(), entries);
        self
    }

    pub fn with_mastery(mut self, puuid: &str, entries: &[(i64, u64)]) -> Self {
        self.mastery.insert(
            puuid.to_string(),
            entries
                .iter()
                .map(|&(champion_id, champion_points)| MasteryEntry {
                    champion_id,
                    champion_points,
                })
                .collect(),
        );
        self
    }

    pub fn with_champion(mut self, id: i64, name: &str) -> Self {
        self.catalog.insert(id, name.to_string());
        self
    }

    /// Add a match and append it to every participant's history.
    pub fn with_match(
        mut self,
        id: &str,
        queue: QueueKind,
        participants: &[(&str, Role, i64, bool)],
    ) -> Self {
        let record = MatchRecord {
            match_id: id.to_string(),
            queue,
            participants: participants
                .iter()
                .map(|&(puuid, role, champion_id, win)| Participant {
                    puuid: puuid.to_string(),
                    champion_id,
                    role,
                    win,
                })
                .collect(),
        };
        for (puuid, ..) in participants {
            self.match_ids
                .entry(puuid.to_string())
                .or_default()
                .push(id.to_string());
        }
        self.matches.insert(id.to_string(), record);
        self
    }

    /// List a match id that has no detail behind it.
    pub fn with_missing_match(mut self, puuid: &str, id: &str) -> Self {
        self.match_ids
            .entry(puuid.to_string())
            .or_default()
            .push(id.to_string());
        self
    }

    /// Every rank lookup for `puuid` fails with `error`.
    pub fn with_broken_rank(mut self, puuid: &str, error: ProviderError) -> Self {
        self.broken_ranks.insert(puuid.to_string(), error);
        self
    }

    /// The next rank lookups for `puuid` return `errors` in order.
    pub fn script_rank_errors(&self, puuid: &str, errors: Vec<ProviderError>) {
        self.rank_errors
            .lock()
            .unwrap()
            .insert(puuid.to_string(), errors.into());
    }

    /// Total provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn solo_entry(tier: Tier, division: Division, lp: u32) -> RankEntry {
    RankEntry {
        queue_type: RANKED_SOLO_QUEUE.to_string(),
        tier,
        division: if tier.is_apex() { None } else { Some(division) },
        league_points: lp,
    }
}

#[async_trait]
impl GameDataProvider for FakeProvider {
    async fn resolve_account(&self, game_name: &str, tag_line: &str) -> Result<Account, ProviderError> {
        self.count();
        self.accounts
            .get(&RiotId::new(game_name, tag_line))
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn list_recent_match_ids(&self, puuid: &str, count: u32) -> Result<Vec<String>, ProviderError> {
        self.count();
        Ok(self
            .match_ids
            .get(puuid)
            .map(|ids| ids.iter().take(count as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_match_detail(&self, match_id: &str) -> Result<MatchRecord, ProviderError> {
        self.count();
        self.matches
            .get(match_id)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn fetch_rank_entries(&self, puuid: &str) -> Result<Vec<RankEntry>, ProviderError> {
        self.count();
        if let Some(err) = self.broken_ranks.get(puuid) {
            return Err(err.clone());
        }
        if let Some(err) = self
            .rank_errors
            .lock()
            .unwrap()
            .get_mut(puuid)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(self.ranks.get(puuid).cloned().unwrap_or_default())
    }

    async fn fetch_mastery_entries(&self, puuid: &str) -> Result<Vec<MasteryEntry>, ProviderError> {
        self.count();
        Ok(self.mastery.get(puuid).cloned().unwrap_or_default())
    }

    async fn fetch_champion_catalog(&self) -> Result<ChampionCatalog, ProviderError> {
        self.count();
        Ok(ChampionCatalog::new(self.catalog.clone()))
    }
}
