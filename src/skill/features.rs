//! Feature aggregation.
//!
//! Folds the raw records collected for one player (account, recent
//! matches, league entries, mastery, and the league entries of everyone
//! met in those matches) into an immutable [`PlayerFeatures`] record and
//! its scalar skill score. Pure: no network, no retries, no clock.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::rank::solo_queue_score;
use crate::types::{
    Account, ChampionCatalog, MasteryEntry, MatchRecord, QueueKind, RankEntry, RiotId, Role,
};

/// Mastery entries contributing to the mastery sum and champion list.
const TOP_MASTERY: usize = 3;
/// Usage-ranked champions merged into the champion list.
const TOP_USAGE: usize = 3;
/// Cap on the merged champion list.
const MAX_TOP_CHAMPIONS: usize = 6;
/// Champions listed per main/secondary role.
const CHAMPIONS_PER_ROLE: usize = 3;
/// Roles counted as main roles; the next as many are secondary.
const MAIN_ROLE_COUNT: usize = 2;

/// Everything collected for one player before aggregation.
#[derive(Debug, Clone)]
pub struct PlayerRecords {
    pub player: RiotId,
    pub account: Account,
    /// Recent match details, most recent first.
    pub matches: Vec<MatchRecord>,
    pub rank_entries: Vec<RankEntry>,
    pub mastery: Vec<MasteryEntry>,
    /// League entries of participants met in counted matches, by puuid.
    pub participant_ranks: HashMap<String, Vec<RankEntry>>,
}

/// Aggregated statistics for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFeatures {
    pub player: RiotId,
    pub puuid: String,
    pub current_rank_score: u32,
    pub avg_match_rank_score: u32,
    pub top_mastery_sum: u64,
    pub role_counts: BTreeMap<Role, u32>,
    pub main_roles: Vec<Role>,
    pub secondary_roles: Vec<Role>,
    pub top_champions: Vec<String>,
    pub role_champions: BTreeMap<Role, Vec<String>>,
    pub ranked_recent_count: u32,
    pub ranked_recent_wins: u32,
    pub skill_score: u64,
}

/// `2 × current + average + mastery / 1000`, truncating.
pub fn skill_score(current_rank_score: u32, avg_match_rank_score: u32, top_mastery_sum: u64) -> u64 {
    2 * u64::from(current_rank_score) + u64::from(avg_match_rank_score) + top_mastery_sum / 1000
}

/// Distinct participants (teammates, opponents, and the player) across
/// matches whose queue counts toward stats. Sorted for stable lookup order.
pub fn counted_participants(matches: &[MatchRecord]) -> BTreeSet<String> {
    matches
        .iter()
        .filter(|m| m.queue.counts_toward_stats())
        .flat_map(|m| m.participants.iter().map(|p| p.puuid.clone()))
        .collect()
}

/// Aggregate a player's raw records into features.
pub fn aggregate(records: &PlayerRecords, catalog: &ChampionCatalog) -> PlayerFeatures {
    let puuid = records.account.puuid.as_str();

    let mut role_counts: BTreeMap<Role, u32> = BTreeMap::new();
    let mut champion_counts: HashMap<i64, u32> = HashMap::new();
    let mut role_champion_counts: HashMap<Role, HashMap<i64, u32>> = HashMap::new();
    let mut ranked_recent_count = 0;
    let mut ranked_recent_wins = 0;

    for record in records.matches.iter().filter(|m| m.queue.counts_toward_stats()) {
        let Some(me) = record.participant(puuid) else {
            continue;
        };
        *role_counts.entry(me.role).or_default() += 1;
        *champion_counts.entry(me.champion_id).or_default() += 1;
        *role_champion_counts
            .entry(me.role)
            .or_default()
            .entry(me.champion_id)
            .or_default() += 1;
        if record.queue == QueueKind::RankedSolo {
            ranked_recent_count += 1;
            if me.win {
                ranked_recent_wins += 1;
            }
        }
    }

    let current_rank_score = solo_queue_score(&records.rank_entries).unwrap_or(0);
    let avg_match_rank_score = average_match_rank(records);

    let mastery = mastery_by_points(&records.mastery);
    let top_mastery_sum: u64 = mastery
        .iter()
        .take(TOP_MASTERY)
        .map(|m| m.champion_points)
        .sum();

    let roles = ranked_by_count(&role_counts);
    let main_roles: Vec<Role> = roles.iter().take(MAIN_ROLE_COUNT).copied().collect();
    let secondary_roles: Vec<Role> = roles
        .iter()
        .skip(MAIN_ROLE_COUNT)
        .take(MAIN_ROLE_COUNT)
        .copied()
        .collect();

    let top_champions = top_champions(&mastery, &champion_counts, catalog);

    let role_champions = main_roles
        .iter()
        .chain(secondary_roles.iter())
        .map(|role| {
            let usage = role_champion_counts.get(role).cloned().unwrap_or_default();
            (*role, role_champion_list(&usage, &mastery, catalog))
        })
        .collect();

    PlayerFeatures {
        player: records.player.clone(),
        puuid: puuid.to_string(),
        current_rank_score,
        avg_match_rank_score,
        top_mastery_sum,
        role_counts,
        main_roles,
        secondary_roles,
        top_champions,
        role_champions,
        ranked_recent_count,
        ranked_recent_wins,
        skill_score: skill_score(current_rank_score, avg_match_rank_score, top_mastery_sum),
    }
}

/// Mean solo-queue score over everyone met in counted matches. Unranked
/// participants are left out of the mean rather than counted as zero.
fn average_match_rank(records: &PlayerRecords) -> u32 {
    let scores: Vec<u64> = counted_participants(&records.matches)
        .iter()
        .filter_map(|p| records.participant_ranks.get(p))
        .filter_map(|entries| solo_queue_score(entries))
        .map(u64::from)
        .collect();

    if scores.is_empty() {
        return 0;
    }
    (scores.iter().sum::<u64>() / scores.len() as u64) as u32
}

/// Mastery entries by points descending, champion id ascending on ties.
fn mastery_by_points(entries: &[MasteryEntry]) -> Vec<MasteryEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        b.champion_points
            .cmp(&a.champion_points)
            .then(a.champion_id.cmp(&b.champion_id))
    });
    sorted
}

/// Keys by count descending; ties fall back to key order.
fn ranked_by_count<K: Copy + Ord>(counts: &BTreeMap<K, u32>) -> Vec<K> {
    let mut ranked: Vec<(K, u32)> = counts.iter().map(|(k, c)| (*k, *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(k, _)| k).collect()
}

fn usage_order(counts: &HashMap<i64, u32>) -> Vec<i64> {
    let ordered: BTreeMap<i64, u32> = counts.iter().map(|(k, v)| (*k, *v)).collect();
    ranked_by_count(&ordered)
}

/// Push a champion's name unless it is unknown or already listed.
fn push_name(
    list: &mut Vec<String>,
    seen: &mut HashSet<String>,
    champion_id: i64,
    catalog: &ChampionCatalog,
) {
    if let Some(name) = catalog.resolve(champion_id) {
        if seen.insert(name.to_string()) {
            list.push(name.to_string());
        }
    }
}

/// Union of top mastery and top usage, mastery first, capped.
fn top_champions(
    mastery: &[MasteryEntry],
    usage: &HashMap<i64, u32>,
    catalog: &ChampionCatalog,
) -> Vec<String> {
    let mut list = Vec::new();
    let mut seen = HashSet::new();

    for entry in mastery.iter().take(TOP_MASTERY) {
        push_name(&mut list, &mut seen, entry.champion_id, catalog);
    }
    for id in usage_order(usage).into_iter().take(TOP_USAGE) {
        if list.len() >= MAX_TOP_CHAMPIONS {
            break;
        }
        push_name(&mut list, &mut seen, id, catalog);
    }
    list.truncate(MAX_TOP_CHAMPIONS);
    list
}

/// Most-played champions in one role, topped up from mastery order.
fn role_champion_list(
    usage: &HashMap<i64, u32>,
    mastery: &[MasteryEntry],
    catalog: &ChampionCatalog,
) -> Vec<String> {
    let mut list = Vec::new();
    let mut seen = HashSet::new();

    let candidates = usage_order(usage)
        .into_iter()
        .chain(mastery.iter().map(|m| m.champion_id));
    for id in candidates {
        if list.len() >= CHAMPIONS_PER_ROLE {
            break;
        }
        push_name(&mut list, &mut seen, id, catalog);
    }
    list
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
