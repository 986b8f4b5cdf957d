//! Ranked-game HTTP API integration.
//!
//! Account and match endpoints live on a regional host, league and
//! mastery endpoints on a platform host. Champion names come from a
//! static catalog document that needs no token.
//!
//! Auth: `X-Riot-Token: {key}` on every API call.
//! Rate limit (dev key): 20 requests/second, 100 requests/2 minutes.
//! Enforced by the caller's limiter, not here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{classify_status, GameDataProvider, ProviderError};
use crate::types::{
    Account, ChampionCatalog, Division, MasteryEntry, MatchRecord, Participant, QueueKind,
    RankEntry, Role, Tier,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const TOKEN_HEADER: &str = "X-Riot-Token";

pub const DEFAULT_REGIONAL_URL: &str = "https://asia.api.riotgames.com";
pub const DEFAULT_PLATFORM_URL: &str = "https://jp1.api.riotgames.com";
pub const DEFAULT_CATALOG_URL: &str =
    "https://ddragon.leagueoflegends.com/cdn/15.14.1/data/ja_JP/champion.json";

/// The match-list endpoint returns at most this many ids per call.
const MAX_MATCH_COUNT: u32 = 100;

/// Where each family of endpoints lives.
#[derive(Debug, Clone)]
pub struct RiotEndpoints {
    pub regional_url: String,
    pub platform_url: String,
    pub catalog_url: String,
    pub timeout: Duration,
}

impl Default for RiotEndpoints {
    fn default() -> Self {
        Self {
            regional_url: DEFAULT_REGIONAL_URL.to_string(),
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDto {
    puuid: String,
    #[serde(default)]
    game_name: String,
    #[serde(default)]
    tag_line: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchDto {
    metadata: MatchMetadataDto,
    info: MatchInfoDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchMetadataDto {
    match_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchInfoDto {
    queue_id: u32,
    #[serde(default)]
    participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantDto {
    puuid: String,
    champion_id: i64,
    /// Empty for modes without fixed positions.
    #[serde(default)]
    team_position: String,
    #[serde(default)]
    win: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeagueEntryDto {
    queue_type: String,
    /// Absent for queues without tiers, such as Arena.
    #[serde(default)]
    tier: String,
    /// Division, e.g. "II". Reported as "I" for apex tiers.
    #[serde(default)]
    rank: Option<String>,
    #[serde(default)]
    league_points: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasteryDto {
    champion_id: i64,
    #[serde(default)]
    champion_points: u64,
}

/// Static champion document: `{ "data": { "Aatrox": { "key": "266", "name": "..." } } }`.
#[derive(Debug, Deserialize)]
struct ChampionCatalogDto {
    data: HashMap<String, ChampionDto>,
}

#[derive(Debug, Deserialize)]
struct ChampionDto {
    key: String,
    name: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<AccountDto> for Account {
    fn from(dto: AccountDto) -> Self {
        Account {
            puuid: dto.puuid,
            game_name: dto.game_name,
            tag_line: dto.tag_line,
        }
    }
}

impl From<MatchDto> for MatchRecord {
    fn from(dto: MatchDto) -> Self {
        MatchRecord {
            match_id: dto.metadata.match_id,
            queue: QueueKind::from_queue_id(dto.info.queue_id),
            participants: dto
                .info
                .participants
                .into_iter()
                .map(|p| Participant {
                    puuid: p.puuid,
                    champion_id: p.champion_id,
                    role: Role::from_position(&p.team_position),
                    win: p.win,
                })
                .collect(),
        }
    }
}

/// Convert a league entry; `None` if the tier is not on the scale.
fn league_entry(dto: LeagueEntryDto) -> Option<RankEntry> {
    let tier: Tier = match dto.tier.parse() {
        Ok(t) => t,
        Err(e) => {
            debug!(error = %e, queue = %dto.queue_type, "Skipping league entry");
            return None;
        }
    };
    let division = if tier.is_apex() {
        None
    } else {
        match dto.rank.as_deref().map(str::parse::<Division>) {
            Some(Ok(d)) => Some(d),
            _ => {
                debug!(rank = ?dto.rank, queue = %dto.queue_type, "Skipping league entry without division");
                return None;
            }
        }
    };
    Some(RankEntry {
        queue_type: dto.queue_type,
        tier,
        division,
        league_points: dto.league_points,
    })
}

fn champion_catalog(dto: ChampionCatalogDto) -> ChampionCatalog {
    dto.data
        .into_values()
        .filter_map(|c| c.key.parse::<i64>().ok().map(|id| (id, c.name)))
        .collect()
}

/// `Retry-After` in whole seconds. Zero or unparseable means no hint.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the ranked-game API.
pub struct RiotClient {
    http: Client,
    api_key: SecretString,
    endpoints: RiotEndpoints,
}

impl RiotClient {
    pub fn new(api_key: SecretString, endpoints: RiotEndpoints) -> Result<Self> {
        let http = Client::builder()
            .timeout(endpoints.timeout)
            .user_agent("teambalance/0.1.0")
            .build()
            .context("Failed to build HTTP client for ranked-game API")?;

        Ok(Self {
            http,
            api_key,
            endpoints,
        })
    }

    /// One GET, classified. `authed` adds the API token.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, authed: bool) -> Result<T, ProviderError> {
        debug!(url = %url, "GET");
        let mut request = self.http.get(url);
        if authed {
            request = request.header(TOKEN_HEADER, self.api_key.expose_secret().as_str());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(resp.headers());
            return Err(classify_status(status.as_u16(), retry_after));
        }

        resp.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ProviderError::Decode(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })
    }
}

#[async_trait]
impl GameDataProvider for RiotClient {
    async fn resolve_account(&self, game_name: &str, tag_line: &str) -> Result<Account, ProviderError> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.endpoints.regional_url,
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line),
        );
        let dto: AccountDto = self.get_json(&url, true).await?;
        Ok(dto.into())
    }

    async fn list_recent_match_ids(&self, puuid: &str, count: u32) -> Result<Vec<String>, ProviderError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start=0&count={}",
            self.endpoints.regional_url,
            urlencoding::encode(puuid),
            count.clamp(1, MAX_MATCH_COUNT),
        );
        self.get_json(&url, true).await
    }

    async fn fetch_match_detail(&self, match_id: &str) -> Result<MatchRecord, ProviderError> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.endpoints.regional_url,
            urlencoding::encode(match_id),
        );
        let dto: MatchDto = self.get_json(&url, true).await?;
        Ok(dto.into())
    }

    async fn fetch_rank_entries(&self, puuid: &str) -> Result<Vec<RankEntry>, ProviderError> {
        let url = format!(
            "{}/lol/league/v4/entries/by-puuid/{}",
            self.endpoints.platform_url,
            urlencoding::encode(puuid),
        );
        let dtos: Vec<LeagueEntryDto> = self.get_json(&url, true).await?;
        Ok(dtos.into_iter().filter_map(league_entry).collect())
    }

    async fn fetch_mastery_entries(&self, puuid: &str) -> Result<Vec<MasteryEntry>, ProviderError> {
        let url = format!(
            "{}/lol/champion-mastery/v4/champion-masteries/by-puuid/{}",
            self.endpoints.platform_url,
            urlencoding::encode(puuid),
        );
        let dtos: Vec<MasteryDto> = self.get_json(&url, true).await?;
        Ok(dtos
            .into_iter()
            .map(|m| MasteryEntry {
                champion_id: m.champion_id,
                champion_points: m.champion_points,
            })
            .collect())
    }

    async fn fetch_champion_catalog(&self) -> Result<ChampionCatalog, ProviderError> {
        let dto: ChampionCatalogDto = self.get_json(&self.endpoints.catalog_url, false).await?;
        Ok(champion_catalog(dto))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
