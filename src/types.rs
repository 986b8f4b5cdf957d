//! Shared types for team balancing.
//!
//! These types form the data model used across all modules: player
//! identities, the raw records returned by the game-data provider, and
//! the ordered rank scale. Balancer code never depends on networking
//! types, only on what lives here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Player identity
// ---------------------------------------------------------------------------

/// A player's display identity: `gameName#tagLine`.
///
/// The tag is compared case-insensitively; the game name is compared as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into(),
        }
    }
}

impl PartialEq for RiotId {
    fn eq(&self, other: &Self) -> bool {
        self.game_name == other.game_name && self.tag_line.eq_ignore_ascii_case(&other.tag_line)
    }
}

impl Eq for RiotId {}

impl Hash for RiotId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.game_name.hash(state);
        self.tag_line.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

impl FromStr for RiotId {
    type Err = String;

    /// Parse `name#tag`. The split happens on the last `#` so names may
    /// contain the character themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, tag) = s
            .rsplit_once('#')
            .ok_or_else(|| format!("expected `name#tag`, got `{s}`"))?;
        let (name, tag) = (name.trim(), tag.trim());
        if name.is_empty() || tag.is_empty() {
            return Err(format!("empty game name or tag in `{s}`"));
        }
        Ok(RiotId::new(name, tag))
    }
}

/// Provider-assigned stable account identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Queue classification of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    RankedSolo,
    NormalDraft,
    NormalBlind,
    Arena,
    Quickplay,
    Aram,
    Other(u32),
}

impl QueueKind {
    /// Map a numeric queue id to its classification.
    pub fn from_queue_id(id: u32) -> Self {
        match id {
            420 => QueueKind::RankedSolo,
            400 => QueueKind::NormalDraft,
            430 => QueueKind::NormalBlind,
            1700 => QueueKind::Arena,
            490 => QueueKind::Quickplay,
            450 => QueueKind::Aram,
            other => QueueKind::Other(other),
        }
    }

    /// Whether matches in this queue feed champion, role and rank tallies.
    pub fn counts_toward_stats(self) -> bool {
        matches!(
            self,
            QueueKind::RankedSolo | QueueKind::NormalDraft | QueueKind::NormalBlind
        )
    }
}

/// A positional assignment within a team.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
    Unknown,
}

impl Role {
    /// Parse a per-participant position field. Empty or unrecognised
    /// positions are kept as `Unknown` rather than dropped.
    pub fn from_position(position: &str) -> Self {
        match position.trim().to_ascii_uppercase().as_str() {
            "TOP" => Role::Top,
            "JUNGLE" => Role::Jungle,
            "MIDDLE" | "MID" => Role::Middle,
            "BOTTOM" | "BOT" | "ADC" => Role::Bottom,
            "UTILITY" | "SUPPORT" => Role::Utility,
            _ => Role::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Top => "TOP",
            Role::Jungle => "JUNGLE",
            Role::Middle => "MIDDLE",
            Role::Bottom => "BOTTOM",
            Role::Utility => "UTILITY",
            Role::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// One participant's outcome within a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub puuid: String,
    pub champion_id: i64,
    pub role: Role,
    pub win: bool,
}

/// A fetched match detail. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub queue: QueueKind,
    pub participants: Vec<Participant>,
}

impl MatchRecord {
    /// The participant entry belonging to `puuid`, if present.
    pub fn participant(&self, puuid: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }
}

// ---------------------------------------------------------------------------
// Rank scale
// ---------------------------------------------------------------------------

/// The ten ordered tiers, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub const ALL: [Tier; 10] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// 1-based index: IRON = 1 … CHALLENGER = 10.
    pub fn index(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_index(index: u32) -> Option<Self> {
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    /// Top three tiers carry no division.
    pub fn is_apex(self) -> bool {
        self >= Tier::Master
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Emerald => "EMERALD",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tier `{s}`"))
    }
}

/// Division within a tier. `I` is the highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Division {
    IV,
    III,
    II,
    I,
}

impl Division {
    pub const ALL: [Division; 4] = [Division::IV, Division::III, Division::II, Division::I];

    /// 1-based index: IV = 1 … I = 4.
    pub fn index(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_index(index: u32) -> Option<Self> {
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Division::IV => "IV",
            Division::III => "III",
            Division::II => "II",
            Division::I => "I",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IV" => Ok(Division::IV),
            "III" => Ok(Division::III),
            "II" => Ok(Division::II),
            "I" => Ok(Division::I),
            _ => Err(format!("unknown division `{s}`")),
        }
    }
}

/// Queue type string the provider uses for solo ranked entries.
pub const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

/// One league entry for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub queue_type: String,
    pub tier: Tier,
    /// Absent for MASTER and above.
    pub division: Option<Division>,
    /// Nominally 0–99, but not strictly bounded by the provider.
    pub league_points: u32,
}

impl RankEntry {
    pub fn is_ranked_solo(&self) -> bool {
        self.queue_type == RANKED_SOLO_QUEUE
    }
}

/// Accumulated proficiency on one champion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryEntry {
    pub champion_id: i64,
    pub champion_points: u64,
}

// ---------------------------------------------------------------------------
// Champion catalog
// ---------------------------------------------------------------------------

/// Champion id → display name lookup, fetched once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChampionCatalog {
    names: HashMap<i64, String>,
}

impl ChampionCatalog {
    pub fn new(names: HashMap<i64, String>) -> Self {
        Self { names }
    }

    /// Display name for a champion id; `None` if unknown.
    pub fn resolve(&self, champion_id: i64) -> Option<&str> {
        self.names
            .get(&champion_id)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(i64, String)> for ChampionCatalog {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
