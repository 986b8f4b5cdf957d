//! Rank score codec.
//!
//! Maps `(tier, division, lp)` onto a single ordered integer:
//! `((tier - 1) * 4 + (division - 1)) * 100 + lp`. Each division spans
//! 100 points and each tier 400, so the mapping inverts exactly for
//! league points in `0..100`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Division, RankEntry, Tier};

/// Points spanned by one division.
const DIVISION_SPAN: u32 = 100;
/// Points spanned by one tier (four divisions).
const TIER_SPAN: u32 = DIVISION_SPAN * 4;

/// A decoded position on the rank scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub tier: Tier,
    pub division: Division,
    pub lp: u32,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tier.is_apex() {
            write!(f, "{} {}LP", self.tier, self.lp)
        } else {
            write!(f, "{} {} {}LP", self.tier, self.division, self.lp)
        }
    }
}

/// Encode a rank as its ordered score.
pub fn rank_score(tier: Tier, division: Division, lp: u32) -> u32 {
    ((tier.index() - 1) * 4 + (division.index() - 1)) * DIVISION_SPAN + lp
}

/// Decode a score back into `(tier, division, lp)`.
///
/// Returns `None` past the top of the scale.
pub fn score_to_rank(score: u32) -> Option<Rank> {
    let tier = Tier::from_index(score / TIER_SPAN + 1)?;
    let division = Division::from_index((score % TIER_SPAN) / DIVISION_SPAN + 1)?;
    Some(Rank {
        tier,
        division,
        lp: score % DIVISION_SPAN,
    })
}

/// Score of a league entry. Apex tiers report no division and are
/// placed at `I`.
pub fn entry_score(entry: &RankEntry) -> u32 {
    rank_score(
        entry.tier,
        entry.division.unwrap_or(Division::I),
        entry.league_points,
    )
}

/// Score of the first ranked-solo entry in `entries`, if any.
pub fn solo_queue_score(entries: &[RankEntry]) -> Option<u32> {
    entries.iter().find(|e| e.is_ranked_solo()).map(entry_score)
}
