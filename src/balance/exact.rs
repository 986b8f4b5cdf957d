//! Exhaustive equal-size partition.

use super::combinations::{complement, Combinations};
use super::{ensure_roster, BalanceError, Partition, RosterEntry, Team, MAX_EXACT_ROSTER};

/// Enumerate every way to pick `n/2` players for team A and keep the
/// split with the smallest score difference. The first minimum in
/// lexicographic order wins.
///
/// Preconditions (typed errors, never degraded): at least 2 players, an
/// even count, and at most [`MAX_EXACT_ROSTER`]. Larger rosters must use
/// the greedy strategy.
pub fn exact_partition(roster: &[RosterEntry]) -> Result<Partition, BalanceError> {
    ensure_roster(roster)?;
    let n = roster.len();
    if n > MAX_EXACT_ROSTER {
        return Err(BalanceError::RosterTooLarge {
            found: n,
            max: MAX_EXACT_ROSTER,
        });
    }
    if n % 2 != 0 {
        return Err(BalanceError::UnevenRoster { found: n });
    }

    let total: u64 = roster.iter().map(|m| m.skill_score).sum();
    let mut best: Option<(u64, Vec<usize>)> = None;

    for chosen in Combinations::new(n, n / 2) {
        let sum_a: u64 = chosen.iter().map(|&i| roster[i].skill_score).sum();
        let diff = sum_a.abs_diff(total - sum_a);
        if best.as_ref().map_or(true, |(d, _)| diff < *d) {
            best = Some((diff, chosen));
        }
    }

    // n >= 2 guarantees at least one candidate.
    let (_, chosen) = best.ok_or(BalanceError::InsufficientRoster { found: n })?;
    Ok(Partition {
        team_a: Team::from_indices(roster, &chosen),
        team_b: Team::from_indices(roster, &complement(n, &chosen)),
    })
}
