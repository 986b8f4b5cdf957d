//! Greedy alternating partition.

use super::{ensure_roster, BalanceError, Partition, RosterEntry, Team};

/// Sort by score descending, then hand each player to whichever team has
/// the lower running sum (team A on ties).
///
/// Works for any roster of 2+. Teams may differ in size; the final
/// difference is bounded by the largest single score.
pub fn greedy_partition(roster: &[RosterEntry]) -> Result<Partition, BalanceError> {
    ensure_roster(roster)?;

    let mut sorted: Vec<&RosterEntry> = roster.iter().collect();
    sorted.sort_by(|a, b| b.skill_score.cmp(&a.skill_score));

    let (mut team_a, mut team_b) = (Vec::new(), Vec::new());
    let (mut sum_a, mut sum_b) = (0u64, 0u64);
    for entry in sorted {
        if sum_a <= sum_b {
            sum_a += entry.skill_score;
            team_a.push(entry.clone());
        } else {
            sum_b += entry.skill_score;
            team_b.push(entry.clone());
        }
    }

    Ok(Partition {
        team_a: Team::from_members(team_a),
        team_b: Team::from_members(team_b),
    })
}
