//! Role-unique exact assignment for ten players.
//!
//! Every `C(10, 5) = 252` choice of team A is tried. A split is feasible
//! when, walking each team in roster order, every member can take the
//! first role in their preference list that no earlier teammate took.
//! Among feasible splits the smallest score difference wins; ties keep
//! the first found.

use std::collections::HashSet;

use super::combinations::{complement, Combinations};
use super::{
    ensure_roster, AssignedMember, BalanceError, RoleSplit, RoleTeam, RosterEntry,
    MAX_EXACT_ROSTER, ROLE_TEAM_SIZE,
};
use crate::types::Role;

/// First-fit role assignment for one team, in member order.
///
/// `None` when some member has no unused preferred role left.
pub fn assign_roles(members: &[&RosterEntry]) -> Option<Vec<Role>> {
    let mut used = HashSet::new();
    members
        .iter()
        .map(|m| {
            let role = m.main_roles.iter().copied().find(|r| !used.contains(r))?;
            used.insert(role);
            Some(role)
        })
        .collect()
}

/// Best role-unique split of exactly ten players.
///
/// Returns [`BalanceError::NoFeasibleRoleSplit`] when no split admits a
/// role assignment; callers treat that as an absent result and fall back
/// to a plain partition.
pub fn role_unique_partition(roster: &[RosterEntry]) -> Result<RoleSplit, BalanceError> {
    ensure_roster(roster)?;
    let n = roster.len();
    if n != MAX_EXACT_ROSTER {
        return Err(BalanceError::RoleRosterSize {
            found: n,
            expected: MAX_EXACT_ROSTER,
        });
    }

    let total: u64 = roster.iter().map(|m| m.skill_score).sum();
    let mut best: Option<(u64, RoleSplit)> = None;

    for chosen in Combinations::new(n, ROLE_TEAM_SIZE) {
        let rest = complement(n, &chosen);
        let Some(team_a) = role_team(roster, &chosen) else {
            continue;
        };
        let Some(team_b) = role_team(roster, &rest) else {
            continue;
        };

        let diff = team_a.score_sum.abs_diff(total - team_a.score_sum);
        if best.as_ref().map_or(true, |(d, _)| diff < *d) {
            best = Some((diff, RoleSplit { team_a, team_b }));
        }
    }

    best.map(|(_, split)| split)
        .ok_or(BalanceError::NoFeasibleRoleSplit)
}

fn role_team(roster: &[RosterEntry], indices: &[usize]) -> Option<RoleTeam> {
    let members: Vec<&RosterEntry> = indices.iter().map(|&i| &roster[i]).collect();
    let roles = assign_roles(&members)?;
    let members: Vec<AssignedMember> = members
        .into_iter()
        .zip(roles)
        .map(|(m, role)| AssignedMember {
            member: m.clone(),
            role,
        })
        .collect();
    let score_sum = members.iter().map(|m| m.member.skill_score).sum();
    Some(RoleTeam { members, score_sum })
}
