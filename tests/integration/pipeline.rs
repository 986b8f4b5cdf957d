//! End-to-end analysis runs against the fake provider.
//!
//! Every test runs on tokio's paused clock, so rate-window waits and
//! retry backoff complete instantly in virtual time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use teambalance::balance::{BalanceStrategy, RoleTeam};
use teambalance::engine::{
    AnalysisError, AnalysisOptions, AnalysisReport, Analyzer, FailurePolicy, ProgressTracker,
    RateLimiter, RequestError, RequestExecutor, RetryPolicy,
};
use teambalance::provider::{GameDataProvider, ProviderError};
use teambalance::storage;
use teambalance::types::{Division, QueueKind, RiotId, Role, Tier};

use crate::fake_provider::FakeProvider;

fn analyzer(provider: Arc<FakeProvider>, retry: RetryPolicy, options: AnalysisOptions) -> Analyzer {
    let limiter = Arc::new(RateLimiter::default());
    let tracker = Arc::new(ProgressTracker::new(limiter.pacing()));
    let executor = RequestExecutor::new(limiter, tracker, retry, CancellationToken::new());
    let provider: Arc<dyn GameDataProvider> = provider;
    Analyzer::new(provider, executor, options)
}

async fn run(provider: Arc<FakeProvider>, names: &[&str]) -> Result<AnalysisReport, AnalysisError> {
    analyzer(provider, RetryPolicy::default(), AnalysisOptions::default())
        .run(&ids(names))
        .await
}

fn ids(names: &[&str]) -> Vec<RiotId> {
    names.iter().map(|n| RiotId::new(*n, "JP1")).collect()
}

fn assert_role_unique(team: &RoleTeam) {
    let roles: HashSet<Role> = team.members.iter().map(|m| m.role).collect();
    assert_eq!(roles.len(), team.members.len(), "repeated role in {team:?}");
    for m in &team.members {
        assert!(m.member.main_roles.contains(&m.role));
    }
}

#[tokio::test(start_paused = true)]
async fn test_features_from_shared_matches() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_player("alpha", Tier::Gold, Division::II, 50)
            .with_player("beta", Tier::Silver, Division::I, 0)
            .with_rank("aramguy", vec![crate::fake_provider::solo_entry(Tier::Diamond, Division::I, 0)])
            .with_mastery("alpha", &[(266, 120_000), (103, 30_000)])
            .with_champion(266, "Aatrox")
            .with_champion(103, "Ahri")
            .with_match(
                "M1",
                QueueKind::RankedSolo,
                &[
                    ("alpha", Role::Top, 266, true),
                    ("beta", Role::Jungle, 64, false),
                    ("stranger", Role::Middle, 1, false),
                ],
            )
            .with_match(
                "A1",
                QueueKind::Aram,
                &[("alpha", Role::Unknown, 103, true), ("aramguy", Role::Unknown, 1, false)],
            ),
    );

    let report = run(Arc::clone(&fake), &["alpha", "beta"]).await.unwrap();
    let alpha = report.players.iter().find(|p| p.puuid == "alpha").unwrap();
    let beta = report.players.iter().find(|p| p.puuid == "beta").unwrap();

    assert_eq!(alpha.current_rank_score, 1450);
    assert_eq!(beta.current_rank_score, 1100);
    // The unranked stranger is left out; the ARAM opponent is never counted.
    assert_eq!(alpha.avg_match_rank_score, 1275);
    assert_eq!(beta.avg_match_rank_score, 1275);
    assert_eq!(alpha.top_mastery_sum, 150_000);
    assert_eq!(alpha.skill_score, 2 * 1450 + 1275 + 150);
    assert_eq!(beta.skill_score, 2 * 1100 + 1275);

    assert_eq!(alpha.main_roles, vec![Role::Top]);
    assert_eq!(beta.main_roles, vec![Role::Jungle]);
    assert_eq!(alpha.ranked_recent_count, 1);
    assert_eq!(alpha.ranked_recent_wins, 1);
    assert_eq!(beta.ranked_recent_wins, 0);
    assert_eq!(alpha.top_champions, vec!["Aatrox", "Ahri"]);

    assert_eq!(report.meta.strategy, BalanceStrategy::Exact);
    assert_eq!(report.teams.difference(), 4325 - 3475);

    // catalog + alpha (account, ids, 2 details, rank, mastery, 2 others)
    //         + beta (account, ids, 1 detail, rank, mastery, 2 others)
    assert_eq!(fake.calls(), 16);
    assert_eq!(report.meta.progress.completed_calls, 16);
    assert_eq!(report.meta.progress.planned_calls, 16);
    assert_eq!(report.meta.progress.estimated_remaining_secs, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_ten_player_lobby_with_role_unique_split() {
    let lanes = [
        (Role::Top, Tier::Gold),
        (Role::Top, Tier::Platinum),
        (Role::Jungle, Tier::Silver),
        (Role::Jungle, Tier::Gold),
        (Role::Middle, Tier::Emerald),
        (Role::Middle, Tier::Silver),
        (Role::Bottom, Tier::Bronze),
        (Role::Bottom, Tier::Gold),
        (Role::Utility, Tier::Iron),
        (Role::Utility, Tier::Platinum),
    ];
    let names: Vec<String> = (0..lanes.len()).map(|i| format!("p{i}")).collect();

    let mut fake = FakeProvider::new();
    for (i, (role, tier)) in lanes.iter().enumerate() {
        let name = names[i].as_str();
        fake = fake.with_player(name, *tier, Division::III, 10 * i as u32);
        for g in 0..2 {
            fake = fake.with_match(
                &format!("{name}-g{g}"),
                QueueKind::RankedSolo,
                &[(name, *role, 1, g == 0)],
            );
        }
    }
    let fake = Arc::new(fake);

    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let report = run(fake, &name_refs).await.unwrap();

    assert_eq!(report.players.len(), 10);
    assert_eq!(report.meta.strategy, BalanceStrategy::Exact);
    assert_eq!(report.teams.team_a.members.len(), 5);
    assert_eq!(report.teams.team_b.members.len(), 5);

    let split = report.role_unique_teams.as_ref().expect("role-unique split");
    assert_eq!(split.team_a.members.len(), 5);
    assert_eq!(split.team_b.members.len(), 5);
    assert_role_unique(&split.team_a);
    assert_role_unique(&split.team_b);
    // The role constraint can only cost balance.
    assert!(split.difference() >= report.teams.difference());

    // The report survives a save/load round trip.
    let mut path = std::env::temp_dir();
    path.push(format!("teambalance_it_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();
    storage::save_report(&report, Some(&path)).unwrap();
    let loaded = storage::load_report(Some(&path)).unwrap().unwrap();
    assert_eq!(loaded, report);
    storage::delete_report(Some(&path)).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ten_players_without_role_coverage() {
    let mut fake = FakeProvider::new();
    let names: Vec<String> = (0..10).map(|i| format!("top{i}")).collect();
    for name in names.iter().map(String::as_str) {
        fake = fake
            .with_player(name, Tier::Gold, Division::I, 0)
            .with_match(&format!("{name}-g"), QueueKind::NormalDraft, &[(name, Role::Top, 1, true)]);
    }
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let report = run(Arc::new(fake), &name_refs).await.unwrap();

    assert!(report.role_unique_teams.is_none());
    assert_eq!(report.teams.difference(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_players_and_missing_matches() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_player("alpha", Tier::Gold, Division::IV, 0)
            .with_player("beta", Tier::Gold, Division::IV, 0)
            .with_unranked_player("gamma")
            .with_missing_match("alpha", "GONE")
            .with_match("M1", QueueKind::Arena, &[("alpha", Role::Unknown, 1, true)]),
    );
    let report = run(fake, &["alpha", "beta", "gamma", "nobody"]).await.unwrap();

    assert_eq!(report.players.len(), 3);
    assert_eq!(report.not_found, ids(&["nobody"]));
    let alpha = report.players.iter().find(|p| p.puuid == "alpha").unwrap();
    assert!(alpha.role_counts.is_empty());
    assert_eq!(alpha.avg_match_rank_score, 0);
    let gamma = report.players.iter().find(|p| p.puuid == "gamma").unwrap();
    assert_eq!(gamma.skill_score, 0);
    // Odd roster: auto falls back to greedy.
    assert_eq!(report.meta.strategy, BalanceStrategy::Greedy);
}

#[tokio::test(start_paused = true)]
async fn test_abort_policy_reports_exhausted_player() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_player("alpha", Tier::Gold, Division::IV, 0)
            .with_player("flaky", Tier::Gold, Division::IV, 0)
            .with_broken_rank("flaky", ProviderError::Server { status: 503 }),
    );
    let err = run(fake, &["alpha", "flaky"]).await.unwrap_err();
    match err {
        AnalysisError::Player { player, source } => {
            assert_eq!(player, RiotId::new("flaky", "JP1"));
            assert_eq!(
                source,
                RequestError::ExhaustedRetries {
                    last_status: Some(503),
                    attempts: 3
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_continues_past_failures() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_player("alpha", Tier::Gold, Division::IV, 0)
            .with_player("beta", Tier::Silver, Division::IV, 0)
            .with_player("flaky", Tier::Gold, Division::IV, 0)
            .with_broken_rank("flaky", ProviderError::Network("connection reset".into())),
    );
    let report = analyzer(
        fake,
        RetryPolicy::default(),
        AnalysisOptions {
            failure_policy: FailurePolicy::Skip,
            ..AnalysisOptions::default()
        },
    )
    .run(&ids(&["alpha", "flaky", "beta"]))
    .await
    .unwrap();

    assert_eq!(report.players.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].player, RiotId::new("flaky", "JP1"));
    assert_eq!(report.meta.progress.transient_retries, 2);
    assert_eq!(report.meta.progress.server_error_wait_secs, 3.0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_lookups_are_waited_out() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_player("alpha", Tier::Gold, Division::II, 50)
            .with_player("beta", Tier::Gold, Division::IV, 0),
    );
    fake.script_rank_errors(
        "alpha",
        vec![
            ProviderError::RateLimited {
                retry_after: Some(Duration::from_secs(2)),
            },
            ProviderError::RateLimited { retry_after: None },
        ],
    );

    let started = Instant::now();
    let report = run(fake, &["alpha", "beta"]).await.unwrap();

    let alpha = report.players.iter().find(|p| p.puuid == "alpha").unwrap();
    assert_eq!(alpha.current_rank_score, 1450);
    assert_eq!(report.meta.progress.rate_limit_retries, 2);
    assert_eq!(report.meta.progress.rate_limit_wait_secs, 4.0);
    assert!(started.elapsed() >= Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_best_effort_skips_rate_limited_lookups() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_player("alpha", Tier::Gold, Division::II, 50)
            .with_player("beta", Tier::Gold, Division::IV, 0),
    );
    fake.script_rank_errors(
        "alpha",
        vec![ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        }],
    );

    let started = Instant::now();
    let report = analyzer(
        fake,
        RetryPolicy {
            best_effort: true,
            ..RetryPolicy::default()
        },
        AnalysisOptions::default(),
    )
    .run(&ids(&["alpha", "beta"]))
    .await
    .unwrap();

    let alpha = report.players.iter().find(|p| p.puuid == "alpha").unwrap();
    assert_eq!(alpha.current_rank_score, 0);
    assert_eq!(report.meta.progress.rate_limit_retries, 0);
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_long_window_paces_large_runs() {
    let mut fake = FakeProvider::new();
    let names = ["alpha", "beta", "gamma"];
    for name in names {
        fake = fake.with_player(name, Tier::Gold, Division::IV, 0);
        for g in 0..40 {
            fake = fake.with_match(
                &format!("{name}-{g}"),
                QueueKind::NormalBlind,
                &[(name, Role::Middle, 1, true)],
            );
        }
    }
    let fake = Arc::new(fake);

    let started = Instant::now();
    let report = analyzer(
        Arc::clone(&fake),
        RetryPolicy::default(),
        AnalysisOptions {
            match_limit: 40,
            ..AnalysisOptions::default()
        },
    )
    .run(&ids(&names))
    .await
    .unwrap();

    // 1 + 3 × (account + ids + 40 details + rank + mastery) = 133 calls.
    assert_eq!(fake.calls(), 133);
    assert!(started.elapsed() >= Duration::from_secs(120));
    assert_eq!(report.meta.progress.completed_calls, 133);
    assert_eq!(report.players[0].role_counts.get(&Role::Middle), Some(&40));
}
