//! teambalance: ranked-game stat collector and team balancer
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, builds the ranked-game client, and either runs one analysis
//! from the command line or serves the HTTP API until Ctrl+C.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use teambalance::balance::{BalanceStrategy, Partition, RoleSplit};
use teambalance::config::AppConfig;
use teambalance::engine::{
    AnalysisReport, Analyzer, FailurePolicy, ProgressTracker, RateLimiter, RequestExecutor,
};
use teambalance::provider::riot::RiotClient;
use teambalance::server::{self, ServerState};
use teambalance::storage;
use teambalance::types::RiotId;

#[derive(Debug, Parser)]
#[command(name = "teambalance", version, about = "Collect ranked stats and split players into balanced teams")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse players once and print the teams.
    Analyze {
        /// Players as `name#tag`.
        players: Vec<RiotId>,

        /// JSON file with `[{"gameName": ..., "tagLine": ...}]`.
        #[arg(long)]
        players_file: Option<String>,

        /// Recent matches sampled per player.
        #[arg(long)]
        match_limit: Option<u32>,

        /// greedy, exact or auto.
        #[arg(long)]
        strategy: Option<BalanceStrategy>,

        /// abort or skip.
        #[arg(long)]
        on_failure: Option<FailurePolicy>,

        /// Give up on rate limiting instead of waiting.
        #[arg(long)]
        best_effort: bool,

        /// Where to write the report.
        #[arg(long)]
        output: Option<String>,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let mut cfg = AppConfig::load_or_default(&cli.config)?;
    cfg.apply_env_overrides(|k| std::env::var(k).ok())?;

    let api_key = SecretString::new(AppConfig::resolve_env(&cfg.provider.api_key_env)?);
    let provider = Arc::new(RiotClient::new(api_key, cfg.endpoints())?);
    let limiter = Arc::new(RateLimiter::new(&cfg.rate_windows()?));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, shutting down");
            signal_token.cancel();
        }
    });

    match cli.command {
        Command::Analyze {
            players,
            players_file,
            match_limit,
            strategy,
            on_failure,
            best_effort,
            output,
        } => {
            let mut players = players;
            if let Some(path) = players_file {
                players.extend(read_players(&path)?);
            }
            if players.is_empty() {
                bail!("No players given (pass `name#tag` arguments or --players-file)");
            }

            let mut options = cfg.analysis_options();
            if let Some(n) = match_limit.filter(|n| *n > 0) {
                options.match_limit = n;
            }
            if let Some(s) = strategy {
                options.strategy = s;
            }
            if let Some(p) = on_failure {
                options.failure_policy = p;
            }
            let mut retry = cfg.retry_policy();
            retry.best_effort |= best_effort;

            let tracker = Arc::new(ProgressTracker::new(limiter.pacing()));
            let executor = RequestExecutor::new(limiter, Arc::clone(&tracker), retry, shutdown);
            let analyzer = Analyzer::new(provider, executor, options);

            let report = analyzer.run(&players).await?;
            print_report(&report);

            let path = output.unwrap_or(cfg.server.result_file);
            storage::save_report(&report, Some(&path))?;
            info!(path = %path, "Report written");
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(cfg.server.port);
            let state = Arc::new(ServerState::new(
                provider,
                limiter,
                cfg.retry_policy(),
                cfg.analysis_options(),
                Some(cfg.server.result_file.clone()),
                shutdown.clone(),
            ));
            if let Err(e) = server::serve(state, port, shutdown).await {
                error!(error = %e, "Server failed");
                return Err(e);
            }
        }
    }

    Ok(())
}

fn read_players(path: &str) -> Result<Vec<RiotId>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read players file: {path}"))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse players file: {path}"))
}

fn print_report(report: &AnalysisReport) {
    println!();
    println!(
        "Strategy: {}  |  players: {}  |  {:.1}s",
        report.meta.strategy,
        report.meta.player_count,
        report.meta.duration_ms as f64 / 1000.0
    );
    print_partition(&report.teams);
    if let Some(split) = &report.role_unique_teams {
        println!();
        println!("Role-unique split:");
        print_role_split(split);
    }
    for p in &report.not_found {
        println!("  not found: {p}");
    }
    for f in &report.failed {
        println!("  failed: {} ({})", f.player, f.reason);
    }
}

fn print_partition(p: &Partition) {
    for (name, team) in [("Team A", &p.team_a), ("Team B", &p.team_b)] {
        println!("{name} ({}):", team.score_sum);
        for m in &team.members {
            let roles: Vec<String> = m.main_roles.iter().map(ToString::to_string).collect();
            println!("  {:<28} {:>6}  {}", m.id, m.skill_score, roles.join("/"));
        }
    }
    println!("Difference: {}", p.difference());
}

fn print_role_split(split: &RoleSplit) {
    for (name, team) in [("Team A", &split.team_a), ("Team B", &split.team_b)] {
        println!("{name} ({}):", team.score_sum);
        for m in &team.members {
            println!("  {:<8} {:<28} {:>6}", m.role.to_string(), m.member.id, m.member.skill_score);
        }
    }
    println!("Difference: {}", split.difference());
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("teambalance=info"));

    let json_logging = std::env::var("TEAMBALANCE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
