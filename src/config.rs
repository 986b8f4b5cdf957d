//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section and field has a default, so a missing file or a partial
//! file is valid. Secrets (API keys) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::balance::BalanceStrategy;
use crate::engine::analysis::{AnalysisOptions, FailurePolicy, DEFAULT_MATCH_LIMIT};
use crate::engine::executor::RetryPolicy;
use crate::engine::limiter::RateWindow;
use crate::provider::riot::{
    RiotEndpoints, DEFAULT_CATALOG_URL, DEFAULT_PLATFORM_URL, DEFAULT_REGIONAL_URL,
};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub analysis: AnalysisConfig,
    pub rate_limit: RateLimitConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key_env: String,
    pub regional_url: String,
    pub platform_url: String,
    pub catalog_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "RIOT_API_KEY".to_string(),
            regional_url: DEFAULT_REGIONAL_URL.to_string(),
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Recent matches sampled per player.
    pub match_limit: u32,
    /// Attempts for server/network failures.
    pub max_attempts: u32,
    /// Give up on rate limiting instead of waiting it out.
    pub best_effort: bool,
    pub strategy: BalanceStrategy,
    pub failure_policy: FailurePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            match_limit: DEFAULT_MATCH_LIMIT,
            max_attempts: RetryPolicy::default().max_attempts,
            best_effort: false,
            strategy: BalanceStrategy::Auto,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    pub short_limit: usize,
    pub short_period_secs: u64,
    pub long_limit: usize,
    pub long_period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            short_limit: 20,
            short_period_secs: 1,
            long_limit: 100,
            long_period_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Where the latest report is written.
    pub result_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            result_file: crate::storage::DEFAULT_RESULT_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Apply `MATCH_LIMIT`, `SKIP`, `PORT` and `RESULT_FILE` from `lookup`.
    ///
    /// Non-positive match limits are ignored; unparseable values are errors.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("MATCH_LIMIT") {
            let n: i64 = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid MATCH_LIMIT: {v}"))?;
            if n > 0 {
                self.analysis.match_limit = u32::try_from(n).unwrap_or(u32::MAX);
            }
        }
        if let Some(v) = lookup("SKIP") {
            self.analysis.best_effort = v.trim() == "true";
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {v}"))?;
        }
        if let Some(v) = lookup("RESULT_FILE") {
            if !v.trim().is_empty() {
                self.server.result_file = v;
            }
        }
        Ok(())
    }

    /// Limiter windows. A zero cap would never admit a call.
    pub fn rate_windows(&self) -> Result<[RateWindow; 2]> {
        let r = &self.rate_limit;
        if r.short_limit == 0 || r.long_limit == 0 {
            bail!(
                "rate_limit caps must be positive (short_limit = {}, long_limit = {})",
                r.short_limit,
                r.long_limit
            );
        }
        Ok([
            RateWindow::new(r.short_limit, Duration::from_secs(r.short_period_secs)),
            RateWindow::new(r.long_limit, Duration::from_secs(r.long_period_secs)),
        ])
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.analysis.max_attempts,
            best_effort: self.analysis.best_effort,
            ..RetryPolicy::default()
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            match_limit: self.analysis.match_limit,
            strategy: self.analysis.strategy,
            failure_policy: self.analysis.failure_policy,
        }
    }

    pub fn endpoints(&self) -> RiotEndpoints {
        RiotEndpoints {
            regional_url: self.provider.regional_url.clone(),
            platform_url: self.provider.platform_url.clone(),
            catalog_url: self.provider.catalog_url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
        }
    }
}
