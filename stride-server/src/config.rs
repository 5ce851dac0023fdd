use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context as _;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "stride:prod";

/// Periods of the background jobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobConfig {
    pub enabled: bool,
    pub leaderboard_interval: Duration,
    pub notification_interval: Duration,
    pub stats_interval: Duration,
    pub movement_summary_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub secret_key: String,
    pub token_ttl: Duration,
    pub db_max_connections: u32,
    pub auto_run_migrations: bool,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub jobs: JobConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secret_key = env::var("STRIDE_SECRET_KEY")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .context("STRIDE_SECRET_KEY is not set")?;

        let bind_raw =
            env::var("STRIDE_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid STRIDE_BIND_ADDR: {bind_raw}"))?;

        let db_max_connections = u32::try_from(env_u64("DB_MAX_CONNECTIONS", 5))
            .context("DB_MAX_CONNECTIONS is too large")?;

        Ok(Self {
            database_url,
            bind_addr,
            secret_key,
            token_ttl: token_ttl_from_hours(env_u64("STRIDE_TOKEN_TTL_HOURS", 12))?,
            db_max_connections,
            auto_run_migrations: env_bool("AUTO_RUN_MIGRATIONS", true),
            redis_enabled: env_bool("REDIS_ENABLED", false),
            redis_url: env::var("REDIS_URL").ok(),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_REDIS_KEY_PREFIX.to_owned()),
            jobs: JobConfig::from_env(),
        })
    }
}

impl JobConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_bool("JOBS_ENABLED", true),
            leaderboard_interval: env_secs("LEADERBOARD_JOB_INTERVAL_SECONDS", 86_400),
            notification_interval: env_secs("NOTIFICATION_JOB_INTERVAL_SECONDS", 60),
            stats_interval: env_secs("STATS_JOB_INTERVAL_SECONDS", 86_400),
            movement_summary_interval: env_secs("MOVEMENT_SUMMARY_JOB_INTERVAL_SECONDS", 3_600),
        }
    }
}

pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn token_ttl_from_hours(hours: u64) -> anyhow::Result<Duration> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .context("STRIDE_TOKEN_TTL_HOURS is too large")
}

/// Zero would make `tokio::time::interval` panic.
fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(env_u64(key, default).max(1))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_bool, token_ttl_from_hours};

    #[test]
    fn token_ttl_is_hours() {
        assert_eq!(token_ttl_from_hours(12).unwrap(), Duration::from_secs(43_200));
        assert!(token_ttl_from_hours(u64::MAX).is_err());
    }

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_bool(value), "{value}");
        }
        for value in ["0", "false", "off", ""] {
            assert!(!parse_bool(value), "{value}");
        }
    }
}
