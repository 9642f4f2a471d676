//! Environment-driven worker configuration.

use std::time::Duration;

use squeeze_types::SqueezeError;

const DEFAULT_SLEEP_SECS: u64 = 7200;
const DEFAULT_HEARTBEAT_SECS: u64 = 60;
const DEFAULT_BACKOFF_FLOOR_SECS: u64 = 5;
const DEFAULT_MAX_BACKOFF_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub sleep: Duration,
    pub heartbeat: Duration,
    pub backoff_floor: Duration,
    pub backoff_ceiling: Duration,
    pub wordpress_url: String,
    pub wordpress_username: String,
    pub wordpress_password: String,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, SqueezeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SqueezeError> {
        Ok(Self {
            sleep: secs_var(&lookup, "WORKER_SLEEP_SECS", DEFAULT_SLEEP_SECS)?,
            heartbeat: secs_var(&lookup, "WORKER_HEARTBEAT_SECS", DEFAULT_HEARTBEAT_SECS)?,
            backoff_floor: secs_var(
                &lookup,
                "WORKER_BACKOFF_FLOOR_SECS",
                DEFAULT_BACKOFF_FLOOR_SECS,
            )?,
            backoff_ceiling: secs_var(&lookup, "WORKER_MAX_BACKOFF_SECS", DEFAULT_MAX_BACKOFF_SECS)?,
            wordpress_url: required_var(&lookup, "WORDPRESS_URL")?,
            wordpress_username: required_var(&lookup, "WORDPRESS_USERNAME")?,
            wordpress_password: required_var(&lookup, "WORDPRESS_PASSWORD")?,
        })
    }
}

fn required_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, SqueezeError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SqueezeError::Config(format!(
            "{key} environment variable not set"
        ))),
    }
}

fn secs_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, SqueezeError> {
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| SqueezeError::Config(format!("{key} must be a whole number of seconds"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
