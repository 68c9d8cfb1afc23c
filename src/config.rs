//! Server Configuration
//!
//! All knobs come from environment variables. A variable that is unset or
//! fails to parse falls back to its default with a logged warning, so a
//! typo in an interval never prevents startup.
//!
//! | Variable | Effect | Default |
//! |---|---|---|
//! | `REDIGO_PORT` | TCP listener port | `6380` |
//! | `SNAPSHOT_SAVE_INTERVAL` | snapshot cadence | `2m` |
//! | `FLUSH_BUFFER_INTERVAL` | AOF flush cadence | `1m` |
//! | `DATA_EXPIRATION_INTERVAL` | expiration sweep cadence | `5s` |
//! | `DEFAULT_TTL` | TTL applied when SET omits one (seconds, 0 = never) | `0` |
//! | `REDIGO_ROOT_DIR_PATH` | parent of the `.redigo` data directory | `$HOME` |
//!
//! Intervals use compact duration strings: `"5s"`, `"2m"`, `"1h30m"`,
//! `"250ms"`.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP listener port.
    pub port: u16,
    /// How often the snapshot timer materializes a snapshot.
    pub snapshot_interval: Duration,
    /// How often the AOF buffer is flushed to disk.
    pub flush_interval: Duration,
    /// How often the expiration sweeper runs.
    pub expiration_interval: Duration,
    /// TTL in seconds applied when a SET carries none. 0 means never.
    pub default_ttl: i64,
    /// Parent of the data directory; `None` means `$HOME`.
    pub root_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 6380,
            snapshot_interval: Duration::from_secs(120),
            flush_interval: Duration::from_secs(60),
            expiration_interval: Duration::from_secs(5),
            default_ttl: 0,
            root_dir: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the environment.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            port: env_parsed("REDIGO_PORT", defaults.port, |s| s.parse().ok()),
            snapshot_interval: env_parsed(
                "SNAPSHOT_SAVE_INTERVAL",
                defaults.snapshot_interval,
                parse_duration,
            ),
            flush_interval: env_parsed(
                "FLUSH_BUFFER_INTERVAL",
                defaults.flush_interval,
                parse_duration,
            ),
            expiration_interval: env_parsed(
                "DATA_EXPIRATION_INTERVAL",
                defaults.expiration_interval,
                parse_duration,
            ),
            default_ttl: env_parsed("DEFAULT_TTL", defaults.default_ttl, |s| s.parse().ok()),
            root_dir: std::env::var_os("REDIGO_ROOT_DIR_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn env_parsed<T>(name: &str, default: T, parse: impl Fn(&str) -> Option<T>) -> T {
    match std::env::var(name) {
        Ok(raw) => match parse(raw.trim()) {
            Some(value) => value,
            None => {
                warn!(variable = name, value = %raw, "Unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Parses compact duration strings: a sequence of `<number><unit>` terms
/// where the unit is `ms`, `s`, `m`, or `h`. A bare number is seconds.
pub fn parse_duration(text: &str) -> Option<Duration> {
    if text.is_empty() {
        return None;
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit())?;
        if digits_end == 0 {
            return None;
        }
        let amount: u64 = rest[..digits_end].parse().ok()?;
        rest = &rest[digits_end..];

        let (unit_len, unit_ms) = if rest.starts_with("ms") {
            (2, 1)
        } else if rest.starts_with('s') {
            (1, 1_000)
        } else if rest.starts_with('m') {
            (1, 60_000)
        } else if rest.starts_with('h') {
            (1, 3_600_000)
        } else {
            return None;
        };
        rest = &rest[unit_len..];
        total += Duration::from_millis(amount.checked_mul(unit_ms)?);
    }
    Some(total)
}
