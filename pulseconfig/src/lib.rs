//! # pulseconfig - environment-driven service configuration
//!
//! Every deployment knob of the broadcast service comes from environment
//! variables: the HTTP port, the frame tick interval, the radio-injection
//! tuning, the upstream catalog endpoint, snapshot-store credentials and the
//! optional webhook/command tokens. Numeric fields carry their unit in the
//! name (`*_MS`, `*_SECS`) and expose [`Duration`] helpers.
//!
//! Loading fails with a typed error on a missing required variable or an
//! unparsable value, so the binary can exit non-zero before any subsystem
//! starts.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Result type alias for configuration loading
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading the environment
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required variable is absent
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// A variable is present but does not parse
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How radio segments are injected between master tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioInjectionMode {
    /// The cooldown is a hard threshold.
    Threshold,
    /// Injection chance grows with elapsed/cooldown, capped by
    /// `RANDOM_MAX_CHANCE`.
    Probability,
}

impl FromStr for RadioInjectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threshold" => Ok(Self::Threshold),
            "probability" => Ok(Self::Probability),
            other => Err(format!(
                "unknown injection mode {other:?} (expected \"threshold\" or \"probability\")"
            )),
        }
    }
}

/// Service configuration, one field per environment variable.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PORT` - HTTP listener port
    pub http_port: u16,
    /// `FRAME_INTERVAL_MS` - broadcast tick interval
    pub frame_interval_ms: u64,
    /// `RADIO_COOLDOWN_SECS` - minimum interval between radio injections
    pub radio_cooldown_seconds: u64,
    /// `RADIO_INJECTION_MODE` - threshold or probability
    pub radio_injection_mode: RadioInjectionMode,
    /// `RANDOM_MAX_CHANCE` - injection chance cap in probability mode
    pub random_max_chance: f64,
    /// `FETCH_BASE_URL` - upstream catalog endpoint (required)
    pub fetch_base_url: String,
    /// `FETCH_AUTH_TOKEN` - optional bearer token for upstream requests
    pub fetch_auth_token: Option<String>,
    /// `GITHUB_TOKEN` - snapshot store credential
    pub github_token: Option<String>,
    /// `GITHUB_GIST_ID` - snapshot store location
    pub github_gist_id: Option<String>,
    /// `SAVE_INTERVAL_SECS` - auto-save period
    pub save_interval_seconds: u64,
    /// `NOW_PLAYING_WEBHOOK_URL` - announcement webhook, empty disables
    pub now_playing_webhook_url: Option<String>,
    /// `COMMAND_AUTH_TOKEN` - bearer token guarding the command API
    pub command_auth_token: Option<String>,
}

impl Config {
    const fn default_port() -> u16 {
        8080
    }

    const fn default_frame_interval_ms() -> u64 {
        100
    }

    const fn default_radio_cooldown_seconds() -> u64 {
        30 * 60
    }

    const fn default_random_max_chance() -> f64 {
        0.1
    }

    const fn default_save_interval_seconds() -> u64 {
        3600
    }

    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through an injected lookup (testable).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self {
            http_port: parse_or("PORT", &lookup, Self::default_port())?,
            frame_interval_ms: parse_or(
                "FRAME_INTERVAL_MS",
                &lookup,
                Self::default_frame_interval_ms(),
            )?,
            radio_cooldown_seconds: parse_or(
                "RADIO_COOLDOWN_SECS",
                &lookup,
                Self::default_radio_cooldown_seconds(),
            )?,
            radio_injection_mode: parse_or(
                "RADIO_INJECTION_MODE",
                &lookup,
                RadioInjectionMode::Threshold,
            )?,
            random_max_chance: parse_or(
                "RANDOM_MAX_CHANCE",
                &lookup,
                Self::default_random_max_chance(),
            )?,
            fetch_base_url: required("FETCH_BASE_URL", &lookup)?,
            fetch_auth_token: optional("FETCH_AUTH_TOKEN", &lookup),
            github_token: optional("GITHUB_TOKEN", &lookup),
            github_gist_id: optional("GITHUB_GIST_ID", &lookup),
            save_interval_seconds: parse_or(
                "SAVE_INTERVAL_SECS",
                &lookup,
                Self::default_save_interval_seconds(),
            )?,
            now_playing_webhook_url: optional("NOW_PLAYING_WEBHOOK_URL", &lookup),
            command_auth_token: optional("COMMAND_AUTH_TOKEN", &lookup),
        };

        // A zero interval cannot drive a ticker.
        if config.frame_interval_ms == 0 {
            return Err(Error::InvalidVar {
                name: "FRAME_INTERVAL_MS",
                value: "0".to_string(),
                reason: "the frame interval must be at least 1ms".to_string(),
            });
        }
        if config.save_interval_seconds == 0 {
            return Err(Error::InvalidVar {
                name: "SAVE_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "the auto-save interval must be at least 1s".to_string(),
            });
        }

        Ok(config)
    }

    /// Broadcast tick interval as a [`Duration`]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Radio injection cooldown as a [`Duration`]
    pub fn radio_cooldown(&self) -> Duration {
        Duration::from_secs(self.radio_cooldown_seconds)
    }

    /// Auto-save period as a [`Duration`]
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_seconds)
    }

    /// Whether both snapshot-store credentials are present
    pub fn snapshot_store_configured(&self) -> bool {
        self.github_token.is_some() && self.github_gist_id.is_some()
    }
}

fn required(name: &'static str, lookup: &impl Fn(&str) -> Option<String>) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::MissingVar(name)),
    }
}

fn optional(name: &'static str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup(name).filter(|value| !value.is_empty())
}

fn parse_or<T>(
    name: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => value.parse().map_err(|err: T::Err| {
            Error::InvalidVar {
                name,
                value,
                reason: err.to_string(),
            }
        }),
        _ => Ok(default),
    }
}
