use crate::domain::feed::SystemSettings;
use crate::error::{AppError, AppResult};
use reqwest::header::HeaderValue;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Defaults for the per-cycle settings
    pub request_timeout_seconds: u64,
    pub user_agent: String,
    pub cycle_pause_seconds: u64,
    // Fan-out width of one cycle
    pub max_concurrent_fetches: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            request_timeout_seconds: parse_var("REQUEST_TIMEOUT_SECONDS", 30)?,
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            cycle_pause_seconds: parse_var("CYCLE_PAUSE_SECONDS", 300)?,
            max_concurrent_fetches: parse_var("MAX_CONCURRENT_FETCHES", 8)?,
        };

        if config.max_concurrent_fetches == 0 {
            return Err(AppError::Config(
                "MAX_CONCURRENT_FETCHES must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Per-cycle settings before any operator override is applied.
    pub fn ingest_defaults(&self) -> IngestSettings {
        IngestSettings {
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            user_agent: self.user_agent.clone(),
            pause: Duration::from_secs(self.cycle_pause_seconds),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("feedtape-ingest/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Settings read at the start of every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub request_timeout: Duration,
    pub user_agent: String,
    pub pause: Duration,
}

impl IngestSettings {
    /// Apply the operator overrides from the settings row on top of `self`.
    /// Non-positive timeouts, negative pauses and user agents that are blank or
    /// not a valid header value are ignored.
    pub fn with_overrides(mut self, overrides: Option<&SystemSettings>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };

        match overrides.request_timeout_seconds {
            Some(secs) if secs > 0 => self.request_timeout = Duration::from_secs(secs as u64),
            Some(secs) => tracing::warn!(secs, "Ignoring non-positive request timeout override"),
            None => {}
        }

        if let Some(agent) = overrides.user_agent.as_deref().map(str::trim) {
            if agent.is_empty() {
                tracing::warn!("Ignoring blank user agent override");
            } else if HeaderValue::from_str(agent).is_err() {
                tracing::warn!(
                    user_agent = ?agent,
                    "Ignoring user agent override that is not a valid header value"
                );
            } else {
                self.user_agent = agent.to_string();
            }
        }

        match overrides.pause_seconds {
            Some(secs) if secs >= 0 => self.pause = Duration::from_secs(secs as u64),
            Some(secs) => tracing::warn!(secs, "Ignoring negative pause override"),
            None => {}
        }

        self
    }
}
