use std::{
    env,
    net::{AddrParseError, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use interfaces_github_gists::index::{self as github, GitHubApi};
use interfaces_pipedrive_activities::index::{self as pipedrive, PipedriveApi};
use thiserror::Error;

use crate::registry::models::DuplicatePolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60 * 60;
pub const DEFAULT_SNAPSHOT_PATH: &str = "users.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PIPEDRIVE_TOKEN is required")]
    MissingPipedriveToken,

    #[error("invalid GIST_TRACKER_BIND_ADDR: {source}")]
    InvalidBindAddr {
        #[from]
        source: AddrParseError,
    },

    #[error("invalid GIST_TRACKER_POLL_INTERVAL_SECS: {0}")]
    InvalidPollInterval(String),

    #[error("invalid GIST_TRACKER_DUPLICATE_POLICY: {0}")]
    InvalidDuplicatePolicy(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub poll_interval: Duration,
    pub duplicate_policy: DuplicatePolicy,
    /// `None` disables persistence.
    pub snapshot_path: Option<PathBuf>,
    pub log_level: String,
    pub github: GitHubApi,
    pub pipedrive: PipedriveApi,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let pipedrive_token = value("PIPEDRIVE_TOKEN").ok_or(ConfigError::MissingPipedriveToken)?;

        let bind_addr = value("GIST_TRACKER_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()?;

        let poll_interval_secs = match value("GIST_TRACKER_POLL_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|error| ConfigError::InvalidPollInterval(format!("{raw}: {error}")))?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval("must be greater than zero".to_string()));
        }

        let duplicate_policy = match value("GIST_TRACKER_DUPLICATE_POLICY") {
            Some(raw) => raw
                .parse::<DuplicatePolicy>()
                .map_err(ConfigError::InvalidDuplicatePolicy)?,
            None => DuplicatePolicy::default(),
        };

        // An explicitly empty path turns persistence off, unset uses the default.
        let snapshot_path = match lookup("GIST_TRACKER_SNAPSHOT_PATH") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw.trim())),
            None => Some(PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
        };

        Ok(Self {
            bind_addr,
            poll_interval: Duration::from_secs(poll_interval_secs),
            duplicate_policy,
            snapshot_path,
            log_level: value("GIST_TRACKER_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            github: GitHubApi {
                base_url: value("GITHUB_API_URL").unwrap_or_else(|| github::DEFAULT_API_URL.to_string()),
                token: value("GITHUB_TOKEN"),
            },
            pipedrive: PipedriveApi {
                base_url: value("PIPEDRIVE_API_URL")
                    .unwrap_or_else(|| pipedrive::DEFAULT_API_URL.to_string()),
                api_token: pipedrive_token,
            },
        })
    }
}
