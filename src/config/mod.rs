//! Run configuration: defaults, config-file loading and validation.
//!
//! Values resolve in two layers, command line over config file. The file is
//! TOML with a single `[updater]` table carrying the same keys as the
//! command-line flags; unknown keys under that table are rejected.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::ApiLevel;
use crate::errors::ConfigError;

fn default_threads() -> usize {
    10
}

fn default_interval() -> u64 {
    15 * 60
}

fn default_timeout() -> u64 {
    5 * 60
}

/// How the updater schedules cycles.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run the update again after the configured interval, forever
    Endless,
    /// Execute the update once and exit
    Singlerun,
}

/// Log granularity. `info` logs every issued command and received payload,
/// `error` only logs failures.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// Resolved run parameters. Read-only for the scheduling core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Admin username, required when updating over HTTP
    pub user: Option<String>,
    /// Admin password for updating over HTTP
    pub password: String,
    /// Base URL of the installation, or the absolute path to its directory
    pub url: Option<String>,
    /// Custom absolute path to the php.ini used by the console updater
    pub phpini: Option<String>,
    pub loglevel: LogLevel,
    pub apilevel: ApiLevel,
    pub mode: Mode,
    /// How many feeds are updated in parallel
    pub threads: usize,
    /// Seconds between the start of one update run and the next
    pub interval: u64,
    /// Maximum seconds for a single feed update; 0 disables the limit
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            password: String::new(),
            url: None,
            phpini: None,
            loglevel: LogLevel::Error,
            apilevel: ApiLevel::V12,
            mode: Mode::Endless,
            threads: default_threads(),
            interval: default_interval(),
            timeout: default_timeout(),
        }
    }
}

/// Transport target resolved from a validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Update over the HTTP API
    Web {
        base_url: String,
        user: String,
        password: String,
    },
    /// Update through the console API of a local installation
    Console {
        directory: String,
        phpini: Option<String>,
    },
}

#[derive(Deserialize)]
struct ConfigFile {
    updater: Config,
}

impl Config {
    /// Loads the `[updater]` table from a TOML config file.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        Ok(file.updater)
    }

    /// Whether the configured url selects the HTTP transport.
    pub fn is_web(&self) -> bool {
        matches!(&self.url, Some(url) if url.starts_with("http://") || url.starts_with("https://"))
    }

    /// Validates the configuration and resolves the transport target.
    ///
    /// Returns every validation failure as a human-readable message when the
    /// configuration is unusable.
    pub fn validate(&self) -> Result<Target, Vec<String>> {
        let Some(url) = &self.url else {
            return Err(vec!["No url given".to_string()]);
        };

        if self.is_web() && self.user.is_none() {
            return Err(vec!["Url given but no user present".to_string()]);
        }
        if !self.is_web() {
            let path = Path::new(url);
            if !path.is_absolute() {
                return Err(vec!["Absolute path or full Url required".to_string()]);
            }
            if !path.is_dir() {
                return Err(vec!["Given path is not a directory".to_string()]);
            }
        }

        let mut messages = Vec::new();
        if self.threads < 1 {
            messages.push("Thread count must be at least 1".to_string());
        }
        if let Some(phpini) = &self.phpini {
            if !phpini.trim().is_empty() && !Path::new(phpini).is_absolute() {
                messages.push("Path to php.ini must be absolute".to_string());
            }
        }
        if !messages.is_empty() {
            return Err(messages);
        }

        Ok(match &self.user {
            Some(user) if self.is_web() => Target::Web {
                base_url: url.clone(),
                user: user.clone(),
                password: self.password.clone(),
            },
            _ => Target::Console {
                directory: url.clone(),
                phpini: self.phpini.clone(),
            },
        })
    }
}
