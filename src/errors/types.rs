//! Error type definitions for the news updater.

use thiserror::Error;

/// Errors raised while resolving the configuration.
///
/// These surface before the updater starts and terminate the process with a
/// nonzero exit code; they are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or contains unknown keys
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors raised by the transport API.
///
/// Hook and feed-list failures fail the surrounding cycle; a failure from a
/// single feed update is absorbed by the worker that ran it.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network-level failure from the HTTP transport
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status code
    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// A base URL from the configuration could not be parsed
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The update command could not be started
    #[error("could not start command '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The update command ran but exited with a failure status
    #[error("command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// A single feed update exceeded the configured per-item timeout
    #[error("update of feed {feed_id} for user {user_id} timed out after {seconds} seconds")]
    Timeout {
        feed_id: i64,
        user_id: String,
        seconds: u64,
    },

    /// The feed list returned by the server could not be parsed
    #[error("could not parse the feed list JSON: {payload}")]
    FeedListJson {
        payload: String,
        #[source]
        source: serde_json::Error,
    },
}
