use std::io;

use approach_feeds::error::FeedError;
use config::ConfigError;
use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;

pub(crate) type ApplicationResult<T> = Result<T, ApplicationError>;

#[derive(Debug, Error)]
pub(crate) enum ApplicationError {
    #[error("Error regarding config: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Invalid config value for `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
    #[error("Failed to write config file: {0}")]
    TomlWriteError(#[from] toml::ser::Error),
    #[error("Could not determine the config directory for this user")]
    NoProjectDirectory,
    #[error("System input/output error: {0}")]
    IoError(#[from] io::Error),
    #[error("Error with reqwest: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("{url} answered with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Invalid request header name: {0}")]
    HeaderNameError(#[from] InvalidHeaderName),
    #[error("Invalid request header value: {0}")]
    HeaderValueError(#[from] InvalidHeaderValue),
    #[error("Failed to read upstream response: {0}")]
    FeedError(#[from] FeedError),
    #[error("Invalid log filter: {0}")]
    LogFilterError(#[from] ParseError),
}
