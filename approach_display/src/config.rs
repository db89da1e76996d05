use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use approach_feeds::endpoints;
use config::Config;
use directories::ProjectDirs;
use indexmap::IndexMap;
use itertools::Itertools;
use jiff::SignedDuration;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::debug;

use crate::error::{ApplicationError, ApplicationResult};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Longest interval accepted from the config file.
const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

pub(crate) fn approach_display_project_dir() -> ApplicationResult<ProjectDirs> {
    ProjectDirs::from("", "meltinglava", "approach_display")
        .ok_or(ApplicationError::NoProjectDirectory)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug)]
pub(crate) struct PortalConfig {
    config_file_path: PathBuf,
    config: Configurable,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Configurable {
    airport_code: String,
    monitored_runway: String,
    advisory_url: String,
    weather_url: String,
    flight_feed_url: String,
    corridor_bounds: String,
    flight_feed_query: String,
    connection_timeout_secs: u64,
    max_approach_altitude_ft: i64,
    runway_check_interval_secs: u64,
    weather_refresh_interval_secs: u64,
    flight_poll_interval_secs: u64,
    inactive_poll_interval_secs: u64,
    error_backoff_secs: u64,
    liveness_slice_secs: u64,
    log_level: String,
    log_format: LogFormat,
    log_directory: Option<PathBuf>,
    request_headers: IndexMap<String, String>,
}

impl Default for Configurable {
    fn default() -> Self {
        Self {
            airport_code: endpoints::AIRPORT_CODE.to_string(),
            monitored_runway: "04".to_string(),
            advisory_url: endpoints::ADVISORY_URL.to_string(),
            weather_url: endpoints::WEATHER_URL.to_string(),
            flight_feed_url: endpoints::FLIGHT_FEED_URL.to_string(),
            corridor_bounds: endpoints::CORRIDOR_BOUNDS.to_string(),
            flight_feed_query: endpoints::FLIGHT_FEED_QUERY.to_string(),
            connection_timeout_secs: 10,
            max_approach_altitude_ft: 5000,
            runway_check_interval_secs: 900,
            weather_refresh_interval_secs: 300,
            flight_poll_interval_secs: 30,
            inactive_poll_interval_secs: 60,
            error_backoff_secs: 30,
            liveness_slice_secs: 5,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_directory: None,
            request_headers: endpoints::FLIGHT_FEED_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Configurable {
    fn validate(&self) -> ApplicationResult<()> {
        let intervals = [
            ("connection_timeout_secs", self.connection_timeout_secs),
            ("runway_check_interval_secs", self.runway_check_interval_secs),
            ("weather_refresh_interval_secs", self.weather_refresh_interval_secs),
            ("flight_poll_interval_secs", self.flight_poll_interval_secs),
            ("inactive_poll_interval_secs", self.inactive_poll_interval_secs),
            ("error_backoff_secs", self.error_backoff_secs),
            ("liveness_slice_secs", self.liveness_slice_secs),
        ];
        for (key, secs) in intervals {
            if secs == 0 || secs > MAX_INTERVAL_SECS {
                return Err(ApplicationError::InvalidConfig {
                    key,
                    reason: format!("{secs} is not between 1 and {MAX_INTERVAL_SECS} seconds"),
                });
            }
        }
        if self.monitored_runway.is_empty()
            || !self.monitored_runway.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ApplicationError::InvalidConfig {
                key: "monitored_runway",
                reason: format!("'{}' is not a runway number", self.monitored_runway),
            });
        }
        Ok(())
    }
}

impl PortalConfig {
    /// Reads the config file, writing the bundled one first when it is missing
    /// or `clean_config` is set. Without `path` the file lives in the user's
    /// config directory.
    pub fn load(clean_config: bool, path: Option<&Path>) -> ApplicationResult<Self> {
        let config_file_path = match path {
            Some(path) => path.to_path_buf(),
            None => approach_display_project_dir()?
                .config_dir()
                .join("config.toml"),
        };
        if clean_config || !config_file_path.exists() {
            if let Some(parent) = config_file_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_file_path, DEFAULT_CONFIG)?;
        }
        let config = read_configuration(&config_file_path)?;
        debug!(path = ?config_file_path, "Loaded configuration");
        Ok(Self {
            config_file_path,
            config,
        })
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_file_path
    }

    pub fn to_toml(&self) -> ApplicationResult<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }

    pub fn airport_code(&self) -> &str {
        &self.config.airport_code
    }

    pub fn monitored_runway(&self) -> &str {
        &self.config.monitored_runway
    }

    pub fn advisory_url(&self) -> &str {
        &self.config.advisory_url
    }

    pub fn weather_url(&self) -> &str {
        &self.config.weather_url
    }

    pub fn flight_feed_url(&self) -> String {
        endpoints::flight_feed_url(
            &self.config.flight_feed_url,
            &self.config.corridor_bounds,
            &self.config.flight_feed_query,
        )
    }

    pub fn request_headers(&self) -> ApplicationResult<HeaderMap> {
        self.config
            .request_headers
            .iter()
            .map(|(name, value)| -> ApplicationResult<(HeaderName, HeaderValue)> {
                Ok((
                    HeaderName::from_bytes(name.as_bytes())?,
                    HeaderValue::from_str(value)?,
                ))
            })
            .try_collect()
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.config.connection_timeout_secs)
    }

    pub fn max_approach_altitude_ft(&self) -> i64 {
        self.config.max_approach_altitude_ft
    }

    pub fn runway_ttl(&self) -> SignedDuration {
        signed_secs(self.config.runway_check_interval_secs)
    }

    pub fn weather_ttl(&self) -> SignedDuration {
        signed_secs(self.config.weather_refresh_interval_secs)
    }

    pub fn flight_poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.flight_poll_interval_secs)
    }

    pub fn inactive_poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.inactive_poll_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.config.error_backoff_secs)
    }

    pub fn liveness_slice(&self) -> Duration {
        Duration::from_secs(self.config.liveness_slice_secs)
    }

    pub fn log_level(&self) -> &str {
        &self.config.log_level
    }

    pub fn log_format(&self) -> LogFormat {
        self.config.log_format
    }

    pub fn log_directory(&self) -> Option<&Path> {
        self.config.log_directory.as_deref()
    }
}

// Validated to be at most a day, so the cast cannot wrap.
fn signed_secs(secs: u64) -> SignedDuration {
    SignedDuration::from_secs(secs as i64)
}

fn read_configuration(path: &Path) -> ApplicationResult<Configurable> {
    let configurable = Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(true))
        .add_source(config::Environment::with_prefix("APPROACH_DISPLAY").try_parsing(true))
        .build()?
        .try_deserialize::<Configurable>()?;
    configurable.validate()?;
    Ok(configurable)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    impl PortalConfig {
        pub fn new_for_test() -> Self {
            Self {
                config_file_path: PathBuf::from("config.toml"),
                config: Configurable::default(),
            }
        }
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let bundled = Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Configurable>()
            .unwrap();
        let defaults = Configurable::default();
        assert_eq!(bundled.airport_code, defaults.airport_code);
        assert_eq!(bundled.monitored_runway, defaults.monitored_runway);
        assert_eq!(bundled.flight_feed_query, defaults.flight_feed_query);
        assert_eq!(bundled.runway_check_interval_secs, 900);
        assert_eq!(bundled.weather_refresh_interval_secs, 300);
        assert_eq!(bundled.liveness_slice_secs, 5);
        assert_eq!(bundled.log_format, LogFormat::Pretty);
        assert_eq!(bundled.log_directory, None);
        assert_eq!(bundled.request_headers.len(), 3);
        bundled.validate().unwrap();
    }

    #[test]
    fn test_load_writes_bundled_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = PortalConfig::load(false, Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_file_path(), path);
        assert_eq!(config.monitored_runway(), "04");
        assert_eq!(config.runway_ttl(), SignedDuration::from_secs(900));
        assert_eq!(config.request_headers().unwrap().len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "monitored_runway = \"22\"\nflight_poll_interval_secs = 15\nlog_format = \"json\"\n",
        )
        .unwrap();
        let config = PortalConfig::load(false, Some(&path)).unwrap();
        assert_eq!(config.monitored_runway(), "22");
        assert_eq!(config.flight_poll_interval(), Duration::from_secs(15));
        assert_eq!(config.inactive_poll_interval(), Duration::from_secs(60));
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.airport_code(), "LGA");
    }

    #[test]
    fn test_clean_config_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "monitored_runway = \"31\"\n").unwrap();
        let config = PortalConfig::load(true, Some(&path)).unwrap();
        assert_eq!(config.monitored_runway(), "04");
    }

    #[test]
    fn test_zero_liveness_slice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "liveness_slice_secs = 0\n").unwrap();
        let err = PortalConfig::load(false, Some(&path)).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::InvalidConfig {
                key: "liveness_slice_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_runway_with_position_letter_is_rejected() {
        let config = Configurable {
            monitored_runway: "04L".to_string(),
            ..Configurable::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flight_feed_url() {
        let config = PortalConfig::new_for_test();
        assert!(config.flight_feed_url().starts_with(
            "https://data-cloud.flightradar24.com/zones/fcgi/feed.js?bounds=40.756132,40.686813"
        ));
        assert!(config.flight_feed_url().ends_with("&limit=1"));
    }

    #[test]
    fn test_to_toml_skips_missing_log_directory() {
        let toml = PortalConfig::new_for_test().to_toml().unwrap();
        assert!(toml.contains("monitored_runway = \"04\""));
        assert!(!toml.contains("log_directory"));
    }
}
