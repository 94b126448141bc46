//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::RecordCacheConfig;

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_LIST_RETRIES: u32 = 2;
const DEFAULT_STALE_TIME_SECS: u64 = 30;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The configured backend URL does not parse.
    #[error("invalid API URL `{url}`: {source}")]
    InvalidApiUrl {
        /// Rejected value.
        url: String,
        /// Parser failure.
        source: url::ParseError,
    },
}

/// Configuration values for reaching the user backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_ADMIN")]
pub struct ClientSettings {
    /// Base URL of the REST backend.
    pub api_url: Option<String>,
    /// Upper bound for one backend call, in milliseconds.
    #[ortho_config(default = 10_000)]
    pub request_timeout_ms: u64,
    /// Extra attempts for a failed list fetch.
    pub list_retries: Option<u32>,
    /// Age after which the cached list is refetched, in seconds.
    pub stale_time_secs: Option<u64>,
}

impl ClientSettings {
    /// Return the configured base URL, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidApiUrl`] when the value does not parse.
    pub fn api_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        Url::parse(raw).map_err(|source| SettingsError::InvalidApiUrl {
            url: raw.to_owned(),
            source,
        })
    }

    /// Return the per-call time bound.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Return the record cache configuration implied by these settings.
    #[must_use]
    pub fn cache_config(&self) -> RecordCacheConfig {
        RecordCacheConfig {
            list_retries: self.list_retries.unwrap_or(DEFAULT_LIST_RETRIES),
            stale_time: Duration::from_secs(
                self.stale_time_secs.unwrap_or(DEFAULT_STALE_TIME_SECS),
            ),
            ..RecordCacheConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 4] = [
        "USER_ADMIN_API_URL",
        "USER_ADMIN_REQUEST_TIMEOUT_MS",
        "USER_ADMIN_LIST_RETRIES",
        "USER_ADMIN_STALE_TIME_SECS",
    ];

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("user-admin")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.api_url.is_none());
        assert_eq!(settings.request_timeout_ms, 10_000);
        assert_eq!(
            settings.api_url().expect("default URL").as_str(),
            "http://localhost:3001/"
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        let cache = settings.cache_config();
        assert_eq!(cache.list_retries, 2);
        assert_eq!(cache.stale_time, Duration::from_secs(30));
        assert_eq!(cache.retry_base_delay, Duration::from_secs(1));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("USER_ADMIN_API_URL", Some("https://users.example.org/api".to_owned())),
            ("USER_ADMIN_REQUEST_TIMEOUT_MS", Some("2500".to_owned())),
            ("USER_ADMIN_LIST_RETRIES", Some("0".to_owned())),
            ("USER_ADMIN_STALE_TIME_SECS", Some("5".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_url().expect("configured URL").as_str(),
            "https://users.example.org/api"
        );
        assert_eq!(settings.request_timeout(), Duration::from_millis(2500));
        assert_eq!(settings.cache_config().list_retries, 0);
        assert_eq!(settings.cache_config().stale_time, Duration::from_secs(5));
    }

    #[rstest]
    fn malformed_urls_are_reported() {
        let _guard = lock_env([
            ("USER_ADMIN_API_URL", Some("not a url".to_owned())),
            ("USER_ADMIN_REQUEST_TIMEOUT_MS", None),
            ("USER_ADMIN_LIST_RETRIES", None),
            ("USER_ADMIN_STALE_TIME_SECS", None),
        ]);

        let error = load_from_empty_args().api_url().expect_err("malformed URL");
        assert!(error.to_string().contains("not a url"));
    }
}
