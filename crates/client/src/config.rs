//! Client configuration (endpoints, timeouts, cache lifetimes).

use std::time::Duration;

use thiserror::Error;

use tollgate_auth::GuardPaths;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const DEFAULT_TOKEN_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_STATUS_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_MESSAGE_CAP: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Paths of the auth endpoints, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub status: String,
    pub login: String,
    pub logout: String,
    pub refresh: String,
    pub csrf_token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            status: "/auth/status".to_string(),
            login: "/auth/login".to_string(),
            logout: "/auth/logout".to_string(),
            refresh: "/auth/refresh".to_string(),
            csrf_token: "/csrf-token".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub endpoints: Endpoints,
    /// Header carrying the anti-forgery token on mutating requests.
    pub csrf_header: String,
    /// Upper bound on waiting for the anti-forgery token before failing closed.
    pub token_fetch_timeout: Duration,
    /// How long a resolved session status is reused. `None` disables the memo.
    pub status_cache_ttl: Option<Duration>,
    /// Lifetime of a cached anti-forgery token. `None` keeps it until cleared.
    pub csrf_token_ttl: Option<Duration>,
    /// Maximum length of a server message shown to the user.
    pub login_message_cap: usize,
    pub paths: GuardPaths,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            endpoints: Endpoints::default(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            token_fetch_timeout: DEFAULT_TOKEN_FETCH_TIMEOUT,
            status_cache_ttl: Some(DEFAULT_STATUS_CACHE_TTL),
            csrf_token_ttl: None,
            login_message_cap: DEFAULT_MESSAGE_CAP,
            paths: GuardPaths::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_token_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.token_fetch_timeout = timeout;
        self
    }

    pub fn with_status_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.status_cache_ttl = ttl;
        self
    }

    pub fn with_csrf_token_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.csrf_token_ttl = ttl;
        self
    }

    pub fn with_paths(mut self, paths: GuardPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Defaults overridden by `TOLLGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    ///
    /// - `TOLLGATE_API_URL`
    /// - `TOLLGATE_TOKEN_TIMEOUT_MS`
    /// - `TOLLGATE_STATUS_TTL_MS` (`0` disables the status memo)
    /// - `TOLLGATE_CSRF_TTL_MS` (`0` keeps the token until cleared)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("TOLLGATE_API_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Empty {
                    var: "TOLLGATE_API_URL",
                });
            }
            config.api_url = url.to_string();
        }

        if let Some(timeout) = millis(&lookup, "TOLLGATE_TOKEN_TIMEOUT_MS")? {
            config.token_fetch_timeout = timeout;
        }
        if let Some(ttl) = millis(&lookup, "TOLLGATE_STATUS_TTL_MS")? {
            config.status_cache_ttl = (!ttl.is_zero()).then_some(ttl);
        }
        if let Some(ttl) = millis(&lookup, "TOLLGATE_CSRF_TTL_MS")? {
            config.csrf_token_ttl = (!ttl.is_zero()).then_some(ttl);
        }

        Ok(config)
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidDuration { var, value })
        })
        .transpose()
}
