use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

/// Base URL used when `LEDGERDESK_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Connection settings for the remote accounting API.
///
/// Loaded from the environment by [`ClientConfig::from_env`]; the binary
/// calls `dotenv()` first so a local `.env` file is honoured.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to (no trailing slash)
    pub api_base_url: String,

    /// Bearer token used to seed the session, if one is configured
    pub api_token: Option<String>,

    /// Per-request timeout; `None` leaves the HTTP client default in place
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Config for `api_base_url` with no token and no timeout.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url.into()),
            api_token: None,
            request_timeout: None,
        }
    }

    /// Sets the bearer token the session starts with.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Bounds every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Reads `LEDGERDESK_API_URL`, `LEDGERDESK_API_TOKEN` and
    /// `LEDGERDESK_TIMEOUT_SECONDS` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("LEDGERDESK_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_token = lookup("LEDGERDESK_API_TOKEN").filter(|s| !s.trim().is_empty());

        let request_timeout = match lookup("LEDGERDESK_TIMEOUT_SECONDS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    ApiError::InvalidConfig(format!("Invalid LEDGERDESK_TIMEOUT_SECONDS: {}", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            api_base_url: normalize_base_url(base_url),
            api_token,
            request_timeout,
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
