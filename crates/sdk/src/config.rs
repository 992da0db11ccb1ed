//! Configuration types for the ServiceNow SDK.

use std::fmt;
use std::time::Duration;
use url::Url;

/// Configuration for the ServiceNow client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ServiceNow instance.
    pub instance_url: Url,
    /// Credentials for the chosen authentication method.
    pub credentials: Credentials,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    /// Create a new configuration with the given instance URL and credentials.
    pub fn new(instance_url: Url, credentials: Credentials) -> Self {
        Self {
            instance_url,
            credentials,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

/// Authentication method plus the credentials it needs.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth 2.0 password grant against `/oauth_token.do`.
    OAuth {
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
    },
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

impl Credentials {
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::OAuth { .. } => "oauth",
            Self::Basic { .. } => "basic",
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OAuth {
                client_id,
                username,
                ..
            } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_delay: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms =
            self.retry_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}
