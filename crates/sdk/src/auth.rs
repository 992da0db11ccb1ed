//! Request authentication (basic or OAuth password grant).

use crate::config::Credentials;
use crate::error::{ServiceNowError, ServiceNowResult};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Tokens are refreshed this long before ServiceNow says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Token endpoint response. Only the fields used here are kept.
#[derive(Debug, Clone, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    1800
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Attaches credentials to outgoing requests.
pub(crate) enum Authenticator {
    Basic { username: String, password: String },
    OAuth(OAuthTokenProvider),
}

impl Authenticator {
    pub(crate) fn new(credentials: &Credentials, instance_url: &Url, client: Client) -> ServiceNowResult<Self> {
        match credentials {
            Credentials::Basic { username, password } => Ok(Self::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            Credentials::OAuth {
                client_id,
                client_secret,
                username,
                password,
            } => Ok(Self::OAuth(OAuthTokenProvider {
                client,
                token_url: instance_url.join("/oauth_token.do")?,
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                username: username.clone(),
                password: password.clone(),
                cached: Mutex::new(None),
            })),
        }
    }

    /// Add the authorization header to a request.
    pub(crate) async fn apply(&self, request: RequestBuilder) -> ServiceNowResult<RequestBuilder> {
        match self {
            Self::Basic { username, password } => Ok(request.basic_auth(username, Some(password))),
            Self::OAuth(provider) => {
                let token = provider.access_token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    /// Forget any cached token so the next request re-authenticates.
    /// Returns whether a token was dropped.
    pub(crate) async fn invalidate(&self) -> bool {
        match self {
            Self::OAuth(provider) => provider.cached.lock().await.take().is_some(),
            Self::Basic { .. } => false,
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f.debug_struct("Basic").field("username", username).finish(),
            Self::OAuth(provider) => f
                .debug_struct("OAuth")
                .field("token_url", &provider.token_url.as_str())
                .field("client_id", &provider.client_id)
                .field("username", &provider.username)
                .finish(),
        }
    }
}

/// Fetches and caches OAuth access tokens.
pub(crate) struct OAuthTokenProvider {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthTokenProvider {
    async fn access_token(&self) -> ServiceNowResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = self.request_token().await?;
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(response.access_token)
    }

    async fn request_token(&self) -> ServiceNowResult<OAuthTokenResponse> {
        debug!(url = %self.token_url, "Requesting OAuth access token");

        let form = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceNowError::Timeout
                } else {
                    ServiceNowError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceNowError::Authentication(format!(
                "OAuth token request failed (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<OAuthTokenResponse>()
            .await
            .map_err(|e| ServiceNowError::Authentication(format!("Invalid OAuth token response: {}", e)))
    }
}
