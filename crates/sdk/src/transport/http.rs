//! HTTP transport layer for the ServiceNow SDK.

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::error::{ServiceNowError, ServiceNowResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP transport for making authenticated API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    auth: Arc<Authenticator>,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> ServiceNowResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("servicenow-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        let auth = Authenticator::new(&config.credentials, &config.instance_url, client.clone())?;

        Ok(Self {
            client,
            auth: Arc::new(auth),
            config,
        })
    }

    /// Build a URL for the given path.
    fn build_url(&self, path: &str) -> ServiceNowResult<url::Url> {
        self.config
            .instance_url
            .join(path)
            .map_err(ServiceNowError::InvalidUrl)
    }

    /// Execute a request with authentication and retries.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> ServiceNowResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;
        let mut reauthenticated = false;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| ServiceNowError::Config("Request cannot be cloned".to_string()))?;
            let request = self.auth.apply(request).await?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    // A stale OAuth token gets one fresh attempt.
                    if status == 401 && !reauthenticated && self.auth.invalidate().await {
                        debug!("Access token rejected, re-authenticating");
                        reauthenticated = true;
                        continue;
                    }

                    let retry_after_secs = retry_after_secs(&response);

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status)
                    {
                        // Wait at least as long as the server asks, up to max_backoff.
                        let mut backoff = retry_config.backoff_for_attempt(attempts);
                        if let Some(secs) = retry_after_secs {
                            backoff = backoff.max(Duration::from_secs(secs));
                        }

                        if backoff <= retry_config.max_backoff {
                            warn!(
                                status = status,
                                attempt = attempts + 1,
                                backoff_ms = backoff.as_millis(),
                                "Request failed, retrying"
                            );
                            tokio::time::sleep(backoff).await;
                            attempts += 1;
                            continue;
                        }

                        debug!(
                            retry_after_secs = ?retry_after_secs,
                            "Requested wait exceeds max backoff, not retrying"
                        );
                    }

                    if status == 429 {
                        return Err(ServiceNowError::RateLimited { retry_after_secs });
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(ServiceNowError::from_response(status, &body));
                }
                Err(e) => {
                    if attempts < retry_config.max_retries && (e.is_timeout() || e.is_connect()) {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            error = %e,
                            "Request did not complete, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    if e.is_timeout() {
                        return Err(ServiceNowError::Timeout);
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ServiceNowResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self
            .execute_with_retry(self.client.get(url).query(query))
            .await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ServiceNowResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.client.post(url).json(body))
            .await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Execute a PATCH request.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ServiceNowResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "PATCH request");

        let response = self
            .execute_with_retry(self.client.patch(url).json(body))
            .await?;
        let body = response.json().await?;
        Ok(body)
    }
}

/// Delay-seconds form of `Retry-After`; HTTP dates are ignored.
fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
