use crate::client::ServiceNowClient;
use crate::config::RetryConfig;
use std::time::Duration;
use wiremock::MockServer;

/// A basic-auth client pointed at a mock instance, without retries.
pub(crate) fn mock_client(server: &MockServer) -> ServiceNowClient {
    ServiceNowClient::builder()
        .instance_url(server.uri())
        .basic_auth("admin", "admin")
        .timeout(Duration::from_secs(5))
        .retry_config(RetryConfig::no_retry())
        .build()
        .unwrap()
}
