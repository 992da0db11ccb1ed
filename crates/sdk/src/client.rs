//! Main client for the ServiceNow SDK.

use crate::api::*;
use crate::config::{ClientConfig, Credentials, RetryConfig};
use crate::error::{ServiceNowError, ServiceNowResult};
use crate::transport::HttpTransport;
use crate::types::*;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The operations the MCP tools depend on.
///
/// Every method takes already-validated parameters and performs exactly one
/// logical operation against the instance. Retries and timeouts are the
/// implementation's concern.
#[async_trait::async_trait]
pub trait ServiceNowApi: Send + Sync {
    async fn query_records(&self, params: QueryRecordsParams) -> ServiceNowResult<QueryRecordsResponse>;
    async fn get_table_schema(&self, params: GetTableSchemaParams) -> ServiceNowResult<TableSchema>;
    async fn get_record(&self, params: GetRecordParams) -> ServiceNowResult<Record>;
    async fn get_user(&self, params: GetUserParams) -> ServiceNowResult<Record>;
    async fn get_group(&self, params: GetGroupParams) -> ServiceNowResult<Record>;
    async fn search_cmdb_ci(&self, params: SearchCmdbCiParams) -> ServiceNowResult<QueryRecordsResponse>;
    async fn get_cmdb_ci(&self, params: GetCmdbCiParams) -> ServiceNowResult<Record>;
    async fn list_relationships(&self, params: ListRelationshipsParams) -> ServiceNowResult<QueryRecordsResponse>;
    async fn list_discovery_schedules(
        &self,
        params: ListDiscoverySchedulesParams,
    ) -> ServiceNowResult<QueryRecordsResponse>;
    async fn list_mid_servers(&self, params: ListMidServersParams) -> ServiceNowResult<QueryRecordsResponse>;
    async fn list_active_events(&self, params: ListActiveEventsParams) -> ServiceNowResult<QueryRecordsResponse>;
    async fn cmdb_health_dashboard(&self) -> ServiceNowResult<CmdbHealthSummary>;
    async fn service_mapping_summary(
        &self,
        params: ServiceMappingSummaryParams,
    ) -> ServiceNowResult<ServiceMappingSummary>;
    async fn create_change_request(&self, params: CreateChangeRequestParams) -> ServiceNowResult<Record>;
    async fn natural_language_search(
        &self,
        params: NaturalLanguageSearchParams,
    ) -> ServiceNowResult<NaturalLanguageSearchResult>;
    async fn natural_language_update(
        &self,
        params: NaturalLanguageUpdateParams,
    ) -> ServiceNowResult<NaturalLanguageUpdateResult>;
}

/// Main client for interacting with a ServiceNow instance.
#[derive(Debug, Clone)]
pub struct ServiceNowClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl ServiceNowClient {
    /// Create a new client builder.
    pub fn builder() -> ServiceNowClientBuilder {
        ServiceNowClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> ServiceNowResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the Table API.
    pub fn table(&self) -> TableApi<'_> {
        TableApi::new(self)
    }

    /// Get the user/group API.
    pub fn identity(&self) -> IdentityApi<'_> {
        IdentityApi::new(self)
    }

    /// Get the CMDB API.
    pub fn cmdb(&self) -> CmdbApi<'_> {
        CmdbApi::new(self)
    }

    /// Get the ITOM API.
    pub fn itom(&self) -> ItomApi<'_> {
        ItomApi::new(self)
    }

    /// Get the change management API.
    pub fn changes(&self) -> ChangeApi<'_> {
        ChangeApi::new(self)
    }

    /// Get the natural language API.
    pub fn natural_language(&self) -> NaturalLanguageApi<'_> {
        NaturalLanguageApi::new(self)
    }
}

#[async_trait::async_trait]
impl ServiceNowApi for ServiceNowClient {
    async fn query_records(&self, params: QueryRecordsParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.table().query(&params).await
    }

    async fn get_table_schema(&self, params: GetTableSchemaParams) -> ServiceNowResult<TableSchema> {
        self.table().schema(&params.table).await
    }

    async fn get_record(&self, params: GetRecordParams) -> ServiceNowResult<Record> {
        self.table()
            .get(&params.table, &params.sys_id, params.fields.as_deref())
            .await
    }

    async fn get_user(&self, params: GetUserParams) -> ServiceNowResult<Record> {
        self.identity().user(&params.user_identifier).await
    }

    async fn get_group(&self, params: GetGroupParams) -> ServiceNowResult<Record> {
        self.identity().group(&params.group_identifier).await
    }

    async fn search_cmdb_ci(&self, params: SearchCmdbCiParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.cmdb().search(&params).await
    }

    async fn get_cmdb_ci(&self, params: GetCmdbCiParams) -> ServiceNowResult<Record> {
        self.cmdb().get(&params).await
    }

    async fn list_relationships(&self, params: ListRelationshipsParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.cmdb().relationships(&params).await
    }

    async fn list_discovery_schedules(
        &self,
        params: ListDiscoverySchedulesParams,
    ) -> ServiceNowResult<QueryRecordsResponse> {
        self.itom().discovery_schedules(&params).await
    }

    async fn list_mid_servers(&self, params: ListMidServersParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.itom().mid_servers(&params).await
    }

    async fn list_active_events(&self, params: ListActiveEventsParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.itom().active_events(&params).await
    }

    async fn cmdb_health_dashboard(&self) -> ServiceNowResult<CmdbHealthSummary> {
        self.cmdb().health_dashboard().await
    }

    async fn service_mapping_summary(
        &self,
        params: ServiceMappingSummaryParams,
    ) -> ServiceNowResult<ServiceMappingSummary> {
        self.itom().service_mapping_summary(&params).await
    }

    async fn create_change_request(&self, params: CreateChangeRequestParams) -> ServiceNowResult<Record> {
        self.changes().create(&params).await
    }

    async fn natural_language_search(
        &self,
        params: NaturalLanguageSearchParams,
    ) -> ServiceNowResult<NaturalLanguageSearchResult> {
        self.natural_language().search(&params).await
    }

    async fn natural_language_update(
        &self,
        params: NaturalLanguageUpdateParams,
    ) -> ServiceNowResult<NaturalLanguageUpdateResult> {
        self.natural_language().update(&params).await
    }
}

/// Builder for creating a ServiceNowClient.
pub struct ServiceNowClientBuilder {
    instance_url: Option<String>,
    credentials: Option<Credentials>,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl ServiceNowClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            instance_url: None,
            credentials: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the instance URL, e.g. `https://dev12345.service-now.com`.
    pub fn instance_url(mut self, url: impl Into<String>) -> Self {
        self.instance_url = Some(url.into());
        self
    }

    /// Authenticate with HTTP basic auth.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Authenticate with the OAuth password grant.
    pub fn oauth(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::OAuth {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> ServiceNowResult<ServiceNowClient> {
        let instance_url = self
            .instance_url
            .ok_or_else(|| ServiceNowError::Config("instance_url is required".to_string()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| ServiceNowError::Config("credentials are required".to_string()))?;

        let config = ClientConfig {
            instance_url: Url::parse(&instance_url)?,
            credentials,
            timeout: self.timeout,
            retry_config: self.retry_config,
        };

        ServiceNowClient::from_config(config)
    }
}

impl Default for ServiceNowClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_builder_requires_instance_url() {
        let err = ServiceNowClient::builder()
            .basic_auth("admin", "pw")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
    }

    #[test]
    fn test_builder_requires_credentials() {
        let err = ServiceNowClient::builder()
            .instance_url("https://dev12345.service-now.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("credentials"));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = ServiceNowClient::builder()
            .instance_url("not a url")
            .basic_auth("admin", "pw")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidUrl);
    }

    #[test]
    fn test_builder_applies_settings() {
        let client = ServiceNowClient::builder()
            .instance_url("https://dev12345.service-now.com")
            .oauth("id", "secret", "user", "pw")
            .timeout(Duration::from_secs(5))
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap();

        assert_eq!(client.config().timeout, Duration::from_secs(5));
        assert_eq!(client.config().retry_config.max_retries, 0);
        assert_eq!(client.config().credentials.method_name(), "oauth");
    }
}
