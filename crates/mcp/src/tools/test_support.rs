use serde::de::DeserializeOwned;
use serde::Serialize;
use servicenow_sdk::types::*;
use servicenow_sdk::{ServiceNowApi, ServiceNowError, ServiceNowResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Records every client call and answers from canned JSON.
///
/// Methods without a canned response fail with `NOT_FOUND`; methods set up
/// with [`StubClient::failing`] return an API error with that status.
#[derive(Default)]
pub(crate) struct StubClient {
    responses: HashMap<&'static str, serde_json::Value>,
    failures: HashMap<&'static str, (u16, String)>,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl StubClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_response(mut self, method: &'static str, response: serde_json::Value) -> Self {
        self.responses.insert(method, response);
        self
    }

    pub(crate) fn failing(mut self, method: &'static str, status: u16, message: &str) -> Self {
        self.failures.insert(method, (status, message.to_string()));
        self
    }

    /// Calls made so far, as `(method, params)`.
    pub(crate) fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn respond<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: &P) -> ServiceNowResult<T> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), serde_json::to_value(params).unwrap()));

        if let Some((status, message)) = self.failures.get(method) {
            return Err(ServiceNowError::Api {
                status: *status,
                message: message.clone(),
                detail: None,
            });
        }

        match self.responses.get(method) {
            Some(response) => Ok(serde_json::from_value(response.clone())?),
            None => Err(ServiceNowError::NotFound(format!("no stub response for {}", method))),
        }
    }
}

#[async_trait::async_trait]
impl ServiceNowApi for StubClient {
    async fn query_records(&self, params: QueryRecordsParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.respond("query_records", &params)
    }

    async fn get_table_schema(&self, params: GetTableSchemaParams) -> ServiceNowResult<TableSchema> {
        self.respond("get_table_schema", &params)
    }

    async fn get_record(&self, params: GetRecordParams) -> ServiceNowResult<Record> {
        self.respond("get_record", &params)
    }

    async fn get_user(&self, params: GetUserParams) -> ServiceNowResult<Record> {
        self.respond("get_user", &params)
    }

    async fn get_group(&self, params: GetGroupParams) -> ServiceNowResult<Record> {
        self.respond("get_group", &params)
    }

    async fn search_cmdb_ci(&self, params: SearchCmdbCiParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.respond("search_cmdb_ci", &params)
    }

    async fn get_cmdb_ci(&self, params: GetCmdbCiParams) -> ServiceNowResult<Record> {
        self.respond("get_cmdb_ci", &params)
    }

    async fn list_relationships(&self, params: ListRelationshipsParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.respond("list_relationships", &params)
    }

    async fn list_discovery_schedules(
        &self,
        params: ListDiscoverySchedulesParams,
    ) -> ServiceNowResult<QueryRecordsResponse> {
        self.respond("list_discovery_schedules", &params)
    }

    async fn list_mid_servers(&self, params: ListMidServersParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.respond("list_mid_servers", &params)
    }

    async fn list_active_events(&self, params: ListActiveEventsParams) -> ServiceNowResult<QueryRecordsResponse> {
        self.respond("list_active_events", &params)
    }

    async fn cmdb_health_dashboard(&self) -> ServiceNowResult<CmdbHealthSummary> {
        self.respond("cmdb_health_dashboard", &serde_json::json!({}))
    }

    async fn service_mapping_summary(
        &self,
        params: ServiceMappingSummaryParams,
    ) -> ServiceNowResult<ServiceMappingSummary> {
        self.respond("service_mapping_summary", &params)
    }

    async fn create_change_request(&self, params: CreateChangeRequestParams) -> ServiceNowResult<Record> {
        self.respond("create_change_request", &params)
    }

    async fn natural_language_search(
        &self,
        params: NaturalLanguageSearchParams,
    ) -> ServiceNowResult<NaturalLanguageSearchResult> {
        self.respond("natural_language_search", &params)
    }

    async fn natural_language_update(
        &self,
        params: NaturalLanguageUpdateParams,
    ) -> ServiceNowResult<NaturalLanguageUpdateResult> {
        self.respond("natural_language_update", &params)
    }
}
