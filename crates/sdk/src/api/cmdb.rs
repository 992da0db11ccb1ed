//! CMDB endpoints.

use super::{validate_record_id, RecordQuery, MAX_PAGE_SIZE};
use crate::client::ServiceNowClient;
use crate::error::ServiceNowResult;
use crate::types::{
    ApiResponse, CmdbHealthSummary, GetCmdbCiParams, ListRelationshipsParams,
    QueryRecordsResponse, Record, SearchCmdbCiParams,
};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Default number of CIs returned by a search.
pub const DEFAULT_CI_SEARCH_LIMIT: u32 = 25;

const CI_SEARCH_FIELDS: &str =
    "sys_id,name,sys_class_name,operational_status,install_status,ip_address,fqdn,serial_number";

/// CMDB API for configuration items and their relationships.
pub struct CmdbApi<'a> {
    client: &'a ServiceNowClient,
}

impl<'a> CmdbApi<'a> {
    pub(crate) fn new(client: &'a ServiceNowClient) -> Self {
        Self { client }
    }

    /// Search `cmdb_ci` with an optional encoded query.
    pub async fn search(&self, params: &SearchCmdbCiParams) -> ServiceNowResult<QueryRecordsResponse> {
        let query = RecordQuery::new("cmdb_ci")
            .query(params.query.clone().unwrap_or_default())
            .fields(CI_SEARCH_FIELDS)
            .limit(params.limit.unwrap_or(DEFAULT_CI_SEARCH_LIMIT));
        Ok(self.client.table().list(&query).await?.into())
    }

    /// Get a single CI.
    pub async fn get(&self, params: &GetCmdbCiParams) -> ServiceNowResult<Record> {
        self.client
            .table()
            .get("cmdb_ci", &params.ci_sys_id, params.fields.as_deref())
            .await
    }

    /// Relationships where the CI is either parent or child.
    pub async fn relationships(&self, params: &ListRelationshipsParams) -> ServiceNowResult<QueryRecordsResponse> {
        validate_record_id("ci_sys_id", &params.ci_sys_id)?;
        let query = RecordQuery::new("cmdb_rel_ci")
            .query(format!(
                "parent={id}^ORchild={id}",
                id = params.ci_sys_id
            ))
            .fields("sys_id,parent,child,type")
            .limit(MAX_PAGE_SIZE)
            .display_value();
        Ok(self.client.table().list(&query).await?.into())
    }

    /// CI counts by class and operational status, from the Aggregate API.
    pub async fn health_dashboard(&self) -> ServiceNowResult<CmdbHealthSummary> {
        let by_class = self.count_by("sys_class_name").await?;
        let by_operational_status = self.count_by("operational_status").await?;

        Ok(CmdbHealthSummary {
            total_cis: by_class.values().sum(),
            by_class,
            by_operational_status,
        })
    }

    async fn count_by(&self, field: &str) -> ServiceNowResult<BTreeMap<String, u64>> {
        let params = [
            ("sysparm_count", "true"),
            ("sysparm_group_by", field),
            ("sysparm_display_value", "true"),
        ];
        let response: ApiResponse<Vec<StatsRow>> = self
            .client
            .http
            .get_with_query("/api/now/stats/cmdb_ci", &params)
            .await?;

        let mut counts = BTreeMap::new();
        for row in response.result {
            let key = row
                .groupby_fields
                .iter()
                .find(|g| g.field == field)
                .map(|g| g.display_value.as_deref().unwrap_or(g.value.as_str()))
                .filter(|v| !v.is_empty())
                .unwrap_or("(empty)")
                .to_string();
            let count: u64 = row.stats.count.parse().unwrap_or(0);
            *counts.entry(key).or_insert(0) += count;
        }
        Ok(counts)
    }
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    stats: StatsCount,
    #[serde(default)]
    groupby_fields: Vec<GroupByField>,
}

#[derive(Debug, Deserialize)]
struct StatsCount {
    count: String,
}

#[derive(Debug, Deserialize)]
struct GroupByField {
    field: String,
    value: String,
    #[serde(default)]
    display_value: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::test_support::mock_client;
    use crate::types::{ListRelationshipsParams, SearchCmdbCiParams};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_uses_default_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/cmdb_ci"))
            .and(query_param("sysparm_query", "nameLIKEweb"))
            .and(query_param("sysparm_limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{"name": "web01"}, {"name": "web02"}, {"name": "web03"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let response = client
            .cmdb()
            .search(&SearchCmdbCiParams {
                query: Some("nameLIKEweb".to_string()),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(response.count, 3);
    }

    #[tokio::test]
    async fn test_relationships_match_parent_or_child() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/cmdb_rel_ci"))
            .and(query_param("sysparm_query", "parent=abc123^ORchild=abc123"))
            .and(query_param("sysparm_display_value", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{"parent": "web01", "child": "db01", "type": "Depends on::Used by"}]
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let response = client
            .cmdb()
            .relationships(&ListRelationshipsParams {
                ci_sys_id: "abc123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.records[0]["child"], "db01");
    }

    #[tokio::test]
    async fn test_health_dashboard_aggregates_counts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/stats/cmdb_ci"))
            .and(query_param("sysparm_group_by", "sys_class_name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"stats": {"count": "40"}, "groupby_fields": [{"field": "sys_class_name", "value": "cmdb_ci_server"}]},
                    {"stats": {"count": "2"}, "groupby_fields": [{"field": "sys_class_name", "value": "cmdb_ci_database"}]}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/now/stats/cmdb_ci"))
            .and(query_param("sysparm_group_by", "operational_status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"stats": {"count": "39"}, "groupby_fields": [{"field": "operational_status", "value": "1", "display_value": "Operational"}]},
                    {"stats": {"count": "3"}, "groupby_fields": [{"field": "operational_status", "value": ""}]}
                ]
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let summary = client.cmdb().health_dashboard().await.unwrap();

        assert_eq!(summary.total_cis, 42);
        assert_eq!(summary.by_class["cmdb_ci_server"], 40);
        assert_eq!(summary.by_operational_status["Operational"], 39);
        assert_eq!(summary.by_operational_status["(empty)"], 3);
    }
}
