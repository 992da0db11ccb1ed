// ITOM tools: discovery, MID servers, event management and service mapping

use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, parse_args, validate_limit,
    with_summary, Tool,
};
use servicenow_sdk::types::{
    ListActiveEventsParams, ListDiscoverySchedulesParams, ListMidServersParams, ServiceMappingSummaryParams,
};
use servicenow_sdk::{ServiceNowApi, ServiceNowResult};

pub struct ListDiscoverySchedulesTool;

#[async_trait::async_trait]
impl Tool for ListDiscoverySchedulesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_discovery_schedules".to_string(),
            description: "List Discovery schedules".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "active_only": json_schema_boolean("Only return active schedules (default false)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: ListDiscoverySchedulesParams = parse_args("list_discovery_schedules", arguments)?;
        let response = client.list_discovery_schedules(params).await?;
        let summary = format!("Found {} discovery schedule(s)", response.count);
        with_summary(&response, summary)
    }
}

pub struct ListMidServersTool;

#[async_trait::async_trait]
impl Tool for ListMidServersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_mid_servers".to_string(),
            description: "List MID servers and their status".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "active_only": json_schema_boolean("Only return MID servers that are Up (default false)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: ListMidServersParams = parse_args("list_mid_servers", arguments)?;
        let response = client.list_mid_servers(params).await?;
        let summary = format!("Found {} MID server(s)", response.count);
        with_summary(&response, summary)
    }
}

pub struct ListActiveEventsTool;

#[async_trait::async_trait]
impl Tool for ListActiveEventsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_active_events".to_string(),
            description: "List events from Event Management that are not closed, newest first".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Additional encoded query, e.g. severity=1"),
                    "limit": json_schema_integer("Maximum number of events to return (1-1000, default 100)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: ListActiveEventsParams = parse_args("list_active_events", arguments)?;
        validate_limit(params.limit)?;

        let response = client.list_active_events(params).await?;
        let summary = format!("Found {} active event(s)", response.count);
        with_summary(&response, summary)
    }
}

pub struct CmdbHealthDashboardTool;

#[async_trait::async_trait]
impl Tool for CmdbHealthDashboardTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cmdb_health_dashboard".to_string(),
            description: "Summarize the CMDB: configuration item counts by class and by operational status"
                .to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        _arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let health = client.cmdb_health_dashboard().await?;
        let summary = format!(
            "{} configuration item(s) across {} class(es)",
            health.total_cis,
            health.by_class.len()
        );
        with_summary(&health, summary)
    }
}

pub struct ServiceMappingSummaryTool;

#[async_trait::async_trait]
impl Tool for ServiceMappingSummaryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "service_mapping_summary".to_string(),
            description: "Summarize a mapped business service and the configuration items related to it"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "service_sys_id": json_schema_string("sys_id of the service (cmdb_ci_service)")
                }),
                vec!["service_sys_id"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: ServiceMappingSummaryParams = parse_args("service_mapping_summary", arguments)?;
        let service_sys_id = params.service_sys_id.clone();

        let mapping = client.service_mapping_summary(params).await?;
        let name = mapping
            .service
            .get("name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(service_sys_id.as_str());
        let summary = format!(
            "Service {} has {} related configuration item(s)",
            name, mapping.related_ci_count
        );
        with_summary(&mapping, summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::tools::test_support::StubClient;
    use crate::tools::ToolRegistry;
    use servicenow_sdk::ErrorCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_discovery_schedules_passes_flag() {
        let client = StubClient::new().with_response(
            "list_discovery_schedules",
            json!({"count": 2, "records": [{"name": "Nightly"}, {"name": "Weekly"}]}),
        );
        let result = ToolRegistry::builtin(false)
            .execute(&client, "list_discovery_schedules", json!({"active_only": true}))
            .await
            .unwrap();

        assert_eq!(result["summary"], "Found 2 discovery schedule(s)");
        assert_eq!(client.calls()[0].1, json!({"active_only": true}));
    }

    #[tokio::test]
    async fn test_list_mid_servers_defaults_active_only_false() {
        let client = StubClient::new().with_response(
            "list_mid_servers",
            json!({"count": 1, "records": [{"name": "mid01", "status": "Up"}]}),
        );
        let result = ToolRegistry::builtin(false)
            .execute(&client, "list_mid_servers", json!({}))
            .await
            .unwrap();

        assert_eq!(result["summary"], "Found 1 MID server(s)");
        assert_eq!(client.calls()[0].1, json!({"active_only": false}));
    }

    #[tokio::test]
    async fn test_list_mid_servers_rejects_non_boolean_flag() {
        let client = StubClient::new();
        let err = ToolRegistry::builtin(false)
            .execute(&client, "list_mid_servers", json!({"active_only": "maybe"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_list_active_events() {
        let client = StubClient::new().with_response("list_active_events", json!({"count": 0, "records": []}));
        let registry = ToolRegistry::builtin(false);

        let result = registry
            .execute(&client, "list_active_events", json!({"query": "severity=1", "limit": 5}))
            .await
            .unwrap();
        assert_eq!(result["summary"], "Found 0 active event(s)");

        let err = registry
            .execute(&client, "list_active_events", json!({"limit": 0}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cmdb_health_dashboard_summary() {
        let client = StubClient::new().with_response(
            "cmdb_health_dashboard",
            json!({
                "total_cis": 42,
                "by_class": {"cmdb_ci_linux_server": 30, "cmdb_ci_win_server": 12},
                "by_operational_status": {"Operational": 40, "Retired": 2}
            }),
        );
        let result = ToolRegistry::builtin(false)
            .execute(&client, "cmdb_health_dashboard", json!({}))
            .await
            .unwrap();

        assert_eq!(result["summary"], "42 configuration item(s) across 2 class(es)");
        assert_eq!(result["by_operational_status"]["Retired"], 2);
    }

    #[tokio::test]
    async fn test_service_mapping_summary_uses_service_name() {
        let client = StubClient::new().with_response(
            "service_mapping_summary",
            json!({
                "service": {"sys_id": "svc1", "name": "Email"},
                "related_ci_count": 2,
                "relationships": [{"child": "mx01"}, {"child": "mx02"}]
            }),
        );
        let result = ToolRegistry::builtin(false)
            .execute(&client, "service_mapping_summary", json!({"service_sys_id": "svc1"}))
            .await
            .unwrap();
        assert_eq!(result["summary"], "Service Email has 2 related configuration item(s)");
    }

    #[tokio::test]
    async fn test_service_mapping_summary_falls_back_to_sys_id() {
        let client = StubClient::new().with_response(
            "service_mapping_summary",
            json!({"service": {"sys_id": "svc1"}, "related_ci_count": 0, "relationships": []}),
        );
        let result = ToolRegistry::builtin(false)
            .execute(&client, "service_mapping_summary", json!({"service_sys_id": "svc1"}))
            .await
            .unwrap();
        assert_eq!(result["summary"], "Service svc1 has 0 related configuration item(s)");
    }
}
