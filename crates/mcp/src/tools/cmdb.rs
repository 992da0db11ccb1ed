// CMDB tools: configuration item search, lookup and relationships

use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, parse_args, validate_limit, with_summary, Tool,
};
use servicenow_sdk::types::{GetCmdbCiParams, ListRelationshipsParams, SearchCmdbCiParams};
use servicenow_sdk::{ServiceNowApi, ServiceNowResult};

pub struct SearchCmdbCiTool;

#[async_trait::async_trait]
impl Tool for SearchCmdbCiTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_cmdb_ci".to_string(),
            description: "Search configuration items in the CMDB with an optional encoded query".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Encoded query, e.g. sys_class_name=cmdb_ci_linux_server^nameLIKEweb"),
                    "limit": json_schema_integer("Maximum number of CIs to return (1-1000, default 25)")
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
        let params: SearchCmdbCiParams = parse_args("search_cmdb_ci", arguments)?;
        validate_limit(params.limit)?;

        let response = client.search_cmdb_ci(params).await?;
        let summary = format!("Found {} configuration item(s)", response.count);
        with_summary(&response, summary)
    }
}

pub struct GetCmdbCiTool;

#[async_trait::async_trait]
impl Tool for GetCmdbCiTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_cmdb_ci".to_string(),
            description: "Get a configuration item from the CMDB by sys_id".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "ci_sys_id": json_schema_string("sys_id of the configuration item"),
                    "fields": json_schema_string("Comma-separated list of fields to return")
                }),
                vec!["ci_sys_id"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: GetCmdbCiParams = parse_args("get_cmdb_ci", arguments)?;
        let ci = client.get_cmdb_ci(params).await?;
        Ok(serde_json::Value::Object(ci))
    }
}

pub struct ListRelationshipsTool;

#[async_trait::async_trait]
impl Tool for ListRelationshipsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_relationships".to_string(),
            description: "List CMDB relationships where the configuration item is parent or child".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "ci_sys_id": json_schema_string("sys_id of the configuration item")
                }),
                vec!["ci_sys_id"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: ListRelationshipsParams = parse_args("list_relationships", arguments)?;
        let ci_sys_id = params.ci_sys_id.clone();

        let response = client.list_relationships(params).await?;
        let summary = format!("Found {} relationship(s) for CI {}", response.count, ci_sys_id);
        with_summary(&response, summary)
    }
}
