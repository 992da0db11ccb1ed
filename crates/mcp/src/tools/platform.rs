// Core platform tools: table queries, records, schemas, users and groups

use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, parse_args, validate_limit, with_summary, Tool,
};
use servicenow_sdk::types::{GetGroupParams, GetRecordParams, GetTableSchemaParams, GetUserParams, QueryRecordsParams};
use servicenow_sdk::{ServiceNowApi, ServiceNowResult};

/// Query any table with an encoded query
pub struct QueryRecordsTool;

#[async_trait::async_trait]
impl Tool for QueryRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "query_records".to_string(),
            description: "Query records from any ServiceNow table using an encoded query (e.g. active=true^priority=1)"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "table": json_schema_string("Table name, e.g. incident, change_request, cmdb_ci_server"),
                    "query": json_schema_string("Encoded query string, e.g. active=true^priority=1"),
                    "fields": json_schema_string("Comma-separated list of fields to return"),
                    "limit": json_schema_integer("Maximum number of records to return (1-1000, default 100)"),
                    "order_by": json_schema_string("Field to sort by; prefix with '-' for descending"),
                    "offset": json_schema_integer("Number of records to skip")
                }),
                vec!["table"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: QueryRecordsParams = parse_args("query_records", arguments)?;
        validate_limit(params.limit)?;

        let table = params.table.clone();
        let query = params.query.clone().filter(|q| !q.trim().is_empty());

        let response = client.query_records(params).await?;

        let mut summary = format!("Found {} record(s) in table \"{}\"", response.count, table);
        if let Some(query) = query {
            summary.push_str(&format!(" matching query: {}", query));
        }
        with_summary(&response, summary)
    }
}

/// Describe the columns of a table
pub struct GetTableSchemaTool;

#[async_trait::async_trait]
impl Tool for GetTableSchemaTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_table_schema".to_string(),
            description: "Get the field definitions (name, label, type, mandatory, reference) of a ServiceNow table"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "table": json_schema_string("Table name, e.g. incident")
                }),
                vec!["table"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: GetTableSchemaParams = parse_args("get_table_schema", arguments)?;
        let schema = client.get_table_schema(params).await?;
        Ok(serde_json::to_value(schema)?)
    }
}

/// Fetch a single record by sys_id
pub struct GetRecordTool;

#[async_trait::async_trait]
impl Tool for GetRecordTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_record".to_string(),
            description: "Get a single record from a ServiceNow table by sys_id".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "table": json_schema_string("Table name"),
                    "sys_id": json_schema_string("sys_id of the record"),
                    "fields": json_schema_string("Comma-separated list of fields to return")
                }),
                vec!["table", "sys_id"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: GetRecordParams = parse_args("get_record", arguments)?;
        let record = client.get_record(params).await?;
        Ok(serde_json::Value::Object(record))
    }
}

/// Look up a user by sys_id, user_name or email
pub struct GetUserTool;

#[async_trait::async_trait]
impl Tool for GetUserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_user".to_string(),
            description: "Get a ServiceNow user by sys_id, user_name or email address".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "user_identifier": json_schema_string("sys_id, user_name or email of the user")
                }),
                vec!["user_identifier"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: GetUserParams = parse_args("get_user", arguments)?;
        let user = client.get_user(params).await?;
        Ok(serde_json::Value::Object(user))
    }
}

/// Look up a group by sys_id or name
pub struct GetGroupTool;

#[async_trait::async_trait]
impl Tool for GetGroupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_group".to_string(),
            description: "Get a ServiceNow user group by sys_id or name".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "group_identifier": json_schema_string("sys_id or name of the group")
                }),
                vec!["group_identifier"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: GetGroupParams = parse_args("get_group", arguments)?;
        let group = client.get_group(params).await?;
        Ok(serde_json::Value::Object(group))
    }
}

#[cfg(test)]
mod tests {
    use crate::tools::test_support::StubClient;
    use crate::tools::ToolRegistry;
    use servicenow_sdk::ErrorCode;
    use serde_json::json;

    fn incidents() -> serde_json::Value {
        json!({
            "count": 2,
            "records": [
                {"sys_id": "a1", "number": "INC0010001"},
                {"sys_id": "a2", "number": "INC0010002"}
            ]
        })
    }

    #[tokio::test]
    async fn test_query_records_summary_and_params() {
        let client = StubClient::new().with_response("query_records", incidents());
        let registry = ToolRegistry::builtin(false);

        let result = registry
            .execute(
                &client,
                "query_records",
                json!({"table": "incident", "query": "active=true", "limit": 10, "order_by": "-sys_created_on"}),
            )
            .await
            .unwrap();

        assert_eq!(result["count"], 2);
        assert_eq!(
            result["summary"],
            "Found 2 record(s) in table \"incident\" matching query: active=true"
        );

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "query_records");
        assert_eq!(
            calls[0].1,
            json!({"table": "incident", "query": "active=true", "limit": 10, "order_by": "-sys_created_on"})
        );
    }

    #[tokio::test]
    async fn test_query_records_without_query_has_short_summary() {
        let client = StubClient::new().with_response("query_records", incidents());
        let result = ToolRegistry::builtin(false)
            .execute(&client, "query_records", json!({"table": "incident"}))
            .await
            .unwrap();
        assert_eq!(result["summary"], "Found 2 record(s) in table \"incident\"");
    }

    #[tokio::test]
    async fn test_query_records_limit_bounds() {
        let registry = ToolRegistry::builtin(false);

        for limit in [0, 1001] {
            let client = StubClient::new().with_response("query_records", incidents());
            let err = registry
                .execute(&client, "query_records", json!({"table": "incident", "limit": limit}))
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidRequest);
            assert!(client.calls().is_empty());
        }

        for limit in [1, 1000] {
            let client = StubClient::new().with_response("query_records", incidents());
            registry
                .execute(&client, "query_records", json!({"table": "incident", "limit": limit}))
                .await
                .unwrap();
            assert_eq!(client.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_query_records_accepts_whole_float_limit() {
        let client = StubClient::new().with_response("query_records", incidents());
        ToolRegistry::builtin(false)
            .execute(&client, "query_records", json!({"table": "incident", "limit": 10.0, "offset": 5.0}))
            .await
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls[0].1["limit"], 10);
        assert_eq!(calls[0].1["offset"], 5);
    }

    #[tokio::test]
    async fn test_query_records_wrong_type_is_invalid_request() {
        let client = StubClient::new();
        let err = ToolRegistry::builtin(false)
            .execute(&client, "query_records", json!({"table": "incident", "limit": "ten"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(err.to_string().contains("query_records"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_record_returns_raw_record() {
        let record = json!({"sys_id": "abc", "short_description": "Printer on fire", "priority": "1"});
        let client = StubClient::new().with_response("get_record", record.clone());

        let result = ToolRegistry::builtin(false)
            .execute(&client, "get_record", json!({"table": "incident", "sys_id": "abc"}))
            .await
            .unwrap();

        assert_eq!(result, record);
        assert_eq!(client.calls()[0].1, json!({"table": "incident", "sys_id": "abc"}));
    }

    #[tokio::test]
    async fn test_get_record_requires_table_and_sys_id() {
        let client = StubClient::new();
        let err = ToolRegistry::builtin(false)
            .execute(&client, "get_record", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter(s): table, sys_id");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_table_schema_has_no_summary() {
        let schema = json!({
            "table": "incident",
            "fields": [{"name": "number", "label": "Number", "type": "string", "mandatory": false}]
        });
        let client = StubClient::new().with_response("get_table_schema", schema.clone());

        let result = ToolRegistry::builtin(false)
            .execute(&client, "get_table_schema", json!({"table": "incident"}))
            .await
            .unwrap();
        assert_eq!(result, schema);
    }

    #[tokio::test]
    async fn test_get_user_and_group_pass_identifier() {
        let client = StubClient::new()
            .with_response("get_user", json!({"user_name": "beth.anglin"}))
            .with_response("get_group", json!({"name": "Service Desk"}));
        let registry = ToolRegistry::builtin(false);

        let user = registry
            .execute(&client, "get_user", json!({"user_identifier": "beth.anglin@example.com"}))
            .await
            .unwrap();
        assert_eq!(user["user_name"], "beth.anglin");

        let group = registry
            .execute(&client, "get_group", json!({"group_identifier": "Service Desk"}))
            .await
            .unwrap();
        assert_eq!(group["name"], "Service Desk");

        let calls = client.calls();
        assert_eq!(calls[0].1, json!({"user_identifier": "beth.anglin@example.com"}));
        assert_eq!(calls[1].1, json!({"group_identifier": "Service Desk"}));
    }

    #[tokio::test]
    async fn test_client_errors_propagate_unchanged() {
        let client = StubClient::new().failing("get_user", 500, "Internal failure");
        let err = ToolRegistry::builtin(false)
            .execute(&client, "get_user", json!({"user_identifier": "admin"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ApiError);
        assert_eq!(err.to_string(), "ServiceNow API error (status 500): Internal failure");
    }
}
