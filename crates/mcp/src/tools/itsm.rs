// ITSM tools: change management

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, json_schema_string, parse_args, with_summary, Tool, ToolTier};
use servicenow_sdk::types::CreateChangeRequestParams;
use servicenow_sdk::{ServiceNowApi, ServiceNowResult};

/// Open a new change request. Requires WRITE_ENABLED.
pub struct CreateChangeRequestTool;

#[async_trait::async_trait]
impl Tool for CreateChangeRequestTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_change_request".to_string(),
            description: "Create a change request. Only available when write operations are enabled".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "short_description": json_schema_string("One-line summary of the change"),
                    "assignment_group": json_schema_string("sys_id or name of the assignment group"),
                    "description": json_schema_string("Detailed description"),
                    "category": json_schema_string("Change category, e.g. Software, Hardware, Network"),
                    "priority": json_schema_string("Priority (1 critical - 4 low)"),
                    "risk": json_schema_string("Risk (2 high, 3 moderate, 4 low)"),
                    "impact": json_schema_string("Impact (1 high - 3 low)"),
                    "urgency": json_schema_string("Urgency (1 high - 3 low)")
                }),
                vec!["short_description", "assignment_group"],
            ),
        }
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Write
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: CreateChangeRequestParams = parse_args("create_change_request", arguments)?;
        let record = client.create_change_request(params).await?;

        let reference = ["number", "sys_id"]
            .iter()
            .find_map(|field| record.get(*field).and_then(|v| v.as_str()).filter(|v| !v.is_empty()))
            .unwrap_or("(unknown)");
        let summary = format!("Created change request {}", reference);
        with_summary(&record, summary)
    }
}
