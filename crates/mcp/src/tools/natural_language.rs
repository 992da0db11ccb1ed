// Natural language tools: plain-English search and update

use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, parse_args, validate_limit, with_summary, Tool,
    ToolTier,
};
use servicenow_sdk::types::{NaturalLanguageSearchParams, NaturalLanguageUpdateParams};
use servicenow_sdk::{ServiceNowApi, ServiceNowResult};

pub struct NaturalLanguageSearchTool;

#[async_trait::async_trait]
impl Tool for NaturalLanguageSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "natural_language_search".to_string(),
            description: "Search ServiceNow with a plain-English phrase, e.g. \"open critical incidents about email\". \
                          The table and filters are inferred from keywords"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Plain-English search phrase"),
                    "limit": json_schema_integer("Maximum number of records to return (1-1000, default 20)")
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let params: NaturalLanguageSearchParams = parse_args("natural_language_search", arguments)?;
        validate_limit(params.limit)?;
        let phrase = params.query.clone();

        let result = client.natural_language_search(params).await?;
        let summary = format!(
            "Found {} record(s) in table \"{}\" for \"{}\"",
            result.count, result.table, phrase
        );
        with_summary(&result, summary)
    }
}

/// Apply a plain-English update instruction. Requires WRITE_ENABLED.
pub struct NaturalLanguageUpdateTool;

#[async_trait::async_trait]
impl Tool for NaturalLanguageUpdateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "natural_language_update".to_string(),
            description: "Update a record from a plain-English instruction, e.g. \
                          \"Update INC0010001: set state to 2 and urgency to 1\". \
                          Only available when write operations are enabled"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "instruction": json_schema_string("Instruction naming the record (number or sys_id) and the fields to set"),
                    "table": json_schema_string("Table the record lives in, e.g. incident")
                }),
                vec!["instruction", "table"],
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
        let params: NaturalLanguageUpdateParams = parse_args("natural_language_update", arguments)?;
        let result = client.natural_language_update(params).await?;

        let reference = result.number.as_deref().unwrap_or(result.sys_id.as_str());
        let summary = format!("Updated {} in table \"{}\"", reference, result.table);
        with_summary(&result, summary)
    }
}
