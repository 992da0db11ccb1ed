// Tool registry: catalog and dispatch share one table

use crate::protocol::ToolSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use servicenow_sdk::api::MAX_PAGE_SIZE;
use servicenow_sdk::{ServiceNowApi, ServiceNowError, ServiceNowResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool against a ServiceNow client.
    ///
    /// `arguments` is always a JSON object whose required keys have been
    /// checked by the registry.
    async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value>;

    /// Get the tool's tier (for the write gate)
    fn tier(&self) -> ToolTier {
        ToolTier::Read
    }
}

/// Tool security tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolTier {
    /// Read-only operations
    Read,
    /// Creates or modifies records; requires WRITE_ENABLED
    Write,
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    write_enabled: bool,
}

impl ToolRegistry {
    pub fn new(write_enabled: bool) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            write_enabled,
        }
    }

    /// Registry holding every ServiceNow tool, in catalog order.
    pub fn builtin(write_enabled: bool) -> Self {
        let mut registry = Self::new(write_enabled);

        // Platform
        registry.register(Arc::new(super::QueryRecordsTool));
        registry.register(Arc::new(super::GetTableSchemaTool));
        registry.register(Arc::new(super::GetRecordTool));
        registry.register(Arc::new(super::GetUserTool));
        registry.register(Arc::new(super::GetGroupTool));

        // CMDB
        registry.register(Arc::new(super::SearchCmdbCiTool));
        registry.register(Arc::new(super::GetCmdbCiTool));
        registry.register(Arc::new(super::ListRelationshipsTool));

        // ITOM
        registry.register(Arc::new(super::ListDiscoverySchedulesTool));
        registry.register(Arc::new(super::ListMidServersTool));
        registry.register(Arc::new(super::ListActiveEventsTool));
        registry.register(Arc::new(super::CmdbHealthDashboardTool));
        registry.register(Arc::new(super::ServiceMappingSummaryTool));

        // ITSM
        registry.register(Arc::new(super::CreateChangeRequestTool));

        // Natural language
        registry.register(Arc::new(super::NaturalLanguageSearchTool));
        registry.register(Arc::new(super::NaturalLanguageUpdateTool));

        registry
    }

    /// Register a tool. A tool with the same name replaces the earlier one
    /// and keeps its position in the catalog.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        match self.index.get(&name) {
            Some(&position) => self.tools[position] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&position| self.tools[position].clone())
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    /// Validate and run a tool call.
    ///
    /// Checks run in a fixed order: tool lookup, write gate, argument shape,
    /// required parameters. Only then does the tool touch the client.
    pub async fn execute(
        &self,
        client: &dyn ServiceNowApi,
        name: &str,
        arguments: serde_json::Value,
    ) -> ServiceNowResult<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ServiceNowError::UnknownTool(name.to_string()))?;

        if tool.tier() == ToolTier::Write && !self.write_enabled {
            return Err(ServiceNowError::WriteNotEnabled(name.to_string()));
        }

        let arguments = match arguments {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            serde_json::Value::Object(_) => arguments,
            other => {
                return Err(ServiceNowError::InvalidRequest(format!(
                    "Arguments for {} must be a JSON object, got {}",
                    name,
                    json_type_name(&other)
                )))
            }
        };

        check_required(&tool.schema(), &arguments)?;

        tool.execute(client, arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

fn check_required(schema: &ToolSchema, arguments: &serde_json::Value) -> ServiceNowResult<()> {
    let required = schema
        .input_schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let missing: Vec<&str> = required
        .iter()
        .filter_map(|name| name.as_str())
        .filter(|name| match arguments.get(*name) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceNowError::InvalidRequest(format!(
            "Missing required parameter(s): {}",
            missing.join(", ")
        )))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// Helpers shared by tool implementations

/// Deserialize tool arguments, reporting type mismatches as invalid requests.
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> ServiceNowResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| ServiceNowError::InvalidRequest(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Page sizes must lie in `1..=1000`.
pub fn validate_limit(limit: Option<u32>) -> ServiceNowResult<()> {
    match limit {
        Some(limit) if limit == 0 || limit > MAX_PAGE_SIZE => Err(ServiceNowError::InvalidRequest(format!(
            "limit must be between 1 and {} (got {})",
            MAX_PAGE_SIZE, limit
        ))),
        _ => Ok(()),
    }
}

/// Serialize a client result and attach a one-line `summary`.
pub fn with_summary<T: Serialize>(result: &T, summary: String) -> ServiceNowResult<serde_json::Value> {
    let mut value = serde_json::to_value(result)?;
    match value.as_object_mut() {
        Some(object) => {
            object.insert("summary".to_string(), serde_json::Value::String(summary));
            Ok(value)
        }
        None => Ok(serde_json::json!({ "result": value, "summary": summary })),
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}
