//! Request parameters and response types for ServiceNow operations.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A ServiceNow record, returned verbatim.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The `{"result": ...}` envelope used by the REST APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
}

/// A field value that ServiceNow accepts as either text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
}

/// Counts arrive as JSON numbers; whole-valued floats like `10.0` are accepted.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let whole = match number.as_u64() {
        Some(n) => u32::try_from(n).ok(),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(f))
            .map(|f| f as u32),
    };

    whole
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative whole number, got {}", number)))
}

// Core platform

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRecordsParams {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(default, deserialize_with = "whole_number", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, alias = "orderBy", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, deserialize_with = "whole_number", skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecordsResponse {
    pub count: usize,
    pub records: Vec<Record>,
}

impl From<Vec<Record>> for QueryRecordsResponse {
    fn from(records: Vec<Record>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetTableSchemaParams {
    pub table: String,
}

/// Column definitions of a table, from `sys_dictionary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub internal_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRecordParams {
    pub table: String,
    pub sys_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetUserParams {
    pub user_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetGroupParams {
    pub group_identifier: String,
}

// CMDB

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCmdbCiParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "whole_number", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetCmdbCiParams {
    pub ci_sys_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRelationshipsParams {
    pub ci_sys_id: String,
}

/// CI counts grouped by class and by operational status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmdbHealthSummary {
    pub total_cis: u64,
    pub by_class: BTreeMap<String, u64>,
    pub by_operational_status: BTreeMap<String, u64>,
}

// ITOM

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListDiscoverySchedulesParams {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMidServersParams {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListActiveEventsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "whole_number", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMappingSummaryParams {
    pub service_sys_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMappingSummary {
    pub service: Record,
    pub related_ci_count: usize,
    pub relationships: Vec<Record>,
}

// ITSM

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChangeRequestParams {
    pub short_description: String,
    pub assignment_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<FieldValue>,
}

// Natural language

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalLanguageSearchParams {
    pub query: String,
    #[serde(default, deserialize_with = "whole_number", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalLanguageSearchResult {
    pub table: String,
    pub encoded_query: String,
    pub count: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalLanguageUpdateParams {
    pub instruction: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalLanguageUpdateResult {
    pub table: String,
    pub sys_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub updated_fields: Record,
    pub record: Record,
}
