//! API handles grouped by ServiceNow product area.

pub mod change;
pub mod cmdb;
pub mod identity;
pub mod itom;
pub mod natural_language;
pub mod table;

pub use change::ChangeApi;
pub use cmdb::CmdbApi;
pub use identity::IdentityApi;
pub use itom::ItomApi;
pub use natural_language::NaturalLanguageApi;
pub use table::TableApi;

use crate::error::{ServiceNowError, ServiceNowResult};

/// Largest page size a single Table API request may ask for.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Parameters for one Table API list request.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordQuery {
    pub table: String,
    pub query: Option<String>,
    pub fields: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub display_value: bool,
    pub exclude_reference_link: bool,
}

impl RecordQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        if !query.is_empty() {
            self.query = Some(query);
        }
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn display_value(mut self) -> Self {
        self.display_value = true;
        self
    }

    /// `sysparm_*` query string pairs.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref query) = self.query {
            params.push(("sysparm_query", query.clone()));
        }
        if let Some(ref fields) = self.fields {
            params.push(("sysparm_fields", fields.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("sysparm_limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("sysparm_offset", offset.to_string()));
        }
        if self.display_value {
            params.push(("sysparm_display_value", "true".to_string()));
        }
        if self.exclude_reference_link {
            params.push(("sysparm_exclude_reference_link", "true".to_string()));
        }
        params
    }
}

/// Join encoded-query clauses with `^`, skipping empty ones.
pub(crate) fn join_clauses<'a>(clauses: impl IntoIterator<Item = &'a str>) -> String {
    clauses
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("^")
}

/// A sys_id is 32 hex characters.
pub fn is_sys_id(value: &str) -> bool {
    value.len() == 32 && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub(crate) fn validate_table(table: &str) -> ServiceNowResult<()> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ServiceNowError::InvalidRequest(format!(
            "Invalid table name \"{}\": only letters, digits and underscores are allowed",
            table
        )));
    }
    Ok(())
}

pub(crate) fn validate_record_id(field: &str, id: &str) -> ServiceNowResult<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ServiceNowError::InvalidRequest(format!(
            "Invalid {} \"{}\": expected an alphanumeric sys_id",
            field, id
        )));
    }
    Ok(())
}

/// Values interpolated into encoded queries cannot contain the clause separator.
pub(crate) fn validate_query_value(field: &str, value: &str) -> ServiceNowResult<()> {
    if value.contains('^') {
        return Err(ServiceNowError::InvalidRequest(format!(
            "Invalid {}: the '^' character is not allowed",
            field
        )));
    }
    Ok(())
}
