//! User and group lookups.

use super::{is_sys_id, validate_query_value, RecordQuery};
use crate::client::ServiceNowClient;
use crate::error::{ServiceNowError, ServiceNowResult};
use crate::types::Record;

/// Identity API for `sys_user` and `sys_user_group`.
pub struct IdentityApi<'a> {
    client: &'a ServiceNowClient,
}

impl<'a> IdentityApi<'a> {
    pub(crate) fn new(client: &'a ServiceNowClient) -> Self {
        Self { client }
    }

    /// Find a user by sys_id, email address or user name.
    pub async fn user(&self, identifier: &str) -> ServiceNowResult<Record> {
        let identifier = identifier.trim();
        validate_query_value("user_identifier", identifier)?;

        let clause = if is_sys_id(identifier) {
            format!("sys_id={}", identifier)
        } else if identifier.contains('@') {
            format!("email={}", identifier)
        } else {
            format!("user_name={}", identifier)
        };

        self.first("sys_user", clause)
            .await?
            .ok_or_else(|| ServiceNowError::NotFound(format!("User not found: {}", identifier)))
    }

    /// Find a group by sys_id or name.
    pub async fn group(&self, identifier: &str) -> ServiceNowResult<Record> {
        let identifier = identifier.trim();
        validate_query_value("group_identifier", identifier)?;

        let clause = if is_sys_id(identifier) {
            format!("sys_id={}", identifier)
        } else {
            format!("name={}", identifier)
        };

        self.first("sys_user_group", clause)
            .await?
            .ok_or_else(|| ServiceNowError::NotFound(format!("Group not found: {}", identifier)))
    }

    async fn first(&self, table: &str, clause: String) -> ServiceNowResult<Option<Record>> {
        let query = RecordQuery::new(table).query(clause).limit(1);
        let records = self.client.table().list(&query).await?;
        Ok(records.into_iter().next())
    }
}
