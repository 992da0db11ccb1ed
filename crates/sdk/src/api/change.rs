//! Change management endpoints.

use crate::client::ServiceNowClient;
use crate::error::ServiceNowResult;
use crate::types::{CreateChangeRequestParams, Record};

/// Change API for `change_request`.
pub struct ChangeApi<'a> {
    client: &'a ServiceNowClient,
}

impl<'a> ChangeApi<'a> {
    pub(crate) fn new(client: &'a ServiceNowClient) -> Self {
        Self { client }
    }

    /// Create a change request.
    pub async fn create(&self, params: &CreateChangeRequestParams) -> ServiceNowResult<Record> {
        self.client.table().create("change_request", params).await
    }
}
