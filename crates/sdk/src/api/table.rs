//! Table API endpoints.

use super::{join_clauses, validate_record_id, validate_table, RecordQuery, MAX_PAGE_SIZE};
use crate::client::ServiceNowClient;
use crate::error::{ServiceNowError, ServiceNowResult};
use crate::types::{
    ApiResponse, FieldDefinition, QueryRecordsParams, QueryRecordsResponse, Record, TableSchema,
};
use serde::Serialize;

/// Default `sysparm_limit` when the caller gives none.
pub const DEFAULT_QUERY_LIMIT: u32 = 100;

/// Table API for generic record access.
pub struct TableApi<'a> {
    client: &'a ServiceNowClient,
}

impl<'a> TableApi<'a> {
    pub(crate) fn new(client: &'a ServiceNowClient) -> Self {
        Self { client }
    }

    /// Query records with an encoded query, ordering and paging.
    pub async fn query(&self, params: &QueryRecordsParams) -> ServiceNowResult<QueryRecordsResponse> {
        let order_clause = params
            .order_by
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| match o.strip_prefix('-') {
                Some(field) => format!("ORDERBYDESC{}", field),
                None => format!("ORDERBY{}", o),
            });

        let encoded = join_clauses([
            params.query.as_deref().unwrap_or_default(),
            order_clause.as_deref().unwrap_or_default(),
        ]);

        let mut query = RecordQuery::new(&params.table)
            .query(encoded)
            .limit(params.limit.unwrap_or(DEFAULT_QUERY_LIMIT));
        query.fields = params.fields.clone().filter(|f| !f.is_empty());
        query.offset = params.offset;

        Ok(self.list(&query).await?.into())
    }

    /// List records matching a prepared query.
    pub(crate) async fn list(&self, query: &RecordQuery) -> ServiceNowResult<Vec<Record>> {
        validate_table(&query.table)?;
        let response: ApiResponse<Vec<Record>> = self
            .client
            .http
            .get_with_query(&format!("/api/now/table/{}", query.table), &query.to_params())
            .await?;
        Ok(response.result)
    }

    /// Get a single record by sys_id.
    pub async fn get(&self, table: &str, sys_id: &str, fields: Option<&str>) -> ServiceNowResult<Record> {
        validate_table(table)?;
        validate_record_id("sys_id", sys_id)?;

        let params: Vec<(&str, &str)> = fields
            .filter(|f| !f.is_empty())
            .map(|f| vec![("sysparm_fields", f)])
            .unwrap_or_default();

        let response: ApiResponse<Record> = self
            .client
            .http
            .get_with_query(&format!("/api/now/table/{}/{}", table, sys_id), &params)
            .await?;
        Ok(response.result)
    }

    /// Insert a record.
    pub async fn create<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> ServiceNowResult<Record> {
        validate_table(table)?;
        let response: ApiResponse<Record> = self
            .client
            .http
            .post(&format!("/api/now/table/{}", table), body)
            .await?;
        Ok(response.result)
    }

    /// Update fields of an existing record.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        sys_id: &str,
        body: &B,
    ) -> ServiceNowResult<Record> {
        validate_table(table)?;
        validate_record_id("sys_id", sys_id)?;
        let response: ApiResponse<Record> = self
            .client
            .http
            .patch(&format!("/api/now/table/{}/{}", table, sys_id), body)
            .await?;
        Ok(response.result)
    }

    /// Describe a table's columns from the data dictionary.
    pub async fn schema(&self, table: &str) -> ServiceNowResult<TableSchema> {
        validate_table(table)?;

        let mut query = RecordQuery::new("sys_dictionary")
            .query(format!("name={}^elementISNOTEMPTY^ORDERBYelement", table))
            .fields("element,column_label,internal_type,max_length,mandatory,reference")
            .limit(MAX_PAGE_SIZE);
        query.exclude_reference_link = true;

        let rows = self.list(&query).await?;
        if rows.is_empty() {
            return Err(ServiceNowError::NotFound(format!(
                "No dictionary entries for table \"{}\"",
                table
            )));
        }

        Ok(TableSchema {
            table: table.to_string(),
            fields: rows.iter().map(field_definition).collect(),
        })
    }
}

fn text<'r>(record: &'r Record, key: &str) -> Option<&'r str> {
    record
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

fn field_definition(row: &Record) -> FieldDefinition {
    let name = text(row, "element").unwrap_or_default().to_string();
    FieldDefinition {
        label: text(row, "column_label").unwrap_or(name.as_str()).to_string(),
        internal_type: text(row, "internal_type").unwrap_or("string").to_string(),
        max_length: text(row, "max_length").and_then(|v| v.parse().ok()),
        mandatory: text(row, "mandatory") == Some("true"),
        reference: text(row, "reference").map(str::to_string),
        name,
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::mock_client;
    use crate::types::QueryRecordsParams;
    use crate::ServiceNowError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_query_builds_encoded_query_with_ordering() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .and(query_param("sysparm_query", "active=true^ORDERBYDESCsys_created_on"))
            .and(query_param("sysparm_limit", "5"))
            .and(query_param("sysparm_offset", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"number": "INC0010001", "sys_id": "a"},
                    {"number": "INC0010002", "sys_id": "b"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let response = client
            .table()
            .query(&QueryRecordsParams {
                table: "incident".to_string(),
                query: Some("active=true".to_string()),
                limit: Some(5),
                offset: Some(10),
                order_by: Some("-sys_created_on".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(response.count, 2);
        assert_eq!(response.records[1]["number"], "INC0010002");
    }

    #[tokio::test]
    async fn test_query_applies_default_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/problem"))
            .and(query_param("sysparm_limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let response = client
            .table()
            .query(&QueryRecordsParams {
                table: "problem".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_get_rejects_path_injection_before_request() {
        let server = MockServer::start().await;
        let client = mock_client(&server);

        let result = client.table().get("incident", "../sys_user", None).await;
        assert!(matches!(result, Err(ServiceNowError::InvalidRequest(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schema_from_dictionary() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/sys_dictionary"))
            .and(query_param("sysparm_query", "name=incident^elementISNOTEMPTY^ORDERBYelement"))
            .and(query_param("sysparm_exclude_reference_link", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"element": "caller_id", "column_label": "Caller", "internal_type": "reference",
                     "max_length": "32", "mandatory": "false", "reference": "sys_user"},
                    {"element": "short_description", "column_label": "Short description",
                     "internal_type": "string", "max_length": "160", "mandatory": "true", "reference": ""}
                ]
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let schema = client.table().schema("incident").await.unwrap();

        assert_eq!(schema.table, "incident");
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].reference.as_deref(), Some("sys_user"));
        assert_eq!(schema.fields[1].max_length, Some(160));
        assert!(schema.fields[1].mandatory);
        assert!(schema.fields[1].reference.is_none());
    }

    #[tokio::test]
    async fn test_schema_for_unknown_table_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/sys_dictionary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": []})))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let result = client.table().schema("u_missing").await;
        assert!(matches!(result, Err(ServiceNowError::NotFound(_))));
    }
}
