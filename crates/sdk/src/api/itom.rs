//! ITOM endpoints: discovery, MID servers, event management, service mapping.

use super::{join_clauses, validate_record_id, RecordQuery, MAX_PAGE_SIZE};
use crate::client::ServiceNowClient;
use crate::error::ServiceNowResult;
use crate::types::{
    ListActiveEventsParams, ListDiscoverySchedulesParams, ListMidServersParams,
    QueryRecordsResponse, ServiceMappingSummary, ServiceMappingSummaryParams,
};

/// Default number of events returned.
pub const DEFAULT_EVENT_LIMIT: u32 = 100;

/// ITOM API.
pub struct ItomApi<'a> {
    client: &'a ServiceNowClient,
}

impl<'a> ItomApi<'a> {
    pub(crate) fn new(client: &'a ServiceNowClient) -> Self {
        Self { client }
    }

    /// Discovery schedules, optionally only active ones.
    pub async fn discovery_schedules(
        &self,
        params: &ListDiscoverySchedulesParams,
    ) -> ServiceNowResult<QueryRecordsResponse> {
        let filter = if params.active_only { "active=true" } else { "" };
        let query = RecordQuery::new("discovery_schedule")
            .query(join_clauses([filter, "ORDERBYname"]))
            .fields("sys_id,name,active,discover,run_type,run_time,mid_select_method")
            .limit(MAX_PAGE_SIZE)
            .display_value();
        Ok(self.client.table().list(&query).await?.into())
    }

    /// MID servers, optionally only those reporting `Up`.
    pub async fn mid_servers(&self, params: &ListMidServersParams) -> ServiceNowResult<QueryRecordsResponse> {
        let filter = if params.active_only { "status=Up" } else { "" };
        let query = RecordQuery::new("ecc_agent")
            .query(join_clauses([filter, "ORDERBYname"]))
            .fields("sys_id,name,status,validated,host_name,ip_address,version,last_refreshed")
            .limit(MAX_PAGE_SIZE)
            .display_value();
        Ok(self.client.table().list(&query).await?.into())
    }

    /// Events not yet closed, newest first.
    pub async fn active_events(&self, params: &ListActiveEventsParams) -> ServiceNowResult<QueryRecordsResponse> {
        let query = RecordQuery::new("em_event")
            .query(join_clauses([
                "state!=Closed",
                params.query.as_deref().unwrap_or_default(),
                "ORDERBYDESCtime_of_event",
            ]))
            .limit(params.limit.unwrap_or(DEFAULT_EVENT_LIMIT))
            .display_value();
        Ok(self.client.table().list(&query).await?.into())
    }

    /// A business service and the CIs it maps to.
    pub async fn service_mapping_summary(
        &self,
        params: &ServiceMappingSummaryParams,
    ) -> ServiceNowResult<ServiceMappingSummary> {
        validate_record_id("service_sys_id", &params.service_sys_id)?;

        let service = self
            .client
            .table()
            .get("cmdb_ci_service", &params.service_sys_id, None)
            .await?;

        let query = RecordQuery::new("cmdb_rel_ci")
            .query(format!("parent={}", params.service_sys_id))
            .fields("sys_id,child,type")
            .limit(MAX_PAGE_SIZE)
            .display_value();
        let relationships = self.client.table().list(&query).await?;

        Ok(ServiceMappingSummary {
            service,
            related_ci_count: relationships.len(),
            relationships,
        })
    }
}
