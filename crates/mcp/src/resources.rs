// Read-only MCP resources backed by the ServiceNow client

use crate::protocol::{ResourceContents, ResourceDescriptor};
use servicenow_sdk::types::{GetTableSchemaParams, ListDiscoverySchedulesParams, ListMidServersParams};
use servicenow_sdk::{ServiceNowApi, ServiceNowError, ServiceNowResult};

pub const CMDB_HEALTH_URI: &str = "servicenow://cmdb/health";
pub const MID_SERVERS_URI: &str = "servicenow://itom/mid-servers";
pub const DISCOVERY_SCHEDULES_URI: &str = "servicenow://itom/discovery-schedules";

const TABLE_SCHEMA_PREFIX: &str = "servicenow://table/";
const TABLE_SCHEMA_SUFFIX: &str = "/schema";
const JSON_MIME_TYPE: &str = "application/json";

/// Resources advertised by `resources/list`.
pub fn list_resources() -> Vec<ResourceDescriptor> {
    vec![
        descriptor(
            CMDB_HEALTH_URI,
            "CMDB health",
            "Configuration item counts by class and operational status",
        ),
        descriptor(MID_SERVERS_URI, "MID servers", "All MID servers and their status"),
        descriptor(
            DISCOVERY_SCHEDULES_URI,
            "Discovery schedules",
            "All Discovery schedules",
        ),
        descriptor(
            "servicenow://table/{table}/schema",
            "Table schema",
            "Field definitions of a table; replace {table} with a table name",
        ),
    ]
}

fn descriptor(uri: &str, name: &str, description: &str) -> ResourceDescriptor {
    ResourceDescriptor {
        uri: uri.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        mime_type: JSON_MIME_TYPE.to_string(),
    }
}

/// Fetch a resource and render it as pretty JSON.
pub async fn read_resource(client: &dyn ServiceNowApi, uri: &str) -> ServiceNowResult<ResourceContents> {
    let value = match uri {
        CMDB_HEALTH_URI => serde_json::to_value(client.cmdb_health_dashboard().await?)?,
        MID_SERVERS_URI => serde_json::to_value(
            client
                .list_mid_servers(ListMidServersParams { active_only: false })
                .await?,
        )?,
        DISCOVERY_SCHEDULES_URI => serde_json::to_value(
            client
                .list_discovery_schedules(ListDiscoverySchedulesParams { active_only: false })
                .await?,
        )?,
        _ => match table_schema_target(uri) {
            Some(table) => serde_json::to_value(
                client
                    .get_table_schema(GetTableSchemaParams {
                        table: table.to_string(),
                    })
                    .await?,
            )?,
            None => return Err(ServiceNowError::NotFound(format!("Unknown resource: {}", uri))),
        },
    };

    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: JSON_MIME_TYPE.to_string(),
        text: serde_json::to_string_pretty(&value)?,
    })
}

fn table_schema_target(uri: &str) -> Option<&str> {
    uri.strip_prefix(TABLE_SCHEMA_PREFIX)?
        .strip_suffix(TABLE_SCHEMA_SUFFIX)
        .filter(|table| !table.is_empty() && !table.contains('/'))
}
