mod cmdb;
mod itom;
mod itsm;
mod natural_language;
mod platform;
mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use cmdb::{GetCmdbCiTool, ListRelationshipsTool, SearchCmdbCiTool};
pub use itom::{
    CmdbHealthDashboardTool, ListActiveEventsTool, ListDiscoverySchedulesTool, ListMidServersTool,
    ServiceMappingSummaryTool,
};
pub use itsm::CreateChangeRequestTool;
pub use natural_language::{NaturalLanguageSearchTool, NaturalLanguageUpdateTool};
pub use platform::{GetGroupTool, GetRecordTool, GetTableSchemaTool, GetUserTool, QueryRecordsTool};
pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, parse_args, validate_limit,
    with_summary, Tool, ToolRegistry, ToolTier,
};
