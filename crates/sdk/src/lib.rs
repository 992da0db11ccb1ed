//! # ServiceNow SDK
//!
//! Async client for the ServiceNow REST APIs behind the `servicenow-mcp` tools:
//! the Table API, the Aggregate (stats) API, and OAuth token issuance.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use servicenow_sdk::{ServiceNowClient, ServiceNowResult};
//! use servicenow_sdk::types::QueryRecordsParams;
//!
//! #[tokio::main]
//! async fn main() -> ServiceNowResult<()> {
//!     let client = ServiceNowClient::builder()
//!         .instance_url("https://dev12345.service-now.com")
//!         .basic_auth("admin", "password")
//!         .build()?;
//!
//!     let incidents = client
//!         .table()
//!         .query(&QueryRecordsParams {
//!             table: "incident".to_string(),
//!             query: Some("active=true".to_string()),
//!             limit: Some(10),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Found {} incidents", incidents.count);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{ServiceNowApi, ServiceNowClient, ServiceNowClientBuilder};
pub use config::{ClientConfig, Credentials, RetryConfig};
pub use error::{ErrorCode, ServiceNowError, ServiceNowResult};
