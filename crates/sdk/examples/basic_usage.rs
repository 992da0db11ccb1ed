//! Basic SDK usage example.
//!
//! Connects to a ServiceNow instance with basic auth, lists open incidents,
//! checks MID servers and prints a CMDB summary.
//!
//! Run with:
//! SERVICENOW_INSTANCE_URL=https://dev12345.service-now.com \
//! SERVICENOW_BASIC_USERNAME=admin SERVICENOW_BASIC_PASSWORD=... \
//! cargo run --example basic_usage

use servicenow_sdk::types::{ListMidServersParams, NaturalLanguageSearchParams, QueryRecordsParams};
use servicenow_sdk::{ServiceNowClient, ServiceNowError, ServiceNowResult};
use std::time::Duration;

fn env(name: &str) -> ServiceNowResult<String> {
    std::env::var(name).map_err(|_| ServiceNowError::Config(format!("{} is not set", name)))
}

#[tokio::main]
async fn main() -> ServiceNowResult<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let client = ServiceNowClient::builder()
        .instance_url(env("SERVICENOW_INSTANCE_URL")?)
        .basic_auth(env("SERVICENOW_BASIC_USERNAME")?, env("SERVICENOW_BASIC_PASSWORD")?)
        .timeout(Duration::from_secs(30))
        .build()?;

    println!("Listing open priority 1 incidents...");
    let incidents = client
        .table()
        .query(&QueryRecordsParams {
            table: "incident".to_string(),
            query: Some("active=true^priority=1".to_string()),
            fields: Some("number,short_description,state".to_string()),
            limit: Some(5),
            order_by: Some("-sys_created_on".to_string()),
            ..Default::default()
        })
        .await?;
    println!("Found {} incidents", incidents.count);

    for incident in &incidents.records {
        println!(
            "  {}: {}",
            incident.get("number").and_then(|v| v.as_str()).unwrap_or("?"),
            incident.get("short_description").and_then(|v| v.as_str()).unwrap_or("")
        );
    }

    println!("\nChecking MID servers...");
    let mid_servers = client.itom().mid_servers(&ListMidServersParams { active_only: true }).await?;
    println!("{} MID server(s) are up", mid_servers.count);

    println!("\nCMDB summary:");
    let health = client.cmdb().health_dashboard().await?;
    println!("  {} configuration items", health.total_cis);
    for (class, count) in health.by_class.iter().take(5) {
        println!("  {}: {}", class, count);
    }

    println!("\nSearching in plain English...");
    let found = client
        .natural_language()
        .search(&NaturalLanguageSearchParams {
            query: "open changes about database".to_string(),
            limit: Some(5),
        })
        .await?;
    println!("{} record(s) in {} ({})", found.count, found.table, found.encoded_query);

    println!("\nBasic usage example completed successfully!");
    Ok(())
}
