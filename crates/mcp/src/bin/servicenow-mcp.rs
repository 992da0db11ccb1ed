// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use servicenow_mcp::{McpServer, ServerArgs, ToolRegistry};
use servicenow_sdk::ServiceNowClient;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = match ServerArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e.to_string().trim_end());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: ServerArgs) -> Result<()> {
    let settings = args.into_settings().context("Invalid configuration")?;

    tracing::info!(
        instance = %settings.client.instance_url,
        auth_method = settings.client.credentials.method_name(),
        write_enabled = settings.write_enabled,
        "ServiceNow MCP server starting..."
    );

    let client = ServiceNowClient::from_config(settings.client).context("Failed to create ServiceNow client")?;

    let registry = ToolRegistry::builtin(settings.write_enabled);
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry, Arc::new(client));
    server.start().await?;

    Ok(())
}

/// Logs go to stderr; stdout carries the protocol. `LOG_FORMAT=json` switches
/// to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
