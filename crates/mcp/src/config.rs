// Server configuration from environment variables and command-line flags

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use servicenow_sdk::{ClientConfig, Credentials, RetryConfig, ServiceNowError, ServiceNowResult};
use std::time::Duration;
use url::Url;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// OAuth password grant
    Oauth,
    /// HTTP basic authentication
    Basic,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "servicenow-mcp")]
#[command(version, about = "MCP server exposing ServiceNow operations as tools over stdio", long_about = None)]
pub struct ServerArgs {
    /// ServiceNow instance URL, e.g. https://dev12345.service-now.com
    #[arg(long, env = "SERVICENOW_INSTANCE_URL")]
    pub instance_url: String,

    /// Authentication method
    #[arg(long, env = "SERVICENOW_AUTH_METHOD", value_enum, ignore_case = true)]
    pub auth_method: AuthMethod,

    /// OAuth client ID
    #[arg(long, env = "SERVICENOW_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "SERVICENOW_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth username
    #[arg(long, env = "SERVICENOW_USERNAME")]
    pub username: Option<String>,

    /// OAuth password
    #[arg(long, env = "SERVICENOW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Basic auth username
    #[arg(long, env = "SERVICENOW_BASIC_USERNAME")]
    pub basic_username: Option<String>,

    /// Basic auth password
    #[arg(long, env = "SERVICENOW_BASIC_PASSWORD", hide_env_values = true)]
    pub basic_password: Option<String>,

    /// Retries for failed requests
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Initial delay between retries, in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Per-request timeout, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 30000)]
    pub request_timeout_ms: u64,

    /// Allow tools that create or modify records
    #[arg(
        long,
        env = "WRITE_ENABLED",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub write_enabled: bool,
}

/// Validated settings the server runs with.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub client: ClientConfig,
    pub write_enabled: bool,
}

impl ServerArgs {
    /// Check credentials for the chosen auth method and build the client config.
    pub fn into_settings(self) -> ServiceNowResult<ServerSettings> {
        let instance_url = parse_instance_url(&self.instance_url)?;

        let credentials = match self.auth_method {
            AuthMethod::Oauth => {
                let [client_id, client_secret, username, password] = require([
                    ("SERVICENOW_CLIENT_ID", self.client_id),
                    ("SERVICENOW_CLIENT_SECRET", self.client_secret),
                    ("SERVICENOW_USERNAME", self.username),
                    ("SERVICENOW_PASSWORD", self.password),
                ], "oauth")?;
                Credentials::OAuth {
                    client_id,
                    client_secret,
                    username,
                    password,
                }
            }
            AuthMethod::Basic => {
                let [username, password] = require([
                    ("SERVICENOW_BASIC_USERNAME", self.basic_username),
                    ("SERVICENOW_BASIC_PASSWORD", self.basic_password),
                ], "basic")?;
                Credentials::Basic { username, password }
            }
        };

        let retry_config = RetryConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryConfig::default()
        };

        let mut client = ClientConfig::new(instance_url, credentials);
        client.timeout = Duration::from_millis(self.request_timeout_ms);
        client.retry_config = retry_config;

        Ok(ServerSettings {
            client,
            write_enabled: self.write_enabled,
        })
    }
}

/// Accepts bare host names by assuming https.
fn parse_instance_url(raw: &str) -> ServiceNowResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceNowError::Config("SERVICENOW_INSTANCE_URL is empty".to_string()));
    }

    let url = if raw.contains("://") {
        Url::parse(raw)?
    } else {
        Url::parse(&format!("https://{}", raw))?
    };

    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(ServiceNowError::Config(format!(
            "SERVICENOW_INSTANCE_URL must be an http(s) URL with a host, got {}",
            raw
        ))),
    }
}

fn require<const N: usize>(
    values: [(&'static str, Option<String>); N],
    method: &str,
) -> ServiceNowResult<[String; N]> {
    let missing: Vec<&str> = values
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ServiceNowError::Config(format!(
            "{} required when SERVICENOW_AUTH_METHOD={}",
            missing.join(", "),
            method
        )));
    }

    Ok(values.map(|(_, value)| value.unwrap_or_default()))
}
