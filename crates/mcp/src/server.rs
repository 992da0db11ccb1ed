// MCP server: newline-delimited JSON-RPC over stdio

use crate::codec::{Frame, MessageCodec, DEFAULT_MAX_MESSAGE_BYTES};
use crate::protocol::*;
use crate::resources;
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use servicenow_sdk::{ServiceNowApi, ServiceNowError};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, info, warn};

pub const SERVER_NAME: &str = "servicenow-mcp";

pub struct McpServer {
    registry: ToolRegistry,
    client: Arc<dyn ServiceNowApi>,
    max_message_bytes: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, client: Arc<dyn ServiceNowApi>) -> Self {
        Self {
            registry,
            client,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }

    /// Lines longer than this are answered with a parse error and skipped.
    pub fn with_max_message_bytes(mut self, max_message_bytes: usize) -> Self {
        self.max_message_bytes = max_message_bytes;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn start(&self) -> Result<()> {
        info!(
            tools = self.registry.len(),
            write_enabled = self.registry.write_enabled(),
            "MCP server listening on stdio"
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one message per line until the reader reaches EOF.
    ///
    /// Bad lines are answered with a parse error; only I/O failures end the loop.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = FramedRead::new(reader, MessageCodec::new(self.max_message_bytes));
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(frame) = frames.next().await {
            let response = match frame.context("Failed to read from input")? {
                Frame::Message(line) if line.trim().is_empty() => continue,
                Frame::Message(line) => self.handle_message(&line).await,
                Frame::Malformed(reason) => {
                    warn!(reason = %reason, "Malformed input line");
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::parse_error().with_data(serde_json::json!(reason)),
                    ))
                }
            };

            if let Some(response) = response {
                let encoded = serde_json::to_string(&response).context("Failed to encode response")?;
                sink.send(encoded).await.context("Failed to write response")?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC message");
                Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error().with_data(serde_json::json!(e.to_string())),
                ))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
            ));
        }

        debug!(method = %request.method, "Request received");

        let result = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => to_result(&ListToolsResult {
                tools: self.registry.list_schemas(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            "resources/list" => to_result(&ListResourcesResult {
                resources: resources::list_resources(),
            }),
            "resources/read" => self.read_resource(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e),
        })
    }

    fn initialize(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: InitializeParams = match params {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?,
            None => InitializeParams::default(),
        };

        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = %client.version, "Client connected");
        }

        to_result(&InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    async fn call_tool(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))
            .and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))
            })?;

        info!(tool = %params.name, "Tool called");

        let outcome = self
            .registry
            .execute(self.client.as_ref(), &params.name, params.arguments)
            .await;

        let result = match outcome {
            Ok(serde_json::Value::String(text)) => CallToolResult::text(text),
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => tool_error(&params.name, &ServiceNowError::from(e)),
            },
            Err(e) => tool_error(&params.name, &e),
        };

        to_result(&result)
    }

    async fn read_resource(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: ReadResourceParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params for resources/read"))
            .and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid resources/read params: {}", e)))
            })?;

        info!(uri = %params.uri, "Resource read");

        match resources::read_resource(self.client.as_ref(), &params.uri).await {
            Ok(contents) => to_result(&ReadResourceResult {
                contents: vec![contents],
            }),
            Err(e) => {
                error!(uri = %params.uri, code = %e.code(), error = %e, "Resource read failed");
                Err(resource_error(&e))
            }
        }
    }
}

fn tool_error(tool: &str, e: &ServiceNowError) -> CallToolResult {
    error!(tool = %tool, code = %e.code(), error = %e, "Tool failed");
    CallToolResult::error(format!("{} (Code: {})", e, e.code()))
}

fn resource_error(e: &ServiceNowError) -> JsonRpcError {
    let code = match e {
        ServiceNowError::NotFound(_) => JsonRpcError::RESOURCE_NOT_FOUND,
        ServiceNowError::InvalidRequest(_) => JsonRpcError::INVALID_PARAMS,
        _ => JsonRpcError::INTERNAL_ERROR,
    };

    let mut data = serde_json::json!({ "code": e.code() });
    if let Some(details) = e.details() {
        data["details"] = details;
    }

    JsonRpcError::custom(code, e.to_string()).with_data(data)
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(format!("Failed to encode result: {}", e)))
}
