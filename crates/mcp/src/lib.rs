// MCP (Model Context Protocol) server for ServiceNow
// Exposes ServiceNow REST operations as tools to agent clients over stdio

pub mod codec;
pub mod config;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use config::{AuthMethod, ServerArgs, ServerSettings};
pub use server::McpServer;
pub use tools::ToolRegistry;
