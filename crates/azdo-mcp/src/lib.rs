//! MCP (Model Context Protocol) server for Azure DevOps.
//!
//! Tools are grouped by domain (core, work, work items, builds, releases,
//! wiki, test plans); only the enabled domains are listed and callable.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::{Services, ToolHandler};
pub use server::McpServer;
