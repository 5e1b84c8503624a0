//! Shared setup: the full tool stack over an httpmock server.

use std::collections::BTreeSet;
use std::sync::Arc;

use azdo_client::{AzureDevOpsClient, Credential};
use azdo_core::Domain;
use azdo_mcp::protocol::ToolCallResult;
use azdo_mcp::{Services, ToolHandler};
use httpmock::MockServer;
use serde_json::Value;

/// `Basic base64(":pat")`
pub const AUTHORIZATION: &str = "Basic OnBhdA==";

/// Every domain, served by a client pointed at `server`.
pub fn handler(server: &MockServer) -> ToolHandler {
    let client = AzureDevOpsClient::with_base_url(server.base_url(), Credential::Pat("pat".into()));
    let domains: BTreeSet<Domain> = Domain::ALL.into_iter().collect();
    ToolHandler::new(Services::from_client(Arc::new(client)), &domains)
}

/// Parse the JSON text of a successful tool result.
pub fn json(result: &ToolCallResult) -> Value {
    assert!(!result.is_error(), "tool failed: {}", result.first_text());
    serde_json::from_str(result.first_text()).expect("tool result is JSON")
}
