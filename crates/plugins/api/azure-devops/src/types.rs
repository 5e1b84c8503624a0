//! Azure DevOps response envelopes.
//!
//! Entities themselves stay as JSON; these types only unwrap the
//! envelopes the client needs to look inside.

use serde::Deserialize;
use serde_json::Value;

/// `{count, value}` list envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub value: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkItemReference {
    pub id: u64,
}

/// Result of a WIQL query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WiqlResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkItemLink {
    pub target: Option<WorkItemReference>,
}

/// Work items of a team iteration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IterationWorkItems {
    #[serde(default)]
    pub work_item_relations: Vec<WorkItemLink>,
}

/// Wiki page as returned by the pages endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct WikiPage {
    #[serde(default)]
    pub content: Option<String>,
}
