//! Framing of work item updates for the `$batch` endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::patch::{format_hint, PatchOperation, TextFormat};

/// api-version of the `$batch` endpoint and of its sub-request URIs.
pub const BATCH_API_VERSION: &str = "5.0";

pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// One sub-request of a batch call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequestItem {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<PatchOperation>,
}

impl BatchRequestItem {
    pub fn patch(work_item_id: u64, body: Vec<PatchOperation>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), JSON_PATCH_CONTENT_TYPE.to_string());
        Self {
            method: "PATCH".to_string(),
            uri: batch_item_uri(work_item_id),
            headers,
            body,
        }
    }
}

/// A single operation destined for one work item in a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub work_item_id: u64,
    pub operation: PatchOperation,
    pub format: Option<TextFormat>,
}

impl BatchEntry {
    pub fn new(work_item_id: u64, operation: PatchOperation) -> Self {
        Self {
            work_item_id,
            operation,
            format: None,
        }
    }

    pub fn with_format(mut self, format: Option<TextFormat>) -> Self {
        self.format = format;
        self
    }
}

pub fn batch_item_uri(work_item_id: u64) -> String {
    format!(
        "/_apis/wit/workitems/{}?api-version={}",
        work_item_id, BATCH_API_VERSION
    )
}

struct Group {
    id: u64,
    operations: Vec<PatchOperation>,
    hints: Vec<PatchOperation>,
}

impl Group {
    fn has_hint_for(&self, path: &str) -> bool {
        self.hints.iter().any(|hint| hint.path == path)
    }
}

/// Group entries into one sub-request per work item.
///
/// Work items keep their first-seen order and operations keep their
/// relative order. Format hints for long text fields follow all of the
/// item's value operations, at most one per field.
pub fn frame_batch(entries: &[BatchEntry]) -> Vec<BatchRequestItem> {
    let mut groups: Vec<Group> = Vec::new();

    for entry in entries {
        let index = match groups.iter().position(|g| g.id == entry.work_item_id) {
            Some(index) => index,
            None => {
                groups.push(Group {
                    id: entry.work_item_id,
                    operations: Vec::new(),
                    hints: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];
        group.operations.push(entry.operation.clone());

        let hint = entry.operation.field_name().zip(entry.operation.value.as_ref()).and_then(
            |(field, value)| format_hint(field, value, entry.format),
        );
        if let Some(hint) = hint {
            if !group.has_hint_for(&hint.path) {
                group.hints.push(hint);
            }
        }
    }

    groups
        .into_iter()
        .map(|group| {
            let mut body = group.operations;
            body.extend(group.hints);
            BatchRequestItem::patch(group.id, body)
        })
        .collect()
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    value: Vec<BatchSubResponse>,
}

#[derive(Debug, Deserialize)]
struct BatchSubResponse {
    code: u16,
    #[serde(default)]
    body: Value,
}

fn parse_body(body: Value) -> Value {
    match body {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

fn failure_message(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.pointer("/value/Message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match body {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
}

/// Unpack a `$batch` response into the sub-response bodies.
///
/// String bodies are parsed as JSON. Any non-2xx sub-response fails the
/// whole call with one aggregate error.
pub fn unpack_batch_response(response: Value) -> Result<Vec<Value>> {
    let response: BatchResponse = serde_json::from_value(response)?;

    let mut bodies = Vec::with_capacity(response.value.len());
    let mut failures = Vec::new();
    let mut first_failed_status = None;

    for (index, item) in response.value.into_iter().enumerate() {
        let body = parse_body(item.body);
        if (200..300).contains(&item.code) {
            bodies.push(body);
        } else {
            first_failed_status.get_or_insert(item.code);
            failures.push(format!(
                "item {} failed with status {}: {}",
                index,
                item.code,
                failure_message(&body)
            ));
        }
    }

    match first_failed_status {
        Some(status) => Err(Error::Api {
            status,
            message: format!("Batch request failed; {}", failures.join("; ")),
        }),
        None => Ok(bodies),
    }
}
