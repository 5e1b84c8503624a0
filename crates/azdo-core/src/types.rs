//! Request parameter types shared by the API traits and the client.
//!
//! Response entities are passed through as `serde_json::Value`; only the
//! inputs the adapter constructs itself are typed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub value: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl Page {
    pub fn new(value: Vec<Value>) -> Self {
        Self {
            value,
            continuation_token: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// How much of a work item to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemExpand {
    None,
    Relations,
    Fields,
    Links,
    #[default]
    All,
}

impl WorkItemExpand {
    /// Value of the `$expand` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            WorkItemExpand::None => "None",
            WorkItemExpand::Relations => "Relations",
            WorkItemExpand::Fields => "Fields",
            WorkItemExpand::Links => "Links",
            WorkItemExpand::All => "All",
        }
    }
}

/// Format of a work item comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentFormat {
    #[default]
    Markdown,
    Html,
}

impl CommentFormat {
    pub fn as_query(&self) -> &'static str {
        match self {
            CommentFormat::Markdown => "markdown",
            CommentFormat::Html => "html",
        }
    }
}

// =============================================================================
// Core
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectQuery {
    pub state_filter: String,
    pub top: Option<u32>,
    pub skip: Option<u32>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamQuery {
    pub mine: Option<bool>,
    pub top: Option<u32>,
    pub skip: Option<u32>,
}

// =============================================================================
// Work
// =============================================================================

/// A new iteration node under the project's iteration root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIteration {
    pub name: String,
    pub start_date: Option<String>,
    pub finish_date: Option<String>,
}

// =============================================================================
// Work item tracking
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub expand: Option<String>,
    pub depth: Option<u32>,
    pub include_deleted: bool,
}

// =============================================================================
// Builds and pipelines
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildQuery {
    pub definitions: Vec<u64>,
    pub branch_name: Option<String>,
    pub status_filter: Option<String>,
    pub result_filter: Option<String>,
    pub top: Option<u32>,
    pub continuation_token: Option<String>,
    pub query_order: Option<String>,
}

/// Inclusive line range of a build log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRange {
    pub start_line: Option<u64>,
    pub end_line: Option<u64>,
}

/// Requested transition for a build stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Retry,
    Cancel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunPipelineOptions {
    pub pipeline_version: Option<u64>,
    pub branch: Option<String>,
    pub preview_run: Option<bool>,
    pub stages_to_skip: Vec<String>,
    pub template_parameters: BTreeMap<String, String>,
    pub variables: BTreeMap<String, String>,
    pub yaml_override: Option<String>,
}

// =============================================================================
// Wiki
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WikiPagesQuery {
    pub path: Option<String>,
    pub recursion_level: Option<String>,
    pub include_content: bool,
}

// =============================================================================
// Test plans
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestPlanQuery {
    pub filter_active_plans: bool,
    pub include_plan_details: bool,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestPlan {
    pub name: String,
    pub iteration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_serialization() {
        let page = Page {
            value: vec![json!({"id": 1})],
            continuation_token: Some("abc".into()),
        };
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({"value": [{"id": 1}], "continuationToken": "abc"})
        );
        assert_eq!(
            serde_json::to_value(Page::new(vec![])).unwrap(),
            json!({"value": []})
        );
    }

    #[test]
    fn test_expand_parse() {
        let expand: WorkItemExpand = serde_json::from_value(json!("relations")).unwrap();
        assert_eq!(expand.as_query(), "Relations");
        assert_eq!(WorkItemExpand::default(), WorkItemExpand::All);
    }

    #[test]
    fn test_new_test_plan_skips_unset() {
        let plan = NewTestPlan {
            name: "Release 1".into(),
            iteration: "Contoso\\Sprint 1".into(),
            area_path: Some("Contoso".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&plan).unwrap(),
            json!({"name": "Release 1", "iteration": "Contoso\\Sprint 1", "areaPath": "Contoso"})
        );
    }
}
