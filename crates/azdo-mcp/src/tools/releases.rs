//! Classic release tools.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::{Domain, ReleaseApi};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{respond, tool, unknown_tool, with_args, ToolSet};
use crate::protocol::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionsArgs {
    project: String,
    #[serde(default)]
    search_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleasesArgs {
    project: String,
    #[serde(default)]
    definition_id: Option<u64>,
}

pub struct ReleaseTools {
    api: Arc<dyn ReleaseApi>,
}

impl ReleaseTools {
    pub fn new(api: Arc<dyn ReleaseApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolSet for ReleaseTools {
    fn domain(&self) -> Domain {
        Domain::Releases
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                "release_get_definitions",
                "List the release definitions of a project.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "searchText": { "type": "string", "description": "Only definitions whose name contains this text" }
                    },
                    "required": ["project"]
                }),
            ),
            tool(
                "release_get_releases",
                "List the releases of a project.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "definitionId": { "type": "integer" }
                    },
                    "required": ["project"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "release_get_definitions" => {
                with_args(name, arguments, |a: DefinitionsArgs| async move {
                    respond(
                        "Error fetching release definitions",
                        self.api
                            .get_release_definitions(&a.project, a.search_text)
                            .await,
                    )
                })
                .await
            }
            "release_get_releases" => {
                with_args(name, arguments, |a: ReleasesArgs| async move {
                    respond(
                        "Error fetching releases",
                        self.api.get_releases(&a.project, a.definition_id).await,
                    )
                })
                .await
            }
            _ => unknown_tool(name),
        }
    }
}
