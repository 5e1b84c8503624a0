//! Project, team and identity tools.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::types::{Page, ProjectQuery, TeamQuery};
use azdo_core::{CoreApi, Domain};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, tool, unknown_tool, with_args, StringOrNumber, ToolSet};
use crate::protocol::{ToolCallResult, ToolDefinition};

fn default_state_filter() -> String {
    "wellFormed".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsArgs {
    #[serde(default = "default_state_filter")]
    state_filter: String,
    #[serde(default)]
    top: Option<u32>,
    #[serde(default)]
    skip: Option<u32>,
    #[serde(default)]
    continuation_token: Option<StringOrNumber>,
    #[serde(default)]
    project_name_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTeamsArgs {
    project: String,
    #[serde(default)]
    mine: Option<bool>,
    #[serde(default)]
    top: Option<u32>,
    #[serde(default)]
    skip: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityArgs {
    search_filter: String,
}

/// Keep projects whose name contains `filter`, ignoring case.
fn filter_by_name(projects: Vec<Value>, filter: &str) -> Vec<Value> {
    let needle = filter.to_lowercase();
    projects
        .into_iter()
        .filter(|project| {
            project["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}

/// `{id, displayName, descriptor}` of an identity.
fn identity_summary(identity: &Value) -> Value {
    json!({
        "id": identity["id"],
        "displayName": identity["providerDisplayName"],
        "descriptor": identity["descriptor"],
    })
}

pub struct CoreTools {
    api: Arc<dyn CoreApi>,
}

impl CoreTools {
    pub fn new(api: Arc<dyn CoreApi>) -> Self {
        Self { api }
    }

    async fn list_projects(&self, args: ListProjectsArgs) -> ToolCallResult {
        let query = ProjectQuery {
            state_filter: args.state_filter,
            top: args.top,
            skip: args.skip,
            continuation_token: args.continuation_token.map(|t| t.to_string()),
        };

        let page = match self.api.list_projects(&query).await {
            Ok(page) => page,
            Err(e) => return failure("Error fetching projects", &e),
        };

        let filter = args
            .project_name_filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());
        let projects = match filter {
            Some(filter) => filter_by_name(page.value, filter),
            None => page.value,
        };

        if projects.is_empty() {
            return ToolCallResult::text(match filter {
                Some(filter) => format!("No projects found with the name filter '{}'.", filter),
                None => "No projects found in the organization.".to_string(),
            });
        }

        ToolCallResult::json(&Page {
            value: projects,
            continuation_token: page.continuation_token,
        })
    }

    async fn list_teams(&self, args: ListTeamsArgs) -> ToolCallResult {
        let query = TeamQuery {
            mine: args.mine,
            top: args.top,
            skip: args.skip,
        };
        match self.api.list_teams(&args.project, &query).await {
            Ok(teams) if teams.is_empty() => {
                ToolCallResult::text("No teams found for the specified criteria.")
            }
            Ok(teams) => ToolCallResult::json(&teams),
            Err(e) => failure(
                &format!("Error fetching project teams for project '{}'", args.project),
                &e,
            ),
        }
    }

    async fn get_identity_ids(&self, args: IdentityArgs) -> ToolCallResult {
        match self.api.search_identities(&args.search_filter).await {
            Ok(identities) if identities.is_empty() => ToolCallResult::text(format!(
                "No identities found for search filter '{}'.",
                args.search_filter
            )),
            Ok(identities) => {
                let summaries: Vec<Value> = identities.iter().map(identity_summary).collect();
                ToolCallResult::json(&summaries)
            }
            Err(e) => failure(
                &format!(
                    "Error fetching identities for search filter '{}'",
                    args.search_filter
                ),
                &e,
            ),
        }
    }
}

#[async_trait]
impl ToolSet for CoreTools {
    fn domain(&self) -> Domain {
        Domain::Core
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                "core_list_projects",
                "List the projects of the organization.",
                json!({
                    "type": "object",
                    "properties": {
                        "stateFilter": {
                            "type": "string",
                            "enum": ["all", "wellFormed", "createPending", "deleted"],
                            "description": "Project state to list (default: wellFormed)"
                        },
                        "top": { "type": "integer" },
                        "skip": { "type": "integer" },
                        "continuationToken": { "type": ["string", "integer"] },
                        "projectNameFilter": { "type": "string", "description": "Case-insensitive substring of the project name" }
                    }
                }),
            ),
            tool(
                "core_list_project_teams",
                "List the teams of a project.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "mine": { "type": "boolean", "description": "Only teams the user belongs to" },
                        "top": { "type": "integer" },
                        "skip": { "type": "integer" }
                    },
                    "required": ["project"]
                }),
            ),
            tool(
                "core_get_identity_ids",
                "Find identity ids by display name, unique name or email.",
                json!({
                    "type": "object",
                    "properties": {
                        "searchFilter": { "type": "string" }
                    },
                    "required": ["searchFilter"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "core_list_projects" => with_args(name, arguments, |a| self.list_projects(a)).await,
            "core_list_project_teams" => with_args(name, arguments, |a| self.list_teams(a)).await,
            "core_get_identity_ids" => {
                with_args(name, arguments, |a| self.get_identity_ids(a)).await
            }
            _ => unknown_tool(name),
        }
    }
}
