//! Team iteration tools.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::types::NewIteration;
use azdo_core::{Domain, Result, WorkApi};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, tool, unknown_tool, with_args, ToolSet};
use crate::protocol::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIterationsArgs {
    project: String,
    team: String,
    #[serde(default)]
    timeframe: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestedIteration {
    iteration_name: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    finish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIterationsArgs {
    project: String,
    iterations: Vec<RequestedIteration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Assignment {
    identifier: String,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignIterationsArgs {
    project: String,
    team: String,
    iterations: Vec<Assignment>,
}

pub struct WorkTools {
    api: Arc<dyn WorkApi>,
}

impl WorkTools {
    pub fn new(api: Arc<dyn WorkApi>) -> Self {
        Self { api }
    }

    async fn list_iterations(&self, args: ListIterationsArgs) -> ToolCallResult {
        match self
            .api
            .get_team_iterations(&args.project, &args.team, args.timeframe)
            .await
        {
            Ok(iterations) if iterations.is_empty() => ToolCallResult::error("No iterations found"),
            Ok(iterations) => ToolCallResult::json(&iterations),
            Err(e) => failure("Error fetching team iterations", &e),
        }
    }

    async fn create_iterations(&self, args: CreateIterationsArgs) -> ToolCallResult {
        let mut created = Vec::with_capacity(args.iterations.len());
        for requested in args.iterations {
            let iteration = NewIteration {
                name: requested.iteration_name,
                start_date: requested.start_date,
                finish_date: requested.finish_date,
            };
            match self.api.create_iteration(&args.project, &iteration).await {
                Ok(Value::Null) => {}
                Ok(node) => created.push(node),
                Err(e) => return failure("Error creating iterations", &e),
            }
        }

        if created.is_empty() {
            return ToolCallResult::error("No iterations were created");
        }
        ToolCallResult::json(&created)
    }

    async fn assign(&self, project: &str, team: &str, assignment: Assignment) -> Result<Option<String>> {
        let assigned = self
            .api
            .assign_iteration(project, team, &assignment.identifier, assignment.path)
            .await?;
        Ok((!assigned.is_null()).then_some(assignment.identifier))
    }

    async fn assign_iterations(&self, args: AssignIterationsArgs) -> ToolCallResult {
        let mut lines = Vec::new();
        for assignment in args.iterations {
            match self.assign(&args.project, &args.team, assignment).await {
                Ok(Some(id)) => lines.push(format!("Iteration {} assigned to team {}.", id, args.team)),
                Ok(None) => {}
                Err(e) => return failure("Error assigning iterations", &e),
            }
        }

        if lines.is_empty() {
            return ToolCallResult::error("No iterations were assigned to the team");
        }
        ToolCallResult::text(lines.join("\n"))
    }
}

#[async_trait]
impl ToolSet for WorkTools {
    fn domain(&self) -> Domain {
        Domain::Work
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                "work_list_team_iterations",
                "List the iterations of a team.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "team": { "type": "string" },
                        "timeframe": { "type": "string", "enum": ["current"], "description": "Only the current iteration" }
                    },
                    "required": ["project", "team"]
                }),
            ),
            tool(
                "work_create_iterations",
                "Create iterations under the project's iteration root.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "iterations": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "iterationName": { "type": "string" },
                                    "startDate": { "type": "string", "description": "ISO 8601 date" },
                                    "finishDate": { "type": "string", "description": "ISO 8601 date" }
                                },
                                "required": ["iterationName"]
                            }
                        }
                    },
                    "required": ["project", "iterations"]
                }),
            ),
            tool(
                "work_assign_iterations",
                "Assign existing iterations to a team.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "team": { "type": "string" },
                        "iterations": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "identifier": { "type": "string", "description": "Iteration id" },
                                    "path": { "type": "string" }
                                },
                                "required": ["identifier"]
                            }
                        }
                    },
                    "required": ["project", "team", "iterations"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "work_list_team_iterations" => {
                with_args(name, arguments, |a| self.list_iterations(a)).await
            }
            "work_create_iterations" => {
                with_args(name, arguments, |a| self.create_iterations(a)).await
            }
            "work_assign_iterations" => {
                with_args(name, arguments, |a| self.assign_iterations(a)).await
            }
            _ => unknown_tool(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdo_core::provider::MockWorkApi;
    use azdo_core::Error;

    #[tokio::test]
    async fn test_list_iterations_empty_is_error() {
        let mut api = MockWorkApi::new();
        api.expect_get_team_iterations()
            .withf(|project, team, timeframe| {
                project == "Contoso" && team == "Web" && timeframe.as_deref() == Some("current")
            })
            .returning(|_, _, _| Ok(vec![]));

        let result = WorkTools::new(Arc::new(api))
            .call(
                "work_list_team_iterations",
                Some(json!({"project": "Contoso", "team": "Web", "timeframe": "current"})),
            )
            .await;
        assert!(result.is_error());
        assert_eq!(result.first_text(), "No iterations found");
    }

    #[tokio::test]
    async fn test_create_iterations_wraps_in_array() {
        let mut api = MockWorkApi::new();
        api.expect_create_iteration()
            .withf(|_, iteration| {
                iteration.name == "Sprint 9" && iteration.start_date.as_deref() == Some("2025-01-06")
            })
            .times(1)
            .returning(|_, _| Ok(json!({"id": 90, "name": "Sprint 9"})));

        let result = WorkTools::new(Arc::new(api))
            .call(
                "work_create_iterations",
                Some(json!({
                    "project": "Contoso",
                    "iterations": [{"iterationName": "Sprint 9", "startDate": "2025-01-06"}]
                })),
            )
            .await;
        let created: Value = serde_json::from_str(result.first_text()).unwrap();
        assert_eq!(created, json!([{"id": 90, "name": "Sprint 9"}]));
    }

    #[tokio::test]
    async fn test_create_iterations_nothing_created() {
        let result = WorkTools::new(Arc::new(MockWorkApi::new()))
            .call(
                "work_create_iterations",
                Some(json!({"project": "Contoso", "iterations": []})),
            )
            .await;
        assert!(result.is_error());
        assert_eq!(result.first_text(), "No iterations were created");
    }

    #[tokio::test]
    async fn test_assign_iterations() {
        let mut api = MockWorkApi::new();
        api.expect_assign_iteration()
            .withf(|_, team, id, path| team == "Web" && id == "it-1" && path.is_none())
            .returning(|_, _, _, _| Ok(json!({"id": "it-1"})));

        let result = WorkTools::new(Arc::new(api))
            .call(
                "work_assign_iterations",
                Some(json!({
                    "project": "Contoso",
                    "team": "Web",
                    "iterations": [{"identifier": "it-1"}]
                })),
            )
            .await;
        assert!(!result.is_error());
        assert_eq!(result.first_text(), "Iteration it-1 assigned to team Web.");
    }

    #[tokio::test]
    async fn test_assign_iterations_failure() {
        let mut api = MockWorkApi::new();
        api.expect_assign_iteration()
            .returning(|_, _, _, _| Err(Error::Http("connection reset".into())));

        let result = WorkTools::new(Arc::new(api))
            .call(
                "work_assign_iterations",
                Some(json!({
                    "project": "Contoso",
                    "team": "Web",
                    "iterations": [{"identifier": "it-1", "path": "Contoso\\Sprint 1"}]
                })),
            )
            .await;
        assert!(result.is_error());
        assert_eq!(
            result.first_text(),
            "Error assigning iterations: HTTP error: connection reset"
        );
    }
}
