//! Build and pipeline tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::types::{BuildQuery, LineRange, RunPipelineOptions, StageState};
use azdo_core::{BuildApi, Domain};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, respond, tool, unknown_tool, with_args, StringOrNumber, ToolSet};
use crate::protocol::{ToolCallResult, ToolDefinition};

fn default_change_count() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionsArgs {
    project: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionsArgs {
    project: String,
    definition_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildsArgs {
    project: String,
    #[serde(default)]
    definitions: Vec<u64>,
    #[serde(default)]
    branch_name: Option<String>,
    #[serde(default)]
    status_filter: Option<String>,
    #[serde(default)]
    result_filter: Option<String>,
    #[serde(default)]
    top: Option<u32>,
    #[serde(default)]
    continuation_token: Option<StringOrNumber>,
    #[serde(default)]
    query_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildArgs {
    project: String,
    build_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogArgs {
    project: String,
    build_id: u64,
    log_id: u64,
    #[serde(default)]
    start_line: Option<u64>,
    #[serde(default)]
    end_line: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangesArgs {
    project: String,
    build_id: u64,
    #[serde(default = "default_change_count")]
    top: u32,
    #[serde(default)]
    continuation_token: Option<StringOrNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageArgs {
    project: String,
    build_id: u64,
    stage_name: String,
    status: StageState,
    #[serde(default)]
    force_retry_all_jobs: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunPipelineArgs {
    project: String,
    pipeline_id: u64,
    #[serde(default)]
    pipeline_version: Option<u64>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    preview_run: Option<bool>,
    #[serde(default)]
    stages_to_skip: Vec<String>,
    #[serde(default)]
    template_parameters: BTreeMap<String, String>,
    #[serde(default)]
    variables: BTreeMap<String, String>,
    #[serde(default)]
    yaml_override: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunArgs {
    project: String,
    pipeline_id: u64,
    run_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunsArgs {
    project: String,
    pipeline_id: u64,
}

fn status_line(build: &Value) -> String {
    let field = |name: &str| build[name].as_str().unwrap_or("none").to_string();
    format!("Status: {}, Result: {}", field("status"), field("result"))
}

pub struct BuildTools {
    api: Arc<dyn BuildApi>,
}

impl BuildTools {
    pub fn new(api: Arc<dyn BuildApi>) -> Self {
        Self { api }
    }

    async fn get_definitions(&self, args: DefinitionsArgs) -> ToolCallResult {
        respond(
            "Error fetching build definitions",
            self.api.get_definitions(&args.project, args.name).await,
        )
    }

    async fn get_revisions(&self, args: RevisionsArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching revisions of definition {}", args.definition_id),
            self.api
                .get_definition_revisions(&args.project, args.definition_id)
                .await,
        )
    }

    async fn get_builds(&self, args: BuildsArgs) -> ToolCallResult {
        let query = BuildQuery {
            definitions: args.definitions,
            branch_name: args.branch_name,
            status_filter: args.status_filter,
            result_filter: args.result_filter,
            top: args.top,
            continuation_token: args.continuation_token.map(|t| t.to_string()),
            query_order: args.query_order,
        };
        respond(
            "Error fetching builds",
            self.api.get_builds(&args.project, &query).await,
        )
    }

    async fn get_logs(&self, args: BuildArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching logs of build {}", args.build_id),
            self.api.get_build_logs(&args.project, args.build_id).await,
        )
    }

    async fn get_log_lines(&self, args: LogArgs) -> ToolCallResult {
        let range = LineRange {
            start_line: args.start_line,
            end_line: args.end_line,
        };
        respond(
            &format!("Error fetching log {} of build {}", args.log_id, args.build_id),
            self.api
                .get_build_log_lines(&args.project, args.build_id, args.log_id, &range)
                .await,
        )
    }

    async fn get_changes(&self, args: ChangesArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching changes of build {}", args.build_id),
            self.api
                .get_build_changes(
                    &args.project,
                    args.build_id,
                    args.top,
                    args.continuation_token.map(|t| t.to_string()),
                )
                .await,
        )
    }

    async fn get_status(&self, args: BuildArgs) -> ToolCallResult {
        match self.api.get_build(&args.project, args.build_id).await {
            Ok(build) => ToolCallResult::text(status_line(&build)),
            Err(e) => failure(&format!("Error fetching build {}", args.build_id), &e),
        }
    }

    async fn update_stage(&self, args: StageArgs) -> ToolCallResult {
        respond(
            &format!(
                "Error updating stage '{}' of build {}",
                args.stage_name, args.build_id
            ),
            self.api
                .update_build_stage(
                    &args.project,
                    args.build_id,
                    &args.stage_name,
                    args.status,
                    args.force_retry_all_jobs,
                )
                .await,
        )
    }

    async fn run_pipeline(&self, args: RunPipelineArgs) -> ToolCallResult {
        let options = RunPipelineOptions {
            pipeline_version: args.pipeline_version,
            branch: args.branch,
            preview_run: args.preview_run,
            stages_to_skip: args.stages_to_skip,
            template_parameters: args.template_parameters,
            variables: args.variables,
            yaml_override: args.yaml_override,
        };
        respond(
            &format!("Error running pipeline {}", args.pipeline_id),
            self.api
                .run_pipeline(&args.project, args.pipeline_id, &options)
                .await,
        )
    }

    async fn get_run(&self, args: RunArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching run {} of pipeline {}", args.run_id, args.pipeline_id),
            self.api
                .get_run(&args.project, args.pipeline_id, args.run_id)
                .await,
        )
    }

    async fn list_runs(&self, args: RunsArgs) -> ToolCallResult {
        respond(
            &format!("Error listing runs of pipeline {}", args.pipeline_id),
            self.api.list_runs(&args.project, args.pipeline_id).await,
        )
    }
}

fn project_and_build(extra: Value) -> Value {
    let mut properties = json!({
        "project": { "type": "string" },
        "buildId": { "type": "integer" }
    });
    let mut required = vec![json!("project"), json!("buildId")];
    if let (Some(target), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (name, schema) in extra {
            if schema.get("default").is_none() && schema.get("optional").is_none() {
                required.push(json!(name));
            }
            let mut schema = schema.clone();
            if let Some(schema) = schema.as_object_mut() {
                schema.remove("optional");
            }
            target.insert(name.clone(), schema);
        }
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

#[async_trait]
impl ToolSet for BuildTools {
    fn domain(&self) -> Domain {
        Domain::Builds
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                "build_get_definitions",
                "List the build definitions of a project.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "name": { "type": "string", "description": "Only definitions with this name" }
                    },
                    "required": ["project"]
                }),
            ),
            tool(
                "build_get_definition_revisions",
                "List the revisions of a build definition.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "definitionId": { "type": "integer" }
                    },
                    "required": ["project", "definitionId"]
                }),
            ),
            tool(
                "build_get_builds",
                "List builds; pass the returned continuationToken to get the next page.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "definitions": { "type": "array", "items": { "type": "integer" } },
                        "branchName": { "type": "string" },
                        "statusFilter": { "type": "string", "enum": ["all", "cancelling", "completed", "inProgress", "none", "notStarted", "postponed"] },
                        "resultFilter": { "type": "string", "enum": ["canceled", "failed", "none", "partiallySucceeded", "succeeded"] },
                        "top": { "type": "integer" },
                        "continuationToken": { "type": ["string", "integer"] },
                        "queryOrder": { "type": "string", "enum": ["finishTimeAscending", "finishTimeDescending", "queueTimeAscending", "queueTimeDescending", "startTimeAscending", "startTimeDescending"] }
                    },
                    "required": ["project"]
                }),
            ),
            tool(
                "build_get_log",
                "List the logs of a build.",
                project_and_build(json!({})),
            ),
            tool(
                "build_get_log_by_id",
                "Get the lines of one build log.",
                project_and_build(json!({
                    "logId": { "type": "integer" },
                    "startLine": { "type": "integer", "optional": true },
                    "endLine": { "type": "integer", "optional": true }
                })),
            ),
            tool(
                "build_get_changes",
                "List the changes associated with a build.",
                project_and_build(json!({
                    "top": { "type": "integer", "default": 10 },
                    "continuationToken": { "type": ["string", "integer"], "optional": true }
                })),
            ),
            tool(
                "build_get_status",
                "Get the status and result of a build.",
                project_and_build(json!({})),
            ),
            tool(
                "build_update_build_stage",
                "Retry or cancel a stage of a build.",
                project_and_build(json!({
                    "stageName": { "type": "string" },
                    "status": { "type": "string", "enum": ["retry", "cancel"] },
                    "forceRetryAllJobs": { "type": "boolean", "default": false }
                })),
            ),
            tool(
                "pipelines_run_pipeline",
                "Queue a run of a pipeline.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "pipelineId": { "type": "integer" },
                        "pipelineVersion": { "type": "integer" },
                        "branch": { "type": "string", "description": "e.g. refs/heads/main" },
                        "previewRun": { "type": "boolean", "description": "Only return the final YAML" },
                        "stagesToSkip": { "type": "array", "items": { "type": "string" } },
                        "templateParameters": { "type": "object", "additionalProperties": { "type": "string" } },
                        "variables": { "type": "object", "additionalProperties": { "type": "string" } },
                        "yamlOverride": { "type": "string" }
                    },
                    "required": ["project", "pipelineId"]
                }),
            ),
            tool(
                "pipelines_get_run",
                "Get a pipeline run.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "pipelineId": { "type": "integer" },
                        "runId": { "type": "integer" }
                    },
                    "required": ["project", "pipelineId", "runId"]
                }),
            ),
            tool(
                "pipelines_list_runs",
                "List the runs of a pipeline.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "pipelineId": { "type": "integer" }
                    },
                    "required": ["project", "pipelineId"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "build_get_definitions" => with_args(name, arguments, |a| self.get_definitions(a)).await,
            "build_get_definition_revisions" => {
                with_args(name, arguments, |a| self.get_revisions(a)).await
            }
            "build_get_builds" => with_args(name, arguments, |a| self.get_builds(a)).await,
            "build_get_log" => with_args(name, arguments, |a| self.get_logs(a)).await,
            "build_get_log_by_id" => with_args(name, arguments, |a| self.get_log_lines(a)).await,
            "build_get_changes" => with_args(name, arguments, |a| self.get_changes(a)).await,
            "build_get_status" => with_args(name, arguments, |a| self.get_status(a)).await,
            "build_update_build_stage" => with_args(name, arguments, |a| self.update_stage(a)).await,
            "pipelines_run_pipeline" => with_args(name, arguments, |a| self.run_pipeline(a)).await,
            "pipelines_get_run" => with_args(name, arguments, |a| self.get_run(a)).await,
            "pipelines_list_runs" => with_args(name, arguments, |a| self.list_runs(a)).await,
            _ => unknown_tool(name),
        }
    }
}
