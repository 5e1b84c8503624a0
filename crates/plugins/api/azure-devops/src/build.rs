//! Build and pipelines services.

use async_trait::async_trait;
use azdo_core::types::{BuildQuery, LineRange, Page, RunPipelineOptions, StageState};
use azdo_core::{BuildApi, Result};
use serde_json::{json, Map, Value};

use crate::client::{join_path, push_opt, AzureDevOpsClient, API_VERSION};

impl AzureDevOpsClient {
    fn build_url(&self, project: &str) -> String {
        format!("{}/_apis/build", self.project_url(project))
    }

    fn pipelines_url(&self, project: &str, pipeline_id: u64) -> String {
        format!("{}/_apis/pipelines/{}", self.project_url(project), pipeline_id)
    }
}

/// Request body of a pipeline run.
fn run_body(options: &RunPipelineOptions) -> Value {
    let mut body = Map::new();
    if let Some(preview) = options.preview_run {
        body.insert("previewRun".into(), json!(preview));
    }
    if let Some(branch) = &options.branch {
        body.insert(
            "resources".into(),
            json!({ "repositories": { "self": { "refName": branch } } }),
        );
    }
    if !options.stages_to_skip.is_empty() {
        body.insert("stagesToSkip".into(), json!(options.stages_to_skip));
    }
    if !options.template_parameters.is_empty() {
        body.insert(
            "templateParameters".into(),
            json!(options.template_parameters),
        );
    }
    if !options.variables.is_empty() {
        let variables: Map<String, Value> = options
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), json!({ "value": value })))
            .collect();
        body.insert("variables".into(), Value::Object(variables));
    }
    if let Some(yaml) = &options.yaml_override {
        body.insert("yamlOverride".into(), json!(yaml));
    }
    Value::Object(body)
}

#[async_trait]
impl BuildApi for AzureDevOpsClient {
    async fn get_definitions(&self, project: &str, name: Option<String>) -> Result<Vec<Value>> {
        let url = format!(
            "{}/definitions?api-version={}",
            self.build_url(project),
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "name", name);
        self.get_list(&url, &params).await
    }

    async fn get_definition_revisions(
        &self,
        project: &str,
        definition_id: u64,
    ) -> Result<Vec<Value>> {
        let url = format!(
            "{}/definitions/{}/revisions?api-version={}",
            self.build_url(project),
            definition_id,
            API_VERSION
        );
        self.get_list(&url, &[]).await
    }

    async fn get_builds(&self, project: &str, query: &BuildQuery) -> Result<Page> {
        let url = format!("{}/builds?api-version={}", self.build_url(project), API_VERSION);
        let mut params = Vec::new();
        if !query.definitions.is_empty() {
            let definitions = query
                .definitions
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("definitions", definitions));
        }
        push_opt(&mut params, "branchName", query.branch_name.as_deref());
        push_opt(&mut params, "statusFilter", query.status_filter.as_deref());
        push_opt(&mut params, "resultFilter", query.result_filter.as_deref());
        push_opt(&mut params, "$top", query.top);
        push_opt(&mut params, "continuationToken", query.continuation_token.as_deref());
        push_opt(&mut params, "queryOrder", query.query_order.as_deref());
        self.get_page(&url, &params).await
    }

    async fn get_build_logs(&self, project: &str, build_id: u64) -> Result<Vec<Value>> {
        let url = format!(
            "{}/builds/{}/logs?api-version={}",
            self.build_url(project),
            build_id,
            API_VERSION
        );
        self.get_list(&url, &[]).await
    }

    async fn get_build_log_lines(
        &self,
        project: &str,
        build_id: u64,
        log_id: u64,
        range: &LineRange,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{}/builds/{}/logs/{}/lines?api-version={}",
            self.build_url(project),
            build_id,
            log_id,
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "startLine", range.start_line);
        push_opt(&mut params, "endLine", range.end_line);
        let lines = self.get_list(&url, &params).await?;
        Ok(lines
            .into_iter()
            .map(|line| match line {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .collect())
    }

    async fn get_build_changes(
        &self,
        project: &str,
        build_id: u64,
        top: u32,
        continuation_token: Option<String>,
    ) -> Result<Page> {
        let url = format!(
            "{}/builds/{}/changes?api-version={}",
            self.build_url(project),
            build_id,
            API_VERSION
        );
        let mut params = vec![("$top", top.to_string())];
        push_opt(&mut params, "continuationToken", continuation_token);
        self.get_page(&url, &params).await
    }

    async fn get_build(&self, project: &str, build_id: u64) -> Result<Value> {
        let url = format!(
            "{}/builds/{}?api-version={}",
            self.build_url(project),
            build_id,
            API_VERSION
        );
        self.get(&url, &[]).await
    }

    async fn update_build_stage(
        &self,
        project: &str,
        build_id: u64,
        stage_name: &str,
        state: StageState,
        force_retry_all_jobs: bool,
    ) -> Result<Value> {
        let url = format!(
            "{}?api-version={}-preview",
            join_path(
                &self.build_url(project),
                &["builds", &build_id.to_string(), "stages", stage_name]
            ),
            API_VERSION
        );
        let body = json!({
            "forceRetryAllJobs": force_retry_all_jobs,
            "state": state,
        });
        self.send_json(reqwest::Method::PATCH, &url, &body).await
    }

    async fn run_pipeline(
        &self,
        project: &str,
        pipeline_id: u64,
        options: &RunPipelineOptions,
    ) -> Result<Value> {
        let url = format!(
            "{}/runs?api-version={}",
            self.pipelines_url(project, pipeline_id),
            API_VERSION
        );
        let url = match options.pipeline_version {
            Some(version) => format!("{}&pipelineVersion={}", url, version),
            None => url,
        };
        self.post(&url, &run_body(options)).await
    }

    async fn get_run(&self, project: &str, pipeline_id: u64, run_id: u64) -> Result<Value> {
        let url = format!(
            "{}/runs/{}?api-version={}",
            self.pipelines_url(project, pipeline_id),
            run_id,
            API_VERSION
        );
        self.get(&url, &[]).await
    }

    async fn list_runs(&self, project: &str, pipeline_id: u64) -> Result<Vec<Value>> {
        let url = format!(
            "{}/runs?api-version={}",
            self.pipelines_url(project, pipeline_id),
            API_VERSION
        );
        self.get_list(&url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;
    use httpmock::prelude::*;
    use std::collections::BTreeMap;

    fn create_client(server: &MockServer) -> AzureDevOpsClient {
        AzureDevOpsClient::with_base_url(server.base_url(), Credential::Pat("pat".into()))
    }

    #[test]
    fn test_run_body() {
        let mut variables = BTreeMap::new();
        variables.insert("env".to_string(), "prod".to_string());
        let body = run_body(&RunPipelineOptions {
            branch: Some("refs/heads/main".into()),
            stages_to_skip: vec!["Deploy".into()],
            variables,
            ..Default::default()
        });

        assert_eq!(
            body,
            json!({
                "resources": {"repositories": {"self": {"refName": "refs/heads/main"}}},
                "stagesToSkip": ["Deploy"],
                "variables": {"env": {"value": "prod"}}
            })
        );
    }

    #[test]
    fn test_run_body_empty() {
        assert_eq!(run_body(&RunPipelineOptions::default()), json!({}));
    }

    #[tokio::test]
    async fn test_get_builds_joins_definitions() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/Contoso/_apis/build/builds")
                .query_param("definitions", "3,4")
                .query_param("$top", "5");
            then.status(200)
                .header("x-ms-continuationtoken", "abc")
                .json_body(json!({"count": 1, "value": [{"id": 77}]}));
        });

        let page = create_client(&server)
            .get_builds(
                "Contoso",
                &BuildQuery {
                    definitions: vec![3, 4],
                    top: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(page.value[0]["id"], 77);
        assert_eq!(page.continuation_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_get_build_log_lines() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/Contoso/_apis/build/builds/9/logs/2/lines")
                .query_param("startLine", "10");
            then.status(200)
                .json_body(json!({"count": 2, "value": ["line one", "line two"]}));
        });

        let lines = create_client(&server)
            .get_build_log_lines(
                "Contoso",
                9,
                2,
                &LineRange {
                    start_line: Some(10),
                    end_line: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(lines, vec!["line one", "line two"]);
    }

    #[tokio::test]
    async fn test_update_build_stage() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/Contoso/_apis/build/builds/9/stages/Build")
                .json_body(json!({"forceRetryAllJobs": true, "state": "retry"}));
            then.status(200).body("");
        });

        let result = create_client(&server)
            .update_build_stage("Contoso", 9, "Build", StageState::Retry, true)
            .await
            .unwrap();
        mock.assert();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn test_run_pipeline_version_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/Contoso/_apis/pipelines/12/runs")
                .query_param("pipelineVersion", "3")
                .json_body(json!({"previewRun": true}));
            then.status(200).json_body(json!({"id": 501, "state": "inProgress"}));
        });

        let run = create_client(&server)
            .run_pipeline(
                "Contoso",
                12,
                &RunPipelineOptions {
                    pipeline_version: Some(3),
                    preview_run: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        mock.assert();
        assert_eq!(run["id"], 501);
    }
}
