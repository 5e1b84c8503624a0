//! Azure DevOps service APIs consumed by the tool handlers.
//!
//! Each trait covers one service area. Entities are returned as raw JSON
//! so tool results carry exactly what the service sent; a `null` value
//! from a create/update call means the service produced nothing.

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::BatchRequestItem;
use crate::error::Result;
use crate::patch::PatchOperation;
use crate::types::{
    BuildQuery, CommentFormat, LineRange, NewIteration, NewTestPlan, Page, ProjectQuery,
    QueryOptions, RunPipelineOptions, StageState, TeamQuery, TestPlanQuery, WikiPagesQuery,
    WorkItemExpand,
};

/// Projects, teams and identities.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CoreApi: Send + Sync {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Page>;

    async fn list_teams(&self, project: &str, query: &TeamQuery) -> Result<Vec<Value>>;

    /// Identities matching a display name, unique name or email.
    async fn search_identities(&self, filter: &str) -> Result<Vec<Value>>;

    /// Connection data of the authenticated user.
    async fn connection_data(&self) -> Result<Value>;
}

/// Team iterations and backlogs.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait WorkApi: Send + Sync {
    async fn get_team_iterations(
        &self,
        project: &str,
        team: &str,
        timeframe: Option<String>,
    ) -> Result<Vec<Value>>;

    async fn create_iteration(&self, project: &str, iteration: &NewIteration) -> Result<Value>;

    async fn assign_iteration(
        &self,
        project: &str,
        team: &str,
        iteration_id: &str,
        path: Option<String>,
    ) -> Result<Value>;

    async fn get_backlogs(&self, project: &str, team: &str) -> Result<Vec<Value>>;

    async fn get_backlog_work_items(&self, project: &str, team: &str, backlog_id: &str)
        -> Result<Value>;

    /// Ids of the work items planned in an iteration.
    async fn get_iteration_work_item_ids(
        &self,
        project: &str,
        team: &str,
        iteration_id: &str,
    ) -> Result<Vec<u64>>;
}

/// Work items, queries and comments.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait WorkItemTrackingApi: Send + Sync {
    /// Base URL work item links are built from.
    fn server_url(&self) -> String;

    async fn get_work_item(
        &self,
        id: u64,
        project: Option<String>,
        expand: WorkItemExpand,
    ) -> Result<Value>;

    async fn get_work_items_batch(
        &self,
        ids: &[u64],
        project: Option<String>,
        expand: WorkItemExpand,
    ) -> Result<Vec<Value>>;

    async fn create_work_item(
        &self,
        project: &str,
        work_item_type: &str,
        document: &[PatchOperation],
    ) -> Result<Value>;

    async fn update_work_item(
        &self,
        id: u64,
        project: Option<String>,
        document: &[PatchOperation],
    ) -> Result<Value>;

    /// Send framed sub-requests to the project's `$batch` endpoint.
    async fn send_batch(&self, project: &str, requests: &[BatchRequestItem]) -> Result<Value>;

    /// Ids of the work items matched by a WIQL query.
    async fn query_by_wiql(&self, project: &str, wiql: &str) -> Result<Vec<u64>>;

    /// Ids of the work items matched by a saved query.
    async fn query_by_id(&self, project: &str, query_id: &str) -> Result<Vec<u64>>;

    async fn get_query(&self, project: &str, query: &str, options: &QueryOptions) -> Result<Value>;

    async fn get_work_item_type(&self, project: &str, work_item_type: &str) -> Result<Value>;

    async fn get_comments(&self, project: &str, work_item_id: u64) -> Result<Value>;

    async fn add_comment(
        &self,
        project: &str,
        work_item_id: u64,
        text: &str,
        format: CommentFormat,
    ) -> Result<Value>;
}

/// Builds, build logs and pipeline runs.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait BuildApi: Send + Sync {
    async fn get_definitions(&self, project: &str, name: Option<String>) -> Result<Vec<Value>>;

    async fn get_definition_revisions(&self, project: &str, definition_id: u64)
        -> Result<Vec<Value>>;

    async fn get_builds(&self, project: &str, query: &BuildQuery) -> Result<Page>;

    async fn get_build_logs(&self, project: &str, build_id: u64) -> Result<Vec<Value>>;

    async fn get_build_log_lines(
        &self,
        project: &str,
        build_id: u64,
        log_id: u64,
        range: &LineRange,
    ) -> Result<Vec<String>>;

    async fn get_build_changes(
        &self,
        project: &str,
        build_id: u64,
        top: u32,
        continuation_token: Option<String>,
    ) -> Result<Page>;

    async fn get_build(&self, project: &str, build_id: u64) -> Result<Value>;

    async fn update_build_stage(
        &self,
        project: &str,
        build_id: u64,
        stage_name: &str,
        state: StageState,
        force_retry_all_jobs: bool,
    ) -> Result<Value>;

    async fn run_pipeline(
        &self,
        project: &str,
        pipeline_id: u64,
        options: &RunPipelineOptions,
    ) -> Result<Value>;

    async fn get_run(&self, project: &str, pipeline_id: u64, run_id: u64) -> Result<Value>;

    async fn list_runs(&self, project: &str, pipeline_id: u64) -> Result<Vec<Value>>;
}

/// Classic release management.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    async fn get_release_definitions(
        &self,
        project: &str,
        search_text: Option<String>,
    ) -> Result<Vec<Value>>;

    async fn get_releases(&self, project: &str, definition_id: Option<u64>) -> Result<Vec<Value>>;
}

/// Project and code wikis.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait WikiApi: Send + Sync {
    async fn list_wikis(&self, project: Option<String>) -> Result<Vec<Value>>;

    async fn get_wiki(&self, project: Option<String>, wiki: &str) -> Result<Value>;

    /// Page tree below `query.path` (the root when unset).
    async fn list_pages(&self, project: &str, wiki: &str, query: &WikiPagesQuery)
        -> Result<Value>;

    async fn get_page_content(&self, project: &str, wiki: &str, path: &str) -> Result<String>;

    /// Create the page, or update it when `version` (its ETag) is given.
    async fn create_or_update_page(
        &self,
        project: &str,
        wiki: &str,
        path: &str,
        content: &str,
        version: Option<String>,
    ) -> Result<Value>;
}

/// Test plans, suites, cases and results.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TestPlanApi: Send + Sync {
    async fn list_test_plans(&self, project: &str, query: &TestPlanQuery) -> Result<Page>;

    async fn create_test_plan(&self, project: &str, plan: &NewTestPlan) -> Result<Value>;

    /// `test_case_ids` is a comma-separated id list.
    async fn add_test_cases_to_suite(
        &self,
        project: &str,
        plan_id: u64,
        suite_id: u64,
        test_case_ids: &str,
    ) -> Result<Vec<Value>>;

    async fn list_test_cases(&self, project: &str, plan_id: u64, suite_id: u64)
        -> Result<Vec<Value>>;

    async fn get_test_results_for_build(&self, project: &str, build_id: u64) -> Result<Value>;
}
