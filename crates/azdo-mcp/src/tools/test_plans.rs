//! Test plan, test case and test result tools.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::test_case::{NewTestCase, TEST_CASE_TYPE};
use azdo_core::types::{NewTestPlan, TestPlanQuery};
use azdo_core::{Domain, TestPlanApi, WorkItemTrackingApi};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    execute_single, failure, respond, tool, unknown_tool, with_args, StringOrNumber, ToolSet,
};
use crate::protocol::{ToolCallResult, ToolDefinition};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPlansArgs {
    project: String,
    #[serde(default = "default_true")]
    filter_active_plans: bool,
    #[serde(default)]
    include_plan_details: bool,
    #[serde(default)]
    continuation_token: Option<StringOrNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlanArgs {
    project: String,
    name: String,
    iteration: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    area_path: Option<String>,
}

/// Test case ids as `"1,2"` or `[1, 2]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TestCaseIds {
    List(Vec<StringOrNumber>),
    Joined(StringOrNumber),
}

impl TestCaseIds {
    fn joined(&self) -> String {
        match self {
            TestCaseIds::List(ids) => ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            TestCaseIds::Joined(ids) => ids.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTestCasesArgs {
    project: String,
    #[serde(alias = "planid")]
    plan_id: u64,
    #[serde(alias = "suiteid")]
    suite_id: u64,
    test_case_ids: TestCaseIds,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTestCaseArgs {
    project: String,
    title: String,
    #[serde(default)]
    steps: Option<String>,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    area_path: Option<String>,
    #[serde(default)]
    iteration_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuiteArgs {
    project: String,
    #[serde(alias = "planid")]
    plan_id: u64,
    #[serde(alias = "suiteid")]
    suite_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildResultsArgs {
    project: String,
    #[serde(alias = "buildid")]
    build_id: u64,
}

fn has_results(details: &Value) -> bool {
    details["resultsForGroup"]
        .as_array()
        .is_some_and(|groups| !groups.is_empty())
}

pub struct TestPlanTools {
    api: Arc<dyn TestPlanApi>,
    wit: Arc<dyn WorkItemTrackingApi>,
}

impl TestPlanTools {
    pub fn new(api: Arc<dyn TestPlanApi>, wit: Arc<dyn WorkItemTrackingApi>) -> Self {
        Self { api, wit }
    }

    async fn list_plans(&self, args: ListPlansArgs) -> ToolCallResult {
        let query = TestPlanQuery {
            filter_active_plans: args.filter_active_plans,
            include_plan_details: args.include_plan_details,
            continuation_token: args.continuation_token.map(|t| t.to_string()),
        };
        match self.api.list_test_plans(&args.project, &query).await {
            Ok(page) if page.is_empty() => {
                ToolCallResult::text("No test plans found for the specified criteria.")
            }
            Ok(page) => ToolCallResult::json(&page),
            Err(e) => failure(
                &format!("Error fetching test plans for project '{}'", args.project),
                &e,
            ),
        }
    }

    async fn create_plan(&self, args: CreatePlanArgs) -> ToolCallResult {
        let plan = NewTestPlan {
            name: args.name,
            iteration: args.iteration,
            description: args.description,
            start_date: args.start_date,
            end_date: args.end_date,
            area_path: args.area_path,
        };
        execute_single(
            &format!("Error creating test plan '{}'", plan.name),
            "Test plan was not created",
            self.api.create_test_plan(&args.project, &plan),
        )
        .await
    }

    async fn add_test_cases(&self, args: AddTestCasesArgs) -> ToolCallResult {
        respond(
            &format!(
                "Error adding test cases to suite {} in plan {}",
                args.suite_id, args.plan_id
            ),
            self.api
                .add_test_cases_to_suite(
                    &args.project,
                    args.plan_id,
                    args.suite_id,
                    &args.test_case_ids.joined(),
                )
                .await,
        )
    }

    async fn create_test_case(&self, args: CreateTestCaseArgs) -> ToolCallResult {
        let context = format!(
            "Error creating test case '{}' in project '{}'",
            args.title, args.project
        );
        let test_case = NewTestCase {
            title: args.title,
            steps: args.steps,
            priority: args.priority,
            area_path: args.area_path,
            iteration_path: args.iteration_path,
        };
        let document = test_case.to_patch();
        execute_single(
            &context,
            "Test case was not created",
            self.wit
                .create_work_item(&args.project, TEST_CASE_TYPE, &document),
        )
        .await
    }

    async fn list_test_cases(&self, args: SuiteArgs) -> ToolCallResult {
        match self
            .api
            .list_test_cases(&args.project, args.plan_id, args.suite_id)
            .await
        {
            Ok(cases) if cases.is_empty() => ToolCallResult::text(format!(
                "No test cases found for suite {} in plan {}.",
                args.suite_id, args.plan_id
            )),
            Ok(cases) => ToolCallResult::json(&cases),
            Err(e) => failure(
                &format!(
                    "Error fetching test cases for suite {} in plan {}",
                    args.suite_id, args.plan_id
                ),
                &e,
            ),
        }
    }

    async fn results_for_build(&self, args: BuildResultsArgs) -> ToolCallResult {
        match self
            .api
            .get_test_results_for_build(&args.project, args.build_id)
            .await
        {
            Ok(details) if !has_results(&details) => ToolCallResult::text(format!(
                "No test results found for build ID {}.",
                args.build_id
            )),
            Ok(details) => ToolCallResult::json(&details),
            Err(e) => failure(
                &format!("Error fetching test results for build ID {}", args.build_id),
                &e,
            ),
        }
    }
}

#[async_trait]
impl ToolSet for TestPlanTools {
    fn domain(&self) -> Domain {
        Domain::TestPlans
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                "testplan_list_test_plans",
                "List the test plans of a project.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "filterActivePlans": { "type": "boolean", "default": true },
                        "includePlanDetails": { "type": "boolean", "default": false },
                        "continuationToken": { "type": ["string", "integer"] }
                    },
                    "required": ["project"]
                }),
            ),
            tool(
                "testplan_create_test_plan",
                "Create a test plan.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "name": { "type": "string" },
                        "iteration": { "type": "string", "description": "Iteration path of the plan" },
                        "description": { "type": "string" },
                        "startDate": { "type": "string" },
                        "endDate": { "type": "string" },
                        "areaPath": { "type": "string" }
                    },
                    "required": ["project", "name", "iteration"]
                }),
            ),
            tool(
                "testplan_add_test_cases_to_suite",
                "Add existing test cases to a test suite.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "planId": { "type": "integer" },
                        "suiteId": { "type": "integer" },
                        "testCaseIds": {
                            "oneOf": [
                                { "type": "string", "description": "Comma-separated ids" },
                                { "type": "array", "items": { "type": ["string", "integer"] } }
                            ]
                        }
                    },
                    "required": ["project", "planId", "suiteId", "testCaseIds"]
                }),
            ),
            tool(
                "testplan_create_test_case",
                "Create a test case work item. Steps are one per line, as 'action|expected result'.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "title": { "type": "string" },
                        "steps": { "type": "string" },
                        "priority": { "type": "integer", "minimum": 1, "maximum": 4 },
                        "areaPath": { "type": "string" },
                        "iterationPath": { "type": "string" }
                    },
                    "required": ["project", "title"]
                }),
            ),
            tool(
                "testplan_list_test_cases",
                "List the test cases of a test suite.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "planId": { "type": "integer" },
                        "suiteId": { "type": "integer" }
                    },
                    "required": ["project", "planId", "suiteId"]
                }),
            ),
            tool(
                "testplan_show_test_results_from_build_id",
                "Show the test results of a build.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "buildId": { "type": "integer" }
                    },
                    "required": ["project", "buildId"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "testplan_list_test_plans" => with_args(name, arguments, |a| self.list_plans(a)).await,
            "testplan_create_test_plan" => {
                with_args(name, arguments, |a| self.create_plan(a)).await
            }
            "testplan_add_test_cases_to_suite" => {
                with_args(name, arguments, |a| self.add_test_cases(a)).await
            }
            "testplan_create_test_case" => {
                with_args(name, arguments, |a| self.create_test_case(a)).await
            }
            "testplan_list_test_cases" => {
                with_args(name, arguments, |a| self.list_test_cases(a)).await
            }
            "testplan_show_test_results_from_build_id" => {
                with_args(name, arguments, |a| self.results_for_build(a)).await
            }
            _ => unknown_tool(name),
        }
    }
}
