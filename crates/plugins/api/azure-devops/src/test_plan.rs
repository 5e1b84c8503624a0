//! Test plan and test results services.

use async_trait::async_trait;
use azdo_core::types::{NewTestPlan, Page, TestPlanQuery};
use azdo_core::{Result, TestPlanApi};
use serde_json::Value;
use tracing::debug;

use crate::client::{join_path, push_opt, read_json, AzureDevOpsClient, API_VERSION};
use crate::types::ListResponse;

impl AzureDevOpsClient {
    fn plans_url(&self, project: &str) -> String {
        format!("{}/_apis/testplan/plans", self.project_url(project))
    }
}

#[async_trait]
impl TestPlanApi for AzureDevOpsClient {
    async fn list_test_plans(&self, project: &str, query: &TestPlanQuery) -> Result<Page> {
        let url = format!("{}?api-version={}", self.plans_url(project), API_VERSION);
        let mut params = vec![
            ("filterActivePlans", query.filter_active_plans.to_string()),
            ("includePlanDetails", query.include_plan_details.to_string()),
        ];
        push_opt(&mut params, "continuationToken", query.continuation_token.as_deref());
        self.get_page(&url, &params).await
    }

    async fn create_test_plan(&self, project: &str, plan: &NewTestPlan) -> Result<Value> {
        let url = format!("{}?api-version={}", self.plans_url(project), API_VERSION);
        self.post(&url, plan).await
    }

    async fn add_test_cases_to_suite(
        &self,
        project: &str,
        plan_id: u64,
        suite_id: u64,
        test_case_ids: &str,
    ) -> Result<Vec<Value>> {
        let ids = test_case_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}?api-version={}",
            join_path(
                &self.project_url(project),
                &[
                    "_apis",
                    "test",
                    "Plans",
                    &plan_id.to_string(),
                    "suites",
                    &suite_id.to_string(),
                    "testcases",
                    &ids,
                ]
            ),
            API_VERSION
        );
        debug!(url = %url, "Azure DevOps POST request");
        let response = self.send(self.request(reqwest::Method::POST, &url)).await?;
        let list: ListResponse = read_json(response).await?;
        Ok(list.value)
    }

    async fn list_test_cases(
        &self,
        project: &str,
        plan_id: u64,
        suite_id: u64,
    ) -> Result<Vec<Value>> {
        let url = format!(
            "{}/{}/Suites/{}/TestCase?api-version={}",
            self.plans_url(project),
            plan_id,
            suite_id,
            API_VERSION
        );
        self.get_list(&url, &[]).await
    }

    async fn get_test_results_for_build(&self, project: &str, build_id: u64) -> Result<Value> {
        let url = format!(
            "{}/_apis/test/ResultDetailsByBuild?api-version={}-preview",
            self.project_url(project),
            API_VERSION
        );
        self.get(&url, &[("buildId", build_id.to_string())]).await
    }
}
