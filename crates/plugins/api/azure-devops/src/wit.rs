//! Work item tracking service.

use async_trait::async_trait;
use azdo_core::batch::{BatchRequestItem, BATCH_API_VERSION};
use azdo_core::types::{CommentFormat, QueryOptions, WorkItemExpand};
use azdo_core::{PatchOperation, Result, WorkItemTrackingApi};
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{join_path, push_opt, read_json, AzureDevOpsClient, API_VERSION};
use crate::types::{ListResponse, WiqlResult};

/// api-version of the comments endpoints.
const COMMENTS_API_VERSION: &str = "7.1-preview.4";

impl AzureDevOpsClient {
    fn wit_url(&self, project: Option<&str>) -> String {
        format!("{}/_apis/wit", self.scope_url(project))
    }

    /// `{org_url}/{project}/_apis/wit/$batch?api-version=5.0`.
    pub(crate) fn batch_url(&self, project: &str) -> String {
        format!(
            "{}/$batch?api-version={}",
            self.wit_url(Some(project)),
            BATCH_API_VERSION
        )
    }
}

fn wiql_ids(result: WiqlResult) -> Vec<u64> {
    result.work_items.into_iter().map(|item| item.id).collect()
}

#[async_trait]
impl WorkItemTrackingApi for AzureDevOpsClient {
    fn server_url(&self) -> String {
        self.endpoints.org_url.clone()
    }

    async fn get_work_item(
        &self,
        id: u64,
        project: Option<String>,
        expand: WorkItemExpand,
    ) -> Result<Value> {
        let url = format!(
            "{}/workitems/{}?api-version={}",
            self.wit_url(project.as_deref()),
            id,
            API_VERSION
        );
        self.get(&url, &[("$expand", expand.as_query().to_string())])
            .await
    }

    async fn get_work_items_batch(
        &self,
        ids: &[u64],
        project: Option<String>,
        expand: WorkItemExpand,
    ) -> Result<Vec<Value>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/workitemsbatch?api-version={}",
            self.wit_url(project.as_deref()),
            API_VERSION
        );
        let body = json!({
            "ids": ids,
            "$expand": expand.as_query(),
        });
        let list: ListResponse = self.post(&url, &body).await?;
        Ok(list.value)
    }

    async fn create_work_item(
        &self,
        project: &str,
        work_item_type: &str,
        document: &[PatchOperation],
    ) -> Result<Value> {
        let url = format!(
            "{}?api-version={}",
            join_path(
                &self.wit_url(Some(project)),
                &["workitems", &format!("${}", work_item_type)]
            ),
            API_VERSION
        );
        self.send_patch_document(reqwest::Method::POST, &url, document)
            .await
    }

    async fn update_work_item(
        &self,
        id: u64,
        project: Option<String>,
        document: &[PatchOperation],
    ) -> Result<Value> {
        let url = format!(
            "{}/workitems/{}?api-version={}",
            self.wit_url(project.as_deref()),
            id,
            API_VERSION
        );
        self.send_patch_document(reqwest::Method::PATCH, &url, document)
            .await
    }

    async fn send_batch(&self, project: &str, requests: &[BatchRequestItem]) -> Result<Value> {
        let url = self.batch_url(project);
        debug!(url = %url, items = requests.len(), "Azure DevOps batch request");
        let response = self
            .send(
                self.request(reqwest::Method::PATCH, &url)
                    .header("Content-Type", "application/json")
                    .json(requests),
            )
            .await?;
        read_json(response).await
    }

    async fn query_by_wiql(&self, project: &str, wiql: &str) -> Result<Vec<u64>> {
        let url = format!(
            "{}/wiql?api-version={}",
            self.wit_url(Some(project)),
            API_VERSION
        );
        let result: WiqlResult = self.post(&url, &json!({ "query": wiql })).await?;
        Ok(wiql_ids(result))
    }

    async fn query_by_id(&self, project: &str, query_id: &str) -> Result<Vec<u64>> {
        let url = format!(
            "{}?api-version={}",
            join_path(&self.wit_url(Some(project)), &["wiql", query_id]),
            API_VERSION
        );
        let result: WiqlResult = self.get(&url, &[]).await?;
        Ok(wiql_ids(result))
    }

    async fn get_query(&self, project: &str, query: &str, options: &QueryOptions) -> Result<Value> {
        // Query paths keep their folder separators
        let mut segments = vec!["queries"];
        segments.extend(query.split('/'));
        let url = format!(
            "{}?api-version={}",
            join_path(&self.wit_url(Some(project)), &segments),
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "$expand", options.expand.as_deref());
        push_opt(&mut params, "$depth", options.depth);
        if options.include_deleted {
            params.push(("$includeDeleted", "true".to_string()));
        }
        self.get(&url, &params).await
    }

    async fn get_work_item_type(&self, project: &str, work_item_type: &str) -> Result<Value> {
        let url = format!(
            "{}?api-version={}",
            join_path(&self.wit_url(Some(project)), &["workitemtypes", work_item_type]),
            API_VERSION
        );
        self.get(&url, &[]).await
    }

    async fn get_comments(&self, project: &str, work_item_id: u64) -> Result<Value> {
        let url = format!(
            "{}/workItems/{}/comments?api-version={}",
            self.wit_url(Some(project)),
            work_item_id,
            COMMENTS_API_VERSION
        );
        self.get(&url, &[]).await
    }

    async fn add_comment(
        &self,
        project: &str,
        work_item_id: u64,
        text: &str,
        format: CommentFormat,
    ) -> Result<Value> {
        let url = format!(
            "{}/workItems/{}/comments?format={}&api-version={}",
            self.wit_url(Some(project)),
            work_item_id,
            format.as_query(),
            COMMENTS_API_VERSION
        );
        self.post(&url, &json!({ "text": text })).await
    }
}
