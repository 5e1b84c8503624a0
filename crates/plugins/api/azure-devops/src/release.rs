//! Classic release management service (`vsrm` host).

use async_trait::async_trait;
use azdo_core::{ReleaseApi, Result};
use serde_json::Value;

use crate::client::{join_path, push_opt, AzureDevOpsClient, API_VERSION};

impl AzureDevOpsClient {
    fn release_url(&self, project: &str) -> String {
        join_path(&self.endpoints.release_url, &[project, "_apis", "release"])
    }
}

#[async_trait]
impl ReleaseApi for AzureDevOpsClient {
    async fn get_release_definitions(
        &self,
        project: &str,
        search_text: Option<String>,
    ) -> Result<Vec<Value>> {
        let url = format!(
            "{}/definitions?api-version={}",
            self.release_url(project),
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "searchText", search_text);
        self.get_list(&url, &params).await
    }

    async fn get_releases(&self, project: &str, definition_id: Option<u64>) -> Result<Vec<Value>> {
        let url = format!(
            "{}/releases?api-version={}",
            self.release_url(project),
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "definitionId", definition_id);
        self.get_list(&url, &params).await
    }
}
