//! Core service: projects, teams and identities.

use async_trait::async_trait;
use azdo_core::types::{Page, ProjectQuery, TeamQuery};
use azdo_core::{CoreApi, Result};
use serde_json::Value;

use crate::client::{join_path, push_opt, AzureDevOpsClient, API_VERSION};

#[async_trait]
impl CoreApi for AzureDevOpsClient {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Page> {
        let url = format!(
            "{}/_apis/projects?api-version={}",
            self.endpoints.org_url, API_VERSION
        );
        let mut params = vec![("stateFilter", query.state_filter.clone())];
        push_opt(&mut params, "$top", query.top);
        push_opt(&mut params, "$skip", query.skip);
        push_opt(&mut params, "continuationToken", query.continuation_token.as_deref());
        self.get_page(&url, &params).await
    }

    async fn list_teams(&self, project: &str, query: &TeamQuery) -> Result<Vec<Value>> {
        let url = format!(
            "{}?api-version={}",
            join_path(&self.endpoints.org_url, &["_apis", "projects", project, "teams"]),
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "$mine", query.mine);
        push_opt(&mut params, "$top", query.top);
        push_opt(&mut params, "$skip", query.skip);
        self.get_list(&url, &params).await
    }

    async fn search_identities(&self, filter: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/_apis/identities?api-version={}",
            self.endpoints.identity_url, API_VERSION
        );
        let params = [
            ("searchFilter", "General".to_string()),
            ("filterValue", filter.to_string()),
        ];
        self.get_list(&url, &params).await
    }

    async fn connection_data(&self) -> Result<Value> {
        let url = format!(
            "{}/_apis/connectionData?api-version={}-preview",
            self.endpoints.org_url, API_VERSION
        );
        self.get(&url, &[]).await
    }
}
