//! Wiki service.

use async_trait::async_trait;
use azdo_core::types::WikiPagesQuery;
use azdo_core::{Result, WikiApi};
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{join_path, push_opt, read_json, AzureDevOpsClient, API_VERSION};
use crate::types::WikiPage;

impl AzureDevOpsClient {
    fn wikis_url(&self, project: Option<&str>) -> String {
        format!("{}/_apis/wiki/wikis", self.scope_url(project))
    }

    fn pages_url(&self, project: &str, wiki: &str) -> String {
        format!(
            "{}?api-version={}",
            join_path(&self.wikis_url(Some(project)), &[wiki, "pages"]),
            API_VERSION
        )
    }
}

#[async_trait]
impl WikiApi for AzureDevOpsClient {
    async fn list_wikis(&self, project: Option<String>) -> Result<Vec<Value>> {
        let url = format!(
            "{}?api-version={}",
            self.wikis_url(project.as_deref()),
            API_VERSION
        );
        self.get_list(&url, &[]).await
    }

    async fn get_wiki(&self, project: Option<String>, wiki: &str) -> Result<Value> {
        let url = format!(
            "{}?api-version={}",
            join_path(&self.wikis_url(project.as_deref()), &[wiki]),
            API_VERSION
        );
        self.get(&url, &[]).await
    }

    async fn list_pages(&self, project: &str, wiki: &str, query: &WikiPagesQuery) -> Result<Value> {
        let mut params = Vec::new();
        push_opt(&mut params, "path", query.path.as_deref());
        push_opt(&mut params, "recursionLevel", query.recursion_level.as_deref());
        if query.include_content {
            params.push(("includeContent", "true".to_string()));
        }
        self.get(&self.pages_url(project, wiki), &params).await
    }

    async fn get_page_content(&self, project: &str, wiki: &str, path: &str) -> Result<String> {
        let params = [
            ("path", path.to_string()),
            ("includeContent", "true".to_string()),
        ];
        let page: WikiPage = self.get(&self.pages_url(project, wiki), &params).await?;
        Ok(page.content.unwrap_or_default())
    }

    async fn create_or_update_page(
        &self,
        project: &str,
        wiki: &str,
        path: &str,
        content: &str,
        version: Option<String>,
    ) -> Result<Value> {
        let url = self.pages_url(project, wiki);
        debug!(url = %url, path = path, "Azure DevOps wiki page upsert");

        let mut builder = self
            .request(reqwest::Method::PUT, &url)
            .query(&[("path", path)])
            .json(&json!({ "content": content }));
        if let Some(version) = version {
            builder = builder.header("If-Match", version);
        }

        let response = self.send(builder).await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;
    use httpmock::prelude::*;

    fn create_client(server: &MockServer) -> AzureDevOpsClient {
        AzureDevOpsClient::with_base_url(server.base_url(), Credential::Pat("pat".into()))
    }

    #[tokio::test]
    async fn test_get_page_content() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/Contoso/_apis/wiki/wikis/Contoso.wiki/pages")
                .query_param("path", "/Home")
                .query_param("includeContent", "true");
            then.status(200)
                .json_body(json!({"id": 1, "path": "/Home", "content": "# Welcome"}));
        });

        let content = create_client(&server)
            .get_page_content("Contoso", "Contoso.wiki", "/Home")
            .await
            .unwrap();
        assert_eq!(content, "# Welcome");
    }

    #[tokio::test]
    async fn test_update_page_sends_if_match() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/Contoso/_apis/wiki/wikis/Contoso.wiki/pages")
                .query_param("path", "/Home")
                .header("If-Match", "etag-1")
                .json_body(json!({"content": "updated"}));
            then.status(200).json_body(json!({"id": 1, "path": "/Home"}));
        });

        create_client(&server)
            .create_or_update_page("Contoso", "Contoso.wiki", "/Home", "updated", Some("etag-1".into()))
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_list_wikis_organization_scope() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/_apis/wiki/wikis");
            then.status(200)
                .json_body(json!({"count": 1, "value": [{"name": "Contoso.wiki"}]}));
        });

        let wikis = create_client(&server).list_wikis(None).await.unwrap();
        assert_eq!(wikis[0]["name"], "Contoso.wiki");
    }
}
