//! Work service: team iterations and backlogs.

use async_trait::async_trait;
use azdo_core::types::NewIteration;
use azdo_core::{Result, WorkApi};
use serde_json::{json, Value};

use crate::client::{join_path, push_opt, AzureDevOpsClient, API_VERSION};
use crate::types::IterationWorkItems;

impl AzureDevOpsClient {
    /// `{org_url}/{project}/{team}/_apis/work`.
    fn team_work_url(&self, project: &str, team: &str) -> String {
        join_path(&self.project_url(project), &[team, "_apis", "work"])
    }
}

#[async_trait]
impl WorkApi for AzureDevOpsClient {
    async fn get_team_iterations(
        &self,
        project: &str,
        team: &str,
        timeframe: Option<String>,
    ) -> Result<Vec<Value>> {
        let url = format!(
            "{}/teamsettings/iterations?api-version={}",
            self.team_work_url(project, team),
            API_VERSION
        );
        let mut params = Vec::new();
        push_opt(&mut params, "$timeframe", timeframe);
        self.get_list(&url, &params).await
    }

    async fn create_iteration(&self, project: &str, iteration: &NewIteration) -> Result<Value> {
        let url = format!(
            "{}/_apis/wit/classificationnodes/Iterations?api-version={}",
            self.project_url(project),
            API_VERSION
        );
        let mut attributes = serde_json::Map::new();
        if let Some(start) = &iteration.start_date {
            attributes.insert("startDate".into(), json!(start));
        }
        if let Some(finish) = &iteration.finish_date {
            attributes.insert("finishDate".into(), json!(finish));
        }
        let body = json!({
            "name": iteration.name,
            "attributes": attributes,
        });
        self.post(&url, &body).await
    }

    async fn assign_iteration(
        &self,
        project: &str,
        team: &str,
        iteration_id: &str,
        path: Option<String>,
    ) -> Result<Value> {
        let url = format!(
            "{}/teamsettings/iterations?api-version={}",
            self.team_work_url(project, team),
            API_VERSION
        );
        let body = json!({
            "id": iteration_id,
            "path": path.unwrap_or_default(),
        });
        self.post(&url, &body).await
    }

    async fn get_backlogs(&self, project: &str, team: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/backlogs?api-version={}",
            self.team_work_url(project, team),
            API_VERSION
        );
        self.get_list(&url, &[]).await
    }

    async fn get_backlog_work_items(
        &self,
        project: &str,
        team: &str,
        backlog_id: &str,
    ) -> Result<Value> {
        let url = format!(
            "{}?api-version={}",
            join_path(
                &self.team_work_url(project, team),
                &["backlogs", backlog_id, "workItems"]
            ),
            API_VERSION
        );
        self.get(&url, &[]).await
    }

    async fn get_iteration_work_item_ids(
        &self,
        project: &str,
        team: &str,
        iteration_id: &str,
    ) -> Result<Vec<u64>> {
        let url = format!(
            "{}?api-version={}",
            join_path(
                &self.team_work_url(project, team),
                &["teamsettings", "iterations", iteration_id, "workitems"]
            ),
            API_VERSION
        );
        let items: IterationWorkItems = self.get(&url, &[]).await?;

        let mut ids = Vec::new();
        for id in items
            .work_item_relations
            .into_iter()
            .filter_map(|link| link.target.map(|t| t.id))
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
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
    async fn test_get_team_iterations() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/Contoso/Team/_apis/work/teamsettings/iterations")
                .query_param("$timeframe", "current");
            then.status(200)
                .json_body(json!({"count": 1, "value": [{"id": "it-1", "name": "Sprint 1"}]}));
        });

        let iterations = create_client(&server)
            .get_team_iterations("Contoso", "Team", Some("current".into()))
            .await
            .unwrap();
        assert_eq!(iterations[0]["name"], "Sprint 1");
    }

    #[tokio::test]
    async fn test_create_iteration() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/Contoso/_apis/wit/classificationnodes/Iterations")
                .json_body(json!({
                    "name": "Sprint 2",
                    "attributes": {"startDate": "2025-01-01"}
                }));
            then.status(201).json_body(json!({"id": 7, "name": "Sprint 2"}));
        });

        let node = create_client(&server)
            .create_iteration(
                "Contoso",
                &NewIteration {
                    name: "Sprint 2".into(),
                    start_date: Some("2025-01-01".into()),
                    finish_date: None,
                },
            )
            .await
            .unwrap();
        mock.assert();
        assert_eq!(node["id"], 7);
    }

    #[tokio::test]
    async fn test_iteration_work_item_ids_deduplicated() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/Contoso/Team/_apis/work/teamsettings/iterations/it-1/workitems");
            then.status(200).json_body(json!({
                "workItemRelations": [
                    {"rel": null, "source": null, "target": {"id": 1}},
                    {"rel": "System.LinkTypes.Hierarchy-Forward", "source": {"id": 1}, "target": {"id": 2}},
                    {"rel": null, "source": null, "target": {"id": 1}}
                ]
            }));
        });

        let ids = create_client(&server)
            .get_iteration_work_item_ids("Contoso", "Team", "it-1")
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }
}
