//! Tool dispatch across the enabled domains.

use std::collections::BTreeSet;
use std::sync::Arc;

use azdo_core::{
    BuildApi, CoreApi, Domain, ReleaseApi, TestPlanApi, WikiApi, WorkApi, WorkItemTrackingApi,
};
use serde_json::Value;

use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools::{
    unknown_tool, BuildTools, CoreTools, ReleaseTools, TestPlanTools, ToolSet, WikiTools,
    WorkItemTools, WorkTools,
};

/// The Azure DevOps API surfaces the tools call into.
#[derive(Clone)]
pub struct Services {
    pub core: Arc<dyn CoreApi>,
    pub work: Arc<dyn WorkApi>,
    pub wit: Arc<dyn WorkItemTrackingApi>,
    pub build: Arc<dyn BuildApi>,
    pub release: Arc<dyn ReleaseApi>,
    pub wiki: Arc<dyn WikiApi>,
    pub test_plan: Arc<dyn TestPlanApi>,
}

impl Services {
    /// Serve every API from one client.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: CoreApi
            + WorkApi
            + WorkItemTrackingApi
            + BuildApi
            + ReleaseApi
            + WikiApi
            + TestPlanApi
            + 'static,
    {
        Self {
            core: client.clone(),
            work: client.clone(),
            wit: client.clone(),
            build: client.clone(),
            release: client.clone(),
            wiki: client.clone(),
            test_plan: client,
        }
    }
}

/// Routes tool calls to the toolset that owns them.
pub struct ToolHandler {
    toolsets: Vec<Box<dyn ToolSet>>,
}

impl ToolHandler {
    /// Build the toolsets of the enabled domains.
    pub fn new(services: Services, domains: &BTreeSet<Domain>) -> Self {
        let all: Vec<Box<dyn ToolSet>> = vec![
            Box::new(CoreTools::new(services.core)),
            Box::new(WorkTools::new(services.work.clone())),
            Box::new(WorkItemTools::new(services.wit.clone(), services.work)),
            Box::new(BuildTools::new(services.build)),
            Box::new(ReleaseTools::new(services.release)),
            Box::new(WikiTools::new(services.wiki)),
            Box::new(TestPlanTools::new(services.test_plan, services.wit)),
        ];
        Self::from_toolsets(all, domains)
    }

    fn from_toolsets(toolsets: Vec<Box<dyn ToolSet>>, domains: &BTreeSet<Domain>) -> Self {
        let toolsets: Vec<Box<dyn ToolSet>> = toolsets
            .into_iter()
            .filter(|set| domains.contains(&set.domain()))
            .collect();
        tracing::debug!(
            "Enabled domains: {}",
            toolsets
                .iter()
                .map(|set| set.domain().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self { toolsets }
    }

    /// Definitions of every tool in the enabled domains.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        self.toolsets
            .iter()
            .flat_map(|set| set.definitions())
            .collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let owner = self
            .toolsets
            .iter()
            .find(|set| set.definitions().iter().any(|tool| tool.name == name));

        match owner {
            Some(set) => set.call(name, arguments).await,
            None => {
                tracing::warn!("Unknown tool requested: {}", name);
                unknown_tool(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdo_core::provider::{
        MockBuildApi, MockCoreApi, MockReleaseApi, MockTestPlanApi, MockWikiApi, MockWorkApi,
        MockWorkItemTrackingApi,
    };
    use serde_json::json;

    fn services(release: MockReleaseApi) -> Services {
        Services {
            core: Arc::new(MockCoreApi::new()),
            work: Arc::new(MockWorkApi::new()),
            wit: Arc::new(MockWorkItemTrackingApi::new()),
            build: Arc::new(MockBuildApi::new()),
            release: Arc::new(release),
            wiki: Arc::new(MockWikiApi::new()),
            test_plan: Arc::new(MockTestPlanApi::new()),
        }
    }

    fn names(handler: &ToolHandler) -> Vec<String> {
        handler.available_tools().into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_all_domains_expose_tools() {
        let handler = ToolHandler::new(
            services(MockReleaseApi::new()),
            &Domain::ALL.into_iter().collect(),
        );
        let names = names(&handler);
        assert!(names.contains(&"core_list_projects".to_string()));
        assert!(names.contains(&"wit_update_work_items_batch".to_string()));
        assert!(names.contains(&"testplan_create_test_case".to_string()));
        assert!(names.contains(&"wiki_get_page_content".to_string()));
    }

    #[test]
    fn test_disabled_domain_tools_hidden() {
        let domains: BTreeSet<Domain> = [Domain::Releases].into_iter().collect();
        let handler = ToolHandler::new(services(MockReleaseApi::new()), &domains);
        assert_eq!(
            names(&handler),
            vec!["release_get_definitions", "release_get_releases"]
        );
    }

    #[test]
    fn test_tool_names_unique() {
        let handler = ToolHandler::new(
            services(MockReleaseApi::new()),
            &Domain::ALL.into_iter().collect(),
        );
        let mut names = names(&handler);
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[tokio::test]
    async fn test_execute_routes_to_owner() {
        let mut release = MockReleaseApi::new();
        release
            .expect_get_releases()
            .times(1)
            .returning(|_, _| Ok(vec![json!({"id": 3})]));
        let handler = ToolHandler::new(services(release), &Domain::ALL.into_iter().collect());

        let result = handler
            .execute("release_get_releases", Some(json!({"project": "Contoso"})))
            .await;
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn test_execute_disabled_tool_is_unknown() {
        let domains: BTreeSet<Domain> = [Domain::Wiki].into_iter().collect();
        let handler = ToolHandler::new(services(MockReleaseApi::new()), &domains);

        let result = handler
            .execute("release_get_releases", Some(json!({"project": "Contoso"})))
            .await;
        assert!(result.is_error());
        assert_eq!(result.first_text(), "Unknown tool: release_get_releases");
    }
}
