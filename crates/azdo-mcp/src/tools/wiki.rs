//! Wiki tools.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::types::WikiPagesQuery;
use azdo_core::{Domain, WikiApi};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, respond, tool, unknown_tool, with_args, ToolSet};
use crate::protocol::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListWikisArgs {
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetWikiArgs {
    wiki_identifier: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPagesArgs {
    project: String,
    wiki_identifier: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    recursion_level: Option<String>,
    #[serde(default)]
    include_content: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
    project: String,
    wiki_identifier: String,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WritePageArgs {
    project: String,
    wiki_identifier: String,
    path: String,
    content: String,
    /// ETag of the page being replaced.
    #[serde(default)]
    version: Option<String>,
}

pub struct WikiTools {
    api: Arc<dyn WikiApi>,
}

impl WikiTools {
    pub fn new(api: Arc<dyn WikiApi>) -> Self {
        Self { api }
    }

    async fn list_pages(&self, args: ListPagesArgs) -> ToolCallResult {
        let query = WikiPagesQuery {
            path: args.path,
            recursion_level: args.recursion_level,
            include_content: args.include_content,
        };
        respond(
            &format!("Error listing pages of wiki '{}'", args.wiki_identifier),
            self.api
                .list_pages(&args.project, &args.wiki_identifier, &query)
                .await,
        )
    }

    async fn get_page_content(&self, args: PageArgs) -> ToolCallResult {
        match self
            .api
            .get_page_content(&args.project, &args.wiki_identifier, &args.path)
            .await
        {
            Ok(content) => ToolCallResult::text(content),
            Err(e) => failure(&format!("Error fetching wiki page '{}'", args.path), &e),
        }
    }

    async fn write_page(&self, args: WritePageArgs) -> ToolCallResult {
        respond(
            &format!("Error saving wiki page '{}'", args.path),
            self.api
                .create_or_update_page(
                    &args.project,
                    &args.wiki_identifier,
                    &args.path,
                    &args.content,
                    args.version,
                )
                .await,
        )
    }
}

#[async_trait]
impl ToolSet for WikiTools {
    fn domain(&self) -> Domain {
        Domain::Wiki
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                "wiki_list_wikis",
                "List the wikis of the organization or of one project.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" }
                    }
                }),
            ),
            tool(
                "wiki_get_wiki",
                "Get a wiki by id or name.",
                json!({
                    "type": "object",
                    "properties": {
                        "wikiIdentifier": { "type": "string" },
                        "project": { "type": "string" }
                    },
                    "required": ["wikiIdentifier"]
                }),
            ),
            tool(
                "wiki_list_pages",
                "List the page tree of a wiki.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "wikiIdentifier": { "type": "string" },
                        "path": { "type": "string", "description": "Root of the listing (default: /)" },
                        "recursionLevel": { "type": "string", "enum": ["none", "oneLevel", "oneLevelPlusNestedEmptyFolders", "full"] },
                        "includeContent": { "type": "boolean", "default": false }
                    },
                    "required": ["project", "wikiIdentifier"]
                }),
            ),
            tool(
                "wiki_get_page_content",
                "Get the markdown content of a wiki page.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "wikiIdentifier": { "type": "string" },
                        "path": { "type": "string" }
                    },
                    "required": ["project", "wikiIdentifier", "path"]
                }),
            ),
            tool(
                "wiki_create_or_update_page",
                "Create a wiki page, or update it when its version (ETag) is given.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "wikiIdentifier": { "type": "string" },
                        "path": { "type": "string" },
                        "content": { "type": "string" },
                        "version": { "type": "string", "description": "ETag of the existing page" }
                    },
                    "required": ["project", "wikiIdentifier", "path", "content"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "wiki_list_wikis" => {
                with_args(name, arguments, |a: ListWikisArgs| async move {
                    respond("Error listing wikis", self.api.list_wikis(a.project).await)
                })
                .await
            }
            "wiki_get_wiki" => {
                with_args(name, arguments, |a: GetWikiArgs| async move {
                    respond(
                        &format!("Error fetching wiki '{}'", a.wiki_identifier),
                        self.api.get_wiki(a.project, &a.wiki_identifier).await,
                    )
                })
                .await
            }
            "wiki_list_pages" => with_args(name, arguments, |a| self.list_pages(a)).await,
            "wiki_get_page_content" => {
                with_args(name, arguments, |a| self.get_page_content(a)).await
            }
            "wiki_create_or_update_page" => {
                with_args(name, arguments, |a| self.write_page(a)).await
            }
            _ => unknown_tool(name),
        }
    }
}
