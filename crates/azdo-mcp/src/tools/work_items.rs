//! Work item tools: reads, single-item mutations, links and batches.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::batch::{frame_batch, unpack_batch_response, BatchEntry};
use azdo_core::patch::{build_field_patch, with_format_hints};
use azdo_core::relations::{
    artifact_link, artifact_uri, canonical_artifact_link_type, parent_link, plan_unlink,
    pull_request_link, relations_of, work_item_link, ArtifactComponents,
};
use azdo_core::types::{CommentFormat, QueryOptions, WorkItemExpand};
use azdo_core::{
    Domain, Error, FieldUpdate, Operation, PatchOperation, Result, TextFormat, WorkApi,
    WorkItemTrackingApi,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    execute_single, failure, require_entity, respond, tool, unknown_tool, with_args,
    StringOrNumber, ToolSet,
};
use crate::protocol::{ToolCallResult, ToolDefinition};

/// Upper bound on children created by one `wit_add_child_work_items` call.
pub const MAX_CHILD_WORK_ITEMS: usize = 50;

const MY_WORK_ITEMS_WIQL: &str = "SELECT [System.Id] FROM WorkItems \
     WHERE [System.AssignedTo] = @Me OR [System.CreatedBy] = @Me \
     ORDER BY [System.ChangedDate] DESC";

fn default_top() -> usize {
    50
}

fn default_link_type() -> String {
    "related".to_string()
}

fn default_artifact_link_type() -> String {
    "Branch".to_string()
}

fn default_op() -> String {
    "add".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyWorkItemsArgs {
    project: String,
    #[serde(default = "default_top")]
    top: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamArgs {
    project: String,
    team: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BacklogWorkItemsArgs {
    project: String,
    team: String,
    backlog_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetWorkItemArgs {
    id: u64,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    expand: WorkItemExpand,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchByIdsArgs {
    project: String,
    ids: Vec<u64>,
    #[serde(default)]
    expand: WorkItemExpand,
}

#[derive(Debug, Deserialize)]
struct PathUpdate {
    #[serde(default = "default_op")]
    op: String,
    path: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    format: Option<TextFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWorkItemArgs {
    id: u64,
    #[serde(default)]
    project: Option<String>,
    updates: Vec<PathUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorkItemArgs {
    #[serde(default)]
    project: String,
    #[serde(default, alias = "type")]
    work_item_type: String,
    #[serde(default)]
    fields: Vec<FieldUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsArgs {
    project: String,
    work_item_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentArgs {
    project: String,
    work_item_id: u64,
    comment: String,
    #[serde(default)]
    format: CommentFormat,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IterationWorkItemsArgs {
    project: String,
    team: String,
    iteration_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildItem {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    format: Option<TextFormat>,
    #[serde(default)]
    area_path: Option<String>,
    #[serde(default)]
    iteration_path: Option<String>,
}

impl ChildItem {
    fn to_fields(&self) -> Vec<FieldUpdate> {
        let mut fields = vec![FieldUpdate::new("System.Title", self.title.as_str())];
        if let Some(description) = &self.description {
            fields.push(
                FieldUpdate::new("System.Description", description.as_str())
                    .with_format(Some(self.format.unwrap_or(TextFormat::Html))),
            );
        }
        if let Some(area) = &self.area_path {
            fields.push(FieldUpdate::new("System.AreaPath", area.as_str()));
        }
        if let Some(iteration) = &self.iteration_path {
            fields.push(FieldUpdate::new("System.IterationPath", iteration.as_str()));
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddChildrenArgs {
    project: String,
    parent_id: u64,
    work_item_type: String,
    items: Vec<ChildItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkPullRequestArgs {
    #[serde(alias = "projectId")]
    project: String,
    #[serde(alias = "repoId")]
    repository_id: String,
    pull_request_id: u64,
    work_item_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkItemTypeArgs {
    project: String,
    #[serde(alias = "type")]
    work_item_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetQueryArgs {
    project: String,
    query: String,
    #[serde(default)]
    expand: Option<String>,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default)]
    include_deleted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResultsArgs {
    project: String,
    id: String,
    #[serde(default = "default_top")]
    top: usize,
}

#[derive(Debug, Deserialize)]
struct BatchUpdate {
    #[serde(default = "default_op")]
    op: String,
    id: u64,
    path: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    format: Option<TextFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBatchArgs {
    project: String,
    updates: Vec<BatchUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkUpdate {
    id: u64,
    link_to_id: u64,
    #[serde(rename = "type", default = "default_link_type")]
    link_type: String,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkArgs {
    project: String,
    updates: Vec<LinkUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnlinkArgs {
    project: String,
    id: u64,
    #[serde(rename = "type", default = "default_link_type")]
    link_type: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactLinkArgs {
    work_item_id: u64,
    project: String,
    #[serde(default)]
    artifact_uri: Option<String>,
    #[serde(default = "default_artifact_link_type")]
    link_type: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    repository_id: Option<String>,
    #[serde(default)]
    branch_name: Option<String>,
    #[serde(default)]
    commit_id: Option<String>,
    #[serde(default)]
    pull_request_id: Option<StringOrNumber>,
    #[serde(default)]
    build_id: Option<StringOrNumber>,
}

impl ArtifactLinkArgs {
    fn components(&self) -> ArtifactComponents {
        ArtifactComponents {
            project_id: self.project_id.clone(),
            repository_id: self.repository_id.clone(),
            branch_name: self.branch_name.clone(),
            commit_id: self.commit_id.clone(),
            pull_request_id: self.pull_request_id.as_ref().map(ToString::to_string),
            build_id: self.build_id.as_ref().map(ToString::to_string),
        }
    }

    /// Explicit URI when given, otherwise derived from the components.
    fn resolve_uri(&self, link_type: &str) -> Result<String> {
        match self.artifact_uri.as_deref().map(str::trim) {
            Some(uri) if !uri.is_empty() => Ok(uri.to_string()),
            _ => artifact_uri(link_type, &self.components()),
        }
    }
}

fn patch_operation(op: &str, path: String, value: Option<Value>) -> Result<PatchOperation> {
    Ok(PatchOperation {
        op: op.parse::<Operation>()?,
        path,
        value,
    })
}

/// Work item tracking tools.
pub struct WorkItemTools {
    wit: Arc<dyn WorkItemTrackingApi>,
    work: Arc<dyn WorkApi>,
}

impl WorkItemTools {
    pub fn new(wit: Arc<dyn WorkItemTrackingApi>, work: Arc<dyn WorkApi>) -> Self {
        Self { wit, work }
    }

    async fn fetch_by_ids(&self, project: &str, mut ids: Vec<u64>, top: usize) -> Result<Vec<Value>> {
        ids.truncate(top);
        self.wit
            .get_work_items_batch(&ids, Some(project.to_string()), WorkItemExpand::Fields)
            .await
    }

    async fn my_work_items(&self, args: MyWorkItemsArgs) -> ToolCallResult {
        let outcome = match self.wit.query_by_wiql(&args.project, MY_WORK_ITEMS_WIQL).await {
            Ok(ids) => self.fetch_by_ids(&args.project, ids, args.top).await,
            Err(e) => Err(e),
        };
        respond("Error fetching work items", outcome)
    }

    async fn list_backlogs(&self, args: TeamArgs) -> ToolCallResult {
        respond(
            "Error listing backlogs",
            self.work.get_backlogs(&args.project, &args.team).await,
        )
    }

    async fn list_backlog_work_items(&self, args: BacklogWorkItemsArgs) -> ToolCallResult {
        respond(
            "Error listing backlog work items",
            self.work
                .get_backlog_work_items(&args.project, &args.team, &args.backlog_id)
                .await,
        )
    }

    async fn get_work_item(&self, args: GetWorkItemArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching work item {}", args.id),
            self.wit.get_work_item(args.id, args.project, args.expand).await,
        )
    }

    async fn get_work_items_batch(&self, args: BatchByIdsArgs) -> ToolCallResult {
        respond(
            "Error fetching work items",
            self.wit
                .get_work_items_batch(&args.ids, Some(args.project), args.expand)
                .await,
        )
    }

    async fn update_work_item(&self, args: UpdateWorkItemArgs) -> ToolCallResult {
        let context = format!("Error updating work item {}", args.id);
        if args.updates.is_empty() {
            return failure(
                &context,
                &Error::Validation("No updates were provided".to_string()),
            );
        }

        let operations = args
            .updates
            .into_iter()
            .map(|update| {
                patch_operation(&update.op, update.path, update.value)
                    .map(|operation| (operation, update.format))
            })
            .collect::<Result<Vec<_>>>();
        let document = match operations {
            Ok(operations) => with_format_hints(operations),
            Err(e) => return failure(&context, &e),
        };

        execute_single(
            &context,
            "Work item was not updated",
            self.wit.update_work_item(args.id, args.project, &document),
        )
        .await
    }

    async fn create_work_item(&self, args: CreateWorkItemArgs) -> ToolCallResult {
        let context = "Error creating work item";
        let missing: Vec<&str> = [
            ("project", args.project.as_str()),
            ("workItemType", args.work_item_type.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            let e = Error::Validation(format!("Missing required parameters: {}", missing.join(", ")));
            return failure(context, &e);
        }

        let document = build_field_patch(&args.fields);
        debug!(
            project = %args.project,
            work_item_type = %args.work_item_type,
            operations = document.len(),
            "Creating work item"
        );
        execute_single(
            context,
            "Work item was not created",
            self.wit
                .create_work_item(&args.project, &args.work_item_type, &document),
        )
        .await
    }

    async fn list_comments(&self, args: CommentsArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching comments of work item {}", args.work_item_id),
            self.wit.get_comments(&args.project, args.work_item_id).await,
        )
    }

    async fn add_comment(&self, args: AddCommentArgs) -> ToolCallResult {
        execute_single(
            &format!("Error adding comment to work item {}", args.work_item_id),
            "Comment was not added",
            self.wit
                .add_comment(&args.project, args.work_item_id, &args.comment, args.format),
        )
        .await
    }

    async fn work_items_for_iteration(&self, args: IterationWorkItemsArgs) -> ToolCallResult {
        let outcome = match self
            .work
            .get_iteration_work_item_ids(&args.project, &args.team, &args.iteration_id)
            .await
        {
            Ok(ids) => {
                let top = ids.len();
                self.fetch_by_ids(&args.project, ids, top).await
            }
            Err(e) => Err(e),
        };
        respond("Error fetching work items for iteration", outcome)
    }

    /// Create children one after another; a failure stops the run and
    /// reports the children created before it.
    async fn add_child_work_items(&self, args: AddChildrenArgs) -> ToolCallResult {
        let context = "Error creating child work items";
        if args.items.len() > MAX_CHILD_WORK_ITEMS {
            let e = Error::Validation(format!(
                "A maximum of {} child work items can be created in a single call.",
                MAX_CHILD_WORK_ITEMS
            ));
            return failure(context, &e);
        }

        let server_url = self.wit.server_url();
        let mut created = Vec::with_capacity(args.items.len());

        for item in &args.items {
            let mut document = build_field_patch(&item.to_fields());
            document.push(parent_link(&server_url, &args.project, args.parent_id));

            let outcome = self
                .wit
                .create_work_item(&args.project, &args.work_item_type, &document)
                .await
                .and_then(|entity| require_entity(entity, "Work item was not created"));

            match outcome {
                Ok(entity) => created.push(entity),
                Err(e) => {
                    let mut message = format!("{}: {}", context, e.user_message());
                    if !created.is_empty() {
                        let prefix = serde_json::to_string_pretty(&created).unwrap_or_default();
                        message.push_str(&format!(
                            "\nCreated {} of {} before the failure:\n{}",
                            created.len(),
                            args.items.len(),
                            prefix
                        ));
                    }
                    return ToolCallResult::error(message);
                }
            }
        }

        info!(parent = args.parent_id, count = created.len(), "Created child work items");
        ToolCallResult::json(&created)
    }

    async fn link_to_pull_request(&self, args: LinkPullRequestArgs) -> ToolCallResult {
        let operation = pull_request_link(&args.project, &args.repository_id, args.pull_request_id);
        execute_single(
            &format!(
                "Error linking work item {} to pull request {}",
                args.work_item_id, args.pull_request_id
            ),
            "Work item was not updated",
            self.wit
                .update_work_item(args.work_item_id, Some(args.project.clone()), &[operation]),
        )
        .await
    }

    async fn get_work_item_type(&self, args: WorkItemTypeArgs) -> ToolCallResult {
        respond(
            &format!("Error fetching work item type '{}'", args.work_item_type),
            self.wit
                .get_work_item_type(&args.project, &args.work_item_type)
                .await,
        )
    }

    async fn get_query(&self, args: GetQueryArgs) -> ToolCallResult {
        let options = QueryOptions {
            expand: args.expand,
            depth: args.depth,
            include_deleted: args.include_deleted,
        };
        respond(
            &format!("Error fetching query '{}'", args.query),
            self.wit.get_query(&args.project, &args.query, &options).await,
        )
    }

    async fn query_results(&self, args: QueryResultsArgs) -> ToolCallResult {
        let outcome = match self.wit.query_by_id(&args.project, &args.id).await {
            Ok(ids) => self.fetch_by_ids(&args.project, ids, args.top).await,
            Err(e) => Err(e),
        };
        respond(&format!("Error running query '{}'", args.id), outcome)
    }

    async fn send_entries(&self, project: &str, entries: &[BatchEntry]) -> Result<Vec<Value>> {
        let requests = frame_batch(entries);
        debug!(project = project, requests = requests.len(), "Sending work item batch");
        let response = self.wit.send_batch(project, &requests).await?;
        unpack_batch_response(response)
    }

    async fn update_work_items_batch(&self, args: UpdateBatchArgs) -> ToolCallResult {
        let context = "Error updating work items in batch";
        let entries = args
            .updates
            .into_iter()
            .map(|update| {
                patch_operation(&update.op, update.path, update.value)
                    .map(|operation| BatchEntry::new(update.id, operation).with_format(update.format))
            })
            .collect::<Result<Vec<_>>>();

        let outcome = match entries {
            Ok(entries) if entries.is_empty() => {
                Err(Error::Validation("No updates were provided".to_string()))
            }
            Ok(entries) => self.send_entries(&args.project, &entries).await,
            Err(e) => Err(e),
        };
        respond(context, outcome)
    }

    async fn link_work_items(&self, args: LinkArgs) -> ToolCallResult {
        let server_url = self.wit.server_url();
        let entries = args
            .updates
            .iter()
            .map(|update| {
                work_item_link(
                    &server_url,
                    &args.project,
                    update.link_to_id,
                    &update.link_type,
                    update.comment.as_deref(),
                )
                .map(|operation| BatchEntry::new(update.id, operation))
            })
            .collect::<Result<Vec<_>>>();

        let outcome = match entries {
            Ok(entries) if entries.is_empty() => {
                Err(Error::Validation("No links were provided".to_string()))
            }
            Ok(entries) => self.send_entries(&args.project, &entries).await,
            Err(e) => Err(e),
        };
        respond("Error linking work items", outcome)
    }

    /// Remove links matched on one snapshot of the relation list.
    ///
    /// The snapshot and the removal are two calls; a concurrent change to
    /// the same work item in between can shift the removed indices.
    async fn unlink_work_item(&self, args: UnlinkArgs) -> ToolCallResult {
        let context = format!("Error removing links from work item {}", args.id);
        let project = Some(args.project.clone());

        let plan = async {
            let work_item = self
                .wit
                .get_work_item(args.id, project.clone(), WorkItemExpand::Relations)
                .await?;
            let relations = relations_of(&work_item)?;
            plan_unlink(&relations, &args.link_type, args.url.as_deref())
        }
        .await;
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => return failure(&context, &e),
        };

        let updated = self
            .wit
            .update_work_item(args.id, project, &plan.operations)
            .await
            .and_then(|entity| require_entity(entity, "Work item was not updated"));

        match updated {
            Ok(work_item) => {
                let removed = serde_json::to_string_pretty(&plan.removed).unwrap_or_default();
                let work_item = serde_json::to_string_pretty(&work_item).unwrap_or_default();
                ToolCallResult::text(format!(
                    "Removed {} link(s) of type '{}':\n{}\n\nUpdated work item:\n{}",
                    plan.removed.len(),
                    args.link_type,
                    removed,
                    work_item
                ))
            }
            Err(e) => failure(&context, &e),
        }
    }

    async fn add_artifact_link(&self, args: ArtifactLinkArgs) -> ToolCallResult {
        let context = format!("Error adding artifact link to work item {}", args.work_item_id);

        let operation = canonical_artifact_link_type(&args.link_type).and_then(|link_type| {
            let uri = args.resolve_uri(link_type)?;
            Ok((link_type, uri))
        });
        let (link_type, uri) = match operation {
            Ok(resolved) => resolved,
            Err(e) => return failure(&context, &e),
        };

        let document = [artifact_link(&uri, link_type, args.comment.as_deref())];
        let outcome = self
            .wit
            .update_work_item(args.work_item_id, Some(args.project.clone()), &document)
            .await
            .and_then(|entity| require_entity(entity, "Work item was not updated"))
            .map(|work_item| {
                json!({
                    "workItemId": args.work_item_id,
                    "linkType": link_type,
                    "artifactUri": uri,
                    "workItem": work_item,
                })
            });
        respond(&context, outcome)
    }
}

#[async_trait]
impl ToolSet for WorkItemTools {
    fn domain(&self) -> Domain {
        Domain::WorkItems
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let format = json!({
            "type": "string",
            "enum": ["Html", "Markdown"],
            "description": "Format of long text values; applied to text longer than 50 characters"
        });

        vec![
            tool(
                "wit_my_work_items",
                "List work items assigned to or created by the authenticated user, most recently changed first.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string", "description": "Project name or id" },
                        "top": { "type": "integer", "description": "Maximum number of work items (default: 50)" }
                    },
                    "required": ["project"]
                }),
            ),
            tool(
                "wit_list_backlogs",
                "List the backlogs of a team.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "team": { "type": "string" }
                    },
                    "required": ["project", "team"]
                }),
            ),
            tool(
                "wit_list_backlog_work_items",
                "List the work items on one backlog of a team.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "team": { "type": "string" },
                        "backlogId": { "type": "string", "description": "Backlog id, e.g. Microsoft.RequirementCategory" }
                    },
                    "required": ["project", "team", "backlogId"]
                }),
            ),
            tool(
                "wit_get_work_item",
                "Get a single work item by id.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "project": { "type": "string" },
                        "expand": {
                            "type": "string",
                            "enum": ["none", "relations", "fields", "links", "all"],
                            "description": "Parts of the work item to include (default: all)"
                        }
                    },
                    "required": ["id"]
                }),
            ),
            tool(
                "wit_get_work_items_batch_by_ids",
                "Get several work items by id.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "ids": { "type": "array", "items": { "type": "integer" } },
                        "expand": { "type": "string", "enum": ["none", "relations", "fields", "links", "all"] }
                    },
                    "required": ["project", "ids"]
                }),
            ),
            tool(
                "wit_update_work_item",
                "Update a work item with JSON-Patch operations.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "project": { "type": "string" },
                        "updates": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "op": { "type": "string", "enum": ["add", "replace", "remove"], "description": "Default: add" },
                                    "path": { "type": "string", "description": "e.g. /fields/System.Title" },
                                    "value": { "description": "New value; omitted for remove" },
                                    "format": format
                                },
                                "required": ["path"]
                            }
                        }
                    },
                    "required": ["id", "updates"]
                }),
            ),
            tool(
                "wit_create_work_item",
                "Create a work item from a list of field values.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "workItemType": { "type": "string", "description": "e.g. Bug, Task, User Story" },
                        "fields": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string", "description": "Field reference name, e.g. System.Title" },
                                    "value": {},
                                    "format": format
                                },
                                "required": ["name", "value"]
                            }
                        }
                    },
                    "required": ["project", "workItemType", "fields"]
                }),
            ),
            tool(
                "wit_list_work_item_comments",
                "List the comments of a work item.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "workItemId": { "type": "integer" }
                    },
                    "required": ["project", "workItemId"]
                }),
            ),
            tool(
                "wit_add_work_item_comment",
                "Add a comment to a work item.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "workItemId": { "type": "integer" },
                        "comment": { "type": "string" },
                        "format": { "type": "string", "enum": ["markdown", "html"], "description": "Default: markdown" }
                    },
                    "required": ["project", "workItemId", "comment"]
                }),
            ),
            tool(
                "wit_get_work_items_for_iteration",
                "List the work items planned in a team iteration.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "team": { "type": "string" },
                        "iterationId": { "type": "string" }
                    },
                    "required": ["project", "team", "iterationId"]
                }),
            ),
            tool(
                "wit_add_child_work_items",
                "Create child work items under a parent, one after another (at most 50).",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "parentId": { "type": "integer" },
                        "workItemType": { "type": "string" },
                        "items": {
                            "type": "array",
                            "maxItems": MAX_CHILD_WORK_ITEMS,
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": { "type": "string" },
                                    "description": { "type": "string" },
                                    "format": format,
                                    "areaPath": { "type": "string" },
                                    "iterationPath": { "type": "string" }
                                },
                                "required": ["title"]
                            }
                        }
                    },
                    "required": ["project", "parentId", "workItemType", "items"]
                }),
            ),
            tool(
                "wit_link_work_item_to_pull_request",
                "Link a work item to a pull request.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string", "description": "Project name or id" },
                        "repositoryId": { "type": "string" },
                        "pullRequestId": { "type": "integer" },
                        "workItemId": { "type": "integer" }
                    },
                    "required": ["project", "repositoryId", "pullRequestId", "workItemId"]
                }),
            ),
            tool(
                "wit_get_work_item_type",
                "Get a work item type definition.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "workItemType": { "type": "string" }
                    },
                    "required": ["project", "workItemType"]
                }),
            ),
            tool(
                "wit_get_query",
                "Get a saved query by id or path.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "query": { "type": "string", "description": "Query id or path" },
                        "expand": { "type": "string", "enum": ["none", "wiql", "clauses", "all", "minimal"] },
                        "depth": { "type": "integer" },
                        "includeDeleted": { "type": "boolean" }
                    },
                    "required": ["project", "query"]
                }),
            ),
            tool(
                "wit_get_query_results_by_id",
                "Run a saved query and return the matching work items.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "id": { "type": "string", "description": "Query id" },
                        "top": { "type": "integer", "description": "Maximum number of work items (default: 50)" }
                    },
                    "required": ["project", "id"]
                }),
            ),
            tool(
                "wit_update_work_items_batch",
                "Update several work items in one batch request.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "updates": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "op": { "type": "string", "enum": ["add", "replace", "remove"], "description": "Default: add" },
                                    "id": { "type": "integer" },
                                    "path": { "type": "string" },
                                    "value": {},
                                    "format": format
                                },
                                "required": ["id", "path"]
                            }
                        }
                    },
                    "required": ["project", "updates"]
                }),
            ),
            tool(
                "wit_work_items_link",
                "Link work items to other work items in one batch request.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "updates": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "id": { "type": "integer", "description": "Work item to add the link to" },
                                    "linkToId": { "type": "integer", "description": "Work item to link to" },
                                    "type": {
                                        "type": "string",
                                        "description": "parent, child, duplicate, duplicate of, related, successor, predecessor, tested by, tests, affects, affected by (default: related)"
                                    },
                                    "comment": { "type": "string" }
                                },
                                "required": ["id", "linkToId"]
                            }
                        }
                    },
                    "required": ["project", "updates"]
                }),
            ),
            tool(
                "wit_work_item_unlink",
                "Remove every link of a type from a work item, optionally only the one pointing at a URL.",
                json!({
                    "type": "object",
                    "properties": {
                        "project": { "type": "string" },
                        "id": { "type": "integer" },
                        "type": { "type": "string", "description": "Link type name or relation type (default: related)" },
                        "url": { "type": "string", "description": "Only remove the link with this target URL" }
                    },
                    "required": ["project", "id"]
                }),
            ),
            tool(
                "wit_add_artifact_link",
                "Link a work item to a branch, commit, pull request, build or other artifact.",
                json!({
                    "type": "object",
                    "properties": {
                        "workItemId": { "type": "integer" },
                        "project": { "type": "string" },
                        "artifactUri": { "type": "string", "description": "vstfs:/// URI; derived from the components below when omitted" },
                        "linkType": {
                            "type": "string",
                            "enum": azdo_core::relations::ARTIFACT_LINK_TYPES,
                            "description": "Default: Branch"
                        },
                        "comment": { "type": "string" },
                        "projectId": { "type": "string" },
                        "repositoryId": { "type": "string" },
                        "branchName": { "type": "string" },
                        "commitId": { "type": "string" },
                        "pullRequestId": { "type": ["string", "integer"] },
                        "buildId": { "type": ["string", "integer"] }
                    },
                    "required": ["workItemId", "project"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match name {
            "wit_my_work_items" => with_args(name, arguments, |a| self.my_work_items(a)).await,
            "wit_list_backlogs" => with_args(name, arguments, |a| self.list_backlogs(a)).await,
            "wit_list_backlog_work_items" => {
                with_args(name, arguments, |a| self.list_backlog_work_items(a)).await
            }
            "wit_get_work_item" => with_args(name, arguments, |a| self.get_work_item(a)).await,
            "wit_get_work_items_batch_by_ids" => {
                with_args(name, arguments, |a| self.get_work_items_batch(a)).await
            }
            "wit_update_work_item" => {
                with_args(name, arguments, |a| self.update_work_item(a)).await
            }
            "wit_create_work_item" => {
                with_args(name, arguments, |a| self.create_work_item(a)).await
            }
            "wit_list_work_item_comments" => {
                with_args(name, arguments, |a| self.list_comments(a)).await
            }
            "wit_add_work_item_comment" => {
                with_args(name, arguments, |a| self.add_comment(a)).await
            }
            "wit_get_work_items_for_iteration" => {
                with_args(name, arguments, |a| self.work_items_for_iteration(a)).await
            }
            "wit_add_child_work_items" => {
                with_args(name, arguments, |a| self.add_child_work_items(a)).await
            }
            "wit_link_work_item_to_pull_request" => {
                with_args(name, arguments, |a| self.link_to_pull_request(a)).await
            }
            "wit_get_work_item_type" => {
                with_args(name, arguments, |a| self.get_work_item_type(a)).await
            }
            "wit_get_query" => with_args(name, arguments, |a| self.get_query(a)).await,
            "wit_get_query_results_by_id" => {
                with_args(name, arguments, |a| self.query_results(a)).await
            }
            "wit_update_work_items_batch" => {
                with_args(name, arguments, |a| self.update_work_items_batch(a)).await
            }
            "wit_work_items_link" => with_args(name, arguments, |a| self.link_work_items(a)).await,
            "wit_work_item_unlink" => {
                with_args(name, arguments, |a| self.unlink_work_item(a)).await
            }
            "wit_add_artifact_link" => {
                with_args(name, arguments, |a| self.add_artifact_link(a)).await
            }
            _ => unknown_tool(name),
        }
    }
}
