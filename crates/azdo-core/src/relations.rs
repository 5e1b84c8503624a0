//! Relation patches: links between work items and to external artifacts.
//!
//! Relations on a work item are addressed by position, so removals are
//! planned from one snapshot of the relation list and emitted in
//! descending index order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::links::{resolve_relation_type, ARTIFACT_RELATION, PARENT_RELATION};
use crate::patch::PatchOperation;

/// Path that appends to a work item's relation list.
pub const APPEND_RELATION_PATH: &str = "/relations/-";

/// Attributes attached to a relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelationAttributes {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.comment.is_none() && self.extra.is_empty()
    }
}

/// One outgoing link of a work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "rel")]
    pub relation_type: String,
    #[serde(rename = "url", default)]
    pub target_url: String,
    #[serde(default, skip_serializing_if = "RelationAttributes::is_empty")]
    pub attributes: RelationAttributes,
}

impl Relation {
    pub fn new(relation_type: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            relation_type: relation_type.into(),
            target_url: target_url.into(),
            attributes: RelationAttributes::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.attributes.name = Some(name.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.attributes.comment = Some(comment.into());
        self
    }

    /// Patch operation appending this relation.
    pub fn into_add_operation(self) -> PatchOperation {
        let value = serde_json::to_value(&self).unwrap_or(Value::Null);
        PatchOperation::add(APPEND_RELATION_PATH, value)
    }
}

/// REST URL of a work item, used as the target of work item links.
pub fn work_item_url(server_url: &str, project: &str, id: u64) -> String {
    format!(
        "{}/{}/_apis/wit/workItems/{}",
        server_url.trim_end_matches('/'),
        project,
        id
    )
}

/// Link to another work item in the same organization.
///
/// `link_type` may be a short name (`"related"`) or a relation type.
/// Attributes are only sent when a comment is given.
pub fn work_item_link(
    server_url: &str,
    project: &str,
    target_id: u64,
    link_type: &str,
    comment: Option<&str>,
) -> Result<PatchOperation> {
    let relation_type = resolve_relation_type(link_type)?;
    let mut relation = Relation::new(relation_type, work_item_url(server_url, project, target_id));
    if let Some(comment) = comment {
        relation = relation.with_comment(comment);
    }
    Ok(relation.into_add_operation())
}

/// Parent link added to a newly created child work item.
pub fn parent_link(server_url: &str, project: &str, parent_id: u64) -> PatchOperation {
    Relation::new(PARENT_RELATION, work_item_url(server_url, project, parent_id)).into_add_operation()
}

// =============================================================================
// Artifact links
// =============================================================================

/// Artifact link names accepted by Azure DevOps.
pub const ARTIFACT_LINK_TYPES: &[&str] = &[
    "Branch",
    "Build",
    "Fixed in Changeset",
    "Fixed in Commit",
    "Found in build",
    "Integrated in build",
    "Model Link",
    "Pull Request",
    "Related Workitem",
    "Result Attachment",
    "Source Code File",
    "Tag",
    "Test Result",
    "Wiki",
];

/// Components used to derive an artifact URI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactComponents {
    pub project_id: Option<String>,
    pub repository_id: Option<String>,
    pub branch_name: Option<String>,
    pub commit_id: Option<String>,
    pub pull_request_id: Option<String>,
    pub build_id: Option<String>,
}

/// Canonical spelling of an artifact link name, matched case-insensitively.
pub fn canonical_artifact_link_type(name: &str) -> Result<&'static str> {
    ARTIFACT_LINK_TYPES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(name))
        .copied()
        .ok_or_else(|| {
            Error::Validation(format!(
                "Unsupported artifact link type '{}'. Expected one of: {}",
                name,
                ARTIFACT_LINK_TYPES.join(", ")
            ))
        })
}

fn require<'a>(
    link_type: &str,
    required: &[(&str, &'a Option<String>)],
) -> Result<Vec<&'a str>> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "Missing required parameters for '{}' link: {}",
            link_type,
            missing.join(", ")
        )));
    }

    Ok(required
        .iter()
        .filter_map(|(_, value)| value.as_deref())
        .collect())
}

/// Build the `vstfs:///` URI for an artifact link from its components.
///
/// Link types without a derivation rule need an explicit artifact URI.
pub fn artifact_uri(link_type: &str, components: &ArtifactComponents) -> Result<String> {
    let link_type = canonical_artifact_link_type(link_type)?;
    let c = components;

    match link_type {
        "Branch" => {
            let parts = require(
                link_type,
                &[
                    ("projectId", &c.project_id),
                    ("repositoryId", &c.repository_id),
                    ("branchName", &c.branch_name),
                ],
            )?;
            Ok(format!(
                "vstfs:///Git/Ref/{}%2F{}%2FGB{}",
                encode_uri_component(parts[0]),
                encode_uri_component(parts[1]),
                encode_uri_component(parts[2])
            ))
        }
        "Fixed in Commit" => {
            let parts = require(
                link_type,
                &[
                    ("projectId", &c.project_id),
                    ("repositoryId", &c.repository_id),
                    ("commitId", &c.commit_id),
                ],
            )?;
            Ok(format!(
                "vstfs:///Git/Commit/{}%2F{}%2F{}",
                encode_uri_component(parts[0]),
                encode_uri_component(parts[1]),
                encode_uri_component(parts[2])
            ))
        }
        "Pull Request" => {
            let parts = require(
                link_type,
                &[
                    ("projectId", &c.project_id),
                    ("repositoryId", &c.repository_id),
                    ("pullRequestId", &c.pull_request_id),
                ],
            )?;
            Ok(pull_request_uri(parts[0], parts[1], parts[2]))
        }
        "Build" | "Found in build" | "Integrated in build" => {
            let parts = require(link_type, &[("buildId", &c.build_id)])?;
            Ok(format!("vstfs:///Build/Build/{}", encode_uri_component(parts[0])))
        }
        other => Err(Error::Validation(format!(
            "Link type '{}' requires an explicit artifactUri",
            other
        ))),
    }
}

pub fn pull_request_uri(project: &str, repository: &str, pull_request_id: &str) -> String {
    format!(
        "vstfs:///Git/PullRequestId/{}%2F{}%2F{}",
        encode_uri_component(project),
        encode_uri_component(repository),
        encode_uri_component(pull_request_id)
    )
}

/// Artifact link operation; the relation name is the artifact link type.
pub fn artifact_link(uri: &str, link_type: &str, comment: Option<&str>) -> PatchOperation {
    let mut relation = Relation::new(ARTIFACT_RELATION, uri).with_name(link_type);
    if let Some(comment) = comment {
        relation = relation.with_comment(comment);
    }
    relation.into_add_operation()
}

/// Link a work item to a pull request.
pub fn pull_request_link(project: &str, repository: &str, pull_request_id: u64) -> PatchOperation {
    let uri = pull_request_uri(project, repository, &pull_request_id.to_string());
    artifact_link(&uri, "Pull Request", None)
}

/// Percent-encode everything outside the URI component unreserved set.
pub fn encode_uri_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

// =============================================================================
// Removal
// =============================================================================

/// Removal operations computed from one snapshot of a relation list.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlinkPlan {
    /// `remove /relations/{index}` operations, highest index first.
    pub operations: Vec<PatchOperation>,
    /// Relations that will be removed, in their original order.
    pub removed: Vec<Relation>,
}

/// Indices of relations matching `relation_type` and, when given, `url`.
pub fn matching_relation_indices(
    relations: &[Relation],
    relation_type: &str,
    url: Option<&str>,
) -> Vec<usize> {
    relations
        .iter()
        .enumerate()
        .filter(|(_, relation)| relation.relation_type.eq_ignore_ascii_case(relation_type))
        .filter(|(_, relation)| url.map_or(true, |url| relation.target_url == url))
        .map(|(index, _)| index)
        .collect()
}

/// Plan the removal of every relation of `link_type` (optionally pointing at `url`).
pub fn plan_unlink(relations: &[Relation], link_type: &str, url: Option<&str>) -> Result<UnlinkPlan> {
    let relation_type = resolve_relation_type(link_type)?;
    let indices = matching_relation_indices(relations, relation_type, url);

    if indices.is_empty() {
        return Err(Error::NoMatchingRelation {
            link_type: link_type.to_string(),
            url: url.map(str::to_string),
        });
    }

    let removed = indices.iter().map(|&i| relations[i].clone()).collect();
    let operations = indices
        .iter()
        .rev()
        .map(|i| PatchOperation::remove(format!("/relations/{}", i)))
        .collect();

    Ok(UnlinkPlan { operations, removed })
}

/// Relations of a work item as returned by the API (`relations` may be absent).
pub fn relations_of(work_item: &Value) -> Result<Vec<Relation>> {
    match work_item.get("relations") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(relations) => Ok(serde_json::from_value(relations.clone())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SERVER: &str = "https://dev.azure.com/contoso";

    #[test]
    fn test_work_item_url() {
        assert_eq!(
            work_item_url("https://dev.azure.com/contoso/", "Contoso", 7),
            "https://dev.azure.com/contoso/Contoso/_apis/wit/workItems/7"
        );
    }

    #[test]
    fn test_work_item_link_shape() {
        let op = work_item_link(SERVER, "Contoso", 2, "related", Some("see also")).unwrap();
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "op": "add",
                "path": "/relations/-",
                "value": {
                    "rel": "System.LinkTypes.Related",
                    "url": "https://dev.azure.com/contoso/Contoso/_apis/wit/workItems/2",
                    "attributes": {"comment": "see also"}
                }
            })
        );
    }

    #[test]
    fn test_work_item_link_without_comment() {
        let op = work_item_link(SERVER, "Contoso", 2, "Parent", None).unwrap();
        assert_eq!(
            op.value.unwrap(),
            json!({
                "rel": "System.LinkTypes.Hierarchy-Reverse",
                "url": "https://dev.azure.com/contoso/Contoso/_apis/wit/workItems/2"
            })
        );
    }

    #[test]
    fn test_work_item_link_unknown_type() {
        let err = work_item_link(SERVER, "Contoso", 2, "bogus", None).unwrap_err();
        assert_eq!(err.to_string(), "Unknown link type: bogus");
    }

    #[test]
    fn test_parent_link_has_no_attributes() {
        let op = parent_link(SERVER, "Contoso", 1);
        assert_eq!(
            op.value.unwrap(),
            json!({
                "rel": "System.LinkTypes.Hierarchy-Reverse",
                "url": "https://dev.azure.com/contoso/Contoso/_apis/wit/workItems/1"
            })
        );
    }

    #[test]
    fn test_pull_request_link() {
        let op = pull_request_link("Contoso", "r1", 42);
        let value = op.value.unwrap();
        assert_eq!(value["rel"], "ArtifactLink");
        assert_eq!(value["url"], "vstfs:///Git/PullRequestId/Contoso%2Fr1%2F42");
        assert_eq!(value["attributes"]["name"], "Pull Request");
        assert_eq!(op.path, "/relations/-");
    }

    #[test]
    fn test_artifact_uri_branch_encodes_ref() {
        let components = ArtifactComponents {
            project_id: Some("p1".into()),
            repository_id: Some("r1".into()),
            branch_name: Some("feature/login".into()),
            ..Default::default()
        };
        assert_eq!(
            artifact_uri("Branch", &components).unwrap(),
            "vstfs:///Git/Ref/p1%2Fr1%2FGBfeature%2Flogin"
        );
    }

    #[test]
    fn test_artifact_uri_commit_and_build() {
        let components = ArtifactComponents {
            project_id: Some("p1".into()),
            repository_id: Some("r1".into()),
            commit_id: Some("abc123".into()),
            build_id: Some("99".into()),
            ..Default::default()
        };
        assert_eq!(
            artifact_uri("fixed in commit", &components).unwrap(),
            "vstfs:///Git/Commit/p1%2Fr1%2Fabc123"
        );
        assert_eq!(
            artifact_uri("Integrated in build", &components).unwrap(),
            "vstfs:///Build/Build/99"
        );
    }

    #[test]
    fn test_artifact_uri_names_missing_components() {
        let components = ArtifactComponents {
            pull_request_id: Some("42".into()),
            ..Default::default()
        };
        let err = artifact_uri("Pull Request", &components).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required parameters for 'Pull Request' link: projectId, repositoryId"
        );
    }

    #[test]
    fn test_artifact_uri_requires_explicit_uri_for_other_types() {
        let err = artifact_uri("Wiki", &ArtifactComponents::default()).unwrap_err();
        assert!(err.to_string().contains("explicit artifactUri"));

        let err = artifact_uri("Nope", &ArtifactComponents::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported artifact link type 'Nope'"));
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_uri_component("Fabrikam-Fiber_1.0"), "Fabrikam-Fiber_1.0");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    fn relation(rel: &str, url: &str) -> Relation {
        Relation::new(rel, url)
    }

    #[test]
    fn test_unlink_descending_order() {
        let relations = vec![
            relation("System.LinkTypes.Related", "http://test.com/1"),
            relation("System.LinkTypes.Hierarchy-Reverse", "http://test.com/9"),
            relation("System.LinkTypes.Related", "http://test.com/2"),
        ];
        let plan = plan_unlink(&relations, "related", None).unwrap();
        assert_eq!(
            plan.operations,
            vec![
                PatchOperation::remove("/relations/2"),
                PatchOperation::remove("/relations/0"),
            ]
        );
        assert_eq!(plan.removed.len(), 2);
        assert_eq!(plan.removed[0].target_url, "http://test.com/1");
    }

    #[test]
    fn test_unlink_filters_by_url() {
        let relations = vec![
            relation("System.LinkTypes.Related", "http://test.com/1"),
            relation("System.LinkTypes.Related", "http://test.com/2"),
        ];
        let plan = plan_unlink(&relations, "related", Some("http://test.com/2")).unwrap();
        assert_eq!(plan.operations, vec![PatchOperation::remove("/relations/1")]);
    }

    #[test]
    fn test_unlink_no_match() {
        let relations = vec![relation("System.LinkTypes.Hierarchy-Forward", "http://test.com/1")];
        let err = plan_unlink(&relations, "related", Some("http://test.com/2")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No matching relations found for link type 'related' and URL 'http://test.com/2'"
        );
        assert!(matches!(err, Error::NoMatchingRelation { .. }));
    }

    #[test]
    fn test_unlink_accepts_artifact_type() {
        let relations = vec![
            relation("ArtifactLink", "vstfs:///Build/Build/1").with_name("Build"),
            relation("System.LinkTypes.Related", "http://test.com/1"),
        ];
        let plan = plan_unlink(&relations, "artifact", None).unwrap();
        assert_eq!(plan.operations, vec![PatchOperation::remove("/relations/0")]);
    }

    #[test]
    fn test_relations_of_work_item() {
        let item = json!({
            "id": 1,
            "relations": [
                {"rel": "System.LinkTypes.Related", "url": "http://test.com/2", "attributes": {"isLocked": false}}
            ]
        });
        let relations = relations_of(&item).unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].attributes.extra["isLocked"], json!(false));

        assert!(relations_of(&json!({"id": 1})).unwrap().is_empty());
    }
}
