//! Work item tools end to end: tool arguments in, HTTP requests out.

mod common;

use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_link_work_items_sends_one_batch() {
    let server = MockServer::start();
    let related = format!("{}/Contoso/_apis/wit/workItems/2", server.base_url());
    let batch = server.mock(|when, then| {
        when.method(httpmock::Method::PATCH)
            .path("/Contoso/_apis/wit/$batch")
            .query_param("api-version", "5.0")
            .header("Authorization", common::AUTHORIZATION)
            .json_body(json!([{
                "method": "PATCH",
                "uri": "/_apis/wit/workitems/1?api-version=5.0",
                "headers": {"Content-Type": "application/json-patch+json"},
                "body": [{
                    "op": "add",
                    "path": "/relations/-",
                    "value": {
                        "rel": "System.LinkTypes.Related",
                        "url": related
                    }
                }]
            }]));
        then.status(200).json_body(json!({
            "count": 1,
            "value": [{"code": 200, "body": "{\"id\":1,\"rev\":4}"}]
        }));
    });

    let result = common::handler(&server)
        .execute(
            "wit_work_items_link",
            Some(json!({"project": "Contoso", "updates": [{"id": 1, "linkToId": 2}]})),
        )
        .await;

    batch.assert();
    assert_eq!(common::json(&result), json!([{"id": 1, "rev": 4}]));
}

#[tokio::test]
async fn test_batch_update_failure_is_aggregated() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::PATCH)
            .path("/Contoso/_apis/wit/$batch")
            .body_includes("\"op\":\"replace\"");
        then.status(200).json_body(json!({
            "count": 2,
            "value": [
                {"code": 200, "body": "{\"id\":1}"},
                {"code": 400, "body": "{\"message\":\"TF401320: Rule error\"}"}
            ]
        }));
    });

    let result = common::handler(&server)
        .execute(
            "wit_update_work_items_batch",
            Some(json!({
                "project": "Contoso",
                "updates": [
                    {"op": "replace", "id": 1, "path": "/fields/System.Title", "value": "A"},
                    {"op": "Replace", "id": 2, "path": "/fields/System.Title", "value": "B"}
                ]
            })),
        )
        .await;

    assert!(result.is_error());
    assert_eq!(
        result.first_text(),
        "Error updating work items in batch: API error: 400 - Batch request failed; \
         item 1 failed with status 400: TF401320: Rule error"
    );
}

#[tokio::test]
async fn test_child_work_items_stop_at_first_failure() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST)
            .path("/Contoso/_apis/wit/workitems/$Task")
            .header("Content-Type", "application/json-patch+json")
            .body_includes("\"First\"")
            .body_includes("System.LinkTypes.Hierarchy-Reverse");
        then.status(200).json_body(json!({"id": 201}));
    });
    let second = server.mock(|when, then| {
        when.method(POST)
            .path("/Contoso/_apis/wit/workitems/$Task")
            .body_includes("\"Second\"");
        then.status(500).body("boom");
    });

    let result = common::handler(&server)
        .execute(
            "wit_add_child_work_items",
            Some(json!({
                "project": "Contoso",
                "parentId": 100,
                "workItemType": "Task",
                "items": [{"title": "First"}, {"title": "Second"}, {"title": "Third"}]
            })),
        )
        .await;

    first.assert();
    second.assert();
    assert!(result.is_error());
    assert_eq!(
        result.first_text(),
        "Error creating child work items: API error: 500 - boom\n\
         Created 1 of 3 before the failure:\n[\n  {\n    \"id\": 201\n  }\n]"
    );
}

#[tokio::test]
async fn test_unlink_removes_matching_relations() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/Contoso/_apis/wit/workitems/7")
            .query_param("$expand", "Relations");
        then.status(200).json_body(json!({
            "id": 7,
            "relations": [
                {"rel": "System.LinkTypes.Related", "url": "https://x/_apis/wit/workItems/8", "attributes": {}},
                {"rel": "System.LinkTypes.Hierarchy-Forward", "url": "https://x/_apis/wit/workItems/9", "attributes": {}},
                {"rel": "System.LinkTypes.Related", "url": "https://x/_apis/wit/workItems/10", "attributes": {}}
            ]
        }));
    });
    let update = server.mock(|when, then| {
        when.method(httpmock::Method::PATCH)
            .path("/Contoso/_apis/wit/workitems/7")
            .json_body(json!([
                {"op": "remove", "path": "/relations/2"},
                {"op": "remove", "path": "/relations/0"}
            ]));
        then.status(200).json_body(json!({"id": 7, "rev": 12}));
    });

    let result = common::handler(&server)
        .execute(
            "wit_work_item_unlink",
            Some(json!({"project": "Contoso", "id": 7, "type": "related"})),
        )
        .await;

    update.assert();
    assert!(!result.is_error(), "{}", result.first_text());
    assert!(result
        .first_text()
        .starts_with("Removed 2 link(s) of type 'related':\n"));
}

#[tokio::test]
async fn test_unauthorized_is_reported_with_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Contoso/_apis/wit/workitems/3");
        then.status(401);
    });

    let result = common::handler(&server)
        .execute(
            "wit_get_work_item",
            Some(json!({"project": "Contoso", "id": 3})),
        )
        .await;

    assert!(result.is_error());
    assert_eq!(
        result.first_text(),
        "Error fetching work item 3: Authentication error: 401 - Unauthorized"
    );
}
