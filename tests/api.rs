//! HTTP tests driving the full router in-process.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::test_server::TestServer;

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::start();
    let resp = server.request(Method::GET, "/health", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_require_admin_token() {
    let server = TestServer::start();
    let (_id, user_token) = server.create_user("alice").await;

    let resp = server
        .request(Method::GET, "/api/v1/admin/users", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.headers.contains_key("www-authenticate"));

    let resp = server
        .request(Method::GET, "/api/v1/admin/users", Some(&user_token), None)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = server
        .request(
            Method::GET,
            "/api/v1/admin/users",
            Some(&server.admin_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_token_cannot_act_on_projects() {
    let server = TestServer::start();
    let resp = server
        .request(
            Method::GET,
            "/api/v1/projects",
            Some(&server.admin_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let server = TestServer::start();
    server.create_user("alice").await;

    let resp = server
        .request(
            Method::POST,
            "/api/v1/admin/users",
            Some(&server.admin_token),
            Some(json!({ "username": "alice" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.code(), "AlreadyExists");
}

#[tokio::test]
async fn project_read_carries_max_permission() {
    let server = TestServer::start();
    let (_alice, alice_token) = server.create_user("alice").await;
    let (bob, bob_token) = server.create_user("bob").await;

    let root = server.create_project(&alice_token, "Root", None).await;
    let child = server.create_project(&alice_token, "Child", Some(root)).await;

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{child}"),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.max_permission(), Some(2));
    assert_eq!(resp.body["data"]["max_permission"], 2);

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{child}"),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.code(), "Forbidden");

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{root}/users"),
            Some(&alice_token),
            Some(json!({ "user_id": bob, "permission": 1 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{child}"),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.max_permission(), Some(1));

    let resp = server
        .request(Method::GET, "/api/v1/projects", Some(&bob_token), None)
        .await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_project_is_404() {
    let server = TestServer::start();
    let (_id, token) = server.create_user("alice").await;

    let resp = server
        .request(Method::GET, "/api/v1/projects/4242", Some(&token), None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), "ProjectNotFound");
}

#[tokio::test]
async fn archive_cascade_over_http() {
    let server = TestServer::start();
    let (_id, token) = server.create_user("alice").await;

    let parent = server.create_project(&token, "Parent", None).await;
    let child = server.create_project(&token, "Child", Some(parent)).await;

    let resp = server
        .request(
            Method::PATCH,
            &format!("/api/v1/projects/{parent}"),
            Some(&token),
            Some(json!({ "is_archived": true })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);

    let resp = server
        .request(
            Method::POST,
            &format!("/api/v1/projects/{child}/tasks/check"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.code(), "ProjectIsArchived");

    let resp = server
        .request(
            Method::PATCH,
            &format!("/api/v1/projects/{child}"),
            Some(&token),
            Some(json!({ "is_archived": false })),
        )
        .await;
    assert_eq!(resp.code(), "ProjectIsArchived");

    let resp = server
        .request(
            Method::PATCH,
            &format!("/api/v1/projects/{parent}"),
            Some(&token),
            Some(json!({ "title": "Renamed", "is_archived": false })),
        )
        .await;
    assert_eq!(resp.code(), "ProjectIsArchived");

    let resp = server
        .request(
            Method::PATCH,
            &format!("/api/v1/projects/{parent}"),
            Some(&token),
            Some(json!({ "is_archived": false })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["is_archived"], false);

    let resp = server
        .request(
            Method::POST,
            &format!("/api/v1/projects/{child}/tasks/check"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["permission"], 2);
}

#[tokio::test]
async fn reparenting_into_descendant_is_rejected() {
    let server = TestServer::start();
    let (_id, token) = server.create_user("alice").await;

    let root = server.create_project(&token, "Root", None).await;
    let child = server.create_project(&token, "Child", Some(root)).await;

    let resp = server
        .request(
            Method::PATCH,
            &format!("/api/v1/projects/{root}"),
            Some(&token),
            Some(json!({ "parent_project_id": child })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "CyclicHierarchy");
}

#[tokio::test]
async fn team_grants_and_delete_rules() {
    let server = TestServer::start();
    let (_alice, alice_token) = server.create_user("alice").await;
    let (bob, bob_token) = server.create_user("bob").await;
    let project = server.create_project(&alice_token, "Shared", None).await;

    let resp = server
        .request(
            Method::POST,
            "/api/v1/admin/teams",
            Some(&server.admin_token),
            Some(json!({ "name": "Reviewers" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let team = resp.body["data"]["id"].as_i64().unwrap();

    let resp = server
        .request(
            Method::POST,
            &format!("/api/v1/admin/teams/{team}/members"),
            Some(&server.admin_token),
            Some(json!({ "user_id": bob })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{project}/teams"),
            Some(&alice_token),
            Some(json!({ "team_id": team, "permission": 1 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = server
        .request(
            Method::PATCH,
            &format!("/api/v1/projects/{project}"),
            Some(&bob_token),
            Some(json!({ "title": "Edited by bob" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.max_permission(), Some(1));

    let resp = server
        .request(
            Method::DELETE,
            &format!("/api/v1/projects/{project}"),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{project}/teams"),
            Some(&alice_token),
            Some(json!({ "team_id": team, "permission": 2 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.code(), "AlreadyHasAccess");

    let resp = server
        .request(
            Method::POST,
            &format!("/api/v1/projects/{project}/teams/{team}"),
            Some(&alice_token),
            Some(json!({ "permission": 2 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = server
        .request(
            Method::DELETE,
            &format!("/api/v1/projects/{project}"),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalid_permission_value_is_rejected() {
    let server = TestServer::start();
    let (_alice, alice_token) = server.create_user("alice").await;
    let (bob, _) = server.create_user("bob").await;
    let project = server.create_project(&alice_token, "Shared", None).await;

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{project}/users"),
            Some(&alice_token),
            Some(json!({ "user_id": bob, "permission": 7 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "InvalidPermission");

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{project}/shares"),
            Some(&alice_token),
            Some(json!({ "permission": -1, "sharing_type": 1 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "InvalidPermission");

    // Bodies serde cannot map still come back in the envelope.
    for body in [
        json!({ "permission": 0, "sharing_type": 5 }),
        json!({ "permission": "write", "sharing_type": 1 }),
    ] {
        let resp = server
            .request(
                Method::PUT,
                &format!("/api/v1/projects/{project}/shares"),
                Some(&alice_token),
                Some(body),
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.code(), "BadRequest");
        assert!(resp.body["error"].as_str().unwrap().contains("Invalid request body"));
    }

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{project}/users"),
            Some(&alice_token),
            None,
        )
        .await;
    assert!(resp.body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn link_share_round_trip() {
    let server = TestServer::start();
    let (_id, token) = server.create_user("alice").await;
    let project = server.create_project(&token, "Public board", None).await;
    let other = server.create_project(&token, "Private board", None).await;

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{project}/shares"),
            Some(&token),
            Some(json!({ "permission": 0, "sharing_type": 2, "password": "s3cret" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    let hash = resp.body["data"]["hash"].as_str().unwrap().to_string();
    let share_id = resp.body["data"]["share"]["id"].as_i64().unwrap();
    assert!(resp.body["data"]["share"].get("password_hash").is_none());
    assert_eq!(
        resp.body["data"]["url"],
        format!("https://tasks.example.com/share/{hash}/auth")
    );

    let auth_path = format!("/api/v1/shares/{hash}/auth");
    let resp = server
        .request(Method::POST, &auth_path, None, Some(json!({})))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.code(), "LinkSharePasswordRequired");

    let resp = server
        .request(
            Method::POST,
            &auth_path,
            None,
            Some(json!({ "password": "nope" })),
        )
        .await;
    assert_eq!(resp.code(), "LinkSharePasswordInvalid");

    let resp = server
        .request(
            Method::POST,
            &auth_path,
            None,
            Some(json!({ "password": "s3cret" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    assert_eq!(resp.body["data"]["user_id"], -share_id);
    assert_eq!(
        resp.body["data"]["display_name"],
        format!("link-share-{share_id}")
    );
    let guest_token = resp.body["data"]["token"].as_str().unwrap().to_string();

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{project}"),
            Some(&guest_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.max_permission(), Some(0));

    let resp = server
        .request(
            Method::POST,
            &format!("/api/v1/projects/{project}/tasks/check"),
            Some(&guest_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{other}"),
            Some(&guest_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{project}/shares"),
            Some(&guest_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = server
        .request(
            Method::DELETE,
            &format!("/api/v1/projects/{project}/shares/{share_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{project}"),
            Some(&guest_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_share_hash_is_404() {
    let server = TestServer::start();
    let resp = server
        .request(Method::POST, "/api/v1/shares/doesnotexist/auth", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), "LinkShareNotFound");
}

#[tokio::test]
async fn expired_share_token_is_rejected() {
    let server = TestServer::start_with_ttl(-1);
    let (_id, token) = server.create_user("alice").await;
    let project = server.create_project(&token, "Board", None).await;

    let resp = server
        .request(
            Method::PUT,
            &format!("/api/v1/projects/{project}/shares"),
            Some(&token),
            Some(json!({ "permission": 0, "sharing_type": 1 })),
        )
        .await;
    let hash = resp.body["data"]["hash"].as_str().unwrap().to_string();

    let resp = server
        .request(
            Method::POST,
            &format!("/api/v1/shares/{hash}/auth"),
            None,
            None,
        )
        .await;
    let guest_token = resp.body["data"]["token"].as_str().unwrap().to_string();

    let resp = server
        .request(
            Method::GET,
            &format!("/api/v1/projects/{project}"),
            Some(&guest_token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.code(), "TokenExpired");
}
