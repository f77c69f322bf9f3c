//! HTTP-level integration tests for the users API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p roster-server)
//!
//! The base URL is configurable via `ROSTER_BASE_URL`.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use roster_integration_tests::{api_base_url, unique_email};

/// Test helper: create a user via the API and return its JSON body.
async fn create_test_user(client: &Client, name: &str, email: &str) -> Value {
    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/users"))
        .json(&json!({ "name": name, "email": email }))
        .send()
        .await
        .expect("Failed to create test user");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to read response body")
}

/// Test helper: deactivate a test user via the API (cleanup).
async fn deactivate_test_user(client: &Client, id: i64) {
    let base_url = api_base_url();
    let _ = client
        .delete(format!("{base_url}/users/{id}"))
        .send()
        .await;
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_liveness() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach health endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_readiness_with_database_up() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach readiness endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// User CRUD Flow
// ============================================================================

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_user_crud_flow() {
    let client = Client::new();
    let base_url = api_base_url();
    let email = unique_email("http-crud");

    // Create
    let created = create_test_user(&client, "Crud Tester", &email).await;
    let id = created["id"].as_i64().expect("numeric id");
    assert_eq!(created["name"], "Crud Tester");
    assert_eq!(created["email"], Value::String(email.clone()));
    assert_eq!(created["status"], "active");

    // Fetch
    let fetched: Value = client
        .get(format!("{base_url}/users/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"], created["id"]);

    // Patch
    let resp = client
        .patch(format!("{base_url}/users/{id}"))
        .json(&json!({ "name": "Renamed Tester" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: Value = resp.json().await.unwrap();
    assert_eq!(patched["name"], "Renamed Tester");
    assert_eq!(patched["email"], created["email"]);

    // Soft delete
    let resp = client
        .delete(format!("{base_url}/users/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The record remains readable, just inactive.
    let after: Value = client
        .get(format!("{base_url}/users/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["status"], "inactive");
}

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_duplicate_email_is_conflict() {
    let client = Client::new();
    let base_url = api_base_url();
    let email = unique_email("http-dup");

    let created = create_test_user(&client, "Original", &email).await;
    let id = created["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{base_url}/users"))
        .json(&json!({ "name": "Copycat", "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "duplicate_key");

    deactivate_test_user(&client, id).await;
}

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_invalid_email_is_bad_request() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .post(format!("{base_url}/users"))
        .json(&json!({ "name": "ok", "email": "bad" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "validation_failed");
    assert_eq!(body["field"], "email");
}

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_missing_user_is_not_found() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/users/2147483646"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
#[ignore = "requires a running roster-server"]
async fn test_empty_patch_is_rejected() {
    let client = Client::new();
    let base_url = api_base_url();
    let email = unique_email("http-empty");

    let created = create_test_user(&client, "Untouched", &email).await;
    let id = created["id"].as_i64().unwrap();

    let resp = client
        .patch(format!("{base_url}/users/{id}"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    deactivate_test_user(&client, id).await;
}
