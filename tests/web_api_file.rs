//! Web API File Tests
//!
//! Integration tests for the file management endpoints.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use filedepot::web::handlers::AppState;
use filedepot::web::router::{create_health_router, create_router};
use filedepot::{Database, FileStorage};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const OWNER_ID_HEADER: &str = "x-owner-id";

/// Create a test server with an in-memory database and temp blob storage.
async fn create_test_server() -> (TestServer, Arc<Database>, TempDir) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let shared_db = Arc::new(db);

    let temp_dir = TempDir::new().expect("Failed to create temp storage dir");
    let storage = FileStorage::new(temp_dir.path()).expect("Failed to create storage");

    let app_state = Arc::new(AppState::new(shared_db.clone(), storage, 10 * 1024 * 1024));

    let router = create_router(app_state, &[]).merge(create_health_router());

    let server = TestServer::new(router).expect("Failed to create test server");

    (server, shared_db, temp_dir)
}

/// Provision a user through the API and return their id.
async fn provision_user(server: &TestServer, username: &str) -> i64 {
    let response = server
        .post("/api/users")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com")
        }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

fn owner_header() -> HeaderName {
    HeaderName::from_static(OWNER_ID_HEADER)
}

fn owner_value(id: impl std::fmt::Display) -> HeaderValue {
    HeaderValue::from_str(&id.to_string()).unwrap()
}

/// Build a multipart upload form.
fn upload_form(filename: &str, content: &[u8], replace: bool) -> MultipartForm {
    let mut form =
        MultipartForm::new().add_part("file", Part::bytes(content.to_vec()).file_name(filename.to_string()));
    if replace {
        form = form.add_text("replace_existing", "true");
    }
    form
}

// ============================================================================
// Identity Tests
// ============================================================================

#[tokio::test]
async fn test_missing_owner_header_unauthorized() {
    let (server, _db, _tmp) = create_test_server().await;

    let response = server.get("/api/files").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_owner_unauthorized() {
    let (server, _db, _tmp) = create_test_server().await;

    let response = server
        .get("/api/files")
        .add_header(owner_header(), owner_value("9999"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_numeric_owner_unauthorized() {
    let (server, _db, _tmp) = create_test_server().await;

    let response = server
        .get("/api/files")
        .add_header(owner_header(), owner_value("not-a-number"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_requires_no_identity() {
    let (server, _db, _tmp) = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

// ============================================================================
// User Account Tests
// ============================================================================

#[tokio::test]
async fn test_create_user_and_me() {
    let (server, _db, _tmp) = create_test_server().await;

    let user_id = provision_user(&server, "alice").await;

    let response = server
        .get("/api/users/me")
        .add_header(owner_header(), owner_value(user_id))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_create_user_invalid_email() {
    let (server, _db, _tmp) = create_test_server().await;

    let response = server
        .post("/api/users")
        .json(&json!({
            "username": "alice",
            "email": "not-an-email"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_user_duplicate_username() {
    let (server, _db, _tmp) = create_test_server().await;

    provision_user(&server, "alice").await;

    let response = server
        .post("/api/users")
        .json(&json!({
            "username": "alice",
            "email": "other@example.com"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_me_email_taken() {
    let (server, _db, _tmp) = create_test_server().await;

    provision_user(&server, "alice").await;
    let bob = provision_user(&server, "bob").await;

    let response = server
        .put("/api/users/me")
        .add_header(owner_header(), owner_value(bob))
        .json(&json!({ "email": "alice@example.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_me_phone_number() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let response = server
        .put("/api/users/me")
        .add_header(owner_header(), owner_value(alice))
        .json(&json!({ "phone_number": "555-0100" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["phone_number"], "555-0100");
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_success() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let response = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("report.pdf", b"pdf bytes", false))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["filename"], "report.pdf");
    assert_eq!(body["data"]["file_type"], "pdf");
    assert_eq!(body["data"]["size"], 9);
    assert_eq!(body["data"]["owner_id"], alice);
    // The storage key stays internal
    assert!(body["data"].get("storage_key").is_none());
}

#[tokio::test]
async fn test_upload_requires_identity() {
    let (server, _db, _tmp) = create_test_server().await;

    let response = server
        .post("/api/upload")
        .multipart(upload_form("report.pdf", b"data", false))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_duplicate_conflict() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("a.pdf", b"one", false))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("a.pdf", b"two", false))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    // First record unchanged
    let list = server
        .get("/api/files")
        .add_header(owner_header(), owner_value(alice))
        .await;
    let body: Value = list.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["size"], 3);
}

#[tokio::test]
async fn test_upload_replace() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let first = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("a.pdf", b"old content", false))
        .await;
    first.assert_status_ok();

    let response = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("a.pdf", b"new", true))
        .await;
    response.assert_status_ok();
    let new_id = response.json::<Value>()["data"]["id"].as_i64().unwrap();

    // Exactly one record for the pair, and its content is the new blob
    let list = server
        .get("/api/files")
        .add_header(owner_header(), owner_value(alice))
        .await;
    let body: Value = list.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], new_id);

    let download = server
        .get(&format!("/api/files/{new_id}/download"))
        .add_header(owner_header(), owner_value(alice))
        .await;
    download.assert_status_ok();
    assert_eq!(download.as_bytes().to_vec(), b"new".to_vec());
}

#[tokio::test]
async fn test_upload_unsupported_type() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let response = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("image.xyz", b"data", false))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    // No record created
    let list = server
        .get("/api/files")
        .add_header(owner_header(), owner_value(alice))
        .await;
    assert_eq!(list.json::<Value>()["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_upload_classifies_extensions() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    for (filename, expected) in [
        ("a.pdf", "pdf"),
        ("b.xlsx", "excel"),
        ("c.XLS", "excel"),
        ("d.txt", "txt"),
        ("e.doc", "word"),
        ("f.DOCX", "word"),
    ] {
        let response = server
            .post("/api/upload")
            .add_header(owner_header(), owner_value(alice))
            .multipart(upload_form(filename, b"data", false))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["file_type"], expected);
    }
}

// ============================================================================
// List and Download Tests
// ============================================================================

#[tokio::test]
async fn test_list_files_scoped_to_owner() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;
    let bob = provision_user(&server, "bob").await;

    server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("alice.txt", b"a", false))
        .await
        .assert_status_ok();
    server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(bob))
        .multipart(upload_form("bob.txt", b"b", false))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/files")
        .add_header(owner_header(), owner_value(alice))
        .await;

    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "alice.txt");
}

#[tokio::test]
async fn test_download_success() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let upload = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("notes.txt", b"hello world", false))
        .await;
    let file_id = upload.json::<Value>()["data"]["id"].as_i64().unwrap();

    let response = server
        .get(&format!("/api/files/{file_id}/download"))
        .add_header(owner_header(), owner_value(alice))
        .await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().to_vec(), b"hello world".to_vec());

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("notes.txt"));

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_download_not_found() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let response = server
        .get("/api/files/9999/download")
        .add_header(owner_header(), owner_value(alice))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_cross_owner_identical_not_found() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;
    let bob = provision_user(&server, "bob").await;

    let upload = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("secret.pdf", b"data", false))
        .await;
    let file_id = upload.json::<Value>()["data"]["id"].as_i64().unwrap();

    // Foreign file and absent file must be indistinguishable
    let foreign = server
        .get(&format!("/api/files/{file_id}/download"))
        .add_header(owner_header(), owner_value(bob))
        .await;
    let absent = server
        .get("/api/files/424242/download")
        .add_header(owner_header(), owner_value(bob))
        .await;

    foreign.assert_status(StatusCode::NOT_FOUND);
    absent.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(foreign.json::<Value>(), absent.json::<Value>());
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_then_download_not_found() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let upload = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("gone.txt", b"data", false))
        .await;
    let file_id = upload.json::<Value>()["data"]["id"].as_i64().unwrap();

    let response = server
        .delete(&format!("/api/files/{file_id}"))
        .add_header(owner_header(), owner_value(alice))
        .await;
    response.assert_status_ok();

    let download = server
        .get(&format!("/api/files/{file_id}/download"))
        .add_header(owner_header(), owner_value(alice))
        .await;
    download.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_cross_owner_not_found() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;
    let bob = provision_user(&server, "bob").await;

    let upload = server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("mine.txt", b"data", false))
        .await;
    let file_id = upload.json::<Value>()["data"]["id"].as_i64().unwrap();

    let response = server
        .delete(&format!("/api/files/{file_id}"))
        .add_header(owner_header(), owner_value(bob))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Alice's file is untouched
    let list = server
        .get("/api/files")
        .add_header(owner_header(), owner_value(alice))
        .await;
    assert_eq!(list.json::<Value>()["data"].as_array().unwrap().len(), 1);
}

// ============================================================================
// Dashboard Tests
// ============================================================================

#[tokio::test]
async fn test_dashboard_stats() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;
    let bob = provision_user(&server, "bob").await;

    server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(alice))
        .multipart(upload_form("report.pdf", b"1", false))
        .await
        .assert_status_ok();
    server
        .post("/api/upload")
        .add_header(owner_header(), owner_value(bob))
        .multipart(upload_form("notes.txt", b"2", false))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/dashboard/stats")
        .add_header(owner_header(), owner_value(alice))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total_files"], 2);
    assert_eq!(body["data"]["file_type_breakdown"]["pdf"], 1);
    assert_eq!(body["data"]["file_type_breakdown"]["excel"], 0);
    assert_eq!(body["data"]["file_type_breakdown"]["txt"], 1);
    assert_eq!(body["data"]["file_type_breakdown"]["word"], 0);
    assert_eq!(body["data"]["files_per_user"]["alice"], 1);
    assert_eq!(body["data"]["files_per_user"]["bob"], 1);
}

#[tokio::test]
async fn test_dashboard_stats_empty() {
    let (server, _db, _tmp) = create_test_server().await;

    let alice = provision_user(&server, "alice").await;

    let response = server
        .get("/api/dashboard/stats")
        .add_header(owner_header(), owner_value(alice))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total_files"], 0);
    // All four kinds are always present
    assert_eq!(body["data"]["file_type_breakdown"]["pdf"], 0);
    assert_eq!(body["data"]["file_type_breakdown"]["excel"], 0);
    assert_eq!(body["data"]["file_type_breakdown"]["txt"], 0);
    assert_eq!(body["data"]["file_type_breakdown"]["word"], 0);
    assert_eq!(body["data"]["files_per_user"]["alice"], 0);
}
