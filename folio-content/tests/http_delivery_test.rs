//! Integration tests for the content HTTP surface.
//!
//! These drive the full router in-process: seeded or uploaded content is
//! encrypted on disk and read back through range-aware delivery.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use folio_content::application_service::content_service::ContentCatalog;
use folio_content::config::ContentServerConfig;
use folio_content::domain::content_id::ContentId;
use folio_content::domain::metadata::{encrypted_file_name, ContentMetadata};
use folio_content::infrastructure::catalog::InMemoryContentCatalog;
use folio_content::infrastructure::ingest::IngestEncoder;
use folio_content::presentation::{create_router, AppState};
use folio_content::{ContentCipher, SecretKey};

const HELLO: &[u8] = b"Hello, World!";

struct TestServer {
    router: Router,
    catalog: InMemoryContentCatalog,
    cipher: ContentCipher,
    config: ContentServerConfig,
    _temp_dir: TempDir,
}

fn test_cipher() -> ContentCipher {
    ContentCipher::new(SecretKey::from_bytes([0x5a; 32]))
}

fn create_test_server(max_upload_bytes: u64) -> TestServer {
    let temp_dir = TempDir::new().unwrap();
    let config = ContentServerConfig {
        content_dir: temp_dir.path().join("content"),
        upload_dir: temp_dir.path().join("uploads"),
        max_upload_bytes,
        read_chunk_size: 4,
    };
    config.prepare_dirs().unwrap();

    let cipher = test_cipher();
    let catalog = InMemoryContentCatalog::default();
    let state = Arc::new(AppState::new(
        cipher.clone(),
        catalog.clone(),
        config.clone(),
    ));

    TestServer {
        router: create_router(state),
        catalog,
        cipher,
        config,
        _temp_dir: temp_dir,
    }
}

impl TestServer {
    /// Encrypts `plaintext` to disk and records it in the catalog.
    async fn seed(&self, id: &str, name: &str, plaintext: &[u8], declared_size: u64) -> PathBuf {
        let dir = self.config.content_dir.join(id);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join(encrypted_file_name(name));

        IngestEncoder::new(self.cipher.clone())
            .encode(plaintext, &path)
            .await
            .unwrap();

        self.record(id, name, path.clone(), declared_size);
        path
    }

    fn record(&self, id: &str, name: &str, path: PathBuf, declared_size: u64) {
        let metadata = ContentMetadata::new(
            ContentId::new(id.to_string()),
            name.to_string(),
            path,
            "text/plain".to_string(),
            declared_size,
        );
        self.catalog.save(&metadata).unwrap();
    }

    async fn get(&self, id: &str, range: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(format!("/contents/{id}"));
        if let Some(range) = range {
            builder = builder.header(header::RANGE, range);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn upload(&self, name: &str, body: &'static [u8]) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/contents?name={name}"))
            .body(Body::from(body))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).map(|v| v.to_str().unwrap())
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_full_content_without_range() {
    let server = create_test_server(1024);
    server.seed("hello", "hello.txt", HELLO, 13).await;

    let response = server.get("hello", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("13"));
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("text/plain"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"hello.txt\"")
    );
    assert_eq!(body_bytes(response).await, HELLO);
}

#[tokio::test]
async fn test_leading_range() {
    let server = create_test_server(1024);
    server.seed("hello", "hello.txt", HELLO, 13).await;

    let response = server.get("hello", Some("bytes=0-4")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 0-4/13"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("5"));
    assert_eq!(body_bytes(response).await, b"Hello");
}

#[tokio::test]
async fn test_open_ended_range() {
    let server = create_test_server(1024);
    server.seed("hello", "hello.txt", HELLO, 13).await;

    let response = server.get("hello", Some("bytes=10-")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 10-12/13"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("3"));
    assert_eq!(body_bytes(response).await, &HELLO[10..]);
}

#[tokio::test]
async fn test_range_end_past_size_is_clamped() {
    let server = create_test_server(1024);
    server.seed("hello", "hello.txt", HELLO, 13).await;

    let response = server.get("hello", Some("bytes=7-100")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 7-12/13"));
    assert_eq!(body_bytes(response).await, b"World!");
}

#[tokio::test]
async fn test_unsatisfiable_range() {
    let server = create_test_server(1024);
    server.seed("hello", "hello.txt", HELLO, 13).await;

    let response = server.get("hello", Some("bytes=20-30")).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes */13"));
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_malformed_ranges_are_rejected() {
    let server = create_test_server(1024);
    server.seed("hello", "hello.txt", HELLO, 13).await;

    for range in ["bytes=-5", "bytes=0-1,3-4", "items=0-4", "bytes=5-2"] {
        let response = server.get("hello", Some(range)).await;
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "range {range:?}"
        );
        assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes */13"));
    }
}

#[tokio::test]
async fn test_undeclared_size_is_measured_from_file() {
    let server = create_test_server(1024);
    server.seed("legacy", "legacy.txt", HELLO, 0).await;

    let response = server.get("legacy", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("13"));
    assert_eq!(body_bytes(response).await, HELLO);

    let response = server.get("legacy", Some("bytes=0-")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 0-12/13"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("13"));
    assert_eq!(body_bytes(response).await, HELLO);

    let response = server.get("legacy", Some("bytes=13-15")).await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes */13"));
}

#[tokio::test]
async fn test_empty_content_range_is_unsatisfiable() {
    let server = create_test_server(1024);
    server.seed("empty", "empty.txt", b"", 0).await;

    let response = server.get("empty", Some("bytes=0-")).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes */0"));
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_empty_upload_then_download() {
    let server = create_test_server(1024);

    let response = server.upload("e.txt", b"").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(created["original_size"], 0);
    let content_id = created["content_id"].as_str().unwrap().to_string();

    let response = server.get(&content_id, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("0"));
    assert!(body_bytes(response).await.is_empty());

    let response = server.get(&content_id, Some("bytes=0-")).await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes */0"));
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_unknown_content_is_not_found() {
    let server = create_test_server(1024);

    let response = server.get("missing", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "Content file not found");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let server = create_test_server(1024);
    let path = server.seed("gone", "gone.txt", HELLO, 13).await;
    tokio::fs::remove_file(&path).await.unwrap();

    let response = server.get("gone", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "File not found on server");
}

#[tokio::test]
async fn test_file_shorter_than_iv_is_server_error() {
    let server = create_test_server(1024);
    let dir = server.config.content_dir.join("short");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join(encrypted_file_name("short.txt"));
    tokio::fs::write(&path, b"12345").await.unwrap();
    server.record("short", "short.txt", path, 13);

    let response = server.get("short", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "Error streaming file");
}

#[tokio::test]
async fn test_upload_then_download() {
    let server = create_test_server(1024);

    let response = server.upload("notes.txt", b"uploaded through http").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(created["name"], "notes.txt");
    assert_eq!(created["mime_type"], "text/plain");
    assert_eq!(created["original_size"], 21);

    let content_id = created["content_id"].as_str().unwrap().to_string();
    let stored = server
        .config
        .content_dir
        .join(&content_id)
        .join("notes.txt.encrypted");
    let on_disk = tokio::fs::read(&stored).await.unwrap();
    assert_eq!(on_disk.len(), 16 + 32);

    let response = server.get(&content_id, Some("bytes=9-15")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 9-15/21"));
    assert_eq!(body_bytes(response).await, b"through");

    let mut uploads = tokio::fs::read_dir(&server.config.upload_dir).await.unwrap();
    assert!(uploads.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let server = create_test_server(8);

    let response = server.upload("big.txt", HELLO).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let mut uploads = tokio::fs::read_dir(&server.config.upload_dir).await.unwrap();
    assert!(uploads.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_with_invalid_name_is_bad_request() {
    let server = create_test_server(1024);

    let response = server.upload("%2F", HELLO).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let server = create_test_server(1024);

    let response = server
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}
