#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
};
use file_gateway::config::GatewayConfig;
use file_gateway::services::remote::{MemoryRemoteStorage, RemoteStorage};
use file_gateway::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TOKEN: &str = "test-token";
pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub struct TestApp {
    pub app: Router,
    pub remote: Arc<MemoryRemoteStorage>,
    pub config: GatewayConfig,
    _root: TempDir,
}

pub fn setup() -> TestApp {
    setup_with(|_| {})
}

pub fn setup_with(configure: impl FnOnce(&mut GatewayConfig)) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let mut config = GatewayConfig::development(TOKEN, root.path());
    configure(&mut config);

    std::fs::create_dir_all(&config.local_store_path).unwrap();
    std::fs::create_dir_all(&config.staging_path).unwrap();

    let remote = Arc::new(MemoryRemoteStorage::new());
    let remote_dyn: Arc<dyn RemoteStorage> = remote.clone();
    let app = create_app(AppState::new(config.clone(), remote_dyn));

    TestApp {
        app,
        remote,
        config,
        _root: root,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn upload(&self, filename: &str, content: &[u8]) -> (StatusCode, Value) {
        self.send_json(upload_request(filename, content)).await
    }

    pub fn local_path(&self, name: &str) -> std::path::PathBuf {
        self.config.local_store_path.join(name)
    }

    pub fn write_local(&self, name: &str, content: &[u8]) {
        std::fs::write(self.local_path(name), content).unwrap();
    }

    pub fn local_exists(&self, name: &str) -> bool {
        self.local_path(name).exists()
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(&self.config.staging_path).unwrap().count()
    }
}

pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("Authorization", format!("Bearer {}", TOKEN))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    multipart_request(multipart_body("file", filename, content))
}

pub fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}
