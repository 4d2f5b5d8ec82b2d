mod common;

use axum::http::{StatusCode, header};
use common::*;

#[tokio::test]
async fn test_download_returns_attachment() {
    let t = setup();
    assert_eq!(t.upload("report.pdf", b"0123456789").await.0, StatusCode::OK);

    let (status, headers, body) = t.send(authed("GET", "/api/download/report.pdf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), b"0123456789");
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(headers[header::CONTENT_LENGTH], "10");

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename=\"report.pdf\""));
}

#[tokio::test]
async fn test_download_unknown_extension_is_octet_stream() {
    let t = setup();
    t.write_local("blob.zzunknown", b"\x00\x01");

    let (status, headers, body) = t
        .send(authed("GET", "/api/download/blob.zzunknown"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), b"\x00\x01");
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
}

#[tokio::test]
async fn test_download_missing_file() {
    let t = setup();

    let (status, body) = t.send_json(authed("GET", "/api/download/nope.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_download_cannot_escape_store() {
    let t = setup();
    // Sits next to the store, not inside it
    std::fs::write(t.config.local_store_path.join("../secret.txt"), b"secret").unwrap();

    let (status, _) = t
        .send_json(authed("GET", "/api/download/..%2Fsecret.txt"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_does_not_touch_remote() {
    let t = setup();
    t.remote.insert("remote-only.txt", "x");

    let (status, _) = t
        .send_json(authed("GET", "/api/download/remote-only.txt"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(t.remote.list_calls(), 0);
}
