mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use common::*;

const UPLOAD: &str = "/api/upload?experienceId=exp_1";
const TEN_MIB: usize = 10 * 1024 * 1024;

#[tokio::test]
async fn pdf_is_stored() -> Result<()> {
    let app = test_app();

    let res = app.upload(UPLOAD, Some(FOUNDER_TOKEN), "Acme Deck.pdf", "application/pdf", 2048).await?;
    assert_eq!(res.status, StatusCode::OK);
    let data = &res.json()["data"];
    assert_eq!(data["message"], "File uploaded successfully");
    assert_eq!(data["filename"], "Acme Deck.pdf");
    assert_eq!(data["size"], 2048);
    assert_eq!(data["type"], "application/pdf");
    assert!(data["url"].as_str().unwrap_or_default().starts_with("https://"));

    let puts = app.blobs.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "pitch-decks/exp_1/Acme-Deck.pdf");
    assert_eq!(puts[0].1, 2048);
    Ok(())
}

#[tokio::test]
async fn slide_decks_are_allowed() -> Result<()> {
    let app = test_app();

    let pptx = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
    let res = app.upload(UPLOAD, Some(INVESTOR_TOKEN), "deck.pptx", pptx, 64).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.upload(UPLOAD, Some(INVESTOR_TOKEN), "deck.ppt", "application/vnd.ms-powerpoint", 64).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.blobs.count(), 2);
    Ok(())
}

#[tokio::test]
async fn other_types_never_reach_the_blob_store() -> Result<()> {
    let app = test_app();

    let res = app.upload(UPLOAD, Some(FOUNDER_TOKEN), "notes.txt", "text/plain", 128).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid file type. Only PDF, PPT, and PPTX files are allowed.");
    assert_eq!(app.blobs.count(), 0);
    Ok(())
}

#[tokio::test]
async fn size_cap_is_inclusive() -> Result<()> {
    let app = test_app();

    let res = app.upload(UPLOAD, Some(FOUNDER_TOKEN), "deck.pdf", "application/pdf", TEN_MIB).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["size"], TEN_MIB);

    let res = app.upload(UPLOAD, Some(FOUNDER_TOKEN), "deck.pdf", "application/pdf", TEN_MIB + 1).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "File too large. Maximum size is 10MB.");
    assert_eq!(app.blobs.count(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_file_field() -> Result<()> {
    let app = test_app();

    let boundary = "foundry-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let req = request(Method::POST, UPLOAD, Some(FOUNDER_TOKEN))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))?;
    let res = app.send(req).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "No file provided");
    Ok(())
}

#[tokio::test]
async fn non_multipart_body_is_rejected() -> Result<()> {
    let app = test_app();

    let res = app.post_json(UPLOAD, Some(FOUNDER_TOKEN), &serde_json::json!({ "file": "x" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.blobs.count(), 0);
    Ok(())
}

#[tokio::test]
async fn blob_failure_is_bad_gateway() -> Result<()> {
    let app = test_app();
    app.blobs.fail.store(true, Ordering::SeqCst);

    let res = app.upload(UPLOAD, Some(FOUNDER_TOKEN), "deck.pdf", "application/pdf", 512).await?;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert_eq!(res.json()["error"], "Failed to upload file. Please try again.");
    Ok(())
}

#[tokio::test]
async fn upload_is_gated() -> Result<()> {
    let app = test_app();

    let res = app.upload("/api/upload", Some(FOUNDER_TOKEN), "deck.pdf", "application/pdf", 512).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "experienceId is required");

    let res = app.upload(UPLOAD, None, "deck.pdf", "application/pdf", 512).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.upload(UPLOAD, Some(OUTSIDER_TOKEN), "deck.pdf", "application/pdf", 512).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(app.blobs.count(), 0);
    Ok(())
}
