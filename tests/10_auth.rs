mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, StatusCode};
use common::*;

#[tokio::test]
async fn public_routes_need_no_token() -> Result<()> {
    let app = test_app();

    let res = app.get("/", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);

    let res = app.get("/health", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["status"], "ok");

    // Carve-outs skip the gate entirely; unknown webhook paths are plain 404s.
    let res = app.get("/api/webhooks/whop", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(app.host.verify_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthenticated() -> Result<()> {
    let app = test_app();

    let res = app.get("/api/auth/test?experienceId=exp_1", None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid or missing authentication token");
    assert_eq!(body["status"], 401);

    let res = app.get("/api/auth/test?experienceId=exp_1", Some("forged")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn experience_id_is_required() -> Result<()> {
    let app = test_app();

    let res = app.get("/api/auth/test", Some(FOUNDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "experienceId is required");
    assert_eq!(app.host.verify_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn auth_test_echoes_context() -> Result<()> {
    let app = test_app();

    let res = app.get("/api/auth/test?experienceId=exp_1", Some(FOUNDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::OK);
    let data = &res.json()["data"];
    assert_eq!(data["message"], "Authentication successful");
    assert_eq!(data["user"]["userId"], FOUNDER);
    assert_eq!(data["user"]["accessLevel"], "customer");
    assert_eq!(data["user"]["hasAccess"], true);
    assert_eq!(data["experienceId"], EXPERIENCE);
    assert!(data["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn users_without_access_are_forbidden() -> Result<()> {
    let app = test_app();

    let res = app.get("/api/auth/test?experienceId=exp_1", Some(OUTSIDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json()["error"], "Access denied to this experience");

    let res = app.get("/api/auth/test?experienceId=exp_other", Some(FOUNDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_probe() -> Result<()> {
    let app = test_app();

    let res = app.post_json("/api/auth/test?experienceId=exp_1", Some(ADMIN_TOKEN), &serde_json::json!({})).await?;
    assert_eq!(res.status, StatusCode::OK);
    let data = &res.json()["data"];
    assert_eq!(data["message"], "Admin authentication successful");
    assert_eq!(data["user"]["accessLevel"], "admin");

    let res = app.post_json("/api/auth/test?experienceId=exp_1", Some(FOUNDER_TOKEN), &serde_json::json!({})).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json()["error"], "Admin access required");
    Ok(())
}

#[tokio::test]
async fn company_probe_requires_company_admin() -> Result<()> {
    let app = test_app();

    let res = app.get("/api/auth/company?companyId=biz_1", Some(ADMIN_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::OK);
    let data = &res.json()["data"];
    assert_eq!(data["companyId"], COMPANY);
    assert_eq!(data["accessLevel"], "admin");

    let res = app.get("/api/auth/company?companyId=biz_1", Some(FOUNDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.get("/api/auth/company?companyId=biz_1", Some(INVESTOR_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.get("/api/auth/company", Some(ADMIN_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn verifier_outage_fails_every_guarded_path() -> Result<()> {
    let app = test_app();
    app.host.down.store(true, Ordering::SeqCst);

    let uris = [
        "/api/auth/test?experienceId=exp_1",
        "/api/profile/check?experienceId=exp_1",
        "/api/profile/user_founder?experienceId=exp_1",
        "/api/auth/company?companyId=biz_1",
    ];
    for uri in uris {
        let res = app.get(uri, Some(FOUNDER_TOKEN)).await?;
        assert_eq!(res.status, StatusCode::BAD_GATEWAY, "{}", uri);
        assert_eq!(res.json()["error"], "Identity service unavailable");
    }

    let res = app
        .post_json("/api/profile/create", Some(FOUNDER_TOKEN), &create_body(FOUNDER, "FOUNDER", founder_data(), true))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);

    let res = app.upload("/api/upload?experienceId=exp_1", Some(FOUNDER_TOKEN), "deck.pdf", "application/pdf", 16).await?;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);

    let res = app.get("/experiences/exp_1", Some(FOUNDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);

    // Nothing past identity ran.
    assert_eq!(app.host.access_calls.load(Ordering::SeqCst), 0);
    assert!(app.store.is_empty().await);
    assert_eq!(app.blobs.count(), 0);
    Ok(())
}

#[tokio::test]
async fn client_supplied_principal_headers_are_ignored() -> Result<()> {
    let app = test_app();

    let req = request(Method::GET, "/api/auth/test?experienceId=exp_1", Some(FOUNDER_TOKEN))
        .header("x-user-id", ADMIN)
        .header("x-access-level", "admin")
        .header("x-has-access", "true")
        .header("x-experience-id", "exp_other")
        .body(Body::empty())?;
    let res = app.send(req).await?;
    assert_eq!(res.status, StatusCode::OK);
    let data = &res.json()["data"];
    assert_eq!(data["user"]["userId"], FOUNDER);
    assert_eq!(data["user"]["accessLevel"], "customer");
    assert_eq!(data["experienceId"], EXPERIENCE);

    // Headers alone never authenticate.
    let req = request(Method::POST, "/api/auth/test?experienceId=exp_1", None)
        .header("x-user-id", ADMIN)
        .header("x-access-level", "admin")
        .header("x-has-access", "true")
        .body(Body::empty())?;
    let res = app.send(req).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // Nor do they reach pages.
    let req = request(Method::GET, "/experiences/exp_1/onboarding", None)
        .header("x-user-id", FOUNDER)
        .header("x-experience-id", EXPERIENCE)
        .header("x-access-level", "customer")
        .header("x-has-access", "true")
        .body(Body::empty())?;
    let res = app.send(req).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn page_failures_render_html() -> Result<()> {
    let app = test_app();

    let res = app.get("/experiences/exp_1/discovery", None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.header("content-type").unwrap_or_default().starts_with("text/html"));
    assert!(res.text.contains("Sign in required"));

    let res = app.get("/experiences/exp_1/discovery", Some(OUTSIDER_TOKEN)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.text.contains("Access denied"));
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_id() -> Result<()> {
    let app = test_app();

    let res = app.get("/health", None).await?;
    assert!(res.header("x-request-id").is_some());

    let req = request(Method::GET, "/health", None)
        .header("x-request-id", "req-123")
        .body(Body::empty())?;
    let res = app.send(req).await?;
    assert_eq!(res.header("x-request-id"), Some("req-123"));
    Ok(())
}
