#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use foundry_match::auth::AccessDecision;
use foundry_match::host::{HostError, HostPlatform, USER_TOKEN_HEADER};
use foundry_match::store::MemoryProfileStore;
use foundry_match::types::AccessLevel;
use foundry_match::upload::{BlobStore, StoredBlob, UploadError};
use foundry_match::{app, AppConfig, AppState};

pub const EXPERIENCE: &str = "exp_1";
pub const COMPANY: &str = "biz_1";

pub const FOUNDER_TOKEN: &str = "token-founder";
pub const INVESTOR_TOKEN: &str = "token-investor";
pub const ADMIN_TOKEN: &str = "token-admin";
pub const OUTSIDER_TOKEN: &str = "token-outsider";

pub const FOUNDER: &str = "user_founder";
pub const INVESTOR: &str = "user_investor";
pub const ADMIN: &str = "user_admin";
pub const OUTSIDER: &str = "user_outsider";

/// Host platform stand-in with fixed tokens and access grants.
pub struct FakeHost {
    tokens: HashMap<&'static str, &'static str>,
    experience_access: HashMap<(&'static str, &'static str), AccessDecision>,
    company_access: HashMap<(&'static str, &'static str), AccessDecision>,
    pub down: AtomicBool,
    pub verify_calls: AtomicUsize,
    pub access_calls: AtomicUsize,
}

impl FakeHost {
    fn new() -> Self {
        let customer = AccessDecision::new(true, AccessLevel::Customer);
        let admin = AccessDecision::new(true, AccessLevel::Admin);

        Self {
            tokens: HashMap::from([
                (FOUNDER_TOKEN, FOUNDER),
                (INVESTOR_TOKEN, INVESTOR),
                (ADMIN_TOKEN, ADMIN),
                (OUTSIDER_TOKEN, OUTSIDER),
            ]),
            experience_access: HashMap::from([
                ((FOUNDER, EXPERIENCE), customer),
                ((INVESTOR, EXPERIENCE), customer),
                ((ADMIN, EXPERIENCE), admin),
            ]),
            company_access: HashMap::from([((ADMIN, COMPANY), admin), ((FOUNDER, COMPANY), customer)]),
            down: AtomicBool::new(false),
            verify_calls: AtomicUsize::new(0),
            access_calls: AtomicUsize::new(0),
        }
    }

    fn lookup(
        grants: &HashMap<(&'static str, &'static str), AccessDecision>,
        user_id: &str,
        id: &str,
    ) -> Result<AccessDecision, HostError> {
        grants
            .iter()
            .find(|((user, target), _)| *user == user_id && *target == id)
            .map(|(_, decision)| *decision)
            .ok_or(HostError::Denied)
    }
}

#[async_trait]
impl HostPlatform for FakeHost {
    async fn verify_user_token(&self, token: &str) -> Result<String, HostError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(HostError::Transport("connection refused".to_string()));
        }
        self.tokens
            .get(token)
            .map(|user| user.to_string())
            .ok_or_else(|| HostError::InvalidToken("unknown token".to_string()))
    }

    async fn check_experience_access(&self, user_id: &str, experience_id: &str) -> Result<AccessDecision, HostError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        Self::lookup(&self.experience_access, user_id, experience_id)
    }

    async fn check_company_access(&self, user_id: &str, company_id: &str) -> Result<AccessDecision, HostError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        Self::lookup(&self.company_access, user_id, company_id)
    }
}

/// Blob store stand-in that records every stored object.
#[derive(Default)]
pub struct FakeBlobs {
    pub puts: Mutex<Vec<(String, usize, String)>>,
    pub fail: AtomicBool,
}

impl FakeBlobs {
    pub fn count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<StoredBlob, UploadError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(UploadError::Failed("bucket unavailable".to_string()));
        }
        let mut puts = self.puts.lock().unwrap();
        puts.push((pathname.to_string(), body.len(), content_type.to_string()));
        Ok(StoredBlob {
            url: format!("https://blob.test/{}-{}", pathname, puts.len()),
            pathname: pathname.to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub host: Arc<FakeHost>,
    pub blobs: Arc<FakeBlobs>,
    pub store: Arc<MemoryProfileStore>,
}

pub fn test_app() -> TestApp {
    let mut config = AppConfig::development();
    config.host.api_key = "test-key".to_string();
    config.blob.credentials = "test-blob".to_string();
    config.database.url = "memory://".to_string();

    let host = Arc::new(FakeHost::new());
    let blobs = Arc::new(FakeBlobs::default());
    let store = Arc::new(MemoryProfileStore::new());
    let state = AppState::new(config, host.clone(), store.clone(), blobs.clone());

    TestApp {
        router: app(state),
        host,
        blobs,
        store,
    }
}

/// A decoded response.
pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub text: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Result<Reply> {
        let response: Response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(Reply {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<Reply> {
        self.send(request(Method::GET, uri, token).body(Body::empty())?).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &Value) -> Result<Reply> {
        self.json(Method::POST, uri, token, body).await
    }

    pub async fn patch_json(&self, uri: &str, token: Option<&str>, body: &Value) -> Result<Reply> {
        self.json(Method::PATCH, uri, token, body).await
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: &Value) -> Result<Reply> {
        let request = request(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body)?))?;
        self.send(request).await
    }

    pub async fn upload(&self, uri: &str, token: Option<&str>, filename: &str, content_type: &str, size: usize) -> Result<Reply> {
        let boundary = "foundry-test-boundary";
        let body = multipart_body(boundary, filename, content_type, &vec![b'%'; size]);
        let request = request(Method::POST, uri, token)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))?;
        self.send(request).await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(USER_TOKEN_HEADER, token),
        None => builder,
    }
}

pub fn multipart_body(boundary: &str, filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

pub fn text(len: usize) -> String {
    "p".repeat(len)
}

pub fn founder_data() -> Value {
    serde_json::json!({
        "startupName": "Acme Robotics",
        "industry": "Robotics",
        "stage": "mvp",
        "fundingAsk": { "min": 50000, "max": 250000 },
        "briefPitch": text(120),
        "website": "https://acme.example.com",
        "location": "Berlin"
    })
}

pub fn investor_data() -> Value {
    serde_json::json!({
        "sectors": ["fintech", "climate"],
        "stages": ["idea", "mvp"],
        "geography": ["EU"],
        "checkSize": { "min": 10000, "max": 100000 },
        "introNote": text(80)
    })
}

pub fn create_body(user_id: &str, role: &str, data: Value, is_complete: bool) -> Value {
    serde_json::json!({
        "userId": user_id,
        "experienceId": EXPERIENCE,
        "role": role,
        "data": data,
        "isComplete": is_complete
    })
}
