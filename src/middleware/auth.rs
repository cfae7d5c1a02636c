use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde_json::Value;

use super::trusted;
use crate::auth::Requirement;
use crate::error::ApiError;
use crate::server::AppState;

/// Largest JSON body buffered while looking for `experienceId`.
const MAX_JSON_BODY: usize = 1024 * 1024;

const PUBLIC_PREFIXES: [&str; 5] = ["/_next", "/assets", "/static", "/api/webhooks", "/health"];
const PUBLIC_EXACT: [&str; 2] = ["/", "/favicon.ico"];

/// How a request path is guarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Public,
    /// JSON API; errors render as the failure envelope.
    Api,
    /// Company-scoped admin API, keyed by `companyId`.
    Company,
    /// Experience page; errors render as minimal HTML.
    Page { experience_id: Option<String> },
}

pub fn classify(path: &str) -> Guard {
    let under = |prefix: &str| path == prefix || path.starts_with(&format!("{}/", prefix));

    if PUBLIC_EXACT.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| under(p)) {
        return Guard::Public;
    }
    if under("/api/auth/company") {
        return Guard::Company;
    }
    if under("/api") {
        return Guard::Api;
    }
    if under("/experiences") {
        let experience_id = path
            .trim_start_matches("/experiences")
            .split('/')
            .find(|s| !s.is_empty())
            .map(str::to_string);
        return Guard::Page { experience_id };
    }
    Guard::Public
}

/// Authorization for every request: strips the reserved principal headers,
/// then runs the auth gate on guarded paths and forwards the verified
/// principal both as trusted headers and as an `AuthContext` extension.
pub async fn auth_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    trusted::strip(request.headers_mut());

    let guard = classify(request.uri().path());
    let result = match &guard {
        Guard::Public => return next.run(request).await,
        Guard::Page { experience_id } => match experience_id.clone() {
            Some(id) => authorize(&state, request, id).await,
            None => Err(ApiError::missing_experience_id()),
        },
        Guard::Api => match experience_id_for(request).await {
            Ok((request, Some(id))) => authorize(&state, request, id).await,
            Ok((_, None)) => Err(ApiError::missing_experience_id()),
            Err(e) => Err(e),
        },
        Guard::Company => authorize_company(&state, request).await,
    };

    match result {
        Ok(request) => next.run(request).await,
        Err(err) if matches!(guard, Guard::Page { .. }) => html_error(&err),
        Err(err) => err.into_response(),
    }
}

async fn authorize(state: &AppState, mut request: Request, experience_id: String) -> Result<Request, ApiError> {
    let span = tracing::Span::current();
    span.record("experience_id", experience_id.as_str());

    let ctx = state
        .gate
        .authorize(request.headers(), &experience_id, Requirement::Access)
        .await?;
    span.record("user_id", ctx.user_id.as_str());

    trusted::apply(request.headers_mut(), &ctx)?;
    request.extensions_mut().insert(ctx);
    Ok(request)
}

async fn authorize_company(state: &AppState, mut request: Request) -> Result<Request, ApiError> {
    let company_id = query_param(request.uri().query(), "companyId")
        .ok_or_else(|| ApiError::bad_request("companyId is required"))?;

    let ctx = state
        .gate
        .authorize_company(request.headers(), &company_id, Requirement::Access)
        .await?;
    tracing::Span::current().record("user_id", ctx.user_id.as_str());

    request.extensions_mut().insert(ctx);
    Ok(request)
}

/// Finds `experienceId` in the query string or, for JSON bodies, in the
/// top-level body object. A buffered body is put back on the request.
async fn experience_id_for(request: Request) -> Result<(Request, Option<String>), ApiError> {
    if let Some(id) = query_param(request.uri().query(), "experienceId") {
        return Ok((request, Some(id)));
    }
    if !carries_json(request.method(), request.headers()) {
        return Ok((request, None));
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_JSON_BODY)
        .await
        .map_err(|_| ApiError::bad_request("Request body too large"))?;

    let id = if bytes.is_empty() {
        None
    } else {
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::invalid_payload("Invalid JSON body", Some(Value::String(e.to_string())))
        })?;
        value
            .get("experienceId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), id))
}

fn carries_json(method: &Method, headers: &HeaderMap) -> bool {
    if matches!(*method, Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS) {
        return false;
    }
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Minimal page fallback; carries the same status as the API error.
fn html_error(err: &ApiError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let title = match status {
        StatusCode::UNAUTHORIZED => "Sign in required",
        StatusCode::FORBIDDEN => "Access denied",
        StatusCode::BAD_REQUEST => "Bad request",
        _ => "Something went wrong",
    };
    let body = format!(
        "<!doctype html><html><head><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{message}</p><p>Status {code}</p></body></html>",
        title = title,
        message = escape_html(err.message()),
        code = status.as_u16(),
    );
    (status, Html(body)).into_response()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_carve_outs() {
        for path in ["/", "/health", "/favicon.ico", "/assets/logo.png", "/api/webhooks", "/api/webhooks/whop", "/_next/static/x.js"] {
            assert_eq!(classify(path), Guard::Public, "{}", path);
        }
    }

    #[test]
    fn prefixes_respect_segment_boundaries() {
        assert_eq!(classify("/api/webhooksevil"), Guard::Api);
        assert_eq!(classify("/healthz"), Guard::Public);
        assert_eq!(classify("/experiencesX"), Guard::Public);
    }

    #[test]
    fn guarded_paths() {
        assert_eq!(classify("/api/profile/check"), Guard::Api);
        assert_eq!(classify("/api/upload"), Guard::Api);
        assert_eq!(classify("/api/auth/company"), Guard::Company);
        assert_eq!(
            classify("/experiences/exp_1/discovery"),
            Guard::Page { experience_id: Some("exp_1".to_string()) }
        );
        assert_eq!(classify("/experiences/"), Guard::Page { experience_id: None });
    }

    #[test]
    fn query_params_are_decoded() {
        assert_eq!(query_param(Some("experienceId=exp%5F1&x=1"), "experienceId"), Some("exp_1".to_string()));
        assert_eq!(query_param(Some("experienceId="), "experienceId"), None);
        assert_eq!(query_param(None, "experienceId"), None);
    }

    #[test]
    fn only_json_writes_are_buffered() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(carries_json(&Method::POST, &headers));
        assert!(!carries_json(&Method::GET, &headers));

        headers.insert(header::CONTENT_TYPE, "multipart/form-data; boundary=x".parse().unwrap());
        assert!(!carries_json(&Method::POST, &headers));
    }

    #[tokio::test]
    async fn html_errors_escape_messages() {
        let response = html_error(&ApiError::forbidden("<script>alert(1)</script>"));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!body.contains("<script>"));
    }
}
