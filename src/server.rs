use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    handler::Handler,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::AuthGate;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::host::{HostPlatform, USER_TOKEN_HEADER};
use crate::middleware::{auth_gate_middleware, require_admin};
use crate::profile::ProfileService;
use crate::store::ProfileStore;
use crate::upload::{BlobStore, UploadBroker};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Room for multipart boundaries and part headers on top of the file cap.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Process-wide collaborators, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gate: AuthGate,
    pub profiles: ProfileService,
    pub uploads: UploadBroker,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        host: Arc<dyn HostPlatform>,
        store: Arc<dyn ProfileStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            gate: AuthGate::new(host),
            profiles: ProfileService::new(store),
            uploads: UploadBroker::new(config.clone(), blobs),
            config,
        }
    }
}

/// Full application router with the global middleware stack.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes + MULTIPART_OVERHEAD;
    let cors = cors_layer(&state.config);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes())
        .merge(auth_routes())
        .merge(profile_routes())
        .merge(upload_routes())
        .merge(page_routes())
        .fallback(fallback)
        // Innermost first: the gate sees every request inside the trace span.
        .layer(from_fn_with_state(state.clone(), auth_gate_middleware))
        .layer(CatchPanicLayer::custom(catch_panic))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route(
            "/api/auth/test",
            get(auth::auth_test_get).post(auth::auth_test_post.layer(from_fn(require_admin))),
        )
        .route(
            "/api/auth/company",
            get(auth::company_access.layer(from_fn(require_admin))),
        )
}

fn profile_routes() -> Router<AppState> {
    use handlers::profile;

    Router::new()
        .route("/api/profile/check", get(profile::profile_check))
        .route("/api/profile/create", post(profile::profile_create))
        .route(
            "/api/profile/:user_id",
            get(profile::profile_get).patch(profile::profile_update),
        )
}

fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/upload", post(handlers::upload::upload_post))
}

fn page_routes() -> Router<AppState> {
    use handlers::pages;

    Router::new()
        .route("/experiences/:experience_id", get(pages::landing))
        .route("/experiences/:experience_id/onboarding", get(pages::onboarding))
        .route("/experiences/:experience_id/profile/create", get(pages::profile_create))
        .route("/experiences/:experience_id/discovery", get(pages::discovery))
}

async fn fallback() -> ApiError {
    ApiError::not_found("Not found")
}

fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        request_id,
        method = %request.method(),
        path = %request.uri().path(),
        user_id = tracing::field::Empty,
        experience_id = tracing::field::Empty,
    )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_TOKEN_HEADER),
        ])
}

/// Turns a handler panic into the generic `Internal` envelope.
fn catch_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    if let Some(panic) = err.downcast_ref::<String>() {
        tracing::error!("Handler panicked: {}", panic);
    } else if let Some(panic) = err.downcast_ref::<&str>() {
        tracing::error!("Handler panicked: {}", panic);
    } else {
        tracing::error!("Handler panicked with a non-string payload");
    }
    ApiError::internal().into_response()
}
