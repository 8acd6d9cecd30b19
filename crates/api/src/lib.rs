mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use haven_agents::{CompanionAgent, SubmitError, WallService, WALL_POST_TTL_SECONDS};
use haven_core::{CommunityGate, ResourceBundle, WallPost, WallStats};
use haven_observability::AppMetrics;
use haven_responder::Responder;
use haven_storage::WallStore;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rate_limit::RequestRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub chat: Arc<CompanionAgent<Responder>>,
    pub wall: Arc<WallService<WallStore>>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: RequestRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: haven_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    wall_available: bool,
    responder: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    crisis: bool,
    emergency: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<ResourceBundle>,
    degraded: bool,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct WallPostRequest {
    message: String,
    mood: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WallPostCreated {
    post: WallPost,
    expires_in_seconds: i64,
}

#[derive(Debug, Serialize)]
struct WallPostList {
    posts: Vec<WallPost>,
    count: usize,
}

/// Assembles the full application from the environment: wall store (memory by
/// default, SQLite when `HAVEN_DATABASE_URL` is set, disabled when that store
/// is unreachable), responder, limits, and origins.
pub async fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();

    let store = match env::var("HAVEN_DATABASE_URL") {
        Ok(database_url) => match WallStore::sqlite(&database_url).await {
            Ok(store) => store,
            Err(error) => {
                tracing::warn!(%error, "wall store unreachable, community features disabled");
                WallStore::disabled()
            }
        },
        Err(_) => WallStore::memory(),
    };

    let responder = Responder::from_env().context("failed to build text responder")?;
    let responder_timeout = Duration::from_secs(env_parse("HAVEN_RESPONDER_TIMEOUT_SECONDS", 12));

    let chat = Arc::new(
        CompanionAgent::new(Arc::new(responder), metrics.clone())
            .with_responder_timeout(responder_timeout),
    );
    let wall = Arc::new(WallService::new(
        CommunityGate::default(),
        Arc::new(store),
        metrics.clone(),
    ));

    let limiter = RequestRateLimiter::new(
        Duration::from_secs(env_parse("HAVEN_RATE_LIMIT_WINDOW_SECONDS", 900)),
        env_parse("HAVEN_RATE_LIMIT_MAX", 100),
    );

    let state = ApiState {
        chat,
        wall,
        metrics,
        limiter,
        allowed_origins: Arc::new(parse_allowed_origins()),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route(
            "/v1/wall/posts",
            get(wall_posts_list).post(wall_post_create),
        )
        .route("/v1/wall/stats", get(wall_stats))
        .route("/v1/wall/sweep", post(wall_sweep))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(privacy_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(16 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            wall_available: state.wall.is_available().await,
            responder: state.chat.responder_name(),
        },
    };

    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_message",
                "message": "Please provide a valid message"
            })),
        )
            .into_response();
    }

    let turn = state.chat.handle_turn(&message).await;

    (
        StatusCode::OK,
        Json(ChatResponse {
            response: turn.reply,
            crisis: turn.crisis,
            emergency: turn.emergency,
            resources: turn.resources,
            degraded: turn.degraded,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
        .into_response()
}

async fn wall_posts_list(State(state): State<ApiState>) -> impl IntoResponse {
    let posts = state.wall.list_posts().await;
    let count = posts.len();

    (StatusCode::OK, Json(WallPostList { posts, count }))
}

async fn wall_post_create(
    State(state): State<ApiState>,
    Json(request): Json<WallPostRequest>,
) -> impl IntoResponse {
    match state
        .wall
        .submit_post(&request.message, request.mood.as_deref())
        .await
    {
        Ok(post) => (
            StatusCode::CREATED,
            Json(WallPostCreated {
                post,
                expires_in_seconds: WALL_POST_TTL_SECONDS,
            }),
        )
            .into_response(),
        Err(SubmitError::EmptyMessage) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_message",
                "message": "Please provide a message to share"
            })),
        )
            .into_response(),
        Err(SubmitError::Rejected(decision)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "content_not_allowed",
                "reason": decision.reason,
                "suggestion": decision.suggestion
            })),
        )
            .into_response(),
        Err(SubmitError::Unavailable) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "service_unavailable",
                "message": "Community wall temporarily unavailable"
            })),
        )
            .into_response(),
        Err(SubmitError::SaveFailed) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "save_failed",
                "message": "Unable to save your post right now"
            })),
        )
            .into_response(),
    }
}

async fn wall_stats(State(state): State<ApiState>) -> Json<WallStats> {
    Json(state.wall.stats().await)
}

async fn wall_sweep(State(state): State<ApiState>) -> impl IntoResponse {
    let removed = state.wall.sweep().await;
    (StatusCode::OK, Json(serde_json::json!({ "removed": removed })))
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "Too many requests from this IP, please try again later."
            })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Applied to every response, including errors. Responses can carry
/// sensitive text and must never be cached by intermediaries.
async fn privacy_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

fn parse_allowed_origins() -> Vec<String> {
    env::var("HAVEN_ALLOWED_ORIGINS")
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ip_prefers_the_first_forwarded_hop() {
        let request = Request::builder()
            .uri("/v1/chat")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(request_ip(&request), "203.0.113.7");
    }

    #[test]
    fn request_ip_falls_back_to_local() {
        let request = Request::builder()
            .uri("/v1/chat")
            .body(Body::empty())
            .unwrap();

        assert_eq!(request_ip(&request), "local");
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        assert_eq!(env_parse("HAVEN_TEST_UNSET_VALUE", 42_u64), 42);
    }
}
