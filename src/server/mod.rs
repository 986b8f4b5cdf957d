//! HTTP service: Axum adapter over the analysis engine.
//!
//! Accepts player lists, runs an analysis per request against a shared
//! rate limiter, and exposes the latest run's progress.
//! CORS is permissive so a browser frontend on another origin can call it.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use routes::{AppState, ServerState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Serve until `shutdown` is cancelled.
pub async fn serve(state: AppState, port: u16, shutdown: CancellationToken) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!(port, "Server listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/api/progress", get(routes::get_progress))
        .route("/healthz", get(routes::health))
        .layer(middleware::from_fn(request_id))
        .layer(cors)
        .with_state(state)
}

/// Tag each request with a fresh id and log its outcome.
async fn request_id(req: Request, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut resp = next.run(req).await;

    info!(
        request_id = %id,
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analysis::AnalysisOptions;
    use crate::engine::executor::RetryPolicy;
    use crate::engine::limiter::RateLimiter;
    use crate::provider::{MockGameDataProvider, ProviderError};
    use crate::types::{Account, ChampionCatalog};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Every account resolves except "ghost"; "broken" has a rejected
    /// league lookup. Nobody has matches, ranks or mastery.
    fn provider() -> MockGameDataProvider {
        let mut mock = MockGameDataProvider::new();
        mock.expect_fetch_champion_catalog()
            .returning(|| Ok(ChampionCatalog::default()));
        mock.expect_resolve_account().returning(|name, tag| match name {
            "ghost" => Err(ProviderError::NotFound),
            _ => Ok(Account {
                puuid: name.to_string(),
                game_name: name.to_string(),
                tag_line: tag.to_string(),
            }),
        });
        mock.expect_list_recent_match_ids().returning(|_, _| Ok(vec![]));
        mock.expect_fetch_rank_entries().returning(|puuid| match puuid {
            "broken" => Err(ProviderError::Status { status: 403 }),
            _ => Ok(vec![]),
        });
        mock.expect_fetch_mastery_entries().returning(|_| Ok(vec![]));
        mock
    }

    fn test_state() -> AppState {
        Arc::new(ServerState::new(
            Arc::new(provider()),
            Arc::new(RateLimiter::default()),
            RetryPolicy::default(),
            AnalysisOptions::default(),
            None,
            CancellationToken::new(),
        ))
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_analyze_then_progress() {
        let state = test_state();
        let app = build_router(Arc::clone(&state));
        let resp = app
            .oneshot(analyze_request(
                r#"{ "players": [
                    { "gameName": "alpha", "tagLine": "JP1" },
                    { "gameName": "beta", "tagLine": "JP1" },
                    { "gameName": "ghost", "tagLine": "JP1" }
                ], "matchLimit": 3 }"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        assert_eq!(json["meta"]["playerCount"], 2);
        assert_eq!(json["meta"]["matchLimit"], 3);
        assert_eq!(json["notFound"][0]["gameName"], "ghost");
        assert_eq!(json["teams"]["teamA"]["members"].as_array().unwrap().len(), 1);

        let resp = build_router(state)
            .oneshot(Request::builder().uri("/api/progress").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["playersDone"], 3);
        assert_eq!(json["totalPlayers"], 3);
    }

    #[tokio::test]
    async fn test_analyze_too_few_players_is_bad_request() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(analyze_request(
                r#"{ "players": [{ "gameName": "alpha", "tagLine": "JP1" }] }"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("at least 2"));
    }

    #[tokio::test]
    async fn test_analyze_upstream_failure_is_bad_gateway() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(analyze_request(
                r#"{ "players": [
                    { "gameName": "alpha", "tagLine": "JP1" },
                    { "gameName": "broken", "tagLine": "JP1" }
                ] }"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("broken#JP1"));
    }

    #[tokio::test]
    async fn test_analyze_after_shutdown_is_unavailable() {
        let state = test_state();
        state.shutdown.cancel();
        let resp = build_router(state)
            .oneshot(analyze_request(
                r#"{ "players": [
                    { "gameName": "alpha", "tagLine": "JP1" },
                    { "gameName": "beta", "tagLine": "JP1" }
                ] }"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/analyze")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
