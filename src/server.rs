//! HTTP boundary.
//!
//! ```text
//! POST /generate-diagram   outline text   → 200 text/plain description
//! POST /generate-pdf       description    → 200 application/pdf attachment
//! GET  /health                            → 200 "ok"
//! ```
//!
//! Error bodies are JSON objects with an `error` field; PDF failures add a
//! `details` field. Client errors are 400, everything else 500.
//!
//! `/generate-pdf` takes its body verbatim. On `/generate-diagram` with
//! `Content-Type: application/json`, a JSON string literal is unwrapped, so
//! `"1. Plan"` arrives as `1. Plan` without the quotes. Any other valid JSON
//! value is re-serialised compactly. Invalid JSON and other content types
//! are used verbatim. Send `text/plain` to keep the quotes.
//!
//! Each PDF request owns a browser for its duration. A semaphore caps how
//! many run at once; excess requests wait for a permit.

use crate::config::{RenderConfig, ServerConfig};
use crate::convert::generate_diagram;
use crate::error::DiagramError;
use crate::pipeline::chromium::ChromiumEngine;
use crate::pipeline::engine::RenderEngine;
use crate::pipeline::mermaid::DiagramDescription;
use crate::pipeline::render;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<RenderConfig>,
    engine: Arc<dyn RenderEngine>,
    permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: RenderConfig, engine: Arc<dyn RenderEngine>, max_renders: usize) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            permits: Arc::new(Semaphore::new(max_renders.max(1))),
        }
    }
}

/// Build the router with CORS, body limit and request tracing applied.
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate-diagram", post(generate_diagram_handler))
        .route("/generate-pdf", post(generate_pdf_handler))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(server: ServerConfig, config: RenderConfig) -> Result<(), DiagramError> {
    let state = AppState::new(
        config,
        Arc::new(ChromiumEngine::new()),
        server.max_concurrent_renders,
    );
    let app = router(state, server.body_limit_bytes);

    let addr = server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DiagramError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!("Server running on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DiagramError::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> &'static str {
    "ok"
}

async fn generate_diagram_handler(headers: HeaderMap, body: String) -> Response {
    let text = request_text(&headers, body);
    match generate_diagram(&text) {
        Ok(description) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            description.into_string(),
        )
            .into_response(),
        Err(e) if e.is_client_error() => error_body(StatusCode::BAD_REQUEST, &e),
        Err(e) => {
            error!("Diagram generation failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Diagram error: {e}") })),
            )
                .into_response()
        }
    }
}

async fn generate_pdf_handler(State(state): State<AppState>, body: String) -> Response {
    let description = match DiagramDescription::parse(&body) {
        Ok(d) => d,
        Err(e) => return error_body(StatusCode::BAD_REQUEST, &e),
    };

    let _permit = match Arc::clone(&state.permits).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return pdf_failure(&DiagramError::Internal("render pool closed".into()));
        }
    };

    match render::render_description(&description, &state.config, state.engine.as_ref()).await {
        Ok(output) => {
            let document = output.document;
            let disposition = format!("attachment; filename=\"{}\"", document.filename());
            (
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                    (header::CONTENT_LENGTH, document.len().to_string()),
                ],
                document.into_bytes(),
            )
                .into_response()
        }
        Err(e) => pdf_failure(&e),
    }
}

/// Body text for `/generate-diagram`. A JSON string literal is unwrapped and
/// any other JSON value is stringified; everything else is used verbatim.
fn request_text(headers: &HeaderMap, body: String) -> String {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return body;
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => body,
    }
}

fn error_body(status: StatusCode, e: &DiagramError) -> Response {
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

fn pdf_failure(e: &DiagramError) -> Response {
    error!("PDF generation failed ({}): {e}", e.kind());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "PDF generation failed", "details": e.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::fake::{FakeEngine, Script};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with(script: Script) -> (Router, Arc<FakeEngine>) {
        let engine = Arc::new(FakeEngine::new(script));
        let config = RenderConfig::builder()
            .render_timeout(Duration::from_millis(200))
            .poll_interval(Duration::from_millis(10))
            .build()
            .unwrap();
        let state = AppState::new(config, engine.clone(), 2);
        (router(state, 1024), engine)
    }

    fn app() -> Router {
        app_with(Script::default()).0
    }

    fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }

    #[tokio::test]
    async fn diagram_from_plain_text() {
        let resp = app()
            .oneshot(post("/generate-diagram", "text/plain", "1. Start\n- Prep\n2. Finish"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_text(resp).await,
            "graph TD\nstep0[\"Start\"]\nsub1[\"Prep\"]\nstep0 --> sub1\nstep2[\"Finish\"]\nstep0 --> step2\n"
        );
    }

    #[tokio::test]
    async fn diagram_from_json_string() {
        let resp = app()
            .oneshot(post(
                "/generate-diagram",
                "application/json",
                r#""1. Only step""#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "graph TD\nstep0[\"Only step\"]\n");
    }

    #[tokio::test]
    async fn whitespace_body_is_400_empty_input() {
        let resp = app()
            .oneshot(post("/generate-diagram", "text/plain", "   \n "))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({ "error": "Empty input received" }));
    }

    #[tokio::test]
    async fn pdf_rejects_bad_format_without_launch() {
        let (app, engine) = app_with(Script::default());
        let resp = app
            .oneshot(post("/generate-pdf", "text/plain", "not a diagram"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Invalid Mermaid code format" })
        );
        assert_eq!(engine.launches(), 0);
    }

    #[tokio::test]
    async fn pdf_success_is_attachment() {
        let (app, engine) = app_with(Script::default());
        let resp = app
            .oneshot(post(
                "/generate-pdf",
                "text/plain",
                "  graph TD\nstep0[\"Start\"]\n  ",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"process-diagram.pdf\""
        );
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(headers[header::CONTENT_LENGTH], bytes.len().to_string().as_str());
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(engine.closes(), 1);
    }

    #[tokio::test]
    async fn pdf_render_timeout_is_500_with_details() {
        let (app, engine) = app_with(Script {
            diagram_ready_after: None,
            ..Script::default()
        });
        let resp = app
            .oneshot(post("/generate-pdf", "text/plain", "graph TD\nstep0[\"A\"]"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "PDF generation failed");
        assert!(body["details"].as_str().unwrap().contains("Timed out"));
        assert_eq!(engine.closes(), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let resp = app()
            .oneshot(post("/generate-diagram", "text/plain", "x".repeat(4096)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let resp = app()
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn json_non_string_is_stringified() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(request_text(&headers, "{\"a\":1}".into()), "{\"a\":1}");
        assert_eq!(request_text(&headers, "\"1. x\"".into()), "1. x");
        assert_eq!(request_text(&HeaderMap::new(), "\"q\"".into()), "\"q\"");
        // Not JSON despite the header.
        assert_eq!(request_text(&headers, "1. a\n- b".into()), "1. a\n- b");
    }
}
