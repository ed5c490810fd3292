//! HTTP request boundary.
//!
//! `POST /api/ask` takes a conversation and answers its latest user message:
//!
//! ```text
//! {"messages": [{"role": "user", "content": "What is this video about?"}]}
//! -> 200 {"assistantMessage": "..."}
//! -> 400/500 {"error": "...", "code": "..."}
//! ```

use crate::error::VidaskError;
use crate::rag::{ConversationMessage, IndexStats, RagEngine};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state. The engine is read-only after startup.
pub struct AppState {
    pub engine: RagEngine,
}

impl AppState {
    pub fn new(engine: RagEngine) -> Self {
        Self { engine }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(rename = "assistantMessage")]
    pub assistant_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Failure returned to the caller: 400 for bad requests, 500 otherwise.
pub struct ApiError(VidaskError);

impl From<VidaskError> for ApiError {
    fn from(err: VidaskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(code = self.0.code(), "Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: self.0.code().to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the router.
pub fn router(state: Arc<AppState>, allow_any_origin: bool) -> Router {
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/ask", post(ask))
        .route("/api/ask/", post(ask))
        .route("/api/index", get(index_info))
        .with_state(state);

    if allow_any_origin {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(
    state: Arc<AppState>,
    host: &str,
    port: u16,
    allow_any_origin: bool,
) -> crate::error::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state, allow_any_origin)).await?;
    Ok(())
}

// === Handlers ===

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| VidaskError::InvalidInput(e.body_text()))?;
    let response = state.engine.answer(&req.messages).await?;
    Ok(Json(AskResponse {
        assistant_message: response.answer,
    }))
}

pub async fn index_info(State(state): State<Arc<AppState>>) -> Json<IndexStats> {
    Json(state.engine.retriever().stats().clone())
}
