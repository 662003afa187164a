use anyhow::{Result, anyhow};
use axum::{Json, Router};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::relay::turn::{FailureBody, ReplyBody};
use crate::relay::{Relay, TurnError, TurnRequest};

pub const CHAT_PATH: &str = "/chat-with-ai";

const ALLOWED_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("authorization"),
    HeaderName::from_static("x-client-info"),
    HeaderName::from_static("apikey"),
    HeaderName::from_static("content-type"),
];

/// Routes for the relay endpoint. Preflight `OPTIONS` requests are answered
/// by the CORS layer before they reach a handler.
pub fn router<R>(relay: Arc<R>) -> Router
where
    R: Relay + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(ALLOWED_HEADERS);

    Router::new()
        .route(CHAT_PATH, post(chat_with_ai::<R>))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(relay)
}

pub async fn serve<R>(listener: TcpListener, relay: R) -> Result<()>
where
    R: Relay + Send + Sync + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|err| anyhow!("Failed to read relay server address: {err}"))?;
    info!("PathwayAI relay listening on http://{addr}{CHAT_PATH}");

    axum::serve(listener, router(Arc::new(relay)))
        .await
        .map_err(|err| anyhow!("Failed to run relay server on {addr}: {err}"))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat_with_ai<R>(State(relay): State<Arc<R>>, body: Bytes) -> Response
where
    R: Relay + Send + Sync + 'static,
{
    let request = match serde_json::from_slice::<TurnRequest>(&body) {
        Ok(request) => request,
        Err(err) => {
            return failure(TurnError::InvalidInput(format!(
                "Invalid request body: {err}"
            )));
        }
    };

    info!(
        mode = request.mode.as_deref().unwrap_or("<none>"),
        model = request.model.as_deref().unwrap_or("<default>"),
        history = request.history.len(),
        "relaying turn"
    );

    match relay.relay(&request).await {
        Ok(response) => (StatusCode::OK, Json(ReplyBody { response })).into_response(),
        Err(err) => failure(err),
    }
}

fn failure(err: TurnError) -> Response {
    let status = status_for(&err);
    warn!(kind = err.kind(), status = status.as_u16(), "turn failed: {err}");
    (status, Json(FailureBody::from(&err))).into_response()
}

pub fn status_for(err: &TurnError) -> StatusCode {
    match err {
        TurnError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TurnError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        TurnError::BackendError { .. }
        | TurnError::EmptyResponse
        | TurnError::TransportError(_) => StatusCode::BAD_GATEWAY,
    }
}
