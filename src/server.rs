//! HTTP transport: receives webhook payloads and mirrors core envelopes.
//!
//! Deliberately thin. It parses the body, supplies the source address,
//! authenticates, and maps the core's envelope onto the network response;
//! every trading decision lives behind [`dispatch`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::HyperliquidClient;
use crate::auth::Authenticator;
use crate::models::{ResponseEnvelope, TradeSignal};
use crate::trading::{dispatch, PositionManager, TradeError};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub manager: Arc<PositionManager<HyperliquidClient>>,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn health_handler() -> &'static str {
    "OK"
}

/// The single signal endpoint.
///
/// Takes the raw body so malformed JSON becomes a 400 envelope here,
/// without ever invoking the core.
async fn webhook_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: String,
) -> impl IntoResponse {
    let signal: TradeSignal = match serde_json::from_str(&body) {
        Ok(signal) => signal,
        Err(err) => {
            warn!(error = %err, "Rejecting malformed webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ResponseEnvelope::error("Invalid JSON in request body")),
            );
        }
    };

    if !state
        .authenticator
        .authenticate(&signal.password, Some(peer.ip()))
    {
        return (
            StatusCode::FORBIDDEN,
            Json(ResponseEnvelope::error(TradeError::Auth.to_string())),
        );
    }

    let envelope = dispatch(state.manager.as_ref(), &signal).await;
    let status =
        StatusCode::from_u16(envelope.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(envelope))
}
