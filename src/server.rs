//! # HTTP API Server
//!
//! This module defines the `ApiServer`, an `axum`-based web server exposing
//! the notification dispatcher and the raw directory/messaging listings as
//! a JSON API.
//!
//! The server is designed for graceful shutdown, listening to a signal from
//! the main application to stop serving requests and terminate cleanly.

use crate::core::{DirectoryError, DirectoryProvider, MessagingProvider};
use crate::dispatch::NotificationDispatcher;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, trace};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub directory: Arc<dyn DirectoryProvider>,
    pub messaging: Arc<dyn MessagingProvider>,
    /// Backend description reported by `/api/status`, e.g. "demo" or "live".
    pub mode: String,
}

/// A server that exposes the dispatcher over HTTP.
pub struct ApiServer {
    listener: TcpListener,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
}

impl ApiServer {
    /// Creates a new `ApiServer` but does not spawn it.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `state` - The provider handles shared by all request handlers.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(listener: TcpListener, state: AppState, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            state,
            shutdown_rx,
        }
    }

    /// Returns a future that runs the server until a shutdown signal is received.
    pub fn run(self) -> impl Future<Output = ()> {
        let Self {
            listener,
            state,
            mut shutdown_rx,
        } = self;
        let app = router(state);

        async move {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    trace!("API server received shutdown signal via select.");
                }
                result = axum::serve(listener, app.into_make_service()) => {
                    if let Err(e) = result {
                        error!("API server error: {}", e);
                    }
                }
            }
            trace!("API server task finished.");
        }
    }
}

/// Builds the API router. Split out of [`ApiServer`] so integration tests
/// can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/notify/all", post(notify_all))
        .route("/api/notify/group", post(notify_group))
        .route("/api/message", post(post_message))
        .route("/api/directory/users", get(directory_users))
        .route("/api/directory/users/{id}", get(directory_user))
        .route("/api/directory/groups", get(directory_groups))
        .route(
            "/api/directory/groups/{id}/members",
            get(directory_group_members),
        )
        .route("/api/messaging/users", get(messaging_users))
        .route("/api/messaging/channels", get(messaging_channels))
        .with_state(state)
}

/// An unreachable backend maps to 502; the caller can tell it apart from an
/// empty result list.
struct ApiError(DirectoryError);

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct NotifyAllRequest {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NotifyGroupRequest {
    group_id: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageRequest {
    channel: String,
    text: String,
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "mode": state.mode,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn notify_all(
    State(state): State<AppState>,
    Json(request): Json<NotifyAllRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Dispatching notification to all directory users");
    let outcomes = state.dispatcher.notify_all(&request.message).await?;
    Ok(Json(outcomes))
}

async fn notify_group(
    State(state): State<AppState>,
    Json(request): Json<NotifyGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(group_id = %request.group_id, "Dispatching notification to group");
    let outcomes = state
        .dispatcher
        .notify_group(&request.group_id, &request.message)
        .await?;
    Ok(Json(outcomes))
}

async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<PostMessageRequest>,
) -> impl IntoResponse {
    let receipt = state
        .messaging
        .post_message(&request.channel, &request.text)
        .await;
    Json(receipt)
}

async fn directory_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.directory.list_users().await?))
}

async fn directory_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.directory.get_user(&id).await? {
        Some(user) => Ok(Json(user).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn directory_groups(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.directory.list_groups().await?))
}

async fn directory_group_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.directory.list_group_members(&id).await?))
}

async fn messaging_users(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.messaging.list_accounts().await)
}

async fn messaging_channels(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.messaging.list_channels().await)
}
