//! # Worldclock Server
//!
//! The remote tier of the timezone set: one ordered set of timezones per user,
//! read with `GET /api/sync/timezones` and replaced wholesale with `POST`.
//!
//! The bearer token is used as an opaque user key. Issuing and verifying
//! tokens belongs to whatever sits in front of this service.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use ulid::Ulid;
use worldclock_core::{
    Clock, ClockError, EntryId, PushResponse, RemoteTimezone, Storage, SystemClock, SYNC_PATH,
};

// ═══════════════════════════════════════════════════════════════════════════
// State & Errors
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AppState {
    storage: Storage,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// State with an injected clock for `createdAt` stamps
    pub fn with_clock(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid timezone entry: {0}")]
    InvalidEntry(String),

    #[error(transparent)]
    Storage(#[from] ClockError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidEntry(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(e) => {
                warn!(error = %e, "Sync request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Caller identity taken from `Authorization: Bearer <token>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UserKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        Ok(UserKey(token.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Router
// ═══════════════════════════════════════════════════════════════════════════

/// Entry as pushed by clients; the client id is optional
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingTimezone {
    #[serde(default)]
    pub id: Option<EntryId>,
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub timezone: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(SYNC_PATH, get(list_timezones).post(replace_timezones))
        .with_state(state)
}

/// Running server spawned by [`serve`]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Sync server task did not finish cleanly");
        }
    }
}

/// Spawn the server on `listener`
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<ServerHandle> {
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        info!(address = %addr, "Starting sync server");
        let result = axum::serve(listener, router(state))
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
        match result {
            Ok(()) => info!(address = %addr, "Sync server stopped"),
            Err(e) => warn!(error = %e, "Sync server stopped with an error"),
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown: tx,
        task,
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn list_timezones(
    State(state): State<AppState>,
    UserKey(user): UserKey,
) -> Result<Json<Vec<RemoteTimezone>>, ApiError> {
    let records = state.storage.list_user_timezones(&user)?;
    Ok(Json(records))
}

async fn replace_timezones(
    State(state): State<AppState>,
    UserKey(user): UserKey,
    Json(payload): Json<Vec<IncomingTimezone>>,
) -> Result<Json<PushResponse>, ApiError> {
    if let Some(bad) = payload
        .iter()
        .find(|e| e.city.trim().is_empty() || e.timezone.trim().is_empty())
    {
        return Err(ApiError::InvalidEntry(format!(
            "city and timezone are required (city: {:?}, timezone: {:?})",
            bad.city, bad.timezone
        )));
    }

    // Offsetting by index keeps insertion order stable under one timestamp
    let now = state.clock.now_ms();
    let records: Vec<RemoteTimezone> = payload
        .into_iter()
        .enumerate()
        .map(|(i, e)| RemoteTimezone {
            id: Ulid::new(),
            entry_id: e.id,
            city: e.city,
            country: e.country,
            timezone: e.timezone,
            created_at: now + i as i64,
        })
        .collect();

    state.storage.replace_user_timezones(&user, &records)?;
    info!(count = records.len(), "Replaced timezone set");

    Ok(Json(PushResponse { success: true }))
}
