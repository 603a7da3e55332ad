//! HTTP API endpoints.
//!
//! A thin REST surface over the session registry, for clients that don't
//! keep a WebSocket open and for sharing challenge leaderboards.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::game::GameView;
use crate::protocol::{ChallengeView, PROTOCOL_VERSION};
use crate::state::{AppState, SessionError, SessionReport};
use crate::types::{SessionId, UserId};
use crate::ws;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub msg: String,
    #[serde(skip)]
    status: StatusCode,
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::NotFound | SessionError::ChallengeNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::NotFinished | SessionError::Game(_) => StatusCode::CONFLICT,
        };
        Self {
            code: err.code(),
            msg: err.to_string(),
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub signed_in: bool,
    pub state: GameView,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub protocol: &'static str,
    pub label_reader: String,
    pub sessions: usize,
}

/// Build the application router (API + WebSocket)
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .route("/api/sessions/{id}/summary", get(session_summary))
        .route("/api/challenges/{code}", get(get_challenge))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        protocol: PROTOCOL_VERSION,
        label_reader: state.label_reader.name().to_string(),
        sessions: state.sessions.read().await.len(),
    })
}

/// Start a new session.
///
/// POST /api/sessions
///
/// The body is optional; without a `user_id` the session plays as a guest.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionResponse>) {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let session = state.create_session(request.user_id).await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            signed_in: session.signed_in(),
            state: session.game.player_view(),
            session_id: session.id,
        }),
    )
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .get_session(&id)
        .await
        .ok_or(SessionError::NotFound)?;
    Ok(Json(SessionResponse {
        signed_in: session.signed_in(),
        state: session.game.player_view(),
        session_id: session.id,
    }))
}

/// POST /api/sessions/{id}/reset
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<GameView>, ApiError> {
    Ok(Json(state.reset_game(&id).await?.player_view()))
}

/// Score summary and share text.
///
/// GET /api/sessions/{id}/summary
///
/// Only available once the game has reached the results screen.
pub async fn session_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionReport>, ApiError> {
    Ok(Json(state.session_report(&id).await?))
}

/// GET /api/challenges/{code}
pub async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ChallengeView>, ApiError> {
    let challenge = state
        .get_challenge(&code)
        .await
        .ok_or_else(|| SessionError::ChallengeNotFound(code.to_uppercase()))?;
    Ok(Json(ChallengeView::from(&challenge)))
}
