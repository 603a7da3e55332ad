//! Gameplay message handlers
//!
//! Setup, photo upload, answering, reset and the results summary.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use super::handlers::error_message;
use super::Connection;
use crate::game::{GameState, PhotoError};
use crate::protocol::ServerMessage;
use crate::state::{AppState, SessionError};
use crate::types::{PhotoUpload, RoundCount};

fn state_or_error(result: Result<GameState, SessionError>) -> Option<ServerMessage> {
    Some(match result {
        Ok(game) => ServerMessage::State {
            state: game.player_view(),
        },
        Err(e) => error_message(&e),
    })
}

/// After a failed photo the client still needs the inline error on the state
async fn push_state(state: &AppState, conn: &Connection) {
    if let Some(game) = state.get_game_state(&conn.session_id).await {
        conn.send(ServerMessage::State {
            state: game.player_view(),
        });
    }
}

pub async fn handle_select_rounds(
    state: &Arc<AppState>,
    conn: &Connection,
    rounds: RoundCount,
) -> Option<ServerMessage> {
    tracing::debug!("Session {} selecting {} round(s)", conn.session_id, rounds.count());
    state_or_error(state.select_rounds(&conn.session_id, rounds).await)
}

pub async fn handle_select_glass(
    state: &Arc<AppState>,
    conn: &Connection,
    black_glass: bool,
) -> Option<ServerMessage> {
    tracing::debug!("Session {} black glass: {}", conn.session_id, black_glass);
    state_or_error(state.select_glass(&conn.session_id, black_glass).await)
}

/// Accept a photo and analyse it in the background. The reply is an
/// immediate `processing`; the outcome arrives later as `state` or `error`.
pub async fn handle_submit_photo(
    state: &Arc<AppState>,
    conn: &Connection,
    mime_type: String,
    data: String,
) -> Option<ServerMessage> {
    let bytes = match STANDARD.decode(data.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Session {} sent undecodable photo: {}", conn.session_id, e);
            let err = state
                .reject_photo(&conn.session_id, PhotoError::InvalidEncoding)
                .await;
            push_state(state, conn).await;
            return Some(error_message(&err));
        }
    };

    let ticket = match state
        .begin_photo(&conn.session_id, PhotoUpload { mime_type, bytes })
        .await
    {
        Ok(ticket) => ticket,
        Err(e) => {
            push_state(state, conn).await;
            return Some(error_message(&e));
        }
    };

    let state_clone = state.clone();
    let conn_clone = conn.clone();
    tokio::spawn(async move {
        match state_clone.analyze_photo(ticket).await {
            Ok(Some(game)) => conn_clone.send(ServerMessage::State {
                state: game.player_view(),
            }),
            // Session reset or gone meanwhile
            Ok(None) => {}
            Err(e) => {
                conn_clone.send(error_message(&e));
                push_state(&state_clone, &conn_clone).await;
            }
        }
    });

    Some(ServerMessage::Processing)
}

pub async fn handle_answer(
    state: &Arc<AppState>,
    conn: &Connection,
    question_id: String,
    choice: String,
) -> Option<ServerMessage> {
    match state.answer(&conn.session_id, &question_id, &choice).await {
        Ok((outcome, game)) => {
            if outcome.finished {
                if let Ok(report) = state.session_report(&conn.session_id).await {
                    conn.send(ServerMessage::Summary {
                        summary: report.summary,
                        share_text: report.share_text,
                    });
                }
            }
            Some(ServerMessage::AnswerResult {
                outcome,
                state: game.player_view(),
            })
        }
        Err(e) => Some(error_message(&e)),
    }
}

pub async fn handle_reset_game(state: &Arc<AppState>, conn: &Connection) -> Option<ServerMessage> {
    state_or_error(state.reset_game(&conn.session_id).await)
}

pub async fn handle_request_summary(
    state: &Arc<AppState>,
    conn: &Connection,
) -> Option<ServerMessage> {
    Some(match state.session_report(&conn.session_id).await {
        Ok(report) => ServerMessage::Summary {
            summary: report.summary,
            share_text: report.share_text,
        },
        Err(e) => error_message(&e),
    })
}
