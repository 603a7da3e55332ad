//! Group screen and challenge handlers

use std::sync::Arc;

use super::handlers::error_message;
use super::Connection;
use crate::protocol::{ChallengeView, ServerMessage};
use crate::state::AppState;
use crate::types::ChallengeCode;

pub async fn handle_open_group(state: &Arc<AppState>, conn: &Connection) -> Option<ServerMessage> {
    Some(match state.open_group(&conn.session_id).await {
        Ok(game) => ServerMessage::State {
            state: game.player_view(),
        },
        Err(e) => error_message(&e),
    })
}

pub async fn handle_close_group(state: &Arc<AppState>, conn: &Connection) -> Option<ServerMessage> {
    Some(match state.close_group(&conn.session_id).await {
        Ok(game) => ServerMessage::State {
            state: game.player_view(),
        },
        Err(e) => error_message(&e),
    })
}

pub async fn handle_create_challenge(
    state: &Arc<AppState>,
    conn: &Connection,
) -> Option<ServerMessage> {
    match state.create_challenge(&conn.session_id).await {
        Ok(challenge) => Some(ServerMessage::Challenge {
            challenge: ChallengeView::from(&challenge),
        }),
        Err(e) => {
            tracing::debug!("Session {} can't create challenge: {}", conn.session_id, e);
            Some(error_message(&e))
        }
    }
}

/// Switch this session onto a challenge. The new state follows the
/// challenge view so the client can show who it's playing against.
pub async fn handle_join_challenge(
    state: &Arc<AppState>,
    conn: &Connection,
    code: ChallengeCode,
    display_name: Option<String>,
) -> Option<ServerMessage> {
    match state
        .join_challenge(&conn.session_id, &code, display_name)
        .await
    {
        Ok((game, challenge)) => {
            conn.send(ServerMessage::State {
                state: game.player_view(),
            });
            Some(ServerMessage::Challenge {
                challenge: ChallengeView::from(&challenge),
            })
        }
        Err(e) => Some(error_message(&e)),
    }
}
