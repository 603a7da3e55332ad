//! WebSocket message dispatch
//!
//! Every message acts on the session owned by the connection it arrived on.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, SessionError};
use std::sync::Arc;

use super::{group, play, Connection};

/// Map a failed action onto the wire
pub fn error_message(err: &SessionError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        msg: err.to_string(),
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    conn: &Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Game setup and play
        ClientMessage::SelectRounds { rounds } => {
            play::handle_select_rounds(state, conn, rounds).await
        }

        ClientMessage::SelectGlass { black_glass } => {
            play::handle_select_glass(state, conn, black_glass).await
        }

        ClientMessage::SubmitPhoto { mime_type, data } => {
            play::handle_submit_photo(state, conn, mime_type, data).await
        }

        ClientMessage::Answer {
            question_id,
            choice,
        } => play::handle_answer(state, conn, question_id, choice).await,

        ClientMessage::ResetGame => play::handle_reset_game(state, conn).await,

        ClientMessage::RequestSummary => play::handle_request_summary(state, conn).await,

        // Group screen and challenges
        ClientMessage::OpenGroup => group::handle_open_group(state, conn).await,

        ClientMessage::CloseGroup => group::handle_close_group(state, conn).await,

        ClientMessage::CreateChallenge => group::handle_create_challenge(state, conn).await,

        ClientMessage::JoinChallenge { code, display_name } => {
            group::handle_join_challenge(state, conn, code, display_name).await
        }
    }
}
