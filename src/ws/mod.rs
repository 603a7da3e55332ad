pub mod group;
pub mod handlers;
pub mod play;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::{SessionId, UserId};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Signed-in user; guests connect without one
    pub user_id: Option<UserId>,
}

/// The session a socket plays in, plus a way to push messages to it later
#[derive(Debug, Clone)]
pub struct Connection {
    pub session_id: SessionId,
    pub outbox: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    /// Queue a message for this socket. Fails silently once it has closed.
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.outbox.send(msg);
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: signed_in={}",
        params.user_id.is_some()
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Only leaderboard updates for the challenge this session is playing get through
async fn wants_broadcast(state: &AppState, session_id: &str, msg: &ServerMessage) -> bool {
    match msg {
        ServerMessage::Challenge { challenge } => state
            .get_game_state(session_id)
            .await
            .and_then(|game| game.challenge_code)
            .is_some_and(|code| code == challenge.code),
        _ => true,
    }
}

async fn send_json<S>(sender: &mut S, msg: &ServerMessage) -> bool
where
    S: SinkExt<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let session = state.create_session(params.user_id).await;
    state.attach_session(&session.id).await;
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel();
    let conn = Connection {
        session_id: session.id.clone(),
        outbox,
    };

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        session_id: session.id.clone(),
        signed_in: session.signed_in(),
        state: session.game.player_view(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        state.close_session(&session.id).await;
        return;
    }

    let mut broadcast_rx = state.broadcast.subscribe();

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if wants_broadcast(&state, &conn.session_id, &msg).await
                        && !send_json(&mut sender, &msg).await
                    {
                        break;
                    }
                }
            }

            // Results of background work for this session (label analysis)
            Some(msg) = outbox_rx.recv() => {
                if !send_json(&mut sender, &msg).await {
                    break;
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message from {}: {} bytes", conn.session_id, text.len());

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handlers::handle_message(client_msg, &conn, &state).await,
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };

                        if let Some(response) = response {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.close_session(&conn.session_id).await;
    tracing::info!("WebSocket connection closed for session {}", conn.session_id);
}
