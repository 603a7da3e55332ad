mod challenge;
mod session;

pub use session::{PhotoTicket, Session, SessionReport};

use crate::game::GameError;
use crate::label::{LabelReader, MockLabelReader};
use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Challenge {0} not found")]
    ChallengeNotFound(ChallengeCode),

    #[error("Finish a game before creating a challenge")]
    NotFinished,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl SessionError {
    /// Stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound => "SESSION_NOT_FOUND",
            SessionError::ChallengeNotFound(_) => "CHALLENGE_NOT_FOUND",
            SessionError::NotFinished => "GAME_NOT_FINISHED",
            SessionError::Game(e) => e.code(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Active play-throughs, each owned by one connection or API client
    pub sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    pub challenges: Arc<RwLock<HashMap<ChallengeCode, Challenge>>>,
    /// Recognised wines by photo digest
    pub label_cache: Arc<RwLock<HashMap<String, WineInfo>>>,
    pub label_reader: Arc<dyn LabelReader>,
    pub config: GameConfig,
    /// Broadcast channel for challenge leaderboard updates
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(config: GameConfig, label_reader: Arc<dyn LabelReader>) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            challenges: Arc::new(RwLock::new(HashMap::new())),
            label_cache: Arc::new(RwLock::new(HashMap::new())),
            label_reader,
            config,
            broadcast: tx,
        }
    }

    /// Send a message to every connected client
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // No receivers connected is fine
        let _ = self.broadcast.send(msg);
    }
}

impl Default for AppState {
    /// Default config with an instant mock label reader
    fn default() -> Self {
        Self::new(
            GameConfig::default(),
            Arc::new(MockLabelReader::new(Duration::ZERO)),
        )
    }
}
