use super::{AppState, SessionError};
use crate::game::scoring::{share_text, GameSummary};
use crate::game::{AnswerOutcome, GameError, GameState, PhotoError};
use crate::label::LabelResult;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Recognised labels kept per photo digest
const LABEL_CACHE_CAPACITY: usize = 1024;

/// One player's play-through plus the bookkeeping around it
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Authenticated user, None for guests
    pub user_id: Option<UserId>,
    pub display_name: Option<String>,
    pub game: GameState,
    /// Bumped on reset/rejoin so late photo results are dropped
    pub epoch: u64,
    pub created_at: String,
    pub last_active: Instant,
    /// Whether this play-through's score is already on its challenge leaderboard
    pub challenge_recorded: bool,
    /// Owned by an open WebSocket; such sessions end with the socket, not by idling
    pub attached: bool,
}

impl Session {
    pub fn signed_in(&self) -> bool {
        self.user_id.is_some()
    }
}

/// A photo accepted for analysis, tied to the session epoch it was taken in
#[derive(Debug, Clone)]
pub struct PhotoTicket {
    pub session_id: SessionId,
    pub epoch: u64,
    /// SHA-256 of the photo bytes
    pub digest: String,
    pub photo: PhotoUpload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub summary: GameSummary,
    pub share_text: String,
}

impl AppState {
    pub async fn create_session(&self, user_id: Option<UserId>) -> Session {
        let session = Session {
            id: ulid::Ulid::new().to_string(),
            user_id,
            display_name: None,
            game: GameState::new(),
            epoch: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_active: Instant::now(),
            challenge_recorded: false,
            attached: false,
        };

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());

        tracing::info!(
            "Created session {} ({})",
            session.id,
            if session.signed_in() { "user" } else { "guest" }
        );
        session
    }

    pub async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn get_game_state(&self, id: &str) -> Option<GameState> {
        self.sessions.read().await.get(id).map(|s| s.game.clone())
    }

    /// Tie a session to an open connection so idle reaping leaves it alone
    pub async fn attach_session(&self, id: &str) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(session) => {
                session.attached = true;
                true
            }
            None => false,
        }
    }

    /// Drop a session. Any photo still being analysed for it is discarded.
    pub async fn close_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!("Closed session {}", id);
        }
        removed
    }

    /// Run a game action against a session and return the resulting state
    async fn update_game<T, F>(&self, id: &str, action: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<T, GameError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        session.last_active = Instant::now();
        Ok(action(session)?)
    }

    pub async fn select_rounds(
        &self,
        id: &str,
        rounds: RoundCount,
    ) -> Result<GameState, SessionError> {
        self.update_game(id, |session| {
            session.game.select_rounds(rounds)?;
            Ok(session.game.clone())
        })
        .await
    }

    pub async fn select_glass(
        &self,
        id: &str,
        is_black_glass: bool,
    ) -> Result<GameState, SessionError> {
        self.update_game(id, |session| {
            session.game.select_glass(is_black_glass)?;
            Ok(session.game.clone())
        })
        .await
    }

    /// Validate a photo and mark it as being analysed
    pub async fn begin_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
    ) -> Result<PhotoTicket, SessionError> {
        let max_bytes = self.config.max_image_bytes;
        self.update_game(id, |session| {
            let digest = session.game.begin_photo(&photo, max_bytes)?;
            tracing::info!(
                "Session {} photo accepted ({} bytes, {})",
                session.id,
                photo.bytes.len(),
                photo.mime_type
            );
            Ok(PhotoTicket {
                session_id: session.id.clone(),
                epoch: session.epoch,
                digest,
                photo,
            })
        })
        .await
    }

    /// Record a photo that couldn't be decoded and hand back the error
    pub async fn reject_photo(&self, id: &str, error: PhotoError) -> SessionError {
        match self.sessions.write().await.get_mut(id) {
            Some(session) => session.game.reject_photo(error).into(),
            None => SessionError::NotFound,
        }
    }

    /// Apply a label result. Returns `Ok(None)` without touching anything if
    /// the session was closed, reset or rejoined while the photo was analysed.
    pub async fn complete_photo(
        &self,
        ticket: &PhotoTicket,
        result: LabelResult<WineInfo>,
    ) -> Result<Option<GameState>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&ticket.session_id) else {
            tracing::debug!(
                "Session {} gone before label analysis finished",
                ticket.session_id
            );
            return Ok(None);
        };

        if session.epoch != ticket.epoch
            || session.game.step != GameStep::Photo
            || !session.game.is_processing
        {
            tracing::debug!("Discarding stale label result for {}", ticket.session_id);
            return Ok(None);
        }

        let applied = {
            let mut rng = rand::rng();
            session.game.complete_photo(&mut rng, result)
        };
        session.last_active = Instant::now();

        match applied {
            Ok(()) => {
                tracing::info!(
                    "Session {} starting {} questions",
                    session.id,
                    session.game.questions.len()
                );
                Ok(Some(session.game.clone()))
            }
            Err(e) => {
                tracing::warn!("Session {} label extraction failed: {}", session.id, e);
                Err(e.into())
            }
        }
    }

    /// Run the label reader for an accepted photo and apply its result.
    /// A photo already recognised once is answered from the label cache.
    pub async fn analyze_photo(
        &self,
        ticket: PhotoTicket,
    ) -> Result<Option<GameState>, SessionError> {
        let cached = self.label_cache.read().await.get(&ticket.digest).cloned();
        let result = match cached {
            Some(wine) => {
                tracing::debug!("Label cache hit for {}", ticket.session_id);
                Ok(wine)
            }
            None => {
                tracing::debug!(
                    "Analysing photo for {} with {} reader",
                    ticket.session_id,
                    self.label_reader.name()
                );
                let result = self.label_reader.read_label(&ticket.photo).await;
                if let Ok(wine) = &result {
                    let mut cache = self.label_cache.write().await;
                    if cache.len() < LABEL_CACHE_CAPACITY {
                        cache.insert(ticket.digest.clone(), wine.clone());
                    }
                }
                result
            }
        };
        self.complete_photo(&ticket, result).await
    }

    /// Validate, analyse and apply a photo in one go
    pub async fn submit_photo(
        &self,
        id: &str,
        photo: PhotoUpload,
    ) -> Result<Option<GameState>, SessionError> {
        let ticket = self.begin_photo(id, photo).await?;
        self.analyze_photo(ticket).await
    }

    pub async fn answer(
        &self,
        id: &str,
        question_id: &str,
        choice: &str,
    ) -> Result<(AnswerOutcome, GameState), SessionError> {
        let (outcome, state) = self
            .update_game(id, |session| {
                let outcome = session.game.answer(question_id, choice)?;
                Ok((outcome, session.game.clone()))
            })
            .await?;

        if outcome.finished {
            tracing::info!(
                "Session {} finished: {}/{}",
                id,
                state.scores.round1,
                state.scores.round2
            );
            if state.challenge_code.is_some() {
                self.record_challenge_result(id).await;
            }
        }

        Ok((outcome, state))
    }

    pub async fn open_group(&self, id: &str) -> Result<GameState, SessionError> {
        self.update_game(id, |session| {
            session.game.open_group()?;
            Ok(session.game.clone())
        })
        .await
    }

    pub async fn close_group(&self, id: &str) -> Result<GameState, SessionError> {
        self.update_game(id, |session| {
            session.game.close_group()?;
            Ok(session.game.clone())
        })
        .await
    }

    /// Start over from the first screen
    pub async fn reset_game(&self, id: &str) -> Result<GameState, SessionError> {
        self.update_game(id, |session| {
            session.game.reset();
            session.epoch += 1;
            session.challenge_recorded = false;
            tracing::info!("Session {} reset", session.id);
            Ok(session.game.clone())
        })
        .await
    }

    /// Summary and share text for a finished game
    pub async fn session_report(&self, id: &str) -> Result<SessionReport, SessionError> {
        let session = self.get_session(id).await.ok_or(SessionError::NotFound)?;
        let summary = session
            .game
            .summary(session.signed_in())
            .ok_or(SessionError::NotFinished)?;
        let share_text = share_text(
            &summary,
            &self.config.share_base_url,
            session.game.challenge_code.as_deref(),
        );
        Ok(SessionReport {
            summary,
            share_text,
        })
    }

    /// Remove detached sessions nobody has touched for `ttl`
    pub async fn reap_idle_sessions(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.attached || session.last_active.elapsed() < ttl);
        let reaped = before - sessions.len();
        if reaped > 0 {
            tracing::info!("Reaped {} idle session(s)", reaped);
        }
        reaped
    }
}
