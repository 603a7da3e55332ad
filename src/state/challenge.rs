use super::{AppState, SessionError};
use crate::game::GameState;
use crate::protocol::{ChallengeView, ServerMessage};
use crate::types::*;
use rand::Rng;

/// Safe character set for short codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

/// Generate a random short code (5 characters)
fn generate_short_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Friendly name for players who didn't pick one, e.g. "brave-otter"
fn guest_name() -> String {
    petname::petname(2, "-").unwrap_or_else(|| format!("guest-{}", generate_short_code()))
}

fn entry_for(session_id: &str, display_name: String, game: &GameState) -> Option<ChallengeEntry> {
    let summary = game.summary(false)?;
    Some(ChallengeEntry {
        session_id: session_id.to_string(),
        display_name,
        total: summary.total,
        max: summary.max,
        percentage: summary.percentage,
        finished_at: chrono::Utc::now().to_rfc3339(),
    })
}

impl AppState {
    /// Turn a finished session into a challenge others can replay.
    /// A session that already belongs to a challenge gets that one back.
    pub async fn create_challenge(&self, session_id: &str) -> Result<Challenge, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound)?;

        if !session.game.is_finished() {
            return Err(SessionError::NotFinished);
        }
        let wine_info = session
            .game
            .wine_info
            .clone()
            .ok_or(SessionError::NotFinished)?;

        let mut challenges = self.challenges.write().await;

        if let Some(code) = &session.game.challenge_code {
            if let Some(existing) = challenges.get(code) {
                return Ok(existing.clone());
            }
        }

        let code = loop {
            let code = generate_short_code();
            if !challenges.contains_key(&code) {
                break code;
            }
        };

        let display_name = session
            .display_name
            .get_or_insert_with(guest_name)
            .clone();

        let mut challenge = Challenge {
            code: code.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            rounds_selected: session.game.rounds_selected,
            is_black_glass: session.game.is_black_glass,
            wine_info,
            questions: session.game.questions.clone(),
            entries: Vec::new(),
        };
        challenge
            .entries
            .extend(entry_for(&session.id, display_name, &session.game));

        session.game.challenge_code = Some(code.clone());
        session.challenge_recorded = true;
        challenges.insert(code.clone(), challenge.clone());

        tracing::info!("Session {} created challenge {}", session.id, code);
        Ok(challenge)
    }

    /// Replay a challenge: the session restarts on the challenge's questions
    pub async fn join_challenge(
        &self,
        session_id: &str,
        code: &str,
        display_name: Option<String>,
    ) -> Result<(GameState, Challenge), SessionError> {
        let code = code.trim().to_uppercase();

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound)?;

        let challenge = self
            .challenges
            .read()
            .await
            .get(&code)
            .cloned()
            .ok_or_else(|| SessionError::ChallengeNotFound(code.clone()))?;

        match display_name.map(|n| n.trim().to_string()) {
            Some(name) if !name.is_empty() => session.display_name = Some(name),
            _ => {
                session.display_name.get_or_insert_with(guest_name);
            }
        }

        session.game.load_challenge(&challenge);
        session.epoch += 1;
        session.challenge_recorded = false;

        tracing::info!(
            "Session {} joined challenge {} as {:?}",
            session.id,
            code,
            session.display_name
        );
        Ok((session.game.clone(), challenge))
    }

    pub async fn get_challenge(&self, code: &str) -> Option<Challenge> {
        self.challenges
            .read()
            .await
            .get(&code.trim().to_uppercase())
            .cloned()
    }

    /// Put a finished challenge session on the leaderboard, once
    pub(super) async fn record_challenge_result(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return;
        };
        if session.challenge_recorded {
            return;
        }
        let Some(code) = session.game.challenge_code.clone() else {
            return;
        };

        let mut challenges = self.challenges.write().await;
        let Some(challenge) = challenges.get_mut(&code) else {
            tracing::warn!("Challenge {} vanished before {} finished", code, session_id);
            return;
        };

        let display_name = session
            .display_name
            .get_or_insert_with(guest_name)
            .clone();
        let Some(entry) = entry_for(&session.id, display_name, &session.game) else {
            return;
        };

        tracing::info!(
            "Challenge {}: {} scored {}/{}",
            code,
            entry.display_name,
            entry.total,
            entry.max
        );
        challenge.entries.push(entry);
        session.challenge_recorded = true;

        self.broadcast_to_all(ServerMessage::Challenge {
            challenge: ChallengeView::from(&*challenge),
        });
    }
}
