use crate::game::scoring::GameSummary;
use crate::game::{AnswerOutcome, GameView};
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    SelectRounds {
        rounds: RoundCount,
    },
    SelectGlass {
        black_glass: bool,
    },
    /// Label photo, base64-encoded
    SubmitPhoto {
        mime_type: String,
        data: String,
    },
    Answer {
        question_id: QuestionId,
        choice: String,
    },
    OpenGroup,
    CloseGroup,
    /// Turn the finished game into a shareable challenge
    CreateChallenge,
    JoinChallenge {
        code: ChallengeCode,
        display_name: Option<String>,
    },
    ResetGame,
    RequestSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        session_id: SessionId,
        signed_in: bool,
        state: GameView,
        server_now: String,
    },
    State {
        state: GameView,
    },
    /// Photo accepted, label analysis running
    Processing,
    AnswerResult {
        outcome: AnswerOutcome,
        state: GameView,
    },
    Summary {
        summary: GameSummary,
        share_text: String,
    },
    Challenge {
        challenge: ChallengeView,
    },
    Error {
        code: String,
        msg: String,
    },
}

/// What other players see of a challenge: setup and leaderboard, no answers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChallengeView {
    pub code: ChallengeCode,
    pub created_at: String,
    pub rounds_selected: RoundCount,
    pub is_black_glass: bool,
    pub question_count: usize,
    pub leaderboard: Vec<ChallengeEntry>,
}

impl From<&Challenge> for ChallengeView {
    fn from(challenge: &Challenge) -> Self {
        Self {
            code: challenge.code.clone(),
            created_at: challenge.created_at.clone(),
            rounds_selected: challenge.rounds_selected,
            is_black_glass: challenge.is_black_glass,
            question_count: challenge.questions.len(),
            leaderboard: challenge.leaderboard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"select_rounds","rounds":2}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::SelectRounds {
                rounds: RoundCount::Two
            }
        ));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"t":"answer","question_id":"1-vintage","choice":"2018"}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::Answer { .. }));

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"reset_game"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::ResetGame));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"t":"select_rounds","rounds":3}"#)
            .is_err());
    }

    #[test]
    fn test_server_message_wire_format() {
        let msg = ServerMessage::Error {
            code: "INVALID_STEP".to_string(),
            msg: "nope".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "INVALID_STEP");

        let json = serde_json::to_value(ServerMessage::State {
            state: crate::game::GameState::new().player_view(),
        })
        .unwrap();
        assert_eq!(json["t"], "state");
        assert_eq!(json["state"]["step"], "ROUNDS");
        assert_eq!(json["state"]["current_round"], 1);
    }
}
