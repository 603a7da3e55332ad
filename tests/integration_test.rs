use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;
use wine_options::api;
use wine_options::game::scoring::GREAT_IMPROVEMENT_MESSAGE;
use wine_options::label::{LabelError, LabelReader, LabelResult};
use wine_options::protocol::{ClientMessage, ServerMessage};
use wine_options::state::AppState;
use wine_options::types::*;
use wine_options::ws::handlers::handle_message;
use wine_options::ws::Connection;

/// Always reads the same label, or never reads anything
struct FixedLabelReader {
    wine: Option<WineInfo>,
}

#[async_trait]
impl LabelReader for FixedLabelReader {
    async fn read_label(&self, _photo: &PhotoUpload) -> LabelResult<WineInfo> {
        self.wine.clone().ok_or(LabelError::NoMatch)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn bordeaux() -> WineInfo {
    WineInfo {
        vintage: 2018,
        country: "France".to_string(),
        region: "Bordeaux".to_string(),
        variety: "Merlot".to_string(),
        producer: "Château Test".to_string(),
        color: WineColor::Red,
    }
}

fn app_state(wine: Option<WineInfo>, max_image_bytes: usize) -> Arc<AppState> {
    let config = GameConfig {
        max_image_bytes,
        ..GameConfig::default()
    };
    Arc::new(AppState::new(config, Arc::new(FixedLabelReader { wine })))
}

async fn connect(
    state: &Arc<AppState>,
    user_id: Option<&str>,
) -> (Connection, mpsc::UnboundedReceiver<ServerMessage>) {
    let session = state.create_session(user_id.map(str::to_string)).await;
    let (outbox, rx) = mpsc::unbounded_channel();
    (
        Connection {
            session_id: session.id,
            outbox,
        },
        rx,
    )
}

async fn next_pushed(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for pushed message")
        .expect("outbox closed")
}

fn photo_message(bytes: &[u8]) -> ClientMessage {
    ClientMessage::SubmitPhoto {
        mime_type: "image/jpeg".to_string(),
        data: STANDARD.encode(bytes),
    }
}

/// Set up rounds and glass, upload a photo and wait for the questions
async fn start_game(
    state: &Arc<AppState>,
    conn: &Connection,
    rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
    rounds: RoundCount,
    black_glass: bool,
) {
    match handle_message(ClientMessage::SelectRounds { rounds }, conn, state).await {
        Some(ServerMessage::State { state }) => assert_eq!(state.step, GameStep::Glass),
        other => panic!("Expected State after select_rounds, got {other:?}"),
    }
    match handle_message(ClientMessage::SelectGlass { black_glass }, conn, state).await {
        Some(ServerMessage::State { state }) => assert_eq!(state.step, GameStep::Photo),
        other => panic!("Expected State after select_glass, got {other:?}"),
    }

    let response = handle_message(photo_message(b"fake jpeg bytes"), conn, state).await;
    assert!(matches!(response, Some(ServerMessage::Processing)));

    match next_pushed(rx).await {
        ServerMessage::State { state } => {
            assert_eq!(state.step, GameStep::Questions);
            assert_eq!(state.current_question_index, 0);
            assert_eq!(state.current_round, Round::First);
            // Label stays hidden while the first round is being guessed
            assert!(state.wine_info.is_none());
            assert!(state.questions.iter().all(|q| q.correct_answer.is_none()));
        }
        other => panic!("Expected State after photo analysis, got {other:?}"),
    }
}

/// Answer the rest of the current round, getting the first `correct` right.
/// Returns whether the last answer finished the game.
async fn play_round(state: &Arc<AppState>, conn: &Connection, correct: usize) -> bool {
    let game = state.get_game_state(&conn.session_id).await.unwrap();
    let round = game.current_round;
    let mut answered = 0;

    loop {
        let game = state.get_game_state(&conn.session_id).await.unwrap();
        let Some(question) = game.current_question().cloned() else {
            return true;
        };
        if game.current_round != round {
            return false;
        }

        for choice in &question.choices {
            assert_eq!(
                question.choices.iter().filter(|c| *c == choice).count(),
                1,
                "duplicate choice in {:?}",
                question.question_type
            );
        }
        assert!(question.choices.contains(&question.correct_answer));

        let choice = if answered < correct {
            question.correct_answer.clone()
        } else {
            question
                .choices
                .iter()
                .find(|c| **c != question.correct_answer)
                .cloned()
                .expect("every question offers a wrong choice")
        };

        let msg = ClientMessage::Answer {
            question_id: question.id.clone(),
            choice: choice.clone(),
        };
        match handle_message(msg, conn, state).await {
            Some(ServerMessage::AnswerResult { outcome, state: view }) => {
                assert_eq!(outcome.round, round);
                assert_eq!(outcome.correct, choice == question.correct_answer);
                if view.current_round == round || outcome.finished {
                    let shown = view.questions.iter().find(|q| q.id == question.id);
                    assert_eq!(
                        shown.and_then(|q| q.correct_answer.as_ref()),
                        Some(&question.correct_answer)
                    );
                }
                if outcome.finished {
                    return true;
                }
            }
            other => panic!("Expected AnswerResult, got {other:?}"),
        }
        answered += 1;
    }
}

/// Single round, black glass: 4 of 6 right
#[tokio::test]
async fn test_single_round_game() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, Some("user-42")).await;

    start_game(&state, &conn, &mut rx, RoundCount::One, true).await;
    let game = state.get_game_state(&conn.session_id).await.unwrap();
    assert_eq!(game.questions.len(), 6);
    assert_eq!(game.questions[1].question_type, QuestionType::Color);

    assert!(play_round(&state, &conn, 4).await);

    match next_pushed(&mut rx).await {
        ServerMessage::Summary {
            summary,
            share_text,
        } => {
            assert_eq!(summary.total, 4);
            assert_eq!(summary.max, 6);
            assert_eq!(summary.percentage, 67);
            assert!(summary.improvement.is_none());
            assert!(!summary.signup_prompt);
            assert!(share_text.contains("4/6 (67%)"));
        }
        other => panic!("Expected Summary, got {other:?}"),
    }

    let game = state.get_game_state(&conn.session_id).await.unwrap();
    assert_eq!(game.step, GameStep::Results);
    assert_eq!(game.scores.round1, 4);
    assert_eq!(game.scores.round2, 0);
}

/// Two rounds, black glass: 3 then 5 out of 6
#[tokio::test]
async fn test_two_round_game_with_improvement() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;

    start_game(&state, &conn, &mut rx, RoundCount::Two, true).await;

    assert!(!play_round(&state, &conn, 3).await);
    let game = state.get_game_state(&conn.session_id).await.unwrap();
    assert_eq!(game.current_round, Round::Second);
    assert_eq!(game.current_question_index, 0);
    assert_eq!(game.answers.len(), 6);

    assert!(play_round(&state, &conn, 5).await);

    match handle_message(ClientMessage::RequestSummary, &conn, &state).await {
        Some(ServerMessage::Summary { summary, .. }) => {
            assert_eq!(summary.round1, 3);
            assert_eq!(summary.round2, 5);
            assert_eq!(summary.total, 8);
            assert_eq!(summary.max, 12);
            assert_eq!(summary.percentage, 67);
            assert_eq!(
                summary.improvement.as_deref(),
                Some(GREAT_IMPROVEMENT_MESSAGE)
            );
            assert!(summary.signup_prompt);
        }
        other => panic!("Expected Summary, got {other:?}"),
    }
}

/// What goes over the wire mid-game must not give the answers away
#[tokio::test]
async fn test_state_json_hides_answers_until_earned() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;
    start_game(&state, &conn, &mut rx, RoundCount::Two, true).await;

    let pushed = |game: wine_options::game::GameState| {
        serde_json::to_value(ServerMessage::State {
            state: game.player_view(),
        })
        .unwrap()
    };

    let game = state.get_game_state(&conn.session_id).await.unwrap();
    let json = pushed(game);
    assert_eq!(json["t"], "state");
    assert!(json["state"].get("wine_info").is_none());
    assert!(json["state"].get("photo_digest").is_none());
    for question in json["state"]["questions"].as_array().unwrap() {
        assert!(question.get("correct_answer").is_none());
    }

    // Second round shows the label but not its answers
    assert!(!play_round(&state, &conn, 2).await);
    let game = state.get_game_state(&conn.session_id).await.unwrap();
    let json = pushed(game);
    assert_eq!(json["state"]["wine_info"]["region"], "Bordeaux");
    for question in json["state"]["questions"].as_array().unwrap() {
        assert!(question.get("correct_answer").is_none());
    }

    assert!(play_round(&state, &conn, 6).await);
    let game = state.get_game_state(&conn.session_id).await.unwrap();
    let json = pushed(game);
    assert_eq!(json["state"]["step"], "RESULTS");
    for question in json["state"]["questions"].as_array().unwrap() {
        assert!(question["correct_answer"].is_string());
    }

    // The HTTP surface serves the same view
    let response = api::router(state.clone())
        .oneshot(
            Request::get(format!("/api/sessions/{}", conn.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["state"]["wine_info"].is_object());
    assert!(json["state"].get("photo_digest").is_none());
}

#[tokio::test]
async fn test_oversized_photo_stays_in_photo_step() {
    let state = app_state(Some(bordeaux()), 1024);
    let (conn, mut rx) = connect(&state, None).await;

    handle_message(
        ClientMessage::SelectRounds {
            rounds: RoundCount::One,
        },
        &conn,
        &state,
    )
    .await;
    handle_message(ClientMessage::SelectGlass { black_glass: false }, &conn, &state).await;

    match handle_message(photo_message(&[0u8; 2048]), &conn, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "PHOTO_REJECTED"),
        other => panic!("Expected Error, got {other:?}"),
    }

    match next_pushed(&mut rx).await {
        ServerMessage::State { state } => {
            assert_eq!(state.step, GameStep::Photo);
            assert!(state.photo_error.is_some());
            assert!(state.questions.is_empty());
        }
        other => panic!("Expected State, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_photo_rejected() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;

    handle_message(
        ClientMessage::SelectRounds {
            rounds: RoundCount::One,
        },
        &conn,
        &state,
    )
    .await;
    handle_message(ClientMessage::SelectGlass { black_glass: false }, &conn, &state).await;

    let msg = ClientMessage::SubmitPhoto {
        mime_type: "image/png".to_string(),
        data: "not base64 !!!".to_string(),
    };
    match handle_message(msg, &conn, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "PHOTO_REJECTED"),
        other => panic!("Expected Error, got {other:?}"),
    }
    match next_pushed(&mut rx).await {
        ServerMessage::State { state } => {
            assert_eq!(state.step, GameStep::Photo);
            assert!(state.photo_error.is_some());
        }
        other => panic!("Expected State, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_label_stays_in_photo_step() {
    let state = app_state(None, DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;

    handle_message(
        ClientMessage::SelectRounds {
            rounds: RoundCount::Two,
        },
        &conn,
        &state,
    )
    .await;
    handle_message(ClientMessage::SelectGlass { black_glass: false }, &conn, &state).await;

    let response = handle_message(photo_message(b"blurry"), &conn, &state).await;
    assert!(matches!(response, Some(ServerMessage::Processing)));

    match next_pushed(&mut rx).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "EXTRACTION_FAILED"),
        other => panic!("Expected Error, got {other:?}"),
    }
    match next_pushed(&mut rx).await {
        ServerMessage::State { state } => {
            assert_eq!(state.step, GameStep::Photo);
            assert!(!state.is_processing);
            assert!(state.photo_error.is_some());
        }
        other => panic!("Expected State, got {other:?}"),
    }
}

#[tokio::test]
async fn test_out_of_order_messages_are_rejected() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, _rx) = connect(&state, None).await;

    match handle_message(ClientMessage::SelectGlass { black_glass: true }, &conn, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "INVALID_STEP"),
        other => panic!("Expected Error, got {other:?}"),
    }
    match handle_message(ClientMessage::RequestSummary, &conn, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "GAME_NOT_FINISHED"),
        other => panic!("Expected Error, got {other:?}"),
    }
    match handle_message(ClientMessage::CreateChallenge, &conn, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "GAME_NOT_FINISHED"),
        other => panic!("Expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reset_mid_game() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;

    start_game(&state, &conn, &mut rx, RoundCount::Two, false).await;
    assert!(!play_round(&state, &conn, 2).await);

    match handle_message(ClientMessage::ResetGame, &conn, &state).await {
        Some(ServerMessage::State { state }) => {
            assert_eq!(state.step, GameStep::Rounds);
            assert!(state.answers.is_empty());
            assert!(state.questions.is_empty());
            assert_eq!(state.scores, Scores::default());
        }
        other => panic!("Expected State, got {other:?}"),
    }
}

#[tokio::test]
async fn test_group_screen() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;

    start_game(&state, &conn, &mut rx, RoundCount::One, false).await;
    assert!(play_round(&state, &conn, 5).await);

    match handle_message(ClientMessage::OpenGroup, &conn, &state).await {
        Some(ServerMessage::State { state }) => assert_eq!(state.step, GameStep::Group),
        other => panic!("Expected State, got {other:?}"),
    }
    match handle_message(ClientMessage::CloseGroup, &conn, &state).await {
        Some(ServerMessage::State { state }) => assert_eq!(state.step, GameStep::Results),
        other => panic!("Expected State, got {other:?}"),
    }
}

/// One player creates a challenge, a friend replays it and lands on the leaderboard
#[tokio::test]
async fn test_challenge_flow() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let mut broadcast_rx = state.broadcast.subscribe();

    let (creator, mut creator_rx) = connect(&state, Some("host-user")).await;
    start_game(&state, &creator, &mut creator_rx, RoundCount::One, true).await;
    assert!(play_round(&state, &creator, 3).await);

    let code = match handle_message(ClientMessage::CreateChallenge, &creator, &state).await {
        Some(ServerMessage::Challenge { challenge }) => {
            assert_eq!(challenge.question_count, 6);
            assert_eq!(challenge.leaderboard.len(), 1);
            assert_eq!(challenge.leaderboard[0].total, 3);
            challenge.code
        }
        other => panic!("Expected Challenge, got {other:?}"),
    };

    let (friend, mut friend_rx) = connect(&state, None).await;
    let join = ClientMessage::JoinChallenge {
        code: code.to_lowercase(),
        display_name: Some("Robin".to_string()),
    };
    match handle_message(join, &friend, &state).await {
        Some(ServerMessage::Challenge { challenge }) => assert_eq!(challenge.code, code),
        other => panic!("Expected Challenge, got {other:?}"),
    }
    match next_pushed(&mut friend_rx).await {
        ServerMessage::State { state } => {
            assert_eq!(state.step, GameStep::Questions);
            assert_eq!(state.challenge_code.as_deref(), Some(code.as_str()));
        }
        other => panic!("Expected State, got {other:?}"),
    }

    assert!(play_round(&state, &friend, 6).await);

    match next_pushed(&mut friend_rx).await {
        ServerMessage::Summary { share_text, .. } => {
            assert!(share_text.contains(&format!("?challenge={code}")));
        }
        other => panic!("Expected Summary, got {other:?}"),
    }

    match broadcast_rx.recv().await.unwrap() {
        ServerMessage::Challenge { challenge } => {
            assert_eq!(challenge.leaderboard.len(), 2);
            assert_eq!(challenge.leaderboard[0].display_name, "Robin");
            assert_eq!(challenge.leaderboard[0].percentage, 100);
            assert_eq!(challenge.leaderboard[1].total, 3);
        }
        other => panic!("Expected Challenge broadcast, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_challenge() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, _rx) = connect(&state, None).await;

    let join = ClientMessage::JoinChallenge {
        code: "NOPE9".to_string(),
        display_name: None,
    };
    match handle_message(join, &conn, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "CHALLENGE_NOT_FOUND"),
        other => panic!("Expected Error, got {other:?}"),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_http_health() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let app = api::router(state);

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["label_reader"], "fixed");
}

#[tokio::test]
async fn test_http_session_lifecycle() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);

    // Guest session, no body
    let response = api::router(state.clone())
        .oneshot(Request::post("/api/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["signed_in"], false);
    assert_eq!(json["state"]["step"], "ROUNDS");

    // Signed-in session
    let response = api::router(state.clone())
        .oneshot(
            Request::post("/api/sessions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"user_id":"user-7"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["signed_in"], true);
    let session_id = json["session_id"].as_str().unwrap().to_string();

    state
        .select_rounds(&session_id, RoundCount::Two)
        .await
        .unwrap();

    let response = api::router(state.clone())
        .oneshot(
            Request::get(format!("/api/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"]["step"], "GLASS");
    assert_eq!(json["state"]["rounds_selected"], 2);

    // No summary before the game is over
    let response = api::router(state.clone())
        .oneshot(
            Request::get(format!("/api/sessions/{session_id}/summary"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "GAME_NOT_FINISHED");

    let response = api::router(state.clone())
        .oneshot(
            Request::post(format!("/api/sessions/{session_id}/reset"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["step"], "ROUNDS");
}

#[tokio::test]
async fn test_http_summary_after_game() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);
    let (conn, mut rx) = connect(&state, None).await;
    start_game(&state, &conn, &mut rx, RoundCount::One, false).await;
    assert!(play_round(&state, &conn, 5).await);

    let response = api::router(state.clone())
        .oneshot(
            Request::get(format!("/api/sessions/{}/summary", conn.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["summary"]["total"], 5);
    assert_eq!(json["summary"]["percentage"], 100);
    assert!(json["share_text"].as_str().unwrap().contains("5/5"));
}

#[tokio::test]
async fn test_http_not_found() {
    let state = app_state(Some(bordeaux()), DEFAULT_MAX_IMAGE_BYTES);

    let response = api::router(state.clone())
        .oneshot(
            Request::get("/api/sessions/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "SESSION_NOT_FOUND");

    let response = api::router(state)
        .oneshot(
            Request::get("/api/challenges/abcde")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "CHALLENGE_NOT_FOUND");
}
