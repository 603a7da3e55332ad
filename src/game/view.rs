use super::GameState;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A question as the player sees it. The answer stays hidden until the
/// question has been answered in the current round or the game is over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub sort_order: u32,
}

/// What a client is sent of a play-through.
///
/// The label (`wine_info`) is only shown once it can no longer give answers
/// away: in round 2, where it is revealed on purpose, and on the results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameView {
    pub step: GameStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wine_info: Option<WineInfo>,
    pub questions: Vec<QuestionView>,
    pub current_question_index: usize,
    pub current_round: Round,
    pub rounds_selected: RoundCount,
    pub is_black_glass: bool,
    pub answers: HashMap<QuestionId, Answer>,
    pub scores: Scores,
    pub photo_error: Option<String>,
    pub is_processing: bool,
    pub challenge_code: Option<ChallengeCode>,
}

impl GameState {
    pub fn player_view(&self) -> GameView {
        let finished = self.is_finished();
        let label_revealed = finished || self.current_round == Round::Second;

        let questions = self
            .questions
            .iter()
            .map(|q| {
                let answered = self
                    .answers
                    .get(&q.id)
                    .and_then(|a| a.get(self.current_round))
                    .is_some();
                QuestionView {
                    id: q.id.clone(),
                    question_type: q.question_type,
                    text: q.text.clone(),
                    choices: q.choices.clone(),
                    correct_answer: (finished || answered).then(|| q.correct_answer.clone()),
                    sort_order: q.sort_order,
                }
            })
            .collect();

        GameView {
            step: self.step,
            wine_info: self.wine_info.clone().filter(|_| label_revealed),
            questions,
            current_question_index: self.current_question_index,
            current_round: self.current_round,
            rounds_selected: self.rounds_selected,
            is_black_glass: self.is_black_glass,
            answers: self.answers.clone(),
            scores: self.scores,
            photo_error: self.photo_error.clone(),
            is_processing: self.is_processing,
            challenge_code: self.challenge_code.clone(),
        }
    }
}
