use super::questions::build_questions;
use super::scoring::{summarize, GameSummary};
use super::{GameError, PhotoError};
use crate::label::LabelError;
use crate::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// State of one play-through.
///
/// Steps run `ROUNDS -> GLASS -> PHOTO -> QUESTIONS -> RESULTS`, with
/// `GROUP` as a side screen reachable from `RESULTS`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub step: GameStep,
    pub wine_info: Option<WineInfo>,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub current_round: Round,
    pub rounds_selected: RoundCount,
    pub is_black_glass: bool,
    pub answers: HashMap<QuestionId, Answer>,
    pub scores: Scores,
    /// Inline message for the photo step (validation or extraction failure)
    pub photo_error: Option<String>,
    pub is_processing: bool,
    /// SHA-256 of the accepted photo, keys the label cache
    pub photo_digest: Option<String>,
    pub challenge_code: Option<ChallengeCode>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            step: GameStep::Rounds,
            wine_info: None,
            questions: Vec::new(),
            current_question_index: 0,
            current_round: Round::First,
            rounds_selected: RoundCount::One,
            is_black_glass: false,
            answers: HashMap::new(),
            scores: Scores::default(),
            photo_error: None,
            is_processing: false,
            photo_digest: None,
            challenge_code: None,
        }
    }
}

/// What happened when the player picked a choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub round: Round,
    pub correct: bool,
    pub correct_answer: String,
    /// True once the last answer moved the game to RESULTS
    pub finished: bool,
}

/// Check MIME type and size of an uploaded photo
pub fn validate_photo(upload: &PhotoUpload, max_bytes: usize) -> Result<(), PhotoError> {
    if !upload.mime_type.starts_with("image/") {
        return Err(PhotoError::UnsupportedType(upload.mime_type.clone()));
    }
    if upload.bytes.is_empty() {
        return Err(PhotoError::Empty);
    }
    if upload.bytes.len() > max_bytes {
        return Err(PhotoError::TooLarge {
            size: upload.bytes.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    fn expect_step(&self, step: GameStep) -> Result<(), GameError> {
        if self.step != step {
            return Err(GameError::InvalidStep(self.step));
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.step, GameStep::Results | GameStep::Group)
    }

    pub fn select_rounds(&mut self, rounds: RoundCount) -> Result<(), GameError> {
        self.expect_step(GameStep::Rounds)?;
        self.rounds_selected = rounds;
        self.step = GameStep::Glass;
        Ok(())
    }

    pub fn select_glass(&mut self, is_black_glass: bool) -> Result<(), GameError> {
        self.expect_step(GameStep::Glass)?;
        self.is_black_glass = is_black_glass;
        self.step = GameStep::Photo;
        Ok(())
    }

    /// Accept a photo for analysis and return its digest. A rejected photo
    /// records `photo_error` and leaves the game in PHOTO.
    pub fn begin_photo(
        &mut self,
        upload: &PhotoUpload,
        max_bytes: usize,
    ) -> Result<String, GameError> {
        self.expect_step(GameStep::Photo)?;
        if self.is_processing {
            return Err(GameError::AlreadyProcessing);
        }

        if let Err(e) = validate_photo(upload, max_bytes) {
            self.photo_error = Some(e.to_string());
            return Err(e.into());
        }

        let digest = hex::encode(Sha256::digest(&upload.bytes));
        self.photo_error = None;
        self.is_processing = true;
        self.photo_digest = Some(digest.clone());
        Ok(digest)
    }

    /// Record a photo that never made it to validation, e.g. undecodable data
    pub fn reject_photo(&mut self, error: PhotoError) -> GameError {
        if self.step == GameStep::Photo && !self.is_processing {
            self.photo_error = Some(error.to_string());
        }
        error.into()
    }

    /// Apply the label reader's verdict for the photo accepted by `begin_photo`
    pub fn complete_photo<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        result: Result<WineInfo, LabelError>,
    ) -> Result<(), GameError> {
        self.expect_step(GameStep::Photo)?;
        if !self.is_processing {
            return Err(GameError::NotProcessing);
        }
        self.is_processing = false;

        let wine = match result {
            Ok(wine) => wine,
            Err(e) => {
                self.photo_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        self.questions = build_questions(rng, &wine, self.rounds_selected, self.is_black_glass);
        self.wine_info = Some(wine);
        self.current_question_index = 0;
        self.current_round = Round::First;
        self.step = GameStep::Questions;
        Ok(())
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.step != GameStep::Questions {
            return None;
        }
        self.questions.get(self.current_question_index)
    }

    /// Record an answer for the current question and round, then advance
    pub fn answer(&mut self, question_id: &str, choice: &str) -> Result<AnswerOutcome, GameError> {
        self.expect_step(GameStep::Questions)?;

        let question = match self.questions.get(self.current_question_index) {
            Some(q) if q.id == question_id => q,
            _ => {
                return Err(if self.questions.iter().any(|q| q.id == question_id) {
                    GameError::NotCurrentQuestion(question_id.to_string())
                } else {
                    GameError::UnknownQuestion(question_id.to_string())
                });
            }
        };

        if !question.offers(choice) {
            return Err(GameError::InvalidChoice(choice.to_string()));
        }

        let correct = question.is_correct(choice);
        let correct_answer = question.correct_answer.clone();
        let round = self.current_round;

        self.answers
            .entry(question_id.to_string())
            .or_default()
            .set(round, choice.to_string());
        if correct {
            self.scores.increment(round);
        }

        if self.current_question_index + 1 < self.questions.len() {
            self.current_question_index += 1;
        } else if round == Round::First && self.rounds_selected == RoundCount::Two {
            // Second pass over the same questions, label revealed
            self.current_question_index = 0;
            self.current_round = Round::Second;
        } else {
            self.step = GameStep::Results;
        }

        Ok(AnswerOutcome {
            question_id: question_id.to_string(),
            round,
            correct,
            correct_answer,
            finished: self.step == GameStep::Results,
        })
    }

    pub fn open_group(&mut self) -> Result<(), GameError> {
        self.expect_step(GameStep::Results)?;
        self.step = GameStep::Group;
        Ok(())
    }

    pub fn close_group(&mut self) -> Result<(), GameError> {
        self.expect_step(GameStep::Group)?;
        self.step = GameStep::Results;
        Ok(())
    }

    /// Back to the first screen with everything cleared
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start a fresh play-through on a challenge's wine and questions
    pub fn load_challenge(&mut self, challenge: &Challenge) {
        self.reset();
        self.rounds_selected = challenge.rounds_selected;
        self.is_black_glass = challenge.is_black_glass;
        self.wine_info = Some(challenge.wine_info.clone());
        self.questions = challenge.questions.clone();
        self.challenge_code = Some(challenge.code.clone());
        self.step = GameStep::Questions;
    }

    /// Final summary, available once the game has reached RESULTS
    pub fn summary(&self, signed_in: bool) -> Option<GameSummary> {
        if !self.is_finished() {
            return None;
        }
        Some(summarize(
            &self.scores,
            self.questions.len(),
            self.rounds_selected,
            signed_in,
        ))
    }
}
