//! The Wine Options game: choice generation, question assembly, the
//! per-session state machine and scoring. Everything here is synchronous
//! and owned by a single session.

pub mod catalog;
pub mod distractors;
pub mod questions;
pub mod scoring;
mod session;
mod view;

pub use session::{validate_photo, AnswerOutcome, GameState};
pub use view::{GameView, QuestionView};

use crate::label::LabelError;
use crate::types::GameStep;

/// Reasons an uploaded label photo is refused before analysis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhotoError {
    #[error("Please choose an image file (got {0})")]
    UnsupportedType(String),

    #[error("Image is too large ({size} bytes, limit is {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("The selected file is empty")]
    Empty,

    #[error("Image data could not be decoded")]
    InvalidEncoding,
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Action not allowed in step {0:?}")]
    InvalidStep(GameStep),

    #[error("A photo is already being analysed")]
    AlreadyProcessing,

    #[error("No photo is being analysed")]
    NotProcessing,

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Question {0} is not the current question")]
    NotCurrentQuestion(String),

    #[error("'{0}' is not one of the offered choices")]
    InvalidChoice(String),

    #[error("{0}")]
    PhotoRejected(#[from] PhotoError),

    #[error("{0}")]
    Extraction(#[from] LabelError),
}

impl GameError {
    /// Stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidStep(_) => "INVALID_STEP",
            GameError::AlreadyProcessing => "PHOTO_PROCESSING",
            GameError::NotProcessing => "NOT_PROCESSING",
            GameError::UnknownQuestion(_) => "UNKNOWN_QUESTION",
            GameError::NotCurrentQuestion(_) => "NOT_CURRENT_QUESTION",
            GameError::InvalidChoice(_) => "INVALID_CHOICE",
            GameError::PhotoRejected(_) => "PHOTO_REJECTED",
            GameError::Extraction(_) => "EXTRACTION_FAILED",
        }
    }
}
