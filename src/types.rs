use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type QuestionId = String;
pub type UserId = String;
pub type ChallengeCode = String;

/// Default upper bound for uploaded label photos (10 MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WineColor {
    Red,
    White,
    Rose,
    Sparkling,
}

impl WineColor {
    /// Label used for this color in the color question.
    /// The color question only offers White/Red/Rosé/Other, so sparkling maps to Other.
    pub fn choice_label(&self) -> &'static str {
        match self {
            WineColor::Red => "Red",
            WineColor::White => "White",
            WineColor::Rose => "Rosé",
            WineColor::Sparkling => "Other",
        }
    }
}

/// Ground truth for one play-through, produced by the label reader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WineInfo {
    pub vintage: i32,
    pub country: String,
    pub region: String,
    pub variety: String,
    pub producer: String,
    pub color: WineColor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Vintage,
    Color,
    Variety,
    Hemisphere,
    Country,
    Region,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Vintage => "vintage",
            QuestionType::Color => "color",
            QuestionType::Variety => "variety",
            QuestionType::Hemisphere => "hemisphere",
            QuestionType::Country => "country",
            QuestionType::Region => "region",
        }
    }

    /// Text shown to the player for this question
    pub fn prompt_text(&self) -> &'static str {
        match self {
            QuestionType::Vintage => "What vintage is this wine?",
            QuestionType::Color => "What color is this wine?",
            QuestionType::Variety => "Which grape variety is this?",
            QuestionType::Hemisphere => "Which hemisphere does this wine come from?",
            QuestionType::Country => "Which country does this wine come from?",
            QuestionType::Region => "Which region does this wine come from?",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    pub choices: Vec<String>,
    pub correct_answer: String,
    pub sort_order: u32,
}

impl Question {
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_answer == choice
    }

    pub fn offers(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }
}

/// Which of the two passes over the question set is being played
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum Round {
    First,
    Second,
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Round::First),
            2 => Ok(Round::Second),
            other => Err(format!("round must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Round> for u8 {
    fn from(value: Round) -> Self {
        match value {
            Round::First => 1,
            Round::Second => 2,
        }
    }
}

/// How many rounds the player chose to play
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum RoundCount {
    One,
    Two,
}

impl RoundCount {
    pub fn count(&self) -> u32 {
        match self {
            RoundCount::One => 1,
            RoundCount::Two => 2,
        }
    }
}

impl TryFrom<u8> for RoundCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RoundCount::One),
            2 => Ok(RoundCount::Two),
            other => Err(format!("rounds must be 1 or 2, got {}", other)),
        }
    }
}

impl From<RoundCount> for u8 {
    fn from(value: RoundCount) -> Self {
        match value {
            RoundCount::One => 1,
            RoundCount::Two => 2,
        }
    }
}

/// A player's responses to one question, tracked per round
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub round1: Option<String>,
    pub round2: Option<String>,
}

impl Answer {
    pub fn get(&self, round: Round) -> Option<&str> {
        match round {
            Round::First => self.round1.as_deref(),
            Round::Second => self.round2.as_deref(),
        }
    }

    pub fn set(&mut self, round: Round, choice: String) {
        match round {
            Round::First => self.round1 = Some(choice),
            Round::Second => self.round2 = Some(choice),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
    pub round1: u32,
    pub round2: u32,
}

impl Scores {
    pub fn increment(&mut self, round: Round) {
        match round {
            Round::First => self.round1 += 1,
            Round::Second => self.round2 += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStep {
    Rounds,
    Glass,
    Photo,
    Questions,
    Results,
    Group,
}

/// An uploaded label photo. Only the MIME type and size matter to the game;
/// the bytes are handed to the label reader.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Runtime configuration for game sessions
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub max_image_bytes: usize,
    pub session_ttl: Duration,
    pub share_base_url: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            session_ttl: Duration::from_secs(3600),
            share_base_url: "http://localhost:6574/play".to_string(),
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_image_bytes = std::env::var("MAX_IMAGE_BYTES")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.max_image_bytes);

        let session_ttl = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_ttl);

        let share_base_url = std::env::var("SHARE_BASE_URL")
            .ok()
            .and_then(|url| {
                let trimmed = url.trim().trim_end_matches('/');
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or(defaults.share_base_url);

        Self {
            max_image_bytes,
            session_ttl,
            share_base_url,
        }
    }
}

/// One finished play-through on a challenge leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChallengeEntry {
    #[serde(skip)]
    pub session_id: SessionId,
    pub display_name: String,
    pub total: u32,
    pub max: u32,
    pub percentage: u32,
    pub finished_at: String,
}

/// A shared challenge: everyone who joins plays the same wine and questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub code: ChallengeCode,
    pub created_at: String,
    pub rounds_selected: RoundCount,
    pub is_black_glass: bool,
    pub wine_info: WineInfo,
    pub questions: Vec<Question>,
    pub entries: Vec<ChallengeEntry>,
}

impl Challenge {
    /// Entries ordered by percentage, then total; ties keep the order in
    /// which results were recorded (creator first, then by finishing time)
    pub fn leaderboard(&self) -> Vec<ChallengeEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| {
            b.percentage
                .cmp(&a.percentage)
                .then_with(|| b.total.cmp(&a.total))
        });
        entries
    }
}
