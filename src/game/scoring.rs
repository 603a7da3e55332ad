//! Score totals, percentage and the end-of-game summary

use crate::types::{RoundCount, Scores};
use serde::{Deserialize, Serialize};

pub const GREAT_IMPROVEMENT_MESSAGE: &str =
    "Great improvement! Seeing the label really sharpened your answers.";
pub const STEADY_MESSAGE: &str = "Rock steady: same score blind and with the label.";
pub const BLIND_INSTINCT_MESSAGE: &str =
    "Your blind instincts beat the label. Trust your palate!";

/// Qualitative band for a percentage score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Exceptional,
    Strong,
    Good,
    Middling,
    Weak,
}

impl ScoreBand {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => ScoreBand::Exceptional,
            75..=89 => ScoreBand::Strong,
            60..=74 => ScoreBand::Good,
            40..=59 => ScoreBand::Middling,
            _ => ScoreBand::Weak,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreBand::Exceptional => "Outstanding! You have the palate of a sommelier.",
            ScoreBand::Strong => "Excellent tasting. You really know your wines.",
            ScoreBand::Good => "Good effort! Your palate is developing nicely.",
            ScoreBand::Middling => "Not bad! Keep tasting and you'll sharpen your skills.",
            ScoreBand::Weak => "Every expert was once a beginner. Keep exploring!",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ScoreBand::Exceptional => "🏆",
            ScoreBand::Strong => "🥂",
            ScoreBand::Good => "🍷",
            ScoreBand::Middling => "🍇",
            ScoreBand::Weak => "🌱",
        }
    }
}

/// Final result of a play-through
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSummary {
    pub round1: u32,
    pub round2: u32,
    pub rounds_selected: RoundCount,
    pub total: u32,
    pub max: u32,
    pub percentage: u32,
    pub band: ScoreBand,
    pub message: String,
    /// Round-over-round comparison, two-round games only
    pub improvement: Option<String>,
    /// Guests get nudged to create an account after the game
    pub signup_prompt: bool,
}

pub fn total_score(scores: &Scores, rounds: RoundCount) -> u32 {
    match rounds {
        RoundCount::One => scores.round1,
        RoundCount::Two => scores.round1 + scores.round2,
    }
}

pub fn max_score(question_count: usize, rounds: RoundCount) -> u32 {
    question_count as u32 * rounds.count()
}

/// Rounded percentage, 0 when there was nothing to score
pub fn percentage(total: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    (f64::from(total) / f64::from(max) * 100.0).round() as u32
}

pub fn improvement_message(scores: &Scores) -> &'static str {
    match scores.round2.cmp(&scores.round1) {
        std::cmp::Ordering::Greater => GREAT_IMPROVEMENT_MESSAGE,
        std::cmp::Ordering::Equal => STEADY_MESSAGE,
        std::cmp::Ordering::Less => BLIND_INSTINCT_MESSAGE,
    }
}

pub fn summarize(
    scores: &Scores,
    question_count: usize,
    rounds: RoundCount,
    signed_in: bool,
) -> GameSummary {
    let total = total_score(scores, rounds);
    let max = max_score(question_count, rounds);
    let percentage = percentage(total, max);
    let band = ScoreBand::from_percentage(percentage);

    let improvement = match rounds {
        RoundCount::One => None,
        RoundCount::Two => Some(improvement_message(scores).to_string()),
    };

    GameSummary {
        round1: scores.round1,
        round2: scores.round2,
        rounds_selected: rounds,
        total,
        max,
        percentage,
        band,
        message: band.message().to_string(),
        improvement,
        signup_prompt: !signed_in,
    }
}

/// Plain-text summary handed to the system share sheet or clipboard
pub fn share_text(summary: &GameSummary, base_url: &str, challenge_code: Option<&str>) -> String {
    let url = match challenge_code {
        Some(code) => format!("{}?challenge={}", base_url, code),
        None => base_url.to_string(),
    };
    format!(
        "{} I scored {}/{} ({}%) on Wine Options! Think you can beat me? {}",
        summary.band.emoji(),
        summary.total,
        summary.max,
        summary.percentage,
        url
    )
}
