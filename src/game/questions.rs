//! Question assembly for one play-through

use super::distractors::{
    color_choices, country_choices, hemisphere_choices, region_choices, variety_choices,
    vintage_choices, ChoiceSet,
};
use crate::types::{Question, QuestionType, RoundCount, WineInfo};
use rand::Rng;

/// Build the ordered question list for a session.
///
/// Order is fixed: vintage, color (black glass only), variety, hemisphere,
/// country, region. Both rounds replay this same list.
pub fn build_questions<R: Rng + ?Sized>(
    rng: &mut R,
    wine: &WineInfo,
    rounds: RoundCount,
    is_black_glass: bool,
) -> Vec<Question> {
    let stamp = chrono::Utc::now().timestamp_millis();

    let mut sets: Vec<(QuestionType, ChoiceSet)> = Vec::with_capacity(6);
    sets.push((QuestionType::Vintage, vintage_choices(rng, wine.vintage)));
    if is_black_glass {
        sets.push((QuestionType::Color, color_choices(wine.color)));
    }
    sets.push((
        QuestionType::Variety,
        variety_choices(rng, &wine.variety, wine.color, is_black_glass),
    ));
    sets.push((QuestionType::Hemisphere, hemisphere_choices(&wine.country)));
    sets.push((QuestionType::Country, country_choices(rng, &wine.country)));
    sets.push((
        QuestionType::Region,
        region_choices(rng, &wine.country, &wine.region),
    ));

    let questions: Vec<Question> = sets
        .into_iter()
        .enumerate()
        .map(|(index, (question_type, set))| Question {
            id: format!("{}-{}", stamp, question_type.as_str()),
            question_type,
            text: question_type.prompt_text().to_string(),
            choices: set.choices,
            correct_answer: set.correct,
            sort_order: index as u32,
        })
        .collect();

    tracing::debug!(
        "Assembled {} questions ({} round(s), black glass: {})",
        questions.len(),
        rounds.count(),
        is_black_glass
    );

    questions
}
