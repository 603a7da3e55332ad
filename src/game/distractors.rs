//! Answer choice generation
//!
//! Each generator returns the true value plus a handful of plausible decoys.
//! Sampling is always done over a finite candidate list, so a small pool
//! yields fewer choices rather than retrying forever.

use super::catalog::{
    all_regions, regions_for, varieties_for, COLOR_CHOICES, COUNTRY_POOL, FUTURE_VINTAGES,
    HEMISPHERE_CHOICES, REALISTIC_VINTAGES, RED_VARIETIES, SOUTHERN_HEMISPHERE_COUNTRIES,
    UNKNOWN_REGION_POOL, UNUSUAL_VINTAGE_OFFSETS, WHITE_VARIETIES,
};
use crate::types::WineColor;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Choices for one question in display order, plus the correct entry
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSet {
    pub choices: Vec<String>,
    pub correct: String,
}

impl ChoiceSet {
    /// Build a lexicographically ordered choice set
    fn sorted(correct: &str, decoys: &[&str]) -> Self {
        let mut choices: Vec<String> = Vec::with_capacity(decoys.len() + 1);
        for value in std::iter::once(correct).chain(decoys.iter().copied()) {
            if !choices.iter().any(|c| c == value) {
                choices.push(value.to_string());
            }
        }
        choices.sort();
        Self {
            choices,
            correct: correct.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    Northern,
    Southern,
}

impl Hemisphere {
    pub fn of_country(country: &str) -> Self {
        if SOUTHERN_HEMISPHERE_COUNTRIES.contains(&country) {
            Hemisphere::Southern
        } else {
            Hemisphere::Northern
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Hemisphere::Northern => "Northern",
            Hemisphere::Southern => "Southern",
        }
    }
}

/// Draw up to `count` distinct entries from `pool` that are not in `exclude`
fn sample_excluding<R: Rng + ?Sized>(
    rng: &mut R,
    pool: impl IntoIterator<Item = &'static str>,
    exclude: &[&str],
    count: usize,
) -> Vec<&'static str> {
    let mut candidates: Vec<&'static str> = Vec::new();
    for candidate in pool {
        if !exclude.contains(&candidate) && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates.choose_multiple(rng, count).copied().collect()
}

/// Vintage: the true year, up to two neighbours and one clearly-off outlier
pub fn vintage_choices<R: Rng + ?Sized>(rng: &mut R, vintage: i32) -> ChoiceSet {
    let mut neighbours: Vec<i32> = [-2, -1, 1, 2]
        .iter()
        .filter_map(|offset| vintage.checked_add(*offset))
        .filter(|year| REALISTIC_VINTAGES.contains(year))
        .collect();
    neighbours.shuffle(rng);
    neighbours.truncate(2);

    let mut years = vec![vintage];
    years.extend(neighbours);
    years.push(unusual_vintage(rng, vintage));
    years.sort_unstable();
    years.dedup();

    ChoiceSet {
        choices: years.iter().map(ToString::to_string).collect(),
        correct: vintage.to_string(),
    }
}

/// Either a year well before the vintage or a year that hasn't happened yet
pub fn unusual_vintage<R: Rng + ?Sized>(rng: &mut R, vintage: i32) -> i32 {
    let past = vintage.saturating_sub(rng.random_range(UNUSUAL_VINTAGE_OFFSETS));
    let future = rng.random_range(FUTURE_VINTAGES);
    if future != vintage && (past == vintage || rng.random_bool(0.5)) {
        return future;
    }
    past
}

/// Color: fixed choice set, only asked with black glass
pub fn color_choices(color: WineColor) -> ChoiceSet {
    let correct = color.choice_label();
    let decoys: Vec<&str> = COLOR_CHOICES
        .iter()
        .copied()
        .filter(|c| *c != correct)
        .collect();
    ChoiceSet::sorted(correct, &decoys)
}

/// Variety decoys. With black glass the color is unknown, so decoys span
/// red and white families; otherwise they come from the wine's own family.
pub fn variety_choices<R: Rng + ?Sized>(
    rng: &mut R,
    variety: &str,
    color: WineColor,
    black_glass: bool,
) -> ChoiceSet {
    let decoys = if black_glass {
        let mut picked: Vec<&'static str> = Vec::with_capacity(3);
        let red = sample_excluding(rng, RED_VARIETIES.iter().copied(), &[variety], 1);
        picked.extend(red);

        let mut exclude: Vec<&str> = vec![variety];
        exclude.extend(picked.iter().copied());
        let white = sample_excluding(rng, WHITE_VARIETIES.iter().copied(), &exclude, 1);
        picked.extend(white);

        let mut exclude: Vec<&str> = vec![variety];
        exclude.extend(picked.iter().copied());
        let filler = sample_excluding(
            rng,
            RED_VARIETIES.iter().chain(WHITE_VARIETIES).copied(),
            &exclude,
            1,
        );
        picked.extend(filler);
        picked
    } else {
        sample_excluding(rng, varieties_for(color).iter().copied(), &[variety], 3)
    };

    ChoiceSet::sorted(variety, &decoys)
}

/// Hemisphere: fixed three-way choice, Equator is never correct
pub fn hemisphere_choices(country: &str) -> ChoiceSet {
    let correct = Hemisphere::of_country(country).label();
    let decoys: Vec<&str> = HEMISPHERE_CHOICES
        .iter()
        .copied()
        .filter(|c| *c != correct)
        .collect();
    ChoiceSet::sorted(correct, &decoys)
}

pub fn country_choices<R: Rng + ?Sized>(rng: &mut R, country: &str) -> ChoiceSet {
    let decoys = sample_excluding(rng, COUNTRY_POOL.iter().copied(), &[country], 3);
    ChoiceSet::sorted(country, &decoys)
}

/// Region: up to two decoys from the same country plus one outlier from anywhere
pub fn region_choices<R: Rng + ?Sized>(rng: &mut R, country: &str, region: &str) -> ChoiceSet {
    let pool = regions_for(country).unwrap_or_else(|| {
        tracing::warn!(
            "No region table for country {}, using placeholder pool",
            country
        );
        UNKNOWN_REGION_POOL
    });

    let mut decoys = sample_excluding(rng, pool.iter().copied(), &[region], 2);

    let mut exclude: Vec<&str> = vec![region];
    exclude.extend(decoys.iter().copied());
    decoys.extend(sample_excluding(rng, all_regions(), &exclude, 1));

    ChoiceSet::sorted(region, &decoys)
}
