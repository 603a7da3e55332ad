//! Static wine knowledge used to build answer choices
//!
//! The tables are deliberately small. Countries without a region table fall
//! back to [`UNKNOWN_REGION_POOL`] instead of borrowing another country's regions.

use crate::types::{WineColor, WineInfo};
use std::ops::RangeInclusive;

/// Vintages considered plausible neighbours of the true vintage
pub const REALISTIC_VINTAGES: RangeInclusive<i32> = 2010..=2024;
/// Future years used as the "unusual" vintage decoy
pub const FUTURE_VINTAGES: RangeInclusive<i32> = 2025..=2027;
/// How far back the past "unusual" vintage decoy reaches
pub const UNUSUAL_VINTAGE_OFFSETS: RangeInclusive<i32> = 5..=14;
/// Vintages a recognised label may carry at all
pub const PLAUSIBLE_VINTAGES: RangeInclusive<i32> = 1800..=2100;

pub const SOUTHERN_HEMISPHERE_COUNTRIES: &[&str] = &[
    "Australia",
    "New Zealand",
    "South Africa",
    "Chile",
    "Argentina",
];

pub const HEMISPHERE_CHOICES: &[&str] = &["Northern", "Southern", "Equator"];

pub const COLOR_CHOICES: &[&str] = &["White", "Red", "Rosé", "Other"];

pub const COUNTRY_POOL: &[&str] = &[
    "France",
    "Italy",
    "Spain",
    "Germany",
    "USA",
    "Australia",
    "New Zealand",
    "Chile",
    "Argentina",
    "South Africa",
];

pub const RED_VARIETIES: &[&str] = &[
    "Cabernet Sauvignon",
    "Merlot",
    "Pinot Noir",
    "Syrah",
    "Malbec",
    "Tempranillo",
    "Sangiovese",
    "Nebbiolo",
    "Grenache",
    "Zinfandel",
];

pub const WHITE_VARIETIES: &[&str] = &[
    "Chardonnay",
    "Sauvignon Blanc",
    "Riesling",
    "Pinot Grigio",
    "Chenin Blanc",
    "Viognier",
    "Gewürztraminer",
    "Albariño",
    "Sémillon",
];

pub const ROSE_VARIETIES: &[&str] = &["Grenache", "Cinsault", "Mourvèdre", "Syrah", "Pinot Noir"];

pub const SPARKLING_VARIETIES: &[&str] = &["Chardonnay", "Pinot Noir", "Pinot Meunier"];

/// Single placeholder entry used when a country has no region table
pub const UNKNOWN_REGION_POOL: &[&str] = &["Other"];

pub const REGIONS: &[(&str, &[&str])] = &[
    (
        "France",
        &[
            "Bordeaux",
            "Burgundy",
            "Champagne",
            "Rhône Valley",
            "Loire Valley",
            "Alsace",
            "Provence",
        ],
    ),
    ("Italy", &["Tuscany", "Piedmont", "Veneto", "Sicily"]),
    (
        "Spain",
        &["Rioja", "Ribera del Duero", "Priorat", "Rías Baixas"],
    ),
    ("Germany", &["Mosel"]),
    (
        "USA",
        &["Napa Valley", "Sonoma", "Willamette Valley", "Paso Robles"],
    ),
    (
        "Australia",
        &[
            "Barossa Valley",
            "McLaren Vale",
            "Margaret River",
            "Clare Valley",
        ],
    ),
    (
        "New Zealand",
        &["Marlborough", "Central Otago", "Hawke's Bay"],
    ),
    (
        "Chile",
        &["Maipo Valley", "Colchagua Valley", "Casablanca Valley"],
    ),
    ("Argentina", &["Mendoza", "Salta", "Patagonia"]),
    ("South Africa", &["Stellenbosch", "Swartland"]),
];

/// Varieties belonging to the same color family
pub fn varieties_for(color: WineColor) -> &'static [&'static str] {
    match color {
        WineColor::Red => RED_VARIETIES,
        WineColor::White => WHITE_VARIETIES,
        WineColor::Rose => ROSE_VARIETIES,
        WineColor::Sparkling => SPARKLING_VARIETIES,
    }
}

/// Region table for a country, if we know one
pub fn regions_for(country: &str) -> Option<&'static [&'static str]> {
    REGIONS
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, regions)| *regions)
}

/// Every known region across all countries
pub fn all_regions() -> impl Iterator<Item = &'static str> {
    REGIONS.iter().flat_map(|(_, regions)| regions.iter().copied())
}

/// Bottles the mock label reader can "recognise"
pub fn label_candidates() -> Vec<WineInfo> {
    let wine = |vintage, country: &str, region: &str, variety: &str, producer: &str, color| {
        WineInfo {
            vintage,
            country: country.to_string(),
            region: region.to_string(),
            variety: variety.to_string(),
            producer: producer.to_string(),
            color,
        }
    };

    vec![
        wine(
            2018,
            "France",
            "Bordeaux",
            "Cabernet Sauvignon",
            "Château Margaux",
            WineColor::Red,
        ),
        wine(
            2021,
            "New Zealand",
            "Marlborough",
            "Sauvignon Blanc",
            "Cloudy Bay",
            WineColor::White,
        ),
        wine(
            2016,
            "Italy",
            "Tuscany",
            "Sangiovese",
            "Antinori",
            WineColor::Red,
        ),
        wine(
            2019,
            "Australia",
            "Barossa Valley",
            "Syrah",
            "Penfolds",
            WineColor::Red,
        ),
        wine(
            2022,
            "France",
            "Provence",
            "Grenache",
            "Château d'Esclans",
            WineColor::Rose,
        ),
        wine(
            2015,
            "France",
            "Champagne",
            "Chardonnay",
            "Ruinart",
            WineColor::Sparkling,
        ),
        wine(
            2017,
            "Argentina",
            "Mendoza",
            "Malbec",
            "Catena Zapata",
            WineColor::Red,
        ),
    ]
}
