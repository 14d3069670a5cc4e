//! Translation of source-locale labels into canonical codes.
//!
//! Sex, age and medication tables are closed: an unknown label maps to
//! `None` and the row is dropped by the caller. County names fall back to the
//! raw string so that an unexpected region still displays.

use crate::types::{AgeGroup, MedicationCategory, Sex};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// ATC code + Swedish substance name, as exported by the statistics database.
static MEDICATION_MAP: Lazy<HashMap<&'static str, MedicationCategory>> = Lazy::new(|| {
    HashMap::from([
        ("N06BA04 Metylfenidat", MedicationCategory::Methylphenidate),
        ("N06BA12 Lisdexamfetamin", MedicationCategory::Lisdexamfetamine),
        ("N06BA02 Dexamfetamin", MedicationCategory::Dextroamphetamine),
        ("N06BA09 Atomoxetin", MedicationCategory::Atomoxetine),
        ("C02AC02 Guanfacin", MedicationCategory::Guanfacine),
    ])
});

static SEX_MAP: Lazy<HashMap<&'static str, Sex>> = Lazy::new(|| {
    HashMap::from([
        ("Män", Sex::Boys),
        ("Kvinnor", Sex::Girls),
        ("Båda könen", Sex::BothSexes),
    ])
});

/// Long county names (`"... län"`) plus the short spellings some exports use,
/// all pointing at the canonical display name.
static COUNTY_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Blekinge län", "Blekinge"),
        ("Dalarnas län", "Dalarna"),
        ("Gotlands län", "Gotland"),
        ("Gävleborgs län", "Gävleborg"),
        ("Hallands län", "Halland"),
        ("Jämtlands län", "Jämtland Härjedalen"),
        ("Jämtland", "Jämtland Härjedalen"),
        ("Jönköpings län", "Jönköping"),
        ("Kalmar län", "Kalmar"),
        ("Kronobergs län", "Kronoberg"),
        ("Norrbottens län", "Norrbotten"),
        ("Skåne län", "Skåne"),
        ("Stockholms län", "Stockholm"),
        ("Södermanlands län", "Södermanland"),
        ("Uppsala län", "Uppsala"),
        ("Värmlands län", "Värmland"),
        ("Västerbottens län", "Västerbotten"),
        ("Västernorrlands län", "Västernorrland"),
        ("Västmanlands län", "Västmanland"),
        ("Västra Götalands län", "Västra Götaland"),
        ("Örebro län", "Örebro"),
        ("Östergötlands län", "Östergötland"),
    ])
});

/// Canonical county name -> feature name in the boundary file.
static GEO_NAME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Stockholm", "Stockholm"),
        ("Dalarna", "Dalarna"),
        ("Uppsala", "Uppsala"),
        ("Skåne", "Skåne"),
        ("Västra Götaland", "Västra Götaland"),
        ("Södermanland", "Södermanland"),
        ("Östergötland", "Östergötland"),
        ("Jönköping", "Jönköping"),
        ("Kalmar", "Kalmar"),
        ("Kronoberg", "Kronoberg"),
        ("Blekinge", "Blekinge"),
        ("Gotland", "Gotland"),
        ("Värmland", "Värmland"),
        ("Västmanland", "Västmanland"),
        ("Örebro", "Örebro"),
        ("Gävleborg", "Gävleborg"),
        ("Västernorrland", "Västernorrland"),
        ("Jämtland Härjedalen", "Jämtland"),
        ("Västerbotten", "Västerbotten"),
        ("Norrbotten", "Norrbotten"),
        ("Halland", "Halland"),
    ])
});

/// Swedish sex labels accepted by the importer.
pub const VALID_SOURCE_SEXES: [&str; 3] = ["Män", "Kvinnor", "Båda könen"];

pub fn medication(raw: &str) -> Option<MedicationCategory> {
    MEDICATION_MAP.get(raw.trim()).copied()
}

pub fn sex(raw: &str) -> Option<Sex> {
    SEX_MAP.get(raw.trim()).copied()
}

/// Age labels in the source already use the canonical `5-9` spelling.
pub fn age_group(raw: &str) -> Option<AgeGroup> {
    AgeGroup::from_label(raw)
}

pub fn is_valid_source_sex(raw: &str) -> bool {
    SEX_MAP.contains_key(raw.trim())
}

pub fn is_valid_source_age(raw: &str) -> bool {
    age_group(raw).is_some()
}

/// Canonical county name. Unmapped names come back trimmed but otherwise
/// unchanged, which also makes the function idempotent.
pub fn county(raw: &str) -> String {
    let raw = raw.trim();
    COUNTY_MAP.get(raw).copied().unwrap_or(raw).to_string()
}

/// Boundary-file name for a canonical county, if it has one.
pub fn geo_county(canonical: &str) -> Option<&'static str> {
    GEO_NAME_MAP.get(canonical).copied()
}
