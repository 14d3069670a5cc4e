use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Region label used by the source for country-level rows.
pub const NATIONAL_COUNTY: &str = "Riket";

/// Reference year for multipliers and percent change.
pub const BASELINE_YEAR: i32 = 2006;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    Boys,
    Girls,
    #[serde(rename = "Both sexes")]
    BothSexes,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Boys, Sex::Girls, Sex::BothSexes];

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Boys => "Boys",
            Sex::Girls => "Girls",
            Sex::BothSexes => "Both sexes",
        }
    }

    /// Parse the canonical English label.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sex| sex.as_str() == s.trim())
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age bands, ordered youngest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "5-9")]
    Age5To9,
    #[serde(rename = "10-14")]
    Age10To14,
    #[serde(rename = "15-19")]
    Age15To19,
    #[serde(rename = "20-24")]
    Age20To24,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Age5To9,
        AgeGroup::Age10To14,
        AgeGroup::Age15To19,
        AgeGroup::Age20To24,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Age5To9 => "5-9",
            AgeGroup::Age10To14 => "10-14",
            AgeGroup::Age15To19 => "15-19",
            AgeGroup::Age20To24 => "20-24",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|age| age.as_str() == s.trim())
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the five tracked ADHD medications, or the independently sourced
/// "All medications" series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MedicationCategory {
    Methylphenidate,
    Lisdexamfetamine,
    Dextroamphetamine,
    Atomoxetine,
    Guanfacine,
    #[serde(rename = "All medications")]
    AllMedications,
}

impl MedicationCategory {
    pub const SINGLE: [MedicationCategory; 5] = [
        MedicationCategory::Methylphenidate,
        MedicationCategory::Lisdexamfetamine,
        MedicationCategory::Dextroamphetamine,
        MedicationCategory::Atomoxetine,
        MedicationCategory::Guanfacine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MedicationCategory::Methylphenidate => "Methylphenidate",
            MedicationCategory::Lisdexamfetamine => "Lisdexamfetamine",
            MedicationCategory::Dextroamphetamine => "Dextroamphetamine",
            MedicationCategory::Atomoxetine => "Atomoxetine",
            MedicationCategory::Guanfacine => "Guanfacine",
            MedicationCategory::AllMedications => "All medications",
        }
    }

    pub fn is_aggregate(self) -> bool {
        self == MedicationCategory::AllMedications
    }

    /// Resolve a selection from the medication dropdown. The dropdown's
    /// visual `separator` entry falls back to the aggregate series.
    pub fn from_selection(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == "separator" {
            return Some(MedicationCategory::AllMedications);
        }
        Self::SINGLE
            .into_iter()
            .chain([MedicationCategory::AllMedications])
            .find(|m| m.as_str() == s)
    }
}

impl fmt::Display for MedicationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rows of a source sheet to keep, by the `Region` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionScope {
    National,
    Regional,
    All,
}

impl RegionScope {
    pub fn includes(self, county: &str) -> bool {
        match self {
            RegionScope::National => county == NATIONAL_COUNTY,
            RegionScope::Regional => county != NATIONAL_COUNTY,
            RegionScope::All => true,
        }
    }
}

/// Row of the pre-processed flat CSV. Every field is read as text so that a
/// malformed cell only costs its own row.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Mått", alias = "measure", default)]
    pub measure: Option<String>,
    #[serde(rename = "Läkemedel", alias = "medication", default)]
    pub medication: Option<String>,
    #[serde(rename = "Region", alias = "county", alias = "region", default)]
    pub county: Option<String>,
    #[serde(rename = "Kön", alias = "sex", alias = "gender", default)]
    pub sex: Option<String>,
    #[serde(rename = "Ålder", alias = "age_group", default)]
    pub age_group: Option<String>,
    #[serde(rename = "År", alias = "year", default)]
    pub year: Option<String>,
    #[serde(rename = "Patienter/1000 invånare", alias = "patients_per_1000", default)]
    pub patients_per_1000: Option<String>,
}

/// Long-format row as imported, labels still in the source locale.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLongRow {
    pub measure: String,
    pub medication: String,
    pub county: String,
    pub sex: String,
    pub age_group: String,
    pub year: i32,
    pub patients_per_1000: f64,
}

/// One observed rate: patients per 1000 inhabitants in a demographic cell.
///
/// `(county, sex, age_group, medication_category, year)` is unique within a
/// table. Values above 1000 are legal for some subgroup definitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionRecord {
    pub year: i32,
    pub county: String,
    pub sex: Sex,
    pub age_group: AgeGroup,
    pub medication_category: MedicationCategory,
    pub patients_per_1000: f64,
}

pub type RecordKey = (String, Sex, AgeGroup, MedicationCategory, i32);

impl PrescriptionRecord {
    pub fn key(&self) -> RecordKey {
        (
            self.county.clone(),
            self.sex,
            self.age_group,
            self.medication_category,
            self.year,
        )
    }
}

/// Record tagged with the animation frame it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame: i32,
    pub record: PrescriptionRecord,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LineChartRow {
    #[serde(rename = "Frame")]
    #[tabled(rename = "Frame")]
    pub frame: i32,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "AgeGroup")]
    #[tabled(rename = "AgeGroup")]
    pub age_group: String,
    #[serde(rename = "Medication")]
    #[tabled(rename = "Medication")]
    pub medication: String,
    #[serde(rename = "PatientsPer1000")]
    #[tabled(rename = "PatientsPer1000")]
    pub patients_per_1000: String,
    #[serde(rename = "Multiplier")]
    #[tabled(rename = "Multiplier")]
    pub multiplier: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SexRatioRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "AgeGroup")]
    #[tabled(rename = "AgeGroup")]
    pub age_group: String,
    #[serde(rename = "Boys")]
    #[tabled(rename = "Boys")]
    pub boys: String,
    #[serde(rename = "Girls")]
    #[tabled(rename = "Girls")]
    pub girls: String,
    #[serde(rename = "BoysGirlsRatio")]
    #[tabled(rename = "BoysGirlsRatio")]
    pub ratio: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChoroplethRow {
    #[serde(rename = "County")]
    #[tabled(rename = "County")]
    pub county: String,
    #[serde(rename = "CountyGeo")]
    #[tabled(rename = "CountyGeo")]
    pub county_geo: String,
    #[serde(rename = "PatientsPer1000")]
    #[tabled(rename = "PatientsPer1000")]
    pub patients_per_1000: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HeatmapRow {
    #[serde(rename = "County")]
    #[tabled(rename = "County")]
    pub county: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "PatientsPer1000")]
    #[tabled(rename = "PatientsPer1000")]
    pub patients_per_1000: String,
    #[serde(rename = "Multiplier")]
    #[tabled(rename = "Multiplier")]
    pub multiplier: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ComparisonRow {
    #[serde(rename = "Sex")]
    #[tabled(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "AgeGroup")]
    #[tabled(rename = "AgeGroup")]
    pub age_group: String,
    #[serde(rename = "PatientsPer1000")]
    #[tabled(rename = "PatientsPer1000")]
    pub patients_per_1000: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub national_rows: usize,
    pub regional_rows: usize,
    pub counties: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub map_year: i32,
    pub map_age_group: AgeGroup,
    pub map_sex: Sex,
    pub trend_context: String,
    pub national_percent: Option<f64>,
    pub highest_county: Option<String>,
    pub lowest_county: Option<String>,
    pub county_std_dev: Option<f64>,
    pub color_scale_max: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_selects_the_aggregate() {
        assert_eq!(
            MedicationCategory::from_selection("separator"),
            Some(MedicationCategory::AllMedications)
        );
        assert_eq!(
            MedicationCategory::from_selection("Guanfacine"),
            Some(MedicationCategory::Guanfacine)
        );
        assert_eq!(MedicationCategory::from_selection("Modafinil"), None);
    }

    #[test]
    fn canonical_labels_parse_back() {
        for sex in Sex::ALL {
            assert_eq!(Sex::from_label(sex.as_str()), Some(sex));
        }
        assert_eq!(AgeGroup::from_label(" 15-19 "), Some(AgeGroup::Age15To19));
        assert_eq!(Sex::from_label("Both genders"), None);
    }

    #[test]
    fn scope_splits_on_the_national_label() {
        assert!(RegionScope::National.includes("Riket"));
        assert!(!RegionScope::National.includes("Skåne"));
        assert!(RegionScope::Regional.includes("Skåne län"));
        assert!(RegionScope::All.includes("Riket"));
    }
}
