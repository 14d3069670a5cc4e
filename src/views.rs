//! Query layer: chart-ready slices of the national and regional tables.
//!
//! Every function here reads the tables and returns fresh data; nothing is
//! cached between calls. An empty result means "no data for this selection".

use crate::aggregate::Table;
use crate::frames::cumulative_frames;
use crate::metrics::{baseline_multipliers, sex_ratios, Anchor};
use crate::normalize::geo_county;
use crate::types::{
    AgeGroup, ChoroplethRow, HeatmapRow, LineChartRow, MedicationCategory, PrescriptionRecord,
    RecordKey, Sex, SexRatioRow,
};
use crate::util::{format_number, format_opt, sample_std};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Exact-match criteria. `None` or an empty list matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub years: Vec<i32>,
    pub county: Option<String>,
    pub sexes: Vec<Sex>,
    pub age_groups: Vec<AgeGroup>,
    pub medication: Option<MedicationCategory>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.years.push(year);
        self
    }

    pub fn county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn sex(mut self, sex: Sex) -> Self {
        self.sexes.push(sex);
        self
    }

    pub fn age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_groups.push(age_group);
        self
    }

    pub fn medication(mut self, medication: MedicationCategory) -> Self {
        self.medication = Some(medication);
        self
    }

    pub fn matches(&self, r: &PrescriptionRecord) -> bool {
        (self.years.is_empty() || self.years.contains(&r.year))
            && self.county.as_deref().map_or(true, |c| r.county == c)
            && (self.sexes.is_empty() || self.sexes.contains(&r.sex))
            && (self.age_groups.is_empty() || self.age_groups.contains(&r.age_group))
            && self.medication.map_or(true, |m| r.medication_category == m)
    }
}

impl Table {
    pub fn select(&self, filter: &Filter) -> Vec<PrescriptionRecord> {
        self.records()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }
}

/// Legend label for a sex/age cell; the oldest band reads as young adults.
pub fn display_label(sex: Sex, age_group: AgeGroup) -> String {
    match (age_group, sex) {
        (AgeGroup::Age20To24, Sex::Boys) => "Young men 20-24".to_string(),
        (AgeGroup::Age20To24, Sex::Girls) => "Young women 20-24".to_string(),
        _ => format!("{} {}", sex, age_group),
    }
}

pub fn short_label(sex: Sex) -> &'static str {
    match sex {
        Sex::Boys => "Boys",
        Sex::Girls => "Girls",
        Sex::BothSexes => "Both",
    }
}

/// Animated line chart: national rates for one medication and a set of
/// sexes and ages, with growth since the first year, in cumulative frames.
pub fn line_chart_data(
    national: &Table,
    medication: MedicationCategory,
    sexes: &[Sex],
    age_groups: &[AgeGroup],
) -> Vec<LineChartRow> {
    let filter = Filter {
        sexes: sexes.to_vec(),
        age_groups: age_groups.to_vec(),
        medication: Some(medication),
        ..Filter::default()
    };
    let mut records = national.select(&filter);
    records.sort_by_key(|r| (r.sex, r.age_group, r.year));
    let multipliers = baseline_multipliers(
        &records,
        |r| (short_label(r.sex), r.age_group, r.medication_category),
        Anchor::First,
    );

    let growth: HashMap<RecordKey, Option<f64>> = records
        .iter()
        .map(PrescriptionRecord::key)
        .zip(multipliers)
        .collect();

    cumulative_frames(&records)
        .into_iter()
        .map(|f| LineChartRow {
            frame: f.frame,
            year: f.record.year,
            label: display_label(f.record.sex, f.record.age_group),
            age_group: f.record.age_group.to_string(),
            medication: f.record.medication_category.to_string(),
            patients_per_1000: format_number(f.record.patients_per_1000, 1),
            multiplier: format_opt(growth.get(&f.record.key()).copied().flatten(), 2),
        })
        .collect()
}

/// Heatmap cell: one county and year.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell {
    pub county: String,
    pub year: i32,
    pub patients_per_1000: f64,
    pub multiplier: Option<f64>,
}

/// County-by-year rates for one medication/sex/age, with growth measured
/// from each county's first positive value.
pub fn heatmap_data(
    regional: &Table,
    medication: MedicationCategory,
    sex: Sex,
    age_group: AgeGroup,
) -> Vec<HeatmapCell> {
    let filter = Filter::new().medication(medication).sex(sex).age_group(age_group);
    let mut records = regional.select(&filter);
    records.sort_by(|a, b| a.county.cmp(&b.county).then(a.year.cmp(&b.year)));
    let multipliers = baseline_multipliers(&records, |r| r.county.clone(), Anchor::FirstPositive);
    records
        .into_iter()
        .zip(multipliers)
        .map(|(r, multiplier)| HeatmapCell {
            county: r.county,
            year: r.year,
            patients_per_1000: r.patients_per_1000,
            multiplier,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethEntry {
    pub county: String,
    pub county_geo: &'static str,
    pub patients_per_1000: f64,
}

/// Regional "All medications" rates for one year/age/sex, keyed by the
/// boundary-file name. Counties without a boundary name are left out.
pub fn choropleth_slice(
    regional: &Table,
    year: i32,
    age_group: AgeGroup,
    sex: Sex,
) -> Vec<ChoroplethEntry> {
    let filter = Filter::new()
        .year(year)
        .age_group(age_group)
        .sex(sex)
        .medication(MedicationCategory::AllMedications);
    regional
        .select(&filter)
        .into_iter()
        .filter(|r| r.patients_per_1000.is_finite())
        .filter_map(|r| {
            geo_county(&r.county).map(|geo| ChoroplethEntry {
                county_geo: geo,
                county: r.county,
                patients_per_1000: r.patients_per_1000,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountyStats {
    pub highest: (String, f64),
    pub lowest: (String, f64),
    pub std_dev: Option<f64>,
}

/// Highest, lowest and spread of a choropleth slice. `None` when empty.
pub fn county_stats(entries: &[ChoroplethEntry]) -> Option<CountyStats> {
    let cmp = |a: &&ChoroplethEntry, b: &&ChoroplethEntry| {
        a.patients_per_1000
            .partial_cmp(&b.patients_per_1000)
            .unwrap_or(Ordering::Equal)
    };
    // First occurrence wins on ties.
    let highest = entries.iter().rev().max_by(cmp)?;
    let lowest = entries.iter().min_by(cmp)?;
    let values: Vec<f64> = entries.iter().map(|e| e.patients_per_1000).collect();
    Some(CountyStats {
        highest: (highest.county.clone(), highest.patients_per_1000),
        lowest: (lowest.county.clone(), lowest.patients_per_1000),
        std_dev: sample_std(&values),
    })
}

/// Upper bound of the map's color scale: 10% above the highest regional
/// "All medications" rate in any year.
pub fn color_scale_max(regional: &Table) -> Option<f64> {
    regional
        .records()
        .iter()
        .filter(|r| r.medication_category.is_aggregate())
        .map(|r| r.patients_per_1000)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .map(|max| max * 1.1)
}

/// National "All medications" rates for boys and girls in the given years.
pub fn year_comparison(national: &Table, years: &[i32]) -> Vec<PrescriptionRecord> {
    let filter = Filter {
        years: years.to_vec(),
        sexes: vec![Sex::Boys, Sex::Girls],
        medication: Some(MedicationCategory::AllMedications),
        ..Filter::default()
    };
    let mut records = national.select(&filter);
    records.sort_by_key(|r| (r.sex, r.year, r.age_group));
    records
}

/// Boys/girls ratios for one medication, ready for export.
pub fn sex_ratio_rows(national: &Table, medication: MedicationCategory) -> Vec<SexRatioRow> {
    let records = national.select(&Filter::new().medication(medication));
    sex_ratios(&records)
        .into_iter()
        .map(|r| SexRatioRow {
            year: r.year,
            age_group: r.age_group.to_string(),
            boys: format_number(r.boys, 1),
            girls: format_number(r.girls, 1),
            ratio: format_number(r.ratio, 2),
        })
        .collect()
}

pub fn heatmap_rows(cells: &[HeatmapCell]) -> Vec<HeatmapRow> {
    cells
        .iter()
        .map(|c| HeatmapRow {
            county: c.county.clone(),
            year: c.year,
            patients_per_1000: format_number(c.patients_per_1000, 1),
            multiplier: format_opt(c.multiplier, 2),
        })
        .collect()
}

pub fn choropleth_rows(entries: &[ChoroplethEntry]) -> Vec<ChoroplethRow> {
    entries
        .iter()
        .map(|e| ChoroplethRow {
            county: e.county.clone(),
            county_geo: e.county_geo.to_string(),
            patients_per_1000: format_number(e.patients_per_1000, 1),
        })
        .collect()
}
