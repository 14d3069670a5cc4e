//! National and regional tables.
//!
//! Each table joins the per-medication rows with the "All medications"
//! series, which comes from its own source files. The aggregate series is
//! never summed from the five single medications.

use crate::config::Config;
use crate::loader::{import_source_sheets, load_processed, LoadReport};
use crate::normalize;
use crate::types::{
    MedicationCategory, PrescriptionRecord, RawLongRow, RecordKey, RegionScope,
};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::{info, warn};

/// Read-only set of records, unique on
/// `(county, sex, age_group, medication_category, year)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<PrescriptionRecord>,
}

impl Table {
    /// Build a table, keeping the first record for any repeated key.
    pub fn new(records: Vec<PrescriptionRecord>) -> Self {
        let mut seen: HashSet<RecordKey> = HashSet::with_capacity(records.len());
        let before = records.len();
        let records: Vec<PrescriptionRecord> =
            records.into_iter().filter(|r| seen.insert(r.key())).collect();
        if records.len() < before {
            warn!(dropped = before - records.len(), "dropped duplicate records");
        }
        Self { records }
    }

    pub fn records(&self) -> &[PrescriptionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn counties(&self) -> Vec<&str> {
        let mut counties: Vec<&str> = self.records.iter().map(|r| r.county.as_str()).collect();
        counties.sort_unstable();
        counties.dedup();
        counties
    }
}

/// Normalize one raw row. `category` is `None` for per-medication rows,
/// which then take their category from the medication label.
fn normalize_row(
    row: &RawLongRow,
    category: Option<MedicationCategory>,
    years: &RangeInclusive<i32>,
) -> Option<PrescriptionRecord> {
    if !years.contains(&row.year) {
        return None;
    }
    let medication_category = match category {
        Some(c) => c,
        None => normalize::medication(&row.medication)?,
    };
    Some(PrescriptionRecord {
        year: row.year,
        county: normalize::county(&row.county),
        sex: normalize::sex(&row.sex)?,
        age_group: normalize::age_group(&row.age_group)?,
        medication_category,
        patients_per_1000: row.patients_per_1000,
    })
}

/// Combine per-medication rows with the aggregate series for one scope.
///
/// Per-medication rows whose label is not one of the five known drugs are
/// dropped. A missing aggregate import leaves the per-medication rows alone.
pub fn build_table(
    per_medication: &[RawLongRow],
    all_medications: Option<&[RawLongRow]>,
    scope: RegionScope,
    years: &RangeInclusive<i32>,
) -> Table {
    let mut records: Vec<PrescriptionRecord> = per_medication
        .iter()
        .filter(|r| scope.includes(r.county.trim()))
        .filter_map(|r| normalize_row(r, None, years))
        .collect();
    let single = records.len();

    match all_medications {
        Some(rows) => records.extend(
            rows.iter()
                .filter(|r| scope.includes(r.county.trim()))
                .filter_map(|r| normalize_row(r, Some(MedicationCategory::AllMedications), years)),
        ),
        None => warn!(?scope, "no \"All medications\" series; table holds single medications only"),
    }
    info!(?scope, single, aggregate = records.len() - single, "built table");
    Table::new(records)
}

pub fn build_national(
    per_medication: &[RawLongRow],
    all_medications: Option<&[RawLongRow]>,
    years: &RangeInclusive<i32>,
) -> Table {
    build_table(per_medication, all_medications, RegionScope::National, years)
}

/// County names in the aggregate import use the `"... län"` scheme; they
/// pass through the canonical county table so both halves share keys.
pub fn build_regional(
    per_medication: &[RawLongRow],
    all_medications: Option<&[RawLongRow]>,
    years: &RangeInclusive<i32>,
) -> Table {
    build_table(per_medication, all_medications, RegionScope::Regional, years)
}

/// The two tables the query layer reads from. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub national: Table,
    pub regional: Table,
}

impl Dataset {
    pub fn from_sources(
        per_medication: &[RawLongRow],
        all_medications: Option<&[RawLongRow]>,
        years: &RangeInclusive<i32>,
    ) -> Self {
        Self {
            national: build_national(per_medication, all_medications, years),
            regional: build_regional(per_medication, all_medications, years),
        }
    }

    /// Load every source named by `config`. Missing files degrade to empty
    /// inputs; the load report is `None` when the processed CSV was unreadable.
    pub fn load(config: &Config) -> (Self, Option<LoadReport>) {
        let (per_medication, report) = match load_processed(&config.processed_csv) {
            Ok((rows, report)) => (rows, Some(report)),
            Err(e) if e.is_not_found() => {
                warn!(path = %config.processed_csv.display(), "processed CSV not found; continuing without per-medication data");
                (Vec::new(), None)
            }
            Err(e) => {
                warn!("continuing without per-medication data: {e}");
                (Vec::new(), None)
            }
        };
        let all_medications = import_source_sheets(&config.source_paths(), RegionScope::All);
        let dataset = Self::from_sources(&per_medication, all_medications.as_deref(), &config.years);
        info!(
            national = dataset.national.len(),
            regional = dataset.regional.len(),
            "data processing completed"
        );
        (dataset, report)
    }

    pub fn is_empty(&self) -> bool {
        self.national.is_empty() && self.regional.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgeGroup, Sex};

    fn is_scoped(table: &Table, scope: RegionScope) -> bool {
        table.records().iter().all(|r| scope.includes(&r.county))
    }

    fn raw(medication: &str, county: &str, sex: &str, year: i32, value: f64) -> RawLongRow {
        RawLongRow {
            measure: "Patienter/1000 invånare".into(),
            medication: medication.into(),
            county: county.into(),
            sex: sex.into(),
            age_group: "10-14".into(),
            year,
            patients_per_1000: value,
        }
    }

    fn per_medication() -> Vec<RawLongRow> {
        vec![
            raw("N06BA04 Metylfenidat", "Riket", "Män", 2006, 20.0),
            raw("N06BA04 Metylfenidat", "Jämtland Härjedalen", "Män", 2006, 18.0),
            raw("N06BA07 Modafinil", "Riket", "Män", 2006, 1.0),
            raw("N06BA09 Atomoxetin", "Riket", "Kvinnor", 2006, 2.0),
        ]
    }

    fn all_medications() -> Vec<RawLongRow> {
        vec![
            raw("N06B ADHD-läkemedel", "Riket", "Män", 2006, 30.0),
            raw("N06B ADHD-läkemedel", "Jämtlands län", "Män", 2006, 25.0),
        ]
    }

    #[test]
    fn unknown_medication_is_excluded() {
        let table = build_national(&per_medication(), None, &(2006..=2024));
        assert_eq!(table.len(), 2);
        assert!(table
            .records()
            .iter()
            .all(|r| !r.medication_category.is_aggregate()));
    }

    #[test]
    fn aggregate_series_is_labelled_not_summed() {
        let all = all_medications();
        let table = build_national(&per_medication(), Some(&all), &(2006..=2024));
        let aggregate: Vec<_> = table
            .records()
            .iter()
            .filter(|r| r.medication_category == MedicationCategory::AllMedications)
            .collect();
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate[0].patients_per_1000, 30.0);
        assert_eq!(aggregate[0].sex, Sex::Boys);
        assert!(is_scoped(&table, RegionScope::National));
    }

    #[test]
    fn regional_counties_share_keys() {
        let all = all_medications();
        let table = build_regional(&per_medication(), Some(&all), &(2006..=2024));
        assert!(is_scoped(&table, RegionScope::Regional));
        assert_eq!(table.counties(), vec!["Jämtland Härjedalen"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicates_keep_first() {
        let mut rows = per_medication();
        rows.push(raw("N06BA04 Metylfenidat", "Riket", "Män", 2006, 99.0));
        let table = build_national(&rows, None, &(2006..=2024));
        let methylphenidate: Vec<_> = table
            .records()
            .iter()
            .filter(|r| r.medication_category == MedicationCategory::Methylphenidate)
            .collect();
        assert_eq!(methylphenidate.len(), 1);
        assert_eq!(methylphenidate[0].patients_per_1000, 20.0);
    }

    #[test]
    fn out_of_window_years_are_dropped() {
        let rows = vec![raw("N06BA04 Metylfenidat", "Riket", "Män", 2005, 1.0)];
        assert!(build_national(&rows, None, &(2006..=2024)).is_empty());
    }

    #[test]
    fn rebuild_is_identical() {
        let all = all_medications();
        let a = Dataset::from_sources(&per_medication(), Some(&all), &(2006..=2024));
        let b = Dataset::from_sources(&per_medication(), Some(&all), &(2006..=2024));
        assert_eq!(a, b);
        assert_eq!(a.national.records()[0].age_group, AgeGroup::Age10To14);
    }
}
