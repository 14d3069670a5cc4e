//! Derived metrics computed on demand from a slice of records.

use crate::types::{
    AgeGroup, MedicationCategory, PrescriptionRecord, Sex, BASELINE_YEAR, NATIONAL_COUNTY,
};
use crate::util::{average, round_to};
use std::collections::BTreeMap;
use std::fmt;

/// Divisor used in place of a zero girls' rate.
pub const ZERO_DIVISOR_SUBSTITUTE: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct SexRatio {
    pub year: i32,
    pub age_group: AgeGroup,
    pub boys: f64,
    pub girls: f64,
    pub ratio: f64,
}

/// Boys/girls ratio per `(year, age_group)`.
///
/// A side with no rows counts as zero. A zero girls' rate is replaced by
/// `ZERO_DIVISOR_SUBSTITUTE`, so the ratio stays finite and the row is kept.
pub fn sex_ratios(records: &[PrescriptionRecord]) -> Vec<SexRatio> {
    let mut cells: BTreeMap<(i32, AgeGroup), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for r in records {
        let side = match r.sex {
            Sex::Boys => 0,
            Sex::Girls => 1,
            Sex::BothSexes => continue,
        };
        let e = cells.entry((r.year, r.age_group)).or_default();
        if side == 0 {
            e.0.push(r.patients_per_1000);
        } else {
            e.1.push(r.patients_per_1000);
        }
    }
    cells
        .into_iter()
        .map(|((year, age_group), (boys, girls))| {
            let boys = average(&boys).unwrap_or(0.0);
            let girls = average(&girls).unwrap_or(0.0);
            let divisor = if girls == 0.0 { ZERO_DIVISOR_SUBSTITUTE } else { girls };
            SexRatio {
                year,
                age_group,
                boys,
                girls,
                ratio: boys / divisor,
            }
        })
        .collect()
}

/// Which value of a series the multiplier divides by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The earliest value, whatever it is.
    First,
    /// The earliest strictly positive value.
    FirstPositive,
}

/// Each value divided by its group's anchor value, rounded to two decimals.
///
/// Results line up with `records`. A group whose anchor is missing or zero
/// gets `None` throughout: growth is not computable there, which is not the
/// same as no growth.
pub fn baseline_multipliers<K, F>(
    records: &[PrescriptionRecord],
    key: F,
    anchor: Anchor,
) -> Vec<Option<f64>>
where
    K: Ord,
    F: Fn(&PrescriptionRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (idx, r) in records.iter().enumerate() {
        groups.entry(key(r)).or_default().push(idx);
    }

    let mut out = vec![None; records.len()];
    for mut indices in groups.into_values() {
        indices.sort_by_key(|&i| records[i].year);
        let base = match anchor {
            Anchor::First => indices.first().map(|&i| records[i].patients_per_1000),
            Anchor::FirstPositive => indices
                .iter()
                .map(|&i| records[i].patients_per_1000)
                .find(|v| *v > 0.0),
        };
        let Some(base) = base.filter(|b| *b != 0.0) else {
            continue;
        };
        for i in indices {
            out[i] = Some(round_to(records[i].patients_per_1000 / base, 2));
        }
    }
    out
}

/// The population-weighted national "All medications" rate for one cell.
///
/// Reads the country-level row directly, never a mean over county rows.
pub fn national_rate(
    national: &[PrescriptionRecord],
    year: i32,
    age_group: AgeGroup,
    sex: Sex,
) -> Option<f64> {
    national
        .iter()
        .find(|r| {
            r.year == year
                && r.age_group == age_group
                && r.sex == sex
                && r.county == NATIONAL_COUNTY
                && r.medication_category == MedicationCategory::AllMedications
        })
        .map(|r| r.patients_per_1000)
        .filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendContext {
    InsufficientData,
    /// Baseline rate is zero, so percent change is undefined.
    BaselineZero { current: f64 },
    Change { current: f64, change_pct: f64 },
}

impl TrendContext {
    /// Share of the population, in percent, for the current year.
    pub fn percent_of_population(&self) -> Option<f64> {
        match self {
            TrendContext::InsufficientData => None,
            TrendContext::BaselineZero { current } | TrendContext::Change { current, .. } => {
                Some(current / 10.0)
            }
        }
    }
}

impl fmt::Display for TrendContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TrendContext::InsufficientData => f.write_str("Insufficient data"),
            TrendContext::BaselineZero { current } => write!(
                f,
                "National average: {:.1}% (baseline = 0 in {})",
                current / 10.0,
                BASELINE_YEAR
            ),
            TrendContext::Change { current, change_pct } => {
                let sign = if change_pct >= 0.0 { "+" } else { "" };
                write!(
                    f,
                    "National average: {:.1}% ({}{:.0}% since {})",
                    current / 10.0,
                    sign,
                    change_pct,
                    BASELINE_YEAR
                )
            }
        }
    }
}

/// Current national rate against the baseline year for one age/sex cell.
pub fn national_trend_context(
    national: &[PrescriptionRecord],
    year: i32,
    age_group: AgeGroup,
    sex: Sex,
) -> TrendContext {
    let (Some(current), Some(baseline)) = (
        national_rate(national, year, age_group, sex),
        national_rate(national, BASELINE_YEAR, age_group, sex),
    ) else {
        return TrendContext::InsufficientData;
    };
    if baseline == 0.0 {
        return TrendContext::BaselineZero { current };
    }
    TrendContext::Change {
        current,
        change_pct: (current - baseline) / baseline * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        year: i32,
        sex: Sex,
        age_group: AgeGroup,
        medication_category: MedicationCategory,
        value: f64,
    ) -> PrescriptionRecord {
        PrescriptionRecord {
            year,
            county: NATIONAL_COUNTY.into(),
            sex,
            age_group,
            medication_category,
            patients_per_1000: value,
        }
    }

    fn all(year: i32, sex: Sex, value: f64) -> PrescriptionRecord {
        record(year, sex, AgeGroup::Age10To14, MedicationCategory::AllMedications, value)
    }

    #[test]
    fn ratio_divides_boys_by_girls() {
        let records = vec![all(2010, Sex::Boys, 30.0), all(2010, Sex::Girls, 10.0), all(2010, Sex::BothSexes, 20.0)];
        let ratios = sex_ratios(&records);
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].ratio, 3.0);
    }

    #[test]
    fn zero_girls_rate_uses_substitute_divisor() {
        let records = vec![all(2006, Sex::Boys, 5.0), all(2006, Sex::Girls, 0.0)];
        let ratio = sex_ratios(&records)[0].ratio;
        assert!(ratio.is_finite());
        assert_eq!(ratio, 5.0 / 0.001);
    }

    #[test]
    fn missing_girls_row_counts_as_zero() {
        let records = vec![all(2006, Sex::Boys, 2.0)];
        let ratios = sex_ratios(&records);
        assert_eq!(ratios[0].girls, 0.0);
        assert_eq!(ratios[0].ratio, 2.0 / ZERO_DIVISOR_SUBSTITUTE);
    }

    #[test]
    fn ratios_come_out_ordered() {
        let records = vec![
            record(2007, Sex::Boys, AgeGroup::Age5To9, MedicationCategory::AllMedications, 1.0),
            record(2006, Sex::Boys, AgeGroup::Age20To24, MedicationCategory::AllMedications, 1.0),
            record(2006, Sex::Boys, AgeGroup::Age5To9, MedicationCategory::AllMedications, 1.0),
        ];
        let keys: Vec<(i32, AgeGroup)> = sex_ratios(&records).iter().map(|r| (r.year, r.age_group)).collect();
        assert_eq!(
            keys,
            vec![(2006, AgeGroup::Age5To9), (2006, AgeGroup::Age20To24), (2007, AgeGroup::Age5To9)]
        );
    }

    #[test]
    fn multiplier_anchors_on_first_year() {
        let records = vec![all(2008, Sex::Boys, 30.0), all(2006, Sex::Boys, 10.0), all(2007, Sex::Boys, 15.0)];
        let m = baseline_multipliers(&records, |r| r.sex, Anchor::First);
        assert_eq!(m, vec![Some(3.0), Some(1.0), Some(1.5)]);
    }

    #[test]
    fn all_zero_group_is_not_computable() {
        let records = vec![all(2006, Sex::Girls, 0.0), all(2007, Sex::Girls, 0.0), all(2006, Sex::Boys, 4.0)];
        let m = baseline_multipliers(&records, |r| r.sex, Anchor::First);
        assert_eq!(m, vec![None, None, Some(1.0)]);
    }

    #[test]
    fn zero_anchor_is_not_computable_unless_skipped() {
        let records = vec![all(2006, Sex::Boys, 0.0), all(2007, Sex::Boys, 2.0), all(2008, Sex::Boys, 3.0)];
        let first = baseline_multipliers(&records, |r| r.sex, Anchor::First);
        assert_eq!(first, vec![None, None, None]);
        let positive = baseline_multipliers(&records, |r| r.sex, Anchor::FirstPositive);
        assert_eq!(positive, vec![Some(0.0), Some(1.0), Some(1.5)]);
    }

    #[test]
    fn trend_context_matches_reported_format() {
        let national = vec![
            all(2006, Sex::Boys, 66.0),
            all(2024, Sex::Boys, 91.0),
            record(2024, Sex::Boys, AgeGroup::Age10To14, MedicationCategory::Methylphenidate, 70.0),
        ];
        let ctx = national_trend_context(&national, 2024, AgeGroup::Age10To14, Sex::Boys);
        match ctx {
            TrendContext::Change { current, change_pct } => {
                assert_eq!(current, 91.0);
                assert!((change_pct - (91.0 - 66.0) / 66.0 * 100.0).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ctx.to_string(), "National average: 9.1% (+38% since 2006)");
        assert_eq!(ctx.percent_of_population(), Some(9.1));
    }

    #[test]
    fn falling_rate_has_no_plus_sign() {
        let national = vec![all(2006, Sex::Girls, 20.0), all(2010, Sex::Girls, 15.0)];
        let ctx = national_trend_context(&national, 2010, AgeGroup::Age10To14, Sex::Girls);
        assert_eq!(ctx.to_string(), "National average: 1.5% (-25% since 2006)");
    }

    #[test]
    fn zero_baseline_is_reported() {
        let national = vec![all(2006, Sex::Girls, 0.0), all(2020, Sex::Girls, 12.0)];
        let ctx = national_trend_context(&national, 2020, AgeGroup::Age10To14, Sex::Girls);
        assert_eq!(ctx, TrendContext::BaselineZero { current: 12.0 });
        assert_eq!(ctx.to_string(), "National average: 1.2% (baseline = 0 in 2006)");
    }

    #[test]
    fn missing_rows_are_insufficient_data() {
        let national = vec![all(2024, Sex::Boys, 91.0)];
        let ctx = national_trend_context(&national, 2024, AgeGroup::Age10To14, Sex::Boys);
        assert_eq!(ctx, TrendContext::InsufficientData);
        assert_eq!(ctx.to_string(), "Insufficient data");
        assert_eq!(
            national_trend_context(&[], 2024, AgeGroup::Age5To9, Sex::Boys),
            TrendContext::InsufficientData
        );
    }

    #[test]
    fn county_rows_never_stand_in_for_the_national_rate() {
        let mut county = all(2006, Sex::Boys, 66.0);
        county.county = "Skåne".into();
        assert_eq!(national_rate(&[county], 2006, AgeGroup::Age10To14, Sex::Boys), None);
    }
}
