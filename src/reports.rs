use crate::aggregate::Dataset;
use crate::metrics::national_trend_context;
use crate::types::{
    AgeGroup, ChoroplethRow, ComparisonRow, HeatmapRow, LineChartRow, MedicationCategory, Sex,
    SexRatioRow, SummaryStats,
};
use crate::util::format_number;
use crate::views::{
    choropleth_rows, choropleth_slice, color_scale_max, county_stats, heatmap_data, heatmap_rows,
    line_chart_data, sex_ratio_rows, year_comparison,
};

/// What the views are computed for; mirrors the dashboard's controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSelection {
    pub medication: MedicationCategory,
    pub sexes: Vec<Sex>,
    pub age_groups: Vec<AgeGroup>,
    pub map_year: i32,
    pub map_age_group: AgeGroup,
    pub map_sex: Sex,
    pub comparison_years: Vec<i32>,
}

impl Default for ViewSelection {
    fn default() -> Self {
        Self {
            medication: MedicationCategory::AllMedications,
            sexes: Sex::ALL.to_vec(),
            age_groups: AgeGroup::ALL.to_vec(),
            map_year: 2024,
            map_age_group: AgeGroup::Age10To14,
            map_sex: Sex::Boys,
            comparison_years: vec![2020, 2024],
        }
    }
}

pub struct Reports {
    pub line_frames: Vec<LineChartRow>,
    pub sex_ratios: Vec<SexRatioRow>,
    /// Counties by year for the selected medication, map sex and map age.
    pub heatmap: Vec<HeatmapRow>,
    pub choropleth: Vec<ChoroplethRow>,
    pub comparison: Vec<ComparisonRow>,
    pub summary: SummaryStats,
}

pub fn generate_comparison(data: &Dataset, years: &[i32]) -> Vec<ComparisonRow> {
    year_comparison(&data.national, years)
        .into_iter()
        .map(|r| ComparisonRow {
            sex: r.sex.to_string(),
            year: r.year,
            age_group: r.age_group.to_string(),
            patients_per_1000: format_number(r.patients_per_1000, 1),
        })
        .collect()
}

pub fn generate_summary(data: &Dataset, selection: &ViewSelection) -> SummaryStats {
    let years = data.national.years();
    let slice = choropleth_slice(
        &data.regional,
        selection.map_year,
        selection.map_age_group,
        selection.map_sex,
    );
    let stats = county_stats(&slice);
    let trend = national_trend_context(
        data.national.records(),
        selection.map_year,
        selection.map_age_group,
        selection.map_sex,
    );
    SummaryStats {
        national_rows: data.national.len(),
        regional_rows: data.regional.len(),
        counties: data.regional.counties().len(),
        first_year: years.first().copied(),
        last_year: years.last().copied(),
        map_year: selection.map_year,
        map_age_group: selection.map_age_group,
        map_sex: selection.map_sex,
        trend_context: trend.to_string(),
        national_percent: trend.percent_of_population(),
        highest_county: stats.as_ref().map(|s| s.highest.0.clone()),
        lowest_county: stats.as_ref().map(|s| s.lowest.0.clone()),
        county_std_dev: stats.and_then(|s| s.std_dev),
        color_scale_max: color_scale_max(&data.regional),
    }
}

pub fn generate_reports(data: &Dataset, selection: &ViewSelection) -> Reports {
    let slice = choropleth_slice(
        &data.regional,
        selection.map_year,
        selection.map_age_group,
        selection.map_sex,
    );
    Reports {
        line_frames: line_chart_data(
            &data.national,
            selection.medication,
            &selection.sexes,
            &selection.age_groups,
        ),
        sex_ratios: sex_ratio_rows(&data.national, selection.medication),
        heatmap: heatmap_rows(&heatmap_data(
            &data.regional,
            selection.medication,
            selection.map_sex,
            selection.map_age_group,
        )),
        choropleth: choropleth_rows(&slice),
        comparison: generate_comparison(data, &selection.comparison_years),
        summary: generate_summary(data, selection),
    }
}
