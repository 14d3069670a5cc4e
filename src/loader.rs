use crate::error::{DashboardError, Result};
use crate::normalize::{is_valid_source_age, is_valid_source_sex};
use crate::types::{AgeGroup, RawLongRow, RawRow, RegionScope};
use crate::util::{is_year_header, parse_f64_safe, parse_i32_safe};
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Row counts from loading the pre-processed CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
    pub invalid_labels: usize,
}

const MEASURE_HEADERS: &[&str] = &["Mått", "measure"];
const MEDICATION_HEADERS: &[&str] = &["Läkemedel", "medication"];
const REGION_HEADERS: &[&str] = &["Region", "county", "region"];
const SEX_HEADERS: &[&str] = &["Kön", "sex", "gender"];
const AGE_HEADERS: &[&str] = &["Ålder", "age_group"];

/// Read the first worksheet of a workbook, or a CSV export, as a grid of
/// trimmed cell texts.
pub fn read_sheet(path: &Path) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(DashboardError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ext == "csv" {
        read_csv_grid(path)
    } else {
        read_workbook_grid(path)
    }
}

fn read_workbook_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let workbook_err = |message: String| DashboardError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_err("workbook has no worksheets".to_string()))?
        .map_err(|e| workbook_err(e.to_string()))?;
    Ok(range_grid(&range))
}

fn range_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Year headers and whole rates come back as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = std::fs::read_to_string(path).map_err(|e| DashboardError::from_io(path, e))?;
    let content = content.trim_start_matches('\u{feff}');
    // Caption and header row; the caption alone may hold stray commas.
    let head: String = content.lines().take(2).collect();
    let delimiter = if head.matches(';').count() > head.matches(',').count() {
        b';'
    } else {
        b','
    };
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());
    let mut grid = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|source| DashboardError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        grid.push(record.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(grid)
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.iter().any(|c| h.trim() == *c))
}

fn require_column(headers: &[String], candidates: &[&str], path: &Path) -> Result<usize> {
    find_column(headers, candidates).ok_or_else(|| DashboardError::MissingColumn {
        column: candidates[0].to_string(),
        path: path.to_path_buf(),
    })
}

/// Reshape one wide sheet into long rows.
///
/// Row 0 is a caption and row 1 the header. Rows whose sex or age label is
/// outside the source enumerations are footnotes and are skipped, as are
/// empty or non-numeric year cells.
pub fn melt_sheet(grid: &[Vec<String>], path: &Path, scope: RegionScope) -> Result<Vec<RawLongRow>> {
    let headers = grid.get(1).ok_or_else(|| DashboardError::EmptySheet {
        path: path.to_path_buf(),
    })?;
    let measure_col = find_column(headers, MEASURE_HEADERS);
    let medication_col = require_column(headers, MEDICATION_HEADERS, path)?;
    let region_col = require_column(headers, REGION_HEADERS, path)?;
    let sex_col = require_column(headers, SEX_HEADERS, path)?;
    let age_col = require_column(headers, AGE_HEADERS, path)?;
    let year_cols: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| is_year_header(h))
        .filter_map(|(idx, h)| parse_i32_safe(Some(h)).map(|y| (idx, y)))
        .collect();

    fn cell(row: &[String], idx: usize) -> &str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }
    let mut out = Vec::new();
    let mut empty_cells = 0usize;
    for row in grid.iter().skip(2) {
        let sex = cell(row, sex_col);
        let age = cell(row, age_col);
        let county = cell(row, region_col);
        if !is_valid_source_sex(sex) || !is_valid_source_age(age) || !scope.includes(county) {
            continue;
        }
        for &(idx, year) in &year_cols {
            match parse_f64_safe(row.get(idx).map(String::as_str)) {
                Some(value) if value >= 0.0 => out.push(RawLongRow {
                    measure: measure_col.map(|c| cell(row, c)).unwrap_or("").to_string(),
                    medication: cell(row, medication_col).to_string(),
                    county: county.to_string(),
                    sex: sex.to_string(),
                    age_group: age.to_string(),
                    year,
                    patients_per_1000: value,
                }),
                _ => empty_cells += 1,
            }
        }
    }
    debug!(
        path = %path.display(),
        years = year_cols.len(),
        rows = out.len(),
        empty_cells,
        "melted sheet"
    );
    Ok(out)
}

/// Import every per-age-group sheet that can be read.
///
/// Missing or unreadable files are logged and skipped. Returns `None` when
/// no file could be read at all.
pub fn import_source_sheets(
    sources: &[(PathBuf, AgeGroup)],
    scope: RegionScope,
) -> Option<Vec<RawLongRow>> {
    let mut all = Vec::new();
    let mut read_any = false;
    for (path, age_group) in sources {
        let rows = read_sheet(path).and_then(|grid| melt_sheet(&grid, path, scope));
        match rows {
            Ok(rows) => {
                let foreign = rows
                    .iter()
                    .filter(|r| r.age_group != age_group.as_str())
                    .count();
                if foreign > 0 {
                    debug!(path = %path.display(), %age_group, foreign, "sheet holds rows for other age groups");
                }
                read_any = true;
                all.extend(rows);
            }
            Err(e) => warn!(%age_group, "skipping source sheet: {e}"),
        }
    }
    if !read_any {
        warn!(?scope, "no source sheets could be read");
        return None;
    }
    info!(?scope, rows = all.len(), "imported source sheets");
    Some(all)
}

/// Load the pre-processed long-format CSV.
///
/// Rows that fail to parse are counted and skipped; rows with sex or age
/// labels outside the source sets are dropped silently.
pub fn load_processed(path: &Path) -> Result<(Vec<RawLongRow>, LoadReport)> {
    let file = std::fs::File::open(path).map_err(|e| DashboardError::from_io(path, e))?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let sex = row.sex.as_deref().unwrap_or("").trim();
        let age = row.age_group.as_deref().unwrap_or("").trim();
        if !is_valid_source_sex(sex) || !is_valid_source_age(age) {
            report.invalid_labels += 1;
            continue;
        }
        let year = match parse_i32_safe(row.year.as_deref()) {
            Some(y) => y,
            None => {
                report.parse_errors += 1;
                continue;
            }
        };
        let value = match parse_f64_safe(row.patients_per_1000.as_deref()) {
            Some(v) if v >= 0.0 => v,
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };
        rows.push(RawLongRow {
            measure: row.measure.unwrap_or_default().trim().to_string(),
            medication: row.medication.unwrap_or_default().trim().to_string(),
            county: row.county.unwrap_or_default().trim().to_string(),
            sex: sex.to_string(),
            age_group: age.to_string(),
            year,
            patients_per_1000: value,
        });
    }
    report.kept_rows = rows.len();
    info!(
        path = %path.display(),
        total = report.total_rows,
        kept = report.kept_rows,
        parse_errors = report.parse_errors,
        "loaded processed CSV"
    );
    Ok((rows, report))
}
