use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let csv_err = |source| DashboardError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for r in rows {
        wtr.serialize(r).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| DashboardError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).map_err(|source| DashboardError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, s).map_err(|source| DashboardError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Markdown preview of the first `max_rows` rows.
pub fn render_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_preview(rows, max_rows));
}
