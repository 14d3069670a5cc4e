//! Runtime configuration: where the source files live and where views go.

use crate::types::AgeGroup;
use clap::Parser;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// One per-age-group workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSheet {
    pub file: String,
    pub age_group: AgeGroup,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw_dir: PathBuf,
    pub processed_csv: PathBuf,
    pub geojson: PathBuf,
    /// Feature property holding the county name in the boundary file.
    pub geo_name_property: String,
    pub output_dir: PathBuf,
    pub sources: Vec<SourceSheet>,
    pub years: RangeInclusive<i32>,
}

impl Default for Config {
    fn default() -> Self {
        let sources = AgeGroup::ALL
            .into_iter()
            .map(|age_group| SourceSheet {
                file: format!("adhd_{}.xlsx", age_group),
                age_group,
            })
            .collect();
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_csv: PathBuf::from("data/processed/adhd_medication_2006-2024.csv"),
            geojson: PathBuf::from("swedish_provinces.geojson"),
            geo_name_property: "name".to_string(),
            output_dir: PathBuf::from("."),
            sources,
            years: 2006..=2024,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "adhd_dashboard",
    about = "Explore ADHD medication dispensation rates, 2006-2024"
)]
pub struct Args {
    /// Directory holding the per-age-group workbooks
    #[arg(long)]
    pub raw_dir: Option<PathBuf>,

    /// Pre-processed long-format CSV with per-medication rates
    #[arg(long)]
    pub processed_csv: Option<PathBuf>,

    /// County boundary file (GeoJSON)
    #[arg(long)]
    pub geojson: Option<PathBuf>,

    /// Directory for exported views
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        let mut config = Self::default();
        if let Some(dir) = &args.raw_dir {
            config.raw_dir = dir.clone();
        }
        if let Some(path) = &args.processed_csv {
            config.processed_csv = path.clone();
        }
        if let Some(path) = &args.geojson {
            config.geojson = path.clone();
        }
        if let Some(dir) = &args.output_dir {
            config.output_dir = dir.clone();
        }
        config
    }

    pub fn source_paths(&self) -> Vec<(PathBuf, AgeGroup)> {
        self.sources
            .iter()
            .map(|s| (self.raw_dir.join(&s.file), s.age_group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_layout() {
        let config = Config::default();
        let files: Vec<&str> = config.sources.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(
            files,
            ["adhd_5-9.xlsx", "adhd_10-14.xlsx", "adhd_15-19.xlsx", "adhd_20-24.xlsx"]
        );
        assert_eq!(config.years, 2006..=2024);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from(["adhd_dashboard", "--raw-dir", "/tmp/raw", "-vv"]);
        let config = Config::from_args(&args);
        assert_eq!(config.raw_dir, PathBuf::from("/tmp/raw"));
        assert_eq!(args.verbose, 2);
        assert_eq!(
            config.source_paths()[0].0,
            PathBuf::from("/tmp/raw/adhd_5-9.xlsx")
        );
    }
}
