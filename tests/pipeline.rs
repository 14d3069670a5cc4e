//! End-to-end tests: source files on disk to national/regional tables.

use adhd_dashboard::config::SourceSheet;
use adhd_dashboard::frames::cumulative_frames;
use adhd_dashboard::metrics::{national_trend_context, sex_ratios};
use adhd_dashboard::views::{choropleth_slice, Filter};
use adhd_dashboard::{AgeGroup, Config, Dataset, MedicationCategory, Sex};
use std::collections::HashSet;
use std::path::Path;

const PROCESSED: &str = "\
Mått,Läkemedel,Region,Kön,Ålder,År,Patienter/1000 invånare
Patienter/1000 invånare,N06BA04 Metylfenidat,Riket,Män,10-14,2006,40
Patienter/1000 invånare,N06BA04 Metylfenidat,Riket,Män,10-14,2024,70
Patienter/1000 invånare,N06BA04 Metylfenidat,Riket,Kvinnor,10-14,2024,0
Patienter/1000 invånare,N06BA07 Modafinil,Riket,Män,10-14,2024,1
Patienter/1000 invånare,N06BA04 Metylfenidat,Jämtland Härjedalen,Män,10-14,2024,65
Patienter/1000 invånare,N06BA04 Metylfenidat,Skåne,Män,10-14,2024,72
";

const SHEET_10_14: &str = "\
Läkemedelsstatistik: ADHD-läkemedel, patienter per 1000 invånare
Mått;Läkemedel;Region;Kön;Ålder;2006;2020;2024
Patienter/1000 invånare;N06B ADHD-läkemedel;Riket;Män;10-14;66;80;91
Patienter/1000 invånare;N06B ADHD-läkemedel;Riket;Kvinnor;10-14;20;35;45,5
Patienter/1000 invånare;N06B ADHD-läkemedel;Riket;Båda könen;10-14;43;58;69
Patienter/1000 invånare;N06B ADHD-läkemedel;Jämtlands län;Män;10-14;60;;88
Patienter/1000 invånare;N06B ADHD-läkemedel;Skåne län;Män;10-14;70;84;95
Källa: Socialstyrelsens läkemedelsregister
";

fn write_fixture(dir: &Path, with_sheet: bool) -> Config {
    let processed = dir.join("processed.csv");
    std::fs::write(&processed, PROCESSED).unwrap();
    let raw_dir = dir.join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    if with_sheet {
        std::fs::write(raw_dir.join("adhd_10-14.csv"), SHEET_10_14).unwrap();
    }
    Config {
        raw_dir,
        processed_csv: processed,
        sources: vec![
            SourceSheet {
                file: "adhd_5-9.csv".into(),
                age_group: AgeGroup::Age5To9,
            },
            SourceSheet {
                file: "adhd_10-14.csv".into(),
                age_group: AgeGroup::Age10To14,
            },
        ],
        ..Config::default()
    }
}

#[test]
fn builds_disjoint_tables_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), true);
    let (data, report) = Dataset::load(&config);

    assert_eq!(report.unwrap().kept_rows, 6);
    assert!(data.national.records().iter().all(|r| r.county == "Riket"));
    assert!(data.regional.records().iter().all(|r| r.county != "Riket"));

    // 3 single-medication rows + 9 aggregate rows nationally
    assert_eq!(data.national.len(), 12);
    // 2 single-medication rows + 2 (Jämtland) + 3 (Skåne) aggregate rows
    assert_eq!(data.regional.len(), 7);
    assert_eq!(data.regional.counties(), vec!["Jämtland Härjedalen", "Skåne"]);
}

#[test]
fn keys_are_unique_per_table() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = Dataset::load(&write_fixture(dir.path(), true));
    for table in [&data.national, &data.regional] {
        let keys: HashSet<_> = table.records().iter().map(|r| r.key()).collect();
        assert_eq!(keys.len(), table.len());
    }
}

#[test]
fn rebuilding_gives_the_same_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), true);
    let (a, _) = Dataset::load(&config);
    let (b, _) = Dataset::load(&config);
    assert_eq!(a, b);
}

#[test]
fn missing_aggregate_sheets_keep_single_medications() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = Dataset::load(&write_fixture(dir.path(), false));
    assert_eq!(data.national.len(), 3);
    assert!(data
        .national
        .records()
        .iter()
        .all(|r| r.medication_category == MedicationCategory::Methylphenidate));
    assert_eq!(
        national_trend_context(data.national.records(), 2024, AgeGroup::Age10To14, Sex::Boys)
            .to_string(),
        "Insufficient data"
    );
}

#[test]
fn no_sources_at_all_is_an_empty_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        raw_dir: dir.path().join("missing"),
        processed_csv: dir.path().join("missing.csv"),
        ..Config::default()
    };
    let (data, report) = Dataset::load(&config);
    assert!(report.is_none());
    assert!(data.is_empty());
}

#[test]
fn trend_context_from_loaded_tables() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = Dataset::load(&write_fixture(dir.path(), true));
    let ctx = national_trend_context(data.national.records(), 2024, AgeGroup::Age10To14, Sex::Boys);
    assert_eq!(ctx.to_string(), "National average: 9.1% (+38% since 2006)");
}

#[test]
fn zero_girls_rate_gives_finite_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = Dataset::load(&write_fixture(dir.path(), true));
    let slice = data.national.select(
        &Filter::new()
            .medication(MedicationCategory::Methylphenidate)
            .year(2024),
    );
    let ratios = sex_ratios(&slice);
    assert_eq!(ratios.len(), 1);
    assert_eq!(ratios[0].ratio, 70.0 / 0.001);
}

#[test]
fn cumulative_frames_over_loaded_years() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = Dataset::load(&write_fixture(dir.path(), true));
    let slice = data.national.select(
        &Filter::new()
            .medication(MedicationCategory::AllMedications)
            .sex(Sex::Boys),
    );
    let frames = cumulative_frames(&slice);
    let frame_2006: Vec<_> = frames.iter().filter(|f| f.frame == 2006).collect();
    let frame_2024: Vec<_> = frames.iter().filter(|f| f.frame == 2024).collect();
    assert_eq!(frame_2006.len(), 1);
    assert_eq!(frame_2024.len(), 3);
}

#[test]
fn map_slice_uses_harmonized_counties() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = Dataset::load(&write_fixture(dir.path(), true));
    let slice = choropleth_slice(&data.regional, 2024, AgeGroup::Age10To14, Sex::Boys);
    let geo: Vec<&str> = slice.iter().map(|e| e.county_geo).collect();
    assert_eq!(geo.len(), 2);
    assert!(geo.contains(&"Jämtland"));
    assert!(geo.contains(&"Skåne"));
}
