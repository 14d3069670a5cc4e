// Entry point and menu-driven CLI flow.
//
// - Option [1] loads the source files and builds the national and regional
//   tables, printing diagnostics.
// - Option [2] exports the dashboard views as CSV plus a JSON summary.
// - Option [3] prints the national trend context for one selection.
use adhd_dashboard::config::{Args, Config};
use adhd_dashboard::geo::{counties_without_boundary, feature_names, load_boundaries};
use adhd_dashboard::metrics::national_trend_context;
use adhd_dashboard::normalize::geo_county;
use adhd_dashboard::output;
use adhd_dashboard::reports::{self, ViewSelection};
use adhd_dashboard::util::{format_int, format_opt};
use adhd_dashboard::{AgeGroup, Dataset, MedicationCategory, Sex};
use clap::Parser;
use std::io::{self, Write};
use tracing::warn;

/// Print `prompt` and read one trimmed line. `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` for `N` or end of input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(config: &Config) -> Dataset {
    let (data, report) = Dataset::load(config);
    match report {
        Some(report) => {
            println!(
                "Processing dataset... ({} rows loaded, {} kept)",
                format_int(report.total_rows),
                format_int(report.kept_rows)
            );
            println!(
                "Note: {} rows skipped due to parse errors, {} with unknown sex/age labels.",
                format_int(report.parse_errors),
                format_int(report.invalid_labels)
            );
        }
        None => println!(
            "Warning: {} could not be read; single-medication data is unavailable.",
            config.processed_csv.display()
        ),
    }
    println!(
        "National data: {} rows. Regional data: {} rows across {} counties.",
        format_int(data.national.len()),
        format_int(data.regional.len()),
        format_int(data.regional.counties().len())
    );

    if let Some(geojson) = load_boundaries(&config.geojson) {
        let names = feature_names(&geojson, &config.geo_name_property);
        let keys = data.regional.counties().into_iter().filter_map(geo_county);
        let missing = counties_without_boundary(keys, &names);
        if !missing.is_empty() {
            warn!(?missing, "counties without a boundary feature");
        }
    }

    if data.is_empty() {
        println!("No data available. Check the data directories and try again.");
    }
    println!();
    data
}

fn handle_generate_reports(data: &Dataset, config: &Config) {
    if data.is_empty() {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    }
    let mut selection = ViewSelection::default();
    if let Some(&last) = data.national.years().last() {
        selection.map_year = last;
    }
    let choices: Vec<&str> = MedicationCategory::SINGLE.iter().map(|m| m.as_str()).collect();
    let prompt = format!("Medication ({}; blank for All medications): ", choices.join(", "));
    if let Some(s) = read_line(&prompt).filter(|s| !s.is_empty()) {
        match MedicationCategory::from_selection(&s) {
            Some(m) => selection.medication = m,
            None => println!("Unknown medication '{}', using {}.", s, selection.medication),
        }
    }
    let reports = reports::generate_reports(data, &selection);
    println!("Generating views...");
    println!("Outputs saved to {}\n", config.output_dir.display());

    let out = |name: &str| config.output_dir.join(name);
    let results = [
        output::write_csv(&out("national_table.csv"), data.national.records()),
        output::write_csv(&out("regional_table.csv"), data.regional.records()),
        output::write_csv(&out("line_frames.csv"), &reports.line_frames),
        output::write_csv(&out("sex_ratio.csv"), &reports.sex_ratios),
        output::write_csv(&out("year_comparison.csv"), &reports.comparison),
        output::write_csv(&out("heatmap.csv"), &reports.heatmap),
        output::write_csv(
            &out(&format!("choropleth_{}.csv", selection.map_year)),
            &reports.choropleth,
        ),
        output::write_json(&out("summary.json"), &reports.summary),
    ];
    for e in results.into_iter().filter_map(Result::err) {
        eprintln!("Write error: {}", e);
    }

    output::preview_table(
        &format!("ADHD Medication Prescriptions in Sweden - {}", selection.medication),
        Some("Cumulative animation frames"),
        &reports.line_frames,
        4,
    );
    output::preview_table(
        &format!("Boys-to-Girls Prescription Ratio by Age Group - {}", selection.medication),
        None,
        &reports.sex_ratios,
        4,
    );
    output::preview_table(
        &format!(
            "Prescription Rates by County and Year - {} ({}, Age {})",
            selection.medication, selection.map_sex, selection.map_age_group
        ),
        Some("Multiplier relative to each county's first positive value"),
        &reports.heatmap,
        8,
    );
    output::preview_table(
        "Boys and girls, All medications",
        Some("2020 vs 2024"),
        &reports.comparison,
        8,
    );
    output::preview_table(
        &format!(
            "Prescription Rates by County ({}, Age {}) {}",
            selection.map_sex, selection.map_age_group, selection.map_year
        ),
        Some(reports.summary.trend_context.as_str()),
        &reports.choropleth,
        21,
    );
    println!(
        "Highest rate: {}. Lowest rate: {}. Std. dev: {}\n",
        reports.summary.highest_county.as_deref().unwrap_or("n/a"),
        reports.summary.lowest_county.as_deref().unwrap_or("n/a"),
        format_opt(reports.summary.county_std_dev, 1)
    );
}

fn handle_trend_context(data: &Dataset) {
    let Some(year) = read_line("Year (2006-2024): ").and_then(|s| s.parse::<i32>().ok()) else {
        println!("Invalid year.\n");
        return;
    };
    let Some(age_group) = read_line("Age group (5-9, 10-14, 15-19, 20-24): ")
        .and_then(|s| AgeGroup::from_label(&s))
    else {
        println!("Invalid age group.\n");
        return;
    };
    let Some(sex) = read_line("Sex (Boys, Girls, Both sexes): ").and_then(|s| Sex::from_label(&s))
    else {
        println!("Invalid sex.\n");
        return;
    };
    println!(
        "{}\n",
        national_trend_context(data.national.records(), year, age_group, sex)
    );
}

fn main() {
    let args = Args::parse();
    if let Err(e) = adhd_dashboard::logging::init_logging(args.verbose) {
        eprintln!("error: failed to initialize logging: {e}");
        std::process::exit(1);
    }
    let config = Config::from_args(&args);
    let mut data: Option<Dataset> = None;

    loop {
        println!("Select an option:");
        println!("[1] Load the data");
        println!("[2] Generate views");
        println!("[3] National trend context\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => data = Some(handle_load(&config)),
            "2" => {
                println!();
                match &data {
                    Some(d) => handle_generate_reports(d, &config),
                    None => println!("Error: No data loaded. Please load the data first (option 1).\n"),
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => match &data {
                Some(d) => handle_trend_context(d),
                None => println!("Error: No data loaded. Please load the data first (option 1).\n"),
            },
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
