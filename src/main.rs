// Entry point and high-level interactive flow.
//
// - Option [1] ingests the survey CSV (local file or remote export)
//   through the signature-keyed cache, printing diagnostics.
// - Option [2] renders the dashboard for an interactively chosen
//   department/time selection: console tables plus CSV/JSON exports.
// - Option [3] is the password-gated admin path that re-serializes an
//   uploaded .xlsx workbook into the raw-input CSV.
mod admin;
mod columns;
mod config;
mod filter;
mod likert;
mod loader;
mod metrics;
mod output;
mod source;
mod types;
mod util;

use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use config::AppConfig;
use filter::{Selection, TimeFilter, DEPARTMENT_ALL};
use likert::LikertScale;
use source::{DatasetCache, LoadStatus};
use types::{FreeTextEntry, FreeTextRow, OverviewRow, SurveyRecord};
use util::{format_int, format_number, parse_i32_safe};

// Simple in-memory app state so the dataset survives between menu rounds;
// the cache decides when a reload actually re-parses.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        cache: DatasetCache::default(),
    })
});

struct AppState {
    cache: DatasetCache,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt.
fn read_choice() -> String {
    read_line("Enter choice: ")
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after a dashboard render.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the survey data through the cache.
fn handle_load(cfg: &AppConfig) {
    let columns = cfg.column_map();
    let source = cfg.source();
    let mut state = APP_STATE.lock().unwrap();
    match state.cache.load(&source, &columns) {
        Ok((dataset, status)) => {
            let report = &dataset.report;
            match status {
                LoadStatus::Parsed => {
                    println!(
                        "Processing dataset... ({} rows read, {} kept)",
                        format_int(report.total_rows),
                        format_int(report.loaded_rows)
                    );
                    if report.dropped_no_timestamp > 0 {
                        println!(
                            "Note: {} rows dropped without a parseable timestamp.",
                            format_int(report.dropped_no_timestamp)
                        );
                    }
                    if report.read_errors > 0 {
                        println!(
                            "Note: {} rows skipped due to CSV read errors.",
                            format_int(report.read_errors)
                        );
                    }
                }
                LoadStatus::CacheFresh => {
                    println!("Remote data still fresh, reusing parsed dataset.")
                }
                LoadStatus::CacheSignature => {
                    println!("Source unchanged, reusing parsed dataset.")
                }
            }
            if let Some((min, max)) = dataset.date_range() {
                println!(
                    "Data range: {} - {}",
                    min.format("%d %b %Y"),
                    max.format("%d %b %Y")
                );
            }
            println!();
        }
        Err(e) => {
            eprintln!("Failed to load survey data: {:#}\n", e);
        }
    }
}

/// Handle option [2]: pick a selection, filter, aggregate, render.
fn handle_dashboard() {
    let state = APP_STATE.lock().unwrap();
    let Some(dataset) = state.cache.dataset() else {
        println!("Error: No data loaded. Please load the survey data first (option 1).\n");
        return;
    };
    let records = &dataset.records;
    if records.is_empty() {
        println!("The dataset has no usable rows.\n");
        return;
    }

    let department = select_department(records);
    let time = select_time(records);
    let selection = Selection::new(&department, time);
    let view = selection.apply(records);
    if view.is_empty() {
        println!("No data for this selection.\n");
        return;
    }
    render_dashboard(&view, &selection);
}

fn select_department(records: &[SurveyRecord]) -> String {
    let depts = filter::departments(records);
    println!("Select department:");
    println!("[0] {} (ภาพรวมทั้งหมด)", DEPARTMENT_ALL);
    for (i, d) in depts.iter().enumerate() {
        println!("[{}] {}", i + 1, d);
    }
    loop {
        match parse_i32_safe(Some(&read_choice())) {
            Some(0) => return DEPARTMENT_ALL.to_string(),
            Some(n) if n >= 1 && (n as usize) <= depts.len() => {
                return depts[(n - 1) as usize].clone()
            }
            _ => println!("Invalid choice. Please enter 0-{}.", depts.len()),
        }
    }
}

fn select_time(records: &[SurveyRecord]) -> TimeFilter {
    println!("Select time period:");
    println!("[1] All");
    println!("[2] By year");
    println!("[3] By quarter");
    println!("[4] By month");
    loop {
        match read_choice().as_str() {
            "1" => return TimeFilter::All,
            "2" => return TimeFilter::Year(select_year(records)),
            "3" => {
                let year = select_year(records);
                let quarter = select_from(
                    "quarter",
                    &filter::quarters_in_year(records, year),
                    |q| format!("Q{}", q),
                );
                return TimeFilter::Quarter { year, quarter };
            }
            "4" => {
                let year = select_year(records);
                let month = select_from("month", &filter::months_in_year(records, year), |m| {
                    format!("{} ({})", m, filter::month_label(m))
                });
                return TimeFilter::Month { year, month };
            }
            _ => println!("Invalid choice. Please enter 1-4."),
        }
    }
}

fn select_year(records: &[SurveyRecord]) -> i32 {
    let years = filter::years(records);
    println!("Select year:");
    for (i, y) in years.iter().enumerate() {
        println!("[{}] {}", i + 1, y);
    }
    loop {
        match parse_i32_safe(Some(&read_choice())) {
            Some(n) if n >= 1 && (n as usize) <= years.len() => return years[(n - 1) as usize],
            _ => println!("Invalid choice. Please enter 1-{}.", years.len()),
        }
    }
}

/// Numbered pick from the values actually observed in the chosen year.
fn select_from(what: &str, values: &[u32], label: impl Fn(u32) -> String) -> u32 {
    println!("Select {}:", what);
    for (i, v) in values.iter().enumerate() {
        println!("[{}] {}", i + 1, label(*v));
    }
    loop {
        match parse_i32_safe(Some(&read_choice())) {
            Some(n) if n >= 1 && (n as usize) <= values.len() => {
                return values[(n - 1) as usize]
            }
            _ => println!("Invalid choice. Please enter 1-{}.", values.len()),
        }
    }
}

/// Render one dashboard cycle: overview metrics, per-question score
/// breakdown, free-text feedback; each table also exported.
fn render_dashboard(view: &[SurveyRecord], selection: &Selection) {
    let scale = LikertScale::default();
    let summary = metrics::build_summary(
        view,
        &scale,
        selection.department_label(),
        &selection.time.label(),
    );

    println!("\nDASHBOARD: {} / {}\n", summary.department, summary.period);

    let overview = vec![
        OverviewRow {
            metric: "Responses".to_string(),
            value: format_int(summary.total_responses),
        },
        OverviewRow {
            metric: "Average satisfaction (1-5)".to_string(),
            value: fmt_opt_number(summary.avg_satisfaction, 2),
        },
        OverviewRow {
            metric: "% would return".to_string(),
            value: fmt_opt_pct(summary.pct_will_return, 1),
        },
        OverviewRow {
            metric: "% would recommend".to_string(),
            value: fmt_opt_pct(summary.pct_will_recommend, 1),
        },
        OverviewRow {
            metric: "% dissatisfied".to_string(),
            value: fmt_opt_pct(summary.pct_dissatisfied, 2),
        },
        OverviewRow {
            metric: "Most common health status".to_string(),
            value: summary
                .most_common_health_status
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        },
    ];
    output::preview_table("Overview", &overview, overview.len());

    if selection.department.is_none() {
        let counts = metrics::department_counts(view);
        output::preview_table("Responses by department", &counts, 10);
        if let Err(e) = output::write_csv("dashboard_department_counts.csv", &counts) {
            eprintln!("Write error: {}", e);
        }
    }

    let questions = metrics::question_score_rows(view, &scale);
    output::preview_table("Satisfaction by question", &questions, questions.len());
    if let Err(e) = output::write_csv("dashboard_question_scores.csv", &questions) {
        eprintln!("Write error: {}", e);
    }

    let dissatisfaction = metrics::free_text_entries(
        view,
        |r| r.dissatisfaction_detail.as_deref(),
        &[metrics::NONE_SENTINEL],
    );
    let expectations = metrics::free_text_entries(
        view,
        |r| r.expectation.as_deref(),
        &[metrics::NONE_SENTINEL],
    );
    let mut free_rows: Vec<FreeTextRow> = Vec::new();
    for e in &dissatisfaction {
        free_rows.push(free_text_row("ความไม่พึงพอใจ", e));
    }
    for e in &expectations {
        free_rows.push(free_text_row("ความคาดหวัง/ข้อเสนอแนะ", e));
    }
    if free_rows.is_empty() {
        println!("No dissatisfaction details or expectations in this selection.\n");
    } else {
        output::preview_table("Free-text feedback", &free_rows, 20);
    }
    if let Err(e) = output::write_csv("dashboard_free_text.csv", &free_rows) {
        eprintln!("Write error: {}", e);
    }

    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Exports: dashboard_question_scores.csv, dashboard_free_text.csv, summary.json\n"
    );
}

fn free_text_row(topic: &str, entry: &FreeTextEntry) -> FreeTextRow {
    FreeTextRow {
        topic: topic.to_string(),
        department: entry
            .department
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        detail: entry.text.clone(),
    }
}

fn fmt_opt_number(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format_number(x, decimals))
        .unwrap_or_else(|| "N/A".to_string())
}

fn fmt_opt_pct(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{}%", format_number(x, decimals)))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Handle option [3]: password-gated .xlsx import into the raw-input CSV.
fn handle_admin_import(cfg: &AppConfig) {
    let password = read_line("Admin password: ");
    if !admin::verify_password(&password, &cfg.admin_password) {
        println!("Incorrect password.\n");
        return;
    }
    let path = read_line("Path to .xlsx workbook: ");
    if path.is_empty() {
        println!("No file given.\n");
        return;
    }
    match admin::import_workbook(Path::new(&path), Path::new(&cfg.data_file)) {
        Ok(rows) => {
            println!(
                "Imported {} rows into {}.",
                format_int(rows),
                cfg.data_file
            );
            println!("Use option [1] to reload the dataset.\n");
        }
        Err(e) => {
            eprintln!("Import failed: {:#}\n", e);
        }
    }
}

fn main() {
    env_logger::init();

    let config = match AppConfig::load_or_default(Path::new(config::CONFIG_FILE)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    loop {
        println!("Patient Experience Dashboard");
        println!("[1] Load survey data");
        println!("[2] Show dashboard");
        println!("[3] Admin: import .xlsx workbook");
        println!("[4] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&config),
            "2" => {
                println!();
                handle_dashboard();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => handle_admin_import(&config),
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1-4.\n");
            }
        }
    }
}
