//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads a snapshot file or generates a synthetic sample
//! - runs the aggregation pipeline
//! - prints reports/charts
//! - writes optional exports

use std::fs::File;

use clap::Parser;

use crate::cli::{ChartArgs, Command, PlotArgs, RankArgs, SampleArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::domain::{ChartPoint, VariationCatalog};
use crate::error::AppError;
use crate::io::ingest::{IngestedSnapshot, ingest_data, load_snapshot};
use crate::report::PercentFormatter;

pub mod pipeline;

use pipeline::RunConfig;

/// Entry point for the `cvr` binary.
pub fn run() -> Result<(), AppError> {
    // We want `cvr` and `cvr -m week` to behave like `cvr tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Chart(args) => handle_chart(args),
        Command::Rank(args) => handle_rank(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

/// Load the input snapshot, or fall back to a generated sample.
pub fn load_or_generate(args: &ChartArgs) -> Result<IngestedSnapshot, AppError> {
    match &args.input {
        Some(path) => load_snapshot(path),
        None => {
            let config = SampleConfig {
                variations: args.sample_variations,
                days: args.days,
                seed: args.seed,
                ..SampleConfig::default()
            };
            ingest_data(generate_sample(&config)?)
        }
    }
}

pub fn run_config_from_args(args: &ChartArgs) -> RunConfig {
    RunConfig {
        mode: args.mode,
        selected: if args.variations.is_empty() {
            None
        } else {
            Some(args.variations.clone())
        },
    }
}

fn report_row_errors(snapshot: &IngestedSnapshot) {
    for err in &snapshot.row_errors {
        eprintln!(
            "warning: skipped row {} (date '{}'): {}",
            err.row, err.date, err.message
        );
    }
}

fn handle_chart(args: ChartArgs) -> Result<(), AppError> {
    let snapshot = load_or_generate(&args)?;
    report_row_errors(&snapshot);

    let catalog = VariationCatalog::from_raw(&snapshot.data.variations);
    let config = run_config_from_args(&args);
    let run = pipeline::run_chart(&snapshot.data, &catalog, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &snapshot.stats,
            &catalog,
            args.mode,
            run.range,
            run.points.len(),
        )
    );

    let chart = crate::plot::render_ascii_chart(
        &run.points,
        &catalog,
        &run.selected,
        run.range,
        args.width,
        args.height,
    );
    println!("{chart}");

    if let Some(last) = run.points.last() {
        println!(
            "{}",
            crate::report::format_point_table(last, &catalog, &PercentFormatter::comma())
        );
    }

    if let Some(path) = &args.export_csv {
        crate::io::export::write_points_csv(path, &run.points, &catalog, &run.selected)?;
    }
    if let Some(path) = &args.export_series {
        let series = crate::io::series::build_series_file(
            &run.points,
            &catalog,
            &run.selected,
            run.range,
            args.mode,
        );
        crate::io::series::write_series_json(path, &series)?;
    }

    Ok(())
}

fn handle_rank(args: RankArgs) -> Result<(), AppError> {
    let snapshot = load_or_generate(&args.chart)?;
    report_row_errors(&snapshot);

    let catalog = VariationCatalog::from_raw(&snapshot.data.variations);
    let config = run_config_from_args(&args.chart);
    let run = pipeline::run_chart(&snapshot.data, &catalog, &config)?;

    let point = find_bucket(&run.points, args.date.as_deref())?;
    println!(
        "{}",
        crate::report::format_point_table(point, &catalog, &PercentFormatter::comma())
    );

    Ok(())
}

/// Resolve `--date` against the aggregated buckets (default: last bucket).
fn find_bucket<'a>(
    points: &'a [ChartPoint],
    date: Option<&str>,
) -> Result<&'a ChartPoint, AppError> {
    match date {
        Some(wanted) => points
            .iter()
            .find(|p| p.date == wanted)
            .ok_or_else(|| AppError::new(2, format!("No bucket with date '{wanted}'."))),
        None => points
            .last()
            .ok_or_else(|| AppError::new(2, "No buckets to rank.")),
    }
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let series = crate::io::series::read_series_json(&args.series)?;
    let plot = crate::plot::render_ascii_chart_from_series(&series, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        variations: args.variations,
        days: args.days,
        start_date: args.start_date,
        seed: args.seed,
        base_rate: args.base_rate,
        gap_prob: args.gap_prob,
        ..SampleConfig::default()
    };
    let data = generate_sample(&config)?;

    let file = File::create(&args.output).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create snapshot '{}': {e}", args.output.display()),
        )
    })?;
    serde_json::to_writer_pretty(file, &data)
        .map_err(|e| AppError::new(2, format!("Failed to write snapshot JSON: {e}")))?;

    println!(
        "Wrote {} rows x {} variations to {}",
        data.data.len(),
        data.variations.len(),
        args.output.display()
    );
    Ok(())
}

/// Rewrite argv so `cvr` defaults to `cvr tui`.
///
/// Rules:
/// - `cvr`                     -> `cvr tui`
/// - `cvr -m week ...`         -> `cvr tui -m week ...`
/// - `cvr --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "chart" | "rank" | "plot" | "sample" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["cvr"])), args(&["cvr", "tui"]));
        assert_eq!(
            rewrite_args(args(&["cvr", "-m", "week"])),
            args(&["cvr", "tui", "-m", "week"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["cvr", "chart", "-m", "week"])),
            args(&["cvr", "chart", "-m", "week"])
        );
        assert_eq!(rewrite_args(args(&["cvr", "--help"])), args(&["cvr", "--help"]));
        assert_eq!(rewrite_args(args(&["cvr", "-V"])), args(&["cvr", "-V"]));
    }

    #[test]
    fn find_bucket_prefers_exact_date_then_last() {
        use std::collections::BTreeMap;
        let mk = |date: &str| ChartPoint {
            date: date.to_string(),
            label: date.to_string(),
            timestamp: 0,
            values: BTreeMap::new(),
        };
        let points = vec![mk("2023-01-02"), mk("2023-01-03")];

        assert_eq!(
            find_bucket(&points, Some("2023-01-02")).unwrap().date,
            "2023-01-02"
        );
        assert_eq!(find_bucket(&points, None).unwrap().date, "2023-01-03");
        assert_eq!(
            find_bucket(&points, Some("2023-02-01")).unwrap_err().exit_code(),
            2
        );
        assert_eq!(find_bucket(&[], None).unwrap_err().exit_code(), 2);
    }
}
