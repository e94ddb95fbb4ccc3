//! Command-line parsing for the conversion-rate series explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the aggregation/reporting code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::TimeMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "cvr",
    version,
    about = "Conversion-rate series explorer for A/B test snapshots"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate a snapshot, print summary/chart/rankings, and optionally export.
    Chart(ChartArgs),
    /// Print the ranked rates for a single bucket only (useful for scripting).
    Rank(RankArgs),
    /// Plot a previously exported series JSON.
    Plot(PlotArgs),
    /// Write a synthetic snapshot JSON (deterministic for a given seed).
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `cvr chart`, but renders the
    /// series in a terminal UI with mode/selection toggles and a point
    /// inspector.
    Tui(ChartArgs),
}

/// Common options for charting, ranking, and the TUI.
#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// Input snapshot JSON; omit to use a generated sample.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Time bucketing: one point per day, or per ISO week.
    #[arg(short = 'm', long, value_enum, default_value_t = TimeMode::Day)]
    pub mode: TimeMode,

    /// Comma-separated variation ids to include (default: all).
    #[arg(long, value_delimiter = ',')]
    pub variations: Vec<String>,

    /// Random seed for the generated sample (ignored with --input).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Days of generated sample data (ignored with --input).
    #[arg(long, default_value_t = 60)]
    pub days: usize,

    /// Arms in the generated sample, control included (ignored with --input).
    #[arg(long = "arms", default_value_t = 3)]
    pub sample_variations: usize,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-point rates to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Export the prepared series (points + range + catalog) to JSON.
    #[arg(long = "export-series")]
    pub export_series: Option<PathBuf>,
}

/// Options for ranking a single bucket.
#[derive(Debug, Parser)]
pub struct RankArgs {
    #[command(flatten)]
    pub chart: ChartArgs,

    /// Bucket to inspect: a calendar date (YYYY-MM-DD) in day mode, a week id
    /// (YYYY-Www) in week mode. Defaults to the last bucket.
    #[arg(long)]
    pub date: Option<String>,
}

/// Options for plotting a saved series.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Series JSON file produced by `cvr chart --export-series`.
    #[arg(long, value_name = "JSON")]
    pub series: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for writing a synthetic snapshot.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output path for the snapshot JSON.
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of consecutive days.
    #[arg(long, default_value_t = 60)]
    pub days: usize,

    /// Number of arms, control included.
    #[arg(long = "arms", default_value_t = 3)]
    pub variations: usize,

    /// First calendar day of the snapshot.
    #[arg(long, default_value = "2023-01-02")]
    pub start_date: NaiveDate,

    /// Control conversion rate (fraction).
    #[arg(long, default_value_t = 0.042)]
    pub base_rate: f64,

    /// Probability of a missing-data day per variation.
    #[arg(long, default_value_t = 0.03)]
    pub gap_prob: f64,
}
