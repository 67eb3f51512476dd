//! Command-line interface for qc-summary.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **render**: Render the tab-delimited QC report for runs, groups or variants
//! - **chapters**: List the chapter alphabet
//!
//! ## Usage
//!
//! ```text
//! # Variant summary (chapters IbdBDN) to stdout
//! qc-summary render --db snapshot.json.gz
//!
//! # Run report for one project, written to MyProject.SNP_summary.txt
//! qc-summary render --db snapshot.json --subjects run --project MyProject \
//!     --export ITrasmvc --targets "av RefSeq EBI" -o MyProject
//!
//! # Chapter codes as JSON
//! qc-summary chapters --format json
//! ```

use clap::{Parser, Subcommand};

pub mod chapters;
pub mod render;

#[derive(Parser)]
#[command(name = "qc-summary")]
#[command(version)]
#[command(about = "Render tab-delimited quality control reports for sequencing runs and variants")]
#[command(
    long_about = "qc-summary reads a snapshot of per-run, per-group and per-variant attributes and renders a wide tab-delimited report.\n\nThe report is assembled from chapters selected by single-letter codes:\n- A caption row describing each chapter\n- A header row with one title per column\n- One data row per subject, every chapter at a fixed width"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for listings
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a QC report from a snapshot
    Render(render::RenderArgs),

    /// List the available chapters
    Chapters(chapters::ChaptersArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
