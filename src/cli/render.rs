use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use flate2::{write::GzEncoder, Compression};
use tracing::{info, warn};

use crate::chapters;
use crate::core::{Subject, SubjectKind};
use crate::report::config::DEFAULT_SELECTION;
use crate::report::{RenderSummary, ReportConfig, ReportEngine, TargetSet, VariantFilter};
use crate::source::{AttributeSource, KnowledgeBase, SubjectQuery};

/// Suffix appended to the `--output` prefix
pub const REPORT_SUFFIX: &str = ".SNP_summary.txt";

/// Relation a variant needs to pass `--danli-only`
const DANLI_COUNTS: &str = "DanLi_counts";

#[derive(Args)]
pub struct RenderArgs {
    /// Snapshot file (JSON, optionally gzip-compressed)
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Project whose runs and groups are reported
    #[arg(long)]
    pub project: Option<String>,

    /// Kind of subject, one row each
    #[arg(long, value_enum, default_value = "variant")]
    pub subjects: SubjectsArg,

    /// Relation ordering the rows
    #[arg(long, default_value = "Sorting_title")]
    pub order_by: String,

    /// Chapter codes, in report order
    #[arg(long, default_value = DEFAULT_SELECTION)]
    pub export: String,

    /// Up to three annotation targets, whitespace separated (e.g. "av RefSeq EBI")
    #[arg(long, env = "ETARGETS", default_value = "")]
    pub targets: String,

    /// Minimal allele frequency (%) a variant needs in one replicate
    #[arg(long, default_value = "20")]
    pub min_frequency: u32,

    /// Minimal coverage a variant needs in one replicate
    #[arg(long, default_value = "20")]
    pub min_coverage: u32,

    /// Only report variants carrying Dan Li counts
    #[arg(long)]
    pub danli_only: bool,

    /// Fail on unknown chapter codes instead of skipping them
    #[arg(long)]
    pub strict: bool,

    /// Output prefix; the report is written to <prefix>.SNP_summary.txt.
    /// If not specified, prints to stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compress the report with gzip
    #[arg(long)]
    pub gzip: bool,

    /// Omit the leading `## Project ...` line
    #[arg(long)]
    pub no_preamble: bool,
}

/// Subject kind argument for CLI
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SubjectsArg {
    Run,
    Group,
    Variant,
}

impl From<SubjectsArg> for SubjectKind {
    fn from(arg: SubjectsArg) -> Self {
        match arg {
            SubjectsArg::Run => SubjectKind::Run,
            SubjectsArg::Group => SubjectKind::Group,
            SubjectsArg::Variant => SubjectKind::Variant,
        }
    }
}

impl RenderArgs {
    /// Path of the report file, if any
    #[must_use]
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_ref().map(|prefix| {
            let mut name = format!("{prefix}{REPORT_SUFFIX}");
            if self.gzip {
                name.push_str(".gz");
            }
            PathBuf::from(name)
        })
    }

    fn config(&self) -> anyhow::Result<ReportConfig> {
        let targets = TargetSet::parse(&self.targets).context("Invalid --targets")?;
        Ok(ReportConfig {
            selection: self.export.clone(),
            targets,
            project: self.project.clone(),
            filter: VariantFilter {
                min_frequency: self.min_frequency,
                min_coverage: self.min_coverage,
            },
            strict: self.strict,
            kind: self.subjects.into(),
            preamble: !self.no_preamble,
            output_name: self
                .output_path()
                .map(|p| p.display().to_string()),
            timestamp: None,
        })
    }

    fn query(&self) -> SubjectQuery {
        SubjectQuery {
            kind: self.subjects.into(),
            project: self.project.clone(),
            order_by: Some(self.order_by.clone()).filter(|o| !o.is_empty()),
            require: self.danli_only.then(|| DANLI_COUNTS.to_string()),
        }
    }
}

/// Execute render subcommand
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded, the chapter selection or
/// target list is invalid, or the report cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RenderArgs, verbose: bool) -> anyhow::Result<()> {
    let config = args.config()?;
    let selected = chapters::select(&config.selection, config.strict)
        .with_context(|| format!("Invalid chapter selection '{}'", config.selection))?;

    let kb = KnowledgeBase::load_from_file(&args.db)
        .with_context(|| format!("Failed to load snapshot {}", args.db.display()))?;
    let subjects = kb.resolve_subjects(&args.query());
    if subjects.is_empty() {
        warn!("No {} matches the query, writing headers only", config.kind);
    }
    info!(
        "Rendering {} chapters for {} subjects",
        selected.len(),
        subjects.len()
    );

    let engine = ReportEngine::new(&kb, selected, &config);

    let summary = match args.output_path() {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let summary = write_report(&engine, &subjects, BufWriter::new(file), args.gzip)?;
            if verbose {
                eprintln!("Report written to {}", path.display());
            }
            summary
        }
        None => write_report(&engine, &subjects, io::stdout().lock(), args.gzip)?,
    };

    if verbose {
        eprintln!(
            "{} rows written, {} variants filtered out, {} chapters left empty after malformed values",
            summary.rows_written, summary.rows_filtered, summary.chapters_failed
        );
    }
    Ok(())
}

fn write_report<W: Write>(
    engine: &ReportEngine<'_>,
    subjects: &[Subject],
    out: W,
    gzip: bool,
) -> anyhow::Result<RenderSummary> {
    if gzip {
        let mut encoder = GzEncoder::new(out, Compression::default());
        let summary = engine.render(subjects, &mut encoder)?;
        encoder
            .finish()
            .context("Failed to finish gzip stream")?
            .flush()?;
        Ok(summary)
    } else {
        let mut out = out;
        let summary = engine.render(subjects, &mut out)?;
        out.flush()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RenderArgs,
    }

    fn parse(argv: &[&str]) -> RenderArgs {
        let mut full = vec!["qc-summary"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--db", "kb.json"]);
        assert_eq!(args.export, "IbdBDN");
        assert_eq!(args.order_by, "Sorting_title");
        assert!(args.output_path().is_none());

        let query = args.query();
        assert_eq!(query.kind, SubjectKind::Variant);
        assert_eq!(query.require, None);
    }

    #[test]
    fn test_output_path() {
        let args = parse(&["--db", "kb.json", "-o", "out/P1", "--gzip"]);
        assert_eq!(
            args.output_path(),
            Some(PathBuf::from("out/P1.SNP_summary.txt.gz"))
        );
        let config = args.config().unwrap();
        assert_eq!(config.output_name.as_deref(), Some("out/P1.SNP_summary.txt.gz"));
        assert!(config.preamble);
    }

    #[test]
    fn test_danli_only() {
        let args = parse(&["--db", "kb.json", "--danli-only", "--subjects", "run"]);
        let query = args.query();
        assert_eq!(query.kind, SubjectKind::Run);
        assert_eq!(query.require.as_deref(), Some("DanLi_counts"));
    }

    #[test]
    fn test_too_many_targets() {
        let args = parse(&["--db", "kb.json", "--targets", "a b c d"]);
        assert!(args.config().is_err());
    }
}
