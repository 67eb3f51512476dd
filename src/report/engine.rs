//! The three-pass report engine.
//!
//! ```text
//! ## Project P, quality control report, File out.txt : 2024-05-01_10:00:00   (optional)
//! ### Caption   <chapter 1 caption cells>   <chapter 2 caption cells> ...
//! ### Run       <chapter 1 header cells>    <chapter 2 header cells>  ...
//! run1          <chapter 1 data cells>      <chapter 2 data cells>    ...
//! ```
//!
//! Each chapter occupies exactly [`Chapter::width`] columns on every row.

use std::io::Write;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{Subject, SubjectKind};
use crate::report::chapter::{Chapter, ChapterError};
use crate::report::config::ReportConfig;
use crate::report::field::{FieldContext, Scratch, TitleContext};
use crate::report::format::{blanks, sanitize};
use crate::source::{AttributeSource, SubjectView};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Column count drift in chapter '{chapter}' for {subject}: expected {expected} cells, found {found}"
    )]
    ColumnDrift {
        chapter: char,
        subject: String,
        expected: usize,
        found: usize,
    },
}

/// Counts collected while rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub subjects: usize,
    pub rows_written: usize,
    /// Variant rows dropped by the frequency/coverage filter
    pub rows_filtered: usize,
    /// Subject chapters replaced by empty placeholders after a malformed value
    pub chapters_failed: usize,
}

/// Renders chapters for a list of subjects
pub struct ReportEngine<'a> {
    source: &'a dyn AttributeSource,
    chapters: Vec<Chapter>,
    config: &'a ReportConfig,
    titles: TitleContext,
}

impl<'a> ReportEngine<'a> {
    pub fn new(source: &'a dyn AttributeSource, chapters: Vec<Chapter>, config: &'a ReportConfig) -> Self {
        let titles = TitleContext {
            project: config.project.clone().unwrap_or_default(),
            targets: config.targets.clone(),
        };
        Self {
            source,
            chapters,
            config,
            titles,
        }
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Total number of columns after the row label
    #[must_use]
    pub fn width(&self) -> usize {
        self.chapters.iter().map(Chapter::width).sum()
    }

    /// Write the whole report.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` on write failure and
    /// `ReportError::ColumnDrift` when a chapter's column count differs
    /// between passes. Malformed values never fail the report; the affected
    /// chapter is left empty for that subject.
    pub fn render<W: Write>(&self, subjects: &[Subject], out: &mut W) -> Result<RenderSummary, ReportError> {
        let mut summary = RenderSummary {
            subjects: subjects.len(),
            ..RenderSummary::default()
        };

        if self.config.preamble {
            self.write_preamble(out)?;
        }
        self.write_captions(out)?;
        self.write_headers(out)?;

        let filter_rows = self.config.kind == SubjectKind::Variant && self.config.filter.is_enabled();
        for subject in subjects {
            let view = SubjectView::new(self.source, subject);
            if filter_rows && !self.config.filter.accepts(&view) {
                debug!("Filtered out {}", subject.id);
                summary.rows_filtered += 1;
                continue;
            }
            let row = self.data_row(&view, &mut summary)?;
            write_row(out, &subject.label, &row)?;
            summary.rows_written += 1;
        }

        info!(
            "Wrote {} rows ({} filtered, {} chapter failures)",
            summary.rows_written, summary.rows_filtered, summary.chapters_failed
        );
        Ok(summary)
    }

    fn write_preamble<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        let timestamp = self
            .config
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d_%H:%M:%S").to_string());
        writeln!(
            out,
            "## Project {}, quality control report, File {} : {}",
            sanitize(self.config.project.as_deref().unwrap_or("NULL")),
            sanitize(self.config.output_name.as_deref().unwrap_or("stdout")),
            timestamp
        )?;
        Ok(())
    }

    fn write_captions<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        let cells: Vec<String> = self
            .chapters
            .iter()
            .flat_map(|c| c.caption_cells(&self.titles))
            .collect();
        write_row(out, "### Caption", &cells)?;
        Ok(())
    }

    fn write_headers<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        let mut cells = Vec::with_capacity(self.width());
        for chapter in &self.chapters {
            let header = chapter.header_cells(&self.titles);
            if header.len() != chapter.width() {
                return Err(ReportError::ColumnDrift {
                    chapter: chapter.code,
                    subject: "header".to_string(),
                    expected: chapter.width(),
                    found: header.len(),
                });
            }
            cells.extend(header.into_iter().map(|c| sanitize(&c)));
        }
        write_row(out, &format!("### {}", self.config.kind), &cells)?;
        Ok(())
    }

    fn data_row(&self, view: &SubjectView<'_>, summary: &mut RenderSummary) -> Result<Vec<String>, ReportError> {
        let mut row = Vec::with_capacity(self.width());
        let mut scratch = Scratch::default();

        for chapter in &self.chapters {
            scratch.clear();
            let mut ctx = FieldContext {
                view,
                scratch: &mut scratch,
                titles: &self.titles,
            };
            match chapter.data_cells(&mut ctx) {
                Ok(cells) => row.extend(cells),
                Err(ChapterError::Field(e)) => {
                    warn!(
                        "Chapter '{}' left empty for {}: {}",
                        chapter.code,
                        view.subject().id,
                        e
                    );
                    summary.chapters_failed += 1;
                    row.extend(blanks(chapter.width()));
                }
                Err(ChapterError::Drift { expected, found, .. }) => {
                    return Err(ReportError::ColumnDrift {
                        chapter: chapter.code,
                        subject: view.subject().id.to_string(),
                        expected,
                        found,
                    });
                }
            }
        }
        Ok(row)
    }
}

fn write_row<W: Write>(out: &mut W, label: &str, cells: &[String]) -> std::io::Result<()> {
    out.write_all(sanitize(label).as_bytes())?;
    for cell in cells {
        out.write_all(b"\t")?;
        out.write_all(cell.as_bytes())?;
    }
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cell, SubjectId, Table};
    use crate::report::field::{Field, FieldError};
    use crate::report::filter::VariantFilter;
    use crate::source::SubjectQuery;

    struct Fixture;

    impl AttributeSource for Fixture {
        fn scalar(&self, subject: &SubjectId, relation: &str) -> Option<Cell> {
            self.table(subject, relation).and_then(|t| t.cell(0, 0).cloned())
        }

        fn table(&self, subject: &SubjectId, relation: &str) -> Option<Table> {
            match (subject.as_str(), relation) {
                ("v1", "BRS_counts") => Some(Table::new(vec![vec![
                    Some(Cell::Text("RNA_AGLR1_A1".to_string())),
                    Some(Cell::Int(20)),
                    Some(Cell::Int(5)),
                ]])),
                ("v2", "BRS_counts") => Some(Table::new(vec![vec![
                    Some(Cell::Text("RNA_AGLR1_A1".to_string())),
                    Some(Cell::Int(20)),
                    Some(Cell::Int(3)),
                ]])),
                (_, "Gene") => Some(Table::single(Cell::Text(format!("gene-{subject}")))),
                _ => None,
            }
        }

        fn resolve_subjects(&self, _: &SubjectQuery) -> Vec<Subject> {
            Vec::new()
        }
    }

    fn chapters() -> Vec<Chapter> {
        vec![
            Chapter::new('g', "Genes", "Genes")
                .field(Field::spacer())
                .field(Field::plain("Gene", 0, "Gene")),
            Chapter::new('f', "Fragile", "Fragile")
                .field(Field::computed(1, "One\tTwo"))
                .compute(|ctx, _| {
                    if ctx.view.subject().id.as_str() == "v3" {
                        Err(FieldError::malformed("Gene", "unexpected text"))
                    } else {
                        Ok(Some(vec!["1".to_string(), "2".to_string()]))
                    }
                }),
        ]
    }

    fn subjects(ids: &[&str]) -> Vec<Subject> {
        ids.iter().map(|id| Subject::new(*id, SubjectKind::Variant)).collect()
    }

    fn render(config: &ReportConfig, ids: &[&str]) -> (String, RenderSummary) {
        let engine = ReportEngine::new(&Fixture, chapters(), config);
        let mut out = Vec::new();
        let summary = engine.render(&subjects(ids), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn test_rows_are_rectangular() {
        let config = ReportConfig {
            filter: VariantFilter::disabled(),
            ..ReportConfig::default()
        };
        let (text, summary) = render(&config, &["v1", "v2", "v3"]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "### Caption\t\tGenes\t\tFragile");
        assert_eq!(lines[1], "### Variant\t\tGene\tOne\tTwo");
        assert_eq!(lines[2], "v1\t\tgene-v1\t1\t2");
        for line in &lines {
            assert_eq!(line.split('\t').count(), 5);
        }
        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.chapters_failed, 1);
    }

    #[test]
    fn test_malformed_value_is_isolated() {
        let config = ReportConfig {
            filter: VariantFilter::disabled(),
            ..ReportConfig::default()
        };
        let (text, _) = render(&config, &["v3", "v1"]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "v3\t\tgene-v3\t\t");
        assert_eq!(lines[3], "v1\t\tgene-v1\t1\t2");
    }

    #[test]
    fn test_filter_drops_weak_variants() {
        let config = ReportConfig::default();
        let (text, summary) = render(&config, &["v1", "v2", "v3"]);
        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.rows_filtered, 2);
        assert!(text.lines().any(|l| l.starts_with("v1\t")));
        assert!(!text.lines().any(|l| l.starts_with("v2\t")));
    }

    #[test]
    fn test_filter_ignored_for_runs() {
        let config = ReportConfig {
            kind: SubjectKind::Run,
            ..ReportConfig::default()
        };
        let (text, summary) = render(&config, &["v2"]);
        assert_eq!(summary.rows_written, 1);
        assert!(text.contains("### Run\t"));
    }

    #[test]
    fn test_preamble() {
        let config = ReportConfig {
            preamble: true,
            project: Some("Liver".to_string()),
            output_name: Some("out.SNP_summary.txt".to_string()),
            timestamp: Some("2024-01-01_00:00:00".to_string()),
            filter: VariantFilter::disabled(),
            ..ReportConfig::default()
        };
        let (text, _) = render(&config, &[]);
        assert_eq!(
            text.lines().next(),
            Some("## Project Liver, quality control report, File out.SNP_summary.txt : 2024-01-01_00:00:00")
        );
    }

    #[test]
    fn test_drift_aborts() {
        let config = ReportConfig {
            filter: VariantFilter::disabled(),
            ..ReportConfig::default()
        };
        let bad = vec![Chapter::new('q', "Bad", "Bad")
            .field(Field::computed(1, "a\tb\tc"))
            .compute(|_, _| Ok(Some(vec![String::new()])))];
        let engine = ReportEngine::new(&Fixture, bad, &config);
        let mut out = Vec::new();
        let err = engine.render(&subjects(&["v1"]), &mut out).unwrap_err();
        assert!(matches!(
            err,
            ReportError::ColumnDrift {
                chapter: 'q',
                expected: 3,
                found: 1,
                ..
            }
        ));
    }
}
