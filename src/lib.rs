//! # qc-summary
//!
//! A library for rendering wide, tab-delimited quality control reports over
//! sequencing runs, run groups and genetic variants.
//!
//! A report is a grid: one row per subject, and a sequence of chapters, each a
//! fixed-width group of columns. Chapters are picked by single-letter codes
//! (`I` variant identifiers, `b` BRS allele frequencies, `m` mismatch types,
//! ...). Every report starts with a caption row and a header row, so the
//! output loads as-is into a spreadsheet.
//!
//! ## Features
//!
//! - **Fixed-width chapters**: caption, header and data rows always line up
//! - **Placeholder titles**: `{project}` and `{target1..3}` filled at render time
//! - **Event classification**: mismatch and variant codes into substitution, indel and polymer families
//! - **Replicate consistency**: binomial outlier detection across replicates and assays
//! - **Variant filtering**: minimal allele frequency and coverage in any replicate
//! - **Fault isolation**: a malformed value empties one chapter for one subject, never the report
//!
//! ## Example
//!
//! ```rust,no_run
//! use qc_summary::chapters;
//! use qc_summary::report::{ReportConfig, ReportEngine};
//! use qc_summary::source::{AttributeSource, KnowledgeBase, SubjectQuery};
//! use qc_summary::SubjectKind;
//!
//! let kb = KnowledgeBase::load_from_file("snapshot.json.gz".as_ref()).unwrap();
//! let config = ReportConfig::default();
//! let subjects = kb.resolve_subjects(&SubjectQuery::new(SubjectKind::Variant));
//!
//! let engine = ReportEngine::new(&kb, chapters::select(&config.selection, false).unwrap(), &config);
//! let summary = engine.render(&subjects, &mut std::io::stdout()).unwrap();
//! eprintln!("{} rows", summary.rows_written);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Subjects, cells and tables
//! - [`source`]: Attribute sources and the JSON snapshot backend
//! - [`stats`]: Event classification and replicate consistency
//! - [`report`]: Fields, chapters and the three-pass engine
//! - [`chapters`]: The chapter catalogue
//! - [`cli`]: Command-line interface implementation

pub mod chapters;
pub mod cli;
pub mod core;
pub mod report;
pub mod source;
pub mod stats;

// Re-export commonly used types for convenience
pub use core::types::*;
pub use core::{Attribute, Cell, Subject, Table};
pub use report::{Chapter, RenderSummary, ReportConfig, ReportEngine, ReportError};
pub use source::{AttributeSource, KnowledgeBase, SubjectQuery};
