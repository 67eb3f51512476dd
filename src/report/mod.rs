//! Report layout and rendering.
//!
//! A report is an ordered list of [`Chapter`]s, each an ordered list of
//! [`Field`]s. The [`ReportEngine`] writes three passes over the same
//! chapters (captions, headers, one data row per subject) so that every row
//! carries the same number of tab separated cells.

pub mod chapter;
pub mod config;
pub mod engine;
pub mod field;
pub mod filter;
pub mod format;

pub use chapter::{Chapter, ChapterError};
pub use config::{ConfigError, ReportConfig, TargetSet};
pub use engine::{RenderSummary, ReportEngine, ReportError};
pub use field::{ComputedField, Field, FieldContext, FieldError, Format, Slot};
pub use filter::VariantFilter;
