//! Core data types shared by the report engine and its chapters.
//!
//! - [`Subject`]: one reportable entity (run, group or variant) and its row label
//! - [`SubjectId`], [`SubjectKind`]: subject identity
//! - [`Cell`], [`Table`], [`Attribute`]: values returned by an attribute source
//! - [`Base`]: nucleotide ordering used by per-base column groups
//!
//! ## Absent versus zero
//!
//! A relation the knowledge base does not hold is *absent* and renders as an
//! empty cell. A relation holding `0` renders as `0`. Every accessor in this
//! module returns `Option` so the two cases never collapse.

pub mod subject;
pub mod types;
pub mod value;

pub use subject::Subject;
pub use types::{Base, SubjectId, SubjectKind};
pub use value::{Attribute, Cell, Table};
