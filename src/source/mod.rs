//! Attribute sources: where the report engine gets its values.
//!
//! The engine only ever talks to the [`AttributeSource`] trait. The CLI backs
//! it with a [`snapshot::KnowledgeBase`] loaded from a JSON document; tests
//! may back it with anything that answers lookups.
//!
//! Every lookup may return `None` ("absent"). Absent values render as empty
//! cells and never abort a report.

pub mod cache;
pub mod snapshot;

use crate::core::{Cell, Subject, SubjectId, SubjectKind, Table};

pub use cache::SubjectView;
pub use snapshot::{KnowledgeBase, SourceError};

/// Which subjects a report covers and in which order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectQuery {
    /// Subject kind to select
    pub kind: SubjectKind,

    /// Restrict runs and groups to members of this project
    pub project: Option<String>,

    /// Relation whose printable value orders the subjects
    pub order_by: Option<String>,

    /// Only keep subjects holding this relation
    pub require: Option<String>,
}

impl SubjectQuery {
    #[must_use]
    pub fn new(kind: SubjectKind) -> Self {
        Self {
            kind,
            project: None,
            order_by: None,
            require: None,
        }
    }
}

/// Read-only access to subject attributes
pub trait AttributeSource {
    /// Scalar value of `relation`, or `None` when absent
    fn scalar(&self, subject: &SubjectId, relation: &str) -> Option<Cell>;

    /// Table value of `relation`, or `None` when absent
    fn table(&self, subject: &SubjectId, relation: &str) -> Option<Table>;

    /// Subjects matching `query`, in report order
    fn resolve_subjects(&self, query: &SubjectQuery) -> Vec<Subject>;
}
