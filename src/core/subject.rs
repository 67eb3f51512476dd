use serde::{Deserialize, Serialize};

use crate::core::types::{SubjectId, SubjectKind};

/// A reportable entity: one run, group or variant, rendered as one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Identifier used for attribute lookups
    pub id: SubjectId,

    /// Run, group or variant
    pub kind: SubjectKind,

    /// Row label printed in the first column of the data row
    pub label: String,
}

impl Subject {
    /// Create a subject whose row label is its identifier
    pub fn new(id: impl Into<String>, kind: SubjectKind) -> Self {
        let id = SubjectId::new(id);
        let label = id.0.clone();
        Self { id, kind, label }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
