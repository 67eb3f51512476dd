//! JSON snapshot of a knowledge base.
//!
//! A snapshot is one JSON document (optionally gzip-compressed) listing every
//! subject with its kind, project membership and attribute values:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "subjects": [
//!     {
//!       "id": "SRR001",
//!       "kind": "run",
//!       "projects": ["Liver"],
//!       "attributes": {
//!         "Title": "Liver replicate 1",
//!         "Raw_data": [[1200000, 1500000, 150000]]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! A relation value is either a scalar (`"text"`, `12`, `1.5`) or a table
//! (an array of rows, each row an array of cells, `null` for a missing cell).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{Attribute, Cell, Subject, SubjectId, SubjectKind, Table};
use crate::source::{AttributeSource, SubjectQuery};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read knowledge base: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse knowledge base: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate subject identifier: {0}")]
    DuplicateSubject(String),
}

/// Snapshot version for compatibility checking
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Serializable snapshot format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub subjects: Vec<SubjectRecord>,
}

/// One subject and everything known about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub kind: SubjectKind,

    /// Row label; defaults to the identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub projects: Vec<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl SubjectRecord {
    fn to_subject(&self) -> Subject {
        let subject = Subject::new(self.id.as_str(), self.kind);
        match &self.label {
            Some(label) => subject.with_label(label.clone()),
            None => subject,
        }
    }

    fn holds(&self, relation: &str) -> bool {
        match self.attributes.get(relation) {
            Some(Attribute::Table(table)) => !table.is_empty(),
            Some(Attribute::Scalar(_)) => true,
            None => false,
        }
    }
}

/// An in-memory knowledge base loaded from a snapshot
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    subjects: Vec<SubjectRecord>,

    /// Index: subject ID -> index in subjects vec
    id_to_index: HashMap<SubjectId, usize>,
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

impl KnowledgeBase {
    /// Load a snapshot from a JSON file, gunzipping `.gz`/`.bgz` files
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` if the file cannot be read, `SourceError::Json`
    /// if it is not a valid snapshot, or `SourceError::DuplicateSubject` if two
    /// subjects share an identifier.
    pub fn load_from_file(path: &Path) -> Result<Self, SourceError> {
        let content = if is_gzipped(path) {
            let file = std::fs::File::open(path)?;
            let mut decoder = GzDecoder::new(file);
            let mut content = String::new();
            decoder.read_to_string(&mut content)?;
            content
        } else {
            std::fs::read_to_string(path)?
        };
        Self::from_json(&content)
    }

    /// Parse a snapshot from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Json` if the JSON is invalid, or
    /// `SourceError::DuplicateSubject` if two subjects share an identifier.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let data: SnapshotData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != SNAPSHOT_VERSION {
            warn!(
                "Knowledge base version mismatch (expected {}, found {})",
                SNAPSHOT_VERSION, data.version
            );
        }

        let mut kb = Self::default();
        for record in data.subjects {
            kb.add_subject(record)?;
        }
        debug!("Loaded {} subjects", kb.subjects.len());
        Ok(kb)
    }

    /// Add a subject to the knowledge base
    ///
    /// # Errors
    ///
    /// Returns `SourceError::DuplicateSubject` if the identifier is already known.
    pub fn add_subject(&mut self, record: SubjectRecord) -> Result<(), SourceError> {
        if self.id_to_index.contains_key(&record.id) {
            return Err(SourceError::DuplicateSubject(record.id.0));
        }
        self.id_to_index
            .insert(record.id.clone(), self.subjects.len());
        self.subjects.push(record);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    fn attribute(&self, subject: &SubjectId, relation: &str) -> Option<&Attribute> {
        let index = *self.id_to_index.get(subject)?;
        self.subjects[index].attributes.get(relation)
    }
}

impl AttributeSource for KnowledgeBase {
    fn scalar(&self, subject: &SubjectId, relation: &str) -> Option<Cell> {
        self.attribute(subject, relation)?.scalar()
    }

    fn table(&self, subject: &SubjectId, relation: &str) -> Option<Table> {
        self.attribute(subject, relation).map(Attribute::table)
    }

    fn resolve_subjects(&self, query: &SubjectQuery) -> Vec<Subject> {
        let selected = self.subjects.iter().filter(|record| {
            if record.kind != query.kind {
                return false;
            }
            // Variants are not attached to projects
            if let Some(project) = query.project.as_deref() {
                if record.kind != SubjectKind::Variant
                    && !record.projects.iter().any(|p| p == project)
                {
                    return false;
                }
            }
            query
                .require
                .as_deref()
                .map_or(true, |relation| record.holds(relation))
        });

        let Some(order_by) = query.order_by.as_deref() else {
            return selected.map(SubjectRecord::to_subject).collect();
        };

        // Stable sort on the ordering value; subjects lacking it keep their
        // relative order after all ordered ones.
        let (mut ordered, unordered): (Vec<_>, Vec<_>) = selected
            .map(|record| {
                let key = record
                    .attributes
                    .get(order_by)
                    .and_then(Attribute::scalar)
                    .map(|c| OrderKey::new(c.printable()));
                (key, record)
            })
            .partition(|(key, _)| key.is_some());
        ordered.sort_by(|(a, _), (b, _)| a.cmp(b));

        ordered
            .into_iter()
            .chain(unordered)
            .map(|(_, record)| record.to_subject())
            .collect()
    }
}

/// Ordering value of a subject: numeric keys compare by value and come
/// before textual keys, which compare lexically.
#[derive(Debug, Clone, PartialEq)]
struct OrderKey {
    number: Option<f64>,
    text: String,
}

impl OrderKey {
    fn new(text: String) -> Self {
        let number = text.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        Self { number, text }
    }
}

impl Eq for OrderKey {}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.text.cmp(&other.text)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "version": "1.0.0",
        "subjects": [
            {"id": "r2", "kind": "run", "projects": ["P"], "attributes": {"Sorting_title": "b"}},
            {"id": "r1", "kind": "run", "projects": ["P"], "attributes": {"Sorting_title": "a", "Title": "First"}},
            {"id": "r3", "kind": "run", "projects": ["P"]},
            {"id": "r4", "kind": "run", "projects": ["Q"], "attributes": {"Sorting_title": "0"}},
            {"id": "g1", "kind": "group", "projects": ["P"]},
            {"id": "v1", "kind": "variant", "label": "chr1:100:A>G", "attributes": {"DanLi_counts": [["AGLR1", 3, null, 10]]}},
            {"id": "v2", "kind": "variant", "attributes": {"DanLi_counts": []}}
        ]
    }"#;

    #[test]
    fn test_scalar_and_table_views() {
        let kb = KnowledgeBase::from_json(SNAPSHOT).unwrap();
        assert_eq!(kb.len(), 7);

        let r1 = SubjectId::new("r1");
        assert_eq!(
            kb.scalar(&r1, "Title"),
            Some(Cell::Text("First".to_string()))
        );
        assert_eq!(kb.table(&r1, "Title").map(|t| t.len()), Some(1));
        assert_eq!(kb.scalar(&r1, "Raw_data"), None);
        assert_eq!(kb.scalar(&SubjectId::new("nope"), "Title"), None);

        let v1 = SubjectId::new("v1");
        assert_eq!(kb.scalar(&v1, "DanLi_counts"), Some(Cell::Text("AGLR1".to_string())));
    }

    #[test]
    fn test_resolve_orders_and_filters_by_project() {
        let kb = KnowledgeBase::from_json(SNAPSHOT).unwrap();
        let query = SubjectQuery {
            kind: SubjectKind::Run,
            project: Some("P".to_string()),
            order_by: Some("Sorting_title".to_string()),
            require: None,
        };
        let ids: Vec<String> = kb
            .resolve_subjects(&query)
            .into_iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_numeric_order_keys_compare_by_value() {
        let json = r#"{"version": "1.0.0", "subjects": [
            {"id": "a", "kind": "run", "attributes": {"Sorting_title": "10"}},
            {"id": "b", "kind": "run", "attributes": {"Sorting_title": "beta"}},
            {"id": "c", "kind": "run", "attributes": {"Sorting_title": 9}},
            {"id": "d", "kind": "run", "attributes": {"Sorting_title": "1a"}},
            {"id": "e", "kind": "run", "attributes": {"Sorting_title": "-2.5"}}
        ]}"#;
        let kb = KnowledgeBase::from_json(json).unwrap();
        let query = SubjectQuery {
            order_by: Some("Sorting_title".to_string()),
            ..SubjectQuery::new(SubjectKind::Run)
        };
        let ids: Vec<String> = kb
            .resolve_subjects(&query)
            .into_iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec!["e", "c", "a", "d", "b"]);
    }

    #[test]
    fn test_resolve_variants_ignore_project_and_require_relation() {
        let kb = KnowledgeBase::from_json(SNAPSHOT).unwrap();
        let mut query = SubjectQuery::new(SubjectKind::Variant);
        query.project = Some("P".to_string());
        assert_eq!(kb.resolve_subjects(&query).len(), 2);

        query.require = Some("DanLi_counts".to_string());
        let subjects = kb.resolve_subjects(&query);
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].label, "chr1:100:A>G");
    }

    #[test]
    fn test_duplicate_subject_is_rejected() {
        let json = r#"{"version": "1.0.0", "subjects": [
            {"id": "r1", "kind": "run"}, {"id": "r1", "kind": "group"}
        ]}"#;
        assert!(matches!(
            KnowledgeBase::from_json(json),
            Err(SourceError::DuplicateSubject(id)) if id == "r1"
        ));
    }

    #[test]
    fn test_load_gzipped_file() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SNAPSHOT.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let kb = KnowledgeBase::load_from_file(&path).unwrap();
        assert_eq!(kb.len(), 7);
    }
}
