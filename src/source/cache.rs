use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::{Cell, Subject, Table};
use crate::source::AttributeSource;

/// One subject seen through an attribute source.
///
/// Lookups are memoized per relation for the lifetime of the view. The engine
/// creates a fresh view for every subject, so nothing cached here is visible
/// while rendering another subject.
pub struct SubjectView<'a> {
    source: &'a dyn AttributeSource,
    subject: &'a Subject,
    tables: RefCell<HashMap<String, Option<Rc<Table>>>>,
    scalars: RefCell<HashMap<String, Option<Cell>>>,
}

impl<'a> SubjectView<'a> {
    pub fn new(source: &'a dyn AttributeSource, subject: &'a Subject) -> Self {
        Self {
            source,
            subject,
            tables: RefCell::new(HashMap::new()),
            scalars: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        self.subject
    }

    /// Table value of `relation`. An empty table counts as absent.
    pub fn table(&self, relation: &str) -> Option<Rc<Table>> {
        if let Some(cached) = self.tables.borrow().get(relation) {
            return cached.clone();
        }
        let fetched = self
            .source
            .table(&self.subject.id, relation)
            .filter(|t| !t.is_empty())
            .map(Rc::new);
        self.tables
            .borrow_mut()
            .insert(relation.to_string(), fetched.clone());
        fetched
    }

    /// Scalar value of `relation`
    pub fn scalar(&self, relation: &str) -> Option<Cell> {
        if let Some(cached) = self.scalars.borrow().get(relation) {
            return cached.clone();
        }
        let fetched = self.source.scalar(&self.subject.id, relation);
        self.scalars
            .borrow_mut()
            .insert(relation.to_string(), fetched.clone());
        fetched
    }

    /// Whether the subject holds `relation` at all
    pub fn has(&self, relation: &str) -> bool {
        self.scalar(relation).is_some() || self.table(relation).is_some()
    }

    pub fn printable(&self, relation: &str) -> Option<String> {
        self.scalar(relation).map(|c| c.printable())
    }

    pub fn float(&self, relation: &str) -> Option<f64> {
        self.scalar(relation).and_then(|c| c.as_f64())
    }

    pub fn int(&self, relation: &str) -> Option<i64> {
        self.scalar(relation).and_then(|c| c.as_i64())
    }

    /// Display title: the `Title` relation, else the subject label
    pub fn title(&self) -> String {
        self.printable("Title")
            .unwrap_or_else(|| self.subject.label.clone())
    }
}
