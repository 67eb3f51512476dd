use thiserror::Error;

use crate::report::field::{
    ComputeFn, ComputedField, Field, FieldContext, FieldError, TitleContext,
};
use crate::report::format::sanitize;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChapterError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Field '{field}' produced {found} cells, expected {expected}")]
    Drift {
        field: String,
        expected: usize,
        found: usize,
    },
}

/// A named group of columns with a caption
pub struct Chapter {
    /// Selection code
    pub code: char,
    pub name: &'static str,
    /// Caption template
    pub caption: String,
    pub fields: Vec<Field>,
    compute: Option<ComputeFn>,
}

impl std::fmt::Debug for Chapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chapter")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("compute", &self.compute.is_some())
            .finish()
    }
}

impl Chapter {
    pub fn new(code: char, name: &'static str, caption: impl Into<String>) -> Self {
        Self {
            code,
            name,
            caption: caption.into(),
            fields: Vec::new(),
            compute: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach the rule that evaluates this chapter's computed fields
    #[must_use]
    pub fn compute<F>(mut self, rule: F) -> Self
    where
        F: Fn(&mut FieldContext<'_>, &ComputedField) -> Result<Option<Vec<String>>, FieldError>
            + 'static,
    {
        self.compute = Some(Box::new(rule));
        self
    }

    /// Total number of columns, identical in every pass
    #[must_use]
    pub fn width(&self) -> usize {
        self.fields.iter().map(Field::width).sum()
    }

    /// Caption pass: the caption in the second column, the rest empty
    #[must_use]
    pub fn caption_cells(&self, titles: &TitleContext) -> Vec<String> {
        let width = self.width();
        let mut cells = vec![String::new(); width];
        if width > 0 {
            let at = usize::from(width > 1);
            cells[at] = sanitize(&titles.fill(&self.caption));
        }
        cells
    }

    /// Header pass: every visible field's title, split on tabs
    #[must_use]
    pub fn header_cells(&self, titles: &TitleContext) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|f| f.header_cells(titles))
            .collect()
    }

    /// Data pass for one subject. The caller resets the scratch state.
    ///
    /// # Errors
    ///
    /// Returns `ChapterError::Field` when a value is malformed, and
    /// `ChapterError::Drift` when a field renders a number of cells other
    /// than its declared width.
    pub fn data_cells(&self, ctx: &mut FieldContext<'_>) -> Result<Vec<String>, ChapterError> {
        let mut cells = Vec::with_capacity(self.width());
        for field in &self.fields {
            let rendered = field.render(ctx, self.compute.as_ref())?;
            if rendered.len() != field.width() {
                return Err(ChapterError::Drift {
                    field: field.title_template().replace('\t', " | "),
                    expected: field.width(),
                    found: rendered.len(),
                });
            }
            cells.extend(rendered.iter().map(|c| sanitize(c)));
        }
        Ok(cells)
    }
}
