//! Field descriptors: one column, or a group of columns, inside a chapter.
//!
//! A field renders in three ways: as caption reservation (its width), as
//! header cells (its title split on tabs) and as data cells for one subject.
//! All three are driven from the same descriptor, so a chapter's column
//! count cannot differ between passes unless a computed rule misbehaves.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::core::Table;
use crate::report::config::TargetSet;
use crate::report::format::{blanks, fixed, ratio, sanitize};
use crate::source::SubjectView;

/// Rows beyond which a multi-valued list is summarized instead of printed
pub const MULTI_VALUE_LIMIT: usize = 30;

/// A value failed validation while rendering one subject
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Malformed value in {relation}: {reason}")]
    Malformed { relation: String, reason: String },
}

impl FieldError {
    pub fn malformed(relation: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            relation: relation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Named numeric slots a field can capture into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Sequences,
    Reads,
    Kilobases,
    AlignedFragments,
}

/// Per-subject, per-chapter scratch state
#[derive(Debug, Default)]
pub struct Scratch {
    slots: HashMap<Slot, f64>,
}

impl Scratch {
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<f64> {
        self.slots.get(&slot).copied()
    }

    pub fn set(&mut self, slot: Slot, value: f64) {
        self.slots.insert(slot, value);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// How a plain field prints its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Printable form of the cell
    Raw,
    /// Value divided by 10, one decimal
    Tenths,
    /// Percentage of a captured slot, four decimals
    PercentOf(Slot),
    /// Captured only, no column
    Hidden,
}

/// Run-time values substituted into title templates
#[derive(Debug, Clone, Default)]
pub struct TitleContext {
    pub project: String,
    pub targets: TargetSet,
}

impl TitleContext {
    /// Fill `{project}` and `{target1}`..`{target3}` with display names
    #[must_use]
    pub fn fill(&self, template: &str) -> String {
        self.substitute(template, |i| self.targets.display(i))
    }

    /// Fill `{target1}`..`{target3}` with the raw target keys
    #[must_use]
    pub fn fill_key(&self, template: &str) -> String {
        self.substitute(template, |i| self.targets.key(i))
    }

    fn substitute<'a>(&'a self, template: &str, target: impl Fn(usize) -> &'a str) -> String {
        if !template.contains('{') {
            return template.to_string();
        }
        // Substituted values must not add columns to the template
        let mut out = template.replace("{project}", &sanitize(&self.project));
        for i in 0..3 {
            out = out.replace(&format!("{{target{}}}", i + 1), &sanitize(target(i)));
        }
        out
    }
}

/// A single-column lookup of `relation` at row 0, `column`
#[derive(Debug, Clone)]
pub struct PlainField {
    pub relation: String,
    pub column: usize,
    pub title: String,
    pub capture: Option<Slot>,
    pub format: Format,
}

/// A column group produced by the owning chapter's compute rule
#[derive(Debug, Clone)]
pub struct ComputedField {
    /// Discriminant the compute rule dispatches on
    pub selector: u32,
    pub title: String,
    /// Optional parameter (a target, an assay), may hold title placeholders
    pub key: Option<String>,
}

/// One column (or group of columns) of a chapter
#[derive(Debug, Clone)]
pub enum Field {
    /// One empty column
    Spacer,
    /// The subject's display title
    Title,
    Plain(PlainField),
    /// First relation present, de-duplicated and joined with `, `
    MultiValue {
        relations: Vec<String>,
        title: String,
        /// Print the subject label when no relation is present
        label_fallback: bool,
    },
    Computed(ComputedField),
}

/// What a field sees while rendering one subject
pub struct FieldContext<'a> {
    pub view: &'a SubjectView<'a>,
    pub scratch: &'a mut Scratch,
    pub titles: &'a TitleContext,
}

impl FieldContext<'_> {
    /// A computed field's key with its placeholders filled by target keys
    #[must_use]
    pub fn key(&self, field: &ComputedField) -> Option<String> {
        field.key.as_deref().map(|k| self.titles.fill_key(k))
    }
}

/// Rule evaluating a chapter's computed fields.
///
/// Returns `Ok(None)` when the subject lacks the data (or the selector is
/// unknown); the field then renders as empty cells.
pub type ComputeFn =
    Box<dyn Fn(&mut FieldContext<'_>, &ComputedField) -> Result<Option<Vec<String>>, FieldError>>;

impl Field {
    pub fn spacer() -> Self {
        Self::Spacer
    }

    pub fn title() -> Self {
        Self::Title
    }

    pub fn plain(relation: &str, column: usize, title: &str) -> Self {
        Self::Plain(PlainField {
            relation: relation.to_string(),
            column,
            title: title.to_string(),
            capture: None,
            format: Format::Raw,
        })
    }

    /// A hidden field that only captures `relation` into `slot`
    pub fn hidden(relation: &str, column: usize, slot: Slot) -> Self {
        Self::plain(relation, column, "").capture(slot).format(Format::Hidden)
    }

    pub fn multi(relations: &[&str], title: &str) -> Self {
        Self::MultiValue {
            relations: relations.iter().map(ToString::to_string).collect(),
            title: title.to_string(),
            label_fallback: false,
        }
    }

    pub fn computed(selector: u32, title: impl Into<String>) -> Self {
        Self::Computed(ComputedField {
            selector,
            title: title.into(),
            key: None,
        })
    }

    #[must_use]
    pub fn capture(mut self, slot: Slot) -> Self {
        if let Self::Plain(plain) = &mut self {
            plain.capture = Some(slot);
        }
        self
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        if let Self::Plain(plain) = &mut self {
            plain.format = format;
        }
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        if let Self::Computed(computed) = &mut self {
            computed.key = Some(key.into());
        }
        self
    }

    #[must_use]
    pub fn or_label(mut self) -> Self {
        if let Self::MultiValue { label_fallback, .. } = &mut self {
            *label_fallback = true;
        }
        self
    }

    /// Title template; spacers have an empty title
    #[must_use]
    pub fn title_template(&self) -> &str {
        match self {
            Self::Spacer => "",
            Self::Title => "Title",
            Self::Plain(plain) => &plain.title,
            Self::MultiValue { title, .. } => title,
            Self::Computed(computed) => &computed.title,
        }
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Plain(p) if p.format == Format::Hidden)
    }

    /// Number of columns this field occupies in every pass
    #[must_use]
    pub fn width(&self) -> usize {
        if self.is_hidden() {
            0
        } else {
            self.title_template().matches('\t').count() + 1
        }
    }

    /// Header cells for this field
    #[must_use]
    pub fn header_cells(&self, titles: &TitleContext) -> Vec<String> {
        if self.is_hidden() {
            return Vec::new();
        }
        titles
            .fill(self.title_template())
            .split('\t')
            .map(str::to_string)
            .collect()
    }

    /// Render this field for one subject.
    ///
    /// # Errors
    ///
    /// Propagates `FieldError` from the compute rule.
    pub fn render(
        &self,
        ctx: &mut FieldContext<'_>,
        compute: Option<&ComputeFn>,
    ) -> Result<Vec<String>, FieldError> {
        match self {
            Self::Spacer => Ok(blanks(1)),
            Self::Title => Ok(vec![ctx.view.title()]),
            Self::Plain(plain) => Ok(render_plain(plain, ctx)),
            Self::MultiValue {
                relations,
                label_fallback,
                ..
            } => {
                let found = relations.iter().find_map(|r| ctx.view.table(r));
                let text = match found {
                    Some(table) if table.len() > MULTI_VALUE_LIMIT => {
                        format!("{} > {MULTI_VALUE_LIMIT} entries, list skipped", table.len())
                    }
                    Some(table) => join_distinct(&table),
                    None if *label_fallback => ctx.view.subject().label.clone(),
                    None => String::new(),
                };
                Ok(vec![text])
            }
            Self::Computed(computed) => {
                let cells = match compute {
                    Some(rule) => rule(ctx, computed)?,
                    None => None,
                };
                Ok(cells.unwrap_or_else(|| blanks(self.width())))
            }
        }
    }
}

fn render_plain(plain: &PlainField, ctx: &mut FieldContext<'_>) -> Vec<String> {
    let table = ctx.view.table(&plain.relation);
    let cell = table.as_ref().and_then(|t| t.cell(0, plain.column));
    let value = cell.and_then(|c| c.as_f64());

    if let (Some(slot), Some(v)) = (plain.capture, value) {
        ctx.scratch.set(slot, v);
    }

    match plain.format {
        Format::Hidden => Vec::new(),
        Format::Raw => vec![cell.map(|c| c.printable()).unwrap_or_default()],
        Format::Tenths => vec![value.map(|v| fixed(v / 10.0, 1)).unwrap_or_default()],
        Format::PercentOf(slot) => {
            let pct = value
                .zip(ctx.scratch.get(slot))
                .and_then(|(v, base)| ratio(100.0 * v, base));
            vec![pct.map(|p| fixed(p, 4)).unwrap_or_default()]
        }
    }
}

/// Distinct values of a multi-valued relation in original order.
///
/// The table is scanned back to front, so that the last occurrence of a
/// repeated value is the one kept. A first-column value is also dropped when
/// the next row carries the same identifier.
#[must_use]
pub fn join_distinct(table: &Table) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<String> = Vec::new();

    for row in (0..table.len()).rev() {
        for col in (0..table.columns(row)).rev() {
            let Some(value) = table.printable(row, col) else {
                continue;
            };
            let keep = if col == 0 {
                let repeats_next = row + 1 < table.len()
                    && table.printable(row + 1, 0).as_deref() == Some(value.as_str());
                !seen.contains(&value) && !repeats_next
            } else {
                !seen.contains(&value)
            };
            if keep {
                seen.insert(value.clone());
                kept.push(value);
            }
        }
    }

    kept.into_iter()
        .rev()
        .map(|v| if v == "polyA" { "polyA selected".to_string() } else { v })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cell, Subject, SubjectId, SubjectKind};
    use crate::source::{AttributeSource, SubjectQuery};

    fn text(s: &str) -> Option<Cell> {
        Some(Cell::Text(s.to_string()))
    }

    struct Fixture;

    impl AttributeSource for Fixture {
        fn scalar(&self, subject: &SubjectId, relation: &str) -> Option<Cell> {
            self.table(subject, relation).and_then(|t| t.cell(0, 0).cloned())
        }

        fn table(&self, _subject: &SubjectId, relation: &str) -> Option<Table> {
            match relation {
                "Raw_data" => Some(Table::new(vec![vec![
                    Some(Cell::Int(800)),
                    Some(Cell::Int(1000)),
                    Some(Cell::Float(150.5)),
                ]])),
                "Aligned" => Some(Table::single(Cell::Int(250))),
                "Zero" => Some(Table::single(Cell::Int(0))),
                "SRR" => Some(Table::new(vec![
                    vec![text("SRR1"), text("polyA")],
                    vec![text("SRR2"), text("polyA")],
                ])),
                _ => None,
            }
        }

        fn resolve_subjects(&self, _query: &SubjectQuery) -> Vec<Subject> {
            Vec::new()
        }
    }

    fn render(field: &Field, scratch: &mut Scratch) -> Vec<String> {
        let subject = Subject::new("run1", SubjectKind::Run);
        let view = SubjectView::new(&Fixture, &subject);
        let titles = TitleContext::default();
        let mut ctx = FieldContext {
            view: &view,
            scratch,
            titles: &titles,
        };
        field.render(&mut ctx, None).unwrap()
    }

    #[test]
    fn test_widths() {
        assert_eq!(Field::spacer().width(), 1);
        assert_eq!(Field::computed(1, "a\tb\tc").width(), 3);
        assert_eq!(Field::hidden("Raw_data", 1, Slot::Reads).width(), 0);
        assert_eq!(
            Field::plain("Raw_data", 1, "Reads").format(Format::Tenths).width(),
            1
        );
    }

    #[test]
    fn test_absent_versus_zero() {
        let mut scratch = Scratch::default();
        assert_eq!(render(&Field::plain("Missing", 0, "x"), &mut scratch), vec![""]);
        assert_eq!(render(&Field::plain("Zero", 0, "x"), &mut scratch), vec!["0"]);
        assert_eq!(render(&Field::plain("Raw_data", 5, "x"), &mut scratch), vec![""]);
    }

    #[test]
    fn test_capture_and_percent() {
        let mut scratch = Scratch::default();
        assert!(render(&Field::hidden("Raw_data", 1, Slot::Reads), &mut scratch).is_empty());
        assert_eq!(scratch.get(Slot::Reads), Some(1000.0));

        let pct = Field::plain("Aligned", 0, "% aligned").format(Format::PercentOf(Slot::Reads));
        assert_eq!(render(&pct, &mut scratch), vec!["25.0000"]);

        scratch.clear();
        assert_eq!(render(&pct, &mut scratch), vec![""]);
    }

    #[test]
    fn test_tenths() {
        let mut scratch = Scratch::default();
        let field = Field::plain("Raw_data", 1, "reads").format(Format::Tenths);
        assert_eq!(render(&field, &mut scratch), vec!["100.0"]);
    }

    #[test]
    fn test_computed_without_rule_renders_blanks() {
        let mut scratch = Scratch::default();
        let field = Field::computed(99, "a\tb");
        assert_eq!(render(&field, &mut scratch), vec!["", ""]);
    }

    #[test]
    fn test_multi_value() {
        let mut scratch = Scratch::default();
        let field = Field::multi(&["SRX", "SRR"], "accessions");
        assert_eq!(
            render(&field, &mut scratch),
            vec!["SRR1, SRR2, polyA selected"]
        );

        let fallback = Field::multi(&["RunId"], "RunId").or_label();
        assert_eq!(render(&fallback, &mut scratch), vec!["run1"]);
    }

    #[test]
    fn test_join_distinct_keeps_identifiers() {
        let table = Table::new(vec![
            vec![text("A"), text("x")],
            vec![text("A"), text("y")],
            vec![text("B"), text("x")],
        ]);
        assert_eq!(join_distinct(&table), "A, y, B, x");
    }

    #[test]
    fn test_title_context() {
        let titles = TitleContext {
            project: "Liver".to_string(),
            targets: TargetSet::parse("av RefSeq").unwrap(),
        };
        assert_eq!(
            titles.fill("Reads on {target1} in {project}"),
            "Reads on AceView in Liver"
        );
        assert_eq!(titles.fill_key("{target1}"), "av");
        assert_eq!(titles.fill("{target3}"), "annotation 3");
    }
}
