//! Per-assay allele counts and frequencies: chapters `D`, `d`, `B` and `b`.
//!
//! Two relations feed these chapters:
//!
//! - `DanLi_counts`: one row per assay, `[assay, mutant, _, coverage]`
//! - `BRS_counts`: one row per replicate, `[RNA_<assay>_<letter><n>, coverage, mutant]`
//!
//! Replicate rows of an assay are summed over its `A` letter.

use crate::core::Table;
use crate::report::format::fixed;
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};
use crate::stats::consistency::ASSAY_FREQUENCY;
use crate::stats::{detect_outliers, Replicate};

/// Assays reported by the count and frequency chapters
pub const ASSAYS: [&str; 4] = ["AGLR1", "AGLR2", "ROCR1", "ROCR2"];

const DANLI: &str = "DanLi_counts";
const BRS: &str = "BRS_counts";

/// Below this replicate coverage a frequency prints as `NA`
const MIN_BRS_COVERAGE: i64 = 10;

const ASSAY: u32 = 1;
const CONFLICT: u32 = 2;

/// Mutant and total counts of one assay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counts {
    mutant: i64,
    coverage: i64,
}

impl Counts {
    #[allow(clippy::cast_precision_loss)]
    fn frequency(self) -> Option<f64> {
        (self.coverage > 0).then(|| 100.0 * self.mutant as f64 / self.coverage as f64)
    }
}

fn assay_fields(suffix: &str) -> Vec<Field> {
    ASSAYS
        .iter()
        .map(|assay| Field::computed(ASSAY, format!("{assay} {suffix}")).key(*assay))
        .collect()
}

/// Integer cell that must be numeric when present
fn count(table: &Table, row: usize, col: usize, relation: &str) -> Result<i64, FieldError> {
    match table.cell(row, col) {
        None => Ok(0),
        Some(cell) => cell.as_i64().ok_or_else(|| {
            FieldError::malformed(relation, format!("non-numeric count '{}'", cell.printable()))
        }),
    }
}

fn danli_counts_of(ctx: &FieldContext<'_>, assay: &str) -> Result<Option<Counts>, FieldError> {
    let Some(table) = ctx.view.table(DANLI) else {
        return Ok(None);
    };
    let Some(row) = (0..table.len()).find(|&r| table.printable(r, 0).as_deref() == Some(assay)) else {
        return Ok(None);
    };
    Ok(Some(Counts {
        mutant: count(&table, row, 1, DANLI)?,
        coverage: count(&table, row, 3, DANLI)?,
    }))
}

fn brs_counts_of(ctx: &FieldContext<'_>, assay: &str) -> Result<Option<Counts>, FieldError> {
    let Some(table) = ctx.view.table(BRS) else {
        return Ok(None);
    };
    let prefix = format!("RNA_{assay}_A");
    let mut counts = Counts {
        mutant: 0,
        coverage: 0,
    };
    for row in table.rows_with_prefix(&prefix) {
        counts.mutant += count(&table, row, 2, BRS)?;
        counts.coverage += count(&table, row, 1, BRS)?;
    }
    Ok(Some(counts))
}

#[must_use]
pub fn danli_counts() -> Chapter {
    Chapter::new('D', "Assay counts", "Dan Li counts")
        .field(Field::spacer())
        .fields(assay_fields("m:m+w"))
        .compute(|ctx, field| {
            let assay = field.key.as_deref().unwrap_or_default();
            Ok(danli_counts_of(ctx, assay)?.map(|c| vec![format!("{}:{}", c.mutant, c.coverage)]))
        })
}

#[must_use]
pub fn danli_frequency() -> Chapter {
    Chapter::new('d', "Assay allele frequency", "Dan Li allele frequency")
        .field(Field::spacer())
        .fields(assay_fields("m/m+w"))
        .field(Field::computed(CONFLICT, "Conflict"))
        .compute(danli_frequency_rule)
}

fn danli_frequency_rule(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    match field.selector {
        ASSAY => {
            let assay = field.key.as_deref().unwrap_or_default();
            Ok(danli_counts_of(ctx, assay)?
                .and_then(Counts::frequency)
                .map(|f| vec![fixed(f, 2)]))
        }
        CONFLICT => {
            let mut group = Vec::with_capacity(ASSAYS.len());
            for assay in ASSAYS {
                if let Some(counts) = danli_counts_of(ctx, assay)? {
                    #[allow(clippy::cast_precision_loss)]
                    group.push(Replicate::new(assay, counts.mutant as f64, counts.coverage as f64));
                }
            }
            let Some(report) = detect_outliers(&group, &ASSAY_FREQUENCY) else {
                return Ok(None);
            };
            let text = report
                .flagged
                .iter()
                .map(|f| {
                    format!(
                        "BAD {}:{:.1}:{:.1}",
                        f.label,
                        100.0 * f.proportion.value,
                        100.0 * report.pooled.value
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            Ok(Some(vec![text]))
        }
        _ => Ok(None),
    }
}

#[must_use]
pub fn brs_counts() -> Chapter {
    Chapter::new('B', "Replicate counts", "BRS counts")
        .field(Field::spacer())
        .fields(assay_fields("m:m+w"))
        .compute(|ctx, field| {
            let assay = field.key.as_deref().unwrap_or_default();
            Ok(brs_counts_of(ctx, assay)?.map(|c| vec![format!("{}:{}", c.mutant, c.coverage)]))
        })
}

#[must_use]
pub fn brs_frequency() -> Chapter {
    Chapter::new('b', "Replicate allele frequency", "BRS allele frequency")
        .field(Field::spacer())
        .fields(assay_fields("m/m+w"))
        .compute(|ctx, field| {
            let assay = field.key.as_deref().unwrap_or_default();
            let Some(counts) = brs_counts_of(ctx, assay)? else {
                return Ok(None);
            };
            let text = if counts.coverage >= MIN_BRS_COVERAGE {
                counts.frequency().map(|f| fixed(f, 2)).unwrap_or_default()
            } else if counts.coverage > 0 {
                "NA".to_string()
            } else {
                String::new()
            };
            Ok(Some(vec![text]))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::testing::{cell, render_variant, try_render};
    use crate::core::SubjectKind;
    use crate::report::ChapterError;
    use serde_json::json;

    fn danli() -> serde_json::Value {
        json!({
            "DanLi_counts": [
                ["AGLR1", 50, null, 100],
                ["AGLR2", 48, null, 100],
                ["ROCR1", 90, null, 100],
                ["ROCR2", 50, null, 100]
            ]
        })
    }

    #[test]
    fn test_danli_counts() {
        let chapter = danli_counts();
        let cells = render_variant(&chapter, json!({"DanLi_counts": [["ROCR1", 3, "x", 12]]}));
        assert_eq!(cell(&chapter, &cells, "ROCR1 m:m+w"), "3:12");
        assert_eq!(cell(&chapter, &cells, "AGLR1 m:m+w"), "");
    }

    #[test]
    fn test_danli_frequency_and_conflict() {
        let chapter = danli_frequency();
        let cells = render_variant(&chapter, danli());
        assert_eq!(cell(&chapter, &cells, "AGLR2 m/m+w"), "48.00");
        assert_eq!(cell(&chapter, &cells, "ROCR1 m/m+w"), "90.00");
        assert_eq!(cell(&chapter, &cells, "Conflict"), "BAD ROCR1:90.0:59.5");
    }

    #[test]
    fn test_conflict_needs_four_assays() {
        let chapter = danli_frequency();
        let cells = render_variant(
            &chapter,
            json!({"DanLi_counts": [["AGLR1", 1, null, 100], ["ROCR1", 90, null, 100]]}),
        );
        assert_eq!(cell(&chapter, &cells, "Conflict"), "");
        assert_eq!(cell(&chapter, &cells, "AGLR1 m/m+w"), "1.00");
    }

    #[test]
    fn test_zero_coverage_frequency_is_empty() {
        let chapter = danli_frequency();
        let cells = render_variant(&chapter, json!({"DanLi_counts": [["AGLR1", 0, null, 0]]}));
        assert_eq!(cell(&chapter, &cells, "AGLR1 m/m+w"), "");
    }

    #[test]
    fn test_malformed_count() {
        let chapter = danli_frequency();
        let result = try_render(
            &chapter,
            SubjectKind::Variant,
            json!({"DanLi_counts": [["AGLR1", "many", null, 10]]}),
        );
        assert!(matches!(result, Err(ChapterError::Field(FieldError::Malformed { .. }))));
    }

    #[test]
    fn test_brs_counts_sum_replicates() {
        let chapter = brs_counts();
        let cells = render_variant(
            &chapter,
            json!({
                "BRS_counts": [
                    ["RNA_AGLR1_A1", 20, 5],
                    ["RNA_AGLR1_A2", 30, 7],
                    ["RNA_AGLR1_B1", 40, 9],
                    ["RNA_ROCR2_A1", 8, 2]
                ]
            }),
        );
        assert_eq!(cell(&chapter, &cells, "AGLR1 m:m+w"), "12:50");
        assert_eq!(cell(&chapter, &cells, "AGLR2 m:m+w"), "0:0");
        assert_eq!(cell(&chapter, &cells, "ROCR2 m:m+w"), "2:8");
    }

    #[test]
    fn test_brs_frequency_coverage_floor() {
        let chapter = brs_frequency();
        let cells = render_variant(
            &chapter,
            json!({"BRS_counts": [["RNA_AGLR1_A1", 20, 5], ["RNA_ROCR2_A1", 8, 2]]}),
        );
        assert_eq!(cell(&chapter, &cells, "AGLR1 m/m+w"), "25.00");
        assert_eq!(cell(&chapter, &cells, "ROCR2 m/m+w"), "NA");
        assert_eq!(cell(&chapter, &cells, "AGLR2 m/m+w"), "");
    }
}
