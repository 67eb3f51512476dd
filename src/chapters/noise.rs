//! Chapter `N`: replicate noise.
//!
//! Replicates of one assay and one letter (`RNA_AGLR1_A1`, `RNA_AGLR1_A2`, ...)
//! should agree on the allele frequency. An internal column runs the
//! consistency detector within one assay/letter group. An external column
//! pools each qualifying assay of a letter and runs the detector across
//! assays.

use crate::core::Table;
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};
use crate::stats::consistency::{ConsistencyReport, DetectorConfig, REPLICATE_NOISE};
use crate::stats::{detect_outliers, Replicate};

const BRS: &str = "BRS_counts";

pub const ASSAYS: [&str; 7] = ["AGLR1", "AGLR2", "ROCR1", "ROCR2", "ILMR3", "Total", "PolyA"];
pub const LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

const INTERNAL: u32 = 1;
const EXTERNAL: u32 = 2;

/// Cross-assay pooling keeps the noise alpha but drops the per-replicate floors
const ACROSS_ASSAYS: DetectorConfig = DetectorConfig {
    usable_total_floor: 0.0,
    min_pooled_total: 0.0,
    ..REPLICATE_NOISE
};

#[must_use]
pub fn replicate_noise() -> Chapter {
    let mut chapter = Chapter::new('N', "Replicate noise", "Replicate noise").field(Field::spacer());
    for letter in LETTERS {
        for assay in ASSAYS {
            chapter = chapter.field(
                Field::computed(INTERNAL, format!("{assay}_{letter} internal inconsistency"))
                    .key(format!("{assay}_{letter}")),
            );
        }
    }
    for letter in LETTERS {
        chapter = chapter.field(
            Field::computed(EXTERNAL, format!("{letter} external inconsistency")).key(letter.to_string()),
        );
    }
    chapter.compute(compute)
}

fn compute(ctx: &mut FieldContext<'_>, field: &ComputedField) -> Result<Option<Vec<String>>, FieldError> {
    let Some(table) = ctx.view.table(BRS) else {
        return Ok(None);
    };
    let key = field.key.as_deref().unwrap_or_default();
    let text = match field.selector {
        INTERNAL => {
            let Some(report) = internal(&table, key)? else {
                return Ok(None);
            };
            report
                .most_deviant()
                .map(|f| format!("BAD {:.6}>{:.6}", f.deviation, f.threshold))
                .unwrap_or_default()
        }
        EXTERNAL => {
            let mut pooled = Vec::with_capacity(ASSAYS.len());
            for assay in ASSAYS {
                let group = format!("{assay}_{key}");
                if let Some(report) = internal(&table, &group)? {
                    pooled.push(Replicate::new(group, report.success, report.total));
                }
            }
            let Some(report) = detect_outliers(&pooled, &ACROSS_ASSAYS) else {
                return Ok(None);
            };
            report
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
                .join(" ")
        }
        _ => return Ok(None),
    };
    Ok(Some(vec![text]))
}

/// Detector report for one `<assay>_<letter>` replicate group
fn internal(table: &Table, group: &str) -> Result<Option<ConsistencyReport>, FieldError> {
    let replicates = replicates(table, group)?;
    Ok(detect_outliers(&replicates, &REPLICATE_NOISE))
}

fn replicates(table: &Table, group: &str) -> Result<Vec<Replicate>, FieldError> {
    let prefix = format!("RNA_{group}");
    table
        .rows_with_prefix(&prefix)
        .map(|row| -> Result<Replicate, FieldError> {
            let label = table.printable(row, 0).unwrap_or_default();
            let value = |col: usize| match table.cell(row, col) {
                None => Ok(0.0),
                Some(cell) => cell.as_f64().ok_or_else(|| {
                    FieldError::malformed(BRS, format!("non-numeric count in row '{label}'"))
                }),
            };
            Ok(Replicate::new(label.clone(), value(2)?, value(1)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::testing::{cell, render_variant};
    use serde_json::{json, Value};

    fn rows(group: &str, counts: &[(i64, i64)]) -> Vec<Value> {
        counts
            .iter()
            .enumerate()
            .map(|(i, (coverage, mutant))| json!([format!("RNA_{group}{}", i + 1), coverage, mutant]))
            .collect()
    }

    #[test]
    fn test_width() {
        assert_eq!(replicate_noise().width(), 1 + 7 * 5 + 5);
    }

    #[test]
    fn test_internal_inconsistency() {
        let chapter = replicate_noise();
        let mut table = rows("AGLR1_A", &[(100, 50), (100, 48), (100, 90), (100, 50)]);
        table.extend(rows("AGLR2_A", &[(100, 50), (100, 51), (100, 49), (100, 50)]));
        let cells = render_variant(&chapter, json!({"BRS_counts": table}));

        let flagged = cell(&chapter, &cells, "AGLR1_A internal inconsistency");
        assert!(flagged.starts_with("BAD 0.305000>"), "{flagged}");
        assert_eq!(cell(&chapter, &cells, "AGLR2_A internal inconsistency"), "");
        assert_eq!(cell(&chapter, &cells, "ROCR1_A internal inconsistency"), "");
    }

    #[test]
    fn test_low_coverage_replicates_are_ignored() {
        let chapter = replicate_noise();
        let table = rows("AGLR1_B", &[(4, 4), (4, 0), (100, 50), (100, 50)]);
        let cells = render_variant(&chapter, json!({"BRS_counts": table}));
        assert_eq!(cell(&chapter, &cells, "AGLR1_B internal inconsistency"), "");
    }

    #[test]
    fn test_external_inconsistency() {
        let chapter = replicate_noise();
        let mut table = Vec::new();
        for assay in ["AGLR1", "AGLR2", "ROCR1"] {
            table.extend(rows(&format!("{assay}_C"), &[(100, 50); 4]));
        }
        table.extend(rows("ROCR2_C", &[(100, 90); 4]));
        let cells = render_variant(&chapter, json!({"BRS_counts": table}));

        assert_eq!(
            cell(&chapter, &cells, "C external inconsistency"),
            "BAD ROCR2_C:90.0:60.0"
        );
        assert_eq!(cell(&chapter, &cells, "A external inconsistency"), "");
    }
}
