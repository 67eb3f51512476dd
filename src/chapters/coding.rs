//! Chapter `c`: SNV sites tested in a run and their frequency classes.
//!
//! `Genomic` and `Protein_changing` hold one row whose even columns count
//! sites per class: all, pure reference, low, mid, high, pure variant.

use crate::core::Table;
use crate::report::format::{fixed, percent};
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};

const GENOMIC: &str = "Genomic";
const PROTEIN_CHANGING: &str = "Protein_changing";

const SITES: u32 = 1;
const FREQUENCY_CLASSES: u32 = 2;
const PROTEIN_CLASSES: u32 = 3;
const HETEROZYGOSITY: u32 = 4;

/// Sites needed before the heterozygosity index is reported
const MIN_GENOTYPED_SITES: f64 = 10.0;

#[must_use]
pub fn snv_coding() -> Chapter {
    Chapter::new('c', "SNV coding", "SNV")
        .field(Field::spacer())
        .field(Field::title())
        .field(Field::computed(
            SITES,
            "Number of SNV sites tested\t% of tested SNV sites covered at least 10 times\tMeasured SNV sites\t% rejected monomodals, likely mapping or sequencing errors or RNA-edited sites",
        ))
        .field(Field::computed(
            FREQUENCY_CLASSES,
            "Exonic SNV sites\tPure reference SNV (< 5% variant)\tLow frequency SNV (5-20%)\tMid frequency SNV (20-80%)\tHigh frequency SNV (80-95%)\tPure variant SNV (95-100%)",
        ))
        .field(Field::computed(
            PROTEIN_CLASSES,
            "Protein changing SNV sites\tPure reference, no change in protein (< 5% variant)\tProtein changing SNV, intermediate (5-95%)\tProtein changing SNV, pure variant (95-100%)",
        ))
        .field(Field::computed(
            HETEROZYGOSITY,
            "Heterozygosity index: heterozygous/homozygous ratio variants",
        ))
        .compute(compute)
}

/// Integer in row 0; `None` when the cell is absent
fn site_count(table: &Table, relation: &str, col: usize) -> Result<Option<i64>, FieldError> {
    table
        .cell(0, col)
        .map(|cell| {
            cell.as_f64()
                .map(|v| v.round() as i64)
                .ok_or_else(|| FieldError::malformed(relation, format!("non-numeric count in column {col}")))
        })
        .transpose()
}

fn site_counts(table: &Table, relation: &str, cols: &[usize]) -> Result<Vec<Option<i64>>, FieldError> {
    cols.iter().map(|&col| site_count(table, relation, col)).collect()
}

fn to_cells(counts: &[Option<i64>]) -> Vec<String> {
    counts
        .iter()
        .map(|count| count.map(|c| c.to_string()).unwrap_or_default())
        .collect()
}

/// Sum of the present counts; `None` when all are absent
fn sum_present(counts: &[Option<i64>]) -> Option<i64> {
    counts
        .iter()
        .flatten()
        .copied()
        .reduce(i64::saturating_add)
}

/// Heterozygous over homozygous variant sites, capped at 1000
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn heterozygosity(heterozygous: i64, homozygous: i64) -> Option<f64> {
    let (heterozygous, homozygous) = (heterozygous as f64, homozygous as f64);
    if heterozygous + homozygous < MIN_GENOTYPED_SITES {
        return None;
    }
    if heterozygous < 100.0 * homozygous {
        Some(heterozygous / homozygous)
    } else {
        Some(1000.0)
    }
}

fn compute(ctx: &mut FieldContext<'_>, field: &ComputedField) -> Result<Option<Vec<String>>, FieldError> {
    let cells = match field.selector {
        SITES => {
            let tested = ctx.view.int("Tested_sites").unwrap_or(0);
            if tested <= 0 {
                return Ok(None);
            }
            let measured = tested.saturating_sub(ctx.view.int("Not_measurable_sites").unwrap_or(0));
            let rejected = ctx.view.int("Rejected_sites").unwrap_or(0);
            #[allow(clippy::cast_precision_loss)]
            let rejected_share = if measured > 0 {
                percent(rejected as f64, measured as f64)
            } else {
                String::new()
            };
            #[allow(clippy::cast_precision_loss)]
            let coverable = percent(measured as f64, tested as f64);
            vec![tested.to_string(), coverable, measured.to_string(), rejected_share]
        }
        FREQUENCY_CLASSES => {
            let Some(table) = ctx.view.table(GENOMIC) else {
                return Ok(None);
            };
            to_cells(&site_counts(&table, GENOMIC, &[0, 2, 4, 6, 8, 10])?)
        }
        PROTEIN_CLASSES => {
            let Some(table) = ctx.view.table(PROTEIN_CHANGING) else {
                return Ok(None);
            };
            let c = site_counts(&table, PROTEIN_CHANGING, &[0, 2, 4, 6, 8, 10])?;
            to_cells(&[c[0], c[1], sum_present(&c[2..5]), c[5]])
        }
        HETEROZYGOSITY => {
            let Some(table) = ctx.view.table(GENOMIC) else {
                return Ok(None);
            };
            let c = site_counts(&table, GENOMIC, &[6, 8, 10])?;
            let heterozygous = sum_present(&c[..2]).unwrap_or(0);
            match heterozygosity(heterozygous, c[2].unwrap_or(0)) {
                Some(index) => vec![fixed(index, 2)],
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::testing::{cell, render, try_render};
    use crate::core::SubjectKind;
    use crate::report::ChapterError;
    use serde_json::json;

    #[test]
    fn test_sites() {
        let chapter = snv_coding();
        let cells = render(
            &chapter,
            json!({"Tested_sites": 200, "Not_measurable_sites": 50, "Rejected_sites": 15}),
        );
        assert_eq!(cell(&chapter, &cells, "Number of SNV sites tested"), "200");
        assert_eq!(
            cell(&chapter, &cells, "% of tested SNV sites covered at least 10 times"),
            "75.00"
        );
        assert_eq!(cell(&chapter, &cells, "Measured SNV sites"), "150");
        assert_eq!(
            cell(
                &chapter,
                &cells,
                "% rejected monomodals, likely mapping or sequencing errors or RNA-edited sites"
            ),
            "10.00"
        );
    }

    #[test]
    fn test_frequency_classes() {
        let chapter = snv_coding();
        let cells = render(
            &chapter,
            json!({
                "Genomic": [[100, "x", 40, "x", 10, "x", 20, "x", 10, "x", 20]],
                "Protein_changing": [[30, "x", 10, "x", 2, "x", 3, "x", 4, "x", 11]]
            }),
        );
        assert_eq!(cell(&chapter, &cells, "Exonic SNV sites"), "100");
        assert_eq!(cell(&chapter, &cells, "Mid frequency SNV (20-80%)"), "20");
        assert_eq!(cell(&chapter, &cells, "Pure variant SNV (95-100%)"), "20");
        assert_eq!(
            cell(&chapter, &cells, "Protein changing SNV, intermediate (5-95%)"),
            "9"
        );
        assert_eq!(
            cell(&chapter, &cells, "Heterozygosity index: heterozygous/homozygous ratio variants"),
            "1.50"
        );
    }

    #[test]
    fn test_absent_values_are_empty() {
        let chapter = snv_coding();
        let cells = render(
            &chapter,
            json!({
                "Tested_sites": 10,
                "Not_measurable_sites": 10,
                "Genomic": [[100, "x", 0, "x", 10]]
            }),
        );
        assert_eq!(cell(&chapter, &cells, "Measured SNV sites"), "0");
        assert_eq!(
            cell(
                &chapter,
                &cells,
                "% rejected monomodals, likely mapping or sequencing errors or RNA-edited sites"
            ),
            ""
        );
        assert_eq!(cell(&chapter, &cells, "Pure reference SNV (< 5% variant)"), "0");
        assert_eq!(cell(&chapter, &cells, "Mid frequency SNV (20-80%)"), "");
        assert_eq!(cell(&chapter, &cells, "Pure variant SNV (95-100%)"), "");
    }

    #[test]
    fn test_heterozygosity_index() {
        assert_eq!(heterozygosity(4, 5), None);
        assert_eq!(heterozygosity(30, 10), Some(3.0));
        assert_eq!(heterozygosity(500, 0), Some(1000.0));
        assert_eq!(heterozygosity(1000, 10), Some(1000.0));
        assert_eq!(heterozygosity(i64::MAX, i64::MAX / 2), Some(2.0));
        assert_eq!(heterozygosity(i64::MAX, 1), Some(1000.0));
    }

    #[test]
    fn test_malformed_class_count() {
        let result = try_render(
            &snv_coding(),
            SubjectKind::Run,
            json!({"Genomic": [[100, "x", "many"]]}),
        );
        assert!(matches!(result, Err(ChapterError::Field(_))));
    }
}
