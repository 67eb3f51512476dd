//! Chapter `s`: fragments aligned per strand of each target.
//!
//! `stranding` rows are `[target, _, plus, _, minus, _, ambiguous]`. Groups may
//! carry several rows for one target (`ET_av.f`, `ET_av.f2`), which are summed.
//! Counts are only reported once more than 1000 fragments align on a target.

use crate::core::Table;
use crate::report::format::{fixed, percent};
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};

const STRANDING: &str = "stranding";
const MIN_FRAGMENTS: f64 = 1000.0;
const STRANDS: u32 = 1;

/// `(stranding key, displayed name)`
const TARGETS: [(&str, &str); 6] = [
    ("B_rRNA", "rRNA"),
    ("{target1}", "{target1}"),
    ("{target2}", "{target2}"),
    ("{target3}", "{target3}"),
    ("Z_genome", "genome"),
    ("0_SpikeIn", "SpikeIn"),
];

fn title(target: &str) -> String {
    [
        "Reads mapping on plus strand of",
        "Reads mapping on minus strand of",
        "Reads mapping on both strands of",
        "% reads mapping on plus strand of",
        "% reads mapping on minus strand of",
        "% reads mapping on both strands of",
    ]
    .iter()
    .map(|t| format!("{t} {target}"))
    .collect::<Vec<_>>()
    .join("\t")
}

#[must_use]
pub fn strandedness() -> Chapter {
    Chapter::new(
        's',
        "Strandedness",
        "Strandedness, number of fragments aligning per strand of the indicated target. The percentages are only computed when more than 1000 fragments align on a target",
    )
    .field(Field::spacer())
    .field(Field::title())
    .fields(
        TARGETS
            .iter()
            .map(|(key, display)| Field::computed(STRANDS, title(display)).key(*key)),
    )
    .compute(compute)
}

/// Whether a `stranding` row name designates `key`
fn matches_target(name: &str, key: &str) -> bool {
    let name = name.split('.').next().unwrap_or(name);
    name.eq_ignore_ascii_case(key) || name.get(3..).is_some_and(|rest| rest.eq_ignore_ascii_case(key))
}

/// Summed `(plus, minus, ambiguous)` counts of a target
fn strand_counts(table: &Table, key: &str) -> (f64, f64, f64) {
    (0..table.len())
        .filter(|&row| {
            table
                .printable(row, 0)
                .is_some_and(|name| matches_target(&name, key))
        })
        .fold((0.0, 0.0, 0.0), |(plus, minus, ambiguous), row| {
            (
                plus + table.float(row, 2).unwrap_or(0.0),
                minus + table.float(row, 4).unwrap_or(0.0),
                ambiguous + table.float(row, 6).unwrap_or(0.0),
            )
        })
}

fn compute(ctx: &mut FieldContext<'_>, field: &ComputedField) -> Result<Option<Vec<String>>, FieldError> {
    if field.selector != STRANDS {
        return Ok(None);
    }
    let (Some(table), Some(key)) = (ctx.view.table(STRANDING), ctx.key(field)) else {
        return Ok(None);
    };
    let (plus, minus, ambiguous) = strand_counts(&table, &key);
    let total = plus + minus + ambiguous;
    if total <= MIN_FRAGMENTS {
        return Ok(None);
    }
    Ok(Some(vec![
        fixed(plus, 0),
        fixed(minus, 0),
        fixed(ambiguous, 0),
        percent(plus, total),
        percent(minus, total),
        percent(ambiguous, total),
    ]))
}
