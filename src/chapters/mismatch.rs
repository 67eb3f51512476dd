//! Mismatch and variant-type chapters: `m`, `v` and `V`.
//!
//! All three classify the same kind of event table,
//! `[segment, code, count, third]`, with [`crate::stats::classify`]:
//!
//! - `m` reads `Error_profile`, where the fourth column holds the megabases
//!   aligned in the segment and rates per kilobase are reported;
//! - `v` reads the accepted counts of `SNP_profile` and adds an RNA editing
//!   index;
//! - `V` is `v` on the rejected counts (fourth column).

use crate::core::Table;
use crate::report::format::{fixed, opt_fixed};
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};
use crate::stats::mismatch::{per_kb, SUBSTITUTIONS};
use crate::stats::{classify, CategoryTotals};

const CODE_COLUMN: usize = 1;
const MEGABASE_COLUMN: usize = 3;

const MEGABASES: u32 = 1;
const TOTAL: u32 = 2;
const PER_KB: u32 = 3;
const FAMILIES: u32 = 4;
const SUBSTITUTION: u32 = 5;
const BASES: u32 = 6;
const LENGTHS: u32 = 7;
const RATES: u32 = 8;
const SHARES: u32 = 9;
const EDITING: u32 = 10;

/// One flavour of event table
#[derive(Debug, Clone, Copy)]
struct Profile {
    relation: &'static str,
    weight_column: usize,
    /// Title prefix
    prefix: &'static str,
    total_title: &'static str,
    /// Megabase denominator and per-kilobase rates
    rates: bool,
    /// RNA editing index
    editing: bool,
}

const MISMATCHES: Profile = Profile {
    relation: "Error_profile",
    weight_column: 2,
    prefix: "",
    total_title: "Total number of mismatches",
    rates: true,
    editing: false,
};

const VARIANTS: Profile = Profile {
    relation: "SNP_profile",
    weight_column: 2,
    prefix: "",
    total_title: "Total number of variant alleles",
    rates: false,
    editing: true,
};

const REJECTED: Profile = Profile {
    weight_column: 3,
    prefix: "Rejected ",
    ..VARIANTS
};

#[must_use]
pub fn mismatch_types() -> Chapter {
    chapter(MISMATCHES, 'm', "Mismatch types", "Number of mismatches, per type")
}

#[must_use]
pub fn variant_types() -> Chapter {
    chapter(VARIANTS, 'v', "Variant types", "Number of variant alleles, per type")
}

#[must_use]
pub fn rejected_variant_types() -> Chapter {
    chapter(
        REJECTED,
        'V',
        "Rejected variant types",
        "Number of rejected variant alleles, per type. Variants monomodal across all samples, usually with a minor allele frequency in the 1-30% range, most probably come from systematic noise and are rejected",
    )
}

fn titles(prefix: &str, segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| format!("{prefix}{s}"))
        .collect::<Vec<_>>()
        .join("\t")
}

fn chapter(profile: Profile, code: char, name: &'static str, caption: &str) -> Chapter {
    let p = profile.prefix;
    let substitutions: Vec<String> = SUBSTITUTIONS.iter().map(|s| s.to_ascii_uppercase()).collect();
    let substitutions: Vec<&str> = substitutions.iter().map(String::as_str).collect();

    let mut chapter = Chapter::new(code, name, caption)
        .field(Field::spacer())
        .field(Field::title());
    if profile.rates {
        chapter = chapter.field(Field::computed(
            MEGABASES,
            titles(p, &["Megabases uniquely aligned and used for mismatch counts"]),
        ));
    }
    chapter = chapter.field(Field::computed(TOTAL, titles(p, &[profile.total_title])));
    if profile.rates {
        chapter = chapter.field(Field::computed(PER_KB, titles(p, &["Mismatches per kb aligned"])));
    }
    chapter = chapter
        .field(Field::computed(
            FAMILIES,
            titles(
                p,
                &[
                    "Transitions",
                    "Transversions",
                    "1, 2 or 3 bp insertions not in polymers",
                    "1, 2 or 3 bp deletions not in polymers",
                    "1, 2 or 3 bp insertions in polymers",
                    "1, 2 or 3 bp deletions in polymers",
                ],
            ),
        ))
        .field(Field::computed(SUBSTITUTION, titles(p, &substitutions)))
        .field(Field::computed(
            BASES,
            titles(
                p,
                &[
                    "Insert A", "Insert T", "Insert G", "Insert C", "Delete A", "Delete T", "Delete G",
                    "Delete C",
                ],
            ),
        ))
        .field(Field::computed(
            LENGTHS,
            titles(
                p,
                &[
                    "Single insertions",
                    "Single deletions",
                    "Double insertions",
                    "Double deletions",
                    "Triple insertions",
                    "Triple deletions",
                ],
            ),
        ));
    if profile.rates {
        chapter = chapter.field(Field::computed(
            RATES,
            titles(
                p,
                &[
                    "Transitions per kb",
                    "Transversions per kb",
                    "Insertions per kb",
                    "Deletions per kb",
                ],
            ),
        ));
    }
    chapter = chapter.field(Field::computed(
        SHARES,
        titles(
            p,
            &[
                "% transitions",
                "% transversions",
                "% indels",
                "% insertions not in polymers",
                "% deletions not in polymers",
                "% insertions in polymers",
                "% deletions in polymers",
            ],
        ),
    ));
    if profile.editing {
        chapter = chapter.field(Field::computed(
            EDITING,
            titles(p, &["RNA edition: % excess of A>G relative to T>C"]),
        ));
    }
    chapter.compute(move |ctx, field| compute(&profile, ctx, field))
}

/// Megabases aligned: the fourth column of the first row of each segment
fn megabases(table: &Table) -> f64 {
    (0..table.len())
        .filter(|&row| row == 0 || table.printable(row, 0) != table.printable(row - 1, 0))
        .map(|row| table.float(row, MEGABASE_COLUMN).unwrap_or(0.0))
        .sum()
}

fn totals(table: &Table, profile: &Profile) -> Result<CategoryTotals, FieldError> {
    let mut events = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let Some(code) = table.printable(row, CODE_COLUMN) else {
            continue;
        };
        let weight = match table.cell(row, profile.weight_column) {
            None => 0.0,
            Some(cell) => cell.as_f64().ok_or_else(|| {
                FieldError::malformed(profile.relation, format!("non-numeric count for '{code}'"))
            })?,
        };
        events.push((code, weight));
    }
    Ok(classify(events.iter().map(|(code, weight)| (code.as_str(), *weight))))
}

fn counts(values: &[f64]) -> Vec<String> {
    values.iter().map(|&v| fixed(v, 0)).collect()
}

fn compute(
    profile: &Profile,
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    let Some(table) = ctx.view.table(profile.relation) else {
        return Ok(None);
    };
    if field.selector == MEGABASES {
        return Ok(Some(vec![fixed(megabases(&table), 0)]));
    }

    let t = totals(&table, profile)?;
    let insertions = t.all_insertions();
    let deletions = t.all_deletions();
    let rate = |count: f64| opt_fixed(per_kb(count, megabases(&table)), 5);

    let cells = match field.selector {
        TOTAL => counts(&[t.grand_total]),
        PER_KB => vec![rate(t.grand_total)],
        FAMILIES => counts(&[
            t.transitions,
            t.transversions,
            t.insertion.total,
            t.deletion.total,
            t.sliding_insertion.total,
            t.sliding_deletion.total,
        ]),
        SUBSTITUTION => counts(&t.by_substitution),
        BASES => {
            let mut values = insertions.by_base.to_vec();
            values.extend_from_slice(&deletions.by_base);
            counts(&values)
        }
        LENGTHS => (0..3)
            .flat_map(|i| [insertions.by_length[i], deletions.by_length[i]])
            .map(|v| fixed(v, 0))
            .collect(),
        RATES => vec![
            rate(t.transitions),
            rate(t.transversions),
            rate(insertions.total),
            rate(deletions.total),
        ],
        SHARES => [
            t.transitions,
            t.transversions,
            t.indels(),
            t.insertion.total,
            t.deletion.total,
            t.sliding_insertion.total,
            t.sliding_deletion.total,
        ]
        .iter()
        .map(|&count| opt_fixed(t.share(count), 2))
        .collect(),
        EDITING => vec![opt_fixed(t.editing_excess(), 2)],
        _ => return Ok(None),
    };
    Ok(Some(cells))
}
