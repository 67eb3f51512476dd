//! Sequencing volume and alignment chapters: `r`, `a` and `l`.
//!
//! `Raw_data` row 0 holds `[sequences, reads, kilobases]`. `nh_Ali` holds one
//! row per alignment target:
//!
//! ```text
//! [target, _, _, reads, _, kilobases, _, avLength, _, _, _, avClippedLength]
//! ```
//!
//! The `any` row summarizes all targets.

use crate::core::Table;
use crate::report::format::{fixed, millions, opt_fixed, percent, ratio};
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError, Slot};

const RAW_DATA: &str = "Raw_data";
const ALIGNMENTS: &str = "nh_Ali";

/// Alignment table columns
const READS: usize = 3;
const KILOBASES: usize = 5;
const AVERAGE_LENGTH: usize = 7;
const CLIPPED_LENGTH: usize = 11;

/// Per-target averages are only reported above this many aligned reads
const MIN_ALIGNED_READS: f64 = 1000.0;

fn any_row(table: &Table) -> Option<usize> {
    table.find_row("any")
}

fn raw_data_slots() -> [Field; 3] {
    [
        Field::hidden(RAW_DATA, 0, Slot::Sequences),
        Field::hidden(RAW_DATA, 1, Slot::Reads),
        Field::hidden(RAW_DATA, 2, Slot::Kilobases),
    ]
}

// Before alignment

const READ_LENGTH: u32 = 1;
const VOLUME: u32 = 2;
const COMPOSITION: u32 = 3;

#[must_use]
pub fn before_alignment() -> Chapter {
    Chapter::new('r', "Before alignment", "Data characteristics before alignment")
        .field(Field::spacer())
        .field(Field::title())
        .fields(raw_data_slots())
        .field(Field::computed(READ_LENGTH, "Average read length (nt)"))
        .field(Field::computed(
            VOLUME,
            "Average fragment multiplicity\tMaximal fragment multiplicity\tMillion distinct sequences\tMillion raw reads\tMegabases sequenced",
        ))
        .field(Field::computed(COMPOSITION, "%A\t%T\t%G\t%C\t%N\t%GC"))
        .compute(before_alignment_rule)
}

fn before_alignment_rule(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    let sequences = ctx.scratch.get(Slot::Sequences);
    let reads = ctx.scratch.get(Slot::Reads);
    let kilobases = ctx.scratch.get(Slot::Kilobases);

    let cells = match field.selector {
        READ_LENGTH => reads
            .zip(kilobases)
            .and_then(|(r, kb)| ratio(1000.0 * kb, r))
            .map(|length| vec![fixed(length.round(), 0)]),
        VOLUME => {
            let (Some(sequences), Some(reads), Some(kilobases)) = (sequences, reads, kilobases) else {
                return Ok(None);
            };
            Some(vec![
                opt_fixed(ratio(reads, sequences), 2),
                ctx.view.printable("Maximal_read_multiplicity").unwrap_or_default(),
                millions(sequences),
                millions(reads),
                fixed(kilobases / 1000.0, 3),
            ])
        }
        COMPOSITION => ctx.view.table("ATGC_kb").and_then(|atgc| {
            let counts: Vec<f64> = (0..5).map(|col| atgc.float(0, col).unwrap_or(0.0)).collect();
            let total: f64 = counts.iter().sum();
            if total == 0.0 {
                return None;
            }
            let mut cells: Vec<String> = counts.iter().map(|&c| percent(c, total)).collect();
            cells.push(percent(counts[2] + counts[3], total));
            Some(cells)
        }),
        _ => None,
    };
    Ok(cells)
}

// Global alignment

const RAW_READS: u32 = 20;
const ALIGNED: u32 = 1;
const CLIPPED: u32 = 2;
const READS_ALIGNED: u32 = 3;

#[must_use]
pub fn global_alignment() -> Chapter {
    Chapter::new('a', "Global alignment", "Global alignment statistics")
        .field(Field::spacer())
        .field(Field::title())
        .field(Field::hidden(RAW_DATA, 1, Slot::Reads))
        .field(Field::hidden(RAW_DATA, 2, Slot::Kilobases))
        .field(Field::computed(RAW_READS, "Million raw reads"))
        .field(Field::computed(
            ALIGNED,
            "Million reads aligned on any target\tAverage length aligned per read (nt)\tMb aligned on any target\t% Mb aligned on any target before clipping\t% length aligned on average before clipping",
        ))
        .field(Field::computed(
            CLIPPED,
            "% length aligned after clipping adaptors and barcodes (nt)",
        ))
        .field(Field::computed(READS_ALIGNED, "% Reads aligned on any target"))
        .compute(global_alignment_rule)
}

fn global_alignment_rule(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    if field.selector == RAW_READS {
        return Ok(ctx.scratch.get(Slot::Reads).map(|r| vec![millions(r)]));
    }

    let Some(table) = ctx.view.table(ALIGNMENTS) else {
        return Ok(None);
    };
    let Some(any) = any_row(&table) else {
        return Ok(None);
    };
    let reads = table.float(any, READS);
    let kilobases = table.float(any, KILOBASES);
    let average = table.float(any, AVERAGE_LENGTH);

    let cells = match field.selector {
        ALIGNED => {
            let raw_kb = ctx.scratch.get(Slot::Kilobases);
            let unaligned_kb = ctx
                .view
                .table("Unaligned")
                .and_then(|t| t.float(0, 4))
                .unwrap_or(0.0);
            let aligned_share = |denominator: Option<f64>| {
                kilobases
                    .zip(denominator)
                    .map(|(kb, raw)| percent(kb, raw))
                    .unwrap_or_default()
            };
            Some(vec![
                opt_fixed(reads.map(|r| r / 1_000_000.0), 3),
                opt_fixed(average, 2),
                opt_fixed(kilobases.map(|kb| kb / 1000.0), 3),
                aligned_share(raw_kb),
                aligned_share(raw_kb.map(|kb| kb - unaligned_kb)),
            ])
        }
        CLIPPED => average
            .zip(table.float(any, CLIPPED_LENGTH))
            .map(|(average, clipped)| vec![percent(average, clipped)]),
        READS_ALIGNED => reads
            .zip(ctx.scratch.get(Slot::Reads))
            .map(|(aligned, r)| vec![percent(aligned, r)]),
        _ => None,
    };
    Ok(cells)
}

// Aligned length per target

const CLIPPED_AVERAGE: u32 = 1;
const TARGET_LENGTH: u32 = 2;
const TARGET_PERCENT: u32 = 3;

/// `(nh_Ali key, title fragment)`; `{targetN}` keys come from the configuration
const LENGTH_TARGETS: [(&str, &str); 14] = [
    ("any", "aligned"),
    ("any1", "aligned in read 1"),
    ("any2", "aligned in read 2 (paired end)"),
    ("{target1}", "aligned on {target1}"),
    ("{target2}", "aligned on {target2}"),
    ("{target3}", "aligned on {target3}"),
    ("Z_genome", "aligned on Genome"),
    ("A_mito", "aligned on Mitochondria"),
    ("B_rRNA", "aligned on rRNA"),
    ("C_chloro", "aligned on Chloroplast"),
    ("QT_smallRNA", "aligned on small RNAs"),
    ("1_DNASpikeIn", "aligned on DNA spikeIn"),
    ("0_SpikeIn", "aligned on RNA spikeIn"),
    ("z_gdecoy", "aligned on Imaginary genome specificity control"),
];

#[must_use]
pub fn aligned_length() -> Chapter {
    Chapter::new(
        'l',
        "Aligned length per target",
        "Average length (nt) aligned per target in {project}. Lengths in nucleotides on the left and in percent of the clipped read length on the right, reported only when more than 1000 reads align",
    )
    .field(Field::spacer())
    .field(Field::title())
    .field(Field::plain(
        "Jump5",
        0,
        "Bases clipped 5prime in read 1, so that a maximal number of reads align from base 1",
    ))
    .field(Field::plain(
        "Jump5",
        1,
        "Bases clipped 5prime in read 2, so that a maximal number of reads align from base 1",
    ))
    .field(Field::computed(
        CLIPPED_AVERAGE,
        "Average length after clipping adaptors and barcodes (nt)",
    ))
    .fields(LENGTH_TARGETS.iter().map(|(key, title)| {
        Field::computed(TARGET_LENGTH, format!("Average length {title} (nt)")).key(*key)
    }))
    .field(Field::spacer())
    .fields(LENGTH_TARGETS.iter().map(|(key, title)| {
        Field::computed(TARGET_PERCENT, format!("Average % length {title}")).key(*key)
    }))
    .compute(aligned_length_rule)
}

fn aligned_length_rule(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    let Some(table) = ctx.view.table(ALIGNMENTS) else {
        return Ok(None);
    };
    if field.selector == CLIPPED_AVERAGE {
        return Ok(any_row(&table)
            .and_then(|any| table.float(any, CLIPPED_LENGTH))
            .map(|clipped| vec![fixed(clipped, 2)]));
    }

    let Some(key) = ctx.key(field) else {
        return Ok(None);
    };
    let Some(row) = table.find_row(&key) else {
        return Ok(None);
    };
    if table.float(row, READS).unwrap_or(0.0) <= MIN_ALIGNED_READS {
        return Ok(None);
    }
    let Some(average) = table.float(row, AVERAGE_LENGTH) else {
        return Ok(None);
    };
    let cells = match field.selector {
        TARGET_LENGTH => Some(vec![fixed(average, 2)]),
        TARGET_PERCENT => table
            .float(row, CLIPPED_LENGTH)
            .and_then(|clipped| ratio(100.0 * average, clipped))
            .map(|p| vec![fixed(p, 1)]),
        _ => None,
    };
    Ok(cells)
}
