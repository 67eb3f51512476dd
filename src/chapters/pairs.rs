//! Paired-end chapters: pair fate counts `p`, pair fate shares `P`, and the
//! insert size distribution `z`.

use crate::report::format::{fixed, opt_fixed, ratio};
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError, Slot};

const PAIR_FATE: u32 = 1;
const INSERT_SIZE: u32 = 2;

const FATES: [&str; 8] = [
    "compatible pairs",
    "non compatible pairs",
    "paired end fragments with only one read aligned",
    "links gene to distant genome",
    "links 2 genes",
    "incompatible topology",
    "links to rRNA",
    "links to mito",
];

/// Scalars counted after the orphans, in column order
const LINKS: [&str; 5] = [
    "Links_gene_to_distant_genome",
    "Links_2_genes",
    "Incompatible_topology",
    "Links_to_rRNA",
    "Links_to_mito",
];

const PAIR_CAPTION: &str = "Paired reads compatibility: In paired end sequencing, the 2 ends of each fragment are sequenced, yielding two reads. Considering all reads aligning at their best score, the paired-end information is used to retain preferentially the target positions where both ends map in a consistent way, therefore decreasing the number of ambiguous mappings. The mapped fragments are partitioned into compatible pairs, non-compatible pairs and pairs with a single read aligned. In a compatible pair, the 2 reads face each other and span a segment no longer than 3 times the median insert length; for fragments best mapping on the genome the limit is set at 1 Mb to allow for long introns";

/// Pair fate chapter, as counts or as percentages of aligned fragments
#[must_use]
pub fn pair_fate(percentages: bool) -> Chapter {
    let prefix = if percentages { "%" } else { "Number of" };
    let title = FATES
        .iter()
        .map(|fate| format!("{prefix} {fate}"))
        .collect::<Vec<_>>()
        .join("\t");
    let (code, name) = if percentages {
        ('P', "Pair fate percentages")
    } else {
        ('p', "Pair fate counts")
    };

    Chapter::new(code, name, PAIR_CAPTION)
        .field(Field::spacer())
        .field(Field::title())
        .field(
            Field::plain("Aligned_fragments", 0, "Number of aligned fragments")
                .capture(Slot::AlignedFragments),
        )
        .field(Field::computed(PAIR_FATE, title))
        .compute(move |ctx, field| pair_cells(ctx, field, percentages))
}

/// Count held by a scalar relation; `None` when the relation is absent
fn scalar_count(ctx: &FieldContext<'_>, relation: &str) -> Result<Option<f64>, FieldError> {
    ctx.view
        .scalar(relation)
        .map(|cell| {
            cell.as_f64()
                .ok_or_else(|| FieldError::malformed(relation, "non-numeric count"))
        })
        .transpose()
}

fn pair_cells(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
    percentages: bool,
) -> Result<Option<Vec<String>>, FieldError> {
    if field.selector != PAIR_FATE {
        return Ok(None);
    }
    if ctx.view.has("Single_end") || !ctx.view.has("Pair_fate") {
        return Ok(Some(vec!["-".to_string(); FATES.len()]));
    }

    let orphans = ctx
        .view
        .table("Orphans")
        .and_then(|t| t.find_row("Any").and_then(|row| t.float(row, 1)));
    let mut values = vec![
        scalar_count(ctx, "Compatible_pairs")?,
        scalar_count(ctx, "Non_compatible_pairs")?,
        orphans,
    ];
    for relation in LINKS {
        values.push(scalar_count(ctx, relation)?);
    }

    let cells = if percentages {
        let aligned = ctx.scratch.get(Slot::AlignedFragments);
        values
            .iter()
            .map(|&v| {
                let share = v.zip(aligned).and_then(|(v, aligned)| ratio(100.0 * v, aligned));
                opt_fixed(share, 2)
            })
            .collect()
    } else {
        values.iter().map(|&v| opt_fixed(v, 0)).collect()
    };
    Ok(Some(cells))
}

/// Scalar relations of the insert size columns, in column order
const FRAGMENT_LENGTHS: [&str; 7] = [
    "Fragment_length_1",
    "Fragment_length_5",
    "Fragment_length_mode",
    "Fragment_length_median",
    "Fragment_length_average",
    "Fragment_length_95",
    "Fragment_length_99",
];

const LENGTH_DISTRIBUTION: &str = "Length_distribution_1_5_50_95_99_mode_av";

/// Columns of the distribution row feeding each insert size column
const DISTRIBUTION_COLUMNS: [usize; 7] = [0, 1, 5, 2, 6, 3, 4];

#[must_use]
pub fn insert_size() -> Chapter {
    Chapter::new(
        'z',
        "Insert size",
        "Insert size distribution measured from paired alignments",
    )
    .field(Field::spacer())
    .field(Field::title())
    .field(Field::computed(
        INSERT_SIZE,
        [
            "1% fragments in library are shorter than (nt)",
            "5% fragments in library are shorter than (nt)",
            "mode of fragment lengths",
            "median fragment lengths",
            "average of fragment lengths",
            "5% fragments in library are longer than (nt)",
            "1% fragments in library are longer than (nt)",
        ]
        .join("\t"),
    ))
    .compute(insert_size_cells)
}

fn insert_size_cells(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    if field.selector != INSERT_SIZE {
        return Ok(None);
    }
    if ctx
        .view
        .float("Fragment_length_average")
        .is_some_and(|v| v != 0.0)
    {
        return Ok(Some(
            FRAGMENT_LENGTHS
                .iter()
                .map(|r| ctx.view.printable(r).unwrap_or_default())
                .collect(),
        ));
    }
    let Some(table) = ctx.view.table(LENGTH_DISTRIBUTION) else {
        return Ok(None);
    };
    let cells = DISTRIBUTION_COLUMNS
        .iter()
        .map(|&col| match table.cell(0, col) {
            None => Ok(String::new()),
            Some(cell) => cell.as_f64().map(|v| fixed(v, 0)).ok_or_else(|| {
                FieldError::malformed(LENGTH_DISTRIBUTION, format!("non-numeric length in column {col}"))
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(cells))
}
