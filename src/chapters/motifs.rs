//! Read-level chapters: motif search before alignment `o`, 3' bias `3`.

use crate::report::format::opt_fixed;
use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};

const BLOOM: &str = "Bloom";
const FRAGMENTS_COLUMN: usize = 2;
const HITS_COLUMN: usize = 5;
const MOTIF: u32 = 1;

/// `(Bloom row key, column title)`
const MOTIFS: [(&str, &str); 4] = [
    (
        "any.A13-per_1_kb_fragment-cumul",
        "PolyA index : fragments per million with at least 3 A13 motifs shifted by at least 6 bases",
    ),
    (
        "any.Telomeric_6-per_1_kb_fragment-cumul",
        "Telomere index : fragments per million with at least 3 TTAGGG/CCCTAA motifs",
    ),
    (
        "any.Tel_C_6-per_1_kb_fragment-cumul",
        "Telomere index allowing G/C substitution",
    ),
    (
        "any.imagT_6-per_1_kb_fragment-cumul",
        "Noise in telomere index : FPM with at least 3 AATCCC/GGGATT motifs",
    ),
];

#[must_use]
pub fn motif_search() -> Chapter {
    Chapter::new('o', "Motif search", "Motif search before alignments")
        .field(Field::spacer())
        .field(Field::title())
        .field(Field::plain("Adaptor1", 0, "Exit adaptor of read 1"))
        .field(Field::plain("Adaptor2", 0, "Exit adaptor of read 2"))
        .fields(
            MOTIFS
                .iter()
                .map(|(key, title)| Field::computed(MOTIF, *title).key(*key)),
        )
        .compute(motif_frequency)
}

/// Fragments per million carrying a motif
fn motif_frequency(
    ctx: &mut FieldContext<'_>,
    field: &ComputedField,
) -> Result<Option<Vec<String>>, FieldError> {
    if field.selector != MOTIF {
        return Ok(None);
    }
    let (Some(table), Some(key)) = (ctx.view.table(BLOOM), ctx.key(field)) else {
        return Ok(None);
    };
    let per_million = table.find_row(&key).and_then(|row| {
        let fragments = table.float(row, FRAGMENTS_COLUMN)?;
        let hits = table.float(row, HITS_COLUMN)?;
        (fragments > 0.0).then(|| 1_000_000.0 * hits / fragments)
    });
    Ok(Some(vec![opt_fixed(per_million, 2)]))
}

#[must_use]
pub fn three_prime_bias() -> Chapter {
    Chapter::new('3', "3' bias", "3' bias")
        .field(Field::spacer())
        .field(Field::title())
        .field(Field::plain(
            "Accessible_length",
            0,
            "Well covered transcript length (nt), max 6kb, measured on transcripts longer than 8kb, limited by the 3' bias in poly-A selected experiments",
        ))
        .field(Field::plain(
            "Accessible_length",
            1,
            "Number of well expressed transcripts longer than 8kb",
        ))
        .field(Field::plain(
            "Accessible_length",
            3,
            "Average coverage cumulated over these transcripts",
        ))
}
