//! Chapter `I`: where a variant sits and what it changes.

use crate::report::{Chapter, ComputedField, Field, FieldContext, FieldError};

const POSITION: u32 = 1;
const CODING: u32 = 2;
const RNA_CHANGE: u32 = 10;
const PROTEIN_CHANGE: u32 = 20;

/// Location classes that carry no further detail, in precedence order
const LOCATIONS: [&str; 5] = [
    "Intergenic",
    "Intronic",
    "Non_coding_transcript",
    "UTR_5prime",
    "UTR_3prime",
];

#[must_use]
pub fn identifiers() -> Chapter {
    Chapter::new('I', "Variant identifiers", "Variant Identifiers")
        .field(Field::spacer())
        .field(Field::computed(
            POSITION,
            "Chromosome\tlast upstream conserved base\tFirst downstream conserved base",
        ))
        .field(Field::computed(CODING, "Type\tCoding\tProtein type"))
        .field(Field::plain("gName", 0, "genome Name"))
        .field(Field::plain("rName", 0, "RNA Name"))
        .field(Field::plain("pName", 0, "Protein Name"))
        .field(Field::plain("Dan_Li", 0, "Dan Li Name"))
        .field(Field::computed(RNA_CHANGE, "RNA variation"))
        .field(Field::computed(PROTEIN_CHANGE, "Protein variation"))
        .compute(compute)
}

fn compute(ctx: &mut FieldContext<'_>, field: &ComputedField) -> Result<Option<Vec<String>>, FieldError> {
    let view = ctx.view;
    let cells = match field.selector {
        POSITION => view.table("IntMap").and_then(|map| {
            (map.columns(0) >= 3).then(|| {
                vec![
                    format!("chr{}", map.printable(0, 0).unwrap_or_else(|| "-".to_string())),
                    map.int(0, 1).map(|v| v.to_string()).unwrap_or_default(),
                    map.int(0, 2).map(|v| v.to_string()).unwrap_or_default(),
                ]
            })
        }),
        CODING => {
            let (class, detail) = coding_class(ctx);
            Some(vec![ctx.view.printable("Typ").unwrap_or_default(), class, detail])
        }
        RNA_CHANGE => sequence_change(ctx, "Reference_RNAexon_sequence", "Observed__RNAexon_sequence", 0),
        PROTEIN_CHANGE => {
            sequence_change(ctx, "Reference_protein_sequence", "Observed__protein_sequence", 1)
        }
        _ => None,
    };
    Ok(cells)
}

/// Coding class and its detail; both empty when nothing is known
fn coding_class(ctx: &FieldContext<'_>) -> (String, String) {
    let view = ctx.view;
    if let Some(location) = LOCATIONS.iter().find(|l| view.has(l)) {
        return ((*location).to_string(), String::new());
    }
    if view.has("Synonymous") {
        return (
            "Coding Synonymous".to_string(),
            view.printable("Synonymous").unwrap_or_default(),
        );
    }
    if view.has("AA_substitution") {
        return (
            "Coding substitution".to_string(),
            view.printable("AA_substitution").unwrap_or_default(),
        );
    }
    if let Some(table) = view.table("Length_variation") {
        let part = |col| table.printable(0, col).unwrap_or_default();
        return (part(0), format!("{} {}", part(1), part(2)));
    }
    (String::new(), String::new())
}

fn sequence_change(
    ctx: &FieldContext<'_>,
    reference: &str,
    observed: &str,
    column: usize,
) -> Option<Vec<String>> {
    let before = ctx.view.table(reference)?.printable(0, column)?;
    let after = ctx.view.table(observed)?.printable(0, column)?;
    Some(vec![format!("{before} > {after}")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::testing::{cell, render_variant};
    use serde_json::json;

    #[test]
    fn test_position_and_names() {
        let chapter = identifiers();
        let cells = render_variant(
            &chapter,
            json!({
                "IntMap": [["7", 1200, 1202]],
                "gName": "chr7:1201:A>G",
                "Dan_Li": "DL-12"
            }),
        );
        assert_eq!(cell(&chapter, &cells, "Chromosome"), "chr7");
        assert_eq!(cell(&chapter, &cells, "last upstream conserved base"), "1200");
        assert_eq!(cell(&chapter, &cells, "First downstream conserved base"), "1202");
        assert_eq!(cell(&chapter, &cells, "genome Name"), "chr7:1201:A>G");
        assert_eq!(cell(&chapter, &cells, "RNA Name"), "");
        assert_eq!(cell(&chapter, &cells, "Dan Li Name"), "DL-12");
    }

    #[test]
    fn test_absent_position_is_empty() {
        let chapter = identifiers();
        let cells = render_variant(&chapter, json!({"IntMap": [["7", 0, null]]}));
        assert_eq!(cell(&chapter, &cells, "Chromosome"), "chr7");
        assert_eq!(cell(&chapter, &cells, "last upstream conserved base"), "0");
        assert_eq!(cell(&chapter, &cells, "First downstream conserved base"), "");
    }

    #[test]
    fn test_short_map_is_absent() {
        let chapter = identifiers();
        let cells = render_variant(&chapter, json!({"IntMap": [["7", 1200]]}));
        assert_eq!(cell(&chapter, &cells, "Chromosome"), "");
    }

    #[test]
    fn test_coding_classes() {
        let chapter = identifiers();

        let cells = render_variant(&chapter, json!({"Typ": "Sub", "Intronic": 1, "Synonymous": "L12L"}));
        assert_eq!(cell(&chapter, &cells, "Type"), "Sub");
        assert_eq!(cell(&chapter, &cells, "Coding"), "Intronic");
        assert_eq!(cell(&chapter, &cells, "Protein type"), "");

        let cells = render_variant(&chapter, json!({"AA_substitution": "V600E"}));
        assert_eq!(cell(&chapter, &cells, "Coding"), "Coding substitution");
        assert_eq!(cell(&chapter, &cells, "Protein type"), "V600E");

        let cells = render_variant(
            &chapter,
            json!({"Length_variation": [["Frameshift", "Del", "2"]]}),
        );
        assert_eq!(cell(&chapter, &cells, "Coding"), "Frameshift");
        assert_eq!(cell(&chapter, &cells, "Protein type"), "Del 2");
    }

    #[test]
    fn test_sequence_changes() {
        let chapter = identifiers();
        let cells = render_variant(
            &chapter,
            json!({
                "Reference_RNAexon_sequence": [["acgT", "T"]],
                "Observed__RNAexon_sequence": [["acgC", "A"]],
                "Reference_protein_sequence": [["x", "V"]],
                "Observed__protein_sequence": [["x"]]
            }),
        );
        assert_eq!(cell(&chapter, &cells, "RNA variation"), "acgT > acgC");
        assert_eq!(cell(&chapter, &cells, "Protein variation"), "");
    }
}
