//! Chapter `T`: metadata for sample, project and laboratory.

use crate::report::{Chapter, Field};

/// Single-valued descriptive relations and their column titles
const DESCRIPTORS: [(&str, &str); 9] = [
    ("Other_title", "Other title"),
    ("Sorting_title", "Sorting title 1"),
    ("Sorting_Title_2", "Sorting title 2"),
    ("Sample", "Sample"),
    ("Tissue", "System or Tissue"),
    ("Sex", "Sex"),
    ("Author", "Laboratory, Author when available, submission date"),
    ("Species", "Species"),
    ("Reference", "Reference"),
];

#[must_use]
pub fn metadata() -> Chapter {
    Chapter::new('T', "Run metadata", "Metadata for sample, project and laboratory")
        .field(Field::spacer())
        .field(Field::title())
        .field(Field::multi(&["RunId"], "RunId").or_label())
        .field(Field::multi(&["SRR", "SRX", "Sublibraries"], "Run accession in SRA"))
        .fields(
            DESCRIPTORS
                .iter()
                .map(|(relation, title)| Field::plain(relation, 0, title)),
        )
}
