//! The chapter catalogue.
//!
//! Every chapter is addressed by a single-letter code. A selection string
//! such as `IbdBDN` lists the chapters of a report in rendering order.
//!
//! ## Variant chapters
//!
//! `I` identifiers, `d`/`D` assay allele frequency and counts, `b`/`B`
//! replicate allele frequency and counts, `N` replicate noise.
//!
//! ## Run and group chapters
//!
//! `T` metadata, `r` before alignment, `a` global alignment, `l` aligned
//! length per target, `s` strandedness, `m`/`v`/`V` mismatch and variant
//! types, `c` SNV coding, `p`/`P` pair fate, `z` insert size, `o` motif
//! search, `3` 3' bias.

pub mod alignment;
pub mod assay;
pub mod coding;
pub mod metadata;
pub mod mismatch;
pub mod motifs;
pub mod noise;
pub mod pairs;
pub mod strandedness;
pub mod variant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::report::{Chapter, ConfigError};

/// Catalogue entry, as listed by `qc-summary chapters`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChapterInfo {
    pub code: char,
    pub name: &'static str,
    /// Subject kinds the chapter is meant for
    pub subjects: &'static str,
}

const VARIANTS: &str = "variants";
const RUNS: &str = "runs/groups";

/// Every chapter the catalogue can build, in listing order
pub const CATALOGUE: &[ChapterInfo] = &[
    ChapterInfo { code: 'I', name: "Variant identifiers", subjects: VARIANTS },
    ChapterInfo { code: 'd', name: "Assay allele frequency", subjects: VARIANTS },
    ChapterInfo { code: 'D', name: "Assay counts", subjects: VARIANTS },
    ChapterInfo { code: 'b', name: "Replicate allele frequency", subjects: VARIANTS },
    ChapterInfo { code: 'B', name: "Replicate counts", subjects: VARIANTS },
    ChapterInfo { code: 'N', name: "Replicate noise", subjects: VARIANTS },
    ChapterInfo { code: 'T', name: "Run metadata", subjects: RUNS },
    ChapterInfo { code: 'r', name: "Before alignment", subjects: RUNS },
    ChapterInfo { code: 'a', name: "Global alignment", subjects: RUNS },
    ChapterInfo { code: 'l', name: "Aligned length per target", subjects: RUNS },
    ChapterInfo { code: 's', name: "Strandedness", subjects: RUNS },
    ChapterInfo { code: 'm', name: "Mismatch types", subjects: RUNS },
    ChapterInfo { code: 'v', name: "Variant types", subjects: RUNS },
    ChapterInfo { code: 'V', name: "Rejected variant types", subjects: RUNS },
    ChapterInfo { code: 'c', name: "SNV coding", subjects: RUNS },
    ChapterInfo { code: 'p', name: "Pair fate counts", subjects: RUNS },
    ChapterInfo { code: 'P', name: "Pair fate percentages", subjects: RUNS },
    ChapterInfo { code: 'z', name: "Insert size", subjects: RUNS },
    ChapterInfo { code: 'o', name: "Motif search", subjects: RUNS },
    ChapterInfo { code: '3', name: "3' bias", subjects: RUNS },
];

/// Catalogue entry for a code
#[must_use]
pub fn info(code: char) -> Option<&'static ChapterInfo> {
    CATALOGUE.iter().find(|c| c.code == code)
}

/// Build the chapter addressed by `code`
#[must_use]
pub fn build(code: char) -> Option<Chapter> {
    let chapter = match code {
        'I' => variant::identifiers(),
        'd' => assay::danli_frequency(),
        'D' => assay::danli_counts(),
        'b' => assay::brs_frequency(),
        'B' => assay::brs_counts(),
        'N' => noise::replicate_noise(),
        'T' => metadata::metadata(),
        'r' => alignment::before_alignment(),
        'a' => alignment::global_alignment(),
        'l' => alignment::aligned_length(),
        's' => strandedness::strandedness(),
        'm' => mismatch::mismatch_types(),
        'v' => mismatch::variant_types(),
        'V' => mismatch::rejected_variant_types(),
        'c' => coding::snv_coding(),
        'p' => pairs::pair_fate(false),
        'P' => pairs::pair_fate(true),
        'z' => pairs::insert_size(),
        'o' => motifs::motif_search(),
        '3' => motifs::three_prime_bias(),
        _ => return None,
    };
    Some(chapter)
}

/// Build the chapters of a selection string, in order.
///
/// Unknown codes are skipped with a warning, or rejected when `strict`.
/// Whitespace is ignored.
///
/// # Errors
///
/// Returns `ConfigError::UnknownChapter` in strict mode and
/// `ConfigError::EmptySelection` when nothing could be selected.
pub fn select(selection: &str, strict: bool) -> Result<Vec<Chapter>, ConfigError> {
    let mut chapters = Vec::new();
    for code in selection.chars().filter(|c| !c.is_whitespace()) {
        match build(code) {
            Some(chapter) => {
                debug!("Selected chapter '{}' ({})", code, chapter.name);
                chapters.push(chapter);
            }
            None if strict => return Err(ConfigError::UnknownChapter(code)),
            None => warn!("Skipping unknown chapter code '{}'", code),
        }
    }
    if chapters.is_empty() {
        return Err(ConfigError::EmptySelection);
    }
    Ok(chapters)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Render a single chapter against one subject built from JSON.

    use serde_json::{json, Value};

    use crate::core::{Subject, SubjectKind};
    use crate::report::field::{FieldContext, Scratch, TitleContext};
    use crate::report::{Chapter, ChapterError, TargetSet};
    use crate::source::{KnowledgeBase, SubjectView};

    pub fn titles() -> TitleContext {
        TitleContext {
            project: "Demo".to_string(),
            targets: TargetSet::parse("av RefSeq EBI").unwrap(),
        }
    }

    pub fn try_render(
        chapter: &Chapter,
        kind: SubjectKind,
        attributes: Value,
    ) -> Result<Vec<String>, ChapterError> {
        let snapshot = json!({
            "version": "1.0.0",
            "subjects": [{"id": "s1", "kind": kind, "attributes": attributes}]
        });
        let kb = KnowledgeBase::from_json(&snapshot.to_string()).unwrap();
        let subject = Subject::new("s1", kind);
        let view = SubjectView::new(&kb, &subject);
        let titles = titles();
        let mut scratch = Scratch::default();
        let mut ctx = FieldContext {
            view: &view,
            scratch: &mut scratch,
            titles: &titles,
        };
        chapter.data_cells(&mut ctx)
    }

    /// Data cells for a run with the given attributes
    pub fn render(chapter: &Chapter, attributes: Value) -> Vec<String> {
        try_render(chapter, SubjectKind::Run, attributes).unwrap()
    }

    /// Data cells for a variant with the given attributes
    pub fn render_variant(chapter: &Chapter, attributes: Value) -> Vec<String> {
        try_render(chapter, SubjectKind::Variant, attributes).unwrap()
    }

    /// Data cells keyed by their header title
    pub fn by_title(chapter: &Chapter, cells: &[String]) -> Vec<(String, String)> {
        chapter
            .header_cells(&titles())
            .into_iter()
            .zip(cells.iter().cloned())
            .collect()
    }

    /// The cell under a given header title
    pub fn cell<'a>(chapter: &Chapter, cells: &'a [String], title: &str) -> &'a str {
        let headers = chapter.header_cells(&titles());
        let index = headers
            .iter()
            .position(|h| h == title)
            .unwrap_or_else(|| panic!("no column titled '{title}'"));
        &cells[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_code_builds() {
        for entry in CATALOGUE {
            let chapter = build(entry.code).unwrap();
            assert_eq!(chapter.code, entry.code);
            assert!(chapter.width() > 0, "chapter '{}' has no columns", entry.code);
        }
    }

    #[test]
    fn test_every_chapter_is_rectangular_on_empty_subject() {
        let titles = testing::titles();
        for entry in CATALOGUE {
            let chapter = build(entry.code).unwrap();
            let width = chapter.width();
            assert_eq!(chapter.caption_cells(&titles).len(), width, "caption of '{}'", entry.code);
            assert_eq!(chapter.header_cells(&titles).len(), width, "header of '{}'", entry.code);
            let cells = testing::render(&chapter, json!({}));
            assert_eq!(cells.len(), width, "data of '{}'", entry.code);
            // Metadata falls back to the label; pair fate prints dashes without pairs
            if !matches!(entry.code, 'T' | 'p' | 'P') {
                assert!(
                    cells.iter().skip(2).all(String::is_empty),
                    "chapter '{}' rendered values for an empty subject: {:?}",
                    entry.code,
                    cells
                );
            }
        }
    }

    #[test]
    fn test_select_skips_unknown_codes() {
        let chapters = select("Ib?D", false).unwrap();
        let codes: Vec<char> = chapters.iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!['I', 'b', 'D']);
    }

    #[test]
    fn test_select_strict() {
        assert_eq!(
            select("Ib?D", true).unwrap_err(),
            ConfigError::UnknownChapter('?')
        );
        assert_eq!(select("??", false).unwrap_err(), ConfigError::EmptySelection);
    }

    #[test]
    fn test_info() {
        assert_eq!(info('m').map(|i| i.name), Some("Mismatch types"));
        assert!(info('x').is_none());
    }
}
