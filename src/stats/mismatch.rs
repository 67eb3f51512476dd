//! Mismatch and variant-type classifier.
//!
//! Events come as compact codes with a weight:
//!
//! | Code | Class |
//! |------|-------|
//! | `a>g` | substitution (transition or transversion) |
//! | `+a`, `++a`, `+++a` | insertion of length 1, 2, 3 starting with `a` |
//! | `-g`, `--g`, `---` | deletion, same sub-typing |
//! | `*+a`, `*-g` | sliding (homopolymer) insertion or deletion |
//! | `Any` | denominator only, never counted |
//!
//! Codes are matched case-insensitively. A code that fits none of the shapes
//! still counts towards the grand total, as `unclassified`.

use super::ratio;
use crate::core::Base;

/// Directed substitutions in reporting order; the first four are transitions
pub const SUBSTITUTIONS: [&str; 12] = [
    "a>g", "t>c", "g>a", "c>t", "a>t", "t>a", "g>c", "c>g", "a>c", "t>g", "g>t", "c>a",
];

/// Number of leading entries of [`SUBSTITUTIONS`] that are transitions
pub const TRANSITIONS: usize = 4;

/// Longest indel length tracked separately
pub const MAX_INDEL_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndelKind {
    Insertion,
    Deletion,
}

/// The category a single event code falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Index into [`SUBSTITUTIONS`], `None` for a pair outside the table
    Substitution(Option<usize>),
    Indel {
        kind: IndelKind,
        sliding: bool,
        base: Option<Base>,
        /// 1, 2 or 3
        length: usize,
    },
    Unclassified,
}

/// Classify one event code. Returns `None` for the `Any` denominator row.
#[must_use]
pub fn classify_code(code: &str) -> Option<EventClass> {
    let code = code.trim().to_ascii_lowercase();
    if code == "any" {
        return None;
    }

    let bytes = code.as_bytes();
    if bytes.len() == 3 && bytes[1] == b'>' {
        let index = SUBSTITUTIONS.iter().position(|s| *s == code);
        return Some(EventClass::Substitution(index));
    }

    let (sliding, rest) = match code.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, code.as_str()),
    };
    let kind = match rest.chars().next() {
        Some('+') => IndelKind::Insertion,
        Some('-') => IndelKind::Deletion,
        _ => return Some(EventClass::Unclassified),
    };
    let marker = if kind == IndelKind::Insertion { '+' } else { '-' };
    let markers = rest.chars().take_while(|&c| c == marker).count();
    let base = rest.chars().nth(markers).and_then(Base::from_char);

    Some(EventClass::Indel {
        kind,
        sliding,
        base,
        length: markers.min(MAX_INDEL_LENGTH),
    })
}

/// Totals for one family of indels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndelTotals {
    pub total: f64,
    /// Indexed by [`Base::index`]
    pub by_base: [f64; 4],
    /// Index 0 holds length 1
    pub by_length: [f64; MAX_INDEL_LENGTH],
}

impl IndelTotals {
    fn add(&mut self, base: Option<Base>, length: usize, weight: f64) {
        self.total += weight;
        if let Some(base) = base {
            self.by_base[base.index()] += weight;
        }
        if (1..=MAX_INDEL_LENGTH).contains(&length) {
            self.by_length[length - 1] += weight;
        }
    }

    /// Sum of two families, e.g. plain plus sliding insertions
    #[must_use]
    pub fn merged(&self, other: &IndelTotals) -> IndelTotals {
        let mut out = *self;
        out.total += other.total;
        for i in 0..4 {
            out.by_base[i] += other.by_base[i];
        }
        for i in 0..MAX_INDEL_LENGTH {
            out.by_length[i] += other.by_length[i];
        }
        out
    }
}

/// Categorized totals over a set of weighted events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    /// Every event except `Any`
    pub grand_total: f64,
    /// All substitutions, including pairs outside the table
    pub substitutions: f64,
    pub transitions: f64,
    pub transversions: f64,
    pub by_substitution: [f64; 12],
    pub insertion: IndelTotals,
    pub deletion: IndelTotals,
    pub sliding_insertion: IndelTotals,
    pub sliding_deletion: IndelTotals,
    pub unclassified: f64,
}

impl CategoryTotals {
    fn add(&mut self, class: EventClass, weight: f64) {
        self.grand_total += weight;
        match class {
            EventClass::Substitution(index) => {
                self.substitutions += weight;
                if let Some(i) = index {
                    self.by_substitution[i] += weight;
                    if i < TRANSITIONS {
                        self.transitions += weight;
                    } else {
                        self.transversions += weight;
                    }
                }
            }
            EventClass::Indel {
                kind,
                sliding,
                base,
                length,
            } => {
                let family = match (kind, sliding) {
                    (IndelKind::Insertion, false) => &mut self.insertion,
                    (IndelKind::Deletion, false) => &mut self.deletion,
                    (IndelKind::Insertion, true) => &mut self.sliding_insertion,
                    (IndelKind::Deletion, true) => &mut self.sliding_deletion,
                };
                family.add(base, length, weight);
            }
            EventClass::Unclassified => self.unclassified += weight,
        }
    }

    /// Plain and sliding insertions together
    #[must_use]
    pub fn all_insertions(&self) -> IndelTotals {
        self.insertion.merged(&self.sliding_insertion)
    }

    /// Plain and sliding deletions together
    #[must_use]
    pub fn all_deletions(&self) -> IndelTotals {
        self.deletion.merged(&self.sliding_deletion)
    }

    #[must_use]
    pub fn indels(&self) -> f64 {
        self.insertion.total
            + self.deletion.total
            + self.sliding_insertion.total
            + self.sliding_deletion.total
    }

    /// Percentage of the grand total, `None` when nothing was counted
    #[must_use]
    pub fn share(&self, count: f64) -> Option<f64> {
        ratio(100.0 * count, self.grand_total)
    }

    /// Relative excess of A>G over T>C, reported once T>C exceeds 100 events
    #[must_use]
    pub fn editing_excess(&self) -> Option<f64> {
        let (a_to_g, t_to_c) = (self.by_substitution[0], self.by_substitution[1]);
        if t_to_c > 100.0 {
            Some(a_to_g / t_to_c - 1.0)
        } else {
            None
        }
    }
}

/// Classify a multiset of weighted event codes
pub fn classify<'a, I>(events: I) -> CategoryTotals
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut totals = CategoryTotals::default();
    for (code, weight) in events {
        if let Some(class) = classify_code(code) {
            totals.add(class, weight);
        }
    }
    totals
}

/// Events per kilobase given a denominator in megabases
#[must_use]
pub fn per_kb(count: f64, megabases: f64) -> Option<f64> {
    if megabases > 0.0 {
        ratio(count, 1000.0 * megabases)
    } else {
        None
    }
}
