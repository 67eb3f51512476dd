use serde::{Deserialize, Serialize};

/// Unique identifier for a subject in the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a report row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// A single sequencing run
    Run,
    /// A group of runs, reported with cumulated metrics
    Group,
    /// A variant record with per-replicate allele counts
    Variant,
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run => write!(f, "Run"),
            Self::Group => write!(f, "Group"),
            Self::Variant => write!(f, "Variant"),
        }
    }
}

/// Four nucleotides in the fixed order used by every per-base column group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    A,
    T,
    G,
    C,
}

impl Base {
    pub const ALL: [Base; 4] = [Base::A, Base::T, Base::G, Base::C];

    /// Parse a nucleotide letter, ignoring case. Ambiguity codes return `None`.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(Self::A),
            't' => Some(Self::T),
            'g' => Some(Self::G),
            'c' => Some(Self::C),
            _ => None,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::T => 1,
            Self::G => 2,
            Self::C => 3,
        }
    }

    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::T => 'T',
            Self::G => 'G',
            Self::C => 'C',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_parsing() {
        assert_eq!(Base::from_char('a'), Some(Base::A));
        assert_eq!(Base::from_char('G'), Some(Base::G));
        assert_eq!(Base::from_char('n'), None);
        for (i, base) in Base::ALL.iter().enumerate() {
            assert_eq!(base.index(), i);
        }
    }

    #[test]
    fn test_subject_kind_display() {
        assert_eq!(SubjectKind::Run.to_string(), "Run");
        assert_eq!(SubjectKind::Variant.to_string(), "Variant");
    }
}
