use thiserror::Error;
use tracing::debug;

use crate::core::SubjectKind;
use crate::report::filter::VariantFilter;
use crate::report::format::sanitize;

/// Default chapter selection: the variant summary
pub const DEFAULT_SELECTION: &str = "IbdBDN";

/// Number of configurable annotation targets
pub const TARGET_COUNT: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown chapter code '{0}'")]
    UnknownChapter(char),

    #[error("At most {TARGET_COUNT} annotation targets can be configured, got {0}")]
    TooManyTargets(usize),

    #[error("Empty chapter selection")]
    EmptySelection,
}

/// An annotation target: the key used in relations and its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub key: String,
    pub display: String,
}

impl Target {
    /// Build a target from its key, expanding the well-known abbreviations
    #[must_use]
    pub fn new(key: &str) -> Self {
        let key = sanitize(key);
        let display = match key.as_str() {
            "av" => "AceView".to_string(),
            "transposon" => "Repbase transposon".to_string(),
            _ => key.clone(),
        };
        Self { key, display }
    }

    fn placeholder(index: usize) -> Self {
        let name = format!("annotation {}", index + 1);
        Self {
            key: name.clone(),
            display: name,
        }
    }
}

/// The three annotation targets substituted into titles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet {
    targets: [Target; TARGET_COUNT],
}

impl Default for TargetSet {
    fn default() -> Self {
        Self {
            targets: [Target::placeholder(0), Target::placeholder(1), Target::placeholder(2)],
        }
    }
}

impl TargetSet {
    /// Parse a whitespace separated list of up to three target keys.
    /// Missing targets are named `annotation N`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TooManyTargets` when more than three are given.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let keys: Vec<&str> = list.split_whitespace().collect();
        if keys.len() > TARGET_COUNT {
            return Err(ConfigError::TooManyTargets(keys.len()));
        }
        let mut set = Self::default();
        for (slot, key) in set.targets.iter_mut().zip(&keys) {
            *slot = Target::new(key);
        }
        debug!("Annotation targets: {:?}", set.targets.iter().map(|t| &t.key).collect::<Vec<_>>());
        Ok(set)
    }

    /// Key of target `index` (0-based)
    #[must_use]
    pub fn key(&self, index: usize) -> &str {
        self.targets.get(index).map_or("", |t| t.key.as_str())
    }

    /// Display name of target `index` (0-based)
    #[must_use]
    pub fn display(&self, index: usize) -> &str {
        self.targets.get(index).map_or("", |t| t.display.as_str())
    }
}

/// Everything the engine needs besides the source and the subjects
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Chapter codes in rendering order
    pub selection: String,

    pub targets: TargetSet,

    pub project: Option<String>,

    /// Variant row filter, ignored for runs and groups
    pub filter: VariantFilter,

    /// Reject unknown chapter codes instead of skipping them
    pub strict: bool,

    /// Subject kind, printed in the header row label
    pub kind: SubjectKind,

    /// Write the `##` preamble line
    pub preamble: bool,

    /// File name printed in the preamble
    pub output_name: Option<String>,

    /// Preamble timestamp; the current local time when unset
    pub timestamp: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            selection: DEFAULT_SELECTION.to_string(),
            targets: TargetSet::default(),
            project: None,
            filter: VariantFilter::default(),
            strict: false,
            kind: SubjectKind::Variant,
            preamble: false,
            output_name: None,
            timestamp: None,
        }
    }
}
