use crate::source::SubjectView;

/// Relation holding per-replicate `[replicate, coverage, mutant]` counts
pub const REPLICATE_COUNTS: &str = "BRS_counts";

/// Minimum allele frequency and coverage a variant needs in at least one
/// replicate to be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantFilter {
    /// Percent
    pub min_frequency: u32,
    pub min_coverage: u32,
}

impl Default for VariantFilter {
    fn default() -> Self {
        Self {
            min_frequency: 20,
            min_coverage: 20,
        }
    }
}

impl VariantFilter {
    /// A filter that keeps everything
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            min_frequency: 0,
            min_coverage: 0,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.min_frequency > 0 || self.min_coverage > 0
    }

    /// Whether one `(mutant, coverage)` pair passes both thresholds
    #[must_use]
    pub fn accepts_counts(&self, mutant: i64, coverage: i64) -> bool {
        coverage >= i64::from(self.min_coverage)
            && 100 * i128::from(mutant) >= i128::from(self.min_frequency) * i128::from(coverage)
    }

    /// Whether a variant row should be written
    #[must_use]
    pub fn accepts(&self, view: &SubjectView<'_>) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let Some(table) = view.table(REPLICATE_COUNTS) else {
            return false;
        };
        (0..table.len()).any(|row| {
            let coverage = table.int(row, 1).unwrap_or(0);
            let mutant = table.int(row, 2).unwrap_or(0);
            self.accepts_counts(mutant, coverage)
        })
    }
}
