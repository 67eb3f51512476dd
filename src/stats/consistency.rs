//! Cross-replicate consistency detector.
//!
//! Each replicate contributes a `(success, total)` pair. The detector pools
//! them, then flags any replicate whose own proportion sits further from the
//! pooled proportion than `alpha` times the sum of both standard errors:
//!
//! ```text
//! p      = Σsuccess / Σtotal        se      = 1 / √Σtotal
//! p_i    = success_i / total_i      se_i    = 1 / √total_i
//! flag i when |p_i − p| > alpha · (se_i + se)
//! ```

/// One replicate measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Replicate {
    pub label: String,
    pub success: f64,
    pub total: f64,
}

impl Replicate {
    pub fn new(label: impl Into<String>, success: f64, total: f64) -> Self {
        Self {
            label: label.into(),
            success,
            total,
        }
    }
}

/// A proportion with its binomial standard error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proportion {
    pub value: f64,
    pub standard_error: f64,
}

impl Proportion {
    /// `None` when `total` is not positive
    #[must_use]
    pub fn estimate(success: f64, total: f64) -> Option<Self> {
        if total > 0.0 {
            Some(Self {
                value: success / total,
                standard_error: 1.0 / total.sqrt(),
            })
        } else {
            None
        }
    }
}

/// Tunables for one family of consistency checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub alpha: f64,
    /// Minimum number of usable replicates
    pub min_replicates: usize,
    /// A replicate is usable only when its total is strictly above this floor
    pub usable_total_floor: f64,
    /// Minimum pooled total over usable replicates
    pub min_pooled_total: f64,
}

/// Per-assay allele frequencies
pub const ASSAY_FREQUENCY: DetectorConfig = DetectorConfig {
    alpha: 1.5,
    min_replicates: 4,
    usable_total_floor: 0.0,
    min_pooled_total: 0.0,
};

/// Replicate noise within and across assays
pub const REPLICATE_NOISE: DetectorConfig = DetectorConfig {
    alpha: 2.0,
    min_replicates: 4,
    usable_total_floor: 4.0,
    min_pooled_total: 20.0,
};

impl DetectorConfig {
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// A replicate that disagrees with the pooled estimate
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedReplicate {
    pub label: String,
    /// Position in the input group
    pub index: usize,
    pub proportion: Proportion,
    /// `|p_i − p|`
    pub deviation: f64,
    /// `alpha · (se_i + se)`
    pub threshold: f64,
}

/// Outcome of a consistency check with enough data
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    pub pooled: Proportion,
    pub usable: usize,
    pub success: f64,
    pub total: f64,
    /// Flagged replicates in input order
    pub flagged: Vec<FlaggedReplicate>,
}

impl ConsistencyReport {
    /// The flagged replicate with the largest deviation
    #[must_use]
    pub fn most_deviant(&self) -> Option<&FlaggedReplicate> {
        self.flagged
            .iter()
            .max_by(|a, b| a.deviation.total_cmp(&b.deviation))
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Pool a replicate group and flag outliers.
///
/// Returns `None` ("insufficient data") when fewer than
/// `config.min_replicates` replicates are usable or the pooled total is below
/// `config.min_pooled_total`. Replicates with a zero total never count.
#[must_use]
pub fn detect_outliers(group: &[Replicate], config: &DetectorConfig) -> Option<ConsistencyReport> {
    let usable: Vec<(usize, &Replicate)> = group
        .iter()
        .enumerate()
        .filter(|(_, r)| r.total > 0.0 && r.total > config.usable_total_floor)
        .collect();

    if usable.len() < config.min_replicates {
        return None;
    }

    let success: f64 = usable.iter().map(|(_, r)| r.success).sum();
    let total: f64 = usable.iter().map(|(_, r)| r.total).sum();
    if total < config.min_pooled_total {
        return None;
    }
    let pooled = Proportion::estimate(success, total)?;

    let flagged = usable
        .iter()
        .filter_map(|&(index, replicate)| {
            let own = Proportion::estimate(replicate.success, replicate.total)?;
            let deviation = (own.value - pooled.value).abs();
            let threshold = config.alpha * (own.standard_error + pooled.standard_error);
            (deviation > threshold).then(|| FlaggedReplicate {
                label: replicate.label.clone(),
                index,
                proportion: own,
                deviation,
                threshold,
            })
        })
        .collect();

    Some(ConsistencyReport {
        pooled,
        usable: usable.len(),
        success,
        total,
        flagged,
    })
}
