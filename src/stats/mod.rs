//! Numeric algorithms hosted by the report chapters.
//!
//! - [`mismatch`]: classify compact mismatch codes into categorized totals and rates
//! - [`consistency`]: pool replicate measurements and flag outliers

pub mod consistency;
pub mod mismatch;

pub use consistency::{detect_outliers, ConsistencyReport, DetectorConfig, Replicate};
pub use mismatch::{classify, CategoryTotals};

/// `numerator / denominator`, or `None` for a zero denominator or a
/// non-finite result
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(1.0, 4.0), Some(0.25));
        assert_eq!(ratio(1.0, 0.0), None);
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(f64::MAX, 1e-300), None);
    }
}
