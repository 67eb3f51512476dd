//! Cell formatting helpers.
//!
//! Every helper that takes an `Option` renders `None` as the empty string, the
//! report's marker for "absent". Measured zeros always print as digits.

pub use crate::stats::ratio;

/// Fixed-point rendering with `decimals` digits
#[must_use]
pub fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Fixed-point rendering of an optional value
#[must_use]
pub fn opt_fixed(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| fixed(v, decimals))
}

/// Count in millions: three decimals above 100 000, six below, `0` for zero
#[must_use]
pub fn millions(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.abs() > 100_000.0 {
        format!("{:.3}", value / 1_000_000.0)
    } else {
        format!("{:.6}", value / 1_000_000.0)
    }
}

/// Percentage with two decimals, empty for a zero denominator
#[must_use]
pub fn percent(numerator: f64, denominator: f64) -> String {
    opt_fixed(ratio(100.0 * numerator, denominator), 2)
}

/// `n` empty cells
#[must_use]
pub fn blanks(n: usize) -> Vec<String> {
    vec![String::new(); n]
}

/// Strip characters that would break the row structure
#[must_use]
pub fn sanitize(text: &str) -> String {
    if text.contains(['\t', '\n', '\r']) {
        text.replace(['\t', '\n', '\r'], " ")
    } else {
        text.to_string()
    }
}
