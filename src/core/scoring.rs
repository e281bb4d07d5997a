/// Fraction of a recipe's required ingredients already owned, in [0, 1]
///
/// score = have / (have + missing)
///
/// A recipe with no required ingredients never reaches the matcher (the
/// catalog drops them), but the guard keeps the function total.
#[inline]
pub fn completeness_score(have: usize, missing: usize) -> f64 {
    let total = have + missing;
    if total == 0 {
        return 0.0;
    }

    (have as f64 / total as f64).clamp(0.0, 1.0)
}

/// Whether a score passes the configured minimum
#[inline]
pub fn meets_threshold(score: f64, min_score: f64) -> bool {
    score >= min_score
}
