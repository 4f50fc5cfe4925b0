//! Null-safe arithmetic shared by every calculator.
//!
//! `None` always means "undefined" (missing input or zero denominator). It is
//! never collapsed into `0.0`, and no helper here returns NaN or infinity.

/// `numerator / denominator`, or `None` when either side is undefined, the
/// denominator is zero, or the result would not be finite.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let value = n / d;
    value.is_finite().then_some(value)
}

/// Same as [`safe_div`] but scaled to percent (0-100).
pub fn safe_pct(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    safe_div(numerator, denominator).map(|v| v * 100.0)
}

/// Sum of the defined values. `None` when every value is undefined (or the
/// iterator is empty), so an aggregate with no data never reads as zero.
pub fn sum_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// `(1 + rate_pct / 100)^period`.
pub fn compound(rate_pct: f64, period: u32) -> f64 {
    (1.0 + rate_pct / 100.0).powi(period as i32)
}
