//! Exponential smoothing primitive for the engine's running statistics.
//!
//! The update is `estimate += alpha * (sample - estimate)` with alpha = 0.8:
//! each step closes 80% of the gap to the newest sample, so the estimate
//! tracks load changes within a couple of cycles instead of averaging over a
//! long tail. The formula is kept bit-for-bit.

/// Smoothing factor shared by the interval and delay estimates
pub const SMOOTHING_ALPHA: f64 = 0.8;

/// Fold a new sample into a running estimate.
///
/// `None` means no observation yet; the first sample seeds the estimate raw
/// instead of smoothing against a void.
pub fn smooth(current: Option<f64>, sample: f64) -> f64 {
    match current {
        None => sample,
        Some(estimate) => estimate + SMOOTHING_ALPHA * (sample - estimate),
    }
}
