//! Confidence estimation
//!
//! Confidence here measures how decisive the scorer is, not calibrated
//! statistical confidence: 1.0 at the extremes, 0.0 at an even 0.5.

/// Confidence in [0, 1] from a raw scoring signal
pub fn confidence(raw_signal: f64) -> f64 {
    if !raw_signal.is_finite() {
        return 0.0;
    }
    (2.0 * (raw_signal - 0.5).abs()).clamp(0.0, 1.0)
}
