//! Deterministic fallback pattern used when no learned model is loaded.

use super::ColorModifiers;

pub const FALLBACK_SATURATION: f32 = 0.8;
pub const FALLBACK_VALUE: f32 = 0.9;

/// `hue = 0.5 + 0.5 * sin(t)`, fixed saturation and value.
///
/// Pure: the same `time_sec` always yields bit-identical output.
pub fn generate(time_sec: f32) -> ColorModifiers {
    let hue = (0.5 + 0.5 * (time_sec as f64).sin()) as f32;
    ColorModifiers::new(hue, FALLBACK_SATURATION, FALLBACK_VALUE)
}
