//! Color modulation applied by the renderer on top of the simulated dye.
//!
//! Modifiers come either from the learned effect pass (see [`crate::ml`]) or from the
//! deterministic [`procedural`] pattern when no model is available.

pub mod generator;
pub mod procedural;

pub use generator::{ColorBridge, EffectGenerator};

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub fn unit_interval(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// HSV modifier triple. Every component lies in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorModifiers {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl ColorModifiers {
    pub fn new(hue: f32, saturation: f32, value: f32) -> Self {
        Self {
            hue: unit_interval(hue),
            saturation: unit_interval(saturation),
            value: unit_interval(value),
        }
    }

    /// Decode the leading three bytes of a quantized model output as `byte / 255`.
    pub fn from_output_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [h, s, v, ..] => Some(Self::new(
                *h as f32 / 255.0,
                *s as f32 / 255.0,
                *v as f32 / 255.0,
            )),
            _ => None,
        }
    }
}

impl Default for ColorModifiers {
    fn default() -> Self {
        procedural::generate(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_clamps_each_component() {
        let m = ColorModifiers::new(-0.5, 1.5, f32::NAN);
        assert_eq!(m.hue, 0.0);
        assert_eq!(m.saturation, 1.0);
        assert_eq!(m.value, 0.0);
    }

    #[test]
    fn output_bytes_decode_to_unit_range() {
        let m = ColorModifiers::from_output_bytes(&[0, 255, 51, 9, 9]).expect("three bytes");
        assert_eq!(m.hue, 0.0);
        assert_eq!(m.saturation, 1.0);
        assert_relative_eq!(m.value, 0.2, epsilon = 1e-6);
        assert!(ColorModifiers::from_output_bytes(&[1, 2]).is_none());
    }
}
