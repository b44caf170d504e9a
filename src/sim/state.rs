use serde::{Deserialize, Serialize};

use crate::effects::unit_interval;

pub const MIN_PRESSURE_ITERATIONS: u32 = 10;
pub const MAX_PRESSURE_ITERATIONS: u32 = 60;
pub const MIN_GRID_RESOLUTION: u32 = 256;
pub const MAX_GRID_RESOLUTION: u32 = 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    #[default]
    Warm,
    Cool,
}

impl Style {
    pub fn display_name(self) -> &'static str {
        match self {
            Style::Warm => "Warm",
            Style::Cool => "Cool",
        }
    }

    /// Numeric identifier passed to the inference pass as its hint.
    pub fn id(self) -> f32 {
        match self {
            Style::Warm => 0.0,
            Style::Cool => 1.0,
        }
    }
}

/// Externally visible configuration snapshot plus the display-only FPS.
#[derive(Clone, Debug, PartialEq)]
pub struct UiState {
    pub style: Style,
    pub ai_enabled: bool,
    pub ai_strength: f32,
    pub particles_enabled: bool,
    pub bloom_enabled: bool,
    pub grid_visible: bool,
    pub grid_resolution: u32,
    pub pressure_iterations: u32,
    pub fps: f32,
    pub recording: bool,
    pub record_permission_granted: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            style: Style::Warm,
            ai_enabled: true,
            ai_strength: 0.6,
            particles_enabled: true,
            bloom_enabled: true,
            grid_visible: false,
            grid_resolution: 512,
            pressure_iterations: 30,
            fps: 0.0,
            recording: false,
            record_permission_granted: false,
        }
    }
}

pub fn clamp_iterations(value: i64) -> u32 {
    value.clamp(MIN_PRESSURE_ITERATIONS as i64, MAX_PRESSURE_ITERATIONS as i64) as u32
}

pub fn clamp_resolution(value: i64) -> u32 {
    value.clamp(MIN_GRID_RESOLUTION as i64, MAX_GRID_RESOLUTION as i64) as u32
}

pub fn clamp_ai_strength(value: f32) -> f32 {
    unit_interval(value)
}

impl UiState {
    /// Re-apply every documented range.
    pub fn clamped(mut self) -> Self {
        self.pressure_iterations = clamp_iterations(self.pressure_iterations as i64);
        self.grid_resolution = clamp_resolution(self.grid_resolution as i64);
        self.ai_strength = clamp_ai_strength(self.ai_strength);
        self
    }
}
