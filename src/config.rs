use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::engine::BackendKind;
use crate::ml::{DelegateKind, TensorShape, WorkerConfig};
use crate::sim::{CoordinatorConfig, NOMINAL_DT, Style, UiState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "EngineConfig::default_fallback_to_gl")]
    pub fallback_to_gl: bool,
    /// Headless provider only: pretend the Vulkan loader exists.
    #[serde(default = "EngineConfig::default_vulkan_available")]
    pub vulkan_available: bool,
}

impl EngineConfig {
    fn default_fallback_to_gl() -> bool {
        true
    }
    fn default_vulkan_available() -> bool {
        true
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            fallback_to_gl: Self::default_fallback_to_gl(),
            vulkan_available: Self::default_vulkan_available(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "InferenceConfig::default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "InferenceConfig::default_cadence_divisor")]
    pub cadence_divisor: u64,
    #[serde(default = "InferenceConfig::default_channels_in")]
    pub channels_in: usize,
    #[serde(default = "InferenceConfig::default_channels_out")]
    pub channels_out: usize,
    #[serde(default = "InferenceConfig::default_size")]
    pub size: usize,
    #[serde(default = "InferenceConfig::default_batch")]
    pub batch: usize,
    #[serde(default = "InferenceConfig::default_delegates")]
    pub delegates: Vec<DelegateKind>,
    #[serde(default = "InferenceConfig::default_warmup")]
    pub warmup: bool,
}

impl InferenceConfig {
    fn default_model_path() -> PathBuf {
        PathBuf::from("effects_unet_int8.tflite")
    }
    fn default_cadence_divisor() -> u64 {
        3
    }
    fn default_channels_in() -> usize {
        7
    }
    fn default_channels_out() -> usize {
        5
    }
    fn default_size() -> usize {
        256
    }
    fn default_batch() -> usize {
        1
    }
    fn default_delegates() -> Vec<DelegateKind> {
        vec![DelegateKind::Nnapi, DelegateKind::Gpu]
    }
    fn default_warmup() -> bool {
        true
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: Self::default_model_path(),
            cadence_divisor: Self::default_cadence_divisor(),
            channels_in: Self::default_channels_in(),
            channels_out: Self::default_channels_out(),
            size: Self::default_size(),
            batch: Self::default_batch(),
            delegates: Self::default_delegates(),
            warmup: Self::default_warmup(),
        }
    }
}

/// Initial settings snapshot handed to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub style: Style,
    #[serde(default = "SimulationConfig::default_true")]
    pub ai_enabled: bool,
    #[serde(default = "SimulationConfig::default_ai_strength")]
    pub ai_strength: f32,
    #[serde(default = "SimulationConfig::default_true")]
    pub particles_enabled: bool,
    #[serde(default = "SimulationConfig::default_true")]
    pub bloom_enabled: bool,
    #[serde(default)]
    pub grid_visible: bool,
    #[serde(default = "SimulationConfig::default_grid_resolution")]
    pub grid_resolution: u32,
    #[serde(default = "SimulationConfig::default_pressure_iterations")]
    pub pressure_iterations: u32,
}

impl SimulationConfig {
    fn default_true() -> bool {
        true
    }
    fn default_ai_strength() -> f32 {
        0.6
    }
    fn default_grid_resolution() -> u32 {
        512
    }
    fn default_pressure_iterations() -> u32 {
        30
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            style: self.style,
            ai_enabled: self.ai_enabled,
            ai_strength: self.ai_strength,
            particles_enabled: self.particles_enabled,
            bloom_enabled: self.bloom_enabled,
            grid_visible: self.grid_visible,
            grid_resolution: self.grid_resolution,
            pressure_iterations: self.pressure_iterations,
            ..UiState::default()
        }
        .clamped()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            style: Style::default(),
            ai_enabled: Self::default_true(),
            ai_strength: Self::default_ai_strength(),
            particles_enabled: Self::default_true(),
            bloom_enabled: Self::default_true(),
            grid_visible: false,
            grid_resolution: Self::default_grid_resolution(),
            pressure_iterations: Self::default_pressure_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "HostConfig::default_width")]
    pub width: i32,
    #[serde(default = "HostConfig::default_height")]
    pub height: i32,
    #[serde(default = "HostConfig::default_target_fps")]
    pub target_fps: f32,
    /// Frames to run before exiting; 0 runs until interrupted.
    #[serde(default)]
    pub frames: u64,
}

impl HostConfig {
    fn default_width() -> i32 {
        800
    }
    fn default_height() -> i32 {
        600
    }
    fn default_target_fps() -> f32 {
        60.0
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            target_fps: Self::default_target_fps(),
            frames: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl AppConfig {
    pub fn worker_config(&self) -> WorkerConfig {
        let inf = &self.inference;
        WorkerConfig {
            model_path: inf.model_path.clone(),
            input: TensorShape {
                batch: inf.batch,
                channels: inf.channels_in,
                size: inf.size,
            },
            output: TensorShape {
                batch: inf.batch,
                channels: inf.channels_out,
                size: inf.size,
            },
            delegates: inf.delegates.clone(),
            warmup: inf.warmup,
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            backend: self.engine.backend,
            cadence_divisor: self.inference.cadence_divisor.max(1),
            nominal_dt: NOMINAL_DT,
        }
    }

    /// Read `path`, or write a commented template there when it does not exist.
    /// Unreadable or unparsable files are logged and replaced by defaults.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if !path_obj.exists() {
            let cfg = Self::default();
            cfg.write_template(path_obj);
            return cfg;
        }
        match fs::read_to_string(path_obj) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                warn!(target: "config", "Failed to parse config {path}: {err}. Using defaults.");
                Self::default()
            }),
            Err(err) => {
                warn!(target: "config", "Failed to read config {path}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// This config with every key commented out. Section headers stay live so the file
    /// parses back to defaults.
    pub fn template(&self) -> Result<String, toml::ser::Error> {
        let text = toml::to_string_pretty(self)?;
        let mut out = String::from(TEMPLATE_HEADER);
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_section_header(trimmed) {
                out.push_str(line);
            } else {
                out.push_str("# ");
                match compact_float_entry(line) {
                    Some(entry) => out.push_str(&entry),
                    None => out.push_str(line),
                }
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn write_template(&self, path: &Path) {
        let text = match self.template() {
            Ok(text) => text,
            Err(err) => {
                warn!(target: "config", "Failed to serialize default config: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(path, text) {
            warn!(target: "config", "Failed to write default config to {}: {err}", path.display());
        }
    }
}

const TEMPLATE_HEADER: &str = "# fluidsim configuration. Uncomment a key to override its default.\n\n";

fn is_section_header(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']') && !line.contains('=')
}

/// f32 fields widen on serialization (`0.6000000238418579`); show them as written.
fn compact_float_entry(line: &str) -> Option<String> {
    let (key, value) = line.split_once('=')?;
    let value = value.trim();
    if !value.contains('.') || value.starts_with('"') {
        return None;
    }
    let x: f32 = value.parse().ok()?;
    let mut digits = format!("{x:.6}");
    while digits.ends_with('0') {
        digits.pop();
    }
    if digits.ends_with('.') {
        digits.push('0');
    }
    Some(format!("{} = {digits}", key.trim()))
}
