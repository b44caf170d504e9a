use tracing::{debug, info, trace};

use super::clock::{FrameClock, MonotonicClock};
use super::state::{Style, UiState, clamp_ai_strength, clamp_iterations, clamp_resolution};
use crate::effects::{ColorModifiers, EffectGenerator};
use crate::engine::{BackendKind, Engine, EngineBinding, Parameter};
use crate::input::{PointerEvent, TouchAggregator};
use crate::ml::{InferenceWorker, ModelRuntime, RequestOutcome, WorkerConfig, WorkerStats};

/// Stand-in frame time when no positive delta can be measured.
pub const NOMINAL_DT: f32 = 1.0 / 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Active,
    Suspended,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Toggled { recording: bool },
    /// Caller should prompt for the record-audio permission.
    PermissionRequired,
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinatorConfig {
    pub backend: BackendKind,
    /// Inference is requested once every `cadence_divisor` frames.
    pub cadence_divisor: u64,
    pub nominal_dt: f32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Vulkan,
            cadence_divisor: 3,
            nominal_dt: NOMINAL_DT,
        }
    }
}

/// Drives one simulation frame per display refresh and schedules the slower learned
/// effect pass on its own worker.
///
/// All methods are meant for the render/input thread; only the inference worker runs
/// elsewhere, and it talks back solely through the effect channel.
pub struct FrameCoordinator<E: EngineBinding = Engine, K: FrameClock = MonotonicClock> {
    engine: E,
    clock: K,
    config: CoordinatorConfig,
    state: LifecycleState,
    ui: UiState,
    touch: TouchAggregator,
    effects: EffectGenerator,
    worker: Option<InferenceWorker>,
    last_frame: Option<std::time::Duration>,
    frame_counter: u64,
}

impl<E: EngineBinding, K: FrameClock> FrameCoordinator<E, K> {
    pub fn new(engine: E, clock: K, ui: UiState, config: CoordinatorConfig) -> Self {
        let (effects, _bridge) = EffectGenerator::channel();
        Self {
            engine,
            clock,
            config: CoordinatorConfig {
                cadence_divisor: config.cadence_divisor.max(1),
                ..config
            },
            state: LifecycleState::Uninitialized,
            ui: ui.clamped(),
            touch: TouchAggregator::new(),
            effects,
            worker: None,
            last_frame: None,
            frame_counter: 0,
        }
    }

    /// Load the effect model and start the inference worker. Failures leave the
    /// coordinator on procedural colors.
    pub fn with_inference(mut self, worker_config: &WorkerConfig, runtime: &dyn ModelRuntime) -> Self {
        let (effects, bridge) = EffectGenerator::channel();
        self.effects = effects;
        if let Some(old) = self.worker.take() {
            old.dispose();
        }
        self.worker = Some(InferenceWorker::spawn(worker_config, runtime, bridge));
        self
    }

    /// Per-frame entry point. Non-positive dimensions are rejected.
    pub fn step(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            trace!(target: "coordinator", width, height, "frame rejected");
            return;
        }
        match self.state {
            LifecycleState::Suspended | LifecycleState::Disposed => return,
            LifecycleState::Uninitialized => {
                self.engine
                    .initialize(width as u32, height as u32, self.config.backend);
                self.engine
                    .set_parameter(Parameter::AiStrength, self.ui.ai_strength);
                self.state = LifecycleState::Active;
                info!(target: "coordinator", width, height, "simulation active");
            }
            LifecycleState::Active => {}
        }

        let now = self.clock.now();
        let measured = self
            .last_frame
            .map(|prev| now.saturating_sub(prev).as_secs_f32());
        self.last_frame = Some(now);
        let dt = match measured {
            Some(dt) if dt > 0.0 => dt,
            _ => self.config.nominal_dt,
        };

        self.engine.step(dt);
        if measured.is_some_and(|dt| dt > 0.0) {
            self.ui.fps = 1.0 / dt;
        }
        self.effects.advance(dt);
        self.effects.drain();

        self.frame_counter += 1;
        if self.frame_counter % self.config.cadence_divisor == 0 && self.ui.ai_enabled {
            self.trigger_inference();
        }
    }

    fn trigger_inference(&self) {
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        let outcome = worker.request_inference(self.ui.style.id());
        if outcome != RequestOutcome::Submitted {
            trace!(target: "coordinator", ?outcome, frame = self.frame_counter, "inference not submitted");
        }
    }

    pub fn on_pointer_event(&mut self, event: &PointerEvent) -> usize {
        match self.state {
            LifecycleState::Disposed => return 0,
            LifecycleState::Suspended => {
                // Keep pointer positions current so the first resumed move has a sane delta,
                // but nothing reaches the solver while it is not stepping.
                self.touch.handle(event, self.ui.style, |_| {});
                return 0;
            }
            LifecycleState::Uninitialized | LifecycleState::Active => {}
        }
        let engine = &self.engine;
        self.touch.handle(event, self.ui.style, |imp| {
            engine.touch(imp.x, imp.y, imp.dx, imp.dy, imp.color)
        })
    }

    /// Host paused: stop stepping until [`resume`](Self::resume).
    pub fn suspend(&mut self) {
        if self.state == LifecycleState::Active {
            self.state = LifecycleState::Suspended;
            debug!(target: "coordinator", "suspended");
        }
    }

    pub fn resume(&mut self) {
        if self.state == LifecycleState::Suspended {
            self.state = LifecycleState::Active;
            // The paused interval must not show up as one giant dt.
            self.last_frame = None;
            debug!(target: "coordinator", "resumed");
        }
    }

    /// Release the inference worker and the engine. Idempotent; later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.state = LifecycleState::Disposed;
        if let Some(worker) = self.worker.as_ref() {
            worker.dispose();
        }
        self.engine.release();
        info!(target: "coordinator", frames = self.frame_counter, "disposed");
    }

    pub fn set_style(&mut self, style: Style) {
        self.ui.style = style;
    }

    pub fn set_ai_strength(&mut self, value: f32) {
        let clamped = clamp_ai_strength(value);
        self.ui.ai_strength = clamped;
        self.engine.set_parameter(Parameter::AiStrength, clamped);
    }

    pub fn set_iterations(&mut self, value: i64) {
        self.ui.pressure_iterations = clamp_iterations(value);
    }

    pub fn set_resolution(&mut self, value: i64) {
        self.ui.grid_resolution = clamp_resolution(value);
    }

    pub fn toggle_particles(&mut self) {
        self.ui.particles_enabled = !self.ui.particles_enabled;
    }

    pub fn toggle_bloom(&mut self) {
        self.ui.bloom_enabled = !self.ui.bloom_enabled;
    }

    pub fn toggle_grid(&mut self) {
        self.ui.grid_visible = !self.ui.grid_visible;
    }

    pub fn toggle_ai(&mut self) {
        self.ui.ai_enabled = !self.ui.ai_enabled;
    }

    /// No-op until the solver exposes a reset hook.
    pub fn reset(&mut self) {
        debug!(target: "coordinator", "reset requested; solver has no reset hook");
    }

    pub fn on_record_permission_result(&mut self, granted: bool) {
        self.ui.record_permission_granted = granted;
    }

    pub fn toggle_recording(&mut self, permission_granted: bool) -> RecordOutcome {
        if self.state == LifecycleState::Disposed {
            return RecordOutcome::Ignored;
        }
        self.ui.record_permission_granted = permission_granted;
        if !permission_granted {
            return RecordOutcome::PermissionRequired;
        }
        self.ui.recording = !self.ui.recording;
        RecordOutcome::Toggled {
            recording: self.ui.recording,
        }
    }

    /// Modifiers for the next draw.
    pub fn color_modifiers(&self) -> ColorModifiers {
        self.effects.current(self.ui.ai_enabled)
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn fps(&self) -> f32 {
        self.ui.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn inference_available(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| w.has_model() && !w.is_disposed())
    }

    pub fn worker_stats(&self) -> Option<WorkerStats> {
        self.worker.as_ref().map(InferenceWorker::stats)
    }
}

impl<E: EngineBinding, K: FrameClock> Drop for FrameCoordinator<E, K> {
    fn drop(&mut self) {
        self.dispose();
    }
}
