use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use fluidsim::effects::ColorModifiers;
use fluidsim::effects::procedural::{FALLBACK_SATURATION, FALLBACK_VALUE};
use fluidsim::engine::{Engine, HeadlessProvider};
use fluidsim::ml::{
    Delegate, DelegateKind, InferenceError, InferenceModel, MODEL_MAGIC, ModelError,
    ModelRuntime, TensorShape, WorkerConfig,
};
use fluidsim::sim::{CoordinatorConfig, FrameCoordinator, ManualClock, UiState};

fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "fluidsim_inference_{}_{}",
        name,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    path
}

fn write_model(name: &str, header: &[u8]) -> PathBuf {
    let path = unique_path(name);
    let mut blob = header.to_vec();
    blob.extend_from_slice(&[0u8; 32]);
    fs::write(&path, blob).expect("write model");
    path
}

fn worker_config(model_path: PathBuf) -> WorkerConfig {
    WorkerConfig {
        model_path,
        input: TensorShape {
            batch: 1,
            channels: 7,
            size: 4,
        },
        output: TensorShape {
            batch: 1,
            channels: 5,
            size: 4,
        },
        delegates: vec![DelegateKind::Nnapi, DelegateKind::Gpu],
        warmup: false,
    }
}

/// Writes a fixed color into the first output bytes.
struct FixedModel {
    rgb: [u8; 3],
    runs: Arc<AtomicUsize>,
}

impl InferenceModel for FixedModel {
    fn run(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
        assert_eq!(input.len(), 7 * 4 * 4);
        output[..3].copy_from_slice(&self.rgb);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct StubRuntime {
    rgb: [u8; 3],
    delegates_available: bool,
    runs: Arc<AtomicUsize>,
}

impl StubRuntime {
    fn new(rgb: [u8; 3], delegates_available: bool) -> Self {
        Self {
            rgb,
            delegates_available,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[derive(Debug)]
struct StubDelegate(DelegateKind);

impl Delegate for StubDelegate {
    fn kind(&self) -> DelegateKind {
        self.0
    }
}

impl ModelRuntime for StubRuntime {
    fn name(&self) -> &str {
        "stub"
    }

    fn create_delegate(&self, kind: DelegateKind) -> Result<Box<dyn Delegate>, ModelError> {
        if self.delegates_available {
            Ok(Box::new(StubDelegate(kind)))
        } else {
            Err(ModelError::DelegateUnavailable(kind))
        }
    }

    fn load(
        &self,
        _blob: &[u8],
        _delegates: &[Box<dyn Delegate>],
    ) -> Result<Box<dyn InferenceModel>, ModelError> {
        Ok(Box::new(FixedModel {
            rgb: self.rgb,
            runs: self.runs.clone(),
        }))
    }
}

fn coordinator(
    config: &WorkerConfig,
    runtime: &StubRuntime,
) -> (FrameCoordinator<Engine, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let c = FrameCoordinator::new(
        Engine::new(HeadlessProvider::default()),
        clock.clone(),
        UiState::default(),
        CoordinatorConfig::default(),
    )
    .with_inference(config, runtime);
    (c, clock)
}

fn step_until<F: Fn(&FrameCoordinator<Engine, ManualClock>) -> bool>(
    c: &mut FrameCoordinator<Engine, ManualClock>,
    clock: &ManualClock,
    done: F,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        clock.advance_secs(1.0 / 60.0);
        c.step(800, 600);
        if done(c) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn learned_colors_reach_the_renderer() {
    let path = write_model("learned.tflite", &MODEL_MAGIC);
    let runtime = StubRuntime::new([255, 0, 51], true);
    let (mut c, clock) = coordinator(&worker_config(path.clone()), &runtime);
    assert!(c.inference_available());

    let expected = ColorModifiers::from_output_bytes(&[255, 0, 51]).unwrap();
    assert!(step_until(&mut c, &clock, |c| c.color_modifiers() == expected));
    assert!(runtime.runs.load(Ordering::SeqCst) >= 1);

    c.toggle_ai();
    let fallback = c.color_modifiers();
    assert_eq!(fallback.saturation, FALLBACK_SATURATION);
    assert_eq!(fallback.value, FALLBACK_VALUE);

    c.dispose();
    let _ = fs::remove_file(&path);
}

#[test]
fn one_request_every_third_frame() {
    let path = write_model("cadence.tflite", &MODEL_MAGIC);
    let runtime = StubRuntime::new([10, 20, 30], true);
    let (mut c, clock) = coordinator(&worker_config(path.clone()), &runtime);

    for _ in 0..9 {
        clock.advance_secs(1.0 / 60.0);
        c.step(800, 600);
    }
    let stats = c.worker_stats().expect("worker present");
    assert_eq!(stats.submitted + stats.dropped, 3);
    assert!(stats.submitted >= 1);

    c.dispose();
    let stats = c.worker_stats().expect("worker present");
    assert_eq!(stats.completed + stats.failed, stats.submitted);
    let _ = fs::remove_file(&path);
}

#[test]
fn disabled_ai_never_requests() {
    let path = write_model("disabled.tflite", &MODEL_MAGIC);
    let runtime = StubRuntime::new([1, 2, 3], true);
    let (mut c, clock) = coordinator(&worker_config(path.clone()), &runtime);
    c.toggle_ai();

    for _ in 0..12 {
        clock.advance_secs(1.0 / 60.0);
        c.step(800, 600);
    }
    assert_eq!(c.worker_stats().expect("worker present").submitted, 0);
    c.dispose();
    assert_eq!(runtime.runs.load(Ordering::SeqCst), 0);
    let _ = fs::remove_file(&path);
}

#[test]
fn placeholder_model_falls_back_to_procedural() {
    let path = write_model("placeholder.tflite", b"PLACEHOLDER");
    let runtime = StubRuntime::new([255, 255, 255], true);
    let (mut c, clock) = coordinator(&worker_config(path.clone()), &runtime);
    assert!(!c.inference_available());

    for _ in 0..6 {
        clock.advance_secs(1.0 / 60.0);
        c.step(800, 600);
    }
    let colors = c.color_modifiers();
    assert_eq!(colors.saturation, FALLBACK_SATURATION);
    assert_eq!(colors.value, FALLBACK_VALUE);
    assert_eq!(runtime.runs.load(Ordering::SeqCst), 0);
    let _ = fs::remove_file(&path);
}

#[test]
fn missing_model_falls_back_to_procedural() {
    let path = unique_path("missing.tflite");
    let runtime = StubRuntime::new([255, 255, 255], true);
    let (mut c, clock) = coordinator(&worker_config(path), &runtime);
    assert!(!c.inference_available());
    clock.advance_secs(0.5);
    c.step(800, 600);
    assert_eq!(c.color_modifiers().saturation, FALLBACK_SATURATION);
}

#[test]
fn unavailable_delegates_still_run_on_cpu() {
    let path = write_model("cpu.tflite", &MODEL_MAGIC);
    let runtime = StubRuntime::new([0, 255, 0], false);
    let (mut c, clock) = coordinator(&worker_config(path.clone()), &runtime);
    assert!(c.inference_available());

    let expected = ColorModifiers::from_output_bytes(&[0, 255, 0]).unwrap();
    assert!(step_until(&mut c, &clock, |c| c.color_modifiers() == expected));
    c.dispose();
    let _ = fs::remove_file(&path);
}

#[test]
fn dispose_twice_is_harmless() {
    let path = write_model("dispose.tflite", &MODEL_MAGIC);
    let runtime = StubRuntime::new([9, 9, 9], true);
    let (mut c, clock) = coordinator(&worker_config(path.clone()), &runtime);
    for _ in 0..3 {
        clock.advance_secs(1.0 / 60.0);
        c.step(800, 600);
    }
    c.dispose();
    c.dispose();
    let runs_after_dispose = runtime.runs.load(Ordering::SeqCst);
    for _ in 0..6 {
        clock.advance_secs(1.0 / 60.0);
        c.step(800, 600);
    }
    assert_eq!(runtime.runs.load(Ordering::SeqCst), runs_after_dispose);
    let _ = fs::remove_file(&path);
}
