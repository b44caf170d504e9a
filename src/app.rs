use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::*;

use fluidsim::config::AppConfig;
use fluidsim::engine::{Engine, HeadlessProvider};
use fluidsim::input::{PointerEvent, PointerSample};
use fluidsim::ml::NoRuntime;
use fluidsim::sim::{FrameCoordinator, MonotonicClock};

/// Headless host: stands in for the display refresh callback and a finger on the screen.
pub struct App {
    coordinator: FrameCoordinator<Engine, MonotonicClock>,
    strokes: StrokeGenerator,
    width: i32,
    height: i32,
    frame_duration: Duration,
    frames: u64,
    exiting: Arc<AtomicBool>,
}

impl App {
    pub fn new(cfg: &AppConfig, stop_flag: Arc<AtomicBool>) -> Self {
        let engine = Engine::new(HeadlessProvider {
            vulkan_available: cfg.engine.vulkan_available,
        })
        .with_gl_fallback(cfg.engine.fallback_to_gl);

        let coordinator = FrameCoordinator::new(
            engine,
            MonotonicClock::new(),
            cfg.simulation.ui_state(),
            cfg.coordinator_config(),
        )
        .with_inference(&cfg.worker_config(), &NoRuntime);


        Self {
            coordinator,
            strokes: StrokeGenerator::new(cfg.host.width, cfg.host.height),
            width: cfg.host.width,
            height: cfg.host.height,
            frame_duration: frame_duration(cfg.host.target_fps),
            frames: cfg.host.frames,
            exiting: stop_flag,
        }
    }

    pub fn run(&mut self) {
        info!(
            target: "app",
            width = self.width,
            height = self.height,
            ai = self.coordinator.inference_available(),
            "starting frame loop"
        );

        let mut next_deadline = Instant::now();
        let mut last_report = Instant::now();
        let mut frame_idx: u64 = 0;

        loop {
            if self.exiting.load(Ordering::SeqCst) {
                info!(target: "app", "stop requested");
                break;
            }
            if self.frames > 0 && frame_idx >= self.frames {
                break;
            }
            next_deadline += self.frame_duration;

            for event in self.strokes.next_events() {
                self.coordinator.on_pointer_event(&event);
            }
            self.coordinator.step(self.width, self.height);
            frame_idx += 1;

            if last_report.elapsed() >= Duration::from_secs(1) {
                let colors = self.coordinator.color_modifiers();
                info!(
                    target: "app",
                    fps = self.coordinator.fps(),
                    frames = self.coordinator.frame_count(),
                    hue = colors.hue,
                    saturation = colors.saturation,
                    value = colors.value,
                    stats = ?self.coordinator.worker_stats(),
                );
                last_report = Instant::now();
            }

            let now = Instant::now();
            if now < next_deadline {
                thread::sleep(next_deadline - now);
            } else {
                next_deadline = now;
                trace!(target: "app", "frame overrun");
            }
        }
    }
}

const DEFAULT_FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Frame period for `target_fps`. Rates that give no representable period fall back to 60 Hz.
fn frame_duration(target_fps: f32) -> Duration {
    if target_fps.is_nan() || target_fps <= 0.0 {
        warn!(target: "app", target_fps, "invalid target_fps; using 60");
        return DEFAULT_FRAME;
    }
    match Duration::try_from_secs_f32(1.0 / target_fps) {
        Ok(period) => period,
        Err(err) => {
            warn!(target: "app", target_fps, %err, "target_fps out of range; using 60");
            DEFAULT_FRAME
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        info!(target: "app", "App drop. Finalizing..");
        self.coordinator.dispose();
    }
}

/// Synthetic strokes: a pointer circles the surface for a while, lifts, and comes back;
/// a second pointer joins now and then.
struct StrokeGenerator {
    rng: StdRng,
    width: f32,
    height: f32,
    angle: f32,
    remaining: u32,
    second_finger: bool,
}

impl StrokeGenerator {
    const PRIMARY: i32 = 0;
    const SECONDARY: i32 = 1;

    fn new(width: i32, height: i32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(0x5eed),
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            angle: 0.0,
            remaining: 0,
            second_finger: false,
        }
    }

    fn position(&self, angle: f32, radius: f32) -> (f32, f32) {
        (
            self.width * (0.5 + radius * angle.cos()),
            self.height * (0.5 + radius * angle.sin()),
        )
    }

    fn sample(&self, id: i32, angle: f32, radius: f32) -> PointerSample {
        let (x, y) = self.position(angle, radius);
        PointerSample { id, x, y }
    }

    fn next_events(&mut self) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        if self.remaining == 0 {
            if self.second_finger {
                events.push(PointerEvent::Up(Self::SECONDARY));
                self.second_finger = false;
            }
            events.push(PointerEvent::Up(Self::PRIMARY));
            self.remaining = self.rng.random_range(30..120);
            self.angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            events.push(PointerEvent::Down(self.sample(Self::PRIMARY, self.angle, 0.3)));
            if self.rng.random_bool(0.3) {
                self.second_finger = true;
                events.push(PointerEvent::Down(self.sample(
                    Self::SECONDARY,
                    -self.angle,
                    0.15,
                )));
            }
            return events;
        }

        self.remaining -= 1;
        self.angle += 0.05 + self.rng.random_range(-0.01..0.01);
        let mut batch = vec![self.sample(Self::PRIMARY, self.angle, 0.3)];
        if self.second_finger {
            batch.push(self.sample(Self::SECONDARY, -self.angle, 0.15));
        }
        events.push(PointerEvent::Move(batch));
        events
    }
}
