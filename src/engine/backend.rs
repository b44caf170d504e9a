use serde::{Deserialize, Serialize};
use tracing::{info, trace};

/// Compute backend family. `Vulkan` is preferred; `Gl` is the portable fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Vulkan,
    Gl,
}

/// One velocity-and-dye injection queued for the next solver update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEmitter {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: u32,
}

pub trait SimulationBackend: Send + std::fmt::Debug {
    fn kind(&self) -> BackendKind;
    fn resize(&mut self, width: u32, height: u32);
    fn add_touch_emitter(&mut self, emitter: &TouchEmitter);
    fn update_frame(&mut self, dt: f32, ai_strength: f32);
}

/// Creates backends on demand. Returns `None` when the requested family is unavailable.
pub trait BackendProvider: Send {
    fn create(&self, kind: BackendKind) -> Option<Box<dyn SimulationBackend>>;
}

/// Backend without a GPU: tracks dimensions and counts work.
#[derive(Debug)]
pub struct HeadlessBackend {
    kind: BackendKind,
    width: u32,
    height: u32,
    frames: u64,
    emitters: u64,
}

impl HeadlessBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            width: 0,
            height: 0,
            frames: 0,
            emitters: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn emitters(&self) -> u64 {
        self.emitters
    }
}

impl SimulationBackend for HeadlessBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn resize(&mut self, width: u32, height: u32) {
        info!(target: "engine::backend", kind = ?self.kind, width, height, "resize");
        self.width = width;
        self.height = height;
    }

    fn add_touch_emitter(&mut self, emitter: &TouchEmitter) {
        trace!(target: "engine::backend", x = emitter.x, y = emitter.y, "emitter");
        self.emitters += 1;
    }

    fn update_frame(&mut self, dt: f32, ai_strength: f32) {
        trace!(target: "engine::backend", dt, ai_strength, "frame");
        self.frames += 1;
    }
}

/// Provider for [`HeadlessBackend`]. `vulkan_available = false` mimics a device without
/// a Vulkan loader so the GL fallback path runs.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessProvider {
    pub vulkan_available: bool,
}

impl Default for HeadlessProvider {
    fn default() -> Self {
        Self {
            vulkan_available: true,
        }
    }
}

impl BackendProvider for HeadlessProvider {
    fn create(&self, kind: BackendKind) -> Option<Box<dyn SimulationBackend>> {
        match kind {
            BackendKind::Vulkan if !self.vulkan_available => None,
            kind => Some(Box::new(HeadlessBackend::new(kind))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_backend_counts_work() {
        let mut backend = HeadlessBackend::new(BackendKind::Gl);
        backend.resize(64, 32);
        backend.add_touch_emitter(&TouchEmitter {
            x: 1.0,
            y: 2.0,
            dx: 0.5,
            dy: -0.5,
            color: 0xff00_00ff,
        });
        backend.update_frame(1.0 / 60.0, 1.0);
        backend.update_frame(1.0 / 60.0, 1.0);
        assert_eq!(backend.kind(), BackendKind::Gl);
        assert_eq!(backend.size(), (64, 32));
        assert_eq!(backend.emitters(), 1);
        assert_eq!(backend.frames(), 2);
    }

    #[test]
    fn provider_without_vulkan_only_builds_gl() {
        let provider = HeadlessProvider {
            vulkan_available: false,
        };
        assert!(provider.create(BackendKind::Vulkan).is_none());
        let gl = provider.create(BackendKind::Gl).expect("gl backend");
        assert_eq!(gl.kind(), BackendKind::Gl);
        assert!(HeadlessProvider::default().create(BackendKind::Vulkan).is_some());
    }
}
