use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use super::backend::{BackendKind, BackendProvider, SimulationBackend, TouchEmitter};
use super::{EngineBinding, EngineError, Parameter};

/// Engine binding backed by a [`BackendProvider`].
///
/// Construction never fails. Without a provider (the native library could not be loaded)
/// the engine still accepts every call and does nothing.
pub struct Engine {
    initialized: AtomicBool,
    released: AtomicBool,
    controller: Mutex<SimulationController>,
}

impl Engine {
    pub fn new(provider: impl BackendProvider + 'static) -> Self {
        Self::with_provider(Some(Box::new(provider)))
    }

    pub fn unavailable() -> Self {
        warn!(target: "engine", "simulation backend library unavailable; engine calls are no-ops");
        Self::with_provider(None)
    }

    fn with_provider(provider: Option<Box<dyn BackendProvider>>) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            released: AtomicBool::new(false),
            controller: Mutex::new(SimulationController {
                provider,
                fallback_to_gl: true,
                backend: None,
                requested: BackendKind::default(),
                size: (0, 0),
                ai_strength: 1.0,
                emitters: Vec::new(),
                reported_missing: false,
            }),
        }
    }

    /// Allow GL when the requested backend cannot be created. On by default.
    pub fn with_gl_fallback(self, enabled: bool) -> Self {
        self.controller().fallback_to_gl = enabled;
        self
    }

    pub fn set_parameter_by_name(&self, name: &str, value: f32) -> Result<(), EngineError> {
        let param: Parameter = name.parse()?;
        self.set_parameter(param, value);
        Ok(())
    }

    /// Backend family actually in use, once one has been created.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.controller().backend.as_ref().map(|b| b.kind())
    }

    pub fn ai_strength(&self) -> f32 {
        self.controller().ai_strength
    }

    fn live(&self) -> bool {
        self.initialized.load(Ordering::Acquire) && !self.released.load(Ordering::Acquire)
    }

    fn controller(&self) -> MutexGuard<'_, SimulationController> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineBinding for Engine {
    fn initialize(&self, width: u32, height: u32, backend: BackendKind) -> bool {
        if self.released.load(Ordering::Acquire) {
            return false;
        }
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        info!(target: "engine", width, height, ?backend, "initialize");
        self.controller().initialize(width, height, backend);
        true
    }

    fn touch(&self, x: f32, y: f32, dx: f32, dy: f32, color: u32) {
        if !self.live() {
            return;
        }
        self.controller().emitters.push(TouchEmitter {
            x,
            y,
            dx,
            dy,
            color,
        });
    }

    fn step(&self, dt: f32) {
        if !self.live() {
            return;
        }
        self.controller().update(dt);
    }

    fn set_parameter(&self, param: Parameter, value: f32) {
        if !self.live() {
            return;
        }
        match param {
            Parameter::AiStrength => self.controller().ai_strength = value,
        }
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut controller = self.controller();
        controller.emitters.clear();
        if let Some(backend) = controller.backend.take() {
            debug!(target: "engine", kind = ?backend.kind(), "backend released");
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("initialized", &self.initialized)
            .field("released", &self.released)
            .finish()
    }
}

struct SimulationController {
    provider: Option<Box<dyn BackendProvider>>,
    fallback_to_gl: bool,
    backend: Option<Box<dyn SimulationBackend>>,
    requested: BackendKind,
    size: (u32, u32),
    ai_strength: f32,
    emitters: Vec<TouchEmitter>,
    reported_missing: bool,
}

impl SimulationController {
    fn initialize(&mut self, width: u32, height: u32, kind: BackendKind) {
        self.requested = kind;
        self.size = (width, height);
        self.ensure_backend();
    }

    fn update(&mut self, dt: f32) {
        if self.backend.is_none() {
            self.ensure_backend();
        }
        match self.backend.as_mut() {
            Some(backend) => {
                for emitter in self.emitters.drain(..) {
                    backend.add_touch_emitter(&emitter);
                }
                backend.update_frame(dt, self.ai_strength);
            }
            None => self.emitters.clear(),
        }
    }

    fn ensure_backend(&mut self) {
        if self.backend.is_some() {
            return;
        }
        let Some(provider) = self.provider.as_ref() else {
            return;
        };

        self.backend = provider.create(self.requested);
        if self.backend.is_none() && self.requested != BackendKind::Gl && self.fallback_to_gl {
            warn!(target: "engine", requested = ?self.requested, "falling back to GL backend");
            self.backend = provider.create(BackendKind::Gl);
        }
        match self.backend.as_mut() {
            // A backend created after a failed `initialize` still needs the surface size.
            Some(backend) => backend.resize(self.size.0, self.size.1),
            None if !self.reported_missing => {
                error!(target: "engine", "unable to create any simulation backend");
                self.reported_missing = true;
            }
            None => {}
        }
    }
}
