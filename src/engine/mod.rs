//! Binding to the external fluid solver.
//!
//! The solver itself is opaque: the core only issues lifecycle and per-frame commands
//! through [`EngineBinding`] and never inspects solver state.

pub mod backend;
pub mod binding;

use std::str::FromStr;

use thiserror::Error;

pub use backend::{
    BackendKind, BackendProvider, HeadlessBackend, HeadlessProvider, SimulationBackend,
    TouchEmitter,
};
pub use binding::Engine;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown engine parameter `{0}`")]
    UnknownParameter(String),
}

/// Named solver parameters settable at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parameter {
    AiStrength,
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Parameter::AiStrength => "aiStrength",
        }
    }
}

impl FromStr for Parameter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aiStrength" => Ok(Parameter::AiStrength),
            other => Err(EngineError::UnknownParameter(other.to_string())),
        }
    }
}

/// Capability boundary to the solver. Every call before a successful `initialize`, and
/// every call after `release`, is a silent no-op.
pub trait EngineBinding: Send {
    /// Only the first call has effect. Returns whether this call performed initialization.
    fn initialize(&self, width: u32, height: u32, backend: BackendKind) -> bool;
    fn touch(&self, x: f32, y: f32, dx: f32, dy: f32, color: u32);
    fn step(&self, dt: f32);
    fn set_parameter(&self, param: Parameter, value: f32);
    fn release(&self);
    fn is_initialized(&self) -> bool;
}
