use serde::{Deserialize, Serialize};

use super::{InferenceError, ModelError};

/// Optional hardware acceleration backend for inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelegateKind {
    Nnapi,
    Gpu,
}

/// Live acceleration delegate. Released on drop, after the model that uses it.
pub trait Delegate: Send + std::fmt::Debug {
    fn kind(&self) -> DelegateKind;
}

/// A loaded model. Runs only on the inference worker thread.
pub trait InferenceModel: Send {
    fn run(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError>;
}

/// External inference runtime.
pub trait ModelRuntime {
    fn name(&self) -> &str;

    fn create_delegate(&self, kind: DelegateKind) -> Result<Box<dyn Delegate>, ModelError>;

    /// Build a model from a validated blob, attaching whichever delegates were created.
    fn load(
        &self,
        blob: &[u8],
        delegates: &[Box<dyn Delegate>],
    ) -> Result<Box<dyn InferenceModel>, ModelError>;
}

/// Runtime used when no inference library is linked. Every load fails, so callers fall
/// back to procedural colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRuntime;

impl ModelRuntime for NoRuntime {
    fn name(&self) -> &str {
        "none"
    }

    fn create_delegate(&self, kind: DelegateKind) -> Result<Box<dyn Delegate>, ModelError> {
        Err(ModelError::DelegateUnavailable(kind))
    }

    fn load(
        &self,
        _blob: &[u8],
        _delegates: &[Box<dyn Delegate>],
    ) -> Result<Box<dyn InferenceModel>, ModelError> {
        Err(ModelError::RuntimeUnavailable)
    }
}
