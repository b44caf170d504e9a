//! Learned effect pass: model asset loading, the inference runtime seam, and the
//! dedicated single-job worker.

pub mod model;
pub mod runtime;
pub mod worker;

use std::path::PathBuf;

use thiserror::Error;

pub use model::{MODEL_MAGIC, TensorShape, has_model_magic, load_model_blob};
pub use runtime::{Delegate, DelegateKind, InferenceModel, ModelRuntime, NoRuntime};
pub use worker::{InferenceCallbacks, InferenceWorker, RequestOutcome, WorkerConfig, WorkerStats};

/// Reasons a model could not be brought up. All of them degrade to "no model loaded".
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model asset {} not found", .path.display())]
    Missing { path: PathBuf },
    #[error("failed to read model asset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model asset {} is a placeholder (missing TFL3 header)", .path.display())]
    Placeholder { path: PathBuf },
    #[error("no inference runtime available")]
    RuntimeUnavailable,
    #[error("runtime rejected model: {0}")]
    Rejected(String),
    #[error("{0:?} delegate unavailable")]
    DelegateUnavailable(DelegateKind),
}

/// Failure of a single inference run. The job is abandoned and the worker returns to idle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("input buffer holds {actual} bytes, model expects {expected}")]
    InputSize { expected: usize, actual: usize },
    #[error("output buffer holds {actual} bytes, model expects {expected}")]
    OutputSize { expected: usize, actual: usize },
    #[error("inference run failed: {0}")]
    Run(String),
}
