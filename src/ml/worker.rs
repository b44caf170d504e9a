use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::{debug, error, info, trace, warn};

use super::model::{TensorShape, load_model_blob};
use super::runtime::{Delegate, DelegateKind, InferenceModel, ModelRuntime};

/// Caller-supplied buffer handlers. Buffers are borrowed for the duration of each call only.
pub trait InferenceCallbacks: Send + 'static {
    fn provide_input(&mut self, hint: f32, input: &mut [u8]);
    fn consume_output(&mut self, output: &[u8]);
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub model_path: PathBuf,
    pub input: TensorShape,
    pub output: TensorShape,
    pub delegates: Vec<DelegateKind>,
    pub warmup: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("effects_unet_int8.tflite"),
            input: TensorShape {
                batch: 1,
                channels: 7,
                size: 256,
            },
            output: TensorShape {
                batch: 1,
                channels: 5,
                size: 256,
            },
            delegates: vec![DelegateKind::Nnapi, DelegateKind::Gpu],
            warmup: true,
        }
    }
}

/// What happened to a `request_inference` call. None of these are errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    Submitted,
    /// A job is already in flight; the request was dropped, not queued.
    Busy,
    NoModel,
    Disposed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub submitted: u64,
    pub dropped: u64,
    pub completed: u64,
    pub failed: u64,
}

enum WorkerMsg {
    Run { hint: f32 },
    Shutdown,
}

#[derive(Debug, Default)]
struct Shared {
    busy: AtomicBool,
    disposed: AtomicBool,
    submitted: AtomicU64,
    dropped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Runs at most one inference job at a time on a dedicated thread.
///
/// The worker owns the model, its delegates and both buffers. A request made while a job is
/// in flight is dropped, which bounds staleness to one skipped cycle instead of a backlog.
pub struct InferenceWorker {
    shared: Arc<Shared>,
    job_tx: Option<Sender<WorkerMsg>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl InferenceWorker {
    /// Load the model described by `config` and start the worker thread.
    ///
    /// Any load failure leaves a worker without a model: requests become no-ops.
    pub fn spawn<C: InferenceCallbacks>(
        config: &WorkerConfig,
        runtime: &dyn ModelRuntime,
        callbacks: C,
    ) -> Self {
        match load_model(config, runtime) {
            Some((model, delegates)) => Self::from_model(model, delegates, config, callbacks),
            None => Self::without_model(),
        }
    }

    /// Start a worker around an already-loaded model.
    pub fn from_model<C: InferenceCallbacks>(
        model: Box<dyn InferenceModel>,
        delegates: Vec<Box<dyn Delegate>>,
        config: &WorkerConfig,
        callbacks: C,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        let (job_tx, job_rx) = bounded::<WorkerMsg>(2);
        let buffers = Buffers {
            input: vec![0; config.input.bytes()],
            output: vec![0; config.output.bytes()],
        };
        let warmup = config.warmup;
        let shared_worker = shared.clone();

        let spawned = thread::Builder::new()
            .name("inference-worker".into())
            .spawn(move || {
                worker_loop(
                    model,
                    delegates,
                    callbacks,
                    buffers,
                    warmup,
                    job_rx,
                    shared_worker,
                )
            });

        match spawned {
            Ok(handle) => {
                info!(target: "inference", "inference worker started");
                Self {
                    shared,
                    job_tx: Some(job_tx),
                    handle: Mutex::new(Some(handle)),
                }
            }
            Err(err) => {
                warn!(target: "inference", %err, "failed to spawn inference worker; inference disabled");
                Self::without_model()
            }
        }
    }

    pub fn without_model() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            job_tx: None,
            handle: Mutex::new(None),
        }
    }

    pub fn has_model(&self) -> bool {
        self.job_tx.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            submitted: self.shared.submitted.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            completed: self.shared.completed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }

    /// Submit one provide → run → consume cycle. Never blocks.
    pub fn request_inference(&self, hint: f32) -> RequestOutcome {
        if self.is_disposed() {
            return RequestOutcome::Disposed;
        }
        let Some(job_tx) = &self.job_tx else {
            return RequestOutcome::NoModel;
        };
        if self
            .shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            trace!(target: "inference", "inference in flight; request dropped");
            return RequestOutcome::Busy;
        }

        match job_tx.try_send(WorkerMsg::Run { hint }) {
            Ok(()) => {
                self.shared.submitted.fetch_add(1, Ordering::Relaxed);
                RequestOutcome::Submitted
            }
            Err(TrySendError::Full(_)) => {
                self.shared.busy.store(false, Ordering::Release);
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                RequestOutcome::Busy
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.busy.store(false, Ordering::Release);
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(target: "inference", "inference worker is gone");
                RequestOutcome::Disposed
            }
        }
    }

    /// Stop accepting work and block until the worker thread has finished its current job
    /// and released the model and delegates.
    ///
    /// Idempotent. When called from the worker thread itself (inside a callback) the thread
    /// is detached instead of joined and exits once the callback returns.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(job_tx) = &self.job_tx {
            // Capacity 2 holds at most one pending run plus this message.
            let _ = job_tx.send(WorkerMsg::Shutdown);
        }

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            debug!(target: "inference", "dispose called from worker thread; detaching");
            return;
        }
        if handle.join().is_err() {
            error!(target: "inference", "inference worker panicked");
        }
        info!(target: "inference", "inference worker disposed");
    }
}

impl Drop for InferenceWorker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for InferenceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceWorker")
            .field("has_model", &self.has_model())
            .field("busy", &self.is_busy())
            .field("disposed", &self.is_disposed())
            .field("stats", &self.stats())
            .finish()
    }
}

struct Buffers {
    input: Vec<u8>,
    output: Vec<u8>,
}

fn load_model(
    config: &WorkerConfig,
    runtime: &dyn ModelRuntime,
) -> Option<(Box<dyn InferenceModel>, Vec<Box<dyn Delegate>>)> {
    let blob = match load_model_blob(&config.model_path) {
        Ok(blob) => blob,
        Err(err) => {
            warn!(target: "inference", %err, "model unavailable; using procedural colors");
            return None;
        }
    };

    let delegates: Vec<Box<dyn Delegate>> = config
        .delegates
        .iter()
        .filter_map(|&kind| match runtime.create_delegate(kind) {
            Ok(delegate) => Some(delegate),
            Err(err) => {
                warn!(target: "inference", %err, "skipping acceleration delegate");
                None
            }
        })
        .collect();
    if delegates.is_empty() {
        info!(target: "inference", runtime = runtime.name(), "no acceleration delegates; running on CPU");
    }

    match runtime.load(&blob, &delegates) {
        Ok(model) => {
            info!(
                target: "inference",
                runtime = runtime.name(),
                bytes = blob.len(),
                delegates = delegates.len(),
                "model loaded"
            );
            Some((model, delegates))
        }
        Err(err) => {
            warn!(target: "inference", %err, "model load failed; using procedural colors");
            None
        }
    }
}

fn worker_loop<C: InferenceCallbacks>(
    mut model: Box<dyn InferenceModel>,
    delegates: Vec<Box<dyn Delegate>>,
    mut callbacks: C,
    mut buffers: Buffers,
    warmup: bool,
    job_rx: Receiver<WorkerMsg>,
    shared: Arc<Shared>,
) {
    if warmup {
        match model.run(&buffers.input, &mut buffers.output) {
            Ok(()) => debug!(target: "inference", "warm-up run complete"),
            Err(err) => warn!(target: "inference", %err, "warm-up skipped"),
        }
        buffers.output.fill(0);
    }

    while let Ok(msg) = job_rx.recv() {
        let hint = match msg {
            WorkerMsg::Run { hint } => hint,
            WorkerMsg::Shutdown => break,
        };

        callbacks.provide_input(hint, &mut buffers.input);
        match model.run(&buffers.input, &mut buffers.output) {
            Ok(()) => {
                shared.completed.fetch_add(1, Ordering::Relaxed);
                callbacks.consume_output(&buffers.output);
            }
            Err(err) => {
                shared.failed.fetch_add(1, Ordering::Relaxed);
                warn!(target: "inference", %err, "inference job abandoned");
            }
        }
        shared.busy.store(false, Ordering::Release);
    }

    // Model first, then the delegates it was built on.
    drop(model);
    for delegate in &delegates {
        debug!(target: "inference", kind = ?delegate.kind(), "releasing delegate");
    }
    drop(delegates);
}
