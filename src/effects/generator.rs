use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::trace;

use super::{ColorModifiers, procedural};
use crate::ml::InferenceCallbacks;

/// Resolves the modifiers the renderer should use on the next draw.
///
/// Learned results arrive over a channel from the inference worker and replace the
/// current value wholesale; the procedural pattern covers every frame without one.
#[derive(Debug)]
pub struct EffectGenerator {
    results_rx: Receiver<ColorModifiers>,
    learned: Option<ColorModifiers>,
    display_time: f32,
}

/// Worker-side half of the effect channel: fills model input and publishes decoded output.
#[derive(Debug, Clone)]
pub struct ColorBridge {
    results_tx: Sender<ColorModifiers>,
}

impl EffectGenerator {
    pub fn channel() -> (Self, ColorBridge) {
        let (results_tx, results_rx) = bounded(4);
        (
            Self {
                results_rx,
                learned: None,
                display_time: 0.0,
            },
            ColorBridge { results_tx },
        )
    }

    pub fn advance(&mut self, dt: f32) {
        self.display_time += dt;
    }

    /// Pull newest result (drain to latest).
    pub fn drain(&mut self) {
        while let Ok(m) = self.results_rx.try_recv() {
            self.learned = Some(m);
        }
    }

    pub fn current(&self, ai_enabled: bool) -> ColorModifiers {
        match self.learned {
            Some(m) if ai_enabled => m,
            _ => procedural::generate(self.display_time),
        }
    }

    pub fn learned(&self) -> Option<ColorModifiers> {
        self.learned
    }

    pub fn display_time(&self) -> f32 {
        self.display_time
    }
}

impl InferenceCallbacks for ColorBridge {
    fn provide_input(&mut self, hint: f32, input: &mut [u8]) {
        // No GPU readback yet: zeroed input keeps inference deterministic.
        input.fill(0);
        trace!(target: "inference", hint, bytes = input.len(), "input provided");
    }

    fn consume_output(&mut self, output: &[u8]) {
        let Some(m) = ColorModifiers::from_output_bytes(output) else {
            return;
        };
        match self.results_tx.try_send(m) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => trace!(target: "inference", "effect result dropped"),
        }
    }
}
