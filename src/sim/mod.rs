//! Frame coordination: lifecycle, frame cadence, and the externally visible settings.

pub mod clock;
pub mod coordinator;
pub mod state;

pub use clock::{FrameClock, ManualClock, MonotonicClock};
pub use coordinator::{CoordinatorConfig, FrameCoordinator, LifecycleState, NOMINAL_DT, RecordOutcome};
pub use state::{Style, UiState};
