//! Multi-pointer touch handling.

pub mod palette;
pub mod touch;

pub use palette::{PALETTE_PERIOD, argb, palette};
pub use touch::{Impulse, PointerEvent, PointerId, PointerSample, TouchAggregator};
