use std::collections::HashMap;

use tracing::trace;

use super::palette::{PALETTE_PERIOD, palette};
use crate::sim::state::Style;

pub type PointerId = i32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    Down(PointerSample),
    /// Batched move: every pointer currently reported by the platform.
    Move(Vec<PointerSample>),
    Up(PointerId),
    Cancel(PointerId),
}

/// Velocity-and-color command for the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impulse {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: u32,
}

/// Turns raw pointer events into impulses. Confined to the input thread.
#[derive(Debug, Default)]
pub struct TouchAggregator {
    pointers: HashMap<PointerId, (f32, f32)>,
    seed: u32,
}

impl TouchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one event, calling `emit` for every impulse. Returns the number emitted.
    pub fn handle<F: FnMut(Impulse)>(
        &mut self,
        event: &PointerEvent,
        style: Style,
        mut emit: F,
    ) -> usize {
        match event {
            PointerEvent::Down(p) => {
                self.pointers.insert(p.id, (p.x, p.y));
                emit(self.impulse(p.x, p.y, 0.0, 0.0, style));
                1
            }
            PointerEvent::Move(batch) => {
                for p in batch {
                    // Unknown pointer: zero delta, then start tracking it.
                    let (dx, dy) = match self.pointers.insert(p.id, (p.x, p.y)) {
                        Some((last_x, last_y)) => (p.x - last_x, p.y - last_y),
                        None => {
                            trace!(target: "touch", id = p.id, "move for untracked pointer");
                            (0.0, 0.0)
                        }
                    };
                    emit(self.impulse(p.x, p.y, dx, dy, style));
                }
                batch.len()
            }
            PointerEvent::Up(id) | PointerEvent::Cancel(id) => {
                self.pointers.remove(id);
                0
            }
        }
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn last_position(&self, id: PointerId) -> Option<(f32, f32)> {
        self.pointers.get(&id).copied()
    }

    fn impulse(&mut self, x: f32, y: f32, dx: f32, dy: f32, style: Style) -> Impulse {
        let colors = palette(style);
        let color = colors[self.seed as usize % colors.len()];
        self.seed = (self.seed + 1) % PALETTE_PERIOD;
        Impulse {
            x,
            y,
            dx,
            dy,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::palette::argb;

    fn sample(id: PointerId, x: f32, y: f32) -> PointerSample {
        PointerSample { id, x, y }
    }

    fn collect(agg: &mut TouchAggregator, event: PointerEvent, style: Style) -> Vec<Impulse> {
        let mut out = Vec::new();
        let n = agg.handle(&event, style, |i| out.push(i));
        assert_eq!(n, out.len());
        out
    }

    #[test]
    fn down_emits_zero_velocity() {
        let mut agg = TouchAggregator::new();
        let out = collect(&mut agg, PointerEvent::Down(sample(0, 10.0, 20.0)), Style::Warm);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].dx, out[0].dy), (0.0, 0.0));
        assert_eq!(agg.last_position(0), Some((10.0, 20.0)));
    }

    #[test]
    fn move_batch_emits_one_impulse_per_pointer() {
        let mut agg = TouchAggregator::new();
        collect(&mut agg, PointerEvent::Down(sample(0, 0.0, 0.0)), Style::Warm);
        collect(&mut agg, PointerEvent::Down(sample(1, 100.0, 100.0)), Style::Warm);

        let out = collect(
            &mut agg,
            PointerEvent::Move(vec![sample(0, 3.0, 4.0), sample(1, 90.0, 105.0)]),
            Style::Warm,
        );
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].dx, out[0].dy), (3.0, 4.0));
        assert_eq!((out[1].dx, out[1].dy), (-10.0, 5.0));
        assert_eq!(agg.last_position(1), Some((90.0, 105.0)));
    }

    #[test]
    fn untracked_move_has_zero_delta() {
        let mut agg = TouchAggregator::new();
        let out = collect(&mut agg, PointerEvent::Move(vec![sample(7, 5.0, 5.0)]), Style::Cool);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].dx, out[0].dy), (0.0, 0.0));

        let out = collect(&mut agg, PointerEvent::Move(vec![sample(7, 6.0, 8.0)]), Style::Cool);
        assert_eq!((out[0].dx, out[0].dy), (1.0, 3.0));
    }

    #[test]
    fn up_and_cancel_forget_pointer_silently() {
        let mut agg = TouchAggregator::new();
        collect(&mut agg, PointerEvent::Down(sample(0, 1.0, 1.0)), Style::Warm);
        collect(&mut agg, PointerEvent::Down(sample(1, 2.0, 2.0)), Style::Warm);
        assert!(collect(&mut agg, PointerEvent::Up(0), Style::Warm).is_empty());
        assert!(collect(&mut agg, PointerEvent::Cancel(1), Style::Warm).is_empty());
        assert_eq!(agg.active_pointers(), 0);

        let out = collect(&mut agg, PointerEvent::Move(vec![sample(0, 9.0, 9.0)]), Style::Warm);
        assert_eq!((out[0].dx, out[0].dy), (0.0, 0.0));
    }

    #[test]
    fn colors_rotate_through_style_palette() {
        let mut agg = TouchAggregator::new();
        let colors: Vec<u32> = (0..4)
            .map(|i| collect(&mut agg, PointerEvent::Down(sample(i, 0.0, 0.0)), Style::Cool)[0].color)
            .collect();
        assert_eq!(
            colors,
            vec![
                argb(0, 255, 255),
                argb(64, 128, 255),
                argb(180, 64, 255),
                argb(0, 255, 255)
            ]
        );

        // The rotation index is shared across styles.
        let warm = collect(&mut agg, PointerEvent::Down(sample(9, 0.0, 0.0)), Style::Warm)[0].color;
        assert_eq!(warm, argb(255, 140, 0));
    }

    #[test]
    fn rotation_survives_wrap() {
        let mut agg = TouchAggregator::new();
        let mut last = None;
        for _ in 0..(PALETTE_PERIOD + 5) {
            let c = collect(&mut agg, PointerEvent::Down(sample(0, 0.0, 0.0)), Style::Warm)[0].color;
            if let Some(prev) = last {
                assert_ne!(prev, c);
            }
            last = Some(c);
        }
    }
}
