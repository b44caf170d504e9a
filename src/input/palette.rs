use crate::sim::state::Style;

/// Round-robin counter period. A multiple of every palette length, so wrapping never
/// skips a color.
pub const PALETTE_PERIOD: u32 = 1024 - 1024 % 3;

/// Opaque ARGB color.
pub const fn argb(r: u8, g: u8, b: u8) -> u32 {
    0xff00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

const WARM: [u32; 3] = [argb(255, 64, 128), argb(255, 140, 0), argb(255, 215, 0)];
const COOL: [u32; 3] = [argb(0, 255, 255), argb(64, 128, 255), argb(180, 64, 255)];

pub fn palette(style: Style) -> &'static [u32] {
    match style {
        Style::Warm => &WARM,
        Style::Cool => &COOL,
    }
}
