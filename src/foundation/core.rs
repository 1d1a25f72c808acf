pub use kurbo::{Point, Rect, RoundedRect, RoundedRectRadii, Size, Vec2};

/// 3-component vector used for matrix look-at operands.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 4-component vector used for matrix row/column operands.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// Packs four channels into a 32-bit ARGB color.
///
/// Each channel is masked to its low 8 bits, not clamped.
pub fn color_argb(a: i32, r: i32, g: i32, b: i32) -> u32 {
    let ch = |v: i32| (v & 0xff) as u32;
    (ch(a) << 24) | (ch(r) << 16) | (ch(g) << 8) | ch(b)
}

/// Packs four normalized channels into a 32-bit ARGB color.
pub fn color_from_unorm(a: f32, r: f32, g: f32, b: f32) -> u32 {
    let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as i32;
    color_argb(ch(a), ch(r), ch(g), ch(b))
}

/// Rectangle as the `(x, y, width, height)` quadruple written into the instruction stream.
pub(crate) fn rect_xywh(rect: Rect) -> [f32; 4] {
    [
        rect.x0 as f32,
        rect.y0 as f32,
        rect.width() as f32,
        rect.height() as f32,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
