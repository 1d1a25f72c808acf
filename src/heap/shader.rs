use crate::foundation::core::Point;
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::assembler::Assembler;
use crate::heap::object::stateless_object;
use crate::ir::constants::{BlendMode, TileMode};
use crate::ir::operand::MemOp;

stateless_object!(
    /// Immutable shader. Gradients and blends capture their inputs by value.
    Shader
);

stateless_object!(
    /// Immutable blender used by paints and blend filters.
    Blender
);

/// Gradient stops validated once at construction.
#[derive(Clone, Debug)]
struct GradientStops {
    colors: Vec<u32>,
    pos: Option<Vec<f32>>,
}

impl GradientStops {
    fn new(colors: &[u32], pos: Option<&[f32]>) -> VgirResult<Self> {
        if colors.is_empty() {
            return Err(VgirError::argument("gradient needs at least one color"));
        }
        if let Some(pos) = pos
            && pos.len() != colors.len()
        {
            return Err(VgirError::argument(format!(
                "gradient has {} colors but {} positions",
                colors.len(),
                pos.len()
            )));
        }
        Ok(Self {
            colors: colors.to_vec(),
            pos: pos.map(<[f32]>::to_vec),
        })
    }

    /// Emits the color and position arrays; the caller frees both.
    fn allocate(&self, asm: &mut Assembler) -> VgirResult<(MemOp, MemOp)> {
        let colors = asm.allocate_local_u32_array(&self.colors)?;
        let pos = match &self.pos {
            Some(p) => asm.allocate_local_f32_array(p)?,
            None => MemOp::NULL,
        };
        Ok((colors, pos))
    }
}

impl Shader {
    pub fn empty() -> Self {
        Self::from_factory(|key, asm| asm.emitter()?.emit_heap_create_empty_shader(key))
    }

    pub fn color(color: u32) -> Self {
        Self::from_factory(move |key, asm| asm.emitter()?.emit_heap_create_color_shader(key, color))
    }

    pub fn blend(blender: &Blender, dst: &Shader, src: &Shader) -> Self {
        let (blender, dst, src) = (blender.clone(), dst.clone(), src.clone());
        Self::from_factory(move |key, asm| {
            let b = blender.associate(asm)?;
            let d = dst.associate(asm)?;
            let s = src.associate(asm)?;
            asm.emitter()?.emit_heap_create_blend_shader(key, b, d, s)
        })
    }

    pub fn linear_gradient(
        start: Point,
        end: Point,
        colors: &[u32],
        pos: Option<&[f32]>,
        mode: TileMode,
    ) -> VgirResult<Self> {
        let stops = GradientStops::new(colors, pos)?;
        Ok(Self::from_factory(move |key, asm| {
            let s = asm.allocate_local_vec2(start.to_vec2())?;
            let e = asm.allocate_local_vec2(end.to_vec2())?;
            let (colors, pos) = stops.allocate(asm)?;
            asm.emitter()?
                .emit_heap_create_linear_gradient_shader(key, s, e, colors, pos, mode)?;
            asm.free_locals(&[s, e, colors, pos])
        }))
    }

    pub fn radial_gradient(
        center: Point,
        radius: f32,
        colors: &[u32],
        pos: Option<&[f32]>,
        mode: TileMode,
    ) -> VgirResult<Self> {
        let stops = GradientStops::new(colors, pos)?;
        Ok(Self::from_factory(move |key, asm| {
            let c = asm.allocate_local_vec2(center.to_vec2())?;
            let (colors, pos) = stops.allocate(asm)?;
            asm.emitter()?
                .emit_heap_create_radial_gradient_shader(key, c, radius, colors, pos, mode)?;
            asm.free_locals(&[c, colors, pos])
        }))
    }

    pub fn two_point_conical_gradient(
        start: Point,
        start_radius: f32,
        end: Point,
        end_radius: f32,
        colors: &[u32],
        pos: Option<&[f32]>,
        mode: TileMode,
    ) -> VgirResult<Self> {
        let stops = GradientStops::new(colors, pos)?;
        Ok(Self::from_factory(move |key, asm| {
            let s = asm.allocate_local_vec2(start.to_vec2())?;
            let e = asm.allocate_local_vec2(end.to_vec2())?;
            let (colors, pos) = stops.allocate(asm)?;
            asm.emitter()?.emit_heap_create_two_point_conical_gradient_shader(
                key,
                s,
                start_radius,
                e,
                end_radius,
                colors,
                pos,
                mode,
            )?;
            asm.free_locals(&[s, e, colors, pos])
        }))
    }

    pub fn sweep_gradient(
        cx: f32,
        cy: f32,
        colors: &[u32],
        pos: Option<&[f32]>,
    ) -> VgirResult<Self> {
        let stops = GradientStops::new(colors, pos)?;
        Ok(Self::from_factory(move |key, asm| {
            let (colors, pos) = stops.allocate(asm)?;
            asm.emitter()?
                .emit_heap_create_sweep_gradient_shader(key, cx, cy, colors, pos)?;
            asm.free_locals(&[colors, pos])
        }))
    }

    pub fn fractal_noise(base_freq_x: f32, base_freq_y: f32, num_octaves: u32, seed: f32) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?.emit_heap_create_perlin_noise_fractal_noise_shader(
                key,
                base_freq_x,
                base_freq_y,
                num_octaves,
                seed,
            )
        })
    }

    pub fn turbulence(base_freq_x: f32, base_freq_y: f32, num_octaves: u32, seed: f32) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?.emit_heap_create_perlin_noise_turbulence_shader(
                key,
                base_freq_x,
                base_freq_y,
                num_octaves,
                seed,
            )
        })
    }
}

impl Blender {
    pub fn mode(mode: BlendMode) -> Self {
        Self::from_factory(move |key, asm| asm.emitter()?.emit_heap_create_mode_blender(key, mode))
    }

    /// `k1 * src * dst + k2 * src + k3 * dst + k4`.
    pub fn arithmetic(k1: f32, k2: f32, k3: f32, k4: f32, enforce_premul: bool) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?
                .emit_heap_create_arithmetic_blender(key, k1, k2, k3, k4, enforce_premul)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/heap/shader.rs"]
mod tests;
