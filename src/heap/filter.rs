use crate::foundation::core::{Rect, Vec2, Vec4};
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::assembler::Assembler;
use crate::heap::object::{associate_opt, stateless_object};
use crate::heap::sampling::SamplingOptions;
use crate::heap::shader::{Blender, Shader};
use crate::ir::constants::{BlendMode, BlurStyle, ColorChannel, TileMode};
use crate::ir::operand::MemOp;

stateless_object!(
    /// Immutable color filter.
    ColorFilter
);

stateless_object!(
    /// Immutable image filter. `None` inputs mean the source image; `None` crops mean unbounded.
    ImageFilter
);

stateless_object!(MaskFilter);

stateless_object!(PathEffect);

/// Number of coefficients in a color matrix (4 rows of 5).
pub const COLOR_MATRIX_LEN: usize = 20;

impl ColorFilter {
    pub fn blend_mode(color: u32, mode: BlendMode) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?
                .emit_heap_create_blend_mode_color_filter(key, color, mode)
        })
    }

    /// `outer(inner(color))`.
    pub fn compose(outer: &ColorFilter, inner: &ColorFilter) -> Self {
        let (outer, inner) = (outer.clone(), inner.clone());
        Self::from_factory(move |key, asm| {
            let o = outer.associate(asm)?;
            let i = inner.associate(asm)?;
            asm.emitter()?.emit_heap_create_compose_color_filter(key, o, i)
        })
    }

    /// Row-major 4x5 matrix applied to unpremultiplied RGBA.
    pub fn matrix(matrix: &[f32]) -> VgirResult<Self> {
        if matrix.len() != COLOR_MATRIX_LEN {
            return Err(VgirError::argument(format!(
                "color matrix needs {COLOR_MATRIX_LEN} values, got {}",
                matrix.len()
            )));
        }
        let matrix = matrix.to_vec();
        Ok(Self::from_factory(move |key, asm| {
            let m = asm.allocate_local_f32_array(&matrix)?;
            asm.emitter()?.emit_heap_create_matrix_color_filter(key, m)?;
            asm.free_local(m)
        }))
    }
}

fn input_op(input: &Option<ImageFilter>, asm: &mut Assembler) -> VgirResult<MemOp> {
    associate_opt(input.as_ref(), asm, ImageFilter::associate)
}

fn crop_op(crop: Option<Rect>, asm: &mut Assembler) -> VgirResult<MemOp> {
    match crop {
        Some(r) => asm.allocate_local_rect(r),
        None => Ok(MemOp::NULL),
    }
}

impl ImageFilter {
    pub fn blur(
        sigma_x: f32,
        sigma_y: f32,
        mode: TileMode,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let input = input.cloned();
        Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?
                .emit_heap_create_blur_image_filter(key, sigma_x, sigma_y, mode, i, c)?;
            asm.free_locals(&[c])
        })
    }

    fn shadow(
        only: bool,
        offset: Vec2,
        sigma: Vec2,
        color: u32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let input = input.cloned();
        let (dx, dy) = (offset.x as f32, offset.y as f32);
        let (sx, sy) = (sigma.x as f32, sigma.y as f32);
        Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let c = crop_op(crop, asm)?;
            let mut e = asm.emitter()?;
            if only {
                e.emit_heap_create_drop_shadow_only_image_filter(key, dx, dy, sx, sy, color, i, c)?;
            } else {
                e.emit_heap_create_drop_shadow_image_filter(key, dx, dy, sx, sy, color, i, c)?;
            }
            asm.free_locals(&[c])
        })
    }

    /// Shadow of the input drawn beneath the input.
    pub fn drop_shadow(
        offset: Vec2,
        sigma: Vec2,
        color: u32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        Self::shadow(false, offset, sigma, color, input, crop)
    }

    /// Shadow of the input alone.
    pub fn drop_shadow_only(
        offset: Vec2,
        sigma: Vec2,
        color: u32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        Self::shadow(true, offset, sigma, color, input, crop)
    }

    pub fn offset(dx: f32, dy: f32, input: Option<&ImageFilter>, crop: Option<Rect>) -> Self {
        let input = input.cloned();
        Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?
                .emit_heap_create_offset_image_filter(key, dx, dy, i, c)?;
            asm.free_locals(&[c])
        })
    }

    /// `outer(inner(source))`.
    pub fn compose(outer: &ImageFilter, inner: &ImageFilter) -> Self {
        let (outer, inner) = (outer.clone(), inner.clone());
        Self::from_factory(move |key, asm| {
            let o = outer.associate(asm)?;
            let i = inner.associate(asm)?;
            asm.emitter()?.emit_heap_create_compose_image_filter(key, o, i)
        })
    }

    fn morphology(
        dilate: bool,
        radius_x: f32,
        radius_y: f32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let input = input.cloned();
        Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let c = crop_op(crop, asm)?;
            let mut e = asm.emitter()?;
            if dilate {
                e.emit_heap_create_dilate_image_filter(key, radius_x, radius_y, i, c)?;
            } else {
                e.emit_heap_create_erode_image_filter(key, radius_x, radius_y, i, c)?;
            }
            asm.free_locals(&[c])
        })
    }

    pub fn dilate(
        radius_x: f32,
        radius_y: f32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        Self::morphology(true, radius_x, radius_y, input, crop)
    }

    pub fn erode(
        radius_x: f32,
        radius_y: f32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        Self::morphology(false, radius_x, radius_y, input, crop)
    }

    pub fn color_filter(
        cf: &ColorFilter,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let (cf, input) = (cf.clone(), input.cloned());
        Self::from_factory(move |key, asm| {
            let f = cf.associate(asm)?;
            let i = input_op(&input, asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?
                .emit_heap_create_color_filter_image_filter(key, f, i, c)?;
            asm.free_locals(&[c])
        })
    }

    pub fn shader(shader: &Shader, dither: bool, crop: Option<Rect>) -> Self {
        let shader = shader.clone();
        Self::from_factory(move |key, asm| {
            let s = shader.associate(asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?
                .emit_heap_create_shader_image_filter(key, s, dither, c)?;
            asm.free_locals(&[c])
        })
    }

    pub fn blend(
        blender: &Blender,
        background: Option<&ImageFilter>,
        foreground: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let (blender, bg, fg) = (blender.clone(), background.cloned(), foreground.cloned());
        Self::from_factory(move |key, asm| {
            let b = blender.associate(asm)?;
            let bg = input_op(&bg, asm)?;
            let fg = input_op(&fg, asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?
                .emit_heap_create_blend_image_filter(key, b, bg, fg, c)?;
            asm.free_locals(&[c])
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn arithmetic(
        k1: f32,
        k2: f32,
        k3: f32,
        k4: f32,
        enforce_pm_color: bool,
        background: Option<&ImageFilter>,
        foreground: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let (bg, fg) = (background.cloned(), foreground.cloned());
        Self::from_factory(move |key, asm| {
            let bg = input_op(&bg, asm)?;
            let fg = input_op(&fg, asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?.emit_heap_create_arithmetic_image_filter(
                key,
                k1,
                k2,
                k3,
                k4,
                enforce_pm_color,
                bg,
                fg,
                c,
            )?;
            asm.free_locals(&[c])
        })
    }

    pub fn magnifier(
        src_rect: Rect,
        inset: f32,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let input = input.cloned();
        Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let s = asm.allocate_local_rect(src_rect)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?
                .emit_heap_create_magnifier_image_filter(key, s, inset, i, c)?;
            asm.free_locals(&[s, c])
        })
    }

    /// Tiles the `src` region of the input across `dst`.
    pub fn tile(src: Rect, dst: Rect, input: Option<&ImageFilter>) -> Self {
        let input = input.cloned();
        Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let s = asm.allocate_local_rect(src)?;
            let d = asm.allocate_local_rect(dst)?;
            asm.emitter()?.emit_heap_create_tile_image_filter(key, s, d, i)?;
            asm.free_locals(&[s, d])
        })
    }

    pub fn displacement_map(
        x_selector: ColorChannel,
        y_selector: ColorChannel,
        scale: f32,
        displacement: Option<&ImageFilter>,
        color: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> Self {
        let (displacement, color) = (displacement.cloned(), color.cloned());
        Self::from_factory(move |key, asm| {
            let d = input_op(&displacement, asm)?;
            let col = input_op(&color, asm)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?.emit_heap_create_displacement_map_image_filter(
                key, x_selector, y_selector, scale, d, col, c,
            )?;
            asm.free_locals(&[c])
        })
    }

    /// `kernel` is row-major with `kernel_size.0 * kernel_size.1` entries.
    #[allow(clippy::too_many_arguments)]
    pub fn matrix_convolution(
        kernel_size: (u32, u32),
        kernel: &[f32],
        gain: f32,
        bias: f32,
        kernel_offset: (u32, u32),
        mode: TileMode,
        use_alpha: bool,
        input: Option<&ImageFilter>,
        crop: Option<Rect>,
    ) -> VgirResult<Self> {
        let (w, h) = kernel_size;
        let expected = u64::from(w) * u64::from(h);
        if expected == 0 || expected != kernel.len() as u64 {
            return Err(VgirError::argument(format!(
                "convolution kernel of size {w}x{h} needs {expected} values, got {}",
                kernel.len()
            )));
        }
        if kernel_offset.0 >= w || kernel_offset.1 >= h {
            return Err(VgirError::argument(format!(
                "kernel offset {kernel_offset:?} lies outside the {w}x{h} kernel"
            )));
        }
        let kernel = kernel.to_vec();
        let input = input.cloned();
        let size = Vec2::new(f64::from(w), f64::from(h));
        let offset = Vec2::new(f64::from(kernel_offset.0), f64::from(kernel_offset.1));
        Ok(Self::from_factory(move |key, asm| {
            let i = input_op(&input, asm)?;
            let size = asm.allocate_local_vec2(size)?;
            let k = asm.allocate_local_f32_array(&kernel)?;
            let offset = asm.allocate_local_vec2(offset)?;
            let c = crop_op(crop, asm)?;
            asm.emitter()?.emit_heap_create_matrix_convolution_image_filter(
                key, size, k, gain, bias, offset, mode, use_alpha, i, c,
            )?;
            asm.free_locals(&[size, k, offset, c])
        }))
    }

    /// `rows` is the transform in row-major order; it is captured by value.
    pub fn matrix_transform(
        rows: [Vec4; 4],
        sampling: &SamplingOptions,
        input: Option<&ImageFilter>,
    ) -> Self {
        let (sampling, input) = (sampling.clone(), input.cloned());
        Self::from_factory(move |key, asm| {
            let s = sampling.associate(asm)?;
            let i = input_op(&input, asm)?;
            let m = asm.allocate_local_without_ref(|m, asm| {
                asm.emitter()?.emit_heap_create_m44(m)?;
                let mut vs = [MemOp::NULL; 4];
                for (slot, r) in vs.iter_mut().zip(rows) {
                    *slot = asm.allocate_local_vec4(r)?;
                }
                let [r0, r1, r2, r3] = vs;
                asm.emitter()?.emit_m44_set_rows(m, r0, r1, r2, r3)?;
                asm.free_locals(&vs)
            })?;
            asm.emitter()?
                .emit_heap_create_matrix_transform_image_filter(key, m, s, i)?;
            asm.free_local(m)
        })
    }
}

impl MaskFilter {
    pub fn blur(style: BlurStyle, sigma: f32, respect_ctm: bool) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?
                .emit_heap_create_blur_mask_filter(key, style, sigma, respect_ctm)
        })
    }
}

impl PathEffect {
    /// On/off dash pattern; `intervals` alternates on and off lengths.
    pub fn dash(intervals: &[f32], phase: f32) -> VgirResult<Self> {
        if intervals.len() < 2 || intervals.len() % 2 != 0 {
            return Err(VgirError::argument(format!(
                "dash needs an even number (>= 2) of intervals, got {}",
                intervals.len()
            )));
        }
        let intervals = intervals.to_vec();
        Ok(Self::from_factory(move |key, asm| {
            let iv = asm.allocate_local_f32_array(&intervals)?;
            asm.emitter()?
                .emit_heap_create_dash_path_effect(key, iv, phase)?;
            asm.free_local(iv)
        }))
    }

    /// Rounds sharp corners with the given radius.
    pub fn corner(radius: f32) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?
                .emit_heap_create_corner_path_effect(key, radius)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/heap/filter.rs"]
mod tests;
