//! Opcode table.
//!
//! One macro invocation declares every instruction: its number, its name and its operand
//! signature. From it come the [`Opcode`] enum, the signatures used by the reader and the
//! disassembler, and one `emit_*` method per opcode on [`Emitter`]. The size handed to
//! [`InstructionWriter::perform_possible_buffer_switching`](crate::ir::writer::InstructionWriter::perform_possible_buffer_switching) is summed from the same operand
//! types that get written, so the two cannot drift apart.

use crate::foundation::error::VgirResult;
use crate::ir::constants::{
    BlendMode, BlurStyle, ClipOp, ColorChannel, FilterMode, MipmapMode, PaintCap, PaintJoin,
    PathFillType, RegionOp, TileMode,
};
use crate::ir::emitter::Emitter;
use crate::ir::operand::{MemOp, Operand, OperandSpec};
use crate::ir::writer::OPCODE_BYTE_SIZE;

macro_rules! define_opcodes {
    ($( $code:literal => $name:ident, $emit:ident ( $($arg:ident : $ty:ty),* ); )*) => {
        /// Instruction opcode. The header word is `opcode | operand_count << 8`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Opcode {
            $( $name = $code, )*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];

            pub const fn from_u8(v: u8) -> Option<Self> {
                match v {
                    $( $code => Some(Self::$name), )*
                    _ => None,
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name), )*
                }
            }

            pub const fn operands(self) -> &'static [OperandSpec] {
                match self {
                    $(
                        Self::$name => {
                            const OPS: &[OperandSpec] = &[
                                $( OperandSpec { name: stringify!($arg), kind: <$ty as Operand>::KIND } ),*
                            ];
                            OPS
                        }
                    )*
                }
            }
        }

        // Region opcodes and the raw switch marker have no public canvas surface.
        #[allow(dead_code, clippy::too_many_arguments)]
        impl Emitter<'_> {
            $(
                pub(crate) fn $emit(&mut self, $($arg: $ty),*) -> VgirResult<()> {
                    const SIZE: usize = OPCODE_BYTE_SIZE $( + <$ty as Operand>::SIZE )*;
                    self.writer.perform_possible_buffer_switching(SIZE)?;
                    self.writer.write_u16(Opcode::$name.header())?;
                    $( $arg.write(self.writer)?; )*
                    Ok(())
                }
            )*
        }
    };
}

impl Opcode {
    pub const fn operand_count(self) -> usize {
        self.operands().len()
    }

    pub const fn header(self) -> u16 {
        (self as u16) | ((self.operand_count() as u16) << 8)
    }

    /// Encoded size of the whole instruction, header included.
    pub const fn encoded_size(self) -> usize {
        let ops = self.operands();
        let mut size = OPCODE_BYTE_SIZE;
        let mut i = 0;
        while i < ops.len() {
            size += ops[i].kind.size();
            i += 1;
        }
        size
    }
}

define_opcodes! {
    0x01 => SwitchNextBuffer, emit_switch_next_buffer();
    0x02 => CommandPoolEnd, emit_command_pool_end();
    0x03 => DrawBounds, emit_draw_bounds(width: f32, height: f32);
    0x04 => HeapClone, emit_heap_clone(from: MemOp, key: MemOp);
    0x05 => HeapFree, emit_heap_free(key: MemOp);
    0x06 => HeapCreateU32Array, emit_heap_create_u32_array(key: MemOp, size: u32);
    0x07 => HeapCreateF32Array, emit_heap_create_f32_array(key: MemOp, size: u32);
    0x08 => HeapU32ArrayStore, emit_heap_u32_array_store(array: MemOp, idx: u32, value: u32);
    0x09 => HeapF32ArrayStore, emit_heap_f32_array_store(array: MemOp, idx: u32, value: f32);
    0x0a => HeapCreateM44, emit_heap_create_m44(key: MemOp);
    0x0b => HeapCreatePaint, emit_heap_create_paint(key: MemOp);
    0x0c => HeapCreateSamplingOptions, emit_heap_create_sampling_options(key: MemOp, filter: FilterMode, mipmap: MipmapMode);
    0x0d => HeapCreateSamplingOptionsCubicMitchell, emit_heap_create_sampling_options_cubic_mitchell(key: MemOp);
    0x0e => HeapCreateSamplingOptionsCubicCatmullRom, emit_heap_create_sampling_options_cubic_catmull_rom(key: MemOp);
    0x0f => HeapCreatePath, emit_heap_create_path(key: MemOp);
    0x10 => HeapCreateVector2, emit_heap_create_vector2(key: MemOp, x: f32, y: f32);
    0x11 => HeapCreateVector3, emit_heap_create_vector3(key: MemOp, x: f32, y: f32, z: f32);
    0x12 => HeapCreateVector4, emit_heap_create_vector4(key: MemOp, x: f32, y: f32, z: f32, w: f32);
    0x13 => HeapCreateRect, emit_heap_create_rect(key: MemOp, x: f32, y: f32, w: f32, h: f32);
    0x14 => HeapCreateRegion, emit_heap_create_region(key: MemOp);
    0x15 => HeapCreateRegion2, emit_heap_create_region2(key: MemOp, rect: MemOp);
    0x16 => RegionOpRect, emit_region_op_rect(region: MemOp, op: RegionOp, rect: MemOp);
    0x17 => RegionOpRegion, emit_region_op_region(region: MemOp, op: RegionOp, rgn: MemOp);
    0x18 => HeapCreateEmptyShader, emit_heap_create_empty_shader(key: MemOp);
    0x19 => HeapCreateColorShader, emit_heap_create_color_shader(key: MemOp, color: u32);
    0x1a => HeapCreateBlendShader, emit_heap_create_blend_shader(key: MemOp, blender: MemOp, dst: MemOp, src: MemOp);
    0x1b => HeapCreateLinearGradientShader, emit_heap_create_linear_gradient_shader(key: MemOp, start: MemOp, end: MemOp, colors: MemOp, pos: MemOp, mode: TileMode);
    0x1c => HeapCreateRadialGradientShader, emit_heap_create_radial_gradient_shader(key: MemOp, center: MemOp, radius: f32, colors: MemOp, pos: MemOp, mode: TileMode);
    0x1d => HeapCreateTwoPointConicalGradientShader, emit_heap_create_two_point_conical_gradient_shader(key: MemOp, start: MemOp, start_radius: f32, end: MemOp, end_radius: f32, colors: MemOp, pos: MemOp, mode: TileMode);
    0x1e => HeapCreateSweepGradientShader, emit_heap_create_sweep_gradient_shader(key: MemOp, cx: f32, cy: f32, colors: MemOp, pos: MemOp);
    0x1f => HeapCreatePerlinNoiseFractalNoiseShader, emit_heap_create_perlin_noise_fractal_noise_shader(key: MemOp, base_freq_x: f32, base_freq_y: f32, num_octaves: u32, seed: f32);
    0x20 => HeapCreatePerlinNoiseTurbulenceShader, emit_heap_create_perlin_noise_turbulence_shader(key: MemOp, base_freq_x: f32, base_freq_y: f32, num_octaves: u32, seed: f32);
    0x21 => HeapCreateModeBlender, emit_heap_create_mode_blender(key: MemOp, mode: BlendMode);
    0x22 => HeapCreateArithmeticBlender, emit_heap_create_arithmetic_blender(key: MemOp, k1: f32, k2: f32, k3: f32, k4: f32, enforce_premul: bool);
    0x23 => HeapCreateAlphaThresholdImageFilter, emit_heap_create_alpha_threshold_image_filter(key: MemOp, region: MemOp, inner_min: f32, outer_max: f32, input: MemOp, crop: MemOp);
    0x24 => HeapCreateArithmeticImageFilter, emit_heap_create_arithmetic_image_filter(key: MemOp, k1: f32, k2: f32, k3: f32, k4: f32, enforce_pm_color: bool, bg: MemOp, fg: MemOp, crop: MemOp);
    0x25 => HeapCreateBlendImageFilter, emit_heap_create_blend_image_filter(key: MemOp, blender: MemOp, bg: MemOp, fg: MemOp, crop: MemOp);
    0x26 => HeapCreateBlurImageFilter, emit_heap_create_blur_image_filter(key: MemOp, sigma_x: f32, sigma_y: f32, mode: TileMode, input: MemOp, crop: MemOp);
    0x27 => HeapCreateColorFilterImageFilter, emit_heap_create_color_filter_image_filter(key: MemOp, cf: MemOp, input: MemOp, crop: MemOp);
    0x28 => HeapCreateComposeImageFilter, emit_heap_create_compose_image_filter(key: MemOp, outer: MemOp, inner: MemOp);
    0x29 => HeapCreateDisplacementMapImageFilter, emit_heap_create_displacement_map_image_filter(key: MemOp, x_selector: ColorChannel, y_selector: ColorChannel, scale: f32, displacement: MemOp, color: MemOp, crop: MemOp);
    0x2a => HeapCreateDropShadowImageFilter, emit_heap_create_drop_shadow_image_filter(key: MemOp, dx: f32, dy: f32, sigma_x: f32, sigma_y: f32, color: u32, input: MemOp, crop: MemOp);
    0x2b => HeapCreateDropShadowOnlyImageFilter, emit_heap_create_drop_shadow_only_image_filter(key: MemOp, dx: f32, dy: f32, sigma_x: f32, sigma_y: f32, color: u32, input: MemOp, crop: MemOp);
    0x2c => HeapCreateMagnifierImageFilter, emit_heap_create_magnifier_image_filter(key: MemOp, src_rect: MemOp, inset: f32, input: MemOp, crop: MemOp);
    0x2d => HeapCreateMatrixConvolutionImageFilter, emit_heap_create_matrix_convolution_image_filter(key: MemOp, kernel_size: MemOp, kernel: MemOp, gain: f32, bias: f32, kernel_offset: MemOp, mode: TileMode, use_alpha: bool, input: MemOp, crop: MemOp);
    0x2e => HeapCreateMatrixTransformImageFilter, emit_heap_create_matrix_transform_image_filter(key: MemOp, matrix: MemOp, sampling: MemOp, input: MemOp);
    0x2f => HeapCreateOffsetImageFilter, emit_heap_create_offset_image_filter(key: MemOp, dx: f32, dy: f32, input: MemOp, crop: MemOp);
    0x30 => HeapCreateShaderImageFilter, emit_heap_create_shader_image_filter(key: MemOp, shader: MemOp, dither: bool, crop: MemOp);
    0x31 => HeapCreateTileImageFilter, emit_heap_create_tile_image_filter(key: MemOp, src: MemOp, dst: MemOp, input: MemOp);
    0x32 => HeapCreateDilateImageFilter, emit_heap_create_dilate_image_filter(key: MemOp, radius_x: f32, radius_y: f32, input: MemOp, crop: MemOp);
    0x33 => HeapCreateErodeImageFilter, emit_heap_create_erode_image_filter(key: MemOp, radius_x: f32, radius_y: f32, input: MemOp, crop: MemOp);
    0x34 => M44SetRows, emit_m44_set_rows(m: MemOp, r0: MemOp, r1: MemOp, r2: MemOp, r3: MemOp);
    0x35 => M44SetCols, emit_m44_set_cols(m: MemOp, c0: MemOp, c1: MemOp, c2: MemOp, c3: MemOp);
    0x36 => M44SetTranslate, emit_m44_set_translate(m: MemOp, x: f32, y: f32, z: f32);
    0x37 => M44SetScale, emit_m44_set_scale(m: MemOp, x: f32, y: f32, z: f32);
    0x38 => M44SetRectToRect, emit_m44_set_rect_to_rect(m: MemOp, src: MemOp, dst: MemOp);
    0x39 => M44SetLookAt, emit_m44_set_look_at(m: MemOp, eye: MemOp, center: MemOp, up: MemOp);
    0x3a => M44SetPerspective, emit_m44_set_perspective(m: MemOp, near: f32, far: f32, angle: f32);
    0x3b => M44SetIdentity, emit_m44_set_identity(m: MemOp);
    0x3c => M44Concat, emit_m44_concat(m: MemOp, other: MemOp);
    0x3d => PaintReset, emit_paint_reset(p: MemOp);
    0x3e => PaintSetAntialias, emit_paint_set_antialias(p: MemOp, aa: bool);
    0x3f => PaintSetDither, emit_paint_set_dither(p: MemOp, dither: bool);
    0x40 => PaintSetStyleStroke, emit_paint_set_style_stroke(p: MemOp, stroke: bool);
    0x41 => PaintSetColor, emit_paint_set_color(p: MemOp, color: u32);
    0x42 => PaintSetAlphaf, emit_paint_set_alphaf(p: MemOp, alpha: f32);
    0x43 => PaintSetColorARGB, emit_paint_set_color_argb(p: MemOp, a: u8, r: u8, g: u8, b: u8);
    0x44 => PaintSetStrokeWidth, emit_paint_set_stroke_width(p: MemOp, width: f32);
    0x45 => PaintSetStrokeMiter, emit_paint_set_stroke_miter(p: MemOp, miter: f32);
    0x46 => PaintSetStrokeCap, emit_paint_set_stroke_cap(p: MemOp, cap: PaintCap);
    0x47 => PaintSetStrokeJoin, emit_paint_set_stroke_join(p: MemOp, join: PaintJoin);
    0x48 => PaintSetShader, emit_paint_set_shader(p: MemOp, shader: MemOp);
    0x49 => PaintSetColorFilter, emit_paint_set_color_filter(p: MemOp, f: MemOp);
    0x4a => PaintSetBlendMode, emit_paint_set_blend_mode(p: MemOp, mode: BlendMode);
    0x4b => PaintSetBlender, emit_paint_set_blender(p: MemOp, blender: MemOp);
    0x4c => PaintSetPathEffect, emit_paint_set_path_effect(p: MemOp, effect: MemOp);
    0x4d => PaintSetMaskFilter, emit_paint_set_mask_filter(p: MemOp, filter: MemOp);
    0x4e => PaintSetImageFilter, emit_paint_set_image_filter(p: MemOp, filter: MemOp);
    0x4f => PathSetPathFillType, emit_path_set_path_fill_type(p: MemOp, fill_type: PathFillType);
    0x50 => PathToggleInverseFillType, emit_path_toggle_inverse_fill_type(p: MemOp);
    0x51 => PathReset, emit_path_reset(p: MemOp);
    0x52 => PathMoveTo, emit_path_move_to(p: MemOp, x: f32, y: f32);
    0x53 => PathRMoveTo, emit_path_r_move_to(p: MemOp, dx: f32, dy: f32);
    0x54 => PathLineTo, emit_path_line_to(p: MemOp, x: f32, y: f32);
    0x55 => PathRLineTo, emit_path_r_line_to(p: MemOp, dx: f32, dy: f32);
    0x56 => PathQuadTo, emit_path_quad_to(p: MemOp, x1: f32, y1: f32, x2: f32, y2: f32);
    0x57 => PathRQuadTo, emit_path_r_quad_to(p: MemOp, dx1: f32, dy1: f32, dx2: f32, dy2: f32);
    0x58 => PathConicTo, emit_path_conic_to(p: MemOp, x1: f32, y1: f32, x2: f32, y2: f32, w: f32);
    0x59 => PathRConicTo, emit_path_r_conic_to(p: MemOp, dx1: f32, dy1: f32, dx2: f32, dy2: f32, w: f32);
    0x5a => PathCubicTo, emit_path_cubic_to(p: MemOp, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32);
    0x5b => PathRCubicTo, emit_path_r_cubic_to(p: MemOp, dx1: f32, dy1: f32, dx2: f32, dy2: f32, dx3: f32, dy3: f32);
    0x5c => PathRectArcTo, emit_path_rect_arc_to(p: MemOp, oval: MemOp, start_angle: f32, sweep_angle: f32, force_move_to: bool);
    0x5d => PathTangentArcTo, emit_path_tangent_arc_to(p: MemOp, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32);
    0x5e => PathRotateArcTo, emit_path_rotate_arc_to(p: MemOp, rx: f32, ry: f32, x_axis_rotate: f32, large_arc: bool, ccw_sweep: bool, x: f32, y: f32);
    0x5f => PathRRotateArcTo, emit_path_r_rotate_arc_to(p: MemOp, rx: f32, ry: f32, x_axis_rotate: f32, large_arc: bool, ccw_sweep: bool, dx: f32, dy: f32);
    0x60 => PathClose, emit_path_close(p: MemOp);
    0x61 => PathAddRect, emit_path_add_rect(p: MemOp, rect: MemOp, ccw_dir: bool);
    0x62 => PathAddOval, emit_path_add_oval(p: MemOp, oval: MemOp, ccw_dir: bool);
    0x63 => PathAddCircle, emit_path_add_circle(p: MemOp, x: f32, y: f32, radius: f32, ccw_dir: bool);
    0x64 => PathAddArc, emit_path_add_arc(p: MemOp, oval: MemOp, start_angle: f32, sweep_angle: f32);
    0x65 => PathAddUniformRoundRect, emit_path_add_uniform_round_rect(p: MemOp, rect: MemOp, rx: f32, ry: f32, ccw_dir: bool);
    0x66 => PathAddRoundRect, emit_path_add_round_rect(p: MemOp, rect: MemOp, radii: MemOp, ccw_dir: bool);
    0x67 => PathAddPoly, emit_path_add_poly(p: MemOp, pts: MemOp, close: bool);
    0x68 => PathTransform, emit_path_transform(p: MemOp, mat: MemOp, dst: MemOp, apply_perspective_clip: bool);
    0x69 => Save, emit_save();
    0x6a => Restore, emit_restore();
    0x6b => SetMatrix, emit_set_matrix(matrix: MemOp);
    0x6c => Clear, emit_clear(color: u32);
    0x6d => DrawPaint, emit_draw_paint(p: MemOp);
    0x6e => DrawPath, emit_draw_path(path: MemOp, paint: MemOp);
    0x6f => DrawImage, emit_draw_image(image: MemOp, left: f32, top: f32, sampling: MemOp, paint: MemOp);
    0x70 => DrawImageRect, emit_draw_image_rect(image: MemOp, src: MemOp, dst: MemOp, sampling: MemOp, paint: MemOp, fast_constraint: bool);
    0x71 => Translate, emit_translate(dx: f32, dy: f32);
    0x72 => Scale, emit_scale(sx: f32, sy: f32);
    0x73 => Rotate, emit_rotate(degrees: f32);
    0x74 => Rotate2, emit_rotate2(degrees: f32, px: f32, py: f32);
    0x75 => Skew, emit_skew(sx: f32, sy: f32);
    0x76 => Concat, emit_concat(matrix: MemOp);
    0x77 => ResetMatrix, emit_reset_matrix();
    0x78 => ClipRect, emit_clip_rect(rect: MemOp, op: ClipOp, aa: bool);
    0x79 => ClipRRect, emit_clip_rrect(rrect: MemOp, op: ClipOp, aa: bool);
    0x7a => ClipPath, emit_clip_path(path: MemOp, op: ClipOp, aa: bool);
    0x7b => DrawColor, emit_draw_color(color: u32, mode: BlendMode);
    0x7c => DrawLine, emit_draw_line(x0: f32, y0: f32, x1: f32, y1: f32, paint: MemOp);
    0x7d => DrawRect, emit_draw_rect(rect: MemOp, paint: MemOp);
    0x7e => DrawOval, emit_draw_oval(oval: MemOp, paint: MemOp);
    0x7f => DrawRRect, emit_draw_rrect(rrect: MemOp, paint: MemOp);
    0x80 => DrawDRRect, emit_draw_drrect(outer: MemOp, inner: MemOp, paint: MemOp);
    0x81 => DrawCircle, emit_draw_circle(cx: f32, cy: f32, radius: f32, paint: MemOp);
    0x82 => DrawArc, emit_draw_arc(oval: MemOp, start_angle: f32, sweep_angle: f32, use_center: bool, paint: MemOp);
    0x83 => DrawPicture, emit_draw_picture(picture: MemOp, matrix: MemOp, paint: MemOp);
    0x84 => DebugBreakpoint, emit_debug_breakpoint(id: u32);
    0x85 => HeapCreateRRectEmpty, emit_heap_create_rrect_empty(key: MemOp);
    0x86 => RRectSetOval, emit_rrect_set_oval(rrect: MemOp, oval: MemOp);
    0x87 => RRectSetNinePatch, emit_rrect_set_nine_patch(rrect: MemOp, rect: MemOp, left_rad: f32, top_rad: f32, right_rad: f32, bottom_rad: f32);
    0x88 => RRectSetRectXY, emit_rrect_set_rect_xy(rrect: MemOp, rect: MemOp, x_rad: f32, y_rad: f32);
    0x89 => RRectInset, emit_rrect_inset(rrect: MemOp, dx: f32, dy: f32);
    0x8a => RRectOutset, emit_rrect_outset(rrect: MemOp, dx: f32, dy: f32);
    0x8b => RRectOffset, emit_rrect_offset(rrect: MemOp, dx: f32, dy: f32);
    0x8c => HeapCreateBlendModeColorFilter, emit_heap_create_blend_mode_color_filter(key: MemOp, color: u32, mode: BlendMode);
    0x8d => HeapCreateComposeColorFilter, emit_heap_create_compose_color_filter(key: MemOp, outer: MemOp, inner: MemOp);
    0x8e => HeapCreateMatrixColorFilter, emit_heap_create_matrix_color_filter(key: MemOp, matrix: MemOp);
    0x8f => HeapCreateBlurMaskFilter, emit_heap_create_blur_mask_filter(key: MemOp, style: BlurStyle, sigma: f32, respect_ctm: bool);
    0x90 => HeapCreateDashPathEffect, emit_heap_create_dash_path_effect(key: MemOp, intervals: MemOp, phase: f32);
    0x91 => HeapCreateCornerPathEffect, emit_heap_create_corner_path_effect(key: MemOp, radius: f32);
}

#[cfg(test)]
#[path = "../../tests/unit/ir/opcode.rs"]
mod tests;
