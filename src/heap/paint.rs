use crate::canvas::Canvas;
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::assembler::{Assembler, AssemblerRef, MemOpType};
use crate::heap::filter::{ColorFilter, ImageFilter, MaskFilter, PathEffect};
use crate::heap::object::{OwnedHandle, RefCounted, associate_opt};
use crate::heap::shader::{Blender, Shader};
use crate::ir::constants::{BlendMode, PaintCap, PaintJoin};
use crate::ir::operand::MemOp;

/// Paint on the rasterizer heap. Effect setters take `None` to clear the slot.
#[derive(Debug)]
pub struct Paint {
    handle: OwnedHandle,
}

impl Paint {
    pub fn new(canvas: &Canvas) -> VgirResult<Self> {
        Self::create(canvas.assembler())
    }

    pub(crate) fn create(owner: &AssemblerRef) -> VgirResult<Self> {
        let handle = OwnedHandle::create(owner, MemOpType::Paint, |op, asm| {
            asm.emitter()?.emit_heap_create_paint(op)
        })?;
        Ok(Self { handle })
    }

    pub fn mem_op(&self) -> MemOp {
        self.handle.mem_op()
    }

    pub(crate) fn handle(&self) -> &OwnedHandle {
        &self.handle
    }

    pub fn reset(&self) -> VgirResult<()> {
        self.handle.asm()?.emitter()?.emit_paint_reset(self.mem_op())
    }

    pub fn set_antialias(&self, aa: bool) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_antialias(self.mem_op(), aa)
    }

    pub fn set_dither(&self, dither: bool) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_dither(self.mem_op(), dither)
    }

    /// `true` strokes, `false` fills.
    pub fn set_style_stroke(&self, stroke: bool) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_style_stroke(self.mem_op(), stroke)
    }

    /// Packed `0xAARRGGBB`.
    pub fn set_color(&self, color: u32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_color(self.mem_op(), color)
    }

    pub fn set_color_argb(&self, a: u8, r: u8, g: u8, b: u8) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_color_argb(self.mem_op(), a, r, g, b)
    }

    /// Clamped to `[0, 1]`; NaN is rejected.
    pub fn set_alpha(&self, alpha: f32) -> VgirResult<()> {
        if alpha.is_nan() {
            return Err(VgirError::argument("paint alpha must not be NaN"));
        }
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_alphaf(self.mem_op(), alpha.clamp(0.0, 1.0))
    }

    pub fn set_stroke_width(&self, width: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_stroke_width(self.mem_op(), width)
    }

    pub fn set_stroke_miter(&self, miter: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_stroke_miter(self.mem_op(), miter)
    }

    pub fn set_stroke_cap(&self, cap: PaintCap) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_stroke_cap(self.mem_op(), cap)
    }

    pub fn set_stroke_join(&self, join: PaintJoin) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_stroke_join(self.mem_op(), join)
    }

    pub fn set_blend_mode(&self, mode: BlendMode) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_paint_set_blend_mode(self.mem_op(), mode)
    }

    fn set_effect<T>(
        &self,
        obj: Option<&T>,
        associate: impl FnOnce(&T, &mut Assembler) -> VgirResult<MemOp>,
        emit: impl FnOnce(&mut Assembler, MemOp, MemOp) -> VgirResult<()>,
    ) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let eff = associate_opt(obj, &mut *asm, associate)?;
        emit(&mut *asm, self.mem_op(), eff)
    }

    pub fn set_shader(&self, shader: Option<&Shader>) -> VgirResult<()> {
        self.set_effect(shader, Shader::associate, |asm, p, s| {
            asm.emitter()?.emit_paint_set_shader(p, s)
        })
    }

    pub fn set_blender(&self, blender: Option<&Blender>) -> VgirResult<()> {
        self.set_effect(blender, Blender::associate, |asm, p, b| {
            asm.emitter()?.emit_paint_set_blender(p, b)
        })
    }

    pub fn set_color_filter(&self, filter: Option<&ColorFilter>) -> VgirResult<()> {
        self.set_effect(filter, ColorFilter::associate, |asm, p, f| {
            asm.emitter()?.emit_paint_set_color_filter(p, f)
        })
    }

    pub fn set_image_filter(&self, filter: Option<&ImageFilter>) -> VgirResult<()> {
        self.set_effect(filter, ImageFilter::associate, |asm, p, f| {
            asm.emitter()?.emit_paint_set_image_filter(p, f)
        })
    }

    pub fn set_path_effect(&self, effect: Option<&PathEffect>) -> VgirResult<()> {
        self.set_effect(effect, PathEffect::associate, |asm, p, e| {
            asm.emitter()?.emit_paint_set_path_effect(p, e)
        })
    }

    pub fn set_mask_filter(&self, filter: Option<&MaskFilter>) -> VgirResult<()> {
        self.set_effect(filter, MaskFilter::associate, |asm, p, f| {
            asm.emitter()?.emit_paint_set_mask_filter(p, f)
        })
    }
}

impl RefCounted for Paint {
    fn add_ref(&self) -> VgirResult<()> {
        self.handle.add_ref()
    }

    fn unref(&self) -> VgirResult<()> {
        self.handle.unref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/heap/paint.rs"]
mod tests;
