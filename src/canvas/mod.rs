//! Recording surface: lifecycle, drawing calls and submission.

pub mod compiler;

pub use compiler::{CompiledPicture, DecodingCompiler, HeapProfile, IrCompiler, Submission};

use crate::foundation::core::{Point, Rect, Size};
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::assembler::{Assembler, AssemblerRef, AssemblerStats, borrow_assembler};
use crate::heap::binder::{ExternalImage, ExternalPicture, HeapObjectBinder};
use crate::heap::matrix::Matrix4x4;
use crate::heap::paint::Paint;
use crate::heap::path::Path;
use crate::heap::rrect::RRect;
use crate::heap::sampling::SamplingOptions;
use crate::ir::constants::{BlendMode, ClipOp};
use crate::ir::disasm::disassemble;
use crate::ir::operand::MemOp;
use crate::ir::pool::MemoryResourceGroup;
use std::cell::RefMut;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasStatus {
    Recording,
    Finished,
    Disposed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasOpts {
    /// Ask the compiler for a heap allocation profile on submission.
    pub heap_profiling: bool,
}

pub type BreakpointCallback = Box<dyn FnMut()>;

/// Records drawing calls into an instruction stream.
///
/// A canvas starts `Recording`, is sealed by [`Canvas::finish`] and handed to a rasterizer once
/// through [`Canvas::submit`]. Heap objects created against it ([`Paint::new`], [`Path::new`],
/// ...) may only be used with this canvas.
pub struct Canvas {
    asm: AssemblerRef,
    opts: CanvasOpts,
    bounds: Size,
    binder: HeapObjectBinder,
    breakpoints: BTreeMap<u32, BreakpointCallback>,
    next_breakpoint: u32,
    save_count: usize,
    submitted: bool,
}

impl Canvas {
    pub fn new(group: &MemoryResourceGroup, width: f32, height: f32) -> VgirResult<Self> {
        Self::with_opts(group, width, height, CanvasOpts::default())
    }

    pub fn with_opts(
        group: &MemoryResourceGroup,
        width: f32,
        height: f32,
        opts: CanvasOpts,
    ) -> VgirResult<Self> {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(VgirError::argument(format!(
                "canvas bounds must be finite and non-negative, got {width}x{height}"
            )));
        }
        let asm = Assembler::new_shared(group)?;
        borrow_assembler(&asm)?
            .emitter()?
            .emit_draw_bounds(width, height)?;
        Ok(Self {
            asm,
            opts,
            bounds: Size::new(f64::from(width), f64::from(height)),
            binder: HeapObjectBinder::default(),
            breakpoints: BTreeMap::new(),
            next_breakpoint: 0,
            save_count: 1,
            submitted: false,
        })
    }

    pub(crate) fn assembler(&self) -> &AssemblerRef {
        &self.asm
    }

    pub fn opts(&self) -> &CanvasOpts {
        &self.opts
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn status(&self) -> CanvasStatus {
        match self.asm.try_borrow() {
            Ok(asm) => asm.status(),
            // Held mutably only while an instruction is being recorded.
            Err(_) => CanvasStatus::Recording,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }

    pub fn binder(&self) -> &HeapObjectBinder {
        &self.binder
    }

    pub fn assembler_stats(&self) -> VgirResult<AssemblerStats> {
        Ok(borrow_assembler(&self.asm)?.stats())
    }

    /// Current count of a tracked heap handle; `0` once freed or if never tracked.
    pub fn ref_count(&self, op: MemOp) -> VgirResult<u32> {
        Ok(borrow_assembler(&self.asm)?.ref_count(op))
    }

    pub fn buffer_count(&self) -> VgirResult<usize> {
        Ok(borrow_assembler(&self.asm)?.writer().buffer_count())
    }

    fn ensure_finished(asm: &Assembler) -> VgirResult<()> {
        match asm.status() {
            CanvasStatus::Finished => Ok(()),
            other => Err(VgirError::invalid_state(format!(
                "canvas is {other:?}, expected Finished"
            ))),
        }
    }

    // ---- lifecycle ----

    /// Seals the stream with `CommandPoolEnd`. A no-op once finished or disposed.
    pub fn finish(&mut self) -> VgirResult<()> {
        let mut asm = borrow_assembler(&self.asm)?;
        if asm.status() != CanvasStatus::Recording {
            return Ok(());
        }
        asm.raw_emitter().emit_command_pool_end()?;
        asm.set_status(CanvasStatus::Finished);
        tracing::debug!(
            buffers = asm.writer().buffer_count(),
            switches = asm.writer().switch_count(),
            "canvas finished"
        );
        Ok(())
    }

    /// Finishes if needed and hands the buffers back to the pool. A second call is a no-op.
    pub fn dispose(&mut self) -> VgirResult<()> {
        let mut asm = borrow_assembler(&self.asm)?;
        let finished = match asm.status() {
            CanvasStatus::Disposed => return Ok(()),
            CanvasStatus::Recording => asm.raw_emitter().emit_command_pool_end(),
            CanvasStatus::Finished => Ok(()),
        };
        let released = asm.writer_mut().dispose();
        asm.set_status(CanvasStatus::Disposed);
        self.breakpoints.clear();
        finished.and(released)
    }

    /// Hands the finished program to `compiler`. Allowed once per canvas.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn submit<C: IrCompiler>(&mut self, compiler: &mut C) -> VgirResult<C::Artifact> {
        let asm = self
            .asm
            .try_borrow()
            .map_err(|_| VgirError::invalid_state("assembler is already in use by a re-entrant call"))?;
        Self::ensure_finished(&asm)?;
        if self.submitted {
            return Err(VgirError::invalid_state("canvas was already submitted"));
        }
        self.submitted = true;
        let submission = Submission {
            buffers: asm.writer().buffers(),
            binder: &self.binder,
            heap_profiling: self.opts.heap_profiling,
            breakpoints: &mut self.breakpoints,
        };
        compiler.compile(submission)
    }

    /// Text listing of the finished program.
    pub fn disassemble(&self) -> VgirResult<String> {
        self.with_buffers(disassemble)?
    }

    /// Runs `f` over the finished instruction buffers.
    pub fn with_buffers<R>(&self, f: impl FnOnce(&[&[u8]]) -> R) -> VgirResult<R> {
        let asm = borrow_assembler(&self.asm)?;
        Self::ensure_finished(&asm)?;
        let buffers = asm.writer().buffers();
        Ok(f(&buffers[..]))
    }

    // ---- state stack ----

    /// Pushes matrix and clip; returns the save count before the push.
    pub fn save(&mut self) -> VgirResult<usize> {
        recording(&self.asm)?.emitter()?.emit_save()?;
        let prev = self.save_count;
        self.save_count += 1;
        Ok(prev)
    }

    /// Pops one save. Restoring with nothing saved does nothing.
    pub fn restore(&mut self) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        if self.save_count <= 1 {
            tracing::debug!("restore without a matching save ignored");
            return Ok(());
        }
        asm.emitter()?.emit_restore()?;
        self.save_count -= 1;
        Ok(())
    }

    /// Pops saves until the save count is `count` (at least 1).
    pub fn restore_to_count(&mut self, count: usize) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let target = count.max(1);
        while self.save_count > target {
            asm.emitter()?.emit_restore()?;
            self.save_count -= 1;
        }
        Ok(())
    }

    // ---- transform ----

    pub fn translate(&mut self, dx: f32, dy: f32) -> VgirResult<()> {
        recording(&self.asm)?.emitter()?.emit_translate(dx, dy)
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> VgirResult<()> {
        recording(&self.asm)?.emitter()?.emit_scale(sx, sy)
    }

    /// Rotates by `degrees`, around `pivot` when given.
    pub fn rotate(&mut self, degrees: f32, pivot: Option<Point>) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        match pivot {
            Some(p) => asm
                .emitter()?
                .emit_rotate2(degrees, p.x as f32, p.y as f32),
            None => asm.emitter()?.emit_rotate(degrees),
        }
    }

    pub fn skew(&mut self, sx: f32, sy: f32) -> VgirResult<()> {
        recording(&self.asm)?.emitter()?.emit_skew(sx, sy)
    }

    pub fn concat(&mut self, matrix: &Matrix4x4) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        matrix.handle().check_owner(&asm)?;
        asm.emitter()?.emit_concat(matrix.mem_op())
    }

    pub fn reset_matrix(&mut self) -> VgirResult<()> {
        recording(&self.asm)?.emitter()?.emit_reset_matrix()
    }

    pub fn set_matrix(&mut self, matrix: &Matrix4x4) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        matrix.handle().check_owner(&asm)?;
        asm.emitter()?.emit_set_matrix(matrix.mem_op())
    }

    // ---- clip ----

    pub fn clip_rect(&mut self, rect: Rect, op: ClipOp, aa: bool) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let r = asm.allocate_local_rect(rect)?;
        asm.emitter()?.emit_clip_rect(r, op, aa)?;
        asm.free_local(r)
    }

    pub fn clip_rrect(&mut self, rrect: &RRect, op: ClipOp, aa: bool) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        rrect.handle().check_owner(&asm)?;
        asm.emitter()?.emit_clip_rrect(rrect.mem_op(), op, aa)
    }

    pub fn clip_path(&mut self, path: &Path, op: ClipOp, aa: bool) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        path.handle().check_owner(&asm)?;
        asm.emitter()?.emit_clip_path(path.mem_op(), op, aa)
    }

    // ---- draw ----

    pub fn draw_color(&mut self, color: u32, mode: BlendMode) -> VgirResult<()> {
        recording(&self.asm)?.emitter()?.emit_draw_color(color, mode)
    }

    /// Replaces every pixel in the clip with `color`.
    pub fn clear(&mut self, color: u32) -> VgirResult<()> {
        recording(&self.asm)?.emitter()?.emit_clear(color)
    }

    pub fn draw_paint(&mut self, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, Some(paint))?;
        asm.emitter()?.emit_draw_paint(p)
    }

    pub fn draw_line(&mut self, p0: Point, p1: Point, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, Some(paint))?;
        asm.emitter()?
            .emit_draw_line(p0.x as f32, p0.y as f32, p1.x as f32, p1.y as f32, p)
    }

    pub fn draw_rect(&mut self, rect: Rect, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, Some(paint))?;
        let r = asm.allocate_local_rect(rect)?;
        asm.emitter()?.emit_draw_rect(r, p)?;
        asm.free_local(r)
    }

    pub fn draw_oval(&mut self, oval: Rect, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, Some(paint))?;
        let r = asm.allocate_local_rect(oval)?;
        asm.emitter()?.emit_draw_oval(r, p)?;
        asm.free_local(r)
    }

    pub fn draw_rrect(&mut self, rrect: &RRect, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        rrect.handle().check_owner(&asm)?;
        let p = paint_op(&asm, Some(paint))?;
        asm.emitter()?.emit_draw_rrect(rrect.mem_op(), p)
    }

    /// Fills the area between `outer` and `inner`.
    pub fn draw_drrect(&mut self, outer: &RRect, inner: &RRect, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        outer.handle().check_owner(&asm)?;
        inner.handle().check_owner(&asm)?;
        let p = paint_op(&asm, Some(paint))?;
        asm.emitter()?
            .emit_draw_drrect(outer.mem_op(), inner.mem_op(), p)
    }

    pub fn draw_circle(&mut self, center: Point, radius: f32, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, Some(paint))?;
        asm.emitter()?
            .emit_draw_circle(center.x as f32, center.y as f32, radius, p)
    }

    pub fn draw_arc(
        &mut self,
        oval: Rect,
        start_angle: f32,
        sweep_angle: f32,
        use_center: bool,
        paint: &Paint,
    ) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, Some(paint))?;
        let r = asm.allocate_local_rect(oval)?;
        asm.emitter()?
            .emit_draw_arc(r, start_angle, sweep_angle, use_center, p)?;
        asm.free_local(r)
    }

    pub fn draw_path(&mut self, path: &Path, paint: &Paint) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        path.handle().check_owner(&asm)?;
        let p = paint_op(&asm, Some(paint))?;
        asm.emitter()?.emit_draw_path(path.mem_op(), p)
    }

    /// Replays an external picture, optionally transformed and through a paint.
    pub fn draw_picture(
        &mut self,
        picture: &ExternalPicture,
        matrix: Option<&Matrix4x4>,
        paint: Option<&Paint>,
    ) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let m = match matrix {
            Some(m) => {
                m.handle().check_owner(&asm)?;
                m.mem_op()
            }
            None => MemOp::NULL,
        };
        let p = paint_op(&asm, paint)?;
        let binder = &mut self.binder;
        let pic = asm.allocate_local_without_ref(|op, _| {
            binder.bind_picture(op, *picture);
            Ok(())
        })?;
        asm.emitter()?.emit_draw_picture(pic, m, p)?;
        asm.free_local(pic)
    }

    pub fn draw_image(
        &mut self,
        image: &ExternalImage,
        left: f32,
        top: f32,
        sampling: &SamplingOptions,
        paint: Option<&Paint>,
    ) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, paint)?;
        let s = sampling.associate(&mut *asm)?;
        let binder = &mut self.binder;
        let img = asm.allocate_local_without_ref(|op, _| {
            binder.bind_image(op, *image);
            Ok(())
        })?;
        asm.emitter()?.emit_draw_image(img, left, top, s, p)?;
        asm.free_local(img)
    }

    /// Draws the `src` part of `image` (the whole image when `None`) into `dst`.
    pub fn draw_image_rect(
        &mut self,
        image: &ExternalImage,
        src: Option<Rect>,
        dst: Rect,
        sampling: &SamplingOptions,
        paint: Option<&Paint>,
        fast_constraint: bool,
    ) -> VgirResult<()> {
        let mut asm = recording(&self.asm)?;
        let p = paint_op(&asm, paint)?;
        let s = sampling.associate(&mut *asm)?;
        let binder = &mut self.binder;
        let img = asm.allocate_local_without_ref(|op, _| {
            binder.bind_image(op, *image);
            Ok(())
        })?;
        let src = asm.allocate_local_rect(src.unwrap_or_else(|| image.bounds()))?;
        let dst = asm.allocate_local_rect(dst)?;
        asm.emitter()?
            .emit_draw_image_rect(img, src, dst, s, p, fast_constraint)?;
        asm.free_locals(&[img, src, dst])
    }

    /// Emits a breakpoint; the compiler calls `callback` when it reaches it.
    pub fn insert_debug_breakpoint(&mut self, callback: impl FnMut() + 'static) -> VgirResult<u32> {
        let mut asm = recording(&self.asm)?;
        let id = self.next_breakpoint;
        asm.emitter()?.emit_debug_breakpoint(id)?;
        self.next_breakpoint = id
            .checked_add(1)
            .ok_or_else(|| VgirError::assembler("breakpoint ids exhausted"))?;
        self.breakpoints.insert(id, Box::new(callback));
        Ok(id)
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            tracing::warn!(error = %e, "failed to dispose canvas");
        }
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("bounds", &self.bounds)
            .field("status", &self.status())
            .field("save_count", &self.save_count)
            .field("breakpoints", &self.breakpoints.len())
            .field("submitted", &self.submitted)
            .finish()
    }
}

fn recording(asm: &AssemblerRef) -> VgirResult<RefMut<'_, Assembler>> {
    let asm = borrow_assembler(asm)?;
    asm.ensure_recording()?;
    Ok(asm)
}

fn paint_op(asm: &Assembler, paint: Option<&Paint>) -> VgirResult<MemOp> {
    match paint {
        Some(p) => {
            p.handle().check_owner(asm)?;
            Ok(p.mem_op())
        }
        None => Ok(MemOp::NULL),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/canvas.rs"]
mod tests;
