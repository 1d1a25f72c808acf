use crate::canvas::Canvas;
use crate::foundation::core::Rect;
use crate::foundation::error::VgirResult;
use crate::heap::assembler::{AssemblerRef, MemOpType};
use crate::heap::object::{OwnedHandle, RefCounted};
use crate::ir::operand::MemOp;

/// Rounded rectangle on the rasterizer heap. Starts empty.
#[derive(Debug)]
pub struct RRect {
    handle: OwnedHandle,
}

impl RRect {
    pub fn new(canvas: &Canvas) -> VgirResult<Self> {
        Self::create(canvas.assembler())
    }

    pub(crate) fn create(owner: &AssemblerRef) -> VgirResult<Self> {
        let handle = OwnedHandle::create(owner, MemOpType::RRect, |op, asm| {
            asm.emitter()?.emit_heap_create_rrect_empty(op)
        })?;
        Ok(Self { handle })
    }

    pub fn mem_op(&self) -> MemOp {
        self.handle.mem_op()
    }

    pub(crate) fn handle(&self) -> &OwnedHandle {
        &self.handle
    }

    pub fn set_oval(&self, oval: Rect) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(oval)?;
        asm.emitter()?.emit_rrect_set_oval(self.mem_op(), r)?;
        asm.free_local(r)
    }

    pub fn set_nine_patch(
        &self,
        rect: Rect,
        left_rad: f32,
        top_rad: f32,
        right_rad: f32,
        bottom_rad: f32,
    ) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(rect)?;
        asm.emitter()?.emit_rrect_set_nine_patch(
            self.mem_op(),
            r,
            left_rad,
            top_rad,
            right_rad,
            bottom_rad,
        )?;
        asm.free_local(r)
    }

    pub fn set_rect_xy(&self, rect: Rect, x_rad: f32, y_rad: f32) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(rect)?;
        asm.emitter()?
            .emit_rrect_set_rect_xy(self.mem_op(), r, x_rad, y_rad)?;
        asm.free_local(r)
    }

    pub fn inset(&self, dx: f32, dy: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_rrect_inset(self.mem_op(), dx, dy)
    }

    pub fn outset(&self, dx: f32, dy: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_rrect_outset(self.mem_op(), dx, dy)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_rrect_offset(self.mem_op(), dx, dy)
    }
}

impl RefCounted for RRect {
    fn add_ref(&self) -> VgirResult<()> {
        self.handle.add_ref()
    }

    fn unref(&self) -> VgirResult<()> {
        self.handle.unref()
    }
}
