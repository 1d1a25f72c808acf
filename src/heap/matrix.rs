use crate::canvas::Canvas;
use crate::foundation::core::{Rect, Vec3, Vec4};
use crate::foundation::error::VgirResult;
use crate::heap::assembler::{AssemblerRef, MemOpType};
use crate::heap::object::{OwnedHandle, RefCounted};
use crate::ir::operand::MemOp;

/// 4x4 transform matrix living on the rasterizer heap. Starts as identity.
#[derive(Debug)]
pub struct Matrix4x4 {
    handle: OwnedHandle,
}

impl Matrix4x4 {
    pub fn new(canvas: &Canvas) -> VgirResult<Self> {
        Self::create(canvas.assembler())
    }

    pub(crate) fn create(owner: &AssemblerRef) -> VgirResult<Self> {
        let handle = OwnedHandle::create(owner, MemOpType::Matrix4x4, |op, asm| {
            asm.emitter()?.emit_heap_create_m44(op)
        })?;
        Ok(Self { handle })
    }

    pub fn mem_op(&self) -> MemOp {
        self.handle.mem_op()
    }

    pub(crate) fn handle(&self) -> &OwnedHandle {
        &self.handle
    }

    fn set_vectors(&self, vs: [Vec4; 4], cols: bool) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let m = self.mem_op();
        let mut ops = [MemOp::NULL; 4];
        for (slot, v) in ops.iter_mut().zip(vs) {
            *slot = asm.allocate_local_vec4(v)?;
        }
        let [a, b, c, d] = ops;
        if cols {
            asm.emitter()?.emit_m44_set_cols(m, a, b, c, d)?;
        } else {
            asm.emitter()?.emit_m44_set_rows(m, a, b, c, d)?;
        }
        asm.free_locals(&ops)
    }

    pub fn set_rows(&self, r0: Vec4, r1: Vec4, r2: Vec4, r3: Vec4) -> VgirResult<()> {
        self.set_vectors([r0, r1, r2, r3], false)
    }

    pub fn set_cols(&self, c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> VgirResult<()> {
        self.set_vectors([c0, c1, c2, c3], true)
    }

    pub fn set_translate(&self, x: f32, y: f32, z: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_m44_set_translate(self.mem_op(), x, y, z)
    }

    pub fn set_scale(&self, x: f32, y: f32, z: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_m44_set_scale(self.mem_op(), x, y, z)
    }

    pub fn set_rect_to_rect(&self, src: Rect, dst: Rect) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let s = asm.allocate_local_rect(src)?;
        let d = asm.allocate_local_rect(dst)?;
        asm.emitter()?.emit_m44_set_rect_to_rect(self.mem_op(), s, d)?;
        asm.free_locals(&[s, d])
    }

    pub fn set_look_at(&self, eye: Vec3, center: Vec3, up: Vec3) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let e = asm.allocate_local_vec3(eye)?;
        let c = asm.allocate_local_vec3(center)?;
        let u = asm.allocate_local_vec3(up)?;
        asm.emitter()?.emit_m44_set_look_at(self.mem_op(), e, c, u)?;
        asm.free_locals(&[e, c, u])
    }

    pub fn set_perspective(&self, near: f32, far: f32, angle: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_m44_set_perspective(self.mem_op(), near, far, angle)
    }

    pub fn set_identity(&self) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_m44_set_identity(self.mem_op())
    }

    /// `self = self * other`. Both matrices must belong to the same canvas.
    pub fn concat(&self, other: &Matrix4x4) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        other.handle.check_owner(&asm)?;
        asm.emitter()?.emit_m44_concat(self.mem_op(), other.mem_op())
    }
}

impl RefCounted for Matrix4x4 {
    fn add_ref(&self) -> VgirResult<()> {
        self.handle.add_ref()
    }

    fn unref(&self) -> VgirResult<()> {
        self.handle.unref()
    }
}
