use crate::canvas::CanvasStatus;
use crate::foundation::core::{Rect, Vec2, Vec3, Vec4, rect_xywh};
use crate::foundation::error::{VgirError, VgirResult};
use crate::ir::emitter::Emitter;
use crate::ir::operand::MemOp;
use crate::ir::pool::MemoryResourceGroup;
use crate::ir::writer::InstructionWriter;
use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Heap type tag of a handle. Assigned by the factory that created the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemOpType {
    U32Array,
    F32Array,
    Matrix4x4,
    Vector2,
    Vector3,
    Vector4,
    Rect,
    RRect,
    Region,
    Paint,
    Path,
    SamplingOptions,
    Shader,
    Blender,
    ColorFilter,
    ImageFilter,
    MaskFilter,
    PathEffect,
    Image,
    Picture,
}

impl MemOpType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::U32Array => "u32array",
            Self::F32Array => "f32array",
            Self::Matrix4x4 => "mat4x4",
            Self::Vector2 => "vec2",
            Self::Vector3 => "vec3",
            Self::Vector4 => "vec4",
            Self::Rect => "rect",
            Self::RRect => "rrect",
            Self::Region => "region",
            Self::Paint => "paint",
            Self::Path => "path",
            Self::SamplingOptions => "samplingoptions",
            Self::Shader => "shader",
            Self::Blender => "blender",
            Self::ColorFilter => "colorfilter",
            Self::ImageFilter => "imagefilter",
            Self::MaskFilter => "maskfilter",
            Self::PathEffect => "patheffect",
            Self::Image => "image",
            Self::Picture => "picture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedMemOp {
    pub op: MemOp,
    pub ty: MemOpType,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Handles currently tracked by the ref-count table.
    pub live_handles: usize,
    /// Handles issued so far, tracked or local.
    pub allocated: u64,
    /// `HeapFree` instructions emitted so far.
    pub freed: u64,
}

pub(crate) type AssemblerRef = Rc<RefCell<Assembler>>;

pub(crate) fn borrow_assembler(asm: &AssemblerRef) -> VgirResult<RefMut<'_, Assembler>> {
    asm.try_borrow_mut()
        .map_err(|_| VgirError::invalid_state("assembler is already in use by a re-entrant call"))
}

/// Bytecode assembler for one canvas session.
///
/// Owns the instruction writer, the handle counter and the ref-count table. Tracked handles are
/// created with a count of one; the `HeapFree` for a handle is emitted exactly when its count
/// drops back to zero. Local handles are untracked and freed by the caller right after use.
pub(crate) struct Assembler {
    writer: InstructionWriter,
    ref_counts: HashMap<MemOp, u32>,
    next_memop: u32,
    status: CanvasStatus,
    stats: AssemblerStats,
    self_ref: Weak<RefCell<Assembler>>,
}

impl Assembler {
    pub(crate) fn new_shared(group: &MemoryResourceGroup) -> VgirResult<AssemblerRef> {
        let writer = InstructionWriter::new(group)?;
        Ok(Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                writer,
                ref_counts: HashMap::new(),
                next_memop: 0,
                status: CanvasStatus::Recording,
                stats: AssemblerStats::default(),
                self_ref: weak.clone(),
            })
        }))
    }

    pub(crate) fn status(&self) -> CanvasStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: CanvasStatus) {
        self.status = status;
    }

    pub(crate) fn ensure_recording(&self) -> VgirResult<()> {
        match self.status {
            CanvasStatus::Recording => Ok(()),
            other => Err(VgirError::invalid_state(format!(
                "canvas is {other:?}, expected Recording"
            ))),
        }
    }

    /// Emitter over this assembler's writer. Fails once the session stopped recording.
    pub(crate) fn emitter(&mut self) -> VgirResult<Emitter<'_>> {
        self.ensure_recording()?;
        Ok(Emitter::new(&mut self.writer))
    }

    /// Emitter usable while finishing, when the status is about to change.
    pub(crate) fn raw_emitter(&mut self) -> Emitter<'_> {
        Emitter::new(&mut self.writer)
    }

    pub(crate) fn writer(&self) -> &InstructionWriter {
        &self.writer
    }

    pub(crate) fn writer_mut(&mut self) -> &mut InstructionWriter {
        &mut self.writer
    }

    pub(crate) fn stats(&self) -> AssemblerStats {
        AssemblerStats {
            live_handles: self.ref_counts.len(),
            ..self.stats
        }
    }

    /// Current count of a tracked handle; `0` for untracked handles.
    pub(crate) fn ref_count(&self, op: MemOp) -> u32 {
        self.ref_counts.get(&op).copied().unwrap_or(0)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Assembler>> {
        self.self_ref.clone()
    }

    pub(crate) fn is(&self, other: &Weak<RefCell<Assembler>>) -> bool {
        Weak::ptr_eq(&self.self_ref, other)
    }

    pub(crate) fn owns(&self, owner: &AssemblerRef) -> bool {
        std::ptr::eq(self.self_ref.as_ptr(), Rc::as_ptr(owner))
    }

    pub(crate) fn check_ownership(&self, owner: &AssemblerRef, ty: MemOpType) -> VgirResult<()> {
        if self.owns(owner) {
            Ok(())
        } else {
            Err(VgirError::ownership(format!(
                "{} heap object is not owned by the current assembler",
                ty.name()
            )))
        }
    }

    fn next_handle(&mut self) -> VgirResult<MemOp> {
        self.next_memop = self
            .next_memop
            .checked_add(1)
            .ok_or_else(|| VgirError::assembler("heap handle space exhausted"))?;
        self.stats.allocated = self.stats.allocated.saturating_add(1);
        Ok(MemOp(self.next_memop))
    }

    /// Issues a tracked handle with a count of one after `factory` emitted its creation.
    pub(crate) fn allocate_with_ref(
        &mut self,
        ty: MemOpType,
        factory: impl FnOnce(MemOp, &mut Assembler) -> VgirResult<()>,
    ) -> VgirResult<TypedMemOp> {
        self.ensure_recording()?;
        let op = self.next_handle()?;
        factory(op, self)?;
        self.ref_counts.insert(op, 1);
        Ok(TypedMemOp { op, ty })
    }

    /// Issues an untracked handle. The caller frees it with [`Assembler::free_local`].
    pub(crate) fn allocate_local_without_ref(
        &mut self,
        factory: impl FnOnce(MemOp, &mut Assembler) -> VgirResult<()>,
    ) -> VgirResult<MemOp> {
        self.ensure_recording()?;
        let op = self.next_handle()?;
        factory(op, self)?;
        Ok(op)
    }

    pub(crate) fn allocate_local_rect(&mut self, rect: Rect) -> VgirResult<MemOp> {
        let [x, y, w, h] = rect_xywh(rect);
        self.allocate_local_without_ref(|op, asm| {
            asm.emitter()?.emit_heap_create_rect(op, x, y, w, h)
        })
    }

    pub(crate) fn allocate_local_vec2(&mut self, v: Vec2) -> VgirResult<MemOp> {
        self.allocate_local_without_ref(|op, asm| {
            asm.emitter()?
                .emit_heap_create_vector2(op, v.x as f32, v.y as f32)
        })
    }

    pub(crate) fn allocate_local_vec3(&mut self, v: Vec3) -> VgirResult<MemOp> {
        self.allocate_local_without_ref(|op, asm| {
            asm.emitter()?.emit_heap_create_vector3(op, v.x, v.y, v.z)
        })
    }

    pub(crate) fn allocate_local_vec4(&mut self, v: Vec4) -> VgirResult<MemOp> {
        self.allocate_local_without_ref(|op, asm| {
            asm.emitter()?
                .emit_heap_create_vector4(op, v.x, v.y, v.z, v.w)
        })
    }

    pub(crate) fn allocate_local_u32_array(&mut self, values: &[u32]) -> VgirResult<MemOp> {
        let len = array_len(values.len())?;
        self.allocate_local_without_ref(|op, asm| {
            let mut e = asm.emitter()?;
            e.emit_heap_create_u32_array(op, len)?;
            for (i, &v) in (0u32..).zip(values) {
                e.emit_heap_u32_array_store(op, i, v)?;
            }
            Ok(())
        })
    }

    pub(crate) fn allocate_local_f32_array(&mut self, values: &[f32]) -> VgirResult<MemOp> {
        let len = array_len(values.len())?;
        self.allocate_local_without_ref(|op, asm| {
            let mut e = asm.emitter()?;
            e.emit_heap_create_f32_array(op, len)?;
            for (i, &v) in (0u32..).zip(values) {
                e.emit_heap_f32_array_store(op, i, v)?;
            }
            Ok(())
        })
    }

    /// Emits `HeapFree` for an untracked handle.
    pub(crate) fn free_local(&mut self, op: MemOp) -> VgirResult<()> {
        self.emitter()?.emit_heap_free(op)?;
        self.stats.freed = self.stats.freed.saturating_add(1);
        Ok(())
    }

    /// Frees every non-null handle in `ops`, in order.
    pub(crate) fn free_locals(&mut self, ops: &[MemOp]) -> VgirResult<()> {
        for &op in ops.iter().filter(|op| !op.is_null()) {
            self.free_local(op)?;
        }
        Ok(())
    }

    pub(crate) fn add_ref(&mut self, op: TypedMemOp) -> VgirResult<()> {
        if op.op.is_null() {
            return Err(VgirError::null_reference(op.ty.name()));
        }
        self.ensure_recording()?;
        let count = self.ref_counts.get_mut(&op.op).ok_or_else(|| {
            VgirError::assembler(format!(
                "add_ref of untracked {} handle {}",
                op.ty.name(),
                op.op
            ))
        })?;
        *count += 1;
        Ok(())
    }

    pub(crate) fn unref(&mut self, op: TypedMemOp) -> VgirResult<()> {
        if op.op.is_null() {
            return Err(VgirError::null_reference(op.ty.name()));
        }
        self.ensure_recording()?;
        let count = self.ref_counts.get_mut(&op.op).ok_or_else(|| {
            VgirError::assembler(format!(
                "unref of untracked {} handle {}",
                op.ty.name(),
                op.op
            ))
        })?;
        if *count > 1 {
            *count -= 1;
            return Ok(());
        }
        // The entry stays tracked if the free cannot be emitted.
        self.free_local(op.op)?;
        self.ref_counts.remove(&op.op);
        Ok(())
    }
}

fn array_len(len: usize) -> VgirResult<u32> {
    u32::try_from(len).map_err(|_| VgirError::argument(format!("array of {len} elements is too long")))
}

#[cfg(test)]
#[path = "../../tests/unit/heap/assembler.rs"]
mod tests;
