use crate::canvas::Canvas;
use crate::foundation::core::Rect;
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::assembler::{AssemblerRef, MemOpType};
use crate::heap::matrix::Matrix4x4;
use crate::heap::object::{OwnedHandle, RefCounted};
use crate::ir::constants::PathFillType;
use crate::ir::operand::MemOp;

/// Path geometry on the rasterizer heap.
///
/// Every verb is forwarded as one instruction; the path keeps no geometry on this side.
#[derive(Debug)]
pub struct Path {
    handle: OwnedHandle,
}

impl Path {
    pub fn new(canvas: &Canvas) -> VgirResult<Self> {
        Self::create(canvas.assembler())
    }

    pub(crate) fn create(owner: &AssemblerRef) -> VgirResult<Self> {
        let handle = OwnedHandle::create(owner, MemOpType::Path, |op, asm| {
            asm.emitter()?.emit_heap_create_path(op)
        })?;
        Ok(Self { handle })
    }

    pub fn mem_op(&self) -> MemOp {
        self.handle.mem_op()
    }

    pub(crate) fn handle(&self) -> &OwnedHandle {
        &self.handle
    }

    pub fn set_fill_type(&self, fill_type: PathFillType) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_set_path_fill_type(self.mem_op(), fill_type)
    }

    pub fn toggle_inverse_fill_type(&self) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_toggle_inverse_fill_type(self.mem_op())
    }

    pub fn reset(&self) -> VgirResult<()> {
        self.handle.asm()?.emitter()?.emit_path_reset(self.mem_op())
    }

    pub fn move_to(&self, x: f32, y: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_move_to(self.mem_op(), x, y)
    }

    pub fn r_move_to(&self, dx: f32, dy: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_r_move_to(self.mem_op(), dx, dy)
    }

    pub fn line_to(&self, x: f32, y: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_line_to(self.mem_op(), x, y)
    }

    pub fn r_line_to(&self, dx: f32, dy: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_r_line_to(self.mem_op(), dx, dy)
    }

    pub fn quad_to(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_quad_to(self.mem_op(), x1, y1, x2, y2)
    }

    pub fn r_quad_to(&self, dx1: f32, dy1: f32, dx2: f32, dy2: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_r_quad_to(self.mem_op(), dx1, dy1, dx2, dy2)
    }

    pub fn conic_to(&self, x1: f32, y1: f32, x2: f32, y2: f32, w: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_conic_to(self.mem_op(), x1, y1, x2, y2, w)
    }

    pub fn r_conic_to(&self, dx1: f32, dy1: f32, dx2: f32, dy2: f32, w: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_r_conic_to(self.mem_op(), dx1, dy1, dx2, dy2, w)
    }

    pub fn cubic_to(&self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_cubic_to(self.mem_op(), x1, y1, x2, y2, x3, y3)
    }

    pub fn r_cubic_to(
        &self,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        dx3: f32,
        dy3: f32,
    ) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_r_cubic_to(self.mem_op(), dx1, dy1, dx2, dy2, dx3, dy3)
    }

    pub fn rect_arc_to(
        &self,
        oval: Rect,
        start_angle: f32,
        sweep_angle: f32,
        force_move_to: bool,
    ) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(oval)?;
        asm.emitter()?.emit_path_rect_arc_to(
            self.mem_op(),
            r,
            start_angle,
            sweep_angle,
            force_move_to,
        )?;
        asm.free_local(r)
    }

    pub fn tangent_arc_to(&self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_tangent_arc_to(self.mem_op(), x1, y1, x2, y2, radius)
    }

    /// SVG-style elliptical arc to an absolute end point.
    #[allow(clippy::too_many_arguments)]
    pub fn rotate_arc_to(
        &self,
        rx: f32,
        ry: f32,
        x_axis_rotate: f32,
        large_arc: bool,
        ccw_sweep: bool,
        x: f32,
        y: f32,
    ) -> VgirResult<()> {
        self.handle.asm()?.emitter()?.emit_path_rotate_arc_to(
            self.mem_op(),
            rx,
            ry,
            x_axis_rotate,
            large_arc,
            ccw_sweep,
            x,
            y,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn r_rotate_arc_to(
        &self,
        rx: f32,
        ry: f32,
        x_axis_rotate: f32,
        large_arc: bool,
        ccw_sweep: bool,
        dx: f32,
        dy: f32,
    ) -> VgirResult<()> {
        self.handle.asm()?.emitter()?.emit_path_r_rotate_arc_to(
            self.mem_op(),
            rx,
            ry,
            x_axis_rotate,
            large_arc,
            ccw_sweep,
            dx,
            dy,
        )
    }

    pub fn close(&self) -> VgirResult<()> {
        self.handle.asm()?.emitter()?.emit_path_close(self.mem_op())
    }

    pub fn add_rect(&self, rect: Rect, ccw_dir: bool) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(rect)?;
        asm.emitter()?.emit_path_add_rect(self.mem_op(), r, ccw_dir)?;
        asm.free_local(r)
    }

    pub fn add_oval(&self, oval: Rect, ccw_dir: bool) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(oval)?;
        asm.emitter()?.emit_path_add_oval(self.mem_op(), r, ccw_dir)?;
        asm.free_local(r)
    }

    pub fn add_circle(&self, x: f32, y: f32, radius: f32, ccw_dir: bool) -> VgirResult<()> {
        self.handle
            .asm()?
            .emitter()?
            .emit_path_add_circle(self.mem_op(), x, y, radius, ccw_dir)
    }

    pub fn add_arc(&self, oval: Rect, start_angle: f32, sweep_angle: f32) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(oval)?;
        asm.emitter()?
            .emit_path_add_arc(self.mem_op(), r, start_angle, sweep_angle)?;
        asm.free_local(r)
    }

    pub fn add_uniform_round_rect(
        &self,
        rect: Rect,
        rx: f32,
        ry: f32,
        ccw_dir: bool,
    ) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(rect)?;
        asm.emitter()?
            .emit_path_add_uniform_round_rect(self.mem_op(), r, rx, ry, ccw_dir)?;
        asm.free_local(r)
    }

    /// `radii` holds one `(x, y)` pair per corner, clockwise from the top left.
    pub fn add_round_rect(&self, rect: Rect, radii: &[f32], ccw_dir: bool) -> VgirResult<()> {
        if radii.len() != 8 {
            return Err(VgirError::argument(format!(
                "round rect needs 8 radii values, got {}",
                radii.len()
            )));
        }
        let mut asm = self.handle.asm()?;
        let r = asm.allocate_local_rect(rect)?;
        let rad = asm.allocate_local_f32_array(radii)?;
        asm.emitter()?
            .emit_path_add_round_rect(self.mem_op(), r, rad, ccw_dir)?;
        asm.free_locals(&[r, rad])
    }

    /// `pts` is a flat `x0, y0, x1, y1, ...` list.
    pub fn add_poly(&self, pts: &[f32], close: bool) -> VgirResult<()> {
        if pts.len() % 2 != 0 {
            return Err(VgirError::argument(format!(
                "polygon coordinates must come in pairs, got {} values",
                pts.len()
            )));
        }
        let mut asm = self.handle.asm()?;
        let p = asm.allocate_local_f32_array(pts)?;
        asm.emitter()?.emit_path_add_poly(self.mem_op(), p, close)?;
        asm.free_local(p)
    }

    /// Transforms this path by `mat`, writing into `dst` or in place when `dst` is `None`.
    pub fn transform(
        &self,
        mat: &Matrix4x4,
        dst: Option<&Path>,
        apply_perspective_clip: bool,
    ) -> VgirResult<()> {
        let mut asm = self.handle.asm()?;
        mat.handle().check_owner(&asm)?;
        let dst = match dst {
            Some(d) => {
                d.handle.check_owner(&asm)?;
                d.mem_op()
            }
            None => MemOp::NULL,
        };
        asm.emitter()?.emit_path_transform(
            self.mem_op(),
            mat.mem_op(),
            dst,
            apply_perspective_clip,
        )
    }
}

impl RefCounted for Path {
    fn add_ref(&self) -> VgirResult<()> {
        self.handle.add_ref()
    }

    fn unref(&self) -> VgirResult<()> {
        self.handle.unref()
    }
}
