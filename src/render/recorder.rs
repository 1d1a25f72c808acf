//! Flat instruction list produced by composing a render tree, and its linearization into
//! scene-builder calls.

use crate::foundation::core::{Point, Rect, RoundedRect, Size, Vec2};
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::binder::ExternalImage;
use crate::heap::filter::ImageFilter;
use crate::ir::constants::{BlendMode, FilterMode};
use crate::render::cache::{LinearizationContext, RunMember};
use crate::render::scene::{LinearizationLogger, PictureRecorder, SceneBuilder, TextureBuffer};
use crate::render::tree::{NodeIdx, NodeUid, RenderTree};
use smallvec::SmallVec;

#[derive(Debug)]
pub enum IrInst {
    PushOffset(Vec2),
    PushRotate {
        radians: f64,
        pivot: Point,
    },
    PushBackdropFilter {
        filter: ImageFilter,
        blend_mode: BlendMode,
        bounds_clip: bool,
    },
    PushImageFilter(ImageFilter),
    PushRectClip {
        rect: Rect,
        antialias: bool,
    },
    PushRRectClip {
        rrect: RoundedRect,
        antialias: bool,
    },
    PushOpacity(f32),
    Pop,
    IsolateLayer,
    DrawPainter {
        node: NodeIdx,
        uid: NodeUid,
    },
    DrawTexture {
        image: ExternalImage,
        rect: Rect,
    },
    DrawTextureBuffer {
        buffer: TextureBuffer,
        rect: Rect,
        sampling: FilterMode,
    },
}

impl IrInst {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PushOffset(_) => "PushOffset",
            Self::PushRotate { .. } => "PushRotate",
            Self::PushBackdropFilter { .. } => "PushBackdropFilter",
            Self::PushImageFilter(_) => "PushImageFilter",
            Self::PushRectClip { .. } => "PushRectClip",
            Self::PushRRectClip { .. } => "PushRRectClip",
            Self::PushOpacity(_) => "PushOpacity",
            Self::Pop => "Pop",
            Self::IsolateLayer => "IsolateLayer",
            Self::DrawPainter { .. } => "DrawPainter",
            Self::DrawTexture { .. } => "DrawTexture",
            Self::DrawTextureBuffer { .. } => "DrawTextureBuffer",
        }
    }

    pub fn operand_count(&self) -> usize {
        match self {
            Self::Pop | Self::IsolateLayer => 0,
            Self::PushOffset(_)
            | Self::PushImageFilter(_)
            | Self::PushOpacity(_)
            | Self::DrawPainter { .. } => 1,
            Self::PushRotate { .. }
            | Self::PushRectClip { .. }
            | Self::PushRRectClip { .. }
            | Self::DrawTexture { .. } => 2,
            Self::PushBackdropFilter { .. } | Self::DrawTextureBuffer { .. } => 3,
        }
    }
}

/// Linear recording of a composed render tree.
///
/// Built by [`RenderTree::compose`] or by hand, then consumed once by
/// [`RenderTreeRecorder::generate`].
#[derive(Debug, Default)]
pub struct RenderTreeRecorder {
    insts: Vec<IrInst>,
}

impl RenderTreeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> &[IrInst] {
        &self.insts
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn push_offset(&mut self, offset: Vec2) {
        self.insts.push(IrInst::PushOffset(offset));
    }

    pub fn push_rotate(&mut self, radians: f64, pivot: Point) {
        self.insts.push(IrInst::PushRotate { radians, pivot });
    }

    pub fn push_backdrop_filter(
        &mut self,
        filter: ImageFilter,
        blend_mode: BlendMode,
        bounds_clip: bool,
    ) {
        self.insts.push(IrInst::PushBackdropFilter {
            filter,
            blend_mode,
            bounds_clip,
        });
    }

    pub fn push_image_filter(&mut self, filter: ImageFilter) {
        self.insts.push(IrInst::PushImageFilter(filter));
    }

    pub fn push_rect_clip(&mut self, rect: Rect, antialias: bool) {
        self.insts.push(IrInst::PushRectClip { rect, antialias });
    }

    pub fn push_rrect_clip(&mut self, rrect: RoundedRect, antialias: bool) {
        self.insts.push(IrInst::PushRRectClip { rrect, antialias });
    }

    pub fn push_opacity(&mut self, alpha: f32) {
        self.insts.push(IrInst::PushOpacity(alpha));
    }

    pub fn pop(&mut self) {
        self.insts.push(IrInst::Pop);
    }

    pub fn isolate_layer(&mut self) {
        self.insts.push(IrInst::IsolateLayer);
    }

    /// Records the painter at `node`, which must currently hold a painter.
    pub fn draw_painter(&mut self, tree: &RenderTree, node: NodeIdx) -> VgirResult<()> {
        tree.painter(node)?;
        let uid = tree.uid(node)?;
        self.draw_painter_node(node, uid);
        Ok(())
    }

    pub(crate) fn draw_painter_node(&mut self, node: NodeIdx, uid: NodeUid) {
        self.insts.push(IrInst::DrawPainter { node, uid });
    }

    pub fn draw_texture(&mut self, image: ExternalImage, rect: Rect) {
        self.insts.push(IrInst::DrawTexture { image, rect });
    }

    pub fn draw_texture_buffer(
        &mut self,
        buffer: TextureBuffer,
        rect: Rect,
        sampling: FilterMode,
    ) {
        self.insts.push(IrInst::DrawTextureBuffer {
            buffer,
            rect,
            sampling,
        });
    }

    /// Turns the recording into scene-builder calls.
    ///
    /// Maximal runs of consecutive painters become one picture placed at the union of their
    /// bounds. The picture is taken from `ctx` when the same painters, in the same order and
    /// none of them dirty, produced one before; otherwise it is recorded through `pictures` and
    /// cached. The cache checkpoint runs only when the whole pass succeeds.
    #[tracing::instrument(level = "debug", skip_all, fields(insts = self.insts.len()))]
    pub fn generate<R, B>(
        self,
        tree: &mut RenderTree,
        viewport: Size,
        ctx: &mut LinearizationContext<R::Picture>,
        pictures: &mut R,
        builder: &mut B,
        logger: &mut dyn LinearizationLogger,
    ) -> VgirResult<B::Scene>
    where
        R: PictureRecorder,
        B: SceneBuilder<R::Picture>,
    {
        builder.begin(viewport)?;
        builder.push_offset(Vec2::ZERO)?;

        let mut insts = self.insts.into_iter().enumerate().peekable();
        let mut picture_count = 0usize;
        while let Some((i, inst)) = insts.next() {
            let (node, uid) = match inst {
                IrInst::DrawPainter { node, uid } => (node, uid),
                other => {
                    translate::<R::Picture, B>(i, other, builder, logger)?;
                    continue;
                }
            };
            let mut run: SmallVec<[(usize, NodeIdx, NodeUid); 4]> = SmallVec::new();
            run.push((i, node, uid));
            while let Some((j, IrInst::DrawPainter { node, uid })) = insts.peek() {
                run.push((*j, *node, *uid));
                insts.next();
            }
            picture_count += 1;
            draw_painter_run(&run, picture_count, tree, ctx, pictures, builder, logger)?;
        }

        builder.pop()?;
        ctx.checkpoint();
        builder.build()
    }
}

/// Forwards one non-painter instruction to the scene builder.
fn translate<P, B: SceneBuilder<P>>(
    index: usize,
    inst: IrInst,
    builder: &mut B,
    logger: &mut dyn LinearizationLogger,
) -> VgirResult<()> {
    logger.begin_instruction(index, inst.name(), inst.operand_count());
    match inst {
        IrInst::PushOffset(v) => builder.push_offset(v)?,
        IrInst::PushRotate { radians, pivot } => builder.push_rotate(radians, pivot)?,
        IrInst::PushBackdropFilter {
            filter,
            blend_mode,
            bounds_clip,
        } => builder.push_backdrop_filter(&filter, blend_mode, bounds_clip)?,
        IrInst::PushImageFilter(filter) => builder.push_image_filter(&filter)?,
        IrInst::PushRectClip { rect, antialias } => builder.push_rect_clip(rect, antialias)?,
        IrInst::PushRRectClip { rrect, antialias } => builder.push_rrect_clip(rrect, antialias)?,
        IrInst::PushOpacity(alpha) => builder.push_opacity(alpha)?,
        IrInst::Pop => builder.pop()?,
        IrInst::IsolateLayer => {}
        IrInst::DrawTextureBuffer {
            buffer,
            rect,
            sampling,
        } => builder.add_texture_buffer(buffer, rect, sampling)?,
        IrInst::DrawTexture { image, .. } => {
            return Err(VgirError::not_implemented(format!(
                "linearizing static texture {}",
                image.id
            )));
        }
        IrInst::DrawPainter { uid, .. } => {
            return Err(VgirError::invalid_state(format!(
                "painter {uid} reached outside a painter run"
            )));
        }
    }
    logger.end_instruction();
    Ok(())
}

fn annotate_painter(
    logger: &mut dyn LinearizationLogger,
    index: usize,
    picture: usize,
    hit: bool,
    uid: NodeUid,
    dirty: bool,
    bounds: Rect,
) {
    logger.begin_instruction(index, "DrawPainter", 1);
    logger.add_annotation(&format!("Picture#{picture}"));
    if hit {
        logger.add_annotation("CacheHit");
    }
    logger.add_annotation(&format!("id={uid}"));
    logger.add_annotation(&format!("dirty={dirty}"));
    logger.add_annotation(&format!(
        "bounds=({},{},{},{})",
        bounds.x0,
        bounds.y0,
        bounds.width(),
        bounds.height()
    ));
    logger.end_instruction();
}

fn draw_painter_run<R, B>(
    run: &[(usize, NodeIdx, NodeUid)],
    picture_count: usize,
    tree: &mut RenderTree,
    ctx: &mut LinearizationContext<R::Picture>,
    pictures: &mut R,
    builder: &mut B,
    logger: &mut dyn LinearizationLogger,
) -> VgirResult<()>
where
    R: PictureRecorder,
    B: SceneBuilder<R::Picture>,
{
    let mut members: SmallVec<[RunMember; 4]> = SmallVec::with_capacity(run.len());
    let mut bounds: SmallVec<[Rect; 4]> = SmallVec::with_capacity(run.len());
    for &(_, node, uid) in run {
        let painter = tree.painter_checked(node, uid)?;
        members.push(RunMember {
            uid,
            dirty: painter.is_dirty(),
        });
        bounds.push(painter.bounds());
    }
    let union = bounds
        .iter()
        .copied()
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO);
    let origin = union.origin();

    if let Some(picture) = ctx.find(&members) {
        for (k, &(i, _, uid)) in run.iter().enumerate() {
            annotate_painter(logger, i, picture_count, true, uid, false, bounds[k]);
        }
        tracing::debug!(painters = run.len(), x = origin.x, y = origin.y, "complex picture hit");
        return builder.add_picture(picture, origin);
    }

    tracing::debug!(painters = run.len(), ?union, "complex picture miss");
    let mut canvas = pictures.begin_recording(union.size())?;
    for (k, &(i, node, uid)) in run.iter().enumerate() {
        annotate_painter(
            logger,
            i,
            picture_count,
            false,
            uid,
            members[k].dirty,
            bounds[k],
        );
        let painter = tree.painter_checked(node, uid)?;
        let saved = canvas.save()?;
        canvas.translate(
            (bounds[k].x0 - union.x0) as f32,
            (bounds[k].y0 - union.y0) as f32,
        )?;
        painter.paint(&mut canvas)?;
        canvas.restore_to_count(saved)?;
    }
    let picture = pictures.finish_recording(canvas)?;
    builder.add_picture(picture.clone(), origin)?;
    ctx.insert(picture, &members);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/recorder.rs"]
mod tests;
