//! Retained render tree.
//!
//! Nodes live in an arena and refer to their children by [`NodeIdx`] plus [`NodeUid`]. Slots are recycled after
//! [`RenderTree::remove`]; the [`NodeUid`] handed out with each node never is, so a recycled
//! slot cannot be mistaken for the node that used to live there.

use crate::canvas::Canvas;
use crate::foundation::core::{Point, Rect, RoundedRect, Vec2};
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::binder::ExternalImage;
use crate::heap::filter::ImageFilter;
use crate::ir::constants::{BlendMode, FilterMode};
use crate::render::recorder::RenderTreeRecorder;
use crate::render::scene::TextureBuffer;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub(crate) u32);

/// Identity of a node for the lifetime of its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeUid(pub(crate) u64);

impl NodeUid {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PaintCallback = Box<dyn FnMut(&mut Canvas) -> VgirResult<()>>;

#[derive(Clone, Debug, Default)]
pub enum Clip {
    #[default]
    None,
    Rect(Rect),
    RRect(RoundedRect),
}

#[derive(Clone, Debug)]
pub struct BackdropFilter {
    pub filter: ImageFilter,
    pub blend_mode: BlendMode,
    pub bounds_clip: bool,
}

/// Layer attributes of a composite node.
///
/// Every attribute that is set pushes one scene layer around the children, in this order:
/// offset, rotation, clip, image filter, backdrop filter, opacity.
#[derive(Clone, Debug, Default)]
pub struct CompositeAttributes {
    offset: Vec2,
    rotate: Option<(f64, Point)>,
    clip: Clip,
    clip_antialias: bool,
    image_filter: Option<ImageFilter>,
    backdrop: Option<BackdropFilter>,
    opacity: Option<f32>,
}

impl CompositeAttributes {
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn has_offset(&self) -> bool {
        self.offset != Vec2::ZERO
    }

    pub fn has_rotate(&self) -> bool {
        self.rotate.is_some_and(|(rad, _)| rad != 0.0)
    }

    pub fn has_transform(&self) -> bool {
        self.has_offset() || self.has_rotate()
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn opacity(&self) -> Option<f32> {
        self.opacity
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn set_rotate(&mut self, radians: f64, pivot: Point) {
        self.rotate = Some((radians, pivot));
    }

    pub fn set_rect_clip(&mut self, rect: Rect) {
        self.clip = Clip::Rect(rect);
    }

    pub fn set_rrect_clip(&mut self, rrect: RoundedRect) {
        self.clip = Clip::RRect(rrect);
    }

    pub fn set_clip_antialias(&mut self, aa: bool) {
        self.clip_antialias = aa;
    }

    pub fn set_image_filter(&mut self, filter: ImageFilter) {
        self.image_filter = Some(filter);
    }

    pub fn set_backdrop_filter(
        &mut self,
        filter: ImageFilter,
        blend_mode: BlendMode,
        bounds_clip: bool,
    ) {
        self.backdrop = Some(BackdropFilter {
            filter,
            blend_mode,
            bounds_clip,
        });
    }

    pub fn set_opacity(&mut self, opacity: f32) -> VgirResult<()> {
        if opacity.is_nan() || opacity < 0.0 {
            return Err(VgirError::argument(format!("invalid opacity {opacity}")));
        }
        self.opacity = Some(opacity);
        Ok(())
    }

    pub fn reset_offset(&mut self) {
        self.offset = Vec2::ZERO;
    }

    pub fn reset_rotate(&mut self) {
        self.rotate = None;
    }

    pub fn reset_clip(&mut self) {
        self.clip = Clip::None;
    }

    pub fn reset_image_filter(&mut self) {
        self.image_filter = None;
    }

    pub fn reset_backdrop_filter(&mut self) {
        self.backdrop = None;
    }

    pub fn reset_opacity(&mut self) {
        self.opacity = None;
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Pushes the layers, runs `body`, then pops as many layers as were pushed.
    fn scope(
        &self,
        recorder: &mut RenderTreeRecorder,
        body: impl FnOnce(&mut RenderTreeRecorder) -> VgirResult<()>,
    ) -> VgirResult<()> {
        let mut pushed = 0;
        if self.has_offset() {
            recorder.push_offset(self.offset);
            pushed += 1;
        }
        if let Some((rad, pivot)) = self.rotate.filter(|(rad, _)| *rad != 0.0) {
            recorder.push_rotate(rad, pivot);
            pushed += 1;
        }
        match &self.clip {
            Clip::None => {}
            Clip::Rect(r) => {
                recorder.push_rect_clip(*r, self.clip_antialias);
                pushed += 1;
            }
            Clip::RRect(r) => {
                recorder.push_rrect_clip(*r, self.clip_antialias);
                pushed += 1;
            }
        }
        if let Some(f) = &self.image_filter {
            recorder.push_image_filter(f.clone());
            pushed += 1;
        }
        if let Some(b) = &self.backdrop {
            recorder.push_backdrop_filter(b.filter.clone(), b.blend_mode, b.bounds_clip);
            pushed += 1;
        }
        if let Some(alpha) = self.opacity {
            recorder.push_opacity(alpha);
            pushed += 1;
        }

        body(recorder)?;

        for _ in 0..pushed {
            recorder.pop();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CompositeNode {
    pub attributes: CompositeAttributes,
    children: Vec<(NodeIdx, NodeUid)>,
}

impl CompositeNode {
    pub fn children(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.children.iter().map(|(idx, _)| *idx)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Leaf that draws itself through a callback.
#[derive(Default)]
pub struct PainterNode {
    bounds: Rect,
    callback: Option<PaintCallback>,
    dirty: bool,
}

impl PainterNode {
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Set when the callback is replaced, cleared once it has painted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Runs the callback. A painter without one draws nothing and stays as it is.
    pub(crate) fn paint(&mut self, canvas: &mut Canvas) -> VgirResult<()> {
        if let Some(cb) = self.callback.as_mut() {
            cb(canvas)?;
            self.dirty = false;
        }
        Ok(())
    }
}

/// Leaf that draws a static image.
#[derive(Clone, Copy, Debug)]
pub struct TextureNode {
    pub image: ExternalImage,
    pub rect: Rect,
}

/// Leaf holding a one-shot frame buffer. Composing hands the buffer to the recorder.
#[derive(Default)]
pub struct TextureBufferNode {
    pending: Option<(TextureBuffer, Rect, FilterMode)>,
}

impl TextureBufferNode {
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

pub enum NodeKind {
    Composite(CompositeNode),
    Painter(PainterNode),
    Texture(TextureNode),
    TextureBuffer(TextureBufferNode),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Composite(_) => "composite",
            Self::Painter(_) => "painter",
            Self::Texture(_) => "texture",
            Self::TextureBuffer(_) => "texture buffer",
        }
    }
}

struct Slot {
    uid: NodeUid,
    kind: NodeKind,
}

/// Arena of render nodes.
#[derive(Default)]
pub struct RenderTree {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    next_uid: u64,
}

impl fmt::Debug for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTree")
            .field("nodes", &self.len())
            .field("free_slots", &self.free.len())
            .field("next_uid", &self.next_uid)
            .finish()
    }
}

impl RenderTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, kind: NodeKind) -> NodeIdx {
        self.next_uid += 1;
        let slot = Slot {
            uid: NodeUid(self.next_uid),
            kind,
        };
        match self.free.pop() {
            Some(i) => {
                self.slots[i as usize] = Some(slot);
                NodeIdx(i)
            }
            None => {
                self.slots.push(Some(slot));
                NodeIdx((self.slots.len() - 1) as u32)
            }
        }
    }

    pub fn new_composite(&mut self) -> NodeIdx {
        self.insert(NodeKind::Composite(CompositeNode::default()))
    }

    /// New painter with empty bounds and no callback.
    pub fn new_painter(&mut self) -> NodeIdx {
        self.insert(NodeKind::Painter(PainterNode::default()))
    }

    pub fn new_texture(&mut self, image: ExternalImage, rect: Option<Rect>) -> NodeIdx {
        self.insert(NodeKind::Texture(TextureNode {
            image,
            rect: rect.unwrap_or_else(|| image.bounds()),
        }))
    }

    pub fn new_texture_buffer(&mut self) -> NodeIdx {
        self.insert(NodeKind::TextureBuffer(TextureBufferNode::default()))
    }

    fn slot(&self, idx: NodeIdx) -> VgirResult<&Slot> {
        self.slots
            .get(idx.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| VgirError::argument(format!("no render node at index {}", idx.0)))
    }

    fn slot_mut(&mut self, idx: NodeIdx) -> VgirResult<&mut Slot> {
        self.slots
            .get_mut(idx.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| VgirError::argument(format!("no render node at index {}", idx.0)))
    }

    pub fn contains(&self, idx: NodeIdx) -> bool {
        self.slot(idx).is_ok()
    }

    pub fn uid(&self, idx: NodeIdx) -> VgirResult<NodeUid> {
        Ok(self.slot(idx)?.uid)
    }

    pub fn get(&self, idx: NodeIdx) -> VgirResult<&NodeKind> {
        Ok(&self.slot(idx)?.kind)
    }

    fn composite_mut(&mut self, idx: NodeIdx) -> VgirResult<&mut CompositeNode> {
        match &mut self.slot_mut(idx)?.kind {
            NodeKind::Composite(c) => Ok(c),
            other => Err(VgirError::argument(format!(
                "node {} is a {} node, not a composite",
                idx.0,
                other.name()
            ))),
        }
    }

    pub fn attributes_mut(&mut self, idx: NodeIdx) -> VgirResult<&mut CompositeAttributes> {
        Ok(&mut self.composite_mut(idx)?.attributes)
    }

    pub fn painter(&self, idx: NodeIdx) -> VgirResult<&PainterNode> {
        match &self.slot(idx)?.kind {
            NodeKind::Painter(p) => Ok(p),
            other => Err(VgirError::argument(format!(
                "node {} is a {} node, not a painter",
                idx.0,
                other.name()
            ))),
        }
    }

    /// Painter at `idx`, provided the slot still holds the node identified by `uid`.
    pub(crate) fn painter_checked(
        &mut self,
        idx: NodeIdx,
        uid: NodeUid,
    ) -> VgirResult<&mut PainterNode> {
        let slot = self.slot_mut(idx)?;
        if slot.uid != uid {
            return Err(VgirError::invalid_state(format!(
                "painter {uid} was removed from the tree"
            )));
        }
        match &mut slot.kind {
            NodeKind::Painter(p) => Ok(p),
            other => Err(VgirError::argument(format!(
                "node {} is a {} node, not a painter",
                idx.0,
                other.name()
            ))),
        }
    }

    /// Replaces the painter's bounds and callback and marks it dirty.
    pub fn update_painter(
        &mut self,
        idx: NodeIdx,
        bounds: Rect,
        callback: impl FnMut(&mut Canvas) -> VgirResult<()> + 'static,
    ) -> VgirResult<()> {
        if !(bounds.is_finite() && bounds.width() >= 0.0 && bounds.height() >= 0.0) {
            return Err(VgirError::argument(format!(
                "painter bounds must be finite and non-negative, got {bounds:?}"
            )));
        }
        let uid = self.uid(idx)?;
        let painter = self.painter_checked(idx, uid)?;
        painter.bounds = bounds;
        painter.callback = Some(Box::new(callback));
        painter.dirty = true;
        Ok(())
    }

    /// Installs the buffer drawn on the next compose, dropping any buffer not yet composed.
    ///
    /// `rect` defaults to the buffer's own size at the origin. Passing `None` as the buffer
    /// only drops the pending one.
    pub fn update_texture_buffer(
        &mut self,
        idx: NodeIdx,
        buffer: Option<TextureBuffer>,
        sampling: FilterMode,
        rect: Option<Rect>,
    ) -> VgirResult<()> {
        let node = match &mut self.slot_mut(idx)?.kind {
            NodeKind::TextureBuffer(t) => t,
            other => {
                return Err(VgirError::argument(format!(
                    "node {} is a {} node, not a texture buffer",
                    idx.0,
                    other.name()
                )));
            }
        };
        node.pending = buffer.map(|b| {
            let r = rect.unwrap_or_else(|| b.bounds());
            (b, r, sampling)
        });
        Ok(())
    }

    /// Appends `child` to the composite `parent`. Appending an existing child is a no-op.
    pub fn append_child(&mut self, parent: NodeIdx, child: NodeIdx) -> VgirResult<()> {
        if parent == child {
            return Err(VgirError::argument("a node cannot be its own child"));
        }
        let entry = (child, self.uid(child)?);
        let node = self.composite_mut(parent)?;
        if !node.children.contains(&entry) {
            node.children.push(entry);
        }
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeIdx, child: NodeIdx) -> VgirResult<()> {
        self.composite_mut(parent)?.children.retain(|(c, _)| *c != child);
        Ok(())
    }

    pub fn clear_children(&mut self, parent: NodeIdx) -> VgirResult<()> {
        self.composite_mut(parent)?.children.clear();
        Ok(())
    }

    /// Frees `idx` and everything below it. Parents still listing the node are left as they are
    /// and fail on the next compose, even once the slot is reused.
    ///
    /// Children whose slot already holds a different node are skipped.
    pub fn remove(&mut self, idx: NodeIdx) -> VgirResult<()> {
        let mut stack = vec![(idx, self.uid(idx)?)];
        while let Some((i, uid)) = stack.pop() {
            let Some(entry) = self.slots.get_mut(i.0 as usize) else {
                continue;
            };
            if entry.as_ref().is_none_or(|slot| slot.uid != uid) {
                continue;
            }
            let Some(slot) = entry.take() else {
                continue;
            };
            if let NodeKind::Composite(c) = slot.kind {
                stack.extend(c.children);
            }
            self.free.push(i.0);
        }
        Ok(())
    }

    /// Flattens the subtree at `root` into a recorder instruction list.
    pub fn compose(&mut self, root: NodeIdx) -> VgirResult<RenderTreeRecorder> {
        let mut recorder = RenderTreeRecorder::new();
        let mut visiting = Vec::new();
        let uid = self.uid(root)?;
        self.compose_node(root, uid, &mut recorder, &mut visiting)?;
        Ok(recorder)
    }

    fn compose_node(
        &mut self,
        idx: NodeIdx,
        uid: NodeUid,
        recorder: &mut RenderTreeRecorder,
        visiting: &mut Vec<NodeIdx>,
    ) -> VgirResult<()> {
        if visiting.contains(&idx) {
            return Err(VgirError::argument(format!(
                "render tree has a cycle through node {}",
                idx.0
            )));
        }
        let slot = self
            .slots
            .get_mut(idx.0 as usize)
            .and_then(Option::as_mut)
            .filter(|slot| slot.uid == uid)
            .ok_or_else(|| {
                VgirError::invalid_state(format!(
                    "child node {uid} at index {} was removed from the tree",
                    idx.0
                ))
            })?;
        match &mut slot.kind {
            NodeKind::Composite(c) => {
                let attributes = c.attributes.clone();
                let children = c.children.clone();
                visiting.push(idx);
                attributes.scope(recorder, |rec| {
                    for (child, child_uid) in children {
                        self.compose_node(child, child_uid, rec, visiting)?;
                    }
                    Ok(())
                })?;
                visiting.pop();
            }
            NodeKind::Painter(_) => recorder.draw_painter_node(idx, uid),
            NodeKind::Texture(t) => recorder.draw_texture(t.image, t.rect),
            NodeKind::TextureBuffer(t) => {
                if let Some((buffer, rect, sampling)) = t.pending.take() {
                    recorder.draw_texture_buffer(buffer, rect, sampling);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/tree.rs"]
mod tests;
