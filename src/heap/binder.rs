use crate::foundation::core::Rect;
use crate::ir::operand::MemOp;
use std::collections::BTreeMap;

/// Raster image owned by the embedder. The canvas records only a reference to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExternalImage {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

impl ExternalImage {
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Previously recorded picture owned by the embedder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExternalPicture {
    pub id: u64,
    pub bounds: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundObject {
    Image(ExternalImage),
    Picture(ExternalPicture),
}

/// Handles the rasterizer must resolve to embedder objects instead of heap creations.
#[derive(Clone, Debug, Default)]
pub struct HeapObjectBinder {
    bindings: BTreeMap<MemOp, BoundObject>,
}

impl HeapObjectBinder {
    pub(crate) fn bind_image(&mut self, op: MemOp, image: ExternalImage) {
        self.bindings.insert(op, BoundObject::Image(image));
    }

    pub(crate) fn bind_picture(&mut self, op: MemOp, picture: ExternalPicture) {
        self.bindings.insert(op, BoundObject::Picture(picture));
    }

    pub fn get(&self, op: MemOp) -> Option<&BoundObject> {
        self.bindings.get(&op)
    }

    pub fn contains(&self, op: MemOp) -> bool {
        self.bindings.contains_key(&op)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemOp, &BoundObject)> {
        self.bindings.iter().map(|(op, obj)| (*op, obj))
    }
}
