//! Render-tree linearization.
//!
//! A [`RenderTree`] is composed into a [`RenderTreeRecorder`], whose
//! [`generate`](RenderTreeRecorder::generate) drives a [`SceneBuilder`] and caches runs of
//! painters as [`ComplexPicture`]s in a [`LinearizationContext`] kept across frames.

pub mod cache;
pub mod recorder;
pub mod scene;
pub mod tree;

pub use cache::{CacheOpts, CacheStats, ComplexPicture, LinearizationContext, RunMember};
pub use recorder::{IrInst, RenderTreeRecorder};
pub use scene::{
    IrPictureRecorder, LinearizationLogger, NullLogger, PictureRecorder, RecordedScene,
    RecordingSceneBuilder, SceneBuilder, SceneCommand, TextureBuffer, TracingLogger,
};
pub use tree::{
    BackdropFilter, Clip, CompositeAttributes, CompositeNode, NodeIdx, NodeKind, NodeUid,
    PaintCallback, PainterNode, RenderTree, TextureBufferNode, TextureNode,
};
