#![forbid(unsafe_code)]

pub mod canvas;
pub mod foundation;
pub mod heap;
pub mod ir;
pub mod render;

pub use canvas::{
    Canvas, CanvasOpts, CanvasStatus, CompiledPicture, DecodingCompiler, HeapProfile, IrCompiler,
    Submission,
};
pub use foundation::config::VgirConfig;
pub use foundation::core::{Point, Rect, RoundedRect, Size, Vec2, Vec3, Vec4, color_argb};
pub use foundation::error::{VgirError, VgirResult};
pub use heap::{
    Blender, ColorFilter, ExternalImage, ExternalPicture, ImageFilter, MaskFilter, Matrix4x4,
    Paint, Path, PathEffect, RRect, RefCounted, SamplingOptions, Shader,
};
pub use ir::operand::MemOp;
pub use ir::pool::{MemoryResourceGroup, PoolOpts};
pub use render::{
    CacheOpts, LinearizationContext, RenderTree, RenderTreeRecorder, SceneBuilder,
};
