//! Reference-counted heap objects and the assembler that emits them.

pub(crate) mod assembler;
pub mod binder;
pub mod filter;
pub mod matrix;
pub(crate) mod object;
pub mod paint;
pub mod path;
pub mod rrect;
pub mod sampling;
pub mod shader;

pub use assembler::{AssemblerStats, MemOpType, TypedMemOp};
pub use binder::{BoundObject, ExternalImage, ExternalPicture, HeapObjectBinder};
pub use filter::{ColorFilter, ImageFilter, MaskFilter, PathEffect};
pub use matrix::Matrix4x4;
pub use object::RefCounted;
pub use paint::Paint;
pub use path::Path;
pub use rrect::RRect;
pub use sampling::SamplingOptions;
pub use shader::{Blender, Shader};
