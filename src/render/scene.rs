//! Collaborators of the linearizer: scene builders, picture recorders and loggers.

use crate::canvas::{Canvas, CanvasOpts, IrCompiler};
use crate::foundation::core::{Point, Rect, RoundedRect, Size, Vec2};
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::filter::ImageFilter;
use crate::ir::constants::{BlendMode, FilterMode};
use crate::ir::pool::MemoryResourceGroup;
use std::rc::Rc;

/// Externally produced frame, e.g. a decoded video frame.
///
/// Not `Clone`: a buffer is drawn at most once and handed to the scene builder by value.
#[derive(Debug, PartialEq, Eq)]
pub struct TextureBuffer {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

impl TextureBuffer {
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Layer-stack scene construction, implemented by the compositor.
pub trait SceneBuilder<P> {
    type Scene;

    fn begin(&mut self, viewport: Size) -> VgirResult<()>;
    fn push_offset(&mut self, offset: Vec2) -> VgirResult<()>;
    fn push_rotate(&mut self, radians: f64, pivot: Point) -> VgirResult<()>;
    fn push_backdrop_filter(
        &mut self,
        filter: &ImageFilter,
        blend_mode: BlendMode,
        bounds_clip: bool,
    ) -> VgirResult<()>;
    fn push_image_filter(&mut self, filter: &ImageFilter) -> VgirResult<()>;
    fn push_rect_clip(&mut self, rect: Rect, antialias: bool) -> VgirResult<()>;
    fn push_rrect_clip(&mut self, rrect: RoundedRect, antialias: bool) -> VgirResult<()>;
    fn push_opacity(&mut self, alpha: f32) -> VgirResult<()>;
    fn pop(&mut self) -> VgirResult<()>;
    fn add_picture(&mut self, picture: P, origin: Point) -> VgirResult<()>;
    fn add_texture_buffer(
        &mut self,
        buffer: TextureBuffer,
        rect: Rect,
        sampling: FilterMode,
    ) -> VgirResult<()>;
    fn build(&mut self) -> VgirResult<Self::Scene>;
}

/// Rasterizes painters into pictures.
pub trait PictureRecorder {
    type Picture: Clone;

    /// Opens a canvas of the given size with its origin at the picture's top-left corner.
    fn begin_recording(&mut self, size: Size) -> VgirResult<Canvas>;
    fn finish_recording(&mut self, canvas: Canvas) -> VgirResult<Self::Picture>;
}

/// Records pictures with [`Canvas`] and submits them through an [`IrCompiler`].
pub struct IrPictureRecorder<C> {
    group: MemoryResourceGroup,
    opts: CanvasOpts,
    compiler: C,
    recorded: u64,
}

impl<C: IrCompiler> IrPictureRecorder<C> {
    pub fn new(group: MemoryResourceGroup, opts: CanvasOpts, compiler: C) -> Self {
        Self {
            group,
            opts,
            compiler,
            recorded: 0,
        }
    }

    /// Pictures recorded so far.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn group(&self) -> &MemoryResourceGroup {
        &self.group
    }
}

impl<C: IrCompiler> PictureRecorder for IrPictureRecorder<C> {
    type Picture = Rc<C::Artifact>;

    fn begin_recording(&mut self, size: Size) -> VgirResult<Canvas> {
        Canvas::with_opts(
            &self.group,
            size.width as f32,
            size.height as f32,
            self.opts.clone(),
        )
    }

    fn finish_recording(&mut self, mut canvas: Canvas) -> VgirResult<Self::Picture> {
        canvas.finish()?;
        let artifact = canvas.submit(&mut self.compiler)?;
        canvas.dispose()?;
        self.recorded += 1;
        Ok(Rc::new(artifact))
    }
}

/// One scene-builder call as captured by [`RecordingSceneBuilder`].
#[derive(Debug)]
pub enum SceneCommand<P> {
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
    AddPicture {
        picture: P,
        origin: Point,
    },
    AddTextureBuffer {
        buffer: TextureBuffer,
        rect: Rect,
        sampling: FilterMode,
    },
}

#[derive(Debug)]
pub struct RecordedScene<P> {
    pub viewport: Size,
    pub commands: Vec<SceneCommand<P>>,
}

impl<P> RecordedScene<P> {
    pub fn pictures(&self) -> impl Iterator<Item = (&P, Point)> {
        self.commands.iter().filter_map(|c| match c {
            SceneCommand::AddPicture { picture, origin } => Some((picture, *origin)),
            _ => None,
        })
    }
}

/// Scene builder that keeps the calls it receives. Checks that pushes and pops balance.
#[derive(Debug)]
pub struct RecordingSceneBuilder<P> {
    viewport: Option<Size>,
    depth: usize,
    commands: Vec<SceneCommand<P>>,
}

impl<P> Default for RecordingSceneBuilder<P> {
    fn default() -> Self {
        Self {
            viewport: None,
            depth: 0,
            commands: Vec::new(),
        }
    }
}

impl<P> RecordingSceneBuilder<P> {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, cmd: SceneCommand<P>) -> VgirResult<()> {
        if self.viewport.is_none() {
            return Err(VgirError::invalid_state("scene builder used before begin"));
        }
        self.commands.push(cmd);
        Ok(())
    }

    fn push(&mut self, cmd: SceneCommand<P>) -> VgirResult<()> {
        self.record(cmd)?;
        self.depth += 1;
        Ok(())
    }
}

impl<P> SceneBuilder<P> for RecordingSceneBuilder<P> {
    type Scene = RecordedScene<P>;

    fn begin(&mut self, viewport: Size) -> VgirResult<()> {
        if self.viewport.is_some() {
            return Err(VgirError::invalid_state("scene builder already begun"));
        }
        self.viewport = Some(viewport);
        Ok(())
    }

    fn push_offset(&mut self, offset: Vec2) -> VgirResult<()> {
        self.push(SceneCommand::PushOffset(offset))
    }

    fn push_rotate(&mut self, radians: f64, pivot: Point) -> VgirResult<()> {
        self.push(SceneCommand::PushRotate { radians, pivot })
    }

    fn push_backdrop_filter(
        &mut self,
        filter: &ImageFilter,
        blend_mode: BlendMode,
        bounds_clip: bool,
    ) -> VgirResult<()> {
        self.push(SceneCommand::PushBackdropFilter {
            filter: filter.clone(),
            blend_mode,
            bounds_clip,
        })
    }

    fn push_image_filter(&mut self, filter: &ImageFilter) -> VgirResult<()> {
        self.push(SceneCommand::PushImageFilter(filter.clone()))
    }

    fn push_rect_clip(&mut self, rect: Rect, antialias: bool) -> VgirResult<()> {
        self.push(SceneCommand::PushRectClip { rect, antialias })
    }

    fn push_rrect_clip(&mut self, rrect: RoundedRect, antialias: bool) -> VgirResult<()> {
        self.push(SceneCommand::PushRRectClip { rrect, antialias })
    }

    fn push_opacity(&mut self, alpha: f32) -> VgirResult<()> {
        self.push(SceneCommand::PushOpacity(alpha))
    }

    fn pop(&mut self) -> VgirResult<()> {
        if self.depth == 0 {
            return Err(VgirError::invalid_state("scene pop without a matching push"));
        }
        self.record(SceneCommand::Pop)?;
        self.depth -= 1;
        Ok(())
    }

    fn add_picture(&mut self, picture: P, origin: Point) -> VgirResult<()> {
        self.record(SceneCommand::AddPicture { picture, origin })
    }

    fn add_texture_buffer(
        &mut self,
        buffer: TextureBuffer,
        rect: Rect,
        sampling: FilterMode,
    ) -> VgirResult<()> {
        self.record(SceneCommand::AddTextureBuffer {
            buffer,
            rect,
            sampling,
        })
    }

    fn build(&mut self) -> VgirResult<RecordedScene<P>> {
        if self.depth != 0 {
            return Err(VgirError::invalid_state(format!(
                "scene built with {} unbalanced layers",
                self.depth
            )));
        }
        let viewport = self
            .viewport
            .take()
            .ok_or_else(|| VgirError::invalid_state("scene builder used before begin"))?;
        Ok(RecordedScene {
            viewport,
            commands: std::mem::take(&mut self.commands),
        })
    }
}

/// Observer of a linearization pass, one instruction at a time.
pub trait LinearizationLogger {
    fn begin_instruction(&mut self, index: usize, opcode: &'static str, operands: usize);
    fn add_annotation(&mut self, content: &str);
    fn end_instruction(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl LinearizationLogger for NullLogger {
    fn begin_instruction(&mut self, _index: usize, _opcode: &'static str, _operands: usize) {}
    fn add_annotation(&mut self, _content: &str) {}
    fn end_instruction(&mut self) {}
}

/// Emits one `trace` event per instruction with its annotations joined.
#[derive(Debug, Default)]
pub struct TracingLogger {
    current: Option<(usize, &'static str, usize)>,
    annotations: Vec<String>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinearizationLogger for TracingLogger {
    fn begin_instruction(&mut self, index: usize, opcode: &'static str, operands: usize) {
        self.current = Some((index, opcode, operands));
        self.annotations.clear();
    }

    fn add_annotation(&mut self, content: &str) {
        self.annotations.push(content.to_owned());
    }

    fn end_instruction(&mut self) {
        if let Some((index, opcode, operands)) = self.current.take() {
            tracing::trace!(
                index,
                opcode,
                operands,
                annotations = %self.annotations.join(" "),
                "linearize"
            );
        }
        self.annotations.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
