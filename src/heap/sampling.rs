use crate::heap::object::stateless_object;
use crate::ir::constants::{FilterMode, MipmapMode};

stateless_object!(
    /// Image sampling options shared between draws.
    SamplingOptions
);

impl SamplingOptions {
    pub fn new(filter: FilterMode, mipmap: MipmapMode) -> Self {
        Self::from_factory(move |key, asm| {
            asm.emitter()?
                .emit_heap_create_sampling_options(key, filter, mipmap)
        })
    }

    /// Bicubic resampling with B = 1/3, C = 1/3.
    pub fn cubic_mitchell() -> Self {
        Self::from_factory(|key, asm| {
            asm.emitter()?
                .emit_heap_create_sampling_options_cubic_mitchell(key)
        })
    }

    /// Bicubic resampling with B = 0, C = 1/2.
    pub fn cubic_catmull_rom() -> Self {
        Self::from_factory(|key, asm| {
            asm.emitter()?
                .emit_heap_create_sampling_options_cubic_catmull_rom(key)
        })
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new(FilterMode::Nearest, MipmapMode::None)
    }
}
