use crate::ir::writer::InstructionWriter;

/// Typed instruction emitter over an [`InstructionWriter`].
///
/// The `emit_*` methods are generated from the opcode table in [`crate::ir::opcode`].
pub(crate) struct Emitter<'w> {
    pub(crate) writer: &'w mut InstructionWriter,
}

impl<'w> Emitter<'w> {
    pub(crate) fn new(writer: &'w mut InstructionWriter) -> Self {
        Self { writer }
    }
}
