pub mod constants;
pub mod disasm;
pub mod dump;
pub(crate) mod emitter;
pub mod opcode;
pub mod operand;
pub mod pool;
pub mod reader;
pub mod writer;
