use crate::foundation::error::VgirResult;
use crate::ir::writer::InstructionWriter;
use std::fmt;

/// Heap handle operand. `0` is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MemOp(pub u32);

impl MemOp {
    pub const NULL: MemOp = MemOp(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MemOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{:#x}", self.0)
    }
}

/// Wire class of an operand, as recorded in the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    U8,
    U32,
    F32,
    MemOp,
}

impl OperandKind {
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U32 | Self::F32 | Self::MemOp => 4,
        }
    }
}

/// Named operand slot of an opcode signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSpec {
    pub name: &'static str,
    pub kind: OperandKind,
}

/// Operand decoded from an instruction stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandValue {
    U8(u8),
    U32(u32),
    F32(f32),
    MemOp(MemOp),
}

impl OperandValue {
    pub fn as_mem_op(self) -> Option<MemOp> {
        match self {
            Self::MemOp(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_u32(self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(v),
            Self::U8(v) => Some(v as u32),
            _ => None,
        }
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for OperandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "${v:#x}"),
            Self::U32(v) => write!(f, "${v:#x}"),
            Self::F32(v) => write!(f, "${v}"),
            Self::MemOp(op) => write!(f, "{op}"),
        }
    }
}

/// Rust type that can be written as one operand.
pub trait Operand: Copy {
    const KIND: OperandKind;
    const SIZE: usize = Self::KIND.size();

    fn write(self, w: &mut InstructionWriter) -> VgirResult<()>;
}

impl Operand for u8 {
    const KIND: OperandKind = OperandKind::U8;

    fn write(self, w: &mut InstructionWriter) -> VgirResult<()> {
        w.write_u8(self)
    }
}

impl Operand for bool {
    const KIND: OperandKind = OperandKind::U8;

    fn write(self, w: &mut InstructionWriter) -> VgirResult<()> {
        w.write_u8(u8::from(self))
    }
}

impl Operand for u32 {
    const KIND: OperandKind = OperandKind::U32;

    fn write(self, w: &mut InstructionWriter) -> VgirResult<()> {
        w.write_u32(self)
    }
}

impl Operand for f32 {
    const KIND: OperandKind = OperandKind::F32;

    fn write(self, w: &mut InstructionWriter) -> VgirResult<()> {
        w.write_f32(self)
    }
}

impl Operand for MemOp {
    const KIND: OperandKind = OperandKind::MemOp;

    fn write(self, w: &mut InstructionWriter) -> VgirResult<()> {
        w.write_u32(self.0)
    }
}
