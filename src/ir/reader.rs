use crate::foundation::error::{VgirError, VgirResult};
use crate::ir::opcode::Opcode;
use crate::ir::operand::{MemOp, OperandKind, OperandValue};
use crate::ir::writer::OPCODE_BYTE_SIZE;
use smallvec::SmallVec;

/// One instruction decoded from an instruction stream, with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub operands: SmallVec<[OperandValue; 8]>,
    /// Index of the buffer the instruction was read from.
    pub buffer: usize,
    /// Byte offset of the header inside that buffer.
    pub offset: usize,
}

impl DecodedInstruction {
    /// Operand by the name it carries in the opcode table.
    pub fn operand(&self, name: &str) -> Option<OperandValue> {
        self.opcode
            .operands()
            .iter()
            .position(|spec| spec.name == name)
            .and_then(|i| self.operands.get(i).copied())
    }
}

/// Streaming decoder over a buffer chain.
///
/// Follows `SwitchNextBuffer` markers and stops after `CommandPoolEnd`. Both markers are yielded.
/// The first error ends iteration.
pub struct InstructionReader<'a> {
    buffers: &'a [&'a [u8]],
    buf: usize,
    pos: usize,
    done: bool,
}

impl<'a> InstructionReader<'a> {
    pub fn new(buffers: &'a [&'a [u8]]) -> Self {
        Self {
            buffers,
            buf: 0,
            pos: 0,
            done: false,
        }
    }

    fn read_bytes<const N: usize>(&mut self, data: &[u8]) -> VgirResult<[u8; N]> {
        let bytes = data
            .get(self.pos..self.pos + N)
            .and_then(|s| <[u8; N]>::try_from(s).ok())
            .ok_or_else(|| {
                VgirError::decode(format!(
                    "truncated instruction in buffer #{} at offset {}",
                    self.buf, self.pos
                ))
            })?;
        self.pos += N;
        Ok(bytes)
    }

    fn decode_next(&mut self) -> VgirResult<DecodedInstruction> {
        let buffers = self.buffers;
        let data = *buffers.get(self.buf).ok_or_else(|| {
            VgirError::decode("instruction stream ended without CommandPoolEnd")
        })?;

        let offset = self.pos;
        let header = u16::from_le_bytes(self.read_bytes::<OPCODE_BYTE_SIZE>(data)?);
        let code = (header & 0xff) as u8;
        let count = (header >> 8) as usize;
        let opcode = Opcode::from_u8(code).ok_or_else(|| {
            VgirError::decode(format!(
                "unknown opcode {code:#04x} in buffer #{} at offset {offset}",
                self.buf
            ))
        })?;
        if count != opcode.operand_count() {
            return Err(VgirError::decode(format!(
                "{} declares {count} operands, expected {}",
                opcode.name(),
                opcode.operand_count()
            )));
        }

        let mut operands = SmallVec::new();
        for spec in opcode.operands() {
            let v = match spec.kind {
                OperandKind::U8 => OperandValue::U8(self.read_bytes::<1>(data)?[0]),
                OperandKind::U32 => OperandValue::U32(u32::from_le_bytes(self.read_bytes(data)?)),
                OperandKind::F32 => OperandValue::F32(f32::from_le_bytes(self.read_bytes(data)?)),
                OperandKind::MemOp => {
                    OperandValue::MemOp(MemOp(u32::from_le_bytes(self.read_bytes(data)?)))
                }
            };
            operands.push(v);
        }

        let decoded = DecodedInstruction {
            opcode,
            operands,
            buffer: self.buf,
            offset,
        };
        match opcode {
            Opcode::SwitchNextBuffer => {
                self.buf += 1;
                self.pos = 0;
            }
            Opcode::CommandPoolEnd => self.done = true,
            _ => {}
        }
        Ok(decoded)
    }
}

impl Iterator for InstructionReader<'_> {
    type Item = VgirResult<DecodedInstruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let r = self.decode_next();
        if r.is_err() {
            self.done = true;
        }
        Some(r)
    }
}

/// Decodes a finished program into its logical instruction sequence.
///
/// Buffer switch markers are dropped; the trailing `CommandPoolEnd` is kept.
pub fn decode_program(buffers: &[&[u8]]) -> VgirResult<Vec<DecodedInstruction>> {
    let mut out = Vec::new();
    for inst in InstructionReader::new(buffers) {
        let inst = inst?;
        if inst.opcode != Opcode::SwitchNextBuffer {
            out.push(inst);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/ir/reader.rs"]
mod tests;
