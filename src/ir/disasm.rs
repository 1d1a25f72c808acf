use crate::foundation::error::VgirResult;
use crate::ir::operand::OperandKind;
use crate::ir::reader::InstructionReader;
use std::fmt::Write as _;

fn kind_name(kind: OperandKind) -> &'static str {
    match kind {
        OperandKind::U8 => "u8",
        OperandKind::U32 => "u32",
        OperandKind::F32 => "f32",
        OperandKind::MemOp => "memop",
    }
}

/// Renders a finished program as text, one instruction per line:
///
/// ```text
///   #0:0000<+0000>|    DrawBounds f32 $100, f32 $50
///   #0:0001<+0010>|    HeapCreatePaint memop %0x1
/// ```
///
/// The counter runs across buffers and includes switch markers.
pub fn disassemble(buffers: &[&[u8]]) -> VgirResult<String> {
    let mut out = String::new();
    for (cnt, inst) in InstructionReader::new(buffers).enumerate() {
        let inst = inst?;
        let _ = write!(
            out,
            "  #{}:{:04}<+{:04}>|    {} ",
            inst.buffer,
            cnt,
            inst.offset,
            inst.opcode.name()
        );
        for (i, (spec, value)) in inst
            .opcode
            .operands()
            .iter()
            .zip(inst.operands.iter())
            .enumerate()
        {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} {value}", kind_name(spec.kind));
        }
        out.push('\n');
    }
    Ok(out)
}
