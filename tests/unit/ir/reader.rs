use super::*;
use crate::ir::emitter::Emitter;
use crate::ir::pool::{MemoryResourceGroup, PoolOpts};
use crate::ir::writer::InstructionWriter;

fn small_group() -> MemoryResourceGroup {
    MemoryResourceGroup::with_opts(PoolOpts { buffer_size: 64 }).unwrap()
}

#[test]
fn decodes_across_buffer_switches() {
    let g = small_group();
    let mut w = InstructionWriter::new(&g).unwrap();
    {
        let mut e = Emitter::new(&mut w);
        e.emit_draw_bounds(320.0, 240.0).unwrap();
        for i in 0..20u32 {
            e.emit_heap_create_rect(MemOp(i + 1), i as f32, 0.0, 10.0, 10.0)
                .unwrap();
        }
        e.emit_command_pool_end().unwrap();
    }
    assert!(w.buffer_count() > 1);

    let bufs = w.buffers();
    let raw: Vec<_> = InstructionReader::new(&bufs)
        .collect::<VgirResult<Vec<_>>>()
        .unwrap();
    let switches = raw
        .iter()
        .filter(|i| i.opcode == Opcode::SwitchNextBuffer)
        .count();
    assert_eq!(switches, w.buffer_count() - 1);
    assert_eq!(switches, w.switch_count());

    let prog = decode_program(&bufs).unwrap();
    assert_eq!(prog.len(), 22);
    assert_eq!(prog[0].opcode, Opcode::DrawBounds);
    assert_eq!(prog[0].operand("width"), Some(OperandValue::F32(320.0)));
    for (i, inst) in prog[1..21].iter().enumerate() {
        assert_eq!(inst.opcode, Opcode::HeapCreateRect);
        assert_eq!(
            inst.operand("key"),
            Some(OperandValue::MemOp(MemOp(i as u32 + 1)))
        );
        assert_eq!(inst.operand("x"), Some(OperandValue::F32(i as f32)));
    }
    assert_eq!(prog[21].opcode, Opcode::CommandPoolEnd);
    assert!(prog.last().unwrap().buffer == w.buffer_count() - 1);
}

#[test]
fn rejects_unknown_opcode() {
    let data = [0xffu8, 0x00, 0, 0];
    let bufs: [&[u8]; 1] = [&data];
    let err = decode_program(&bufs).unwrap_err();
    assert!(err.to_string().contains("unknown opcode 0xff"));
}

#[test]
fn rejects_operand_count_mismatch() {
    let mut data = vec![0x03u8, 0x01];
    data.extend_from_slice(&[0; 8]);
    let bufs: [&[u8]; 1] = [&data];
    let err = decode_program(&bufs).unwrap_err();
    assert!(err.to_string().contains("DrawBounds declares 1 operands"));
}

#[test]
fn rejects_truncated_operands() {
    let data = [0x05u8, 0x01, 0x07, 0x00];
    let bufs: [&[u8]; 1] = [&data];
    assert!(matches!(decode_program(&bufs), Err(VgirError::Decode(_))));
}

#[test]
fn rejects_switch_past_last_buffer() {
    let data = [0x01u8, 0x00];
    let bufs: [&[u8]; 1] = [&data];
    let err = decode_program(&bufs).unwrap_err();
    assert!(err.to_string().contains("without CommandPoolEnd"));
}
