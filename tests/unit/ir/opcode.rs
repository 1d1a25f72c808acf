use super::*;
use crate::ir::operand::OperandKind;
use crate::ir::pool::{MemoryResourceGroup, PoolOpts};
use crate::ir::writer::InstructionWriter;

#[test]
fn reserved_opcodes_keep_their_numbers() {
    assert_eq!(Opcode::SwitchNextBuffer as u8, 0x01);
    assert_eq!(Opcode::CommandPoolEnd as u8, 0x02);
    assert_eq!(Opcode::SwitchNextBuffer.header(), 0x0001);
    assert_eq!(Opcode::CommandPoolEnd.header(), 0x0002);
}

#[test]
fn header_packs_operand_count_in_high_byte() {
    assert_eq!(Opcode::DrawBounds.header(), 0x0203);
    assert_eq!(Opcode::HeapFree.header(), 0x0105);
    assert_eq!(Opcode::HeapCreateMatrixConvolutionImageFilter.header(), 0x0a2d);
    assert_eq!(Opcode::DrawImageRect.header(), 0x0670);
}

#[test]
fn table_is_sorted_and_round_trips() {
    for pair in Opcode::ALL.windows(2) {
        assert!((pair[0] as u8) < (pair[1] as u8));
    }
    for &op in Opcode::ALL {
        assert_eq!(Opcode::from_u8(op as u8), Some(op));
    }
    assert_eq!(Opcode::from_u8(0x00), None);
    assert_eq!(Opcode::from_u8(0xff), None);
}

#[test]
fn encoded_sizes_match_wire_layout() {
    assert_eq!(Opcode::Save.encoded_size(), 2);
    assert_eq!(Opcode::DrawBounds.encoded_size(), 10);
    assert_eq!(Opcode::HeapCreateSamplingOptions.encoded_size(), 8);
    assert_eq!(Opcode::HeapCreateLinearGradientShader.encoded_size(), 23);
    assert_eq!(Opcode::HeapCreateArithmeticImageFilter.encoded_size(), 35);
    assert_eq!(Opcode::PathRotateArcTo.encoded_size(), 28);
}

#[test]
fn signatures_name_their_operands() {
    let ops = Opcode::HeapCreateBlurImageFilter.operands();
    let names: Vec<_> = ops.iter().map(|o| o.name).collect();
    assert_eq!(names, ["key", "sigma_x", "sigma_y", "mode", "input", "crop"]);
    assert_eq!(ops[3].kind, OperandKind::U8);
    assert_eq!(ops[0].kind, OperandKind::MemOp);
}

#[test]
fn emitter_writes_header_then_operands() {
    let g = MemoryResourceGroup::with_opts(PoolOpts { buffer_size: 64 }).unwrap();
    let mut w = InstructionWriter::new(&g).unwrap();
    {
        let mut e = Emitter::new(&mut w);
        e.emit_draw_bounds(100.0, 50.0).unwrap();
        e.emit_heap_free(MemOp(7)).unwrap();
        e.emit_paint_set_blend_mode(MemOp(3), BlendMode::Darken)
            .unwrap();
    }
    assert_eq!(w.position(), 10 + 6 + 7);

    let b = w.buffers()[0].to_vec();
    assert_eq!(&b[0..2], &0x0203u16.to_le_bytes());
    assert_eq!(&b[2..6], &100.0f32.to_le_bytes());
    assert_eq!(&b[6..10], &50.0f32.to_le_bytes());
    assert_eq!(&b[10..12], &0x0105u16.to_le_bytes());
    assert_eq!(&b[12..16], &7u32.to_le_bytes());
    assert_eq!(&b[16..18], &0x024au16.to_le_bytes());
    assert_eq!(&b[18..22], &3u32.to_le_bytes());
    assert_eq!(b[22], 0x10);
}
