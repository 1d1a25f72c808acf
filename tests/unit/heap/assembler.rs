use super::*;
use crate::ir::opcode::Opcode;
use crate::ir::operand::OperandValue;
use crate::ir::reader::{DecodedInstruction, decode_program};

fn new_asm() -> AssemblerRef {
    Assembler::new_shared(&MemoryResourceGroup::new()).unwrap()
}

fn program(asm: &AssemblerRef) -> Vec<DecodedInstruction> {
    let mut a = asm.borrow_mut();
    a.raw_emitter().emit_command_pool_end().unwrap();
    a.set_status(CanvasStatus::Finished);
    decode_program(&a.writer().buffers()).unwrap()
}

fn create_paint(asm: &AssemblerRef) -> TypedMemOp {
    asm.borrow_mut()
        .allocate_with_ref(MemOpType::Paint, |op, asm| {
            asm.emitter()?.emit_heap_create_paint(op)
        })
        .unwrap()
}

#[test]
fn handles_start_at_one_and_are_seeded_with_one_ref() {
    let asm = new_asm();
    let a = create_paint(&asm);
    let b = create_paint(&asm);
    assert_eq!(a.op, MemOp(1));
    assert_eq!(b.op, MemOp(2));
    assert_eq!(asm.borrow().ref_count(a.op), 1);
    assert_eq!(asm.borrow().stats().live_handles, 2);
}

#[test]
fn free_is_emitted_once_on_last_unref() {
    let asm = new_asm();
    let p = create_paint(&asm);
    {
        let mut a = asm.borrow_mut();
        a.add_ref(p).unwrap();
        a.add_ref(p).unwrap();
        assert_eq!(a.ref_count(p.op), 3);
        a.unref(p).unwrap();
        a.unref(p).unwrap();
        assert_eq!(a.ref_count(p.op), 1);
        a.unref(p).unwrap();
        assert_eq!(a.ref_count(p.op), 0);

        let err = a.unref(p).unwrap_err();
        assert!(matches!(err, VgirError::Assembler(_)));
    }
    let prog = program(&asm);
    let frees: Vec<_> = prog
        .iter()
        .filter(|i| i.opcode == Opcode::HeapFree)
        .collect();
    assert_eq!(frees.len(), 1);
    assert_eq!(
        frees[0].operand("key").and_then(|v| v.as_mem_op()),
        Some(p.op)
    );
}

#[test]
fn null_handle_is_a_null_reference() {
    let asm = new_asm();
    let null = TypedMemOp {
        op: MemOp::NULL,
        ty: MemOpType::Shader,
    };
    let err = asm.borrow_mut().add_ref(null).unwrap_err();
    assert!(matches!(
        err,
        VgirError::NullReference {
            type_name: "shader"
        }
    ));
    assert!(asm.borrow_mut().unref(null).is_err());
}

#[test]
fn locals_are_untracked() {
    let asm = new_asm();
    let r = asm
        .borrow_mut()
        .allocate_local_rect(Rect::new(1.0, 2.0, 11.0, 22.0))
        .unwrap();
    let arr = asm
        .borrow_mut()
        .allocate_local_f32_array(&[0.5, 1.5])
        .unwrap();
    {
        let mut a = asm.borrow_mut();
        assert_eq!(a.ref_count(r), 0);
        a.free_locals(&[r, MemOp::NULL, arr]).unwrap();
        let stats = a.stats();
        assert_eq!(stats.live_handles, 0);
        assert_eq!(stats.allocated, 2);
        assert_eq!(stats.freed, 2);
    }

    let prog = program(&asm);
    let ops: Vec<_> = prog.iter().map(|i| i.opcode).collect();
    assert_eq!(
        ops,
        vec![
            Opcode::HeapCreateRect,
            Opcode::HeapCreateF32Array,
            Opcode::HeapF32ArrayStore,
            Opcode::HeapF32ArrayStore,
            Opcode::HeapFree,
            Opcode::HeapFree,
            Opcode::CommandPoolEnd,
        ]
    );
    assert_eq!(prog[0].operand("w"), Some(OperandValue::F32(10.0)));
    assert_eq!(prog[0].operand("h"), Some(OperandValue::F32(20.0)));
    assert_eq!(prog[3].operand("idx"), Some(OperandValue::U32(1)));
}

#[test]
fn nothing_is_emitted_after_recording_stops() {
    let asm = new_asm();
    let p = create_paint(&asm);
    asm.borrow_mut().set_status(CanvasStatus::Finished);
    let mut a = asm.borrow_mut();
    assert!(matches!(
        a.allocate_local_vec2(Vec2::new(1.0, 1.0)),
        Err(VgirError::InvalidState(_))
    ));
    assert!(matches!(a.unref(p), Err(VgirError::InvalidState(_))));
    assert!(a.emitter().is_err());
}

#[test]
fn ownership_is_checked_by_identity() {
    let a = new_asm();
    let b = new_asm();
    assert!(a.borrow().owns(&a));
    assert!(!a.borrow().owns(&b));
    let err = a
        .borrow()
        .check_ownership(&b, MemOpType::Path)
        .unwrap_err();
    assert!(matches!(err, VgirError::Ownership(_)));
}

#[test]
fn failed_factory_leaves_no_tracked_entry() {
    let asm = new_asm();
    let err = asm
        .borrow_mut()
        .allocate_with_ref(MemOpType::Paint, |_, _| Err(VgirError::argument("boom")))
        .unwrap_err();
    assert!(matches!(err, VgirError::Argument(_)));
    assert_eq!(asm.borrow().stats().live_handles, 0);
}

#[test]
fn reentrant_borrow_is_invalid_state() {
    let asm = new_asm();
    let _held = asm.borrow_mut();
    assert!(matches!(
        borrow_assembler(&asm),
        Err(VgirError::InvalidState(_))
    ));
}

#[test]
fn add_ref_does_not_revive_a_freed_handle() {
    let asm = new_asm();
    let p = create_paint(&asm);
    let mut a = asm.borrow_mut();
    a.unref(p).unwrap();
    assert!(matches!(a.add_ref(p), Err(VgirError::Assembler(_))));
    assert_eq!(a.ref_count(p.op), 0);
}

#[test]
fn failed_free_keeps_the_handle_tracked() {
    let asm = new_asm();
    let p = create_paint(&asm);
    let mut a = asm.borrow_mut();
    a.writer_mut().dispose().unwrap();
    assert!(a.unref(p).is_err());
    assert_eq!(a.ref_count(p.op), 1);
    assert_eq!(a.stats().freed, 0);
}
