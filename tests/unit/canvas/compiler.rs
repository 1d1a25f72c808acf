use super::*;
use crate::heap::binder::ExternalImage;
use crate::ir::emitter::Emitter;
use crate::ir::pool::MemoryResourceGroup;
use crate::ir::writer::InstructionWriter;

fn compile_raw(
    binder: &HeapObjectBinder,
    profiling: bool,
    emit: impl FnOnce(&mut Emitter<'_>),
) -> VgirResult<CompiledPicture> {
    let g = MemoryResourceGroup::new();
    let mut w = InstructionWriter::new(&g).unwrap();
    {
        let mut e = Emitter::new(&mut w);
        emit(&mut e);
        e.emit_command_pool_end().unwrap();
    }
    let mut breakpoints = BTreeMap::new();
    DecodingCompiler::new().compile(Submission {
        buffers: w.buffers(),
        binder,
        heap_profiling: profiling,
        breakpoints: &mut breakpoints,
    })
}

#[test]
fn profile_counts_allocations_and_leaks() {
    let binder = HeapObjectBinder::default();
    let pic = compile_raw(&binder, true, |e| {
        e.emit_draw_bounds(10.0, 10.0).unwrap();
        e.emit_heap_create_paint(MemOp(1)).unwrap();
        e.emit_heap_create_rect(MemOp(2), 0.0, 0.0, 1.0, 1.0).unwrap();
        e.emit_heap_create_rect(MemOp(3), 0.0, 0.0, 1.0, 1.0).unwrap();
        e.emit_draw_rect(MemOp(2), MemOp(1)).unwrap();
        e.emit_heap_free(MemOp(2)).unwrap();
        e.emit_heap_free(MemOp(3)).unwrap();
    })
    .unwrap();
    assert_eq!(
        pic.profile,
        Some(HeapProfile {
            allocations: 3,
            frees: 2,
            peak_live: 3,
            leaked: vec![MemOp(1)],
        })
    );
    assert_eq!(pic.body().len(), 6);
}

#[test]
fn profile_is_skipped_unless_requested() {
    let binder = HeapObjectBinder::default();
    let pic = compile_raw(&binder, false, |e| {
        e.emit_draw_bounds(1.0, 1.0).unwrap();
    })
    .unwrap();
    assert!(pic.profile.is_none());
    assert!(pic.body().is_empty());
}

#[test]
fn rejects_use_of_undefined_or_freed_handles() {
    let binder = HeapObjectBinder::default();
    let err = compile_raw(&binder, false, |e| {
        e.emit_draw_bounds(1.0, 1.0).unwrap();
        e.emit_draw_paint(MemOp(4)).unwrap();
    })
    .unwrap_err();
    assert!(err.to_string().contains("uses undefined handle %0x4"));

    let err = compile_raw(&binder, false, |e| {
        e.emit_draw_bounds(1.0, 1.0).unwrap();
        e.emit_heap_create_paint(MemOp(1)).unwrap();
        e.emit_heap_free(MemOp(1)).unwrap();
        e.emit_heap_free(MemOp(1)).unwrap();
    })
    .unwrap_err();
    assert!(err.to_string().contains("not live"));

    let err = compile_raw(&binder, false, |e| {
        e.emit_draw_bounds(1.0, 1.0).unwrap();
        e.emit_heap_create_paint(MemOp(1)).unwrap();
        e.emit_heap_create_path(MemOp(1)).unwrap();
    })
    .unwrap_err();
    assert!(matches!(err, VgirError::Decode(_)));
}

#[test]
fn binder_handles_count_as_defined() {
    let mut binder = HeapObjectBinder::default();
    binder.bind_image(
        MemOp(5),
        ExternalImage {
            id: 1,
            width: 2,
            height: 2,
        },
    );
    compile_raw(&binder, false, |e| {
        e.emit_draw_bounds(4.0, 4.0).unwrap();
        e.emit_draw_image(MemOp(5), 0.0, 0.0, MemOp::NULL, MemOp::NULL)
            .unwrap();
        e.emit_heap_free(MemOp(5)).unwrap();
    })
    .unwrap();
}

#[test]
fn requires_leading_draw_bounds_and_known_breakpoints() {
    let binder = HeapObjectBinder::default();
    let err = compile_raw(&binder, false, |e| {
        e.emit_save().unwrap();
    })
    .unwrap_err();
    assert!(err.to_string().contains("DrawBounds"));

    let err = compile_raw(&binder, false, |e| {
        e.emit_draw_bounds(1.0, 1.0).unwrap();
        e.emit_debug_breakpoint(3).unwrap();
    })
    .unwrap_err();
    assert!(err.to_string().contains("breakpoint 3"));
}
