use super::*;
use crate::canvas::{CompiledPicture, DecodingCompiler};
use crate::foundation::core::Rect;
use crate::heap::matrix::Matrix4x4;
use crate::heap::path::Path;
use crate::heap::rrect::RRect;
use crate::ir::opcode::Opcode;
use crate::ir::operand::OperandValue;
use crate::ir::pool::MemoryResourceGroup;

fn compile(mut canvas: Canvas) -> CompiledPicture {
    canvas.finish().unwrap();
    canvas.submit(&mut DecodingCompiler::new()).unwrap()
}

#[test]
fn alpha_is_clamped_and_nan_rejected() {
    let g = MemoryResourceGroup::new();
    let canvas = Canvas::new(&g, 10.0, 10.0).unwrap();
    let paint = Paint::new(&canvas).unwrap();
    paint.set_alpha(1.7).unwrap();
    paint.set_alpha(-0.2).unwrap();
    paint.set_alpha(0.25).unwrap();
    assert!(matches!(
        paint.set_alpha(f32::NAN),
        Err(VgirError::Argument(_))
    ));

    let pic = compile(canvas);
    let alphas: Vec<_> = pic
        .instructions
        .iter()
        .filter(|i| i.opcode == Opcode::PaintSetAlphaf)
        .filter_map(|i| i.operand("alpha").and_then(OperandValue::as_f32))
        .collect();
    assert_eq!(alphas, vec![1.0, 0.0, 0.25]);
}

#[test]
fn setters_emit_one_instruction_each() {
    let g = MemoryResourceGroup::new();
    let canvas = Canvas::new(&g, 10.0, 10.0).unwrap();
    let paint = Paint::new(&canvas).unwrap();
    paint.set_antialias(true).unwrap();
    paint.set_style_stroke(true).unwrap();
    paint.set_stroke_width(2.5).unwrap();
    paint.set_stroke_cap(PaintCap::Round).unwrap();
    paint.set_stroke_join(PaintJoin::Bevel).unwrap();
    paint.set_color_argb(0x80, 1, 2, 3).unwrap();
    paint.set_blend_mode(BlendMode::Screen).unwrap();
    paint.reset().unwrap();

    let pic = compile(canvas);
    let ops: Vec<_> = pic.body().iter().map(|i| i.opcode).collect();
    assert_eq!(
        ops,
        vec![
            Opcode::HeapCreatePaint,
            Opcode::PaintSetAntialias,
            Opcode::PaintSetStyleStroke,
            Opcode::PaintSetStrokeWidth,
            Opcode::PaintSetStrokeCap,
            Opcode::PaintSetStrokeJoin,
            Opcode::PaintSetColorARGB,
            Opcode::PaintSetBlendMode,
            Opcode::PaintReset,
        ]
    );
    assert_eq!(pic.body()[4].operand("cap"), Some(OperandValue::U8(1)));
    assert_eq!(pic.body()[6].operand("a"), Some(OperandValue::U8(0x80)));
}

#[test]
fn unref_of_owned_objects_frees_once() {
    let g = MemoryResourceGroup::new();
    let canvas = Canvas::new(&g, 10.0, 10.0).unwrap();
    let paint = Paint::new(&canvas).unwrap();
    let op = paint.mem_op();
    paint.add_ref().unwrap();
    paint.unref().unwrap();
    assert_eq!(canvas.ref_count(op).unwrap(), 1);
    paint.unref().unwrap();
    assert_eq!(canvas.ref_count(op).unwrap(), 0);
    assert!(matches!(paint.unref(), Err(VgirError::Assembler(_))));

    let pic = compile(canvas);
    assert_eq!(pic.count(Opcode::HeapFree), 1);
}

#[test]
fn path_checks_shapes_and_ownership() {
    let g = MemoryResourceGroup::new();
    let a = Canvas::new(&g, 10.0, 10.0).unwrap();
    let b = Canvas::new(&g, 10.0, 10.0).unwrap();
    let path = Path::new(&a).unwrap();
    let r = Rect::new(0.0, 0.0, 5.0, 5.0);

    assert!(matches!(
        path.add_round_rect(r, &[1.0; 7], false),
        Err(VgirError::Argument(_))
    ));
    assert!(matches!(
        path.add_poly(&[0.0, 0.0, 1.0], true),
        Err(VgirError::Argument(_))
    ));
    path.add_round_rect(r, &[1.0; 8], false).unwrap();
    path.add_poly(&[0.0, 0.0, 4.0, 0.0, 4.0, 4.0], true).unwrap();

    let foreign = Matrix4x4::new(&b).unwrap();
    assert!(matches!(
        path.transform(&foreign, None, false),
        Err(VgirError::Ownership(_))
    ));
    let m = Matrix4x4::new(&a).unwrap();
    let foreign_dst = Path::new(&b).unwrap();
    assert!(matches!(
        path.transform(&m, Some(&foreign_dst), false),
        Err(VgirError::Ownership(_))
    ));
    let dst = Path::new(&a).unwrap();
    path.transform(&m, Some(&dst), true).unwrap();

    let other = Matrix4x4::new(&b).unwrap();
    assert!(matches!(m.concat(&other), Err(VgirError::Ownership(_))));

    let pic = compile(a);
    assert_eq!(pic.count(Opcode::PathTransform), 1);
    assert_eq!(pic.count(Opcode::PathAddRoundRect), 1);
    // rect + radii, then the polygon array
    assert_eq!(pic.count(Opcode::HeapFree), 3);
}

#[test]
fn rrect_and_matrix_free_their_operands() {
    let g = MemoryResourceGroup::new();
    let canvas = Canvas::new(&g, 10.0, 10.0).unwrap();
    let rr = RRect::new(&canvas).unwrap();
    rr.set_rect_xy(Rect::new(0.0, 0.0, 8.0, 8.0), 2.0, 2.0).unwrap();
    rr.inset(1.0, 1.0).unwrap();
    let m = Matrix4x4::new(&canvas).unwrap();
    m.set_rect_to_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(0.0, 0.0, 2.0, 2.0))
        .unwrap();
    m.set_translate(1.0, 2.0, 0.0).unwrap();

    let pic = compile(canvas);
    assert_eq!(pic.count(Opcode::HeapFree), 3);
    assert_eq!(pic.count(Opcode::HeapCreateRect), 3);
}
