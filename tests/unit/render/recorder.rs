use super::*;
use crate::canvas::{CanvasOpts, CompiledPicture, DecodingCompiler};
use crate::heap::paint::Paint;
use crate::ir::opcode::Opcode;
use crate::ir::operand::OperandValue;
use crate::ir::pool::MemoryResourceGroup;
use crate::render::scene::{
    IrPictureRecorder, NullLogger, RecordedScene, RecordingSceneBuilder, SceneCommand,
};
use std::rc::Rc;

type Pictures = IrPictureRecorder<DecodingCompiler>;

fn pictures() -> Pictures {
    IrPictureRecorder::new(
        MemoryResourceGroup::new(),
        CanvasOpts::default(),
        DecodingCompiler::new(),
    )
}

fn painter(tree: &mut RenderTree, bounds: Rect) -> NodeIdx {
    let p = tree.new_painter();
    tree.update_painter(p, bounds, |canvas| {
        let paint = Paint::new(canvas)?;
        canvas.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &paint)
    })
    .unwrap();
    p
}

fn run(
    rec: RenderTreeRecorder,
    tree: &mut RenderTree,
    ctx: &mut LinearizationContext<Rc<CompiledPicture>>,
    pics: &mut Pictures,
) -> VgirResult<RecordedScene<Rc<CompiledPicture>>> {
    rec.generate(
        tree,
        Size::new(200.0, 100.0),
        ctx,
        pics,
        &mut RecordingSceneBuilder::new(),
        &mut NullLogger,
    )
}

#[test]
fn consecutive_painters_share_one_picture() {
    let mut tree = RenderTree::new();
    let a = painter(&mut tree, Rect::new(10.0, 20.0, 30.0, 40.0));
    let b = painter(&mut tree, Rect::new(50.0, 5.0, 60.0, 15.0));
    let c = painter(&mut tree, Rect::new(0.0, 0.0, 5.0, 5.0));

    let mut rec = RenderTreeRecorder::new();
    rec.draw_painter(&tree, a).unwrap();
    rec.draw_painter(&tree, b).unwrap();
    rec.push_opacity(0.5);
    rec.draw_painter(&tree, c).unwrap();
    rec.pop();

    let mut ctx = LinearizationContext::new();
    let mut pics = pictures();
    let scene = run(rec, &mut tree, &mut ctx, &mut pics).unwrap();

    assert_eq!(pics.recorded(), 2);
    assert_eq!(ctx.len(), 2);
    let placed: Vec<_> = scene
        .pictures()
        .map(|(p, origin)| (p.bounds, origin))
        .collect();
    assert_eq!(
        placed,
        vec![
            (Size::new(50.0, 35.0), Point::new(10.0, 5.0)),
            (Size::new(5.0, 5.0), Point::ZERO),
        ]
    );

    // each painter is shifted by its offset from the union origin
    let first = scene.pictures().next().unwrap().0;
    let shifts: Vec<_> = first
        .instructions
        .iter()
        .filter(|i| i.opcode == Opcode::Translate)
        .map(|i| (i.operand("dx"), i.operand("dy")))
        .collect();
    assert_eq!(
        shifts,
        vec![
            (Some(OperandValue::F32(0.0)), Some(OperandValue::F32(15.0))),
            (Some(OperandValue::F32(40.0)), Some(OperandValue::F32(0.0))),
        ]
    );
    assert_eq!(first.count(Opcode::Save), 2);
    assert_eq!(first.count(Opcode::Restore), 2);

    assert!(!tree.painter(a).unwrap().is_dirty());
    assert!(!tree.painter(b).unwrap().is_dirty());
}

#[test]
fn layers_are_wrapped_in_a_root_offset() {
    let mut tree = RenderTree::new();
    let mut rec = RenderTreeRecorder::new();
    rec.push_rotate(1.0, Point::new(2.0, 3.0));
    rec.isolate_layer();
    rec.pop();
    let scene = run(rec, &mut tree, &mut LinearizationContext::new(), &mut pictures()).unwrap();
    assert!(matches!(
        scene.commands.as_slice(),
        [
            SceneCommand::PushOffset(v),
            SceneCommand::PushRotate { .. },
            SceneCommand::Pop,
            SceneCommand::Pop,
        ] if *v == Vec2::ZERO
    ));
}

#[test]
fn static_textures_abort_the_frame_before_the_checkpoint() {
    let mut tree = RenderTree::new();
    let a = painter(&mut tree, Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut ctx = LinearizationContext::new();
    let mut pics = pictures();

    let mut rec = RenderTreeRecorder::new();
    rec.draw_painter(&tree, a).unwrap();
    run(rec, &mut tree, &mut ctx, &mut pics).unwrap();

    let image = ExternalImage {
        id: 4,
        width: 1,
        height: 1,
    };
    for _ in 0..10 {
        let mut rec = RenderTreeRecorder::new();
        rec.draw_texture(image, image.bounds());
        let err = run(rec, &mut tree, &mut ctx, &mut pics).unwrap_err();
        assert!(matches!(err, VgirError::NotImplemented(_)));
    }
    // aborted frames never aged the entry
    assert_eq!(ctx.len(), 1);
    assert_eq!(ctx.entries().next().unwrap().unused_cycles(), 0);
}

#[test]
fn failing_painters_abort_the_frame() {
    let mut tree = RenderTree::new();
    let p = tree.new_painter();
    tree.update_painter(p, Rect::new(0.0, 0.0, 4.0, 4.0), |_| {
        Err(VgirError::argument("painter failed"))
    })
    .unwrap();
    let mut ctx = LinearizationContext::new();
    let mut rec = RenderTreeRecorder::new();
    rec.draw_painter(&tree, p).unwrap();
    let err = run(rec, &mut tree, &mut ctx, &mut pictures()).unwrap_err();
    assert!(err.to_string().contains("painter failed"));
    assert!(ctx.is_empty());
    assert!(tree.painter(p).unwrap().is_dirty());
}

#[test]
fn removed_painters_are_detected() {
    let mut tree = RenderTree::new();
    let p = painter(&mut tree, Rect::new(0.0, 0.0, 4.0, 4.0));
    let mut rec = RenderTreeRecorder::new();
    rec.draw_painter(&tree, p).unwrap();
    tree.remove(p).unwrap();
    let q = tree.new_painter();
    assert_eq!(p, q);

    let err = run(rec, &mut tree, &mut LinearizationContext::new(), &mut pictures()).unwrap_err();
    assert!(matches!(err, VgirError::InvalidState(_)));
}

#[test]
fn painters_without_callbacks_draw_nothing() {
    let mut tree = RenderTree::new();
    let p = tree.new_painter();
    let mut rec = RenderTreeRecorder::new();
    rec.draw_painter(&tree, p).unwrap();
    let scene = run(rec, &mut tree, &mut LinearizationContext::new(), &mut pictures()).unwrap();
    let (pic, _) = scene.pictures().next().unwrap();
    assert_eq!(pic.count(Opcode::Translate), 1);
    assert_eq!(pic.count(Opcode::HeapCreatePaint), 0);
}
