use super::*;
use crate::render::recorder::IrInst;

fn names(rec: &RenderTreeRecorder) -> Vec<&'static str> {
    rec.instructions().iter().map(IrInst::name).collect()
}

#[test]
fn uids_are_never_reused() {
    let mut tree = RenderTree::new();
    let a = tree.new_painter();
    let uid_a = tree.uid(a).unwrap();
    tree.remove(a).unwrap();
    assert!(!tree.contains(a));

    let b = tree.new_painter();
    assert_eq!(a, b, "slot is recycled");
    assert_ne!(tree.uid(b).unwrap(), uid_a);
    assert_eq!(tree.len(), 1);
}

#[test]
fn children_are_unique_and_removal_is_recursive() {
    let mut tree = RenderTree::new();
    let root = tree.new_composite();
    let group = tree.new_composite();
    let p = tree.new_painter();
    tree.append_child(root, group).unwrap();
    tree.append_child(group, p).unwrap();
    tree.append_child(group, p).unwrap();
    match tree.get(group).unwrap() {
        NodeKind::Composite(c) => assert_eq!(c.children().collect::<Vec<_>>(), vec![p]),
        _ => panic!("expected a composite"),
    }

    assert!(matches!(
        tree.append_child(p, root),
        Err(VgirError::Argument(_))
    ));
    assert!(matches!(
        tree.append_child(root, root),
        Err(VgirError::Argument(_))
    ));

    tree.remove_child(root, group).unwrap();
    tree.remove(group).unwrap();
    assert!(!tree.contains(p));
    assert_eq!(tree.len(), 1);
}

#[test]
fn attributes_push_layers_in_a_fixed_order() {
    let mut tree = RenderTree::new();
    let root = tree.new_composite();
    let p = tree.new_painter();
    tree.append_child(root, p).unwrap();
    {
        let attrs = tree.attributes_mut(root).unwrap();
        attrs.set_opacity(0.5).unwrap();
        attrs.set_backdrop_filter(
            ImageFilter::offset(1.0, 1.0, None, None),
            BlendMode::SrcOver,
            true,
        );
        attrs.set_image_filter(ImageFilter::offset(2.0, 2.0, None, None));
        attrs.set_rect_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        attrs.set_rotate(0.5, Point::ZERO);
        attrs.set_offset(Vec2::new(3.0, 4.0));
        assert!(attrs.has_transform());
    }

    let rec = tree.compose(root).unwrap();
    assert_eq!(
        names(&rec),
        vec![
            "PushOffset",
            "PushRotate",
            "PushRectClip",
            "PushImageFilter",
            "PushBackdropFilter",
            "PushOpacity",
            "DrawPainter",
            "Pop",
            "Pop",
            "Pop",
            "Pop",
            "Pop",
            "Pop",
        ]
    );

    let attrs = tree.attributes_mut(root).unwrap();
    attrs.reset_all();
    attrs.set_rotate(0.0, Point::ZERO);
    assert!(!attrs.has_transform());
    assert_eq!(names(&tree.compose(root).unwrap()), vec!["DrawPainter"]);
}

#[test]
fn opacity_must_be_non_negative() {
    let mut attrs = CompositeAttributes::default();
    assert!(matches!(
        attrs.set_opacity(-0.1),
        Err(VgirError::Argument(_))
    ));
    assert!(matches!(
        attrs.set_opacity(f32::NAN),
        Err(VgirError::Argument(_))
    ));
    attrs.set_opacity(0.0).unwrap();
    assert_eq!(attrs.opacity(), Some(0.0));
}

#[test]
fn painter_updates_mark_dirty() {
    let mut tree = RenderTree::new();
    let p = tree.new_painter();
    assert!(!tree.painter(p).unwrap().is_dirty());
    assert!(!tree.painter(p).unwrap().has_callback());

    tree.update_painter(p, Rect::new(0.0, 0.0, 4.0, 4.0), |_| Ok(()))
        .unwrap();
    let painter = tree.painter(p).unwrap();
    assert!(painter.is_dirty());
    assert_eq!(painter.bounds(), Rect::new(0.0, 0.0, 4.0, 4.0));

    assert!(matches!(
        tree.update_painter(p, Rect::new(0.0, 0.0, f64::INFINITY, 1.0), |_| Ok(())),
        Err(VgirError::Argument(_))
    ));
    let c = tree.new_composite();
    assert!(matches!(
        tree.update_painter(c, Rect::ZERO, |_| Ok(())),
        Err(VgirError::Argument(_))
    ));
}

#[test]
fn texture_buffers_are_composed_once() {
    let mut tree = RenderTree::new();
    let root = tree.new_composite();
    let t = tree.new_texture_buffer();
    tree.append_child(root, t).unwrap();
    tree.update_texture_buffer(
        t,
        Some(TextureBuffer {
            id: 1,
            width: 8,
            height: 6,
        }),
        FilterMode::Linear,
        None,
    )
    .unwrap();

    let rec = tree.compose(root).unwrap();
    match &rec.instructions()[0] {
        IrInst::DrawTextureBuffer { buffer, rect, .. } => {
            assert_eq!(buffer.id, 1);
            assert_eq!(*rect, Rect::new(0.0, 0.0, 8.0, 6.0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(tree.compose(root).unwrap().is_empty());
}

#[test]
fn dangling_children_fail_compose() {
    let mut tree = RenderTree::new();
    let root = tree.new_composite();
    let p = tree.new_painter();
    tree.append_child(root, p).unwrap();
    tree.remove(p).unwrap();
    assert!(matches!(tree.compose(root), Err(VgirError::InvalidState(_))));
}

#[test]
fn recycled_slots_are_not_mistaken_for_removed_children() {
    let mut tree = RenderTree::new();
    let root = tree.new_composite();
    let other_root = tree.new_composite();
    let p = tree.new_painter();
    tree.append_child(root, p).unwrap();
    tree.remove(p).unwrap();

    let q = tree.new_composite();
    assert_eq!(q, p);
    tree.append_child(other_root, q).unwrap();

    assert!(matches!(tree.compose(root), Err(VgirError::InvalidState(_))));
    assert!(tree.compose(other_root).is_ok());

    tree.remove(root).unwrap();
    assert!(!tree.contains(root));
    assert!(tree.contains(q));
    match tree.get(other_root).unwrap() {
        NodeKind::Composite(c) => assert_eq!(c.children().collect::<Vec<_>>(), vec![q]),
        _ => panic!("expected a composite"),
    }
}
