use super::*;

#[test]
fn color_argb_masks_instead_of_clamping() {
    assert_eq!(color_argb(0xff, 0x12, 0x34, 0x56), 0xff12_3456);
    assert_eq!(color_argb(0x1ff, 0x100, -1, 0), 0xff00_ff00);
}

#[test]
fn color_from_unorm_clamps_channels() {
    assert_eq!(color_from_unorm(1.0, 0.0, 0.0, 0.0), 0xff00_0000);
    assert_eq!(color_from_unorm(2.0, -1.0, 1.0, 0.5), 0xff00_ff80);
}

#[test]
fn rect_xywh_uses_origin_and_size() {
    let r = Rect::new(10.0, 20.0, 110.0, 70.0);
    assert_eq!(rect_xywh(r), [10.0, 20.0, 100.0, 50.0]);
}
