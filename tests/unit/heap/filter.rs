use super::*;
use crate::canvas::{Canvas, DecodingCompiler};
use crate::heap::Paint;
use crate::ir::opcode::Opcode;
use crate::ir::operand::OperandValue;
use crate::ir::pool::MemoryResourceGroup;

#[test]
fn constructors_validate_their_arrays() {
    assert!(matches!(
        ColorFilter::matrix(&[0.0; 19]),
        Err(VgirError::Argument(_))
    ));
    assert!(ColorFilter::matrix(&[0.0; COLOR_MATRIX_LEN]).is_ok());

    for bad in [&[][..], &[1.0][..], &[1.0, 2.0, 3.0][..]] {
        assert!(matches!(
            PathEffect::dash(bad, 0.0),
            Err(VgirError::Argument(_))
        ));
    }
    assert!(PathEffect::dash(&[4.0, 2.0], 1.0).is_ok());

    assert!(matches!(
        ImageFilter::matrix_convolution(
            (3, 3),
            &[1.0; 8],
            1.0,
            0.0,
            (1, 1),
            TileMode::Clamp,
            false,
            None,
            None,
        ),
        Err(VgirError::Argument(_))
    ));
    assert!(matches!(
        ImageFilter::matrix_convolution(
            (2, 2),
            &[1.0; 4],
            1.0,
            0.0,
            (2, 0),
            TileMode::Clamp,
            false,
            None,
            None,
        ),
        Err(VgirError::Argument(_))
    ));
}

#[test]
fn image_filter_graph_is_emitted_inputs_first() {
    let g = MemoryResourceGroup::new();
    let mut canvas = Canvas::new(&g, 64.0, 64.0).unwrap();
    let blur = ImageFilter::blur(
        2.0,
        2.0,
        TileMode::Decal,
        None,
        Some(Rect::new(0.0, 0.0, 32.0, 32.0)),
    );
    let shadow = ImageFilter::drop_shadow(
        Vec2::new(3.0, 4.0),
        Vec2::new(1.0, 1.0),
        0x8000_0000,
        Some(&blur),
        None,
    );
    let graded = ImageFilter::color_filter(
        &ColorFilter::compose(
            &ColorFilter::blend_mode(0xff00_00ff, BlendMode::SrcIn),
            &ColorFilter::matrix(&[0.5; COLOR_MATRIX_LEN]).unwrap(),
        ),
        Some(&shadow),
        None,
    );
    let paint = Paint::new(&canvas).unwrap();
    paint.set_image_filter(Some(&graded)).unwrap();
    paint
        .set_mask_filter(Some(&MaskFilter::blur(BlurStyle::Outer, 1.5, true)))
        .unwrap();
    paint
        .set_path_effect(Some(&PathEffect::corner(4.0)))
        .unwrap();
    // clearing emits a null handle
    paint.set_path_effect(None).unwrap();
    canvas.finish().unwrap();

    let pic = canvas.submit(&mut DecodingCompiler::new()).unwrap();
    let creates: Vec<_> = pic
        .body()
        .iter()
        .map(|i| i.opcode)
        .filter(|op| op.name().starts_with("HeapCreate") && *op != Opcode::HeapCreateRect)
        .filter(|op| *op != Opcode::HeapCreateF32Array)
        .collect();
    assert_eq!(
        creates,
        vec![
            Opcode::HeapCreatePaint,
            Opcode::HeapCreateBlendModeColorFilter,
            Opcode::HeapCreateMatrixColorFilter,
            Opcode::HeapCreateComposeColorFilter,
            Opcode::HeapCreateBlurImageFilter,
            Opcode::HeapCreateDropShadowImageFilter,
            Opcode::HeapCreateColorFilterImageFilter,
            Opcode::HeapCreateBlurMaskFilter,
            Opcode::HeapCreateCornerPathEffect,
        ]
    );
    let last_effect = pic
        .instructions
        .iter()
        .rfind(|i| i.opcode == Opcode::PaintSetPathEffect)
        .unwrap();
    assert_eq!(
        last_effect.operand("effect"),
        Some(OperandValue::MemOp(MemOp::NULL))
    );
}

#[test]
fn matrix_transform_uses_a_temporary_matrix() {
    let g = MemoryResourceGroup::new();
    let mut canvas = Canvas::new(&g, 8.0, 8.0).unwrap();
    let identity = [
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.0, 0.0, 0.0, 1.0),
    ];
    let f = ImageFilter::matrix_transform(identity, &SamplingOptions::cubic_mitchell(), None);
    Paint::new(&canvas)
        .unwrap()
        .set_image_filter(Some(&f))
        .unwrap();
    canvas.finish().unwrap();
    let pic = canvas.submit(&mut DecodingCompiler::new()).unwrap();
    assert_eq!(pic.count(Opcode::HeapCreateM44), 1);
    assert_eq!(pic.count(Opcode::M44SetRows), 1);
    // four row vectors plus the matrix itself
    assert_eq!(pic.count(Opcode::HeapFree), 5);
    assert_eq!(pic.count(Opcode::HeapCreateSamplingOptionsCubicMitchell), 1);
}
