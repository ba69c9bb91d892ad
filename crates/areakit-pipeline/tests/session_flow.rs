//! Whole-session scenarios driven through the public API.

#![allow(clippy::unwrap_used)]

use areakit_pipeline::{
    BoundaryOrderKind, CropFractions, FrameStack, PixelPoint, RegionConfig, RegionError,
    RegionKind, RgbaImage, ScaleContext, Session,
};
use image::{ImageEncoder, Rgba};

fn encode(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

fn square_frames() -> FrameStack {
    let frame = RgbaImage::from_fn(20, 20, |x, y| {
        if x < 10 && y < 10 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    FrameStack::decode([encode(&frame)]).unwrap()
}

#[test]
fn decoded_frames_union_exactly_their_opaque_pixels() {
    let mut a = RgbaImage::new(4, 4);
    a.put_pixel(1, 1, Rgba([0, 0, 0, 1]));
    let mut b = RgbaImage::new(4, 4);
    b.put_pixel(2, 2, Rgba([9, 9, 9, 200]));

    let frames = FrameStack::decode([encode(&a), encode(&b)]).unwrap();
    let occupied: Vec<PixelPoint> = frames.alpha_union().occupied().collect();
    assert_eq!(occupied, vec![PixelPoint::new(1, 1), PixelPoint::new(2, 2)]);
}

#[test]
fn square_scenario_in_both_orders() {
    let mut session =
        Session::new(square_frames(), ScaleContext::identity(), RegionConfig::default()).unwrap();
    session.select_mode(RegionKind::Mask);
    let committed = session.commit().unwrap();
    assert_eq!(committed.boundary().len(), 36);
    assert_eq!(committed.anchor(), PixelPoint::new(10, 20));
    let scan = committed.finish().unwrap();
    let scan_points: Vec<(i32, i32)> = scan.points.iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(
        scan_points,
        [
            (-10, -20),
            (-1, -20),
            (-10, -19),
            (-1, -19),
            (-10, -18),
            (-1, -18),
            (-10, -17),
            (-1, -17),
            (-10, -16),
            (-1, -16),
            (-10, -15),
            (-1, -13),
            (-10, -12),
            (-1, -12),
            (-10, -11),
            (-1, -11),
        ]
    );

    let config = RegionConfig {
        boundary_order: BoundaryOrderKind::Traced,
        ..RegionConfig::default()
    };
    let mut session = Session::new(square_frames(), ScaleContext::identity(), config).unwrap();
    session.select_mode(RegionKind::Mask);
    let traced = session.commit().unwrap().finish().unwrap();
    assert!((4..=8).contains(&traced.points.len()), "{:?}", traced.points);
    for p in traced.absolute_points() {
        assert!((0..10).contains(&p.x) && (0..10).contains(&p.y), "{p:?}");
    }
}

#[test]
fn expand_then_crop_shapes_the_mask() {
    let mut session =
        Session::new(square_frames(), ScaleContext::identity(), RegionConfig::default()).unwrap();
    session.select_mode(RegionKind::Mask);
    session.nudge_expand(5);
    session.nudge_expand(-3);
    session
        .set_crop(CropFractions {
            top: 0.5,
            ..CropFractions::default()
        })
        .unwrap();
    let committed = session.commit().unwrap();
    let (lo, hi) = committed.mask().bounding_box().unwrap();
    assert_eq!(lo, PixelPoint::new(0, 10));
    assert_eq!(hi, PixelPoint::new(11, 11));
}

#[test]
fn painting_on_a_half_scale_canvas_lands_in_original_space() {
    let frames = FrameStack::new(vec![RgbaImage::new(40, 40)]).unwrap();
    let scale = ScaleContext::new(0.5).unwrap();
    let mut session = Session::new(frames, scale, RegionConfig::default()).unwrap();
    assert_eq!(session.display_dimensions().width, 20);

    session.select_mode(RegionKind::Draw);
    session.set_brush_radius(3);
    session.paint_at(PixelPoint::new(10, 10));
    session.paint_at(PixelPoint::new(-50, 500));
    assert_eq!(session.dabs()[1].center, PixelPoint::new(0, 19));

    let committed = session.commit().unwrap();
    let mask = committed.mask();
    assert_eq!(mask.dimensions().width, 40);
    assert!(mask.get(20, 20));
    assert!(!mask.get(30, 5));

    let d = committed.finish().unwrap();
    assert_eq!(d.kind, RegionKind::Draw);
    assert_eq!(d.original_anchor, PixelPoint::new(20, 40));
}

#[test]
fn switching_modes_discards_previous_input() {
    let frames = FrameStack::new(vec![RgbaImage::new(30, 30)]).unwrap();
    let mut session = Session::new(frames, ScaleContext::identity(), RegionConfig::default()).unwrap();
    session.select_mode(RegionKind::Draw);
    session.paint_at(PixelPoint::new(5, 5));
    assert_eq!(session.dabs().len(), 1);

    session.select_mode(RegionKind::Circle);
    session.paint_at(PixelPoint::new(6, 6));
    session.select_mode(RegionKind::Draw);
    assert!(session.dabs().is_empty());
}

#[test]
fn transparent_frames_report_degenerate_geometry() {
    let frames = FrameStack::new(vec![RgbaImage::new(8, 8)]).unwrap();
    let mut session = Session::new(frames, ScaleContext::identity(), RegionConfig::default()).unwrap();
    session.select_mode(RegionKind::Mask);
    let err = session.commit().unwrap_err();
    assert!(matches!(err, RegionError::NoBoundaryPoints));
    assert!(err.is_degenerate());
}

#[test]
fn commit_without_mode_is_an_input_error() {
    let session = Session::new(square_frames(), ScaleContext::identity(), RegionConfig::default()).unwrap();
    assert!(session.commit().unwrap_err().is_input_error());
}
