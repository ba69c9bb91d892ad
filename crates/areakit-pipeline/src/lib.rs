//! areakit-pipeline: Pure region extraction core (sans-IO).
//!
//! Turns a stack of transparent sprite frames into an anchor-relative
//! outline through:
//! mask building -> expand/crop -> boundary extraction ->
//! coordinate normalization -> simplification.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! frames and returns structured data. File loading, sidecar writing,
//! and previews live in `areakit-export` and the `areakit` CLI.
//!
//! Interactive hosts drive a [`Collecting`] session; batch callers use
//! [`extract_region`].

pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod frames;
pub mod mask;
pub mod morphology;
pub mod normalize;
pub mod placement;
pub mod session;
pub mod simplify;
pub mod types;

pub use contour::{BoundaryOrder, BoundaryOrderKind};
pub use diagnostics::FinalizeDiagnostics;
pub use frames::FrameStack;
pub use mask::{BrushDab, EllipseParams, MaskStrategy, PaintCanvas};
pub use morphology::{CropFractions, MorphologyParams};
pub use normalize::{AnchorStrategy, ScaleContext};
pub use placement::PlacedRegion;
pub use session::{Collecting, Committed, Session};
pub use types::{
    AnchorConvention, BinaryMask, CoordSpace, Dimensions, EllipseOffsets, GrayImage, PixelPoint,
    RegionConfig, RegionDescriptor, RegionError, RegionKind, RgbaImage,
};

/// Run a whole session non-interactively.
///
/// Builds the mask described by `strategy` over `frames`, extracts and
/// orders its boundary, converts to anchor-relative offsets, and
/// simplifies. Canvas inputs in `strategy` (brush dabs, ellipse) are
/// clamped like live input and interpreted through `scale`.
///
/// # Steps
///
/// 1. Mask building (paint fold, alpha union + expand/crop, or ellipse)
/// 2. Boundary extraction in original space (ordering per `config`)
/// 3. Anchor computation and anchor-relative conversion
/// 4. Ramer-Douglas-Peucker simplification
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameter`] for unusable parameters,
/// [`RegionError::NoBoundaryPoints`] for an empty mask, and
/// [`RegionError::TooFewPoints`] for a single-pixel region.
pub fn extract_region(
    frames: &FrameStack,
    strategy: &MaskStrategy,
    scale: &ScaleContext,
    config: &RegionConfig,
) -> Result<RegionDescriptor, RegionError> {
    extract_region_with_diagnostics(frames, strategy, scale, config).map(|(d, _)| d)
}

/// Like [`extract_region`], also returning per-stage diagnostics.
///
/// # Errors
///
/// See [`extract_region`].
pub fn extract_region_with_diagnostics(
    frames: &FrameStack,
    strategy: &MaskStrategy,
    scale: &ScaleContext,
    config: &RegionConfig,
) -> Result<(RegionDescriptor, FinalizeDiagnostics), RegionError> {
    Collecting::from_strategy(frames.clone(), strategy, *scale, config.clone())?
        .commit()?
        .finish_with_diagnostics()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;

    fn frames_with(pixels: &[(u32, u32)], w: u32, h: u32) -> FrameStack {
        let mut frame = RgbaImage::new(w, h);
        for &(x, y) in pixels {
            frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
        FrameStack::new(vec![frame]).unwrap()
    }

    #[test]
    fn alpha_union_region_is_anchor_relative() {
        let pixels: Vec<(u32, u32)> = (2..6).flat_map(|y| (3..7).map(move |x| (x, y))).collect();
        let frames = frames_with(&pixels, 10, 10);
        let d = extract_region(
            &frames,
            &MaskStrategy::AlphaUnion(MorphologyParams::default()),
            &ScaleContext::identity(),
            &RegionConfig::default(),
        )
        .unwrap();
        assert_eq!(d.original_anchor, PixelPoint::new(5, 10));
        for p in d.absolute_points() {
            assert!((3..7).contains(&p.x) && (2..6).contains(&p.y), "{p:?}");
        }
    }

    #[test]
    fn ellipse_region_matches_reference_offsets() {
        let frames = frames_with(&[], 100, 100);
        let d = extract_region(
            &frames,
            &MaskStrategy::Ellipse(EllipseParams {
                center: PixelPoint::new(50, 50),
                width: 20,
                height: 10,
            }),
            &ScaleContext::identity(),
            &RegionConfig::default(),
        )
        .unwrap();
        assert_eq!(
            d.ellipse,
            Some(EllipseOffsets {
                x: 0,
                y: -50,
                w: 20,
                h: 10
            })
        );
    }

    #[test]
    fn invalid_epsilon_fails_before_work() {
        let frames = frames_with(&[(1, 1)], 4, 4);
        let config = RegionConfig {
            epsilon: f64::NAN,
            ..RegionConfig::default()
        };
        let err = extract_region(
            &frames,
            &MaskStrategy::AlphaUnion(MorphologyParams::default()),
            &ScaleContext::identity(),
            &config,
        )
        .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn off_canvas_ellipse_is_pulled_back_onto_the_frame() {
        let frames = FrameStack::new(vec![RgbaImage::new(40, 40)]).unwrap();
        let d = extract_region(
            &frames,
            &MaskStrategy::Ellipse(EllipseParams {
                center: PixelPoint::new(200, 20),
                width: 10,
                height: 10,
            }),
            &ScaleContext::identity(),
            &RegionConfig::default(),
        )
        .unwrap();
        assert_eq!(d.ellipse.map(|e| e.x), Some(20));
    }

    #[test]
    fn diagnostics_accompany_descriptor() {
        let pixels: Vec<(u32, u32)> = (0..10).flat_map(|y| (0..10).map(move |x| (x, y))).collect();
        let frames = frames_with(&pixels, 20, 20);
        let (d, diag) = extract_region_with_diagnostics(
            &frames,
            &MaskStrategy::AlphaUnion(MorphologyParams::default()),
            &ScaleContext::identity(),
            &RegionConfig::default(),
        )
        .unwrap();
        assert_eq!(diag.summary.boundary_point_count, 36);
        assert_eq!(diag.summary.final_point_count, d.points.len());
    }
}
