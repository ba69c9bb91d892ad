//! Mask building: freehand paint, alpha union, and parametric ellipse.
//!
//! [`MaskStrategy`] is the single entry point; [`build_mask`] dispatches
//! on the variant. Paint masks live on the canvas the user paints on,
//! alpha-union and ellipse masks in original space.
//!
//! Dab and ellipse positions are canvas coordinates: display pixels
//! measured from the image's top-left corner, with the
//! [`ScaleContext::origin_offset`] already removed.
//!
//! Painting is a pure fold over [`BrushDab`]s: each dab ORs a filled
//! disk into the mask and never erases.

use image::imageops::FilterType;
use image::{Luma, Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::frames::FrameStack;
use crate::morphology::{self, MorphologyParams};
use crate::normalize::{ScaleContext, round_to_i32};
use crate::types::{BinaryMask, CoordSpace, Dimensions, PixelPoint, RegionError, RegionKind};

/// Brush radius a fresh paint session starts with, in display pixels.
pub const DEFAULT_BRUSH_RADIUS: u32 = 10;

/// Semi-transparent red used to tint mask previews.
pub const DEFAULT_OVERLAY_TINT: Rgba<u8> = Rgba([255, 0, 0, 128]);

/// One filled disk stamped onto a paint mask, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrushDab {
    /// Disk center.
    pub center: PixelPoint,
    /// Disk radius in display pixels.
    pub radius: u32,
}

/// An axis-aligned ellipse given by its center and full extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EllipseParams {
    /// Ellipse center.
    pub center: PixelPoint,
    /// Full width in pixels.
    pub width: u32,
    /// Full height in pixels.
    pub height: u32,
}

impl EllipseParams {
    /// Minimum slider value for either extent in the interactive view.
    pub const MIN_EXTENT: u32 = 10;

    /// The ellipse the circle mode starts with: half the canvas in each
    /// direction, centered.
    #[must_use]
    pub fn centered_default(display: Dimensions) -> Self {
        Self {
            center: PixelPoint::new(
                crate::types::to_i32(display.width / 2),
                crate::types::to_i32(display.height / 2),
            ),
            width: display.width / 2,
            height: display.height / 2,
        }
    }

    /// Clamp center and extents to the ranges the canvas sliders offer:
    /// the center stays on the canvas and each extent lies within
    /// `[MIN_EXTENT, side]` (or `[1, side]` on canvases smaller than that).
    #[must_use]
    pub fn clamped_to(&self, display: Dimensions) -> Self {
        let extent = |v: u32, side: u32| v.clamp(Self::MIN_EXTENT.min(side).max(1), side.max(1));
        Self {
            center: PixelPoint::new(
                self.center.x.clamp(0, crate::types::to_i32(display.width)),
                self.center.y.clamp(0, crate::types::to_i32(display.height)),
            ),
            width: extent(self.width, display.width),
            height: extent(self.height, display.height),
        }
    }

    /// Reject zero-area ellipses.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] if either extent is zero.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.width == 0 || self.height == 0 {
            return Err(RegionError::InvalidParameter(format!(
                "ellipse must have positive area, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// The same ellipse with canvas values mapped to original space.
    /// Center and extents are rounded to whole pixels.
    #[must_use]
    pub fn to_original(&self, scale: &ScaleContext) -> Self {
        let extent = |v: u32| -> u32 {
            let scaled = round_to_i32(scale.length_to_original(f64::from(v)));
            u32::try_from(scaled.max(1)).unwrap_or(1)
        };
        Self {
            center: scale.canvas_to_original(self.center),
            width: extent(self.width),
            height: extent(self.height),
        }
    }

    /// Rasterize the filled ellipse onto an empty grid.
    #[must_use]
    pub fn rasterize(&self, dimensions: Dimensions, space: CoordSpace) -> BinaryMask {
        let mut mask = BinaryMask::new(dimensions, space);
        imageproc::drawing::draw_filled_ellipse_mut(
            mask.gray_mut(),
            (self.center.x, self.center.y),
            crate::types::to_i32(self.width / 2),
            crate::types::to_i32(self.height / 2),
            Luma([BinaryMask::ON]),
        );
        mask
    }
}

/// How the mask for a session is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Freehand painting: the recorded dabs, in canvas coordinates.
    Paint {
        /// Dabs in the order they were applied.
        dabs: Vec<BrushDab>,
    },
    /// Alpha union of the frame stack, then expand and crop.
    AlphaUnion(MorphologyParams),
    /// Parametric ellipse, in canvas coordinates.
    Ellipse(EllipseParams),
}

impl MaskStrategy {
    /// The descriptor kind this strategy produces.
    #[must_use]
    pub const fn kind(&self) -> RegionKind {
        match self {
            Self::Paint { .. } => RegionKind::Draw,
            Self::AlphaUnion(_) => RegionKind::Mask,
            Self::Ellipse(_) => RegionKind::Circle,
        }
    }

    /// Check the mode-specific parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] for out-of-range crop
    /// fractions or a zero-area ellipse.
    pub fn validate(&self) -> Result<(), RegionError> {
        match self {
            Self::Paint { .. } => Ok(()),
            Self::AlphaUnion(params) => params.validate(),
            Self::Ellipse(ellipse) => ellipse.validate(),
        }
    }
}

/// Build the mask described by `strategy`.
///
/// Paint masks come back at canvas size (`scale` fixes it); alpha-union and ellipse masks come back in original space.
///
/// # Errors
///
/// Returns the errors of [`MaskStrategy::validate`].
pub fn build_mask(
    strategy: &MaskStrategy,
    frames: &FrameStack,
    scale: &ScaleContext,
) -> Result<BinaryMask, RegionError> {
    strategy.validate()?;
    let original = frames.dimensions();
    let mask = match strategy {
        MaskStrategy::Paint { dabs } => paint_mask(scale.display_dimensions(original), dabs),
        MaskStrategy::AlphaUnion(params) => morphology::apply(&frames.alpha_union(), params),
        MaskStrategy::Ellipse(ellipse) => ellipse
            .to_original(scale)
            .rasterize(original, CoordSpace::Original),
    };
    tracing::debug!(
        kind = %strategy.kind(),
        occupied = mask.count(),
        "built mask"
    );
    Ok(mask)
}

/// OR one filled disk into `mask`. Parts outside the grid are dropped.
pub fn stamp(mask: &mut BinaryMask, dab: BrushDab) {
    imageproc::drawing::draw_filled_circle_mut(
        mask.gray_mut(),
        (dab.center.x, dab.center.y),
        crate::types::to_i32(dab.radius),
        Luma([BinaryMask::ON]),
    );
}

/// Fold `dabs` into a fresh canvas-sized mask.
#[must_use]
pub fn paint_mask(display: Dimensions, dabs: &[BrushDab]) -> BinaryMask {
    dabs.iter()
        .fold(BinaryMask::new(display, CoordSpace::Display), |mut mask, &dab| {
            stamp(&mut mask, dab);
            mask
        })
}

/// Interactive paint state: the current brush plus everything painted so
/// far.
#[derive(Debug, Clone)]
pub struct PaintCanvas {
    mask: BinaryMask,
    dabs: Vec<BrushDab>,
    brush_radius: u32,
}

impl PaintCanvas {
    /// An empty canvas of the given display size.
    #[must_use]
    pub fn new(display: Dimensions) -> Self {
        let mut canvas = Self {
            mask: BinaryMask::new(display, CoordSpace::Display),
            dabs: Vec::new(),
            brush_radius: 1,
        };
        canvas.set_brush_radius(DEFAULT_BRUSH_RADIUS);
        canvas
    }

    /// Largest radius the brush slider offers: half the longer canvas side.
    #[must_use]
    pub fn max_brush_radius(&self) -> u32 {
        let d = self.mask.dimensions();
        (d.width.max(d.height) / 2).max(1)
    }

    /// Change the radius used by later dabs, clamped to
    /// `[1, max_brush_radius]`. Earlier dabs keep their shape.
    pub fn set_brush_radius(&mut self, radius: u32) {
        self.brush_radius = radius.clamp(1, self.max_brush_radius());
    }

    /// Current brush radius.
    #[must_use]
    pub const fn brush_radius(&self) -> u32 {
        self.brush_radius
    }

    /// Paint one dab at `position`, clamped onto the canvas.
    pub fn dab(&mut self, position: PixelPoint) {
        let center = self.mask.dimensions().clamp(position);
        self.apply(BrushDab {
            center,
            radius: self.brush_radius,
        });
    }

    /// Paint a dab at every sampled drag position.
    pub fn drag<I: IntoIterator<Item = PixelPoint>>(&mut self, positions: I) {
        for p in positions {
            self.dab(p);
        }
    }

    /// Replay a recorded dab with the clamping interactive input gets.
    /// The brush keeps the dab's clamped radius afterwards.
    pub fn replay(&mut self, dab: BrushDab) {
        self.set_brush_radius(dab.radius);
        self.dab(dab.center);
    }

    fn apply(&mut self, dab: BrushDab) {
        stamp(&mut self.mask, dab);
        self.dabs.push(dab);
    }

    /// Everything painted so far.
    #[must_use]
    pub const fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Dabs in the order they were applied.
    #[must_use]
    pub fn dabs(&self) -> &[BrushDab] {
        &self.dabs
    }

    /// Consume the canvas, keeping only the mask.
    #[must_use]
    pub fn into_mask(self) -> BinaryMask {
        self.mask
    }
}

/// Resample a mask onto a grid of `dimensions` with nearest-neighbour
/// lookup at pixel centers, tagging the result with `space`.
#[must_use]
pub fn resample_nearest(mask: &BinaryMask, dimensions: Dimensions, space: CoordSpace) -> BinaryMask {
    let src = mask.dimensions();
    let mut out = BinaryMask::new(dimensions, space);
    if src.is_empty() {
        return out;
    }
    let source_index = |i: u32, src_len: u32, dst_len: u32| -> i64 {
        let v = (u64::from(i) * 2 + 1) * u64::from(src_len) / (u64::from(dst_len) * 2);
        i64::try_from(v).unwrap_or(i64::MAX)
    };
    for y in 0..dimensions.height {
        let sy = source_index(y, src.height, dimensions.height);
        for x in 0..dimensions.width {
            let sx = source_index(x, src.width, dimensions.width);
            if mask.get(sx, sy) {
                out.set(x, y, true);
            }
        }
    }
    out
}

/// Scale the first frame down to canvas size for previews.
#[must_use]
pub fn display_frame(frame: &RgbaImage, display: Dimensions) -> RgbaImage {
    if frame.width() == display.width && frame.height() == display.height {
        return frame.clone();
    }
    image::imageops::resize(frame, display.width, display.height, FilterType::Lanczos3)
}

/// Blend `tint` over `base` wherever `mask` is occupied.
///
/// `mask` must have the size of `base`; pixels outside either are left
/// untouched.
#[must_use]
pub fn overlay_mask(base: &RgbaImage, mask: &BinaryMask, tint: Rgba<u8>) -> RgbaImage {
    let mut out = base.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if mask.get(i64::from(x), i64::from(y)) {
            px.blend(&tint);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stack(w: u32, h: u32, opaque: &[(u32, u32)]) -> FrameStack {
        let mut frame = RgbaImage::new(w, h);
        for &(x, y) in opaque {
            frame.put_pixel(x, y, Rgba([10, 20, 30, 255]));
        }
        FrameStack::new(vec![frame]).unwrap()
    }

    // --- paint ---

    #[test]
    fn paint_is_monotonic() {
        let mut canvas = PaintCanvas::new(Dimensions::new(100, 100));
        canvas.set_brush_radius(5);
        canvas.dab(PixelPoint::new(20, 20));
        let before = canvas.mask().clone();
        canvas.dab(PixelPoint::new(60, 60));
        assert!(before.is_subset_of(canvas.mask()));
        assert!(canvas.mask().count() > before.count());
    }

    #[test]
    fn radius_change_keeps_earlier_strokes() {
        let mut canvas = PaintCanvas::new(Dimensions::new(100, 100));
        canvas.set_brush_radius(3);
        canvas.dab(PixelPoint::new(10, 10));
        canvas.set_brush_radius(20);
        canvas.dab(PixelPoint::new(70, 70));
        assert_eq!(canvas.dabs()[0].radius, 3);
        assert_eq!(canvas.dabs()[1].radius, 20);
        // The small dab did not grow.
        assert!(!canvas.mask().get(10, 16));
        assert!(canvas.mask().get(70, 88));
    }

    #[test]
    fn out_of_canvas_positions_are_clamped() {
        let mut canvas = PaintCanvas::new(Dimensions::new(30, 20));
        canvas.set_brush_radius(1);
        canvas.dab(PixelPoint::new(-50, 500));
        assert_eq!(canvas.dabs()[0].center, PixelPoint::new(0, 19));
        assert!(canvas.mask().get(0, 19));
    }

    #[test]
    fn brush_radius_is_clamped() {
        let mut canvas = PaintCanvas::new(Dimensions::new(40, 10));
        canvas.set_brush_radius(0);
        assert_eq!(canvas.brush_radius(), 1);
        canvas.set_brush_radius(1000);
        assert_eq!(canvas.brush_radius(), 20);
    }

    #[test]
    fn replayed_dabs_are_clamped_like_live_input() {
        let mut canvas = PaintCanvas::new(Dimensions::new(40, 10));
        canvas.replay(BrushDab {
            center: PixelPoint::new(-7, 60),
            radius: 1000,
        });
        assert_eq!(
            canvas.dabs(),
            &[BrushDab {
                center: PixelPoint::new(0, 9),
                radius: 20,
            }]
        );
        assert_eq!(canvas.brush_radius(), 20);
    }

    #[test]
    fn ellipse_to_original_ignores_the_origin_offset() {
        let scale = ScaleContext {
            scale_factor: 0.5,
            origin_offset: PixelPoint::new(30, 30),
        };
        let e = EllipseParams {
            center: PixelPoint::new(25, 25),
            width: 10,
            height: 10,
        };
        assert_eq!(e.to_original(&scale).center, PixelPoint::new(50, 50));
    }

    #[test]
    fn fold_matches_canvas() {
        let mut canvas = PaintCanvas::new(Dimensions::new(50, 50));
        canvas.drag([
            PixelPoint::new(5, 5),
            PixelPoint::new(6, 7),
            PixelPoint::new(30, 40),
        ]);
        let folded = paint_mask(Dimensions::new(50, 50), canvas.dabs());
        assert_eq!(folded.as_gray().as_raw(), canvas.mask().as_gray().as_raw());
    }

    // --- ellipse ---

    #[test]
    fn ellipse_rasterizes_inside_extent() {
        let e = EllipseParams {
            center: PixelPoint::new(50, 50),
            width: 20,
            height: 10,
        };
        let m = e.rasterize(Dimensions::new(100, 100), CoordSpace::Original);
        assert!(m.get(50, 50));
        assert!(m.get(59, 50));
        assert!(!m.get(62, 50));
        assert!(!m.get(50, 57));
        let (lo, hi) = m.bounding_box().unwrap();
        assert!(lo.x >= 40 && hi.x <= 60);
        assert!(lo.y >= 45 && hi.y <= 55);
    }

    #[test]
    fn ellipse_to_original_scales_and_rounds() {
        let scale = ScaleContext::new(0.5).unwrap();
        let e = EllipseParams {
            center: PixelPoint::new(25, 25),
            width: 10,
            height: 5,
        };
        assert_eq!(
            e.to_original(&scale),
            EllipseParams {
                center: PixelPoint::new(50, 50),
                width: 20,
                height: 10,
            }
        );
    }

    #[test]
    fn ellipse_clamps_to_canvas_ranges() {
        let e = EllipseParams {
            center: PixelPoint::new(-5, 400),
            width: 2,
            height: 900,
        };
        let c = e.clamped_to(Dimensions::new(200, 100));
        assert_eq!(c.center, PixelPoint::new(0, 100));
        assert_eq!((c.width, c.height), (10, 100));
    }

    #[test]
    fn zero_area_ellipse_is_rejected() {
        let e = EllipseParams {
            center: PixelPoint::new(5, 5),
            width: 0,
            height: 4,
        };
        assert!(matches!(e.validate(), Err(RegionError::InvalidParameter(_))));
    }

    #[test]
    fn default_ellipse_is_centered_half_canvas() {
        let e = EllipseParams::centered_default(Dimensions::new(200, 100));
        assert_eq!(e.center, PixelPoint::new(100, 50));
        assert_eq!((e.width, e.height), (100, 50));
    }

    // --- build_mask dispatch ---

    #[test]
    fn alpha_union_strategy_builds_original_space_mask() {
        let frames = stack(8, 8, &[(3, 3)]);
        let strategy = MaskStrategy::AlphaUnion(MorphologyParams {
            expand: 1,
            ..MorphologyParams::default()
        });
        let m = build_mask(&strategy, &frames, &ScaleContext::identity()).unwrap();
        assert_eq!(m.space(), CoordSpace::Original);
        assert_eq!(m.count(), 9);
        assert_eq!(strategy.kind(), RegionKind::Mask);
    }

    #[test]
    fn paint_strategy_builds_display_space_mask() {
        let frames = stack(100, 100, &[]);
        let scale = ScaleContext::new(0.5).unwrap();
        let strategy = MaskStrategy::Paint {
            dabs: vec![BrushDab {
                center: PixelPoint::new(10, 10),
                radius: 2,
            }],
        };
        let m = build_mask(&strategy, &frames, &scale).unwrap();
        assert_eq!(m.space(), CoordSpace::Display);
        assert_eq!(m.dimensions(), Dimensions::new(50, 50));
        assert!(m.get(10, 10));
        assert_eq!(strategy.kind(), RegionKind::Draw);
    }

    #[test]
    fn invalid_crop_is_rejected_by_build() {
        let frames = stack(4, 4, &[(1, 1)]);
        let mut params = MorphologyParams::default();
        params.crop.top = 2.0;
        let result = build_mask(
            &MaskStrategy::AlphaUnion(params),
            &frames,
            &ScaleContext::identity(),
        );
        assert!(matches!(result, Err(RegionError::InvalidParameter(_))));
    }

    #[test]
    fn strategy_serde_is_tagged_by_mode() {
        let strategy = MaskStrategy::Ellipse(EllipseParams {
            center: PixelPoint::new(1, 2),
            width: 3,
            height: 4,
        });
        let value = serde_json::to_value(&strategy).unwrap();
        assert_eq!(value["mode"], "ellipse");
        let back: MaskStrategy = serde_json::from_value(value).unwrap();
        assert_eq!(back, strategy);
    }

    // --- resampling and previews ---

    #[test]
    fn nearest_resample_keeps_binary_values() {
        let mut m = BinaryMask::new(Dimensions::new(2, 2), CoordSpace::Display);
        m.set(1, 1, true);
        let up = resample_nearest(&m, Dimensions::new(4, 4), CoordSpace::Original);
        assert_eq!(up.space(), CoordSpace::Original);
        assert_eq!(up.count(), 4);
        assert!(up.get(3, 3));
        assert!(!up.get(1, 1));
    }

    #[test]
    fn overlay_tints_only_masked_pixels() {
        let base = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255]));
        let mut m = BinaryMask::new(Dimensions::new(2, 1), CoordSpace::Display);
        m.set(0, 0, true);
        let out = overlay_mask(&base, &m, DEFAULT_OVERLAY_TINT);
        assert!(out.get_pixel(0, 0).0[0] > 100);
        assert_eq!(out.get_pixel(1, 0), base.get_pixel(1, 0));
    }

    #[test]
    fn display_frame_resizes_to_canvas() {
        let frame = RgbaImage::new(40, 20);
        let out = display_frame(&frame, Dimensions::new(20, 10));
        assert_eq!(out.dimensions(), (20, 10));
    }
}
