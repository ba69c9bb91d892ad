//! Shared types for the areakit region extraction core.

use serde::{Deserialize, Serialize};

use crate::contour::BoundaryOrderKind;
use crate::normalize::AnchorStrategy;

/// Re-export `GrayImage` so downstream crates can reference mask
/// rasters without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can hand frames to the
/// core without depending on `image` directly.
pub use image::RgbaImage;

/// An integer pixel position, or a signed offset between two positions.
///
/// Serialized as a two-element `[x, y]` array, matching the sidecar
/// file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct PixelPoint {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl PixelPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[must_use]
    pub const fn offset_by(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub const fn relative_to(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// The point as floating-point `(x, y)`.
    #[must_use]
    pub fn to_f64(self) -> (f64, f64) {
        (f64::from(self.x), f64::from(self.y))
    }
}

impl From<[i32; 2]> for PixelPoint {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<PixelPoint> for [i32; 2] {
    fn from(p: PixelPoint) -> Self {
        [p.x, p.y]
    }
}

/// Image dimensions in pixels.
///
/// Serialized as a two-element `[width, height]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the grid has no pixels at all.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `p` lies on the pixel grid.
    #[must_use]
    pub fn contains(self, p: PixelPoint) -> bool {
        u32::try_from(p.x).is_ok_and(|x| x < self.width)
            && u32::try_from(p.y).is_ok_and(|y| y < self.height)
    }

    /// Clamp `p` onto the nearest pixel of the grid.
    ///
    /// The grid must not be empty.
    #[must_use]
    pub fn clamp(self, p: PixelPoint) -> PixelPoint {
        let max_x = i32::try_from(self.width.saturating_sub(1)).unwrap_or(i32::MAX);
        let max_y = i32::try_from(self.height.saturating_sub(1)).unwrap_or(i32::MAX);
        PixelPoint::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
    }
}

impl From<[u32; 2]> for Dimensions {
    fn from([width, height]: [u32; 2]) -> Self {
        Self::new(width, height)
    }
}

impl From<Dimensions> for [u32; 2] {
    fn from(d: Dimensions) -> Self {
        [d.width, d.height]
    }
}

/// Which resolution a mask or point set lives in.
///
/// Masks built from the interactive canvas live in display space;
/// masks built from the frame stack live in original space. Converting
/// between the two goes through [`ScaleContext`](crate::ScaleContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordSpace {
    /// Scaled canvas coordinates.
    Display,
    /// Native frame-stack pixel coordinates.
    Original,
}

/// A binary occupancy grid.
///
/// Backed by a [`GrayImage`] holding only `0` and `255`, so `imageproc`
/// operations apply to it directly.
///
/// Does not derive `PartialEq`; compare [`as_gray`](Self::as_gray)
/// raw buffers when needed.
#[derive(Debug, Clone)]
pub struct BinaryMask {
    image: GrayImage,
    space: CoordSpace,
}

impl BinaryMask {
    /// Pixel value for occupied cells.
    pub const ON: u8 = 255;

    /// An all-false mask.
    #[must_use]
    pub fn new(dimensions: Dimensions, space: CoordSpace) -> Self {
        Self {
            image: GrayImage::new(dimensions.width, dimensions.height),
            space,
        }
    }

    /// Wrap a grayscale raster, treating every non-zero pixel as occupied.
    #[must_use]
    pub fn from_gray(mut image: GrayImage, space: CoordSpace) -> Self {
        for p in image.pixels_mut() {
            if p.0[0] != 0 {
                p.0[0] = Self::ON;
            }
        }
        Self { image, space }
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    /// The resolution context this mask was produced in.
    #[must_use]
    pub const fn space(&self) -> CoordSpace {
        self.space
    }

    /// Whether `(x, y)` is occupied. Out-of-bounds reads are `false`.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> bool {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.image.width() && y < self.image.height() => {
                self.image.get_pixel(x, y).0[0] != 0
            }
            _ => false,
        }
    }

    /// Mark `(x, y)` occupied or free. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, occupied: bool) {
        if x < self.image.width() && y < self.image.height() {
            self.image
                .put_pixel(x, y, image::Luma([if occupied { Self::ON } else { 0 }]));
        }
    }

    /// Number of occupied pixels.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.image.pixels().filter(|p| p.0[0] != 0).count() as u64
    }

    /// Whether no pixel is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.pixels().all(|p| p.0[0] == 0)
    }

    /// Occupied pixels in row-major scan order (top row first, left to
    /// right within a row).
    pub fn occupied(&self) -> impl Iterator<Item = PixelPoint> + '_ {
        self.image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != 0)
            .map(|(x, y, _)| PixelPoint::new(to_i32(x), to_i32(y)))
    }

    /// Inclusive bounding box `(min, max)` of the occupied pixels.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(PixelPoint, PixelPoint)> {
        self.occupied().fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((
                PixelPoint::new(lo.x.min(p.x), lo.y.min(p.y)),
                PixelPoint::new(hi.x.max(p.x), hi.y.max(p.y)),
            )),
        })
    }

    /// Whether every occupied pixel of `self` is occupied in `other`.
    ///
    /// Masks of different dimensions are never subsets of each other.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .image
                .pixels()
                .zip(other.image.pixels())
                .all(|(a, b)| a.0[0] == 0 || b.0[0] != 0)
    }

    /// The underlying 0/255 raster.
    #[must_use]
    pub const fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the mask and return the underlying 0/255 raster.
    #[must_use]
    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    pub(crate) const fn gray_mut(&mut self) -> &mut GrayImage {
        &mut self.image
    }
}

/// Convert a raster coordinate to `i32`, saturating on absurd sizes.
pub(crate) fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Which mask-building mode produced a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Alpha-union mask with expand/crop controls.
    #[default]
    Mask,
    /// Parametric ellipse.
    Circle,
    /// Freehand brush painting.
    Draw,
}

impl RegionKind {
    /// The identifier written to the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mask => "mask",
            Self::Circle => "circle",
            Self::Draw => "draw",
        }
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor convention identifier recorded in every descriptor.
///
/// Both anchor strategies ([`AnchorStrategy`]) serialize as
/// `"bottom_center"`; consumers recover absolute positions by adding
/// `original_anchor` back to each offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorConvention {
    /// Offsets are relative to a bottom-center reference pixel.
    #[default]
    #[serde(rename = "bottom_center")]
    BottomCenter,
}

/// Ellipse geometry recorded for circle-mode regions, anchor-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EllipseOffsets {
    /// Center x offset from the anchor.
    pub x: i32,
    /// Center y offset from the anchor.
    pub y: i32,
    /// Full width in original pixels.
    pub w: u32,
    /// Full height in original pixels.
    pub h: u32,
}

/// The serializable result of one boundary-configuration session.
///
/// Uses custom `Serialize`/`Deserialize` implementations so the ellipse
/// fields appear flat (`x`, `y`, `w`, `h`) next to the point list, and so
/// older files that spell the anchor key `anchor_point_in_image` still load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor {
    /// Simplified outline, as offsets from `original_anchor`.
    pub points: Vec<PixelPoint>,
    /// Anchor convention identifier.
    pub anchor: AnchorConvention,
    /// The anchor's position in original image coordinates.
    pub original_anchor: PixelPoint,
    /// Source frame size in pixels.
    pub original_dimensions: Dimensions,
    /// Which mode produced this region.
    pub kind: RegionKind,
    /// Ellipse geometry; present only for [`RegionKind::Circle`].
    pub ellipse: Option<EllipseOffsets>,
}

impl RegionDescriptor {
    /// Outline points converted back to absolute original-image coordinates.
    #[must_use]
    pub fn absolute_points(&self) -> Vec<PixelPoint> {
        self.points
            .iter()
            .map(|&p| crate::normalize::from_anchor_relative(p, self.original_anchor))
            .collect()
    }
}

/// Serde-compatible proxy for `RegionDescriptor`.
#[derive(Serialize, Deserialize)]
struct RegionDescriptorProxy {
    points: Vec<PixelPoint>,
    #[serde(default)]
    anchor: AnchorConvention,
    #[serde(default, alias = "anchor_point_in_image")]
    original_anchor: PixelPoint,
    original_dimensions: Dimensions,
    #[serde(rename = "type", default)]
    kind: RegionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    h: Option<u32>,
}

impl Serialize for RegionDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = RegionDescriptorProxy {
            points: self.points.clone(),
            anchor: self.anchor,
            original_anchor: self.original_anchor,
            original_dimensions: self.original_dimensions,
            kind: self.kind,
            x: self.ellipse.map(|e| e.x),
            y: self.ellipse.map(|e| e.y),
            w: self.ellipse.map(|e| e.w),
            h: self.ellipse.map(|e| e.h),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RegionDescriptor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = RegionDescriptorProxy::deserialize(deserializer)?;
        let ellipse = match (proxy.x, proxy.y, proxy.w, proxy.h) {
            (Some(x), Some(y), Some(w), Some(h)) => Some(EllipseOffsets { x, y, w, h }),
            _ => None,
        };
        if proxy.kind == RegionKind::Circle && ellipse.is_none() {
            return Err(serde::de::Error::custom(
                "circle region requires x, y, w and h fields",
            ));
        }
        Ok(Self {
            points: proxy.points,
            anchor: proxy.anchor,
            original_anchor: proxy.original_anchor,
            original_dimensions: proxy.original_dimensions,
            kind: proxy.kind,
            ellipse,
        })
    }
}

/// Tunables for turning a mask into a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Ramer-Douglas-Peucker tolerance in original pixels.
    pub epsilon: f64,

    /// How the anchor pixel is chosen.
    pub anchor: AnchorStrategy,

    /// Order in which boundary pixels are handed to the simplifier.
    ///
    /// [`BoundaryOrderKind::ScanOrder`] reproduces existing sidecar files
    /// bit for bit; [`BoundaryOrderKind::Traced`] walks the perimeter and
    /// simplifies far better.
    pub boundary_order: BoundaryOrderKind,
}

impl RegionConfig {
    /// Default simplification tolerance.
    pub const DEFAULT_EPSILON: f64 = 2.0;

    /// Check the configuration for values the pipeline cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] if `epsilon` is negative
    /// or not finite.
    pub fn validate(&self) -> Result<(), RegionError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(RegionError::InvalidParameter(format!(
                "epsilon must be a finite non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            anchor: AnchorStrategy::default(),
            boundary_order: BoundaryOrderKind::default(),
        }
    }
}

/// Errors surfaced by the region extraction core.
///
/// Variants fall into two groups: input errors (the caller must retry
/// with corrected parameters) and degenerate-geometry errors (the inputs
/// were valid but produced nothing to outline).
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// The frame stack was empty.
    #[error("no input frames")]
    NoInputFrames,

    /// A frame's size differs from the first frame's.
    #[error(
        "frame {index} is {}x{}, expected {}x{}",
        found.width, found.height, expected.width, expected.height
    )]
    FrameSizeMismatch {
        /// Position of the offending frame in the stack.
        index: usize,
        /// Size of frame 0.
        expected: Dimensions,
        /// Size of the offending frame.
        found: Dimensions,
    },

    /// A frame could not be decoded.
    #[error("failed to decode frame: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A parameter was outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The finished mask had no occupied pixels.
    #[error("no boundary points found")]
    NoBoundaryPoints,

    /// Simplification needs at least two points.
    #[error("cannot simplify {count} point(s)")]
    TooFewPoints {
        /// Number of points supplied.
        count: usize,
    },
}

impl RegionError {
    /// Whether the error stems from bad caller input.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::NoInputFrames
                | Self::FrameSizeMismatch { .. }
                | Self::ImageDecode(_)
                | Self::InvalidParameter(_)
        )
    }

    /// Whether the error reports geometry with nothing to outline.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::NoBoundaryPoints | Self::TooFewPoints { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- PixelPoint ---

    #[test]
    fn pixel_point_arithmetic() {
        let a = PixelPoint::new(5, 7);
        let b = PixelPoint::new(2, 10);
        assert_eq!(a.relative_to(b), PixelPoint::new(3, -3));
        assert_eq!(a.relative_to(b).offset_by(b), a);
    }

    #[test]
    fn pixel_point_serializes_as_pair() {
        let json = serde_json::to_string(&PixelPoint::new(-4, 9)).unwrap();
        assert_eq!(json, "[-4,9]");
        let back: PixelPoint = serde_json::from_str("[3,-2]").unwrap();
        assert_eq!(back, PixelPoint::new(3, -2));
    }

    // --- Dimensions ---

    #[test]
    fn dimensions_contains_and_clamp() {
        let d = Dimensions::new(10, 5);
        assert!(d.contains(PixelPoint::new(9, 4)));
        assert!(!d.contains(PixelPoint::new(10, 4)));
        assert!(!d.contains(PixelPoint::new(-1, 0)));
        assert_eq!(d.clamp(PixelPoint::new(-3, 99)), PixelPoint::new(0, 4));
    }

    #[test]
    fn dimensions_serialize_as_pair() {
        let json = serde_json::to_string(&Dimensions::new(64, 32)).unwrap();
        assert_eq!(json, "[64,32]");
    }

    // --- BinaryMask ---

    #[test]
    fn from_gray_binarizes() {
        let img = GrayImage::from_fn(3, 1, |x, _| image::Luma([u8::try_from(x).unwrap()]));
        let mask = BinaryMask::from_gray(img, CoordSpace::Original);
        assert_eq!(mask.as_gray().as_raw(), &vec![0, 255, 255]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn out_of_bounds_reads_are_false() {
        let mut mask = BinaryMask::new(Dimensions::new(2, 2), CoordSpace::Display);
        mask.set(0, 0, true);
        mask.set(5, 5, true);
        assert!(mask.get(0, 0));
        assert!(!mask.get(-1, 0));
        assert!(!mask.get(2, 0));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn occupied_is_row_major() {
        let mut mask = BinaryMask::new(Dimensions::new(3, 3), CoordSpace::Original);
        mask.set(2, 0, true);
        mask.set(0, 1, true);
        mask.set(1, 0, true);
        let pts: Vec<_> = mask.occupied().collect();
        assert_eq!(
            pts,
            vec![
                PixelPoint::new(1, 0),
                PixelPoint::new(2, 0),
                PixelPoint::new(0, 1)
            ]
        );
    }

    #[test]
    fn bounding_box_of_empty_mask_is_none() {
        let mask = BinaryMask::new(Dimensions::new(4, 4), CoordSpace::Original);
        assert!(mask.bounding_box().is_none());
        assert!(mask.is_empty());
    }

    #[test]
    fn subset_requires_matching_dimensions() {
        let a = BinaryMask::new(Dimensions::new(4, 4), CoordSpace::Original);
        let b = BinaryMask::new(Dimensions::new(4, 5), CoordSpace::Original);
        assert!(a.is_subset_of(&a));
        assert!(!a.is_subset_of(&b));
    }

    // --- RegionDescriptor serde ---

    fn circle_descriptor() -> RegionDescriptor {
        RegionDescriptor {
            points: vec![PixelPoint::new(-10, -50), PixelPoint::new(10, -50)],
            anchor: AnchorConvention::BottomCenter,
            original_anchor: PixelPoint::new(50, 100),
            original_dimensions: Dimensions::new(100, 100),
            kind: RegionKind::Circle,
            ellipse: Some(EllipseOffsets {
                x: 0,
                y: -50,
                w: 20,
                h: 10,
            }),
        }
    }

    #[test]
    fn descriptor_serializes_flat_shape() {
        let value = serde_json::to_value(circle_descriptor()).unwrap();
        assert_eq!(value["anchor"], "bottom_center");
        assert_eq!(value["type"], "circle");
        assert_eq!(value["original_anchor"], serde_json::json!([50, 100]));
        assert_eq!(value["original_dimensions"], serde_json::json!([100, 100]));
        assert_eq!(value["points"], serde_json::json!([[-10, -50], [10, -50]]));
        assert_eq!(value["x"], 0);
        assert_eq!(value["y"], -50);
        assert_eq!(value["w"], 20);
        assert_eq!(value["h"], 10);
    }

    #[test]
    fn mask_descriptor_omits_ellipse_fields() {
        let mut d = circle_descriptor();
        d.kind = RegionKind::Mask;
        d.ellipse = None;
        let value = serde_json::to_value(&d).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["x", "y", "w", "h"] {
            assert!(!obj.contains_key(key), "unexpected key {key}");
        }
    }

    #[test]
    fn descriptor_roundtrip() {
        let d = circle_descriptor();
        let json = serde_json::to_string(&d).unwrap();
        let back: RegionDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn legacy_anchor_key_is_accepted() {
        let json = r#"{
            "points": [[1, 2]],
            "anchor_point_in_image": [8, 16],
            "original_dimensions": [16, 16],
            "type": "draw"
        }"#;
        let d: RegionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.original_anchor, PixelPoint::new(8, 16));
        assert_eq!(d.anchor, AnchorConvention::BottomCenter);
        assert_eq!(d.kind, RegionKind::Draw);
        assert_eq!(d.absolute_points(), vec![PixelPoint::new(9, 18)]);
    }

    #[test]
    fn circle_without_geometry_is_rejected() {
        let json = r#"{"points": [], "original_dimensions": [4, 4], "type": "circle"}"#;
        assert!(serde_json::from_str::<RegionDescriptor>(json).is_err());
    }

    // --- RegionConfig ---

    #[test]
    fn default_config_is_valid() {
        let config = RegionConfig::default();
        assert!((config.epsilon - 2.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_epsilon_is_rejected() {
        let config = RegionConfig {
            epsilon: -1.0,
            ..RegionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn config_json_fills_missing_fields() {
        let config: RegionConfig = serde_json::from_str(r#"{"epsilon": 3.5}"#).unwrap();
        assert!((config.epsilon - 3.5).abs() < f64::EPSILON);
        assert_eq!(config.boundary_order, BoundaryOrderKind::ScanOrder);
    }

    // --- RegionError ---

    #[test]
    fn error_classification() {
        assert!(RegionError::NoInputFrames.is_input_error());
        assert!(!RegionError::NoInputFrames.is_degenerate());
        assert!(RegionError::NoBoundaryPoints.is_degenerate());
        assert!(RegionError::TooFewPoints { count: 1 }.is_degenerate());
        assert!(RegionError::InvalidParameter("x".into()).is_input_error());
    }
}
