//! SVG preview serializer.
//!
//! Renders a descriptor as an overlay in original image coordinates
//! using the [`svg`] crate for document construction, XML escaping, and
//! path data formatting.
//!
//! The outline becomes a closed `<path>` (or an `<ellipse>` for circle
//! regions) filled red at half opacity; the anchor is a small green dot.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements, and
//! the descriptor JSON itself inside `<metadata>`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Ellipse, Path, Title};
use svg::node::{Node, Text, Value};

use areakit_pipeline::{PixelPoint, RegionDescriptor};

/// Fill color of the region overlay.
const REGION_COLOR: &str = "red";
/// Opacity of the region fill.
const REGION_OPACITY: f64 = 0.5;
/// Color of the anchor marker.
const ANCHOR_COLOR: &str = "lime";
/// Radius of the anchor marker in original pixels.
const ANCHOR_RADIUS: u32 = 4;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically
/// by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the asset name.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Sidecar JSON, emitted inside `<metadata>` wrapped in a namespaced
    /// `<areakit:region>` element so previews carry the exact geometry
    /// they were drawn from.
    pub descriptor_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a point list.
///
/// Uses `M` for the first point and `L` for subsequent points, and
/// closes the path when `close` is set. Returns an empty string for
/// fewer than 2 points.
///
/// # Examples
///
/// ```
/// use areakit_pipeline::PixelPoint;
/// use areakit_export::build_path_data;
///
/// let d = build_path_data(&[PixelPoint::new(10, 20), PixelPoint::new(30, 40)], false);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(points: &[PixelPoint], close: bool) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    if close {
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Serialize a descriptor into an SVG overlay document string.
///
/// The `viewBox` matches the descriptor's original dimensions, so the
/// document can be layered directly over frame 0.
///
/// # Examples
///
/// ```
/// use areakit_pipeline::{AnchorConvention, Dimensions, PixelPoint, RegionDescriptor, RegionKind};
/// use areakit_export::{SvgMetadata, to_svg};
///
/// let descriptor = RegionDescriptor {
///     points: vec![PixelPoint::new(-4, -8), PixelPoint::new(4, -8), PixelPoint::new(0, 0)],
///     anchor: AnchorConvention::BottomCenter,
///     original_anchor: PixelPoint::new(8, 16),
///     original_dimensions: Dimensions::new(16, 16),
///     kind: RegionKind::Mask,
///     ellipse: None,
/// };
/// let metadata = SvgMetadata {
///     title: Some("slime"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&descriptor, &metadata);
/// assert!(svg.contains("<title>slime</title>"));
/// assert!(svg.contains("M4,8 L12,8 L8,16"));
/// ```
#[must_use]
pub fn to_svg(descriptor: &RegionDescriptor, metadata: &SvgMetadata<'_>) -> String {
    let w = descriptor.original_dimensions.width;
    let h = descriptor.original_dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(json) = metadata.descriptor_json {
        let mut region_el = Element::new("areakit:region");
        region_el.assign("xmlns:areakit", "https://areakit.dev/ns/1");
        region_el.append(Text::new(json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(region_el);
        doc = doc.add(metadata_el);
    }

    let anchor = descriptor.original_anchor;
    if let Some(e) = descriptor.ellipse {
        let ellipse = Ellipse::new()
            .set("cx", e.x + anchor.x)
            .set("cy", e.y + anchor.y)
            .set("rx", f64::from(e.w) / 2.0)
            .set("ry", f64::from(e.h) / 2.0)
            .set("fill", REGION_COLOR)
            .set("fill-opacity", REGION_OPACITY);
        doc = doc.add(ellipse);
    } else {
        let d = build_path_data(&descriptor.absolute_points(), true);
        if !d.is_empty() {
            let path = Path::new()
                .set("d", d)
                .set("fill", REGION_COLOR)
                .set("fill-opacity", REGION_OPACITY)
                .set("stroke", REGION_COLOR)
                .set("stroke-width", 1);
            doc = doc.add(path);
        }
    }

    let marker = Circle::new()
        .set("cx", anchor.x)
        .set("cy", anchor.y)
        .set("r", ANCHOR_RADIUS)
        .set("fill", ANCHOR_COLOR);
    doc = doc.add(marker);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
