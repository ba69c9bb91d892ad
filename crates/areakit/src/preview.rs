//! Raster preview of a descriptor over frame 0.
//!
//! The frame is resized to the preview scale, the region is rendered
//! with `tiny-skia` into a transparent layer at the same scale, and the
//! layer is composited on top.

use areakit_pipeline::{RegionDescriptor, RgbaImage};
use image::Rgba;
use image::imageops::{self, FilterType};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

/// Default preview size relative to the original frame.
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.5;

/// Region fill, red at half opacity.
const REGION_RGBA: [u8; 4] = [255, 0, 0, 128];

/// Anchor marker fill.
const ANCHOR_RGBA: [u8; 4] = [0, 255, 0, 255];

/// Anchor marker radius in preview pixels.
const ANCHOR_RADIUS: f32 = 4.0;

/// Render `descriptor` over `frame` at `scale`.
#[must_use]
pub fn render_preview(frame: &RgbaImage, descriptor: &RegionDescriptor, scale: f32) -> RgbaImage {
    let width = scaled_len(frame.width(), scale);
    let height = scaled_len(frame.height(), scale);
    let mut base = imageops::resize(frame, width, height, FilterType::Triangle);
    let layer = render_region(descriptor, width, height, scale);
    imageops::overlay(&mut base, &layer, 0, 0);
    base
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled_len(len: u32, scale: f32) -> u32 {
    ((len as f32 * scale).round() as u32).max(1)
}

/// Rasterize the region outline and anchor into a transparent layer.
#[allow(clippy::cast_precision_loss)]
fn render_region(descriptor: &RegionDescriptor, width: u32, height: u32, scale: f32) -> RgbaImage {
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return RgbaImage::new(width, height);
    };

    let anchor = descriptor.original_anchor;
    let region = if let Some(e) = descriptor.ellipse {
        let cx = (e.x + anchor.x) as f32;
        let cy = (e.y + anchor.y) as f32;
        let w = e.w as f32;
        let h = e.h as f32;
        Rect::from_xywh(cx - w / 2.0, cy - h / 2.0, w, h).and_then(PathBuilder::from_oval)
    } else {
        let points = descriptor.absolute_points();
        let mut pb = PathBuilder::new();
        if let Some((first, rest)) = points.split_first() {
            pb.move_to(first.x as f32, first.y as f32);
            for p in rest {
                pb.line_to(p.x as f32, p.y as f32);
            }
            pb.close();
        }
        pb.finish()
    };

    if let Some(path) = region {
        let paint = solid_paint(REGION_RGBA);
        pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::from_scale(scale, scale),
            None,
        );
    }

    let marker = PathBuilder::from_circle(
        anchor.x as f32 * scale,
        anchor.y as f32 * scale,
        ANCHOR_RADIUS,
    );
    if let Some(path) = marker {
        let paint = solid_paint(ANCHOR_RGBA);
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    // Pixmaps hold premultiplied color; images hold straight color.
    let mut img = RgbaImage::new(width, height);
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

fn solid_paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    paint
}
