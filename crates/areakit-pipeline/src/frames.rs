//! Frame stack decoding and alpha-union occupancy.
//!
//! A [`FrameStack`] holds one animation's frames for a single asset. All
//! frames share a size; the stack is only read for its dimensions and
//! for the alpha channel of each frame.

use image::RgbaImage;

use crate::types::{BinaryMask, CoordSpace, Dimensions, RegionError};

/// An ordered, non-empty sequence of same-size RGBA frames.
#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<RgbaImage>,
    dimensions: Dimensions,
}

impl FrameStack {
    /// Wrap a list of decoded frames.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NoInputFrames`] if `frames` is empty, and
    /// [`RegionError::FrameSizeMismatch`] if any frame's size differs
    /// from the first frame's.
    pub fn new(frames: Vec<RgbaImage>) -> Result<Self, RegionError> {
        let first = frames.first().ok_or(RegionError::NoInputFrames)?;
        let expected = Dimensions::new(first.width(), first.height());
        for (index, frame) in frames.iter().enumerate().skip(1) {
            let found = Dimensions::new(frame.width(), frame.height());
            if found != expected {
                return Err(RegionError::FrameSizeMismatch {
                    index,
                    expected,
                    found,
                });
            }
        }
        Ok(Self {
            frames,
            dimensions: expected,
        })
    }

    /// Decode encoded frames (PNG) and wrap them.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ImageDecode`] for the first frame that
    /// fails to decode, otherwise the errors of [`FrameStack::new`].
    pub fn decode<I, B>(encoded: I) -> Result<Self, RegionError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let frames = encoded
            .into_iter()
            .map(|bytes| Ok(image::load_from_memory(bytes.as_ref())?.to_rgba8()))
            .collect::<Result<Vec<_>, RegionError>>()?;
        Self::new(frames)
    }

    /// Native size shared by every frame.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of frames.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; construction rejects empty stacks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All frames in order.
    #[must_use]
    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    /// The first frame, used for previews.
    #[must_use]
    pub fn first(&self) -> &RgbaImage {
        &self.frames[0]
    }

    /// Occupancy across the whole stack, in original space.
    ///
    /// A pixel is occupied iff any frame has non-zero alpha there.
    #[must_use]
    pub fn alpha_union(&self) -> BinaryMask {
        let mut mask = BinaryMask::new(self.dimensions, CoordSpace::Original);
        for frame in &self.frames {
            for (x, y, px) in frame.enumerate_pixels() {
                if px.0[3] != 0 {
                    mask.set(x, y, true);
                }
            }
        }
        tracing::debug!(
            frames = self.frames.len(),
            occupied = mask.count(),
            "computed alpha union"
        );
        mask
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PixelPoint;

    fn transparent(w: u32, h: u32) -> RgbaImage {
        RgbaImage::new(w, h)
    }

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_stack_is_rejected() {
        let result = FrameStack::new(Vec::new());
        assert!(matches!(result, Err(RegionError::NoInputFrames)));
    }

    #[test]
    fn mismatched_frame_is_reported_with_index() {
        let result = FrameStack::new(vec![
            transparent(4, 4),
            transparent(4, 4),
            transparent(5, 4),
        ]);
        assert!(matches!(
            result,
            Err(RegionError::FrameSizeMismatch { index: 2, expected, found })
                if expected == Dimensions::new(4, 4) && found == Dimensions::new(5, 4)
        ));
    }

    #[test]
    fn corrupt_bytes_return_decode_error() {
        let result = FrameStack::decode([vec![0xFF, 0xFE, 0x00, 0x01]]);
        assert!(matches!(result, Err(RegionError::ImageDecode(_))));
    }

    #[test]
    fn decode_preserves_order_and_size() {
        let mut a = transparent(3, 2);
        a.put_pixel(0, 0, image::Rgba([1, 2, 3, 255]));
        let b = transparent(3, 2);
        let stack = FrameStack::decode([encode_png(&a), encode_png(&b)]).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.dimensions(), Dimensions::new(3, 2));
        assert_eq!(stack.first().get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn alpha_union_is_logical_or() {
        let mut a = transparent(4, 4);
        a.put_pixel(1, 1, image::Rgba([0, 0, 0, 1]));
        let mut b = transparent(4, 4);
        b.put_pixel(2, 2, image::Rgba([0, 0, 0, 200]));

        let union = FrameStack::new(vec![a, b]).unwrap().alpha_union();
        let occupied: Vec<_> = union.occupied().collect();
        assert_eq!(occupied, vec![PixelPoint::new(1, 1), PixelPoint::new(2, 2)]);
        assert_eq!(union.space(), CoordSpace::Original);
    }

    #[test]
    fn opaque_color_without_alpha_is_not_occupied() {
        let mut a = transparent(2, 2);
        a.put_pixel(0, 0, image::Rgba([255, 255, 255, 0]));
        let union = FrameStack::new(vec![a]).unwrap().alpha_union();
        assert!(union.is_empty());
    }
}
