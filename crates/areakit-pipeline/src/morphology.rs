//! Expand/contract and crop-fraction trimming for alpha-union masks.
//!
//! A single signed `expand` amount drives both directions: positive
//! values dilate with a `(2k+1)`-square structuring element, negative
//! values erode with the same element, zero is a no-op. Crop fractions
//! are applied afterwards, to the already dilated or eroded mask.
//!
//! Output masks always have the input's dimensions and coordinate space.

use imageproc::distance_transform::Norm;
use serde::{Deserialize, Serialize};

use crate::types::{BinaryMask, RegionError};

/// Largest radius handed to a single `imageproc` dilate/erode call.
///
/// Larger amounts are applied as a sequence of passes; square
/// structuring elements compose additively under repeated application.
const MAX_PASS_RADIUS: u8 = 254;

/// Fractions of the mask to clear from each edge, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropFractions {
    /// Fraction of rows cleared from the top.
    pub top: f64,
    /// Fraction of rows cleared from the bottom.
    pub bottom: f64,
    /// Fraction of columns cleared from the left.
    pub left: f64,
    /// Fraction of columns cleared from the right.
    pub right: f64,
}

impl CropFractions {
    /// Check that each fraction is in range and the kept window has area.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] if any fraction lies
    /// outside `[0, 1]` or is not finite, or if opposite edges together
    /// clear the whole mask.
    pub fn validate(&self) -> Result<(), RegionError> {
        for (name, value) in [
            ("top", self.top),
            ("bottom", self.bottom),
            ("left", self.left),
            ("right", self.right),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RegionError::InvalidParameter(format!(
                    "crop {name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.top + self.bottom >= 1.0 {
            return Err(RegionError::InvalidParameter(format!(
                "crop top + bottom must be below 1, got {}",
                self.top + self.bottom
            )));
        }
        if self.left + self.right >= 1.0 {
            return Err(RegionError::InvalidParameter(format!(
                "crop left + right must be below 1, got {}",
                self.left + self.right
            )));
        }
        Ok(())
    }

    /// Whether no edge is cropped.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.top == 0.0 && self.bottom == 0.0 && self.left == 0.0 && self.right == 0.0
    }

    /// Kept half-open window `(x0, x1, y0, y1)` for a `width x height` grid.
    ///
    /// Each bound is the floor of `fraction * size` (or of
    /// `(1 - fraction) * size` for the far edges).
    #[must_use]
    pub fn window(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let floor_of = |fraction: f64, size: u32| -> u32 {
            let v = (fraction * f64::from(size)).floor();
            // Fractions are in [0, 1], so the product fits in `size`.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = v.clamp(0.0, f64::from(size)) as u32;
            v
        };
        (
            floor_of(self.left, width),
            floor_of(1.0 - self.right, width),
            floor_of(self.top, height),
            floor_of(1.0 - self.bottom, height),
        )
    }
}

/// Controls for the alpha-union mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    /// Signed expand amount in pixels of the mask's own space.
    pub expand: i32,
    /// Edge trimming applied after the expand step.
    pub crop: CropFractions,
}

impl MorphologyParams {
    /// Check the crop fractions.
    ///
    /// # Errors
    ///
    /// See [`CropFractions::validate`].
    pub fn validate(&self) -> Result<(), RegionError> {
        self.crop.validate()
    }
}

/// Dilate (`amount > 0`) or erode (`amount < 0`) with a square element
/// of side `2 * |amount| + 1`.
///
/// Pixels outside the grid never influence the result. A radius of
/// `max(width, height)` already reaches every pixel from every other, so
/// larger amounts are capped there.
#[must_use = "returns a new mask"]
pub fn expand(mask: &BinaryMask, amount: i32) -> BinaryMask {
    if amount == 0 {
        return mask.clone();
    }
    let dims = mask.dimensions();
    let mut remaining = amount.unsigned_abs().min(dims.width.max(dims.height));
    let mut image = mask.as_gray().clone();
    while remaining > 0 {
        let step = u8::try_from(remaining.min(u32::from(MAX_PASS_RADIUS))).unwrap_or(MAX_PASS_RADIUS);
        image = if amount > 0 {
            imageproc::morphology::dilate(&image, Norm::LInf, step)
        } else {
            imageproc::morphology::erode(&image, Norm::LInf, step)
        };
        remaining -= u32::from(step);
    }
    tracing::trace!(amount, "applied morphological expand");
    BinaryMask::from_gray(image, mask.space())
}

/// Clear every pixel outside the crop window.
#[must_use = "returns a new mask"]
pub fn crop(mask: &BinaryMask, fractions: &CropFractions) -> BinaryMask {
    let mut out = mask.clone();
    if fractions.is_identity() {
        return out;
    }
    let dims = mask.dimensions();
    let (x0, x1, y0, y1) = fractions.window(dims.width, dims.height);
    for (x, y, px) in out.gray_mut().enumerate_pixels_mut() {
        if x < x0 || x >= x1 || y < y0 || y >= y1 {
            px.0[0] = 0;
        }
    }
    out
}

/// Expand, then crop.
#[must_use = "returns a new mask"]
pub fn apply(mask: &BinaryMask, params: &MorphologyParams) -> BinaryMask {
    crop(&expand(mask, params.expand), &params.crop)
}
