//! JSON sidecar serializer.
//!
//! Writes the canonical descriptor shape with two-space indentation and
//! reads every shape earlier tool versions produced:
//!
//! - the full descriptor (`original_anchor` or `anchor_point_in_image`);
//! - a descriptor without `original_dimensions`, completed from the
//!   caller's frame size;
//! - a bare `[[x, y], ...]` array of absolute points, read as a `mask`
//!   region anchored at the origin.
//!
//! This is a pure module with no I/O: it converts between strings and
//! descriptors.

use areakit_pipeline::{
    AnchorConvention, Dimensions, PixelPoint, RegionDescriptor, RegionKind,
};
use serde_json::Value;

/// Errors from reading or writing sidecar JSON.
#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    /// The text is not valid JSON or does not match the descriptor shape.
    #[error("invalid sidecar JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON is well-formed but not a shape any tool version wrote.
    #[error("unexpected sidecar shape: {0}")]
    UnexpectedShape(String),
}

/// Serialize a descriptor in the canonical sidecar shape.
///
/// # Errors
///
/// Returns [`SidecarError::Json`] if serialization fails.
pub fn to_sidecar_json(descriptor: &RegionDescriptor) -> Result<String, SidecarError> {
    Ok(serde_json::to_string_pretty(descriptor)?)
}

/// Parse sidecar text.
///
/// `frame_dimensions` supplies the source frame size for legacy files
/// that did not record it.
///
/// # Errors
///
/// Returns [`SidecarError::Json`] for malformed JSON or fields of the
/// wrong type, and [`SidecarError::UnexpectedShape`] when the top-level
/// value is neither an object nor an array, or when a legacy file needs
/// `frame_dimensions` and none were given.
pub fn from_sidecar_json(
    text: &str,
    frame_dimensions: Option<Dimensions>,
) -> Result<RegionDescriptor, SidecarError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => {
            let original_dimensions = frame_dimensions.ok_or_else(|| {
                SidecarError::UnexpectedShape(
                    "bare point list needs the frame dimensions".to_string(),
                )
            })?;
            let points: Vec<PixelPoint> = serde_json::from_value(Value::Array(items))?;
            Ok(RegionDescriptor {
                points,
                anchor: AnchorConvention::BottomCenter,
                original_anchor: PixelPoint::new(0, 0),
                original_dimensions,
                kind: RegionKind::Mask,
                ellipse: None,
            })
        }
        Value::Object(mut map) => {
            if !map.contains_key("original_dimensions") {
                let dims = frame_dimensions.ok_or_else(|| {
                    SidecarError::UnexpectedShape(
                        "descriptor lacks original_dimensions and no frame size was given"
                            .to_string(),
                    )
                })?;
                map.insert(
                    "original_dimensions".to_string(),
                    serde_json::to_value(dims)?,
                );
            }
            Ok(serde_json::from_value(Value::Object(map))?)
        }
        other => Err(SidecarError::UnexpectedShape(format!(
            "expected an object or array, found {}",
            type_name(&other)
        ))),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
