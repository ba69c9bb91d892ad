//! Session diagnostics: timing and counts for each finalizing stage.
//!
//! Collected by [`Committed::finish_with_diagnostics`](crate::Committed::finish_with_diagnostics)
//! and [`extract_region_with_diagnostics`](crate::extract_region_with_diagnostics)
//! for parameter tuning (epsilon, expand, boundary order).
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps are
//! captured via the `web-time` crate, which uses `performance.now()` on
//! WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contour::BoundaryOrderKind;
use crate::types::RegionKind;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected while turning a session into a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeDiagnostics {
    /// Mask building in its final resolution.
    pub mask: StageDiagnostics,
    /// Boundary extraction and ordering.
    pub boundary: StageDiagnostics,
    /// Display/original/anchor-relative conversion.
    pub normalize: StageDiagnostics,
    /// RDP simplification.
    pub simplification: StageDiagnostics,
    /// Sum of the stage durations (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: FinalizeSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Mask building metrics.
    Mask {
        /// Which mode built the mask.
        kind: RegionKind,
        /// Mask width in pixels.
        width: u32,
        /// Mask height in pixels.
        height: u32,
        /// Occupied pixels.
        occupied_pixels: u64,
        /// All pixels (`width * height`).
        total_pixels: u64,
    },
    /// Boundary extraction metrics.
    Boundary {
        /// Ordering handed to the simplifier.
        order: BoundaryOrderKind,
        /// Boundary points found.
        point_count: usize,
    },
    /// Coordinate normalization metrics.
    Normalize {
        /// Anchor x in original space.
        anchor_x: i32,
        /// Anchor y in original space.
        anchor_y: i32,
        /// Display pixels per original pixel.
        scale_factor: f64,
    },
    /// RDP simplification metrics.
    Simplification {
        /// Tolerance used.
        epsilon: f64,
        /// Points before simplification.
        points_before: usize,
        /// Points after simplification.
        points_after: usize,
        /// Fraction of points removed (`1 - after / before`).
        reduction_ratio: f64,
    },
}

/// High-level summary counts for one finalized session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeSummary {
    /// Source frame width in pixels.
    pub image_width: u32,
    /// Source frame height in pixels.
    pub image_height: u32,
    /// Which mode produced the region.
    pub kind: RegionKind,
    /// Boundary points before simplification.
    pub boundary_point_count: usize,
    /// Points in the descriptor.
    pub final_point_count: usize,
}

impl FinalizeDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Region Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}  Mode: {}",
            self.summary.image_width, self.summary.image_height, self.summary.kind,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Mask", &self.mask),
            ("Boundary", &self.boundary),
            ("Normalize", &self.normalize),
            ("Simplification", &self.simplification),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Boundary points: {}  |  Final points: {}",
            self.summary.boundary_point_count, self.summary.final_point_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Mask {
            kind,
            width,
            height,
            occupied_pixels,
            total_pixels,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixels > 0 {
                *occupied_pixels as f64 / *total_pixels as f64 * 100.0
            } else {
                0.0
            };
            format!("{kind} {width}x{height} occupied={occupied_pixels} ({coverage:.1}%)")
        }
        StageMetrics::Boundary { order, point_count } => {
            format!("{order:?} {point_count} pts")
        }
        StageMetrics::Normalize {
            anchor_x,
            anchor_y,
            scale_factor,
        } => format!("anchor=({anchor_x}, {anchor_y}) scale={scale_factor:.3}"),
        StageMetrics::Simplification {
            epsilon,
            points_before,
            points_after,
            reduction_ratio,
        } => {
            format!(
                "eps={epsilon:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
                reduction_ratio * 100.0,
            )
        }
    }
}

/// Fraction of points removed by simplification.
pub(crate) fn reduction_ratio(before: usize, after: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = if before > 0 {
        1.0 - after as f64 / before as f64
    } else {
        0.0
    };
    ratio
}
