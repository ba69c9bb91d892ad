//! Boundary-configuration session: collect input interactively, commit,
//! then finish into a [`RegionDescriptor`].
//!
//! ```rust
//! # use areakit_pipeline::{Collecting, FrameStack, RegionConfig, RegionError, RegionKind, ScaleContext};
//! # fn run(frames: FrameStack) -> Result<(), RegionError> {
//! let mut session = Collecting::new(frames, ScaleContext::identity(), RegionConfig::default())?;
//! session.select_mode(RegionKind::Mask);
//! session.nudge_expand(5);
//!
//! let descriptor = session.commit()?.finish()?;
//! # let _ = descriptor;
//! # Ok(())
//! # }
//! ```
//!
//! Each transition consumes `self`. [`Collecting`] owns the frame stack
//! and the in-progress mode state; [`Committed`] owns the finished
//! original-space mask and its ordered boundary; `finish` produces the
//! immutable descriptor and the session is gone. Dropping either state
//! cancels the session.
//!
//! Only one mode is active at a time. Selecting a mode, even the one
//! already active, discards everything collected for the previous one.

use image::RgbaImage;

use crate::contour::BoundaryOrder;
use crate::diagnostics::{FinalizeDiagnostics, FinalizeSummary, StageDiagnostics, StageMetrics};
use crate::frames::FrameStack;
use crate::mask::{self, BrushDab, EllipseParams, MaskStrategy, PaintCanvas};
use crate::morphology::{self, CropFractions, MorphologyParams};
use crate::normalize::{self, ScaleContext};
use crate::types::{
    AnchorConvention, BinaryMask, CoordSpace, Dimensions, EllipseOffsets, PixelPoint,
    RegionConfig, RegionDescriptor, RegionError, RegionKind,
};

/// In-progress state of the active mode.
#[derive(Debug, Clone)]
enum ModeState {
    Unselected,
    Mask(MorphologyParams),
    Circle(EllipseParams),
    Draw(PaintCanvas),
}

impl ModeState {
    const fn kind(&self) -> Option<RegionKind> {
        match self {
            Self::Unselected => None,
            Self::Mask(_) => Some(RegionKind::Mask),
            Self::Circle(_) => Some(RegionKind::Circle),
            Self::Draw(_) => Some(RegionKind::Draw),
        }
    }
}

// ───────────────────────── Stage 0: Collecting ──────────────────────────

/// A session in its initial state; `Session::new` starts one.
pub type Session = Collecting;

/// Session state while the user builds a mask.
///
/// Pointer positions passed to [`paint_at`](Self::paint_at),
/// [`drag_through`](Self::drag_through) and
/// [`set_ellipse`](Self::set_ellipse) are display-space values; the
/// session removes [`ScaleContext::origin_offset`] on entry and keeps
/// everything in canvas coordinates on a canvas of
/// [`display_dimensions`](Self::display_dimensions). Previews, the
/// committed mask and [`strategy`](Self::strategy) all read that one
/// canvas state. Out-of-range inputs are clamped, and inputs for a mode
/// that is not active are ignored.
#[must_use = "sessions are consumed by advancing, call .commit() to continue"]
#[derive(Debug, Clone)]
pub struct Collecting {
    frames: FrameStack,
    scale: ScaleContext,
    config: RegionConfig,
    display: Dimensions,
    union: BinaryMask,
    base: RgbaImage,
    mode: ModeState,
}

impl Collecting {
    /// Start a session over `frames`, with no mode selected.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] if `scale` or `config`
    /// fails validation.
    pub fn new(
        frames: FrameStack,
        scale: ScaleContext,
        config: RegionConfig,
    ) -> Result<Self, RegionError> {
        scale.validate()?;
        config.validate()?;
        let canvas = scale.display_dimensions(frames.dimensions());
        let union = frames.alpha_union();
        let base = mask::display_frame(frames.first(), canvas);
        tracing::debug!(
            frames = frames.len(),
            width = frames.dimensions().width,
            height = frames.dimensions().height,
            display_width = canvas.width,
            display_height = canvas.height,
            "started boundary session"
        );
        Ok(Self {
            frames,
            scale,
            config,
            display: canvas,
            union,
            base,
            mode: ModeState::Unselected,
        })
    }

    /// Start a session with the mode and inputs of `strategy` already
    /// applied.
    ///
    /// Strategy values are canvas coordinates, as returned by
    /// [`strategy`](Self::strategy). They get the same clamping as live
    /// input: expand to `±original width`, the ellipse to the canvas, and
    /// each dab's center and radius to the canvas and brush range.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Collecting::new`] and
    /// [`MaskStrategy::validate`].
    pub fn from_strategy(
        frames: FrameStack,
        strategy: &MaskStrategy,
        scale: ScaleContext,
        config: RegionConfig,
    ) -> Result<Self, RegionError> {
        strategy.validate()?;
        let mut session = Self::new(frames, scale, config)?;
        match strategy {
            MaskStrategy::AlphaUnion(params) => {
                session.mode = ModeState::Mask(*params);
                session.set_expand(params.expand);
            }
            MaskStrategy::Ellipse(ellipse) => {
                session.mode = ModeState::Circle(ellipse.clamped_to(session.display));
            }
            MaskStrategy::Paint { dabs } => {
                let mut canvas = PaintCanvas::new(session.display);
                for &dab in dabs {
                    canvas.replay(dab);
                }
                session.mode = ModeState::Draw(canvas);
            }
        }
        Ok(session)
    }

    /// Switch to `kind`, discarding all state of the previous mode and
    /// applying the new mode's defaults.
    pub fn select_mode(&mut self, kind: RegionKind) {
        self.mode = match kind {
            RegionKind::Mask => ModeState::Mask(MorphologyParams::default()),
            RegionKind::Circle => ModeState::Circle(EllipseParams::centered_default(self.display)),
            RegionKind::Draw => ModeState::Draw(PaintCanvas::new(self.display)),
        };
        tracing::debug!(mode = %kind, "selected mode");
    }

    /// The active mode, if any.
    #[must_use]
    pub const fn active_mode(&self) -> Option<RegionKind> {
        self.mode.kind()
    }

    /// Set the signed expand amount (mask mode), clamped to
    /// `±original width`.
    pub fn set_expand(&mut self, amount: i32) {
        let limit = crate::types::to_i32(self.frames.dimensions().width);
        match &mut self.mode {
            ModeState::Mask(params) => params.expand = amount.clamp(-limit, limit),
            other => ignored("set_expand", other),
        }
    }

    /// Add `delta` to the expand amount (mask mode).
    pub fn nudge_expand(&mut self, delta: i32) {
        if let ModeState::Mask(params) = &self.mode {
            let next = params.expand.saturating_add(delta);
            self.set_expand(next);
        } else {
            ignored("nudge_expand", &self.mode);
        }
    }

    /// Replace the crop fractions (mask mode).
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] if the fractions fail
    /// [`CropFractions::validate`]; the previous fractions are kept.
    pub fn set_crop(&mut self, crop: CropFractions) -> Result<(), RegionError> {
        match &mut self.mode {
            ModeState::Mask(params) => {
                crop.validate()?;
                params.crop = crop;
            }
            other => ignored("set_crop", other),
        }
        Ok(())
    }

    /// Replace the ellipse (circle mode), clamped to the canvas. The
    /// center is a display-space position.
    pub fn set_ellipse(&mut self, ellipse: EllipseParams) {
        let local = EllipseParams {
            center: self.scale.to_canvas(ellipse.center),
            ..ellipse
        };
        let display = self.display;
        match &mut self.mode {
            ModeState::Circle(current) => *current = local.clamped_to(display),
            other => ignored("set_ellipse", other),
        }
    }

    /// Change the brush radius for later strokes (draw mode).
    pub fn set_brush_radius(&mut self, radius: u32) {
        match &mut self.mode {
            ModeState::Draw(canvas) => canvas.set_brush_radius(radius),
            other => ignored("set_brush_radius", other),
        }
    }

    /// Paint one dab at a display-space pointer position (draw mode).
    pub fn paint_at(&mut self, position: PixelPoint) {
        let local = self.scale.to_canvas(position);
        match &mut self.mode {
            ModeState::Draw(canvas) => canvas.dab(local),
            other => ignored("paint_at", other),
        }
    }

    /// Paint a dab at each sampled drag position (draw mode).
    pub fn drag_through<I: IntoIterator<Item = PixelPoint>>(&mut self, positions: I) {
        let scale = self.scale;
        match &mut self.mode {
            ModeState::Draw(canvas) => {
                canvas.drag(positions.into_iter().map(|p| scale.to_canvas(p)));
            }
            other => ignored("drag_through", other),
        }
    }

    /// The current inputs as a replayable strategy in canvas
    /// coordinates, if a mode is active.
    #[must_use]
    pub fn strategy(&self) -> Option<MaskStrategy> {
        match &self.mode {
            ModeState::Unselected => None,
            ModeState::Mask(params) => Some(MaskStrategy::AlphaUnion(*params)),
            ModeState::Circle(ellipse) => Some(MaskStrategy::Ellipse(*ellipse)),
            ModeState::Draw(canvas) => Some(MaskStrategy::Paint {
                dabs: canvas.dabs().to_vec(),
            }),
        }
    }

    /// Recorded brush dabs (draw mode only).
    #[must_use]
    pub fn dabs(&self) -> &[BrushDab] {
        match &self.mode {
            ModeState::Draw(canvas) => canvas.dabs(),
            _ => &[],
        }
    }

    /// The mask as it would currently be committed, at canvas size.
    #[must_use]
    pub fn preview_mask(&self) -> Option<BinaryMask> {
        match &self.mode {
            ModeState::Unselected => None,
            ModeState::Mask(params) => Some(mask::resample_nearest(
                &morphology::apply(&self.union, params),
                self.display,
                CoordSpace::Display,
            )),
            ModeState::Circle(ellipse) => Some(ellipse.rasterize(self.display, CoordSpace::Display)),
            ModeState::Draw(canvas) => Some(canvas.mask().clone()),
        }
    }

    /// The first frame at canvas size with the preview mask tinted over it.
    #[must_use]
    pub fn preview(&self) -> RgbaImage {
        match self.preview_mask() {
            Some(m) => mask::overlay_mask(&self.base, &m, mask::DEFAULT_OVERLAY_TINT),
            None => self.base.clone(),
        }
    }

    /// The frame stack.
    #[must_use]
    pub const fn frames(&self) -> &FrameStack {
        &self.frames
    }

    /// The display scaling in effect.
    #[must_use]
    pub const fn scale(&self) -> &ScaleContext {
        &self.scale
    }

    /// The finalizing configuration.
    #[must_use]
    pub const fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Canvas size.
    #[must_use]
    pub const fn display_dimensions(&self) -> Dimensions {
        self.display
    }

    /// Build the final original-space mask, extract its ordered
    /// boundary, and compute the anchor.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidParameter`] when no mode is selected
    /// and [`RegionError::NoBoundaryPoints`] when the mask is empty.
    pub fn commit(self) -> Result<Committed, RegionError> {
        let Some(strategy) = self.strategy() else {
            return Err(RegionError::InvalidParameter(
                "no mode selected before commit".to_string(),
            ));
        };
        let kind = strategy.kind();
        let original = self.frames.dimensions();

        let start = web_time::Instant::now();
        let mask = match &self.mode {
            ModeState::Draw(canvas) => {
                mask::resample_nearest(canvas.mask(), original, CoordSpace::Original)
            }
            _ => mask::build_mask(&strategy, &self.frames, &self.scale)?,
        };
        let mask_diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Mask {
                kind,
                width: original.width,
                height: original.height,
                occupied_pixels: mask.count(),
                total_pixels: original.pixel_count(),
            },
        };

        let start = web_time::Instant::now();
        let boundary = self.config.boundary_order.order(&mask);
        let boundary_diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Boundary {
                order: self.config.boundary_order,
                point_count: boundary.len(),
            },
        };
        if boundary.is_empty() {
            tracing::warn!(mode = %kind, "mask has no boundary points");
            return Err(RegionError::NoBoundaryPoints);
        }

        let anchor = normalize::anchor_point(self.config.anchor, original, &self.union);
        let ellipse = match &strategy {
            MaskStrategy::Ellipse(e) => {
                let o = e.to_original(&self.scale);
                let offset = normalize::to_anchor_relative(o.center, anchor);
                Some(EllipseOffsets {
                    x: offset.x,
                    y: offset.y,
                    w: o.width,
                    h: o.height,
                })
            }
            _ => None,
        };

        tracing::debug!(
            mode = %kind,
            boundary_points = boundary.len(),
            anchor_x = anchor.x,
            anchor_y = anchor.y,
            "committed session"
        );

        Ok(Committed {
            config: self.config,
            scale: self.scale,
            original,
            kind,
            mask,
            boundary,
            anchor,
            ellipse,
            mask_diag,
            boundary_diag,
        })
    }
}

fn ignored(operation: &str, mode: &ModeState) {
    tracing::debug!(
        operation,
        mode = ?mode.kind(),
        "ignoring input for inactive mode"
    );
}

// ───────────────────────── Stage 1: Committed ──────────────────────────

/// Session state after the user commits.
///
/// Holds the original-space mask and its boundary in the order the
/// simplifier will see it. Call [`finish`](Self::finish) to produce the
/// descriptor.
#[must_use = "sessions are consumed by advancing, call .finish() to continue"]
#[derive(Debug, Clone)]
pub struct Committed {
    config: RegionConfig,
    scale: ScaleContext,
    original: Dimensions,
    kind: RegionKind,
    mask: BinaryMask,
    boundary: Vec<PixelPoint>,
    anchor: PixelPoint,
    ellipse: Option<EllipseOffsets>,
    mask_diag: StageDiagnostics,
    boundary_diag: StageDiagnostics,
}

impl Committed {
    /// The final mask, in original space.
    #[must_use]
    pub const fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Ordered boundary pixels, in original space.
    #[must_use]
    pub fn boundary(&self) -> &[PixelPoint] {
        &self.boundary
    }

    /// Anchor pixel, in original space.
    #[must_use]
    pub const fn anchor(&self) -> PixelPoint {
        self.anchor
    }

    /// Which mode produced the mask.
    #[must_use]
    pub const fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Anchor-relative ellipse geometry (circle mode only).
    #[must_use]
    pub const fn ellipse(&self) -> Option<EllipseOffsets> {
        self.ellipse
    }

    /// Convert to anchor-relative offsets and simplify.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::TooFewPoints`] when the boundary is a
    /// single pixel.
    pub fn finish(self) -> Result<RegionDescriptor, RegionError> {
        self.finish_with_diagnostics().map(|(descriptor, _)| descriptor)
    }

    /// Like [`finish`](Self::finish), also returning stage diagnostics.
    ///
    /// # Errors
    ///
    /// See [`finish`](Self::finish).
    pub fn finish_with_diagnostics(
        self,
    ) -> Result<(RegionDescriptor, FinalizeDiagnostics), RegionError> {
        let start = web_time::Instant::now();
        let relative: Vec<PixelPoint> = self
            .boundary
            .iter()
            .map(|&p| normalize::to_anchor_relative(p, self.anchor))
            .collect();
        let normalize_diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Normalize {
                anchor_x: self.anchor.x,
                anchor_y: self.anchor.y,
                scale_factor: self.scale.scale_factor,
            },
        };

        let start = web_time::Instant::now();
        let points = crate::simplify::simplify_checked(&relative, self.config.epsilon)?;
        let simplification_diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Simplification {
                epsilon: self.config.epsilon,
                points_before: relative.len(),
                points_after: points.len(),
                reduction_ratio: crate::diagnostics::reduction_ratio(relative.len(), points.len()),
            },
        };

        tracing::debug!(
            mode = %self.kind,
            before = relative.len(),
            after = points.len(),
            epsilon = self.config.epsilon,
            "simplified boundary"
        );

        let total_duration = self.mask_diag.duration
            + self.boundary_diag.duration
            + normalize_diag.duration
            + simplification_diag.duration;
        let diagnostics = FinalizeDiagnostics {
            mask: self.mask_diag,
            boundary: self.boundary_diag,
            normalize: normalize_diag,
            simplification: simplification_diag,
            total_duration,
            summary: FinalizeSummary {
                image_width: self.original.width,
                image_height: self.original.height,
                kind: self.kind,
                boundary_point_count: relative.len(),
                final_point_count: points.len(),
            },
        };

        let descriptor = RegionDescriptor {
            points,
            anchor: AnchorConvention::BottomCenter,
            original_anchor: self.anchor,
            original_dimensions: self.original,
            kind: self.kind,
            ellipse: self.ellipse,
        };
        Ok((descriptor, diagnostics))
    }
}
