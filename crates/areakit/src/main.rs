//! areakit: derive a region sidecar from a folder of sprite frames.
//!
//! Loads every PNG frame in a folder, runs one boundary session
//! non-interactively, and writes the region descriptor as JSON. Useful
//! for:
//!
//! - Batch-generating collision regions for a whole asset tree
//! - Tuning expand, crop, and simplification tolerance
//! - Checking a region visually through SVG or PNG previews
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin areakit -- [OPTIONS] <FRAMES_DIR>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod load;
mod preview;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use areakit_export::{SidecarError, SvgMetadata, to_sidecar_json, to_svg};
use areakit_pipeline::normalize::DEFAULT_MAX_DISPLAY;
use areakit_pipeline::{
    AnchorStrategy, BoundaryOrderKind, BrushDab, Collecting, CropFractions, EllipseParams,
    PixelPoint, RegionConfig, RegionError, RegionKind, ScaleContext,
};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Derive an anchor-relative region from a folder of sprite frames.
///
/// Display-space inputs (`--ellipse`, `--dabs`) are interpreted on the
/// canvas the frames are fitted to: `--scale` if given, otherwise the
/// largest factor that fits 800x600 without upscaling.
#[derive(Parser)]
#[command(name = "areakit", version)]
struct Cli {
    /// Folder containing the frames (`*.png`, filename order).
    frames_dir: PathBuf,

    /// How the region mask is built.
    #[arg(long, value_enum, default_value_t = Mode::Mask)]
    mode: Mode,

    /// Signed expand amount in original pixels (mask mode).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    expand: i32,

    /// Fraction of the height removed from the top (mask mode).
    #[arg(long, default_value_t = 0.0)]
    crop_top: f64,

    /// Fraction of the height removed from the bottom (mask mode).
    #[arg(long, default_value_t = 0.0)]
    crop_bottom: f64,

    /// Fraction of the width removed from the left (mask mode).
    #[arg(long, default_value_t = 0.0)]
    crop_left: f64,

    /// Fraction of the width removed from the right (mask mode).
    #[arg(long, default_value_t = 0.0)]
    crop_right: f64,

    /// Ellipse as "CX,CY,W,H" in display pixels (circle mode).
    ///
    /// Defaults to half the canvas in each direction, centered.
    #[arg(long, value_name = "CX,CY,W,H", value_parser = parse_ellipse)]
    ellipse: Option<EllipseParams>,

    /// JSON file with brush dabs (draw mode).
    ///
    /// A list of `{"center": [x, y], "radius": r}` in display pixels.
    #[arg(long, value_name = "FILE")]
    dabs: Option<PathBuf>,

    /// RDP simplification tolerance in original pixels.
    #[arg(long, default_value_t = RegionConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Anchor placement.
    #[arg(long, value_enum, default_value_t = Anchor::Image)]
    anchor: Anchor,

    /// Order boundary pixels are simplified in.
    #[arg(long, value_enum, default_value_t = Order::Scan)]
    order: Order,

    /// Display pixels per original pixel.
    #[arg(long, value_parser = parse_positive_f64)]
    scale: Option<f64>,

    /// Full region config as a JSON string.
    ///
    /// When provided, `--epsilon`, `--anchor`, and `--order` are ignored.
    /// The JSON must be a valid `RegionConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the sidecar JSON to this file instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write an SVG overlay preview to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a PNG preview over frame 0 to this file.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Size of the PNG preview relative to the original frames.
    #[arg(long, default_value_t = preview::DEFAULT_PREVIEW_SCALE, value_parser = parse_positive_f32)]
    preview_scale: f32,

    /// Print per-stage diagnostics to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long, requires = "diagnostics")]
    json: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Mask building mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Union of frame alpha, then expand and crop.
    Mask,
    /// Parametric ellipse.
    Circle,
    /// Freehand brush dabs.
    Draw,
}

impl From<Mode> for RegionKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mask => Self::Mask,
            Mode::Circle => Self::Circle,
            Mode::Draw => Self::Draw,
        }
    }
}

/// Anchor placement selection.
#[derive(Clone, Copy, ValueEnum)]
enum Anchor {
    /// Bottom-center of the image rectangle.
    Image,
    /// Bottom-center of the opaque pixels.
    Opaque,
}

/// Boundary ordering selection.
#[derive(Clone, Copy, ValueEnum)]
enum Order {
    /// Row-major scan order.
    Scan,
    /// Border-following walk along the perimeter.
    Traced,
}

/// Errors the command line reports before exiting.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A file or folder could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The region pipeline rejected the input.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// The sidecar could not be produced.
    #[error(transparent)]
    Sidecar(#[from] SidecarError),

    /// A JSON argument or file could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame or preview image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Parse `"CX,CY,W,H"` into display-space ellipse parameters.
fn parse_ellipse(s: &str) -> Result<EllipseParams, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [cx, cy, w, h] = parts.as_slice() else {
        return Err(format!("expected CX,CY,W,H, got {s:?}"));
    };
    let int = |v: &str| v.parse::<i32>().map_err(|e| format!("{v:?}: {e}"));
    let size = |v: &str| v.parse::<u32>().map_err(|e| format!("{v:?}: {e}"));
    Ok(EllipseParams {
        center: PixelPoint::new(int(*cx)?, int(*cy)?),
        width: size(*w)?,
        height: size(*h)?,
    })
}

fn parse_positive_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{s:?}: {e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("must be a positive number, got {s}"))
    }
}

fn parse_positive_f32(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{s:?}: {e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("must be a positive number, got {s}"))
    }
}

/// Build a [`RegionConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual tunable flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<RegionConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return Ok(serde_json::from_str(json)?);
    }

    Ok(RegionConfig {
        epsilon: cli.epsilon,
        anchor: match cli.anchor {
            Anchor::Image => AnchorStrategy::ImageBottomCenter,
            Anchor::Opaque => AnchorStrategy::OpaqueBottomCenter,
        },
        boundary_order: match cli.order {
            Order::Scan => BoundaryOrderKind::ScanOrder,
            Order::Traced => BoundaryOrderKind::Traced,
        },
    })
}

fn read_dabs(path: &Path) -> Result<Vec<BrushDab>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Feed the mode-specific flags into a fresh session.
fn apply_mode(session: &mut Collecting, cli: &Cli) -> Result<(), CliError> {
    session.select_mode(cli.mode.into());
    match cli.mode {
        Mode::Mask => {
            session.set_expand(cli.expand);
            session.set_crop(CropFractions {
                top: cli.crop_top,
                bottom: cli.crop_bottom,
                left: cli.crop_left,
                right: cli.crop_right,
            })?;
        }
        Mode::Circle => {
            if let Some(ellipse) = cli.ellipse {
                session.set_ellipse(ellipse);
            }
        }
        Mode::Draw => {
            let dabs = match cli.dabs {
                Some(ref path) => read_dabs(path)?,
                None => {
                    tracing::warn!("draw mode without --dabs paints nothing");
                    Vec::new()
                }
            };
            for dab in dabs {
                session.set_brush_radius(dab.radius);
                session.paint_at(dab.center);
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    let epsilon = config.epsilon;
    let frames = load::load_frames(&cli.frames_dir)?;
    let dims = frames.dimensions();
    let scale = match cli.scale {
        Some(factor) => ScaleContext::new(factor)?,
        None => ScaleContext::fit(dims, DEFAULT_MAX_DISPLAY),
    };
    tracing::info!(
        frames = frames.len(),
        width = dims.width,
        height = dims.height,
        scale = scale.scale_factor,
        "loaded frames"
    );

    let first = frames.first().clone();
    let mut session = Collecting::new(frames, scale, config)?;
    apply_mode(&mut session, cli)?;
    let (descriptor, diagnostics) = session.commit()?.finish_with_diagnostics()?;

    let json = to_sidecar_json(&descriptor)?;
    match cli.out {
        Some(ref path) => {
            write_file(path, json.as_bytes())?;
            tracing::info!(
                path = %path.display(),
                points = descriptor.points.len(),
                "sidecar written"
            );
        }
        None => println!("{json}"),
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .frames_dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("region");
        let desc = format!("mode={} epsilon={}", descriptor.kind, epsilon);
        let metadata = SvgMetadata {
            title: Some(title),
            description: Some(&desc),
            descriptor_json: Some(&json),
        };
        let svg = to_svg(&descriptor, &metadata);
        write_file(svg_path, svg.as_bytes())?;
        tracing::info!(path = %svg_path.display(), bytes = svg.len(), "SVG written");
    }

    if let Some(ref preview_path) = cli.preview {
        let image = preview::render_preview(&first, &descriptor, cli.preview_scale);
        image.save(preview_path)?;
        tracing::info!(path = %preview_path.display(), "preview written");
    }

    if cli.diagnostics {
        if cli.json {
            eprintln!("{}", serde_json::to_string_pretty(&diagnostics)?);
        } else {
            eprintln!("{}", diagnostics.report());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
