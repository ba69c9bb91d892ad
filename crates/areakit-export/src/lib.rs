//! areakit-export: Pure serializers for region descriptors (sans-IO)
//!
//! Converts [`RegionDescriptor`](areakit_pipeline::RegionDescriptor)s
//! into the JSON sidecar format stored next to each asset and into SVG
//! preview overlays. Nothing here touches the filesystem.

pub mod sidecar;
pub mod svg;

pub use sidecar::{SidecarError, from_sidecar_json, to_sidecar_json};
pub use svg::{SvgMetadata, build_path_data, to_svg};
