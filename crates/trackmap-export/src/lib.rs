//! trackmap-export: Pure format serializers (sans-IO)
//!
//! Converts a processed track into its two output artifacts: a PNG
//! track image and a JSON coordinate sidecar.  Both are returned as
//! in-memory buffers; writing them is the caller's job.

pub mod raster;
pub mod sidecar;

pub use raster::{encode_png, rasterize};
pub use sidecar::{Sidecar, from_sidecar_json, to_sidecar_json};

/// File extension of the rendered track image.
pub const IMAGE_EXTENSION: &str = "png";

/// File extension of the coordinate sidecar.
pub const SIDECAR_EXTENSION: &str = "coordinates";

/// Errors that can occur while producing output artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The canvas could not be allocated.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),

    /// Sidecar JSON could not be produced or read.
    #[error("sidecar JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
