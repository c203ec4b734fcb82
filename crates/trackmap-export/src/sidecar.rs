//! JSON coordinate sidecar.
//!
//! The sidecar records every annotated point plus the padding that
//! places the track on the canvas, so a consumer can position its own
//! markers on top of the rendered image:
//!
//! ```json
//! {
//!   "coordinates": [
//!     {"latitude": 0.0, "longitude": 1.0, "offset_x_scale": 0.0, "offset_y_scale": 0.0}
//!   ],
//!   "track_width_padding": 25.0,
//!   "track_height_padding": 25.0
//! }
//! ```

use serde::{Deserialize, Serialize};

use trackmap_pipeline::{AnnotatedPoint, Layout};

use crate::ExportError;

/// Contents of a `.coordinates` sidecar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    /// Track points in input order.
    pub coordinates: Vec<AnnotatedPoint>,
    /// See [`Layout::track_width_padding`].
    pub track_width_padding: f64,
    /// See [`Layout::track_height_padding`].
    pub track_height_padding: f64,
}

impl Sidecar {
    /// Assemble a sidecar from annotated points and their layout.
    #[must_use]
    pub fn new(points: &[AnnotatedPoint], layout: &Layout) -> Self {
        Self {
            coordinates: points.to_vec(),
            track_width_padding: layout.track_width_padding,
            track_height_padding: layout.track_height_padding,
        }
    }
}

/// Serialize a track as compact sidecar JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails (non-finite
/// values are rejected by the pipeline before they get here).
pub fn to_sidecar_json(points: &[AnnotatedPoint], layout: &Layout) -> Result<String, ExportError> {
    Ok(serde_json::to_string(&Sidecar::new(points, layout))?)
}

/// Parse sidecar JSON.
///
/// Point objects must carry exactly the four expected keys.
///
/// # Errors
///
/// Returns [`ExportError::Json`] for malformed JSON, missing fields or
/// unknown point keys.
pub fn from_sidecar_json(json: &str) -> Result<Sidecar, ExportError> {
    Ok(serde_json::from_str(json)?)
}
