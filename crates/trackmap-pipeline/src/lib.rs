//! trackmap-pipeline: Pure track layout pipeline (sans-IO).
//!
//! Turns the coordinate list of a KML track into canvas-ready data:
//! coordinate extraction -> parsing -> bounding box -> layout planning ->
//! point projection.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! strings and returns structured data.  Rendering and serialization
//! live in `trackmap-export`, filesystem interaction in the `trackmap`
//! binary.

pub mod bounds;
pub mod coordinates;
pub mod diagnostics;
pub mod layout;
pub mod project;
pub mod types;

pub use bounds::compute_bounding_box;
pub use coordinates::{extract_coordinates_text, parse_coordinates};
pub use layout::{compute_axis_scale, compute_layout, plan_track};
pub use project::{project_point, project_track, to_pixel};
pub use types::{
    AnnotatedPoint, Axis, AxisScale, BoundingBox, GeoPoint, Layout, PixelPoint, ProcessResult,
    TrackConfig, TrackError,
};

/// Run the full track pipeline on a KML document.
///
/// # Pipeline steps
///
/// 1. Extract the text of the first `coordinates` element
/// 2. Parse it into points
/// 3. Compute the bounding box
/// 4. Plan the square canvas layout and per-axis scale
/// 5. Annotate every point with its normalized offsets
///
/// # Errors
///
/// Returns [`TrackError::InvalidConfig`] if `config` is unusable.
/// Returns [`TrackError::Xml`], [`TrackError::MissingCoordinates`],
/// [`TrackError::EmptyCoordinates`] or [`TrackError::InvalidToken`] for
/// malformed input.
/// Returns [`TrackError::DegenerateBoundingBox`] if a track of two or
/// more points has zero extent on either axis.
/// Returns [`TrackError::CanvasTooLarge`] for tracks too elongated to
/// fit the configured canvas limit.
pub fn process(kml: &str, config: &TrackConfig) -> Result<ProcessResult, TrackError> {
    config.validate()?;

    // 1-2. Extract and parse.
    let text = coordinates::extract_coordinates_text(kml)?;
    let points = coordinates::parse_coordinates(&text)?;

    // 3. Bounding box.
    let bounds = bounds::compute_bounding_box(&points)?;

    // 4. Layout and scale.
    let (layout, scale) = layout::plan_track(points.len(), &bounds, config)?;

    // 5. Projection.
    let points = project::project_track(&points, &bounds, &layout, scale);

    Ok(ProcessResult {
        points,
        bounds,
        layout,
        scale,
    })
}
