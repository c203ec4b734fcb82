//! Shared types for the trackmap pipeline.

use serde::{Deserialize, Serialize};

/// A track point as read from a KML `coordinates` element.
///
/// The first comma-separated field of each KML token is stored in
/// `latitude` and the second in `longitude`.  KML writes tokens as
/// `longitude,latitude`, so the names are swapped relative to the
/// geographic meaning.  The sidecar consumer reads these exact keys and
/// the swap is what makes the rendered track come out north-up, so the
/// naming is part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// First field of the KML token; mapped onto the horizontal axis.
    pub latitude: f64,
    /// Second field of the KML token; mapped onto the vertical axis.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A [`GeoPoint`] together with its normalized position inside the
/// bounding box.
///
/// Serializes flat, with exactly the keys `latitude`, `longitude`,
/// `offset_x_scale` and `offset_y_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotatedPoint {
    /// See [`GeoPoint::latitude`].
    pub latitude: f64,
    /// See [`GeoPoint::longitude`].
    pub longitude: f64,
    /// Distance from the latitude lower bound, in units of the latitude
    /// span (0.0 to 1.0).
    pub offset_x_scale: f64,
    /// Distance from the longitude upper bound, in units of the longitude
    /// span (0.0 to 1.0).
    pub offset_y_scale: f64,
}

/// A position on the output canvas, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned extent of a track in coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// `lat_max - lat_min`.
    #[must_use]
    pub fn latitude_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// `lon_max - lon_min`.
    #[must_use]
    pub fn longitude_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Returns `true` if `point` lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.latitude)
            && (self.lon_min..=self.lon_max).contains(&point.longitude)
    }
}

/// Coordinate axis of a [`BoundingBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude => f.write_str("latitude"),
            Self::Longitude => f.write_str("longitude"),
        }
    }
}

/// Canvas geometry for one track, derived from the bounding box aspect
/// ratio.
///
/// The canvas is always square.  The track occupies `track_width` x
/// `track_height` pixels and is offset by `track_width_padding` /
/// `track_height_padding`, which include the aspect correction that
/// centers the shorter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// `longitude_span / latitude_span`.
    pub ratio: f64,
    /// Drawn track width in pixels (the configured base width).
    pub track_width: u32,
    /// Drawn track height in pixels (`round(track_width * ratio)`).
    pub track_height: u32,
    /// Base margin on every side.
    pub padding: f64,
    /// Horizontal offset of the track: `padding` plus any aspect correction.
    pub track_width_padding: f64,
    /// Vertical offset of the track: `padding` plus any aspect correction.
    pub track_height_padding: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Stroke width in pixels, never below the configured minimum.
    pub line_width: u32,
}

impl Layout {
    /// The larger of `track_width` and `track_height`.
    #[must_use]
    pub fn max_dimension(&self) -> u32 {
        self.track_width.max(self.track_height)
    }
}

/// Per-axis unit scale factors: `1 / span` for each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub unit_x: f64,
    pub unit_y: f64,
}

impl AxisScale {
    /// Scale that maps every point onto offset `0.0`.
    ///
    /// Used for single-point tracks, which have no extent to normalize
    /// against.
    pub const ZERO: Self = Self {
        unit_x: 0.0,
        unit_y: 0.0,
    };
}

/// Configuration for layout, projection and rendering.
///
/// All parameters have defaults matching the reference track renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Track width in pixels; the height follows from the aspect ratio.
    pub base_track_width: u32,

    /// Padding is the larger track dimension divided by this.
    pub padding_divisor: f64,

    /// Line width is the larger track dimension divided by this,
    /// truncated.
    pub line_width_divisor: f64,

    /// Lower bound for the computed line width.
    pub min_line_width: u32,

    /// Largest accepted canvas side in pixels.  Extremely elongated
    /// tracks are rejected instead of allocating huge images.
    pub max_canvas_dimension: u32,

    /// RGBA fill applied to the whole canvas before drawing.
    pub background: [u8; 4],

    /// RGBA stroke colour of the track line.
    pub line_color: [u8; 4],

    /// Whether the last point connects back to the first.
    pub close_loop: bool,
}

impl TrackConfig {
    pub const DEFAULT_BASE_TRACK_WIDTH: u32 = 500;
    pub const DEFAULT_PADDING_DIVISOR: f64 = 20.0;
    pub const DEFAULT_LINE_WIDTH_DIVISOR: f64 = 50.0;
    pub const DEFAULT_MIN_LINE_WIDTH: u32 = 1;
    pub const DEFAULT_MAX_CANVAS_DIMENSION: u32 = 16_384;
    /// Translucent white wash.
    pub const DEFAULT_BACKGROUND: [u8; 4] = [255, 255, 255, 150];
    /// Opaque white.
    pub const DEFAULT_LINE_COLOR: [u8; 4] = [255, 255, 255, 255];
    pub const DEFAULT_CLOSE_LOOP: bool = true;

    /// Check that every field is usable by the layout planner.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.base_track_width == 0 {
            return Err(TrackError::InvalidConfig(
                "base_track_width must be positive".to_string(),
            ));
        }
        if !(self.padding_divisor.is_finite() && self.padding_divisor > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "padding_divisor must be positive and finite, got {}",
                self.padding_divisor
            )));
        }
        if !(self.line_width_divisor.is_finite() && self.line_width_divisor > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "line_width_divisor must be positive and finite, got {}",
                self.line_width_divisor
            )));
        }
        if self.min_line_width == 0 {
            return Err(TrackError::InvalidConfig(
                "min_line_width must be at least 1".to_string(),
            ));
        }
        if self.max_canvas_dimension == 0 {
            return Err(TrackError::InvalidConfig(
                "max_canvas_dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            base_track_width: Self::DEFAULT_BASE_TRACK_WIDTH,
            padding_divisor: Self::DEFAULT_PADDING_DIVISOR,
            line_width_divisor: Self::DEFAULT_LINE_WIDTH_DIVISOR,
            min_line_width: Self::DEFAULT_MIN_LINE_WIDTH,
            max_canvas_dimension: Self::DEFAULT_MAX_CANVAS_DIMENSION,
            background: Self::DEFAULT_BACKGROUND,
            line_color: Self::DEFAULT_LINE_COLOR,
            close_loop: Self::DEFAULT_CLOSE_LOOP,
        }
    }
}

/// Result of running the track pipeline.
///
/// Carries everything the export serializers need: the annotated
/// points for the sidecar and the layout for rasterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Every input point, in input order, with its offsets attached.
    pub points: Vec<AnnotatedPoint>,
    pub bounds: BoundingBox,
    pub layout: Layout,
    pub scale: AxisScale,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// The input is not well-formed XML.
    #[error("malformed KML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The document has no `coordinates` element, or it has no text.
    #[error("KML document has no coordinates element")]
    MissingCoordinates,

    /// The `coordinates` element contains no tokens.
    #[error("KML coordinates element is empty")]
    EmptyCoordinates,

    /// A coordinate token could not be read as two finite numbers.
    #[error("invalid coordinate token #{index} '{token}': {reason}")]
    InvalidToken {
        /// Zero-based position of the token in the coordinate list.
        index: usize,
        token: String,
        reason: String,
    },

    /// All points share one value on an axis, so it cannot be
    /// normalized.
    #[error("degenerate bounding box: every point has the same {axis}")]
    DegenerateBoundingBox { axis: Axis },

    /// An axis span is too small or too large for its reciprocal to be a
    /// finite, non-zero scale factor.
    #[error("bounding box {axis} span of {span} cannot be normalized")]
    UnscalableSpan { axis: Axis, span: f64 },

    /// The computed canvas exceeds the configured limit.
    #[error("canvas of {dimension}px exceeds the maximum of {max}px")]
    CanvasTooLarge { dimension: f64, max: u32 },

    /// Configuration is invalid.
    #[error("invalid track configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TrackConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_base_width_is_rejected() {
        let config = TrackConfig {
            base_track_width: 0,
            ..TrackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn nan_divisor_is_rejected() {
        let config = TrackConfig {
            padding_divisor: f64::NAN,
            ..TrackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_json_fills_missing_fields_with_defaults() {
        let config: TrackConfig = serde_json::from_str(r#"{"close_loop": false}"#).unwrap();
        assert!(!config.close_loop);
        assert_eq!(
            config.base_track_width,
            TrackConfig::DEFAULT_BASE_TRACK_WIDTH
        );
    }

    #[test]
    fn annotated_point_serializes_four_keys() {
        let point = AnnotatedPoint {
            latitude: 1.0,
            longitude: 2.0,
            offset_x_scale: 0.25,
            offset_y_scale: 0.75,
        };
        let value = serde_json::to_value(point).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        for key in ["latitude", "longitude", "offset_x_scale", "offset_y_scale"] {
            assert!(object.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn bounding_box_spans() {
        let bounds = BoundingBox {
            lat_min: -1.0,
            lat_max: 3.0,
            lon_min: 10.0,
            lon_max: 12.5,
        };
        assert!((bounds.latitude_span() - 4.0).abs() < f64::EPSILON);
        assert!((bounds.longitude_span() - 2.5).abs() < f64::EPSILON);
        assert!(bounds.contains(GeoPoint::new(0.0, 11.0)));
        assert!(!bounds.contains(GeoPoint::new(0.0, 13.0)));
    }

    #[test]
    fn degenerate_error_names_axis() {
        let err = TrackError::DegenerateBoundingBox {
            axis: Axis::Latitude,
        };
        assert_eq!(
            err.to_string(),
            "degenerate bounding box: every point has the same latitude"
        );
    }

    #[test]
    fn unscalable_error_names_axis_and_span() {
        let err = TrackError::UnscalableSpan {
            axis: Axis::Longitude,
            span: f64::INFINITY,
        };
        assert_eq!(
            err.to_string(),
            "bounding box longitude span of inf cannot be normalized"
        );
    }
}
