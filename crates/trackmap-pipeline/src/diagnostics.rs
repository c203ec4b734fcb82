//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Every call to [`process_with_diagnostics`] collects these alongside
//! the pipeline result.  The time source is injected through [`Clock`]
//! so this crate stays free of platform time APIs.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{ProcessResult, TrackConfig, TrackError};
use crate::{bounds, coordinates, layout, project};

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

/// Monotonic time source used to measure stage durations.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 0: locating the KML `coordinates` element.
    pub extract: StageDiagnostics,
    /// Stage 1: coordinate token parsing.
    pub parse: StageDiagnostics,
    /// Stage 2: bounding box.
    pub bounds: StageDiagnostics,
    /// Stage 3: layout planning.
    pub layout: StageDiagnostics,
    /// Stage 4: point projection.
    pub projection: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    Extract {
        /// Size of the KML document in bytes.
        input_bytes: usize,
        /// Length of the extracted coordinate text in bytes.
        text_bytes: usize,
    },
    Parse {
        point_count: usize,
    },
    Bounds {
        latitude_span: f64,
        longitude_span: f64,
    },
    Layout {
        ratio: f64,
        track_width: u32,
        track_height: u32,
        canvas_side: u32,
        line_width: u32,
    },
    Projection {
        point_count: usize,
        /// Whether the single-point fallback was used.
        single_point: bool,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub point_count: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Points: {}  |  Canvas: {}x{}",
            self.summary.point_count, self.summary.canvas_width, self.summary.canvas_height,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Extract", &self.extract),
            ("Parse", &self.parse),
            ("Bounds", &self.bounds),
            ("Layout", &self.layout),
            ("Projection", &self.projection),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

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
        StageMetrics::Extract {
            input_bytes,
            text_bytes,
        } => format!("{input_bytes} bytes -> {text_bytes} bytes of coordinates"),
        StageMetrics::Parse { point_count } => format!("{point_count} points"),
        StageMetrics::Bounds {
            latitude_span,
            longitude_span,
        } => format!("lat span={latitude_span:.6} lon span={longitude_span:.6}"),
        StageMetrics::Layout {
            ratio,
            track_width,
            track_height,
            canvas_side,
            line_width,
        } => format!(
            "ratio={ratio:.4} track={track_width}x{track_height} canvas={canvas_side} line={line_width}px"
        ),
        StageMetrics::Projection {
            point_count,
            single_point,
        } => {
            if *single_point {
                format!("{point_count} point (single-point fallback)")
            } else {
                format!("{point_count} points")
            }
        }
    }
}

/// Run a closure and record how long it took.
fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let value = f();
    (value, clock.elapsed(&start))
}

/// Run the full pipeline, recording per-stage diagnostics.
///
/// Produces exactly the same [`ProcessResult`] as
/// [`process`](crate::process).
///
/// # Errors
///
/// Same as [`process`](crate::process).
pub fn process_with_diagnostics<C: Clock>(
    kml: &str,
    config: &TrackConfig,
    clock: &C,
) -> Result<(ProcessResult, PipelineDiagnostics), TrackError> {
    let run_start = clock.now();
    config.validate()?;

    let (text, extract_duration) = timed(clock, || coordinates::extract_coordinates_text(kml));
    let text = text?;
    let extract = StageDiagnostics {
        duration: extract_duration,
        metrics: StageMetrics::Extract {
            input_bytes: kml.len(),
            text_bytes: text.len(),
        },
    };

    let (points, parse_duration) = timed(clock, || coordinates::parse_coordinates(&text));
    let points = points?;
    let parse = StageDiagnostics {
        duration: parse_duration,
        metrics: StageMetrics::Parse {
            point_count: points.len(),
        },
    };

    let (bounding_box, bounds_duration) = timed(clock, || bounds::compute_bounding_box(&points));
    let bounding_box = bounding_box?;
    let bounds_diag = StageDiagnostics {
        duration: bounds_duration,
        metrics: StageMetrics::Bounds {
            latitude_span: bounding_box.latitude_span(),
            longitude_span: bounding_box.longitude_span(),
        },
    };

    let single_point = points.len() == 1;
    let (planned, layout_duration) = timed(clock, || {
        layout::plan_track(points.len(), &bounding_box, config)
    });
    let (track_layout, scale) = planned?;
    let layout_diag = StageDiagnostics {
        duration: layout_duration,
        metrics: StageMetrics::Layout {
            ratio: track_layout.ratio,
            track_width: track_layout.track_width,
            track_height: track_layout.track_height,
            canvas_side: track_layout.canvas_width,
            line_width: track_layout.line_width,
        },
    };

    let (annotated, projection_duration) = timed(clock, || {
        project::project_track(&points, &bounding_box, &track_layout, scale)
    });
    let projection = StageDiagnostics {
        duration: projection_duration,
        metrics: StageMetrics::Projection {
            point_count: annotated.len(),
            single_point,
        },
    };

    let summary = PipelineSummary {
        point_count: annotated.len(),
        canvas_width: track_layout.canvas_width,
        canvas_height: track_layout.canvas_height,
    };
    let result = ProcessResult {
        points: annotated,
        bounds: bounding_box,
        layout: track_layout,
        scale,
    };
    let diagnostics = PipelineDiagnostics {
        extract,
        parse,
        bounds: bounds_diag,
        layout: layout_diag,
        projection,
        total_duration: clock.elapsed(&run_start),
        summary,
    };
    Ok((result, diagnostics))
}
