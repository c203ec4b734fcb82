//! trackmap: convert a KML track outline into a track image and a
//! coordinate sidecar.
//!
//! Reads `<kml-dir>/<KML_FILE>`, runs the track pipeline, and writes
//!
//! - `<maps-dir>/<name>.png`: the padded track outline, and
//! - `<coordinates-dir>/<name>.coordinates`: every point's normalized
//!   offsets as JSON,
//!
//! where `<name>` is the input file name up to its first `.`.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin trackmap -- [OPTIONS] <KML_FILE>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use trackmap_export::{ExportError, IMAGE_EXTENSION, SIDECAR_EXTENSION};
use trackmap_pipeline::diagnostics::{Clock, process_with_diagnostics};
use trackmap_pipeline::{TrackConfig, TrackError};

/// Convert a KML track outline into a track image and a coordinate
/// sidecar.
///
/// All computation finishes in memory before any output file is
/// touched; outputs are written to temporary files and renamed into
/// place.
#[derive(Parser)]
#[command(name = "trackmap", version)]
struct Cli {
    /// KML file name, relative to the input directory.
    kml_file: PathBuf,

    /// Directory containing the KML input.
    #[arg(long, default_value = "kml")]
    kml_dir: PathBuf,

    /// Directory receiving the PNG track image.  Must exist.
    #[arg(long, default_value = "maps")]
    maps_dir: PathBuf,

    /// Directory receiving the coordinate sidecar.  Must exist.
    #[arg(long, default_value = "coordinates")]
    coordinates_dir: PathBuf,

    /// Track width in pixels; the height follows from the aspect ratio.
    #[arg(long, default_value_t = TrackConfig::DEFAULT_BASE_TRACK_WIDTH, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    base_track_width: u32,

    /// Do not connect the last point back to the first.
    #[arg(long)]
    open: bool,

    /// Full track config as a JSON string.
    ///
    /// When provided, `--base-track-width` and `--open` are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print every annotated point to stdout, one JSON object per line.
    #[arg(long)]
    print_points: bool,

    /// Print a per-stage diagnostics report to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON to stdout.
    #[arg(long)]
    json: bool,
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("error parsing --config-json: {0}")]
    Config(#[source] serde_json::Error),

    #[error("cannot derive an output name from '{}'", path.display())]
    InvalidInputName { path: PathBuf },

    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    ReadInput { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to write {}: {source}", path.display())]
    OutputWrite { path: PathBuf, source: io::Error },
}

/// Build a [`TrackConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<TrackConfig, RunError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(RunError::Config);
    }

    Ok(TrackConfig {
        base_track_width: cli.base_track_width,
        close_loop: !cli.open,
        ..TrackConfig::default()
    })
}

/// Read the KML document, mapping a missing file to its own error.
fn read_kml(path: PathBuf) -> Result<String, RunError> {
    std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            RunError::InputNotFound { path }
        } else {
            RunError::ReadInput { path, source }
        }
    })
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let config = config_from_cli(cli)?;
    let name = output::base_name(&cli.kml_file).ok_or_else(|| RunError::InvalidInputName {
        path: cli.kml_file.clone(),
    })?;

    let input_path = cli.kml_dir.join(&cli.kml_file);
    eprintln!("Reading track from {}", input_path.display());
    let kml = read_kml(input_path)?;

    let (result, diagnostics) = process_with_diagnostics(&kml, &config, &StdClock)?;
    let layout = &result.layout;
    eprintln!(
        "{} points, ratio {:.4}: track {}x{}, canvas {}x{}, line width {}px",
        result.points.len(),
        layout.ratio,
        layout.track_width,
        layout.track_height,
        layout.canvas_width,
        layout.canvas_height,
        layout.line_width,
    );

    eprintln!("Rendering track...");
    let image = trackmap_export::rasterize(&result.points, layout, &config)?;
    let png = trackmap_export::encode_png(&image)?;
    let sidecar = trackmap_export::to_sidecar_json(&result.points, layout)?;

    let image_path = cli.maps_dir.join(format!("{name}.{IMAGE_EXTENSION}"));
    let sidecar_path = cli
        .coordinates_dir
        .join(format!("{name}.{SIDECAR_EXTENSION}"));
    output::write_all_atomic(&[
        (image_path.as_path(), png.as_slice()),
        (sidecar_path.as_path(), sidecar.as_bytes()),
    ])?;
    eprintln!("Image written to {} ({} bytes)", image_path.display(), png.len());
    eprintln!(
        "Coordinates written to {} ({} bytes)",
        sidecar_path.display(),
        sidecar.len(),
    );

    if cli.print_points {
        for point in &result.points {
            let line = serde_json::to_string(point).map_err(ExportError::from)?;
            println!("{line}");
        }
    }

    if cli.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&diagnostics).map_err(ExportError::from)?;
        println!("{json}");
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trackmap").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["monza.kml"]);
        assert_eq!(cli.kml_dir, PathBuf::from("kml"));
        assert_eq!(cli.maps_dir, PathBuf::from("maps"));
        assert_eq!(cli.coordinates_dir, PathBuf::from("coordinates"));
        assert_eq!(config_from_cli(&cli).unwrap(), TrackConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&["monza.kml", "--base-track-width", "800", "--open"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.base_track_width, 800);
        assert!(!config.close_loop);
    }

    #[test]
    fn zero_track_width_is_rejected_by_clap() {
        let result = Cli::try_parse_from(["trackmap", "monza.kml", "--base-track-width", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_json_wins_over_flags() {
        let cli = parse(&[
            "monza.kml",
            "--open",
            "--config-json",
            r#"{"base_track_width": 250, "line_color": [0, 0, 0, 255]}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.base_track_width, 250);
        assert_eq!(config.line_color, [0, 0, 0, 255]);
        assert!(config.close_loop);
    }

    #[test]
    fn bad_config_json() {
        let cli = parse(&["monza.kml", "--config-json", "{nope"]);
        assert!(matches!(config_from_cli(&cli), Err(RunError::Config(_))));
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_kml(dir.path().join("absent.kml"));
        assert!(matches!(result, Err(RunError::InputNotFound { .. })));
    }
}
