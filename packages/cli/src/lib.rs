#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address map runs: CSV in, clustered Leaflet map out.
//!
//! [`run_geocode`] loads an address list, geocodes it through the
//! configured service, overlays optional boundary polygons and writes a
//! timestamped HTML map plus its JSON scene. [`run_combine`] folds the
//! markers of previously written scenes into one map.
//!
//! Both the interactive menu ([`interactive`]) and the flag-driven
//! subcommands in the binary end up here.

pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use address_map_cli_utils::{IndicatifProgress, MultiProgress};
use address_map_geocoder::batch::{BatchItem, batch_resolve_with};
use address_map_geocoder::cancel::CancellationToken;
use address_map_geocoder::client::{GeocodeClient, Throttle};
use address_map_geocoder::locationiq::LocationIqClient;
use address_map_geocoder::progress::ProgressCallback;
use address_map_geocoder::service_registry::{self, GeocodingService};
use address_map_geocoder::{GeocodeError, Geocoder};
use address_map_geometry::{LatLon, Polygon};
use address_map_input::{AddressRecord, InputError, RegionFilter};
use address_map_map::{
    ComposeError, ComposeOptions, MapArtifact, MapPoint, MarkerInfo, MarkerStyle, Viewport,
};
use chrono::{DateTime, Local};
use thiserror::Error;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Reading the address or polygon file failed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The geocoder could not be set up.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// The map could not be composed or written.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// A saved map could not be loaded for combining.
    #[error("Cannot load map {path}: {source}")]
    Artifact {
        /// Path of the scene file.
        path: String,
        /// Underlying error.
        source: ComposeError,
    },

    /// `--service` names no enabled service.
    #[error("Unknown or disabled geocoding service: {0}")]
    UnknownService(String),

    /// Every configured service is disabled.
    #[error("No geocoding service is enabled")]
    NoService,

    /// The output directory could not be created.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Where map files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Output directory, created on demand.
    pub dir: PathBuf,
    /// File name prefix.
    pub prefix: String,
}

impl OutputTarget {
    /// HTML and JSON paths for a run started at `now`:
    /// `{dir}/{prefix}_map_{YYYYmmdd_HHMMSS}.{html,json}`.
    #[must_use]
    pub fn paths(&self, now: &DateTime<Local>) -> (PathBuf, PathBuf) {
        let stem = format!("{}_map_{}", self.prefix, now.format("%Y%m%d_%H%M%S"));
        (
            self.dir.join(format!("{stem}.html")),
            self.dir.join(format!("{stem}.json")),
        )
    }
}

/// Files produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenMap {
    /// The Leaflet document.
    pub html: PathBuf,
    /// The JSON scene, usable with `combine`.
    pub json: PathBuf,
    /// Number of markers on the map.
    pub markers: usize,
    /// Whether geocoding stopped early.
    pub interrupted: bool,
}

/// Settings for one geocode-and-map run.
#[derive(Debug, Clone)]
pub struct GeocodeRun {
    /// Address CSV.
    pub input: PathBuf,
    /// Polygon CSV; a missing file is skipped with a note.
    pub polygons: Option<PathBuf>,
    /// Marker popup style, which also decides the required columns.
    pub style: MarkerStyle,
    /// City/state row filter.
    pub filter: RegionFilter,
    /// Geocoding service credential.
    pub api_key: Option<String>,
    /// Service id; the highest-priority enabled service when `None`.
    pub service: Option<String>,
    /// Viewport and presentation settings.
    pub compose: ComposeOptions,
    /// Output location.
    pub output: OutputTarget,
}

/// Points ready for the map.
#[derive(Debug, Clone)]
pub struct GeocodedPoints {
    /// Geocoded points in input order, then pre-located points.
    pub points: Vec<MapPoint<MarkerInfo>>,
    /// Addresses that were attempted but did not resolve.
    pub failed: usize,
    /// Whether the batch stopped early.
    pub interrupted: bool,
}

/// Looks up a geocoding service by id, or the default one.
///
/// # Errors
///
/// [`RunError::UnknownService`] or [`RunError::NoService`].
pub fn select_service(id: Option<&str>) -> Result<GeocodingService, RunError> {
    service_registry::default_service(id).ok_or_else(|| {
        id.map_or(RunError::NoService, |id| {
            RunError::UnknownService(id.to_string())
        })
    })
}

/// Geocodes the records that need it and appends the ones that already
/// carry coordinates.
pub async fn geocode_records<G: Geocoder>(
    client: &GeocodeClient<G>,
    records: Vec<AddressRecord>,
    progress: &Arc<dyn ProgressCallback>,
) -> GeocodedPoints {
    let (located, pending): (Vec<_>, Vec<_>) =
        records.into_iter().partition(AddressRecord::is_located);

    let items = pending
        .into_iter()
        .map(|record| BatchItem {
            address: record.address,
            metadata: record.content,
        })
        .collect();
    let outcome = batch_resolve_with(client, items, client.cancel_token(), progress).await;

    let mut points: Vec<MapPoint<MarkerInfo>> = outcome
        .located
        .into_iter()
        .map(|located| MapPoint {
            position: LatLon::new(located.result.latitude, located.result.longitude),
            address: located.result.address,
            content: located.metadata,
        })
        .collect();

    if !located.is_empty() {
        log::info!("Adding {} pre-located addresses", located.len());
    }
    points.extend(located.into_iter().filter_map(|record| {
        record.position.map(|position| MapPoint {
            position,
            address: record.address,
            content: record.content,
        })
    }));

    GeocodedPoints {
        points,
        failed: outcome.failed,
        interrupted: outcome.interrupted,
    }
}

/// Loads the polygon file, if any, and checks that every polygon has a
/// centroid, so a bad file is reported before any address is sent.
///
/// # Errors
///
/// [`RunError::Input`] if the file is malformed or a polygon is
/// degenerate.
pub fn load_boundaries(path: Option<&Path>) -> Result<Vec<Polygon>, RunError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    log::info!("Loading polygon coordinates from {}...", path.display());
    let polygons = address_map_input::load_polygons_if_present(path)?;
    for polygon in &polygons {
        polygon.centroid().map_err(InputError::from)?;
    }

    Ok(polygons)
}

/// Renders `artifact` and writes both output files.
///
/// # Errors
///
/// [`RunError::Io`] if the output directory cannot be created, or
/// [`RunError::Compose`] if a file cannot be written.
pub fn write_map(
    artifact: &MapArtifact,
    target: &OutputTarget,
    title: &str,
    now: &DateTime<Local>,
) -> Result<(PathBuf, PathBuf), RunError> {
    std::fs::create_dir_all(&target.dir).map_err(|e| RunError::Io {
        path: target.dir.display().to_string(),
        source: e,
    })?;

    let (html, json) = target.paths(now);
    address_map_map::render::write_html(artifact, title, &html)?;
    artifact.write_json(&json)?;

    log::info!("Map saved to {}", html.display());
    Ok((html, json))
}

/// Geocodes `run.input` through the configured service and writes the map.
///
/// The credential is checked before anything is read or sent.
///
/// # Errors
///
/// * [`RunError::Geocode`] with [`GeocodeError::MissingCredential`] if
///   no API key was given.
/// * Any error from [`run_geocode_with`].
pub async fn run_geocode(
    run: &GeocodeRun,
    multi: &MultiProgress,
    cancel: &CancellationToken,
) -> Result<WrittenMap, RunError> {
    let service = select_service(run.service.as_deref())?;
    let geocoder = LocationIqClient::new(&service, run.api_key.as_deref().unwrap_or_default())?;
    log::info!(
        "Using geocoding service {} ({})",
        service.name,
        service.base_url()
    );

    let client = GeocodeClient::new(geocoder, Throttle::from(service.pacing), cancel.clone());
    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding addresses");

    run_geocode_with(run, &client, &progress).await
}

/// Runs the load, geocode, compose and write steps with a caller-supplied
/// client. The client's cancellation token governs the batch. Both input
/// files are read and checked before the first request.
///
/// # Errors
///
/// * [`RunError::Input`] if the address or polygon file is unusable or a
///   polygon is degenerate.
/// * [`RunError::Compose`] if nothing resolved or the output cannot be
///   written.
pub async fn run_geocode_with<G: Geocoder>(
    run: &GeocodeRun,
    client: &GeocodeClient<G>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<WrittenMap, RunError> {
    log::info!("Reading addresses from {}...", run.input.display());
    let records = address_map_input::load_addresses(&run.input, run.style, &run.filter)?;
    let polygons = load_boundaries(run.polygons.as_deref())?;

    let geocoded = geocode_records(client, records, progress).await;
    if geocoded.interrupted {
        log::warn!(
            "Geocoding interrupted; mapping the {} points resolved so far",
            geocoded.points.len()
        );
    }

    log::info!("Creating map...");
    let artifact = address_map_map::compose(&run.compose, &geocoded.points, &polygons)?;
    let title = format!("{} map", run.output.prefix);
    let (html, json) = write_map(&artifact, &run.output, &title, &Local::now())?;

    Ok(WrittenMap {
        html,
        json,
        markers: geocoded.points.len(),
        interrupted: geocoded.interrupted,
    })
}

/// Merges the markers of saved JSON scenes into one clustered map.
///
/// # Errors
///
/// * [`RunError::Artifact`] if an input cannot be loaded.
/// * [`RunError::Compose`] if the inputs hold no markers or the output
///   cannot be written.
pub fn run_combine(
    inputs: &[PathBuf],
    viewport: Viewport,
    target: &OutputTarget,
) -> Result<WrittenMap, RunError> {
    let artifacts = inputs
        .iter()
        .map(|path| {
            log::info!("Reading markers from {}...", path.display());
            MapArtifact::read_json(path).map_err(|e| RunError::Artifact {
                path: path.display().to_string(),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let merged = address_map_map::merge::merge_markers(&artifacts, viewport)?;
    let (html, json) = write_map(&merged, target, "Combined map", &Local::now())?;

    Ok(WrittenMap {
        html,
        json,
        markers: merged.markers().count(),
        interrupted: false,
    })
}

/// Exit status after a forced interrupt (128 + SIGINT).
pub const FORCED_EXIT_CODE: i32 = 130;

/// Trips `cancel` on Ctrl-C. The request in flight finishes first; the
/// batch stops before the next one. A second Ctrl-C exits the process
/// with [`FORCED_EXIT_CODE`].
pub fn spawn_interrupt_handler(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        log::warn!(
            "Interrupt received; stopping after the current request (Ctrl-C again to quit)"
        );
        cancel.request_cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            log::error!("Second interrupt received; exiting");
            std::process::exit(FORCED_EXIT_CODE);
        }
    })
}
