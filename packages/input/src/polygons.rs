//! Boundary polygon loading.
//!
//! One row per vertex: `polygon_id, lat, lon[, vertex_order][, name]`.
//! Polygons come out sorted by `polygon_id`, numerically when every id is
//! a number. Within a polygon, vertices are sorted by `vertex_order` when
//! the column exists, otherwise file order is kept.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use address_map_geometry::{LatLon, Polygon};
use serde::Deserialize;

use crate::{InputError, missing_columns};

#[derive(Debug, Deserialize)]
struct VertexRow {
    polygon_id: String,
    lat: f64,
    lon: f64,
    vertex_order: Option<f64>,
    name: Option<String>,
}

#[derive(Debug, Default)]
struct Group {
    name: Option<String>,
    vertices: Vec<(Option<f64>, LatLon)>,
}

/// Loads the polygon file at `path`.
///
/// # Errors
///
/// * [`InputError::Io`] if the file cannot be opened.
/// * [`InputError::MissingColumns`] if `polygon_id`, `lat` or `lon` is
///   absent.
/// * [`InputError::InvalidRow`] if a vertex row is malformed or out of
///   range.
/// * [`InputError::Geometry`] if a polygon has fewer than three vertices.
pub fn load_polygons(path: &Path) -> Result<Vec<Polygon>, InputError> {
    let file = std::fs::File::open(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_polygons(file, &path.display().to_string())
}

/// Like [`load_polygons`], but a missing file yields no polygons.
///
/// # Errors
///
/// Any error from [`load_polygons`] other than the file not existing.
pub fn load_polygons_if_present(path: &Path) -> Result<Vec<Polygon>, InputError> {
    if !path.exists() {
        log::info!(
            "Note: {} not found. Creating map without polygons",
            path.display()
        );
        return Ok(Vec::new());
    }
    load_polygons(path)
}

/// Reads polygons from any `Read` source. `source` names the input in
/// errors and logs.
///
/// # Errors
///
/// See [`load_polygons`].
pub fn read_polygons(reader: impl Read, source: &str) -> Result<Vec<Polygon>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| InputError::Csv {
            path: source.to_string(),
            source: e,
        })?
        .clone();

    let missing = missing_columns(&headers, &[&["polygon_id"], &["lat"], &["lon"]]);
    if !missing.is_empty() {
        return Err(InputError::MissingColumns {
            path: source.to_string(),
            columns: missing,
        });
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for (index, result) in reader.records().enumerate() {
        let fallback = index as u64 + 2;
        let record = result.map_err(|e| InputError::InvalidRow {
            path: source.to_string(),
            line: e.position().map_or(fallback, csv::Position::line),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(fallback, csv::Position::line);

        let row: VertexRow = record.deserialize(Some(&headers)).map_err(|e| {
            InputError::InvalidRow {
                path: source.to_string(),
                line,
                message: e.to_string(),
            }
        })?;

        let vertex = LatLon::new(row.lat, row.lon);
        if !vertex.is_valid() {
            return Err(InputError::InvalidRow {
                path: source.to_string(),
                line,
                message: format!("vertex ({}, {}) is out of range", row.lat, row.lon),
            });
        }

        let group = groups.entry(row.polygon_id).or_default();
        if group.name.is_none() {
            group.name = row.name.filter(|n| !n.is_empty());
        }
        group.vertices.push((row.vertex_order, vertex));
    }

    let mut groups: Vec<(String, Group)> = groups.into_iter().collect();
    sort_numeric_ids(&mut groups);

    let polygons = groups
        .into_iter()
        .map(|(id, mut group)| {
            // Stable, so ties and unnumbered vertices keep file order.
            group.vertices.sort_by(|(a, _), (b, _)| {
                a.unwrap_or(f64::INFINITY)
                    .total_cmp(&b.unwrap_or(f64::INFINITY))
            });
            let vertices = group.vertices.into_iter().map(|(_, v)| v);
            Polygon::new(id, vertices, group.name).map_err(InputError::from)
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Loaded {} polygons from {source}", polygons.len());

    Ok(polygons)
}

/// Re-sorts `groups` (already in string order) by numeric id when every
/// id parses as a number, so `10` follows `9`.
fn sort_numeric_ids(groups: &mut [(String, Group)]) {
    let numeric = |id: &str| id.parse::<f64>().unwrap_or(f64::NAN);
    if groups.iter().all(|(id, _)| id.parse::<f64>().is_ok()) {
        groups.sort_by(|(a, _), (b, _)| numeric(a).total_cmp(&numeric(b)));
    }
}
