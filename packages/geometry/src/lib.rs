#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Polygon geometry for map overlays.
//!
//! Boundary polygons arrive as ordered rings of latitude/longitude pairs.
//! This crate closes open rings and computes the area-weighted centroid
//! used to place each polygon's label. Coordinates are stored the way
//! `geo` expects them: `x` is longitude, `y` is latitude.

pub mod centroid;

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use centroid::{ring_centroid, signed_area};

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl LatLon {
    /// Creates a position from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if latitude is within `[-90, 90]` and longitude within
    /// `[-180, 180]`. NaN is never valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<LatLon> for Coord<f64> {
    fn from(p: LatLon) -> Self {
        Self { x: p.lon, y: p.lat }
    }
}

impl From<Coord<f64>> for LatLon {
    fn from(c: Coord<f64>) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

/// Errors from polygon construction and centroid computation.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The ring has fewer than three distinct vertices.
    #[error("Polygon {} has {count} distinct vertices, at least 3 are required", describe(.polygon.as_deref()))]
    TooFewVertices {
        /// Polygon id, if known.
        polygon: Option<String>,
        /// Number of distinct vertices supplied.
        count: usize,
    },

    /// The ring encloses no area (e.g., all vertices collinear).
    #[error("Polygon {} is degenerate: it encloses zero area", describe(.polygon.as_deref()))]
    DegeneratePolygon {
        /// Polygon id, if known.
        polygon: Option<String>,
    },
}

impl GeometryError {
    /// Attaches a polygon id to an error raised for an anonymous ring.
    #[must_use]
    pub fn for_polygon(self, id: &str) -> Self {
        match self {
            Self::TooFewVertices { count, .. } => Self::TooFewVertices {
                polygon: Some(id.to_string()),
                count,
            },
            Self::DegeneratePolygon { .. } => Self::DegeneratePolygon {
                polygon: Some(id.to_string()),
            },
        }
    }
}

fn describe(polygon: Option<&str>) -> String {
    polygon.map_or_else(|| "<ring>".to_string(), |id| format!("'{id}'"))
}

/// A boundary polygon with a closed outer ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Identifier from the input data.
    pub id: String,
    /// Optional human-readable name.
    pub name: Option<String>,
    ring: LineString<f64>,
}

impl Polygon {
    /// Builds a polygon from vertices in ring order, appending the first
    /// vertex when the ring is open.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] if fewer than three
    /// distinct vertices are supplied.
    pub fn new(
        id: impl Into<String>,
        vertices: impl IntoIterator<Item = LatLon>,
        name: Option<String>,
    ) -> Result<Self, GeometryError> {
        let id = id.into();
        let mut ring: LineString<f64> = vertices.into_iter().map(Coord::from).collect();
        ring.close();

        // A closed ring repeats its first vertex once.
        let distinct = ring.0.len().saturating_sub(1);
        if distinct < 3 {
            return Err(GeometryError::TooFewVertices {
                polygon: Some(id),
                count: distinct,
            });
        }

        Ok(Self { id, name, ring })
    }

    /// The closed ring, first vertex repeated at the end.
    #[must_use]
    pub const fn ring(&self) -> &LineString<f64> {
        &self.ring
    }

    /// Ring vertices as latitude/longitude pairs.
    #[must_use]
    pub fn vertices(&self) -> Vec<LatLon> {
        self.ring.0.iter().copied().map(LatLon::from).collect()
    }

    /// Label text: the name, or `"Area {id}"` when no name was given.
    #[must_use]
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Area {}", self.id),
        }
    }

    /// Area-weighted centroid of the ring.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegeneratePolygon`] if the ring encloses
    /// no area.
    pub fn centroid(&self) -> Result<LatLon, GeometryError> {
        ring_centroid(&self.ring)
            .map(LatLon::from)
            .map_err(|e| e.for_polygon(&self.id))
    }
}
