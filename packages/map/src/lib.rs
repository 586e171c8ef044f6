#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map composition for geocoded address sets.
//!
//! Builds a [`MapArtifact`]: a serializable scene graph with boundary
//! polygons and their centroid labels at the bottom and a single marker
//! cluster layer on top. The artifact is rendered to a self-contained
//! Leaflet document by [`render`], and several artifacts can be folded
//! into one by [`merge`].

pub mod artifact;
pub mod compose;
pub mod content;
pub mod merge;
pub mod palette;
pub mod render;

use address_map_geometry::GeometryError;
use thiserror::Error;

pub use artifact::{
    LabelLayer, Layer, MapArtifact, Marker, MarkerCluster, PolygonLayer, TileSource, Viewport,
};
pub use compose::{ComposeOptions, MapPoint, compose};
pub use content::{ContactCard, LabeledAddress, MarkerContent, MarkerInfo, MarkerStyle};

/// Errors from composing, merging, or writing map artifacts.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// No points were supplied.
    #[error("No geocoded points to place on the map ({polygons} polygons supplied)")]
    EmptyInput {
        /// Number of polygons that came with the empty point set.
        polygons: usize,
    },

    /// A polygon's label position could not be computed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Reading or writing an artifact failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact JSON could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
