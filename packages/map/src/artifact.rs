//! The composed map scene graph.
//!
//! A [`MapArtifact`] is write-once: the composer builds it, then it is
//! rendered and saved. Layers are drawn in order, so the first layer ends
//! up at the bottom.

use std::path::Path;

use address_map_geometry::LatLon;
use serde::{Deserialize, Serialize};

use crate::ComposeError;

/// Base tile layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSource {
    /// Leaflet URL template (`{s}`, `{z}`, `{x}`, `{y}` placeholders).
    pub url_template: String,
    /// Attribution HTML shown in the map corner.
    pub attribution: String,
}

impl TileSource {
    /// Standard `OpenStreetMap` tiles.
    #[must_use]
    pub fn openstreetmap() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">\
                          OpenStreetMap</a> contributors"
                .to_string(),
        }
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Initial center.
    pub center: LatLon,
    /// Initial zoom level.
    pub zoom: u8,
    /// Base tiles.
    #[serde(default)]
    pub tiles: TileSource,
}

impl Default for Viewport {
    /// Centered on Winnetka, IL at street-level zoom.
    fn default() -> Self {
        Self {
            center: LatLon::new(42.1080, -87.7352),
            zoom: 14,
            tiles: TileSource::default(),
        }
    }
}

/// A filled boundary polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonLayer {
    /// Source polygon id.
    pub id: String,
    /// Closed ring.
    pub ring: Vec<LatLon>,
    /// Stroke color.
    pub color: String,
    /// Fill color.
    pub fill_color: String,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
    /// Popup text shown when the polygon is clicked.
    pub popup: Option<String>,
}

/// Text placed at a polygon's centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelLayer {
    /// Id of the labelled polygon.
    pub polygon_id: String,
    /// Centroid of the polygon.
    pub position: LatLon,
    /// Label text.
    pub text: String,
    /// Text color, matching the polygon stroke.
    pub color: String,
}

/// One address marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker position.
    pub position: LatLon,
    /// Popup HTML.
    pub popup_html: String,
    /// Maximum popup width in pixels.
    pub popup_max_width: u32,
    /// Hover tooltip text.
    pub tooltip: Option<String>,
}

/// Markers grouped so dense areas collapse into count badges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerCluster {
    /// Markers in this cluster group.
    pub markers: Vec<Marker>,
}

/// One entry in the layer stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    /// A filled polygon.
    Polygon(PolygonLayer),
    /// A polygon label.
    Label(LabelLayer),
    /// A marker cluster group.
    MarkerCluster(MarkerCluster),
}

impl Layer {
    /// Returns `true` for layers that belong to the polygon overlay
    /// (fills and their labels).
    #[must_use]
    pub const fn is_overlay(&self) -> bool {
        matches!(self, Self::Polygon(_) | Self::Label(_))
    }
}

/// A fully composed map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapArtifact {
    /// Initial view and base tiles.
    pub viewport: Viewport,
    /// Layers, bottom first.
    pub layers: Vec<Layer>,
}

impl MapArtifact {
    /// Polygon layers in draw order.
    pub fn polygons(&self) -> impl Iterator<Item = &PolygonLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Polygon(p) => Some(p),
            _ => None,
        })
    }

    /// Label layers in draw order.
    pub fn labels(&self) -> impl Iterator<Item = &LabelLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Label(l) => Some(l),
            _ => None,
        })
    }

    /// Every marker across all cluster layers.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::MarkerCluster(c) => Some(c.markers.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Loads an artifact from its JSON sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] if the file cannot be read or decoded.
    pub fn read_json(path: &Path) -> Result<Self, ComposeError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes the artifact as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] if encoding or writing fails.
    pub fn write_json(&self, path: &Path) -> Result<(), ComposeError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
