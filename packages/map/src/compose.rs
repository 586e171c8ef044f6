//! Builds a [`MapArtifact`] from geocoded points and boundary polygons.
//!
//! Layer order is fixed: every polygon fill (each followed by its label)
//! comes first, then a single marker cluster with all points. Polygon
//! colors come from [`crate::palette`] by insertion index.

use address_map_geometry::{LatLon, Polygon};

use crate::ComposeError;
use crate::artifact::{
    LabelLayer, Layer, MapArtifact, Marker, MarkerCluster, PolygonLayer, Viewport,
};
use crate::content::MarkerContent;
use crate::palette::color_for;

/// A geocoded address and the content for its marker.
#[derive(Debug, Clone)]
pub struct MapPoint<M> {
    /// Marker position.
    pub position: LatLon,
    /// The address that was geocoded.
    pub address: String,
    /// Popup and tooltip source.
    pub content: M,
}

/// Presentation settings that are not part of the data.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    /// Initial view and base tiles.
    pub viewport: Viewport,
    /// Fill opacity for every polygon.
    pub fill_opacity: f64,
    /// Maximum popup width in pixels.
    pub popup_max_width: u32,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            fill_opacity: 0.2,
            popup_max_width: 300,
        }
    }
}

/// Composes points and polygons into a layered map.
///
/// # Errors
///
/// * [`ComposeError::EmptyInput`] if `points` is empty.
/// * [`ComposeError::Geometry`] if a polygon's centroid cannot be
///   computed; the error names the polygon.
pub fn compose<M: MarkerContent>(
    options: &ComposeOptions,
    points: &[MapPoint<M>],
    polygons: &[Polygon],
) -> Result<MapArtifact, ComposeError> {
    if points.is_empty() {
        return Err(ComposeError::EmptyInput {
            polygons: polygons.len(),
        });
    }

    let mut layers = Vec::with_capacity(polygons.len() * 2 + 1);

    for (index, polygon) in polygons.iter().enumerate() {
        let color = color_for(index).to_string();
        let text = polygon.label();
        let position = polygon.centroid()?;

        log::debug!(
            "Polygon '{}' ({text}): {} vertices, label at {:.6}, {:.6}",
            polygon.id,
            polygon.ring().0.len(),
            position.lat,
            position.lon
        );

        layers.push(Layer::Polygon(PolygonLayer {
            id: polygon.id.clone(),
            ring: polygon.vertices(),
            color: color.clone(),
            fill_color: color.clone(),
            fill_opacity: options.fill_opacity,
            popup: Some(text.clone()),
        }));
        layers.push(Layer::Label(LabelLayer {
            polygon_id: polygon.id.clone(),
            position,
            text,
            color,
        }));
    }

    let markers = points
        .iter()
        .map(|point| Marker {
            position: point.position,
            popup_html: point.content.popup_html(&point.address),
            popup_max_width: options.popup_max_width,
            tooltip: Some(point.content.tooltip(&point.address))
                .filter(|t| !t.trim().is_empty()),
        })
        .collect();
    layers.push(Layer::MarkerCluster(MarkerCluster { markers }));

    log::info!(
        "Composed map with {} polygons and {} markers",
        polygons.len(),
        points.len()
    );

    Ok(MapArtifact {
        viewport: options.viewport.clone(),
        layers,
    })
}

#[cfg(test)]
mod tests {
    use address_map_geometry::GeometryError;

    use super::*;
    use crate::content::LabeledAddress;
    use crate::palette::PALETTE;

    fn point(lat: f64, lon: f64, label: &str) -> MapPoint<LabeledAddress> {
        MapPoint {
            position: LatLon::new(lat, lon),
            address: format!("{label} St, Winnetka, IL"),
            content: LabeledAddress {
                label: label.to_string(),
            },
        }
    }

    fn square(id: &str, offset: f64, name: Option<&str>) -> Polygon {
        Polygon::new(
            id,
            vec![
                LatLon::new(42.10 + offset, -87.74),
                LatLon::new(42.10 + offset, -87.73),
                LatLon::new(42.11 + offset, -87.73),
                LatLon::new(42.11 + offset, -87.74),
            ],
            name.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn empty_points_is_an_error() {
        let polygons = [square("1", 0.0, None)];
        let err =
            compose::<LabeledAddress>(&ComposeOptions::default(), &[], &polygons).unwrap_err();
        assert!(matches!(err, ComposeError::EmptyInput { polygons: 1 }));
    }

    #[test]
    fn polygons_are_layered_beneath_markers() {
        let points = [
            point(42.101, -87.735, "Elm"),
            point(42.102, -87.736, "Oak"),
            point(42.103, -87.737, "Pine"),
        ];
        let polygons = [square("1", 0.0, Some("East")), square("2", 0.02, None)];

        let artifact = compose(&ComposeOptions::default(), &points, &polygons).unwrap();

        let last_overlay = artifact.layers.iter().rposition(Layer::is_overlay).unwrap();
        let first_marker = artifact
            .layers
            .iter()
            .position(|l| matches!(l, Layer::MarkerCluster(_)))
            .unwrap();
        assert!(last_overlay < first_marker);
        assert_eq!(artifact.polygons().count(), 2);
        assert_eq!(artifact.markers().count(), 3);
    }

    #[test]
    fn markers_keep_point_order_and_content() {
        let points = [point(42.101, -87.735, "Elm"), point(42.102, -87.736, "Oak")];
        let artifact = compose(&ComposeOptions::default(), &points, &[]).unwrap();

        let markers: Vec<&Marker> = artifact.markers().collect();
        assert_eq!(markers[0].tooltip.as_deref(), Some("Elm"));
        assert_eq!(markers[1].tooltip.as_deref(), Some("Oak"));
        assert!(markers[1].popup_html.contains("Oak St, Winnetka, IL"));
        assert_eq!(markers[0].popup_max_width, 300);
        assert_eq!(markers[0].position, LatLon::new(42.101, -87.735));
    }

    #[test]
    fn polygon_colors_cycle_through_palette() {
        let points = [point(42.1, -87.7, "Elm")];
        let polygons: Vec<Polygon> = (0..17_i32)
            .map(|i| square(&i.to_string(), f64::from(i) * 0.01, None))
            .collect();

        let artifact = compose(&ComposeOptions::default(), &points, &polygons).unwrap();

        let colors: Vec<&str> = artifact.polygons().map(|p| p.color.as_str()).collect();
        assert_eq!(colors[0], PALETTE[0]);
        assert_eq!(colors[1], PALETTE[1]);
        assert_eq!(colors[15], PALETTE[15]);
        assert_eq!(colors[16], PALETTE[0]);
        for polygon in artifact.polygons() {
            assert_eq!(polygon.color, polygon.fill_color);
            assert!((polygon.fill_opacity - 0.2).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn labels_sit_at_centroids_with_fallback_text() {
        let points = [point(42.1, -87.7, "Elm")];
        let polygons = [square("1", 0.0, Some("East")), square("9", 0.02, None)];

        let artifact = compose(&ComposeOptions::default(), &points, &polygons).unwrap();
        let labels: Vec<&LabelLayer> = artifact.labels().collect();

        assert_eq!(labels[0].text, "East");
        assert_eq!(labels[1].text, "Area 9");
        assert!((labels[0].position.lat - 42.105).abs() < 1e-9);
        assert!((labels[0].position.lon - -87.735).abs() < 1e-9);
        assert_eq!(labels[1].color, PALETTE[1]);

        // Each label directly follows its polygon.
        assert!(matches!(&artifact.layers[0], Layer::Polygon(p) if p.id == "1"));
        assert!(matches!(&artifact.layers[1], Layer::Label(l) if l.polygon_id == "1"));
    }

    #[test]
    fn degenerate_polygon_aborts_with_its_id() {
        let points = [point(42.1, -87.7, "Elm")];
        let flat = Polygon::new(
            "flat",
            vec![
                LatLon::new(0.0, 0.0),
                LatLon::new(1.0, 1.0),
                LatLon::new(2.0, 2.0),
            ],
            None,
        )
        .unwrap();

        let err = compose(&ComposeOptions::default(), &points, &[flat]).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Geometry(GeometryError::DegeneratePolygon { polygon: Some(ref id) }) if id == "flat"
        ));
    }

    #[test]
    fn blank_tooltip_is_omitted() {
        let points = [MapPoint {
            position: LatLon::new(42.1, -87.7),
            address: String::new(),
            content: LabeledAddress::default(),
        }];
        let artifact = compose(&ComposeOptions::default(), &points, &[]).unwrap();
        assert!(artifact.markers().next().unwrap().tooltip.is_none());
    }
}
