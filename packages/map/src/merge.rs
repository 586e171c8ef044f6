//! Folds the markers of several saved maps into one clustered map.

use crate::ComposeError;
use crate::artifact::{Layer, MapArtifact, MarkerCluster, Viewport};

/// Collects every marker from `artifacts`, in order, into a single
/// cluster layer on a fresh map. Polygon overlays of the inputs are not
/// carried over.
///
/// # Errors
///
/// Returns [`ComposeError::EmptyInput`] if the inputs hold no markers.
pub fn merge_markers(
    artifacts: &[MapArtifact],
    viewport: Viewport,
) -> Result<MapArtifact, ComposeError> {
    let markers: Vec<_> = artifacts
        .iter()
        .flat_map(MapArtifact::markers)
        .cloned()
        .collect();

    if markers.is_empty() {
        return Err(ComposeError::EmptyInput { polygons: 0 });
    }

    log::info!(
        "Merged {} markers from {} maps",
        markers.len(),
        artifacts.len()
    );

    Ok(MapArtifact {
        viewport,
        layers: vec![Layer::MarkerCluster(MarkerCluster { markers })],
    })
}
