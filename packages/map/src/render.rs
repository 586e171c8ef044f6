//! Leaflet rendering of a [`MapArtifact`].
//!
//! The output is a single HTML document that loads Leaflet and
//! Leaflet.markercluster from a CDN and replays the artifact's layers in
//! order. The artifact itself is embedded as JSON, so the document needs
//! nothing else at view time.

use std::path::Path;

use crate::ComposeError;
use crate::artifact::MapArtifact;

// The document is split around the two insertion points so that inserted
// text is never searched for markers.
const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>"#;

const MIDDLE: &str = r#"</title>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"></script>

  <!-- Leaflet.markercluster 1.4.1 -->
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css" />
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.Default.css" />
  <script src="https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js"></script>

  <style>
    html, body, #map { height: 100%; margin: 0; }
    .area-label { background: none; border: none; }
    .area-label div {
      font-size: 16px;
      font-weight: bold;
      white-space: nowrap;
      text-shadow: -1px -1px 0 #fff, 1px -1px 0 #fff, -1px 1px 0 #fff, 1px 1px 0 #fff;
      transform: translate(-50%, -50%);
      display: inline-block;
    }
  </style>
</head>
<body>
  <div id="map"></div>
  <script id="scene" type="application/json">"#;

const TAIL: &str = r#"</script>
  <script>
    (function () {
      const scene = JSON.parse(document.getElementById('scene').textContent);
      const vp = scene.viewport;
      const map = L.map('map').setView([vp.center.lat, vp.center.lon], vp.zoom);
      L.tileLayer(vp.tiles.url_template, {attribution: vp.tiles.attribution, maxZoom: 19}).addTo(map);

      const escape = (s) => String(s).replace(/[&<>"']/g, (c) => ({
        '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
      })[c]);

      for (const layer of scene.layers) {
        switch (layer.type) {
          case 'polygon': {
            const shape = L.polygon(layer.ring.map((p) => [p.lat, p.lon]), {
              color: layer.color,
              fillColor: layer.fill_color,
              fillOpacity: layer.fill_opacity,
              weight: 2
            }).addTo(map);
            if (layer.popup) shape.bindPopup(escape(layer.popup));
            break;
          }
          case 'label': {
            L.marker([layer.position.lat, layer.position.lon], {
              interactive: false,
              icon: L.divIcon({
                className: 'area-label',
                html: '<div style="color: ' + escape(layer.color) + ';">' + escape(layer.text) + '</div>'
              })
            }).addTo(map);
            break;
          }
          case 'marker_cluster': {
            const group = L.markerClusterGroup();
            for (const m of layer.markers) {
              const marker = L.marker([m.position.lat, m.position.lon]);
              marker.bindPopup(m.popup_html, {maxWidth: m.popup_max_width});
              if (m.tooltip) marker.bindTooltip(escape(m.tooltip));
              group.addLayer(marker);
            }
            map.addLayer(group);
            break;
          }
        }
      }
    })();
  </script>
</body>
</html>
"#;

/// Serializes the artifact for embedding inside a `<script>` element.
/// `</` is escaped so popup HTML cannot close the element early.
fn scene_json(artifact: &MapArtifact) -> Result<String, ComposeError> {
    Ok(serde_json::to_string(artifact)?.replace("</", "<\\/"))
}

/// Renders the artifact to a standalone HTML document.
///
/// # Errors
///
/// Returns [`ComposeError::Json`] if the artifact cannot be serialized.
pub fn render_html(artifact: &MapArtifact, title: &str) -> Result<String, ComposeError> {
    let scene = scene_json(artifact)?;
    let title = html_escape::encode_text(title);

    Ok([HEAD, &*title, MIDDLE, &scene, TAIL].concat())
}

/// Renders the artifact and writes it to `path`.
///
/// # Errors
///
/// Returns [`ComposeError`] if rendering or writing fails.
pub fn write_html(artifact: &MapArtifact, title: &str, path: &Path) -> Result<(), ComposeError> {
    let html = render_html(artifact, title)?;
    std::fs::write(path, &html)?;
    log::debug!("Wrote {} bytes of HTML to {}", html.len(), path.display());
    Ok(())
}
