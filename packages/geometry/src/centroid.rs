//! Shoelace area and area-weighted centroid of a polygon ring.
//!
//! For every edge `(x1, y1) -> (x2, y2)`:
//!
//! ```text
//! cross = x1 * y2 - x2 * y1
//! area  = Σ cross / 2
//! cx    = Σ (x1 + x2) * cross / (6 * area)
//! cy    = Σ (y1 + y2) * cross / (6 * area)
//! ```
//!
//! `area` is signed: positive for counter-clockwise rings, negative for
//! clockwise ones. The sign cancels between numerator and denominator, so
//! the centroid is the same for either winding and in every hemisphere.
//!
//! Vertices are shifted so the first vertex is the origin before
//! accumulating. Lat/lon magnitudes (e.g. 42, -87) would otherwise swamp
//! the cross products of small neighborhood-sized polygons.

use geo::{BoundingRect, Coord, LineString};

use crate::GeometryError;

/// Rings whose enclosed area is at most this fraction of their bounding
/// box are treated as degenerate.
const DEGENERATE_AREA_RATIO: f64 = 1e-12;

struct Moments {
    twice_area: f64,
    sum_x: f64,
    sum_y: f64,
}

fn moments(ring: &LineString<f64>, origin: Coord<f64>) -> Moments {
    let mut m = Moments {
        twice_area: 0.0,
        sum_x: 0.0,
        sum_y: 0.0,
    };

    for line in ring.lines() {
        let a = line.start - origin;
        let b = line.end - origin;
        let cross = a.x.mul_add(b.y, -(b.x * a.y));
        m.twice_area += cross;
        m.sum_x = (a.x + b.x).mul_add(cross, m.sum_x);
        m.sum_y = (a.y + b.y).mul_add(cross, m.sum_y);
    }

    m
}

fn closed(ring: &LineString<f64>) -> LineString<f64> {
    let mut ring = ring.clone();
    ring.close();
    ring
}

/// Signed shoelace area of `ring` in square degrees.
///
/// Positive for counter-clockwise rings (longitude as `x`, latitude as
/// `y`), negative for clockwise ones. Open rings are treated as closed.
#[must_use]
pub fn signed_area(ring: &LineString<f64>) -> f64 {
    let ring = closed(ring);
    ring.0
        .first()
        .map_or(0.0, |&origin| moments(&ring, origin).twice_area / 2.0)
}

/// Area-weighted centroid of `ring`.
///
/// Open rings are treated as closed. The result does not depend on the
/// winding direction.
///
/// # Errors
///
/// * [`GeometryError::TooFewVertices`] if the ring has fewer than three
///   distinct vertices.
/// * [`GeometryError::DegeneratePolygon`] if the ring encloses no area,
///   e.g. when every vertex is collinear.
pub fn ring_centroid(ring: &LineString<f64>) -> Result<Coord<f64>, GeometryError> {
    let ring = closed(ring);

    let count = ring.0.len().saturating_sub(1);
    let Some(&origin) = ring.0.first().filter(|_| count >= 3) else {
        return Err(GeometryError::TooFewVertices {
            polygon: None,
            count,
        });
    };

    let m = moments(&ring, origin);
    let area = m.twice_area / 2.0;

    let extent = ring.bounding_rect().map_or(0.0, |r| r.width() * r.height());
    if !area.is_finite() || area.abs() <= extent * DEGENERATE_AREA_RATIO {
        return Err(GeometryError::DegeneratePolygon { polygon: None });
    }

    let x = origin.x + m.sum_x / (6.0 * area);
    let y = origin.y + m.sum_y / (6.0 * area);

    if x.is_finite() && y.is_finite() {
        Ok(Coord { x, y })
    } else {
        Err(GeometryError::DegeneratePolygon { polygon: None })
    }
}
