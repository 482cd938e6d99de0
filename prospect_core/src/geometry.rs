//! Point-in-polygon containment for zone and territory geometries.
//!
//! Rings arrive from upstream drawing tools with no guaranteed orientation or
//! closure, so containment uses an orientation-agnostic even-odd ray cast.
//! Every ring carries an eagerly computed bounding box so callers can test
//! one point per (target × zone) pair without paying the exact test for
//! points that are nowhere near the boundary.

use prospect_schema::GeometryRecord;
use thiserror::Error;

/// A single geographic point. Coordinates are raw WGS84 degrees; the core
/// never projects them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Squared planar distance in degree space. Not geodesic: at city scale
    /// the ordering of candidate insertions is what matters, not metres.
    pub fn dist2(self, other: Point) -> f64 {
        let dx = self.lng - other.lng;
        let dy = self.lat - other.lat;
        dx * dx + dy * dy
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    #[error("geometry contains an empty ring")]
    EmptyRing,
    #[error("ring has only {points} distinct vertices, need at least 3")]
    DegenerateRing { points: usize },
    #[error("non-finite coordinate ({lat}, {lng})")]
    NonFiniteCoordinate { lat: f64, lng: f64 },
}

/// Axis-aligned bounding box used as the containment pre-filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_lat: first.lat,
            min_lng: first.lng,
            max_lat: first.lat,
            max_lng: first.lng,
        };
        for p in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.min_lng = bbox.min_lng.min(p.lng);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.max_lng = bbox.max_lng.max(p.lng);
        }
        Some(bbox)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.lat >= self.min_lat
            && p.lat <= self.max_lat
            && p.lng >= self.min_lng
            && p.lng <= self.max_lng
    }
}

/// One ring of a polygon. Closure is implicit; an explicitly repeated first
/// vertex is tolerated and does not count as a distinct vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Point>,
    bbox: Option<BoundingBox>,
    flaw: Option<GeometryError>,
}

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        let flaw = Self::inspect(&points);
        let bbox = BoundingBox::of(&points);
        Self { points, bbox, flaw }
    }

    fn inspect(points: &[Point]) -> Option<GeometryError> {
        if points.is_empty() {
            return Some(GeometryError::EmptyRing);
        }
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Some(GeometryError::NonFiniteCoordinate {
                lat: p.lat,
                lng: p.lng,
            });
        }
        let mut distinct = points.len();
        if points.len() > 1 && points.first() == points.last() {
            distinct -= 1;
        }
        if distinct < 3 {
            return Some(GeometryError::DegenerateRing { points: distinct });
        }
        None
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match &self.flaw {
            Some(flaw) => Err(flaw.clone()),
            None => Ok(()),
        }
    }

    /// Even-odd ray cast. Orientation-agnostic: crossing parity is the same
    /// whichever way the ring winds.
    fn crossed(&self, p: Point) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let intersect_lng = (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
                if p.lng < intersect_lng {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn contains(&self, p: Point) -> Result<bool, GeometryError> {
        self.validate()?;
        match self.bbox {
            Some(bbox) if bbox.contains(p) => Ok(self.crossed(p)),
            _ => Ok(false),
        }
    }
}

/// A polygon with optional holes. A point is inside when it crosses the
/// exterior and an even number of hole rings.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.exterior.validate()?;
        for hole in &self.holes {
            hole.validate()?;
        }
        Ok(())
    }

    pub fn contains(&self, p: Point) -> Result<bool, GeometryError> {
        if !self.exterior.contains(p)? {
            // Holes still have to be well-formed even when the exterior
            // already rules the point out.
            for hole in &self.holes {
                hole.validate()?;
            }
            return Ok(false);
        }
        let mut hole_hits = 0usize;
        for hole in &self.holes {
            if hole.contains(p)? {
                hole_hits += 1;
            }
        }
        Ok(hole_hits % 2 == 0)
    }
}

/// Polygon or multipolygon, with union semantics for the latter.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// Build from a boundary record without validating; flaws surface on the
    /// first containment query.
    pub fn from_record(record: &GeometryRecord) -> Self {
        match record {
            GeometryRecord::Polygon { coordinates } => {
                Geometry::Polygon(polygon_from_rings(coordinates))
            }
            GeometryRecord::MultiPolygon { coordinates } => {
                Geometry::MultiPolygon(coordinates.iter().map(|p| polygon_from_rings(p)).collect())
            }
        }
    }

    /// Build from a boundary record, rejecting malformed rings up front.
    pub fn try_from_record(record: &GeometryRecord) -> Result<Self, GeometryError> {
        let geometry = Self::from_record(record);
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Geometry::Polygon(polygon) => polygon.validate(),
            Geometry::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    return Err(GeometryError::EmptyRing);
                }
                polygons.iter().try_for_each(Polygon::validate)
            }
        }
    }

    /// Containment predicate. Malformed input is an error, never a silent
    /// "outside"; callers rely on the distinction.
    pub fn contains(&self, p: Point) -> Result<bool, GeometryError> {
        match self {
            Geometry::Polygon(polygon) => polygon.contains(p),
            Geometry::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    return Err(GeometryError::EmptyRing);
                }
                let mut inside = false;
                for polygon in polygons {
                    // Keep validating the rest so a flaw is never masked by
                    // an earlier hit.
                    if polygon.contains(p)? {
                        inside = true;
                    }
                }
                Ok(inside)
            }
        }
    }
}

fn polygon_from_rings(rings: &[Vec<[f64; 2]>]) -> Polygon {
    let mut converted = rings.iter().map(|ring| {
        // GeoJSON axis order is [lng, lat].
        Ring::new(ring.iter().map(|c| Point::new(c[1], c[0])).collect())
    });
    let exterior = converted.next().unwrap_or_else(|| Ring::new(Vec::new()));
    Polygon::new(exterior, converted.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<[f64; 2]> {
        vec![[min, min], [max, min], [max, max], [min, max], [min, min]]
    }

    fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Geometry {
        Geometry::try_from_record(&GeometryRecord::Polygon { coordinates: rings }).unwrap()
    }

    #[test]
    fn point_inside_square() {
        let geometry = polygon(vec![square(0.0, 10.0)]);
        assert!(geometry.contains(Point::new(5.0, 5.0)).unwrap());
        assert!(!geometry.contains(Point::new(15.0, 5.0)).unwrap());
    }

    #[test]
    fn bbox_prefilter_rejects_distant_points() {
        let geometry = polygon(vec![square(0.0, 1.0)]);
        assert!(!geometry.contains(Point::new(50.0, 50.0)).unwrap());
    }

    #[test]
    fn hole_excludes_interior_point() {
        let geometry = polygon(vec![square(0.0, 10.0), square(4.0, 6.0)]);
        assert!(!geometry.contains(Point::new(5.0, 5.0)).unwrap());
        assert!(geometry.contains(Point::new(2.0, 2.0)).unwrap());
    }

    #[test]
    fn winding_direction_does_not_matter() {
        let mut reversed = square(0.0, 10.0);
        reversed.reverse();
        let geometry = polygon(vec![reversed]);
        assert!(geometry.contains(Point::new(5.0, 5.0)).unwrap());
    }

    #[test]
    fn multipolygon_union_semantics() {
        let geometry = Geometry::try_from_record(&GeometryRecord::MultiPolygon {
            coordinates: vec![vec![square(0.0, 1.0)], vec![square(5.0, 6.0)]],
        })
        .unwrap();
        assert!(geometry.contains(Point::new(0.5, 0.5)).unwrap());
        assert!(geometry.contains(Point::new(5.5, 5.5)).unwrap());
        assert!(!geometry.contains(Point::new(3.0, 3.0)).unwrap());
    }

    #[test]
    fn empty_ring_is_an_error_not_outside() {
        let geometry = Geometry::from_record(&GeometryRecord::Polygon {
            coordinates: vec![Vec::new()],
        });
        assert_eq!(
            geometry.contains(Point::new(0.0, 0.0)),
            Err(GeometryError::EmptyRing)
        );
    }

    #[test]
    fn two_point_ring_is_degenerate() {
        let geometry = Geometry::from_record(&GeometryRecord::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 1.0]]],
        });
        assert!(matches!(
            geometry.contains(Point::new(0.5, 0.5)),
            Err(GeometryError::DegenerateRing { points: 2 })
        ));
    }

    #[test]
    fn closed_triangle_counts_distinct_vertices() {
        // Explicitly closed ring: 4 points, 3 distinct.
        let geometry = polygon(vec![vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [0.0, 0.0]]]);
        assert!(geometry.contains(Point::new(1.0, 1.0)).unwrap());
    }

    #[test]
    fn malformed_hole_is_reported_even_for_outside_points() {
        let geometry = Geometry::from_record(&GeometryRecord::Polygon {
            coordinates: vec![square(0.0, 10.0), vec![[1.0, 1.0]]],
        });
        assert!(geometry.contains(Point::new(50.0, 50.0)).is_err());
    }

    #[test]
    fn dist2_is_squared_planar() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.dist2(b), 25.0);
        assert_eq!(b.dist2(a), 25.0);
    }
}
