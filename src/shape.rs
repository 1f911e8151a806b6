//! Shape model: the five supported geometry kinds behind one sum type,
//! with the envelope, centroid, area and DE-9IM operations the join
//! pipeline dispatches on.

use crate::error::{GeoRelateError, Result};
use geo::coordinate_position::CoordPos;
use geo::dimensions::Dimensions;
use geo::relate::IntersectionMatrix;
use geo::{Area, BooleanOps, BoundingRect, Centroid, Relate};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon, Rect};

/// A minimum bounding rectangle.
///
/// The constructor normalizes corner order, so `min.x <= max.x` and
/// `min.y <= max.y` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mbr {
    pub min: Coord,
    pub max: Coord,
}

impl Mbr {
    /// Create an MBR from two corners, swapping coordinates as needed.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            min: Coord {
                x: x_min.min(x_max),
                y: y_min.min(y_max),
            },
            max: Coord {
                x: x_min.max(x_max),
                y: y_min.max(y_max),
            },
        }
    }

    /// Create an MBR from a `geo::Rect` (already corner-normalized).
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            min: rect.min(),
            max: rect.max(),
        }
    }

    /// Width of the MBR along the x axis.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the MBR along the y axis.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Geometric center of the MBR.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Check whether two MBRs overlap (borders included).
    pub fn intersects(&self, other: &Mbr) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Check whether a point falls within the MBR (borders included).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }
}

/// Discriminator for the five supported shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    LineString,
    Rectangle,
    Polygon,
    MultiPolygon,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Point => "POINT",
            ShapeKind::LineString => "LINESTRING",
            ShapeKind::Rectangle => "RECTANGLE",
            ShapeKind::Polygon => "POLYGON",
            ShapeKind::MultiPolygon => "MULTIPOLYGON",
        }
    }
}

/// Kind-specific geometry payload.
///
/// Rectangles keep their corner-pair form; predicates that need an areal
/// geometry convert to the equivalent polygon at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Point(Point),
    LineString(LineString),
    Rectangle(Rect),
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
}

impl ShapeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Point(_) => ShapeKind::Point,
            ShapeGeometry::LineString(_) => ShapeKind::LineString,
            ShapeGeometry::Rectangle(_) => ShapeKind::Rectangle,
            ShapeGeometry::Polygon(_) => ShapeKind::Polygon,
            ShapeGeometry::MultiPolygon(_) => ShapeKind::MultiPolygon,
        }
    }

    /// The axis-aligned envelope of the payload. `None` for payloads with
    /// no extent (an empty linestring or multipolygon).
    pub fn envelope(&self) -> Option<Mbr> {
        let rect = match self {
            ShapeGeometry::Point(p) => Some(p.bounding_rect()),
            ShapeGeometry::LineString(ls) => ls.bounding_rect(),
            ShapeGeometry::Rectangle(r) => Some(*r),
            ShapeGeometry::Polygon(p) => p.bounding_rect(),
            ShapeGeometry::MultiPolygon(mp) => mp.bounding_rect(),
        }?;
        Some(Mbr::from_rect(rect))
    }

    /// Geometry centroid. `None` when the payload is empty.
    pub fn centroid(&self) -> Option<Point> {
        match self {
            ShapeGeometry::Point(p) => Some(*p),
            ShapeGeometry::LineString(ls) => ls.centroid(),
            ShapeGeometry::Rectangle(r) => Some(r.centroid()),
            ShapeGeometry::Polygon(p) => p.centroid(),
            ShapeGeometry::MultiPolygon(mp) => mp.centroid(),
        }
    }

    /// Area in squared degrees. Points and linestrings are 0 by convention.
    pub fn area_deg(&self) -> f64 {
        match self {
            ShapeGeometry::Point(_) | ShapeGeometry::LineString(_) => 0.0,
            ShapeGeometry::Rectangle(r) => r.unsigned_area(),
            ShapeGeometry::Polygon(p) => p.unsigned_area(),
            ShapeGeometry::MultiPolygon(mp) => mp.unsigned_area(),
        }
    }

    /// Area of the geometric intersection in squared degrees, summed across
    /// the resulting pieces. Pairs involving a point or linestring are 0 by
    /// convention.
    pub fn intersection_area_deg(&self, other: &ShapeGeometry) -> f64 {
        let (Some(a), Some(b)) = (self.to_multi_polygon(), other.to_multi_polygon()) else {
            return 0.0;
        };
        a.intersection(&b).unsigned_area()
    }

    /// The DE-9IM matrix of (self, other) as a nine-character code over
    /// `{F, 0, 1, 2}`, in interior/boundary/exterior row-major order.
    pub fn de9im_code(&self, other: &ShapeGeometry) -> String {
        let matrix = self.relate_matrix(other);
        const POSITIONS: [CoordPos; 3] =
            [CoordPos::Inside, CoordPos::OnBoundary, CoordPos::Outside];
        let mut code = String::with_capacity(9);
        for lhs in POSITIONS {
            for rhs in POSITIONS {
                code.push(dimension_char(matrix.get(lhs, rhs)));
            }
        }
        code
    }

    fn relate_matrix(&self, other: &ShapeGeometry) -> IntersectionMatrix {
        match self {
            ShapeGeometry::Point(g) => relate_with(g, other),
            ShapeGeometry::LineString(g) => relate_with(g, other),
            ShapeGeometry::Rectangle(g) => relate_with(&g.to_polygon(), other),
            ShapeGeometry::Polygon(g) => relate_with(g, other),
            ShapeGeometry::MultiPolygon(g) => relate_with(g, other),
        }
    }

    fn to_multi_polygon(&self) -> Option<MultiPolygon> {
        match self {
            ShapeGeometry::Rectangle(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
            ShapeGeometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
            ShapeGeometry::MultiPolygon(mp) => Some(mp.clone()),
            ShapeGeometry::Point(_) | ShapeGeometry::LineString(_) => None,
        }
    }

    /// Number of vertices, counting the rectangle as its corner pair.
    /// `None` for multipolygons, which have no single vertex list.
    pub fn vertex_count(&self) -> Option<usize> {
        match self {
            ShapeGeometry::Point(_) => Some(1),
            ShapeGeometry::LineString(ls) => Some(ls.0.len()),
            ShapeGeometry::Rectangle(_) => Some(2),
            ShapeGeometry::Polygon(p) => Some(p.exterior().0.len()),
            ShapeGeometry::MultiPolygon(_) => None,
        }
    }

    /// The vertex list: the point itself, the linestring coordinates, the
    /// rectangle corner pair, or the polygon outer ring. `None` for
    /// multipolygons.
    pub fn vertices(&self) -> Option<Vec<Coord>> {
        match self {
            ShapeGeometry::Point(p) => Some(vec![p.0]),
            ShapeGeometry::LineString(ls) => Some(ls.0.clone()),
            ShapeGeometry::Rectangle(r) => Some(vec![r.min(), r.max()]),
            ShapeGeometry::Polygon(p) => Some(p.exterior().0.clone()),
            ShapeGeometry::MultiPolygon(_) => None,
        }
    }

    /// Replace the vertex at `index` with `(x, y)`.
    pub fn modify_vertex(&mut self, index: usize, x: f64, y: f64) -> Result<()> {
        match self {
            ShapeGeometry::Point(p) => {
                if index != 0 {
                    return Err(GeoRelateError::OutOfBounds { index, len: 1 });
                }
                *p = Point::new(x, y);
                Ok(())
            }
            ShapeGeometry::LineString(ls) => {
                let len = ls.0.len();
                match ls.0.get_mut(index) {
                    Some(coord) => {
                        *coord = Coord { x, y };
                        Ok(())
                    }
                    None => Err(GeoRelateError::OutOfBounds { index, len }),
                }
            }
            ShapeGeometry::Rectangle(r) => {
                match index {
                    0 => *r = Rect::new(Coord { x, y }, r.max()),
                    1 => *r = Rect::new(r.min(), Coord { x, y }),
                    _ => return Err(GeoRelateError::OutOfBounds { index, len: 2 }),
                }
                Ok(())
            }
            ShapeGeometry::Polygon(p) => {
                let len = p.exterior().0.len();
                if index >= len {
                    return Err(GeoRelateError::OutOfBounds { index, len });
                }
                p.exterior_mut(|ring| ring.0[index] = Coord { x, y });
                Ok(())
            }
            ShapeGeometry::MultiPolygon(_) => Err(GeoRelateError::InvalidOperation(
                "vertex editing on multipolygon",
            )),
        }
    }
}

fn relate_with<G: Relate<f64>>(lhs: &G, rhs: &ShapeGeometry) -> IntersectionMatrix {
    match rhs {
        ShapeGeometry::Point(g) => lhs.relate(g),
        ShapeGeometry::LineString(g) => lhs.relate(g),
        ShapeGeometry::Rectangle(g) => lhs.relate(&g.to_polygon()),
        ShapeGeometry::Polygon(g) => lhs.relate(g),
        ShapeGeometry::MultiPolygon(g) => lhs.relate(g),
    }
}

fn dimension_char(dim: Dimensions) -> char {
    match dim {
        Dimensions::Empty => 'F',
        Dimensions::ZeroDimensional => '0',
        Dimensions::OneDimensional => '1',
        Dimensions::TwoDimensional => '2',
    }
}

/// Converts an area in squared degrees into square kilometers with a
/// latitude-scaled planar factor, rounded to two decimals.
pub fn degrees_to_square_kilometers(area_deg: f64, lat: f64) -> f64 {
    let area_sq_km = area_deg * 111.32 * 111.32 * lat.to_radians().cos().abs();
    (area_sq_km * 100.0).round() / 100.0
}

/// A spatial entity: one record of a dataset.
///
/// Shapes are created by the loader and never mutated afterwards; the grid
/// index refers to them by `rec_id`.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Record id, unique within the owning dataset (line number at load).
    pub rec_id: u64,
    /// Display name composed by the loader.
    pub name: String,
    /// Precomputed envelope of the payload.
    pub mbr: Mbr,
    /// Grid partitions the envelope overlaps, in row-major scan order.
    pub partitions: Vec<i32>,
    /// The geometry payload.
    pub geometry: ShapeGeometry,
}

impl Shape {
    /// Build a shape from its payload, computing the envelope. Fails on
    /// payloads with no extent.
    pub fn new(rec_id: u64, name: String, geometry: ShapeGeometry) -> Result<Self> {
        let mbr = geometry.envelope().ok_or_else(|| {
            GeoRelateError::InvalidGeometry(format!("record {rec_id} has an empty envelope"))
        })?;
        Ok(Self {
            rec_id,
            name,
            mbr,
            partitions: Vec::new(),
            geometry,
        })
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// Geometry centroid, falling back to the MBR center for degenerate
    /// payloads.
    pub fn centroid(&self) -> Point {
        self.geometry.centroid().unwrap_or_else(|| self.mbr.center())
    }

    /// Shape area in square kilometers.
    pub fn area_km2(&self) -> f64 {
        degrees_to_square_kilometers(self.geometry.area_deg(), self.centroid().y())
    }

    /// Area of the geometric intersection with `other`, in square
    /// kilometers, scaled at this shape's centroid latitude.
    pub fn intersection_area_km2(&self, other: &Shape) -> f64 {
        degrees_to_square_kilometers(
            self.geometry.intersection_area_deg(&other.geometry),
            self.centroid().y(),
        )
    }

    /// DE-9IM code of (self, other); see [`ShapeGeometry::de9im_code`].
    pub fn de9im_code(&self, other: &Shape) -> String {
        self.geometry.de9im_code(&other.geometry)
    }
}
