//! WKT classification and parsing for the loader.
//!
//! The shape kind is decided by the leading token of the literal, then the
//! body is parsed with the `wkt` crate. `BOX` is the one exception: it is
//! not part of the WKT grammar, so rectangles get a small dedicated reader.

use crate::error::{GeoRelateError, Result};
use crate::shape::{ShapeGeometry, ShapeKind};
use geo::Validation;
use geo_types::{Coord, Geometry, Rect};
use std::str::FromStr;

/// Classify a WKT literal by its leading token (the text before `(`).
///
/// Unknown prefixes are an [`InvalidDataType`](GeoRelateError::InvalidDataType)
/// row error; callers skip the row.
pub fn classify_wkt(text: &str) -> Result<ShapeKind> {
    let head = text
        .split('(')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_uppercase();
    match head.as_str() {
        "POINT" => Ok(ShapeKind::Point),
        "LINESTRING" => Ok(ShapeKind::LineString),
        "BOX" => Ok(ShapeKind::Rectangle),
        "POLYGON" => Ok(ShapeKind::Polygon),
        "MULTIPOLYGON" => Ok(ShapeKind::MultiPolygon),
        other => Err(GeoRelateError::InvalidDataType(other.to_string())),
    }
}

/// Parse a WKT literal into a shape payload, verifying that the body
/// matches the classified kind and that the geometry is valid.
pub fn parse_geometry(text: &str) -> Result<ShapeGeometry> {
    let kind = classify_wkt(text)?;
    let geometry = match kind {
        ShapeKind::Rectangle => ShapeGeometry::Rectangle(parse_box(text)?),
        _ => {
            let parsed = parse_wkt(text)?;
            match (kind, parsed) {
                (ShapeKind::Point, Geometry::Point(p)) => ShapeGeometry::Point(p),
                (ShapeKind::LineString, Geometry::LineString(ls)) => ShapeGeometry::LineString(ls),
                (ShapeKind::Polygon, Geometry::Polygon(p)) => ShapeGeometry::Polygon(p),
                (ShapeKind::MultiPolygon, Geometry::MultiPolygon(mp)) => {
                    ShapeGeometry::MultiPolygon(mp)
                }
                (kind, _) => {
                    return Err(GeoRelateError::InvalidGeometry(format!(
                        "WKT body does not match its {} prefix",
                        kind.as_str()
                    )))
                }
            }
        }
    };
    validate(&geometry)?;
    Ok(geometry)
}

/// Parse through the `wkt` crate into a `geo_types` geometry.
fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    wkt::Wkt::from_str(text)
        .map_err(|e| GeoRelateError::InvalidGeometry(format!("WKT parse error: {e}")))
        .and_then(|w| {
            w.try_into().map_err(|e: wkt::conversion::Error| {
                GeoRelateError::InvalidGeometry(format!("WKT conversion error: {e:?}"))
            })
        })
}

/// Parse the `BOX(x1 y1, x2 y2)` corner-pair literal.
fn parse_box(text: &str) -> Result<Rect> {
    let invalid = |reason: &str| GeoRelateError::InvalidGeometry(format!("BOX literal: {reason}"));
    let open = text.find('(').ok_or_else(|| invalid("missing '('"))?;
    let close = text.rfind(')').ok_or_else(|| invalid("missing ')'"))?;
    if close <= open {
        return Err(invalid("unbalanced parentheses"));
    }

    let corners: Vec<Coord> = text[open + 1..close]
        .split(',')
        .map(|corner| {
            let mut values = corner.split_whitespace().map(f64::from_str);
            match (values.next(), values.next(), values.next()) {
                (Some(Ok(x)), Some(Ok(y)), None) => Ok(Coord { x, y }),
                _ => Err(invalid("corners must be pairs of numbers")),
            }
        })
        .collect::<Result<_>>()?;

    match corners.as_slice() {
        [min, max] => Ok(Rect::new(*min, *max)),
        _ => Err(invalid("expected exactly two corners")),
    }
}

/// Reject empty and structurally invalid geometries. Rows carrying them are
/// dropped, matching the loader's recoverable-error policy.
fn validate(geometry: &ShapeGeometry) -> Result<()> {
    let finite = |c: &Coord| c.x.is_finite() && c.y.is_finite();
    let valid = match geometry {
        ShapeGeometry::Point(p) => finite(&p.0),
        ShapeGeometry::LineString(ls) => ls.0.len() >= 2 && ls.is_valid(),
        ShapeGeometry::Rectangle(r) => finite(&r.min()) && finite(&r.max()),
        ShapeGeometry::Polygon(p) => !p.exterior().0.is_empty() && p.is_valid(),
        ShapeGeometry::MultiPolygon(mp) => !mp.0.is_empty() && mp.is_valid(),
    };
    if valid {
        Ok(())
    } else {
        Err(GeoRelateError::InvalidGeometry(format!(
            "empty or invalid {} geometry",
            geometry.kind().as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(classify_wkt("POINT(1 2)").unwrap(), ShapeKind::Point);
        assert_eq!(
            classify_wkt("LINESTRING(0 0, 1 1)").unwrap(),
            ShapeKind::LineString
        );
        assert_eq!(classify_wkt("BOX(0 0, 1 1)").unwrap(), ShapeKind::Rectangle);
        assert_eq!(
            classify_wkt("POLYGON((0 0,1 0,1 1,0 0))").unwrap(),
            ShapeKind::Polygon
        );
        assert_eq!(
            classify_wkt("MULTIPOLYGON(((0 0,1 0,1 1,0 0)))").unwrap(),
            ShapeKind::MultiPolygon
        );
    }

    #[test]
    fn test_classify_rejects_unknown() {
        assert!(matches!(
            classify_wkt("MULTIPOINT(1 2, 3 4)"),
            Err(GeoRelateError::InvalidDataType(_))
        ));
        assert!(matches!(
            classify_wkt("CIRCLE(0 0, 5)"),
            Err(GeoRelateError::InvalidDataType(_))
        ));
        assert!(classify_wkt("").is_err());
    }

    #[test]
    fn test_parse_point() {
        let geom = parse_geometry("POINT(5 -3.5)").unwrap();
        match geom {
            ShapeGeometry::Point(p) => {
                assert_eq!(p.x(), 5.0);
                assert_eq!(p.y(), -3.5);
            }
            other => panic!("expected point, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_parse_polygon() {
        let geom = parse_geometry("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
        assert_eq!(geom.kind(), ShapeKind::Polygon);
        assert!((geom.area_deg() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_multipolygon() {
        let geom =
            parse_geometry("MULTIPOLYGON(((0 0,2 0,2 2,0 2,0 0)),((5 5,6 5,6 6,5 6,5 5)))")
                .unwrap();
        assert_eq!(geom.kind(), ShapeKind::MultiPolygon);
        assert!((geom.area_deg() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_box() {
        let geom = parse_geometry("BOX(1 2, 5 8)").unwrap();
        match geom {
            ShapeGeometry::Rectangle(r) => {
                assert_eq!(r.min(), Coord { x: 1.0, y: 2.0 });
                assert_eq!(r.max(), Coord { x: 5.0, y: 8.0 });
            }
            other => panic!("expected rectangle, got {:?}", other.kind()),
        }
        // Corner order normalizes.
        let swapped = parse_geometry("BOX(5 8, 1 2)").unwrap();
        assert_eq!(geom, swapped);
    }

    #[test]
    fn test_parse_box_malformed() {
        assert!(parse_geometry("BOX(1 2)").is_err());
        assert!(parse_geometry("BOX(1 2, 3)").is_err());
        assert!(parse_geometry("BOX(1 2, 3 4, 5 6)").is_err());
        assert!(parse_geometry("BOX 1 2 3 4").is_err());
    }

    #[test]
    fn test_invalid_rows_are_recoverable() {
        for text in [
            "POINT()",
            "LINESTRING(1 1)",
            "POLYGON(())",
            "POLYGON EMPTY",
            "garbage",
        ] {
            let err = parse_geometry(text).unwrap_err();
            assert!(err.is_recoverable(), "{text} should be a row error");
        }
    }
}
