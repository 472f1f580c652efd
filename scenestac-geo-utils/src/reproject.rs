use std::fmt::{Debug, Formatter};

use geojson::{Geometry, Value};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::ReprojectionError::{InvalidCrs, TransformFailed};
use crate::{Bbox, Crs, ReprojectionResult};

/// Number of samples per bbox edge when reprojecting a bounding box.
const BBOX_EDGE_STEPS: usize = 8;

/// Forward coordinate transform between two CRSs.
///
/// Both projections are built once in [`Reprojector::new`] and reused for every
/// geometry, so all records of a run go through the same transform.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    transform: Option<Transform>,
}

struct Transform {
    src: Proj,
    dst: Proj,
    src_geographic: bool,
    dst_geographic: bool,
}

impl Debug for Reprojector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("identity", &self.is_identity())
            .finish()
    }
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> ReprojectionResult<Self> {
        let transform = if from == to {
            None
        } else {
            Some(Transform {
                src: build_proj(from)?,
                dst: build_proj(to)?,
                src_geographic: from.is_geographic()?,
                dst_geographic: to.is_geographic()?,
            })
        };
        Ok(Self {
            from: from.clone(),
            to: to.clone(),
            transform,
        })
    }

    /// Reprojector into the canonical WGS84 geographic CRS.
    pub fn to_wgs84(from: &Crs) -> ReprojectionResult<Self> {
        Self::new(from, &Crs::WGS84)
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
    }

    #[must_use]
    pub fn source_crs(&self) -> &Crs {
        &self.from
    }

    #[must_use]
    pub fn target_crs(&self) -> &Crs {
        &self.to
    }

    pub fn transform_point(&self, x: f64, y: f64) -> ReprojectionResult<(f64, f64)> {
        let Some(t) = &self.transform else {
            return Ok((x, y));
        };
        // proj4rs works in radians for geographic systems
        let mut point = if t.src_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(&t.src, &t.dst, &mut point).map_err(|e| self.failed(x, y, format!("{e:?}")))?;
        let (out_x, out_y) = if t.dst_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if out_x.is_finite() && out_y.is_finite() {
            Ok((out_x, out_y))
        } else {
            Err(self.failed(x, y, "result is not finite".to_string()))
        }
    }

    /// Transforms every vertex of a geometry, keeping any Z/M ordinates untouched.
    pub fn reproject(&self, value: &Value) -> ReprojectionResult<Value> {
        if self.is_identity() {
            return Ok(value.clone());
        }
        Ok(match value {
            Value::Point(p) => Value::Point(self.position(p)?),
            Value::MultiPoint(ps) => Value::MultiPoint(self.positions(ps)?),
            Value::LineString(ps) => Value::LineString(self.positions(ps)?),
            Value::MultiLineString(lines) => Value::MultiLineString(self.lines(lines)?),
            Value::Polygon(rings) => Value::Polygon(self.lines(rings)?),
            Value::MultiPolygon(polygons) => Value::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| self.lines(rings))
                    .collect::<ReprojectionResult<_>>()?,
            ),
            Value::GeometryCollection(geometries) => Value::GeometryCollection(
                geometries
                    .iter()
                    .map(|g| self.reproject_geometry(g))
                    .collect::<ReprojectionResult<_>>()?,
            ),
        })
    }

    /// Like [`Self::reproject`], but for a full geometry object.
    /// Any stored `bbox` member is dropped because it would be stale.
    pub fn reproject_geometry(&self, geometry: &Geometry) -> ReprojectionResult<Geometry> {
        Ok(Geometry {
            bbox: None,
            value: self.reproject(&geometry.value)?,
            foreign_members: geometry.foreign_members.clone(),
        })
    }

    /// Reprojects a bounding box by sampling points along its edges,
    /// so that curved edges in the target CRS are still covered.
    pub fn reproject_bbox(&self, bbox: Bbox) -> ReprojectionResult<Bbox> {
        if self.is_identity() || bbox.is_sentinel() {
            return Ok(bbox);
        }
        let points = bbox
            .edge_points(BBOX_EDGE_STEPS)
            .into_iter()
            .map(|(x, y)| self.transform_point(x, y).map(|(x, y)| vec![x, y]))
            .collect::<ReprojectionResult<Vec<_>>>()?;
        Ok(Bbox::of_geometry(&Value::MultiPoint(points)))
    }

    fn position(&self, position: &[f64]) -> ReprojectionResult<Vec<f64>> {
        let (Some(&x), Some(&y)) = (position.first(), position.get(1)) else {
            return Ok(position.to_vec());
        };
        let (x, y) = self.transform_point(x, y)?;
        let mut out = Vec::with_capacity(position.len());
        out.push(x);
        out.push(y);
        out.extend_from_slice(&position[2..]);
        Ok(out)
    }

    fn positions(&self, positions: &[Vec<f64>]) -> ReprojectionResult<Vec<Vec<f64>>> {
        positions.iter().map(|p| self.position(p)).collect()
    }

    fn lines(&self, lines: &[Vec<Vec<f64>>]) -> ReprojectionResult<Vec<Vec<Vec<f64>>>> {
        lines.iter().map(|line| self.positions(line)).collect()
    }

    fn failed(&self, x: f64, y: f64, reason: String) -> crate::ReprojectionError {
        TransformFailed {
            x,
            y,
            from: self.from.to_string(),
            to: self.to.to_string(),
            reason,
        }
    }
}

fn build_proj(crs: &Crs) -> ReprojectionResult<Proj> {
    let def = crs.proj_definition()?;
    Proj::from_proj_string(&def).map_err(|e| InvalidCrs(crs.to_string(), format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn identity_is_a_no_op() {
        let r = Reprojector::to_wgs84(&Crs::WGS84).unwrap();
        assert!(r.is_identity());
        let value = Value::Point(vec![-75.7, 45.4, 70.0]);
        assert_eq!(r.reproject(&value).unwrap(), value);
    }

    #[test]
    fn web_mercator_to_wgs84() {
        let r = Reprojector::to_wgs84(&Crs::Epsg(3857)).unwrap();
        let (lon, lat) = r.transform_point(0.0, 0.0).unwrap();
        assert_abs_diff_eq!(lon, 0.0, epsilon = EPS);
        assert_abs_diff_eq!(lat, 0.0, epsilon = EPS);

        let (lon, _) = r.transform_point(1_113_194.907_932_735_7, 0.0).unwrap();
        assert_abs_diff_eq!(lon, 10.0, epsilon = EPS);
    }

    #[test]
    fn utm_central_meridian() {
        // UTM zone 17N has its central meridian at 81 degrees west
        let r = Reprojector::to_wgs84(&Crs::Epsg(32617)).unwrap();
        let (lon, lat) = r.transform_point(500_000.0, 0.0).unwrap();
        assert_abs_diff_eq!(lon, -81.0, epsilon = EPS);
        assert_abs_diff_eq!(lat, 0.0, epsilon = EPS);
    }

    #[test]
    fn polygon_keeps_shape_and_extra_ordinates() {
        let r = Reprojector::to_wgs84(&Crs::Epsg(3857)).unwrap();
        let polygon = Value::Polygon(vec![vec![
            vec![0.0, 0.0, 5.0],
            vec![1_113_194.907_932_735_7, 0.0, 5.0],
            vec![0.0, 0.0, 5.0],
        ]]);
        let Value::Polygon(rings) = r.reproject(&polygon).unwrap() else {
            panic!("expected a polygon");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 3);
        assert_abs_diff_eq!(rings[0][1][0], 10.0, epsilon = EPS);
        assert_abs_diff_eq!(rings[0][1][2], 5.0);
    }

    #[test]
    fn bbox_reprojection() {
        let r = Reprojector::to_wgs84(&Crs::Epsg(3857)).unwrap();
        let b = r
            .reproject_bbox(Bbox::new(0.0, 0.0, 1_113_194.907_932_735_7, 1.0))
            .unwrap();
        assert_abs_diff_eq!(b.min_x, 0.0, epsilon = EPS);
        assert_abs_diff_eq!(b.max_x, 10.0, epsilon = EPS);
        assert_eq!(r.reproject_bbox(Bbox::ZERO).unwrap(), Bbox::ZERO);
    }

    #[test]
    fn unknown_epsg_code() {
        let err = Reprojector::to_wgs84(&Crs::Epsg(1)).unwrap_err();
        assert!(matches!(err, InvalidCrs(..)), "unexpected {err:?}");
    }
}
