//! Axis-aligned bounding boxes and the extent union used for collections.
//!
//! A [`Bbox`] equal to [`Bbox::ZERO`] is treated as the "no extent yet" sentinel.
//! [`Bbox::union`] never widens a sentinel: the first real box replaces it.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A 2D bounding box `[min_x, min_y, max_x, max_y]`.
///
/// Serialized as a four-element array, the same shape STAC and GeoJSON use.
///
/// # Examples
///
/// ```
/// # use scenestac_geo_utils::Bbox;
/// let a = Bbox::new(-80.0, 45.0, -79.0, 46.0);
/// let b = Bbox::new(-81.0, 44.5, -79.5, 45.5);
/// assert_eq!(a.union(b), Bbox::new(-81.0, 44.5, -79.0, 46.0));
/// assert_eq!(Bbox::ZERO.union(a), a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bbox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bbox {
    /// The degenerate `[0, 0, 0, 0]` box. Used as the initial collection extent.
    pub const ZERO: Self = Self {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// True if this is exactly the `[0, 0, 0, 0]` sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::ZERO
    }

    /// True if the box covers no area (a point, a line, or the sentinel).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Minimum bounding box of `self` and `other`.
    ///
    /// A sentinel on either side is not a real extent, so the other box is
    /// returned unchanged. Two sentinels stay a sentinel.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_sentinel() {
            return other;
        }
        if other.is_sentinel() {
            return self;
        }
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Checks if `other` lies fully inside `self` (edges included).
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Bounding box of every coordinate in a geometry.
    ///
    /// Empty geometries, or geometries without a single finite coordinate,
    /// return [`Bbox::ZERO`] instead of an error.
    #[must_use]
    pub fn of_geometry(geometry: &geojson::Value) -> Self {
        let mut acc = Accumulator::default();
        acc.add_value(geometry);
        acc.finish()
    }

    /// Bounding box of a sequence of geometries.
    #[must_use]
    pub fn of_geometries<'a>(geometries: impl IntoIterator<Item = &'a geojson::Value>) -> Self {
        let mut acc = Accumulator::default();
        for geometry in geometries {
            acc.add_value(geometry);
        }
        acc.finish()
    }

    /// Samples `steps` evenly spaced points along each edge, starting at its corner.
    #[must_use]
    pub fn edge_points(&self, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(1);
        #[allow(clippy::cast_precision_loss)]
        let n = steps as f64;
        let mut points = Vec::with_capacity(steps * 4);
        for i in 0..steps {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / n;
            let x = self.min_x + self.width() * t;
            let y = self.min_y + self.height() * t;
            points.push((x, self.min_y));
            points.push((self.max_x, y));
            points.push((self.max_x - self.width() * t, self.max_y));
            points.push((self.min_x, self.max_y - self.height() * t));
        }
        points
    }
}

impl Default for Bbox {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 4]> for Bbox {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl From<Bbox> for [f64; 4] {
    fn from(b: Bbox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

impl From<Bbox> for Vec<f64> {
    fn from(b: Bbox) -> Self {
        vec![b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

impl TryFrom<&[f64]> for Bbox {
    type Error = usize;

    /// Accepts 2D `[minx, miny, maxx, maxy]` and 3D `[minx, miny, minz, maxx, maxy, maxz]` boxes.
    /// On failure returns the number of values that were given.
    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        match *value {
            [min_x, min_y, max_x, max_y] | [min_x, min_y, _, max_x, max_y, _] => {
                Ok(Self::new(min_x, min_y, max_x, max_y))
            }
            _ => Err(value.len()),
        }
    }
}

impl Display for Bbox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[derive(Debug)]
struct Accumulator {
    bbox: Bbox,
    seen: bool,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            bbox: Bbox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            seen: false,
        }
    }
}

impl Accumulator {
    fn add(&mut self, position: &[f64]) {
        let (Some(&x), Some(&y)) = (position.first(), position.get(1)) else {
            return;
        };
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.seen = true;
        self.bbox.min_x = f64::min(self.bbox.min_x, x);
        self.bbox.max_x = f64::max(self.bbox.max_x, x);
        self.bbox.min_y = f64::min(self.bbox.min_y, y);
        self.bbox.max_y = f64::max(self.bbox.max_y, y);
    }

    fn add_value(&mut self, value: &geojson::Value) {
        use geojson::Value;
        match value {
            Value::Point(point) => self.add(point),
            Value::MultiPoint(points) | Value::LineString(points) => {
                points.iter().for_each(|p| self.add(p));
            }
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                lines.iter().flatten().for_each(|p| self.add(p));
            }
            Value::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().for_each(|p| self.add(p));
            }
            Value::GeometryCollection(geometries) => {
                for geometry in geometries {
                    self.add_value(&geometry.value);
                }
            }
        }
    }

    fn finish(self) -> Bbox {
        if self.seen { self.bbox } else { Bbox::ZERO }
    }
}
