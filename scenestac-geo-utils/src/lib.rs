//! Geometry helpers used by the scenestac catalog builder.
//!
//! - [`Bbox`]: bounding boxes and the sentinel-aware extent union
//! - [`Crs`]: coordinate reference system identifiers
//! - [`Reprojector`]: a reusable forward transform for `GeoJSON` geometries

mod bbox;
pub use bbox::Bbox;

mod crs;
pub use crs::Crs;

mod error;
pub use error::{ReprojectionError, ReprojectionResult};

mod reproject;
pub use reproject::Reprojector;
