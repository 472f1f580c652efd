use std::fs;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson, Geometry, JsonObject};
use scenestac_geo_utils::{Bbox, Crs};
use serde_json::Value;
use tracing::debug;

use crate::IndexError::{Crs as CrsError, GeoJson as GeoJsonError, Io, NotFeatureCollection};
use crate::IndexResult;

/// One raw record of the scene index, borrowed from the dataset.
#[derive(Debug, Clone, Copy)]
pub struct SceneRecord<'a> {
    /// Position of the record in the input, starting at 0.
    pub index: usize,
    pub properties: Option<&'a JsonObject>,
    pub geometry: Option<&'a Geometry>,
}

/// A footprint index: a `GeoJSON` `FeatureCollection` with one feature per scene.
#[derive(Debug, Clone)]
pub struct SceneIndex {
    path: PathBuf,
    crs: Crs,
    collection: FeatureCollection,
}

impl SceneIndex {
    /// Reads the index at `path`.
    ///
    /// The source CRS is `crs_override` when given, else the legacy `crs` member
    /// of the collection, else WGS84.
    pub fn open(path: &Path, crs_override: Option<Crs>) -> IndexResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| Io(e, path.to_path_buf()))?;
        let geojson = text
            .parse::<GeoJson>()
            .map_err(|e| GeoJsonError(Box::new(e), path.to_path_buf()))?;
        Self::from_geojson(geojson, path.to_path_buf(), crs_override)
    }

    pub fn from_geojson(
        geojson: GeoJson,
        path: PathBuf,
        crs_override: Option<Crs>,
    ) -> IndexResult<Self> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(NotFeatureCollection(path));
        };
        let crs = match crs_override {
            Some(crs) => crs,
            None => declared_crs(&collection)
                .map(|name| name.parse::<Crs>())
                .transpose()
                .map_err(|e| CrsError(e, path.clone()))?
                .unwrap_or_default(),
        };
        debug!(
            "Loaded {} scene records from {} in {crs}",
            collection.features.len(),
            path.display()
        );
        Ok(Self {
            path,
            crs,
            collection,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// Bounding extent of the dataset in its source CRS: the declared `bbox`
    /// member when present, otherwise the union of all feature geometries.
    #[must_use]
    pub fn bounds(&self) -> Bbox {
        self.collection
            .bbox
            .as_deref()
            .and_then(|b| Bbox::try_from(b).ok())
            .unwrap_or_else(|| {
                Bbox::of_geometries(
                    self.collection
                        .features
                        .iter()
                        .filter_map(|f| f.geometry.as_ref())
                        .map(|g| &g.value),
                )
            })
    }

    /// Records in file order.
    pub fn records(&self) -> impl ExactSizeIterator<Item = SceneRecord<'_>> {
        self.collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| SceneRecord {
                index,
                properties: feature.properties.as_ref(),
                geometry: feature.geometry.as_ref(),
            })
    }
}

/// The `crs` member of old-style `GeoJSON`: `{"type": "name", "properties": {"name": "EPSG:3979"}}`.
fn declared_crs(collection: &FeatureCollection) -> Option<&str> {
    collection
        .foreign_members
        .as_ref()?
        .get("crs")?
        .get("properties")?
        .get("name")
        .and_then(Value::as_str)
}
