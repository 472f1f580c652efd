use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use geojson::Geometry;
use scenestac_geo_utils::Bbox;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Asset, Link, Provider};

pub const STAC_VERSION: &str = "1.0.0";

/// Media type of catalog and collection documents.
pub const CATALOG_MEDIA_TYPE: &str = "application/json";
/// Media type of item documents.
pub const ITEM_MEDIA_TYPE: &str = "application/geo+json";

/// Every published instant is written in this one form, e.g. `2006-01-15T00:00:00Z`.
#[must_use]
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One serialized node of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Document {
    Catalog(CatalogDocument),
    Collection(CollectionDocument),
    #[serde(rename = "Feature")]
    Item(ItemDocument),
}

impl Document {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Catalog(d) => &d.id,
            Self::Collection(d) => &d.id,
            Self::Item(d) => &d.id,
        }
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        match self {
            Self::Catalog(d) => &d.links,
            Self::Collection(d) => &d.links,
            Self::Item(d) => &d.links,
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub stac_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    pub links: Vec<Link>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub stac_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub version: Option<String>,
    pub license: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    pub extent: ExtentDocument,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub summaries: Map<String, Value>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtentDocument {
    pub spatial: SpatialExtentDocument,
    pub temporal: TemporalExtentDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtentDocument {
    pub bbox: Vec<Bbox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtentDocument {
    pub interval: Vec<[Option<String>; 2]>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub stac_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub geometry: Geometry,
    pub bbox: Bbox,
    pub properties: Map<String, Value>,
    pub links: Vec<Link>,
    pub assets: BTreeMap<String, Asset>,
    pub collection: Option<String>,
}

/// Collection summaries list every value, so scalars become one-element arrays.
#[must_use]
pub fn summaries(properties: &Map<String, Value>) -> Map<String, Value> {
    properties
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::Array(_) => v.clone(),
                other => Value::Array(vec![other.clone()]),
            };
            (k.clone(), v)
        })
        .collect()
}
