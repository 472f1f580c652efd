use chrono::NaiveDate;
use geojson::{Geometry, JsonObject, Value};
use serde_json::Map;

use crate::builder::CatalogLayout;
use crate::index::SceneRecord;
use crate::model::{CollectionDefaults, Link, NodeTemplate, TemporalExtent};
use crate::parser::{IdentifierFormat, NAME_ATTRIBUTE, ParsedScene, SensorSpec, parse};
use crate::resolver::SceneAssets;

pub fn layout() -> CatalogLayout {
    let sensor = |code: &str, id: &str, platform: &str| {
        let mut properties = Map::new();
        properties.insert("platform".to_string(), platform.into());
        (
            code.to_string(),
            SensorSpec {
                collection: NodeTemplate {
                    id: id.to_string(),
                    title: Some(format!("{platform} scenes")),
                    description: format!("{platform} orthoimages"),
                },
                identifier: IdentifierFormat::default(),
                properties,
            },
        )
    };
    CatalogLayout {
        root: NodeTemplate {
            id: "Geobase".to_string(),
            title: Some("STAC for Geobase".to_string()),
            description: "STAC Catalog for Geobase".to_string(),
        },
        domain: NodeTemplate {
            id: "canada_spot_orthoimages".to_string(),
            title: None,
            description: "Orthoimages of Canada 2005-2010".to_string(),
        },
        collection_defaults: CollectionDefaults {
            license: "proprietary".to_string(),
            keywords: vec!["SPOT".to_string()],
            version: Some("0.0.3".to_string()),
            providers: Vec::new(),
            links: vec![
                Link::new("license", "https://example.com/licence").with_type("text/html"),
            ],
            stac_extensions: Vec::new(),
            temporal: TemporalExtent::new(
                NaiveDate::from_ymd_opt(2005, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2010, 10, 31).unwrap(),
            ),
        },
        sensors: [
            sensor("S4", "spot4", "SPOT 4"),
            sensor("S5", "spot5", "SPOT 5"),
        ]
        .into_iter()
        .collect(),
        asset_key_len: 9,
    }
}

/// Axis-aligned square polygon with its lower-left corner at `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> Geometry {
    Geometry::new(Value::Polygon(vec![vec![
        vec![x, y],
        vec![x + size, y],
        vec![x + size, y + size],
        vec![x, y + size],
        vec![x, y],
    ]]))
}

pub fn scene(index: usize, name: &str, geometry: Geometry) -> ParsedScene {
    let mut properties = JsonObject::new();
    properties.insert(NAME_ATTRIBUTE.to_string(), name.into());
    let record = SceneRecord {
        index,
        properties: Some(&properties),
        geometry: Some(&geometry),
    };
    parse(&record, &layout().sensors).unwrap()
}

pub fn thumbnail_only(id: &str) -> SceneAssets {
    SceneAssets {
        assets: Vec::new(),
        thumbnail: format!("https://example.com/thumbnails/{id}.jpg"),
    }
}
