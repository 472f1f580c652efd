//! The catalog tree state machine.
//!
//! The tree always has the shape root catalog → domain catalog → one collection per
//! sensor → one catalog per period → items. Collections and period catalogs are
//! created the first time a scene needs them.

use std::collections::HashMap;

use geojson::Geometry;
use scenestac_geo_utils::Bbox;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::{debug, info};

use crate::BuildError::{DuplicateItems, Inconsistent, UnknownSensor};
use crate::model::{CatalogTree, CollectionDefaults, CollectionInfo, Item, Node, NodeKind, NodeTemplate};
use crate::parser::{ParsedScene, SensorTable};
use crate::resolver::SceneAssets;
use crate::{BuildError, BuildResult, DuplicateItem};

mod assets;
pub use assets::{DEFAULT_ASSET_KEY_LEN, asset_key, build_assets, media_type_for};

/// Static shape and metadata of the catalog being built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogLayout {
    pub root: NodeTemplate,
    pub domain: NodeTemplate,
    pub collection_defaults: CollectionDefaults,
    pub sensors: SensorTable,
    /// Width of the product code at the end of asset file names.
    #[serde(default = "default_asset_key_len")]
    pub asset_key_len: usize,
}

fn default_asset_key_len() -> usize {
    DEFAULT_ASSET_KEY_LEN
}

/// Handle to a sensor collection. Only valid for the builder that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionRef(usize);

/// Handle to a period catalog inside a collection. Only valid for the builder that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogRef {
    collection: CollectionRef,
    index: usize,
}

impl CatalogRef {
    #[must_use]
    pub fn collection(self) -> CollectionRef {
        self.collection
    }
}

#[derive(Debug)]
pub struct TreeBuilder {
    root: Node,
    domain: Node,
    sensors: SensorTable,
    defaults: CollectionDefaults,
    asset_key_len: usize,
    collections: HashMap<String, CollectionRef>,
    periods: HashMap<(CollectionRef, String), CatalogRef>,
    /// Item id to the record index that introduced it.
    seen: HashMap<String, usize>,
    duplicates: Vec<DuplicateItem>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(layout: CatalogLayout) -> Self {
        Self {
            root: Node::catalog(&layout.root),
            domain: Node::catalog(&layout.domain),
            sensors: layout.sensors,
            defaults: layout.collection_defaults,
            asset_key_len: layout.asset_key_len,
            collections: HashMap::new(),
            periods: HashMap::new(),
            seen: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Returns the collection of a sensor, creating it under the domain catalog on first use.
    ///
    /// Sensors sharing a collection id share the collection.
    pub fn ensure_collection(&mut self, sensor_code: &str) -> BuildResult<CollectionRef> {
        if let Some(collection) = self.collections.get(sensor_code) {
            return Ok(*collection);
        }
        let spec = self
            .sensors
            .get(sensor_code)
            .ok_or_else(|| UnknownSensor(sensor_code.to_string()))?;

        let position = self
            .domain
            .children
            .iter()
            .position(|c| c.id == spec.collection.id);
        let collection = CollectionRef(if let Some(position) = position {
            position
        } else {
            let info = CollectionInfo {
                spatial: Bbox::ZERO,
                temporal: self.defaults.temporal,
                license: self.defaults.license.clone(),
                keywords: self.defaults.keywords.clone(),
                version: self.defaults.version.clone(),
                providers: self.defaults.providers.clone(),
                stac_extensions: self.defaults.stac_extensions.clone(),
                properties: spec.properties.clone(),
            };
            let node = Node::collection(&spec.collection, info, self.defaults.links.clone());
            info!("Creating collection {} for sensor {sensor_code}", node.id);
            self.domain.children.push(node);
            self.domain.children.len() - 1
        });
        self.collections.insert(sensor_code.to_string(), collection);
        Ok(collection)
    }

    /// Returns the period catalog for `year_key` inside `collection`, creating it once.
    pub fn ensure_period_catalog(&mut self, collection: CollectionRef, year_key: &str) -> CatalogRef {
        let key = (collection, year_key.to_string());
        if let Some(catalog) = self.periods.get(&key) {
            return *catalog;
        }
        let parent = &mut self.domain.children[collection.0];
        let template = NodeTemplate {
            id: year_key.to_string(),
            title: Some(year_key.replace('_', " ")),
            description: format!("Scenes of {} for period {year_key}", parent.id),
        };
        debug!("Creating period catalog {year_key} in {}", parent.id);
        parent.children.push(Node::catalog(&template));
        let catalog = CatalogRef {
            collection,
            index: parent.children.len() - 1,
        };
        self.periods.insert(key, catalog);
        catalog
    }

    /// The sensor table scenes are parsed and grouped with.
    #[must_use]
    pub fn sensors(&self) -> &SensorTable {
        &self.sensors
    }

    #[must_use]
    pub fn contains_item(&self, id: &str) -> bool {
        self.seen.contains_key(id)
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.seen.len()
    }

    /// Duplicates rejected so far.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateItem] {
        &self.duplicates
    }

    /// Adds one scene, with its geometry already in the canonical CRS.
    ///
    /// A scene id seen before is recorded and rejected with [`BuildError::DuplicateItem`];
    /// the first occurrence stays in the tree.
    pub fn add_item(
        &mut self,
        scene: &ParsedScene,
        geometry: Geometry,
        resolved: &SceneAssets,
    ) -> BuildResult<()> {
        if let Some(&first_index) = self.seen.get(&scene.id) {
            let duplicate = DuplicateItem {
                id: scene.id.clone(),
                first_index,
                index: scene.index,
            };
            self.duplicates.push(duplicate.clone());
            return Err(BuildError::DuplicateItem(duplicate));
        }

        let assets = build_assets(&scene.id, resolved, self.asset_key_len)?;
        let collection = self.ensure_collection(&scene.sensor_code)?;
        let period = self.ensure_period_catalog(collection, &scene.year_key);

        let bbox = Bbox::of_geometry(&geometry.value);
        let node = &mut self.domain.children[collection.0];
        if let NodeKind::Collection(info) = &mut node.kind {
            info.spatial = info.spatial.union(bbox);
            info.temporal.include(scene.acquisition_date);
        }
        let item = Item {
            id: scene.id.clone(),
            collection: node.id.clone(),
            geometry,
            bbox,
            datetime: scene.datetime(),
            properties: Map::new(),
            assets,
        };
        debug!("Adding item {} to {}/{}", item.id, node.id, scene.year_key);
        node.children[period.index].items.push(item);
        self.seen.insert(scene.id.clone(), scene.index);
        Ok(())
    }

    /// Validates the tree and freezes it.
    ///
    /// Fails with every recorded duplicate first, then with every broken invariant.
    pub fn finalize(self) -> BuildResult<CatalogTree> {
        if !self.duplicates.is_empty() {
            return Err(DuplicateItems(self.duplicates));
        }
        let problems = validate(&self.domain);
        if !problems.is_empty() {
            return Err(Inconsistent(problems));
        }
        let mut root = self.root;
        root.children.push(self.domain);
        Ok(CatalogTree::new(root))
    }
}

fn validate(domain: &Node) -> Vec<String> {
    let mut problems = Vec::new();
    for collection in &domain.children {
        let Some(info) = collection.collection_info() else {
            continue;
        };
        let id = &collection.id;
        let count = collection.all_items().count();
        if count > 0 && info.spatial.is_degenerate() {
            problems.push(format!(
                "collection {id} has {count} item(s) but a degenerate spatial extent {}",
                info.spatial
            ));
        }
        if info.temporal.start > info.temporal.end {
            problems.push(format!("collection {id} has a reversed temporal extent"));
        }
        for period in &collection.children {
            if period.items.is_empty() && period.children.is_empty() {
                problems.push(format!("catalog {id}/{} has no items", period.id));
            }
        }
        for item in collection.all_items() {
            if !item.bbox.is_sentinel() && !info.spatial.contains(&item.bbox) {
                problems.push(format!(
                    "item {} bbox {} is outside collection {id} extent {}",
                    item.id, item.bbox, info.spatial
                ));
            }
            if !info.temporal.contains(item.datetime.date_naive()) {
                problems.push(format!(
                    "item {} date is outside collection {id} temporal extent",
                    item.id
                ));
            }
        }
    }
    problems
}
