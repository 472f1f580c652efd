use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use geojson::Geometry;
use scenestac_geo_utils::Bbox;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved asset key for the scene preview image.
pub const THUMBNAIL_KEY: &str = "thumbnail";

/// Identifier, title and description of a catalog or collection node.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub id: String,
    pub title: Option<String>,
    pub description: String,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub title: Option<String>,
}

impl Link {
    #[must_use]
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
            title: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: Option<impl Into<String>>) -> Self {
        self.title = title.map(Into::into);
        self
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    pub url: Option<String>,
}

/// Closed acquisition interval of a collection, `start <= end`.
///
/// Deserializing a reversed interval fails instead of silently reordering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TemporalBounds")]
pub struct TemporalExtent {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize)]
struct TemporalBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<TemporalBounds> for TemporalExtent {
    type Error = String;

    fn try_from(TemporalBounds { start, end }: TemporalBounds) -> Result<Self, Self::Error> {
        if start <= end {
            Ok(Self { start, end })
        } else {
            Err(format!("temporal extent starts on {start}, after its end {end}"))
        }
    }
}

impl TemporalExtent {
    /// Builds an interval, swapping the bounds if they are given in reverse.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Widens the interval so that it covers `date`.
    pub fn include(&mut self, date: NaiveDate) {
        self.start = self.start.min(date);
        self.end = self.end.max(date);
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    #[must_use]
    pub fn start_instant(&self) -> DateTime<Utc> {
        midnight(self.start)
    }

    #[must_use]
    pub fn end_instant(&self) -> DateTime<Utc> {
        midnight(self.end)
    }
}

pub(crate) fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Node and item ids name their own directory, so each must be exactly one path segment.
#[must_use]
pub fn is_path_segment(id: &str) -> bool {
    !id.is_empty() && id != "." && !id.contains("..") && !id.contains(['/', '\\'])
}

/// Static description shared by every collection of a catalog.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefaults {
    pub license: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    /// Extra links copied into every collection, usually the license.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    pub temporal: TemporalExtent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub spatial: Bbox,
    pub temporal: TemporalExtent,
    pub license: String,
    pub keywords: Vec<String>,
    pub version: Option<String>,
    pub providers: Vec<Provider>,
    pub stac_extensions: Vec<String>,
    /// Platform, instrument and band description of the sensor.
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Catalog,
    Collection(Box<CollectionInfo>),
}

/// A catalog or collection in the tree. Items hang off period catalogs only.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    pub kind: NodeKind,
    /// Static links, such as the license. Structural links are computed at publish time.
    pub links: Vec<Link>,
    pub children: Vec<Node>,
    pub items: Vec<Item>,
}

impl Node {
    #[must_use]
    pub fn catalog(template: &NodeTemplate) -> Self {
        Self {
            id: template.id.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
            kind: NodeKind::Catalog,
            links: Vec::new(),
            children: Vec::new(),
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn collection(template: &NodeTemplate, info: CollectionInfo, links: Vec<Link>) -> Self {
        Self {
            kind: NodeKind::Collection(Box::new(info)),
            links,
            ..Self::catalog(template)
        }
    }

    #[must_use]
    pub fn collection_info(&self) -> Option<&CollectionInfo> {
        match &self.kind {
            NodeKind::Collection(info) => Some(info),
            NodeKind::Catalog => None,
        }
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, NodeKind::Collection(_))
    }

    #[must_use]
    pub fn child(&self, id: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.id == id)
    }

    /// All items of this node and its descendants, depth-first.
    pub fn all_items(&self) -> Box<dyn Iterator<Item = &Item> + '_> {
        Box::new(
            self.items
                .iter()
                .chain(self.children.iter().flat_map(Node::all_items)),
        )
    }

    /// All collections among this node and its descendants, depth-first.
    pub fn collections(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        let own = self.is_collection().then_some(self);
        Box::new(
            own.into_iter()
                .chain(self.children.iter().flat_map(Node::collections)),
        )
    }
}

/// One scene, the leaf of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub collection: String,
    pub geometry: Geometry,
    pub bbox: Bbox,
    pub datetime: DateTime<Utc>,
    pub properties: Map<String, Value>,
    pub assets: BTreeMap<String, Asset>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// Finalized, validated catalog tree. It can no longer be mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTree {
    root: Node,
}

impl CatalogTree {
    pub(crate) fn new(root: Node) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.root.all_items()
    }

    pub fn collections(&self) -> impl Iterator<Item = &Node> {
        self.root.collections()
    }

    #[must_use]
    pub fn collection(&self, id: &str) -> Option<&Node> {
        self.collections().find(|c| c.id == id)
    }
}
