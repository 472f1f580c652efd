use std::collections::{BTreeMap, HashSet};

use scenestac_geo_utils::Bbox;
use serde::Serialize;
use tracing::debug;

use crate::model::{CatalogTree, Item, Node};
use crate::publish::documents::{Document, format_instant};
use crate::publish::render::{ROOT_DOCUMENT, join, parent_dir};
use crate::store::DocumentStore;
use crate::{CatalogError, CatalogResult};

enum Entry<'a> {
    Node(&'a Node),
    Item(&'a Item),
}

/// What a published catalog contains, in publishing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub root: String,
    pub catalogs: Vec<String>,
    pub collections: Vec<CollectionSummary>,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub id: String,
    pub bbox: Vec<Bbox>,
    pub interval: Vec<[Option<String>; 2]>,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub collection: Option<String>,
    pub bbox: Bbox,
    pub datetime: Option<String>,
    /// Asset key to href.
    pub assets: BTreeMap<String, String>,
}

impl CatalogSummary {
    /// The summary the tree will have once published.
    #[must_use]
    pub fn of_tree(tree: &CatalogTree) -> Self {
        let mut summary = Self {
            root: tree.root().id.clone(),
            ..Self::default()
        };
        let mut stack = vec![Entry::Node(tree.root())];
        while let Some(entry) = stack.pop() {
            let node = match entry {
                Entry::Item(item) => {
                    summary.items.push(ItemSummary {
                        id: item.id.clone(),
                        collection: Some(item.collection.clone()),
                        bbox: item.bbox,
                        datetime: Some(format_instant(item.datetime)),
                        assets: item
                            .assets
                            .iter()
                            .map(|(k, a)| (k.clone(), a.href.clone()))
                            .collect(),
                    });
                    continue;
                }
                Entry::Node(node) => node,
            };
            match node.collection_info() {
                None => summary.catalogs.push(node.id.clone()),
                Some(info) => summary.collections.push(CollectionSummary {
                    id: node.id.clone(),
                    bbox: vec![info.spatial],
                    interval: vec![[
                        Some(format_instant(info.temporal.start_instant())),
                        Some(format_instant(info.temporal.end_instant())),
                    ]],
                    items: 0,
                }),
            }
            // children are published, and read back, before items
            stack.extend(node.items.iter().rev().map(Entry::Item));
            stack.extend(node.children.iter().rev().map(Entry::Node));
        }
        summary.count_items();
        summary
    }

    fn count_items(&mut self) {
        for collection in &mut self.collections {
            collection.items = self
                .items
                .iter()
                .filter(|i| i.collection.as_deref() == Some(collection.id.as_str()))
                .count();
        }
    }
}

/// Walks a published catalog from its root document along `child` and `item` links.
pub async fn read_catalog(store: &DocumentStore) -> CatalogResult<CatalogSummary> {
    let mut summary = CatalogSummary::default();
    let mut visited = HashSet::new();
    let mut stack = vec![ROOT_DOCUMENT.to_string()];

    while let Some(path) = stack.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }
        let bytes = store.read(&path).await?;
        let document: Document =
            serde_json::from_slice(&bytes).map_err(|e| CatalogError::Decode(path.clone(), e))?;
        debug!("Read {} from {path}", document.id());
        if path == ROOT_DOCUMENT {
            summary.root = document.id().to_string();
        }

        let mut next = Vec::new();
        for link in document.links() {
            if link.rel == "child" || link.rel == "item" {
                let target = resolve_href(store.base_url(), &path, &link.href)
                    .ok_or_else(|| CatalogError::ForeignLink(path.clone(), link.href.clone()))?;
                next.push(target);
            }
        }

        match document {
            Document::Catalog(catalog) => summary.catalogs.push(catalog.id),
            Document::Collection(collection) => summary.collections.push(CollectionSummary {
                id: collection.id,
                bbox: collection.extent.spatial.bbox,
                interval: collection.extent.temporal.interval,
                items: 0,
            }),
            Document::Item(item) => summary.items.push(ItemSummary {
                id: item.id,
                collection: item.collection,
                bbox: item.bbox,
                datetime: item
                    .properties
                    .get("datetime")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string),
                assets: item.assets.into_iter().map(|(k, a)| (k, a.href)).collect(),
            }),
        }
        stack.extend(next.into_iter().rev());
    }
    summary.count_items();
    Ok(summary)
}

/// Turns a link into a store path, or `None` if it leaves the catalog.
fn resolve_href(base_url: &str, current: &str, href: &str) -> Option<String> {
    if let Some(rest) = href.strip_prefix(base_url) {
        return rest.strip_prefix('/').map(ToString::to_string);
    }
    if href.contains("://") || href.starts_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = parent_dir(current)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            name => parts.push(name),
        }
    }
    let (name, dir) = parts.split_last()?;
    Some(join(&dir.join("/"), name))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("catalog.json", "./a/catalog.json", Some("a/catalog.json"))]
    #[case("a/b/catalog.json", "../c/collection.json", Some("a/c/collection.json"))]
    #[case("a/catalog.json", "../../escape.json", None)]
    #[case("a/catalog.json", "https://other.example.com/x.json", None)]
    #[case("a/catalog.json", "/etc/passwd", None)]
    #[case("a/catalog.json", "https://base.example.com/cat/a/b/i.json", Some("a/b/i.json"))]
    fn hrefs(#[case] current: &str, #[case] href: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            resolve_href("https://base.example.com/cat", current, href).as_deref(),
            expected
        );
    }
}
