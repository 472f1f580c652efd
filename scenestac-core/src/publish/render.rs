use serde_json::{Map, Value};

use crate::model::{CatalogTree, Item, Link, Node, NodeKind, is_path_segment};
use crate::publish::LinkMode;
use crate::publish::documents::{
    CATALOG_MEDIA_TYPE, CatalogDocument, CollectionDocument, Document, ExtentDocument,
    ITEM_MEDIA_TYPE, ItemDocument, STAC_VERSION, SpatialExtentDocument, TemporalExtentDocument,
    format_instant, summaries,
};
use crate::{CatalogError, CatalogResult};

/// Path of the root document, relative to the destination.
pub const ROOT_DOCUMENT: &str = "catalog.json";

/// A serialized node and the path it is published at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub path: String,
    pub body: Vec<u8>,
}

/// Serializes the whole tree, parents before children.
///
/// Nothing is written here: every path and link is fixed before the first write.
pub fn render(tree: &CatalogTree, base_url: &str, mode: LinkMode) -> CatalogResult<Vec<RenderedDocument>> {
    let mut renderer = Renderer {
        base_url: base_url.trim_end_matches('/'),
        mode,
        root_title: tree.root().title.as_deref(),
        documents: Vec::new(),
    };
    renderer.node(tree.root(), ROOT_DOCUMENT.to_string(), None, None)?;
    Ok(renderer.documents)
}

struct Renderer<'a> {
    base_url: &'a str,
    mode: LinkMode,
    root_title: Option<&'a str>,
    documents: Vec<RenderedDocument>,
}

impl Renderer<'_> {
    fn href(&self, from: &str, to: &str) -> String {
        match self.mode {
            LinkMode::Absolute => format!("{}/{to}", self.base_url),
            LinkMode::Relative => relative_href(from, to),
        }
    }

    fn common_links(&self, path: &str, parent: Option<&str>, media_type: &str) -> Vec<Link> {
        let mut links = vec![
            Link::new("root", self.href(path, ROOT_DOCUMENT))
                .with_type(CATALOG_MEDIA_TYPE)
                .with_title(self.root_title),
            Link::new("self", self.href(path, path)).with_type(media_type),
        ];
        if let Some(parent) = parent {
            links.push(Link::new("parent", self.href(path, parent)).with_type(CATALOG_MEDIA_TYPE));
        }
        links
    }

    fn node(
        &mut self,
        node: &Node,
        path: String,
        parent: Option<&str>,
        collection: Option<&str>,
    ) -> CatalogResult<()> {
        let mut ids = node
            .children
            .iter()
            .map(|c| &c.id)
            .chain(node.items.iter().map(|i| &i.id));
        if let Some(id) = ids.find(|id| !is_path_segment(id)) {
            return Err(CatalogError::UnsafeIdentifier(id.clone()));
        }

        let dir = parent_dir(&path);
        let children: Vec<String> = node
            .children
            .iter()
            .map(|child| join(&join(dir, &child.id), document_name(child)))
            .collect();
        let items: Vec<String> = node
            .items
            .iter()
            .map(|item| join(&join(dir, &item.id), &format!("{}.json", item.id)))
            .collect();

        let mut links = self.common_links(&path, parent, CATALOG_MEDIA_TYPE);
        for (child, child_path) in node.children.iter().zip(&children) {
            links.push(
                Link::new("child", self.href(&path, child_path))
                    .with_type(CATALOG_MEDIA_TYPE)
                    .with_title(child.title.as_deref()),
            );
        }
        for item_path in &items {
            links.push(Link::new("item", self.href(&path, item_path)).with_type(ITEM_MEDIA_TYPE));
        }
        links.extend(node.links.iter().cloned());

        let document = match &node.kind {
            NodeKind::Catalog => Document::Catalog(CatalogDocument {
                stac_version: STAC_VERSION.to_string(),
                stac_extensions: Vec::new(),
                id: node.id.clone(),
                title: node.title.clone(),
                description: node.description.clone(),
                links,
            }),
            NodeKind::Collection(info) => Document::Collection(CollectionDocument {
                stac_version: STAC_VERSION.to_string(),
                stac_extensions: info.stac_extensions.clone(),
                id: node.id.clone(),
                title: node.title.clone(),
                description: node.description.clone(),
                keywords: info.keywords.clone(),
                version: info.version.clone(),
                license: info.license.clone(),
                providers: info.providers.clone(),
                extent: ExtentDocument {
                    spatial: SpatialExtentDocument {
                        bbox: vec![info.spatial],
                    },
                    temporal: TemporalExtentDocument {
                        interval: vec![[
                            Some(format_instant(info.temporal.start_instant())),
                            Some(format_instant(info.temporal.end_instant())),
                        ]],
                    },
                },
                summaries: summaries(&info.properties),
                links,
            }),
        };
        self.push(path.clone(), &document)?;

        let collection = if node.is_collection() {
            Some(path.as_str())
        } else {
            collection
        };
        for (child, child_path) in node.children.iter().zip(children) {
            self.node(child, child_path, Some(&path), collection)?;
        }
        for (item, item_path) in node.items.iter().zip(items) {
            self.item(item, item_path, &path, collection)?;
        }
        Ok(())
    }

    fn item(
        &mut self,
        item: &Item,
        path: String,
        parent: &str,
        collection: Option<&str>,
    ) -> CatalogResult<()> {
        let mut links = self.common_links(&path, Some(parent), ITEM_MEDIA_TYPE);
        if let Some(collection) = collection {
            links.push(
                Link::new("collection", self.href(&path, collection)).with_type(CATALOG_MEDIA_TYPE),
            );
        }
        let mut properties = Map::new();
        properties.insert(
            "datetime".to_string(),
            Value::String(format_instant(item.datetime)),
        );
        properties.extend(item.properties.clone());

        let document = Document::Item(ItemDocument {
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: Vec::new(),
            id: item.id.clone(),
            geometry: item.geometry.clone(),
            bbox: item.bbox,
            properties,
            links,
            assets: item.assets.clone(),
            collection: Some(item.collection.clone()),
        });
        self.push(path, &document)
    }

    fn push(&mut self, path: String, document: &Document) -> CatalogResult<()> {
        let mut body =
            serde_json::to_vec_pretty(document).map_err(|e| CatalogError::Encode(path.clone(), e))?;
        body.push(b'\n');
        self.documents.push(RenderedDocument { path, body });
        Ok(())
    }
}

fn document_name(node: &Node) -> &'static str {
    if node.is_collection() {
        "collection.json"
    } else {
        ROOT_DOCUMENT
    }
}

/// Directory part of a document path, empty at the root.
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

pub(crate) fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Path of `to` as seen from the directory of `from`, both relative to the catalog root.
fn relative_href(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = parent_dir(from).split('/').filter(|s| !s.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').collect();
    let to_dir = &to_parts[..to_parts.len() - 1];
    let common = from_dir
        .iter()
        .zip(to_dir)
        .take_while(|(a, b)| a == b)
        .count();
    let rest = to_parts[common..].join("/");
    let ups = from_dir.len() - common;
    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::builder::TreeBuilder;
    use crate::test_utils::{layout, scene, square, thumbnail_only};

    #[rstest]
    #[case("catalog.json", "catalog.json", "./catalog.json")]
    #[case("catalog.json", "a/catalog.json", "./a/catalog.json")]
    #[case("a/catalog.json", "catalog.json", "../catalog.json")]
    #[case("a/b/collection.json", "a/catalog.json", "../catalog.json")]
    #[case("a/b/c/i/i.json", "a/b/collection.json", "../../collection.json")]
    #[case("a/b/c/i/i.json", "catalog.json", "../../../../catalog.json")]
    #[case("a/x/catalog.json", "a/y/catalog.json", "../y/catalog.json")]
    fn relative_links(#[case] from: &str, #[case] to: &str, #[case] expected: &str) {
        assert_eq!(relative_href(from, to), expected);
    }

    #[test]
    fn paths() {
        assert_eq!(parent_dir("catalog.json"), "");
        assert_eq!(parent_dir("a/b/collection.json"), "a/b");
        assert_eq!(join("", "x.json"), "x.json");
        assert_eq!(join("a/b", "x.json"), "a/b/x.json");
    }

    #[rstest]
    #[case("S4_07603_4652_20060115_m20_lcc00", true)]
    #[case("canada_spot4_orthoimages", true)]
    #[case("", false)]
    #[case(".", false)]
    #[case("..", false)]
    #[case("a..b", false)]
    #[case("a/b", false)]
    #[case("a\\b", false)]
    fn path_segments(#[case] id: &str, #[case] expected: bool) {
        assert_eq!(is_path_segment(id), expected, "{id}");
    }

    #[test]
    fn item_ids_must_be_single_segments() {
        let mut builder = TreeBuilder::new(layout());
        let mut s = scene(0, "S4_07603_4652_20060115_m20_lcc00", square(-75.0, 45.0, 1.0));
        s.id = "S4_07603/evil".to_string();
        builder
            .add_item(&s, s.geometry.clone(), &thumbnail_only(&s.id))
            .unwrap();
        let tree = builder.finalize().unwrap();
        let err = render(&tree, "memory://", LinkMode::Relative).unwrap_err();
        assert!(
            matches!(&err, CatalogError::UnsafeIdentifier(id) if id == "S4_07603/evil"),
            "{err}"
        );
    }
}
