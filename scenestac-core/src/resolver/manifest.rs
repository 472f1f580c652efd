use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ResolverError::{ManifestLoad, ManifestParse, NotFound};
use crate::ResolverResult;
use crate::resolver::{AssetResolver, expand_template};

/// Known downloads of one scene.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub assets: Vec<String>,
    pub thumbnail: Option<String>,
}

/// Resolves scenes from a pre-computed JSON manifest:
/// `{"<scene id>": {"assets": ["<url>", ...], "thumbnail": "<url>"}}`.
///
/// Scenes missing from the manifest have no assets. Their thumbnail comes from
/// the fallback template, and without one they are an error.
#[derive(Debug, Clone, Default)]
pub struct ManifestResolver {
    entries: HashMap<String, ManifestEntry>,
    thumbnail_template: Option<String>,
}

impl ManifestResolver {
    #[must_use]
    pub fn new(entries: HashMap<String, ManifestEntry>, thumbnail_template: Option<String>) -> Self {
        Self {
            entries,
            thumbnail_template,
        }
    }

    pub fn from_file(path: &Path, thumbnail_template: Option<String>) -> ResolverResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ManifestLoad(e, path.to_path_buf()))?;
        let entries: HashMap<String, ManifestEntry> =
            serde_json::from_str(&text).map_err(|e| ManifestParse(e, path.to_path_buf()))?;
        debug!(
            "Loaded asset manifest {} with {} scenes",
            path.display(),
            entries.len()
        );
        Ok(Self::new(entries, thumbnail_template))
    }

    /// Resolver with no manifest, where every thumbnail comes from the template.
    #[must_use]
    pub fn from_template(thumbnail_template: String) -> Self {
        Self::new(HashMap::new(), Some(thumbnail_template))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AssetResolver for ManifestResolver {
    async fn list_assets(&self, scene_id: &str) -> ResolverResult<Vec<String>> {
        Ok(self
            .entries
            .get(scene_id)
            .map(|e| e.assets.clone())
            .unwrap_or_default())
    }

    async fn thumbnail(&self, scene_id: &str) -> ResolverResult<String> {
        self.entries
            .get(scene_id)
            .and_then(|e| e.thumbnail.clone())
            .or_else(|| {
                self.thumbnail_template
                    .as_deref()
                    .map(|t| expand_template(t, scene_id))
            })
            .ok_or_else(|| NotFound(scene_id.to_string()))
    }
}
