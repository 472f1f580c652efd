use std::fmt::Debug;

use async_trait::async_trait;

use crate::ResolverResult;

mod listing;
pub use listing::StoreResolver;

mod manifest;
pub use manifest::{ManifestEntry, ManifestResolver};

/// Placeholder replaced by the scene identifier in thumbnail URL templates.
pub const SCENE_ID_PLACEHOLDER: &str = "{id}";

/// Download links of one scene, as returned by a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneAssets {
    pub assets: Vec<String>,
    pub thumbnail: String,
}

/// Looks up the downloadable files of a scene.
///
/// URLs are opaque to the catalog builder except for their file name,
/// from which the asset key is derived. Implementations own any retry policy.
#[async_trait]
pub trait AssetResolver: Send + Sync + Debug {
    /// Every downloadable file of the scene. May be empty.
    async fn list_assets(&self, scene_id: &str) -> ResolverResult<Vec<String>>;

    /// The preview image of the scene. Every item has one.
    async fn thumbnail(&self, scene_id: &str) -> ResolverResult<String>;

    /// Both lookups, one after the other.
    async fn resolve(&self, scene_id: &str) -> ResolverResult<SceneAssets> {
        let assets = self.list_assets(scene_id).await?;
        let thumbnail = self.thumbnail(scene_id).await?;
        Ok(SceneAssets { assets, thumbnail })
    }
}

pub type BoxedResolver = Box<dyn AssetResolver>;

pub(crate) fn expand_template(template: &str, scene_id: &str) -> String {
    template.replace(SCENE_ID_PLACEHOLDER, scene_id)
}
