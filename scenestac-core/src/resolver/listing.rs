use async_trait::async_trait;
use tracing::trace;

use crate::ResolverError::Listing;
use crate::resolver::{AssetResolver, expand_template};
use crate::store::DocumentStore;
use crate::ResolverResult;

/// Resolves scenes by listing a storage location laid out as `<scene id>/<files>`.
///
/// Object paths are turned into public URLs by prefixing them with `public_base`,
/// which must expose the same tree as the listed store.
#[derive(Debug)]
pub struct StoreResolver {
    store: DocumentStore,
    public_base: String,
    thumbnail_template: String,
}

impl StoreResolver {
    #[must_use]
    pub fn new(store: DocumentStore, public_base: &str, thumbnail_template: String) -> Self {
        Self {
            store,
            public_base: public_base.trim_end_matches('/').to_string(),
            thumbnail_template,
        }
    }
}

#[async_trait]
impl AssetResolver for StoreResolver {
    async fn list_assets(&self, scene_id: &str) -> ResolverResult<Vec<String>> {
        let paths = self
            .store
            .list(scene_id)
            .await
            .map_err(|e| Listing(scene_id.to_string(), Box::new(e)))?;
        trace!("Scene {scene_id} has {} files", paths.len());
        Ok(paths
            .into_iter()
            .map(|path| format!("{}/{path}", self.public_base))
            .collect())
    }

    async fn thumbnail(&self, scene_id: &str) -> ResolverResult<String> {
        Ok(expand_template(&self.thumbnail_template, scene_id))
    }
}
