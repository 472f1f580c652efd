use std::path::PathBuf;

use scenestac_core::resolver::{ManifestResolver, StoreResolver};
use scenestac_core::{BoxedResolver, DocumentStore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ScenestacError::{MissingThumbnailTemplate, NoResolver};
use crate::ScenestacResult;
use crate::config::UnrecognizedValues;

/// Where download links of a scene come from.
///
/// A `listing` store wins over a `manifest`. With neither, every scene only
/// gets a thumbnail from `thumbnail_template`.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// JSON file mapping scene ids to `{assets: [url], thumbnail: url}`.
    pub manifest: Option<PathBuf>,

    /// Object store holding one directory of downloads per scene.
    pub listing: Option<String>,

    /// Public URL of the `listing` store, if it differs from the listing URI.
    pub public_base: Option<String>,

    /// Thumbnail URL with an `{id}` placeholder for the scene identifier.
    pub thumbnail_template: Option<String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl ResolverConfig {
    pub fn build(&self) -> ScenestacResult<BoxedResolver> {
        if let Some(listing) = &self.listing {
            let template = self
                .thumbnail_template
                .clone()
                .ok_or_else(|| MissingThumbnailTemplate(listing.clone()))?;
            let store = DocumentStore::open(listing)?;
            let public_base = self
                .public_base
                .clone()
                .unwrap_or_else(|| store.base_url().to_string());
            info!("Resolving scene assets by listing {listing}, published under {public_base}");
            return Ok(Box::new(StoreResolver::new(store, &public_base, template)));
        }
        if let Some(manifest) = &self.manifest {
            info!("Resolving scene assets from {}", manifest.display());
            let resolver = ManifestResolver::from_file(manifest, self.thumbnail_template.clone())?;
            return Ok(Box::new(resolver));
        }
        match &self.thumbnail_template {
            Some(template) => {
                info!("No asset source configured, scenes only get a thumbnail");
                Ok(Box::new(ManifestResolver::from_template(template.clone())))
            }
            None => Err(NoResolver),
        }
    }
}
