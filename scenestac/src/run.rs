use scenestac_core::publish::{CatalogSummary, PublishReport, read_catalog};
use scenestac_core::{
    CatalogTree, DocumentStore, IngestObserver, SceneIndex, TreeBuilder, ingest, publish,
};
use scenestac_geo_utils::{Crs, Reprojector};
use tracing::info;

use crate::ScenestacError::{MissingDestination, MissingInput, RoundTripMismatch};
use crate::ScenestacResult;
use crate::config::Config;

/// What a build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub tree: CatalogTree,
    pub report: PublishReport,
    /// Public form of the destination the documents were written to, or would have been.
    pub base_url: String,
}

/// Reads the index, builds the catalog tree and publishes it.
///
/// Nothing is written unless every record was ingested and the tree validated.
/// A dry run publishes into memory instead and checks that the catalog reads back
/// as built.
pub async fn build_catalog(
    config: &Config,
    dry_run: bool,
    observer: &mut dyn IngestObserver,
) -> ScenestacResult<BuildOutcome> {
    let input = config.input.as_deref().ok_or(MissingInput)?;
    let destination = config.destination.as_deref().ok_or(MissingDestination)?;
    let source_crs = config
        .source_crs
        .as_deref()
        .map(str::parse::<Crs>)
        .transpose()?;
    let resolver = config.resolver.build()?;

    let index = SceneIndex::open(input, source_crs)?;
    let reprojector = Reprojector::to_wgs84(index.crs())?;
    let tree = ingest(
        &index,
        &reprojector,
        &*resolver,
        TreeBuilder::new(config.catalog.clone()),
        observer,
    )
    .await?;

    let store = if dry_run {
        DocumentStore::dry_run(destination)?
    } else {
        DocumentStore::create(destination)?
    };
    let report = publish(&tree, &store, config.link_mode, config.write_concurrency()).await?;
    if dry_run {
        if read_catalog(&store).await? != CatalogSummary::of_tree(&tree) {
            return Err(RoundTripMismatch(destination.to_string()));
        }
        info!(
            "Dry run: {} documents ({} bytes) would be written to {destination}",
            report.documents, report.bytes
        );
    } else {
        info!(
            "Published {} documents ({} bytes) to {destination}",
            report.documents, report.bytes
        );
    }
    Ok(BuildOutcome {
        tree,
        report,
        base_url: store.base_url().to_string(),
    })
}

/// Reads a published catalog back from `uri`.
pub async fn inspect_catalog(uri: &str) -> ScenestacResult<CatalogSummary> {
    let store = DocumentStore::open(uri)?;
    let summary = read_catalog(&store).await?;
    info!(
        "Catalog {} has {} catalogs, {} collections and {} items",
        summary.root,
        summary.catalogs.len(),
        summary.collections.len(),
        summary.items.len()
    );
    Ok(summary)
}
