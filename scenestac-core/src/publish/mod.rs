use std::fmt::{Display, Formatter};
use std::str::FromStr;

use futures::{StreamExt as _, TryStreamExt as _, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::CatalogTree;
use crate::store::DocumentStore;
use crate::{CatalogError, CatalogResult};

pub mod documents;

mod reader;
pub use reader::{CatalogSummary, CollectionSummary, ItemSummary, read_catalog};

mod render;
pub use render::{ROOT_DOCUMENT, RenderedDocument, render};

/// How links between published documents are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Paths relative to the linking document, so the tree can be moved as a whole.
    #[default]
    Relative,
    /// Fully qualified URLs under the destination.
    Absolute,
}

impl FromStr for LinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            other => Err(format!(
                "unknown link mode `{other}`, expected `relative` or `absolute`"
            )),
        }
    }
}

impl Display for LinkMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub documents: usize,
    pub bytes: usize,
}

/// Renders the whole tree and writes every document to `store`.
///
/// Writes start only once every document is rendered. At most `concurrency` writes
/// run at a time; documents have distinct paths so their order does not matter.
pub async fn publish(
    tree: &CatalogTree,
    store: &DocumentStore,
    mode: LinkMode,
    concurrency: usize,
) -> CatalogResult<PublishReport> {
    let documents = render(tree, store.base_url(), mode)?;
    for doc in &documents {
        store.location(&doc.path)?;
    }
    let report = PublishReport {
        documents: documents.len(),
        bytes: documents.iter().map(|d| d.body.len()).sum(),
    };
    info!(
        "Publishing {} documents ({} bytes) to {} with {mode} links",
        report.documents,
        report.bytes,
        store.base_url()
    );

    stream::iter(documents)
        .map(Ok::<_, CatalogError>)
        .try_for_each_concurrent(concurrency.max(1), |doc| async move {
            debug!("Writing {}", doc.path);
            store.write(&doc.path, doc.body).await?;
            Ok::<_, CatalogError>(())
        })
        .await?;
    Ok(report)
}
