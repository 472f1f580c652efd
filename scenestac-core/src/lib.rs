#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations)]

mod error;
pub use error::{
    BuildError, BuildResult, CatalogError, CatalogResult, DuplicateItem, IndexError, IndexResult,
    ParseError, ParseResult, RecordError, ResolverError, ResolverResult, TransportError,
    TransportResult,
};

pub mod builder;
pub use builder::{CatalogLayout, TreeBuilder};

pub mod index;
pub use index::{SceneIndex, SceneRecord};

mod ingest;
pub use ingest::{IngestObserver, ingest};

pub mod model;
pub use model::CatalogTree;

pub mod parser;
pub use parser::{ParsedScene, SensorTable};

pub mod publish;
pub use publish::{LinkMode, publish};

pub mod resolver;
pub use resolver::{AssetResolver, BoxedResolver};

pub mod store;
pub use store::DocumentStore;

#[cfg(test)]
mod test_utils;
