use std::io;
use std::path::PathBuf;

use scenestac_core::{CatalogError, IndexError, ResolverError, TransportError};
use scenestac_geo_utils::ReprojectionError;

/// A convenience [`Result`] for the scenestac crate.
pub type ScenestacResult<T> = Result<T, ScenestacError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenestacError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] subst::yaml::Error, PathBuf),

    #[error("Unable to serialize the configuration: {0}")]
    ConfigSerializeError(#[source] serde_yaml::Error),

    #[error("Unable to write config file {1}: {0}")]
    ConfigWriteError(#[source] io::Error, PathBuf),

    #[error("No input index given. Use --input or set `input` in the config file")]
    MissingInput,

    #[error("No destination given. Use --destination or set `destination` in the config file")]
    MissingDestination,

    #[error("Write concurrency must be at least 1")]
    InvalidConcurrency,

    #[error(
        "No asset resolver configured. Set `resolver.manifest`, `resolver.listing` or `resolver.thumbnail_template`"
    )]
    NoResolver,

    #[error("Resolver listing {0} needs a `resolver.thumbnail_template`")]
    MissingThumbnailTemplate(String),

    #[error("The catalog layout has no sensors")]
    NoSensors,

    #[error("Dry run of {0} did not read back the catalog it built")]
    RoundTripMismatch(String),

    #[error("Unable to print the catalog summary: {0}")]
    SummaryError(#[source] serde_yaml::Error),

    #[error("Unable to set up logging: {0}")]
    LoggingError(String),

    #[error(transparent)]
    ReprojectionError(#[from] ReprojectionError),

    #[error(transparent)]
    IndexError(#[from] IndexError),

    #[error(transparent)]
    ResolverError(#[from] ResolverError),

    #[error(transparent)]
    TransportError(#[from] TransportError),

    #[error(transparent)]
    CatalogError(#[from] CatalogError),
}
