use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use scenestac_geo_utils::ReprojectionError;

/// Failures while turning one index record into a [`ParsedScene`](crate::ParsedScene).
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("Unknown sensor code `{0}`")]
    UnknownSensor(String),

    #[error("Acquisition date `{0}` is not a valid YYYYMMDD date: {1}")]
    BadDate(String, chrono::ParseError),

    #[error("Malformed scene identifier `{0}`: {1}")]
    MalformedIdentifier(String, &'static str),

    #[error("Record has no `{0}` attribute")]
    MissingAttribute(&'static str),

    #[error("Record has no geometry")]
    MissingGeometry,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// One item identifier seen more than once in the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateItem {
    pub id: String,
    pub first_index: usize,
    pub index: usize,
}

impl Display for DuplicateItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (record #{} repeats record #{})",
            self.id, self.index, self.first_index
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("Duplicate item {0}")]
    DuplicateItem(DuplicateItem),

    #[error("{} duplicate item(s) found:\n    {}", .0.len(), itertools::join(.0, "\n    "))]
    DuplicateItems(Vec<DuplicateItem>),

    #[error("Asset URL `{0}` has a file name too short to contain a {1}-character product code")]
    MissingAssetSuffix(String, usize),

    #[error("Asset key `{key}` of scene {id} is derived from more than one URL (last one: {url})")]
    DuplicateAssetKey { id: String, key: String, url: String },

    #[error("Sensor `{0}` has no collection definition")]
    UnknownSensor(String),

    #[error("Catalog tree failed validation:\n    {}", .0.join("\n    "))]
    Inconsistent(Vec<String>),
}

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(thiserror::Error, Debug)]
pub enum ResolverError {
    #[error("No assets are known for scene {0}")]
    NotFound(String),

    #[error("Unable to list assets of scene {0}: {1}")]
    Listing(String, #[source] Box<TransportError>),

    #[error("Unable to read asset manifest {}: {}", .1.display(), .0)]
    ManifestLoad(#[source] std::io::Error, PathBuf),

    #[error("Unable to parse asset manifest {}: {}", .1.display(), .0)]
    ManifestParse(#[source] serde_json::Error, PathBuf),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Asset resolver is unavailable: {0}")]
    ResolverUnavailable(#[from] ResolverError),

    #[error("Unable to write {0}: {1}")]
    StorageWriteFailed(String, #[source] object_store::Error),

    #[error("Unable to read {0}: {1}")]
    StorageReadFailed(String, #[source] object_store::Error),

    #[error("Unable to open storage {0}: {1}")]
    StorageInit(String, #[source] object_store::Error),

    #[error("Unsupported storage location `{0}`: {1}")]
    InvalidUri(String, String),

    #[error("Invalid storage path `{0}`: {1}")]
    InvalidPath(String, #[source] object_store::path::Error),

    #[error("Unable to prepare local directory {}: {}", .1.display(), .0)]
    LocalDir(#[source] std::io::Error, PathBuf),
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("Unable to read scene index {}: {}", .1.display(), .0)]
    Io(#[source] std::io::Error, PathBuf),

    #[error("Unable to parse scene index {}: {}", .1.display(), .0)]
    GeoJson(#[source] Box<geojson::Error>, PathBuf),

    #[error("Scene index {} must be a GeoJSON FeatureCollection", .0.display())]
    NotFeatureCollection(PathBuf),

    #[error("Scene index {} declares an unsupported CRS: {}", .1.display(), .0)]
    Crs(#[source] ReprojectionError, PathBuf),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Everything that can go wrong in a single record of the ingest loop.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Reprojection(#[from] ReprojectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Record #{index} ({id}) failed: {source}")]
    Record {
        index: usize,
        id: String,
        source: RecordError,
    },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Reprojection(#[from] ReprojectionError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unable to encode document {0}: {1}")]
    Encode(String, #[source] serde_json::Error),

    #[error("Unable to decode document {0}: {1}")]
    Decode(String, #[source] serde_json::Error),

    #[error("Link `{1}` in {0} does not point inside the catalog")]
    ForeignLink(String, String),

    #[error("Identifier `{0}` cannot be used as a directory name")]
    UnsafeIdentifier(String),
}

impl CatalogError {
    pub fn record(index: usize, id: impl Into<String>, source: impl Into<RecordError>) -> Self {
        Self::Record {
            index,
            id: id.into(),
            source: source.into(),
        }
    }

    /// The error kind a failed run reports next to the record index.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record { source, .. } => match source {
                RecordError::Parse(_) => "parse",
                RecordError::Reprojection(_) => "reprojection",
                RecordError::Transport(_) => "transport",
                RecordError::Build(_) => "build",
            },
            Self::Index(_) => "index",
            Self::Reprojection(_) => "reprojection",
            Self::Build(_) => "build",
            Self::Transport(_) => "transport",
            Self::Encode(..)
            | Self::Decode(..)
            | Self::ForeignLink(..)
            | Self::UnsafeIdentifier(_) => "document",
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
