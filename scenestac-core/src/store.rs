use std::fs::create_dir_all;
use std::path::{Path as FsPath, PathBuf, absolute};

use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::http::{HttpBuilder, HttpStore};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectMeta, ObjectStore, PutMode,
    PutOptions, PutPayload,
};
use tracing::debug;
use url::Url;

use crate::TransportError::{
    InvalidPath, InvalidUri, LocalDir, StorageInit, StorageReadFailed, StorageWriteFailed,
};
use crate::TransportResult;

/// Content type of every published document.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Where a catalog is read from or written to, as classified from its URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Local(PathBuf),
    S3 {
        bucket: String,
        region: Option<String>,
        prefix: String,
    },
    Http(Url),
}

impl StoreLocation {
    /// Classifies a destination.
    ///
    /// - bare paths and `file://` URLs are local directories
    /// - `s3://bucket/prefix` and virtual-hosted `https://bucket.s3[.region].amazonaws.com/prefix` are S3
    /// - any other `http(s)://` URL is a plain HTTP store
    pub fn parse(uri: &str) -> TransportResult<Self> {
        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(Self::Local(PathBuf::from(uri)));
            }
            Err(e) => return Err(InvalidUri(uri.to_string(), e.to_string())),
        };
        let prefix = url.path().trim_matches('/').to_string();
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|()| InvalidUri(uri.to_string(), "not a local path".to_string())),
            "s3" => {
                let bucket = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| InvalidUri(uri.to_string(), "missing bucket".to_string()))?;
                Ok(Self::S3 {
                    bucket: bucket.to_string(),
                    region: None,
                    prefix,
                })
            }
            "http" | "https" => Ok(match url.host_str().and_then(virtual_hosted_bucket) {
                Some((bucket, region)) => Self::S3 {
                    bucket,
                    region,
                    prefix,
                },
                None => Self::Http(url),
            }),
            // Windows drive letters parse as single-letter schemes
            scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(uri))),
            scheme => Err(InvalidUri(
                uri.to_string(),
                format!("unsupported scheme `{scheme}`"),
            )),
        }
    }
}

/// Extracts the bucket and optional region from `bucket.s3.amazonaws.com`,
/// `bucket.s3.<region>.amazonaws.com` or `bucket.s3-<region>.amazonaws.com`.
fn virtual_hosted_bucket(host: &str) -> Option<(String, Option<String>)> {
    let rest = host.strip_suffix(".amazonaws.com")?;
    let (bucket, service) = rest.split_once('.')?;
    if bucket.is_empty() {
        return None;
    }
    let region = if service == "s3" {
        None
    } else if let Some(region) = service.strip_prefix("s3.") {
        Some(region.to_string())
    } else if let Some(region) = service.strip_prefix("s3-") {
        Some(region.to_string())
    } else {
        return None;
    };
    Some((bucket.to_string(), region))
}

#[derive(Debug)]
enum Backend {
    Local(LocalFileSystem),
    S3(AmazonS3),
    Http(HttpStore),
    Memory(InMemory),
}

/// Reads and writes catalog documents relative to a root location.
#[derive(Debug)]
pub struct DocumentStore {
    backend: Backend,
    prefix: String,
    base_url: String,
}

impl DocumentStore {
    /// Opens an existing location for reading.
    pub fn open(uri: &str) -> TransportResult<Self> {
        Self::from_location(uri, StoreLocation::parse(uri)?, false)
    }

    /// Opens a location for publishing, creating a local directory if needed.
    pub fn create(uri: &str) -> TransportResult<Self> {
        Self::from_location(uri, StoreLocation::parse(uri)?, true)
    }

    /// A store kept in memory, used for dry runs and tests.
    #[must_use]
    pub fn in_memory(base_url: &str) -> Self {
        Self {
            backend: Backend::Memory(InMemory::new()),
            prefix: String::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// An in-memory store that links documents as if they were published to `uri`.
    ///
    /// Nothing is created at `uri`.
    pub fn dry_run(uri: &str) -> TransportResult<Self> {
        let base_url = match StoreLocation::parse(uri)? {
            StoreLocation::Local(dir) => directory_url(uri, &dir)?,
            StoreLocation::S3 { .. } => uri.to_string(),
            StoreLocation::Http(url) => url.to_string(),
        };
        Ok(Self::in_memory(&base_url))
    }

    fn from_location(uri: &str, location: StoreLocation, create: bool) -> TransportResult<Self> {
        let init = |e| StorageInit(uri.to_string(), e);
        let (backend, prefix, base_url) = match location {
            StoreLocation::Local(dir) => {
                if create {
                    create_dir_all(&dir).map_err(|e| LocalDir(e, dir.clone()))?;
                }
                let base = directory_url(uri, &dir)?;
                let fs = LocalFileSystem::new_with_prefix(&dir).map_err(init)?;
                (Backend::Local(fs), String::new(), base)
            }
            StoreLocation::S3 {
                bucket,
                region,
                prefix,
            } => {
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                let s3 = builder.build().map_err(init)?;
                (Backend::S3(s3), prefix, uri.to_string())
            }
            StoreLocation::Http(url) => {
                let http = HttpBuilder::new()
                    .with_url(url.as_str())
                    .build()
                    .map_err(init)?;
                (Backend::Http(http), String::new(), url.to_string())
            }
        };
        debug!("Opened document store {base_url}");
        Ok(Self {
            backend,
            prefix,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Public form of the store root, without a trailing slash. Absolute links start with it.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn supports_attributes(&self) -> bool {
        !matches!(self.backend, Backend::Local(_))
    }

    /// Full object path of a document, rejected if it is not a valid store path.
    pub(crate) fn location(&self, path: &str) -> TransportResult<Path> {
        let full = if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{path}", self.prefix)
        };
        Path::parse(&full).map_err(|e| InvalidPath(full, e))
    }

    fn put_options(&self) -> PutOptions {
        let mut attributes = Attributes::new();
        if self.supports_attributes() {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(JSON_CONTENT_TYPE),
            );
        }
        PutOptions {
            mode: PutMode::Overwrite,
            attributes,
            ..Default::default()
        }
    }

    pub async fn write(&self, path: &str, data: Vec<u8>) -> TransportResult<()> {
        let location = self.location(path)?;
        let payload = PutPayload::from(data);
        let opts = self.put_options();
        match &self.backend {
            Backend::Local(fs) => fs.put_opts(&location, payload, opts).await,
            Backend::S3(s3) => s3.put_opts(&location, payload, opts).await,
            Backend::Http(http) => http.put_opts(&location, payload, opts).await,
            Backend::Memory(mem) => mem.put_opts(&location, payload, opts).await,
        }
        .map_err(|e| StorageWriteFailed(location.to_string(), e))?;
        Ok(())
    }

    pub async fn read(&self, path: &str) -> TransportResult<Vec<u8>> {
        let location = self.location(path)?;
        let failed = |e| StorageReadFailed(location.to_string(), e);
        let opts = GetOptions::default();
        let result = match &self.backend {
            Backend::Local(fs) => fs.get_opts(&location, opts).await,
            Backend::S3(s3) => s3.get_opts(&location, opts).await,
            Backend::Http(http) => http.get_opts(&location, opts).await,
            Backend::Memory(mem) => mem.get_opts(&location, opts).await,
        }
        .map_err(failed)?;
        let bytes = result.bytes().await.map_err(failed)?;
        Ok(bytes.to_vec())
    }

    /// Paths of all objects under `path`, relative to the store root and sorted.
    pub async fn list(&self, path: &str) -> TransportResult<Vec<String>> {
        let location = self.location(path)?;
        let failed = |e| StorageReadFailed(location.to_string(), e);
        let objects: Vec<ObjectMeta> = match &self.backend {
            Backend::Local(fs) => fs.list(Some(&location)).try_collect().await,
            Backend::S3(s3) => s3.list(Some(&location)).try_collect().await,
            Backend::Http(http) => http.list(Some(&location)).try_collect().await,
            Backend::Memory(mem) => mem.list(Some(&location)).try_collect().await,
        }
        .map_err(failed)?;

        let mut paths: Vec<String> = objects
            .into_iter()
            .map(|meta| {
                let full = meta.location.to_string();
                match full.strip_prefix(&self.prefix) {
                    Some(rest) if !self.prefix.is_empty() => rest.trim_start_matches('/').to_string(),
                    _ => full,
                }
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    #[cfg(test)]
    pub(crate) async fn content_type(&self, path: &str) -> Option<String> {
        let Backend::Memory(mem) = &self.backend else {
            return None;
        };
        let location = self.location(path).ok()?;
        let result = mem.get_opts(&location, GetOptions::default()).await.ok()?;
        result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string())
    }
}

/// `file://` URL of a local directory, which need not exist yet.
fn directory_url(uri: &str, dir: &FsPath) -> TransportResult<String> {
    let absolute = absolute(dir).map_err(|e| LocalDir(e, dir.to_path_buf()))?;
    Url::from_directory_path(&absolute)
        .map(String::from)
        .map_err(|()| InvalidUri(uri.to_string(), "not an absolute path".to_string()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/tmp/catalog", StoreLocation::Local("/tmp/catalog".into()))]
    #[case("out/catalog", StoreLocation::Local("out/catalog".into()))]
    #[case("file:///tmp/catalog", StoreLocation::Local("/tmp/catalog".into()))]
    #[case("s3://bucket/stac/spot", StoreLocation::S3 { bucket: "bucket".into(), region: None, prefix: "stac/spot".into() })]
    #[case("s3://bucket", StoreLocation::S3 { bucket: "bucket".into(), region: None, prefix: String::new() })]
    #[case(
        "https://geobase-spot.s3.amazonaws.com/stac/",
        StoreLocation::S3 { bucket: "geobase-spot".into(), region: None, prefix: "stac".into() }
    )]
    #[case(
        "https://geobase.s3.ca-central-1.amazonaws.com/stac",
        StoreLocation::S3 { bucket: "geobase".into(), region: Some("ca-central-1".into()), prefix: "stac".into() }
    )]
    #[case(
        "http://geobase.s3-us-west-2.amazonaws.com/a/b",
        StoreLocation::S3 { bucket: "geobase".into(), region: Some("us-west-2".into()), prefix: "a/b".into() }
    )]
    #[case("https://example.com/dav/stac", StoreLocation::Http("https://example.com/dav/stac".parse().unwrap()))]
    #[case("https://ec2.amazonaws.com/x", StoreLocation::Http("https://ec2.amazonaws.com/x".parse().unwrap()))]
    fn classify(#[case] uri: &str, #[case] expected: StoreLocation) {
        assert_eq!(StoreLocation::parse(uri).unwrap(), expected);
    }

    #[rstest]
    #[case("ftp://example.com/catalog")]
    #[case("s3:///no-bucket")]
    fn reject(#[case] uri: &str) {
        assert!(StoreLocation::parse(uri).is_err(), "{uri}");
    }

    #[tokio::test]
    async fn memory_write_sets_json_type() {
        let store = DocumentStore::in_memory("memory://catalog/");
        assert_eq!(store.base_url(), "memory://catalog");
        store
            .write("a/catalog.json", b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(store.read("a/catalog.json").await.unwrap(), b"{}");
        assert_eq!(
            store.content_type("a/catalog.json").await.as_deref(),
            Some(JSON_CONTENT_TYPE)
        );
    }

    #[tokio::test]
    async fn missing_document() {
        let store = DocumentStore::in_memory("memory://catalog");
        let err = store.read("catalog.json").await.unwrap_err();
        assert!(matches!(err, StorageReadFailed(..)), "{err:?}");
    }

    #[tokio::test]
    async fn local_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/catalog");
        let store = DocumentStore::create(root.to_str().unwrap()).unwrap();
        assert!(store.base_url().starts_with("file://"));
        store.write("x/y.json", b"[1]".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(root.join("x/y.json")).unwrap(), b"[1]");

        let reopened = DocumentStore::open(root.to_str().unwrap()).unwrap();
        assert_eq!(reopened.read("x/y.json").await.unwrap(), b"[1]");
        assert_eq!(reopened.list("x").await.unwrap(), vec!["x/y.json"]);
    }

    #[test]
    fn dry_run_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not-yet");
        let store = DocumentStore::dry_run(root.to_str().unwrap()).unwrap();
        assert!(store.base_url().starts_with("file://"));
        assert!(store.base_url().ends_with("/not-yet"));
        assert!(!root.exists());

        let store = DocumentStore::dry_run("https://geobase-spot.s3.amazonaws.com/").unwrap();
        assert_eq!(store.base_url(), "https://geobase-spot.s3.amazonaws.com");
    }

    #[test]
    fn s3_from_uri() {
        let store = DocumentStore::create("s3://bucket/stac/spot").unwrap();
        assert_eq!(store.base_url(), "s3://bucket/stac/spot");
        assert!(store.supports_attributes());
        assert_eq!(
            store.location("catalog.json").unwrap().as_ref(),
            "stac/spot/catalog.json"
        );
    }
}
