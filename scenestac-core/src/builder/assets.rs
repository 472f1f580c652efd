use std::collections::BTreeMap;

use crate::BuildError::{DuplicateAssetKey, MissingAssetSuffix};
use crate::BuildResult;
use crate::model::{Asset, THUMBNAIL_KEY};
use crate::resolver::SceneAssets;

/// Width of the image-product code at the end of a Geobase file name, e.g. `m20_lcc00`.
pub const DEFAULT_ASSET_KEY_LEN: usize = 9;

pub const ZIP: &str = "application/zip";
pub const GEOTIFF: &str = "image/tiff; application=geotiff";
pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// File name of a URL, ignoring any query string or fragment.
fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Splits a file name into its stem and lowercase extension.
fn split_extension(name: &str) -> (&str, Option<String>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_ascii_lowercase())),
        _ => (name, None),
    }
}

/// The image-product code of an asset: the last `len` characters of the file name
/// without its extension.
pub fn asset_key(url: &str, len: usize) -> BuildResult<String> {
    let (stem, _) = split_extension(file_name(url));
    let start = len
        .checked_sub(1)
        .and_then(|n| stem.char_indices().rev().nth(n))
        .map(|(i, _)| i)
        .ok_or_else(|| MissingAssetSuffix(url.to_string(), len))?;
    Ok(stem[start..].to_string())
}

/// Media type implied by the file extension of a URL.
#[must_use]
pub fn media_type_for(url: &str) -> &'static str {
    let (_, ext) = split_extension(file_name(url));
    match ext.as_deref() {
        Some("zip") => ZIP,
        Some("tif" | "tiff") => GEOTIFF,
        Some("jpg" | "jpeg") => JPEG,
        Some("png") => PNG,
        _ => OCTET_STREAM,
    }
}

/// Builds the asset map of one item: one entry per resolved file plus the thumbnail.
pub fn build_assets(
    scene_id: &str,
    resolved: &SceneAssets,
    key_len: usize,
) -> BuildResult<BTreeMap<String, Asset>> {
    let mut assets = BTreeMap::new();
    for url in &resolved.assets {
        let key = asset_key(url, key_len)?;
        if key == THUMBNAIL_KEY || assets.contains_key(&key) {
            return Err(DuplicateAssetKey {
                id: scene_id.to_string(),
                key,
                url: url.clone(),
            });
        }
        let asset = Asset {
            href: url.clone(),
            media_type: Some(media_type_for(url).to_string()),
            title: None,
            roles: vec!["data".to_string()],
        };
        assets.insert(key, asset);
    }
    let thumbnail = Asset {
        href: resolved.thumbnail.clone(),
        media_type: Some(media_type_for(&resolved.thumbnail).to_string()),
        title: None,
        roles: vec![THUMBNAIL_KEY.to_string()],
    };
    assets.insert(THUMBNAIL_KEY.to_string(), thumbnail);
    Ok(assets)
}
