use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use scenestac_core::{CatalogLayout, LinkMode};
use serde::{Deserialize, Serialize};
use subst::VariableMap;
use tracing::{info, warn};

use crate::ScenestacError::{
    ConfigLoadError, ConfigParseError, ConfigSerializeError, ConfigWriteError,
    InvalidConcurrency, NoSensors,
};
use crate::ScenestacResult;

mod resolver;
pub use resolver::ResolverConfig;

/// The Geobase SPOT orthoimage catalog, used when no config file is given.
pub const DEFAULT_CONFIG: &str = include_str!("geobase-spot.yaml");

/// Name reported for the built-in configuration.
pub const DEFAULT_CONFIG_NAME: &str = "<built-in geobase-spot.yaml>";

pub type UnrecognizedValues = HashMap<String, serde_yaml::Value>;
pub type UnrecognizedKeys = HashSet<String>;

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `GeoJSON` footprint index, one feature per scene.
    pub input: Option<PathBuf>,

    /// CRS of the input, e.g. `EPSG:3979`. Overrides the CRS declared in the file.
    pub source_crs: Option<String>,

    /// Where the catalog is published: a directory, `s3://bucket/prefix` or an http(s) URL.
    pub destination: Option<String>,

    #[serde(default)]
    pub link_mode: LinkMode,

    /// Number of documents written at the same time. Defaults to 1.
    pub write_concurrency: Option<usize>,

    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Shape and static metadata of the catalog.
    pub catalog: CatalogLayout,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl Config {
    #[must_use]
    pub fn write_concurrency(&self) -> usize {
        self.write_concurrency.unwrap_or(1)
    }

    /// Validates the config and warns about every key it does not know.
    pub fn finalize(&mut self) -> ScenestacResult<UnrecognizedKeys> {
        let mut keys = UnrecognizedKeys::new();
        copy_unrecognized_keys_from_config(&mut keys, "", &self.unrecognized);
        copy_unrecognized_keys_from_config(&mut keys, "resolver.", &self.resolver.unrecognized);
        for key in &keys {
            warn!("Ignoring unrecognized configuration key '{key}'. Please check your configuration file for typos.");
        }

        if self.write_concurrency == Some(0) {
            return Err(InvalidConcurrency);
        }
        if self.catalog.sensors.is_empty() {
            return Err(NoSensors);
        }
        Ok(keys)
    }

    pub fn save_to_file(&self, file_name: &Path) -> ScenestacResult<()> {
        let yaml = serde_yaml::to_string(&self).map_err(ConfigSerializeError)?;
        if file_name.as_os_str() == OsStr::new("-") {
            info!("Current configuration:");
            println!("\n\n{yaml}\n");
            Ok(())
        } else {
            info!(
                "Saving config to {}, use --config to load it",
                file_name.display()
            );
            fs::write(file_name, yaml).map_err(|e| ConfigWriteError(e, file_name.to_path_buf()))
        }
    }
}

fn copy_unrecognized_keys_from_config(
    result: &mut UnrecognizedKeys,
    prefix: &str,
    unrecognized: &UnrecognizedValues,
) {
    result.extend(unrecognized.keys().map(|k| format!("{prefix}{k}")));
}

/// Reads a config file, or the built-in Geobase config if `file_name` is `None`.
pub fn read_config<'a, M>(file_name: Option<&Path>, env: &'a M) -> ScenestacResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let Some(file_name) = file_name else {
        return parse_config(DEFAULT_CONFIG, env, Path::new(DEFAULT_CONFIG_NAME));
    };
    let contents =
        fs::read_to_string(file_name).map_err(|e| ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ScenestacResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env).map_err(|e| ConfigParseError(e, file_name.into()))
}
