use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Parser, Subcommand};
use scenestac_core::LinkMode;

use crate::config::Config;

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, PartialEq)]
#[command(
    about = "Builds a static STAC catalog from a footprint index of remote-sensing scenes",
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=scenestac=debug.\nUse SCENESTAC_FORMAT environment variable to control output format: compact (default), full, bare, pretty, or json.",
    styles = HELP_STYLES
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Build the catalog and publish it to the destination.
    Build(BuildArgs),
    /// Read a published catalog and print a summary of its contents.
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug, Clone, PartialEq, Default)]
pub struct BuildArgs {
    /// Path to config file. Without one, the built-in Geobase SPOT layout is used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Save the effective config to a file or use "-" to print to stdout.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
    /// `GeoJSON` footprint index, one feature per scene.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// CRS of the input, e.g. EPSG:3979, overriding the one declared in the file.
    #[arg(long, value_name = "CRS")]
    pub source_crs: Option<String>,
    /// Directory, s3://bucket/prefix or http(s) URL to publish to.
    #[arg(short, long, value_name = "URI")]
    pub destination: Option<String>,
    /// Write links relative to each document, or as absolute URLs.
    #[arg(long, value_name = "MODE")]
    pub link_mode: Option<LinkMode>,
    /// Number of documents written at the same time.
    #[arg(short = 'j', long, value_name = "N")]
    pub write_concurrency: Option<usize>,
    /// JSON manifest of scene downloads.
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Thumbnail URL with an `{id}` placeholder.
    #[arg(long, value_name = "URL")]
    pub thumbnail_template: Option<String>,
    /// Build, render and read back the catalog in memory without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl BuildArgs {
    /// Command line values win over the config file.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(crs) = &self.source_crs {
            config.source_crs = Some(crs.clone());
        }
        if let Some(destination) = &self.destination {
            config.destination = Some(destination.clone());
        }
        if let Some(mode) = self.link_mode {
            config.link_mode = mode;
        }
        if let Some(n) = self.write_concurrency {
            config.write_concurrency = Some(n);
        }
        if let Some(manifest) = &self.manifest {
            config.resolver.manifest = Some(manifest.clone());
        }
        if let Some(template) = &self.thumbnail_template {
            config.resolver.thumbnail_template = Some(template.clone());
        }
    }
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// Location of the published catalog: a directory, s3://bucket/prefix or an http(s) URL.
    pub catalog: String,
}
