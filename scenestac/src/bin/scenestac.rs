use std::env;

use clap::Parser;
use log::log_enabled;
use scenestac::ScenestacError::SummaryError;
use scenestac::args::{Args, BuildArgs, Command, InspectArgs};
use scenestac::config::read_config;
use scenestac::logging::progress::{IngestProgress, is_interactive};
use scenestac::logging::{FORMAT_ENV_VAR, ensure_core_log_level_matches, init_tracing};
use scenestac::{ScenestacResult, build_catalog, inspect_catalog};
use scenestac_core::IngestObserver as _;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn build(args: BuildArgs) -> ScenestacResult<()> {
    info!("Starting scenestac v{VERSION}");

    let env = subst::Env;
    let mut config = if let Some(cfg_filename) = &args.config {
        info!("Using {}", cfg_filename.display());
        read_config(Some(cfg_filename), &env)?
    } else {
        info!("Config file is not specified, using the built-in Geobase SPOT layout");
        read_config(None, &env)?
    };
    args.merge_into_config(&mut config);
    config.finalize()?;

    if let Some(file_name) = &args.save_config {
        config.save_to_file(file_name)?;
    } else {
        info!("Use --save-config to save or print the effective configuration.");
    }

    // the progress total is only known once the index is open
    let mut progress = None;
    let mut observer = |done: usize, total: usize| {
        let bar = progress.get_or_insert_with(|| IngestProgress::new(total));
        bar.on_record(done, total);
    };
    let outcome = build_catalog(&config, args.dry_run, &mut observer).await?;
    if let Some(progress) = &progress {
        progress.finish();
    }
    info!(
        "Catalog {} is available at {}/catalog.json",
        outcome.tree.root().id,
        outcome.base_url
    );
    Ok(())
}

async fn inspect(args: InspectArgs) -> ScenestacResult<()> {
    let summary = inspect_catalog(&args.catalog).await?;
    let yaml = serde_yaml::to_string(&summary).map_err(SummaryError)?;
    println!("{yaml}");
    Ok(())
}

async fn start(args: Args) -> ScenestacResult<()> {
    match args.command {
        Command::Build(build_args) => build(build_args).await,
        Command::Inspect(inspect_args) => inspect(inspect_args).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let filter = ensure_core_log_level_matches(env::var("RUST_LOG").ok(), "scenestac=");
    let use_progress = matches!(args.command, Command::Build(_)) && is_interactive();
    if let Err(e) = init_tracing(&filter, env::var(FORMAT_ENV_VAR).ok(), use_progress) {
        eprintln!("{e}");
    }

    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
