//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! Output is controlled by:
//! - [`EnvFilter`]: log level filtering, read from `RUST_LOG`
//! - [`LogFormat`]: output format (json, full, compact, bare, pretty), read from `SCENESTAC_FORMAT`

use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;

use crate::ScenestacError::LoggingError;
use crate::ScenestacResult;

pub mod progress;

/// Environment variable selecting the [`LogFormat`].
pub const FORMAT_ENV_VAR: &str = "SCENESTAC_FORMAT";

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, single-line logs.
    Full,

    /// A variant of the full format, optimized for short line lengths (default).
    Compact,

    /// Compact logs without timestamps, targets or ANSI colors.
    Bare,

    /// Multi-line logs for local development.
    Pretty,

    /// Newline-delimited JSON logs.
    Json,
}

impl LogFormat {
    fn dispatch(self, env_filter: EnvFilter) -> Dispatch {
        let fmt = tracing_subscriber::fmt().with_env_filter(env_filter);
        match self {
            Self::Full => fmt.with_span_events(FmtSpan::NONE).finish().into(),
            Self::Compact => fmt.compact().with_span_events(FmtSpan::NONE).finish().into(),
            Self::Pretty => fmt.pretty().finish().into(),
            Self::Bare => fmt
                .compact()
                .with_span_events(FmtSpan::NONE)
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .finish()
                .into(),
            Self::Json => fmt.json().with_span_events(FmtSpan::NONE).finish().into(),
        }
    }

    /// Same as [`Self::dispatch`], but log lines are printed above the progress bars.
    fn dispatch_with_progress(self, env_filter: EnvFilter) -> Dispatch {
        use tracing_indicatif::IndicatifLayer;
        use tracing_subscriber::fmt::layer as fmt_layer;

        let registry = tracing_subscriber::registry().with(env_filter);

        // every arm builds its own indicatif layer, its type depends on the layers below it
        match self {
            Self::Full => {
                let indicatif_layer = IndicatifLayer::new();
                registry
                    .with(
                        fmt_layer()
                            .with_span_events(FmtSpan::NONE)
                            .with_writer(indicatif_layer.get_stderr_writer()),
                    )
                    .with(indicatif_layer)
                    .into()
            }
            Self::Compact => {
                let indicatif_layer = IndicatifLayer::new();
                registry
                    .with(
                        fmt_layer()
                            .compact()
                            .with_span_events(FmtSpan::NONE)
                            .with_writer(indicatif_layer.get_stderr_writer()),
                    )
                    .with(indicatif_layer)
                    .into()
            }
            Self::Pretty => {
                let indicatif_layer = IndicatifLayer::new();
                registry
                    .with(
                        fmt_layer()
                            .pretty()
                            .with_writer(indicatif_layer.get_stderr_writer()),
                    )
                    .with(indicatif_layer)
                    .into()
            }
            Self::Bare => {
                let indicatif_layer = IndicatifLayer::new();
                registry
                    .with(
                        fmt_layer()
                            .compact()
                            .with_span_events(FmtSpan::NONE)
                            .without_time()
                            .with_target(false)
                            .with_ansi(false)
                            .with_writer(indicatif_layer.get_stderr_writer()),
                    )
                    .with(indicatif_layer)
                    .into()
            }
            Self::Json => {
                let indicatif_layer = IndicatifLayer::new();
                registry
                    .with(
                        fmt_layer()
                            .json()
                            .with_span_events(FmtSpan::NONE)
                            .with_writer(indicatif_layer.get_stderr_writer()),
                    )
                    .with(indicatif_layer)
                    .into()
            }
        }
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" | "verbose" => Ok(Self::Pretty),
            "bare" => Ok(Self::Bare),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: json, full, compact, bare or pretty"
            )),
        }
    }
}

/// Forwards `log` records of dependencies into `tracing`, capped at the filter's level.
fn init_log_bridge(env_filter: &EnvFilter) -> ScenestacResult<()> {
    let mut log_builder = tracing_log::LogTracer::builder()
        .with_interest_cache(tracing_log::InterestCacheConfig::default());
    if let Some(Some(max_level)) = env_filter.max_level_hint().map(LevelFilter::into_level) {
        let max_level = match max_level {
            Level::DEBUG => log::LevelFilter::Debug,
            Level::INFO => log::LevelFilter::Info,
            Level::WARN => log::LevelFilter::Warn,
            Level::ERROR => log::LevelFilter::Error,
            Level::TRACE => log::LevelFilter::Trace,
        };
        log_builder = log_builder.with_max_level(max_level);
    }
    log_builder
        .init()
        .map_err(|e| LoggingError(format!("log bridge already set: {e}")))
}

/// Installs the global tracing subscriber.
///
/// An invalid `filter` falls back to `debug`, an invalid `format` to [`LogFormat::default`].
/// With `use_progress`, log lines are kept above the progress bar.
pub fn init_tracing(filter: &str, format: Option<String>, use_progress: bool) -> ScenestacResult<()> {
    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!("Warning: Invalid filter string '{filter}' passed, using 'debug' instead");
        EnvFilter::new("debug")
    });

    let log_format = format
        .and_then(|s| {
            s.parse::<LogFormat>()
                .map_err(|e| {
                    eprintln!("Warning: {e}");
                    eprintln!(
                        "Falling back to default format ({:?})",
                        LogFormat::default()
                    );
                })
                .ok()
        })
        .unwrap_or_default();

    init_log_bridge(&env_filter)?;
    let dispatch = if use_progress {
        log_format.dispatch_with_progress(env_filter)
    } else {
        log_format.dispatch(env_filter)
    };
    // `SubscriberInitExt::init` would install a second `LogTracer`
    tracing::dispatcher::set_global_default(dispatch).map_err(|e| LoggingError(e.to_string()))
}

/// Mirrors the level given for the `replacement` target (e.g. `scenestac=`) onto
/// `scenestac_core`, unless the filter sets that crate explicitly.
#[must_use]
pub fn ensure_core_log_level_matches(env_filter: Option<String>, replacement: &'static str) -> String {
    let Some(rust_log) = env_filter else {
        return format!("{replacement}info,scenestac_core=info");
    };
    if !rust_log.contains(replacement) || rust_log.contains("scenestac_core=") {
        return rust_log;
    }
    match rust_log
        .split(',')
        .find_map(|s| s.strip_prefix(replacement))
    {
        Some(level) => format!("{rust_log},scenestac_core={level}"),
        None => rust_log,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("JSONL", LogFormat::Json)]
    #[case("bare", LogFormat::Bare)]
    #[case("Verbose", LogFormat::Pretty)]
    #[case("compact", LogFormat::Compact)]
    #[case("full", LogFormat::Full)]
    fn formats(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(text.parse::<LogFormat>().unwrap(), expected);
    }

    #[rstest]
    fn every_format_builds_a_subscriber(
        #[values(
            LogFormat::Full,
            LogFormat::Compact,
            LogFormat::Pretty,
            LogFormat::Bare,
            LogFormat::Json
        )]
        format: LogFormat,
        #[values(false, true)] use_progress: bool,
    ) {
        let env_filter = EnvFilter::new("scenestac=debug");
        let dispatch = if use_progress {
            format.dispatch_with_progress(env_filter)
        } else {
            format.dispatch(env_filter)
        };
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!(target: "scenestac", "format {format:?} is usable");
        });
    }

    #[test]
    fn unknown_format() {
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.starts_with("Invalid log format 'xml'"));
    }

    #[rstest]
    #[case(None, "scenestac=info,scenestac_core=info")]
    #[case(Some("scenestac=debug"), "scenestac=debug,scenestac_core=debug")]
    #[case(Some("warn,scenestac=trace"), "warn,scenestac=trace,scenestac_core=trace")]
    #[case(Some("scenestac=debug,scenestac_core=warn"), "scenestac=debug,scenestac_core=warn")]
    #[case(Some("object_store=debug"), "object_store=debug")]
    fn core_level_follows_app_level(#[case] rust_log: Option<&str>, #[case] expected: &str) {
        assert_eq!(
            ensure_core_log_level_matches(rust_log.map(ToString::to_string), "scenestac="),
            expected
        );
    }
}
