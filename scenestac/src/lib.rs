#![doc = include_str!("../README.md")]

pub mod args;
pub mod config;

mod error;
pub use error::{ScenestacError, ScenestacResult};

pub mod logging;

mod run;
pub use run::{BuildOutcome, build_catalog, inspect_catalog};
