// src/config/mod.rs

//! Configuration loading and validation for runcmd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate steps and placeholders (`validate.rs`).
//! - Parse duration strings (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{config_root_dir, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, DefaultsSection, RawConfigFile, ResolvedStep, SinkSpec, StepConfig,
};
pub use validate::validate_config;
