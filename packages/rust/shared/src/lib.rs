//! Shared types, error model, and configuration for patchdown.
//!
//! This crate is the foundation depended on by the engine and the CLI.
//! It provides:
//! - [`PatchdownError`], the unified error type
//! - Wire types ([`Delta`], [`Operation`], [`TargetSpec`], [`Kind`])
//! - Configuration ([`EngineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ComponentConfig, EngineConfig, MarkdownConfig, WrapperConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_config,
};
pub use error::{Candidate, PatchdownError, Result};
pub use types::{Delta, Kind, OPERATION_NAMES, Operation, TargetSpec};
