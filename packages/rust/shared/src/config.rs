//! Engine configuration for patchdown.
//!
//! User config lives at `~/.patchdown/patchdown.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PatchdownError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "patchdown.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".patchdown";

// ---------------------------------------------------------------------------
// Config structs (matching patchdown.toml schema)
// ---------------------------------------------------------------------------

/// Top-level engine config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Marker for the UI-chrome wrapper that is never indexed.
    #[serde(default)]
    pub wrapper: WrapperConfig,

    /// Component detection.
    #[serde(default)]
    pub components: ComponentConfig,

    /// Markdown → HTML conversion of inserted content.
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

/// `[wrapper]` section.
///
/// An element whose `attribute` equals `value` houses injected UI chrome;
/// it and its whole subtree are skipped by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperConfig {
    #[serde(default = "default_wrapper_attribute")]
    pub attribute: String,

    #[serde(default = "default_wrapper_value")]
    pub value: String,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            attribute: default_wrapper_attribute(),
            value: default_wrapper_value(),
        }
    }
}

fn default_wrapper_attribute() -> String {
    "id".into()
}
fn default_wrapper_value() -> String {
    "cms".into()
}

/// `[components]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Attribute whose value names the component type (e.g. `data-component="cta"`).
    #[serde(default = "default_component_attribute")]
    pub attribute: String,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            attribute: default_component_attribute(),
        }
    }
}

fn default_component_attribute() -> String {
    "data-component".into()
}

/// `[markdown]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Enable pipe tables in inserted Markdown.
    #[serde(default = "default_true")]
    pub tables: bool,

    /// Enable `~~strikethrough~~` in inserted Markdown.
    #[serde(default)]
    pub strikethrough: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: false,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.patchdown/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PatchdownError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.patchdown/patchdown.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the engine config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<EngineConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(EngineConfig::default());
    }

    load_config_from(&path)
}

/// Load the engine config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PatchdownError::io(path, e))?;

    let config: EngineConfig = toml::from_str(&content).map_err(|e| {
        PatchdownError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject configs whose markers could never match an element.
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    if config.wrapper.attribute.trim().is_empty() {
        return Err(PatchdownError::config("wrapper.attribute must not be empty"));
    }
    if config.components.attribute.trim().is_empty() {
        return Err(PatchdownError::config(
            "components.attribute must not be empty",
        ));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PatchdownError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = EngineConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PatchdownError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PatchdownError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
