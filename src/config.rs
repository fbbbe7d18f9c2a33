//! Project configuration module.
//!
//! Handles loading, validating, and merging `museum.toml`. Stock defaults are
//! overridden by a single optional file in the project root.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── museum.toml              # Overrides stock defaults
//! ├── demos/                   # content_dir
//! │   └── ...
//! └── packages/museum-app/     # gallery.dir
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_dir = "demos"          # Scanned for items
//! output_dir = "dist"            # Cleared at the start of every build
//! collection = "demos"           # Items land in <output_dir>/<collection>/<slug>/
//! index_file = "index.json"      # Relative to output_dir
//!
//! [web_app]
//! install = ["pnpm", "install"]
//! build = ["pnpm", "build"]
//! base_path_env = "VITE_BASE_PATH"
//! output_dirs = ["dist", "build", "out"]
//!
//! [gallery]
//! dir = "packages/museum-app"
//! build = ["pnpm", "build"]
//! public_dir = "public"
//!
//! [processing]
//! max_processes = 4              # Max metadata workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Override just the values you want:
//!
//! ```toml
//! [web_app]
//! install = ["npm", "ci"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "museum.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `museum.toml`.
///
/// Paths are relative to the project root; see the `*_path` helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MuseumConfig {
    /// Directory whose sub-directories are the items.
    pub content_dir: String,
    /// Output root. Owned by the pipeline and cleared on every build.
    pub output_dir: String,
    /// Output sub-directory for items, and the public path segment.
    pub collection: String,
    /// Index artifact path, relative to `output_dir`.
    pub index_file: String,
    /// External toolchain for web-app items.
    pub web_app: WebAppConfig,
    /// The gallery application consuming the index.
    pub gallery: GalleryConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for MuseumConfig {
    fn default() -> Self {
        Self {
            content_dir: "demos".to_string(),
            output_dir: "dist".to_string(),
            collection: "demos".to_string(),
            index_file: "index.json".to_string(),
            web_app: WebAppConfig::default(),
            gallery: GalleryConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl MuseumConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Validation(
                "collection must not be empty".into(),
            ));
        }
        if self.collection.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "collection must be a single path segment".into(),
            ));
        }
        if self.index_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "index_file must not be empty".into(),
            ));
        }
        for (key, command) in [
            ("web_app.install", &self.web_app.install),
            ("web_app.build", &self.web_app.build),
            ("gallery.build", &self.gallery.build),
        ] {
            if command.is_empty() || command[0].trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{key} must name a program"
                )));
            }
        }
        if self.web_app.output_dirs.is_empty() {
            return Err(ConfigError::Validation(
                "web_app.output_dirs must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn content_path(&self, root: &Path) -> PathBuf {
        root.join(&self.content_dir)
    }

    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir)
    }

    pub fn index_path(&self, root: &Path) -> PathBuf {
        self.output_path(root).join(&self.index_file)
    }

    pub fn gallery_path(&self, root: &Path) -> PathBuf {
        root.join(&self.gallery.dir)
    }
}

/// External commands used to build web-app items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebAppConfig {
    /// Dependency install. A failure here is only a warning.
    pub install: Vec<String>,
    /// Build command. Overridden per item by `config.buildCommand`.
    pub build: Vec<String>,
    /// Environment variable carrying the public base path `/<collection>/<slug>/`.
    pub base_path_env: String,
    /// Build output directories, probed in order.
    pub output_dirs: Vec<String>,
}

impl Default for WebAppConfig {
    fn default() -> Self {
        Self {
            install: vec!["pnpm".to_string(), "install".to_string()],
            build: vec!["pnpm".to_string(), "build".to_string()],
            base_path_env: "VITE_BASE_PATH".to_string(),
            output_dirs: vec!["dist".to_string(), "build".to_string(), "out".to_string()],
        }
    }
}

/// The gallery front-end application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Application directory, relative to the project root. Skipped if absent.
    pub dir: String,
    pub build: Vec<String>,
    /// Where the index is copied before the gallery build, relative to `dir`.
    pub public_dir: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            dir: "packages/museum-app".to_string(),
            build: vec!["pnpm".to_string(), "build".to_string()],
            public_dir: "public".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of metadata-resolution workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MuseumConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `museum.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MuseumConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MuseumConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `museum.toml` in the project root.
pub fn load_config(root: &Path) -> Result<MuseumConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `museum.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Demo Museum Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to this file.
# Unknown keys will cause an error.

# Directory whose sub-directories are scanned as items.
content_dir = "demos"

# Output root. Cleared and recreated at the start of every build.
output_dir = "dist"

# Items are built into <output_dir>/<collection>/<slug>/ and served from
# /<collection>/<slug>/.
collection = "demos"

# Index artifact consumed by the gallery, relative to output_dir.
index_file = "index.json"

# ---------------------------------------------------------------------------
# Web-app items
# ---------------------------------------------------------------------------
[web_app]
# Run in the item directory when it has a package.json.
# A failing install is reported as a warning; the build still runs.
install = ["pnpm", "install"]

# A failing build fails the item. Items can override it with
# config.buildCommand in demo.json.
build = ["pnpm", "build"]

# Environment variable set for the build, holding /<collection>/<slug>/.
base_path_env = "VITE_BASE_PATH"

# Directories probed, in order, for the build output.
output_dirs = ["dist", "build", "out"]

# ---------------------------------------------------------------------------
# Gallery application
# ---------------------------------------------------------------------------
[gallery]
# Skipped when the directory does not exist.
dir = "packages/museum-app"

# A failing gallery build fails the whole run.
build = ["pnpm", "build"]

# The index is copied here (relative to dir) before the gallery build.
public_dir = "public"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for metadata resolution. Item builds always run
# one at a time. Omit to use all CPU cores.
# max_processes = 4
"##
}
