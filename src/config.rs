//! Enhancement configuration.
//!
//! Handles loading, validating, and merging `slide-gal.toml`. Every key has a
//! stock default, so an empty (or missing) config file is a valid
//! configuration.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [gallery]
//! container_class = "branch-image"   # Class marking an image-group container
//! autoplay_interval_ms = 4000        # Delay between automatic advances
//! transition_ms = 450                # Slide transition duration (CSS)
//! active_dot_color = "#FFD700"
//! caption_background = "rgba(0,0,0,0.45)"
//!
//! [behaviors]
//! menu_toggle_id = "mobileMenuToggle"
//! nav_id = "mainNav"
//! cookie_notice_id = "cookie-notice"
//! cookie_accept_id = "cookie-accept"
//! cookie_flag = "bnuts_cookies_accepted"
//!
//! [processing]
//! max_processes = 4                  # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [gallery]
//! autoplay_interval_ms = 6000
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `slide-gal.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Slideshow markup, timing and colours.
    pub gallery: GalleryConfig,
    /// Element ids and storage key used by the site-wide behaviors.
    pub behaviors: BehaviorConfig,
    /// Parallel processing settings for directory builds.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gallery.container_class.trim().is_empty() {
            return Err(ConfigError::Validation(
                "gallery.container_class must not be empty".into(),
            ));
        }
        if self.gallery.container_class.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "gallery.container_class must be a single class name".into(),
            ));
        }
        if self.gallery.autoplay_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "gallery.autoplay_interval_ms must be greater than 0".into(),
            ));
        }
        if self.behaviors.cookie_flag.is_empty() {
            return Err(ConfigError::Validation(
                "behaviors.cookie_flag must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Slideshow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Class that marks an image-group container.
    pub container_class: String,
    /// Milliseconds between automatic advances.
    pub autoplay_interval_ms: u64,
    /// Duration of the slide transition in the generated CSS.
    pub transition_ms: u32,
    /// Background of the active dot.
    pub active_dot_color: String,
    /// Background of caption overlays and control buttons.
    pub caption_background: String,
}

impl GalleryConfig {
    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            container_class: "branch-image".to_string(),
            autoplay_interval_ms: 4000,
            transition_ms: 450,
            active_dot_color: "#FFD700".to_string(),
            caption_background: "rgba(0,0,0,0.45)".to_string(),
        }
    }
}

/// Site-wide behavior hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    /// Id of the element that opens and closes the mobile menu.
    pub menu_toggle_id: String,
    /// Id of the navigation element the toggle controls.
    pub nav_id: String,
    /// Id of the cookie notice banner.
    pub cookie_notice_id: String,
    /// Id of the button that accepts cookies.
    pub cookie_accept_id: String,
    /// Storage key of the "cookies accepted" flag.
    pub cookie_flag: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            menu_toggle_id: "mobileMenuToggle".to_string(),
            nav_id: "mainNav".to_string(),
            cookie_notice_id: "cookie-notice".to_string(),
            cookie_accept_id: "cookie-accept".to_string(),
            cookie_flag: "bnuts_cookies_accepted".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of pages enhanced in parallel.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is missing.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `slide-gal.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# slide-gal Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Slideshow galleries
# ---------------------------------------------------------------------------
[gallery]
# Every element with this class is turned into a slideshow of the <img>
# elements it contains. Containers without images are left alone.
container_class = "branch-image"

# Milliseconds between automatic advances. Autoplay pauses while the pointer
# or keyboard focus is inside the gallery.
autoplay_interval_ms = 4000

# Duration of the sliding transition, in milliseconds.
transition_ms = 450

# Colour of the dot marking the visible slide.
active_dot_color = "#FFD700"

# Background of caption overlays and the previous/next buttons.
caption_background = "rgba(0,0,0,0.45)"

# ---------------------------------------------------------------------------
# Site-wide behaviors
# ---------------------------------------------------------------------------
[behaviors]
# Mobile menu: the toggle element and the navigation it opens.
menu_toggle_id = "mobileMenuToggle"
nav_id = "mainNav"

# Cookie notice: shown until the accept button is pressed once.
cookie_notice_id = "cookie-notice"
cookie_accept_id = "cookie-accept"
cookie_flag = "bnuts_cookies_accepted"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum pages enhanced in parallel by `slide-gal build`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
