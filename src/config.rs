//! Tool configuration.
//!
//! Handles loading, validating, and merging `qrsize.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything else
//! keeps its default.
//!
//! ## Config File Location
//!
//! `qrsize.toml` is read from the directory given by `--config` (default:
//! the current directory). A missing file is not an error.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! lock_aspect = true                 # Derive the other dimension from the image ratio
//! filename_prefix = "resized_image"  # Outputs: resized_image_0.jpg, resized_image_1.jpg, ...
//! recursive = false                  # Descend into subdirectories of input directories
//!
//! [qr]
//! size = 256                # QR bitmap edge in pixels
//! container = 280           # Export canvas edge in pixels
//! logo_opacity = 0.3        # 0.0 - 1.0
//! error_correction = "L"    # L, M, Q or H
//! pdf_filename = "QRCode.pdf"
//! png_filename = "QRCode.png"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [qr]
//! error_correction = "H"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "qrsize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `qrsize.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Batch resize settings.
    pub resize: ResizeConfig,
    /// QR rendering and export settings.
    pub qr: QrConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resize.filename_prefix.is_empty()
            || self.resize.filename_prefix.contains(['/', '\\'])
        {
            return Err(ConfigError::Validation(
                "resize.filename_prefix must be a non-empty name without path separators".into(),
            ));
        }
        if self.qr.size == 0 || self.qr.container == 0 {
            return Err(ConfigError::Validation(
                "qr.size and qr.container must be non-zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.qr.logo_opacity) {
            return Err(ConfigError::Validation(
                "qr.logo_opacity must be between 0.0 and 1.0".into(),
            ));
        }
        if crate::qr::parse_ec_level(&self.qr.error_correction).is_none() {
            return Err(ConfigError::Validation(
                "qr.error_correction must be one of L, M, Q, H".into(),
            ));
        }
        if self.qr.pdf_filename.is_empty() || self.qr.png_filename.is_empty() {
            return Err(ConfigError::Validation(
                "qr.pdf_filename and qr.png_filename must not be empty".into(),
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

/// Batch resize settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Start with the aspect lock on.
    pub lock_aspect: bool,
    /// Output files are named `{filename_prefix}_{index}.jpg`.
    pub filename_prefix: String,
    /// Walk input directories recursively.
    pub recursive: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            lock_aspect: true,
            filename_prefix: "resized_image".to_string(),
            recursive: false,
        }
    }
}

/// QR rendering and export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrConfig {
    pub size: u32,
    pub container: u32,
    pub logo_opacity: f32,
    pub error_correction: String,
    pub pdf_filename: String,
    pub png_filename: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            size: 256,
            container: 280,
            logo_opacity: 0.3,
            error_correction: "L".to_string(),
            pdf_filename: "QRCode.pdf".to_string(),
            png_filename: "QRCode.png".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode/resize workers.
    /// When absent, defaults to the number of CPU cores.
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
///
/// Base layer that user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(Config::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
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

/// Load `qrsize.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
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
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `qrsize.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `qrsize.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# qrsize configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Batch resize
# ---------------------------------------------------------------------------
[resize]
# Keep the aspect lock on: editing --width derives the height (and vice
# versa) from each image's own intrinsic ratio.
lock_aspect = true

# Output files are named <prefix>_<index>.jpg, index starting at 0.
filename_prefix = "resized_image"

# Descend into subdirectories when a directory is given as input.
recursive = false

# ---------------------------------------------------------------------------
# QR code
# ---------------------------------------------------------------------------
[qr]
# Edge of the rendered QR bitmap, in pixels.
size = 256

# Edge of the white square the QR code and logo are composited into.
container = 280

# Opacity of the logo overlay (0.0 = invisible, 1.0 = opaque).
logo_opacity = 0.3

# Error-correction level: L (7%), M (15%), Q (25%) or H (30%).
error_correction = "L"

# Names of the exported files.
pdf_filename = "QRCode.pdf"
png_filename = "QRCode.png"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decode/resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert!(config.resize.lock_aspect);
        assert_eq!(config.resize.filename_prefix, "resized_image");
        assert_eq!(config.qr.size, 256);
        assert_eq!(config.qr.container, 280);
        assert_eq!(config.qr.logo_opacity, 0.3);
        assert_eq!(config.qr.pdf_filename, "QRCode.pdf");
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_toml_parses_to_defaults() {
        let parsed: Config = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: Config = toml::from_str("[qr]\nerror_correction = \"H\"\n").unwrap();
        assert_eq!(config.qr.error_correction, "H");
        assert_eq!(config.qr.size, 256);
        assert!(config.resize.lock_aspect);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<Config, _> = toml::from_str("[resize]\nlock_aspekt = false\n");
        assert!(result.is_err());
    }

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut Config)>> = vec![
            Box::new(|c| c.qr.logo_opacity = 1.5),
            Box::new(|c| c.qr.size = 0),
            Box::new(|c| c.qr.error_correction = "Z".into()),
            Box::new(|c| c.resize.filename_prefix = "a/b".into()),
            Box::new(|c| c.resize.filename_prefix = String::new()),
            Box::new(|c| c.processing.max_processes = Some(0)),
        ];
        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        }
    }

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = effective_threads(&ProcessingConfig::default());
        assert!(cores >= 1);
        let capped = effective_threads(&ProcessingConfig {
            max_processes: Some(usize::MAX),
        });
        assert_eq!(capped, cores);
        let one = effective_threads(&ProcessingConfig {
            max_processes: Some(1),
        });
        assert_eq!(one, 1);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[resize]\nlock_aspect = false\nfilename_prefix = \"small\"\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert!(!config.resize.lock_aspect);
        assert_eq!(config.resize.filename_prefix, "small");
        assert_eq!(config.qr, QrConfig::default());
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_invalid_value_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[qr]\nlogo_opacity = 2.0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }
}
