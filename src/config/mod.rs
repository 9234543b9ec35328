//! Bundler configuration management for `yeti.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | (root)    | Input directory, quiet mode                      |
//! | `[css]`   | CSS minification, source maps, output directory  |
//! | `[js]`    | JS minification, source maps, output directory   |
//! | `[html]`  | Final page minification                          |
//! | `[cache]` | Bundle hash cache persistence                    |
//!
//! # Example
//!
//! ```toml
//! quiet = false
//!
//! [css]
//! minify = true
//! source_maps = true
//! output_dir = "assets/css"
//!
//! [js]
//! output_dir = "assets/js"
//!
//! [cache]
//! persist = true
//! ```

mod asset;
pub mod defaults;
mod error;

pub use asset::{CacheConfig, CssConfig, HtmlConfig, JsConfig};
pub use error::ConfigError;

use crate::bundle::AssetType;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

// ============================================================================
// Output Options
// ============================================================================

/// Per-asset output settings, resolved from `[css]` or `[js]`.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions<'a> {
    pub minify: bool,
    pub source_maps: bool,
    /// Output directory with leading/trailing slashes removed.
    pub output_dir: &'a str,
}

#[inline]
fn normalize_dir(dir: &str) -> &str {
    dir.trim_matches('/')
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing yeti.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BundlerConfig {
    /// Build input directory, used to resolve `/abs` and bare imports.
    /// Normally set by the before-build hook.
    #[serde(default = "defaults::input_dir")]
    #[educe(Default = defaults::input_dir())]
    pub input_dir: PathBuf,

    /// Only show `[error]` log lines for this bundler. Other bundlers and the
    /// process-wide `logger::set_quiet` switch are unaffected.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub quiet: bool,

    #[serde(default)]
    pub css: CssConfig,

    #[serde(default)]
    pub js: JsConfig,

    #[serde(default)]
    pub html: HtmlConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl BundlerConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: BundlerConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Output settings for a file-backed asset type. HTML bundles are never
    /// written to disk, so `AssetType::Html` yields `None`.
    pub fn output_options(&self, asset: AssetType) -> Option<OutputOptions<'_>> {
        match asset {
            AssetType::Css => Some(OutputOptions {
                minify: self.css.minify,
                source_maps: self.css.source_maps,
                output_dir: normalize_dir(&self.css.output_dir),
            }),
            AssetType::Js => Some(OutputOptions {
                minify: self.js.minify,
                source_maps: self.js.source_maps,
                output_dir: normalize_dir(&self.js.output_dir),
            }),
            AssetType::Html => None,
        }
    }

    /// Public URL of a bundle file: `/<output_dir>/<name>.<ext>`.
    pub fn bundle_url(&self, asset: AssetType, name: &str) -> Option<String> {
        let options = self.output_options(asset)?;
        Some(format!(
            "/{}/{}.{}",
            options.output_dir,
            name,
            asset.extension()
        ))
    }

    /// Path of a bundle file under the output root.
    pub fn bundle_path(&self, output_root: &Path, asset: AssetType, name: &str) -> Option<PathBuf> {
        let options = self.output_options(asset)?;
        Some(
            output_root
                .join(options.output_dir)
                .join(format!("{name}.{}", asset.extension())),
        )
    }

    /// Location of the persisted hash cache, if persistence is enabled.
    pub fn cache_path(&self, output_root: &Path) -> Option<PathBuf> {
        self.cache
            .persist
            .then(|| output_root.join(&self.cache.file))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        Self::check_relative_dir("[css.output_dir]", &self.css.output_dir)?;
        Self::check_relative_dir("[js.output_dir]", &self.js.output_dir)?;

        if self.cache.persist {
            Self::check_relative_dir("[cache.file]", &self.cache.file.to_string_lossy())?;
        }

        Ok(())
    }

    /// Output directories must stay inside the output root. Leading and
    /// trailing slashes are URL-style and stripped before the check.
    fn check_relative_dir(field: &str, dir: &str) -> Result<()> {
        let normalized = normalize_dir(dir);
        if normalized.is_empty() {
            bail!(ConfigError::Validation(format!("{field} must not be empty")));
        }
        if Path::new(normalized)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!(ConfigError::Validation(format!(
                "{field} must not contain `..` or a drive prefix"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
