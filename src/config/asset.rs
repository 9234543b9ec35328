//! `[css]`, `[js]`, `[html]` and `[cache]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[css]` section in yeti.toml - CSS bundle output.
///
/// # Example
/// ```toml
/// [css]
/// minify = true
/// source_maps = false
/// output_dir = "css"     # bundles land in <output>/css/<name>.css
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    /// Minify bundle files and inline `<style>` content.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Write `<name>.css.map` next to each bundle file.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub source_maps: bool,

    /// Directory (relative to the output root) for bundle files.
    #[serde(default = "defaults::css::output_dir")]
    #[educe(Default = defaults::css::output_dir())]
    pub output_dir: String,
}

/// `[js]` section in yeti.toml - JS bundle output.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct JsConfig {
    /// Minify bundle files and inline `<script>` content.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Request source maps for JS bundles (not produced by the JS transformer).
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub source_maps: bool,

    /// Directory (relative to the output root) for bundle files.
    #[serde(default = "defaults::js::output_dir")]
    #[educe(Default = defaults::js::output_dir())]
    pub output_dir: String,
}

/// `[html]` section in yeti.toml - final page output.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlConfig {
    /// Minify the serialized page.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,
}

/// `[cache]` section in yeti.toml - bundle hash cache.
///
/// The hash cache always lives for the whole process; `persist` additionally
/// keeps it across processes in a JSON file under the output root.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub persist: bool,

    /// Cache file name, relative to the output root.
    #[serde(default = "defaults::cache::file")]
    #[educe(Default = defaults::cache::file())]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_config_defaults() {
        let config = CssConfig::default();
        assert!(config.minify);
        assert!(!config.source_maps);
        assert_eq!(config.output_dir, "css");
    }

    #[test]
    fn test_js_config_partial_section() {
        let config: JsConfig = toml::from_str("minify = false").unwrap();
        assert!(!config.minify);
        assert_eq!(config.output_dir, "js");
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(!config.persist);
        assert_eq!(config.file, PathBuf::from(".yeti-bundle-hashes.json"));
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<HtmlConfig, _> = toml::from_str("pretty = true");
        assert!(result.is_err());
    }
}
