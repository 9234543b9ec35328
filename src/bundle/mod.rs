//! Bundle vocabulary: asset types, descriptors, placeholders and templates.
//!
//! # Placeholders
//!
//! Components reference bundles in their markup through two string
//! placeholders, which the page compiler rewrites later:
//!
//! | Placeholder              | Produced by       | Rewritten to                  |
//! |--------------------------|-------------------|-------------------------------|
//! | `@bundle/<name>`         | `CSS.src(name)`   | bundle URL (`/css/name.css`)  |
//! | `/*@--BUNDLE--<name>--@*/` | `CSS.inline(name)` | bundle content, inlined     |
//!
//! The name `*` is the wildcard: "every bundle of this page that nothing
//! else referenced".

mod descriptor;
mod error;
mod template;

pub use descriptor::{AssetHelpers, BundleDescriptor, CSS, HTML, ImportResolver, JS, Role};
pub use error::BundleError;
pub use template::{AssetOutput, Interpolation, Template};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};

// ============================================================================
// Constants
// ============================================================================

/// Bundle that template content belongs to until a `bundle()` marker switches it.
pub const DEFAULT_BUNDLE_NAME: &str = "default";

/// Reserved name meaning "all remaining bundles".
pub const WILDCARD_BUNDLE_NAME: &str = "*";

/// Prefix of a URL-reference placeholder.
pub const BUNDLE_SRC_PREFIX: &str = "@bundle/";

const INLINE_PREFIX: &str = "/*@--BUNDLE--";
const INLINE_SUFFIX: &str = "--@*/";

/// Matches inline placeholders; group 1 is the bundle name.
static INLINE_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*@--BUNDLE--(.*?)--@\*/").unwrap()
});

// ============================================================================
// Asset Type
// ============================================================================

/// Kind of content a bundle holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Css,
    Js,
    Html,
}

impl AssetType {
    pub const ALL: [Self; 3] = [Self::Css, Self::Js, Self::Html];

    /// File extension of written bundles.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Html => "html",
        }
    }

    pub const fn as_str(self) -> &'static str {
        self.extension()
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Placeholders
// ============================================================================

/// `"@bundle/" + name`
#[inline]
pub fn src_placeholder(name: &str) -> String {
    format!("{BUNDLE_SRC_PREFIX}{name}")
}

/// `"/*@--BUNDLE--" + name + "--@*/"`
#[inline]
pub fn inline_placeholder(name: &str) -> String {
    format!("{INLINE_PREFIX}{name}{INLINE_SUFFIX}")
}

/// Bundle name of a URL-reference placeholder, if `value` is one.
#[inline]
pub fn parse_src_placeholder(value: &str) -> Option<&str> {
    value.strip_prefix(BUNDLE_SRC_PREFIX)
}

/// Regex matching inline placeholders; capture group 1 holds the name.
#[inline]
pub fn inline_placeholder_regex() -> &'static Regex {
    &INLINE_PLACEHOLDER_RE
}

#[inline]
pub fn is_wildcard(name: &str) -> bool {
    name == WILDCARD_BUNDLE_NAME
}

/// Reject names that an authoring API requires to be explicit.
pub(crate) fn check_explicit_name(
    asset: AssetType,
    helper: &'static str,
    name: &str,
) -> Result<(), BundleError> {
    if is_wildcard(name) {
        return Err(BundleError::ReservedName { asset, helper });
    }
    if name.is_empty() {
        return Err(BundleError::EmptyName { asset, helper });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_wire_format() {
        assert_eq!(src_placeholder("main"), "@bundle/main");
        assert_eq!(inline_placeholder("main"), "/*@--BUNDLE--main--@*/");
        assert_eq!(inline_placeholder("*"), "/*@--BUNDLE--*--@*/");
    }

    #[test]
    fn test_parse_src_placeholder() {
        assert_eq!(parse_src_placeholder("@bundle/main"), Some("main"));
        assert_eq!(parse_src_placeholder("@bundle/*"), Some("*"));
        assert_eq!(parse_src_placeholder("/css/main.css"), None);
    }

    #[test]
    fn test_inline_placeholder_regex_is_lazy() {
        let text = "a /*@--BUNDLE--one--@*/ b /*@--BUNDLE--two--@*/";
        let names: Vec<_> = inline_placeholder_regex()
            .captures_iter(text)
            .map(|c| c[1].to_owned())
            .collect();
        assert_eq!(names, ["one", "two"]);
    }

    #[test]
    fn test_check_explicit_name() {
        assert!(check_explicit_name(AssetType::Css, "bundle", "main").is_ok());
        assert!(matches!(
            check_explicit_name(AssetType::Css, "bundle", "*"),
            Err(BundleError::ReservedName { .. })
        ));
        assert!(matches!(
            check_explicit_name(AssetType::Css, "bundle", ""),
            Err(BundleError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_asset_type_display() {
        assert_eq!(AssetType::Css.to_string(), "css");
        assert_eq!(AssetType::Js.extension(), "js");
    }
}
