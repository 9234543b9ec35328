//! Bundle authoring and import errors.

use super::AssetType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring or evaluating bundle contributions.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("`{asset}.{helper}()` called with reserved wildcard bundle name \"*\"")]
    ReservedName {
        asset: AssetType,
        helper: &'static str,
    },

    #[error("`{asset}.{helper}()` called with an empty bundle name")]
    EmptyName {
        asset: AssetType,
        helper: &'static str,
    },

    #[error("{found} {what} interpolated into a {expected} template")]
    AssetTypeMismatch {
        expected: AssetType,
        found: AssetType,
        what: &'static str,
    },

    #[error("inline placeholder for bundle \"{name}\" cannot be interpolated into a {asset} template")]
    PlaceholderInTemplate { asset: AssetType, name: String },

    #[error("{asset} {what} cannot be used as an element child")]
    UnsupportedChild {
        asset: AssetType,
        what: &'static str,
    },

    #[error("bundle import failed to read file at path `{}`", .path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_bundle_error_display() {
        let err = BundleError::ReservedName {
            asset: AssetType::Css,
            helper: "bundle",
        };
        assert!(err.to_string().contains("css.bundle()"));
        assert!(err.to_string().contains("\"*\""));

        let err = BundleError::Import {
            path: PathBuf::from("/site/reset.css"),
            source: Error::new(ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/site/reset.css"));

        let err = BundleError::AssetTypeMismatch {
            expected: AssetType::Css,
            found: AssetType::Js,
            what: "import",
        };
        assert_eq!(err.to_string(), "js import interpolated into a css template");
    }
}
