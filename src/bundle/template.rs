//! Asset templates: literal CSS/JS text interleaved with bundle markers.
//!
//! A template mirrors a tagged template literal: `strings.len()` is always
//! `values.len() + 1`, and value `i` sits between strings `i` and `i + 1`.
//!
//! ```ignore
//! let css = Template::css()
//!     .literal("body { margin: 0 }")
//!     .value(CSS.bundle("cards")?)
//!     .literal(".card { padding: 1rem }")
//!     .value(CSS.import(&resolver, "./card-extra.css"));
//! let output = css.evaluate()?;
//! // output.bundles = { "default": "body { margin: 0 }", "cards": ".card { ... }\n<file>" }
//! ```

use super::{AssetType, BundleDescriptor, BundleError, DEFAULT_BUNDLE_NAME, Role};
use indexmap::{IndexMap, IndexSet};
use std::{fs, path::PathBuf};

/// A value interpolated between two literal strings.
#[derive(Debug, Clone)]
pub enum Interpolation {
    Descriptor(BundleDescriptor),
    Text(String),
    /// Renders as nothing (a null/absent value).
    Empty,
}

impl From<BundleDescriptor> for Interpolation {
    fn from(descriptor: BundleDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl From<&str> for Interpolation {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Interpolation {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<T: Into<Interpolation>> From<Option<T>> for Interpolation {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Result of evaluating a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetOutput {
    /// Bundle name -> combined content, in first-use order. Never empty strings.
    pub bundles: IndexMap<String, String>,
    /// Files read by imports.
    pub dependencies: IndexSet<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Template {
    asset_type: AssetType,
    strings: Vec<String>,
    values: Vec<Interpolation>,
}

impl Template {
    pub fn new(asset_type: AssetType) -> Self {
        Self {
            asset_type,
            strings: vec![String::new()],
            values: Vec::new(),
        }
    }

    pub fn css() -> Self {
        Self::new(AssetType::Css)
    }

    pub fn js() -> Self {
        Self::new(AssetType::Js)
    }

    pub const fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    /// Append literal text to the current string segment.
    pub fn literal(mut self, text: &str) -> Self {
        if let Some(last) = self.strings.last_mut() {
            last.push_str(text);
        }
        self
    }

    /// Interpolate a value, opening a new string segment after it.
    pub fn value(mut self, value: impl Into<Interpolation>) -> Self {
        self.values.push(value.into());
        self.strings.push(String::new());
        self
    }

    /// Evaluate into per-bundle content.
    ///
    /// Content starts in the `default` bundle. A start marker commits the
    /// pending chunk and switches bundles; an import commits the pending
    /// chunk and adds the trimmed file contents to its own bundle (or the
    /// current one). Chunks of a bundle are joined with `\n` and trimmed,
    /// empty bundles are dropped, and JS bundles are wrapped in a block
    /// scope.
    pub fn evaluate(&self) -> Result<AssetOutput, BundleError> {
        let mut raw: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut dependencies = IndexSet::new();
        let mut current = DEFAULT_BUNDLE_NAME.to_owned();
        let mut chunk = String::new();

        for (i, text) in self.strings.iter().enumerate() {
            chunk.push_str(text);
            raw.entry(current.clone()).or_default();

            let Some(value) = self.values.get(i) else {
                continue;
            };

            match value {
                Interpolation::Descriptor(descriptor) => {
                    self.check_descriptor(descriptor)?;
                    commit(&mut raw, &current, &mut chunk);

                    match descriptor.role {
                        Role::Start => {
                            if let Some(name) = &descriptor.bundle_name {
                                current.clone_from(name);
                            }
                        }
                        Role::Import => {
                            let Some(path) = &descriptor.source_path else {
                                continue;
                            };
                            dependencies.insert(path.clone());
                            let contents =
                                fs::read_to_string(path).map_err(|source| BundleError::Import {
                                    path: path.clone(),
                                    source,
                                })?;
                            let target = descriptor.bundle_name.as_deref().unwrap_or(&current);
                            raw.entry(target.to_owned())
                                .or_default()
                                .push(contents.trim().to_owned());
                        }
                        Role::InlinePlaceholder => {
                            return Err(BundleError::PlaceholderInTemplate {
                                asset: self.asset_type,
                                name: descriptor.bundle_name.clone().unwrap_or_default(),
                            });
                        }
                    }
                }
                Interpolation::Text(text) => chunk.push_str(text),
                Interpolation::Empty => {}
            }
        }
        commit(&mut raw, &current, &mut chunk);

        let bundles = raw
            .into_iter()
            .filter_map(|(name, chunks)| {
                let combined = chunks.join("\n");
                let combined = combined.trim();
                if combined.is_empty() {
                    return None;
                }
                let content = match self.asset_type {
                    AssetType::Js => format!("{{\n{combined}\n}}"),
                    _ => combined.to_owned(),
                };
                Some((name, content))
            })
            .collect();

        Ok(AssetOutput {
            bundles,
            dependencies,
        })
    }

    fn check_descriptor(&self, descriptor: &BundleDescriptor) -> Result<(), BundleError> {
        if descriptor.asset_type != self.asset_type {
            return Err(BundleError::AssetTypeMismatch {
                expected: self.asset_type,
                found: descriptor.asset_type,
                what: descriptor.describe(),
            });
        }
        Ok(())
    }
}

/// Move the pending chunk (trimmed) into `bundle`.
fn commit(raw: &mut IndexMap<String, Vec<String>>, bundle: &str, chunk: &mut String) {
    if chunk.is_empty() {
        return;
    }
    raw.entry(bundle.to_owned())
        .or_default()
        .push(chunk.trim().to_owned());
    chunk.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{CSS, ImportResolver, JS};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plain_template_goes_to_default() {
        let output = Template::css()
            .literal("  body { margin: 0 }  ")
            .evaluate()
            .unwrap();
        assert_eq!(output.bundles.len(), 1);
        assert_eq!(output.bundles["default"], "body { margin: 0 }");
        assert!(output.dependencies.is_empty());
    }

    #[test]
    fn test_bundle_marker_switches_bundle() {
        let output = Template::css()
            .literal("a{}")
            .value(CSS.bundle("cards").unwrap())
            .literal(".card{}")
            .value(CSS.bundle("default").unwrap())
            .literal("b{}")
            .evaluate()
            .unwrap();

        let names: Vec<_> = output.bundles.keys().cloned().collect();
        assert_eq!(names, ["default", "cards"]);
        assert_eq!(output.bundles["default"], "a{}\nb{}");
        assert_eq!(output.bundles["cards"], ".card{}");
    }

    #[test]
    fn test_text_values_are_interpolated() {
        let color = "red";
        let output = Template::css()
            .literal("h1{color:")
            .value(color)
            .literal("}")
            .value(None::<String>)
            .evaluate()
            .unwrap();
        assert_eq!(output.bundles["default"], "h1{color:red}");
    }

    #[test]
    fn test_empty_bundles_are_dropped() {
        let output = Template::css()
            .value(CSS.bundle("empty").unwrap())
            .literal("   ")
            .evaluate()
            .unwrap();
        assert!(output.bundles.is_empty());
    }

    #[test]
    fn test_import_reads_file_and_records_dependency() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("reset.css"), "\n* { box-sizing: border-box }\n").unwrap();
        let resolver = ImportResolver::new(dir.path(), dir.path());

        let output = Template::css()
            .literal("body{}")
            .value(CSS.import_into(&resolver, "./reset.css", "reset").unwrap())
            .literal("p{}")
            .evaluate()
            .unwrap();

        assert_eq!(output.bundles["reset"], "* { box-sizing: border-box }");
        assert_eq!(output.bundles["default"], "body{}\np{}");
        assert!(output.dependencies.contains(&dir.path().join("reset.css")));
    }

    #[test]
    fn test_import_without_name_uses_current_bundle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "a{}").unwrap();
        let resolver = ImportResolver::new(dir.path(), dir.path());

        let output = Template::css()
            .value(CSS.bundle("main").unwrap())
            .value(CSS.import(&resolver, "/a.css"))
            .evaluate()
            .unwrap();
        assert_eq!(output.bundles["main"], "a{}");
    }

    #[test]
    fn test_import_missing_file_is_error() {
        let resolver = ImportResolver::new("/nonexistent", "/nonexistent");
        let err = Template::css()
            .value(CSS.import(&resolver, "./missing.css"))
            .evaluate()
            .unwrap_err();
        assert!(matches!(err, BundleError::Import { .. }));
        assert!(err.to_string().contains("missing.css"));
    }

    #[test]
    fn test_js_bundles_are_block_scoped() {
        let output = Template::js()
            .literal("const x = 1;")
            .evaluate()
            .unwrap();
        assert_eq!(output.bundles["default"], "{\nconst x = 1;\n}");
    }

    #[test]
    fn test_asset_type_mismatch() {
        let err = Template::css()
            .value(JS.bundle("main").unwrap())
            .evaluate()
            .unwrap_err();
        assert!(matches!(
            err,
            BundleError::AssetTypeMismatch {
                expected: AssetType::Css,
                found: AssetType::Js,
                ..
            }
        ));
    }

    #[test]
    fn test_inline_placeholder_in_template_is_error() {
        let err = Template::css()
            .value(CSS.inline("main"))
            .evaluate()
            .unwrap_err();
        assert!(matches!(err, BundleError::PlaceholderInTemplate { .. }));
    }
}
