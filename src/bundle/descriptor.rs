//! Bundle descriptors and the `CSS` / `JS` / `HTML` authoring helpers.
//!
//! A descriptor is an immutable marker interpolated into an asset template
//! (or passed as an element child). It never carries content itself; import
//! descriptors only carry the resolved file path, which is read when the
//! template is evaluated.

use super::{AssetType, BundleError, check_explicit_name, inline_placeholder, src_placeholder};
use std::path::{Component, Path, PathBuf};

/// What a descriptor asks the evaluator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Switch the current bundle.
    Start,
    /// Add a file's contents to a bundle.
    Import,
    /// Mark where a bundle's content is inlined into markup.
    InlinePlaceholder,
}

/// `{asset_type, role, bundle_name, source_path, escape}` marker value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDescriptor {
    pub asset_type: AssetType,
    pub role: Role,
    pub bundle_name: Option<String>,
    pub source_path: Option<PathBuf>,
    /// HTML imports only: escape the file contents before inserting them.
    pub escape: bool,
}

impl BundleDescriptor {
    /// The placeholder text an inline descriptor stands for.
    pub fn placeholder(&self) -> Option<String> {
        match (self.role, &self.bundle_name) {
            (Role::InlinePlaceholder, Some(name)) => Some(inline_placeholder(name)),
            _ => None,
        }
    }

    /// Human-readable role, used in error messages.
    pub(crate) const fn describe(&self) -> &'static str {
        match self.role {
            Role::Start => "bundle() marker",
            Role::Import => "import",
            Role::InlinePlaceholder => "inline placeholder",
        }
    }
}

// ============================================================================
// Import Resolution
// ============================================================================

const FILE_URL_PREFIX: &str = "file://";

/// Resolves import specifiers to file paths.
///
/// | Specifier        | Resolved against         |
/// |------------------|--------------------------|
/// | `file:///x/y`    | taken as-is (`/x/y`)     |
/// | `/styles/a.css`  | build input directory    |
/// | `./a.css`, `../` | caller's base directory  |
/// | `pkg/a.css`      | build input directory    |
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    pub input_dir: PathBuf,
    pub base_dir: PathBuf,
}

impl ImportResolver {
    pub fn new(input_dir: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Resolver for imports declared by `source_file`.
    pub fn for_file(input_dir: impl Into<PathBuf>, source_file: &Path) -> Self {
        let base_dir = source_file.parent().unwrap_or(Path::new("")).to_path_buf();
        Self::new(input_dir, base_dir)
    }

    pub fn resolve(&self, specifier: &str) -> PathBuf {
        if let Some(path) = specifier.strip_prefix(FILE_URL_PREFIX) {
            return PathBuf::from(path);
        }
        let joined = if let Some(rest) = specifier.strip_prefix('/') {
            self.input_dir.join(rest)
        } else if specifier.starts_with("./") || specifier.starts_with("../") {
            self.base_dir.join(specifier)
        } else {
            self.input_dir.join(specifier)
        };
        normalize_path(&joined)
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// Authoring Helpers
// ============================================================================

/// `bundle` / `import` / `inline` / `src` helpers for one asset type.
#[derive(Debug, Clone, Copy)]
pub struct AssetHelpers(pub AssetType);

pub const CSS: AssetHelpers = AssetHelpers(AssetType::Css);
pub const JS: AssetHelpers = AssetHelpers(AssetType::Js);
pub const HTML: AssetHelpers = AssetHelpers(AssetType::Html);

impl AssetHelpers {
    /// Start marker: template content after it goes to `name`.
    pub fn bundle(self, name: &str) -> Result<BundleDescriptor, BundleError> {
        check_explicit_name(self.0, "bundle", name)?;
        Ok(BundleDescriptor {
            asset_type: self.0,
            role: Role::Start,
            bundle_name: Some(name.to_owned()),
            source_path: None,
            escape: false,
        })
    }

    /// Import a file into the template's current bundle.
    pub fn import(self, resolver: &ImportResolver, specifier: &str) -> BundleDescriptor {
        self.import_descriptor(resolver.resolve(specifier), None, false)
    }

    /// Import a file into the named bundle.
    pub fn import_into(
        self,
        resolver: &ImportResolver,
        specifier: &str,
        name: &str,
    ) -> Result<BundleDescriptor, BundleError> {
        check_explicit_name(self.0, "import", name)?;
        Ok(self.import_descriptor(resolver.resolve(specifier), Some(name.to_owned()), false))
    }

    /// Like [`import`](Self::import) or [`import_into`](Self::import_into),
    /// with the file contents HTML-escaped when inserted.
    pub fn import_escaped(
        self,
        resolver: &ImportResolver,
        specifier: &str,
        name: Option<&str>,
    ) -> Result<BundleDescriptor, BundleError> {
        if let Some(name) = name {
            check_explicit_name(self.0, "import", name)?;
        }
        Ok(self.import_descriptor(
            resolver.resolve(specifier),
            name.map(str::to_owned),
            true,
        ))
    }

    /// Inline placeholder descriptor; the wildcard is allowed.
    pub fn inline(self, name: &str) -> BundleDescriptor {
        BundleDescriptor {
            asset_type: self.0,
            role: Role::InlinePlaceholder,
            bundle_name: Some(name.to_owned()),
            source_path: None,
            escape: false,
        }
    }

    /// URL-reference placeholder; the wildcard is allowed.
    pub fn src(self, name: &str) -> String {
        src_placeholder(name)
    }

    fn import_descriptor(self, path: PathBuf, name: Option<String>, escape: bool) -> BundleDescriptor {
        BundleDescriptor {
            asset_type: self.0,
            role: Role::Import,
            bundle_name: name,
            source_path: Some(path),
            escape,
        }
    }
}
