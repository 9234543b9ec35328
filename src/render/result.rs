//! Render results and their merge algebra.
//!
//! Every merge is a union: bundle chunk sets and dependency sets only grow,
//! identical chunks collapse, and HTML strings concatenate in order. Merging
//! a result with itself leaves its bundles and dependencies unchanged.

use crate::bundle::{AssetOutput, AssetType};
use indexmap::{IndexMap, IndexSet};
use std::path::PathBuf;

/// Bundle name -> ordered set of content chunks.
pub type BundleMap = IndexMap<String, IndexSet<String>>;

/// Output of rendering a component subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub html: String,
    pub css_bundles: BundleMap,
    pub js_bundles: BundleMap,
    pub html_bundles: BundleMap,
    pub css_deps: IndexSet<PathBuf>,
    pub js_deps: IndexSet<PathBuf>,
    pub html_deps: IndexSet<PathBuf>,
}

impl RenderResult {
    /// A result carrying only markup.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn bundles(&self, asset: AssetType) -> &BundleMap {
        match asset {
            AssetType::Css => &self.css_bundles,
            AssetType::Js => &self.js_bundles,
            AssetType::Html => &self.html_bundles,
        }
    }

    pub fn bundles_mut(&mut self, asset: AssetType) -> &mut BundleMap {
        match asset {
            AssetType::Css => &mut self.css_bundles,
            AssetType::Js => &mut self.js_bundles,
            AssetType::Html => &mut self.html_bundles,
        }
    }

    pub fn deps(&self, asset: AssetType) -> &IndexSet<PathBuf> {
        match asset {
            AssetType::Css => &self.css_deps,
            AssetType::Js => &self.js_deps,
            AssetType::Html => &self.html_deps,
        }
    }

    pub fn deps_mut(&mut self, asset: AssetType) -> &mut IndexSet<PathBuf> {
        match asset {
            AssetType::Css => &mut self.css_deps,
            AssetType::Js => &mut self.js_deps,
            AssetType::Html => &mut self.html_deps,
        }
    }

    /// Add one chunk to a bundle. Empty names and empty chunks are ignored.
    pub fn add_chunk(&mut self, asset: AssetType, name: &str, chunk: impl Into<String>) {
        let chunk = chunk.into();
        if name.is_empty() || chunk.is_empty() {
            return;
        }
        self.bundles_mut(asset)
            .entry(name.to_owned())
            .or_default()
            .insert(chunk);
    }

    /// Merge an evaluated asset template (a component's own CSS or JS).
    pub fn add_assets(&mut self, asset: AssetType, output: &AssetOutput) {
        for (name, content) in &output.bundles {
            self.add_chunk(asset, name, content.as_str());
        }
        self.deps_mut(asset)
            .extend(output.dependencies.iter().cloned());
    }

    /// Union `other` into `self`, appending its HTML.
    pub fn merge(&mut self, other: RenderResult) {
        self.html.push_str(&other.html);
        for asset in AssetType::ALL {
            merge_bundles(self.bundles_mut(asset), other.bundles(asset));
            self.deps_mut(asset)
                .extend(other.deps(asset).iter().cloned());
        }
    }

    /// Same as [`merge`](Self::merge) but keeps `self.html` untouched.
    pub fn merge_assets(&mut self, other: &RenderResult) {
        for asset in AssetType::ALL {
            merge_bundles(self.bundles_mut(asset), other.bundles(asset));
            self.deps_mut(asset)
                .extend(other.deps(asset).iter().cloned());
        }
    }

    /// Content of a bundle as referenced by URL or named inline placeholder:
    /// its chunks concatenated without a separator.
    pub fn bundle_content(&self, asset: AssetType, name: &str) -> Option<String> {
        self.bundles(asset)
            .get(name)
            .map(|chunks| chunks.iter().map(String::as_str).collect())
    }

    /// Every dependency path, css then js then html.
    pub fn all_deps(&self) -> impl Iterator<Item = &PathBuf> {
        self.css_deps
            .iter()
            .chain(&self.js_deps)
            .chain(&self.html_deps)
    }
}

fn merge_bundles(into: &mut BundleMap, from: &BundleMap) {
    for (name, chunks) in from {
        into.entry(name.clone())
            .or_default()
            .extend(chunks.iter().cloned());
    }
}

// ============================================================================
// Rendered (one or many)
// ============================================================================

/// What a component returns: one result, or several siblings.
#[derive(Debug, Clone)]
pub enum Rendered {
    One(RenderResult),
    Many(Vec<RenderResult>),
}

impl From<RenderResult> for Rendered {
    fn from(result: RenderResult) -> Self {
        Self::One(result)
    }
}

impl From<Vec<RenderResult>> for Rendered {
    fn from(results: Vec<RenderResult>) -> Self {
        Self::Many(results)
    }
}

impl Rendered {
    /// Flatten into a single result (union of bundles, concatenated HTML).
    pub fn flatten(self) -> RenderResult {
        match self {
            Self::One(result) => result,
            Self::Many(results) => flatten(results),
        }
    }
}

/// Fold results in order into one.
pub fn flatten(results: impl IntoIterator<Item = RenderResult>) -> RenderResult {
    results
        .into_iter()
        .fold(RenderResult::default(), |mut acc, result| {
            acc.merge(result);
            acc
        })
}

/// `own` first, then every child result in order.
pub fn merge(own: RenderResult, children: impl Into<Rendered>) -> RenderResult {
    let mut merged = own;
    match children.into() {
        Rendered::One(child) => merged.merge(child),
        Rendered::Many(children) => children.into_iter().for_each(|c| merged.merge(c)),
    }
    merged
}
