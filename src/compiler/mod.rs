//! Per-page compilation.
//!
//! # Pipeline
//!
//! ```text
//! RenderResult.html
//!     │
//!     ├── parse (html5ever)
//!     ├── head::dedup_head          one <head>, deduplicated
//!     ├── resolve (named)           links, <script src>, inline placeholders
//!     ├── resolve (wildcard)        "*" expanded to the unconsumed bundles
//!     ├── inline (minify)           <style>/<script> text through the transformers
//!     ├── serialize
//!     ├── html_bundles              HTML bundle placeholders spliced in
//!     └── minify page (optional)
//! ```
//!
//! All bookkeeping for one page (unconsumed names, pending wildcard nodes,
//! nodes waiting for minification, URL-referenced bundle contents) lives in
//! [`PageContext`], which is dropped with the page's tree.

mod head;
mod html_bundles;
mod inline;
mod resolve;

pub use head::{dedup_head, is_head_container};
pub use html_bundles::resolve_html_bundles;
pub use inline::InlineCache;

use crate::bundle::AssetType;
use crate::config::BundlerConfig;
use crate::render::{BundleMap, RenderResult};
use crate::transform::Transformers;
use crate::utils::minify::minify_page;
use anyhow::{Context, Result};
use indexmap::IndexSet;
use std::rc::Rc;
use yeti_dom::{Document, Handle};

// ============================================================================
// Page Bundles
// ============================================================================

/// Bundle contents a page referenced by URL, to be written once per build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBundles {
    pub css: BundleMap,
    pub js: BundleMap,
}

impl PageBundles {
    pub fn get(&self, asset: AssetType) -> Option<&BundleMap> {
        match asset {
            AssetType::Css => Some(&self.css),
            AssetType::Js => Some(&self.js),
            AssetType::Html => None,
        }
    }

    fn record(&mut self, asset: AssetType, name: &str, content: String) {
        let map = match asset {
            AssetType::Css => &mut self.css,
            AssetType::Js => &mut self.js,
            AssetType::Html => return,
        };
        map.entry(name.to_owned()).or_default().insert(content);
    }

    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.js.is_empty()
    }
}

// ============================================================================
// Page Context
// ============================================================================

/// Where a page is in its transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Unresolved,
    NamedResolved,
    WildcardResolved,
    Minified,
}

/// Per-asset bookkeeping.
#[derive(Debug, Default)]
struct AssetState {
    /// Bundles of this page nothing has referenced yet, in creation order.
    unconsumed: IndexSet<String>,
    /// `<link>`/`<script>` nodes pointing at `@bundle/*`.
    wildcard_src: Vec<Handle>,
    /// `<style>`/`<script>` nodes whose text holds the wildcard placeholder.
    wildcard_inline: Vec<Handle>,
    /// Inline nodes whose resolved text still has to be transformed.
    to_process: Vec<Handle>,
}

/// State threaded through the passes of one page.
pub struct PageContext<'a> {
    url: &'a str,
    result: &'a RenderResult,
    config: &'a BundlerConfig,
    phase: Phase,
    css: AssetState,
    js: AssetState,
    bundles: PageBundles,
}

impl<'a> PageContext<'a> {
    pub fn new(url: &'a str, result: &'a RenderResult, config: &'a BundlerConfig) -> Self {
        let seed = |asset: AssetType| AssetState {
            unconsumed: result.bundles(asset).keys().cloned().collect(),
            ..AssetState::default()
        };
        Self {
            url,
            result,
            config,
            phase: Phase::Unresolved,
            css: seed(AssetType::Css),
            js: seed(AssetType::Js),
            bundles: PageBundles::default(),
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Names not consumed by any named reference (the wildcard expansion set).
    pub fn unconsumed(&self, asset: AssetType) -> Vec<&str> {
        match asset {
            AssetType::Css => self.css.unconsumed.iter().map(String::as_str).collect(),
            AssetType::Js => self.js.unconsumed.iter().map(String::as_str).collect(),
            AssetType::Html => Vec::new(),
        }
    }

    pub fn into_bundles(self) -> PageBundles {
        self.bundles
    }

    fn state(&mut self, asset: AssetType) -> &mut AssetState {
        match asset {
            AssetType::Js => &mut self.js,
            _ => &mut self.css,
        }
    }

    /// Content of a page bundle as referenced by name: chunks joined with "".
    fn bundle_content(&self, asset: AssetType, name: &str) -> Option<String> {
        self.result
            .bundle_content(asset, name)
            .filter(|content| !content.is_empty())
    }
}

/// Push `node` unless it is already in `nodes`.
fn push_unique(nodes: &mut Vec<Handle>, node: &Handle) {
    if !nodes.iter().any(|n| Rc::ptr_eq(n, node)) {
        nodes.push(node.clone());
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Shared inputs of every page compilation in a build.
#[derive(Debug, Clone, Copy)]
pub struct CompileEnv<'a> {
    pub config: &'a BundlerConfig,
    pub transformers: &'a Transformers,
    pub cache: &'a InlineCache,
}

/// A compiled page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutput {
    pub html: String,
    /// Contents this page contributes to the build-wide bundle files.
    pub bundles: PageBundles,
}

/// Run the full pipeline over a rendered page.
pub fn compile_page(result: &RenderResult, url: &str, env: &CompileEnv<'_>) -> Result<PageOutput> {
    let document = Document::parse(&result.html);
    dedup_head(&document);

    let mut page = PageContext::new(url, result, env.config);
    page.resolve_named(&document);
    page.resolve_wildcards();
    page.process_inline(env.transformers, env.cache);

    let html = document
        .to_html()
        .with_context(|| format!("failed to serialize page {url}"))?;
    let html = resolve_html_bundles(&html, result, url);
    let html = minify_page(&html, env.config.html.minify).into_owned();

    Ok(PageOutput {
        html,
        bundles: page.into_bundles(),
    })
}
