//! Build-time asset bundler for component-rendered pages.
//!
//! Components render HTML fragments tagged with named CSS/JS/HTML bundles.
//! Each page is then post-processed: `<head>` content is deduplicated,
//! bundle placeholders are rewritten into URLs or inlined content, inline
//! styles and scripts are minified, and every bundle referenced by URL is
//! aggregated across pages into one content-hashed output file per bundle.
//!
//! # Modules
//!
//! | Module      | Purpose                                              |
//! |-------------|------------------------------------------------------|
//! | `bundle`    | Descriptors, placeholders, asset templates           |
//! | `render`    | Render results, element builder, components          |
//! | `compiler`  | Per-page pipeline (head dedup, resolution, minify)   |
//! | `transform` | CSS/JS transformers and code-frame diagnostics       |
//! | `build`     | Build-wide aggregator and bundle file writer         |
//! | `config`    | `yeti.toml` configuration                            |
//!
//! # Example
//!
//! ```ignore
//! use yeti::{Bundler, BundlerConfig, NoopHost, PageInfo};
//!
//! let mut bundler = Bundler::new(BundlerConfig::default())?;
//! bundler.before_build(Path::new("site"));
//! let page = bundler.compile_page(&HomePage, &props, &PageInfo::new("/", "site/index.page.rs"), &NoopHost)?;
//! bundler.after_build(Path::new("dist"))?;
//! ```

#[macro_use]
pub mod logger;

pub mod build;
pub mod bundle;
pub mod compiler;
pub mod config;
pub mod render;
pub mod transform;
pub mod utils;

pub use build::{BuildHost, Bundler, CompiledPage, FlushError, FlushStats, NoopHost, PageInfo, PageJob};
pub use bundle::{
    AssetHelpers, AssetType, BundleDescriptor, BundleError, CSS, HTML, ImportResolver, JS,
    Template,
};
pub use config::BundlerConfig;
pub use render::{
    Child, Component, Element, FnComponent, RenderResult, Rendered, head, render_component,
    render_page,
};
