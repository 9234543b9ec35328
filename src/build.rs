//! Build-wide bundling.
//!
//! A [`Bundler`] lives for the whole process. Pages are compiled through it
//! (possibly in parallel), each one replacing its own entry in the global
//! bundle table; `after_build` then writes one file per bundle name.
//!
//! # Architecture
//!
//! ```text
//! before_build(input_dir)
//!     │
//! compile_page() × N ──► render_page → compiler::compile_page
//!     │                      │
//!     │                      └── PageBundles → global table[input_path]
//!     │
//! after_build(output_root)
//!     │
//!     ├── combine tables (page order, chunk dedup)
//!     ├── skip bundles whose hash is unchanged
//!     └── transform + write in parallel ──► <name>.css / <name>.js (+ .map)
//! ```

use crate::{
    bundle::{AssetType, ImportResolver},
    compiler::{self, CompileEnv, InlineCache, PageBundles},
    config::BundlerConfig,
    render::{BundleMap, Component, render_page},
    transform::{TransformError, TransformOptions, Transformers},
    utils::hash::content_hash,
};
use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};
use thiserror::Error;

// ============================================================================
// Host Integration
// ============================================================================

/// Services the surrounding build tool offers to the bundler.
pub trait BuildHost: Sync {
    /// Declare files a page depends on, so the host can rebuild the page
    /// when one of them changes.
    fn add_dependencies(&self, input_path: &Path, deps: &[PathBuf]);
}

/// Host that ignores dependency declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl BuildHost for NoopHost {
    fn add_dependencies(&self, _input_path: &Path, _deps: &[PathBuf]) {}
}

/// Identity of the page being compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Public URL, used in diagnostics and inline filenames.
    pub url: String,
    /// Source path, the page's key in the global bundle table.
    pub input_path: PathBuf,
}

impl PageInfo {
    pub fn new(url: impl Into<String>, input_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            input_path: input_path.into(),
        }
    }
}

/// Final HTML of one page plus the files it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPage {
    pub html: String,
    pub dependencies: Vec<PathBuf>,
}

/// One page of a parallel batch.
pub struct PageJob<'a, C: Component + ?Sized> {
    pub page: &'a C,
    pub props: &'a C::Props,
    pub info: PageInfo,
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal bundle flush failures. The first one aborts the flush.
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("failed to process {asset} bundle `{name}`\n{report}")]
    Transform {
        asset: AssetType,
        name: String,
        report: String,
        #[source]
        source: TransformError,
    },

    #[error("failed to write {asset} bundle `{name}` to {}", path.display())]
    Write {
        asset: AssetType,
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create bundle directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Hash Cache
// ============================================================================

/// Content hash of every bundle file written so far, keyed by output path.
///
/// Lives for the process; with `[cache] persist = true` it is also loaded
/// from and saved to a JSON file under the output root.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HashCache {
    hashes: BTreeMap<PathBuf, String>,
    #[serde(skip)]
    loaded: bool,
}

impl HashCache {
    /// Load a persisted cache. A missing or unreadable file yields an empty
    /// cache; the next flush rewrites it.
    pub fn load(path: &Path, quiet: bool) -> Self {
        let mut cache = fs::read_to_string(path)
            .ok()
            .and_then(|content| match serde_json::from_str::<Self>(&content) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    log!(
                        "warn", quiet = quiet;
                        "ignoring corrupt bundle cache {}: {}",
                        path.display(),
                        e
                    );
                    None
                }
            })
            .unwrap_or_default();
        cache.loaded = true;
        cache
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to save bundle cache {}", path.display()))
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.hashes.get(path).map(String::as_str)
    }

    /// Whether `path` already holds content with `hash`.
    pub fn is_fresh(&self, path: &Path, hash: &str) -> bool {
        self.get(path) == Some(hash) && path.exists()
    }

    pub fn record(&mut self, path: PathBuf, hash: String) {
        self.hashes.insert(path, hash);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

// ============================================================================
// Bundler
// ============================================================================

/// Outcome of a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub written: usize,
    /// Bundles whose file already had identical content.
    pub unchanged: usize,
}

/// A bundle file to produce.
#[derive(Debug)]
struct BundleJob {
    asset: AssetType,
    name: String,
    content: String,
    hash: String,
    path: PathBuf,
}

/// Process-wide bundler state.
#[derive(Debug)]
pub struct Bundler {
    config: BundlerConfig,
    transformers: Transformers,
    inline_cache: InlineCache,
    /// URL-referenced bundle contents, keyed by page input path.
    pages: RwLock<BTreeMap<PathBuf, PageBundles>>,
    hashes: Mutex<HashCache>,
}

impl Bundler {
    pub fn new(config: BundlerConfig) -> Result<Self> {
        Self::with_transformers(config, Transformers::default())
    }

    pub fn with_transformers(config: BundlerConfig, transformers: Transformers) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transformers,
            inline_cache: InlineCache::default(),
            pages: RwLock::default(),
            hashes: Mutex::default(),
        })
    }

    pub const fn config(&self) -> &BundlerConfig {
        &self.config
    }

    pub const fn inline_cache(&self) -> &InlineCache {
        &self.inline_cache
    }

    /// Record the build's input directory. Bundle tables of earlier builds
    /// are kept so incremental rebuilds still write every page's bundles.
    pub fn before_build(&mut self, input_dir: &Path) {
        self.config.input_dir = input_dir.to_path_buf();
    }

    /// Import resolver for assets declared next to `source_file`.
    pub fn resolver(&self, source_file: &Path) -> ImportResolver {
        ImportResolver::for_file(&self.config.input_dir, source_file)
    }

    /// Render and compile one page.
    pub fn compile_page<C>(
        &self,
        page: &C,
        props: &C::Props,
        info: &PageInfo,
        host: &dyn BuildHost,
    ) -> Result<CompiledPage>
    where
        C: Component + ?Sized,
    {
        let result = render_page(page, props)
            .with_context(|| format!("failed to render page {}", info.url))?;

        let dependencies: Vec<PathBuf> = result.all_deps().cloned().collect();
        host.add_dependencies(&info.input_path, &dependencies);

        let env = CompileEnv {
            config: &self.config,
            transformers: &self.transformers,
            cache: &self.inline_cache,
        };
        let output = compiler::compile_page(&result, &info.url, &env)?;

        // Recompiling a page replaces its previous contribution
        self.pages.write().insert(info.input_path.clone(), output.bundles);

        Ok(CompiledPage {
            html: output.html,
            dependencies,
        })
    }

    /// Compile a batch of pages in parallel. Results keep the input order.
    pub fn compile_pages<C>(
        &self,
        jobs: &[PageJob<'_, C>],
        host: &dyn BuildHost,
    ) -> Vec<Result<CompiledPage>>
    where
        C: Component + Sync + ?Sized,
        C::Props: Sync,
    {
        jobs.par_iter()
            .map(|job| self.compile_page(job.page, job.props, &job.info, host))
            .collect()
    }

    /// Every page's contributions to `asset`, merged in page order with
    /// duplicate chunks dropped.
    pub fn global_bundles(&self, asset: AssetType) -> BundleMap {
        let pages = self.pages.read();
        let mut combined = BundleMap::new();
        for bundles in pages.values().filter_map(|page| page.get(asset)) {
            for (name, chunks) in bundles {
                combined
                    .entry(name.clone())
                    .or_default()
                    .extend(chunks.iter().cloned());
            }
        }
        combined
    }

    /// Write every bundle file of the build.
    pub fn after_build(&self, output_root: &Path) -> Result<FlushStats> {
        self.flush(output_root)
    }

    /// Drop the bundle contributions of a deleted page. The next flush no
    /// longer includes them. Returns whether the page was known.
    pub fn forget_page(&self, input_path: &Path) -> bool {
        self.pages.write().remove(input_path).is_some()
    }

    /// Forget every page's contributions and all cached hashes.
    pub fn reset(&self) {
        self.pages.write().clear();
        *self.hashes.lock() = HashCache::default();
        self.inline_cache.clear();
    }

    // ========================================================================
    // Flush
    // ========================================================================

    fn flush(&self, output_root: &Path) -> Result<FlushStats> {
        let cache_path = self.config.cache_path(output_root);
        if let Some(path) = &cache_path {
            let mut hashes = self.hashes.lock();
            if !hashes.loaded {
                *hashes = HashCache::load(path, self.config.quiet);
            }
        }

        let jobs = self.collect_jobs(output_root);
        let (stale, fresh): (Vec<_>, Vec<_>) = {
            let hashes = self.hashes.lock();
            jobs.into_iter()
                .partition(|job| !hashes.is_fresh(&job.path, &job.hash))
        };
        let mut stats = FlushStats {
            written: 0,
            unchanged: fresh.len(),
        };

        let dirs: BTreeSet<&Path> = stale.iter().filter_map(|job| job.path.parent()).collect();
        for dir in dirs {
            fs::create_dir_all(dir).map_err(|source| FlushError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let has_error = AtomicBool::new(false);
        let written = Mutex::new(Vec::with_capacity(stale.len()));
        let result = stale.par_iter().try_for_each(|job| {
            if has_error.load(Ordering::Relaxed) {
                return Ok(());
            }
            match self.write_bundle(job) {
                Ok(()) => {
                    written.lock().push((job.path.clone(), job.hash.clone()));
                    Ok(())
                }
                Err(e) => {
                    has_error.store(true, Ordering::Relaxed);
                    Err(e)
                }
            }
        });

        {
            let mut hashes = self.hashes.lock();
            let written = written.into_inner();
            stats.written = written.len();
            for (path, hash) in written {
                hashes.record(path, hash);
            }
            if let Some(path) = &cache_path {
                hashes.save(path)?;
            }
        }

        result?;
        Ok(stats)
    }

    fn collect_jobs(&self, output_root: &Path) -> Vec<BundleJob> {
        let mut jobs = Vec::new();
        for asset in [AssetType::Css, AssetType::Js] {
            for (name, chunks) in self.global_bundles(asset) {
                let content: String = chunks.iter().map(String::as_str).collect();
                if content.is_empty() {
                    continue;
                }
                let Some(path) = self.config.bundle_path(output_root, asset, &name) else {
                    continue;
                };
                jobs.push(BundleJob {
                    asset,
                    hash: content_hash(&content),
                    name,
                    content,
                    path,
                });
            }
        }
        jobs
    }

    fn write_bundle(&self, job: &BundleJob) -> Result<(), FlushError> {
        let (Some(transformer), Some(options)) = (
            self.transformers.get(job.asset),
            self.config.output_options(job.asset),
        ) else {
            return Ok(());
        };

        let file_name = format!("{}.{}", job.name, job.asset.extension());
        let transform_options = TransformOptions {
            filename: &file_name,
            minify: options.minify,
            source_map: options.source_maps,
        };
        let output = transformer
            .transform(&job.content, &transform_options)
            .map_err(|source| FlushError::Transform {
                asset: job.asset,
                name: job.name.clone(),
                report: source.report(&file_name, &job.content),
                source,
            })?;

        let write_error = |path: &Path, source| FlushError::Write {
            asset: job.asset,
            name: job.name.clone(),
            path: path.to_path_buf(),
            source,
        };

        let mut code = output.code;
        if let Some(map) = &output.map {
            let map_name = format!("{file_name}.map");
            code.push_str(&source_map_comment(job.asset, &map_name));
            let map_path = job.path.with_file_name(&map_name);
            fs::write(&map_path, map).map_err(|e| write_error(&map_path, e))?;
        } else if options.source_maps {
            log!(
                "warn", quiet = self.config.quiet;
                "{} transformer produced no source map for {}",
                job.asset,
                file_name
            );
        }

        log!(
            "bundle", quiet = self.config.quiet;
            "writing {} bundle {} to {}",
            job.asset,
            job.name,
            job.path.display()
        );
        fs::write(&job.path, code).map_err(|e| write_error(&job.path, e))
    }
}

fn source_map_comment(asset: AssetType, map_name: &str) -> String {
    match asset {
        AssetType::Js => format!("\n//# sourceMappingURL=./{map_name}"),
        _ => format!("/*# sourceMappingURL=./{map_name} */"),
    }
}

// ============================================================================
// Tests
// ============================================================================
