//! Inline `<style>` / `<script>` processing.
//!
//! Resolved inline text goes through the build's transformers. Identical
//! payloads are transformed once per build: results are cached by asset type
//! and content hash, shared by every page.

use super::{PageContext, Phase};
use crate::bundle::AssetType;
use crate::transform::{TransformOptions, Transformers};
use crate::utils::hash::content_hash;
use parking_lot::RwLock;
use std::{collections::HashMap, mem};
use yeti_dom::{Handle, detach, parent_of, set_text, text_content};

/// Build-wide cache of transformed inline content.
#[derive(Debug, Default)]
pub struct InlineCache {
    entries: RwLock<HashMap<(AssetType, String), String>>,
}

impl InlineCache {
    pub fn get(&self, asset: AssetType, hash: &str) -> Option<String> {
        self.entries.read().get(&(asset, hash.to_owned())).cloned()
    }

    pub fn insert(&self, asset: AssetType, hash: String, code: String) {
        self.entries.write().insert((asset, hash), code);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl PageContext<'_> {
    /// Transform the text of every queued inline node, css first.
    pub fn process_inline(&mut self, transformers: &Transformers, cache: &InlineCache) {
        debug_assert_eq!(self.phase, Phase::WildcardResolved);

        for asset in [AssetType::Css, AssetType::Js] {
            let nodes = mem::take(&mut self.state(asset).to_process);
            let attached = nodes.iter().filter(|node| parent_of(node).is_some());
            for (index, node) in attached.enumerate() {
                self.process_node(node, index, asset, transformers, cache);
            }
        }

        self.phase = Phase::Minified;
    }

    fn process_node(
        &self,
        node: &Handle,
        index: usize,
        asset: AssetType,
        transformers: &Transformers,
        cache: &InlineCache,
    ) {
        let tag = match asset {
            AssetType::Js => "script",
            _ => "style",
        };
        let text = text_content(node).trim().to_owned();
        let hash = content_hash(&text);

        let processed = match cache.get(asset, &hash) {
            Some(code) => code,
            None => self.transform(&text, hash, index, asset, tag, transformers, cache),
        };

        if processed.is_empty() {
            log!(
                "warn", quiet = self.config.quiet;
                "empty <{tag}> tag on page {} after processing, removing",
                self.url
            );
            detach(node);
        } else {
            set_text(node, &processed);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn transform(
        &self,
        text: &str,
        hash: String,
        index: usize,
        asset: AssetType,
        tag: &str,
        transformers: &Transformers,
        cache: &InlineCache,
    ) -> String {
        let (Some(transformer), Some(options)) =
            (transformers.get(asset), self.config.output_options(asset))
        else {
            return text.to_owned();
        };

        let filename = format!(
            "{}__<{tag}>({index}).{}",
            urlencoding::encode(self.url),
            asset.extension()
        );
        let transform_options = TransformOptions {
            filename: &filename,
            minify: options.minify,
            source_map: false,
        };

        match transformer.transform(text, &transform_options) {
            Ok(output) => {
                let code = match asset {
                    AssetType::Js => output.code.trim_end().to_owned(),
                    _ => output.code,
                };
                cache.insert(asset, hash, code.clone());
                code
            }
            Err(err) => {
                log!(
                    "error";
                    "failed to process inline {asset} on page {}, keeping it untransformed\n{}",
                    self.url,
                    err.report(&filename, text)
                );
                text.to_owned()
            }
        }
    }
}
