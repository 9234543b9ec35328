//! HTML bundle placeholders.
//!
//! `HTML.inline(name)` placeholders left in the serialized page (after every
//! `<style>`/`<script>` placeholder has been consumed) are replaced by the
//! raw content of the page's HTML bundles: named ones first, then the
//! wildcard with every bundle no named placeholder used.

use crate::bundle::{AssetType, WILDCARD_BUNDLE_NAME, inline_placeholder, inline_placeholder_regex, is_wildcard};
use crate::render::RenderResult;
use indexmap::IndexSet;
use regex::Captures;

pub fn resolve_html_bundles(html: &str, result: &RenderResult, url: &str) -> String {
    let mut unconsumed: IndexSet<&str> = result.html_bundles.keys().map(String::as_str).collect();
    let mut has_wildcard = false;

    let named = inline_placeholder_regex().replace_all(html, |caps: &Captures<'_>| {
        let name = &caps[1];
        if is_wildcard(name) {
            has_wildcard = true;
            return caps[0].to_owned();
        }
        unconsumed.shift_remove(name);
        result
            .bundle_content(AssetType::Html, name)
            .unwrap_or_else(|| {
                log!("error"; "no html bundle named \"{name}\" to inline on page {url}");
                String::new()
            })
    });

    if !has_wildcard {
        return named.into_owned();
    }

    let combined = unconsumed
        .iter()
        .filter_map(|name| result.html_bundles.get(*name))
        .map(|chunks| chunks.iter().map(String::as_str).collect::<Vec<_>>().join("\n"))
        .collect::<Vec<_>>()
        .join("\n");
    named.replace(&inline_placeholder(WILDCARD_BUNDLE_NAME), combined.trim())
}
