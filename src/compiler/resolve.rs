//! Bundle reference resolution: named references first, then wildcards.
//!
//! | Node                            | Named reference              | Wildcard (`*`)              |
//! |---------------------------------|------------------------------|-----------------------------|
//! | `<link rel=stylesheet href>`    | href -> bundle URL           | one clone per unconsumed    |
//! | `<link rel=preload as=style>`   | same, consumes only if lazy  | same                        |
//! | `<script src>`                  | src -> bundle URL            | one clone per unconsumed    |
//! | `<style>` / inline `<script>`   | placeholder -> content       | all unconsumed, `\n`-joined |

use super::{PageContext, Phase, push_unique};
use crate::bundle::{
    AssetType, WILDCARD_BUNDLE_NAME, inline_placeholder, inline_placeholder_regex, is_wildcard,
    parse_src_placeholder,
};
use regex::{Captures, Regex};
use std::{mem, sync::LazyLock};
use yeti_dom::{
    Action, Document, Handle, attr, deep_clone, detach, parent_of, remove_attr, replace_with,
    set_attr, set_text, tag_name, text_content, walk,
};

/// Attribute that excludes a `<style>`/`<script>` from minification.
pub const SKIP_PROCESSING_ATTR: &str = "data-skip-inline-processing";

/// `onload` handler that swaps a preload link into a stylesheet.
static LAZY_PRELOAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^A-Za-z0-9_$])this\.rel[ \t\r\n]*=[ \t\r\n]*['"`]stylesheet['"`]"#).unwrap()
});

/// `type` values of scripts that hold JavaScript.
const JS_SCRIPT_TYPES: &[&str] = &[
    "",
    "module",
    "text/javascript",
    "application/javascript",
    "text/ecmascript",
    "application/ecmascript",
];

#[inline]
const fn tag_for(asset: AssetType) -> &'static str {
    match asset {
        AssetType::Js => "script",
        _ => "style",
    }
}

#[inline]
const fn url_attr_for(asset: AssetType) -> &'static str {
    match asset {
        AssetType::Js => "src",
        _ => "href",
    }
}

fn is_javascript(node: &Handle) -> bool {
    attr(node, "type").is_none_or(|ty| JS_SCRIPT_TYPES.contains(&ty.trim().to_ascii_lowercase().as_str()))
}

impl PageContext<'_> {
    // ========================================================================
    // Named References
    // ========================================================================

    /// Resolve every named reference in the document and collect wildcard
    /// references for [`resolve_wildcards`](Self::resolve_wildcards).
    pub fn resolve_named(&mut self, document: &Document) {
        debug_assert_eq!(self.phase, Phase::Unresolved);

        walk(document.root(), &mut |node| match tag_name(node) {
            Some("link") => self.visit_link(node),
            Some("script") => self.visit_script(node),
            Some("style") => self.visit_inline(node, AssetType::Css),
            _ => Action::Continue,
        });

        self.phase = Phase::NamedResolved;
    }

    fn visit_link(&mut self, node: &Handle) -> Action {
        let Some(rel) = attr(node, "rel") else {
            return Action::Continue;
        };

        let mut is_preload = false;
        let mut is_lazy_preload = false;
        if rel == "preload" {
            is_preload = true;
            if attr(node, "as").is_some_and(|value| value != "style") {
                return Action::Continue;
            }
            is_lazy_preload =
                attr(node, "onload").is_some_and(|onload| LAZY_PRELOAD_RE.is_match(&onload));
        } else if rel != "stylesheet" {
            return Action::Continue;
        }

        let Some(href) = attr(node, "href") else {
            return Action::Continue;
        };
        let Some(name) = parse_src_placeholder(&href) else {
            return Action::Continue;
        };

        if is_wildcard(name) {
            push_unique(&mut self.css.wildcard_src, node);
            return Action::Continue;
        }

        // An eager preload is not a guaranteed use of the stylesheet
        if !is_preload || is_lazy_preload {
            self.css.unconsumed.shift_remove(name);
        }
        self.reference_by_url(node, AssetType::Css, name)
    }

    fn visit_script(&mut self, node: &Handle) -> Action {
        let Some(src) = attr(node, "src") else {
            if !is_javascript(node) {
                return Action::Continue;
            }
            return self.visit_inline(node, AssetType::Js);
        };

        let Some(name) = parse_src_placeholder(&src) else {
            return Action::Continue;
        };
        if is_wildcard(name) {
            push_unique(&mut self.js.wildcard_src, node);
            return Action::Continue;
        }

        self.js.unconsumed.shift_remove(name);
        self.reference_by_url(node, AssetType::Js, name)
    }

    /// Point `node` at the bundle file of `name` and record the content for
    /// the build-wide bundle. Unknown bundles remove the node.
    fn reference_by_url(&mut self, node: &Handle, asset: AssetType, name: &str) -> Action {
        let Some(content) = self.bundle_content(asset, name) else {
            log!(
                "error";
                "{asset} bundle \"{name}\" is unused on page {}, removing <{}> tag",
                self.url,
                tag_name(node).unwrap_or_default()
            );
            return Action::Remove;
        };

        self.bundles.record(asset, name, content);
        if let Some(url) = self.config.bundle_url(asset, name) {
            set_attr(node, url_attr_for(asset), &url);
        }
        Action::Continue
    }

    /// `<style>` or inline `<script>`: substitute named inline placeholders.
    fn visit_inline(&mut self, node: &Handle, asset: AssetType) -> Action {
        let tag = tag_for(asset);
        let skip_processing =
            remove_attr(node, SKIP_PROCESSING_ATTR).is_some_and(|value| value != "false");

        let text = text_content(node);
        let text = text.trim();
        if text.is_empty() {
            log!("warn", quiet = self.config.quiet; "empty <{tag}> tag on page {}, removing", self.url);
            return Action::Remove;
        }

        let mut has_wildcard = false;
        let resolved = inline_placeholder_regex().replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            if is_wildcard(name) {
                has_wildcard = true;
                return caps[0].to_owned();
            }

            self.state(asset).unconsumed.shift_remove(name);
            self.bundle_content(asset, name).unwrap_or_else(|| {
                log!(
                    "error";
                    "no {asset} bundle named \"{name}\" to inline on page {}",
                    self.url
                );
                String::new()
            })
        });

        let resolved = resolved.trim();
        if resolved.is_empty() {
            log!(
                "warn", quiet = self.config.quiet;
                "empty <{tag}> tag on page {} after resolving bundles, removing",
                self.url
            );
            return Action::Remove;
        }

        set_text(node, resolved);
        let state = self.state(asset);
        if has_wildcard {
            push_unique(&mut state.wildcard_inline, node);
        }
        if !skip_processing {
            push_unique(&mut state.to_process, node);
        }
        Action::Continue
    }

    // ========================================================================
    // Wildcards
    // ========================================================================

    /// Expand wildcard references into the bundles no named reference
    /// consumed: css links, css inline, js scripts, js inline, in that order.
    pub fn resolve_wildcards(&mut self) {
        debug_assert_eq!(self.phase, Phase::NamedResolved);

        for asset in [AssetType::Css, AssetType::Js] {
            let remaining: Vec<String> = self.state(asset).unconsumed.iter().cloned().collect();

            let src_nodes = mem::take(&mut self.state(asset).wildcard_src);
            for node in &src_nodes {
                self.expand_src_wildcard(node, asset, &remaining);
            }

            let inline_nodes = mem::take(&mut self.state(asset).wildcard_inline);
            if !inline_nodes.is_empty() {
                let combined = self.combined_content(asset, &remaining);
                for node in &inline_nodes {
                    self.expand_inline_wildcard(node, asset, &combined);
                }
            }
        }

        self.phase = Phase::WildcardResolved;
    }

    fn expand_src_wildcard(&mut self, node: &Handle, asset: AssetType, remaining: &[String]) {
        if parent_of(node).is_none() {
            return;
        }

        let mut clones = Vec::with_capacity(remaining.len());
        for name in remaining {
            let Some(content) = self.bundle_content(asset, name) else {
                continue;
            };
            self.bundles.record(asset, name, content);

            let clone = deep_clone(node);
            if let Some(url) = self.config.bundle_url(asset, name) {
                set_attr(&clone, url_attr_for(asset), &url);
            }
            clones.push(clone);
        }
        replace_with(node, clones);
    }

    /// Every remaining bundle's chunks joined with `\n`, bundles joined with `\n`.
    fn combined_content(&self, asset: AssetType, remaining: &[String]) -> String {
        let bundles = self.result.bundles(asset);
        let combined = remaining
            .iter()
            .filter_map(|name| bundles.get(name))
            .map(|chunks| chunks.iter().map(String::as_str).collect::<Vec<_>>().join("\n"))
            .collect::<Vec<_>>()
            .join("\n");
        combined.trim().to_owned()
    }

    fn expand_inline_wildcard(&mut self, node: &Handle, asset: AssetType, combined: &str) {
        let placeholder = inline_placeholder(WILDCARD_BUNDLE_NAME);
        let text = text_content(node);
        let expanded = text.trim().replace(&placeholder, combined);
        let expanded = expanded.trim();

        if expanded.is_empty() {
            log!(
                "warn", quiet = self.config.quiet;
                "empty <{}> tag on page {} after expanding wildcard bundle, removing",
                tag_for(asset),
                self.url
            );
            detach(node);
            return;
        }
        set_text(node, expanded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PageBundles;
    use crate::compiler::tests::page;
    use crate::config::BundlerConfig;
    use crate::render::RenderResult;
    use yeti_dom::{children, query_element};

    fn resolve(result: &RenderResult) -> (String, PageBundles) {
        let config = BundlerConfig::default();
        let document = Document::parse(&result.html);
        let mut page = PageContext::new("/p/", result, &config);
        page.resolve_named(&document);
        page.resolve_wildcards();
        (document.to_html().unwrap(), page.into_bundles())
    }

    fn body(html: &str) -> String {
        format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>")
    }

    #[test]
    fn test_wildcard_link_expands_to_unconsumed() {
        let result = page(
            &body(
                "<link rel=\"stylesheet\" href=\"@bundle/a\">\
                 <link rel=\"stylesheet\" href=\"@bundle/*\">",
            ),
            &[("a", "a{}"), ("b", "b{}"), ("c", "c{}")],
            &[],
        );
        let (html, bundles) = resolve(&result);

        assert_eq!(html.matches("/css/a.css").count(), 1);
        assert_eq!(html.matches("/css/b.css").count(), 1);
        assert_eq!(html.matches("/css/c.css").count(), 1);
        assert!(!html.contains("@bundle"));
        assert!(html.find("/css/b.css") < html.find("/css/c.css"));
        let names: Vec<_> = bundles.css.keys().cloned().collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_wildcard_with_nothing_left_removes_node() {
        let result = page(
            &body(
                "<link rel=\"stylesheet\" href=\"@bundle/*\">\
                 <link rel=\"stylesheet\" href=\"@bundle/a\">",
            ),
            &[("a", "a{}")],
            &[],
        );
        let (html, _) = resolve(&result);
        assert_eq!(html.matches("<link").count(), 1);
    }

    #[test]
    fn test_unknown_named_bundle_removes_link() {
        let result = page(
            &body("<link rel=\"stylesheet\" href=\"@bundle/missing\"><p>kept</p>"),
            &[],
            &[],
        );
        let (html, bundles) = resolve(&result);
        assert!(!html.contains("<link"));
        assert!(html.contains("<p>kept</p>"));
        assert!(bundles.is_empty());
    }

    #[test]
    fn test_non_bundle_links_untouched() {
        let result = page(
            &body(
                "<link rel=\"icon\" href=\"@bundle/a\">\
                 <link rel=\"stylesheet\" href=\"/static/site.css\">\
                 <link href=\"@bundle/a\">",
            ),
            &[("a", "a{}")],
            &[],
        );
        let (html, bundles) = resolve(&result);
        assert_eq!(html.matches("@bundle/a").count(), 2);
        assert!(html.contains("/static/site.css"));
        assert!(bundles.is_empty());
    }

    #[test]
    fn test_eager_preload_does_not_consume() {
        let result = page(
            &body(
                "<link rel=\"preload\" as=\"style\" href=\"@bundle/a\">\
                 <link rel=\"stylesheet\" href=\"@bundle/*\">",
            ),
            &[("a", "a{}")],
            &[],
        );
        let (html, _) = resolve(&result);
        // preload resolved + wildcard clone for the still-unconsumed bundle
        assert_eq!(html.matches("/css/a.css").count(), 2);
    }

    #[test]
    fn test_lazy_preload_consumes() {
        let result = page(
            &body(
                "<link rel=\"preload\" as=\"style\" href=\"@bundle/a\" onload=\"this.onload=null;this.rel='stylesheet'\">\
                 <link rel=\"stylesheet\" href=\"@bundle/*\">",
            ),
            &[("a", "a{}")],
            &[],
        );
        let (html, _) = resolve(&result);
        assert_eq!(html.matches("/css/a.css").count(), 1);
    }

    #[test]
    fn test_preload_for_other_types_is_ignored() {
        let result = page(
            &body("<link rel=\"preload\" as=\"font\" href=\"@bundle/a\">"),
            &[("a", "a{}")],
            &[],
        );
        let (html, _) = resolve(&result);
        assert!(html.contains("href=\"@bundle/a\""));
    }

    #[test]
    fn test_lazy_preload_regex() {
        assert!(LAZY_PRELOAD_RE.is_match("this.rel='stylesheet'"));
        assert!(LAZY_PRELOAD_RE.is_match("this.onload=null; this.rel = \"stylesheet\""));
        assert!(!LAZY_PRELOAD_RE.is_match("that.rel='stylesheet'"));
        assert!(!LAZY_PRELOAD_RE.is_match("this.rel='preload'"));
    }

    #[test]
    fn test_inline_style_named_and_wildcard() {
        let result = page(
            &body(
                "<style>/*@--BUNDLE--a--@*/</style>\
                 <style>/*@--BUNDLE--*--@*/</style>",
            ),
            &[("a", "a{}"), ("b", "b1{}"), ("b", "b2{}"), ("c", "c{}")],
            &[],
        );
        let (html, bundles) = resolve(&result);

        assert!(html.contains("<style>a{}</style>"));
        assert!(html.contains("<style>b1{}\nb2{}\nc{}</style>"));
        assert!(bundles.is_empty());
    }

    #[test]
    fn test_named_inline_joins_chunks_without_separator() {
        let result = page(
            &body("<style>/*@--BUNDLE--a--@*/</style>"),
            &[("a", "x{}"), ("a", "y{}")],
            &[],
        );
        let (html, _) = resolve(&result);
        assert!(html.contains("<style>x{}y{}</style>"));
    }

    #[test]
    fn test_missing_inline_bundle_empties_and_removes_tag() {
        let result = page(&body("<style>/*@--BUNDLE--nope--@*/</style><style>  </style>"), &[], &[]);
        let (html, _) = resolve(&result);
        assert!(!html.contains("<style"));
    }

    #[test]
    fn test_inline_wildcard_with_nothing_left_removes_tag() {
        let result = page(
            &body("<style>/*@--BUNDLE--a--@*/</style><style>/*@--BUNDLE--*--@*/</style>"),
            &[("a", "a{}")],
            &[],
        );
        let (html, _) = resolve(&result);
        assert_eq!(html.matches("<style>").count(), 1);
    }

    #[test]
    fn test_script_src_named_and_wildcard() {
        let result = page(
            &body(
                "<script src=\"@bundle/main\" defer></script>\
                 <script type=\"module\" src=\"@bundle/*\"></script>\
                 <script src=\"/vendor.js\"></script>",
            ),
            &[],
            &[("main", "{\nmain()\n}"), ("extra", "{\nextra()\n}")],
        );
        let (html, bundles) = resolve(&result);

        assert!(html.contains("<script src=\"/js/main.js\" defer=\"\"></script>"));
        assert!(html.contains("<script type=\"module\" src=\"/js/extra.js\"></script>"));
        assert!(html.contains("src=\"/vendor.js\""));
        let names: Vec<_> = bundles.js.keys().cloned().collect();
        assert_eq!(names, ["main", "extra"]);
    }

    #[test]
    fn test_inline_script_and_skip_attribute() {
        let result = page(
            &body(
                "<script data-skip-inline-processing>/*@--BUNDLE--a--@*/</script>\
                 <script data-skip-inline-processing=\"false\">/*@--BUNDLE--*--@*/</script>\
                 <script type=\"application/ld+json\">{\"a\": 1}</script>",
            ),
            &[],
            &[("a", "{\na()\n}"), ("b", "{\nb()\n}")],
        );
        let config = BundlerConfig::default();
        let document = Document::parse(&result.html);
        let mut page = PageContext::new("/", &result, &config);
        page.resolve_named(&document);
        page.resolve_wildcards();
        let html = document.to_html().unwrap();

        assert!(!html.contains(SKIP_PROCESSING_ATTR));
        assert!(html.contains("<script>{\na()\n}</script>"));
        assert!(html.contains("<script>{\nb()\n}</script>"));
        assert!(html.contains("{\"a\": 1}"));
        // only the `="false"` script is queued for minification
        assert_eq!(page.js.to_process.len(), 1);
    }

    #[test]
    fn test_clones_are_parented_in_place() {
        let result = page(
            &body("<i></i><link rel=\"stylesheet\" href=\"@bundle/*\"><b></b>"),
            &[("x", "x{}"), ("y", "y{}")],
            &[],
        );
        let config = BundlerConfig::default();
        let document = Document::parse(&result.html);
        let mut page = PageContext::new("/", &result, &config);
        page.resolve_named(&document);
        page.resolve_wildcards();

        let body = query_element(document.root(), &|n| tag_name(n) == Some("body")).unwrap();
        let tags: Vec<_> = children(&body)
            .iter()
            .map(|n| {
                assert!(std::rc::Rc::ptr_eq(&parent_of(n).unwrap(), &body));
                tag_name(n).unwrap_or_default().to_owned()
            })
            .collect();
        assert_eq!(tags, ["i", "link", "link", "b"]);
    }
}
