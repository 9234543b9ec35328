//! Head deduplication.
//!
//! Every `<head>` and `<head-->` container in the page is emptied into one
//! ordered key -> node map and removed; a fresh `<head>` holding the map's
//! nodes is then prepended to `<html>`.
//!
//! | Child                      | Key                               |
//! |----------------------------|-----------------------------------|
//! | `<title>`                  | `title`                           |
//! | `<meta name/charset/..>`   | `meta[<attr>="<value>"]` per attr |
//! | `<link>`                   | `link[rel=".."][href=".."]`       |
//! | `<script src>`             | `script[src=".."]`                |
//! | `<script>` (inline)        | `script/<content hash>`           |
//! | `<style>`                  | `style/<content hash>`            |
//! | anything else              | `#<n>` (always kept)              |
//!
//! A later node replaces the value of an existing key but keeps the key's
//! first position, so output order is stable across builds.

use crate::utils::hash::content_hash;
use indexmap::IndexMap;
use std::rc::Rc;
use yeti_dom::{
    Action, Document, Handle, append_child, attr, children, create_element, detach, is_element,
    prepend_child, query_element, tag_name, text_content, walk,
};

/// Tags treated as the page's metadata section.
const HEAD_TAGS: &[&str] = &["head", "head--"];

/// Meta attributes that identify a `<meta>` tag.
const META_KEY_ATTRS: &[&str] = &["name", "charset", "property", "http-equiv"];

#[inline]
pub fn is_head_container(node: &Handle) -> bool {
    tag_name(node).is_some_and(|tag| HEAD_TAGS.contains(&tag))
}

/// Merge every head container of `document` into a single leading `<head>`.
pub fn dedup_head(document: &Document) {
    let mut nodes: IndexMap<String, Handle> = IndexMap::new();
    let mut unique = 0usize;

    walk(document.root(), &mut |node| {
        if !is_head_container(node) {
            return Action::Continue;
        }
        for child in children(node) {
            detach(&child);
            let keys = dedup_keys(&child, &mut unique);
            insert_evicting(&mut nodes, keys, &child);
        }
        Action::Remove
    });

    let Some(html) = query_element(document.root(), &|node| tag_name(node) == Some("html")) else {
        return;
    };

    let head = create_element("head", &[]);
    let mut appended: Vec<Handle> = Vec::with_capacity(nodes.len());
    for node in nodes.into_values() {
        // A meta carrying several key attributes is stored under each of them
        if appended.iter().any(|seen| Rc::ptr_eq(seen, &node)) {
            continue;
        }
        append_child(&head, node.clone());
        appended.push(node);
    }
    prepend_child(&html, head);
}

/// Store `node` under each of `keys`. A node displaced from one of its keys
/// is dropped from every other key it held too.
fn insert_evicting(nodes: &mut IndexMap<String, Handle>, keys: Vec<String>, node: &Handle) {
    let mut displaced: Vec<Handle> = Vec::new();
    for key in keys {
        let Some(old) = nodes.insert(key, node.clone()) else {
            continue;
        };
        if !Rc::ptr_eq(&old, node) && !displaced.iter().any(|d| Rc::ptr_eq(d, &old)) {
            displaced.push(old);
        }
    }
    if !displaced.is_empty() {
        nodes.retain(|_, held| !displaced.iter().any(|d| Rc::ptr_eq(d, held)));
    }
}

fn dedup_keys(node: &Handle, unique: &mut usize) -> Vec<String> {
    let mut next_unique = || {
        *unique += 1;
        format!("#{unique}")
    };

    if !is_element(node) {
        return vec![next_unique()];
    }

    match tag_name(node) {
        Some("title") => vec!["title".to_owned()],
        Some("meta") => {
            let keys: Vec<String> = META_KEY_ATTRS
                .iter()
                .filter_map(|name| attr(node, name).map(|value| format!("meta[{name}=\"{value}\"]")))
                .collect();
            if keys.is_empty() { vec![next_unique()] } else { keys }
        }
        Some("link") => {
            let rel = attr(node, "rel").unwrap_or_default();
            let href = attr(node, "href").unwrap_or_default();
            vec![format!("link[rel=\"{rel}\"][href=\"{href}\"]")]
        }
        Some("script") => match attr(node, "src") {
            Some(src) => vec![format!("script[src=\"{src}\"]")],
            None => vec![format!("script/{}", content_hash(&text_content(node)))],
        },
        Some("style") => vec![format!("style/{}", content_hash(&text_content(node)))],
        _ => vec![next_unique()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_of(document: &Document) -> Handle {
        query_element(document.root(), &|n| tag_name(n) == Some("head")).unwrap()
    }

    fn head_tags(document: &Document) -> Vec<String> {
        children(&head_of(document))
            .iter()
            .filter_map(|n| tag_name(n).map(str::to_owned))
            .collect()
    }

    fn count(html: &str, needle: &str) -> usize {
        html.matches(needle).count()
    }

    #[test]
    fn test_last_meta_wins() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <meta name=\"x\" content=\"first\">\
             <meta name=\"x\" content=\"second\">\
             </head><body></body></html>",
        );
        dedup_head(&document);
        let html = document.to_html().unwrap();

        assert!(!html.contains("first"));
        assert_eq!(count(&html, "content=\"second\""), 1);
    }

    #[test]
    fn test_title_from_nested_layouts() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head><title>Site</title></head>\
             <body><head--><title>Page</title><meta charset=\"utf-8\"></head--><main>x</main></body></html>",
        );
        dedup_head(&document);
        let html = document.to_html().unwrap();

        assert_eq!(count(&html, "<title>"), 1);
        assert!(html.contains("<title>Page</title>"));
        assert!(!html.contains("head--"));
        assert_eq!(head_tags(&document), ["title", "meta"]);
        assert!(html.contains("<main>x</main>"));
    }

    #[test]
    fn test_single_head_is_first_child_of_html() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head><title>A</title></head><body>\
             <head--><link rel=\"stylesheet\" href=\"/a.css\"></head--></body></html>",
        );
        dedup_head(&document);

        let html = query_element(document.root(), &|n| tag_name(n) == Some("html")).unwrap();
        let first = children(&html).into_iter().next().unwrap();
        assert_eq!(tag_name(&first), Some("head"));
        assert_eq!(count(&document.to_html().unwrap(), "<head>"), 1);
    }

    #[test]
    fn test_links_scripts_and_styles() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <link rel=\"stylesheet\" href=\"/a.css\">\
             <link rel=\"stylesheet\" href=\"/a.css\">\
             <link rel=\"preload\" href=\"/a.css\">\
             <script src=\"/a.js\"></script><script src=\"/a.js\"></script>\
             <script>run()</script><script>run()</script><script>other()</script>\
             <style>a{}</style><style>a{}</style>\
             </head><body></body></html>",
        );
        dedup_head(&document);
        let html = document.to_html().unwrap();

        assert_eq!(count(&html, "href=\"/a.css\""), 2);
        assert_eq!(count(&html, "src=\"/a.js\""), 1);
        assert_eq!(count(&html, "run()"), 1);
        assert_eq!(count(&html, "other()"), 1);
        assert_eq!(count(&html, "<style>"), 1);
    }

    #[test]
    fn test_meta_without_key_and_unknown_tags_are_kept() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <meta content=\"a\"><meta content=\"a\">\
             <base href=\"/\"><base href=\"/\">\
             </head><body></body></html>",
        );
        dedup_head(&document);
        let html = document.to_html().unwrap();

        assert_eq!(count(&html, "<meta content=\"a\">"), 2);
        assert_eq!(count(&html, "<base href=\"/\">"), 2);
    }

    #[test]
    fn test_meta_with_several_keys_emitted_once() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <meta name=\"og\" property=\"og:title\" content=\"T\">\
             </head><body></body></html>",
        );
        dedup_head(&document);
        assert_eq!(head_tags(&document), ["meta"]);
    }

    #[test]
    fn test_displaced_meta_loses_every_key() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <meta name=\"a\" property=\"p\" content=\"first\">\
             <meta name=\"a\" content=\"second\">\
             </head><body></body></html>",
        );
        dedup_head(&document);
        let html = document.to_html().unwrap();

        assert_eq!(count(&html, "name=\"a\""), 1);
        assert!(html.contains("content=\"second\""));
        assert!(!html.contains("first"));
        assert_eq!(head_tags(&document), ["meta"]);
    }

    #[test]
    fn test_multi_key_meta_displaces_several() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <meta name=\"a\" content=\"1\"><meta property=\"p\" content=\"2\">\
             <meta name=\"a\" property=\"p\" content=\"3\">\
             </head><body></body></html>",
        );
        dedup_head(&document);
        let html = document.to_html().unwrap();

        assert_eq!(head_tags(&document), ["meta"]);
        assert!(html.contains("content=\"3\""));
    }

    #[test]
    fn test_first_position_is_kept() {
        let document = Document::parse(
            "<!DOCTYPE html><html><head>\
             <title>A</title><meta name=\"d\" content=\"1\"><title>B</title>\
             </head><body></body></html>",
        );
        dedup_head(&document);
        assert_eq!(head_tags(&document), ["title", "meta"]);
        assert!(document.to_html().unwrap().contains("<title>B</title>"));
    }
}
