//! Final page minification using the `minify_html` crate.

use std::borrow::Cow;

/// Minify a serialized page when `enabled`.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify_page(html: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return Cow::Borrowed(html);
    }
    let minified = minify_html::minify(html.as_bytes(), &page_cfg());
    Cow::Owned(String::from_utf8_lossy(&minified).into_owned())
}

fn page_cfg() -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    // Inline <style>/<script> were already processed by the page compiler
    cfg.minify_css = false;
    cfg.minify_js = false;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    cfg
}
