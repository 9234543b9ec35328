//! Doctype normalization for rendered pages.

use regex::Regex;
use std::sync::LazyLock;

/// Leading `<!DOCTYPE ...>`, case-insensitive, ASCII whitespace allowed before it.
static DOCTYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\r\n\x0C]*<![Dd][Oo][Cc][Tt][Yy][Pp][Ee] [^>]+>").unwrap()
});

/// Prepend `<!DOCTYPE html>` unless the document already starts with a doctype.
pub fn ensure_doctype(html: &str) -> String {
    if DOCTYPE_RE.is_match(html) {
        html.to_owned()
    } else {
        format!("<!DOCTYPE html>\n{html}")
    }
}
