//! HTML string builder that carries bundle contributions along.
//!
//! Text children and attribute values are escaped; child render results are
//! inserted verbatim and their bundles and dependencies are merged into the
//! element's result.
//!
//! ```ignore
//! let card = Element::new("div")
//!     .attr("className", "card")
//!     .child(Element::new("h2").child(title).build()?)
//!     .child(HTML.import_into(&resolver, "./footer.html", "footer")?)
//!     .build()?;
//! ```

use crate::bundle::{AssetType, BundleDescriptor, BundleError, Role};
use crate::render::{RenderResult, Rendered};
use crate::utils::escape::escape_html;
use std::fs;

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Attribute names that are written differently in markup.
const ATTRIBUTE_ALIASES: &[(&str, &str)] = &[("className", "class"), ("htmlFor", "for")];

#[inline]
fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

fn attribute_name(name: &str) -> String {
    ATTRIBUTE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or_else(|| escape_html(name).into_owned(), |(_, real)| (*real).to_owned())
}

// ============================================================================
// Children
// ============================================================================

/// A child of an [`Element`].
#[derive(Debug, Clone)]
pub enum Child {
    /// Escaped text.
    Text(String),
    /// Already-rendered markup plus its bundles.
    Rendered(RenderResult),
    /// HTML import or inline placeholder.
    Descriptor(BundleDescriptor),
    List(Vec<Child>),
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<RenderResult> for Child {
    fn from(result: RenderResult) -> Self {
        Self::Rendered(result)
    }
}

impl From<Rendered> for Child {
    fn from(rendered: Rendered) -> Self {
        Self::Rendered(rendered.flatten())
    }
}

impl From<BundleDescriptor> for Child {
    fn from(descriptor: BundleDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(children: Vec<T>) -> Self {
        Self::List(children.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Element
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Element {
    /// `None` renders the children only (fragment).
    tag: Option<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
    inner_html: Option<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_owned()),
            ..Self::default()
        }
    }

    pub fn fragment() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attrs.push((name.to_owned(), value.to_string()));
        self
    }

    /// Attribute that is omitted when `None`.
    pub fn attr_opt(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Boolean attribute: omitted when `false`, `name="true"` otherwise.
    pub fn flag(self, name: &str, enabled: bool) -> Self {
        if enabled { self.attr(name, "true") } else { self }
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Raw markup used instead of the children, inserted without escaping.
    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = Some(html.into());
        self
    }

    pub fn build(self) -> Result<RenderResult, BundleError> {
        let mut result = RenderResult::default();
        let mut html = String::new();

        if let Some(tag) = &self.tag {
            html.push('<');
            html.push_str(tag);
            for (name, value) in &self.attrs {
                html.push(' ');
                html.push_str(&attribute_name(name));
                html.push_str("=\"");
                html.push_str(&escape_html(value));
                html.push('"');
            }
            html.push('>');
        }

        if !self.tag.as_deref().is_some_and(is_void) {
            match self.inner_html {
                Some(inner) => html.push_str(&inner),
                None => {
                    for child in self.children {
                        append_child(&mut html, &mut result, child)?;
                    }
                }
            }
            if let Some(tag) = &self.tag {
                html.push_str("</");
                html.push_str(tag);
                html.push('>');
            }
        }

        result.html = html;
        Ok(result)
    }
}

fn append_child(
    html: &mut String,
    result: &mut RenderResult,
    child: Child,
) -> Result<(), BundleError> {
    match child {
        Child::Text(text) => html.push_str(&escape_html(&text)),
        Child::Rendered(rendered) => {
            html.push_str(&rendered.html);
            result.merge_assets(&rendered);
        }
        Child::List(children) => {
            for child in children {
                append_child(html, result, child)?;
            }
        }
        Child::Descriptor(descriptor) => append_descriptor(html, result, &descriptor)?,
    }
    Ok(())
}

fn append_descriptor(
    html: &mut String,
    result: &mut RenderResult,
    descriptor: &BundleDescriptor,
) -> Result<(), BundleError> {
    if let Some(placeholder) = descriptor.placeholder() {
        html.push_str(&placeholder);
        return Ok(());
    }

    let unsupported = || BundleError::UnsupportedChild {
        asset: descriptor.asset_type,
        what: descriptor.describe(),
    };
    if descriptor.asset_type != AssetType::Html || descriptor.role != Role::Import {
        return Err(unsupported());
    }
    let Some(path) = &descriptor.source_path else {
        return Err(unsupported());
    };

    let contents = fs::read_to_string(path).map_err(|source| BundleError::Import {
        path: path.clone(),
        source,
    })?;
    let contents = if descriptor.escape {
        escape_html(&contents).into_owned()
    } else {
        contents
    };
    result.html_deps.insert(path.clone());

    match &descriptor.bundle_name {
        Some(name) => result.add_chunk(AssetType::Html, name, contents),
        None => html.push_str(&contents),
    }
    Ok(())
}
