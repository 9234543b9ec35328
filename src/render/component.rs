//! Components and the render entry points.

use crate::bundle::{AssetType, Template};
use crate::render::{Child, Element, RenderResult, Rendered, merge};
use crate::utils::doctype::ensure_doctype;
use anyhow::{Context, Result};
use std::{
    any::type_name,
    marker::PhantomData,
    path::{Path, PathBuf},
};

/// A renderable unit with optional own CSS/JS.
///
/// Call components through [`render_component`] rather than [`Component::render`]
/// so their own assets are merged into the result.
pub trait Component {
    type Props;

    fn render(&self, props: &Self::Props) -> Result<Rendered>;

    fn css(&self) -> Option<Template> {
        None
    }

    fn js(&self) -> Option<Template> {
        None
    }

    /// Source file of the component, reported as an html dependency.
    fn source_file(&self) -> Option<&Path> {
        None
    }
}

/// Render a component and merge its own assets ahead of its output.
pub fn render_component<C>(component: &C, props: &C::Props) -> Result<RenderResult>
where
    C: Component + ?Sized,
{
    let own = own_assets(component)?;
    let rendered = component
        .render(props)
        .with_context(|| format!("failed to render `{}`", type_name::<C>()))?;
    Ok(merge(own, rendered))
}

/// Render a page component: [`render_component`] plus doctype normalization.
pub fn render_page<C>(page: &C, props: &C::Props) -> Result<RenderResult>
where
    C: Component + ?Sized,
{
    let mut result = render_component(page, props)?;
    result.html = ensure_doctype(&result.html);
    Ok(result)
}

fn own_assets<C>(component: &C) -> Result<RenderResult>
where
    C: Component + ?Sized,
{
    let mut own = RenderResult::default();

    if let Some(css) = component.css() {
        let output = css
            .evaluate()
            .with_context(|| format!("failed to evaluate css of `{}`", type_name::<C>()))?;
        own.add_assets(AssetType::Css, &output);
    }
    if let Some(js) = component.js() {
        let output = js
            .evaluate()
            .with_context(|| format!("failed to evaluate js of `{}`", type_name::<C>()))?;
        own.add_assets(AssetType::Js, &output);
    }
    if let Some(path) = component.source_file() {
        own.html_deps.insert(path.to_path_buf());
    }

    Ok(own)
}

/// Head-equivalent container for nested layouts. Its children are merged
/// into the page's single `<head>` when the page is compiled.
pub fn head<I, C>(children: I) -> Result<RenderResult>
where
    I: IntoIterator<Item = C>,
    C: Into<Child>,
{
    Ok(Element::new("head--").children(children).build()?)
}

// ============================================================================
// Closure Components
// ============================================================================

/// A component built from a render closure.
///
/// ```ignore
/// let card = FnComponent::new(|props: &CardProps| {
///     Ok(Element::new("div").attr("className", "card").child(props.title.as_str()).build()?)
/// })
/// .with_css(Template::css().literal(".card { padding: 1rem }"));
/// ```
pub struct FnComponent<P, R, F> {
    render: F,
    css: Option<Template>,
    js: Option<Template>,
    source_file: Option<PathBuf>,
    _marker: PhantomData<fn(&P) -> R>,
}

impl<P, R, F> FnComponent<P, R, F>
where
    F: Fn(&P) -> Result<R>,
    R: Into<Rendered>,
{
    pub fn new(render: F) -> Self {
        Self {
            render,
            css: None,
            js: None,
            source_file: None,
            _marker: PhantomData,
        }
    }

    pub fn with_css(mut self, css: Template) -> Self {
        self.css = Some(css);
        self
    }

    pub fn with_js(mut self, js: Template) -> Self {
        self.js = Some(js);
        self
    }

    pub fn with_source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_file = Some(path.into());
        self
    }
}

impl<P, R, F> Component for FnComponent<P, R, F>
where
    F: Fn(&P) -> Result<R>,
    R: Into<Rendered>,
{
    type Props = P;

    fn render(&self, props: &P) -> Result<Rendered> {
        (self.render)(props).map(Into::into)
    }

    fn css(&self) -> Option<Template> {
        self.css.clone()
    }

    fn js(&self) -> Option<Template> {
        self.js.clone()
    }

    fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }
}
