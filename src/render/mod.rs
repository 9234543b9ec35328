//! Rendering: components produce HTML plus the bundles they contribute.
//!
//! - **result**: `RenderResult` and its union/merge algebra
//! - **element**: escaped HTML builder (`Element`) with bundle-aware children
//! - **component**: `Component` trait, `render_component`, `render_page`, `head`

mod component;
mod element;
mod result;

pub use component::{Component, FnComponent, head, render_component, render_page};
pub use element::{Child, Element};
pub use result::{BundleMap, RenderResult, Rendered, flatten, merge};
