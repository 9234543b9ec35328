//! Mutable HTML document tree for page post-processing.
//!
//! The tree itself comes from `html5ever` + `markup5ever_rcdom`: every node is
//! an `Rc` handle with a weak back-reference to its parent. This crate adds:
//!
//! - **node**: parsing, serialization, attribute/text helpers and the
//!   structural edits (append, detach, replace, deep clone) that keep the
//!   parent pointers consistent
//! - **walk**: the action-driven pre-order walker (`walk` / `walk_async`)
//!
//! # Example
//!
//! ```ignore
//! use yeti_dom::{Action, Document, walk, tag_name};
//!
//! let doc = Document::parse("<!DOCTYPE html><html><body><span>x</span></body></html>");
//! walk(doc.root(), &mut |node| match tag_name(node) {
//!     Some("span") => Action::Remove,
//!     _ => Action::Continue,
//! });
//! assert!(!doc.to_html()?.contains("<span>"));
//! ```

mod node;
mod walk;

pub use markup5ever_rcdom::{Handle, Node, NodeData};
pub use node::{
    Document, append_child, attr, children, create_element, create_text, deep_clone, detach,
    is_document, is_element, is_text, parent_of, prepend_child, query_element, remove_attr,
    replace_with, set_attr, set_text, tag_name, text_content,
};
pub use walk::{Action, LocalBoxFuture, walk, walk_async};
