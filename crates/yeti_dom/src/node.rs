//! Node construction, inspection and structural edits.
//!
//! Every edit here maintains one invariant: a node that sits in some
//! parent's `children` has its `parent` pointer set to that parent, and a
//! node that was removed or replaced has its `parent` pointer cleared.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, QualName, parse_document};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

// ============================================================================
// Document
// ============================================================================

/// A parsed HTML document, owning the root `#document` node.
pub struct Document {
    root: Handle,
}

impl Document {
    /// Parse a full HTML document. Parsing never fails; malformed markup is
    /// recovered the way browsers recover it.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        Self { root: dom.document }
    }

    /// The `#document` node.
    pub fn root(&self) -> &Handle {
        &self.root
    }

    /// Serialize the document (doctype included) back to an HTML string.
    pub fn to_html(&self) -> io::Result<String> {
        let mut out = Vec::new();
        let handle: SerializableHandle = self.root.clone().into();
        serialize(
            &mut out,
            &handle,
            SerializeOpts {
                traversal_scope: TraversalScope::ChildrenOnly(None),
                ..Default::default()
            },
        )?;
        String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

// ============================================================================
// Inspection
// ============================================================================

#[inline]
pub fn is_document(node: &Handle) -> bool {
    matches!(node.data, NodeData::Document)
}

#[inline]
pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

#[inline]
pub fn is_text(node: &Handle) -> bool {
    matches!(node.data, NodeData::Text { .. })
}

/// Local tag name of an element, `None` for every other node kind.
pub fn tag_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&name.local),
        _ => None,
    }
}

/// Value of the attribute `name`, if the node is an element carrying it.
pub fn attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Set (or add) an attribute. No-op on non-element nodes.
pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| &*a.name.local == name) {
            Some(existing) => existing.value = StrTendril::from(value),
            None => attrs.push(new_attribute(name, value)),
        }
    }
}

/// Remove an attribute and return its previous value.
pub fn remove_attr(node: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let mut attrs = attrs.borrow_mut();
    let index = attrs.iter().position(|a| &*a.name.local == name)?;
    Some(attrs.remove(index).value.to_string())
}

/// Concatenated text of the node's direct text children.
pub fn text_content(node: &Handle) -> String {
    node.children
        .borrow()
        .iter()
        .filter_map(|child| match &child.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        })
        .collect()
}

/// Snapshot of the node's children.
pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

/// Current parent of a node, if it is attached.
pub fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(std::rc::Weak::upgrade);
    node.parent.set(weak);
    parent
}

/// First descendant element (the starting node excluded) matching `predicate`,
/// in document order.
pub fn query_element(node: &Handle, predicate: &impl Fn(&Handle) -> bool) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if !is_element(child) {
            continue;
        }
        if predicate(child) {
            return Some(child.clone());
        }
        if let Some(found) = query_element(child, predicate) {
            return Some(found);
        }
    }
    None
}

// ============================================================================
// Construction
// ============================================================================

fn new_attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from(value),
    }
}

/// Create a detached HTML element.
pub fn create_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag)),
        attrs: RefCell::new(attrs.iter().map(|(k, v)| new_attribute(k, v)).collect()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Create a detached text node.
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// Deep copy of a node and its subtree. The copy is detached.
pub fn deep_clone(node: &Handle) -> Handle {
    let data = match &node.data {
        NodeData::Document => NodeData::Document,
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => NodeData::Doctype {
            name: name.clone(),
            public_id: public_id.clone(),
            system_id: system_id.clone(),
        },
        NodeData::Text { contents } => NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        },
        NodeData::Comment { contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        NodeData::Element {
            name,
            attrs,
            template_contents,
            mathml_annotation_xml_integration_point,
        } => NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: RefCell::new(template_contents.borrow().as_ref().map(deep_clone)),
            mathml_annotation_xml_integration_point: *mathml_annotation_xml_integration_point,
        },
        NodeData::ProcessingInstruction { target, contents } => {
            NodeData::ProcessingInstruction {
                target: target.clone(),
                contents: contents.clone(),
            }
        }
    };

    let copy = Node::new(data);
    for child in node.children.borrow().iter() {
        append_child(&copy, deep_clone(child));
    }
    copy
}

// ============================================================================
// Structural edits
// ============================================================================

#[inline]
fn adopt(parent: &Handle, child: &Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
}

/// Detach a node from its parent (if any) and clear its parent pointer.
pub fn detach(node: &Handle) {
    if let Some(parent) = parent_of(node) {
        parent
            .children
            .borrow_mut()
            .retain(|sibling| !Rc::ptr_eq(sibling, node));
    }
    node.parent.set(None);
}

/// Append `child` as the last child of `parent`, moving it if attached elsewhere.
pub fn append_child(parent: &Handle, child: Handle) {
    detach(&child);
    adopt(parent, &child);
    parent.children.borrow_mut().push(child);
}

/// Insert `child` as the first child of `parent`, moving it if attached elsewhere.
pub fn prepend_child(parent: &Handle, child: Handle) {
    detach(&child);
    adopt(parent, &child);
    parent.children.borrow_mut().insert(0, child);
}

/// Replace the node's text children with a single text node.
pub fn set_text(node: &Handle, text: &str) {
    let old = std::mem::take(&mut *node.children.borrow_mut());
    for child in &old {
        child.parent.set(None);
    }
    append_child(node, create_text(text));
}

/// Replace `node` inside its parent with `replacements` (possibly none).
///
/// Returns `false` when the node is detached, in which case nothing changes.
pub fn replace_with(node: &Handle, replacements: Vec<Handle>) -> bool {
    let Some(parent) = parent_of(node) else {
        return false;
    };
    let Some(index) = parent
        .children
        .borrow()
        .iter()
        .position(|sibling| Rc::ptr_eq(sibling, node))
    else {
        node.parent.set(None);
        return false;
    };
    splice_children(&parent, index, node, replacements);
    true
}

/// Swap the child at `index` (which must be `old`) for `replacements` and
/// return the index just past the last inserted node.
///
/// Replacements that are already attached, to `parent` or elsewhere, are
/// moved. Each node ends up in `parent` exactly once.
pub(crate) fn splice_children(
    parent: &Handle,
    index: usize,
    old: &Handle,
    replacements: Vec<Handle>,
) -> usize {
    let mut unique: Vec<Handle> = Vec::with_capacity(replacements.len());
    for replacement in replacements {
        if !unique.iter().any(|u| Rc::ptr_eq(u, &replacement)) {
            unique.push(replacement);
        }
    }
    let is_replacement = |node: &Handle| unique.iter().any(|r| Rc::ptr_eq(r, node));

    // Earlier siblings that move shift `old` to the left
    let shift = parent.children.borrow()[..index]
        .iter()
        .filter(|sibling| is_replacement(sibling))
        .count();
    let old_is_replacement = is_replacement(old);

    for replacement in &unique {
        detach(replacement);
    }
    let index = index - shift;
    if !old_is_replacement {
        parent.children.borrow_mut().remove(index);
        old.parent.set(None);
    }

    for replacement in &unique {
        adopt(parent, replacement);
    }
    let count = unique.len();
    parent
        .children
        .borrow_mut()
        .splice(index..index, unique);
    index + count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(doc: &Document) -> Handle {
        query_element(doc.root(), &|n| tag_name(n) == Some("body")).unwrap()
    }

    #[test]
    fn test_parse_and_serialize_roundtrip() {
        let doc = Document::parse("<!DOCTYPE html><html><head></head><body><p>Hi</p></body></html>");
        let html = doc.to_html().unwrap();
        assert_eq!(
            html,
            "<!DOCTYPE html><html><head></head><body><p>Hi</p></body></html>"
        );
    }

    #[test]
    fn test_query_element_excludes_start_node() {
        let doc = Document::parse(
            "<!DOCTYPE html><html><body><div id='parent'><div id='child'></div></div></body></html>",
        );
        let parent = query_element(doc.root(), &|n| tag_name(n) == Some("div")).unwrap();
        assert_eq!(attr(&parent, "id").as_deref(), Some("parent"));

        let child = query_element(&parent, &|n| tag_name(n) == Some("div")).unwrap();
        assert_eq!(attr(&child, "id").as_deref(), Some("child"));
    }

    #[test]
    fn test_query_element_missing() {
        let doc = Document::parse("<!DOCTYPE html><html><body><div></div></body></html>");
        assert!(query_element(doc.root(), &|n| tag_name(n) == Some("span")).is_none());
    }

    #[test]
    fn test_attr_helpers() {
        let el = create_element("link", &[("rel", "stylesheet")]);
        assert_eq!(attr(&el, "rel").as_deref(), Some("stylesheet"));

        set_attr(&el, "href", "/a.css");
        set_attr(&el, "rel", "preload");
        assert_eq!(attr(&el, "href").as_deref(), Some("/a.css"));
        assert_eq!(attr(&el, "rel").as_deref(), Some("preload"));

        assert_eq!(remove_attr(&el, "rel").as_deref(), Some("preload"));
        assert!(attr(&el, "rel").is_none());
        assert!(remove_attr(&el, "rel").is_none());
    }

    #[test]
    fn test_set_text_clears_old_children() {
        let style = create_element("style", &[]);
        let old = create_text("a{}");
        append_child(&style, old.clone());

        set_text(&style, "b{}");

        assert_eq!(text_content(&style), "b{}");
        assert!(parent_of(&old).is_none());
    }

    #[test]
    fn test_deep_clone_is_detached_and_independent() {
        let doc = Document::parse(
            "<!DOCTYPE html><html><body><link rel='stylesheet' href='a'></body></html>",
        );
        let link = query_element(doc.root(), &|n| tag_name(n) == Some("link")).unwrap();
        let copy = deep_clone(&link);

        assert!(parent_of(&copy).is_none());
        set_attr(&copy, "href", "b");
        assert_eq!(attr(&link, "href").as_deref(), Some("a"));
        assert_eq!(attr(&copy, "rel").as_deref(), Some("stylesheet"));
    }

    #[test]
    fn test_replace_with_reparents() {
        let doc = Document::parse("<!DOCTYPE html><html><body><i></i><b></b></body></html>");
        let body = body(&doc);
        let i = query_element(&body, &|n| tag_name(n) == Some("i")).unwrap();

        let a = create_element("a", &[]);
        let u = create_element("u", &[]);
        assert!(replace_with(&i, vec![a.clone(), u.clone()]));

        assert!(parent_of(&i).is_none());
        assert!(Rc::ptr_eq(&parent_of(&a).unwrap(), &body));
        assert!(Rc::ptr_eq(&parent_of(&u).unwrap(), &body));
        let tags: Vec<_> = children(&body)
            .iter()
            .filter_map(|c| tag_name(c).map(str::to_owned))
            .collect();
        assert_eq!(tags, ["a", "u", "b"]);
    }

    #[test]
    fn test_replace_with_existing_sibling_moves_it() {
        let parent = create_element("div", &[]);
        for tag in ["a", "b", "c", "d"] {
            append_child(&parent, create_element(tag, &[]));
        }
        let kids = children(&parent);
        let (a, c) = (kids[0].clone(), kids[2].clone());
        let x = create_element("x", &[]);

        assert!(replace_with(&c, vec![a.clone(), x.clone(), a.clone()]));

        let kids = children(&parent);
        let tags: Vec<_> = kids.iter().filter_map(|k| tag_name(k)).collect();
        assert_eq!(tags, ["b", "a", "x", "d"]);
        assert!(kids.iter().all(|k| Rc::ptr_eq(&parent_of(k).unwrap(), &parent)));
        assert!(parent_of(&c).is_none());
    }

    #[test]
    fn test_replace_with_keeps_node_listed_among_replacements() {
        let parent = create_element("div", &[]);
        let a = create_element("a", &[]);
        append_child(&parent, a.clone());
        let x = create_element("x", &[]);

        assert!(replace_with(&a, vec![x.clone(), a.clone()]));

        let kids = children(&parent);
        let tags: Vec<_> = kids.iter().filter_map(|k| tag_name(k)).collect();
        assert_eq!(tags, ["x", "a"]);
        assert!(Rc::ptr_eq(&parent_of(&a).unwrap(), &parent));
    }

    #[test]
    fn test_replace_with_detached_is_noop() {
        let lonely = create_element("div", &[]);
        assert!(!replace_with(&lonely, vec![create_element("p", &[])]));
    }

    #[test]
    fn test_append_child_moves_node() {
        let a = create_element("div", &[]);
        let b = create_element("div", &[]);
        let child = create_element("span", &[]);

        append_child(&a, child.clone());
        append_child(&b, child.clone());

        assert!(children(&a).is_empty());
        assert_eq!(children(&b).len(), 1);
        assert!(Rc::ptr_eq(&parent_of(&child).unwrap(), &b));
    }

    #[test]
    fn test_prepend_child() {
        let parent = create_element("html", &[]);
        append_child(&parent, create_element("body", &[]));
        prepend_child(&parent, create_element("head", &[]));

        let tags: Vec<_> = children(&parent)
            .iter()
            .filter_map(|c| tag_name(c).map(str::to_owned))
            .collect();
        assert_eq!(tags, ["head", "body"]);
    }
}
