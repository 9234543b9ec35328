//! Pre-order, action-driven tree walker.
//!
//! The visitor sees a node before its children and answers with an
//! [`Action`]. Removal and replacement are applied by the walker itself, so
//! the visitor never mutates the child list it is being iterated from.
//! Replacement nodes are not visited.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use crate::node::splice_children;

/// Boxed, non-`Send` future. Tree handles are `Rc`, so the async walk stays on
/// one thread.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// What the walker does with a node after the visitor has seen it.
#[derive(Debug, Clone)]
pub enum Action {
    /// Keep the node and descend into its children.
    Continue,
    /// Keep the node, do not descend.
    SkipChildren,
    /// Remove the node from its parent.
    Remove,
    /// Replace the node with the given nodes, which are not visited.
    Replace(Vec<Handle>),
}

#[inline]
fn has_traversable_children(node: &Handle) -> bool {
    matches!(node.data, NodeData::Document | NodeData::Element { .. })
}

/// Walk `node` and its subtree synchronously.
///
/// Returns the action chosen for `node` itself; the caller (the parent's
/// child loop) applies it. At the top level a `Remove` or `Replace` for the
/// root is left to the caller.
pub fn walk<F>(node: &Handle, visitor: &mut F) -> Action
where
    F: FnMut(&Handle) -> Action,
{
    let action = visitor(node);
    if !matches!(action, Action::Continue) || !has_traversable_children(node) {
        return match action {
            Action::SkipChildren => Action::Continue,
            other => other,
        };
    }

    let mut index = 0;
    loop {
        let Some(child) = node.children.borrow().get(index).cloned() else {
            break;
        };
        let action = walk(&child, visitor);
        index = apply_child_action(node, index, &child, action);
    }
    Action::Continue
}

/// Walk `node` and its subtree, awaiting the visitor at every node.
pub fn walk_async<'a, F, Fut>(node: Handle, visitor: &'a mut F) -> LocalBoxFuture<'a, Action>
where
    F: FnMut(Handle) -> Fut + 'a,
    Fut: Future<Output = Action> + 'a,
{
    Box::pin(async move {
        let action = visitor(node.clone()).await;
        if !matches!(action, Action::Continue) || !has_traversable_children(&node) {
            return match action {
                Action::SkipChildren => Action::Continue,
                other => other,
            };
        }

        let mut index = 0;
        loop {
            let Some(child) = node.children.borrow().get(index).cloned() else {
                break;
            };
            let action = walk_async(child.clone(), &mut *visitor).await;
            index = apply_child_action(&node, index, &child, action);
        }
        Action::Continue
    })
}

/// Apply a child's action inside `parent` and return the next index to visit.
///
/// The child is located again by identity in case the visitor moved siblings
/// around while its subtree was being walked.
fn apply_child_action(parent: &Handle, index: usize, child: &Handle, action: Action) -> usize {
    let position = {
        let children = parent.children.borrow();
        if children.get(index).is_some_and(|c| Rc::ptr_eq(c, child)) {
            Some(index)
        } else {
            children.iter().position(|c| Rc::ptr_eq(c, child))
        }
    };
    let Some(position) = position else {
        // Child moved out of this parent; resume at the same slot.
        return index;
    };

    match action {
        Action::Continue | Action::SkipChildren => position + 1,
        Action::Remove => {
            parent.children.borrow_mut().remove(position);
            child.parent.set(None);
            position
        }
        Action::Replace(replacements) => splice_children(parent, position, child, replacements),
    }
}
