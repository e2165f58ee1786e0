//! Text nodes and the operations over runs of adjacent text nodes.
//!
//! An adjacency run is the maximal sequence of text-bearing siblings
//! (`Text` and `CDataSection`) containing a node. It is never stored; every
//! operation derives it from the parent's child list at the time it runs.
//!
//! `split_text` and `replace_whole_text` run mutation listeners partway
//! through, and those listeners may rearrange or drop any node. Both
//! operations therefore hold `TextRef`s to everything they touch later and
//! re-check parent identity right before every structural change.

use crate::error::DomError;
use crate::events::EventQueueScope;
use crate::node::NodeRef;
use std::fmt;
use std::ops::{Deref, RangeInclusive};
use tools::utf8::split_at_char;

/// A `NodeRef` known to be text-bearing.
#[derive(Clone, PartialEq, Eq)]
pub struct TextRef(NodeRef);

impl Deref for TextRef {
    type Target = NodeRef;

    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl fmt::Debug for TextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextRef({}, {:?})", self.id().0, &*self.data.borrow())
    }
}

impl From<TextRef> for NodeRef {
    fn from(text: TextRef) -> NodeRef {
        text.0
    }
}

/// Index range of the adjacency run around `node` inside `siblings`.
fn run_bounds(siblings: &[NodeRef], node: &NodeRef) -> Option<RangeInclusive<usize>> {
    let pos = siblings.iter().position(|c| c == node)?;
    let start = siblings[..pos]
        .iter()
        .rposition(|c| !c.is_text())
        .map_or(0, |i| i + 1);
    let end = siblings[pos + 1..]
        .iter()
        .position(|c| !c.is_text())
        .map_or(siblings.len() - 1, |i| pos + i);
    Some(start..=end)
}

impl TextRef {
    pub fn new(node: NodeRef) -> Option<Self> {
        node.is_text().then_some(TextRef(node))
    }

    pub(crate) fn from_node_unchecked(node: NodeRef) -> Self {
        debug_assert!(node.is_text());
        TextRef(node)
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn into_node(self) -> NodeRef {
        self.0
    }

    /// First node of the adjacency run containing this node.
    pub fn earliest_adjacent_text(&self) -> TextRef {
        self.run_edge(|bounds| *bounds.start())
    }

    /// Last node of the adjacency run containing this node.
    pub fn latest_adjacent_text(&self) -> TextRef {
        self.run_edge(|bounds| *bounds.end())
    }

    fn run_edge(&self, pick: impl FnOnce(&RangeInclusive<usize>) -> usize) -> TextRef {
        let Some(parent) = self.parent() else {
            return self.clone();
        };
        let siblings = parent.children.borrow();
        match run_bounds(&siblings, &self.0) {
            Some(bounds) => TextRef(siblings[pick(&bounds)].clone()),
            None => self.clone(),
        }
    }

    /// Data of the whole adjacency run, concatenated in sibling order.
    pub fn whole_text(&self) -> String {
        let Some(parent) = self.parent() else {
            return self.data();
        };
        let siblings = parent.children.borrow();
        let Some(bounds) = run_bounds(&siblings, &self.0) else {
            return self.data();
        };
        let run = &siblings[bounds];
        let mut out = String::with_capacity(run.iter().map(|t| t.data.borrow().len()).sum());
        for text in run {
            out.push_str(&text.data.borrow());
        }
        out
    }

    /// Split this node at character `offset`. This node keeps the head, and
    /// the returned node (same kind, inserted right after this one when
    /// there is a parent) holds the tail.
    ///
    /// If the insertion fails, the error is returned and this node stays
    /// truncated.
    pub fn split_text(&self, offset: usize) -> Result<TextRef, DomError> {
        let length = self.length();
        let old_data = self.data();
        let Some((head, tail)) = split_at_char(&old_data, offset) else {
            return Err(DomError::IndexSize { offset, length });
        };
        let (head, tail) = (head.to_string(), tail.to_string());

        let document = self.document();
        let _scope = document.as_ref().map(EventQueueScope::new);

        let new_text = TextRef(self.create_like(self.kind().clone(), tail));
        self.set_data_without_update(head);
        self.dispatch_modified_event(old_data);

        if let Some(parent) = self.parent() {
            let next = self.next_sibling();
            parent.insert_before(&new_text, next.as_ref())?;
        }

        if let Some(doc) = &document {
            doc.text_node_split(self);
        }

        self.update_renderer_in_place(0, length);

        log::trace!(
            target: "dom.text",
            "split {} at {}: new node {}",
            self.id().0,
            offset,
            new_text.id().0
        );
        Ok(new_text)
    }

    /// Replace the whole adjacency run with a single node holding
    /// `new_text`, or remove the run when `new_text` is empty.
    ///
    /// Returns the surviving node, or `None` when the run was removed or a
    /// listener took this node out of its parent along the way.
    pub fn replace_whole_text(&self, new_text: &str) -> Option<TextRef> {
        // Listeners fired by the removals below can drop the last other
        // reference to any of these nodes.
        let start = self.earliest_adjacent_text();
        let end = self.latest_adjacent_text();
        let protected = self.clone();
        let parent = self.parent();

        if let Some(parent) = &parent {
            let mut cursor = Some(start.into_node());
            while let Some(node) = cursor {
                if node == protected.0 || !node.is_text() || !node.has_parent(Some(parent)) {
                    break;
                }
                cursor = node.next_sibling();
                remove_best_effort(parent, &node);
            }

            if protected != end {
                let one_past_end = end.next_sibling();
                let mut cursor = protected.next_sibling();
                while let Some(node) = cursor {
                    if Some(&node) == one_past_end.as_ref()
                        || !node.is_text()
                        || !node.has_parent(Some(parent))
                    {
                        break;
                    }
                    cursor = node.next_sibling();
                    remove_best_effort(parent, &node);
                }
            }
        }

        if new_text.is_empty() {
            if let Some(parent) = &parent
                && protected.has_parent(Some(parent))
            {
                remove_best_effort(parent, &protected);
            }
            log::trace!(target: "dom.text", "replace_whole_text removed run of {}", protected.id().0);
            return None;
        }

        if !protected.has_parent(parent.as_ref()) {
            log::debug!(
                target: "dom.text",
                "node {} left its parent during replace_whole_text",
                protected.id().0
            );
            return None;
        }

        protected.set_data(new_text);
        Some(protected)
    }
}

fn remove_best_effort(parent: &NodeRef, node: &NodeRef) {
    if let Err(err) = parent.remove_child(node) {
        log::debug!(target: "dom.text", "skipping removal during replace_whole_text: {err}");
    }
}
