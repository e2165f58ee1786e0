//! Mutation events and the scoped event queue.
//!
//! Removal events are delivered synchronously, before the node is detached,
//! so listeners observe (and may change) the tree as it was. Insertion and
//! character-data events are scoped: while an `EventQueueScope` is alive they
//! are queued, and the outermost scope delivers them in order when it drops.
//! Outside any scope they are delivered immediately.

use crate::document::Document;
use crate::node::NodeRef;
use std::fmt::Write;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub enum MutationEvent {
    NodeInserted {
        target: NodeRef,
        parent: NodeRef,
    },
    NodeRemoved {
        target: NodeRef,
        parent: NodeRef,
    },
    CharacterDataModified {
        target: NodeRef,
        prev_value: String,
        new_value: String,
    },
}

impl MutationEvent {
    pub fn target(&self) -> &NodeRef {
        match self {
            MutationEvent::NodeInserted { target, .. }
            | MutationEvent::NodeRemoved { target, .. }
            | MutationEvent::CharacterDataModified { target, .. } => target,
        }
    }

    /// DOM event type name.
    pub fn name(&self) -> &'static str {
        match self {
            MutationEvent::NodeInserted { .. } => "DOMNodeInserted",
            MutationEvent::NodeRemoved { .. } => "DOMNodeRemoved",
            MutationEvent::CharacterDataModified { .. } => "DOMCharacterDataModified",
        }
    }

    /// One-line rendering for logs and test expectations.
    pub fn describe(&self) -> String {
        let mut out = String::with_capacity(48);
        out.push_str(self.name());
        out.push('(');
        match self {
            MutationEvent::NodeInserted { target, parent }
            | MutationEvent::NodeRemoved { target, parent } => {
                let _ = write!(&mut out, "{} in {}", target.id().0, parent.id().0);
            }
            MutationEvent::CharacterDataModified {
                target,
                prev_value,
                new_value,
            } => {
                let _ = write!(
                    &mut out,
                    "{}: {prev_value:?} -> {new_value:?}",
                    target.id().0
                );
            }
        }
        out.push(')');
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type MutationListener = Rc<dyn Fn(&Document, &MutationEvent)>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next: u64,
    listeners: Vec<(ListenerId, MutationListener)>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, listener: MutationListener) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Clone the current listener list so dispatch holds no borrow while
    /// listeners run (they may register or remove listeners).
    pub(crate) fn snapshot(&self) -> Vec<MutationListener> {
        self.listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

#[derive(Default)]
pub(crate) struct EventQueue {
    depth: usize,
    pending: Vec<MutationEvent>,
}

impl EventQueue {
    /// Queue `event` if a scope is open; otherwise hand it back.
    pub(crate) fn enqueue(&mut self, event: MutationEvent) -> Option<MutationEvent> {
        if self.depth == 0 {
            return Some(event);
        }
        self.pending.push(event);
        None
    }
}

/// Batches scoped mutation events until dropped.
///
/// Scopes nest; only the outermost one flushes. Dropping on an early return
/// (including `?`) still flushes, so queued notifications are never lost.
pub struct EventQueueScope {
    document: Document,
}

impl EventQueueScope {
    pub fn new(document: &Document) -> Self {
        document.inner.queue.borrow_mut().depth += 1;
        Self {
            document: document.clone(),
        }
    }
}

impl Drop for EventQueueScope {
    fn drop(&mut self) {
        let pending = {
            let mut queue = self.document.inner.queue.borrow_mut();
            queue.depth -= 1;
            if queue.depth > 0 {
                return;
            }
            std::mem::take(&mut queue.pending)
        };
        if !pending.is_empty() {
            log::trace!(target: "dom.events", "flushing {} scoped events", pending.len());
        }
        for event in &pending {
            self.document.dispatch_now(event);
        }
    }
}
