//! Reference-counted node tree.
//!
//! Ownership is strictly top-down: a parent owns its children through
//! `NodeRef`s, a child only holds a weak link back to its parent, and sibling
//! relations are looked up through the parent's child list. External code
//! keeps a node alive by holding a `NodeRef`.
//!
//! Invariants:
//! - A node appears in at most one child list, and its parent link names the
//!   node owning that list.
//! - No `RefCell` borrow of tree state is held while a mutation listener
//!   runs, so listeners may freely edit the tree.

use crate::document::{Document, DocumentInner};
use crate::error::DomError;
use crate::events::MutationEvent;
use crate::render::TextRenderer;
use crate::text::TextRef;
use crate::types::{Id, NodeKind, NodeType, StyleValidity};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

pub struct Node {
    id: Id,
    kind: NodeKind,
    owner: Weak<DocumentInner>,
    parent: RefCell<Weak<Node>>,
    pub(crate) children: RefCell<Vec<NodeRef>>,
    pub(crate) data: RefCell<String>,
    renderer: RefCell<Option<Box<dyn TextRenderer>>>,
    style_validity: Cell<StyleValidity>,
}

impl Node {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn node_name(&self) -> &str {
        match &self.kind {
            NodeKind::Document => "#document",
            NodeKind::DocumentFragment => "#document-fragment",
            NodeKind::Element { name } => name,
            NodeKind::Text => "#text",
            NodeKind::CDataSection => "#cdata-section",
            NodeKind::Comment => "#comment",
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    pub fn is_character_data(&self) -> bool {
        self.kind.is_character_data()
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    /// Largest valid boundary offset inside this node: the character length
    /// for character data, the child count otherwise.
    pub fn max_offset(&self) -> usize {
        if self.is_character_data() {
            self.length()
        } else {
            self.child_count()
        }
    }

    pub fn style_validity(&self) -> StyleValidity {
        self.style_validity.get()
    }

    pub fn set_style_validity(&self, validity: StyleValidity) {
        self.style_validity.set(validity);
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.borrow().is_some()
    }

    pub fn set_renderer(&self, renderer: Box<dyn TextRenderer>) {
        *self.renderer.borrow_mut() = Some(renderer);
    }

    pub fn take_renderer(&self) -> Option<Box<dyn TextRenderer>> {
        self.renderer.borrow_mut().take()
    }

    /// Run `f` against the attached renderer, if any.
    pub fn with_renderer<R>(&self, f: impl FnOnce(&dyn TextRenderer) -> R) -> Option<R> {
        self.renderer.borrow().as_deref().map(f)
    }

    /// Push the current data into the renderer without rebuilding it.
    ///
    /// Returns `true` when a renderer was present and updated.
    pub(crate) fn update_renderer_in_place(&self, offset: usize, old_length: usize) -> bool {
        let data = self.data.borrow();
        let mut renderer = self.renderer.borrow_mut();
        match renderer.as_mut() {
            Some(renderer) => {
                renderer.set_text_with_offset(&data, offset, old_length);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("data", &*self.data.borrow())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}

/// Strong, shared handle to a node. Equality is identity.
#[derive(Clone)]
pub struct NodeRef(Rc<Node>);

impl Deref for NodeRef {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({}, {})", self.id.0, self.node_name())
    }
}

impl NodeRef {
    pub(crate) fn new(id: Id, kind: NodeKind, owner: Weak<DocumentInner>, data: String) -> Self {
        NodeRef(Rc::new(Node {
            id,
            kind,
            owner,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            data: RefCell::new(data),
            renderer: RefCell::new(None),
            style_validity: Cell::new(StyleValidity::Valid),
        }))
    }

    pub(crate) fn from_rc(node: Rc<Node>) -> Self {
        NodeRef(node)
    }

    pub(crate) fn downgrade(&self) -> Weak<Node> {
        Rc::downgrade(&self.0)
    }

    /// Create an unattached node owned by the same document as `self`.
    pub(crate) fn create_like(&self, kind: NodeKind, data: String) -> NodeRef {
        let id = self
            .owner
            .upgrade()
            .map(|doc| doc.allocate_id())
            .unwrap_or(Id::DETACHED);
        NodeRef::new(id, kind, self.owner.clone(), data)
    }

    pub fn document(&self) -> Option<Document> {
        self.owner.upgrade().map(Document::from_inner)
    }

    pub fn as_text(&self) -> Option<TextRef> {
        TextRef::new(self.clone())
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade().map(NodeRef)
    }

    /// Identity check against a parent captured earlier (`None` = detached).
    pub fn has_parent(&self, parent: Option<&NodeRef>) -> bool {
        let current = self.parent.borrow();
        match parent {
            Some(parent) => std::ptr::eq(current.as_ptr(), Rc::as_ptr(&parent.0)),
            None => current.strong_count() == 0,
        }
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        self.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<NodeRef> {
        self.children.borrow().last().cloned()
    }

    /// Position of this node in its parent's child list.
    pub fn index(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.position_of(self)
    }

    pub fn previous_sibling(&self) -> Option<NodeRef> {
        let parent = self.parent()?;
        let children = parent.children.borrow();
        let pos = children.iter().position(|c| c == self)?;
        pos.checked_sub(1).map(|i| children[i].clone())
    }

    pub fn next_sibling(&self) -> Option<NodeRef> {
        let parent = self.parent()?;
        let children = parent.children.borrow();
        let pos = children.iter().position(|c| c == self)?;
        children.get(pos + 1).cloned()
    }

    /// `true` if `other` is this node or one of its descendants.
    pub fn contains(&self, other: &NodeRef) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    fn position_of(&self, child: &NodeRef) -> Option<usize> {
        self.children.borrow().iter().position(|c| c == child)
    }

    pub fn append_child(&self, child: &NodeRef) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None`. A child that already has a parent is removed from it first,
    /// which dispatches a synchronous removal event.
    pub fn insert_before(
        &self,
        child: &NodeRef,
        reference: Option<&NodeRef>,
    ) -> Result<(), DomError> {
        self.ensure_pre_insertion_validity(child, reference)?;

        let reference = match reference {
            Some(r) if r == child => child.next_sibling(),
            other => other.cloned(),
        };

        if matches!(child.kind, NodeKind::DocumentFragment) {
            return self.insert_fragment(child, reference.as_ref());
        }

        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(child)?;
        }

        // Removal listeners may have moved the child or the reference node.
        if child.parent().is_some() {
            return Err(DomError::HierarchyRequest {
                parent: self.id,
                child: child.id,
            });
        }
        self.ensure_pre_insertion_validity(child, reference.as_ref())?;

        self.attach(child, reference.as_ref())?;
        log::trace!(
            target: "dom.tree",
            "inserted {} into {}",
            child.id.0,
            self.id.0
        );

        if let Some(doc) = self.document()
            && doc.wants_mutation_events()
        {
            doc.dispatch_scoped(MutationEvent::NodeInserted {
                target: child.clone(),
                parent: self.clone(),
            });
        }
        Ok(())
    }

    /// Move the children of `fragment` in front of `reference`.
    ///
    /// Each child leaves the fragment through `remove_child`, so removal
    /// listeners run as for a single node. Children a listener re-parented
    /// are skipped, and every remaining child is re-validated before it is
    /// attached. On error, children already taken out of the fragment and
    /// not yet attached stay detached.
    fn insert_fragment(
        &self,
        fragment: &NodeRef,
        reference: Option<&NodeRef>,
    ) -> Result<(), DomError> {
        let mut moved = Vec::with_capacity(fragment.child_count());
        for node in fragment.children() {
            match fragment.remove_child(&node) {
                Ok(node) => moved.push(node),
                Err(err) => log::debug!(target: "dom.tree", "fragment child skipped: {err}"),
            }
        }

        let mut inserted = Vec::with_capacity(moved.len());
        for node in moved {
            if node.parent().is_some() {
                log::debug!(
                    target: "dom.tree",
                    "fragment child {} re-parented by a listener",
                    node.id.0
                );
                continue;
            }
            self.ensure_pre_insertion_validity(&node, reference)?;
            self.attach(&node, reference)?;
            inserted.push(node);
        }
        log::trace!(
            target: "dom.tree",
            "inserted {} fragment children into {}",
            inserted.len(),
            self.id.0
        );
        if let Some(doc) = self.document()
            && doc.wants_mutation_events()
        {
            for node in inserted {
                doc.dispatch_scoped(MutationEvent::NodeInserted {
                    target: node,
                    parent: self.clone(),
                });
            }
        }
        Ok(())
    }

    /// Remove `child` from this node.
    ///
    /// The removal event is dispatched before detaching; if a listener
    /// already moved the child elsewhere this reports `NotFound` and leaves
    /// the tree as the listener left it.
    pub fn remove_child(&self, child: &NodeRef) -> Result<NodeRef, DomError> {
        if !child.has_parent(Some(self)) {
            return Err(DomError::NotFound {
                parent: self.id,
                child: child.id,
            });
        }

        if let Some(doc) = self.document()
            && doc.wants_mutation_events()
        {
            doc.dispatch_now(&MutationEvent::NodeRemoved {
                target: child.clone(),
                parent: self.clone(),
            });
        }

        if !child.has_parent(Some(self)) {
            log::debug!(
                target: "dom.tree",
                "node {} moved by a removal listener before detaching from {}",
                child.id.0,
                self.id.0
            );
            return Err(DomError::NotFound {
                parent: self.id,
                child: child.id,
            });
        }

        self.detach(child);
        log::trace!(target: "dom.tree", "removed {} from {}", child.id.0, self.id.0);
        Ok(child.clone())
    }

    /// Trusted append used by parsers: no listeners, no content-model checks
    /// beyond what keeps the tree well formed.
    pub fn parser_append_child(&self, child: &NodeRef) -> Result<(), DomError> {
        if !self.kind.allows_children() || child.parent().is_some() || child.contains(self) {
            return Err(DomError::HierarchyRequest {
                parent: self.id,
                child: child.id,
            });
        }
        self.attach(child, None)
    }

    /// Copy this node; text nodes copy their data, `deep` copies children.
    pub fn clone_node(&self, deep: bool) -> NodeRef {
        let copy = self.create_like(self.kind.clone(), self.data.borrow().clone());
        if deep {
            for child in self.children() {
                let child_copy = child.clone_node(true);
                // Fresh subtree, cannot fail.
                let _ = copy.attach(&child_copy, None);
            }
        }
        copy
    }

    fn attach(&self, child: &NodeRef, reference: Option<&NodeRef>) -> Result<(), DomError> {
        {
            let mut children = self.children.borrow_mut();
            let pos = match reference {
                Some(r) => children
                    .iter()
                    .position(|c| c == r)
                    .ok_or(DomError::NotFound {
                        parent: self.id,
                        child: r.id,
                    })?,
                None => children.len(),
            };
            children.insert(pos, child.clone());
        }
        *child.parent.borrow_mut() = Rc::downgrade(&self.0);
        Ok(())
    }

    fn detach(&self, child: &NodeRef) {
        self.children.borrow_mut().retain(|c| c != child);
        *child.parent.borrow_mut() = Weak::new();
        child.tear_down_renderers();
    }

    fn tear_down_renderers(&self) {
        self.renderer.borrow_mut().take();
        for child in self.children() {
            child.tear_down_renderers();
        }
    }

    fn ensure_pre_insertion_validity(
        &self,
        child: &NodeRef,
        reference: Option<&NodeRef>,
    ) -> Result<(), DomError> {
        let reject = DomError::HierarchyRequest {
            parent: self.id,
            child: child.id,
        };
        if !self.kind.allows_children()
            || matches!(child.kind, NodeKind::Document)
            || child.contains(self)
        {
            return Err(reject);
        }
        if let Some(reference) = reference
            && !reference.has_parent(Some(self))
        {
            return Err(DomError::NotFound {
                parent: self.id,
                child: reference.id,
            });
        }
        if matches!(self.kind, NodeKind::Document) {
            let incoming: Vec<NodeRef> = match child.kind {
                NodeKind::DocumentFragment => child.children(),
                _ => vec![child.clone()],
            };
            let mut elements = self
                .children
                .borrow()
                .iter()
                .filter(|c| matches!(c.kind, NodeKind::Element { .. }) && *c != child)
                .count();
            for node in &incoming {
                match node.kind {
                    NodeKind::Element { .. } => elements += 1,
                    NodeKind::Comment => {}
                    _ => return Err(reject),
                }
            }
            if elements > 1 {
                return Err(reject);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::error::DomError;
    use crate::events::MutationEvent;
    use crate::render::RenderText;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn siblings_follow_child_order() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_text_node("a");
        let b = doc.create_comment("b");
        let c = doc.create_text_node("c");
        div.append_child(&a).unwrap();
        div.append_child(&b).unwrap();
        div.append_child(&c).unwrap();

        assert_eq!(a.previous_sibling(), None);
        assert_eq!(a.next_sibling(), Some(b.clone()));
        assert_eq!(c.previous_sibling(), Some(b.clone()));
        assert_eq!(c.next_sibling(), None);
        assert_eq!(b.index(), Some(1));
        assert_eq!(div.first_child().as_ref(), Some(a.node()));
        assert_eq!(div.last_child().as_ref(), Some(c.node()));
    }

    #[test]
    fn insert_before_moves_existing_child() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_text_node("a");
        let b = doc.create_text_node("b");
        div.append_child(&a).unwrap();
        div.append_child(&b).unwrap();
        div.insert_before(&b, Some(a.node())).unwrap();
        let names: Vec<String> = div.children().iter().map(|c| c.data()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn character_data_rejects_children() {
        let doc = Document::new();
        let text = doc.create_text_node("x");
        let other = doc.create_text_node("y");
        assert_eq!(
            text.append_child(&other),
            Err(DomError::HierarchyRequest {
                parent: text.id(),
                child: other.id()
            })
        );
    }

    #[test]
    fn document_content_model() {
        let doc = Document::new();
        let root = doc.root();
        let text = doc.create_text_node("x");
        assert!(matches!(
            root.append_child(&text),
            Err(DomError::HierarchyRequest { .. })
        ));
        let html = doc.create_element("html");
        root.append_child(&html).unwrap();
        let second = doc.create_element("body");
        assert!(matches!(
            root.append_child(&second),
            Err(DomError::HierarchyRequest { .. })
        ));
        root.append_child(&doc.create_comment("ok")).unwrap();
        assert_eq!(root.child_count(), 2);
    }

    #[test]
    fn cycles_are_rejected() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        outer.append_child(&inner).unwrap();
        assert!(matches!(
            inner.append_child(&outer),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            outer.append_child(&outer),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn remove_child_requires_membership() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_text_node("a");
        assert!(matches!(
            div.remove_child(&a),
            Err(DomError::NotFound { .. })
        ));
        div.append_child(&a).unwrap();
        let removed = div.remove_child(&a).unwrap();
        assert_eq!(&removed, a.node());
        assert!(a.parent().is_none());
        assert_eq!(div.child_count(), 0);
    }

    #[test]
    fn removal_tears_down_renderer() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_text_node("a");
        div.append_child(&a).unwrap();
        a.set_renderer(Box::new(RenderText::new("a")));
        assert!(a.has_renderer());
        div.remove_child(&a).unwrap();
        assert!(!a.has_renderer());
    }

    #[test]
    fn fragment_children_are_moved() {
        let doc = Document::new();
        let frag = doc.create_document_fragment();
        frag.append_child(&doc.create_text_node("a")).unwrap();
        frag.append_child(&doc.create_text_node("b")).unwrap();
        let div = doc.create_element("div");
        div.append_child(&doc.create_text_node("c")).unwrap();
        let first = div.first_child();
        div.insert_before(&frag, first.as_ref()).unwrap();
        assert_eq!(frag.child_count(), 0);
        let texts: Vec<String> = div.children().iter().map(|c| c.data()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert!(div.children().iter().all(|c| c.has_parent(Some(&div))));
    }

    #[test]
    fn fragment_insertion_reports_each_move() {
        let doc = Document::new();
        let frag = doc.create_document_fragment();
        let a = doc.create_text_node("a");
        let b = doc.create_text_node("b");
        frag.append_child(&a).unwrap();
        frag.append_child(&b).unwrap();
        let div = doc.create_element("div");
        let elsewhere = doc.create_element("span");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let stolen = b.node().clone();
        let target = elsewhere.clone();
        doc.add_mutation_listener(move |_, event| {
            sink.borrow_mut().push(event.describe());
            // Pull `b` out of the fragment while `a` is being moved.
            if let MutationEvent::NodeRemoved { target: removed, .. } = event
                && removed.data() == "a"
            {
                target.append_child(&stolen).unwrap();
            }
        });

        div.append_child(&frag).unwrap();
        assert_eq!(div.children(), vec![a.node().clone()]);
        assert_eq!(elsewhere.children(), vec![b.node().clone()]);
        assert_eq!(frag.child_count(), 0);
        assert_eq!(
            *seen.borrow(),
            [
                format!("DOMNodeRemoved({} in {})", a.id().0, frag.id().0),
                format!("DOMNodeRemoved({} in {})", b.id().0, frag.id().0),
                format!("DOMNodeInserted({} in {})", b.id().0, elsewhere.id().0),
                format!("DOMNodeInserted({} in {})", a.id().0, div.id().0),
            ]
        );
    }

    #[test]
    fn clone_node_copies_data_and_subtree() {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.append_child(&doc.create_text_node("hi")).unwrap();
        let shallow = div.clone_node(false);
        assert_eq!(shallow.child_count(), 0);
        assert_eq!(shallow.node_name(), "div");
        let deep = div.clone_node(true);
        assert_eq!(deep.child_count(), 1);
        let copy = deep.first_child().unwrap();
        assert_eq!(copy.data(), "hi");
        assert_ne!(copy.id(), div.first_child().unwrap().id());
        assert!(copy.has_parent(Some(&deep)));
    }

    #[test]
    fn parser_append_skips_content_model() {
        let doc = Document::new();
        let text = doc.create_text_node("stray");
        doc.root().parser_append_child(&text).unwrap();
        assert!(text.has_parent(Some(&doc.root())));
    }

    #[test]
    fn node_names_and_types() {
        use crate::types::NodeType;
        let doc = Document::new();
        assert_eq!(doc.root().node_name(), "#document");
        assert_eq!(doc.create_text_node("").node_name(), "#text");
        assert_eq!(doc.create_cdata_section("").node_name(), "#cdata-section");
        assert_eq!(doc.create_comment("").node_type(), NodeType::Comment);
        assert_eq!(doc.create_cdata_section("").node_type() as u16, 4);
    }
}
