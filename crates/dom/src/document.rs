use crate::config::DocumentConfig;
use crate::error::DomError;
use crate::events::{EventQueue, ListenerId, ListenerRegistry, MutationEvent};
use crate::node::NodeRef;
use crate::range::{BoundaryPoint, LiveRange};
use crate::text::TextRef;
use crate::types::{Id, NodeId, NodeKind, StyleValidity};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tools::utf8::char_len;

/// Shared document handle.
///
/// Owns the document node (and through it the tree), the mutation listener
/// registry, the scoped event queue and the set of live ranges. Nodes point
/// back here weakly.
#[derive(Clone)]
pub struct Document {
    pub(crate) inner: Rc<DocumentInner>,
}

pub(crate) struct DocumentInner {
    config: DocumentConfig,
    root: NodeRef,
    next_id: Cell<NodeId>,
    listeners: RefCell<ListenerRegistry>,
    pub(crate) queue: RefCell<EventQueue>,
    ranges: RefCell<Vec<Weak<LiveRange>>>,
}

impl DocumentInner {
    /// Next free id. Once the id space is used up every further node gets
    /// `Id::DETACHED`; ids are never handed out twice.
    pub(crate) fn allocate_id(&self) -> Id {
        let id = self.next_id.get();
        if id == Id::DETACHED.0 {
            log::warn!(target: "dom.tree", "node ids exhausted for {}", self.config.url);
            return Id::DETACHED;
        }
        // 0 marks exhaustion.
        self.next_id.set(id.checked_add(1).unwrap_or(Id::DETACHED.0));
        Id(id)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.inner.config.url)
            .field("root", &self.inner.root)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        let inner = Rc::new_cyclic(|owner: &Weak<DocumentInner>| DocumentInner {
            config,
            root: NodeRef::new(Id(1), NodeKind::Document, owner.clone(), String::new()),
            next_id: Cell::new(2),
            listeners: RefCell::new(ListenerRegistry::default()),
            queue: RefCell::new(EventQueue::default()),
            ranges: RefCell::new(Vec::new()),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.inner.config
    }

    /// The document node.
    pub fn root(&self) -> NodeRef {
        self.inner.root.clone()
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn create_node(&self, kind: NodeKind, data: String) -> NodeRef {
        NodeRef::new(
            self.inner.allocate_id(),
            kind,
            Rc::downgrade(&self.inner),
            data,
        )
    }

    pub fn create_element(&self, name: &str) -> NodeRef {
        self.create_node(
            NodeKind::Element {
                name: Arc::from(name),
            },
            String::new(),
        )
    }

    pub fn create_document_fragment(&self) -> NodeRef {
        self.create_node(NodeKind::DocumentFragment, String::new())
    }

    pub fn create_comment(&self, data: &str) -> NodeRef {
        self.create_node(NodeKind::Comment, data.to_string())
    }

    pub fn create_text_node(&self, data: &str) -> TextRef {
        TextRef::from_node_unchecked(self.create_node(NodeKind::Text, data.to_string()))
    }

    pub fn create_cdata_section(&self, data: &str) -> TextRef {
        TextRef::from_node_unchecked(self.create_node(NodeKind::CDataSection, data.to_string()))
    }

    /// Text node holding at most `limit` characters of `data`, starting at
    /// character `start`.
    pub fn create_text_with_length_limit(&self, data: &str, start: usize, limit: usize) -> TextRef {
        if start == 0 && char_len(data) <= limit {
            return self.create_text_node(data);
        }
        let text = self.create_text_node("");
        text.parser_append_data(data, start, limit);
        text
    }

    /// Parser-style append of `data` under `parent`, spread across adjacent
    /// text nodes of at most `text_length_limit` characters each.
    pub fn append_text_chunked(&self, parent: &NodeRef, data: &str) -> Result<Vec<TextRef>, DomError> {
        let limit = self.inner.config.text_length_limit.max(1);
        let total = char_len(data);
        let mut start = 0;
        let mut created = Vec::with_capacity(total.div_ceil(limit).max(1));
        while start < total || created.is_empty() {
            let text = self.create_text_with_length_limit(data, start, limit);
            parent.parser_append_child(&text)?;
            start += text.length().max(1);
            created.push(text);
        }
        log::trace!(
            target: "dom.text",
            "appended {} chars as {} text nodes under {}",
            total,
            created.len(),
            parent.id().0
        );
        Ok(created)
    }

    pub fn add_mutation_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Document, &MutationEvent) + 'static,
    {
        self.inner.listeners.borrow_mut().add(Rc::new(listener))
    }

    pub fn remove_mutation_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    pub(crate) fn wants_mutation_events(&self) -> bool {
        self.inner.config.mutation_events && !self.inner.listeners.borrow().is_empty()
    }

    pub(crate) fn dispatch_scoped(&self, event: MutationEvent) {
        let ready = self.inner.queue.borrow_mut().enqueue(event);
        if let Some(event) = ready {
            self.dispatch_now(&event);
        }
    }

    pub(crate) fn dispatch_now(&self, event: &MutationEvent) {
        let listeners = self.inner.listeners.borrow().snapshot();
        log::trace!(
            target: "dom.events",
            "dispatch {} to {} listeners",
            event.describe(),
            listeners.len()
        );
        for listener in listeners {
            listener(self, event);
        }
    }

    /// Register a live range over `[start, end]`.
    pub fn create_range(
        &self,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> Result<Rc<LiveRange>, DomError> {
        for point in [&start, &end] {
            let length = point.container.max_offset();
            if point.offset > length {
                return Err(DomError::IndexSize {
                    offset: point.offset,
                    length,
                });
            }
        }
        let range = Rc::new(LiveRange::new(start, end));
        let mut ranges = self.inner.ranges.borrow_mut();
        ranges.retain(|r| r.strong_count() > 0);
        ranges.push(Rc::downgrade(&range));
        Ok(range)
    }

    fn live_ranges(&self) -> Vec<Rc<LiveRange>> {
        let mut ranges = self.inner.ranges.borrow_mut();
        ranges.retain(|r| r.strong_count() > 0);
        ranges.iter().filter_map(Weak::upgrade).collect()
    }

    /// Hook run after `node` was split and the new node inserted after it.
    pub fn text_node_split(&self, node: &TextRef) {
        let ranges = self.live_ranges();
        if ranges.is_empty() {
            return;
        }
        let parent = node.parent();
        let next = node.next_sibling();
        let index = node.index();
        let split_offset = node.length();
        for range in &ranges {
            range.text_node_split(node, parent.as_ref(), next.as_ref(), index, split_offset);
        }
        log::trace!(
            target: "dom.range",
            "adjusted {} ranges for split of {} at {}",
            ranges.len(),
            node.id().0,
            split_offset
        );
    }

    /// Hook run after the data of `node` changed from `offset` on, where the
    /// replaced region covered `old_length` characters.
    pub fn text_content_changed(&self, node: &NodeRef, offset: usize, old_length: usize) {
        if node.is_text() && node.parent().is_some() {
            self.update_text_renderer(node, offset, old_length);
        }
        self.adjust_ranges_for_text_change(node, offset, old_length);
    }

    pub(crate) fn adjust_ranges_for_text_change(&self, node: &NodeRef, offset: usize, old_length: usize) {
        for range in self.live_ranges() {
            range.text_replaced(node, offset, old_length);
        }
    }

    /// In-place renderer update, skipped when the node's renderer is about
    /// to be rebuilt anyway.
    pub fn update_text_renderer(&self, node: &NodeRef, offset: usize, old_length: usize) {
        if node.style_validity() >= StyleValidity::SubtreeAndRenderersInvalid {
            log::trace!(
                target: "dom.text",
                "renderer update for {} deferred to rebuild",
                node.id().0
            );
            return;
        }
        node.update_renderer_in_place(offset, old_length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderText;

    #[test]
    fn ids_are_unique_and_start_after_root() {
        let doc = Document::new();
        assert_eq!(doc.root().id(), Id(1));
        let a = doc.create_element("a");
        let b = doc.create_text_node("b");
        assert_eq!(a.id(), Id(2));
        assert_eq!(b.id(), Id(3));
        assert!(a.document().is_some_and(|d| d.ptr_eq(&doc)));
    }

    #[test]
    fn exhausted_ids_are_not_reused() {
        let doc = Document::new();
        doc.inner.next_id.set(NodeId::MAX);
        assert_eq!(doc.create_element("a").id(), Id(NodeId::MAX));
        assert_eq!(doc.create_element("b").id(), Id::DETACHED);
        assert_eq!(doc.create_text_node("c").id(), Id::DETACHED);
        assert_eq!(doc.root().id(), Id(1));
    }

    #[test]
    fn length_limited_text() {
        let doc = Document::new();
        assert_eq!(doc.create_text_with_length_limit("hello", 0, 10).data(), "hello");
        assert_eq!(doc.create_text_with_length_limit("hello", 1, 3).data(), "ell");
        assert_eq!(doc.create_text_with_length_limit("hello", 9, 3).data(), "");
    }

    #[test]
    fn chunked_append_respects_limit() {
        let doc = Document::with_config(DocumentConfig {
            text_length_limit: 4,
            ..Default::default()
        });
        let div = doc.create_element("div");
        let nodes = doc.append_text_chunked(&div, "abcdefghij").unwrap();
        let parts: Vec<String> = nodes.iter().map(|n| n.data()).collect();
        assert_eq!(parts, ["abcd", "efgh", "ij"]);
        assert_eq!(nodes[1].whole_text(), "abcdefghij");
    }

    #[test]
    fn chunked_append_of_empty_text_creates_one_node() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let nodes = doc.append_text_chunked(&div, "").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(div.child_count(), 1);
    }

    #[test]
    fn style_validity_gates_renderer_updates() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text_node("abc");
        div.append_child(&text).unwrap();
        text.set_renderer(Box::new(RenderText::new("abc")));
        text.set_style_validity(StyleValidity::SubtreeAndRenderersInvalid);
        text.set_data("xyz");
        assert_eq!(text.with_renderer(|r| r.text().to_string()).as_deref(), Some("abc"));
        text.set_style_validity(StyleValidity::ElementInvalid);
        text.set_data("uvw");
        assert_eq!(text.with_renderer(|r| r.text().to_string()).as_deref(), Some("uvw"));
    }

    #[test]
    fn detached_text_skips_renderer_update() {
        let doc = Document::new();
        let text = doc.create_text_node("abc");
        text.set_renderer(Box::new(RenderText::new("abc")));
        text.set_data("xyz");
        assert_eq!(text.with_renderer(|r| r.text().to_string()).as_deref(), Some("abc"));
    }

    #[test]
    fn range_offsets_are_validated() {
        let doc = Document::new();
        let text = doc.create_text_node("abc");
        let ok = doc.create_range(
            BoundaryPoint::new(text.node().clone(), 0),
            BoundaryPoint::new(text.node().clone(), 3),
        );
        assert!(ok.is_ok());
        let bad = doc.create_range(
            BoundaryPoint::new(text.node().clone(), 0),
            BoundaryPoint::new(text.node().clone(), 4),
        );
        assert_eq!(bad.err(), Some(DomError::IndexSize { offset: 4, length: 3 }));
    }
}
