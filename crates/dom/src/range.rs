//! Live ranges: boundary pairs the document keeps in sync with text edits.

use crate::node::NodeRef;
use std::cell::RefCell;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub container: NodeRef,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(container: NodeRef, offset: usize) -> Self {
        Self { container, offset }
    }

    fn text_node_split(
        &mut self,
        old: &NodeRef,
        parent: Option<&NodeRef>,
        new_node: Option<&NodeRef>,
        old_index: Option<usize>,
        split_offset: usize,
    ) {
        if self.container == *old {
            if self.offset <= split_offset {
                return;
            }
            match (parent, new_node) {
                (Some(_), Some(new_node)) => {
                    self.offset -= split_offset;
                    self.container = new_node.clone();
                }
                _ => self.offset = split_offset,
            }
            return;
        }
        // A boundary right after the old node in its parent stays after the
        // new node as well.
        if let (Some(parent), Some(index)) = (parent, old_index)
            && self.container == *parent
            && self.offset == index + 1
        {
            self.offset += 1;
        }
    }

    fn text_replaced(&mut self, node: &NodeRef, offset: usize, length: usize) {
        if self.container != *node || self.offset <= offset {
            return;
        }
        if self.offset > offset + length {
            self.offset -= length;
        } else {
            self.offset = offset;
        }
    }
}

#[derive(Debug)]
pub struct LiveRange {
    start: RefCell<BoundaryPoint>,
    end: RefCell<BoundaryPoint>,
}

impl LiveRange {
    pub(crate) fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self {
            start: RefCell::new(start),
            end: RefCell::new(end),
        }
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start.borrow().clone()
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end.borrow().clone()
    }

    pub fn set_start(&self, point: BoundaryPoint) {
        *self.start.borrow_mut() = point;
    }

    pub fn set_end(&self, point: BoundaryPoint) {
        *self.end.borrow_mut() = point;
    }

    pub fn collapsed(&self) -> bool {
        *self.start.borrow() == *self.end.borrow()
    }

    pub(crate) fn text_node_split(
        &self,
        old: &NodeRef,
        parent: Option<&NodeRef>,
        new_node: Option<&NodeRef>,
        old_index: Option<usize>,
        split_offset: usize,
    ) {
        self.start
            .borrow_mut()
            .text_node_split(old, parent, new_node, old_index, split_offset);
        self.end
            .borrow_mut()
            .text_node_split(old, parent, new_node, old_index, split_offset);
    }

    pub(crate) fn text_replaced(&self, node: &NodeRef, offset: usize, length: usize) {
        self.start.borrow_mut().text_replaced(node, offset, length);
        self.end.borrow_mut().text_replaced(node, offset, length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn boundary_past_split_moves_to_new_node() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text_node("hello");
        div.append_child(&text).unwrap();
        let range = doc
            .create_range(
                BoundaryPoint::new(text.node().clone(), 1),
                BoundaryPoint::new(text.node().clone(), 4),
            )
            .unwrap();

        let tail = text.split_text(2).unwrap();
        assert_eq!(range.start(), BoundaryPoint::new(text.node().clone(), 1));
        assert_eq!(range.end(), BoundaryPoint::new(tail.node().clone(), 2));
    }

    #[test]
    fn boundary_after_split_node_in_parent_shifts() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text_node("hello");
        div.append_child(&text).unwrap();
        let range = doc
            .create_range(BoundaryPoint::new(div.clone(), 0), BoundaryPoint::new(div.clone(), 1))
            .unwrap();
        text.split_text(3).unwrap();
        assert_eq!(range.start().offset, 0);
        assert_eq!(range.end().offset, 2);
    }

    #[test]
    fn detached_split_clamps_boundary() {
        let doc = Document::new();
        let text = doc.create_text_node("hello");
        let range = doc
            .create_range(
                BoundaryPoint::new(text.node().clone(), 5),
                BoundaryPoint::new(text.node().clone(), 5),
            )
            .unwrap();
        text.split_text(2).unwrap();
        assert_eq!(range.end(), BoundaryPoint::new(text.node().clone(), 2));
        assert!(range.collapsed());
    }

    #[test]
    fn set_data_collapses_boundaries_to_start() {
        let doc = Document::new();
        let text = doc.create_text_node("hello");
        let range = doc
            .create_range(
                BoundaryPoint::new(text.node().clone(), 2),
                BoundaryPoint::new(text.node().clone(), 5),
            )
            .unwrap();
        text.set_data("bye");
        assert_eq!(range.start().offset, 0);
        assert_eq!(range.end().offset, 0);
    }

    #[test]
    fn dropped_ranges_are_forgotten() {
        let doc = Document::new();
        let text = doc.create_text_node("hello");
        let range = doc
            .create_range(
                BoundaryPoint::new(text.node().clone(), 4),
                BoundaryPoint::new(text.node().clone(), 4),
            )
            .unwrap();
        drop(range);
        text.split_text(1).unwrap();
        assert_eq!(text.data(), "h");
    }
}
