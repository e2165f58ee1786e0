//! Data access and the three write paths of character-data nodes.
//!
//! - `set_data`: full path. Updates the renderer, adjusts live ranges and
//!   dispatches the modified event.
//! - `set_data_without_update`: raw buffer swap. The caller owes the
//!   notifications.
//! - `parser_append_data`: parser path. Updates the renderer, no events.

use crate::events::MutationEvent;
use crate::node::{Node, NodeRef};
use tools::utf8::{char_len, char_slice};

impl Node {
    /// Copy of the node's data. Empty for nodes that carry none.
    pub fn data(&self) -> String {
        self.data.borrow().clone()
    }

    /// Borrow the data for the duration of `f`. `f` must not mutate this node.
    pub fn with_data<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.data.borrow())
    }

    /// Length in characters.
    pub fn length(&self) -> usize {
        char_len(&self.data.borrow())
    }
}

impl NodeRef {
    /// Replace the data and run every notification.
    ///
    /// Ignored on nodes that are not character data.
    pub fn set_data(&self, data: &str) {
        if !self.is_character_data() {
            log::debug!(
                target: "dom.text",
                "set_data ignored on {} ({})",
                self.id().0,
                self.node_name()
            );
            return;
        }
        let old_length = self.length();
        let document = self.document();
        let listening = document
            .as_ref()
            .is_some_and(|doc| doc.wants_mutation_events());

        if !listening && *self.data.borrow() == data {
            if let Some(doc) = &document {
                doc.adjust_ranges_for_text_change(self, 0, old_length);
            }
            return;
        }

        let old_data = self.set_data_without_update(data.to_string());
        if let Some(doc) = &document {
            doc.text_content_changed(self, 0, old_length);
        }
        self.dispatch_modified_event(old_data);
    }

    /// Swap the buffer and return the previous data. Nothing is notified.
    pub(crate) fn set_data_without_update(&self, data: String) -> String {
        std::mem::replace(&mut *self.data.borrow_mut(), data)
    }

    /// Announce a data change from `old_data` to the current data.
    ///
    /// The event is scoped: inside an `EventQueueScope` it is delivered when
    /// the scope ends.
    pub(crate) fn dispatch_modified_event(&self, old_data: String) {
        let Some(doc) = self.document() else {
            return;
        };
        if !doc.wants_mutation_events() {
            return;
        }
        doc.dispatch_scoped(MutationEvent::CharacterDataModified {
            target: self.clone(),
            prev_value: old_data,
            new_value: self.data(),
        });
    }

    /// Append up to `limit` characters of `data` starting at character
    /// `start`. Returns how many characters were appended.
    pub fn parser_append_data(&self, data: &str, start: usize, limit: usize) -> usize {
        let chunk = char_slice(data, start, limit);
        if chunk.is_empty() {
            return 0;
        }
        let old_length = self.length();
        self.data.borrow_mut().push_str(chunk);
        if self.is_text()
            && let Some(doc) = self.document()
        {
            doc.update_text_renderer(self, old_length, 0);
        }
        char_len(chunk)
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::render::RenderText;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn length_counts_characters() {
        let doc = Document::new();
        let text = doc.create_text_node("a€b");
        assert_eq!(text.length(), 3);
        text.with_data(|d| assert_eq!(d.len(), 5));
    }

    #[test]
    fn set_data_updates_attached_renderer() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text_node("hello");
        div.append_child(&text).unwrap();
        text.set_renderer(Box::new(RenderText::new("hello")));

        text.set_data("bye");
        assert_eq!(text.data(), "bye");
        assert_eq!(
            text.with_renderer(|r| r.text().to_string()).as_deref(),
            Some("bye")
        );
    }

    #[test]
    fn set_data_dispatches_modified_event() {
        let doc = Document::new();
        let text = doc.create_text_node("old");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        doc.add_mutation_listener(move |_, event| {
            sink.borrow_mut().push(event.describe());
        });
        text.set_data("new");
        assert_eq!(
            *seen.borrow(),
            vec![format!("DOMCharacterDataModified({}: \"old\" -> \"new\")", text.id().0)]
        );
    }

    #[test]
    fn set_data_is_ignored_on_elements() {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.set_data("nope");
        assert_eq!(div.data(), "");
    }

    #[test]
    fn parser_append_respects_limit() {
        let doc = Document::new();
        let text = doc.create_text_node("ab");
        assert_eq!(text.parser_append_data("cdéfg", 1, 3), 3);
        assert_eq!(text.data(), "abdéf");
        assert_eq!(text.parser_append_data("xyz", 5, 3), 0);
    }
}
