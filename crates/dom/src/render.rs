//! Render-tree representation of text nodes.
//!
//! The DOM only needs one capability from the render side: patching the
//! rendered text in place after the node's data changed, without tearing the
//! renderer down and building a new one.

/// In-place synchronization target for a text node's rendered content.
pub trait TextRenderer {
    /// Replace the rendered text with `text`, where the change began at
    /// `offset` and previously covered `old_length` characters.
    fn set_text_with_offset(&mut self, text: &str, offset: usize, old_length: usize);

    fn text(&self) -> &str;
}

/// Plain text renderer that keeps the last applied text and update bounds.
#[derive(Clone, Debug, Default)]
pub struct RenderText {
    text: String,
    updates: usize,
    last_update: Option<(usize, usize)>,
}

impl RenderText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            updates: 0,
            last_update: None,
        }
    }

    /// Number of in-place updates applied since creation.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// `(offset, old_length)` of the latest in-place update.
    pub fn last_update(&self) -> Option<(usize, usize)> {
        self.last_update
    }
}

impl TextRenderer for RenderText {
    fn set_text_with_offset(&mut self, text: &str, offset: usize, old_length: usize) {
        self.text.clear();
        self.text.push_str(text);
        self.updates += 1;
        self.last_update = Some((offset, old_length));
    }

    fn text(&self) -> &str {
        &self.text
    }
}
