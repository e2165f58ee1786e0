use std::sync::Arc;

pub type NodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub NodeId);

impl Id {
    /// Reserved sentinel for nodes created outside a live document.
    pub const DETACHED: Id = Id(0);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    DocumentFragment,
    Element { name: Arc<str> },
    Text,
    CDataSection,
    Comment,
}

impl NodeKind {
    /// Text-bearing kinds form adjacency runs; a CDATA section is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::CDataSection)
    }

    pub fn is_character_data(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::CDataSection | NodeKind::Comment
        )
    }

    pub fn allows_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::DocumentFragment | NodeKind::Element { .. }
        )
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::DocumentFragment => NodeType::DocumentFragment,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text => NodeType::Text,
            NodeKind::CDataSection => NodeType::CDataSection,
            NodeKind::Comment => NodeType::Comment,
        }
    }
}

/// DOM node type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    CDataSection = 4,
    Comment = 8,
    Document = 9,
    DocumentFragment = 11,
}

/// How stale the computed style (and with it the renderer) of a node is.
///
/// Ordered: anything at or past `SubtreeAndRenderersInvalid` is rebuilt
/// wholesale later, so in-place renderer updates are skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum StyleValidity {
    #[default]
    Valid,
    ElementInvalid,
    SubtreeInvalid,
    SubtreeAndRenderersInvalid,
}
