use crate::types::Id;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    /// An offset past the end of a node's data.
    IndexSize { offset: usize, length: usize },
    /// The parent refuses the child (wrong kind, cycle, second document element).
    HierarchyRequest { parent: Id, child: Id },
    /// The node is not a child of the given parent.
    NotFound { parent: Id, child: Id },
}

impl std::fmt::Display for DomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomError::IndexSize { offset, length } => {
                write!(f, "offset {offset} exceeds length {length}")
            }
            DomError::HierarchyRequest { parent, child } => {
                write!(f, "node {} cannot be inserted into {}", child.0, parent.0)
            }
            DomError::NotFound { parent, child } => {
                write!(f, "node {} is not a child of {}", child.0, parent.0)
            }
        }
    }
}

impl std::error::Error for DomError {}
