//! # dom
//!
//! Reference-counted document tree with the text-node operations of the DOM:
//! `splitText`, `wholeText` and `replaceWholeText`, kept correct while
//! mutation listeners edit the tree synchronously in the middle of them.
//!
//! - [`Document`] owns the tree, the mutation listeners, the scoped event
//!   queue and the live ranges.
//! - [`NodeRef`] is a shared node handle with the tree primitives.
//! - [`TextRef`] is a handle to a text-bearing node and carries the text
//!   operations.

pub mod debug;
pub mod lazy_listener;
pub mod render;

mod character_data;
mod config;
mod document;
mod error;
mod events;
mod node;
mod range;
mod text;
mod types;

pub use crate::config::DocumentConfig;
pub use crate::document::Document;
pub use crate::error::DomError;
pub use crate::events::{EventQueueScope, ListenerId, MutationEvent, MutationListener};
pub use crate::node::{Node, NodeRef};
pub use crate::range::{BoundaryPoint, LiveRange};
pub use crate::text::TextRef;
pub use crate::types::{Id, NodeId, NodeKind, NodeType, StyleValidity};
