//! Event listeners declared in markup attributes (`onclick="..."`).
//!
//! The source text is kept as-is and compiled on first use by a
//! caller-supplied `ListenerCompiler`. The element the attribute was found on
//! is captured weakly and handed to the compiler as the lookup scope.

use crate::document::Document;
use crate::node::{Node, NodeRef};
use crate::types::NodeKind;
use std::cell::OnceCell;
use std::rc::Weak;

/// Zero-based line/column of the attribute in its source document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerSource {
    /// Name the compiled function is given; the attribute name.
    pub function_name: String,
    pub event_parameter_name: &'static str,
    pub code: String,
    pub source_url: String,
    pub position: TextPosition,
}

pub trait ListenerCompiler {
    type Callable;
    type Error;

    /// Build the callable for `source`. `scope` is the element the attribute
    /// was declared on, if it is still alive.
    fn compile(
        &self,
        source: &ListenerSource,
        scope: Option<&NodeRef>,
    ) -> Result<Self::Callable, Self::Error>;
}

pub struct LazyEventListener<C> {
    source: ListenerSource,
    original_node: Weak<Node>,
    compiled: OnceCell<C>,
}

impl<C> LazyEventListener<C> {
    /// Listener for an element attribute. `None` when the attribute has no
    /// value or `element` is not an element.
    pub fn for_element(
        element: &NodeRef,
        attribute_name: &str,
        attribute_value: Option<&str>,
        position: TextPosition,
    ) -> Option<Self> {
        let NodeKind::Element { name } = element.kind() else {
            return None;
        };
        let code = attribute_value?;
        // SVG handlers historically receive `evt`.
        let event_parameter_name = if name.starts_with("svg:") {
            "evt"
        } else {
            "event"
        };
        let source_url = element
            .document()
            .map(|doc| doc.config().url.clone())
            .unwrap_or_default();
        Some(Self::from_parts(
            ListenerSource {
                function_name: attribute_name.to_string(),
                event_parameter_name,
                code: code.to_string(),
                source_url,
                position,
            },
            element.downgrade(),
        ))
    }

    /// Listener for a document-level attribute (for example on `<body>`
    /// forwarded to the document). Compiled without an element scope.
    pub fn for_document(
        document: &Document,
        attribute_name: &str,
        attribute_value: Option<&str>,
        position: TextPosition,
    ) -> Option<Self> {
        let code = attribute_value?;
        Some(Self::from_parts(
            ListenerSource {
                function_name: attribute_name.to_string(),
                event_parameter_name: "event",
                code: code.to_string(),
                source_url: document.config().url.clone(),
                position,
            },
            Weak::new(),
        ))
    }

    fn from_parts(source: ListenerSource, original_node: Weak<Node>) -> Self {
        log::trace!(
            target: "dom.lazy_listener",
            "deferred {} from {}:{}",
            source.function_name,
            source.source_url,
            source.position.line
        );
        Self {
            source,
            original_node,
            compiled: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &ListenerSource {
        &self.source
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// The compiled callable, compiling on first call. A failed compile is
    /// not cached; the next call tries again.
    pub fn callable<K>(&self, compiler: &K) -> Result<&C, K::Error>
    where
        K: ListenerCompiler<Callable = C>,
    {
        if let Some(callable) = self.compiled.get() {
            return Ok(callable);
        }
        let scope = self.original_node.upgrade().map(NodeRef::from_rc);
        let callable = compiler.compile(&self.source, scope.as_ref())?;
        log::debug!(
            target: "dom.lazy_listener",
            "compiled {} ({} bytes of source)",
            self.source.function_name,
            self.source.code.len()
        );
        Ok(self.compiled.get_or_init(|| callable))
    }
}
