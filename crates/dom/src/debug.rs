use crate::node::NodeRef;
use crate::types::NodeKind;
use std::fmt::Write;

/// Single-line description, e.g. `#text; length=5; value="hello"`.
pub fn format_for_debugger(node: &NodeRef) -> String {
    let mut out = String::with_capacity(32);
    out.push_str(node.node_name());
    node.with_data(|data| {
        if !data.is_empty() {
            let _ = write!(&mut out, "; length={}; value=\"{data}\"", node.length());
        }
    });
    out
}

/// Indented outline of the subtree under `root`, one node per line.
///
/// Character data is printed verbatim (escaped), empty text nodes included,
/// so outlines distinguish every adjacency-run layout.
pub fn outline(root: &NodeRef) -> Vec<String> {
    struct IndentGuard<'a> {
        indent: &'a mut String,
        step: usize,
    }

    impl Drop for IndentGuard<'_> {
        fn drop(&mut self) {
            let new_len = self.indent.len() - self.step;
            self.indent.truncate(new_len);
        }
    }

    const INDENT_STEP: &str = "  ";

    fn walk(node: &NodeRef, indent: &mut String, out: &mut Vec<String>) {
        let mut line = String::with_capacity(indent.len() + 32);
        line.push_str(indent);
        match node.kind() {
            NodeKind::Document | NodeKind::DocumentFragment => line.push_str(node.node_name()),
            NodeKind::Element { name } => {
                line.push('<');
                line.push_str(name);
                line.push('>');
            }
            NodeKind::Text => {
                let _ = write!(&mut line, "{:?}", &*node.data.borrow());
            }
            NodeKind::CDataSection => {
                let _ = write!(&mut line, "<![CDATA[{}]]>", &*node.data.borrow());
            }
            NodeKind::Comment => {
                let _ = write!(&mut line, "<!-- {} -->", &*node.data.borrow());
            }
        }
        out.push(line);

        indent.push_str(INDENT_STEP);
        let mut guard = IndentGuard {
            indent,
            step: INDENT_STEP.len(),
        };
        for child in node.children() {
            walk(&child, &mut *guard.indent, out);
        }
    }

    let mut out = Vec::new();
    let mut indent = String::new();
    walk(root, &mut indent, &mut out);
    out
}
