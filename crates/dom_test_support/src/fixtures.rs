//! TOML fixtures describing text-node operations.
//!
//! Each `[[case]]` lists the children of a `<div>`, the index of the target
//! child, the operation to run and the expected outcome:
//!
//! ```toml
//! [[case]]
//! name = "split in the middle"
//! children = [{ kind = "text", data = "hello" }]
//! target = 0
//! op = { type = "split", offset = 2 }
//! expect_value = "llo"
//! expect_tree = ['<div>', '  "he"', '  "llo"']
//! ```

use dom::{Document, NodeRef};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct FixtureFile {
    #[serde(rename = "case")]
    pub cases: Vec<TextCase>,
}

#[derive(Debug, Deserialize)]
pub struct TextCase {
    pub name: String,
    pub children: Vec<ChildSpec>,
    pub target: usize,
    pub op: Op,
    /// Data of the returned node (split/replace) or the string (whole text).
    #[serde(default)]
    pub expect_value: Option<String>,
    /// `Debug` name of the expected `DomError` variant.
    #[serde(default)]
    pub expect_error: Option<String>,
    pub expect_tree: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildSpec {
    Text { data: String },
    Cdata { data: String },
    Comment { data: String },
    Element { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    Split { offset: usize },
    WholeText,
    ReplaceWholeText { text: String },
}

pub fn load_fixture(path: &Path) -> Result<FixtureFile, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    toml::from_str(&raw).map_err(|err| format!("failed to parse {}: {err}", path.display()))
}

/// Build `<div>` with the children of `case` under `doc`; returns the div and
/// the created children in order.
pub fn build_children(doc: &Document, specs: &[ChildSpec]) -> (NodeRef, Vec<NodeRef>) {
    let div = doc.create_element("div");
    let children: Vec<NodeRef> = specs
        .iter()
        .map(|spec| match spec {
            ChildSpec::Text { data } => doc.create_text_node(data).into_node(),
            ChildSpec::Cdata { data } => doc.create_cdata_section(data).into_node(),
            ChildSpec::Comment { data } => doc.create_comment(data),
            ChildSpec::Element { name } => doc.create_element(name),
        })
        .collect();
    for child in &children {
        div.append_child(child)
            .expect("fixture children are valid under <div>");
    }
    (div, children)
}
