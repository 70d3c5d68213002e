//! XML documentation-comment files, parsed into an owned node tree.
//!
//! The compiler emits one `<member name="…">` element per documented
//! symbol; each becomes a [`DocNode`] tree keyed by its identifier.
//! Absent tags are always reported as empty node sequences.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

/// A text run or a tagged element.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Text(String),
    Element(DocElement),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<DocNode>,
}

impl DocElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given tag.
    pub fn child(&self, name: &str) -> Option<&DocElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &DocElement> {
        self.children.iter().filter_map(|n| match n {
            DocNode::Element(e) => Some(e),
            DocNode::Text(_) => None,
        })
    }

    /// Flattened text content of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

/// Builders for hand-made trees.
#[cfg(test)]
impl DocElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }
}

impl DocNode {
    pub fn text(text: &str) -> Self {
        DocNode::Text(text.to_string())
    }
}

fn collect_text(nodes: &[DocNode], out: &mut String) {
    for node in nodes {
        match node {
            DocNode::Text(t) => out.push_str(t),
            DocNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

/// All `<member>` entries of one or more documentation files.
#[derive(Debug, Default)]
pub struct DocFile {
    members: HashMap<String, DocElement>,
}

impl DocFile {
    /// Parse a single documentation file.
    #[cfg(test)]
    pub fn parse(input: &str) -> Result<Self> {
        let mut file = DocFile::default();
        file.merge(input)?;
        Ok(file)
    }

    /// Parse another documentation file into this one. Entries with an
    /// identifier already present are replaced.
    pub fn merge(&mut self, input: &str) -> Result<()> {
        let package =
            parser::parse(input).map_err(|e| anyhow!("malformed documentation XML: {:?}", e))?;
        let document = package.as_document();

        for child in document.root().children() {
            if let ChildOfRoot::Element(root) = child {
                self.collect_members(root);
            }
        }
        Ok(())
    }

    fn collect_members(&mut self, element: Element) {
        if element.name().local_part() == "member" {
            if let Some(name) = element.attribute_value("name") {
                let converted = convert_element(element);
                self.members.insert(name.to_string(), converted);
            }
            return;
        }
        for child in element.children() {
            if let ChildOfElement::Element(e) = child {
                self.collect_members(e);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, id: &str) -> Option<&DocElement> {
        self.members.get(id)
    }

    /// Children of the first `<tag>` of a member; empty when absent.
    pub fn section(&self, id: &str, tag: &str) -> &[DocNode] {
        self.member(id)
            .and_then(|m| m.child(tag))
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    /// Children of `<tag name="…">` (param / typeparam); empty when absent.
    pub fn named_section(&self, id: &str, tag: &str, name: &str) -> &[DocNode] {
        self.member(id)
            .and_then(|m| {
                m.elements()
                    .find(|e| e.name == tag && e.attr("name") == Some(name))
            })
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn param(&self, id: &str, name: &str) -> &[DocNode] {
        self.named_section(id, "param", name)
    }

    pub fn typeparam(&self, id: &str, name: &str) -> &[DocNode] {
        self.named_section(id, "typeparam", name)
    }

    /// `<exception cref="…">` entries of a member.
    pub fn exceptions(&self, id: &str) -> Vec<&DocElement> {
        self.top_level(id, "exception")
    }

    /// Top-level `<seealso>` entries of a member.
    pub fn see_also(&self, id: &str) -> Vec<&DocElement> {
        self.top_level(id, "seealso")
    }

    fn top_level(&self, id: &str, tag: &str) -> Vec<&DocElement> {
        self.member(id)
            .map(|m| m.elements().filter(|e| e.name == tag).collect())
            .unwrap_or_default()
    }
}

fn convert_element(element: Element) -> DocElement {
    let attributes = element
        .attributes()
        .iter()
        .map(|a| (a.name().local_part().to_string(), a.value().to_string()))
        .collect();

    let mut children = Vec::new();
    for child in element.children() {
        match child {
            ChildOfElement::Element(e) => children.push(DocNode::Element(convert_element(e))),
            ChildOfElement::Text(t) => {
                // Adjacent text (e.g. around CDATA) becomes one run
                if let Some(DocNode::Text(last)) = children.last_mut() {
                    last.push_str(t.text());
                } else {
                    children.push(DocNode::text(t.text()));
                }
            }
            _ => {}
        }
    }

    DocElement {
        name: element.name().local_part().to_string(),
        attributes,
        children,
    }
}
