//! Converts documentation nodes into document blocks.
//!
//! Inline elements accumulate into an open run; a block element closes the
//! run (flushing it as a paragraph), is appended, and a new run starts
//! after it.

use crate::cref::Resolver;
use crate::document::{is_blank, push_inline, trim_run, Block, Inline};
use crate::xmldoc::{DocElement, DocNode};
use regex::Regex;
use std::sync::LazyLock;

static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// `type` attribute value that makes a list ordered.
const ORDERED_LIST: &str = "number";

/// Result of converting one node.
enum Converted {
    Inline(Inline),
    Block(Block),
    Nothing,
}

/// Open/closed inline run plus the blocks emitted so far.
enum Run {
    Closed,
    Open(Vec<Inline>),
}

struct Assembler {
    blocks: Vec<Block>,
    run: Run,
}

impl Assembler {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            run: Run::Closed,
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        match &mut self.run {
            Run::Open(run) => push_inline(run, inline),
            Run::Closed => {
                let mut run = Vec::new();
                push_inline(&mut run, inline);
                self.run = Run::Open(run);
            }
        }
    }

    fn push_block(&mut self, block: Block) {
        self.flush();
        if !block.is_empty() {
            self.blocks.push(block);
        }
    }

    fn flush(&mut self) {
        if let Run::Open(run) = std::mem::replace(&mut self.run, Run::Closed) {
            if !is_blank(&run) {
                self.blocks.push(Block::Paragraph { content: run });
            }
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

pub struct Converter<'a> {
    resolver: &'a Resolver<'a>,
    language: &'a str,
}

impl<'a> Converter<'a> {
    /// `language` tags every emitted code block.
    pub fn new(resolver: &'a Resolver<'a>, language: &'a str) -> Self {
        Self { resolver, language }
    }

    pub fn resolver(&self) -> &'a Resolver<'a> {
        self.resolver
    }

    /// Convert a node sequence into one composite paragraph.
    pub fn convert_paragraph(&self, nodes: &[DocNode]) -> Block {
        let mut assembler = Assembler::new();
        for node in nodes {
            match self.convert_node(node) {
                Converted::Inline(inline) => assembler.push_inline(inline),
                Converted::Block(block) => assembler.push_block(block),
                Converted::Nothing => {}
            }
        }
        Block::Composite {
            blocks: assembler.finish(),
        }
    }

    /// Convert a node sequence into a single inline run; block content is
    /// dropped.
    pub fn convert_inline(&self, nodes: &[DocNode]) -> Vec<Inline> {
        let mut run = Vec::new();
        for node in nodes {
            if let Converted::Inline(inline) = self.convert_node(node) {
                push_inline(&mut run, inline);
            }
        }
        trim_run(run)
    }

    /// Convert a node sequence for a table cell: paragraphs, nested ones
    /// included, are joined by line breaks. Code and list blocks are dropped.
    pub fn convert_cell(&self, nodes: &[DocNode]) -> Vec<Inline> {
        let mut cell = Vec::new();
        flatten_paragraphs(self.convert_paragraph(nodes), &mut cell);
        cell
    }

    /// Convert a `<list>` element.
    pub fn convert_list(&self, list: &DocElement) -> Block {
        let ordered = list.attr("type") == Some(ORDERED_LIST);
        let items = list
            .elements()
            .filter(|e| e.name == "item")
            .map(|item| self.convert_item(item))
            .filter(|run| !is_blank(run))
            .collect();
        Block::List { ordered, items }
    }

    fn convert_item(&self, item: &DocElement) -> Vec<Inline> {
        let term = item
            .child("term")
            .map(|t| self.convert_inline(&t.children))
            .filter(|run| !is_blank(run));
        let description = item
            .child("description")
            .map(|d| self.convert_inline(&d.children))
            .filter(|run| !is_blank(run));

        if item.child("term").is_none() && item.child("description").is_none() {
            // Bare `<item>text</item>`
            return self.convert_inline(&item.children);
        }

        let mut run = Vec::new();
        let has_term = term.is_some();
        if let Some(term) = term {
            run.push(Inline::emphasis(term));
        }
        if let Some(description) = description {
            if has_term {
                push_inline(&mut run, Inline::text(" - "));
            }
            for inline in description {
                push_inline(&mut run, inline);
            }
        }
        run
    }

    fn convert_node(&self, node: &DocNode) -> Converted {
        match node {
            DocNode::Text(text) => Converted::Inline(Inline::text(collapse_spaces(text))),
            DocNode::Element(element) => self.convert_element(element),
        }
    }

    fn convert_element(&self, element: &DocElement) -> Converted {
        match element.name.as_str() {
            "see" | "seealso" => {
                let text = element.text();
                let text = Some(text.trim()).filter(|t| !t.is_empty());
                match element.attr("cref").or_else(|| element.attr("href")) {
                    Some(cref) => Converted::Inline(self.resolver.resolve(cref, text)),
                    None => match (element.attr("langword"), text) {
                        (Some(word), _) => Converted::Inline(Inline::code(word)),
                        (None, Some(t)) => Converted::Inline(Inline::text(t)),
                        (None, None) => Converted::Nothing,
                    },
                }
            }
            "c" => {
                let code = element.text();
                if code.is_empty() {
                    Converted::Nothing
                } else {
                    Converted::Inline(Inline::code(code))
                }
            }
            "br" => Converted::Inline(Inline::LineBreak),
            "para" | "example" => Converted::Block(self.convert_paragraph(&element.children)),
            "code" => Converted::Block(Block::CodeBlock {
                language: self.language.to_string(),
                code: reindent(&element.text()),
            }),
            "list" => Converted::Block(self.convert_list(element)),
            "paramref" | "typeparamref" => match element.attr("name") {
                Some(name) => Converted::Inline(Inline::code(name)),
                None => Converted::Nothing,
            },
            _ => Converted::Inline(Inline::text(element.text())),
        }
    }
}

fn flatten_paragraphs(block: Block, cell: &mut Vec<Inline>) {
    match block {
        Block::Paragraph { content } => {
            let content = trim_run(content);
            if content.is_empty() {
                return;
            }
            if !cell.is_empty() {
                cell.push(Inline::LineBreak);
            }
            for inline in content {
                push_inline(cell, inline);
            }
        }
        Block::Composite { blocks } => {
            for block in blocks {
                flatten_paragraphs(block, cell);
            }
        }
        _ => {}
    }
}

/// Collapse runs of two or more spaces into one.
pub fn collapse_spaces(text: &str) -> String {
    RE_SPACES.replace_all(text, " ").into_owned()
}

/// Shift a code sample to column zero.
///
/// The first line's indentation is removed from every line; lines indented
/// less lose only the spaces they have. Leading whitespace-only lines are
/// skipped.
pub fn reindent(code: &str) -> String {
    let mut text = code;
    while let Some(pos) = text.find('\n') {
        if text[..pos].trim().is_empty() {
            text = &text[pos + 1..];
        } else {
            break;
        }
    }
    let text = text.trim_end_matches(['\n', '\r', ' ']);
    let indent = leading_spaces(text);

    text.lines()
        .map(|line| &line[leading_spaces(line).min(indent)..])
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cref::{LinkBuilder, Symbol};
    use crate::metadata::tests::{method, type_desc};
    use crate::metadata::Metadata;

    struct HashLinks;

    impl LinkBuilder for HashLinks {
        fn build_link(&self, symbol: Symbol<'_>, text: Option<&str>) -> Inline {
            let label = text.map(str::to_string).unwrap_or_else(|| symbol.display_name());
            Inline::link(vec![Inline::text(label)], "#target")
        }
    }

    fn metadata() -> Metadata {
        Metadata::new(
            "test",
            vec![type_desc("Acme", "Widget", vec![method("Resize", "M:Acme.Widget.Resize", &[])])],
        )
    }

    fn el(name: &str) -> DocElement {
        DocElement::new(name)
    }

    fn text(t: &str) -> DocNode {
        DocNode::text(t)
    }

    fn node(e: DocElement) -> DocNode {
        DocNode::Element(e)
    }

    fn blocks(block: Block) -> Vec<Block> {
        match block {
            Block::Composite { blocks } => blocks,
            other => panic!("expected composite, got {:?}", other),
        }
    }

    fn lines(parts: &[&str]) -> String {
        parts.join(LINE_SEPARATOR)
    }

    #[test]
    fn text_collapses_spaces() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let result = blocks(converter.convert_paragraph(&[text("a   b")]));
        assert_eq!(
            result,
            vec![Block::Paragraph {
                content: vec![Inline::text("a b")]
            }]
        );
    }

    #[test]
    fn block_flushes_open_run() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let code = el("code").with_child(text("x();"));
        let result = blocks(converter.convert_paragraph(&[text("A"), node(code), text("B")]));
        assert_eq!(
            result,
            vec![
                Block::Paragraph {
                    content: vec![Inline::text("A")]
                },
                Block::CodeBlock {
                    language: "csharp".to_string(),
                    code: "x();".to_string()
                },
                Block::Paragraph {
                    content: vec![Inline::text("B")]
                },
            ]
        );
    }

    #[test]
    fn inline_elements_merge_into_one_run() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let nodes = [
            text("Call "),
            node(el("see").with_attr("cref", "M:Acme.Widget.Resize")),
            text(" with "),
            node(el("paramref").with_attr("name", "width")),
            node(el("br")),
            node(el("c").with_child(text("null"))),
            node(el("unknown").with_child(text(" ok"))),
        ];
        let result = blocks(converter.convert_paragraph(&nodes));
        assert_eq!(
            result,
            vec![Block::Paragraph {
                content: vec![
                    Inline::text("Call "),
                    Inline::link(vec![Inline::text("Widget.Resize")], "#target"),
                    Inline::text(" with "),
                    Inline::code("width"),
                    Inline::LineBreak,
                    Inline::code("null"),
                    Inline::text(" ok"),
                ]
            }]
        );
    }

    #[test]
    fn see_uses_element_text_and_href() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let nodes = [
            node(el("see").with_attr("cref", "T:Acme.Widget").with_child(text("the widget"))),
            node(el("see").with_attr("href", "https://example.com")),
            node(el("see").with_attr("cref", "T:Acme.Missing").with_child(text(" gone "))),
        ];
        assert_eq!(
            converter.convert_inline(&nodes),
            vec![
                Inline::link(vec![Inline::text("the widget")], "#target"),
                Inline::text("https://example.comgone"),
            ]
        );
    }

    #[test]
    fn see_langword_is_code() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let nodes = [
            text("Returns "),
            node(el("see").with_attr("langword", "null")),
            text(" when empty."),
        ];
        assert_eq!(
            converter.convert_inline(&nodes),
            vec![
                Inline::text("Returns "),
                Inline::code("null"),
                Inline::text(" when empty."),
            ]
        );
    }

    #[test]
    fn cell_joins_paragraphs_with_breaks() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let nodes = [
            text("\n    "),
            node(el("para").with_child(text("Starts the engine."))),
            node(el("para").with_child(text(" Then idles. "))),
            node(el("code").with_child(text("engine.Go();"))),
        ];
        assert_eq!(
            converter.convert_cell(&nodes),
            vec![
                Inline::text("Starts the engine."),
                Inline::LineBreak,
                Inline::text("Then idles."),
            ]
        );
        assert!(converter.convert_cell(&[text("  ")]).is_empty());
    }

    #[test]
    fn nested_para_is_a_block() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let para = el("para").with_child(text("inner"));
        let result = blocks(converter.convert_paragraph(&[text("outer"), node(para)]));
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[1],
            Block::Composite {
                blocks: vec![Block::Paragraph {
                    content: vec![Inline::text("inner")]
                }]
            }
        );
    }

    #[test]
    fn whitespace_between_blocks_is_dropped() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let nodes = [
            text("\n    "),
            node(el("para").with_child(text("one"))),
            text("\n    "),
            node(el("para").with_child(text("two"))),
            text("\n"),
        ];
        assert_eq!(blocks(converter.convert_paragraph(&nodes)).len(), 2);
    }

    #[test]
    fn empty_input_is_empty() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let result = converter.convert_paragraph(&[]);
        assert!(result.is_empty());
    }

    #[test]
    fn numbered_list_is_ordered() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let item = el("item").with_child(node(el("description").with_child(text("one"))));
        let list = el("list").with_attr("type", "number").with_child(node(item.clone()));
        match converter.convert_list(&list) {
            Block::List { ordered, .. } => assert!(ordered),
            other => panic!("unexpected {:?}", other),
        }
        for kind in [Some("bullet"), Some("table"), None] {
            let mut list = el("list").with_child(node(item.clone()));
            if let Some(kind) = kind {
                list = list.with_attr("type", kind);
            }
            match converter.convert_list(&list) {
                Block::List { ordered, .. } => assert!(!ordered),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn term_and_description() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let item = el("item")
            .with_child(node(el("term").with_child(text(" Width "))))
            .with_child(node(el("description").with_child(text("In pixels."))));
        let list = el("list").with_child(node(item));
        assert_eq!(
            converter.convert_list(&list),
            Block::List {
                ordered: false,
                items: vec![vec![
                    Inline::emphasis(vec![Inline::text("Width")]),
                    Inline::text(" - In pixels."),
                ]]
            }
        );
    }

    #[test]
    fn description_only_item() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let item = el("item").with_child(node(el("description").with_child(text("Only this"))));
        let list = el("list").with_child(node(item));
        assert_eq!(
            converter.convert_list(&list),
            Block::List {
                ordered: false,
                items: vec![vec![Inline::text("Only this")]]
            }
        );
    }

    #[test]
    fn term_drops_block_content() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let term = el("term")
            .with_child(text("Name"))
            .with_child(node(el("code").with_child(text("dropped()"))));
        let list = el("list").with_child(node(el("item").with_child(node(term))));
        assert_eq!(
            converter.convert_list(&list),
            Block::List {
                ordered: false,
                items: vec![vec![Inline::emphasis(vec![Inline::text("Name")])]]
            }
        );
    }

    #[test]
    fn list_inside_paragraph_flushes() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "csharp");
        let item = el("item").with_child(text("bare"));
        let nodes = [text("Before"), node(el("list").with_child(node(item)))];
        let result = blocks(converter.convert_paragraph(&nodes));
        assert_eq!(
            result[1],
            Block::List {
                ordered: false,
                items: vec![vec![Inline::text("bare")]]
            }
        );
    }

    #[test]
    fn reindent_strips_first_line_indent() {
        assert_eq!(
            reindent("\n    if (x)\n        y();\n    "),
            lines(&["if (x)", "    y();"])
        );
    }

    #[test]
    fn reindent_never_removes_text() {
        assert_eq!(
            reindent("    a\n  b\nc\n      d"),
            lines(&["a", "b", "c", "  d"])
        );
    }

    #[test]
    fn reindent_skips_whitespace_only_leading_lines() {
        assert_eq!(reindent("\n    \n  \t\n    x();\n      y();"), lines(&["x();", "  y();"]));
    }

    #[test]
    fn reindent_is_idempotent() {
        let samples = [
            "\n\n      var x = 1;\n        x++;\n  \n      return x;\n   \n",
            "  \n    a\n   b",
            "plain",
            "",
        ];
        for sample in samples {
            let once = reindent(sample);
            assert_eq!(reindent(&once), once, "sample: {:?}", sample);
        }
    }

    #[test]
    fn code_element_is_reindented() {
        let meta = metadata();
        let resolver = Resolver::new(&meta, &HashLinks);
        let converter = Converter::new(&resolver, "vb");
        let code = el("code").with_child(text("\n        Dim x = 1\n    "));
        assert_eq!(
            blocks(converter.convert_paragraph(&[node(code)])),
            vec![Block::CodeBlock {
                language: "vb".to_string(),
                code: "Dim x = 1".to_string()
            }]
        );
    }
}
