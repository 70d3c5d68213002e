//! Format-agnostic document model: blocks and inline runs.
//!
//! Pages are assembled by appending blocks; renderers in [`crate::render`]
//! turn a finished [`Document`] into text.

use serde::Serialize;

/// Complete rendered page for a single type (or the index).
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Paragraph-level element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { level: u8, content: Vec<Inline> },
    Paragraph { content: Vec<Inline> },
    /// Converted doc-comment content: a sequence of blocks inserted as one unit.
    Composite { blocks: Vec<Block> },
    CodeBlock { language: String, code: String },
    List { ordered: bool, items: Vec<Vec<Inline>> },
    Table(Table),
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub header: Vec<Vec<Inline>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

/// Text-flow element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Code { code: String },
    Link { content: Vec<Inline>, destination: String },
    Emphasis { content: Vec<Inline> },
    LineBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Inline::Code { code: code.into() }
    }

    pub fn link(content: Vec<Inline>, destination: impl Into<String>) -> Self {
        Inline::Link {
            content,
            destination: destination.into(),
        }
    }

    pub fn emphasis(content: Vec<Inline>) -> Self {
        Inline::Emphasis { content }
    }

    /// Concatenated plain text of this element, ignoring markup.
    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text { text } => text.clone(),
            Inline::Code { code } => code.clone(),
            Inline::Link { content, .. } | Inline::Emphasis { content } => plain_text(content),
            Inline::LineBreak => "\n".to_string(),
        }
    }
}

/// Concatenated plain text of an inline run.
#[cfg(test)]
pub fn plain_text(run: &[Inline]) -> String {
    run.iter().map(Inline::plain_text).collect()
}

/// Append an inline element to a run, merging adjacent text.
pub fn push_inline(run: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text { text } = &inline {
        if text.is_empty() {
            return;
        }
        if let Some(Inline::Text { text: last }) = run.last_mut() {
            last.push_str(text);
            return;
        }
    }
    run.push(inline);
}

/// Trim whitespace from the text at both ends of a run.
pub fn trim_run(mut run: Vec<Inline>) -> Vec<Inline> {
    if let Some(Inline::Text { text }) = run.first_mut() {
        *text = text.trim_start().to_string();
    }
    if let Some(Inline::Text { text }) = run.last_mut() {
        *text = text.trim_end().to_string();
    }
    run.retain(|i| !matches!(i, Inline::Text { text } if text.is_empty()));
    run
}

/// True when a run holds nothing but whitespace text.
pub fn is_blank(run: &[Inline]) -> bool {
    run.iter().all(|i| match i {
        Inline::Text { text } => text.trim().is_empty(),
        _ => false,
    })
}

impl Block {
    /// True for blocks that render to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Block::Paragraph { content } => is_blank(content),
            Block::Composite { blocks } => blocks.iter().all(Block::is_empty),
            Block::List { items, .. } => items.is_empty(),
            Block::CodeBlock { code, .. } => code.trim().is_empty(),
            _ => false,
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_header(&mut self, content: Vec<Inline>, level: u8) {
        self.blocks.push(Block::Header { level, content });
    }

    pub fn append_paragraph(&mut self, content: Vec<Inline>) {
        self.blocks.push(Block::Paragraph { content });
    }

    pub fn append_code(&mut self, language: &str, code: &str) {
        self.blocks.push(Block::CodeBlock {
            language: language.to_string(),
            code: code.to_string(),
        });
    }

    pub fn append_rule(&mut self) {
        self.blocks.push(Block::Rule);
    }

    pub fn append(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Append every block of another document, in order.
    pub fn append_document(&mut self, other: Document) {
        self.blocks.extend(other.blocks);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_empty)
    }
}
