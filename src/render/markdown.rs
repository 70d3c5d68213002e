//! GitHub-flavored markdown renderer.

use crate::document::{Block, Document, Inline, Table};
use crate::render::Renderer;
use anyhow::Result;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, doc: &Document) -> Result<String> {
        let mut output = render_blocks(&doc.blocks);
        output.push('\n');
        Ok(output)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

/// Blocks separated by blank lines; empty blocks leave no trace.
fn render_blocks(blocks: &[Block]) -> String {
    let rendered: Vec<String> = blocks
        .iter()
        .filter(|b| !b.is_empty())
        .map(render_block)
        .filter(|s| !s.is_empty())
        .collect();
    rendered.join("\n\n")
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Header { level, content } => {
            format!("{} {}", "#".repeat(usize::from(*level).clamp(1, 6)), render_inlines(content))
        }
        Block::Paragraph { content } => render_paragraph(content),
        Block::Composite { blocks } => render_blocks(blocks),
        Block::CodeBlock { language, code } => {
            let fence = "`".repeat((longest_backtick_run(code) + 1).max(3));
            format!("{}{}\n{}\n{}", fence, language, code, fence)
        }
        Block::List { ordered, items } => {
            let mut lines = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let marker = if *ordered {
                    format!("{}. ", i + 1)
                } else {
                    "- ".to_string()
                };
                let indent = " ".repeat(marker.len());
                let text = render_paragraph(item).replace('\n', &format!("\n{}", indent));
                lines.push(format!("{}{}", marker, text));
            }
            lines.join("\n")
        }
        Block::Table(table) => render_table(table),
        Block::Rule => "---".to_string(),
    }
}

/// Doc-comment text keeps its source line breaks; strip their indentation
/// so continuation lines never turn into code blocks.
fn render_paragraph(content: &[Inline]) -> String {
    render_inlines(content)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape a heading, list or setext marker opening a line.
fn escape_line_start(line: &str) -> String {
    if line.starts_with(['#', '-', '+', '=']) {
        return format!("\\{}", line);
    }
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && line[digits..].starts_with(['.', ')']) {
        return format!("{}\\{}", &line[..digits], &line[digits..]);
    }
    line.to_string()
}

fn render_table(table: &Table) -> String {
    let mut lines = Vec::new();
    let header: Vec<String> = table.header.iter().map(|c| render_cell(c)).collect();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!("|{}", " --- |".repeat(header.len().max(1))));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|c| render_cell(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}

/// Table cells are single-line: breaks become `<br>`, pipes are escaped.
fn render_cell(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        match inline {
            Inline::LineBreak => out.push_str("<br>"),
            other => out.push_str(&render_inline(other)),
        }
    }
    out.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn render_inlines(content: &[Inline]) -> String {
    content.iter().map(render_inline).collect()
}

fn render_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text { text } => escape(text),
        Inline::Code { code } => render_code_span(code),
        Inline::Link {
            content,
            destination,
        } => {
            let label = render_inlines(content);
            if destination.contains([' ', '(', ')']) {
                format!("[{}](<{}>)", label, destination)
            } else {
                format!("[{}]({})", label, destination)
            }
        }
        Inline::Emphasis { content } => {
            let inner = render_inlines(content);
            if inner.trim().is_empty() {
                inner
            } else {
                format!("*{}*", inner)
            }
        }
        Inline::LineBreak => "\\\n".to_string(),
    }
}

/// Delimit with one more backtick than the longest run inside.
fn render_code_span(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    let fence = "`".repeat(longest_backtick_run(code) + 1);
    if code.starts_with('`') || code.ends_with('`') {
        format!("{} {} {}", fence, code, fence)
    } else {
        format!("{}{}{}", fence, code, fence)
    }
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// Escape markdown punctuation in plain text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
