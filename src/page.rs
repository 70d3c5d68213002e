//! Page assembly. One document per type, plus the index page.

use crate::convert::{reindent, Converter};
use crate::cref::{LinkBuilder, Resolver, Symbol};
use crate::document::{push_inline, Block, Document, Inline, Table};
use crate::links::{type_reference, type_title, SiteLinks};
use crate::metadata::{Deprecation, MemberDescriptor, MemberKind, Metadata, TypeDescriptor, TypeKind};
use crate::snippets::ExampleSource;
use crate::xmldoc::DocFile;
use std::collections::{BTreeMap, HashSet};

/// Member sections in page order.
const MEMBER_SECTIONS: &[(MemberKind, &str)] = &[
    (MemberKind::Constructor, "Constructors"),
    (MemberKind::Field, "Fields"),
    (MemberKind::Property, "Properties"),
    (MemberKind::Method, "Methods"),
    (MemberKind::Event, "Events"),
];

/// Everything a page build reads. Shared, read-only.
pub struct PageContext<'a> {
    pub metadata: &'a Metadata,
    pub docs: &'a DocFile,
    pub examples: &'a dyn ExampleSource,
    /// Code block language tag
    pub language: &'a str,
    /// Page file extension, for links between pages
    pub extension: &'a str,
}

/// Build the reference page of one type.
pub fn build_type_page(ctx: &PageContext<'_>, ty: &TypeDescriptor) -> Document {
    let path = ty.path();
    let links = SiteLinks::new(Some(&path), ctx.extension);
    let resolver = Resolver::new(ctx.metadata, &links);
    let converter = Converter::new(&resolver, ctx.language);

    let mut page = PageBuilder {
        ctx,
        converter: &converter,
        doc: Document::new(),
    };
    page.type_overview(ty);
    for (kind, title) in MEMBER_SECTIONS {
        let members: Vec<&MemberDescriptor> = ty.members_of(*kind).collect();
        if !members.is_empty() {
            page.member_section(ty, title, &members);
        }
    }
    page.doc
}

/// Build the index page: every type, grouped by namespace.
pub fn build_index(ctx: &PageContext<'_>, types: &[&TypeDescriptor]) -> Document {
    let links = SiteLinks::new(None, ctx.extension);
    let resolver = Resolver::new(ctx.metadata, &links);
    let converter = Converter::new(&resolver, ctx.language);

    let mut by_namespace: BTreeMap<&str, Vec<&TypeDescriptor>> = BTreeMap::new();
    for &ty in types {
        by_namespace.entry(ty.namespace.as_str()).or_default().push(ty);
    }

    let mut doc = Document::new();
    let title = if ctx.metadata.assembly.is_empty() {
        "API Reference".to_string()
    } else {
        ctx.metadata.assembly.clone()
    };
    doc.append_header(vec![Inline::text(title)], 1);

    for (namespace, mut types) in by_namespace {
        types.sort_by_key(|t| t.display_name());
        let heading = if namespace.is_empty() {
            "(global)"
        } else {
            namespace
        };
        doc.append_header(vec![Inline::text(heading)], 2);

        let rows = types
            .iter()
            .map(|&ty| {
                vec![
                    vec![links.build_link(Symbol::Type(ty), None)],
                    converter.convert_cell(ctx.docs.section(&ty.id(), "summary")),
                ]
            })
            .collect();
        doc.append(Block::Table(Table {
            header: vec![vec![Inline::text("Type")], vec![Inline::text("Description")]],
            rows,
        }));
    }
    doc
}

struct PageBuilder<'a> {
    ctx: &'a PageContext<'a>,
    converter: &'a Converter<'a>,
    doc: Document,
}

impl PageBuilder<'_> {
    fn resolver(&self) -> &Resolver<'_> {
        self.converter.resolver()
    }

    fn links(&self) -> &dyn LinkBuilder {
        self.converter.resolver().links()
    }

    fn type_ref(&self, path: &str) -> Inline {
        type_reference(self.ctx.metadata, self.links(), path)
    }

    /// Header plus converted block, skipped entirely when the block is empty.
    fn section(&mut self, title: &str, level: u8, block: Block) {
        if block.is_empty() {
            return;
        }
        self.doc.append_header(vec![Inline::text(title)], level);
        self.doc.append(block);
    }

    fn doc_section(&mut self, id: &str, tag: &str, title: &str, level: u8) {
        let block = self.converter.convert_paragraph(self.ctx.docs.section(id, tag));
        self.section(title, level, block);
    }

    fn type_overview(&mut self, ty: &TypeDescriptor) {
        let id = ty.id();
        self.doc.append_header(vec![Inline::text(type_title(ty))], 1);

        let mut location = vec![Inline::text("Namespace: ")];
        if ty.namespace.is_empty() {
            location.push(Inline::text("(global)"));
        } else {
            location.push(Inline::code(ty.namespace.clone()));
        }
        if !self.ctx.metadata.assembly.is_empty() {
            location.push(Inline::LineBreak);
            location.push(Inline::text("Assembly: "));
            location.push(Inline::code(self.ctx.metadata.assembly.clone()));
        }
        self.doc.append_paragraph(location);

        self.deprecation(ty.deprecated.as_ref());
        let summary = self.converter.convert_paragraph(self.ctx.docs.section(&id, "summary"));
        self.append_nonempty(summary);
        if !ty.signature.is_empty() {
            self.doc.append_code(self.ctx.language, &ty.signature);
        }

        if ty.kind == TypeKind::Class {
            self.inheritance(ty);
        }
        self.type_list("Implements: ", &ty.interfaces);
        self.type_list("Attributes: ", &ty.attributes);

        self.type_parameters(&id, &ty.generic_params, 2);
        self.doc_section(&id, "remarks", "Remarks", 2);
        self.example(&id, 2);
        self.see_also(&id, 2);
    }

    fn append_nonempty(&mut self, block: Block) {
        if !block.is_empty() {
            self.doc.append(block);
        }
    }

    fn deprecation(&mut self, deprecated: Option<&Deprecation>) {
        let Some(deprecated) = deprecated else {
            return;
        };
        let mut notice = vec![Inline::emphasis(vec![Inline::text("Deprecated")])];
        if let Some(message) = deprecated.message.as_deref().filter(|m| !m.is_empty()) {
            push_inline(&mut notice, Inline::text(format!(": {}", message)));
        }
        self.doc.append_paragraph(notice);
    }

    /// `object → Component → Widget<T>`, following base types through the
    /// metadata until one is missing.
    fn inheritance(&mut self, ty: &TypeDescriptor) {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = ty.base_type.clone();
        while let Some(path) = next {
            if !seen.insert(path.clone()) {
                break;
            }
            next = self
                .ctx
                .metadata
                .find_type(&path)
                .and_then(|t| t.base_type.clone());
            chain.push(path);
        }
        if chain.is_empty() {
            return;
        }

        let mut run = vec![Inline::text("Inheritance: ")];
        for path in chain.iter().rev() {
            run.push(self.type_ref(path));
            push_inline(&mut run, Inline::text(" → "));
        }
        push_inline(&mut run, Inline::text(ty.display_name()));
        self.doc.append_paragraph(run);
    }

    fn type_list(&mut self, label: &str, paths: &[String]) {
        if paths.is_empty() {
            return;
        }
        let mut run = vec![Inline::text(label)];
        for (i, path) in paths.iter().enumerate() {
            if i > 0 {
                push_inline(&mut run, Inline::text(", "));
            }
            run.push(self.type_ref(path));
        }
        self.doc.append_paragraph(run);
    }

    fn type_parameters(&mut self, id: &str, params: &[String], level: u8) {
        if params.is_empty() {
            return;
        }
        let mut blocks = Vec::new();
        for name in params {
            blocks.push(Block::Paragraph {
                content: vec![Inline::code(name.clone())],
            });
            blocks.push(self.converter.convert_paragraph(self.ctx.docs.typeparam(id, name)));
        }
        self.section("Type Parameters", level, Block::Composite { blocks });
    }

    /// `<example>` content followed by a matching snippet, if any.
    fn example(&mut self, id: &str, level: u8) {
        let mut blocks = vec![self.converter.convert_paragraph(self.ctx.docs.section(id, "example"))];
        if let Some(snippet) = self.ctx.examples.try_read_example(id) {
            blocks.push(Block::CodeBlock {
                language: self.ctx.language.to_string(),
                code: reindent(&snippet),
            });
        }
        self.section("Example", level, Block::Composite { blocks });
    }

    fn see_also(&mut self, id: &str, level: u8) {
        let items: Vec<Vec<Inline>> = self
            .ctx
            .docs
            .see_also(id)
            .into_iter()
            .filter_map(|e| {
                let text = e.text();
                let text = Some(text.trim()).filter(|t| !t.is_empty());
                let source = e.attr("cref").or_else(|| e.attr("href"))?;
                Some(vec![self.resolver().resolve(source, text)])
            })
            .collect();
        self.section("See Also", level, Block::List { ordered: false, items });
    }

    fn member_section(&mut self, ty: &TypeDescriptor, title: &str, members: &[&MemberDescriptor]) {
        self.doc.append_header(vec![Inline::text(title)], 2);

        let rows = members
            .iter()
            .map(|&m| {
                vec![
                    vec![self.links().build_link(Symbol::Member(ty, m), Some(&m.heading(ty)))],
                    self.converter.convert_cell(self.ctx.docs.section(&m.id, "summary")),
                ]
            })
            .collect();
        self.doc.append(Block::Table(Table {
            header: vec![vec![Inline::text("Name")], vec![Inline::text("Description")]],
            rows,
        }));

        for member in members {
            self.member_detail(ty, member);
        }
    }

    fn member_detail(&mut self, ty: &TypeDescriptor, member: &MemberDescriptor) {
        let id = member.id.as_str();
        self.doc.append_header(vec![Inline::text(member.heading(ty))], 3);

        self.deprecation(member.deprecated.as_ref());
        let summary = self.converter.convert_paragraph(self.ctx.docs.section(id, "summary"));
        self.append_nonempty(summary);
        if !member.signature.is_empty() {
            self.doc.append_code(self.ctx.language, &member.signature);
        }

        self.parameters(member);
        self.type_parameters(id, &member.generic_params, 4);

        match member.kind {
            MemberKind::Method => {
                let returns = member
                    .return_type
                    .as_deref()
                    .filter(|t| *t != "System.Void");
                if let Some(returns) = returns {
                    self.typed_section("Returns", returns, id, "returns");
                }
            }
            MemberKind::Field | MemberKind::Property | MemberKind::Event => {
                if let Some(value) = member.return_type.as_deref() {
                    self.typed_section("Value", value, id, "value");
                }
            }
            MemberKind::Constructor => {}
        }

        self.exceptions(id);
        self.doc_section(id, "remarks", "Remarks", 4);
        self.example(id, 4);
        self.see_also(id, 4);
        self.doc.append_rule();
    }

    fn parameters(&mut self, member: &MemberDescriptor) {
        if member.parameters.is_empty() {
            return;
        }
        let mut blocks = Vec::new();
        for param in &member.parameters {
            let mut run = vec![Inline::code(param.name.clone()), Inline::text(" ")];
            if param.by_ref {
                push_inline(&mut run, Inline::text("ref "));
            }
            run.push(self.type_ref(&param.type_path));
            blocks.push(Block::Paragraph { content: run });
            blocks.push(
                self.converter
                    .convert_paragraph(self.ctx.docs.param(&member.id, &param.name)),
            );
        }
        self.section("Parameters", 4, Block::Composite { blocks });
    }

    /// Returns / Value: the type, then its documentation.
    fn typed_section(&mut self, title: &str, type_path: &str, id: &str, tag: &str) {
        let blocks = vec![
            Block::Paragraph {
                content: vec![self.type_ref(type_path)],
            },
            self.converter.convert_paragraph(self.ctx.docs.section(id, tag)),
        ];
        self.section(title, 4, Block::Composite { blocks });
    }

    fn exceptions(&mut self, id: &str) {
        let exceptions = self.ctx.docs.exceptions(id);
        if exceptions.is_empty() {
            return;
        }
        let rows = exceptions
            .into_iter()
            .map(|e| {
                let cref = e.attr("cref").unwrap_or_default();
                vec![
                    vec![self.resolver().resolve(cref, None)],
                    self.converter.convert_cell(&e.children),
                ]
            })
            .collect();
        self.doc.append_header(vec![Inline::text("Exceptions")], 4);
        self.doc.append(Block::Table(Table {
            header: vec![vec![Inline::text("Exception")], vec![Inline::text("Condition")]],
            rows,
        }));
    }
}
